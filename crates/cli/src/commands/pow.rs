//! Proof-of-work timing command.

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use powchain_core::{current_timestamp_millis, Block, Hash, Keypair, Transaction};
use std::time::Instant;

#[derive(Args)]
pub struct PowArgs {
    /// Required leading zero hex digits
    #[arg(short, long, default_value = "4")]
    difficulty: u32,

    /// Search on all cores
    #[arg(short, long)]
    parallel: bool,
}

pub fn run(args: PowArgs) -> Result<()> {
    if args.difficulty > 64 {
        bail!("difficulty cannot exceed 64 hex digits");
    }

    let reward = Transaction::reward(Keypair::generate().address(), 100);
    let mut block = Block::new(
        current_timestamp_millis(),
        vec![reward],
        Hash::ZERO,
        args.difficulty,
    );

    let start = Instant::now();
    if args.parallel {
        block.mine_block_parallel();
    } else {
        block.mine_block();
    }
    let elapsed = start.elapsed();

    println!("{} {}", "Hash:      ".bold(), block.hash().to_string().green());
    println!("{} {}", "Nonce:     ".bold(), block.nonce());
    println!("{} {}", "Difficulty:".bold(), block.difficulty());
    println!("{} {:.3}s", "Elapsed:   ".bold(), elapsed.as_secs_f64());
    if !args.parallel && elapsed.as_secs_f64() > 0.0 {
        let rate = (block.nonce() + 1) as f64 / elapsed.as_secs_f64();
        println!("{} {:.0} H/s", "Rate:      ".bold(), rate);
    }
    Ok(())
}
