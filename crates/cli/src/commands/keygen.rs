//! Key pair generation command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use powchain_core::Keypair;

#[derive(Args)]
pub struct KeygenArgs {
    /// Number of key pairs to generate
    #[arg(short, long, default_value = "1", conflicts_with = "from_private")]
    count: usize,

    /// Derive the address of an existing hex-encoded private key instead
    #[arg(long, value_name = "HEX")]
    from_private: Option<String>,
}

pub fn run(args: KeygenArgs) -> Result<()> {
    if let Some(private_hex) = &args.from_private {
        let keypair = Keypair::from_private_hex(private_hex.trim())?;
        print_keypair(&keypair);
        return Ok(());
    }

    for i in 0..args.count {
        if args.count > 1 {
            println!("{}", format!("Key pair #{}", i + 1).bold());
        }
        print_keypair(&Keypair::generate());
    }

    println!();
    println!(
        "{}",
        "The private key authorizes every transfer from its address.".dimmed()
    );
    Ok(())
}

fn print_keypair(keypair: &Keypair) {
    println!("  {} {}", "Address:    ".bold(), keypair.address());
    println!(
        "  {} {}",
        "Private key:".bold(),
        hex::encode(keypair.private_key()).yellow()
    );
}
