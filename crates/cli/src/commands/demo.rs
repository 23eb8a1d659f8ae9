//! Scripted walkthrough of the ledger.

use super::section;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use powchain_chain::{Blockchain, BlockchainConfig};
use powchain_core::{Address, Block, Keypair};

#[derive(Args)]
pub struct DemoArgs {
    /// Search nonces on all cores
    #[arg(short, long)]
    parallel: bool,

    /// Reset the difficulty to zero once it would exceed this value
    #[arg(short, long)]
    max_difficulty: Option<u32>,
}

struct Wallet {
    name: &'static str,
    keypair: Keypair,
}

impl Wallet {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            keypair: Keypair::generate(),
        }
    }

    fn address(&self) -> Address {
        self.keypair.address()
    }
}

pub fn run(args: DemoArgs) -> Result<()> {
    section("CREATING BLOCKCHAIN");
    let config = BlockchainConfig {
        parallel_mining: args.parallel,
        ..BlockchainConfig::default()
    };
    let mut coin = Blockchain::with_config(config);
    println!("New blockchain created");
    println!("\nGenesis block:");
    println!("Hash: {}", coin.get_latest_block().hash());

    section("SETTING UP WALLETS");
    let wallets = [Wallet::new("Person1"), Wallet::new("Person2"), Wallet::new("Person3")];
    let [p1, p2, p3] = &wallets;
    for wallet in &wallets {
        println!("{}: {}", wallet.name, wallet.address().short());
    }

    section("MINING FIRST BLOCK");
    println!("{} is mining...", p1.name);
    let block = mine(&mut coin, p1, args.max_difficulty);
    println!("Nonce: {}", block.nonce());
    print_balances(&coin, &wallets, "CHECKING BALANCES");

    section("MAKING TRANSACTIONS");
    transfer(&mut coin, p1, p2, 30);
    transfer(&mut coin, p1, p3, 20);
    println!("\nPending transactions:");
    for (i, tx) in coin.pending_transactions().iter().enumerate() {
        let from = tx.from.map_or_else(|| "System".to_string(), |a| a.short());
        println!(
            "Tx {}: From {} to {} Amount: {}",
            i + 1,
            from,
            tx.to.short(),
            tx.amount
        );
    }

    section("MINING SECOND BLOCK");
    println!("{} is mining to process transactions...", p2.name);
    mine(&mut coin, p2, args.max_difficulty);
    println!("Chain length: {}", coin.len());
    print_balances(&coin, &wallets, "UPDATED BALANCES");

    section("TRYING INVALID TX");
    println!("{} tries to send more coins than they have:", p3.name);
    transfer(&mut coin, p3, p1, 1000);
    println!("\n{} sends 5 coins to {}:", p3.name, p1.name);
    transfer(&mut coin, p3, p1, 5);

    section("MINING THIRD BLOCK");
    mine(&mut coin, p3, args.max_difficulty);
    println!("Current difficulty: {}", coin.difficulty());

    section("CHAIN VALIDATION");
    println!("Blockchain valid? {}", verdict(coin.is_chain_valid()));

    section("FULL BLOCKCHAIN");
    for (i, block) in coin.blocks().iter().enumerate() {
        println!("\nBlock #{}:", i);
        println!("Hash: {}", &block.hash().to_hex()[..15]);
        println!("Transactions: {}", block.tx_count());
    }

    section("FINAL STATE");
    println!("Chain length: {} blocks", coin.len());
    println!("Difficulty: {}", coin.difficulty());
    println!("Total difficulty: {}", coin.total_difficulty());
    print_balances(&coin, &wallets, "FINAL BALANCES");

    section("MERKLE ROOT DEMONSTRATION");
    let demo_block = coin.get_block_by_index(2)?;
    println!("Block hash: {}", &demo_block.hash().to_hex()[..15]);
    println!("Merkle root: {}", &demo_block.merkle_root().to_hex()[..15]);
    println!("Transaction count: {}", demo_block.tx_count());
    println!("Merkle root valid: {}", verdict(demo_block.verify_merkle_root()));

    section("TRANSACTION TAMPERING DETECTION");
    println!("Tampering with the first transaction of block #2 on a copy of the chain...");
    let mut tampered = coin.clone();
    let original = tampered
        .get_block_by_index(2)?
        .transactions()
        .first()
        .map(|tx| tx.amount)
        .context("block #2 has no transactions")?;
    tampered.simulate_corruption(2, 0, original + 50);
    println!("Original amount: {}", original);
    println!("Modified amount: {}", original + 50);

    let merkle_ok = tampered.get_block_by_index(2)?.verify_merkle_root();
    println!("Merkle root still valid: {}", detection(merkle_ok));
    println!("Blockchain still valid: {}", detection(tampered.is_chain_valid()));
    println!("Original chain still valid: {}", verdict(coin.is_chain_valid()));

    section("MERKLE ROOT EFFICIENCY");
    println!("Creating multiple transactions...");
    for i in 0..8 {
        let (sender, receiver) = if i % 2 == 0 { (p1, p3) } else { (p2, p1) };
        transfer(&mut coin, sender, receiver, 1);
    }
    println!("\nMining a block with multiple transactions...");
    let block = mine(&mut coin, p1, args.max_difficulty);
    println!("Block has {} transactions", block.tx_count());
    println!(
        "Their commitment is a single merkle root: {}",
        &block.merkle_root().to_hex()[..15]
    );

    section("FINAL VALIDATION");
    println!("Final blockchain state valid: {}", verdict(coin.is_chain_valid()));
    println!("Total blocks in chain: {}", coin.len());
    Ok(())
}

fn mine<'a>(coin: &'a mut Blockchain, miner: &Wallet, max_difficulty: Option<u32>) -> &'a Block {
    if max_difficulty.is_some_and(|max| coin.difficulty() > max) {
        coin.reset_difficulty();
    }
    let block = coin.mine_pending_transactions(miner.address());
    println!("Block mined: {}...", &block.hash().to_hex()[..10]);
    block
}

fn transfer(coin: &mut Blockchain, from: &Wallet, to: &Wallet, amount: u64) {
    print!("{} -> {} ({} coins): ", from.name, to.name, amount);
    match coin.create_transaction(Some(from.address()), to.address(), amount, &from.keypair) {
        Ok(_) => println!("{}", "added to pending".green()),
        Err(e) => println!("{} {}", "rejected:".red(), e),
    }
}

fn print_balances(coin: &Blockchain, wallets: &[Wallet], title: &str) {
    section(title);
    for wallet in wallets {
        println!(
            "{}: {} coins",
            wallet.name,
            coin.get_balance_of_address(&wallet.address())
        );
    }
}

fn verdict(ok: bool) -> colored::ColoredString {
    if ok {
        "YES".green()
    } else {
        "NO".red()
    }
}

fn detection(still_valid: bool) -> colored::ColoredString {
    if still_valid {
        "YES (tampering missed)".red()
    } else {
        "NO (tampering detected)".green()
    }
}
