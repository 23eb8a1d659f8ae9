//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod demo;
mod keygen;
mod pow;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scripted ledger walkthrough
    Demo(demo::DemoArgs),
    /// Generate key pairs
    Keygen(keygen::KeygenArgs),
    /// Time the proof-of-work search for one block
    Pow(pow::PowArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Demo(args) => demo::run(args),
        Commands::Keygen(args) => keygen::run(args),
        Commands::Pow(args) => pow::run(args),
    }
}

/// Print a section banner.
fn section(title: &str) {
    use colored::Colorize;

    println!();
    println!("{}", "=".repeat(40).dimmed());
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(40).dimmed());
}
