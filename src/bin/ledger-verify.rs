#![forbid(unsafe_code)]
//! Offline verifier for a chain document as served by `GET /chain`.

use clap::Parser;
use colored::*;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use powledger::blockchain::{verify_chain, ChainSnapshot};

#[derive(Parser, Debug)]
#[command(name = "ledger-verify", about = "Verify hash links and proofs of a saved chain")]
struct Args {
    /// JSON file holding `{"chain": [...], "length": n}`; stdin when omitted
    path: Option<PathBuf>,
}

fn read_input(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let text = match read_input(args.path.as_ref()) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{} {}", "Failed to read input:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let snapshot: ChainSnapshot = match serde_json::from_str(&text) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("{} {}", "Not a chain document:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    println!("{}", "Chain verification".bright_cyan().bold());
    println!("{}", "------------------".bright_cyan());
    println!("  Blocks:           {}", snapshot.chain.len());
    println!("  Declared length:  {}", snapshot.length);
    if let Some(last) = snapshot.last_block() {
        println!("  Tip index:        {}", last.index);
        println!("  Tip proof:        {}", last.proof);
    }
    println!();

    if snapshot.length != snapshot.chain.len() {
        println!(
            "{} declared length {} but {} blocks present",
            "✗".red().bold(),
            snapshot.length,
            snapshot.chain.len()
        );
        return ExitCode::FAILURE;
    }

    match verify_chain(&snapshot.chain) {
        Ok(()) => {
            println!("{} {}", "✓".green().bold(), "Chain is valid".green());
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{} {}", "✗".red().bold(), e.to_string().red());
            ExitCode::FAILURE
        }
    }
}
