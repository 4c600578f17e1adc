//! Sales Balance CLI
//!
//! Fetches sales and payments from the backend (or reads saved JSON
//! snapshots) and prints balances as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- balances > balances.csv
//! cargo run -- sales --sales sales.json --payments payments.json
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `SALES_API_URL`, `SALES_API_TIMEOUT_SECS`: backend connection

use clap::Parser;
use sales_balance::cli::{self, Cli};
use std::io;
use std::process;

fn main() {
    env_logger::init();

    let args = Cli::parse();

    let stdout = io::stdout();
    if let Err(e) = cli::run(args, stdout.lock()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
