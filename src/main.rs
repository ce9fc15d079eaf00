//! CLI binary for `todo_sync`.
//!
//! This binary is a thin wrapper that parses arguments and delegates to the library.

use clap::Parser;
use std::process::ExitCode;
use todo_sync::cli::{run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    todo_sync::logging::init();
    let cli = Cli::parse();
    let output = run(cli).await;

    for line in &output.stdout {
        println!("{line}");
    }
    for line in &output.stderr {
        eprintln!("{line}");
    }
    output.exit_code
}
