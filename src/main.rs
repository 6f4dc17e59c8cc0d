//! wikify CLI entry point.
//!
//! Parses arguments, runs the selected command, and renders any failure
//! through the user-friendly error display before exiting nonzero.

use anyhow::Result;
use clap::Parser;
use wikify::cli;
use wikify::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
