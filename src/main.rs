//! Build stroke fonts whose stroke width and cap height are physical lengths.

use anyhow::Result;
use stroketype::core;

/// Run the application with the given CLI arguments.
async fn run_app(cli_args: core::cli::CliArgs) -> Result<()> {
    core::run_app(cli_args).await
}

#[tokio::main]
async fn main() {
    let cli_args = core::platform::get_cli_args();
    match run_app(cli_args).await {
        Ok(()) => {}
        Err(error) => core::platform::handle_error(error),
    }
}
