mod cli;
mod commands;
mod log;
mod ux;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = cli::run_app().await {
        ux::present_error(e);
        std::process::exit(1);
    }
    Ok(())
}
