use std::io::Write;

use anyhow::Result;
use clap::Subcommand;
use resman_core::ResourceManagementClient;

use super::write_all;

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// List tag names and their values.
    List,
}

pub async fn execute(
    command: TagCommand,
    client: &ResourceManagementClient,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        TagCommand::List => write_all(out, client.tags().list()?).await,
    }
}
