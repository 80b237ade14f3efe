use std::io::Write;

use anyhow::Result;
use futures::TryStreamExt;
use resman_core::ResourceManagementClient;
use resman_core::paging::Pager;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cli::Commands;

pub mod deployment;
pub mod group;
pub mod provider;
pub mod tag;

pub async fn execute(
    command: Commands,
    client: &ResourceManagementClient,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Commands::Group(cmd) => group::execute(cmd, client, out).await,
        Commands::Tag(cmd) => tag::execute(cmd, client, out).await,
        Commands::Provider(cmd) => provider::execute(cmd, client, out).await,
        Commands::Deployment(cmd) => deployment::execute(cmd, client, out).await,
    }
}

pub(crate) fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Reads every page and writes the items as one JSON array.
pub(crate) async fn write_all<T>(out: &mut impl Write, pager: Pager<T>) -> Result<()>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    let items: Vec<T> = pager.into_stream().try_collect().await?;
    write_json(out, &items)
}
