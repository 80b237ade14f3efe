use std::io::Write;

use anyhow::{Context, Result};
use clap::Subcommand;
use resman_core::ResourceManagementClient;

use super::{write_all, write_json};

#[derive(Subcommand, Debug)]
pub enum ProviderCommand {
    /// List resource providers.
    List {
        #[arg(long)]
        top: Option<u32>,
        /// e.g. "resourceTypes/aliases".
        #[arg(long)]
        expand: Option<String>,
    },
    /// Show one provider with its resource types and locations.
    Show {
        namespace: String,
        #[arg(long)]
        expand: Option<String>,
    },
    /// Register the subscription with a provider.
    Register { namespace: String },
    /// Unregister the subscription from a provider.
    Unregister { namespace: String },
}

pub async fn execute(
    command: ProviderCommand,
    client: &ResourceManagementClient,
    out: &mut impl Write,
) -> Result<()> {
    let providers = client.providers();
    let provider = match command {
        ProviderCommand::List { top, expand } => {
            return write_all(out, providers.list(top, expand.as_deref())?).await;
        }
        ProviderCommand::Show { namespace, expand } => providers
            .get(&namespace, expand.as_deref())
            .await
            .with_context(|| format!("Failed to get provider '{namespace}'"))?,
        ProviderCommand::Register { namespace } => providers
            .register(&namespace)
            .await
            .with_context(|| format!("Failed to register provider '{namespace}'"))?,
        ProviderCommand::Unregister { namespace } => providers
            .unregister(&namespace)
            .await
            .with_context(|| format!("Failed to unregister provider '{namespace}'"))?,
    };
    write_json(out, &provider)
}
