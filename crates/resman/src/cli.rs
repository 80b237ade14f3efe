use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use resman_core::ResourceManagementClient;
use resman_core::config::get_config;
use tracing::debug;

use crate::commands::{
    self, deployment::DeploymentCommand, group::GroupCommand, provider::ProviderCommand,
    tag::TagCommand,
};
use crate::log::setup_logging;

/// resman - manage resource groups, deployments and providers of a subscription.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log to `<data_dir>/resman.log`; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of `<config_dir>/resman.yml`.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resource groups.
    #[command(subcommand)]
    Group(GroupCommand),
    /// Subscription tags.
    #[command(subcommand)]
    Tag(TagCommand),
    /// Resource providers.
    #[command(subcommand)]
    Provider(ProviderCommand),
    /// Template deployments in a resource group.
    #[command(subcommand)]
    Deployment(DeploymentCommand),
}

pub async fn run_app() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to set up logging")?;

    let config = get_config(cli.config.clone()).context("Failed to load configuration")?;
    let client =
        ResourceManagementClient::from_config(&config).context("Failed to create client")?;
    debug!(subscription = client.subscription_id(), command = ?cli.command, "running command");

    let mut out = std::io::stdout().lock();
    commands::execute(cli.command, &client, &mut out).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group_create_with_tags() {
        let cli = Cli::try_parse_from([
            "resman", "group", "create", "rg1", "--location", "westus", "--tag", "env=dev",
            "--tag", "owner=me",
        ])
        .unwrap();

        match cli.command {
            Commands::Group(GroupCommand::Create {
                name,
                location,
                tags,
            }) => {
                assert_eq!(name, "rg1");
                assert_eq!(location, "westus");
                assert_eq!(
                    tags,
                    vec![
                        ("env".to_string(), "dev".to_string()),
                        ("owner".to_string(), "me".to_string())
                    ]
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_tag() {
        let err = Cli::try_parse_from([
            "resman", "group", "create", "rg1", "--location", "westus", "--tag", "novalue",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("key=value"));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "resman",
            "deployment",
            "show",
            "rg1",
            "dep1",
            "--verbose",
            "--config",
            "/tmp/resman.yml",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/resman.yml")));
        assert!(matches!(
            cli.command,
            Commands::Deployment(DeploymentCommand::Show { ref group, ref name })
                if group == "rg1" && name == "dep1"
        ));
    }

    #[test]
    fn test_parse_repeated_verbose() {
        let cli = Cli::try_parse_from(["resman", "-vv", "tag", "list"]).unwrap();
        assert_eq!(cli.verbose, 2);

        let cli = Cli::try_parse_from(["resman", "tag", "list"]).unwrap();
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_provider_list_with_top() {
        let cli = Cli::try_parse_from(["resman", "provider", "list", "--top", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Provider(ProviderCommand::List { top: Some(5), .. })
        ));
    }
}
