use std::io::Write;

use anyhow::{Context, Result};
use clap::Subcommand;
use resman_core::ResourceManagementClient;

use super::{write_all, write_json};
use crate::ux::present_success;

#[derive(Subcommand, Debug)]
pub enum DeploymentCommand {
    /// List deployments of a resource group.
    List {
        group: String,
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        top: Option<u32>,
    },
    /// Show one deployment.
    Show { group: String, name: String },
    /// Cancel a running deployment.
    Cancel { group: String, name: String },
    /// Print the template a deployment used.
    Export { group: String, name: String },
    /// List the operations a deployment performed.
    Operations {
        group: String,
        name: String,
        #[arg(long)]
        top: Option<u32>,
    },
}

pub async fn execute(
    command: DeploymentCommand,
    client: &ResourceManagementClient,
    out: &mut impl Write,
) -> Result<()> {
    let deployments = client.deployments();
    match command {
        DeploymentCommand::List { group, filter, top } => {
            write_all(out, deployments.list(&group, filter.as_deref(), top)?).await
        }
        DeploymentCommand::Show { group, name } => {
            let deployment = deployments
                .get(&group, &name)
                .await
                .with_context(|| format!("Failed to get deployment '{name}' in '{group}'"))?;
            write_json(out, &deployment)
        }
        DeploymentCommand::Cancel { group, name } => {
            deployments
                .cancel(&group, &name)
                .await
                .with_context(|| format!("Failed to cancel deployment '{name}'"))?;
            present_success(&format!("Cancelled deployment '{name}'."));
            Ok(())
        }
        DeploymentCommand::Export { group, name } => {
            let export = deployments
                .export_template(&group, &name)
                .await
                .with_context(|| format!("Failed to export deployment '{name}'"))?;
            write_json(out, &export.template)
        }
        DeploymentCommand::Operations { group, name, top } => {
            let pager = client.deployment_operations().list(&group, &name, top)?;
            write_all(out, pager).await
        }
    }
}
