use std::io::Write;

use anyhow::{Context, Result};
use clap::Subcommand;
use resman_core::ResourceManagementClient;
use resman_core::models::ResourceGroup;

use super::{write_all, write_json};
use crate::ux::present_success;

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// List resource groups.
    List {
        /// OData filter, e.g. "tagName eq 'env'".
        #[arg(long)]
        filter: Option<String>,
        /// Page size requested from the service.
        #[arg(long)]
        top: Option<u32>,
    },
    /// Show one resource group.
    Show { name: String },
    /// Print whether a resource group exists.
    Exists { name: String },
    /// Create or update a resource group.
    Create {
        name: String,
        #[arg(short, long)]
        location: String,
        /// Tag as key=value; repeat for more.
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
    },
    /// Delete a resource group and everything in it.
    Delete {
        name: String,
        /// Return once the service accepts the request.
        #[arg(long)]
        no_wait: bool,
    },
}

pub(crate) fn parse_tag(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), val.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{value}'")),
    }
}

pub async fn execute(
    command: GroupCommand,
    client: &ResourceManagementClient,
    out: &mut impl Write,
) -> Result<()> {
    let groups = client.resource_groups();
    match command {
        GroupCommand::List { filter, top } => {
            write_all(out, groups.list(filter.as_deref(), top)?).await
        }
        GroupCommand::Show { name } => {
            let group = groups
                .get(&name)
                .await
                .with_context(|| format!("Failed to get resource group '{name}'"))?;
            write_json(out, &group)
        }
        GroupCommand::Exists { name } => {
            let exists = groups.check_existence(&name).await?;
            writeln!(out, "{exists}")?;
            Ok(())
        }
        GroupCommand::Create {
            name,
            location,
            tags,
        } => {
            let parameters = tags
                .into_iter()
                .fold(ResourceGroup::new(location), |group, (k, v)| {
                    group.with_tag(k, v)
                });
            let group = groups
                .create_or_update(&name, &parameters)
                .await
                .with_context(|| format!("Failed to create resource group '{name}'"))?;
            write_json(out, &group)
        }
        GroupCommand::Delete { name, no_wait } => {
            let poller = groups
                .delete(&name)
                .await
                .with_context(|| format!("Failed to delete resource group '{name}'"))?;
            if no_wait {
                present_success(&format!("Deletion of '{name}' accepted."));
                return Ok(());
            }
            poller.wait().await?;
            present_success(&format!("Deleted resource group '{name}'."));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_utils::{client, output, sub_path};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_tag() {
        assert_eq!(
            parse_tag("env = dev").unwrap(),
            ("env".to_string(), "dev".to_string())
        );
        assert_eq!(
            parse_tag("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_tag("=dev").is_err());
        assert!(parse_tag("novalue").is_err());
    }

    #[tokio::test]
    async fn test_create_sends_tags_and_prints_group() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(sub_path("resourcegroups/rg1")))
            .and(body_json(json!({"location": "westus", "tags": {"env": "dev"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "/subscriptions/sub-cli/resourceGroups/rg1",
                "name": "rg1",
                "location": "westus",
                "tags": {"env": "dev"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        let command = GroupCommand::Create {
            name: "rg1".to_string(),
            location: "westus".to_string(),
            tags: vec![("env".to_string(), "dev".to_string())],
        };
        let mut buf = Vec::new();

        // Act
        execute(command, &client(&server), &mut buf).await.unwrap();

        // Assert
        let printed = output(buf);
        assert_eq!(printed["name"], "rg1");
        assert_eq!(printed["tags"]["env"], "dev");
    }

    #[tokio::test]
    async fn test_list_prints_every_page_as_one_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(sub_path("resourcegroups")))
            .and(query_param("skiptoken", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"value": [{"name": "rg2"}]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(sub_path("resourcegroups")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"name": "rg1"}],
                "nextLink": format!("{}{}?api-version=2016-09-01&skiptoken=2", server.uri(), sub_path("resourcegroups"))
            })))
            .mount(&server)
            .await;
        let mut buf = Vec::new();

        execute(
            GroupCommand::List {
                filter: None,
                top: None,
            },
            &client(&server),
            &mut buf,
        )
        .await
        .unwrap();

        let printed = output(buf);
        assert_eq!(printed, json!([{"name": "rg1"}, {"name": "rg2"}]));
    }

    #[tokio::test]
    async fn test_exists_prints_false_for_missing_group() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path(sub_path("resourcegroups/missing")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let mut buf = Vec::new();

        execute(
            GroupCommand::Exists {
                name: "missing".to_string(),
            },
            &client(&server),
            &mut buf,
        )
        .await
        .unwrap();

        assert_eq!(String::from_utf8(buf).unwrap(), "false\n");
    }

    #[tokio::test]
    async fn test_show_adds_context_to_service_fault() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(sub_path("resourcegroups/gone")))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "ResourceGroupNotFound", "message": "Resource group 'gone' could not be found."}
            })))
            .mount(&server)
            .await;
        let mut buf = Vec::new();

        let err = execute(
            GroupCommand::Show {
                name: "gone".to_string(),
            },
            &client(&server),
            &mut buf,
        )
        .await
        .unwrap_err();

        let text = format!("{err:#}");
        assert!(text.contains("Failed to get resource group 'gone'"));
        assert!(text.contains("ResourceGroupNotFound"));
        assert!(buf.is_empty());
    }
}
