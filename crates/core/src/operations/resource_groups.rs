use std::sync::Arc;

use reqwest::Method;
use tracing::instrument;

use super::odata_query;
use crate::error::Result;
use crate::models::{ExportTemplateRequest, GenericResource, ResourceGroup, ResourceGroupExportResult};
use crate::paging::Pager;
use crate::pipeline::Pipeline;
use crate::poller::LroPoller;

pub struct ResourceGroups<'a> {
    pipeline: &'a Arc<Pipeline>,
}

impl<'a> ResourceGroups<'a> {
    pub(crate) fn new(pipeline: &'a Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    fn group_url(&self, name: &str) -> Result<url::Url> {
        self.pipeline.subscription_url(&["resourcegroups", name], &[])
    }

    #[instrument(skip(self, parameters))]
    pub async fn create_or_update(&self, name: &str, parameters: &ResourceGroup) -> Result<ResourceGroup> {
        let body = serde_json::to_value(parameters)?;
        self.pipeline
            .send_expect(Method::PUT, self.group_url(name)?, Some(body), &[200, 201])
            .await?
            .json()
    }

    #[instrument(skip(self))]
    pub async fn get(&self, name: &str) -> Result<ResourceGroup> {
        self.pipeline
            .send_expect(Method::GET, self.group_url(name)?, None, &[200])
            .await?
            .json()
    }

    #[instrument(skip(self))]
    pub async fn check_existence(&self, name: &str) -> Result<bool> {
        self.pipeline.check_existence(self.group_url(name)?).await
    }

    pub fn list(&self, filter: Option<&str>, top: Option<u32>) -> Result<Pager<ResourceGroup>> {
        let url = self
            .pipeline
            .subscription_url(&["resourcegroups"], &odata_query(filter, None, top))?;
        Ok(Pager::new(self.pipeline.clone(), url))
    }

    /// Updates tags and properties of an existing group; only supplied fields change.
    #[instrument(skip(self, parameters))]
    pub async fn patch(&self, name: &str, parameters: &ResourceGroup) -> Result<ResourceGroup> {
        let body = serde_json::to_value(parameters)?;
        self.pipeline
            .send_expect(Method::PATCH, self.group_url(name)?, Some(body), &[200])
            .await?
            .json()
    }

    pub fn list_resources(
        &self,
        name: &str,
        filter: Option<&str>,
        expand: Option<&str>,
        top: Option<u32>,
    ) -> Result<Pager<GenericResource>> {
        let url = self.pipeline.subscription_url(
            &["resourceGroups", name, "resources"],
            &odata_query(filter, expand, top),
        )?;
        Ok(Pager::new(self.pipeline.clone(), url))
    }

    /// Captures the group as a template. `resources` takes resource ids, or `["*"]`
    /// for everything in the group.
    #[instrument(skip(self, resources))]
    pub async fn export_template(
        &self,
        name: &str,
        resources: &[&str],
        options: Option<&str>,
    ) -> Result<ResourceGroupExportResult> {
        let request = ExportTemplateRequest {
            resources: resources.iter().map(|r| r.to_string()).collect(),
            options: options.map(str::to_string),
        };
        let url = self
            .pipeline
            .subscription_url(&["resourcegroups", name, "exportTemplate"], &[])?;
        self.pipeline
            .send_expect(Method::POST, url, Some(serde_json::to_value(request)?), &[200])
            .await?
            .json()
    }

    /// Starts deleting the group and everything in it.
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<LroPoller<()>> {
        let url = self.group_url(name)?;
        let initial = self
            .pipeline
            .send_expect(Method::DELETE, url.clone(), None, &[200, 202])
            .await?;
        Ok(LroPoller::new(self.pipeline.clone(), Method::DELETE, url, initial))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::{pipeline, sub_path};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_or_update_sends_location_and_tags() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(sub_path("resourcegroups/rg1")))
            .and(body_json(json!({"location": "westus", "tags": {"tag1": "value1"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "/subscriptions/sub-1/resourceGroups/rg1",
                "name": "rg1",
                "location": "westus",
                "tags": {"tag1": "value1"},
                "properties": {"provisioningState": "Succeeded"}
            })))
            .mount(&server)
            .await;
        let pipeline = pipeline(&server);

        let group = ResourceGroups::new(&pipeline)
            .create_or_update("rg1", &ResourceGroup::new("westus").with_tag("tag1", "value1"))
            .await
            .unwrap();

        assert_eq!(group.name.as_deref(), Some("rg1"));
        assert_eq!(
            group.properties.and_then(|p| p.provisioning_state).as_deref(),
            Some("Succeeded")
        );
    }

    #[tokio::test]
    async fn test_list_passes_top() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(sub_path("resourcegroups")))
            .and(query_param("$top", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"name": "a"}, {"name": "b"}],
                "nextLink": format!("{}/subscriptions/sub-1/resourcegroups?api-version=2016-09-01&%24skiptoken=x", server.uri())
            })))
            .mount(&server)
            .await;
        let pipeline = pipeline(&server);

        let mut pager = ResourceGroups::new(&pipeline).list(None, Some(2)).unwrap();
        let page = pager.next_page().await.unwrap().unwrap();

        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn test_export_template_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(sub_path("resourcegroups/rg1/exportTemplate")))
            .and(body_json(json!({"resources": ["*"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "template": {"resources": []}
            })))
            .mount(&server)
            .await;
        let pipeline = pipeline(&server);

        let export = ResourceGroups::new(&pipeline)
            .export_template("rg1", &["*"], None)
            .await
            .unwrap();

        assert!(export.template.is_some());
        assert!(export.error.is_none());
    }
}
