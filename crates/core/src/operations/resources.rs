use std::sync::Arc;

use reqwest::Method;
use tracing::instrument;
use url::Url;

use super::odata_query;
use crate::error::{ResourceError, Result};
use crate::models::{GenericResource, ResourcesMoveInfo};
use crate::paging::Pager;
use crate::pipeline::{Pipeline, path_pieces};
use crate::poller::LroPoller;
use crate::resource_id::ResourceId;

/// Where a generic resource lives and which api-version its provider speaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    pub resource_group_name: String,
    pub resource_provider_namespace: String,
    /// Empty for top-level resources, e.g. `virtualNetworks/vnet1` for a subnet.
    pub parent_resource_path: String,
    pub resource_type: String,
    pub resource_name: String,
    pub api_version: String,
}

impl ResourceLocator {
    pub fn new(
        resource_group_name: impl Into<String>,
        resource_provider_namespace: impl Into<String>,
        resource_type: impl Into<String>,
        resource_name: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            resource_group_name: resource_group_name.into(),
            resource_provider_namespace: resource_provider_namespace.into(),
            parent_resource_path: String::new(),
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
            api_version: api_version.into(),
        }
    }

    pub fn with_parent(mut self, parent_resource_path: impl Into<String>) -> Self {
        self.parent_resource_path = parent_resource_path.into();
        self
    }

    /// Builds a locator from a full resource id.
    pub fn from_id(id: &str, api_version: impl Into<String>) -> Result<Self> {
        let parsed = ResourceId::parse(id)?;
        let invalid = || ResourceError::InvalidResourceId(id.to_string());

        let group = parsed.resource_group().ok_or_else(invalid)?;
        let namespace = parsed.provider_namespace().ok_or_else(invalid)?;
        let full_type = parsed.resource_type().ok_or_else(invalid)?;
        let name = parsed.name().ok_or_else(invalid)?;
        let resource_type = full_type.rsplit('/').next().unwrap_or(&full_type).to_string();

        Ok(Self {
            resource_group_name: group.to_string(),
            resource_provider_namespace: namespace.to_string(),
            parent_resource_path: parsed.parent_resource_path(),
            resource_type,
            resource_name: name.to_string(),
            api_version: api_version.into(),
        })
    }
}

pub struct Resources<'a> {
    pipeline: &'a Arc<Pipeline>,
}

impl<'a> Resources<'a> {
    pub(crate) fn new(pipeline: &'a Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    fn resource_url(&self, locator: &ResourceLocator) -> Result<Url> {
        let mut segments = vec![
            "subscriptions",
            self.pipeline.subscription_id(),
            "resourcegroups",
            locator.resource_group_name.as_str(),
            "providers",
            locator.resource_provider_namespace.as_str(),
        ];
        segments.extend(path_pieces(&locator.parent_resource_path));
        segments.extend(path_pieces(&locator.resource_type));
        segments.push(locator.resource_name.as_str());
        self.pipeline
            .url_with_version(&segments, &locator.api_version, &[])
    }

    #[instrument(skip(self))]
    pub async fn check_existence(&self, locator: &ResourceLocator) -> Result<bool> {
        self.pipeline.check_existence(self.resource_url(locator)?).await
    }

    /// Creates or replaces a resource, waiting for provisioning when the provider
    /// answers asynchronously.
    #[instrument(skip(self, parameters))]
    pub async fn create_or_update(
        &self,
        locator: &ResourceLocator,
        parameters: &GenericResource,
    ) -> Result<GenericResource> {
        let url = self.resource_url(locator)?;
        let initial = self
            .pipeline
            .send_expect(
                Method::PUT,
                url.clone(),
                Some(serde_json::to_value(parameters)?),
                &[200, 201, 202],
            )
            .await?;
        LroPoller::new(self.pipeline.clone(), Method::PUT, url, initial)
            .result()
            .await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, locator: &ResourceLocator) -> Result<GenericResource> {
        self.pipeline
            .send_expect(Method::GET, self.resource_url(locator)?, None, &[200])
            .await?
            .json()
    }

    /// Lists resources across the subscription.
    pub fn list(
        &self,
        filter: Option<&str>,
        expand: Option<&str>,
        top: Option<u32>,
    ) -> Result<Pager<GenericResource>> {
        let url = self
            .pipeline
            .subscription_url(&["resources"], &odata_query(filter, expand, top))?;
        Ok(Pager::new(self.pipeline.clone(), url))
    }

    /// Moves resources from `source_resource_group` into the group with id
    /// `target_resource_group`.
    #[instrument(skip(self, resources))]
    pub async fn move_resources(
        &self,
        source_resource_group: &str,
        resources: &[String],
        target_resource_group: &str,
    ) -> Result<LroPoller<()>> {
        let target = ResourceId::parse(target_resource_group)?;
        if !target.is_resource_group() {
            return Err(ResourceError::InvalidResourceId(format!(
                "{target_resource_group} is not a resource group id"
            )));
        }

        let body = ResourcesMoveInfo {
            resources: resources.to_vec(),
            target_resource_group: target_resource_group.to_string(),
        };
        let url = self.pipeline.subscription_url(
            &["resourceGroups", source_resource_group, "moveResources"],
            &[],
        )?;
        let initial = self
            .pipeline
            .send_expect(
                Method::POST,
                url.clone(),
                Some(serde_json::to_value(body)?),
                &[202, 204],
            )
            .await?;
        Ok(LroPoller::new(self.pipeline.clone(), Method::POST, url, initial))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, locator: &ResourceLocator) -> Result<LroPoller<()>> {
        let url = self.resource_url(locator)?;
        let initial = self
            .pipeline
            .send_expect(Method::DELETE, url.clone(), None, &[200, 202, 204])
            .await?;
        Ok(LroPoller::new(self.pipeline.clone(), Method::DELETE, url, initial))
    }
}
