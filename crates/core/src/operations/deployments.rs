use std::sync::Arc;

use reqwest::Method;
use tracing::instrument;
use url::Url;

use super::odata_query;
use crate::error::Result;
use crate::models::{
    Deployment, DeploymentExportResult, DeploymentExtended, DeploymentProperties,
    DeploymentValidateResult,
};
use crate::paging::Pager;
use crate::pipeline::Pipeline;
use crate::poller::LroPoller;

/// Template deployments within a resource group.
pub struct Deployments<'a> {
    pipeline: &'a Arc<Pipeline>,
}

impl<'a> Deployments<'a> {
    pub(crate) fn new(pipeline: &'a Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    fn deployments_url(
        &self,
        group: &str,
        rest: &[&str],
        query: &[(&str, String)],
    ) -> Result<Url> {
        let mut segments = vec![
            "resourcegroups",
            group,
            "providers",
            "Microsoft.Resources",
            "deployments",
        ];
        segments.extend_from_slice(rest);
        self.pipeline.subscription_url(&segments, query)
    }

    #[instrument(skip(self))]
    pub async fn check_existence(&self, group: &str, name: &str) -> Result<bool> {
        self.pipeline
            .check_existence(self.deployments_url(group, &[name], &[])?)
            .await
    }

    /// Submits a deployment. The service provisions it asynchronously; await the
    /// returned poller's `result()` for the finished deployment.
    #[instrument(skip(self, properties))]
    pub async fn create_or_update(
        &self,
        group: &str,
        name: &str,
        properties: DeploymentProperties,
    ) -> Result<LroPoller<DeploymentExtended>> {
        let url = self.deployments_url(group, &[name], &[])?;
        let body = serde_json::to_value(Deployment {
            properties: Some(properties),
        })?;
        let initial = self
            .pipeline
            .send_expect(Method::PUT, url.clone(), Some(body), &[200, 201])
            .await?;
        Ok(LroPoller::new(self.pipeline.clone(), Method::PUT, url, initial))
    }

    pub fn list(
        &self,
        group: &str,
        filter: Option<&str>,
        top: Option<u32>,
    ) -> Result<Pager<DeploymentExtended>> {
        let url = self.deployments_url(group, &[], &odata_query(filter, None, top))?;
        Ok(Pager::new(self.pipeline.clone(), url))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, group: &str, name: &str) -> Result<DeploymentExtended> {
        self.pipeline
            .send_expect(
                Method::GET,
                self.deployments_url(group, &[name], &[])?,
                None,
                &[200],
            )
            .await?
            .json()
    }

    /// Cancels a deployment that is still running. Finished deployments cannot be
    /// cancelled and the service answers with a fault.
    #[instrument(skip(self))]
    pub async fn cancel(&self, group: &str, name: &str) -> Result<()> {
        self.pipeline
            .send_expect(
                Method::POST,
                self.deployments_url(group, &[name, "cancel"], &[])?,
                None,
                &[204],
            )
            .await?;
        Ok(())
    }

    /// Checks whether a deployment would be accepted. Both outcomes are returned as
    /// values; a rejected template comes back with `error` set.
    #[instrument(skip(self, properties))]
    pub async fn validate(
        &self,
        group: &str,
        name: &str,
        properties: Option<DeploymentProperties>,
    ) -> Result<DeploymentValidateResult> {
        let body = serde_json::to_value(Deployment { properties })?;
        self.pipeline
            .send_expect(
                Method::POST,
                self.deployments_url(group, &[name, "validate"], &[])?,
                Some(body),
                &[200, 400],
            )
            .await?
            .json()
    }

    #[instrument(skip(self))]
    pub async fn export_template(&self, group: &str, name: &str) -> Result<DeploymentExportResult> {
        self.pipeline
            .send_expect(
                Method::POST,
                self.deployments_url(group, &[name, "exportTemplate"], &[])?,
                None,
                &[200],
            )
            .await?
            .json()
    }

    /// Removes the deployment from history; deployed resources are kept.
    #[instrument(skip(self))]
    pub async fn delete(&self, group: &str, name: &str) -> Result<LroPoller<()>> {
        let url = self.deployments_url(group, &[name], &[])?;
        let initial = self
            .pipeline
            .send_expect(Method::DELETE, url.clone(), None, &[202, 204])
            .await?;
        Ok(LroPoller::new(self.pipeline.clone(), Method::DELETE, url, initial))
    }
}
