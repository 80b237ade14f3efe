use std::sync::Arc;

use reqwest::Method;
use tracing::instrument;

use super::odata_query;
use crate::error::Result;
use crate::models::DeploymentOperation;
use crate::paging::Pager;
use crate::pipeline::Pipeline;

/// The individual steps of a deployment.
pub struct DeploymentOperations<'a> {
    pipeline: &'a Arc<Pipeline>,
}

impl<'a> DeploymentOperations<'a> {
    pub(crate) fn new(pipeline: &'a Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    pub fn list(
        &self,
        group: &str,
        deployment: &str,
        top: Option<u32>,
    ) -> Result<Pager<DeploymentOperation>> {
        let url = self.pipeline.subscription_url(
            &[
                "resourcegroups",
                group,
                "deployments",
                deployment,
                "operations",
            ],
            &odata_query(None, None, top),
        )?;
        Ok(Pager::new(self.pipeline.clone(), url))
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        group: &str,
        deployment: &str,
        operation_id: &str,
    ) -> Result<DeploymentOperation> {
        let url = self.pipeline.subscription_url(
            &[
                "resourcegroups",
                group,
                "deployments",
                deployment,
                "operations",
                operation_id,
            ],
            &[],
        )?;
        self.pipeline
            .send_expect(Method::GET, url, None, &[200])
            .await?
            .json()
    }
}
