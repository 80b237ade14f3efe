use std::sync::Arc;

use reqwest::Method;
use tracing::instrument;

use super::odata_query;
use crate::error::Result;
use crate::models::Provider;
use crate::paging::Pager;
use crate::pipeline::Pipeline;

/// Resource provider registration for the subscription.
pub struct Providers<'a> {
    pipeline: &'a Arc<Pipeline>,
}

impl<'a> Providers<'a> {
    pub(crate) fn new(pipeline: &'a Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    /// `expand` may be e.g. `resourceTypes/aliases`.
    #[instrument(skip(self))]
    pub async fn get(&self, namespace: &str, expand: Option<&str>) -> Result<Provider> {
        let url = self
            .pipeline
            .subscription_url(&["providers", namespace], &odata_query(None, expand, None))?;
        self.pipeline
            .send_expect(Method::GET, url, None, &[200])
            .await?
            .json()
    }

    #[instrument(skip(self))]
    pub async fn register(&self, namespace: &str) -> Result<Provider> {
        self.registration(namespace, "register").await
    }

    #[instrument(skip(self))]
    pub async fn unregister(&self, namespace: &str) -> Result<Provider> {
        self.registration(namespace, "unregister").await
    }

    async fn registration(&self, namespace: &str, action: &str) -> Result<Provider> {
        let url = self
            .pipeline
            .subscription_url(&["providers", namespace, action], &[])?;
        self.pipeline
            .send_expect(Method::POST, url, None, &[200])
            .await?
            .json()
    }

    pub fn list(&self, top: Option<u32>, expand: Option<&str>) -> Result<Pager<Provider>> {
        let url = self
            .pipeline
            .subscription_url(&["providers"], &odata_query(None, expand, top))?;
        Ok(Pager::new(self.pipeline.clone(), url))
    }
}
