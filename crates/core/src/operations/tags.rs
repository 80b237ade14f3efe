use std::sync::Arc;

use reqwest::Method;
use tracing::instrument;

use crate::error::Result;
use crate::models::{TagDetails, TagValue};
use crate::paging::Pager;
use crate::pipeline::Pipeline;

/// Subscription-level tag names and values.
pub struct Tags<'a> {
    pipeline: &'a Arc<Pipeline>,
}

impl<'a> Tags<'a> {
    pub(crate) fn new(pipeline: &'a Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    #[instrument(skip(self))]
    pub async fn create_or_update(&self, tag_name: &str) -> Result<TagDetails> {
        let url = self.pipeline.subscription_url(&["tagNames", tag_name], &[])?;
        self.pipeline
            .send_expect(Method::PUT, url, None, &[200, 201])
            .await?
            .json()
    }

    #[instrument(skip(self))]
    pub async fn create_or_update_value(&self, tag_name: &str, tag_value: &str) -> Result<TagValue> {
        let url = self
            .pipeline
            .subscription_url(&["tagNames", tag_name, "tagValues", tag_value], &[])?;
        self.pipeline
            .send_expect(Method::PUT, url, None, &[200, 201])
            .await?
            .json()
    }

    pub fn list(&self) -> Result<Pager<TagDetails>> {
        let url = self.pipeline.subscription_url(&["tagNames"], &[])?;
        Ok(Pager::new(self.pipeline.clone(), url))
    }

    #[instrument(skip(self))]
    pub async fn delete_value(&self, tag_name: &str, tag_value: &str) -> Result<()> {
        let url = self
            .pipeline
            .subscription_url(&["tagNames", tag_name, "tagValues", tag_value], &[])?;
        self.pipeline
            .send_expect(Method::DELETE, url, None, &[200, 204])
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, tag_name: &str) -> Result<()> {
        let url = self.pipeline.subscription_url(&["tagNames", tag_name], &[])?;
        self.pipeline
            .send_expect(Method::DELETE, url, None, &[200, 204])
            .await?;
        Ok(())
    }
}
