use std::marker::PhantomData;
use std::sync::Arc;

use futures::stream::BoxStream;
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Result;
use crate::pipeline::Pipeline;

#[derive(Deserialize, Debug)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Page<T> {
    #[serde(default)]
    value: Vec<T>,
    #[serde(rename = "nextLink", default)]
    next_link: Option<String>,
}

/// Walks a list operation page by page, following the service's `nextLink`.
pub struct Pager<T> {
    pipeline: Arc<Pipeline>,
    next: Option<Url>,
    _item: PhantomData<fn() -> T>,
}

impl<T> Pager<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub(crate) fn new(pipeline: Arc<Pipeline>, first: Url) -> Self {
        Self {
            pipeline,
            next: Some(first),
            _item: PhantomData,
        }
    }

    /// Fetches the next page, or `None` once every page has been read.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        let Some(url) = self.next.take() else {
            return Ok(None);
        };

        let response = self
            .pipeline
            .send_expect(Method::GET, url, None, &[200])
            .await?;
        let page: Page<T> = response.json()?;

        self.next = match page.next_link.as_deref().filter(|l| !l.is_empty()) {
            Some(link) => Some(Url::parse(link)?),
            None => None,
        };
        Ok(Some(page.value))
    }

    /// Reads every remaining page and returns all items.
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }

    /// Yields items one at a time, fetching pages as needed.
    pub fn into_stream(mut self) -> BoxStream<'static, Result<T>> {
        let stream = async_stream::stream! {
            loop {
                match self.next_page().await {
                    Ok(Some(page)) => {
                        for item in page {
                            yield Ok(item);
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        };
        Box::pin(stream)
    }
}
