use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::credential::TokenCredential;
use crate::error::{CloudError, ResourceError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_API_VERSION: &str = "2016-09-01";

const USER_AGENT: &str = concat!("resman/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-cased.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Id the service assigned to this request, quoted in its support cases.
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-ms-request-id")
    }

    /// Id shared by every request the service made on behalf of this one.
    pub fn correlation_id(&self) -> Option<&str> {
        self.header("x-ms-correlation-request-id")
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        // Some operations answer with an empty body where a document is expected
        let body = if self.body.trim().is_empty() {
            "{}"
        } else {
            self.body.as_str()
        };
        Ok(serde_json::from_str(body)?)
    }
}

/// Sends a prepared request and returns the raw response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[derive(Debug, Default, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Splits a path argument, e.g. a parent resource path like `virtualNetworks/vnet1`,
/// into URL segments. An empty path yields nothing.
pub(crate) fn path_pieces(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|piece| !piece.is_empty())
}

/// Shared request machinery behind every operation group, pager and poller.
pub struct Pipeline {
    endpoint: Url,
    subscription_id: String,
    api_version: String,
    scope: String,
    poll_interval: Duration,
    credential: Arc<dyn TokenCredential>,
    transport: Arc<dyn Transport>,
    requests_sent: AtomicU64,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("endpoint", &self.endpoint.as_str())
            .field("subscription_id", &self.subscription_id)
            .field("api_version", &self.api_version)
            .field("poll_interval", &self.poll_interval)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(
        endpoint: Url,
        subscription_id: String,
        api_version: String,
        poll_interval: Duration,
        credential: Arc<dyn TokenCredential>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let scope = format!("{}/.default", endpoint.as_str().trim_end_matches('/'));
        Self {
            endpoint,
            subscription_id,
            api_version,
            scope,
            poll_interval,
            credential,
            transport,
            requests_sent: AtomicU64::new(0),
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Builds a request URL under the subscription from path segments and query pairs.
    ///
    /// Each segment is percent-encoded as a whole, so a `/` inside a name becomes
    /// `%2F`. Empty segments are dropped. Use [`path_pieces`] for arguments that are
    /// themselves paths.
    pub fn subscription_url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url> {
        let mut all = vec!["subscriptions", self.subscription_id.as_str()];
        all.extend_from_slice(segments);
        self.url_with_version(&all, &self.api_version, query)
    }

    pub fn url_with_version(
        &self,
        segments: &[&str],
        api_version: &str,
        query: &[(&str, String)],
    ) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ResourceError::Config(format!("Endpoint cannot be a base: {}", self.endpoint))
            })?;
            path.pop_if_empty();
            for segment in segments.iter().filter(|s| !s.is_empty()) {
                path.push(segment);
            }
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-version", api_version);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub async fn send(&self, method: Method, url: Url, body: Option<Value>) -> Result<HttpResponse> {
        let token = self.credential.get_token(&self.scope).await?;
        let mut headers = vec![
            ("authorization".to_string(), format!("Bearer {}", token.token)),
            ("accept".to_string(), "application/json".to_string()),
            ("user-agent".to_string(), USER_AGENT.to_string()),
        ];
        if body.is_some() {
            headers.push((
                "content-type".to_string(),
                "application/json; charset=utf-8".to_string(),
            ));
        }

        // Numbered so request and response lines pair up in the log
        let seq = self.requests_sent.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(seq, %method, %url, "sending request");
        let response = self
            .transport
            .send(HttpRequest {
                method: method.clone(),
                url: url.clone(),
                headers,
                body,
            })
            .await?;
        debug!(
            seq,
            status = response.status,
            request_id = response.request_id().unwrap_or("-"),
            correlation_id = response.correlation_id().unwrap_or("-"),
            "received response"
        );
        Ok(response)
    }

    /// Sends a request and turns any status outside `ok_statuses` into a [`CloudError`].
    pub async fn send_expect(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        ok_statuses: &[u16],
    ) -> Result<HttpResponse> {
        let response = self.send(method, url, body).await?;
        if ok_statuses.contains(&response.status) {
            Ok(response)
        } else {
            let err = CloudError::from_response(response.status, &response.body);
            warn!(
                status = response.status,
                code = %err.code,
                request_id = response.request_id().unwrap_or("-"),
                "service returned an error"
            );
            Err(err.into())
        }
    }

    /// HEAD request answering whether the addressed entity exists.
    pub async fn check_existence(&self, url: Url) -> Result<bool> {
        let response = self.send_expect(Method::HEAD, url, None, &[204, 404]).await?;
        Ok(response.status == 204)
    }
}
