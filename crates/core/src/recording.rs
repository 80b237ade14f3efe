//! Record and replay of HTTP interactions.
//!
//! A [`RecordingTransport`] captures every exchange with the live service into a
//! [`Cassette`], scrubbed of subscription ids and hosts. A [`PlaybackTransport`] later
//! serves the same exchanges, strictly in order, without touching the network.
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ResourceError, Result};
use crate::pipeline::{HttpRequest, HttpResponse, Transport};

pub const ZERO_SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";
pub const TEST_MODE_ENV: &str = "RESMAN_TEST_MODE";

/// Response headers worth keeping in a cassette.
const KEPT_HEADERS: &[&str] = &["azure-asyncoperation", "location", "retry-after", "content-type"];

static SUBSCRIPTION_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(/subscriptions/)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("subscription pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMode {
    /// Serve recorded interactions.
    Playback,
    /// Talk to the service and write what happened to a cassette.
    Record,
    /// Talk to the service without recording.
    Live,
}

impl TestMode {
    pub fn from_env() -> Self {
        std::env::var(TEST_MODE_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or(TestMode::Playback)
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "record" => TestMode::Record,
            "live" => TestMode::Live,
            _ => TestMode::Playback,
        }
    }

    pub fn is_live(&self) -> bool {
        !matches!(self, TestMode::Playback)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query only; the host is not recorded.
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RecordedResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Interaction {
    pub request: RecordedRequest,
    pub response: RecordedResponse,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Cassette {
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}

/// Path and query of a URL, e.g. `/subscriptions/x/tagNames?api-version=2016-09-01`.
fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}

/// Replaces real identifiers before anything is written to disk.
#[derive(Debug, Clone)]
pub struct Scrubber {
    subscription_id: String,
}

impl Scrubber {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
        }
    }

    pub fn scrub(&self, text: &str) -> String {
        let text = if self.subscription_id.is_empty() {
            text.to_string()
        } else {
            text.replace(&self.subscription_id, ZERO_SUBSCRIPTION)
        };
        SUBSCRIPTION_PATH
            .replace_all(&text, format!("${{1}}{ZERO_SUBSCRIPTION}"))
            .into_owned()
    }

    /// Scrubs a header value, reducing absolute URLs to path and query.
    fn scrub_header(&self, value: &str) -> String {
        match Url::parse(value) {
            Ok(url) if url.has_host() => self.scrub(&path_and_query(&url)),
            _ => self.scrub(value),
        }
    }

    fn interaction(&self, request: &HttpRequest, response: &HttpResponse) -> Interaction {
        let headers = response
            .headers
            .iter()
            .filter(|(name, _)| KEPT_HEADERS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), self.scrub_header(value)))
            .collect();

        Interaction {
            request: RecordedRequest {
                method: request.method.to_string(),
                uri: self.scrub(&path_and_query(&request.url)),
                body: request.body.as_ref().map(|b| self.scrub(&b.to_string())),
            },
            response: RecordedResponse {
                status: response.status,
                headers,
                body: self.scrub(&response.body),
            },
        }
    }
}

/// Passes requests to another transport and keeps a scrubbed copy of each exchange.
pub struct RecordingTransport {
    inner: Arc<dyn Transport>,
    path: PathBuf,
    scrubber: Scrubber,
    cassette: Mutex<Cassette>,
}

impl RecordingTransport {
    pub fn new(inner: Arc<dyn Transport>, path: impl Into<PathBuf>, scrubber: Scrubber) -> Self {
        Self {
            inner,
            path: path.into(),
            scrubber,
            cassette: Mutex::new(Cassette::default()),
        }
    }

    pub fn cassette(&self) -> Cassette {
        self.cassette
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Writes everything recorded so far to the cassette file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn save(&self) -> Result<()> {
        let cassette = self.cassette();
        debug!(interactions = cassette.interactions.len(), "saving cassette");
        cassette.save(&self.path)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.inner.send(request.clone()).await?;
        let interaction = self.scrubber.interaction(&request, &response);
        match self.cassette.lock() {
            Ok(mut cassette) => cassette.interactions.push(interaction),
            Err(poisoned) => poisoned.into_inner().interactions.push(interaction),
        }
        Ok(response)
    }
}

/// Serves a cassette's interactions in recorded order.
///
/// Each request must match the next interaction's method and path-and-query.
/// Hosts are ignored, so status URLs recorded in headers resolve against any
/// endpoint.
pub struct PlaybackTransport {
    subscription_id: String,
    pending: Mutex<VecDeque<Interaction>>,
}

impl PlaybackTransport {
    pub fn new(cassette: Cassette) -> Self {
        Self::with_subscription(cassette, ZERO_SUBSCRIPTION)
    }

    /// Playback for a client configured with `subscription_id`; it is scrubbed
    /// from requests before matching.
    pub fn with_subscription(cassette: Cassette, subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            pending: Mutex::new(cassette.interactions.into()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(Cassette::load(path)?))
    }

    pub fn remaining(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn next_interaction(&self) -> Result<Option<Interaction>> {
        self.pending
            .lock()
            .map(|mut p| p.pop_front())
            .map_err(|_| ResourceError::Playback("cassette lock poisoned".to_string()))
    }
}

#[async_trait]
impl Transport for PlaybackTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let scrubber = Scrubber::new(self.subscription_id.clone());
        let method = request.method.to_string();
        let uri = scrubber.scrub(&path_and_query(&request.url));

        let interaction = self.next_interaction()?.ok_or_else(|| {
            ResourceError::Playback(format!("no recorded interaction left for {method} {uri}"))
        })?;

        if !interaction.request.method.eq_ignore_ascii_case(&method) || interaction.request.uri != uri
        {
            return Err(ResourceError::Playback(format!(
                "expected {} {}, got {method} {uri}",
                interaction.request.method, interaction.request.uri
            )));
        }

        // Status URLs were recorded path-only; point them back at the caller's host
        let headers: HashMap<String, String> = interaction
            .response
            .headers
            .into_iter()
            .map(|(name, value)| {
                let value = if value.starts_with('/') {
                    request.url.join(&value).map(String::from).unwrap_or(value)
                } else {
                    value
                };
                (name.to_ascii_lowercase(), value)
            })
            .collect();

        Ok(HttpResponse {
            status: interaction.response.status,
            headers,
            body: interaction.response.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::json;

    const SUB: &str = "12345678-aaaa-bbbb-cccc-1234567890ab";

    fn request(method: Method, url: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: Url::parse(url).unwrap(),
            headers: vec![("authorization".into(), "Bearer secret".into())],
            body: None,
        }
    }

    struct FixedTransport(HttpResponse);

    #[async_trait]
    impl Transport for FixedTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_test_mode_parse() {
        assert_eq!(TestMode::parse("Record"), TestMode::Record);
        assert_eq!(TestMode::parse(" live "), TestMode::Live);
        assert_eq!(TestMode::parse("anything"), TestMode::Playback);
        assert!(!TestMode::Playback.is_live());
    }

    #[test]
    fn test_scrubber_replaces_subscription_ids() {
        let scrubber = Scrubber::new(SUB);
        let other = "/subscriptions/ABCDEF01-2345-6789-abcd-ef0123456789/resourcegroups/g";

        assert_eq!(
            scrubber.scrub(&format!("/subscriptions/{SUB}/tagNames")),
            format!("/subscriptions/{ZERO_SUBSCRIPTION}/tagNames")
        );
        assert_eq!(
            scrubber.scrub(other),
            format!("/subscriptions/{ZERO_SUBSCRIPTION}/resourcegroups/g")
        );
    }

    #[tokio::test]
    async fn test_recording_transport_captures_scrubbed_exchange() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cassettes").join("rg.yaml");
        let inner = FixedTransport(HttpResponse {
            status: 202,
            headers: HashMap::from([
                (
                    "location".to_string(),
                    format!("https://management.azure.com/subscriptions/{SUB}/operationresults/x?api-version=1"),
                ),
                ("x-ms-request-id".to_string(), "drop-me".to_string()),
            ]),
            body: String::new(),
        });
        let transport = RecordingTransport::new(Arc::new(inner), &path, Scrubber::new(SUB));

        // Act
        transport
            .send(request(
                Method::DELETE,
                &format!("https://management.azure.com/subscriptions/{SUB}/resourcegroups/g?api-version=1"),
            ))
            .await
            .unwrap();
        transport.save().unwrap();

        // Assert
        let cassette = Cassette::load(&path).unwrap();
        assert_eq!(cassette.interactions.len(), 1);
        let interaction = &cassette.interactions[0];
        assert_eq!(interaction.request.method, "DELETE");
        assert_eq!(
            interaction.request.uri,
            format!("/subscriptions/{ZERO_SUBSCRIPTION}/resourcegroups/g?api-version=1")
        );
        assert_eq!(
            interaction.response.headers.get("location").map(String::as_str),
            Some(format!("/subscriptions/{ZERO_SUBSCRIPTION}/operationresults/x?api-version=1").as_str())
        );
        assert!(!interaction.response.headers.contains_key("x-ms-request-id"));
        let yaml = fs::read_to_string(&path).unwrap();
        assert!(!yaml.contains("secret"));
        assert!(!yaml.contains(SUB));
    }

    #[tokio::test]
    async fn test_playback_serves_in_order_and_rehosts_headers() {
        let cassette = Cassette {
            interactions: vec![
                Interaction {
                    request: RecordedRequest {
                        method: "DELETE".into(),
                        uri: format!("/subscriptions/{ZERO_SUBSCRIPTION}/resourcegroups/g?api-version=1"),
                        body: None,
                    },
                    response: RecordedResponse {
                        status: 202,
                        headers: BTreeMap::from([(
                            "location".to_string(),
                            "/operationresults/x?api-version=1".to_string(),
                        )]),
                        body: String::new(),
                    },
                },
                Interaction {
                    request: RecordedRequest {
                        method: "GET".into(),
                        uri: "/operationresults/x?api-version=1".into(),
                        body: None,
                    },
                    response: RecordedResponse {
                        status: 200,
                        headers: BTreeMap::new(),
                        body: json!({"ok": true}).to_string(),
                    },
                },
            ],
        };
        let playback = PlaybackTransport::with_subscription(cassette, SUB);

        let first = playback
            .send(request(
                Method::DELETE,
                &format!("http://localhost:1/subscriptions/{SUB}/resourcegroups/g?api-version=1"),
            ))
            .await
            .unwrap();
        assert_eq!(first.status, 202);
        assert_eq!(
            first.header("location"),
            Some("http://localhost:1/operationresults/x?api-version=1")
        );

        let second = playback
            .send(request(Method::GET, first.header("location").unwrap()))
            .await
            .unwrap();
        assert_eq!(second.status, 200);
        assert_eq!(playback.remaining(), 0);

        let exhausted = playback
            .send(request(Method::GET, "http://localhost:1/anything"))
            .await
            .unwrap_err();
        assert!(matches!(exhausted, ResourceError::Playback(_)));
    }

    #[tokio::test]
    async fn test_playback_rejects_out_of_order_request() {
        let cassette = Cassette {
            interactions: vec![Interaction {
                request: RecordedRequest {
                    method: "GET".into(),
                    uri: "/a".into(),
                    body: None,
                },
                response: RecordedResponse::default(),
            }],
        };
        let playback = PlaybackTransport::new(cassette);

        let err = playback
            .send(request(Method::GET, "http://localhost:1/b"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expected GET /a, got GET /b"));
    }
}
