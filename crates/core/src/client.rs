use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;
use url::Url;

use crate::config::{ClientConfig, CredentialConfig};
use crate::credential::{ClientSecretCredential, StaticTokenCredential, TokenCredential};
use crate::error::{ResourceError, Result};
use crate::operations::{
    DeploymentOperations, Deployments, Providers, ResourceGroups, Resources, Tags,
};
use crate::pipeline::{DEFAULT_API_VERSION, DEFAULT_ENDPOINT, Pipeline, ReqwestTransport, Transport};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Client for the Resource Management API of one subscription.
#[derive(Debug, Clone)]
pub struct ResourceManagementClient {
    pipeline: Arc<Pipeline>,
}

impl ResourceManagementClient {
    pub fn builder(subscription_id: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(subscription_id)
    }

    /// Builds a client from resolved configuration.
    #[instrument(skip(config))]
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config)?.build()
    }

    pub fn subscription_id(&self) -> &str {
        self.pipeline.subscription_id()
    }

    pub fn tags(&self) -> Tags<'_> {
        Tags::new(&self.pipeline)
    }

    pub fn resource_groups(&self) -> ResourceGroups<'_> {
        ResourceGroups::new(&self.pipeline)
    }

    pub fn resources(&self) -> Resources<'_> {
        Resources::new(&self.pipeline)
    }

    pub fn deployments(&self) -> Deployments<'_> {
        Deployments::new(&self.pipeline)
    }

    pub fn deployment_operations(&self) -> DeploymentOperations<'_> {
        DeploymentOperations::new(&self.pipeline)
    }

    pub fn providers(&self) -> Providers<'_> {
        Providers::new(&self.pipeline)
    }
}

pub struct ClientBuilder {
    subscription_id: String,
    endpoint: String,
    api_version: String,
    poll_interval: Duration,
    credential: Option<Arc<dyn TokenCredential>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            credential: None,
            transport: None,
        }
    }

    /// A builder preset from resolved configuration, e.g. to swap in a recording
    /// transport before building.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let credential: Arc<dyn TokenCredential> = match &config.credential {
            CredentialConfig::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => Arc::new(ClientSecretCredential::new(
                &config.authority,
                tenant_id,
                client_id,
                client_secret,
            )?),
            CredentialConfig::Token { token } => Arc::new(StaticTokenCredential::new(token)),
        };

        Ok(Self::new(&config.subscription_id)
            .endpoint(&config.endpoint)
            .api_version(&config.api_version)
            .poll_interval(Duration::from_secs(config.poll_interval_secs))
            .credential(credential))
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Wait between status polls when the service sends no `Retry-After`.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn credential(mut self, credential: Arc<dyn TokenCredential>) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<ResourceManagementClient> {
        if self.subscription_id.trim().is_empty() {
            return Err(ResourceError::Config(
                "subscription_id must not be empty".to_string(),
            ));
        }
        let credential = self
            .credential
            .ok_or_else(|| ResourceError::Config("no credential configured".to_string()))?;
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::default()));

        Ok(ResourceManagementClient {
            pipeline: Arc::new(Pipeline::new(
                Url::parse(&self.endpoint)?,
                self.subscription_id,
                self.api_version,
                self.poll_interval,
                credential,
                transport,
            )),
        })
    }
}
