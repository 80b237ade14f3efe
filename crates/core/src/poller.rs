use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{CloudError, Result};
use crate::models::ErrorDetail;
use crate::pipeline::{HttpResponse, Pipeline};

#[derive(Deserialize, Debug, Default)]
struct OperationStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ProvisioningProperties {
    #[serde(default)]
    provisioning_state: Option<String>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Deserialize, Debug, Default)]
struct ProvisioningBody {
    #[serde(default)]
    properties: Option<ProvisioningProperties>,
}

impl ProvisioningBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn state(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.provisioning_state.as_deref())
    }

    fn error(&self) -> Option<ErrorDetail> {
        self.properties.as_ref().and_then(|p| p.error.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Running,
    Succeeded,
    Failed,
}

fn outcome(state: &str) -> Outcome {
    if state.eq_ignore_ascii_case("succeeded") {
        Outcome::Succeeded
    } else if state.eq_ignore_ascii_case("failed") || state.eq_ignore_ascii_case("canceled") {
        Outcome::Failed
    } else {
        Outcome::Running
    }
}

fn failure(status: u16, state: &str, error: Option<ErrorDetail>) -> CloudError {
    match error {
        Some(detail) if detail.message.is_some() => CloudError::from_detail(status, detail),
        _ => CloudError::new(
            status,
            state,
            format!("Long running operation failed with status '{state}'"),
        ),
    }
}

/// Drives a long-running operation to completion.
///
/// The service answers such operations with 201/202 and a status URL in the
/// `Azure-AsyncOperation` or `Location` header, or with a resource body whose
/// `provisioningState` is not yet terminal.
pub struct LroPoller<T> {
    pipeline: Arc<Pipeline>,
    method: Method,
    resource_url: Url,
    initial: HttpResponse,
    _result: PhantomData<fn() -> T>,
}

impl<T> LroPoller<T> {
    pub(crate) fn new(
        pipeline: Arc<Pipeline>,
        method: Method,
        resource_url: Url,
        initial: HttpResponse,
    ) -> Self {
        Self {
            pipeline,
            method,
            resource_url,
            initial,
            _result: PhantomData,
        }
    }

    /// The response to the request that started the operation.
    pub fn initial_response(&self) -> &HttpResponse {
        &self.initial
    }

    /// Waits for the operation to finish, discarding its result.
    pub async fn wait(self) -> Result<()> {
        self.poll().await.map(|_| ())
    }

    fn delay(&self, response: &HttpResponse) -> Duration {
        response
            .header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.pipeline.poll_interval())
    }

    fn creates_resource(&self) -> bool {
        self.method == Method::PUT || self.method == Method::PATCH
    }

    #[instrument(skip(self), fields(method = %self.method, url = %self.resource_url))]
    async fn poll(&self) -> Result<HttpResponse> {
        let initial = &self.initial;

        if let Some(status_url) = initial.header("azure-asyncoperation") {
            self.poll_async_operation(Url::parse(status_url)?, self.delay(initial))
                .await?;
            return self.final_response().await;
        }

        if initial.status == 202 {
            if let Some(location) = initial.header("location") {
                let last = self
                    .poll_location(Url::parse(location)?, self.delay(initial))
                    .await?;
                if self.creates_resource() && last.body.trim().is_empty() {
                    return self.get_resource().await;
                }
                return Ok(last);
            }
        }

        let body = ProvisioningBody::parse(&initial.body);
        match body.state().map(|s| (s, outcome(s))) {
            Some((_, Outcome::Running)) => self.poll_resource(self.delay(initial)).await,
            Some((state, Outcome::Failed)) => {
                Err(failure(initial.status, state, body.error()).into())
            }
            _ => Ok(initial.clone()),
        }
    }

    async fn poll_async_operation(&self, url: Url, mut delay: Duration) -> Result<()> {
        loop {
            tokio::time::sleep(delay).await;
            let response = self
                .pipeline
                .send_expect(Method::GET, url.clone(), None, &[200, 201, 202])
                .await?;
            let status: OperationStatus = response.json()?;
            let state = status.status.unwrap_or_default();
            debug!(%state, "polled operation status");

            match outcome(&state) {
                Outcome::Succeeded => return Ok(()),
                Outcome::Failed => {
                    return Err(failure(response.status, &state, status.error).into());
                }
                Outcome::Running => delay = self.delay(&response),
            }
        }
    }

    async fn poll_location(&self, url: Url, mut delay: Duration) -> Result<HttpResponse> {
        loop {
            tokio::time::sleep(delay).await;
            let response = self
                .pipeline
                .send_expect(Method::GET, url.clone(), None, &[200, 201, 202, 204])
                .await?;
            debug!(status = response.status, "polled operation location");

            if response.status != 202 {
                let body = ProvisioningBody::parse(&response.body);
                if let Some(state) = body.state() {
                    if outcome(state) == Outcome::Failed {
                        return Err(failure(response.status, state, body.error()).into());
                    }
                }
                return Ok(response);
            }
            delay = self.delay(&response);
        }
    }

    async fn poll_resource(&self, mut delay: Duration) -> Result<HttpResponse> {
        loop {
            tokio::time::sleep(delay).await;
            let response = self.get_resource().await?;
            let body = ProvisioningBody::parse(&response.body);
            let state = body.state().unwrap_or("Succeeded").to_string();
            debug!(%state, "polled resource provisioning state");

            match outcome(&state) {
                Outcome::Succeeded => return Ok(response),
                Outcome::Failed => {
                    return Err(failure(response.status, &state, body.error()).into());
                }
                Outcome::Running => delay = self.delay(&response),
            }
        }
    }

    async fn get_resource(&self) -> Result<HttpResponse> {
        self.pipeline
            .send_expect(Method::GET, self.resource_url.clone(), None, &[200])
            .await
    }

    async fn final_response(&self) -> Result<HttpResponse> {
        if self.creates_resource() {
            return self.get_resource().await;
        }
        if self.method == Method::POST {
            if let Some(location) = self.initial.header("location") {
                return self
                    .pipeline
                    .send_expect(Method::GET, Url::parse(location)?, None, &[200, 204])
                    .await;
            }
        }
        Ok(HttpResponse {
            status: 200,
            ..Default::default()
        })
    }
}

impl<T: DeserializeOwned> LroPoller<T> {
    /// Waits for the operation to finish and returns the resulting entity.
    pub async fn result(self) -> Result<T> {
        let response = self.poll().await?;
        response.json()
    }
}
