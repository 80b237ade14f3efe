//! Shared harness for the scenario tests.
//!
//! Every scenario talks to a `MockServer` that stands in for the management
//! endpoint. Names are derived from the test name so reruns address the same
//! resources, the way recorded sessions expect.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use resman_core::ResourceManagementClient;
use resman_core::credential::StaticTokenCredential;
use resman_core::models::ResourceGroup;
use resman_core::recording::ZERO_SUBSCRIPTION;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REGION: &str = "westus";

pub struct MgmtTestContext {
    pub server: MockServer,
    pub client: ResourceManagementClient,
    pub group_name: String,
    pub region: String,
    test_name: String,
}

/// FNV-1a; stable across runs and toolchains.
fn name_hash(text: &str) -> u32 {
    text.bytes().fold(0x811c_9dc5u32, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    })
}

impl MgmtTestContext {
    pub async fn new(test_name: &str) -> Self {
        let server = MockServer::start().await;
        let client = ResourceManagementClient::builder(ZERO_SUBSCRIPTION)
            .endpoint(server.uri())
            .poll_interval(Duration::ZERO)
            .credential(Arc::new(StaticTokenCredential::new("fake-token")))
            .build()
            .expect("Failed to build client");

        let mut ctx = Self {
            server,
            client,
            group_name: String::new(),
            region: REGION.to_string(),
            test_name: test_name.to_string(),
        };
        ctx.group_name = ctx.get_resource_name("pytestgroup");
        ctx
    }

    /// A deterministic resource name: `prefix` followed by a hash of the test name.
    pub fn get_resource_name(&self, prefix: &str) -> String {
        format!("{prefix}{:08x}", name_hash(&format!("{}{prefix}", self.test_name)))
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Path below the test subscription, e.g. `sub_path("tagNames")`.
    pub fn sub_path(&self, rest: &str) -> String {
        format!("/subscriptions/{ZERO_SUBSCRIPTION}/{rest}")
    }

    pub fn group_id(&self, group: &str) -> String {
        format!("/subscriptions/{ZERO_SUBSCRIPTION}/resourceGroups/{group}")
    }

    pub fn group_body(&self, group: &str, tags: Value) -> Value {
        json!({
            "id": self.group_id(group),
            "name": group,
            "location": self.region,
            "tags": tags,
            "properties": {"provisioningState": "Succeeded"}
        })
    }

    /// Mounts a mock answering `verb` on `sub_path(rest)` with `status` and a JSON body.
    pub async fn mock_json(&self, verb: &str, rest: &str, status: u16, body: Value) {
        Mock::given(method(verb))
            .and(path(self.sub_path(rest)))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mounts a mock answering `verb` on `sub_path(rest)` with an empty body.
    pub async fn mock_status(&self, verb: &str, rest: &str, status: u16) {
        Mock::given(method(verb))
            .and(path(self.sub_path(rest)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Mounts a 202 answer pointing at an operation result that completes on the
    /// second poll.
    pub async fn mock_accepted(&self, verb: &str, rest: &str, operation: &str) {
        let result_path = self.sub_path(&format!("operationresults/{operation}"));
        Mock::given(method(verb))
            .and(path(self.sub_path(rest)))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Location", format!("{}{result_path}?api-version=2016-09-01", self.uri()).as_str())
                    .insert_header("Retry-After", "0"),
            )
            .expect(1)
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(result_path.clone()))
            .respond_with(ResponseTemplate::new(202).insert_header("Retry-After", "0"))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(result_path))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Creates the test's resource group.
    pub async fn create_resource_group(&self) {
        self.mock_json(
            "PUT",
            &format!("resourcegroups/{}", self.group_name),
            201,
            self.group_body(&self.group_name, json!({})),
        )
        .await;

        self.client
            .resource_groups()
            .create_or_update(&self.group_name, &ResourceGroup::new(&self.region))
            .await
            .expect("Failed to create resource group");
    }
}
