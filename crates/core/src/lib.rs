//! Client for the Resource Management REST API: tags, resource groups, resources,
//! deployments, deployment operations and providers.
mod assets;
mod pipeline;

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod models;
pub mod operations;
pub mod paging;
pub mod poller;
pub mod recording;
pub mod resource_id;

#[cfg(test)]
mod test_utils;

pub use crate::assets::{get_log_path, get_recordings_dir};
pub use crate::client::{ClientBuilder, ResourceManagementClient};
pub use crate::error::{CloudError, ResourceError, Result};
pub use crate::pipeline::{
    DEFAULT_API_VERSION, DEFAULT_ENDPOINT, HttpRequest, HttpResponse, ReqwestTransport, Transport,
};
