//! Operation groups of the Resource Management API.
//!
//! Each group borrows the client's pipeline; pagers and pollers they return hold
//! their own handle to it.
mod deployment_operations;
mod deployments;
mod providers;
mod resource_groups;
mod resources;
mod tags;

pub use deployment_operations::DeploymentOperations;
pub use deployments::Deployments;
pub use providers::Providers;
pub use resource_groups::ResourceGroups;
pub use resources::{ResourceLocator, Resources};
pub use tags::Tags;

/// Query pairs for the optional OData parameters shared by list operations.
pub(crate) fn odata_query(
    filter: Option<&str>,
    expand: Option<&str>,
    top: Option<u32>,
) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(filter) = filter {
        query.push(("$filter", filter.to_string()));
    }
    if let Some(expand) = expand {
        query.push(("$expand", expand.to_string()));
    }
    if let Some(top) = top {
        query.push(("$top", top.to_string()));
    }
    query
}
