//! Entities exchanged with the Resource Management service.
//!
//! Field names follow the service's camelCase wire format. Anything the service may
//! leave out is optional, and unknown fields are ignored.
mod deployment;
mod provider;
mod resource;
mod resource_group;
mod tag;

pub use deployment::*;
pub use provider::*;
pub use resource::*;
pub use resource_group::*;
pub use tag::*;

use serde::{Deserialize, Deserializer, Serialize};

/// Reads an explicit `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Error payload carried in fault envelopes, export results and deployment status.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub details: Vec<ErrorDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_tags_read_as_empty() {
        let group: ResourceGroup = serde_json::from_value(json!({
            "name": "rg1",
            "location": "westus",
            "tags": null
        }))
        .unwrap();

        assert!(group.tags.is_empty());
        assert_eq!(group.location.as_deref(), Some("westus"));
    }

    #[test]
    fn test_null_provider_collections_read_as_empty() {
        let provider: Provider = serde_json::from_value(json!({
            "namespace": "Microsoft.Web",
            "resourceTypes": null
        }))
        .unwrap();
        assert!(provider.resource_types.is_empty());

        let provider: Provider = serde_json::from_value(json!({
            "namespace": "Microsoft.Web",
            "resourceTypes": [{
                "resourceType": "sites",
                "locations": null,
                "aliases": null,
                "apiVersions": null,
                "properties": null
            }]
        }))
        .unwrap();
        let sites = provider.resource_type("sites").unwrap();
        assert!(sites.locations.is_empty());
        assert!(sites.api_versions.is_empty());
    }

    #[test]
    fn test_null_details_read_as_empty() {
        let detail: ErrorDetail = serde_json::from_value(json!({
            "code": "Conflict",
            "details": null
        }))
        .unwrap();

        assert_eq!(detail.code.as_deref(), Some("Conflict"));
        assert!(detail.details.is_empty());
    }

    #[test]
    fn test_empty_collections_are_not_serialized() {
        let value = serde_json::to_value(ResourceGroup::new("westus")).unwrap();
        assert_eq!(value, json!({"location": "westus"}));
    }
}
