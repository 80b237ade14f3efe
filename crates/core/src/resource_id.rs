use std::fmt;
use std::str::FromStr;

use crate::error::{ResourceError, Result};

/// A parsed resource identifier.
///
/// ```text
/// /subscriptions/{sub}/resourceGroups/{group}/providers/{namespace}/{type}/{name}[/{type}/{name}...]
/// ```
///
/// Group ids (no provider part) parse as well. Keys are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    subscription_id: String,
    resource_group: Option<String>,
    provider_namespace: Option<String>,
    /// Alternating type and name pairs below the namespace.
    types: Vec<(String, String)>,
}

impl ResourceId {
    pub fn parse(id: &str) -> Result<Self> {
        let invalid = || ResourceError::InvalidResourceId(id.to_string());
        let parts: Vec<&str> = id.trim_matches('/').split('/').collect();

        let mut iter = parts.iter().copied();
        let subscription_id = match (iter.next(), iter.next()) {
            (Some(key), Some(sub)) if key.eq_ignore_ascii_case("subscriptions") && !sub.is_empty() => {
                sub.to_string()
            }
            _ => return Err(invalid()),
        };

        let mut resource_group = None;
        let mut provider_namespace = None;
        let mut types = Vec::new();

        while let Some(key) = iter.next() {
            let value = iter.next().filter(|v| !v.is_empty()).ok_or_else(invalid)?;
            if key.eq_ignore_ascii_case("resourcegroups") && resource_group.is_none() {
                resource_group = Some(value.to_string());
            } else if key.eq_ignore_ascii_case("providers") && provider_namespace.is_none() {
                provider_namespace = Some(value.to_string());
            } else if provider_namespace.is_some() {
                types.push((key.to_string(), value.to_string()));
            } else {
                return Err(invalid());
            }
        }

        if provider_namespace.is_some() && types.is_empty() && resource_group.is_some() {
            return Err(invalid());
        }

        Ok(Self {
            subscription_id,
            resource_group,
            provider_namespace,
            types,
        })
    }

    /// Id of a resource group.
    pub fn resource_group_id(subscription_id: &str, resource_group: &str) -> String {
        format!("/subscriptions/{subscription_id}/resourceGroups/{resource_group}")
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group(&self) -> Option<&str> {
        self.resource_group.as_deref()
    }

    pub fn provider_namespace(&self) -> Option<&str> {
        self.provider_namespace.as_deref()
    }

    pub fn is_resource_group(&self) -> bool {
        self.resource_group.is_some() && self.provider_namespace.is_none()
    }

    /// Full type below the namespace, e.g. `virtualNetworks/subnets`.
    pub fn resource_type(&self) -> Option<String> {
        if self.types.is_empty() {
            return None;
        }
        Some(
            self.types
                .iter()
                .map(|(t, _)| t.as_str())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }

    /// Name of the innermost resource.
    pub fn name(&self) -> Option<&str> {
        self.types
            .last()
            .map(|(_, n)| n.as_str())
            .or(self.resource_group.as_deref())
    }

    /// Path between the namespace and the innermost resource, e.g. `virtualNetworks/vnet1`.
    pub fn parent_resource_path(&self) -> String {
        let Some((_, parents)) = self.types.split_last() else {
            return String::new();
        };
        parents
            .iter()
            .map(|(t, n)| format!("{t}/{n}"))
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl FromStr for ResourceId {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/subscriptions/{}", self.subscription_id)?;
        if let Some(group) = &self.resource_group {
            write!(f, "/resourceGroups/{group}")?;
        }
        if let Some(namespace) = &self.provider_namespace {
            write!(f, "/providers/{namespace}")?;
        }
        for (t, n) in &self.types {
            write!(f, "/{t}/{n}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_resource() {
        let id = ResourceId::parse(
            "/subscriptions/s1/resourceGroups/g1/providers/Microsoft.Network/virtualNetworks/vnet1/subnets/default",
        )
        .unwrap();

        assert_eq!(id.subscription_id(), "s1");
        assert_eq!(id.resource_group(), Some("g1"));
        assert_eq!(id.provider_namespace(), Some("Microsoft.Network"));
        assert_eq!(id.resource_type().as_deref(), Some("virtualNetworks/subnets"));
        assert_eq!(id.name(), Some("default"));
        assert_eq!(id.parent_resource_path(), "virtualNetworks/vnet1");
        assert!(!id.is_resource_group());
    }

    #[test]
    fn test_parse_group_id_case_insensitive() {
        let id: ResourceId = "/subscriptions/s1/resourcegroups/MyGroup".parse().unwrap();
        assert!(id.is_resource_group());
        assert_eq!(id.name(), Some("MyGroup"));
        assert_eq!(id.to_string(), "/subscriptions/s1/resourceGroups/MyGroup");
        assert_eq!(
            ResourceId::resource_group_id("s1", "MyGroup"),
            id.to_string()
        );
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        for bad in [
            "",
            "/resourceGroups/g1",
            "/subscriptions/s1/resourceGroups",
            "/subscriptions/s1/foo/bar",
            "/subscriptions/s1/resourceGroups/g1/providers/Microsoft.Compute",
        ] {
            let err = ResourceId::parse(bad).unwrap_err();
            assert!(matches!(err, ResourceError::InvalidResourceId(_)), "{bad}");
        }
    }

    #[test]
    fn test_parent_path_empty_for_top_level() {
        let id = ResourceId::parse(
            "/subscriptions/s1/resourceGroups/g1/providers/Microsoft.Compute/availabilitySets/as1",
        )
        .unwrap();
        assert_eq!(id.parent_resource_path(), "");
        assert_eq!(id.resource_type().as_deref(), Some("availabilitySets"));
    }
}
