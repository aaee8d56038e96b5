//! Annotation keys understood by the hijacker and the eligibility predicate built on them.
use std::collections::BTreeMap;

/// Marks a Service as one whose endpoints are managed by the Osiris endpoints controller.
pub const MANAGE_ENDPOINTS: &str = "osiris.dm.gg/manageEndpoints";
/// Names the Deployment that backs an Osiris-enabled Service.
pub const DEPLOYMENT: &str = "osiris.dm.gg/deployment";
/// Names the StatefulSet that backs an Osiris-enabled Service.
pub const STATEFULSET: &str = "osiris.dm.gg/statefulset";
/// Holds the JSON encoded selector that was removed from the Service spec.
pub const SELECTOR: &str = "osiris.dm.gg/selector";

/// Returns true if the annotations mark the Service for endpoints management.
/// The value is interpreted loosely, e.g. "yes", "ON" and "1" all count as enabled.
pub fn is_eligible(annotations: &BTreeMap<String, String>) -> bool {
    annotations
        .get(MANAGE_ENDPOINTS)
        .map(|value| {
            matches!(
                value.to_lowercase().as_str(),
                "y" | "yes" | "true" | "on" | "1"
            )
        })
        .unwrap_or(false)
}

/// Returns true if one of the two ownership annotations is present.
pub fn has_owner(annotations: &BTreeMap<String, String>) -> bool {
    annotations.contains_key(DEPLOYMENT) || annotations.contains_key(STATEFULSET)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_is_eligible_truthy_values() {
        for value in ["y", "yes", "true", "on", "1", "TRUE", "Yes"] {
            assert!(
                is_eligible(&annotations(&[(MANAGE_ENDPOINTS, value)])),
                "{value} should enable endpoints management"
            );
        }
    }

    #[test]
    fn test_is_eligible_falsy_values() {
        for value in ["", "no", "false", "0", "enabled"] {
            assert!(!is_eligible(&annotations(&[(MANAGE_ENDPOINTS, value)])));
        }
        assert!(!is_eligible(&BTreeMap::new()));
        assert!(!is_eligible(&annotations(&[(DEPLOYMENT, "true")])));
    }

    #[test]
    fn test_has_owner() {
        assert!(has_owner(&annotations(&[(DEPLOYMENT, "foo")])));
        assert!(has_owner(&annotations(&[(STATEFULSET, "foo")])));
        assert!(!has_owner(&annotations(&[(MANAGE_ENDPOINTS, "true")])));
    }
}
