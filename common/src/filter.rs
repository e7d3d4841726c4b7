use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use crate::extensions::{CodecError, Extension, ExtensionPayload, Extensions, get_extension};

/// Extension key holding the game server selection filter.
pub const FILTER_KEY: &str = "filter";

/// Which game servers may receive an assignment. Labels match server
/// metadata labels, fields match status fields such as `status.state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub labels: BTreeMap<String, String>,
    pub fields: BTreeMap<String, String>,
}

impl ExtensionPayload for Filter {
    const TYPE_URL: &'static str = "type.googleapis.com/allocator.FilterExtension";
}

impl Filter {
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Query parameters for the discovery service, e.g.
    /// `labels=region=eu,mode=ctf`. Empty selectors are left out.
    pub fn to_query(&self) -> BTreeMap<String, String> {
        let mut query = BTreeMap::new();
        if !self.labels.is_empty() {
            query.insert("labels".to_string(), join_selector(&self.labels));
        }
        if !self.fields.is_empty() {
            query.insert("fields".to_string(), join_selector(&self.fields));
        }
        query
    }

    pub fn into_extension(self) -> Result<Extension, CodecError> {
        Extension::pack(&self)
    }
}

fn join_selector(selector: &BTreeMap<String, String>) -> String {
    selector
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Pull the filter out of an assignment's extensions. `Ok(None)` means no
/// filter was attached and every server is eligible.
pub fn extract_filter(extensions: &Extensions) -> Result<Option<Filter>, CodecError> {
    get_extension::<Filter>(extensions, FILTER_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_missing_filter() {
        assert_eq!(extract_filter(&Extensions::new()).unwrap(), None);
    }

    #[test]
    fn test_extract_filter() {
        let filter = Filter::default()
            .with_label("region", "us-east-1")
            .with_field("status.state", "Ready");
        let mut extensions = Extensions::new();
        extensions.insert(FILTER_KEY.to_string(), filter.clone().into_extension().unwrap());

        assert_eq!(extract_filter(&extensions).unwrap(), Some(filter));
    }

    #[test]
    fn test_extract_malformed_filter() {
        let mut extensions = Extensions::new();
        extensions.insert(
            FILTER_KEY.to_string(),
            Extension {
                type_url: Filter::TYPE_URL.to_string(),
                value: b"[1, 2]".to_vec(),
            },
        );
        assert!(extract_filter(&extensions).is_err());
    }

    #[test]
    fn test_to_query() {
        let filter = Filter::default()
            .with_label("region", "eu")
            .with_label("mode", "ctf")
            .with_field("status.state", "Ready");
        let query = filter.to_query();

        assert_eq!(query.get("labels").map(String::as_str), Some("mode=ctf,region=eu"));
        assert_eq!(query.get("fields").map(String::as_str), Some("status.state=Ready"));
        assert!(Filter::default().to_query().is_empty());
    }
}
