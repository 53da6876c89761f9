//! Base-address settings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Supplies the service addresses a list queries against.
pub trait SettingsProvider: Send + Sync {
    /// The default service root, e.g. `https://host/odata`.
    fn base_address(&self) -> &str;

    /// An alternate service root registered under `key`, if any.
    fn alternate_base_address(&self, key: &str) -> Option<&str>;

    /// Preferred page size, if the user configured one.
    fn page_size(&self) -> Option<u32> {
        None
    }
}

/// Returns the address registered for `key`, or the default address.
pub fn resolve_base_address<'a>(settings: &'a dyn SettingsProvider, key: Option<&str>) -> &'a str {
    key.and_then(|k| settings.alternate_base_address(k))
        .unwrap_or_else(|| settings.base_address())
}

/// Settings held in memory, usually deserialized from a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticSettings {
    /// Default service root.
    pub base_address: String,

    /// Alternate service roots keyed by backend name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub alternate_base_addresses: HashMap<String, String>,

    /// Preferred page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl StaticSettings {
    /// Creates settings pointing at a single service root.
    pub fn new(base_address: impl Into<String>) -> Self {
        Self {
            base_address: base_address.into(),
            ..Self::default()
        }
    }

    /// Registers an alternate service root.
    pub fn with_alternate(mut self, key: impl Into<String>, address: impl Into<String>) -> Self {
        self.alternate_base_addresses
            .insert(key.into(), address.into());
        self
    }
}

impl SettingsProvider for StaticSettings {
    fn base_address(&self) -> &str {
        &self.base_address
    }

    fn alternate_base_address(&self, key: &str) -> Option<&str> {
        self.alternate_base_addresses.get(key).map(String::as_str)
    }

    fn page_size(&self) -> Option<u32> {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_default_address() {
        let settings = StaticSettings::new("https://main.example.com/odata");
        assert_eq!(
            resolve_base_address(&settings, None),
            "https://main.example.com/odata"
        );
    }

    #[test]
    fn test_resolve_alternate_address() {
        let settings = StaticSettings::new("https://main.example.com/odata")
            .with_alternate("reports", "https://reports.example.com/odata");
        assert_eq!(
            resolve_base_address(&settings, Some("reports")),
            "https://reports.example.com/odata"
        );
    }

    #[test]
    fn test_unknown_key_falls_back_to_default() {
        let settings = StaticSettings::new("https://main.example.com/odata");
        assert_eq!(
            resolve_base_address(&settings, Some("missing")),
            "https://main.example.com/odata"
        );
    }

    #[test]
    fn test_deserialize_from_json() {
        let settings: StaticSettings = serde_json::from_str(
            r#"{"base_address":"http://a","alternate_base_addresses":{"b":"http://b"},"page_size":25}"#,
        )
        .unwrap();
        assert_eq!(settings.alternate_base_address("b"), Some("http://b"));
        assert_eq!(settings.page_size(), Some(25));
    }
}
