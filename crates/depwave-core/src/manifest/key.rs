//! Resource identity and dependency-reference matching.

use std::fmt;

use serde_yaml::Value;

use super::document::Document;

const DEFAULT_KIND: &str = "Unknown";
const DEFAULT_API_VERSION: &str = "v1";
const DEFAULT_NAME: &str = "unnamed";

/// `(apiVersion, kind, name)` identity of one manifest.
///
/// The graph id is `"{apiVersion}:{kind}:{name}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    api_version: String,
    kind: String,
    name: String,
    id: String,
}

impl ResourceKey {
    #[must_use]
    pub fn new(api_version: &str, kind: &str, name: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            id: format!("{api_version}:{kind}:{name}"),
        }
    }

    /// Derive the key of a document, falling back to `v1`, `Unknown` and
    /// `unnamed` for absent fields.
    #[must_use]
    pub fn from_document(doc: &Document) -> Self {
        let api_version = scalar_text(doc.get("apiVersion"));
        let kind = scalar_text(doc.get("kind"));
        let name = scalar_text(doc.metadata_field("name"));
        Self::new(
            api_version.as_deref().unwrap_or(DEFAULT_API_VERSION),
            kind.as_deref().unwrap_or(DEFAULT_KIND),
            name.as_deref().unwrap_or(DEFAULT_NAME),
        )
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether a dependency reference points at this resource.
    ///
    /// - `Kind:name` matches on kind (case-insensitive) and name (exact).
    /// - `apiVersion:Kind:name` additionally requires the apiVersion to match
    ///   exactly. The last two segments are kind and name, everything before
    ///   them is the apiVersion, so `apps/v1:Deployment:web` and
    ///   `example.io:v1:Widget:w` both parse.
    ///
    /// Anything with fewer than two segments never matches.
    #[must_use]
    pub fn matches(&self, reference: &str) -> bool {
        let parts: Vec<&str> = reference.split(':').collect();
        match parts.as_slice() {
            [kind, name] => self.kind_matches(kind) && self.name == *name,
            [api_version @ .., kind, name] => {
                self.kind_matches(kind)
                    && self.name == *name
                    && self.api_version == api_version.join(":")
            }
            _ => false,
        }
    }

    fn kind_matches(&self, kind: &str) -> bool {
        self.kind.to_lowercase() == kind.to_lowercase()
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(yaml: &str) -> ResourceKey {
        let doc: Document = serde_yaml::from_str(yaml).expect("valid document");
        ResourceKey::from_document(&doc)
    }

    #[test]
    fn id_joins_fields() {
        let key = key_of("apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n");
        assert_eq!(key.id(), "apps/v1:Deployment:web");
        assert_eq!(key.to_string(), "apps/v1:Deployment:web");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let key = key_of("data: {}\n");
        assert_eq!(key.id(), "v1:Unknown:unnamed");
    }

    #[test]
    fn null_metadata_uses_default_name() {
        let key = key_of("kind: Secret\nmetadata:\n");
        assert_eq!(key.id(), "v1:Secret:unnamed");
    }

    #[test]
    fn numeric_name_is_rendered() {
        let key = key_of("kind: ConfigMap\nmetadata:\n  name: 42\n");
        assert_eq!(key.name(), "42");
    }

    #[test]
    fn short_reference_ignores_kind_case() {
        let key = ResourceKey::new("apps/v1", "Deployment", "x");
        assert!(key.matches("deployment:x"));
        assert!(key.matches("DEPLOYMENT:x"));
        assert!(!key.matches("Deployment:X"));
    }

    #[test]
    fn long_reference_requires_exact_api_version() {
        let key = ResourceKey::new("apps/v1", "Deployment", "x");
        assert!(key.matches("apps/v1:deployment:x"));
        assert!(!key.matches("apps/v2:Deployment:x"));
        assert!(!key.matches("Apps/v1:Deployment:x"));
    }

    #[test]
    fn api_version_may_contain_colons() {
        let key = ResourceKey::new("example.io:v1", "Widget", "w");
        assert!(key.matches("example.io:v1:Widget:w"));
        assert!(!key.matches("v1:Widget:w"));
    }

    #[test]
    fn single_segment_never_matches() {
        let key = ResourceKey::new("v1", "x", "x");
        assert!(!key.matches("x"));
        assert!(!key.matches(""));
    }

    #[test]
    fn empty_api_version_segment_is_compared() {
        let key = ResourceKey::new("", "Service", "db");
        assert!(key.matches(":Service:db"));
    }
}
