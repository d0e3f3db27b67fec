//! YAML manifest documents.
//!
//! A [`Document`] is one mapping out of a (possibly multi-document) YAML
//! stream. Only `kind`, `apiVersion`, `metadata.name` and
//! `metadata.annotations` are ever looked at; every other field passes
//! through untouched.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// One Kubernetes-style manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Mapping);

impl Document {
    /// Wrap an already-parsed YAML value.
    ///
    /// Null documents (empty `---` sections) yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] for any other non-mapping value.
    pub fn from_value(value: Value, origin: &str) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Mapping(map) => Ok(Some(Self(map))),
            other => Err(Error::InvalidDocument {
                origin: origin.to_string(),
                reason: format!("expected a mapping, found {}", value_kind(&other)),
            }),
        }
    }

    /// Top-level field lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// `metadata.<key>`, treating a missing or non-mapping `metadata` as empty.
    #[must_use]
    pub fn metadata_field(&self, key: &str) -> Option<&Value> {
        self.get("metadata")
            .and_then(Value::as_mapping)
            .and_then(|metadata| metadata.get(key))
    }

    /// `metadata.annotations.<key>`, `None` when any level is absent.
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&Value> {
        self.metadata_field("annotations")
            .and_then(Value::as_mapping)
            .and_then(|annotations| annotations.get(key))
    }

    /// Set `metadata.annotations.<key>`, creating `metadata` and
    /// `annotations` as empty mappings when they are absent or null.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] when `metadata` or `annotations`
    /// exists but is not a mapping.
    pub fn set_annotation(&mut self, key: &str, value: String, origin: &str) -> Result<()> {
        let metadata = child_mapping(&mut self.0, "metadata", origin)?;
        let annotations = child_mapping(metadata, "annotations", origin)?;
        annotations.insert(Value::String(key.to_string()), Value::String(value));
        Ok(())
    }

    #[must_use]
    pub const fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    #[must_use]
    pub fn into_mapping(self) -> Mapping {
        self.0
    }
}

impl From<Mapping> for Document {
    fn from(map: Mapping) -> Self {
        Self(map)
    }
}

/// Parse a multi-document YAML stream, dropping null documents.
///
/// `origin` names the source (a file path or builder invocation) in errors.
///
/// # Errors
///
/// Returns [`Error::Parse`] on malformed YAML and [`Error::InvalidDocument`]
/// when a document is neither null nor a mapping.
pub fn parse_stream(text: &str, origin: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for (index, de) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = Value::deserialize(de).map_err(|source| Error::Parse {
            origin: origin.to_string(),
            source,
        })?;
        if let Some(doc) = Document::from_value(value, &format!("{origin} (document {index})"))? {
            documents.push(doc);
        }
    }
    Ok(documents)
}

fn child_mapping<'a>(parent: &'a mut Mapping, key: &str, origin: &str) -> Result<&'a mut Mapping> {
    let slot = parent
        .entry(Value::String(key.to_string()))
        .or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Mapping(Mapping::new());
    }
    match slot {
        Value::Mapping(map) => Ok(map),
        other => Err(Error::InvalidDocument {
            origin: origin.to_string(),
            reason: format!("'{key}' must be a mapping, found {}", value_kind(other)),
        }),
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
