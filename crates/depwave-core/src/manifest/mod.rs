//! Manifest documents and the identities derived from them.
//!
//! ## Submodules
//!
//! - [`document`]: YAML mapping wrapper and multi-document stream parsing.
//! - [`key`]: `(apiVersion, kind, name)` identity and reference matching.

pub mod document;
pub mod key;

pub use document::{Document, parse_stream};
pub use key::ResourceKey;

/// Annotation listing the resources a manifest depends on.
pub const DEPENDS_ON_ANNOTATION: &str = "argocd-dependency-cmp/depends-on";

/// Annotation Argo CD reads to order its sync.
pub const SYNC_WAVE_ANNOTATION: &str = "argocd.argoproj.io/sync-wave";
