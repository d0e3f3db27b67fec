#![forbid(unsafe_code)]
//! depwave-core library.
//!
//! Discovers Kubernetes manifests under an application directory and orders
//! them into Argo CD sync waves from their `depends-on` annotations.
//!
//! # Conventions
//!
//! - **Errors**: Fallible operations return [`Result`]; every [`Error`] is fatal
//!   and carries an [`ErrorCode`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//!   Scheduling findings go through a [`diagnostics::DiagnosticSink`].

pub mod annotate;
pub mod config;
pub mod diagnostics;
pub mod discover;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod pipeline;

pub use config::Settings;
pub use diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
pub use discover::{DiscoveryOptions, Kustomize, ManifestBuilder, discover};
pub use error::{Error, ErrorCode, Result};
pub use manifest::{Document, ResourceKey};
pub use pipeline::{Schedule, schedule};
