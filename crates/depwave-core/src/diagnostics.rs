//! Non-fatal findings reported while scheduling.
//!
//! Graph construction and annotation take a [`DiagnosticSink`] rather than
//! logging directly, so callers decide where findings go. The binary uses
//! [`TracingSink`]; tests collect into a `Vec<Diagnostic>`.

use std::fmt;

use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A depends-on reference matched no indexed resource. The edge is dropped.
    UnresolvedDependency { from: String, reference: String },
    /// A resource landed in a wave above zero.
    WaveAssigned { id: String, wave: usize },
}

impl Diagnostic {
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(self, Self::UnresolvedDependency { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedDependency { from, reference } => write!(
                f,
                "Resource '{from}' depends on '{reference}', but it was not found."
            ),
            Self::WaveAssigned { id, wave } => write!(f, "Assigned Wave {wave} to {id}"),
        }
    }
}

pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` at warn/info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_warning() {
            warn!("{diagnostic}");
        } else {
            info!("{diagnostic}");
        }
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}
