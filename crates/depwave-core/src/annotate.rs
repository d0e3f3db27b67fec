//! Writing computed waves back into manifests.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::Result;
use crate::manifest::{Document, ResourceKey, SYNC_WAVE_ANNOTATION};

/// Set the sync-wave annotation of `doc` to `wave`.
///
/// `metadata` and `metadata.annotations` are created when missing; nothing
/// else in the document changes. Waves above zero are reported to `sink`.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidDocument`] if `metadata` or
/// `metadata.annotations` exists but is not a mapping.
pub fn annotate<S>(doc: &mut Document, key: &ResourceKey, wave: usize, sink: &mut S) -> Result<()>
where
    S: DiagnosticSink + ?Sized,
{
    doc.set_annotation(SYNC_WAVE_ANNOTATION, wave.to_string(), key.id())?;
    if wave > 0 {
        sink.report(Diagnostic::WaveAssigned {
            id: key.id().to_string(),
            wave,
        });
    }
    Ok(())
}
