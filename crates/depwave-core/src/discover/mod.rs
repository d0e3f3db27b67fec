//! Manifest discovery over an application source tree.
//!
//! # Overview
//!
//! Each directory contributes documents in one of two ways:
//!
//! - **Builder-managed**: the directory holds a kustomize marker file that
//!   survives the include/exclude filter. The [`ManifestBuilder`] output is the
//!   directory's whole contribution; nothing else under it is read or visited.
//! - **Raw**: regular files are read in name order. Without an include list
//!   only `.yaml`/`.yml` files count.
//!
//! With recursion enabled, subdirectories follow in name order, depth first.
//! Symlinked directories are followed, but one that leads back into a
//! directory still being scanned is a read error rather than a loop.
//! Any I/O, parse, or builder failure aborts discovery.
//!
//! ## Submodules
//!
//! - [`filter`]: right-anchored glob matching for include/exclude lists.
//! - [`builder`]: the builder capability and its kustomize implementation.

pub mod builder;
pub mod filter;

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::manifest::{Document, parse_stream};

pub use builder::{Kustomize, ManifestBuilder};
pub use filter::PatternSet;

/// Marker files that hand a directory to the builder, in probe order.
pub const MARKER_FILES: [&str; 3] = ["kustomization.yaml", "kustomization.yml", "Kustomization"];

/// Extensions read when no include pattern is configured.
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Compiled discovery parameters.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    pub recurse: bool,
    pub include: PatternSet,
    pub exclude: PatternSet,
}

impl DiscoveryOptions {
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if any include/exclude pattern does
    /// not compile.
    pub fn new<S: AsRef<str>>(recurse: bool, include: &[S], exclude: &[S]) -> Result<Self> {
        Ok(Self {
            recurse,
            include: PatternSet::new(include)?,
            exclude: PatternSet::new(exclude)?,
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if any configured pattern does not
    /// compile.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.recurse,
            &settings.include_patterns,
            &settings.exclude_patterns,
        )
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.is_match(path)
    }

    /// Not excluded, and included when an include list exists.
    fn admits_marker(&self, path: &Path) -> bool {
        !self.is_excluded(path) && (self.include.is_empty() || self.include.is_match(path))
    }

    fn admits_raw_file(&self, path: &Path) -> bool {
        if self.is_excluded(path) {
            return false;
        }
        if self.include.is_empty() {
            has_default_extension(path)
        } else {
            self.include.is_match(path)
        }
    }
}

/// Collect every document under `root`.
///
/// The result order is deterministic for a given filesystem state.
///
/// # Errors
///
/// Returns [`Error::Read`] on any listing or read failure, [`Error::Parse`] /
/// [`Error::InvalidDocument`] on bad YAML, and whatever the builder returns
/// for builder-managed directories.
#[instrument(skip(options, builder), fields(recurse = options.recurse))]
pub fn discover<B>(root: &Path, options: &DiscoveryOptions, builder: &B) -> Result<Vec<Document>>
where
    B: ManifestBuilder + ?Sized,
{
    let mut documents = Vec::new();
    let mut ancestors = Vec::new();
    collect_dir(root, options, builder, &mut ancestors, &mut documents)?;
    debug!(count = documents.len(), "discovery finished");
    Ok(documents)
}

/// `ancestors` holds the canonical paths of the directories currently being
/// scanned, outermost first.
fn collect_dir<B>(
    dir: &Path,
    options: &DiscoveryOptions,
    builder: &B,
    ancestors: &mut Vec<PathBuf>,
    out: &mut Vec<Document>,
) -> Result<()>
where
    B: ManifestBuilder + ?Sized,
{
    if options.is_excluded(dir) {
        debug!("Skipping excluded directory: {}", dir.display());
        return Ok(());
    }

    let canonical = fs::canonicalize(dir).map_err(|source| Error::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    if ancestors.contains(&canonical) {
        return Err(Error::Read {
            path: dir.to_path_buf(),
            source: io::Error::other(format!(
                "directory loop: {} is already being scanned",
                canonical.display()
            )),
        });
    }

    ancestors.push(canonical);
    let result = collect_dir_contents(dir, options, builder, ancestors, out);
    ancestors.pop();
    result
}

fn collect_dir_contents<B>(
    dir: &Path,
    options: &DiscoveryOptions,
    builder: &B,
    ancestors: &mut Vec<PathBuf>,
    out: &mut Vec<Document>,
) -> Result<()>
where
    B: ManifestBuilder + ?Sized,
{
    if let Some(marker) = find_marker(dir) {
        if options.admits_marker(&marker) {
            out.extend(builder.build(dir)?);
            return Ok(());
        }
        info!("Kustomization found but filtered out in {}", dir.display());
    }

    let (files, subdirs) = list_dir(dir)?;

    for path in files {
        if is_marker(&path) || !options.admits_raw_file(&path) {
            continue;
        }
        out.extend(read_manifest_file(&path)?);
    }

    if options.recurse {
        for subdir in subdirs {
            collect_dir(&subdir, options, builder, ancestors, out)?;
        }
    }

    Ok(())
}

fn find_marker(dir: &Path) -> Option<PathBuf> {
    MARKER_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

fn is_marker(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| MARKER_FILES.contains(&name))
}

fn has_default_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DEFAULT_EXTENSIONS.contains(&ext))
}

/// Regular files and directories of `dir`, each sorted by name.
///
/// Symlinks are followed; dangling ones are skipped.
fn list_dir(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let read_err = |source| Error::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries: Vec<(OsString, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        entries.push((entry.file_name(), entry.path()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for (_, path) in entries {
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(source) => return Err(Error::Read { path, source }),
        };
        if metadata.is_file() {
            files.push(path);
        } else if metadata.is_dir() {
            subdirs.push(path);
        }
    }

    Ok((files, subdirs))
}

fn read_manifest_file(path: &Path) -> Result<Vec<Document>> {
    let text = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_stream(&text, &path.display().to_string())
}
