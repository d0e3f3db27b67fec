//! External overlay builder for kustomize-managed directories.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::manifest::{Document, parse_stream};

/// Flag always passed to `kustomize build` so exec/container plugins run.
pub const ENABLE_ALPHA_PLUGINS: &str = "--enable-alpha-plugins";

/// Produces the full document list for a builder-managed directory.
pub trait ManifestBuilder {
    /// # Errors
    ///
    /// Any failure is fatal for the whole run.
    fn build(&self, dir: &Path) -> Result<Vec<Document>>;
}

impl<F> ManifestBuilder for F
where
    F: Fn(&Path) -> Result<Vec<Document>>,
{
    fn build(&self, dir: &Path) -> Result<Vec<Document>> {
        self(dir)
    }
}

/// Runs `kustomize build <dir> --enable-alpha-plugins` and parses stdout.
#[derive(Debug, Clone)]
pub struct Kustomize {
    program: PathBuf,
}

impl Kustomize {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed for one directory.
    #[must_use]
    pub fn args(dir: &Path) -> Vec<OsString> {
        vec![
            OsString::from("build"),
            dir.as_os_str().to_os_string(),
            OsString::from(ENABLE_ALPHA_PLUGINS),
        ]
    }
}

impl Default for Kustomize {
    fn default() -> Self {
        Self::new("kustomize")
    }
}

impl ManifestBuilder for Kustomize {
    #[instrument(skip(self), fields(program = %self.program.display()))]
    fn build(&self, dir: &Path) -> Result<Vec<Document>> {
        info!("Running Kustomize in: {}", dir.display());

        let output = Command::new(&self.program)
            .args(Self::args(dir))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| Error::BuilderSpawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Builder {
                dir: dir.to_path_buf(),
                stderr: stderr.trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_stream(&stdout, &format!("kustomize build {}", dir.display()))
    }
}
