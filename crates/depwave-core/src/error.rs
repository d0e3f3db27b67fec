use std::fmt;
use std::io;
use std::path::PathBuf;

/// Machine-readable error codes for operators reading plugin logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidConfig,
    InvalidPattern,
    ReadFailed,
    ParseFailed,
    InvalidDocument,
    BuilderFailed,
    DuplicateResource,
    AmbiguousDependency,
    InvalidAnnotation,
    CycleDetected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidConfig => "E1001",
            Self::InvalidPattern => "E1002",
            Self::ReadFailed => "E2001",
            Self::ParseFailed => "E2002",
            Self::InvalidDocument => "E2003",
            Self::BuilderFailed => "E2004",
            Self::DuplicateResource => "E3001",
            Self::AmbiguousDependency => "E3002",
            Self::InvalidAnnotation => "E3003",
            Self::CycleDetected => "E3004",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidConfig => "Invalid plugin configuration",
            Self::InvalidPattern => "Invalid glob pattern",
            Self::ReadFailed => "Manifest read failed",
            Self::ParseFailed => "Manifest YAML parse error",
            Self::InvalidDocument => "Manifest is not a mapping",
            Self::BuilderFailed => "Kustomize build failed",
            Self::DuplicateResource => "Duplicate resource identity",
            Self::AmbiguousDependency => "Ambiguous dependency reference",
            Self::InvalidAnnotation => "Invalid depends-on annotation",
            Self::CycleDetected => "Dependency cycle detected",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidConfig => {
                Some("Check the PARAM_DIRECTORY_* plugin parameters and retry.")
            }
            Self::InvalidPattern => Some("Fix the glob syntax in directory.include/exclude."),
            Self::ReadFailed => Some("Check file permissions in the application source."),
            Self::ParseFailed => Some("Fix the YAML syntax of the reported file."),
            Self::InvalidDocument => None,
            Self::BuilderFailed => Some("Run `kustomize build` locally to see the full error."),
            Self::DuplicateResource => {
                Some("Give each resource a distinct apiVersion/kind/name combination.")
            }
            Self::AmbiguousDependency => {
                Some("Use the long apiVersion:kind:name form to pick one resource.")
            }
            Self::InvalidAnnotation => {
                Some("The depends-on annotation must be a comma-separated string.")
            }
            Self::CycleDetected => {
                Some("Remove/adjust depends-on annotations to keep the graph acyclic.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Fatal conditions. Every one of them aborts the run before any output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidConfig {
        name: String,
        value: String,
        reason: String,
    },

    #[error("invalid glob pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse YAML from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{origin}: {reason}")]
    InvalidDocument { origin: String, reason: String },

    #[error("failed to spawn {program}: {source}")]
    BuilderSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("kustomize failed in {}:\n{stderr}", .dir.display())]
    Builder { dir: PathBuf, stderr: String },

    #[error("resource '{id}' is defined more than once")]
    DuplicateResource { id: String },

    #[error("ambiguous dependency '{reference}' in '{from}'. Matches: {matches:?}")]
    AmbiguousDependency {
        from: String,
        reference: String,
        matches: Vec<String>,
    },

    #[error("depends-on annotation of '{id}' is not a string")]
    InvalidAnnotation { id: String },

    #[error("cycle detected in dependencies: {}", format_cycles(.cycles))]
    DependencyCycle { cycles: Vec<Vec<String>> },
}

impl Error {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::InvalidPattern { .. } => ErrorCode::InvalidPattern,
            Self::Read { .. } => ErrorCode::ReadFailed,
            Self::Parse { .. } => ErrorCode::ParseFailed,
            Self::InvalidDocument { .. } => ErrorCode::InvalidDocument,
            Self::BuilderSpawn { .. } | Self::Builder { .. } => ErrorCode::BuilderFailed,
            Self::DuplicateResource { .. } => ErrorCode::DuplicateResource,
            Self::AmbiguousDependency { .. } => ErrorCode::AmbiguousDependency,
            Self::InvalidAnnotation { .. } => ErrorCode::InvalidAnnotation,
            Self::DependencyCycle { .. } => ErrorCode::CycleDetected,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

fn format_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|members| {
            let mut path = members.join(" -> ");
            if let Some(first) = members.first() {
                path.push_str(" -> ");
                path.push_str(first);
            }
            path
        })
        .collect::<Vec<_>>()
        .join("; ")
}
