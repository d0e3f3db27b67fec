use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Plugin parameter: descend into subdirectories.
pub const RECURSE_VAR: &str = "PARAM_DIRECTORY_RECURSE";
/// Plugin parameter: glob list of files/directories to read.
pub const INCLUDE_VAR: &str = "PARAM_DIRECTORY_INCLUDE";
/// Plugin parameter: glob list of files/directories to skip.
pub const EXCLUDE_VAR: &str = "PARAM_DIRECTORY_EXCLUDE";
/// Override for the kustomize executable.
pub const KUSTOMIZE_VAR: &str = "KUSTOMIZE_BIN";

/// Plugin parameters resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub recurse: bool,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub kustomize: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recurse: false,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            kustomize: default_kustomize(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when `PARAM_DIRECTORY_RECURSE` is not
    /// a recognizable boolean.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when the recurse flag is not a
    /// recognizable boolean.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let recurse = match lookup(RECURSE_VAR) {
            Some(raw) => parse_bool(RECURSE_VAR, &raw)?,
            None => false,
        };

        Ok(Self {
            recurse,
            include_patterns: parse_glob_list(lookup(INCLUDE_VAR).as_deref()),
            exclude_patterns: parse_glob_list(lookup(EXCLUDE_VAR).as_deref()),
            kustomize: lookup(KUSTOMIZE_VAR)
                .filter(|v| !v.trim().is_empty())
                .map_or_else(default_kustomize, PathBuf::from),
        })
    }
}

/// Split an Argo CD glob parameter into patterns.
///
/// Accepts `{a,b}` as well as a bare `a,b`; entries are trimmed and empty
/// ones dropped. `None` and blank input give an empty list.
#[must_use]
pub fn parse_glob_list(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let mut value = raw.trim();
    if let Some(inner) = value.strip_prefix('{').and_then(|v| v.strip_suffix('}')) {
        value = inner;
    }

    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        _ => Err(Error::InvalidConfig {
            name: name.to_string(),
            value: raw.to_string(),
            reason: "expected a boolean (true/false)".to_string(),
        }),
    }
}

fn default_kustomize() -> PathBuf {
    PathBuf::from("kustomize")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn parse_none_is_empty() {
        assert!(parse_glob_list(None).is_empty());
        assert!(parse_glob_list(Some("   ")).is_empty());
    }

    #[test]
    fn parse_argo_braces() {
        assert_eq!(
            parse_glob_list(Some("{config.yaml,*.json}")),
            vec!["config.yaml", "*.json"]
        );
    }

    #[test]
    fn parse_plain_comma_list() {
        assert_eq!(parse_glob_list(Some("a.yaml, ,b.yaml")), vec!["a.yaml", "b.yaml"]);
    }

    #[test]
    fn defaults_without_env() {
        let settings = settings_from(&[]).expect("load should succeed");
        assert_eq!(settings, Settings::default());
        assert!(!settings.recurse);
        assert!(settings.exclude_patterns.is_empty());
        assert_eq!(settings.kustomize, PathBuf::from("kustomize"));
    }

    #[test]
    fn recurse_accepts_common_spellings() {
        for raw in ["true", "TRUE", " yes ", "1", "on"] {
            let s = settings_from(&[(RECURSE_VAR, raw)]).expect("valid bool");
            assert!(s.recurse, "{raw:?} should enable recursion");
        }
        for raw in ["false", "0", "off", ""] {
            let s = settings_from(&[(RECURSE_VAR, raw)]).expect("valid bool");
            assert!(!s.recurse, "{raw:?} should disable recursion");
        }
    }

    #[test]
    fn recurse_rejects_garbage() {
        let err = settings_from(&[(RECURSE_VAR, "sometimes")]).expect_err("must fail");
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert!(err.to_string().contains(RECURSE_VAR));
    }

    #[test]
    fn complex_glob_parsing() {
        let s = settings_from(&[(EXCLUDE_VAR, "{foo.yaml, .git/*}")]).expect("load");
        assert_eq!(s.exclude_patterns, vec!["foo.yaml", ".git/*"]);
    }

    #[test]
    fn kustomize_override() {
        let s = settings_from(&[(KUSTOMIZE_VAR, "/opt/bin/kustomize")]).expect("load");
        assert_eq!(s.kustomize, PathBuf::from("/opt/bin/kustomize"));
    }
}
