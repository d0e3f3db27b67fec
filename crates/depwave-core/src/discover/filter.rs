//! Include/exclude glob matching.
//!
//! Patterns match a path from the right: a relative pattern with N
//! components is tested against the last N components of the path, so
//! `*.yaml` matches any YAML file at any depth and `.git/*` matches anything
//! directly inside a `.git` directory. Absolute patterns must match the whole
//! path. `*` never crosses a `/`.

use std::path::{Component, Path};

use globset::{GlobBuilder, GlobMatcher};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct Pattern {
    matcher: GlobMatcher,
    components: usize,
    absolute: bool,
}

impl Pattern {
    fn compile(raw: &str) -> Result<Self> {
        let absolute = raw.starts_with('/');
        let parts: Vec<&str> = raw
            .split('/')
            .filter(|part| !part.is_empty() && *part != ".")
            .collect();
        if parts.is_empty() {
            return Err(Error::InvalidPattern {
                pattern: raw.to_string(),
                reason: "empty pattern".to_string(),
            });
        }

        let normalized = if absolute {
            format!("/{}", parts.join("/"))
        } else {
            parts.join("/")
        };
        let matcher = GlobBuilder::new(&normalized)
            .literal_separator(true)
            .build()
            .map_err(|err| Error::InvalidPattern {
                pattern: raw.to_string(),
                reason: err.to_string(),
            })?
            .compile_matcher();

        Ok(Self {
            matcher,
            components: parts.len(),
            absolute,
        })
    }

    fn is_match(&self, path: &Path) -> bool {
        if self.absolute {
            return path.is_absolute() && self.matcher.is_match(path);
        }

        let names: Vec<String> = path
            .components()
            .filter_map(|component| match component {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if names.len() < self.components {
            return false;
        }
        let tail = names[names.len() - self.components..].join("/");
        self.matcher.is_match(tail)
    }
}

/// A compiled list of glob patterns; matches when any pattern matches.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Compile every pattern up front.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for the first pattern that is empty
    /// or not valid glob syntax.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::compile(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_match(&self, path: &Path) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> PatternSet {
        PatternSet::new(patterns).expect("patterns compile")
    }

    #[test]
    fn empty_set_matches_nothing() {
        let s = set(&[]);
        assert!(s.is_empty());
        assert!(!s.is_match(Path::new("/repo/a.yaml")));
    }

    #[test]
    fn file_name_pattern_matches_at_any_depth() {
        let s = set(&["*.yaml"]);
        assert!(s.is_match(Path::new("/repo/a.yaml")));
        assert!(s.is_match(Path::new("/repo/deep/nested/b.yaml")));
        assert!(!s.is_match(Path::new("/repo/c.json")));
    }

    #[test]
    fn literal_name_matches_directory_itself() {
        let s = set(&[".git"]);
        assert!(s.is_match(Path::new("/repo/.git")));
        assert!(!s.is_match(Path::new("/repo/.github")));
    }

    #[test]
    fn multi_component_pattern_matches_tail() {
        let s = set(&[".git/*"]);
        assert!(s.is_match(Path::new("/repo/.git/config")));
        assert!(!s.is_match(Path::new("/repo/.git")));
        assert!(!s.is_match(Path::new("/repo/.git/objects/ab")));
    }

    #[test]
    fn star_does_not_cross_separator() {
        let s = set(&["base/*.yaml"]);
        assert!(s.is_match(Path::new("/repo/base/a.yaml")));
        assert!(!s.is_match(Path::new("/repo/base/sub/a.yaml")));
    }

    #[test]
    fn absolute_pattern_matches_whole_path() {
        let s = set(&["/repo/*.yaml"]);
        assert!(s.is_match(Path::new("/repo/a.yaml")));
        assert!(!s.is_match(Path::new("/other/repo/a.yaml")));
        assert!(!s.is_match(Path::new("repo/a.yaml")));
    }

    #[test]
    fn leading_dot_slash_is_ignored() {
        let s = set(&["./secret.yaml"]);
        assert!(s.is_match(Path::new("/repo/secret.yaml")));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let err = PatternSet::new(&["[unclosed"]).expect_err("must fail");
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let err = PatternSet::new(&["/"]).expect_err("must fail");
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }
}
