//! Skip rules: exact key paths and single-segment glob patterns
//!
//! A glob pattern is a dot-separated list of segments where `*` stands for
//! exactly one arbitrary segment. There is no multi-segment wildcard.
//!
//! - `states.*` matches `states.CA`, not `states` and not `other.CA`
//! - `*.internal.*` matches `config.internal.debug` and, through its leading
//!   wildcard, any path ending in three segments of that shape
//!   (`app.config.internal.debug`), but never `internal.debug`
//!
//! A pattern whose first segment is literal is anchored at the root.

use crate::content::KeyPath;
use crate::mt::error::{MtError, MtResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum GlobSegment {
    Any,
    Literal(String),
}

impl GlobSegment {
    fn matches(&self, segment: &str) -> bool {
        match self {
            GlobSegment::Any => true,
            GlobSegment::Literal(literal) => literal == segment,
        }
    }
}

/// A parsed `skipPaths` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    raw: String,
    segments: Vec<GlobSegment>,
}

impl GlobPattern {
    pub fn parse(pattern: &str) -> MtResult<Self> {
        if pattern.trim().is_empty() {
            return Err(MtError::Config("Skip path pattern cannot be empty".to_string()));
        }

        let segments = pattern
            .split('.')
            .map(|segment| match segment {
                "" => Err(MtError::Config(format!(
                    "Skip path pattern '{}' has an empty segment",
                    pattern
                ))),
                "*" => Ok(GlobSegment::Any),
                literal => Ok(GlobSegment::Literal(literal.to_string())),
            })
            .collect::<MtResult<Vec<_>>>()?;

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match against the segments of a key path
    pub fn matches<S: AsRef<str>>(&self, path: &[S]) -> bool {
        let width = self.segments.len();
        if path.len() < width {
            return false;
        }

        let window = match self.segments.first() {
            Some(GlobSegment::Any) => &path[path.len() - width..],
            _ if path.len() == width => path,
            _ => return false,
        };

        self.segments
            .iter()
            .zip(window)
            .all(|(pattern, segment)| pattern.matches(segment.as_ref()))
    }
}

/// Exact and glob exclusion rules supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct SkipRules {
    exact: Vec<String>,
    globs: Vec<GlobPattern>,
}

impl SkipRules {
    /// Build from the raw `skipKeys` / `skipPaths` options
    pub fn new<K, P>(skip_keys: &[K], skip_paths: &[P]) -> MtResult<Self>
    where
        K: AsRef<str>,
        P: AsRef<str>,
    {
        let globs = skip_paths
            .iter()
            .map(|p| GlobPattern::parse(p.as_ref()))
            .collect::<MtResult<Vec<_>>>()?;

        Ok(Self {
            exact: skip_keys.iter().map(|k| k.as_ref().to_string()).collect(),
            globs,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.globs.is_empty()
    }

    pub fn is_excluded(&self, path: &KeyPath) -> bool {
        if self.is_empty() {
            return false;
        }
        let rendered = path.to_string();
        let segments: Vec<String> = path.segments().iter().map(ToString::to_string).collect();
        self.exact.iter().any(|rule| *rule == rendered)
            || self.globs.iter().any(|glob| glob.matches(&segments))
    }
}

/// Check a dotted key path against exact and glob rules
pub fn is_excluded(key_path: &str, exact_rules: &[String], glob_rules: &[GlobPattern]) -> bool {
    if exact_rules.iter().any(|rule| rule == key_path) {
        return true;
    }
    let segments: Vec<&str> = key_path.split('.').collect();
    glob_rules.iter().any(|glob| glob.matches(&segments))
}
