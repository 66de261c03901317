//! Hierarchical type paths such as `/obj/item/weapon`.

use std::fmt;
use std::str::FromStr;

use crate::PathError;

/// The identity of a declared type.
///
/// A path is a sequence of non-empty segments. The root path `/` has no
/// segments; every other path's default parent is the path with its last
/// segment removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TypePath {
    segments: Vec<String>,
}

impl TypePath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse an absolute path. Leading `/` is required; a trailing `/` is ignored.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let rest = text
            .strip_prefix('/')
            .ok_or_else(|| PathError::NotAbsolute(text.to_string()))?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for segment in rest.split('/') {
            if segment.is_empty() {
                return Err(PathError::EmptySegment(text.to_string()));
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(PathError::InvalidSegment {
                    path: text.to_string(),
                    segment: segment.to_string(),
                });
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments; the root has depth 0.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The final segment, or `None` for the root.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The path with the last segment removed; `None` for the root.
    pub fn parent(&self) -> Option<TypePath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append a segment.
    pub fn join(&self, segment: &str) -> TypePath {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    /// Whether `self` equals `prefix` or lies textually underneath it.
    pub fn starts_with(&self, prefix: &TypePath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl FromStr for TypePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
