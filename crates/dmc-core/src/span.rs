//! Source locations attached to expressions and diagnostics.

use std::cmp::Ordering;
use std::fmt;

/// Position of a node in a source file.
///
/// Spans order by file, then line, then column so that diagnostics gathered
/// from independently compiled procs can be merged back into source order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Index of the source file in the compilation's file table.
    pub file: u16,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self {
            file: 0,
            line,
            col,
            len,
        }
    }

    /// A zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, 0)
    }

    /// The same position in another file.
    #[inline]
    pub fn in_file(self, file: u16) -> Self {
        Self { file, ..self }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Extend this span to cover `other`.
    ///
    /// Spans on different lines keep the start of `self` and sum the lengths.
    pub fn to(self, other: Span) -> Span {
        if self.line == other.line {
            let start = self.col.min(other.col);
            let end = (self.col + self.len).max(other.col + other.len);
            Span {
                col: start,
                len: end - start,
                ..self
            }
        } else {
            Span {
                len: self.len + other.len,
                ..self
            }
        }
    }
}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Span {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.file, self.line, self.col, self.len).cmp(&(
            other.file,
            other.line,
            other.col,
            other.len,
        ))
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
