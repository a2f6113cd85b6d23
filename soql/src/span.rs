use serde::{Deserialize, Serialize};

/// A half-open character range into the original query string, `[start, end)`.
///
/// `Span` deliberately equals any other `Span` (see its `PartialEq` impl below) so that the
/// `#[derive(PartialEq)]` on every AST node compares structure only, never source location —
/// this is what the round-trip and idempotent-render properties mean by "AST equality ignoring
/// `loc`". Use `start`/`end` directly when a test needs to assert an actual position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl PartialEq for Span {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for Span {}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(r: std::ops::Range<usize>) -> Self {
        Span::new(r.start, r.end)
    }
}
