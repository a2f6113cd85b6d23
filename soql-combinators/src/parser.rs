use std::sync::{Arc, RwLock};

use crate::result::ParseResult;
use crate::state::ParseState;

/// Every combinator implements this. `parse` either succeeds (`Some`, cursor advanced) or
/// fails (`None`, an error may have been recorded on `state`); restoring the cursor on
/// failure is the caller combinator's responsibility, not this parser's own.
pub trait Parser<T>: Send + Sync {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>>;

    /// Name used in debug/trace output. Unnamed by default.
    fn debug_name(&self) -> Option<&str> {
        None
    }

    /// True for combinators that wrap other parsers (used to indent debug output).
    fn contains_child_parsers(&self) -> bool {
        false
    }
}

/// Parser graphs are built once and then shared across however many concurrent parses run
/// against distinct input strings; `Arc` is what makes that free.
pub type PRef<T> = Arc<dyn Parser<T>>;

/// Boxed convenience alias for a freshly constructed parser before it's wrapped in `Arc` by a
/// combinator factory.
pub type BoxedParser<T> = Box<dyn Parser<T>>;

/// A forward reference: an indirection cell assigned once, after construction, to break
/// cycles in recursive grammars (e.g. a subquery's `Expr` referring back to `Query`).
pub struct ParserRef<T> {
    inner: RwLock<Option<PRef<T>>>,
}

impl<T> ParserRef<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(ParserRef {
            inner: RwLock::new(None),
        })
    }

    /// Assigns the parser this ref delegates to. Intended to be called exactly once, after
    /// the rest of the grammar graph referring to this `ParserRef` has been built.
    pub fn set(&self, parser: PRef<T>) {
        let mut guard = self.inner.write().expect("ParserRef lock poisoned");
        *guard = Some(parser);
    }
}

impl<T: 'static> Parser<T> for ParserRef<T> {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        let guard = self.inner.read().expect("ParserRef lock poisoned");
        let parser = guard
            .as_ref()
            .expect("ParserRef used before being assigned a parser");
        parser.parse(state)
    }

    fn contains_child_parsers(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::primitives::eq;
    use crate::state::CaseSensitivity;

    #[test]
    fn parser_ref_delegates_once_assigned() {
        let r: Arc<ParserRef<()>> = ParserRef::new();
        r.set(eq::<()>("SELECT", CaseSensitivity::Sensitive));
        let mut state = ParseState::new("SELECT");
        assert!(r.parse(&mut state).is_some());
    }

    #[test]
    #[should_panic(expected = "used before being assigned")]
    fn parser_ref_panics_if_unassigned() {
        let r: Arc<ParserRef<()>> = ParserRef::new();
        let mut state = ParseState::new("SELECT");
        r.parse(&mut state);
    }
}
