use std::sync::Arc;

use crate::parser::{PRef, Parser};
use crate::result::{ParseResult, ResultValue};
use crate::state::{CaseSensitivity, ParseState};

struct Seq<T> {
    items: Vec<PRef<T>>,
}

impl<T: Send + Sync + 'static> Parser<T> for Seq<T> {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        let start = state.pos();
        let mut children = Vec::with_capacity(self.items.len());
        for item in &self.items {
            match item.parse(state) {
                Some(r) => children.push(r),
                None => {
                    if state.move_to(start).is_err() {
                        // a cut upstream forbids rewinding; surface the failure as-is.
                    }
                    return None;
                }
            }
        }
        let end = children.last().map(|c| c.range.end).unwrap_or(start);
        Some(ParseResult::leaf(ResultValue::Nodes(children), start..end))
    }

    fn contains_child_parsers(&self) -> bool {
        true
    }
}

/// Runs each parser in order; every one must succeed. On any failure, restores `pos` to the
/// sequence's start (subject to the cut watermark) and propagates the failure.
pub fn seq<T: Send + Sync + 'static>(items: Vec<PRef<T>>) -> PRef<T> {
    Arc::new(Seq { items })
}

struct FirstOf<T> {
    items: Vec<PRef<T>>,
}

impl<T: Send + Sync + 'static> Parser<T> for FirstOf<T> {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        let start = state.pos();
        for item in &self.items {
            if let Some(r) = item.parse(state) {
                return Some(r);
            }
            let _ = state.move_to(start);
        }
        None
    }

    fn contains_child_parsers(&self) -> bool {
        true
    }
}

/// Tries alternatives in declaration order; returns the first success. On total failure, the
/// deepest error recorded across all attempts is left on the state.
pub fn first_of<T: Send + Sync + 'static>(items: Vec<PRef<T>>) -> PRef<T> {
    Arc::new(FirstOf { items })
}

struct OneOf<T> {
    items: Vec<PRef<T>>,
}

impl<T: Send + Sync + 'static> Parser<T> for OneOf<T> {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        let start = state.pos();
        let mut best: Option<ParseResult<T>> = None;
        for item in &self.items {
            let _ = state.move_to(start);
            if let Some(r) = item.parse(state) {
                let is_longer = match &best {
                    Some(b) => r.range.end > b.range.end,
                    None => true,
                };
                if is_longer {
                    best = Some(r);
                }
            }
        }
        match best {
            Some(r) => {
                let _ = state.move_to(r.range.end);
                Some(r)
            }
            None => {
                let _ = state.move_to(start);
                None
            }
        }
    }

    fn contains_child_parsers(&self) -> bool {
        true
    }
}

/// Tries *every* alternative from the same starting position and keeps the one whose match
/// advances furthest; ties keep the earlier-listed alternative. This is the longest-match
/// disambiguator used throughout the SOQL grammar for overlapping keywords.
pub fn one_of<T: Send + Sync + 'static>(items: Vec<PRef<T>>) -> PRef<T> {
    Arc::new(OneOf { items })
}

/// Shorthand for `one_of` over a whitespace-separated list of literal tokens, e.g.
/// `one_of_tokens("ASC DESC")`.
pub fn one_of_tokens<T: Send + Sync + 'static>(tokens: &str) -> PRef<T> {
    one_of_tokens_list(tokens.split_whitespace().collect())
}

/// As [`one_of_tokens`], but takes the tokens as a list rather than splitting a string.
pub fn one_of_tokens_list<T: Send + Sync + 'static>(tokens: Vec<&str>) -> PRef<T> {
    let items = tokens
        .into_iter()
        .map(|t| crate::primitives::eq(t, CaseSensitivity::Insensitive))
        .collect();
    one_of(items)
}

struct ZeroOrOne<T> {
    inner: PRef<T>,
    ignoring: Option<Arc<dyn Fn(&ResultValue<T>) -> bool + Send + Sync>>,
}

impl<T: Send + Sync + 'static> Parser<T> for ZeroOrOne<T> {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        let start = state.pos();
        match self.inner.parse(state) {
            Some(r) => {
                if let Some(ignoring) = &self.ignoring {
                    if ignoring(&r.value) {
                        return Some(ParseResult::leaf(ResultValue::Null, r.range));
                    }
                }
                Some(r)
            }
            None => {
                let _ = state.move_to(start);
                Some(ParseResult::null(start))
            }
        }
    }

    fn contains_child_parsers(&self) -> bool {
        true
    }
}

/// Attempts `inner`; always succeeds. A failed attempt yields a `Null` result at the current
/// position without consuming input.
pub fn zero_or_one<T: Send + Sync + 'static>(inner: PRef<T>) -> PRef<T> {
    Arc::new(ZeroOrOne {
        inner,
        ignoring: None,
    })
}

/// As [`zero_or_one`], but a successful match whose value satisfies `ignoring` is reported as
/// `Null` instead (used e.g. to treat a matched-but-meaningless token as "absent").
pub fn zero_or_one_ignoring<T: Send + Sync + 'static>(
    inner: PRef<T>,
    ignoring: impl Fn(&ResultValue<T>) -> bool + Send + Sync + 'static,
) -> PRef<T> {
    Arc::new(ZeroOrOne {
        inner,
        ignoring: Some(Arc::new(ignoring)),
    })
}

struct Repeat<T> {
    inner: PRef<T>,
    separator: Option<PRef<T>>,
    min: usize,
    max: Option<usize>,
}

impl<T: Send + Sync + 'static> Parser<T> for Repeat<T> {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        let start = state.pos();
        let mut children = Vec::new();

        loop {
            if let Some(max) = self.max {
                if children.len() >= max {
                    break;
                }
            }
            let before_item = state.pos();
            if !children.is_empty() {
                if let Some(sep) = &self.separator {
                    let before_sep = state.pos();
                    if sep.parse(state).is_none() {
                        let _ = state.move_to(before_sep);
                        break;
                    }
                    // a separator was consumed: a following item is now mandatory, a
                    // dangling separator is a parse failure for the whole repetition.
                    match self.inner.parse(state) {
                        Some(r) => {
                            children.push(r);
                            continue;
                        }
                        None => {
                            if state.move_to(start).is_err() {
                                return None;
                            }
                            return None;
                        }
                    }
                }
            }
            match self.inner.parse(state) {
                Some(r) => children.push(r),
                None => {
                    let _ = state.move_to(before_item);
                    break;
                }
            }
        }

        if children.len() < self.min {
            if state.move_to(start).is_err() {
                // cut forbids rewinding past a partial match; surface the failure as-is.
            }
            return None;
        }

        let end = children.last().map(|c| c.range.end).unwrap_or(start);
        Some(ParseResult::leaf(ResultValue::Nodes(children), start..end))
    }

    fn contains_child_parsers(&self) -> bool {
        true
    }
}

/// Zero-or-more repetitions of `inner`, optionally separated by `separator`. A separator with
/// no following item is a hard failure, not a stop condition. `max` (if given) caps the count;
/// once reached, the repetition simply stops (leaving input for whatever comes next).
pub fn zero_or_many<T: Send + Sync + 'static>(
    inner: PRef<T>,
    separator: Option<PRef<T>>,
    max: Option<usize>,
) -> PRef<T> {
    Arc::new(Repeat {
        inner,
        separator,
        min: 0,
        max,
    })
}

/// As [`zero_or_many`], but requires at least one match.
pub fn one_or_many<T: Send + Sync + 'static>(
    inner: PRef<T>,
    separator: Option<PRef<T>>,
    max: Option<usize>,
) -> PRef<T> {
    Arc::new(Repeat {
        inner,
        separator,
        min: 1,
        max,
    })
}

struct Cut;

impl<T: Send + Sync + 'static> Parser<T> for Cut {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        state.mark_cut();
        Some(ParseResult::null(state.pos()))
    }
}

/// A zero-width parser that raises the cut watermark to the current position and always
/// succeeds. Placed after a distinctive keyword, it commits the parse to this alternative:
/// subsequent failures can no longer backtrack past the cut, sharpening the reported error.
pub fn cut<T: Send + Sync + 'static>() -> PRef<T> {
    Arc::new(Cut)
}

struct FromBlock<T> {
    f: Box<dyn Fn(&mut ParseState) -> Option<ParseResult<T>> + Send + Sync>,
}

impl<T: Send + Sync + 'static> Parser<T> for FromBlock<T> {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        (self.f)(state)
    }
}

/// Wraps an arbitrary closure as a parser; the escape hatch for logic that doesn't fit the
/// other combinators.
pub fn from_block<T: Send + Sync + 'static>(
    f: impl Fn(&mut ParseState) -> Option<ParseResult<T>> + Send + Sync + 'static,
) -> PRef<T> {
    Arc::new(FromBlock { f: Box::new(f) })
}

struct OnMatch<T> {
    inner: PRef<T>,
    mapper: Box<dyn Fn(&ParseResult<T>) -> ResultValue<T> + Send + Sync>,
}

impl<T: Send + Sync + 'static> Parser<T> for OnMatch<T> {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        let r = self.inner.parse(state)?;
        let value = (self.mapper)(&r);
        Some(ParseResult::leaf(value, r.range))
    }

    fn contains_child_parsers(&self) -> bool {
        true
    }
}

/// Runs `inner`; on success, replaces the result's value with `mapper(&result)`, keeping the
/// matched range. This is how grammar code turns a generic parse tree into typed AST nodes.
pub fn on_match<T: Send + Sync + 'static>(
    inner: PRef<T>,
    mapper: impl Fn(&ParseResult<T>) -> ResultValue<T> + Send + Sync + 'static,
) -> PRef<T> {
    Arc::new(OnMatch {
        inner,
        mapper: Box::new(mapper),
    })
}

/// A mapper selecting child `idx` of an array result as the new value.
pub fn pick<T: Clone + Send + Sync + 'static>(
    idx: usize,
) -> impl Fn(&ParseResult<T>) -> ResultValue<T> + Send + Sync + 'static {
    move |r: &ParseResult<T>| {
        r.child(idx)
            .map(|c| c.value.clone())
            .unwrap_or(ResultValue::Null)
    }
}

/// A mapper that hoists each child's own value into a flattened array result; a no-op shaped
/// pass-through used to compose further mappers over a "children as values" view, matching the
/// source material's `pickVals` helper.
pub fn pick_vals<T: Clone + Send + Sync + 'static>(
    r: &ParseResult<T>,
) -> ResultValue<T> {
    ResultValue::Nodes(r.children().to_vec())
}

/// A mapper that ignores the matched input and always yields the constant `v`. Used for
/// mapping a matched keyword to a fixed enum-ish value.
pub fn set_value<T: Clone + Send + Sync + 'static>(
    v: ResultValue<T>,
) -> impl Fn(&ParseResult<T>) -> ResultValue<T> + Send + Sync + 'static {
    move |_r: &ParseResult<T>| v.clone()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::primitives::eq;

    fn lit(s: &str) -> PRef<()> {
        eq(s, CaseSensitivity::Insensitive)
    }

    #[test]
    fn seq_requires_all_and_restores_on_failure() {
        let p = seq(vec![lit("SELECT"), lit(" "), lit("Id")]);
        let mut s = ParseState::new("SELECT Name");
        assert!(p.parse(&mut s).is_none());
        assert_eq!(s.pos(), 0);
    }

    #[test]
    fn seq_success_spans_all_children() {
        let p = seq(vec![lit("SELECT"), lit(" "), lit("Id")]);
        let mut s = ParseState::new("SELECT Id");
        let r = p.parse(&mut s).unwrap();
        assert_eq!(r.range, 0..9);
        assert_eq!(r.children().len(), 3);
    }

    #[test]
    fn first_of_returns_first_success() {
        let p = first_of(vec![lit("FOO"), lit("FOOBAR")]);
        let mut s = ParseState::new("FOOBAR");
        let r = p.parse(&mut s).unwrap();
        assert_eq!(r.range, 0..3);
    }

    #[test]
    fn one_of_returns_longest_match() {
        let p = one_of(vec![lit("FOO"), lit("FOOBAR")]);
        let mut s = ParseState::new("FOOBAR");
        let r = p.parse(&mut s).unwrap();
        assert_eq!(r.range, 0..6);
        assert_eq!(s.pos(), 6);
    }

    #[test]
    fn one_of_ties_prefer_earlier_listed() {
        let p = one_of(vec![lit("Order"), lit("ORDER")]);
        let mut s = ParseState::new("ORDER");
        let r = p.parse(&mut s).unwrap();
        assert_eq!(r.as_str(), Some("ORDER"));
    }

    #[test]
    fn zero_or_many_of_empty_input_does_not_consume() {
        let p: PRef<()> = zero_or_many(lit("X"), None, None);
        let mut s = ParseState::new("");
        let r = p.parse(&mut s).unwrap();
        assert_eq!(r.children().len(), 0);
        assert_eq!(s.pos(), 0);
    }

    #[test]
    fn one_or_many_requires_at_least_one() {
        let p: PRef<()> = one_or_many(lit("X"), None, None);
        let mut s = ParseState::new("Y");
        assert!(p.parse(&mut s).is_none());
    }

    #[test]
    fn repeat_with_separator_requires_item_after_separator() {
        let p: PRef<()> = one_or_many(lit("X"), Some(lit(",")), None);
        let mut s = ParseState::new("X,");
        assert!(p.parse(&mut s).is_none());
    }

    #[test]
    fn repeat_respects_max() {
        let p: PRef<()> = zero_or_many(lit("X"), None, Some(2));
        let mut s = ParseState::new("XXX");
        let r = p.parse(&mut s).unwrap();
        assert_eq!(r.children().len(), 2);
        assert_eq!(s.pos(), 2);
    }

    #[test]
    fn cut_prevents_rewind_past_watermark() {
        let p: PRef<()> = seq(vec![lit("LIMIT"), cut(), lit("X")]);
        let mut s = ParseState::new("LIMIT Y");
        assert!(p.parse(&mut s).is_none());
        // the cut fired inside `LIMIT`'s success, so pos cannot rewind below 5.
        assert!(s.pos() >= 5);
    }

    #[test]
    fn zero_or_one_never_fails() {
        let p: PRef<()> = zero_or_one(lit("X"));
        let mut s = ParseState::new("Y");
        let r = p.parse(&mut s).unwrap();
        assert!(r.is_null());
        assert_eq!(s.pos(), 0);
    }
}
