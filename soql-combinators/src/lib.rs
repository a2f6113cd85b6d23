//! A small, reusable backtracking parser-combinator engine.
//!
//! This crate knows nothing about any particular grammar. It provides:
//! - [`ParseState`], the mutable cursor + lazy-error-accumulator over an input string.
//! - [`Parser`], the trait every combinator implements.
//! - [`ResultValue`]/[`ParseResult`], the generic result tree produced by a parse.
//! - a family of combinator factory functions (`seq`, `first_of`, `one_of`, `zero_or_many`, ...)
//!   in [`combinators`], and character/literal primitives in [`primitives`].
//!
//! Grammars are built by instantiating the engine's `T` type parameter with their own AST node
//! type and composing the factory functions below into a parser graph, usually rooted in a
//! `fn query() -> PRef<MyNode>` style function.

mod combinators;
mod error;
mod parser;
mod primitives;
mod result;
mod state;

pub use combinators::{
    cut, first_of, from_block, on_match, one_of, one_of_tokens, one_of_tokens_list, one_or_many,
    pick, pick_vals, seq, set_value, zero_or_many, zero_or_one, zero_or_one_ignoring,
};
pub use error::{ErrorCode, Expectation, ExpectedKind, ParseError};
pub use parser::{BoxedParser, Parser, ParserRef, PRef};
pub use primitives::{
    characters, decimal_number, eq, integer_number, not_characters, regex, CharPredicate,
};
pub use result::{ParseResult, ResultValue};
pub use state::{CaseSensitivity, ParseState};

/// Runs `parser` over the whole of `input`, requiring that it consume every non-whitespace
/// character. Returns the deepest retained error (materialized) on failure.
///
/// This is the usual entry point a grammar crate wraps with its own typed `parse` function.
pub fn parse_all<T>(
    parser: &dyn Parser<T>,
    input: &str,
) -> Result<ParseResult<T>, ParseError> {
    let mut state = ParseState::new(input);
    match parser.parse(&mut state) {
        Some(result) => {
            state.skip_trailing_whitespace();
            if state.has_more() {
                let rest = state.remaining_text();
                log::debug!("parse_all: extra input at {}: {:?}", state.pos(), rest);
                return Err(ParseError::extra_input(state.pos(), rest));
            }
            Ok(result)
        }
        None => {
            let err = state
                .take_error()
                .unwrap_or_else(|| ParseError::custom(0, "parse failed with no error recorded"));
            log::debug!("parse_all: failed at {}", err.position);
            Err(err)
        }
    }
}
