use std::sync::Arc;

use regex::Regex;

use crate::parser::{PRef, Parser};
use crate::result::{ParseResult, ResultValue};
use crate::state::{CaseSensitivity, ParseState};

/// A predicate over a single character, used by [`characters`]/[`not_characters`].
pub type CharPredicate = fn(char) -> bool;

struct Eq {
    text: String,
    case: CaseSensitivity,
}

impl<T: Send + Sync + 'static> Parser<T> for Eq {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        let start = state.pos();
        match state.consume_string(&self.text, self.case) {
            Some(matched) => Some(ParseResult::leaf(
                ResultValue::Str(matched),
                start..state.pos(),
            )),
            None => {
                state.expected(self.text.clone());
                None
            }
        }
    }

    fn debug_name(&self) -> Option<&str> {
        Some(&self.text)
    }
}

/// Matches the literal `s` exactly (subject to `case`); on failure records `expected(s)`.
pub fn eq<T: Send + Sync + 'static>(s: impl Into<String>, case: CaseSensitivity) -> PRef<T> {
    Arc::new(Eq {
        text: s.into(),
        case,
    })
}

struct Characters {
    pred: CharPredicate,
    name: String,
    min: usize,
    negate: bool,
}

impl<T: Send + Sync + 'static> Parser<T> for Characters {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        let start = state.pos();
        let pred = self.pred;
        let negate = self.negate;
        let count = state.consume_character_set(move |c| pred(c) != negate);
        if count >= self.min {
            Some(ParseResult::leaf(
                ResultValue::Str(state.value_of_range(start..state.pos())),
                start..state.pos(),
            ))
        } else {
            let _ = state.move_to(start);
            state.expected_class(self.name.clone());
            None
        }
    }

    fn debug_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// Consumes a maximal run of characters satisfying `pred`; succeeds iff at least `min`
/// characters were consumed, otherwise records `expected_class(name)`.
pub fn characters<T: Send + Sync + 'static>(
    pred: CharPredicate,
    name: impl Into<String>,
    min: usize,
) -> PRef<T> {
    Arc::new(Characters {
        pred,
        name: name.into(),
        min,
        negate: false,
    })
}

/// As [`characters`], but consumes a maximal run of characters *not* satisfying `pred`.
pub fn not_characters<T: Send + Sync + 'static>(
    pred: CharPredicate,
    name: impl Into<String>,
    min: usize,
) -> PRef<T> {
    Arc::new(Characters {
        pred,
        name: name.into(),
        min,
        negate: true,
    })
}

struct IntegerNumber;

impl<T: Send + Sync + 'static> Parser<T> for IntegerNumber {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        let start = state.pos();
        if matches!(state.current_char(), Some('+') | Some('-')) {
            let _ = state.move_to(state.pos() + 1);
        }
        let digits = state.consume_character_set(|c| c.is_ascii_digit());
        if digits == 0 {
            let _ = state.move_to(start);
            state.expected_class("integer number");
            return None;
        }
        let text = state.value_of_range(start..state.pos());
        let value: f64 = text.parse().ok()?;
        Some(ParseResult::leaf(ResultValue::Num(value), start..state.pos()))
    }

    fn debug_name(&self) -> Option<&str> {
        Some("integer number")
    }
}

/// Matches an optionally signed run of digits, producing a numeric [`ResultValue::Num`].
pub fn integer_number<T: Send + Sync + 'static>() -> PRef<T> {
    Arc::new(IntegerNumber)
}

struct DecimalNumber;

impl<T: Send + Sync + 'static> Parser<T> for DecimalNumber {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        let start = state.pos();
        if matches!(state.current_char(), Some('+') | Some('-')) {
            let _ = state.move_to(state.pos() + 1);
        }
        let int_digits = state.consume_character_set(|c| c.is_ascii_digit());
        if int_digits == 0 {
            let _ = state.move_to(start);
            state.expected_class("decimal number");
            return None;
        }
        if state.current_char() == Some('.') {
            let dot_pos = state.pos();
            let _ = state.move_to(dot_pos + 1);
            let frac_digits = state.consume_character_set(|c| c.is_ascii_digit());
            if frac_digits == 0 {
                // a bare trailing `.` isn't part of the number (could be a field-path dot).
                let _ = state.move_to(dot_pos);
            }
        }
        if matches!(state.current_char(), Some('e') | Some('E')) {
            let exp_start = state.pos();
            let _ = state.move_to(exp_start + 1);
            if matches!(state.current_char(), Some('+') | Some('-')) {
                let _ = state.move_to(state.pos() + 1);
            }
            let exp_digits = state.consume_character_set(|c| c.is_ascii_digit());
            if exp_digits == 0 {
                let _ = state.move_to(exp_start);
            }
        }
        let text = state.value_of_range(start..state.pos());
        let value: f64 = text.parse().ok()?;
        Some(ParseResult::leaf(ResultValue::Num(value), start..state.pos()))
    }

    fn debug_name(&self) -> Option<&str> {
        Some("decimal number")
    }
}

/// Matches an optionally signed decimal number, with optional fractional part and
/// scientific-notation exponent.
pub fn decimal_number<T: Send + Sync + 'static>() -> PRef<T> {
    Arc::new(DecimalNumber)
}

struct RegexParser {
    re: Regex,
    name: String,
}

impl<T: Send + Sync + 'static> Parser<T> for RegexParser {
    fn parse(&self, state: &mut ParseState) -> Option<ParseResult<T>> {
        let start = state.pos();
        let tail = state.remaining_text();
        match self.re.find(&tail) {
            Some(m) if m.start() == 0 => {
                let matched_chars = tail[..m.end()].chars().count();
                let _ = state.move_to(start + matched_chars);
                Some(ParseResult::leaf(
                    ResultValue::Str(tail[..m.end()].to_string()),
                    start..state.pos(),
                ))
            }
            _ => {
                state.expected_class(self.name.clone());
                None
            }
        }
    }

    fn debug_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// Matches `re` anchored at the current position (the pattern is expected to begin with `^`,
/// or be naturally anchored by only matching at offset 0 of the remaining input).
pub fn regex<T: Send + Sync + 'static>(re: Regex, name: impl Into<String>) -> PRef<T> {
    Arc::new(RegexParser {
        re,
        name: name.into(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn eq_matches_and_advances() {
        let p = eq::<()>("SELECT", CaseSensitivity::Sensitive);
        let mut s = ParseState::new("SELECT Id");
        let r = p.parse(&mut s).unwrap();
        assert_eq!(r.range, 0..6);
        assert_eq!(s.pos(), 6);
    }

    #[test]
    fn eq_failure_restores_nothing_because_it_never_advanced() {
        let p = eq::<()>("FROM", CaseSensitivity::Sensitive);
        let mut s = ParseState::new("SELECT");
        assert!(p.parse(&mut s).is_none());
        assert_eq!(s.pos(), 0);
    }

    #[test]
    fn characters_respects_minimum() {
        let p = characters::<()>(|c| c.is_ascii_digit(), "digit", 2);
        let mut s = ParseState::new("5 ");
        assert!(p.parse(&mut s).is_none());
        assert_eq!(s.pos(), 0);

        let p = characters::<()>(|c| c.is_ascii_digit(), "digit", 1);
        let mut s = ParseState::new("5 ");
        let r = p.parse(&mut s).unwrap();
        assert_eq!(r.as_str(), Some("5"));
    }

    #[test]
    fn integer_number_parses_signed_digits() {
        let p = integer_number::<()>();
        let mut s = ParseState::new("-42 LIMIT");
        let r = p.parse(&mut s).unwrap();
        assert_eq!(r.as_num(), Some(-42.0));
        assert_eq!(s.pos(), 3);
    }

    #[test]
    fn decimal_number_parses_fraction_and_exponent() {
        let p = decimal_number::<()>();
        let mut s = ParseState::new("3.14e2x");
        let r = p.parse(&mut s).unwrap();
        assert_eq!(r.as_num(), Some(314.0));
        assert_eq!(s.pos(), 6);
    }

    #[test]
    fn decimal_number_does_not_eat_trailing_dot() {
        let p = decimal_number::<()>();
        let mut s = ParseState::new("5.Name");
        let r = p.parse(&mut s).unwrap();
        assert_eq!(r.as_num(), Some(5.0));
        assert_eq!(s.pos(), 1);
    }

    #[test]
    fn regex_matches_anchored_at_position() {
        let p = regex::<()>(Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap(), "identifier");
        let mut s = ParseState::new("Account.Name");
        let r = p.parse(&mut s).unwrap();
        assert_eq!(r.as_str(), Some("Account"));
    }
}
