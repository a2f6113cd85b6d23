use std::fmt;

/// A single expected-input candidate tied to a position. `ParseState` only ever keeps the
/// candidates at its current maximum position; see [`ParseState::expected`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// A specific literal token, e.g. `"FROM"`. Rendered quoted.
    Token(String),
    /// A syntactic class, e.g. `"identifier"` or `"whitespace"`. Rendered unquoted.
    Class(String),
    /// A free-form message that stands on its own (not joined with other expectations).
    Custom(String),
}

impl Expectation {
    fn render(&self) -> String {
        match self {
            Expectation::Token(t) => format!("'{t}'"),
            Expectation::Class(c) => c.clone(),
            Expectation::Custom(m) => m.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedKind {
    Token,
    Class,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ExpectedLiteral,
    ExpectedClass,
    ExtraInput,
    Custom,
}

/// An error produced while parsing. Only the error at the greatest position reached during a
/// parse is ever materialized into one of these; everything else is discarded as part of
/// ordinary backtracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub code: ErrorCode,
    pub position: usize,
    expectations: Vec<Expectation>,
}

impl ParseError {
    pub fn expected_literal(position: usize, token: impl Into<String>) -> Self {
        ParseError {
            code: ErrorCode::ExpectedLiteral,
            position,
            expectations: vec![Expectation::Token(token.into())],
        }
    }

    pub fn expected_class(position: usize, name: impl Into<String>) -> Self {
        ParseError {
            code: ErrorCode::ExpectedClass,
            position,
            expectations: vec![Expectation::Class(name.into())],
        }
    }

    pub fn custom(position: usize, message: impl Into<String>) -> Self {
        ParseError {
            code: ErrorCode::Custom,
            position,
            expectations: vec![Expectation::Custom(message.into())],
        }
    }

    pub fn extra_input(position: usize, found: impl Into<String>) -> Self {
        let found = found.into();
        let message = if found.is_empty() {
            "end of input".to_string()
        } else {
            format!("extra input {found:?}")
        };
        ParseError {
            code: ErrorCode::ExtraInput,
            position,
            expectations: vec![Expectation::Custom(message)],
        }
    }

    /// Merges in another expectation observed at the same position. Panics if `position`s
    /// differ; callers (`ParseState::expected*`) are responsible for that comparison.
    pub(crate) fn merge(&mut self, other: Expectation) {
        debug_assert_ne!(self.code, ErrorCode::ExtraInput);
        if !self.expectations.contains(&other) {
            self.expectations.push(other);
        }
    }

    pub fn expected_kind(&self) -> ExpectedKind {
        match self.expectations.first() {
            Some(Expectation::Class(_)) => ExpectedKind::Class,
            _ => ExpectedKind::Token,
        }
    }

    /// The expected-thing portion of the message, comma/​"or"-joined when more than one
    /// expectation is tied at this position.
    pub fn expected(&self) -> String {
        match self.expectations.len() {
            0 => "input".to_string(),
            1 => self.expectations[0].render(),
            _ => {
                let mut rendered: Vec<String> =
                    self.expectations.iter().map(Expectation::render).collect();
                rendered.sort();
                let last = rendered.pop().unwrap();
                format!("{} or {last}", rendered.join(", "))
            }
        }
    }

    /// The user-visible message: `expected <thing> at position <N>`.
    pub fn message(&self) -> String {
        if self.code == ErrorCode::Custom && self.expectations.len() == 1 {
            if let Expectation::Custom(m) = &self.expectations[0] {
                return format!("{m} at position {}", self.position);
            }
        }
        if self.code == ErrorCode::ExtraInput {
            if let Expectation::Custom(m) = &self.expectations[0] {
                return format!("{m} at position {}", self.position);
            }
        }
        format!("expected {} at position {}", self.expected(), self.position)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_expectation_message() {
        let e = ParseError::expected_literal(5, "FROM");
        assert_eq!(e.message(), "expected 'FROM' at position 5");
    }

    #[test]
    fn merged_expectations_are_sorted_and_joined() {
        let mut e = ParseError::expected_literal(5, "FROM");
        e.merge(Expectation::Token("WHERE".to_string()));
        assert_eq!(e.message(), "expected 'FROM' or 'WHERE' at position 5");
    }

    #[test]
    fn duplicate_expectations_are_not_repeated() {
        let mut e = ParseError::expected_class(0, "identifier");
        e.merge(Expectation::Class("identifier".to_string()));
        assert_eq!(e.message(), "expected identifier at position 0");
    }

    #[test]
    fn class_is_unquoted_token_is_quoted() {
        let e = ParseError::expected_class(0, "whitespace");
        assert_eq!(e.expected(), "whitespace");
        let e = ParseError::expected_literal(0, "LIMIT");
        assert_eq!(e.expected(), "'LIMIT'");
    }
}
