//! The public parse-error type. Wraps [`soql_combinators::ParseError`] with the byte-range the
//! caller actually wants (the engine tracks character offsets) and an `ariadne`-backed pretty
//! printer for terminal-friendly diagnostics.

use ariadne::{Color, Label, Report, ReportKind, Source};
use soql_combinators::{ErrorCode, ExpectedKind, ParseError as EngineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    ExpectedLiteral,
    ExpectedClass,
    ExtraInput,
    Custom,
}

impl From<ErrorCode> for Code {
    fn from(c: ErrorCode) -> Self {
        match c {
            ErrorCode::ExpectedLiteral => Code::ExpectedLiteral,
            ErrorCode::ExpectedClass => Code::ExpectedClass,
            ErrorCode::ExtraInput => Code::ExtraInput,
            ErrorCode::Custom => Code::Custom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Token,
    Class,
}

impl From<ExpectedKind> for Kind {
    fn from(k: ExpectedKind) -> Self {
        match k {
            ExpectedKind::Token => Kind::Token,
            ExpectedKind::Class => Kind::Class,
        }
    }
}

/// A failed parse. `position` is a character offset into the original input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub code: Code,
    pub position: usize,
    pub message: String,
    pub expected: String,
    pub expected_kind: Kind,
}

impl Error {
    pub(crate) fn from_engine(err: EngineError) -> Self {
        Error {
            code: err.code.into(),
            position: err.position,
            message: err.message(),
            expected: err.expected(),
            expected_kind: err.expected_kind().into(),
        }
    }

    /// Renders this error as an `ariadne` diagnostic against `source`, the original query text
    /// this error came from.
    pub fn with_source(&self, source: &str) -> String {
        let byte_pos = source
            .char_indices()
            .nth(self.position)
            .map(|(b, _)| b)
            .unwrap_or(source.len());
        // `byte_pos` can land exactly at `source.len()` (error at end-of-input, e.g. a missing
        // `FROM` object); the label must never reach past the text `Source::from(source)` holds.
        let span = if byte_pos < source.len() {
            byte_pos..byte_pos + 1
        } else {
            byte_pos..byte_pos
        };

        let mut buf = Vec::new();
        let report = Report::build(ReportKind::Error, (), byte_pos)
            .with_message(&self.message)
            .with_label(
                Label::new(span)
                    .with_message(format!("expected {}", self.expected))
                    .with_color(Color::Red),
            )
            .finish();
        report
            .write(Source::from(source), &mut buf)
            .expect("ariadne report always writes to an in-memory buffer");
        String::from_utf8(buf).expect("ariadne output is always valid UTF-8")
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    fn err(position: usize) -> Error {
        Error {
            code: Code::ExpectedClass,
            position,
            message: "expected identifier".to_string(),
            expected: "identifier".to_string(),
            expected_kind: Kind::Class,
        }
    }

    #[test]
    fn with_source_labels_a_mid_string_position() {
        let source = "SELECT Id FROM Account WHERE";
        let rendered = err(26).with_source(source);
        assert!(rendered.contains("expected identifier"));
    }

    #[test]
    fn with_source_does_not_panic_at_end_of_input() {
        let source = "SELECT Id FROM";
        let rendered = err(source.chars().count()).with_source(source);
        assert!(rendered.contains("expected identifier"));
    }
}
