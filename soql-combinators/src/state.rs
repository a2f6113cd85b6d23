use crate::error::{Expectation, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

/// The mutable cursor over an input string, plus the cut watermark and lazily-accumulated
/// error, as described by the engine's input-state component.
///
/// Positions are character offsets, not byte offsets, so combinators never have to reason
/// about UTF-8 boundaries.
pub struct ParseState<'a> {
    chars: Vec<char>,
    byte_offsets: Vec<usize>,
    source: &'a str,
    pos: usize,
    cut: usize,
    error: Option<ParseError>,
}

impl<'a> ParseState<'a> {
    pub fn new(source: &'a str) -> Self {
        let chars: Vec<char> = source.chars().collect();
        let mut byte_offsets = Vec::with_capacity(chars.len() + 1);
        let mut offset = 0;
        for c in &chars {
            byte_offsets.push(offset);
            offset += c.len_utf8();
        }
        byte_offsets.push(offset);
        ParseState {
            chars,
            byte_offsets,
            source,
            pos: 0,
            cut: 0,
            error: None,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn cut(&self) -> usize {
        self.cut
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.pos < self.chars.len()
    }

    pub fn current_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// The unconsumed tail of the input, from `pos` to the end.
    pub fn remaining_text(&self) -> String {
        self.value_of_range(self.pos..self.chars.len())
    }

    /// The full original source, for callers that want to render annotated error snippets.
    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn value_of_range(&self, range: std::ops::Range<usize>) -> String {
        self.chars[range.start.min(self.chars.len())..range.end.min(self.chars.len())]
            .iter()
            .collect()
    }

    /// Skips whitespace without consuming it as a combinator match; used only by the
    /// top-level `parse_all` entry point to check for trailing garbage.
    pub fn skip_trailing_whitespace(&mut self) {
        while let Some(c) = self.current_char() {
            if c.is_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// If the upcoming characters equal `s` under `case`, advances past them and returns the
    /// actual matched substring. Otherwise leaves `pos` untouched and returns `None`.
    pub fn consume_string(&mut self, s: &str, case: CaseSensitivity) -> Option<String> {
        let want: Vec<char> = s.chars().collect();
        if self.pos + want.len() > self.chars.len() {
            return None;
        }
        let got = &self.chars[self.pos..self.pos + want.len()];
        let matches = match case {
            CaseSensitivity::Sensitive => got.iter().eq(want.iter()),
            CaseSensitivity::Insensitive => got
                .iter()
                .zip(want.iter())
                .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase())),
        };
        if matches {
            let matched: String = got.iter().collect();
            self.pos += want.len();
            Some(matched)
        } else {
            None
        }
    }

    /// Advances while the current character satisfies `pred`; returns the count consumed.
    pub fn consume_character_set(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if pred(c) {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.pos - start
    }

    /// Rewinds (or, less commonly, fast-forwards) to `p`. Fails if `p < cut`.
    pub fn move_to(&mut self, p: usize) -> Result<(), ()> {
        if p < self.cut {
            return Err(());
        }
        self.pos = p;
        Ok(())
    }

    /// Raises the cut watermark to the current position. No parser may subsequently
    /// `move_to` a position below this.
    pub fn mark_cut(&mut self) {
        self.cut = self.pos;
    }

    pub fn expected(&mut self, token: impl Into<String>) {
        self.record(Expectation::Token(token.into()));
    }

    pub fn expected_class(&mut self, name: impl Into<String>) {
        self.record(Expectation::Class(name.into()));
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.record(Expectation::Custom(msg.into()));
    }

    fn record(&mut self, expectation: Expectation) {
        match &mut self.error {
            Some(existing) if existing.position == self.pos => {
                existing.merge(expectation);
            }
            Some(existing) if existing.position > self.pos => {
                // a deeper error is already retained; discard this cheaper candidate.
            }
            _ => {
                self.error = Some(match &expectation {
                    Expectation::Token(t) => ParseError::expected_literal(self.pos, t.clone()),
                    Expectation::Class(c) => ParseError::expected_class(self.pos, c.clone()),
                    Expectation::Custom(m) => ParseError::custom(self.pos, m.clone()),
                });
            }
        }
    }

    pub fn take_error(&mut self) -> Option<ParseError> {
        self.error.take()
    }

    pub fn peek_error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn consume_string_case_sensitive() {
        let mut s = ParseState::new("SELECT Id");
        assert_eq!(s.consume_string("select", CaseSensitivity::Sensitive), None);
        assert_eq!(s.pos(), 0);
        assert_eq!(
            s.consume_string("SELECT", CaseSensitivity::Sensitive),
            Some("SELECT".to_string())
        );
        assert_eq!(s.pos(), 6);
    }

    #[test]
    fn consume_string_case_insensitive() {
        let mut s = ParseState::new("select Id");
        assert_eq!(
            s.consume_string("SELECT", CaseSensitivity::Insensitive),
            Some("select".to_string())
        );
        assert_eq!(s.pos(), 6);
    }

    #[test]
    fn move_to_below_cut_fails() {
        let mut s = ParseState::new("abcdef");
        s.pos = 4;
        s.mark_cut();
        assert_eq!(s.move_to(2), Err(()));
        assert_eq!(s.move_to(5), Ok(()));
        assert_eq!(s.pos(), 5);
    }

    #[test]
    fn error_retains_deepest_position() {
        let mut s = ParseState::new("abc");
        s.pos = 1;
        s.expected("X");
        s.pos = 0;
        s.expected("Y");
        let err = s.take_error().unwrap();
        assert_eq!(err.position, 1);
        assert_eq!(err.expected(), "'X'");
    }

    #[test]
    fn unicode_positions_are_char_based() {
        let mut s = ParseState::new("café SELECT");
        assert_eq!(s.len(), 11);
        s.consume_character_set(|c| c != ' ');
        assert_eq!(s.pos(), 4);
    }
}
