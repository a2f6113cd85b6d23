use std::ops::Range;

/// The tagged sum a parser's value can take. `T` is the AST node type the grammar crate
/// supplies; `onMatch` mappers replace a [`ParseResult`]'s value with `Ast(node)`.
#[derive(Debug, Clone)]
pub enum ResultValue<T> {
    Null,
    Str(String),
    Num(f64),
    Nodes(Vec<ParseResult<T>>),
    Ast(T),
}

/// A parser's output: a value plus the source range it was matched from.
#[derive(Debug, Clone)]
pub struct ParseResult<T> {
    pub value: ResultValue<T>,
    pub range: Range<usize>,
}

impl<T> ParseResult<T> {
    pub fn leaf(value: ResultValue<T>, range: Range<usize>) -> Self {
        ParseResult { value, range }
    }

    pub fn null(at: usize) -> Self {
        ParseResult {
            value: ResultValue::Null,
            range: at..at,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.value, ResultValue::Nodes(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, ResultValue::Null)
    }

    pub fn children(&self) -> &[ParseResult<T>] {
        match &self.value {
            ResultValue::Nodes(items) => items,
            _ => &[],
        }
    }

    pub fn child(&self, idx: usize) -> Option<&ParseResult<T>> {
        self.children().get(idx)
    }

    pub fn child_is_null(&self, idx: usize) -> bool {
        self.child(idx).map(ParseResult::is_null).unwrap_or(true)
    }

    /// The `val` field projected out of each child, as the source material's `childVals`.
    pub fn child_vals(&self) -> Vec<&ResultValue<T>>
    where
        T: Clone,
    {
        self.children().iter().map(|c| &c.value).collect()
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            ResultValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match &self.value {
            ResultValue::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_ast(&self) -> Option<&T> {
        match &self.value {
            ResultValue::Ast(node) => Some(node),
            _ => None,
        }
    }

    pub fn into_ast(self) -> Option<T> {
        match self.value {
            ResultValue::Ast(node) => Some(node),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn array_result_projects_child_values() {
        let children = vec![
            ParseResult::<()>::leaf(ResultValue::Str("a".into()), 0..1),
            ParseResult::<()>::leaf(ResultValue::Null, 1..1),
        ];
        let r = ParseResult::<()>::leaf(ResultValue::Nodes(children), 0..1);
        assert!(r.is_array());
        assert!(!r.child_is_null(0));
        assert!(r.child_is_null(1));
        assert!(r.child_is_null(99));
    }
}
