//! A SOQL (Salesforce Object Query Language) parser built on the `soql_combinators` engine.
//!
//! [`parse_soql`] turns a query string into a [`SelectQuery`] whose every node carries a
//! [`Span`] pinpointing the source text it came from; [`render::AppendSoql`]/
//! [`SelectQuery::render`] renders one back to canonical SOQL text.

mod ast;
mod error;
mod grammar;
mod render;
mod span;

pub use ast::*;
pub use error::{Code, Error, Kind};
pub use render::AppendSoql;
pub use span::Span;

/// Parses `input` as a single SOQL `SELECT` statement.
pub fn parse_soql(input: &str) -> Result<SelectQuery, Error> {
    let root: &dyn soql_combinators::Parser<Expr> = grammar::GRAMMAR.as_ref();
    let result = soql_combinators::parse_all(root, input).map_err(Error::from_engine)?;
    match result.into_ast() {
        Some(Expr::Nested(nested)) => Ok(*nested.query),
        _ => unreachable!("the grammar's root production always yields Expr::Nested"),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_simple_select() {
        let q = parse_soql("SELECT Id, Name FROM Account").unwrap();
        assert_eq!(q.select_exprs.len(), 2);
        assert_eq!(q.from.sobject.name.val, "Account");
    }

    #[test]
    fn rejects_missing_object_name() {
        let err = parse_soql("SELECT Id FROM").unwrap_err();
        assert!(err.position > 0);
    }

    #[test]
    fn round_trips_through_render() {
        let original = "SELECT Id, Name FROM Account WHERE Name = 'Acme' LIMIT 10";
        let parsed = parse_soql(original).unwrap();
        let rendered = parsed.render();
        let reparsed = parse_soql(&rendered).unwrap();
        assert_eq!(parsed, reparsed);
    }
}
