//! Renders the AST back to SOQL text. Parsing flattens explicit parentheses away (there is no
//! "Paren" node), so the renderer has to reinsert them wherever leaving them out would change
//! how the text re-parses — that's what the `needs_parens` helpers below are for. Everything
//! else is a direct, keyword-uppercasing walk of the tree.

use std::fmt::Write as _;

use itertools::Itertools;

use crate::ast::*;

fn append_joined<T: AppendSoql>(out: &mut String, items: &[T], sep: &str) {
    out.push_str(
        &items
            .iter()
            .map(|item| item.to_soql())
            .join(sep),
    );
}

/// Implemented by every AST node (and a few wrapper types) that can append its canonical SOQL
/// text representation onto a growing buffer.
pub trait AppendSoql {
    fn append_soql(&self, out: &mut String);

    fn to_soql(&self) -> String {
        let mut out = String::new();
        self.append_soql(&mut out);
        out
    }
}

impl AppendSoql for PositionedString {
    fn append_soql(&self, out: &mut String) {
        out.push_str(&self.val);
    }
}

fn append_number(out: &mut String, n: f64) {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        let _ = write!(out, "{}", n as i64);
    } else {
        let _ = write!(out, "{n}");
    }
}

impl AppendSoql for PositionedNumber {
    fn append_soql(&self, out: &mut String) {
        append_number(out, self.val);
    }
}

fn append_dotted_path(out: &mut String, path: &[PositionedString]) {
    for (i, part) in path.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&part.val);
    }
}

fn append_alias(out: &mut String, alias: &Option<PositionedString>) {
    if let Some(alias) = alias {
        out.push(' ');
        out.push_str(&alias.val);
    }
}

impl AppendSoql for SelectField {
    fn append_soql(&self, out: &mut String) {
        append_dotted_path(out, &self.name);
        append_alias(out, &self.alias);
    }
}

impl AppendSoql for SelectFunc {
    fn append_soql(&self, out: &mut String) {
        out.push_str(&self.name.val);
        out.push('(');
        append_joined(out, &self.args, ", ");
        out.push(')');
        append_alias(out, &self.alias);
    }
}

impl AppendSoql for TypeOfWhen {
    fn append_soql(&self, out: &mut String) {
        out.push_str(" WHEN ");
        out.push_str(&self.object_type.val);
        out.push_str(" THEN ");
        append_joined(out, &self.select, ", ");
    }
}

impl AppendSoql for TypeOf {
    fn append_soql(&self, out: &mut String) {
        out.push_str("TYPEOF ");
        out.push_str(&self.relationship.val);
        for when in &self.whens {
            when.append_soql(out);
        }
        if let Some(elses) = &self.elses {
            out.push_str(" ELSE ");
            append_joined(out, elses, ", ");
        }
        out.push_str(" END");
    }
}

impl AppendSoql for SObjectRef {
    fn append_soql(&self, out: &mut String) {
        out.push_str(&self.name.val);
        append_alias(out, &self.alias);
    }
}

impl AppendSoql for FromClause {
    fn append_soql(&self, out: &mut String) {
        self.sobject.append_soql(out);
        for related in &self.related_objects {
            out.push_str(", ");
            related.append_soql(out);
        }
    }
}

fn escape_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

impl AppendSoql for LiteralValue {
    fn append_soql(&self, out: &mut String) {
        match (&self.val, self.kind) {
            (LiteralVal::Str(s), LiteralKind::String) => out.push_str(&escape_string_literal(s)),
            (LiteralVal::Str(s), _) => out.push_str(s),
            (LiteralVal::Num(n), _) => append_number(out, *n),
            (LiteralVal::Bool(b), _) => out.push_str(if *b { "TRUE" } else { "FALSE" }),
            (LiteralVal::Null, _) => out.push_str("NULL"),
        }
    }
}

impl AppendSoql for LiteralValueArray {
    fn append_soql(&self, out: &mut String) {
        out.push('(');
        append_joined(out, &self.values, ", ");
        out.push(')');
    }
}

impl AppendSoql for DataCategoryFilter {
    fn append_soql(&self, out: &mut String) {
        out.push_str(&self.category.val);
        out.push(' ');
        out.push_str(&self.op.val);
        out.push(' ');
        if self.values.len() == 1 {
            out.push_str(&self.values[0].val);
        } else {
            out.push('(');
            out.push_str(&self.values.iter().map(|v| v.val.as_str()).join(", "));
            out.push(')');
        }
    }
}

impl AppendSoql for GroupBy {
    fn append_soql(&self, out: &mut String) {
        let wrap = !matches!(self.kind, GroupByKind::GroupBy);
        if wrap {
            out.push_str(&self.kind.to_string());
            out.push('(');
        }
        append_joined(out, &self.fields, ", ");
        if wrap {
            out.push(')');
        }
    }
}

impl AppendSoql for OrderBy {
    fn append_soql(&self, out: &mut String) {
        self.field.append_soql(out);
        out.push_str(if self.asc { " ASC" } else { " DESC" });
        if self.nulls != NullsOrder::Default {
            out.push_str(" NULLS ");
            out.push_str(&self.nulls.to_string());
        }
    }
}

impl AppendSoql for OrderBys {
    fn append_soql(&self, out: &mut String) {
        append_joined(out, &self.items, ", ");
    }
}

/// `true` if `expr` must be wrapped in parens to appear as the operand of a `NOT`. The grammar
/// restricts `PrimaryExpr` to `'(' Expr ')' | Comparison`, so anything that isn't a bare
/// comparison needs its parens put back.
fn not_operand_needs_parens(expr: &Expr) -> bool {
    !matches!(expr, Expr::Comparison(_))
}

/// `true` if `operand` (appearing as one side of an `AndOr` whose operator is `parent_op`) must
/// be parenthesized to preserve the original grouping. A left operand that shares the parent's
/// operator is already left-associative and safe to leave flat; everything else that is itself
/// an `AndOr` needs parens (most importantly a right operand, or a different operator either
/// side, since those can't be re-flattened without changing meaning).
fn and_or_operand_needs_parens(operand: &Expr, parent_op: &str, is_left: bool) -> bool {
    match operand {
        Expr::AndOr(inner) => !(is_left && inner.op.val.eq_ignore_ascii_case(parent_op)),
        _ => false,
    }
}

fn append_maybe_parenthesized(out: &mut String, expr: &Expr, needs_parens: bool) {
    if needs_parens {
        out.push('(');
        expr.append_soql(out);
        out.push(')');
    } else {
        expr.append_soql(out);
    }
}

impl AppendSoql for Expr {
    fn append_soql(&self, out: &mut String) {
        match self {
            Expr::SelectField(n) => n.append_soql(out),
            Expr::SelectFunc(n) => n.append_soql(out),
            Expr::TypeOf(n) => n.append_soql(out),
            Expr::Literal(n) => n.append_soql(out),
            Expr::LiteralArray(n) => n.append_soql(out),
            Expr::Comparison(n) => {
                n.left.append_soql(out);
                out.push(' ');
                out.push_str(&n.op.val);
                out.push(' ');
                n.right.append_soql(out);
            }
            Expr::AndOr(n) => {
                let left_parens = and_or_operand_needs_parens(&n.left, &n.op.val, true);
                let right_parens = and_or_operand_needs_parens(&n.right, &n.op.val, false);
                append_maybe_parenthesized(out, &n.left, left_parens);
                out.push(' ');
                out.push_str(&n.op.val);
                out.push(' ');
                append_maybe_parenthesized(out, &n.right, right_parens);
            }
            Expr::Not(n) => {
                out.push_str("NOT ");
                append_maybe_parenthesized(out, &n.expr, not_operand_needs_parens(&n.expr));
            }
            Expr::DataCategory(n) => n.append_soql(out),
            Expr::Nested(n) => {
                out.push('(');
                out.push_str(&n.query.render());
                out.push(')');
            }
        }
    }
}

impl AppendSoql for SelectQuery {
    fn append_soql(&self, out: &mut String) {
        out.push_str("SELECT ");
        append_joined(out, &self.select_exprs, ", ");
        out.push_str(" FROM ");
        self.from.append_soql(out);

        if let Some(scope) = &self.filter_scope {
            out.push_str(" USING SCOPE ");
            out.push_str(&scope.val);
        }

        if let Some(w) = &self.where_expr {
            out.push_str(" WHERE ");
            w.append_soql(out);
        }

        if let Some(cats) = &self.with_data_category {
            out.push_str(" WITH DATA CATEGORY ");
            append_joined(out, cats, " AND ");
        }

        if let Some(group_by) = &self.group_by {
            out.push_str(" GROUP BY ");
            group_by.append_soql(out);
            if let Some(having) = &self.having {
                out.push_str(" HAVING ");
                having.append_soql(out);
            }
        }

        if let Some(order_by) = &self.order_by {
            out.push_str(" ORDER BY ");
            order_by.append_soql(out);
        }

        if let Some(limit) = &self.limit {
            out.push_str(" LIMIT ");
            limit.append_soql(out);
        }

        if let Some(offset) = &self.offset {
            out.push_str(" OFFSET ");
            offset.append_soql(out);
        }

        if let Some(for_clause) = &self.for_view_or_reference {
            out.push_str(" FOR ");
            out.push_str(&for_clause.to_string());
        }

        if let Some(update) = &self.update_tracking {
            out.push_str(" UPDATE ");
            out.push_str(&update.to_string());
        }
    }
}

impl SelectQuery {
    /// Renders the query back to canonical SOQL text, in clause order.
    pub fn render(&self) -> String {
        self.to_soql()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::span::Span;

    fn sp() -> Span {
        Span::new(0, 0)
    }

    fn field(name: &str) -> SelectField {
        SelectField {
            name: vec![PositionedString::new(name, sp())],
            alias: None,
            loc: sp(),
        }
    }

    #[test]
    fn renders_simple_select_from() {
        let q = SelectQuery {
            select_exprs: vec![Expr::SelectField(field("Id")), Expr::SelectField(field("Name"))],
            from: FromClause {
                sobject: SObjectRef {
                    name: PositionedString::new("Account", sp()),
                    alias: None,
                    loc: sp(),
                },
                related_objects: vec![],
                loc: sp(),
            },
            filter_scope: None,
            where_expr: None,
            with_data_category: None,
            group_by: None,
            having: None,
            order_by: None,
            limit: None,
            offset: None,
            for_view_or_reference: None,
            update_tracking: None,
            loc: sp(),
        };
        assert_eq!(q.render(), "SELECT Id, Name FROM Account");
    }

    #[test]
    fn not_wraps_non_comparison_operand() {
        let inner = Expr::AndOr(OpAndOrExpr {
            left: Box::new(Expr::Comparison(ComparisonExpr {
                left: Box::new(Expr::SelectField(field("A"))),
                op: PositionedString::new("=", sp()),
                right: Box::new(Expr::Literal(LiteralValue {
                    val: LiteralVal::Bool(true),
                    kind: LiteralKind::Bool,
                    loc: sp(),
                })),
                loc: sp(),
            })),
            op: PositionedString::new("AND", sp()),
            right: Box::new(Expr::Comparison(ComparisonExpr {
                left: Box::new(Expr::SelectField(field("B"))),
                op: PositionedString::new("=", sp()),
                right: Box::new(Expr::Literal(LiteralValue {
                    val: LiteralVal::Bool(false),
                    kind: LiteralKind::Bool,
                    loc: sp(),
                })),
                loc: sp(),
            })),
            loc: sp(),
        });
        let not = Expr::Not(NotExpr {
            expr: Box::new(inner),
            loc: sp(),
        });
        assert_eq!(not.to_soql(), "NOT (A = TRUE AND B = FALSE)");
    }

    #[test]
    fn left_associative_same_operator_does_not_reparenthesize() {
        let a_and_b = Expr::AndOr(OpAndOrExpr {
            left: Box::new(Expr::Comparison(ComparisonExpr {
                left: Box::new(Expr::SelectField(field("A"))),
                op: PositionedString::new("=", sp()),
                right: Box::new(Expr::Literal(LiteralValue {
                    val: LiteralVal::Bool(true),
                    kind: LiteralKind::Bool,
                    loc: sp(),
                })),
                loc: sp(),
            })),
            op: PositionedString::new("AND", sp()),
            right: Box::new(Expr::Comparison(ComparisonExpr {
                left: Box::new(Expr::SelectField(field("B"))),
                op: PositionedString::new("=", sp()),
                right: Box::new(Expr::Literal(LiteralValue {
                    val: LiteralVal::Bool(true),
                    kind: LiteralKind::Bool,
                    loc: sp(),
                })),
                loc: sp(),
            })),
            loc: sp(),
        });
        let chained = Expr::AndOr(OpAndOrExpr {
            left: Box::new(a_and_b),
            op: PositionedString::new("AND", sp()),
            right: Box::new(Expr::Comparison(ComparisonExpr {
                left: Box::new(Expr::SelectField(field("C"))),
                op: PositionedString::new("=", sp()),
                right: Box::new(Expr::Literal(LiteralValue {
                    val: LiteralVal::Bool(true),
                    kind: LiteralKind::Bool,
                    loc: sp(),
                })),
                loc: sp(),
            })),
            loc: sp(),
        });
        assert_eq!(chained.to_soql(), "A = TRUE AND B = TRUE AND C = TRUE");
    }

    #[test]
    fn literal_number_prints_without_trailing_zero() {
        let n = LiteralValue {
            val: LiteralVal::Num(5.0),
            kind: LiteralKind::Number,
            loc: sp(),
        };
        assert_eq!(n.to_soql(), "5");
    }

    #[test]
    fn string_literal_escapes_quotes() {
        let s = LiteralValue {
            val: LiteralVal::Str("O'Brien".to_string()),
            kind: LiteralKind::String,
            loc: sp(),
        };
        assert_eq!(s.to_soql(), "'O\\'Brien'");
    }
}
