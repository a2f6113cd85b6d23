//! The SOQL grammar: combinators from `soql_combinators` wired together into a parser graph
//! whose `T` is [`Expr`]. Productions that don't correspond to an `Expr` variant (the `FROM`
//! clause, `GROUP BY`, `ORDER BY` items, the query itself) are left as raw, unmapped `seq`
//! results; a handful of `build_*` functions at the bottom walk those raw trees by child index
//! to assemble the plain structs the rest of the crate works with. Only productions that
//! *are* `Expr` variants (select fields, literals, comparisons, ...) go through `on_match`.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use soql_combinators::{
    characters, cut, decimal_number, eq, from_block, integer_number, on_match, one_of,
    one_of_tokens, one_or_many, regex as regex_parser, seq, zero_or_many, zero_or_one,
    CaseSensitivity, ParseResult, ParseState, ParserRef, ResultValue, PRef,
};

use crate::ast::*;
use crate::span::Span;

fn sp0() -> PRef<Expr> {
    characters(|c| c.is_whitespace(), "whitespace", 0)
}

fn sp() -> PRef<Expr> {
    characters(|c| c.is_whitespace(), "whitespace", 1)
}

fn sym(s: &'static str) -> PRef<Expr> {
    eq(s, CaseSensitivity::Sensitive)
}

fn comma() -> PRef<Expr> {
    seq(vec![sp0(), sym(","), sp0()])
}

fn ident() -> PRef<Expr> {
    regex_parser(
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap(),
        "identifier",
    )
}

/// A keyword match that requires a non-identifier boundary afterwards, so `kw("IN")` does not
/// accidentally match the first two letters of `INCLUDES`.
fn kw(text: &'static str) -> PRef<Expr> {
    from_block(move |state: &mut ParseState| {
        let start = state.pos();
        match state.consume_string(text, CaseSensitivity::Insensitive) {
            Some(matched) => {
                let boundary_ok = !matches!(
                    state.current_char(),
                    Some(c) if c.is_alphanumeric() || c == '_'
                );
                if boundary_ok {
                    Some(ParseResult::leaf(
                        ResultValue::Str(matched),
                        start..state.pos(),
                    ))
                } else {
                    let _ = state.move_to(start);
                    state.expected(text);
                    None
                }
            }
            None => {
                state.expected(text);
                None
            }
        }
    })
}

fn opt_alias() -> PRef<Expr> {
    zero_or_one(seq(vec![sp(), ident()]))
}

fn positioned_string_from(r: &ParseResult<Expr>) -> PositionedString {
    PositionedString::new(r.as_str().unwrap_or("").to_string(), Span::from(r.range.clone()))
}

fn alias_from_opt(alias_res: &ParseResult<Expr>) -> Option<PositionedString> {
    if alias_res.is_null() {
        None
    } else {
        Some(positioned_string_from(alias_res.child(1).unwrap()))
    }
}

fn cmp_op() -> PRef<Expr> {
    one_of(vec![
        sym("!="),
        sym("<>"),
        sym("<="),
        sym(">="),
        sym("="),
        sym("<"),
        sym(">"),
        kw("LIKE"),
        kw("INCLUDES"),
        kw("EXCLUDES"),
        on_match(seq(vec![kw("NOT"), sp(), kw("IN")]), |_r| {
            ResultValue::Str("NOT IN".to_string())
        }),
        kw("IN"),
    ])
}

// ---------------------------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------------------------

fn bool_literal() -> PRef<Expr> {
    one_of(vec![
        on_match(kw("TRUE"), |r| {
            ResultValue::Ast(Expr::Literal(LiteralValue {
                val: LiteralVal::Bool(true),
                kind: LiteralKind::Bool,
                loc: Span::from(r.range.clone()),
            }))
        }),
        on_match(kw("FALSE"), |r| {
            ResultValue::Ast(Expr::Literal(LiteralValue {
                val: LiteralVal::Bool(false),
                kind: LiteralKind::Bool,
                loc: Span::from(r.range.clone()),
            }))
        }),
    ])
}

fn null_literal() -> PRef<Expr> {
    on_match(kw("NULL"), |r| {
        ResultValue::Ast(Expr::Literal(LiteralValue {
            val: LiteralVal::Null,
            kind: LiteralKind::Null,
            loc: Span::from(r.range.clone()),
        }))
    })
}

fn date_literal() -> PRef<Expr> {
    let re = Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap();
    on_match(regex_parser(re, "date literal"), |r| {
        ResultValue::Ast(Expr::Literal(LiteralValue {
            val: LiteralVal::Str(r.as_str().unwrap_or("").to_string()),
            kind: LiteralKind::Date,
            loc: Span::from(r.range.clone()),
        }))
    })
}

fn datetime_literal() -> PRef<Expr> {
    let re = Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?").unwrap();
    on_match(regex_parser(re, "datetime literal"), |r| {
        ResultValue::Ast(Expr::Literal(LiteralValue {
            val: LiteralVal::Str(r.as_str().unwrap_or("").to_string()),
            kind: LiteralKind::DateTime,
            loc: Span::from(r.range.clone()),
        }))
    })
}

fn number_literal() -> PRef<Expr> {
    on_match(decimal_number(), |r| {
        ResultValue::Ast(Expr::Literal(LiteralValue {
            val: LiteralVal::Num(r.as_num().unwrap_or(0.0)),
            kind: LiteralKind::Number,
            loc: Span::from(r.range.clone()),
        }))
    })
}

/// A single-quoted string with `\' \" \\ \n \r \t \b \f` escapes. Hand-rolled via `from_block`
/// since the engine's primitives don't track escape state.
fn string_literal() -> PRef<Expr> {
    from_block(|state: &mut ParseState| {
        let start = state.pos();
        if state.current_char() != Some('\'') {
            state.expected("'");
            return None;
        }
        let _ = state.move_to(start + 1);
        let mut value = String::new();
        loop {
            match state.current_char() {
                None => {
                    state.error("unterminated string literal");
                    let _ = state.move_to(start);
                    return None;
                }
                Some('\'') => {
                    let _ = state.move_to(state.pos() + 1);
                    break;
                }
                Some('\\') => {
                    let _ = state.move_to(state.pos() + 1);
                    match state.current_char() {
                        Some(c) => {
                            value.push(match c {
                                'n' => '\n',
                                'r' => '\r',
                                't' => '\t',
                                'b' => '\u{8}',
                                'f' => '\u{c}',
                                other => other,
                            });
                            let _ = state.move_to(state.pos() + 1);
                        }
                        None => {
                            state.error("unterminated escape sequence");
                            let _ = state.move_to(start);
                            return None;
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    let _ = state.move_to(state.pos() + 1);
                }
            }
        }
        let end = state.pos();
        Some(ParseResult::leaf(
            ResultValue::Ast(Expr::Literal(LiteralValue {
                val: LiteralVal::Str(value),
                kind: LiteralKind::String,
                loc: Span::new(start, end),
            })),
            start..end,
        ))
    })
}

/// `IDENT [':' integer]`, e.g. `TODAY` or `LAST_N_DAYS:5` — SOQL's date-literal tokens.
fn token_literal() -> PRef<Expr> {
    let tail = zero_or_one(seq(vec![sym(":"), integer_number()]));
    on_match(seq(vec![ident(), tail]), |r| {
        let ident_str = r.child(0).and_then(|c| c.as_str()).unwrap_or("").to_string();
        let tail_child = r.child(1);
        let text = match tail_child {
            Some(tc) if !tc.is_null() => {
                let n = tc.child(1).and_then(|c| c.as_num()).unwrap_or(0.0);
                format!("{ident_str}:{}", n as i64)
            }
            _ => ident_str,
        };
        ResultValue::Ast(Expr::Literal(LiteralValue {
            val: LiteralVal::Str(text),
            kind: LiteralKind::Token,
            loc: Span::from(r.range.clone()),
        }))
    })
}

/// `'(' ScalarLiteral (',' ScalarLiteral)* ')'`. `scalar_literal` must never itself be (or
/// contain) a `literal_array` — SOQL value lists are flat, and the original ZKParser value-list
/// grammar has no nested-list form either — so this production can never see anything but
/// `Expr::Literal` children; a non-literal child here is a grammar bug, not a thing to drop.
fn literal_array(scalar_literal: PRef<Expr>) -> PRef<Expr> {
    on_match(
        seq(vec![
            sym("("),
            sp0(),
            one_or_many(scalar_literal, Some(comma()), None),
            sp0(),
            sym(")"),
        ]),
        |r| {
            let values: Vec<LiteralValue> = r
                .child(2)
                .unwrap()
                .children()
                .iter()
                .map(|c| {
                    c.as_ast()
                        .cloned()
                        .expect("literal_array elements always match scalar_literal")
                        .into_literal()
                        .ok()
                        .expect("scalar_literal never produces anything but Expr::Literal")
                })
                .collect();
            ResultValue::Ast(Expr::LiteralArray(LiteralValueArray {
                values,
                loc: Span::from(r.range.clone()),
            }))
        },
    )
}

// ---------------------------------------------------------------------------------------------
// Select fields, functions, TYPEOF, FROM
// ---------------------------------------------------------------------------------------------

fn select_field_body() -> PRef<Expr> {
    let path = one_or_many(ident(), Some(sym(".")), None);
    on_match(seq(vec![path, opt_alias()]), |r| {
        let name: Vec<PositionedString> = r
            .child(0)
            .unwrap()
            .children()
            .iter()
            .map(positioned_string_from)
            .collect();
        let alias = alias_from_opt(r.child(1).unwrap());
        ResultValue::Ast(Expr::SelectField(SelectField {
            name,
            alias,
            loc: Span::from(r.range.clone()),
        }))
    })
}

fn select_func_body() -> PRef<Expr> {
    let args = one_or_many(select_field_body(), Some(comma()), None);
    on_match(
        seq(vec![
            ident(),
            sym("("),
            sp0(),
            args,
            sp0(),
            sym(")"),
            opt_alias(),
        ]),
        |r| {
            let name = positioned_string_from(r.child(0).unwrap());
            let args: Vec<SelectField> = r
                .child(3)
                .unwrap()
                .children()
                .iter()
                .filter_map(|c| c.as_ast())
                .filter_map(|e| e.clone().into_select_field().ok())
                .collect();
            let alias = alias_from_opt(r.child(6).unwrap());
            ResultValue::Ast(Expr::SelectFunc(SelectFunc {
                name,
                args,
                alias,
                loc: Span::from(r.range.clone()),
            }))
        },
    )
}

fn typeof_body() -> PRef<Expr> {
    let when_clause = seq(vec![
        sp(),
        kw("WHEN"),
        sp(),
        ident(),
        sp(),
        kw("THEN"),
        sp(),
        one_or_many(select_field_body(), Some(comma()), None),
    ]);
    let whens = one_or_many(when_clause, None, None);
    let else_clause = zero_or_one(seq(vec![
        sp(),
        kw("ELSE"),
        sp(),
        one_or_many(select_field_body(), Some(comma()), None),
    ]));
    on_match(
        seq(vec![
            kw("TYPEOF"),
            sp(),
            ident(),
            whens,
            else_clause,
            sp(),
            kw("END"),
        ]),
        |r| {
            let relationship = positioned_string_from(r.child(2).unwrap());
            let whens: Vec<TypeOfWhen> = r
                .child(3)
                .unwrap()
                .children()
                .iter()
                .map(|w| {
                    let object_type = positioned_string_from(w.child(3).unwrap());
                    let select: Vec<SelectField> = w
                        .child(7)
                        .unwrap()
                        .children()
                        .iter()
                        .filter_map(|c| c.as_ast())
                        .filter_map(|e| e.clone().into_select_field().ok())
                        .collect();
                    TypeOfWhen {
                        object_type,
                        select,
                        loc: Span::from(w.range.clone()),
                    }
                })
                .collect();
            let elses_res = r.child(4).unwrap();
            let elses = if elses_res.is_null() {
                None
            } else {
                Some(
                    elses_res
                        .child(3)
                        .unwrap()
                        .children()
                        .iter()
                        .filter_map(|c| c.as_ast())
                        .filter_map(|e| e.clone().into_select_field().ok())
                        .collect(),
                )
            };
            ResultValue::Ast(Expr::TypeOf(TypeOf {
                relationship,
                whens,
                elses,
                loc: Span::from(r.range.clone()),
            }))
        },
    )
}

fn nested_query_body(query_ref: PRef<Expr>) -> PRef<Expr> {
    on_match(
        seq(vec![sym("("), sp0(), query_ref, sp0(), sym(")")]),
        |r| {
            let inner = r.child(2).unwrap().as_ast().unwrap().clone();
            let query = match inner {
                Expr::Nested(n) => n.query,
                _ => unreachable!("query_ref always yields Expr::Nested"),
            };
            ResultValue::Ast(Expr::Nested(NestedSelectQuery {
                query,
                loc: Span::from(r.range.clone()),
            }))
        },
    )
}

/// The `FROM` clause: `Ident [alias] (',' SelectField)*`. Left raw (unmapped); [`build_from`]
/// assembles the typed [`FromClause`] from its three children.
fn from_clause() -> PRef<Expr> {
    let related_item = seq(vec![sp0(), sym(","), sp0(), select_field_body()]);
    let related = zero_or_many(related_item, None, None);
    seq(vec![ident(), opt_alias(), related])
}

fn build_from(raw: &ParseResult<Expr>) -> FromClause {
    let name = positioned_string_from(raw.child(0).unwrap());
    let alias_res = raw.child(1).unwrap();
    let alias = alias_from_opt(alias_res);
    let sobject_end = if alias_res.is_null() {
        raw.child(0).unwrap().range.end
    } else {
        alias_res.range.end
    };
    let sobject = SObjectRef {
        loc: Span::new(name.loc.start, sobject_end),
        name,
        alias,
    };
    let related_objects: Vec<SelectField> = raw
        .child(2)
        .unwrap()
        .children()
        .iter()
        .map(|item| {
            item.child(3)
                .unwrap()
                .as_ast()
                .unwrap()
                .clone()
                .into_select_field()
                .ok()
                .expect("related_item's 4th child is always a SelectField")
        })
        .collect();
    FromClause {
        sobject,
        related_objects,
        loc: Span::from(raw.range.clone()),
    }
}

// ---------------------------------------------------------------------------------------------
// WITH DATA CATEGORY
// ---------------------------------------------------------------------------------------------

fn data_category_filter() -> PRef<Expr> {
    let op = one_of_tokens("ABOVE_OR_BELOW ABOVE BELOW AT IN");
    let paren_values = on_match(
        seq(vec![
            sym("("),
            sp0(),
            one_or_many(ident(), Some(comma()), None),
            sp0(),
            sym(")"),
        ]),
        |r| ResultValue::Nodes(r.child(2).unwrap().children().to_vec()),
    );
    let single_value = on_match(ident(), |r| ResultValue::Nodes(vec![r.clone()]));
    let value_list = one_of(vec![paren_values, single_value]);
    on_match(
        seq(vec![ident(), sp(), op, sp(), value_list]),
        |r| {
            let category = positioned_string_from(r.child(0).unwrap());
            let op_res = r.child(2).unwrap();
            let op = PositionedString::new(
                op_res.as_str().unwrap_or("").to_uppercase(),
                Span::from(op_res.range.clone()),
            );
            let values: Vec<PositionedString> = r
                .child(4)
                .unwrap()
                .children()
                .iter()
                .map(positioned_string_from)
                .collect();
            ResultValue::Ast(Expr::DataCategory(DataCategoryFilter {
                category,
                op,
                values,
                loc: Span::from(r.range.clone()),
            }))
        },
    )
}

// ---------------------------------------------------------------------------------------------
// Expr: OrExpr -> AndExpr -> NotExpr -> PrimaryExpr -> Comparison
// ---------------------------------------------------------------------------------------------

fn comparison(comparable_field: PRef<Expr>, literal_ref: PRef<Expr>) -> PRef<Expr> {
    on_match(
        seq(vec![comparable_field, sp0(), cmp_op(), sp0(), literal_ref]),
        |r| {
            let left = r.child(0).unwrap().as_ast().unwrap().clone();
            let op_res = r.child(2).unwrap();
            let op = PositionedString::new(
                op_res.as_str().unwrap_or("").to_uppercase(),
                Span::from(op_res.range.clone()),
            );
            let right = r.child(4).unwrap().as_ast().unwrap().clone();
            let loc = Span::new(left.loc().start, right.loc().end);
            ResultValue::Ast(Expr::Comparison(ComparisonExpr {
                left: Box::new(left),
                op,
                right: Box::new(right),
                loc,
            }))
        },
    )
}

fn primary_expr(expr_ref: PRef<Expr>, comparison: PRef<Expr>) -> PRef<Expr> {
    let parenthesized = on_match(
        seq(vec![sym("("), sp0(), expr_ref, sp0(), sym(")")]),
        |r| r.child(2).unwrap().value.clone(),
    );
    one_of(vec![parenthesized, comparison])
}

fn not_expr(primary: PRef<Expr>) -> PRef<Expr> {
    let negated = on_match(seq(vec![kw("NOT"), sp(), primary.clone()]), |r| {
        let inner = r.child(2).unwrap().as_ast().unwrap().clone();
        ResultValue::Ast(Expr::Not(NotExpr {
            expr: Box::new(inner),
            loc: Span::from(r.range.clone()),
        }))
    });
    one_of(vec![negated, primary])
}

fn and_expr(not_expr: PRef<Expr>) -> PRef<Expr> {
    let rest_item = seq(vec![sp(), kw("AND"), sp(), not_expr.clone()]);
    let rest = zero_or_many(rest_item, None, None);
    on_match(seq(vec![not_expr, rest]), |r| {
        let first = r.child(0).unwrap().as_ast().unwrap().clone();
        let folded = r.child(1).unwrap().children().iter().fold(first, |acc, item| {
            let op_range = item.child(1).unwrap().range.clone();
            let rhs = item.child(3).unwrap().as_ast().unwrap().clone();
            let loc = Span::new(acc.loc().start, rhs.loc().end);
            Expr::AndOr(OpAndOrExpr {
                left: Box::new(acc),
                op: PositionedString::new("AND", Span::from(op_range)),
                right: Box::new(rhs),
                loc,
            })
        });
        ResultValue::Ast(folded)
    })
}

fn or_expr(and_expr: PRef<Expr>) -> PRef<Expr> {
    let rest_item = seq(vec![sp(), kw("OR"), sp(), and_expr.clone()]);
    let rest = zero_or_many(rest_item, None, None);
    on_match(seq(vec![and_expr, rest]), |r| {
        let first = r.child(0).unwrap().as_ast().unwrap().clone();
        let folded = r.child(1).unwrap().children().iter().fold(first, |acc, item| {
            let op_range = item.child(1).unwrap().range.clone();
            let rhs = item.child(3).unwrap().as_ast().unwrap().clone();
            let loc = Span::new(acc.loc().start, rhs.loc().end);
            Expr::AndOr(OpAndOrExpr {
                left: Box::new(acc),
                op: PositionedString::new("OR", Span::from(op_range)),
                right: Box::new(rhs),
                loc,
            })
        });
        ResultValue::Ast(folded)
    })
}

// ---------------------------------------------------------------------------------------------
// GROUP BY / ORDER BY
// ---------------------------------------------------------------------------------------------

/// Normalizes both the `(ROLLUP|CUBE)? '(' Field (',' Field)* ')'` shape and the bare
/// `Field (',' Field)*` shape to a common 2-child `[kind_opt, fields]` result so the caller
/// doesn't need to know which alternative matched.
fn group_by_clause(field_ref: PRef<Expr>) -> PRef<Expr> {
    let paren_form = on_match(
        seq(vec![
            zero_or_one(one_of_tokens("ROLLUP CUBE")),
            sp0(),
            sym("("),
            sp0(),
            one_or_many(field_ref.clone(), Some(comma()), None),
            sp0(),
            sym(")"),
        ]),
        |r| {
            let kind = r.child(0).unwrap().clone();
            let fields = r.child(4).unwrap().clone();
            ResultValue::Nodes(vec![kind, fields])
        },
    );
    let plain_form = on_match(one_or_many(field_ref, Some(comma()), None), |r| {
        ResultValue::Nodes(vec![ParseResult::null(r.range.start), r.clone()])
    });
    one_of(vec![paren_form, plain_form])
}

fn build_group_by(raw: &ParseResult<Expr>) -> GroupBy {
    let kind = match raw.child(0).unwrap().as_str() {
        Some(s) if s.eq_ignore_ascii_case("ROLLUP") => GroupByKind::Rollup,
        Some(s) if s.eq_ignore_ascii_case("CUBE") => GroupByKind::Cube,
        _ => GroupByKind::GroupBy,
    };
    let fields: Vec<Expr> = raw
        .child(1)
        .unwrap()
        .children()
        .iter()
        .filter_map(|c| c.as_ast().cloned())
        .collect();
    GroupBy {
        kind,
        fields,
        loc: Span::from(raw.range.clone()),
    }
}

fn order_by_item(comparable_field: PRef<Expr>) -> PRef<Expr> {
    let asc_desc = zero_or_one(seq(vec![sp(), one_of_tokens("ASC DESC")]));
    let nulls = zero_or_one(seq(vec![
        sp(),
        kw("NULLS"),
        sp(),
        one_of_tokens("FIRST LAST"),
    ]));
    seq(vec![comparable_field, asc_desc, nulls])
}

fn build_order_by(raw: &ParseResult<Expr>) -> OrderBy {
    let field = raw.child(0).unwrap().as_ast().unwrap().clone();
    let asc_res = raw.child(1).unwrap();
    let asc = if asc_res.is_null() {
        true
    } else {
        let dir = asc_res.child(1).unwrap().as_str().unwrap_or("ASC");
        !dir.eq_ignore_ascii_case("DESC")
    };
    let nulls_res = raw.child(2).unwrap();
    let nulls = if nulls_res.is_null() {
        NullsOrder::Default
    } else {
        let word = nulls_res.child(3).unwrap().as_str().unwrap_or("");
        if word.eq_ignore_ascii_case("FIRST") {
            NullsOrder::First
        } else {
            NullsOrder::Last
        }
    };
    OrderBy {
        field,
        asc,
        nulls,
        loc: Span::from(raw.range.clone()),
    }
}

// ---------------------------------------------------------------------------------------------
// Query assembly
// ---------------------------------------------------------------------------------------------

fn build_select_query(r: &ParseResult<Expr>) -> SelectQuery {
    let select_exprs: Vec<Expr> = r
        .child(2)
        .unwrap()
        .children()
        .iter()
        .filter_map(|c| c.as_ast().cloned())
        .collect();
    let from = build_from(r.child(6).unwrap());

    let filter_scope = {
        let u = r.child(7).unwrap();
        if u.is_null() {
            None
        } else {
            Some(positioned_string_from(u.child(5).unwrap()))
        }
    };

    let where_expr = {
        let w = r.child(8).unwrap();
        if w.is_null() {
            None
        } else {
            w.child(3).unwrap().as_ast().cloned()
        }
    };

    let with_data_category = {
        let wd = r.child(9).unwrap();
        if wd.is_null() {
            None
        } else {
            Some(
                wd.child(7)
                    .unwrap()
                    .children()
                    .iter()
                    .filter_map(|c| c.as_ast())
                    .filter_map(|e| e.clone().into_data_category().ok())
                    .collect(),
            )
        }
    };

    let (group_by, having) = {
        let g = r.child(10).unwrap();
        if g.is_null() {
            (None, None)
        } else {
            let group_by = Some(build_group_by(g.child(5).unwrap()));
            let having_raw = g.child(6).unwrap();
            let having = if having_raw.is_null() {
                None
            } else {
                having_raw.child(3).unwrap().as_ast().cloned()
            };
            (group_by, having)
        }
    };

    let order_by = {
        let o = r.child(11).unwrap();
        if o.is_null() {
            None
        } else {
            let items_raw = o.child(5).unwrap();
            let items: Vec<OrderBy> = items_raw.children().iter().map(build_order_by).collect();
            Some(OrderBys {
                loc: Span::from(items_raw.range.clone()),
                items,
            })
        }
    };

    let limit = {
        let l = r.child(12).unwrap();
        if l.is_null() {
            None
        } else {
            let n = l.child(4).unwrap();
            Some(PositionedNumber::new(
                n.as_num().unwrap_or(0.0),
                Span::from(n.range.clone()),
            ))
        }
    };

    let offset = {
        let o = r.child(13).unwrap();
        if o.is_null() {
            None
        } else {
            let n = o.child(4).unwrap();
            Some(PositionedNumber::new(
                n.as_num().unwrap_or(0.0),
                Span::from(n.range.clone()),
            ))
        }
    };

    let for_view_or_reference = {
        let f = r.child(14).unwrap();
        if f.is_null() {
            None
        } else {
            match f.child(3).unwrap().as_str() {
                Some(s) if s.eq_ignore_ascii_case("VIEW") => Some(ForClause::View),
                Some(s) if s.eq_ignore_ascii_case("REFERENCE") => Some(ForClause::Reference),
                _ => None,
            }
        }
    };

    let update_tracking = {
        let u = r.child(15).unwrap();
        if u.is_null() {
            None
        } else {
            match u.child(3).unwrap().as_str() {
                Some(s) if s.eq_ignore_ascii_case("TRACKING") => Some(UpdateClause::Tracking),
                Some(s) if s.eq_ignore_ascii_case("VIEWSTAT") => Some(UpdateClause::Viewstat),
                _ => None,
            }
        }
    };

    SelectQuery {
        select_exprs,
        from,
        filter_scope,
        where_expr,
        with_data_category,
        group_by,
        having,
        order_by,
        limit,
        offset,
        for_view_or_reference,
        update_tracking,
        loc: Span::from(r.range.clone()),
    }
}

fn build_grammar() -> PRef<Expr> {
    let literal_ref: Arc<ParserRef<Expr>> = ParserRef::new();
    let query_ref: Arc<ParserRef<Expr>> = ParserRef::new();
    let field_ref: Arc<ParserRef<Expr>> = ParserRef::new();
    let expr_ref: Arc<ParserRef<Expr>> = ParserRef::new();

    // Scalar literals only — `literal_array` is deliberately built from this, not from
    // `literal_ref` itself, so a literal array can never contain another literal array.
    let scalar_literal = one_of(vec![
        bool_literal(),
        null_literal(),
        datetime_literal(),
        date_literal(),
        number_literal(),
        string_literal(),
        token_literal(),
    ]);
    let literal_ref_pref: PRef<Expr> = literal_ref.clone();
    let literal_body = one_of(vec![scalar_literal.clone(), literal_array(scalar_literal)]);
    literal_ref.set(literal_body);

    let comparable_field = one_of(vec![select_func_body(), select_field_body()]);
    let comparison_body = comparison(comparable_field.clone(), literal_ref_pref);

    let expr_ref_pref: PRef<Expr> = expr_ref.clone();
    let primary = primary_expr(expr_ref_pref, comparison_body);
    let not_expr_body = not_expr(primary);
    let and_expr_body = and_expr(not_expr_body);
    let or_expr_body = or_expr(and_expr_body);
    expr_ref.set(or_expr_body.clone());

    let query_ref_pref: PRef<Expr> = query_ref.clone();
    let field_body = one_of(vec![
        typeof_body(),
        nested_query_body(query_ref_pref),
        select_func_body(),
        select_field_body(),
    ]);
    field_ref.set(field_body);

    let field_ref_pref: PRef<Expr> = field_ref.clone();
    let fields_list = one_or_many(field_ref_pref.clone(), Some(comma()), None);

    let using_scope_opt = zero_or_one(seq(vec![
        sp(),
        kw("USING"),
        sp(),
        kw("SCOPE"),
        sp(),
        ident(),
    ]));
    let where_opt = zero_or_one(seq(vec![sp(), kw("WHERE"), sp(), or_expr_body.clone()]));
    let with_data_category_opt = zero_or_one(seq(vec![
        sp(),
        kw("WITH"),
        sp(),
        kw("DATA"),
        sp(),
        kw("CATEGORY"),
        sp(),
        one_or_many(
            data_category_filter(),
            Some(seq(vec![sp(), kw("AND"), sp()])),
            None,
        ),
    ]));
    let having_opt = zero_or_one(seq(vec![sp(), kw("HAVING"), sp(), or_expr_body.clone()]));
    let group_by_opt = zero_or_one(seq(vec![
        sp(),
        kw("GROUP"),
        sp(),
        kw("BY"),
        sp(),
        group_by_clause(field_ref_pref),
        having_opt,
    ]));
    let order_by_opt = zero_or_one(seq(vec![
        sp(),
        kw("ORDER"),
        sp(),
        kw("BY"),
        sp(),
        one_or_many(order_by_item(comparable_field), Some(comma()), None),
    ]));
    let limit_opt = zero_or_one(seq(vec![
        sp(),
        kw("LIMIT"),
        cut(),
        sp(),
        integer_number(),
    ]));
    let offset_opt = zero_or_one(seq(vec![
        sp(),
        kw("OFFSET"),
        cut(),
        sp(),
        integer_number(),
    ]));
    let for_opt = zero_or_one(seq(vec![
        sp(),
        kw("FOR"),
        sp(),
        one_of_tokens("VIEW REFERENCE"),
    ]));
    let update_opt = zero_or_one(seq(vec![
        sp(),
        kw("UPDATE"),
        sp(),
        one_of_tokens("TRACKING VIEWSTAT"),
    ]));

    let query_body = seq(vec![
        kw("SELECT"),
        sp(),
        fields_list,
        sp(),
        kw("FROM"),
        sp(),
        from_clause(),
        using_scope_opt,
        where_opt,
        with_data_category_opt,
        group_by_opt,
        order_by_opt,
        limit_opt,
        offset_opt,
        for_opt,
        update_opt,
    ]);

    let query_wrapped = on_match(query_body, |r| {
        ResultValue::Ast(Expr::Nested(NestedSelectQuery {
            query: Box::new(build_select_query(r)),
            loc: Span::from(r.range.clone()),
        }))
    });
    query_ref.set(query_wrapped);
    query_ref
}

pub(crate) static GRAMMAR: Lazy<PRef<Expr>> = Lazy::new(build_grammar);
