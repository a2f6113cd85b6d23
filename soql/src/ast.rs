//! The SOQL abstract syntax tree. Every node carries a `loc: Span` pinpointing the source text
//! it was parsed from; `Span`'s `PartialEq` ignores its fields (see [`crate::span::Span`]), so
//! deriving `PartialEq` on every node here gives "structural equality ignoring location" for
//! free, which is what the round-trip tests compare against.

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedString {
    pub val: String,
    pub loc: Span,
}

impl PositionedString {
    pub fn new(val: impl Into<String>, loc: Span) -> Self {
        PositionedString {
            val: val.into(),
            loc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNumber {
    pub val: f64,
    pub loc: Span,
}

impl PositionedNumber {
    pub fn new(val: f64, loc: Span) -> Self {
        PositionedNumber { val, loc }
    }
}

/// A dotted field path, e.g. `Owner.Name`, with an optional column alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectField {
    pub name: Vec<PositionedString>,
    pub alias: Option<PositionedString>,
    pub loc: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectFunc {
    pub name: PositionedString,
    pub args: Vec<SelectField>,
    pub alias: Option<PositionedString>,
    pub loc: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeOfWhen {
    pub object_type: PositionedString,
    pub select: Vec<SelectField>,
    pub loc: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeOf {
    pub relationship: PositionedString,
    pub whens: Vec<TypeOfWhen>,
    pub elses: Option<Vec<SelectField>>,
    pub loc: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SObjectRef {
    pub name: PositionedString,
    pub alias: Option<PositionedString>,
    pub loc: Span,
}

/// The `FROM` clause: the primary object plus any comma-separated related-object paths (used
/// by sharing-rule and polymorphic-relationship queries, e.g. `FROM Account, Account.Owner`).
///
/// Named `FromClause` rather than `From` to avoid shadowing `std::convert::From` in modules
/// that glob-import this module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromClause {
    pub sobject: SObjectRef,
    pub related_objects: Vec<SelectField>,
    pub loc: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum LiteralKind {
    String,
    Null,
    Bool,
    Number,
    DateTime,
    Date,
    Token,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralVal {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralValue {
    pub val: LiteralVal,
    pub kind: LiteralKind,
    pub loc: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralValueArray {
    pub values: Vec<LiteralValue>,
    pub loc: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonExpr {
    pub left: Box<Expr>,
    pub op: PositionedString,
    pub right: Box<Expr>,
    pub loc: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpAndOrExpr {
    pub left: Box<Expr>,
    pub op: PositionedString,
    pub right: Box<Expr>,
    pub loc: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotExpr {
    pub expr: Box<Expr>,
    pub loc: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCategoryFilter {
    pub category: PositionedString,
    pub op: PositionedString,
    pub values: Vec<PositionedString>,
    pub loc: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum GroupByKind {
    GroupBy,
    Rollup,
    Cube,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBy {
    pub kind: GroupByKind,
    pub fields: Vec<Expr>,
    pub loc: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum NullsOrder {
    Default,
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: Expr,
    pub asc: bool,
    pub nulls: NullsOrder,
    pub loc: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBys {
    pub items: Vec<OrderBy>,
    pub loc: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedSelectQuery {
    pub query: Box<SelectQuery>,
    pub loc: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ForClause {
    View,
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum UpdateClause {
    Tracking,
    Viewstat,
}

/// The sum of everything that can appear as a select expression, a `WHERE`/`HAVING` operand,
/// an `ORDER BY`/`GROUP BY` field, or a nested query. `EnumAsInner` gives ergonomic
/// `.as_comparison()`/`.into_select_field()`-style downcasts instead of hand-written matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner)]
pub enum Expr {
    SelectField(SelectField),
    SelectFunc(SelectFunc),
    TypeOf(TypeOf),
    Literal(LiteralValue),
    LiteralArray(LiteralValueArray),
    Comparison(ComparisonExpr),
    AndOr(OpAndOrExpr),
    Not(NotExpr),
    DataCategory(DataCategoryFilter),
    Nested(NestedSelectQuery),
}

impl Expr {
    pub fn loc(&self) -> Span {
        match self {
            Expr::SelectField(n) => n.loc,
            Expr::SelectFunc(n) => n.loc,
            Expr::TypeOf(n) => n.loc,
            Expr::Literal(n) => n.loc,
            Expr::LiteralArray(n) => n.loc,
            Expr::Comparison(n) => n.loc,
            Expr::AndOr(n) => n.loc,
            Expr::Not(n) => n.loc,
            Expr::DataCategory(n) => n.loc,
            Expr::Nested(n) => n.loc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub select_exprs: Vec<Expr>,
    pub from: FromClause,
    pub filter_scope: Option<PositionedString>,
    pub where_expr: Option<Expr>,
    pub with_data_category: Option<Vec<DataCategoryFilter>>,
    pub group_by: Option<GroupBy>,
    pub having: Option<Expr>,
    pub order_by: Option<OrderBys>,
    pub limit: Option<PositionedNumber>,
    pub offset: Option<PositionedNumber>,
    pub for_view_or_reference: Option<ForClause>,
    pub update_tracking: Option<UpdateClause>,
    pub loc: Span,
}
