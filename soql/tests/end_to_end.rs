use soql::{AppendSoql, Expr, GroupByKind, NullsOrder, parse_soql};

#[test]
fn scenario_simple_select() {
    let q = parse_soql("SELECT Id FROM Account").unwrap();
    assert_eq!(q.select_exprs.len(), 1);
    match &q.select_exprs[0] {
        Expr::SelectField(f) => assert_eq!(f.name[0].val, "Id"),
        other => panic!("expected SelectField, got {other:?}"),
    }
    assert_eq!(q.from.sobject.name.val, "Account");
    assert!(q.from.sobject.alias.is_none());
    assert!(q.where_expr.is_none());
}

#[test]
fn scenario_where_order_by_limit() {
    let q = parse_soql(
        "select id, name from account where name='bob' order by name desc nulls last limit 10",
    )
    .unwrap();
    let names: Vec<String> = q
        .select_exprs
        .iter()
        .map(|e| match e {
            Expr::SelectField(f) => f.name[0].val.clone(),
            _ => panic!("expected SelectField"),
        })
        .collect();
    assert_eq!(names, vec!["id", "name"]);

    match q.where_expr.as_ref().unwrap() {
        Expr::Comparison(c) => {
            assert_eq!(c.op.val, "=");
            match c.right.as_ref() {
                Expr::Literal(l) => assert_eq!(l.val, soql::LiteralVal::Str("bob".to_string())),
                other => panic!("expected literal, got {other:?}"),
            }
        }
        other => panic!("expected Comparison, got {other:?}"),
    }

    let order_by = q.order_by.as_ref().unwrap();
    assert_eq!(order_by.items.len(), 1);
    assert!(!order_by.items[0].asc);
    assert_eq!(order_by.items[0].nulls, NullsOrder::Last);
    assert_eq!(q.limit.as_ref().unwrap().val, 10.0);

    assert_eq!(
        q.render(),
        "SELECT id, name FROM account WHERE name = 'bob' ORDER BY name DESC NULLS LAST LIMIT 10"
    );
}

#[test]
fn scenario_nested_subquery() {
    let q = parse_soql("SELECT Id, (SELECT Id FROM Contacts) FROM Account").unwrap();
    assert_eq!(q.select_exprs.len(), 2);
    assert!(matches!(q.select_exprs[0], Expr::SelectField(_)));
    match &q.select_exprs[1] {
        Expr::Nested(n) => assert_eq!(n.query.from.sobject.name.val, "Contacts"),
        other => panic!("expected Nested, got {other:?}"),
    }
}

#[test]
fn scenario_typeof_when_else() {
    let q = parse_soql(
        "SELECT TYPEOF What WHEN Account THEN Id, Name WHEN Opportunity THEN Amount ELSE Id END FROM Event",
    )
    .unwrap();
    assert_eq!(q.select_exprs.len(), 1);
    match &q.select_exprs[0] {
        Expr::TypeOf(t) => {
            assert_eq!(t.relationship.val, "What");
            assert_eq!(t.whens.len(), 2);
            assert_eq!(t.whens[0].object_type.val, "Account");
            assert_eq!(t.whens[0].select.len(), 2);
            assert_eq!(t.whens[1].object_type.val, "Opportunity");
            assert!(t.elses.is_some());
        }
        other => panic!("expected TypeOf, got {other:?}"),
    }
}

#[test]
fn scenario_group_by_rollup_having() {
    let q = parse_soql(
        "SELECT COUNT(Id) c FROM Account GROUP BY ROLLUP(Type) HAVING COUNT(Id) > 5",
    )
    .unwrap();
    match &q.select_exprs[0] {
        Expr::SelectFunc(f) => {
            assert_eq!(f.name.val, "COUNT");
            assert_eq!(f.alias.as_ref().unwrap().val, "c");
        }
        other => panic!("expected SelectFunc, got {other:?}"),
    }
    let group_by = q.group_by.as_ref().unwrap();
    assert_eq!(group_by.kind, GroupByKind::Rollup);
    assert_eq!(group_by.fields.len(), 1);
    assert!(q.having.is_some());
}

#[test]
fn scenario_missing_from_object_reports_error() {
    let err = parse_soql("SELECT Id FROM").unwrap_err();
    assert_eq!(err.expected_kind, soql::Kind::Class);
    assert!(err.expected.contains("identifier"));
}

#[test]
fn round_trip_across_scenarios() {
    let queries = [
        "SELECT Id FROM Account",
        "SELECT id, name FROM account WHERE name = 'bob' ORDER BY name DESC NULLS LAST LIMIT 10",
        "SELECT Id, (SELECT Id FROM Contacts) FROM Account",
        "SELECT TYPEOF What WHEN Account THEN Id, Name WHEN Opportunity THEN Amount ELSE Id END FROM Event",
        "SELECT COUNT(Id) c FROM Account GROUP BY ROLLUP(Type) HAVING COUNT(Id) > 5",
        "SELECT Id FROM Account WHERE (Name = 'a' OR Name = 'b') AND NOT Active__c = TRUE",
    ];
    for q in queries {
        let parsed = parse_soql(q).unwrap();
        let rendered = parsed.render();
        let reparsed = parse_soql(&rendered).unwrap();
        assert_eq!(parsed, reparsed, "round-trip mismatch for {q:?}: rendered {rendered:?}");

        let rendered_again = reparsed.render();
        assert_eq!(rendered, rendered_again, "idempotent-render mismatch for {q:?}");
    }
}

#[test]
fn data_category_filter_renders_and_reparses() {
    let q = "SELECT Id FROM Account WITH DATA CATEGORY Geography__c AT US";
    let parsed = parse_soql(q).unwrap();
    let cats = parsed.with_data_category.as_ref().unwrap();
    assert_eq!(cats.len(), 1);
    assert_eq!(cats[0].category.val, "Geography__c");
    assert_eq!(cats[0].op.val, "AT");

    let rendered = parsed.render();
    let reparsed = parse_soql(&rendered).unwrap();
    assert_eq!(parsed, reparsed);
}

#[test]
fn snapshot_typeof_query_ast() {
    let q = parse_soql(
        "SELECT TYPEOF What WHEN Account THEN Id, Name WHEN Opportunity THEN Amount ELSE Id END FROM Event",
    )
    .unwrap();
    insta::assert_json_snapshot!(q);
}

#[test]
fn not_in_operator_parses_as_single_token() {
    let q = parse_soql("SELECT Id FROM Account WHERE Id NOT IN ('a','b')").unwrap();
    match q.where_expr.unwrap() {
        Expr::Comparison(c) => assert_eq!(c.op.val, "NOT IN"),
        other => panic!("expected Comparison, got {other:?}"),
    }
}
