use std::collections::BTreeSet;

use crate::error::LiteralError;
use crate::*;

const RUNTIMES: &[&str] = &["DOCKER", "SINGULARITY"];

fn schema() -> SchemaTable {
    let keys = KeyColumns {
        tenant: ColumnRef::new("apps", "tenant"),
        id: ColumnRef::new("apps", "id"),
        owner: ColumnRef::new("apps", "owner"),
        deleted: ColumnRef::new("apps", "deleted"),
        latest_version: ColumnRef::new("apps", "latest_version"),
        version: ColumnRef::new("apps_versions", "version"),
        tiebreakers: vec![
            ColumnRef::new("apps", "seq_id"),
            ColumnRef::new("apps_versions", "seq_id"),
        ],
    };
    SchemaTable::new("apps", "apps_versions", keys)
        .identity("id", ColumnKind::String)
        .identity("owner", ColumnKind::String)
        .identity("enabled", ColumnKind::Boolean)
        .version("version", ColumnKind::String)
        .optional_version("description", ColumnKind::String)
        .version("runtime", ColumnKind::Enum(RUNTIMES))
        .version("max_jobs", ColumnKind::Integer)
        .version("tags", ColumnKind::StringArray)
        .version("uuid", ColumnKind::Uuid)
        .version("created", ColumnKind::Timestamp)
}

fn ctx() -> SearchCtx {
    SearchCtx::new("t1", "alice")
}

fn compile(spec: &QuerySpec) -> SearchResult<CompiledSearch> {
    compile_search(spec, &ctx(), &schema(), LimitCfg::default())
}

fn plan(spec: &QuerySpec) -> SearchPlan {
    match compile(spec).expect("spec should compile") {
        CompiledSearch::Plan(plan) => plan,
        CompiledSearch::Empty { .. } => panic!("unexpected empty scope"),
    }
}

fn list_predicate(conditions: &[&str]) -> SearchResult<Predicate> {
    let schema = schema();
    conditions
        .iter()
        .map(|c| parse_condition(&schema, c).map(Condition::into_predicate))
        .collect::<SearchResult<Vec<_>>>()
        .map(Predicate::all)
}

/* ---------- condition parsing ---------- */

#[test]
fn value_may_contain_dots() {
    let c = parse_condition(&schema(), "description.eq.v1.2.3").unwrap();
    assert_eq!(c.attribute(), "description");
    assert_eq!(
        c.operand(),
        &Operand::Compare(CompareOperator::Eq, Literal::String("v1.2.3".into()))
    );
}

#[test]
fn escaped_dot_in_attribute_position_is_not_a_delimiter() {
    let err = parse_condition(&schema(), r"desc\.ription.eq.x").unwrap_err();
    assert_eq!(err, SearchError::UnknownAttribute(r"desc\.ription".into()));
}

#[test]
fn camel_case_attribute_resolves() {
    let c = parse_condition(&schema(), "maxJobs.gte.4").unwrap();
    assert_eq!(c.attribute(), "max_jobs");
}

#[test]
fn malformed_conditions() {
    for raw in ["id.eq", "id", "", ".eq.x", "id..x"] {
        assert!(
            matches!(
                parse_condition(&schema(), raw),
                Err(SearchError::MalformedCondition(_))
            ),
            "{raw} should be malformed"
        );
    }
}

#[test]
fn unknown_attribute_and_operator() {
    assert_eq!(
        parse_condition(&schema(), "colour.eq.red").unwrap_err(),
        SearchError::UnknownAttribute("colour".into())
    );
    assert_eq!(
        parse_condition(&schema(), "id.regex.x").unwrap_err(),
        SearchError::UnsupportedOperator("regex".into())
    );
    // CONTAINS is internal only
    assert!(matches!(
        parse_condition(&schema(), "tags.contains.gpu"),
        Err(SearchError::UnsupportedOperator(_))
    ));
}

#[test]
fn operator_is_case_insensitive() {
    let c = parse_condition(&schema(), "id.LiKe.my*").unwrap();
    assert_eq!(c.op(), SearchOp::Like);
    assert_eq!(c.operand(), &Operand::Pattern("my%".into()));
}

#[test]
fn like_on_boolean_is_rejected() {
    let err = parse_condition(&schema(), "enabled.like.true").unwrap_err();
    assert!(matches!(
        err,
        SearchError::OperatorNotAllowedForType {
            op: SearchOp::Like,
            kind: ColumnKind::Boolean,
            ..
        }
    ));
}

#[test]
fn between_needs_two_values() {
    let err = parse_condition(&schema(), "max_jobs.between.5").unwrap_err();
    assert_eq!(
        err,
        SearchError::InvalidLiteral {
            attribute: "max_jobs".into(),
            value: "5".into(),
            reason: LiteralError::Arity {
                expected: 2,
                got: 1
            },
        }
    );
    assert!(parse_condition(&schema(), "max_jobs.nbetween.1,5").is_ok());
}

#[test]
fn every_list_element_is_type_checked() {
    let err = parse_condition(&schema(), "max_jobs.in.1,two,3").unwrap_err();
    assert!(matches!(
        err,
        SearchError::InvalidLiteral {
            reason: LiteralError::Integer,
            ..
        }
    ));
}

#[test]
fn escaped_commas_stay_in_one_element() {
    let c = parse_condition(&schema(), r"id.in.a\,b,c").unwrap();
    assert_eq!(
        c.operand(),
        &Operand::List(vec![Literal::String("a,b".into()), Literal::String("c".into())])
    );
}

#[test]
fn bad_timestamp_is_flagged() {
    let err = parse_condition(&schema(), "created.gt.last-tuesday").unwrap_err();
    assert!(err.is_invalid_timestamp());
    assert_eq!(err.code(), "INVALID_TIMESTAMP_LITERAL");
    assert!(parse_condition(&schema(), "created.between.2023,2024-06-01T00:00Z").is_ok());
}

#[test]
fn enum_values_normalize() {
    let c = parse_condition(&schema(), "runtime.in.docker,Singularity").unwrap();
    assert_eq!(
        c.operand(),
        &Operand::List(vec![
            Literal::String("DOCKER".into()),
            Literal::String("SINGULARITY".into())
        ])
    );
    assert!(parse_condition(&schema(), "runtime.eq.podman").is_err());
    assert!(parse_condition(&schema(), "runtime.like.D*").is_err());
}

#[test]
fn array_membership_becomes_containment() {
    let c = parse_condition(&schema(), "tags.in.gpu,mpi").unwrap();
    assert_eq!(c.op(), SearchOp::Contains);
    assert_eq!(
        c.into_predicate(),
        Predicate::ContainsAll {
            column: ColumnRef::new("apps_versions", "tags"),
            elements: vec!["gpu".into(), "mpi".into()],
            negated: false,
        }
    );
    assert!(parse_condition(&schema(), "tags.eq.gpu").is_err());
}

/* ---------- trees ---------- */

#[test]
fn tree_and_equals_flat_list() {
    let tree = ConditionTree::and(
        ConditionTree::compare("id", "eq", "myapp"),
        ConditionTree::group(ConditionTree::compare("max_jobs", "GT", "3")),
    );
    let from_tree = compile_tree(&schema(), &tree).unwrap();
    let from_list = list_predicate(&["id.eq.myapp", "max_jobs.gt.3"]).unwrap();
    assert_eq!(from_tree, from_list);
}

#[test]
fn tree_or_and_wrapped_leaves() {
    let tree = ConditionTree::or(
        ConditionTree::binary(
            "eq",
            ConditionTree::group(ConditionTree::leaf("owner")),
            ConditionTree::leaf("bob"),
        ),
        ConditionTree::compare("tags", "in", "gpu"),
    );
    let p = compile_tree(&schema(), &tree).unwrap();
    assert!(matches!(p, Predicate::Or(ref parts) if parts.len() == 2));
}

#[test]
fn tree_structural_errors() {
    let schema = schema();
    assert!(matches!(
        compile_tree(&schema, &ConditionTree::leaf("id")),
        Err(SearchError::MalformedTree(_))
    ));
    let negated = ConditionTree::Unary {
        op: Some("NOT".into()),
        child: Box::new(ConditionTree::compare("id", "eq", "x")),
    };
    assert!(matches!(
        compile_tree(&schema, &negated),
        Err(SearchError::MalformedTree(_))
    ));
    let nested = ConditionTree::binary(
        "eq",
        ConditionTree::compare("id", "eq", "x"),
        ConditionTree::leaf("y"),
    );
    assert!(matches!(
        compile_tree(&schema, &nested),
        Err(SearchError::MalformedTree(_))
    ));
    let and_with_leaf = ConditionTree::and(
        ConditionTree::compare("id", "eq", "x"),
        ConditionTree::leaf("dangling"),
    );
    assert!(matches!(
        compile_tree(&schema, &and_with_leaf),
        Err(SearchError::MalformedTree(_))
    ));
}

#[test]
fn tree_unknown_operator_and_leaf_errors_propagate() {
    let schema = schema();
    assert_eq!(
        compile_tree(&schema, &ConditionTree::compare("id", "xor", "x")).unwrap_err(),
        SearchError::UnsupportedOperator("xor".into())
    );
    let tree = ConditionTree::and(
        ConditionTree::compare("id", "eq", "x"),
        ConditionTree::compare("enabled", "like", "true"),
    );
    assert_eq!(
        compile_tree(&schema, &tree).unwrap_err(),
        list_predicate(&["enabled.like.true"]).unwrap_err()
    );
}

#[test]
fn tree_deserializes_from_json() {
    let json = serde_json::json!({
        "binary": {
            "op": "AND",
            "left": {"binary": {"op": "eq", "left": {"leaf": "id"}, "right": {"leaf": "myapp"}}},
            "right": {"unary": {"child": {"binary": {"op": "lte", "left": {"leaf": "maxJobs"}, "right": {"leaf": "8"}}}}}
        }
    });
    let tree: ConditionTree = serde_json::from_value(json).unwrap();
    assert!(compile_tree(&schema(), &tree).is_ok());
}

/* ---------- version scope ---------- */

#[test]
fn id_condition_returns_latest_only() {
    let p = plan(&QuerySpec::new().with_conditions(["id.eq.myapp"]));
    assert_eq!(p.version_scope(), VersionScope::LatestOnly);
    assert_eq!(
        p.filter().to_string(),
        "(apps.tenant = 't1' AND apps.deleted = false AND apps.owner = 'alice' \
         AND apps.latest_version = apps_versions.version AND apps.id = 'myapp')"
    );
}

#[test]
fn version_condition_returns_all_versions() {
    let p = plan(&QuerySpec::new().with_conditions(["id.eq.myapp", "version.like.*"]));
    assert_eq!(p.version_scope(), VersionScope::AllVersions);
    assert!(!p.filter().to_string().contains("latest_version"));

    let tree = ConditionTree::and(
        ConditionTree::compare("id", "eq", "myapp"),
        ConditionTree::compare("Version", "eq", "1.0"),
    );
    assert_eq!(
        plan(&QuerySpec::new().with_tree(tree)).version_scope(),
        VersionScope::AllVersions
    );
}

#[test]
fn version_text_inside_a_value_is_ignored() {
    let p = plan(&QuerySpec::new().with_conditions(["description.like.*version*"]));
    assert_eq!(p.version_scope(), VersionScope::LatestOnly);
}

#[test]
fn explicit_version_flag_wins() {
    let spec = QuerySpec::new()
        .with_conditions(["version.eq.1.0"])
        .with_version_specified(false);
    assert_eq!(plan(&spec).version_scope(), VersionScope::LatestOnly);
    let spec = QuerySpec::new().with_version_specified(true);
    assert_eq!(plan(&spec).version_scope(), VersionScope::AllVersions);
}

/* ---------- authorization ---------- */

#[test]
fn shared_public_without_ids_is_empty() {
    let spec = QuerySpec::new().with_list_type(ListType::SharedPublic).with_limit(10);
    assert_eq!(
        compile(&spec).unwrap(),
        CompiledSearch::Empty {
            window: Window {
                skip: 0,
                limit: Some(10)
            }
        }
    );
}

#[test]
fn invalid_spec_fails_even_when_scope_is_empty() {
    let spec = QuerySpec::new()
        .with_list_type(ListType::ReadPerm)
        .with_conditions(["enabled.like.true"]);
    assert!(matches!(
        compile(&spec),
        Err(SearchError::OperatorNotAllowedForType { .. })
    ));
}

#[test]
fn include_deleted_drops_the_deleted_term() {
    let p = plan(
        &QuerySpec::new()
            .with_list_type(ListType::ReadPerm)
            .with_viewable_ids(["b", "a"])
            .include_deleted(true),
    );
    assert_eq!(
        p.filter().to_string(),
        "(apps.tenant = 't1' AND apps.id IN ('a', 'b') \
         AND apps.latest_version = apps_versions.version)"
    );
}

#[test]
fn scope_ids_are_bound_in_sorted_order() {
    let spec = QuerySpec {
        list_type: ListType::Mine,
        shared_ids: BTreeSet::from(["z".to_string(), "m".to_string()]),
        ..QuerySpec::default()
    };
    assert!(plan(&spec)
        .filter()
        .to_string()
        .contains("(apps.owner = 'alice' OR apps.id IN ('m', 'z'))"));
}

/* ---------- ordering & window ---------- */

#[test]
fn tiebreakers_always_close_the_ordering() {
    let p = plan(&QuerySpec::new().with_order(OrderBy::parse("created(desc)").unwrap()));
    let cols: Vec<String> = p
        .order()
        .iter()
        .map(|k| format!("{} {}", k.column, k.dir.as_str()))
        .collect();
    assert_eq!(
        cols,
        vec![
            "apps_versions.created desc",
            "apps.seq_id asc",
            "apps_versions.seq_id asc"
        ]
    );
    assert_eq!(p.major().map(|d| d.name), Some("created"));
}

#[test]
fn unknown_sort_attribute() {
    let spec = QuerySpec::new().with_order(OrderBy::parse("colour").unwrap());
    assert_eq!(
        compile(&spec).unwrap_err(),
        SearchError::UnknownSortAttribute("colour".into())
    );
}

#[test]
fn start_after_requires_order_by() {
    let spec = QuerySpec::new().with_start_after("myapp");
    assert_eq!(
        compile(&spec).unwrap_err(),
        SearchError::StartAfterRequiresOrderBy
    );
}

#[test]
fn start_after_bounds_the_major_key() {
    let asc = plan(
        &QuerySpec::new()
            .with_order(OrderBy::parse("id").unwrap())
            .with_start_after("my.app,1"),
    );
    assert!(asc.filter().to_string().ends_with("apps.id > 'my.app,1')"));

    let desc = plan(
        &QuerySpec::new()
            .with_order(OrderBy::parse("max_jobs(desc)").unwrap())
            .with_start_after("8"),
    );
    assert!(desc.filter().to_string().ends_with("apps_versions.max_jobs < 8)"));

    let bad = QuerySpec::new()
        .with_order(OrderBy::parse("max_jobs").unwrap())
        .with_start_after("eight");
    assert!(matches!(
        compile(&bad),
        Err(SearchError::InvalidLiteral { .. })
    ));
}

#[test]
fn keyset_continuation_needs_ordered_non_null_major() {
    let keyset = |order: &str| {
        plan(&QuerySpec::new().with_order(OrderBy::parse(order).unwrap()))
            .keyset_major()
            .map(|d| d.name)
    };
    assert_eq!(keyset("id"), Some("id"));
    assert_eq!(keyset("max_jobs(desc),id"), Some("max_jobs"));
    assert_eq!(keyset("created(desc)"), Some("created"));
    // Types without gt/lt cannot take the value back.
    assert_eq!(keyset("runtime"), None);
    assert_eq!(keyset("enabled"), None);
    assert_eq!(keyset("uuid"), None);
    // A strict bound would drop rows with no description.
    assert_eq!(keyset("description"), None);
    assert_eq!(plan(&QuerySpec::new()).keyset_major(), None);
}

#[test]
fn lookahead_adds_one_row_to_bounded_windows() {
    let bounded = plan(&QuerySpec::new().with_limit(3).with_skip(2));
    let peek = bounded.with_lookahead();
    assert_eq!(peek.window(), Window { skip: 2, limit: Some(4) });
    assert_eq!(peek.filter(), bounded.filter());
    assert_eq!(peek.order(), bounded.order());

    let unbounded = plan(&QuerySpec::new().with_limit(-1));
    assert_eq!(unbounded.with_lookahead(), unbounded);
}

#[test]
fn negated_operators_on_nullable_columns_include_absent_values() {
    for (condition, expected) in [
        ("description.neq.x", "(apps_versions.description <> 'x' OR apps_versions.description IS NULL)"),
        (
            "description.nlike.a*",
            "(apps_versions.description NOT LIKE 'a%' OR apps_versions.description IS NULL)",
        ),
        (
            "description.nin.a,b",
            "(apps_versions.description NOT IN ('a', 'b') OR apps_versions.description IS NULL)",
        ),
    ] {
        assert_eq!(list_predicate(&[condition]).unwrap().to_string(), expected);
    }

    // Positive operators never match an absent value.
    assert_eq!(
        list_predicate(&["description.eq.x"]).unwrap().to_string(),
        "apps_versions.description = 'x'"
    );
    // Non-nullable columns are untouched.
    assert_eq!(
        list_predicate(&["owner.neq.bob"]).unwrap().to_string(),
        "apps.owner <> 'bob'"
    );
}

#[test]
fn limit_and_skip_normalization() {
    let limits = LimitCfg {
        default: 20,
        max: 100,
    };
    assert_eq!(limits.clamp(None), Some(20));
    assert_eq!(limits.clamp(Some(-1)), None);
    assert_eq!(limits.clamp(Some(0)), Some(0));
    assert_eq!(limits.clamp(Some(5000)), Some(100));

    let p = plan(&QuerySpec::new().with_skip(-7).with_limit(-1));
    assert_eq!(
        p.window(),
        Window {
            skip: 0,
            limit: None
        }
    );
}

#[test]
fn query_spec_deserializes_camel_case() {
    let spec: QuerySpec = serde_json::from_value(serde_json::json!({
        "conditions": ["id.eq.myapp"],
        "orderBy": [{"field": "created", "dir": "desc"}],
        "limit": 5,
        "listType": "SHARED_DIRECT",
        "sharedIds": ["myapp"],
        "computeTotal": true
    }))
    .unwrap();
    assert_eq!(spec.list_type, ListType::SharedDirect);
    assert_eq!(spec.order_by.major().map(|k| k.dir), Some(SortDir::Desc));
    assert!(spec.compute_total);
    assert!(matches!(spec.conditions, SearchConditions::List(ref c) if c.len() == 1));
}
