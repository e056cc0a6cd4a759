//! Compiled-text tests for the shortcut builders.

use crate::qb::*;
use crate::{
    ComposeError, Fragment, RawResult, Record, SqlParam, Where, Whereable, all, parent, raw, record,
    self_col,
};
use serde_json::json;
use std::collections::BTreeMap;

fn text(q: &crate::Query) -> String {
    q.compile().unwrap().text
}

fn text_param(s: &str) -> SqlParam {
    SqlParam::Text(s.to_string())
}

// ==================== insert ====================

#[test]
fn insert_single_record() {
    let q = insert("T", record! { "name" => "John", "age" => 30 }, InsertOptions::new()).unwrap();
    let c = q.compile().unwrap();
    assert_eq!(
        c.text,
        r#"INSERT INTO "T" ("age","name") VALUES ($1,$2) RETURNING to_jsonb("T".*) AS result"#
    );
    assert_eq!(c.values, vec![SqlParam::Int(30), text_param("John")]);
    assert!(!q.is_noop());

    let raw = RawResult::from_results([json!({"age": 30, "name": "John"})]);
    assert_eq!(
        q.run_result_transform(&raw).unwrap(),
        json!({"age": 30, "name": "John"})
    );
}

#[test]
fn insert_many_fills_missing_columns_with_default() {
    let q = insert(
        "T",
        vec![record! { "a" => 1 }, record! { "b" => 2 }],
        InsertOptions::new(),
    )
    .unwrap();
    let c = q.compile().unwrap();
    assert_eq!(
        c.text,
        r#"INSERT INTO "T" ("a","b") VALUES ($1,DEFAULT), (DEFAULT,$2) RETURNING to_jsonb("T".*) AS result"#
    );
    assert_eq!(c.values, vec![SqlParam::Int(1), SqlParam::Int(2)]);

    let raw = RawResult::from_results([json!({"a": 1}), json!({"b": 2})]);
    assert_eq!(
        q.run_result_transform(&raw).unwrap(),
        json!([{"a": 1}, {"b": 2}])
    );
}

#[test]
fn insert_empty_sequence_is_noop() {
    let q = insert("T", Vec::<Record>::new(), InsertOptions::new()).unwrap();
    assert!(q.is_noop());
    let c = q.compile().unwrap();
    assert_eq!(
        c.text,
        r#"/* marked no-op: won't hit DB unless forced -> */ INSERT INTO "T" SELECT null WHERE false"#
    );
    assert!(c.values.is_empty());
    assert_eq!(q.noop_result(), &json!([]));
}

#[test]
fn insert_record_without_columns() {
    let q = insert("T", record! {}, InsertOptions::new()).unwrap();
    assert_eq!(
        text(&q),
        r#"INSERT INTO "T" DEFAULT VALUES RETURNING to_jsonb("T".*) AS result"#
    );

    let err = insert("T", vec![record! {}, record! {}], InsertOptions::new()).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn insert_returning_and_extras() {
    let q = insert(
        "T",
        record! { "name" => "x" },
        InsertOptions::new()
            .returning(["id", "name"])
            .extra("one", Fragment::new("1")),
    )
    .unwrap();
    let c = q.compile().unwrap();
    assert_eq!(
        c.text,
        r#"INSERT INTO "T" ("name") VALUES ($1) RETURNING jsonb_build_object($2::text, "id", $3::text, "name") || jsonb_build_object($4::text, 1) AS result"#
    );
    assert_eq!(
        c.values,
        vec![
            text_param("x"),
            text_param("id"),
            text_param("name"),
            text_param("one")
        ]
    );

    let err = insert("T", record! { "a" => 1 }, InsertOptions::new().returning(Vec::<String>::new()));
    assert!(err.unwrap_err().is_validation());
}

#[test]
fn insert_values_are_bound_not_spliced() {
    let q = insert("T", record! { "name" => "'; DROP TABLE T; --" }, InsertOptions::new()).unwrap();
    let c = q.compile().unwrap();
    assert!(!c.text.contains("DROP"));
    assert_eq!(c.values, vec![text_param("'; DROP TABLE T; --")]);
}

#[test]
fn insert_raw_and_fragment_values() {
    let q = insert(
        "T",
        record! {
            "created" => raw("now()"),
            "slug" => crate::sql!("lower(" {"Hello"} ")"),
        },
        InsertOptions::new(),
    )
    .unwrap();
    assert_eq!(
        text(&q),
        r#"INSERT INTO "T" ("created","slug") VALUES (now(),lower($1)) RETURNING to_jsonb("T".*) AS result"#
    );
}

// ==================== update / delete ====================

#[test]
fn update_sets_row() {
    let q = update(
        "T",
        record! { "b" => "x", "a" => 1 },
        Whereable::new().set("id", 5),
        UpdateOptions::new(),
    )
    .unwrap();
    let c = q.compile().unwrap();
    assert_eq!(
        c.text,
        r#"UPDATE "T" SET ("a","b") = ROW($1,$2) WHERE ("id" = $3) RETURNING to_jsonb("T".*) AS result"#
    );
    assert_eq!(
        c.values,
        vec![SqlParam::Int(1), text_param("x"), SqlParam::Int(5)]
    );

    let raw = RawResult::from_results([json!({"id": 5})]);
    assert_eq!(q.run_result_transform(&raw).unwrap(), json!([{"id": 5}]));
}

#[test]
fn update_with_self_reference_and_all_rows() {
    let q = update(
        "T",
        record! { "n" => crate::sql!({self_col()} " + " {1}) },
        all(),
        UpdateOptions::new().returning(["n"]),
    )
    .unwrap();
    assert_eq!(
        text(&q),
        r#"UPDATE "T" SET ("n") = ROW("n" + $1) WHERE TRUE RETURNING jsonb_build_object($2::text, "n") AS result"#
    );
}

#[test]
fn update_rejects_empty_record() {
    let err = update("T", record! {}, all(), UpdateOptions::new()).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn delete_returns_rows() {
    let q = delete_from("T", Whereable::new().set("id", 1), DeleteOptions::new()).unwrap();
    assert_eq!(
        text(&q),
        r#"DELETE FROM "T" WHERE ("id" = $1) RETURNING to_jsonb("T".*) AS result"#
    );

    let q = delete_from("T", Fragment::new("expired"), DeleteOptions::new()).unwrap();
    assert_eq!(
        text(&q),
        r#"DELETE FROM "T" WHERE expired RETURNING to_jsonb("T".*) AS result"#
    );
    assert_eq!(
        q.run_result_transform(&RawResult::default()).unwrap(),
        json!([])
    );
}

// ==================== select ====================

#[test]
fn select_wraps_rows_in_array() {
    let q = select("T", all(), SelectOptions::new()).unwrap();
    assert_eq!(
        text(&q),
        r#"SELECT coalesce(jsonb_agg(result), '[]') AS result FROM (SELECT to_jsonb("T".*) AS result FROM "T") AS "sq_T""#
    );

    let raw = RawResult::from_results([json!([])]);
    assert_eq!(q.run_result_transform(&raw).unwrap(), json!([]));
}

#[test]
fn select_one_forces_limit() {
    let q = select_one(
        "T",
        Whereable::new().set("id", 1),
        SelectOptions::new().limit(10),
    )
    .unwrap();
    let c = q.compile().unwrap();
    assert_eq!(
        c.text,
        r#"SELECT to_jsonb("T".*) AS result FROM "T" WHERE ("id" = $1) LIMIT $2"#
    );
    assert_eq!(c.values, vec![SqlParam::Int(1), SqlParam::Int(1)]);

    assert_eq!(
        q.run_result_transform(&RawResult::default()).unwrap(),
        json!(null)
    );
}

#[test]
fn select_exactly_one_requires_a_row() {
    let q = select_exactly_one("T", Whereable::new().set("id", 1), SelectOptions::new()).unwrap();

    let err = q.run_result_transform(&RawResult::default()).unwrap_err();
    match err {
        ComposeError::NotExactlyOne { path, sql } => {
            assert_eq!(path, "result");
            assert!(sql.starts_with("SELECT to_jsonb"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let raw = RawResult::from_results([json!({"id": 1})]);
    assert_eq!(q.run_result_transform(&raw).unwrap(), json!({"id": 1}));
}

#[test]
fn select_order_limit_offset() {
    let q = select_one(
        "T",
        all(),
        SelectOptions::new()
            .order(OrderSpec::desc("created_at").nulls_last())
            .order(OrderSpec::asc("id"))
            .offset(20),
    )
    .unwrap();
    let c = q.compile().unwrap();
    assert_eq!(
        c.text,
        r#"SELECT to_jsonb("T".*) AS result FROM "T" ORDER BY "created_at" DESC NULLS LAST, "id" ASC LIMIT $1 OFFSET $2"#
    );
    assert_eq!(c.values, vec![SqlParam::Int(1), SqlParam::Int(20)]);
}

#[test]
fn select_with_ties() {
    let q = select(
        "T",
        all(),
        SelectOptions::new()
            .order(OrderSpec::new(Fragment::new("score"), Direction::Desc).nulls_first())
            .limit(3)
            .offset(6)
            .with_ties(),
    )
    .unwrap();
    assert!(text(&q).contains(
        r#"ORDER BY score DESC NULLS FIRST FETCH FIRST $1 ROWS WITH TIES OFFSET $2 ROWS"#
    ));
}

#[test]
fn select_option_validation() {
    let cases = vec![
        SelectOptions::new().with_ties().order(OrderSpec::asc("a")),
        SelectOptions::new().with_ties().limit(1),
        SelectOptions::new().limit(-1),
        SelectOptions::new().offset(-5),
        SelectOptions::new().distinct_on(Vec::<String>::new()),
        SelectOptions::new().group_by(Vec::<String>::new()),
        SelectOptions::new().columns(Vec::<String>::new()),
        SelectOptions {
            lateral: Some(Lateral::Fields(BTreeMap::new())),
            ..SelectOptions::default()
        },
        SelectOptions::new().lock(LockSpec::new(LockMode::Update).of(Vec::<String>::new())),
    ];
    for options in cases {
        let err = select("T", all(), options.clone()).unwrap_err();
        assert!(err.is_validation(), "expected rejection of {options:?}");
    }
}

#[test]
fn select_distinct_group_having() {
    let q = select(
        "T",
        all(),
        SelectOptions::new()
            .distinct_on(["a", "b"])
            .columns(["a", "b"])
            .group_by(["a", "b"])
            .having(Fragment::new("count(*) > 1")),
    )
    .unwrap();
    assert_eq!(
        text(&q),
        r#"SELECT coalesce(jsonb_agg(result), '[]') AS result FROM (SELECT DISTINCT ON ("a","b") jsonb_build_object($1::text, "a", $2::text, "b") AS result FROM "T" GROUP BY "a", "b" HAVING count(*) > 1) AS "sq_T""#
    );

    let q = select_one("T", all(), SelectOptions::new().distinct()).unwrap();
    assert!(text(&q).starts_with("SELECT DISTINCT to_jsonb"));
}

#[test]
fn select_alias_and_extras() {
    let q = select(
        "T",
        all(),
        SelectOptions::new()
            .alias("t1")
            .extra("upper_name", crate::sql!("upper(" {crate::ident("t1.name").unwrap()} ")")),
    )
    .unwrap();
    assert_eq!(
        text(&q),
        r#"SELECT coalesce(jsonb_agg(result), '[]') AS result FROM (SELECT to_jsonb("t1".*) || jsonb_build_object($1::text, upper("t1"."name")) AS result FROM "T" AS "t1") AS "sq_t1""#
    );
}

#[test]
fn select_locks() {
    let q = select_one(
        "T",
        all(),
        SelectOptions::new()
            .lock(
                LockSpec::new(LockMode::Update)
                    .of(["T"])
                    .wait(LockWait::SkipLocked),
            )
            .lock(LockSpec::new(LockMode::KeyShare).wait(LockWait::NoWait)),
    )
    .unwrap();
    assert_eq!(
        text(&q),
        r#"SELECT to_jsonb("T".*) AS result FROM "T" LIMIT $1 FOR UPDATE OF "T" SKIP LOCKED FOR KEY SHARE NOWAIT"#
    );
}

#[test]
fn select_lateral_fields() {
    let books = select(
        "books",
        Whereable::new().set("author_id", parent("id")),
        SelectOptions::new(),
    )
    .unwrap();
    let q = select("authors", all(), SelectOptions::new().lateral("books", books)).unwrap();

    let c = q.compile().unwrap();
    assert_eq!(
        c.text,
        concat!(
            r#"SELECT coalesce(jsonb_agg(result), '[]') AS result FROM ("#,
            r#"SELECT to_jsonb("authors".*) || jsonb_build_object($1::text, "lateral_books".result) AS result FROM "authors""#,
            r#" LEFT JOIN LATERAL (SELECT coalesce(jsonb_agg(result), '[]') AS result FROM ("#,
            r#"SELECT to_jsonb("books".*) AS result FROM "books" WHERE ("author_id" = "authors"."id")"#,
            r#") AS "sq_books") AS "lateral_books" ON true) AS "sq_authors""#,
        )
    );
    assert_eq!(c.values, vec![text_param("books")]);
}

#[test]
fn lateral_parent_follows_alias() {
    let count_books = count(
        "books",
        Whereable::new().set("author_id", parent("id")),
        AggregateOptions::new(),
    )
    .unwrap();
    let q = select_one(
        "authors",
        all(),
        SelectOptions::new().alias("a").lateral("book_count", count_books),
    )
    .unwrap();
    assert!(text(&q).contains(
        r#"LEFT JOIN LATERAL (SELECT count("books".*) AS result FROM "books" WHERE ("author_id" = "a"."id")) AS "lateral_book_count" ON true"#
    ));
}

#[test]
fn select_lateral_passthrough() {
    let publisher = select_one(
        "publishers",
        Whereable::new().set("id", parent("publisher_id")),
        SelectOptions::new(),
    )
    .unwrap();
    let q = select("books", all(), SelectOptions::new().passthrough(publisher)).unwrap();
    assert_eq!(
        text(&q),
        concat!(
            r#"SELECT coalesce(jsonb_agg(result), '[]') AS result FROM ("#,
            r#"SELECT "lateral_passthru".result AS result FROM "books""#,
            r#" LEFT JOIN LATERAL (SELECT to_jsonb("publishers".*) AS result FROM "publishers" WHERE ("id" = "books"."publisher_id") LIMIT $1) AS "lateral_passthru" ON true"#,
            r#") AS "sq_books""#,
        )
    );

    let publisher = select_one("publishers", all(), SelectOptions::new()).unwrap();
    let err = select(
        "books",
        all(),
        SelectOptions::new().columns(["id"]).passthrough(publisher),
    )
    .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn noop_cannot_be_lateral() {
    let noop = insert("T", Vec::<Record>::new(), InsertOptions::new()).unwrap();
    let err = select("T", all(), SelectOptions::new().lateral("x", noop)).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn nested_exactly_one_checked_on_every_row() {
    let author = select_exactly_one(
        "authors",
        Whereable::new().set("id", parent("author_id")),
        SelectOptions::new(),
    )
    .unwrap();
    let books = select("books", all(), SelectOptions::new().lateral("author", author)).unwrap();

    let ok = RawResult::from_results([json!([
        {"id": 1, "author": {"id": 7}},
        {"id": 2, "author": {"id": 8}}
    ])]);
    assert!(books.run_result_transform(&ok).is_ok());

    let missing = RawResult::from_results([json!([
        {"id": 1, "author": {"id": 7}},
        {"id": 2, "author": null}
    ])]);
    match books.run_result_transform(&missing).unwrap_err() {
        ComposeError::NotExactlyOne { path, .. } => assert_eq!(path, "result[1].author"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn exactly_one_propagates_through_levels() {
    let publisher = select_exactly_one(
        "publishers",
        Whereable::new().set("id", parent("publisher_id")),
        SelectOptions::new(),
    )
    .unwrap();
    let books = select(
        "books",
        Whereable::new().set("author_id", parent("id")),
        SelectOptions::new().lateral("publisher", publisher),
    )
    .unwrap();
    let authors = select_one("authors", all(), SelectOptions::new().lateral("books", books)).unwrap();

    let raw = RawResult::from_results([json!({
        "id": 1,
        "books": [{"id": 10, "publisher": {"id": 3}}, {"id": 11, "publisher": null}]
    })]);
    let err = authors.run_result_transform(&raw).unwrap_err();
    assert!(err.is_not_exactly_one());

    // an absent outer row is fine for select_one
    assert_eq!(
        authors.run_result_transform(&RawResult::default()).unwrap(),
        json!(null)
    );
}

#[test]
fn placeholders_match_values_in_nested_queries() {
    let books = select(
        "books",
        Whereable::new()
            .set("author_id", parent("id"))
            .set("year", crate::Op::between(1990, 2000)),
        SelectOptions::new().columns(["id", "title"]).limit(5),
    )
    .unwrap();
    let q = select(
        "authors",
        Whereable::new().set("country", "NZ"),
        SelectOptions::new()
            .lateral("books", books)
            .order(OrderSpec::asc("name"))
            .limit(10)
            .offset(2),
    )
    .unwrap();

    let c = q.compile().unwrap();
    assert_eq!(c.text.matches('$').count(), c.values.len());
    for k in 1..=c.values.len() {
        assert!(c.text.contains(&format!("${k}")));
    }
    assert_eq!(c.values[0], text_param("books"));
}

#[test]
fn building_and_compiling_is_deterministic() {
    let build = || {
        select(
            "T",
            Whereable::new().set("b", 2).set("a", 1),
            SelectOptions::new().limit(3),
        )
        .unwrap()
    };
    assert_eq!(build(), build());
    let q = build();
    assert_eq!(q.compile().unwrap(), q.compile().unwrap());
}

// ==================== aggregates ====================

#[test]
fn count_and_sum() {
    let q = count("T", all(), AggregateOptions::new()).unwrap();
    assert_eq!(text(&q), r#"SELECT count("T".*) AS result FROM "T""#);
    let raw = RawResult::from_results([json!("42")]);
    assert_eq!(q.run_result_transform(&raw).unwrap(), json!(42));

    let q = sum(
        "T",
        Whereable::new().set("b", 1),
        AggregateOptions::new().column("a"),
    )
    .unwrap();
    assert_eq!(
        text(&q),
        r#"SELECT sum("a") AS result FROM "T" WHERE ("b" = $1)"#
    );

    let raw = RawResult::from_results([json!("12.5")]);
    assert_eq!(q.run_result_transform(&raw).unwrap(), json!(12.5));

    let raw = RawResult::from_results([json!("not a number")]);
    assert!(matches!(
        q.run_result_transform(&raw),
        Err(ComposeError::Numeric { .. })
    ));
}

#[test]
fn aggregate_validation() {
    assert!(sum("T", all(), AggregateOptions::new()).unwrap_err().is_validation());
    let two = AggregateOptions {
        columns: Some(vec!["a".into(), "b".into()]),
    };
    assert!(max("T", all(), two).unwrap_err().is_validation());

    let q = avg("T", all(), AggregateOptions::new().column("a")).unwrap();
    assert_eq!(text(&q), r#"SELECT avg("a") AS result FROM "T""#);
    let q = min("T", all(), AggregateOptions::new().column("a")).unwrap();
    assert_eq!(text(&q), r#"SELECT min("a") AS result FROM "T""#);
}

// ==================== upsert ====================

#[test]
fn upsert_updates_inserted_columns() {
    let q = upsert(
        "T",
        record! { "name" => "A", "email" => "a@example.com" },
        ConflictTarget::columns(["email"]),
        UpsertOptions::new(),
    )
    .unwrap();
    assert_eq!(
        text(&q),
        concat!(
            r#"INSERT INTO "T" ("email","name") VALUES ($1,$2) ON CONFLICT ("email")"#,
            r#" DO UPDATE SET ("email","name") = ROW(EXCLUDED."email",EXCLUDED."name")"#,
            r#" RETURNING to_jsonb("T".*) || jsonb_build_object('$action', CASE xmax WHEN 0 THEN 'INSERT' ELSE 'UPDATE' END) AS result"#,
        )
    );

    let raw = RawResult::from_results([json!({"email": "a@example.com", "$action": "INSERT"})]);
    assert_eq!(
        q.run_result_transform(&raw).unwrap()["$action"],
        json!("INSERT")
    );
}

#[test]
fn upsert_update_columns_values_and_no_null() {
    let q = upsert(
        "T",
        record! { "name" => "A", "email" => "a@example.com" },
        ConflictTarget::constraint("t_email_key"),
        UpsertOptions::new()
            .update_columns(["name"])
            .update_value("updated_at", raw("now()"))
            .no_null_update_columns(["name"])
            .suppress_action(),
    )
    .unwrap();
    assert_eq!(
        text(&q),
        concat!(
            r#"INSERT INTO "T" ("email","name") VALUES ($1,$2) ON CONFLICT ON CONSTRAINT "t_email_key""#,
            r#" DO UPDATE SET ("name","updated_at") = ROW(CASE WHEN EXCLUDED."name" IS NULL THEN "T"."name" ELSE EXCLUDED."name" END,now())"#,
            r#" RETURNING to_jsonb("T".*) AS result"#,
        )
    );
}

#[test]
fn upsert_update_value_sees_its_column() {
    let q = upsert(
        "T",
        record! { "email" => "a@example.com" },
        ConflictTarget::columns(["email"]),
        UpsertOptions::new()
            .update_value("visits", crate::sql!({self_col()} " + 1"))
            .suppress_action(),
    )
    .unwrap();
    assert!(text(&q).contains(
        r#"DO UPDATE SET ("email","visits") = ROW(EXCLUDED."email","visits" + 1)"#
    ));
}

#[test]
fn upsert_do_nothing() {
    let q = upsert(
        "T",
        vec![record! { "email" => "a" }, record! { "email" => "b" }],
        ConflictTarget::columns(["email"]),
        UpsertOptions::new().do_nothing().suppress_action(),
    )
    .unwrap();
    assert_eq!(
        text(&q),
        r#"INSERT INTO "T" ("email") VALUES ($1), ($2) ON CONFLICT ("email") DO NOTHING RETURNING to_jsonb("T".*) AS result"#
    );
    let raw = RawResult::from_results([json!({"email": "a"})]);
    assert_eq!(q.run_result_transform(&raw).unwrap(), json!([{"email": "a"}]));

    // a single skipped row comes back as null
    let q = upsert(
        "T",
        record! { "email" => "a" },
        ConflictTarget::columns(["email"]),
        UpsertOptions::new().do_nothing(),
    )
    .unwrap();
    assert_eq!(q.run_result_transform(&RawResult::default()).unwrap(), json!(null));
}

#[test]
fn upsert_empty_update_columns_does_nothing() {
    let q = upsert(
        "T",
        record! { "a" => 1, "b" => 2 },
        ConflictTarget::columns(["a"]),
        UpsertOptions::new()
            .update_columns(Vec::<String>::new())
            .suppress_action(),
    )
    .unwrap();
    let sql = text(&q);
    assert_eq!(
        sql,
        r#"INSERT INTO "T" ("a","b") VALUES ($1,$2) ON CONFLICT ("a") DO NOTHING RETURNING to_jsonb("T".*) AS result"#
    );
    assert!(!sql.contains("DO UPDATE"));
}

#[test]
fn upsert_update_columns_are_deduplicated() {
    let q = upsert(
        "T",
        record! { "a" => 1, "b" => 2 },
        ConflictTarget::columns(["a"]),
        UpsertOptions::new()
            .update_columns(["b", "b"])
            .update_value("b", 3)
            .suppress_action(),
    )
    .unwrap();
    let c = q.compile().unwrap();
    assert_eq!(
        c.text,
        concat!(
            r#"INSERT INTO "T" ("a","b") VALUES ($1,$2) ON CONFLICT ("a")"#,
            r#" DO UPDATE SET ("b") = ROW($3)"#,
            r#" RETURNING to_jsonb("T".*) AS result"#,
        )
    );
    assert_eq!(c.values, vec![SqlParam::Int(1), SqlParam::Int(2), SqlParam::Int(3)]);
}

#[test]
fn upsert_validation() {
    let target = || ConflictTarget::columns(["email"]);
    let row = || record! { "email" => "a" };

    let err = upsert(
        "T",
        row(),
        target(),
        UpsertOptions::new().do_nothing().update_value("x", 1),
    )
    .unwrap_err();
    assert!(err.is_validation());

    let err = upsert(
        "T",
        row(),
        target(),
        UpsertOptions::new().do_nothing().no_null_update_columns(["email"]),
    )
    .unwrap_err();
    assert!(err.is_validation());

    let err = upsert(
        "T",
        row(),
        ConflictTarget::columns(Vec::<String>::new()),
        UpsertOptions::new(),
    )
    .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn upsert_empty_sequence_is_insert_noop() {
    let q = upsert(
        "T",
        Vec::<Record>::new(),
        ConflictTarget::columns(["email"]),
        UpsertOptions::new(),
    )
    .unwrap();
    assert!(q.is_noop());
    assert_eq!(q.noop_result(), &json!([]));
}

// ==================== truncate ====================

#[test]
fn truncate_tables() {
    let q = truncate(
        ["T", "orders"],
        TruncateOptions::new().restart_identity().cascade(),
    )
    .unwrap();
    let c = q.compile().unwrap();
    assert_eq!(c.text, r#"TRUNCATE "T", "orders" RESTART IDENTITY CASCADE"#);
    assert!(c.values.is_empty());
    assert_eq!(
        q.run_result_transform(&RawResult::default()).unwrap(),
        json!(null)
    );

    let q = truncate(["T"], TruncateOptions::new().continue_identity().restrict()).unwrap();
    assert_eq!(text(&q), r#"TRUNCATE "T" CONTINUE IDENTITY RESTRICT"#);

    let err = truncate(Vec::<&str>::new(), TruncateOptions::new()).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn where_variants_in_select() {
    let q = select_one("T", Where::Sql(Fragment::new("x > 1")), SelectOptions::new()).unwrap();
    assert!(text(&q).contains("WHERE x > 1 LIMIT"));

    let q = select_one("T", Whereable::new(), SelectOptions::new()).unwrap();
    assert!(text(&q).contains("WHERE TRUE LIMIT"));
}
