use pretty_assertions::{assert_eq, assert_ne};
use schema_remap::args::Args;
use schema_remap::mapping::MappingPair;
use schema_remap::report::{SkipReason, TableOutcome};

use super::testable_database::TestableDatabase;

fn args(in_db: &impl TestableDatabase, out_db: &impl TestableDatabase, pairs: &[&str]) -> Args {
    let mut args = Args::new(in_db.get_uri(), out_db.get_uri());
    for pair in pairs {
        args.map.push(pair.parse::<MappingPair>().unwrap());
    }
    return args;
}

pub fn one_table(mut in_db: impl TestableDatabase, mut out_db: impl TestableDatabase) {
    in_db.create_test_table("xero_xerotenant");
    out_db.create_test_table("xero_core_xerotenant");
    in_db.fill_test_table("xero_xerotenant", 100);
    assert_ne!(
        in_db.get_all_rows("xero_xerotenant"),
        out_db.get_all_rows("xero_core_xerotenant")
    );

    let report = schema_remap::run(args(
        &in_db,
        &out_db,
        &["xero_xerotenant=xero_core_xerotenant"],
    ))
    .unwrap();

    assert_eq!(
        in_db.get_all_rows("xero_xerotenant"),
        out_db.get_all_rows("xero_core_xerotenant")
    );
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].rows_copied(), 100);
    assert_eq!(report.total_rows_copied(), 100);
    assert!(!report.has_errors());
}

pub fn multiple_tables(mut in_db: impl TestableDatabase, mut out_db: impl TestableDatabase) {
    in_db.create_test_table("test");
    in_db.create_test_table("test1");
    out_db.create_test_table("test_v3");
    out_db.create_test_table("test1_v3");
    in_db.fill_test_table("test", 10);
    in_db.fill_test_table("test1", 25);

    let report =
        schema_remap::run(args(&in_db, &out_db, &["test=test_v3", "test1=test1_v3"])).unwrap();

    assert_eq!(in_db.get_all_rows("test"), out_db.get_all_rows("test_v3"));
    assert_eq!(in_db.get_all_rows("test1"), out_db.get_all_rows("test1_v3"));
    assert_eq!(report.total_rows_copied(), 35);
}

pub fn empty_source(mut in_db: impl TestableDatabase, mut out_db: impl TestableDatabase) {
    in_db.create_test_table("test");
    out_db.create_test_table("test_v3");
    out_db.fill_test_table("test_v3", 10);

    let report = schema_remap::run(args(&in_db, &out_db, &["test=test_v3"])).unwrap();

    assert_eq!(out_db.count_rows("test_v3"), 0);
    assert_eq!(
        report.results[0].outcome,
        TableOutcome::Copied { rows: 0 }
    );
}

pub fn idempotent(mut in_db: impl TestableDatabase, mut out_db: impl TestableDatabase) {
    in_db.create_test_table("test");
    out_db.create_test_table("test_v3");
    in_db.fill_test_table("test", 50);

    let first = schema_remap::run(args(&in_db, &out_db, &["test=test_v3"])).unwrap();
    let after_first = out_db.get_all_rows("test_v3");
    let second = schema_remap::run(args(&in_db, &out_db, &["test=test_v3"])).unwrap();
    let after_second = out_db.get_all_rows("test_v3");

    assert_eq!(first.total_rows_copied(), 50);
    assert_eq!(second.total_rows_copied(), 50);
    assert_eq!(after_first, after_second);
    assert_eq!(after_second, in_db.get_all_rows("test"));
}

pub fn projection(mut in_db: impl TestableDatabase, mut out_db: impl TestableDatabase) {
    in_db.execute(
        "CREATE TABLE a (id BIGINT PRIMARY KEY, name TEXT, amount DOUBLE PRECISION);
        INSERT INTO a VALUES (1, 'x', 10.5);",
    );
    out_db.execute(
        "CREATE TABLE a2 (id BIGINT PRIMARY KEY, name TEXT, note TEXT DEFAULT 'none', flag BIGINT);",
    );

    let report = schema_remap::run(args(&in_db, &out_db, &["a=a2"])).unwrap();

    let result = &report.results[0];
    assert_eq!(result.rows_copied(), 1);
    assert!(!result.skipped());
    assert_eq!(result.error(), None);
    assert_eq!(out_db.count_rows("a2"), 1);
    assert_eq!(
        out_db.query_count(
            "SELECT count(1) FROM a2 WHERE id = 1 AND name = 'x' AND note = 'none' AND flag IS NULL"
        ),
        1
    );
}

pub fn source_table_not_found(mut in_db: impl TestableDatabase, mut out_db: impl TestableDatabase) {
    out_db.create_test_table("test_v3");
    out_db.fill_test_table("test_v3", 10);
    let before = out_db.get_all_rows("test_v3");

    let report = schema_remap::run(args(&in_db, &out_db, &["test=test_v3"])).unwrap();

    assert_eq!(
        report.results[0].outcome,
        TableOutcome::Skipped {
            reason: SkipReason::SourceMissing
        }
    );
    assert_eq!(report.results[0].rows_copied(), 0);
    assert!(!report.has_errors());
    assert_eq!(out_db.get_all_rows("test_v3"), before);
}

pub fn destination_table_not_found(
    mut in_db: impl TestableDatabase,
    out_db: impl TestableDatabase,
) {
    in_db.create_test_table("test");
    in_db.fill_test_table("test", 10);

    let report = schema_remap::run(args(&in_db, &out_db, &["test=test_v3"])).unwrap();

    assert_eq!(
        report.results[0].outcome,
        TableOutcome::Skipped {
            reason: SkipReason::DestinationMissing
        }
    );
    assert!(!report.has_errors());
}

pub fn no_common_columns(mut in_db: impl TestableDatabase, mut out_db: impl TestableDatabase) {
    in_db.execute("CREATE TABLE a (id BIGINT, name TEXT); INSERT INTO a VALUES (1, 'x');");
    out_db.execute("CREATE TABLE a2 (uuid TEXT); INSERT INTO a2 VALUES ('kept');");

    let report = schema_remap::run(args(&in_db, &out_db, &["a=a2"])).unwrap();

    assert_eq!(
        report.results[0].outcome,
        TableOutcome::Skipped {
            reason: SkipReason::NoCommonColumns
        }
    );
    assert_eq!(
        out_db.query_count("SELECT count(1) FROM a2 WHERE uuid = 'kept'"),
        1
    );
}

pub fn unmapped_tables(mut in_db: impl TestableDatabase, mut out_db: impl TestableDatabase) {
    in_db.create_test_table("test");
    out_db.create_test_table("test_v3");
    in_db.fill_test_table("test", 5);

    let mut args = args(&in_db, &out_db, &["test=test_v3"]);
    args.table = vec![
        "unknown".to_string(),
        "test".to_string(),
        "other_unknown".to_string(),
        "unknown".to_string(),
    ];
    let report = schema_remap::run(args).unwrap();

    assert_eq!(report.results.len(), 4);
    assert_eq!(report.total_rows_copied(), 5);
    assert_eq!(report.skipped().count(), 3);
    assert_eq!(
        report.unmapped_names().into_iter().collect::<Vec<_>>(),
        vec!["other_unknown", "unknown"]
    );
    assert!(!report.has_errors());
}

pub fn failed_table_is_rolled_back(
    mut in_db: impl TestableDatabase,
    mut out_db: impl TestableDatabase,
) {
    in_db.execute(
        "CREATE TABLE broken (id BIGINT PRIMARY KEY, name TEXT);
        INSERT INTO broken VALUES (1, 'new'), (2, 'newer');",
    );
    out_db.execute(
        "CREATE TABLE broken_v3 (id BIGINT PRIMARY KEY, name TEXT, required TEXT NOT NULL);
        INSERT INTO broken_v3 VALUES (99, 'old', 'r');",
    );
    in_db.create_test_table("test");
    out_db.create_test_table("test_v3");
    in_db.fill_test_table("test", 10);

    let report = schema_remap::run(args(
        &in_db,
        &out_db,
        &["broken=broken_v3", "test=test_v3"],
    ))
    .unwrap();

    assert!(report.has_errors());
    let failed = &report.results[0];
    assert_eq!(failed.source_table, "broken");
    assert!(failed.error().is_some());
    assert!(!failed.skipped());
    assert_eq!(failed.rows_copied(), 0);
    assert_eq!(
        out_db.query_count("SELECT count(1) FROM broken_v3 WHERE id = 99 AND name = 'old'"),
        1
    );
    assert_eq!(out_db.count_rows("broken_v3"), 1);

    // The run goes on after a failed table
    assert_eq!(report.results[1].rows_copied(), 10);
    assert_eq!(in_db.get_all_rows("test"), out_db.get_all_rows("test_v3"));
}

pub fn dry_run(mut in_db: impl TestableDatabase, mut out_db: impl TestableDatabase) {
    in_db.create_test_table("test");
    out_db.create_test_table("test_v3");
    in_db.fill_test_table("test", 20);
    out_db.fill_test_table("test_v3", 3);

    let mut args = args(&in_db, &out_db, &["test=test_v3"]);
    args.dry_run = true;
    let report = schema_remap::run(args).unwrap();

    assert_eq!(
        report.results[0].outcome,
        TableOutcome::Checked { rows: 20 }
    );
    assert_eq!(report.total_rows_copied(), 0);
    assert_eq!(out_db.count_rows("test_v3"), 3);
}

pub fn small_batches(mut in_db: impl TestableDatabase, mut out_db: impl TestableDatabase) {
    in_db.create_test_table("test");
    out_db.create_test_table("test_v3");
    in_db.fill_test_table("test", 101);

    let mut args = args(&in_db, &out_db, &["test=test_v3"]);
    args.batch_write_size = 10;
    let report = schema_remap::run(args).unwrap();

    assert_eq!(report.total_rows_copied(), 101);
    assert_eq!(in_db.get_all_rows("test"), out_db.get_all_rows("test_v3"));
}

pub fn list_tables(mut in_db: impl TestableDatabase, mut out_db: impl TestableDatabase) {
    in_db.create_test_table("xero_xerotenant");
    in_db.create_test_table("auth_user");
    out_db.create_test_table("xero_core_xerotenant");
    out_db.create_test_table("xero_auth_xerotenanttoken");

    let listing = schema_remap::list_tables(schema_remap::args::ListArgs {
        input: Some(in_db.get_uri()),
        output: Some(out_db.get_uri()),
        config: None,
        pattern: "xero".to_string(),
    })
    .unwrap();

    assert_eq!(listing.source, vec!["xero_xerotenant"]);
    assert_eq!(
        listing.destination,
        vec!["xero_auth_xerotenanttoken", "xero_core_xerotenant"]
    );
}

pub fn unsupported_type_outside_common_columns(
    mut in_db: impl TestableDatabase,
    mut out_db: impl TestableDatabase,
) {
    in_db.execute(
        "CREATE TABLE a (id BIGINT PRIMARY KEY, name TEXT, span INTERVAL);
        INSERT INTO a VALUES (1, 'x', NULL);",
    );
    out_db.execute("CREATE TABLE a2 (id BIGINT PRIMARY KEY, name TEXT);");

    let report = schema_remap::run(args(&in_db, &out_db, &["a=a2"])).unwrap();

    assert_eq!(report.results[0].outcome, TableOutcome::Copied { rows: 1 });
    assert_eq!(
        out_db.query_count("SELECT count(1) FROM a2 WHERE id = 1 AND name = 'x'"),
        1
    );
}

pub fn unsupported_type_in_common_columns(
    mut in_db: impl TestableDatabase,
    mut out_db: impl TestableDatabase,
) {
    in_db.execute(
        "CREATE TABLE a (id BIGINT PRIMARY KEY, span INTERVAL);
        INSERT INTO a VALUES (1, NULL);",
    );
    out_db.execute(
        "CREATE TABLE a2 (id BIGINT PRIMARY KEY, span INTERVAL);
        INSERT INTO a2 VALUES (99, NULL);",
    );

    let report = schema_remap::run(args(&in_db, &out_db, &["a=a2"])).unwrap();

    let error = report.results[0].error().unwrap();
    assert!(error.contains("span"), "{error}");
    assert_eq!(out_db.query_count("SELECT count(1) FROM a2 WHERE id = 99"), 1);
}
