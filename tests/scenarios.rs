//! End-to-end round-trip scenarios driven entirely through the public API: catalog setup, then
//! `sql::insert_command`/`update_command`/`delete_command`/`select_command` exactly as a command
//! dispatcher would call them.

use engine::catalog::{Catalog, ColumnDescriptor};
use engine::key::{ColumnType, Value};
use engine::mutator::{SetItem, SetValue, UnimplementedRangeExecutor, WherePredicate};
use engine::sql::{self, Reply};

fn two_col_table(cat: &Catalog, name: &str, col1: &str, col2: &str) -> engine::TableId {
    cat.create_table(
        name,
        vec![
            ColumnDescriptor { name: col1.into(), ty: ColumnType::Int },
            ColumnDescriptor { name: col2.into(), ty: ColumnType::Int },
        ],
        None,
    )
    .unwrap()
}

fn select_one(cat: &Catalog, table: engine::TableId, pk: i64, col: usize) -> Reply {
    sql::select_command(
        cat,
        table,
        WherePredicate::SinglePk(Value::Int(pk as u32)),
        Some(&[col]),
        &UnimplementedRangeExecutor,
        || {},
    )
    .unwrap()
}

// Scenario 1: INSERT / overwrite / REPLACE / SELECT.
#[test]
fn insert_overwrite_replace_then_select() {
    let cat = Catalog::new();
    let t = two_col_table(&cat, "t", "pk", "v");

    assert_eq!(sql::insert_command(&cat, &["INTO", "t", "VALUES", "(1,10)"], false).unwrap(), vec![Reply::Ok]);
    assert_eq!(
        sql::insert_command(&cat, &["INTO", "t", "VALUES", "(1,20)"], false).unwrap(),
        vec![Reply::InsertOvrwrt]
    );
    assert_eq!(sql::insert_command(&cat, &["INTO", "t", "VALUES", "(1,20)"], true).unwrap(), vec![Reply::Ok]);

    assert_eq!(select_one(&cat, t, 1, 1), Reply::SingleRow(vec![Value::Int(20)]));
}

// Scenario 2: secondary-index fan-in/fan-out as rows carrying a shared indexed value come and go.
#[test]
fn secondary_index_tracks_every_pk_sharing_a_value() {
    let cat = Catalog::new();
    let u = two_col_table(&cat, "u", "pk", "x");
    let ix = cat.create_index("u_x", u, 1, true).unwrap();

    sql::insert_command(&cat, &["INTO", "u", "VALUES", "(1,100)"], false).unwrap();
    sql::insert_command(&cat, &["INTO", "u", "VALUES", "(2,100)"], false).unwrap();
    sql::insert_command(&cat, &["INTO", "u", "VALUES", "(3,200)"], false).unwrap();

    let nested_len = |v: u32| -> Option<usize> {
        cat.with_index(ix, |d| {
            d.tree.read().find(&engine::key::encode(&Value::Int(v))).map(|n| n.len())
        })
        .unwrap()
    };
    assert_eq!(nested_len(100), Some(2));
    assert_eq!(nested_len(200), Some(1));

    assert_eq!(
        sql::delete_command(&cat, u, WherePredicate::SinglePk(Value::Int(1)), &UnimplementedRangeExecutor).unwrap(),
        Reply::Cone
    );
    assert_eq!(nested_len(100), Some(1));
    assert_eq!(nested_len(200), Some(1));

    assert_eq!(
        sql::delete_command(&cat, u, WherePredicate::SinglePk(Value::Int(2)), &UnimplementedRangeExecutor).unwrap(),
        Reply::Cone
    );
    assert_eq!(nested_len(100), None);
    assert_eq!(nested_len(200), Some(1));
}

// Scenario 3: an ordering constraint rejects a non-monotonic insert but accepts a monotonic one.
#[test]
fn ordering_constraint_rejects_non_monotonic_insert() {
    let cat = Catalog::new();
    let w = two_col_table(&cat, "w", "pk", "t");
    let ix = cat.create_index("w_t", w, 1, true).unwrap();
    cat.declare_ordering_constraint(w, 1, ix).unwrap();

    assert_eq!(sql::insert_command(&cat, &["INTO", "w", "VALUES", "(1,5)"], false).unwrap(), vec![Reply::Ok]);
    assert_eq!(sql::insert_command(&cat, &["INTO", "w", "VALUES", "(2,10)"], false).unwrap(), vec![Reply::Ok]);
    assert_eq!(
        sql::insert_command(&cat, &["INTO", "w", "VALUES", "(3,10)"], false).unwrap(),
        vec![Reply::ConstraintViol]
    );
    assert_eq!(sql::insert_command(&cat, &["INTO", "w", "VALUES", "(4,11)"], false).unwrap(), vec![Reply::Ok]);
}

// Scenario 4: ON DUPLICATE KEY UPDATE acts as INSERT on miss, UPDATE on hit.
#[test]
fn on_duplicate_key_update_inserts_then_updates() {
    let cat = Catalog::new();
    let t = two_col_table(&cat, "t", "pk", "v");
    let argv = ["INTO", "t", "VALUES", "(1,10)", "ON", "DUPLICATE", "KEY", "UPDATE", "v=99"];

    assert_eq!(sql::insert_command(&cat, &argv, false).unwrap(), vec![Reply::Ok]);
    assert_eq!(sql::insert_command(&cat, &argv, false).unwrap(), vec![Reply::Cone]);
    assert_eq!(select_one(&cat, t, 1, 1), Reply::SingleRow(vec![Value::Int(99)]));
}

// Scenario 5: rewriting a row's own PK onto an already-occupied PK reports the overwrite and
// leaves the occupying row untouched.
#[test]
fn update_pk_onto_existing_row_reports_overwrite_without_clobbering() {
    let cat = Catalog::new();
    let t = two_col_table(&cat, "t", "pk", "v");
    sql::insert_command(&cat, &["INTO", "t", "VALUES", "(1,10)"], false).unwrap();
    sql::insert_command(&cat, &["INTO", "t", "VALUES", "(2,20)"], false).unwrap();

    let set_items = [SetItem { column: 0, value: SetValue::Literal(Value::Int(1)) }];
    let reply = sql::update_command(
        &cat,
        t,
        &set_items,
        WherePredicate::SinglePk(Value::Int(2)),
        &UnimplementedRangeExecutor,
    )
    .unwrap();
    assert_eq!(reply, Reply::UpdatePkOverwrite);

    assert_eq!(select_one(&cat, t, 2, 1), Reply::SingleRow(vec![Value::Int(20)]));
    assert_eq!(select_one(&cat, t, 1, 1), Reply::SingleRow(vec![Value::Int(10)]));
}

// Scenario 6: RETURN SIZE's four-number reply, with the row-bytes term matching the row codec.
#[test]
fn return_size_reports_row_bytes_matching_the_row_codec() {
    let cat = Catalog::new();
    two_col_table(&cat, "t", "pk", "v");
    let replies = sql::insert_command(&cat, &["INTO", "t", "VALUES", "(1,10)", "RETURN", "SIZE"], false).unwrap();
    let expected_row_size = engine::key::encode(&Value::Int(10)).len();
    match &replies[0] {
        Reply::ReturnSize { row_bytes, table_msize, table_dsize, index_bytes } => {
            assert_eq!(*row_bytes, expected_row_size);
            assert!(*table_msize >= *table_dsize);
            assert_eq!(*index_bytes, 0);
        }
        other => panic!("expected ReturnSize, got {other:?}"),
    }
}

// Round-trip law: INSERT; DELETE; SELECT returns nil.
#[test]
fn delete_then_select_returns_null() {
    let cat = Catalog::new();
    let t = two_col_table(&cat, "t", "pk", "v");
    sql::insert_command(&cat, &["INTO", "t", "VALUES", "(1,10)"], false).unwrap();
    sql::delete_command(&cat, t, WherePredicate::SinglePk(Value::Int(1)), &UnimplementedRangeExecutor).unwrap();
    assert_eq!(select_one(&cat, t, 1, 1), Reply::NullBulk);
}
