//! Single-row mutator (C6): INSERT/REPLACE/UPDATE/DELETE/SELECT semantics over one primary key.
//!
//! Grounded on `DB/alsosql.c`'s `insertCommit`/`updateAction`/`check_constraints`/`ovwrPKUp`/
//! `getPkUpdateCol`/`assignMisses`. Every function here takes an already-parsed, already-typed
//! request (the column-list parser, where-clause parser, and expression parser are external
//! collaborators — C7 builds the [`WherePredicate`]/[`SetItem`] values this module
//! consumes) and returns an outcome enum rather than a host reply object; C7 maps outcomes to the
//! wire reply vocabulary.
//!
//! No partial writes: every branch below either fully completes (data tree + every secondary
//! index in sync) or returns before touching any B-tree. That's why constraint and overflow
//! checks — [`check_ordering_constraint`] among them — run before the row blob is built and
//! before any B-tree is touched, rather than interleaved with the writes themselves.

use std::collections::HashSet;

use crate::catalog::{Catalog, IndexId, OrderingConstraint, TableId};
use crate::error::{EngineError, Result};
use crate::index_maint;
use crate::key::{self, ColumnType, Value};
use crate::row;
use crate::row::TableEntry;

/// What an INSERT/REPLACE should do on a primary-key collision. C7 is responsible for rejecting
/// `Replace` combined with `OnDuplicateUpdate` before ever constructing this (the
/// two are mutually exclusive at the argument-shape level).
pub enum InsertMode {
    Insert,
    Replace,
    OnDuplicateUpdate(Vec<SetItem>),
}

/// One `SET column = value` pair, pre-resolved by C7's column-list/expression parsers.
pub struct SetItem {
    pub column: usize,
    pub value: SetValue,
}

pub enum SetValue {
    Literal(Value),
    /// A compiled small expression (parsed once per UPDATE, discarded when the command
    /// returns) — the caller builds this once per command, not once per row.
    Expr(Expr),
}

/// The only expression shape this engine evaluates: a column plus or minus a literal of the same
/// type. Evaluated against the *old* row, never cached across commands.
pub enum Expr {
    Add(usize, Value),
    Sub(usize, Value),
}

/// A where-clause reduced to either a unique-PK lookup or a pointer at the range executor. The
/// where-clause parser itself is an external collaborator; this is the minimal
/// shape C7 needs to hand C6 in order to route correctly.
pub enum WherePredicate {
    SinglePk(Value),
    /// FK/range/IN predicate. `index` is `None` when no index can satisfy it (→ `PlanError`,
    /// reply `rangequery_index_not_found`), `Some(id)` when the where-clause parser picked one.
    Range { index: Option<IndexId> },
}

/// The range-query/join executor (`iselectAction`/`ideleteAction`/`iupdateAction`/`joinReply`)
/// is an explicit external collaborator: this crate describes the interface at the
/// single point the single-row engine hands off to it and ships a stub that reports the
/// operation as undelegated. A host embedding this engine supplies a real implementation.
pub trait RangeExecutor {
    fn update(&self, table: TableId, index: IndexId, set_items: &[SetItem]) -> Result<UpdateOutcome>;
    fn delete(&self, table: TableId, index: IndexId) -> Result<bool>;
    fn select(&self, table: TableId, index: IndexId) -> Result<Option<Vec<Value>>>;
}

/// The default `RangeExecutor`: every call fails with `PlanError`, since no range executor is
/// wired into this build. Use this when driving the engine standalone (CLI, tests).
pub struct UnimplementedRangeExecutor;

impl RangeExecutor for UnimplementedRangeExecutor {
    fn update(&self, _table: TableId, _index: IndexId, _set_items: &[SetItem]) -> Result<UpdateOutcome> {
        Err(EngineError::plan("range UPDATE requires a range executor, none is configured"))
    }
    fn delete(&self, _table: TableId, _index: IndexId) -> Result<bool> {
        Err(EngineError::plan("range DELETE requires a range executor, none is configured"))
    }
    fn select(&self, _table: TableId, _index: IndexId) -> Result<Option<Vec<Value>>> {
        Err(EngineError::plan("range SELECT requires a range executor, none is configured"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertOutcome {
    pub row_size: usize,
    pub table_msize: usize,
    pub table_dsize: usize,
    pub index_bytes: usize,
}

pub enum InsertResult {
    Inserted(InsertOutcome),
    UpdatedViaOnDuplicate(UpdateOutcome),
    /// `insert_ovrwrt`: PK already present on a plain INSERT.
    Overwrite,
    /// `insertcolumn`: partial insert's column list didn't match the tuple.
    ColumnMismatch,
    /// `part_insert_other`: partial insert against a narrow (two-column) table names the wrong
    /// column set.
    NarrowColumnMismatch,
    /// `insert_lru`: caller named the LRU column explicitly.
    LruWrite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub row_size: usize,
}

pub enum UpdateResult {
    Updated(UpdateOutcome),
    NoMatch,
    /// `update_pk_overwrite`: the proposed new PK already names another row.
    PkOverwrite,
    /// `update_pk_range_query`: a PK-touching SET combined with a non-point predicate.
    PkRangeUpdate,
    /// `update_lru`: caller named the LRU column explicitly.
    LruWrite,
}

pub enum DeleteResult {
    Deleted,
    NoMatch,
}

pub enum SelectResult {
    Row(Vec<Value>),
    Null,
}

struct TableMeta {
    columns: Vec<ColumnType>,
    lru_column: Option<usize>,
    ordering_constraint: Option<OrderingConstraint>,
    secondary_indexes: Vec<IndexId>,
    is_narrow: bool,
}

fn snapshot_table_meta(catalog: &Catalog, table: TableId) -> Result<TableMeta> {
    catalog.with_table(table, |t| TableMeta {
        columns: t.columns.iter().map(|c| c.ty).collect(),
        lru_column: t.lru_column,
        ordering_constraint: t.ordering_constraint,
        secondary_indexes: t.secondary_indexes.clone(),
        is_narrow: t.is_narrow(),
    })
}

fn build_entry(is_narrow: bool, non_pk: &[Value]) -> TableEntry {
    if is_narrow {
        TableEntry::Narrow(non_pk[0].clone())
    } else {
        TableEntry::Blob(row::encode_row(non_pk))
    }
}

/// Reassembles a full row (PK at index 0, then declared column order) from a data B-tree entry.
fn decode_full_row(col_types: &[ColumnType], pk: &Value, entry: &TableEntry) -> Vec<Value> {
    let mut out = vec![pk.clone()];
    match entry {
        TableEntry::Blob(blob) => out.extend(row::decode_row(blob, &col_types[1..])),
        TableEntry::Narrow(v) => out.push(v.clone()),
    }
    out
}

/// Reorders a tuple per an optional partial-insert column list, filling any column the list
/// omitted with the row codec's type default. Returns `Err(())` — not an [`EngineError`], this
/// is an expected "shape didn't match" outcome the caller turns into `ColumnMismatch` — when the
/// list and the tuple disagree on length or name an out-of-range column.
fn reorder_tuple(col_types: &[ColumnType], column_list: Option<&[usize]>, values: Vec<Value>) -> std::result::Result<Vec<Value>, ()> {
    let n = col_types.len();
    match column_list {
        None => {
            if values.len() != n {
                return Err(());
            }
            Ok(values)
        }
        Some(list) => {
            if list.len() != values.len() {
                return Err(());
            }
            let mut slots: Vec<Option<Value>> = (0..n).map(|_| None).collect();
            for (&col, v) in list.iter().zip(values.into_iter()) {
                if col >= n || slots[col].is_some() {
                    return Err(());
                }
                slots[col] = Some(v);
            }
            Ok(slots
                .into_iter()
                .enumerate()
                .map(|(i, slot)| slot.unwrap_or_else(|| row::default_value(col_types[i])))
                .collect())
        }
    }
}

/// The ordering-constraint check runs before the new row is built or any B-tree
/// is touched, so a violation never leaves a half-applied write behind. The index's key bytes
/// are the encoded value of its own indexed column `ic`, which is not necessarily the ordering
/// column `c` the constraint actually governs — so the extremal *row* has to be looked up via
/// one of its PKs and column `c` read off it, the same two-step `btFind`-then-`getCol` the
/// original `check_constraints` does. An empty index is always OK — there is no extremum yet.
fn check_ordering_constraint(
    catalog: &Catalog,
    table: TableId,
    col_types: &[ColumnType],
    constraint: OrderingConstraint,
    candidate_row: &[Value],
) -> Result<()> {
    let found = catalog.with_index(constraint.index, |ix| {
        let tree = ix.tree.read();
        let entry = if ix.ascending { tree.max_entry() } else { tree.min_entry() };
        let pk_bytes = entry.and_then(|(_, nested)| nested.min_entry().map(|(k, _)| k.to_vec()));
        (ix.ascending, pk_bytes)
    })?;
    let (ascending, Some(extremal_pk_bytes)) = found else {
        return Ok(());
    };
    let extremal_col_value = catalog.with_table(table, |t| {
        let data = t.data.read();
        data.find(&extremal_pk_bytes).map(|entry| {
            let pk = key::decode_to_value(&extremal_pk_bytes, col_types[0]);
            decode_full_row(col_types, &pk, entry)[constraint.column].clone()
        })
    })?;
    let Some(extremal_col_value) = extremal_col_value else {
        return Ok(());
    };
    let candidate_key = key::encode(&candidate_row[constraint.column]);
    let extremal_key = key::encode(&extremal_col_value);
    let cmp = key::compare(&candidate_key, &extremal_key);
    let violates = if ascending {
        cmp != std::cmp::Ordering::Greater
    } else {
        cmp != std::cmp::Ordering::Less
    };
    if violates {
        return Err(EngineError::constraint(format!(
            "column {} must stay {} index {:?}",
            constraint.column,
            if ascending { "ascending relative to" } else { "descending relative to" },
            constraint.index
        )));
    }
    Ok(())
}

fn sum_index_bytes(catalog: &Catalog, indexes: &[(IndexId, usize)]) -> Result<usize> {
    let mut total = 0;
    for &(id, _) in indexes {
        total += catalog.with_index(id, |ix| ix.tree.read().msize())?;
    }
    Ok(total)
}

/// INSERT/REPLACE for one tuple. Multi-tuple `INSERT ... VALUES (…) (…)` is a
/// loop over this at the C7 layer, one call per tuple, matching `alsosql.c`'s `insertParse` loop
/// over `insertCommit`.
pub fn insert_or_replace(
    catalog: &Catalog,
    table: TableId,
    column_list: Option<&[usize]>,
    values: Vec<Value>,
    mode: &InsertMode,
) -> Result<InsertResult> {
    let meta = snapshot_table_meta(catalog, table)?;

    if let (Some(list), Some(lru)) = (column_list, meta.lru_column) {
        if list.contains(&lru) {
            return Ok(InsertResult::LruWrite);
        }
    }
    if meta.is_narrow {
        if let Some(list) = column_list {
            if list.len() != meta.columns.len() {
                return Ok(InsertResult::NarrowColumnMismatch);
            }
        }
    }

    let ordered = match reorder_tuple(&meta.columns, column_list, values) {
        Ok(v) => v,
        Err(()) => return Ok(InsertResult::ColumnMismatch),
    };
    let pk = ordered[0].clone();
    let pk_bytes = key::encode(&pk).to_vec();

    let existing = catalog.with_table(table, |t| t.data.read().find(&pk_bytes).cloned())?;

    match (&existing, mode) {
        (Some(_), InsertMode::Insert) => return Ok(InsertResult::Overwrite),
        (Some(_), InsertMode::OnDuplicateUpdate(set_items)) => {
            let outcome = update_single_pk(catalog, table, &meta, set_items, &pk)?;
            return Ok(InsertResult::UpdatedViaOnDuplicate(outcome));
        }
        _ => {}
    }

    if let Some(constraint) = meta.ordering_constraint {
        check_ordering_constraint(catalog, table, &meta.columns, constraint, &ordered)?;
    }

    let new_entry = build_entry(meta.is_narrow, &ordered[1..]);
    let row_size = new_entry.size();
    let indexes = catalog.index_columns(&meta.secondary_indexes);

    // add-before-delete: a reader must never see the row missing from an index
    // it should be in, even transiently.
    index_maint::add_all(catalog, &indexes, &pk, |col| ordered[col].clone())?;
    if let Some(old_entry) = &existing {
        let old_row = decode_full_row(&meta.columns, &pk, old_entry);
        index_maint::delete_all(catalog, &indexes, &pk, |col| old_row[col].clone())?;
    }

    catalog.with_table(table, |t| {
        let mut tree = t.data.write();
        if existing.is_some() {
            tree.delete(&pk_bytes);
        }
        tree.insert(pk_bytes.clone(), new_entry);
        if existing.is_none() {
            t.observe_auto_increment(&pk);
        }
    })?;
    catalog.bump_dirty();

    let (table_msize, table_dsize) = catalog.with_table(table, |t| {
        let tree = t.data.read();
        (tree.msize(), tree.dsize())
    })?;
    let index_bytes = sum_index_bytes(catalog, &indexes)?;
    Ok(InsertResult::Inserted(InsertOutcome { row_size, table_msize, table_dsize, index_bytes }))
}

/// UPDATE. Routes on `predicate`: a single-PK equality updates in place here, a
/// range/FK/IN predicate hands off to the external range executor (unless the SET list also
/// touches the PK, which is always rejected — `update_pk_range_query` — since a range update
/// could collide many rows onto one PK).
pub fn update(
    catalog: &Catalog,
    table: TableId,
    set_items: &[SetItem],
    predicate: WherePredicate,
    range_executor: &dyn RangeExecutor,
) -> Result<UpdateResult> {
    let meta = snapshot_table_meta(catalog, table)?;
    if let Some(lru) = meta.lru_column {
        if set_items.iter().any(|s| s.column == lru) {
            return Ok(UpdateResult::LruWrite);
        }
    }
    let pkupc = set_items.iter().any(|s| s.column == 0);

    match predicate {
        WherePredicate::Range { index } => {
            if pkupc {
                return Ok(UpdateResult::PkRangeUpdate);
            }
            let Some(index) = index else {
                return Err(EngineError::plan("no index satisfies this predicate"));
            };
            let outcome = range_executor.update(table, index, set_items)?;
            Ok(UpdateResult::Updated(outcome))
        }
        WherePredicate::SinglePk(pk) => update_single_pk(catalog, table, &meta, set_items, &pk),
    }
}

/// The single-PK UPDATE body, shared between a standalone `UPDATE ... WHERE pk = x` and an
/// `INSERT ... ON DUPLICATE KEY UPDATE` re-entry. The re-entry hands in the already-extracted PK
/// rather than this function re-deriving it, so the PK is never re-parsed or re-validated from
/// the tuple a second time.
fn update_single_pk(
    catalog: &Catalog,
    table: TableId,
    meta: &TableMeta,
    set_items: &[SetItem],
    pk: &Value,
) -> Result<UpdateResult> {
    let pk_bytes = key::encode(pk).to_vec();

    if let Some(item) = set_items.iter().find(|s| s.column == 0) {
        let new_pk = match &item.value {
            SetValue::Literal(v) => v.clone(),
            SetValue::Expr(_) => {
                return Err(EngineError::domain("the primary key column cannot be set via an expression"))
            }
        };
        let new_pk_bytes = key::encode(&new_pk).to_vec();
        if new_pk_bytes != pk_bytes {
            let collides = catalog.with_table(table, |t| t.data.read().contains_key(&new_pk_bytes))?;
            if collides {
                return Ok(UpdateResult::PkOverwrite);
            }
        }
    }

    let old_entry = catalog.with_table(table, |t| t.data.read().find(&pk_bytes).cloned())?;
    let Some(old_entry) = old_entry else {
        return Ok(UpdateResult::NoMatch);
    };
    let old_row = decode_full_row(&meta.columns, pk, &old_entry);

    let mut new_row = old_row.clone();
    for item in set_items {
        new_row[item.column] = match &item.value {
            SetValue::Literal(v) => v.clone(),
            SetValue::Expr(e) => eval_expr(e, &old_row)?,
        };
    }
    let new_pk = new_row[0].clone();
    let new_pk_bytes = key::encode(&new_pk).to_vec();

    let hit_cols: HashSet<usize> = set_items.iter().map(|s| s.column).collect();
    let indexes = catalog.index_columns(&meta.secondary_indexes);
    for &(index_id, column) in &indexes {
        if hit_cols.contains(&column) || column == 0 {
            index_maint::delete(catalog, index_id, &old_row[column], pk)?;
            index_maint::add(catalog, index_id, &new_row[column], &new_pk)?;
        }
    }

    let new_entry = build_entry(meta.is_narrow, &new_row[1..]);
    let row_size = new_entry.size();
    catalog.with_table(table, |t| {
        let mut tree = t.data.write();
        tree.delete(&pk_bytes);
        tree.insert(new_pk_bytes, new_entry);
    })?;
    catalog.bump_dirty();
    Ok(UpdateResult::Updated(UpdateOutcome { row_size }))
}

fn eval_expr(expr: &Expr, old_row: &[Value]) -> Result<Value> {
    match expr {
        Expr::Add(col, lit) => arith(&old_row[*col], lit, i64::checked_add),
        Expr::Sub(col, lit) => arith(&old_row[*col], lit, i64::checked_sub),
    }
}

fn arith(a: &Value, b: &Value, op: fn(i64, i64) -> Option<i64>) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(checked_u32(op, *x, *y)?)),
        (Value::Long(x), Value::Long(y)) => Ok(Value::Long(checked_u32(op, *x, *y)?)),
        (Value::Float(x), Value::Float(y)) => {
            let fy = if op(1, 0) == Some(1) { *y } else { -*y };
            Ok(Value::Float(x + fy))
        }
        _ => Err(EngineError::domain("expression operands must share the column's declared type")),
    }
}

fn checked_u32(op: fn(i64, i64) -> Option<i64>, x: u32, y: u32) -> Result<u32> {
    let r = op(x as i64, y as i64).ok_or_else(|| EngineError::ValueTooLarge("expression overflowed".into()))?;
    if r < 0 || r as u64 >= crate::config::TWO_POW_32 {
        return Err(EngineError::ValueTooLarge(format!("expression result {r} is out of range")));
    }
    Ok(r as u32)
}

/// DELETE. Single-PK path removes from every secondary index before the data
/// tree; range path delegates.
pub fn delete(
    catalog: &Catalog,
    table: TableId,
    predicate: WherePredicate,
    range_executor: &dyn RangeExecutor,
) -> Result<DeleteResult> {
    match predicate {
        WherePredicate::Range { index } => {
            let Some(index) = index else {
                return Err(EngineError::plan("no index satisfies this predicate"));
            };
            Ok(if range_executor.delete(table, index)? {
                DeleteResult::Deleted
            } else {
                DeleteResult::NoMatch
            })
        }
        WherePredicate::SinglePk(pk) => {
            let meta = snapshot_table_meta(catalog, table)?;
            let pk_bytes = key::encode(&pk).to_vec();
            let entry = catalog.with_table(table, |t| t.data.read().find(&pk_bytes).cloned())?;
            let Some(entry) = entry else {
                return Ok(DeleteResult::NoMatch);
            };
            let row = decode_full_row(&meta.columns, &pk, &entry);
            let indexes = catalog.index_columns(&meta.secondary_indexes);
            index_maint::delete_all(catalog, &indexes, &pk, |col| row[col].clone())?;
            catalog.with_table(table, |t| {
                t.data.write().delete(&pk_bytes);
            })?;
            catalog.bump_dirty();
            Ok(DeleteResult::Deleted)
        }
    }
}

/// SELECT, single-point path only; a range predicate delegates. `on_lru_touch` is
/// called when the LRU column is in the projection (or the whole row is projected) — the actual
/// LRU maintenance is an external collaborator this crate only signals the call
/// site for.
pub fn select(
    catalog: &Catalog,
    table: TableId,
    predicate: WherePredicate,
    projection: Option<&[usize]>,
    range_executor: &dyn RangeExecutor,
    mut on_lru_touch: impl FnMut(),
) -> Result<SelectResult> {
    match predicate {
        WherePredicate::Range { index } => {
            let Some(index) = index else {
                return Err(EngineError::plan("no index satisfies this predicate"));
            };
            Ok(match range_executor.select(table, index)? {
                Some(row) => SelectResult::Row(row),
                None => SelectResult::Null,
            })
        }
        WherePredicate::SinglePk(pk) => {
            let meta = snapshot_table_meta(catalog, table)?;
            let pk_bytes = key::encode(&pk).to_vec();
            let entry = catalog.with_table(table, |t| t.data.read().find(&pk_bytes).cloned())?;
            let Some(entry) = entry else {
                return Ok(SelectResult::Null);
            };
            let row = decode_full_row(&meta.columns, &pk, &entry);
            let touch = match (meta.lru_column, projection) {
                (Some(lru), Some(cols)) => cols.contains(&lru),
                (Some(_), None) => true,
                (None, _) => false,
            };
            if touch {
                on_lru_touch();
            }
            let out = match projection {
                Some(cols) => cols.iter().map(|&c| row[c].clone()).collect(),
                None => row,
            };
            Ok(SelectResult::Row(out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnDescriptor;

    fn table_t(cat: &Catalog) -> TableId {
        cat.create_table(
            "t",
            vec![
                ColumnDescriptor { name: "pk".into(), ty: ColumnType::Int },
                ColumnDescriptor { name: "v".into(), ty: ColumnType::Int },
            ],
            None,
        )
        .unwrap()
    }

    fn insert_row(cat: &Catalog, t: TableId, pk: i64, v: i64, mode: InsertMode) -> InsertResult {
        insert_or_replace(cat, t, None, vec![Value::Int(pk as u32), Value::Int(v as u32)], &mode).unwrap()
    }

    // Scenario 1: overwrite-then-replace-then-select.
    #[test]
    fn scenario_insert_overwrite_replace_select() {
        let cat = Catalog::new();
        let t = table_t(&cat);
        assert!(matches!(insert_row(&cat, t, 1, 10, InsertMode::Insert), InsertResult::Inserted(_)));
        assert!(matches!(insert_row(&cat, t, 1, 20, InsertMode::Insert), InsertResult::Overwrite));
        assert!(matches!(insert_row(&cat, t, 1, 20, InsertMode::Replace), InsertResult::Inserted(_)));
        let got = select(
            &cat,
            t,
            WherePredicate::SinglePk(Value::Int(1)),
            Some(&[1]),
            &UnimplementedRangeExecutor,
            || {},
        )
        .unwrap();
        match got {
            SelectResult::Row(r) => assert_eq!(r, vec![Value::Int(20)]),
            SelectResult::Null => panic!("expected a row"),
        }
    }

    // Scenario 2: secondary index stays consistent across inserts and deletes.
    #[test]
    fn scenario_secondary_index_consistency() {
        let cat = Catalog::new();
        let u = cat
            .create_table(
                "u",
                vec![
                    ColumnDescriptor { name: "pk".into(), ty: ColumnType::Int },
                    ColumnDescriptor { name: "x".into(), ty: ColumnType::Int },
                ],
                None,
            )
            .unwrap();
        let ix = cat.create_index("u_x", u, 1, true).unwrap();
        insert_row(&cat, u, 1, 100, InsertMode::Insert);
        insert_row(&cat, u, 2, 100, InsertMode::Insert);
        insert_row(&cat, u, 3, 200, InsertMode::Insert);
        cat.with_index(ix, |d| {
            assert_eq!(d.tree.read().find(&key::encode(&Value::Int(100))).unwrap().len(), 2);
            assert_eq!(d.tree.read().find(&key::encode(&Value::Int(200))).unwrap().len(), 1);
        })
        .unwrap();

        assert!(matches!(
            delete(&cat, u, WherePredicate::SinglePk(Value::Int(1)), &UnimplementedRangeExecutor).unwrap(),
            DeleteResult::Deleted
        ));
        cat.with_index(ix, |d| {
            assert_eq!(d.tree.read().find(&key::encode(&Value::Int(100))).unwrap().len(), 1);
        })
        .unwrap();

        assert!(matches!(
            delete(&cat, u, WherePredicate::SinglePk(Value::Int(2)), &UnimplementedRangeExecutor).unwrap(),
            DeleteResult::Deleted
        ));
        cat.with_index(ix, |d| {
            assert!(d.tree.read().find(&key::encode(&Value::Int(100))).is_none());
            assert!(d.tree.read().find(&key::encode(&Value::Int(200))).is_some());
        })
        .unwrap();
    }

    // Scenario 3: ordering constraint.
    #[test]
    fn scenario_ordering_constraint() {
        let cat = Catalog::new();
        let w = cat
            .create_table(
                "w",
                vec![
                    ColumnDescriptor { name: "pk".into(), ty: ColumnType::Int },
                    ColumnDescriptor { name: "t".into(), ty: ColumnType::Int },
                ],
                None,
            )
            .unwrap();
        let ix = cat.create_index("w_t", w, 1, true).unwrap();
        cat.declare_ordering_constraint(w, 1, ix).unwrap();

        assert!(matches!(insert_row(&cat, w, 1, 5, InsertMode::Insert), InsertResult::Inserted(_)));
        assert!(matches!(insert_row(&cat, w, 2, 10, InsertMode::Insert), InsertResult::Inserted(_)));
        let err = insert_or_replace(&cat, w, None, vec![Value::Int(3), Value::Int(10)], &InsertMode::Insert);
        assert!(matches!(err, Err(EngineError::ConstraintViolation(_))));
        assert!(matches!(insert_row(&cat, w, 4, 11, InsertMode::Insert), InsertResult::Inserted(_)));
    }

    // Scenario 4: INSERT ... ON DUPLICATE KEY UPDATE.
    #[test]
    fn scenario_on_duplicate_key_update() {
        let cat = Catalog::new();
        let t = table_t(&cat);
        let set = vec![SetItem { column: 1, value: SetValue::Literal(Value::Int(99)) }];
        let first = insert_or_replace(
            &cat,
            t,
            None,
            vec![Value::Int(1), Value::Int(10)],
            &InsertMode::OnDuplicateUpdate(set.clone()),
        )
        .unwrap();
        assert!(matches!(first, InsertResult::Inserted(_)));
        let second = insert_or_replace(
            &cat,
            t,
            None,
            vec![Value::Int(1), Value::Int(10)],
            &InsertMode::OnDuplicateUpdate(set),
        )
        .unwrap();
        assert!(matches!(second, InsertResult::UpdatedViaOnDuplicate(_)));
        let got = select(&cat, t, WherePredicate::SinglePk(Value::Int(1)), Some(&[1]), &UnimplementedRangeExecutor, || {})
            .unwrap();
        match got {
            SelectResult::Row(r) => assert_eq!(r, vec![Value::Int(99)]),
            SelectResult::Null => panic!("expected a row"),
        }
    }

    // Scenario 5: UPDATE pk=1 WHERE pk=2 collides with an existing row.
    #[test]
    fn scenario_update_pk_overwrite() {
        let cat = Catalog::new();
        let t = table_t(&cat);
        insert_row(&cat, t, 1, 10, InsertMode::Insert);
        insert_row(&cat, t, 2, 20, InsertMode::Insert);
        let set = vec![SetItem { column: 0, value: SetValue::Literal(Value::Int(1)) }];
        let result = update(
            &cat,
            t,
            &set,
            WherePredicate::SinglePk(Value::Int(2)),
            &UnimplementedRangeExecutor,
        )
        .unwrap();
        assert!(matches!(result, UpdateResult::PkOverwrite));
        let got = select(&cat, t, WherePredicate::SinglePk(Value::Int(2)), Some(&[1]), &UnimplementedRangeExecutor, || {})
            .unwrap();
        match got {
            SelectResult::Row(r) => assert_eq!(r, vec![Value::Int(20)]),
            SelectResult::Null => panic!("row 2 should be unchanged"),
        }
    }

    #[test]
    fn delete_missing_row_reports_no_match() {
        let cat = Catalog::new();
        let t = table_t(&cat);
        let result = delete(&cat, t, WherePredicate::SinglePk(Value::Int(42)), &UnimplementedRangeExecutor).unwrap();
        assert!(matches!(result, DeleteResult::NoMatch));
    }

    #[test]
    fn update_via_expression_adds_to_old_value() {
        let cat = Catalog::new();
        let t = table_t(&cat);
        insert_row(&cat, t, 1, 10, InsertMode::Insert);
        let set = vec![SetItem { column: 1, value: SetValue::Expr(Expr::Add(1, Value::Int(5))) }];
        let result = update(&cat, t, &set, WherePredicate::SinglePk(Value::Int(1)), &UnimplementedRangeExecutor).unwrap();
        assert!(matches!(result, UpdateResult::Updated(_)));
        let got = select(&cat, t, WherePredicate::SinglePk(Value::Int(1)), Some(&[1]), &UnimplementedRangeExecutor, || {})
            .unwrap();
        match got {
            SelectResult::Row(r) => assert_eq!(r, vec![Value::Int(15)]),
            SelectResult::Null => panic!("expected a row"),
        }
    }

    #[test]
    fn range_predicate_without_index_is_plan_error() {
        let cat = Catalog::new();
        let t = table_t(&cat);
        let err = delete(&cat, t, WherePredicate::Range { index: None }, &UnimplementedRangeExecutor);
        assert!(matches!(err, Err(EngineError::PlanError(_))));
    }

    #[test]
    fn lru_column_rejected_on_insert_and_update() {
        let cat = Catalog::new();
        let t = cat
            .create_table(
                "lru_t",
                vec![
                    ColumnDescriptor { name: "pk".into(), ty: ColumnType::Int },
                    ColumnDescriptor { name: "last_used".into(), ty: ColumnType::Int },
                ],
                Some(1),
            )
            .unwrap();
        let r = insert_or_replace(&cat, t, Some(&[0, 1]), vec![Value::Int(1), Value::Int(7)], &InsertMode::Insert)
            .unwrap();
        assert!(matches!(r, InsertResult::LruWrite));
        let set = vec![SetItem { column: 1, value: SetValue::Literal(Value::Int(9)) }];
        let r2 = update(&cat, t, &set, WherePredicate::SinglePk(Value::Int(1)), &UnimplementedRangeExecutor).unwrap();
        assert!(matches!(r2, UpdateResult::LruWrite));
    }

    #[test]
    fn return_size_reply_reports_row_and_btree_bytes() {
        let cat = Catalog::new();
        let t = table_t(&cat);
        let r = insert_or_replace(&cat, t, None, vec![Value::Int(1), Value::Int(10)], &InsertMode::Insert).unwrap();
        match r {
            InsertResult::Inserted(outcome) => {
                assert!(outcome.row_size > 0);
                assert!(outcome.table_msize >= outcome.table_dsize);
                assert_eq!(outcome.index_bytes, 0);
            }
            _ => panic!("expected Inserted"),
        }
    }
}
