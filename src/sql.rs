//! SQL front-end (C7): argument-vector validation and reply assembly over the single-row
//! mutator (C6).
//!
//! The command dispatcher (an external collaborator) hands this module a
//! pre-tokenized argument vector — it does not lex quotes or parenthesis nesting. A tuple or
//! column list token is the literal comma-separated text between one matched pair of parens,
//! e.g. `"(1,10)"` or `"(pk,v)"`; this module only has to strip the parens and split on `,`.
//! The where-clause, expression and column-list parsers for UPDATE/DELETE/SELECT predicates are
//! likewise external: those commands take an already-built
//! [`WherePredicate`]/[`SetItem`] list rather than raw text, mirroring `alsosql.c`'s
//! `updateCommand`/`deleteCommand`/`sqlSelectCommand` calling into already-parsed `robj`s.
//!
//! Grounded on `alsosql.c`'s `insertParse`/`insertAction`/`explainCommand`/`sqlSelectCommand`/
//! `deleteCommand`/`updateCommand`.

use crate::catalog::{Catalog, TableId};
use crate::error::{EngineError, Result};
use crate::key::{ColumnType, Value};
use crate::mutator::{
    self, DeleteResult, InsertMode, InsertResult, RangeExecutor, SelectResult, SetItem, UpdateResult,
    WherePredicate,
};

/// The fixed reply vocabulary. `insert_ovrwrt`/`update_pk_overwrite`/etc. are
/// outcomes, not failures — they are exactly as "successful" a command conclusion as `ok`, just
/// one the caller needs to distinguish. Genuine failures surface as `Err(EngineError)` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok,
    /// One row affected (UPDATE/DELETE).
    Cone,
    /// Zero rows affected (UPDATE/DELETE).
    Czero,
    SingleRow(Vec<Value>),
    NullBulk,
    InsertOvrwrt,
    InsertColumn,
    InsertLru,
    UpdateLru,
    InsertReplaceUpdate,
    UpdatePkOverwrite,
    UpdatePkRangeQuery,
    RangeQueryIndexNotFound,
    ConstraintViol,
    UintPkBig,
    PartInsertOther,
    /// `addRowSizeReply`'s four-number shape: row bytes, table B-tree `msize`, table B-tree
    /// `dsize`, total secondary-index bytes.
    ReturnSize { row_bytes: usize, table_msize: usize, table_dsize: usize, index_bytes: usize },
}

fn strip_parens(tok: &str) -> Result<&str> {
    let tok = tok.trim();
    tok.strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| EngineError::syntax(format!("expected a parenthesized list, got '{tok}'")))
}

fn split_list(tok: &str) -> Vec<&str> {
    tok.split(',').map(|s| s.trim()).collect()
}

fn parse_tuple(col_types: &[ColumnType], tok: &str) -> Result<Vec<Value>> {
    let parts = split_list(strip_parens(tok)?);
    if parts.len() != col_types.len() {
        return Err(EngineError::syntax(format!(
            "tuple has {} values, table has {} columns",
            parts.len(),
            col_types.len()
        )));
    }
    parts
        .into_iter()
        .zip(col_types.iter())
        .map(|(text, ty)| parse_value(text, *ty))
        .collect()
}

fn parse_value(text: &str, ty: ColumnType) -> Result<Value> {
    match ty {
        ColumnType::Str => Ok(Value::Str(text.trim_matches('\'').trim_matches('"').to_string())),
        ColumnType::Float => text
            .parse::<f32>()
            .map(Value::Float)
            .map_err(|_| EngineError::domain(format!("'{text}' is not a valid float"))),
        ColumnType::Int | ColumnType::Long => Value::parse_int_like(text, ty),
    }
}

/// Parses a `(c1,c2,...)` column-list token into 0-based column indices, per the table's
/// declared column names.
fn parse_column_list(catalog: &Catalog, table: TableId, tok: &str) -> Result<Vec<usize>> {
    let names = split_list(strip_parens(tok)?);
    catalog.with_table(table, |t| {
        names
            .iter()
            .map(|n| t.column_index(n).ok_or_else(|| EngineError::catalog_miss(format!("no such column '{n}'"))))
            .collect::<Result<Vec<usize>>>()
    })?
}

/// `INTO → table → [( col_list )] → VALUES → tuple+ → [RETURN SIZE] → [ON DUP…] → END`.
/// Returns one reply per tuple in `VALUES`, in order; a tuple that fails its
/// own check reports its own reply without aborting the remaining tuples, matching
/// `insertParse`'s per-tuple loop over `insertCommit`.
pub fn insert_command(catalog: &Catalog, argv: &[&str], replace: bool) -> Result<Vec<Reply>> {
    let mut pos = 0;
    let next = |pos: &mut usize| -> Result<&str> {
        let tok = argv.get(*pos).copied().ok_or_else(|| EngineError::syntax("unexpected end of INSERT argv"))?;
        *pos += 1;
        Ok(tok)
    };

    if next(&mut pos)?.to_ascii_uppercase() != "INTO" {
        return Err(EngineError::syntax("INSERT/REPLACE must start with INTO"));
    }
    let table_name = next(&mut pos)?;
    let table = catalog
        .table_id(table_name)
        .ok_or_else(|| EngineError::catalog_miss(format!("no such table '{table_name}'")))?;

    let mut column_list = None;
    if argv.get(pos).map(|t| t.starts_with('(')).unwrap_or(false) {
        column_list = Some(parse_column_list(catalog, table, next(&mut pos)?)?);
    }

    if next(&mut pos)?.to_ascii_uppercase() != "VALUES" {
        return Err(EngineError::syntax("expected VALUES"));
    }

    let all_col_types = catalog.with_table(table, |t| t.columns.iter().map(|c| c.ty).collect::<Vec<_>>())?;
    let tuple_col_types: Vec<ColumnType> = match &column_list {
        Some(list) => list.iter().map(|&i| all_col_types[i]).collect(),
        None => all_col_types.clone(),
    };
    let mut tuples = Vec::new();
    while argv.get(pos).map(|t| t.starts_with('(')).unwrap_or(false) {
        tuples.push(parse_tuple(&tuple_col_types, next(&mut pos)?)?);
    }
    if tuples.is_empty() {
        return Err(EngineError::syntax("INSERT/REPLACE needs at least one tuple"));
    }

    let mut return_size = false;
    if argv.get(pos).map(|t| t.eq_ignore_ascii_case("RETURN")).unwrap_or(false) {
        pos += 1;
        if next(&mut pos)?.to_ascii_uppercase() != "SIZE" {
            return Err(EngineError::syntax("expected SIZE after RETURN"));
        }
        return_size = true;
    }

    let mut on_duplicate_update = None;
    if argv.get(pos).map(|t| t.eq_ignore_ascii_case("ON")).unwrap_or(false) {
        pos += 1;
        for kw in ["DUPLICATE", "KEY", "UPDATE"] {
            if next(&mut pos)?.to_ascii_uppercase() != kw {
                return Err(EngineError::syntax(format!("expected {kw} in ON DUPLICATE KEY UPDATE")));
            }
        }
        on_duplicate_update = Some(parse_set_list(catalog, table, next(&mut pos)?)?);
    }

    if replace && on_duplicate_update.is_some() {
        return Ok(vec![Reply::InsertReplaceUpdate]);
    }

    let mode_for = |set_items: &Option<Vec<SetItem>>| -> InsertMode {
        match set_items {
            Some(_) if replace => unreachable!("rejected above"),
            Some(items) => InsertMode::OnDuplicateUpdate(clone_set_items(items)),
            None if replace => InsertMode::Replace,
            None => InsertMode::Insert,
        }
    };

    let mut replies = Vec::with_capacity(tuples.len());
    for values in tuples {
        let mode = mode_for(&on_duplicate_update);
        let result = mutator::insert_or_replace(catalog, table, column_list.as_deref(), values, &mode);
        let reply = match result {
            Ok(InsertResult::Inserted(outcome)) => {
                if return_size {
                    Reply::ReturnSize {
                        row_bytes: outcome.row_size,
                        table_msize: outcome.table_msize,
                        table_dsize: outcome.table_dsize,
                        index_bytes: outcome.index_bytes,
                    }
                } else {
                    Reply::Ok
                }
            }
            Ok(InsertResult::UpdatedViaOnDuplicate(_)) => Reply::Cone,
            Ok(InsertResult::Overwrite) => Reply::InsertOvrwrt,
            Ok(InsertResult::ColumnMismatch) => Reply::InsertColumn,
            Ok(InsertResult::NarrowColumnMismatch) => Reply::PartInsertOther,
            Ok(InsertResult::LruWrite) => Reply::InsertLru,
            Err(EngineError::ValueTooLarge(_)) => Reply::UintPkBig,
            Err(EngineError::ConstraintViolation(_)) => Reply::ConstraintViol,
            Err(other) => return Err(other),
        };
        replies.push(reply);
    }
    Ok(replies)
}

fn clone_set_items(items: &[SetItem]) -> Vec<SetItem> {
    items
        .iter()
        .map(|i| SetItem {
            column: i.column,
            value: match &i.value {
                mutator::SetValue::Literal(v) => mutator::SetValue::Literal(v.clone()),
                mutator::SetValue::Expr(mutator::Expr::Add(c, v)) => {
                    mutator::SetValue::Expr(mutator::Expr::Add(*c, v.clone()))
                }
                mutator::SetValue::Expr(mutator::Expr::Sub(c, v)) => {
                    mutator::SetValue::Expr(mutator::Expr::Sub(*c, v.clone()))
                }
            },
        })
        .collect()
}

/// Parses a `col=expr,col=expr` token into [`SetItem`]s. Only literal assignment and `col+lit`/
/// `col-lit` are recognized — a general expression grammar is the expression parser's job,
/// an external collaborator.
fn parse_set_list(catalog: &Catalog, table: TableId, tok: &str) -> Result<Vec<SetItem>> {
    let col_types = catalog.with_table(table, |t| t.columns.iter().map(|c| c.ty).collect::<Vec<_>>())?;
    split_list(tok)
        .into_iter()
        .map(|assign| {
            let (col_name, rhs) = assign
                .split_once('=')
                .ok_or_else(|| EngineError::syntax(format!("expected col=value in '{assign}'")))?;
            let column = catalog
                .with_table(table, |t| t.column_index(col_name.trim()))?
                .ok_or_else(|| EngineError::catalog_miss(format!("no such column '{col_name}'")))?;
            let ty = col_types[column];
            let rhs = rhs.trim();
            let value = if let Some(rest) = rhs.strip_prefix(&format!("{}+", col_name.trim())) {
                mutator::SetValue::Expr(mutator::Expr::Add(column, parse_value(rest, ty)?))
            } else if let Some(rest) = rhs.strip_prefix(&format!("{}-", col_name.trim())) {
                mutator::SetValue::Expr(mutator::Expr::Sub(column, parse_value(rest, ty)?))
            } else {
                mutator::SetValue::Literal(parse_value(rhs, ty)?)
            };
            Ok(SetItem { column, value })
        })
        .collect()
}

/// UPDATE: the where-clause is already reduced to a [`WherePredicate`] by its external parser.
pub fn update_command(
    catalog: &Catalog,
    table: TableId,
    set_items: &[SetItem],
    predicate: WherePredicate,
    range_executor: &dyn RangeExecutor,
) -> Result<Reply> {
    match mutator::update(catalog, table, set_items, predicate, range_executor)? {
        UpdateResult::Updated(_) => Ok(Reply::Cone),
        UpdateResult::NoMatch => Ok(Reply::Czero),
        UpdateResult::PkOverwrite => Ok(Reply::UpdatePkOverwrite),
        UpdateResult::PkRangeUpdate => Ok(Reply::UpdatePkRangeQuery),
        UpdateResult::LruWrite => Ok(Reply::UpdateLru),
    }
}

pub fn delete_command(
    catalog: &Catalog,
    table: TableId,
    predicate: WherePredicate,
    range_executor: &dyn RangeExecutor,
) -> Result<Reply> {
    match mutator::delete(catalog, table, predicate, range_executor) {
        Ok(DeleteResult::Deleted) => Ok(Reply::Cone),
        Ok(DeleteResult::NoMatch) => Ok(Reply::Czero),
        Err(EngineError::PlanError(_)) => Ok(Reply::RangeQueryIndexNotFound),
        Err(other) => Err(other),
    }
}

pub fn select_command(
    catalog: &Catalog,
    table: TableId,
    predicate: WherePredicate,
    projection: Option<&[usize]>,
    range_executor: &dyn RangeExecutor,
    on_lru_touch: impl FnMut(),
) -> Result<Reply> {
    match mutator::select(catalog, table, predicate, projection, range_executor, on_lru_touch) {
        Ok(SelectResult::Row(row)) => Ok(Reply::SingleRow(row)),
        Ok(SelectResult::Null) => Ok(Reply::NullBulk),
        Err(EngineError::PlanError(_)) => Ok(Reply::RangeQueryIndexNotFound),
        Err(other) => Err(other),
    }
}

/// EXPLAIN shifts argv by one and re-dispatches SCAN or SELECT with an explain flag; the
/// single-point path never executes anything for it — only the range executor acts on the flag.
/// This crate has no range executor of its own, so this is a pass-through: the
/// caller re-dispatches the returned (shorter) argv to whichever command it names.
pub fn explain_shift<'a>(argv: &'a [&'a str]) -> Result<&'a [&'a str]> {
    argv.split_first().map(|(_, rest)| rest).ok_or_else(|| EngineError::syntax("EXPLAIN needs a command to explain"))
}
