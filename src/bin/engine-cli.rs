//! Manual-testing harness over one in-process engine instance: reads newline-delimited
//! pseudo-SQL commands from stdin and prints the reply vocabulary to stdout.
//!
//! Grounded on the idea of a thin CLI driver over the library, scaled down to this crate's
//! single engine instance. `CREATE TABLE`/`CREATE INDEX` are not engine commands — they exist
//! here only to exercise the catalog, since table/index setup has no argument-vector grammar of
//! its own.

use std::io::{self, BufRead, Write};

use engine::catalog::{Catalog, ColumnDescriptor, TableId};
use engine::key::{ColumnType, Value};
use engine::mutator::{UnimplementedRangeExecutor, WherePredicate};
use engine::sql::{self, Reply};
use engine::EngineError;

fn main() {
    let catalog = Catalog::new();
    let stdin = io::stdin();
    print!("> ");
    let _ = io::stdout().flush();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let line = line.trim();
        if !line.is_empty() {
            match dispatch(&catalog, line) {
                Ok(text) => println!("{text}"),
                Err(e) => println!("error: {e}"),
            }
        }
        print!("> ");
        let _ = io::stdout().flush();
    }
}

fn dispatch(catalog: &Catalog, line: &str) -> engine::Result<String> {
    let tokens: Vec<&str> = tokenize(line);
    let Some((&head, rest)) = tokens.split_first() else {
        return Err(EngineError::syntax("empty command"));
    };
    match head.to_ascii_uppercase().as_str() {
        "CREATE" => create_command(catalog, rest),
        "INSERT" => Ok(format_replies(sql::insert_command(catalog, rest, false)?)),
        "REPLACE" => Ok(format_replies(sql::insert_command(catalog, rest, true)?)),
        "DELETE" => delete_command(catalog, rest),
        "SELECT" => select_command(catalog, rest),
        "EXPLAIN" => {
            let rest = sql::explain_shift(&tokens)?;
            dispatch(catalog, &rest.join(" "))
        }
        other => Err(EngineError::syntax(format!("unknown command '{other}'"))),
    }
}

/// Splits on whitespace but keeps a parenthesized group (tuple or column list) as one token.
fn tokenize(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && bytes[i] == b' ' {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let start = i;
        if bytes[i] == b'(' {
            let mut depth = 0;
            while i < bytes.len() {
                if bytes[i] == b'(' {
                    depth += 1;
                } else if bytes[i] == b')' {
                    depth -= 1;
                    if depth == 0 {
                        i += 1;
                        break;
                    }
                }
                i += 1;
            }
        } else {
            while i < bytes.len() && bytes[i] != b' ' {
                i += 1;
            }
        }
        out.push(&line[start..i]);
    }
    out
}

fn format_replies(replies: Vec<Reply>) -> String {
    replies.iter().map(format_reply).collect::<Vec<_>>().join("\n")
}

fn format_reply(reply: &Reply) -> String {
    match reply {
        Reply::Ok => "ok".to_string(),
        Reply::Cone => "cone".to_string(),
        Reply::Czero => "czero".to_string(),
        Reply::SingleRow(values) => {
            let cols = values.iter().map(value_text).collect::<Vec<_>>().join(", ");
            format!("singlerow\n{cols}")
        }
        Reply::NullBulk => "nullbulk".to_string(),
        Reply::InsertOvrwrt => "insert_ovrwrt".to_string(),
        Reply::InsertColumn => "insertcolumn".to_string(),
        Reply::InsertLru => "insert_lru".to_string(),
        Reply::UpdateLru => "update_lru".to_string(),
        Reply::InsertReplaceUpdate => "insert_replace_update".to_string(),
        Reply::UpdatePkOverwrite => "update_pk_overwrite".to_string(),
        Reply::UpdatePkRangeQuery => "update_pk_range_query".to_string(),
        Reply::RangeQueryIndexNotFound => "rangequery_index_not_found".to_string(),
        Reply::ConstraintViol => "constraint_viol".to_string(),
        Reply::UintPkBig => "uint_pkbig".to_string(),
        Reply::PartInsertOther => "part_insert_other".to_string(),
        Reply::ReturnSize { row_bytes, table_msize, table_dsize, index_bytes } => {
            format!("{row_bytes} {table_msize} {table_dsize} {index_bytes}")
        }
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::Int(n) | Value::Long(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => s.clone(),
    }
}

fn create_command(catalog: &Catalog, rest: &[&str]) -> engine::Result<String> {
    match rest.first().map(|s| s.to_ascii_uppercase()) {
        Some(kw) if kw == "TABLE" => {
            let name = rest.get(1).ok_or_else(|| EngineError::syntax("CREATE TABLE needs a name"))?;
            let col_list = rest.get(2).ok_or_else(|| EngineError::syntax("CREATE TABLE needs a column list"))?;
            let columns = parse_column_defs(col_list)?;
            catalog.create_table(*name, columns, None)?;
            Ok("ok".into())
        }
        Some(kw) if kw == "INDEX" => {
            // CREATE INDEX name ON table(col) [DESC]
            let name = rest.get(1).ok_or_else(|| EngineError::syntax("CREATE INDEX needs a name"))?;
            if rest.get(2).map(|s| s.to_ascii_uppercase()) != Some("ON".into()) {
                return Err(EngineError::syntax("expected ON in CREATE INDEX"));
            }
            let spec = rest.get(3).ok_or_else(|| EngineError::syntax("CREATE INDEX needs table(col)"))?;
            let (table_name, col_name) = spec
                .split_once('(')
                .and_then(|(t, c)| c.strip_suffix(')').map(|c| (t, c)))
                .ok_or_else(|| EngineError::syntax("expected table(col)"))?;
            let table = catalog
                .table_id(table_name)
                .ok_or_else(|| EngineError::catalog_miss(format!("no such table '{table_name}'")))?;
            let column = catalog
                .with_table(table, |t| t.column_index(col_name))?
                .ok_or_else(|| EngineError::catalog_miss(format!("no such column '{col_name}'")))?;
            let ascending = rest.get(4).map(|s| !s.eq_ignore_ascii_case("DESC")).unwrap_or(true);
            catalog.create_index(*name, table, column, ascending)?;
            Ok("ok".into())
        }
        _ => Err(EngineError::syntax("expected CREATE TABLE or CREATE INDEX")),
    }
}

fn parse_column_defs(tok: &str) -> engine::Result<Vec<ColumnDescriptor>> {
    let inner = tok
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| EngineError::syntax("expected a parenthesized column list"))?;
    inner
        .split(',')
        .map(|col| {
            let mut parts = col.trim().split_whitespace();
            let name = parts.next().ok_or_else(|| EngineError::syntax("empty column definition"))?;
            let ty_text = parts.next().ok_or_else(|| EngineError::syntax("column needs a type"))?;
            let ty = match ty_text.to_ascii_uppercase().as_str() {
                "INT" => ColumnType::Int,
                "LONG" => ColumnType::Long,
                "FLOAT" => ColumnType::Float,
                "STR" | "STRING" | "VARCHAR" => ColumnType::Str,
                other => return Err(EngineError::syntax(format!("unknown column type '{other}'"))),
            };
            Ok(ColumnDescriptor { name: name.to_string(), ty })
        })
        .collect()
}

/// Parses a trailing `WHERE pk=<value>` clause, the only predicate shape this harness builds
/// itself (a full where-clause grammar is the parser's job, an external collaborator).
fn parse_single_pk_where(catalog: &Catalog, table: TableId, rest: &[&str]) -> engine::Result<Value> {
    let where_pos = rest
        .iter()
        .position(|t| t.eq_ignore_ascii_case("WHERE"))
        .ok_or_else(|| EngineError::syntax("expected WHERE pk=<value>"))?;
    let clause = rest.get(where_pos + 1).ok_or_else(|| EngineError::syntax("expected a predicate after WHERE"))?;
    let (col_name, text) = clause
        .split_once('=')
        .ok_or_else(|| EngineError::syntax("expected pk=<value>"))?;
    if col_name.trim() != "pk" {
        return Err(EngineError::syntax("this harness only supports WHERE pk=<value>"));
    }
    let pk_type = catalog.with_table(table, |t| t.pk_type())?;
    match pk_type {
        ColumnType::Str => Ok(Value::Str(text.to_string())),
        ColumnType::Float => text.parse().map(Value::Float).map_err(|_| EngineError::domain("bad float")),
        _ => Value::parse_int_like(text, pk_type),
    }
}

fn delete_command(catalog: &Catalog, rest: &[&str]) -> engine::Result<String> {
    if rest.first().map(|s| s.eq_ignore_ascii_case("FROM")) != Some(true) {
        return Err(EngineError::syntax("expected DELETE FROM table WHERE ..."));
    }
    let table_name = rest.get(1).ok_or_else(|| EngineError::syntax("expected a table name"))?;
    let table = catalog
        .table_id(table_name)
        .ok_or_else(|| EngineError::catalog_miss(format!("no such table '{table_name}'")))?;
    let pk = parse_single_pk_where(catalog, table, rest)?;
    let reply = sql::delete_command(catalog, table, WherePredicate::SinglePk(pk), &UnimplementedRangeExecutor)?;
    Ok(format_reply(&reply))
}

fn select_command(catalog: &Catalog, rest: &[&str]) -> engine::Result<String> {
    let from_pos = rest
        .iter()
        .position(|t| t.eq_ignore_ascii_case("FROM"))
        .ok_or_else(|| EngineError::syntax("expected SELECT cols FROM table WHERE ..."))?;
    let table_name = rest.get(from_pos + 1).ok_or_else(|| EngineError::syntax("expected a table name"))?;
    let table = catalog
        .table_id(table_name)
        .ok_or_else(|| EngineError::catalog_miss(format!("no such table '{table_name}'")))?;
    let cols_text = rest[..from_pos].join("");
    let projection = if cols_text == "*" {
        None
    } else {
        Some(catalog.with_table(table, |t| {
            cols_text
                .split(',')
                .map(|n| t.column_index(n.trim()).ok_or_else(|| EngineError::catalog_miss(format!("no such column '{n}'"))))
                .collect::<engine::Result<Vec<usize>>>()
        })??)
    };
    let pk = parse_single_pk_where(catalog, table, rest)?;
    let reply = sql::select_command(
        catalog,
        table,
        WherePredicate::SinglePk(pk),
        projection.as_deref(),
        &UnimplementedRangeExecutor,
        || {},
    )?;
    Ok(format_reply(&reply))
}
