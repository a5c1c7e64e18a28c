//! Secondary-index maintenance (C5): keeps every secondary index's nested B-tree of primary
//! keys in sync with the row it indexes.
//!
//! Each index entry's value is itself a [`NestedBTree`] of primary keys, created the moment the
//! first row carrying that indexed value is added, and destroyed the moment the last one is
//! removed (every nested B-tree stays non-empty). Grounded on `bt.c`'s
//! `btIndAdd`/`btIndFindVal`/`btIndDelete`/`btIndNodeAdd`/`btIndNodeDelete` — this module is the
//! Rust-side fusion of those five C functions into two.

use crate::btree::{BtKind, NestedBTree};
use crate::catalog::{Catalog, IndexId};
use crate::error::Result;
use crate::key::{self, Value};

/// Inserts `pk` into index `index_id`'s nested tree for indexed value `v`, creating the nested
/// tree (and the index's own entry for `v`) if this is the first PK to carry that value.
pub fn add(catalog: &Catalog, index_id: IndexId, v: &Value, pk: &Value) -> Result<()> {
    catalog.with_index(index_id, |ix| {
        let mut tree = ix.tree.write();
        let vkey = key::encode(v);
        if tree.find_mut(&vkey).is_none() {
            tree.insert(vkey.to_vec(), NestedBTree::new(BtKind::IndexNode));
        }
        let nested = tree.find_mut(&key::encode(v)).expect("just inserted");
        nested.insert(key::encode(pk).to_vec(), ());
    })
}

/// Removes `pk` from index `index_id`'s nested tree for indexed value `v`. If that was the
/// nested tree's last entry, the index's own entry for `v` is removed too (I2).
pub fn delete(catalog: &Catalog, index_id: IndexId, v: &Value, pk: &Value) -> Result<()> {
    catalog.with_index(index_id, |ix| {
        let mut tree = ix.tree.write();
        let vkey = key::encode(v);
        let now_empty = match tree.find_mut(&vkey) {
            Some(nested) => {
                nested.delete(&key::encode(pk));
                nested.is_empty()
            }
            None => return,
        };
        if now_empty {
            tree.delete(&vkey);
        }
    })
}

/// Adds `pk` to every index in `indexes`, reading the indexed column's value out of `row_cols`
/// (the non-PK column values, in declared order) via `col_of`. Callers must add before they
/// delete (the add-before-delete rule) to avoid a transient window where a row is
/// invisible to every index that covers it.
pub fn add_all(
    catalog: &Catalog,
    indexes: &[(IndexId, usize)],
    pk: &Value,
    col_value: impl Fn(usize) -> Value,
) -> Result<()> {
    for &(index_id, column) in indexes {
        add(catalog, index_id, &col_value(column), pk)?;
    }
    Ok(())
}

pub fn delete_all(
    catalog: &Catalog,
    indexes: &[(IndexId, usize)],
    pk: &Value,
    col_value: impl Fn(usize) -> Value,
) -> Result<()> {
    for &(index_id, column) in indexes {
        delete(catalog, index_id, &col_value(column), pk)?;
    }
    Ok(())
}
