//! Table/index catalog (C4): process-wide descriptor state plus the live B-trees each
//! descriptor owns.
//!
//! Tables and indexes are appended to bounded arrays and never removed — an id is a plain index
//! into one of those arrays, so once handed out it is valid for the rest of the process's
//! lifetime, by design: a name-keyed map could reuse a slot after a drop, a fixed append-only
//! array never does.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use parking_lot::RwLock;

use crate::btree::{BtKind, NestedBTree};
use crate::config::{MAX_COLUMN_PER_TABLE, MAX_NUM_INDICES, MAX_NUM_TABLES};
use crate::error::{EngineError, Result};
use crate::key::ColumnType;
use crate::row::TableEntry;

pub type TableBTree = crate::btree::BTree<TableEntry>;
pub type IndexBTree = crate::btree::BTree<NestedBTree>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexId(pub usize);

#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub name: String,
    pub ty: ColumnType,
}

/// "Column c must remain monotonic with respect to the value read through `index`."
#[derive(Debug, Clone, Copy)]
pub struct OrderingConstraint {
    pub column: usize,
    pub index: IndexId,
}

pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub lru_column: Option<usize>,
    pub ordering_constraint: Option<OrderingConstraint>,
    pub secondary_indexes: Vec<IndexId>,
    pub virtual_pk_index: IndexId,
    pub data: RwLock<TableBTree>,
    /// High-water mark of INT/LONG primary keys seen by a genuinely new row (INS_INS path
    /// only — never bumped by INS_UP or a no-op). Mirrors `alsosql.c`'s `UPDATE_AUTO_INC`.
    auto_increment: AtomicU64,
}

impl TableDescriptor {
    pub fn pk_type(&self) -> ColumnType {
        self.columns[0].ty
    }

    pub fn non_pk_types(&self) -> Vec<ColumnType> {
        self.columns[1..].iter().map(|c| c.ty).collect()
    }

    pub fn is_narrow(&self) -> bool {
        self.columns.len() == 2
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Bumps the auto-increment high-water mark if `pk` is a larger INT/LONG value than seen
    /// before; a no-op for STRING/FLOAT primary keys.
    pub fn observe_auto_increment(&self, pk: &crate::key::Value) {
        let v = match pk {
            crate::key::Value::Int(v) | crate::key::Value::Long(v) => *v as u64,
            _ => return,
        };
        let mut cur = self.auto_increment.load(AtomicOrdering::Relaxed);
        while v + 1 > cur {
            match self.auto_increment.compare_exchange_weak(
                cur,
                v + 1,
                AtomicOrdering::Relaxed,
                AtomicOrdering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => cur = observed,
            }
        }
    }

    pub fn next_auto_increment(&self) -> u64 {
        self.auto_increment.load(AtomicOrdering::Relaxed)
    }
}

pub struct IndexDescriptor {
    pub name: String,
    pub table: TableId,
    pub column: usize,
    pub ascending: bool,
    pub tree: RwLock<IndexBTree>,
}

struct CatalogInner {
    tables: Vec<TableDescriptor>,
    indexes: Vec<IndexDescriptor>,
}

/// The process-wide catalog handle. Cheap to clone (an `Arc` underneath via the caller), shared
/// across the host process the way a table registry typically is.
pub struct Catalog {
    inner: RwLock<CatalogInner>,
    /// Host-visible monotonic write count: bumped exactly once per committed INSERT/REPLACE/
    /// UPDATE/DELETE, for the host's AOF/RDB layer to observe .
    dirty: AtomicU64,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            inner: RwLock::new(CatalogInner {
                tables: Vec::new(),
                indexes: Vec::new(),
            }),
            dirty: AtomicU64::new(0),
        }
    }

    pub fn bump_dirty(&self) {
        self.dirty.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn dirty(&self) -> u64 {
        self.dirty.load(AtomicOrdering::Relaxed)
    }

    /// Registers a new table with a PK column plus the given non-PK columns, and a virtual
    /// index id standing in for "the table's own PK ordering" so ordering constraints can
    /// reference it uniformly alongside real secondary indexes.
    pub fn create_table(
        &self,
        name: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
        lru_column: Option<usize>,
    ) -> Result<TableId> {
        if columns.is_empty() {
            return Err(EngineError::syntax("a table needs at least a primary key column"));
        }
        if columns.len() > MAX_COLUMN_PER_TABLE {
            return Err(EngineError::ResourceExhausted(format!(
                "table has {} columns, limit is {MAX_COLUMN_PER_TABLE}",
                columns.len()
            )));
        }
        let mut inner = self.inner.write();
        if inner.tables.len() >= MAX_NUM_TABLES {
            return Err(EngineError::ResourceExhausted("catalog is at the table limit".into()));
        }
        let name = name.into();
        if inner.tables.iter().any(|t| t.name == name) {
            return Err(EngineError::conflict(format!("table '{name}' already exists")));
        }
        let virtual_pk_index = IndexId(inner.indexes.len());
        inner.indexes.push(IndexDescriptor {
            name: format!("{name}__pk"),
            table: TableId(inner.tables.len()),
            column: 0,
            ascending: true,
            tree: RwLock::new(IndexBTree::new(BtKind::Index)),
        });
        let id = TableId(inner.tables.len());
        inner.tables.push(TableDescriptor {
            name,
            columns,
            lru_column,
            ordering_constraint: None,
            secondary_indexes: Vec::new(),
            virtual_pk_index,
            data: RwLock::new(TableBTree::new(BtKind::Table)),
            auto_increment: AtomicU64::new(0),
        });
        Ok(id)
    }

    pub fn create_index(
        &self,
        name: impl Into<String>,
        table: TableId,
        column: usize,
        ascending: bool,
    ) -> Result<IndexId> {
        let mut inner = self.inner.write();
        if inner.indexes.len() >= MAX_NUM_INDICES {
            return Err(EngineError::ResourceExhausted("catalog is at the index limit".into()));
        }
        {
            let t = inner
                .tables
                .get(table.0)
                .ok_or_else(|| EngineError::catalog_miss("no such table"))?;
            if column >= t.columns.len() {
                return Err(EngineError::catalog_miss("no such column"));
            }
        }
        let name = name.into();
        if inner.indexes.iter().any(|ix| ix.name == name) {
            return Err(EngineError::conflict(format!("index '{name}' already exists")));
        }
        let id = IndexId(inner.indexes.len());
        inner.indexes.push(IndexDescriptor {
            name,
            table,
            column,
            ascending,
            tree: RwLock::new(IndexBTree::new(BtKind::Index)),
        });
        inner.tables[table.0].secondary_indexes.push(id);
        Ok(id)
    }

    pub fn declare_ordering_constraint(&self, table: TableId, column: usize, index: IndexId) -> Result<()> {
        let mut inner = self.inner.write();
        let t = inner
            .tables
            .get_mut(table.0)
            .ok_or_else(|| EngineError::catalog_miss("no such table"))?;
        if column >= t.columns.len() {
            return Err(EngineError::catalog_miss("no such column"));
        }
        t.ordering_constraint = Some(OrderingConstraint { column, index });
        Ok(())
    }

    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.inner.read().tables.iter().position(|t| t.name == name).map(TableId)
    }

    pub fn index_id(&self, name: &str) -> Option<IndexId> {
        self.inner.read().indexes.iter().position(|ix| ix.name == name).map(IndexId)
    }

    /// Runs `f` with a read lock on the catalog's table list held, handing it the descriptor at
    /// `id`. Kept as a closure-scoped accessor rather than returning a reference so the lock
    /// never outlives one call.
    pub fn with_table<R>(&self, id: TableId, f: impl FnOnce(&TableDescriptor) -> R) -> Result<R> {
        let inner = self.inner.read();
        let t = inner.tables.get(id.0).ok_or_else(|| EngineError::catalog_miss("no such table"))?;
        Ok(f(t))
    }

    pub fn with_index<R>(&self, id: IndexId, f: impl FnOnce(&IndexDescriptor) -> R) -> Result<R> {
        let inner = self.inner.read();
        let ix = inner.indexes.get(id.0).ok_or_else(|| EngineError::catalog_miss("no such index"))?;
        Ok(f(ix))
    }

    /// Target column for each of `ids`, read under a single lock acquisition. Lets the mutator
    /// (C6) learn what every one of a table's secondary indexes is keyed on without nesting a
    /// `with_index` call inside an already-held `with_table` closure.
    pub fn index_columns(&self, ids: &[IndexId]) -> Vec<(IndexId, usize)> {
        let inner = self.inner.read();
        ids.iter()
            .filter_map(|id| inner.indexes.get(id.0).map(|ix| (*id, ix.column)))
            .collect()
    }

    pub fn table_count(&self) -> usize {
        self.inner.read().tables.len()
    }

    pub fn index_count(&self) -> usize {
        self.inner.read().indexes.len()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
