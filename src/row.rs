//! Row codec (C3): packs a row's non-PK columns into one blob, and the narrow two-column
//! alternative that skips the blob entirely.
//!
//! A blob is the concatenation of each non-PK column's [`key::encode`] bytes, in column order.
//! Because every encoded value already carries its own length (that's the point of C1 being
//! self-describing), `get_col` only has to skip past the columns before the one it wants rather
//! than consult a separate offset table.

use crate::btree::BtEntry;
use crate::key::{self, ColumnType, Value};

/// A table's data B-tree entry: either a packed row blob, or — for a two-column table — the
/// lone non-PK value stored inline with no blob at all.
#[derive(Debug, Clone, PartialEq)]
pub enum TableEntry {
    Blob(Vec<u8>),
    Narrow(Value),
}

impl BtEntry for TableEntry {
    fn payload_size(&self) -> usize {
        match self {
            TableEntry::Blob(b) => b.len(),
            TableEntry::Narrow(v) => key::encode(v).len(),
        }
    }
}

impl TableEntry {
    /// Column `idx` among the non-PK columns (idx 0 is the first non-PK column). Returns
    /// `None` if `idx` is out of range for this entry's shape — in particular, any `idx != 0`
    /// against a `Narrow` entry, which a caller should treat as a malformed request rather than
    /// a bug (an INSERT that names columns inconsistent with a narrow table's single column).
    pub fn get_col(&self, col_types: &[ColumnType], idx: usize) -> Option<Value> {
        match self {
            TableEntry::Blob(blob) => get_col(blob, col_types, idx),
            TableEntry::Narrow(v) => {
                if idx == 0 {
                    Some(v.clone())
                } else {
                    None
                }
            }
        }
    }

    pub fn size(&self) -> usize {
        self.payload_size()
    }
}

/// Packs non-PK column values into one blob, in column order. Never fails: overflow of an
/// integer column is already rejected at the parse boundary ([`Value::parse_int_like`]), so by
/// the time a `Value` reaches here it is guaranteed to fit its wire encoding.
pub fn encode_row(values: &[Value]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in values {
        out.extend_from_slice(&key::encode(v));
    }
    out
}

/// Byte length of a row blob.
pub fn row_size(blob: &[u8]) -> usize {
    blob.len()
}

/// Reads column `idx` (0-based among the blob's own columns, i.e. non-PK columns) out of a
/// packed row blob, walking past each preceding column's encoded bytes. `col_types` must be the
/// non-PK columns' declared types in the same order the blob was built with.
pub fn get_col(blob: &[u8], col_types: &[ColumnType], idx: usize) -> Option<Value> {
    if idx >= col_types.len() {
        return None;
    }
    let mut offset = 0usize;
    for ty in &col_types[..idx] {
        if offset >= blob.len() {
            return None;
        }
        offset += key::skip_to_value(&blob[offset..]);
    }
    if offset >= blob.len() {
        return None;
    }
    Some(key::decode_to_value(&blob[offset..], col_types[idx]))
}

/// Decodes every non-PK column out of a row blob, in order.
pub fn decode_row(blob: &[u8], col_types: &[ColumnType]) -> Vec<Value> {
    let mut offset = 0usize;
    let mut out = Vec::with_capacity(col_types.len());
    for ty in col_types {
        let n = key::skip_to_value(&blob[offset..]);
        out.push(key::decode_to_value(&blob[offset..], *ty));
        offset += n;
    }
    out
}

/// The row codec's default for a column a partial INSERT left unspecified.
pub fn default_value(ty: ColumnType) -> Value {
    match ty {
        ColumnType::Int => Value::Int(0),
        ColumnType::Long => Value::Long(0),
        ColumnType::Float => Value::Float(0.0),
        ColumnType::Str => Value::Str(String::new()),
    }
}
