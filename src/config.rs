//! Compile-time tunables for the storage engine.
//!
//! Unlike a disk-backed engine there is no durability knob to expose at runtime here: every
//! value below is a `pub const` fixed at build time, collected in one place the way cache and
//! batching tunables are elsewhere in this codebase, minus a per-deployment `Default`-driven
//! config struct since nothing here varies between deployments.

/// Maximum number of tables the catalog can hold for the lifetime of the process.
pub const MAX_NUM_TABLES: usize = 1024;

/// Maximum number of secondary indexes the catalog can hold for the lifetime of the process.
pub const MAX_NUM_INDICES: usize = 4096;

/// Maximum number of columns in a single table.
pub const MAX_COLUMN_PER_TABLE: usize = 128;

/// Number of keys at which a B-tree transitions from its compact initial allocation to the
/// larger one. Crossing this threshold triggers the drain-into-new-container resize.
pub const TRANSITION_ONE_MAX: usize = 256;

/// Initial node-arena capacity (in entries) a freshly created B-tree is sized for.
pub const TRANSITION_ONE_BYTES: usize = 64;

/// Node-arena capacity (in entries) a B-tree is resized to once it crosses
/// [`TRANSITION_ONE_MAX`] keys.
pub const TRANSITION_TWO_BYTES: usize = 4096;

/// Size of the reusable stack/static key-encode buffer. Encodes that fit spill onto the heap.
pub const SIMKEY_BUFFER_SIZE: usize = 2048;

/// Upper bound (exclusive) of the 7-bit tiny-string length field.
pub const TWO_POW_7: u32 = 1 << 7;

/// Upper bound (exclusive) of the 14-bit inline integer variant.
pub const TWO_POW_14: u32 = 1 << 14;

/// Upper bound (exclusive) of the 28-bit inline integer variant.
pub const TWO_POW_28: u32 = 1 << 28;

/// Upper bound (exclusive) of the full 32-bit integer variant; integers at or above this are
/// rejected with `ValueTooLarge` rather than silently truncated.
pub const TWO_POW_32: u64 = 1 << 32;

/// Branching factor of the in-memory B-tree: a node splits once it holds this many entries.
pub const BTREE_ORDER: usize = 64;
