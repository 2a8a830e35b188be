//! flow-table: a single-threaded, chained hash table for non-unique
//! connection keys with pluggable, flood-resistant hashing.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: index per-connection yields (counters, statistics) by network
//!   5-tuples (and a few other key shapes) in a table that an adversary
//!   who chooses the keys cannot degrade into a linked list.
//! - Layers, leaves first:
//!   - `conn`: the `Conn` 5-tuple, orientation canonicalization (both
//!     directions of a flow marshal identically), and the `ConnStats`
//!     counter aggregate.
//!   - `object`: the closed type registry. `Object` carries a value of one
//!     of the supported shapes; `ObjectKind` selects marshalled length,
//!     3-way comparison, and marshalling, matched exhaustively.
//!   - `hash_fn` (+ `digest`, `entropy`): three interchangeable strategies
//!     reducing marshalled bytes to a 32-bit hash: a deterministic LCG
//!     mixer, a per-process randomized Zobrist table, and a keyed-digest
//!     wrap over a secret from best-effort OS entropy.
//!   - `table`: bucket-head array plus doubly-linked chains threaded
//!     through a slotmap arena; insert/lookup/iterate/count/remove/reset,
//!     growth-triggered rebuild that relinks items without reallocating
//!     them.
//!
//! Constraints
//! - Single-threaded: strategies are shared via `Rc`; no atomics, no locks.
//! - Keys need not be unique; only byte-identical {key, yield} pairs are
//!   rejected (soft error, no mutation).
//! - Bucket count is always a power of two ≥ 16; after every insert,
//!   `len() < max_occupancy_ratio * nbuckets` holds.
//! - Item handles are stable generational keys: O(1) access and unlink,
//!   stale handles resolve to `None` rather than aliasing a reused slot.
//! - Every hash strategy is a pure function of (marshalled bytes, strategy
//!   state), never of table occupancy.
//!
//! Why pluggable hashing?
//! - The LCG mixer is fast and deterministic across processes, which makes
//!   it reproducible, and attacker-predictable. A peer that can pick
//!   source ports can aim thousands of flows at one bucket.
//! - The Zobrist table XORs per-(byte, position) random words drawn once
//!   per strategy instance, so bucket placement varies per process.
//! - The keyed digest wraps an opaque 16-byte one-way digest around a
//!   secret; predicting placement requires predicting the secret.
//!
//! Notes and non-goals
//! - Chaining is the only collision strategy; open addressing is not
//!   provided.
//! - The digest primitive itself is an external collaborator behind
//!   `digest::digest16`; this crate only defines the keyed wrap.
//! - No thread-safety, no persistence, no internal aggregation of yields:
//!   callers own the semantics of what they store.
//! - Iteration via `next_matching` is invalidated by interleaved mutation;
//!   this is a caller contract, not a detected error.

mod conn;
mod digest;
mod entropy;
mod error;
mod hash_fn;
mod object;
mod table;

// Public surface
pub use conn::{Conn, ConnStats, CONN_MARSHALLED_LEN, CONN_STATS_MARSHALLED_LEN};
pub use entropy::read_entropy;
pub use error::TableError;
pub use hash_fn::{HashFn, HashFnKind, ZobristTable};
pub use object::{MarshalledBytes, Object, ObjectKind, MAX_MARSHALLED_LEN};
pub use table::{
    ItemHandle, Table, TableConfig, DEFAULT_INITIAL_BUCKETS, DEFAULT_MAX_OCCUPANCY_RATIO,
};
