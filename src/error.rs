//! Error types for table operations.

use thiserror::Error;

use crate::hash_fn::HashFnKind;
use crate::object::ObjectKind;

/// Reported, non-fatal outcomes of table and strategy operations.
///
/// Absence is never an error: lookups and iteration report `None`, removal
/// reports a count of zero. Fatal conditions (allocation failure, comparing
/// the non-comparable statistics aggregate, kind/variant misuse inside the
/// registry) abort or panic instead of surfacing here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// An item with an equal key and equal yield is already present; the
    /// insert was a no-op.
    #[error("an item with an identical key and yield already exists")]
    AlreadyExists,

    /// An argument's variant does not match the kind the table was
    /// configured with.
    #[error("object kind mismatch: table expects {expected:?}, argument is {found:?}")]
    KindMismatch {
        expected: ObjectKind,
        found: ObjectKind,
    },

    /// A strategy-state accessor was used with the wrong algorithm tag; the
    /// strategy is unchanged.
    #[error("hash function mismatch: expected {expected:?}, found {found:?}")]
    HashFnMismatch {
        expected: HashFnKind,
        found: HashFnKind,
    },
}
