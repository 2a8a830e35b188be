//! The closed object-type registry: every key/yield shape a table can hold.
//!
//! Rather than open function-pointer dispatch, the registry is a pair of
//! closed enums matched exhaustively: [`Object`] carries the value,
//! [`ObjectKind`] selects the per-kind operations (marshalled length, 3-way
//! comparison, marshalling). Two kinds share the `Conn` payload (the
//! bidirectional kind folds orientation, the one-sided kind keeps it), so
//! the kind, not the payload, decides how an object hashes and compares.
//!
//! Misuse is fatal by design: comparing the non-comparable statistics
//! aggregate, or handing a kind an object of the wrong variant, panics.
//! The table API validates its arguments up front and reports
//! [`TableError::KindMismatch`](crate::TableError::KindMismatch) instead of
//! reaching those panics.

use std::cmp::Ordering;

use arrayvec::ArrayVec;

use crate::conn::{Conn, ConnStats, CONN_MARSHALLED_LEN, CONN_STATS_MARSHALLED_LEN};

/// Widest marshalled form across all kinds (the statistics aggregate).
pub const MAX_MARSHALLED_LEN: usize = CONN_STATS_MARSHALLED_LEN;

/// Fixed-length byte view of an object, used for hashing only.
pub type MarshalledBytes = ArrayVec<u8, MAX_MARSHALLED_LEN>;

/// Type tag selecting a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Bidirectional connection tuple; orientation canonicalized away.
    Conn,
    /// One-sided connection tuple; the two half-connections stay distinct.
    OneSidedConn,
    /// Unsigned 32-bit integer (addresses, counters).
    U32,
    /// Double-precision float.
    Double,
    /// Connection-statistics aggregate; yield-only, non-comparable.
    Stats,
}

/// A value of one of the supported shapes.
#[derive(Debug, Clone)]
pub enum Object {
    Conn(Conn),
    U32(u32),
    Double(f64),
    Stats(ConnStats),
}

impl ObjectKind {
    /// Marshalled byte length of objects of this kind.
    pub fn marshalled_len(&self) -> usize {
        match self {
            ObjectKind::Conn | ObjectKind::OneSidedConn => CONN_MARSHALLED_LEN,
            ObjectKind::U32 => 4,
            ObjectKind::Double => 8,
            ObjectKind::Stats => CONN_STATS_MARSHALLED_LEN,
        }
    }

    /// Whether `obj`'s variant is acceptable for this kind.
    pub fn accepts(&self, obj: &Object) -> bool {
        matches!(
            (self, obj),
            (ObjectKind::Conn | ObjectKind::OneSidedConn, Object::Conn(_))
                | (ObjectKind::U32, Object::U32(_))
                | (ObjectKind::Double, Object::Double(_))
                | (ObjectKind::Stats, Object::Stats(_))
        )
    }

    /// 3-way comparison of two objects under this kind. Every comparable
    /// kind ranks the larger value first.
    ///
    /// # Panics
    ///
    /// Panics on the `Stats` kind (declared non-comparable) and on objects
    /// whose variant does not match the kind. Both are caller-side type
    /// misuse, not recoverable runtime errors.
    pub fn compare(&self, a: &Object, b: &Object) -> Ordering {
        match (self, a, b) {
            (ObjectKind::Conn, Object::Conn(x), Object::Conn(y)) => x.compare(y),
            (ObjectKind::OneSidedConn, Object::Conn(x), Object::Conn(y)) => {
                x.compare_one_sided(y)
            }
            (ObjectKind::U32, Object::U32(x), Object::U32(y)) => y.cmp(x),
            (ObjectKind::Double, Object::Double(x), Object::Double(y)) => y.total_cmp(x),
            (ObjectKind::Stats, Object::Stats(_), Object::Stats(_)) => {
                panic!("connection statistics are not comparable; valid only as a yield")
            }
            (kind, a, b) => panic!(
                "object kind mismatch in comparison: kind {:?} applied to {:?} and {:?}",
                kind, a, b
            ),
        }
    }

    /// Marshal `obj` into its fixed-length hashing view. The output length
    /// always equals [`marshalled_len`](Self::marshalled_len).
    ///
    /// # Panics
    ///
    /// Panics when `obj`'s variant does not match the kind.
    pub fn marshal(&self, obj: &Object) -> MarshalledBytes {
        let mut out = MarshalledBytes::new();
        match (self, obj) {
            (ObjectKind::Conn, Object::Conn(c)) => out.extend(c.marshal()),
            (ObjectKind::OneSidedConn, Object::Conn(c)) => out.extend(c.marshal_one_sided()),
            (ObjectKind::U32, Object::U32(v)) => out.extend(v.to_ne_bytes()),
            (ObjectKind::Double, Object::Double(v)) => out.extend(v.to_ne_bytes()),
            (ObjectKind::Stats, Object::Stats(s)) => out.extend(s.marshal()),
            (kind, obj) => panic!(
                "object kind mismatch in marshalling: kind {:?} applied to {:?}",
                kind, obj
            ),
        }
        debug_assert_eq!(out.len(), self.marshalled_len());
        out
    }
}

impl Object {
    /// The natural kind of this object's variant. `Conn` payloads report the
    /// bidirectional kind; the one-sided interpretation is a table-level
    /// choice, not a property of the value.
    pub fn natural_kind(&self) -> ObjectKind {
        match self {
            Object::Conn(_) => ObjectKind::Conn,
            Object::U32(_) => ObjectKind::U32,
            Object::Double(_) => ObjectKind::Double,
            Object::Stats(_) => ObjectKind::Stats,
        }
    }
}

impl From<Conn> for Object {
    fn from(c: Conn) -> Self {
        Object::Conn(c)
    }
}

impl From<u32> for Object {
    fn from(v: u32) -> Self {
        Object::U32(v)
    }
}

impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Object::Double(v)
    }
}

impl From<ConnStats> for Object {
    fn from(s: ConnStats) -> Self {
        Object::Stats(s)
    }
}
