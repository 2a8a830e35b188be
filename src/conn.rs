//! Connection 5-tuples, orientation canonicalization, and per-flow counters.
//!
//! A `Conn` is semantically undirected under the bidirectional kind:
//! `{src, dst}` and `{dst, src}` denote the same flow, so canonicalization
//! picks one orientation deterministically before marshalling. Both
//! directions of a flow then hash to the same bucket and compare equal.
//! The one-sided variant skips the fold for callers that must keep the two
//! half-connections apart.

use std::cmp::Ordering;

/// Marshalled width of a connection key: two addresses, one packed port
/// word, one protocol byte.
pub const CONN_MARSHALLED_LEN: usize = 13;

/// Marshalled width of a [`ConnStats`] aggregate: three u32 counters plus
/// three f64 counters, packed without padding.
pub const CONN_STATS_MARSHALLED_LEN: usize = 36;

/// An IPv4 connection 5-tuple.
///
/// Structural equality (`==`) distinguishes direction; use
/// [`Conn::same_flow`] or the registry comparison for direction-insensitive
/// equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Conn {
    pub saddr: u32,
    pub daddr: u32,
    pub sport: u16,
    pub dport: u16,
    pub proto: u8,
}

impl Conn {
    pub fn new(saddr: u32, daddr: u32, sport: u16, dport: u16, proto: u8) -> Self {
        Self {
            saddr,
            daddr,
            sport,
            dport,
            proto,
        }
    }

    /// The reverse orientation of this tuple.
    pub fn reversed(&self) -> Self {
        Self {
            saddr: self.daddr,
            daddr: self.saddr,
            sport: self.dport,
            dport: self.sport,
            proto: self.proto,
        }
    }

    /// Whether canonicalization swaps the endpoints: swap iff the source
    /// address ranks higher, with the source port breaking address ties.
    fn should_swap(&self) -> bool {
        match self.saddr.cmp(&self.daddr) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.sport > self.dport,
        }
    }

    /// The canonical (lower endpoint first) orientation of this tuple.
    /// Both directions of one flow canonicalize identically.
    pub fn canonical(&self) -> Self {
        if self.should_swap() {
            self.reversed()
        } else {
            *self
        }
    }

    /// Direction-insensitive flow equality.
    pub fn same_flow(&self, other: &Conn) -> bool {
        let (a, b) = (self.canonical(), other.canonical());
        a == b
    }

    /// 3-way comparison treating either orientation of one flow as equal;
    /// ties broken by the canonicalized (addr, addr, port, port, proto)
    /// tuple in lexicographic order, larger tuple first.
    pub fn compare(&self, other: &Conn) -> Ordering {
        let (a, b) = (self.canonical(), other.canonical());
        (b.saddr, b.daddr, b.sport, b.dport, b.proto)
            .cmp(&(a.saddr, a.daddr, a.sport, a.dport, a.proto))
    }

    /// 3-way comparison of the one-sided kind: direction is significant,
    /// fields compared as stored, larger tuple first.
    pub fn compare_one_sided(&self, other: &Conn) -> Ordering {
        (other.saddr, other.daddr, other.sport, other.dport, other.proto).cmp(&(
            self.saddr,
            self.daddr,
            self.sport,
            self.dport,
            self.proto,
        ))
    }

    /// Marshal the canonicalized tuple into its 13-byte hashing view:
    /// first address (big-endian), second address, a packed port word
    /// `(first_port << 16) | second_port`, and the protocol id.
    pub(crate) fn marshal(&self) -> [u8; CONN_MARSHALLED_LEN] {
        self.canonical().marshal_as_stored()
    }

    /// One-sided marshalling: same layout, no canonicalization.
    pub(crate) fn marshal_one_sided(&self) -> [u8; CONN_MARSHALLED_LEN] {
        self.marshal_as_stored()
    }

    fn marshal_as_stored(&self) -> [u8; CONN_MARSHALLED_LEN] {
        let mut buf = [0u8; CONN_MARSHALLED_LEN];
        buf[0..4].copy_from_slice(&self.saddr.to_be_bytes());
        buf[4..8].copy_from_slice(&self.daddr.to_be_bytes());
        let ports = ((self.sport as u32) << 16) | self.dport as u32;
        buf[8..12].copy_from_slice(&ports.to_be_bytes());
        buf[12] = self.proto;
        buf
    }
}

/// Per-flow traffic counters: total, forward, and backward packets/bytes.
///
/// Valid only as a yield; the registry declares it non-comparable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConnStats {
    pub pkts: u32,
    pub pkts_fwd: u32,
    pub pkts_bwd: u32,
    pub bytes: f64,
    pub bytes_fwd: f64,
    pub bytes_bwd: f64,
}

impl ConnStats {
    /// Accumulate `other` into `self`, counter by counter.
    pub fn add(&mut self, other: &ConnStats) {
        self.pkts += other.pkts;
        self.pkts_fwd += other.pkts_fwd;
        self.pkts_bwd += other.pkts_bwd;
        self.bytes += other.bytes;
        self.bytes_fwd += other.bytes_fwd;
        self.bytes_bwd += other.bytes_bwd;
    }

    /// Packed 36-byte hashing view of the six counters.
    pub(crate) fn marshal(&self) -> [u8; CONN_STATS_MARSHALLED_LEN] {
        let mut buf = [0u8; CONN_STATS_MARSHALLED_LEN];
        buf[0..4].copy_from_slice(&self.pkts.to_ne_bytes());
        buf[4..8].copy_from_slice(&self.pkts_fwd.to_ne_bytes());
        buf[8..12].copy_from_slice(&self.pkts_bwd.to_ne_bytes());
        buf[12..20].copy_from_slice(&self.bytes.to_ne_bytes());
        buf[20..28].copy_from_slice(&self.bytes_fwd.to_ne_bytes());
        buf[28..36].copy_from_slice(&self.bytes_bwd.to_ne_bytes());
        buf
    }
}
