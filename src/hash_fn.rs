//! The three interchangeable hash function strategies.
//!
//! Each strategy reduces a marshalled key to a 32-bit hash and is a pure
//! function of (bytes, strategy state), never of table occupancy. They
//! trade speed against resistance to adversarially chosen keys:
//!
//! - [`HashFn::lcg`]: linear-congruential mixer. Fastest, deterministic
//!   across runs and processes, attacker-predictable by design.
//! - [`HashFn::zobrist`]: XOR over a per-instance table of random words.
//!   Randomized per process; the wall-clock seed is not a secret.
//! - [`HashFn::keyed_digest`]: HMAC-style wrap over an opaque digest with a
//!   16-byte secret from best-effort OS entropy. Strongest flood resistance.
//!
//! State is explicit and owned by the strategy value; a table shares one
//! instance via `Rc` and the state is released by `Drop`, independently of
//! any table using it.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::digest::keyed_digest16;
use crate::entropy::{clock_seed, secret16};
use crate::error::TableError;

/// Algorithm tag of a [`HashFn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFnKind {
    Lcg,
    Zobrist,
    KeyedDigest,
}

/// A hash function strategy: algorithm tag plus owned algorithm state.
#[derive(Debug, Clone)]
pub enum HashFn {
    Lcg,
    Zobrist(ZobristTable),
    KeyedDigest { secret: [u8; 16] },
}

/// Zobrist state: a 256×L table of independent uniformly random words,
/// L a power of two.
#[derive(Debug, Clone)]
pub struct ZobristTable {
    /// Row length; every key byte position indexes its row modulo this.
    len: usize,
    /// `len - 1`, valid because `len` is a power of two.
    mask: usize,
    /// 256 rows of `len` words each, row-major by byte value.
    words: Vec<u32>,
}

impl ZobristTable {
    /// Build a table covering at least `requested_len` byte positions with
    /// independent words, seeded from the wall clock.
    fn new(requested_len: usize) -> Self {
        let len = requested_len.max(1).next_power_of_two();
        let mut rng = SmallRng::seed_from_u64(clock_seed());
        let words = (0..256 * len).map(|_| rng.gen::<u32>()).collect();
        Self {
            len,
            mask: len - 1,
            words,
        }
    }

    /// Row length L actually allocated.
    pub fn len(&self) -> usize {
        self.len
    }

    fn hash(&self, bytes: &[u8]) -> u32 {
        let mut hash = 0u32;
        for (i, &b) in bytes.iter().enumerate() {
            hash ^= self.words[(b as usize) * self.len + (i & self.mask)];
        }
        hash
    }
}

/// LCG mixer: big-endian accumulation in groups of four bytes (the final
/// group may be short), one LCG step per group, XOR of the step outputs.
///
/// Constants from the classic Numerical Recipes generator:
/// `v' = v * 1664525 + 1013904223 (mod 2^32)`.
pub(crate) fn lcg_hash(bytes: &[u8]) -> u32 {
    const A: u32 = 1_664_525;
    const B: u32 = 1_013_904_223;

    let mut hash = 0u32;
    let mut acc = 0u32;
    for (i, &b) in bytes.iter().enumerate() {
        acc = (acc << 8).wrapping_add(b as u32);
        if (i + 1) % 4 == 0 || i == bytes.len() - 1 {
            acc = acc.wrapping_mul(A).wrapping_add(B);
            hash ^= acc;
            acc = 0;
        }
    }
    hash
}

impl HashFn {
    /// The deterministic LCG strategy. Carries no state.
    pub fn lcg() -> Self {
        HashFn::Lcg
    }

    /// A Zobrist strategy whose table covers at least `table_len` byte
    /// positions (rounded up to a power of two), randomized per instance.
    pub fn zobrist(table_len: usize) -> Self {
        HashFn::Zobrist(ZobristTable::new(table_len))
    }

    /// A keyed-digest strategy with a fresh 16-byte secret from best-effort
    /// OS entropy. Derive once and share via `Rc`; the one-time entropy read
    /// is the only call in this crate that may briefly stall.
    pub fn keyed_digest() -> Self {
        HashFn::KeyedDigest {
            secret: secret16(),
        }
    }

    /// A keyed-digest strategy under a caller-supplied secret, for callers
    /// that manage key material themselves.
    pub fn keyed_digest_with_secret(secret: [u8; 16]) -> Self {
        HashFn::KeyedDigest { secret }
    }

    /// Algorithm tag of this strategy.
    pub fn kind(&self) -> HashFnKind {
        match self {
            HashFn::Lcg => HashFnKind::Lcg,
            HashFn::Zobrist(_) => HashFnKind::Zobrist,
            HashFn::KeyedDigest { .. } => HashFnKind::KeyedDigest,
        }
    }

    /// Reduce marshalled key bytes to a 32-bit hash.
    pub fn hash_bytes(&self, bytes: &[u8]) -> u32 {
        match self {
            HashFn::Lcg => lcg_hash(bytes),
            HashFn::Zobrist(table) => table.hash(bytes),
            HashFn::KeyedDigest { secret } => {
                let digest = keyed_digest16(secret, bytes);
                u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
            }
        }
    }

    /// Tag-checked access to the Zobrist state. Errors with
    /// [`TableError::HashFnMismatch`] (no side effects) when this strategy
    /// is a different algorithm.
    pub fn zobrist_table(&self) -> Result<&ZobristTable, TableError> {
        match self {
            HashFn::Zobrist(table) => Ok(table),
            other => Err(TableError::HashFnMismatch {
                expected: HashFnKind::Zobrist,
                found: other.kind(),
            }),
        }
    }
}
