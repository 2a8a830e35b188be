//! One-way digest primitive and the keyed wrap built on it.
//!
//! The table engine treats the digest as an opaque `bytes -> 16 bytes`
//! function; everything algorithm-specific lives behind `digest16`. The
//! keyed wrap is deliberately simple: digest the message, XOR in the
//! 16-byte secret, digest again. An adversary who cannot predict the
//! secret cannot predict which bucket a key lands in.

use blake2::digest::consts::U16;
use blake2::{Blake2b, Digest};

/// 128-bit output variant of the underlying digest.
type Blake2b128 = Blake2b<U16>;

/// One-way digest of `bytes` into 16 bytes.
pub fn digest16(bytes: &[u8]) -> [u8; 16] {
    let mut hasher = Blake2b128::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Keyed wrap over `digest16`: `digest16(digest16(bytes) ^ secret)`.
///
/// The secret enters between the two digest passes, so the output depends
/// on every message byte and on every secret byte.
pub fn keyed_digest16(secret: &[u8; 16], bytes: &[u8]) -> [u8; 16] {
    let mut inner = digest16(bytes);
    for (b, k) in inner.iter_mut().zip(secret.iter()) {
        *b ^= k;
    }
    digest16(&inner)
}
