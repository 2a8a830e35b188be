//! Best-effort entropy gathering for hash function seeding.
//!
//! Two consumers, both one-shot at strategy creation time: the keyed-digest
//! secret (needs real entropy, falls back gracefully) and the Zobrist table
//! generator (wall-clock seed is enough; the seed is not a secret).

use rand::rngs::OsRng;
use rand::RngCore;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::digest::digest16;

/// Best-effort read of OS entropy into `buf`.
///
/// Returns the number of bytes actually filled: `buf.len()` on success, 0 if
/// the OS source is unavailable. Never retries or blocks beyond the single
/// OS read.
pub fn read_entropy(buf: &mut [u8]) -> usize {
    match OsRng.try_fill_bytes(buf) {
        Ok(()) => buf.len(),
        Err(_) => 0,
    }
}

/// Wall-clock derived seed for non-secret randomization.
pub(crate) fn clock_seed() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_micros() as u64,
        // Clock before the epoch; still usable as a seed.
        Err(e) => e.duration().as_micros() as u64,
    }
}

/// Derive a 16-byte secret for the keyed-digest strategy.
///
/// Fills a pool with the wall clock, a best-effort OS entropy read, and the
/// process id as a last resort, then folds the whole pool through the digest
/// so weak sources still spread over all 16 bytes.
pub(crate) fn secret16() -> [u8; 16] {
    let mut pool = [0u8; 64];
    pool[..8].copy_from_slice(&clock_seed().to_le_bytes());

    let got = read_entropy(&mut pool[8..56]);
    if got < 48 {
        log::warn!(
            "OS entropy source depleted ({}/48 bytes); padding secret pool with pid",
            got
        );
        pool[56..60].copy_from_slice(&std::process::id().to_le_bytes());
    }

    digest16(&pool)
}
