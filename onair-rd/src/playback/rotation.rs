//! Filler rotation picker
//!
//! Uniform-random choice over the filler pool, independent of playback
//! history. Immediate repeats are possible and accepted; the pool is a
//! fallback rotation, not a curated sequence.

use onair_common::FillerEntry;
use rand::seq::SliceRandom;
use rand::Rng;

/// Pick the next filler track, or None when the pool is empty.
///
/// An empty pool is a recoverable no-op for the caller, not an error: the
/// controller stays idle and retries on the next tick or end event.
pub fn pick(pool: &[FillerEntry]) -> Option<&FillerEntry> {
    pick_with(pool, &mut rand::thread_rng())
}

/// Pick with a caller-supplied RNG (deterministic in tests)
pub fn pick_with<'a, R: Rng + ?Sized>(pool: &'a [FillerEntry], rng: &mut R) -> Option<&'a FillerEntry> {
    pool.choose(rng)
}
