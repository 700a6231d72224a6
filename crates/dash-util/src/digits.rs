use rand::{rngs::OsRng, Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// Widest suffix that still fits in a `u64` range.
pub const MAX_WIDTH: u32 = 19;

/// Source of zero-padded decimal suffixes for entity ids.
///
/// Uses the xoshiro256** PRNG so a seeded source yields a reproducible
/// sequence of ids.
///
/// # Examples
///
/// ```
/// use dash_util::DigitSource;
///
/// let mut source = DigitSource::new(Some(7));
/// let suffix = source.digits(5);
/// assert_eq!(suffix.len(), 5);
/// assert!(suffix.bytes().all(|b| b.is_ascii_digit()));
/// ```
#[derive(Debug, Clone)]
pub struct DigitSource {
    /// The seed used to initialize the PRNG.
    pub seed: u64,
    rng: Xoshiro256StarStar,
}

impl DigitSource {
    /// Create a source with an optional seed; `None` draws one from `OsRng`.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| OsRng.next_u64());
        Self {
            seed,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }

    /// Generate `width` decimal digits, zero padded. Width is clamped to
    /// `1..=MAX_WIDTH`.
    pub fn digits(&mut self, width: u32) -> String {
        let width = width.clamp(1, MAX_WIDTH);
        let n = self.rng.gen_range(0..10u64.pow(width));
        format!("{n:0width$}", width = width as usize)
    }
}

impl Default for DigitSource {
    fn default() -> Self {
        Self::new(None)
    }
}
