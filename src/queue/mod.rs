//! Dialing queue generation
//!
//! Turns a base prefix, a starting 4-digit offset and an attempt count into
//! the ordered list of numbers to dial. Offsets wrap modulo 10000.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest 4-digit suffix
pub const MAX_OFFSET: u16 = 9999;

/// Upper bound on numbers generated for one session
pub const MAX_ATTEMPTS: u32 = 10_000;

const OFFSET_MODULUS: u32 = 10_000;

/// Everything needed to derive a dialing queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialSpec {
    /// Digits prepended to every generated suffix (7 digits by convention)
    pub base_prefix: String,
    /// First 4-digit suffix, in [0, 9999]
    pub start_offset: u16,
    /// Number of entries to generate, in [0, 10000]
    pub attempt_count: u32,
    /// Randomize dialing order after generation
    pub shuffle: bool,
}

impl DialSpec {
    /// Build a spec from raw user input, clamping out-of-range values.
    pub fn from_input(base: &str, last4: &str, attempts: i64, shuffle: bool) -> Self {
        Self {
            base_prefix: base.to_string(),
            start_offset: parse_start_offset(last4),
            attempt_count: clamp_attempts(attempts),
            shuffle,
        }
    }

    /// Generate the queue for this spec
    pub fn generate(&self) -> Vec<String> {
        self.generate_with_rng(&mut rand::rng())
    }

    /// Generate the queue, drawing shuffle randomness from `rng`
    pub fn generate_with_rng<R: Rng>(&self, rng: &mut R) -> Vec<String> {
        let mut queue = sequential_queue(&self.base_prefix, self.start_offset, self.attempt_count);
        if self.shuffle {
            shuffle_in_place(&mut queue, rng);
        }
        queue
    }
}

/// Generate a dialing queue from raw input.
///
/// `last4` is stripped to digits and clamped to [0, 9999], defaulting to 0
/// when nothing parseable remains. `attempts` is clamped to [0, 10000].
/// Never fails; the result may be empty.
pub fn generate_queue(base: &str, last4: &str, attempts: i64, shuffle: bool) -> Vec<String> {
    DialSpec::from_input(base, last4, attempts, shuffle).generate()
}

/// Parse the starting suffix from free text
pub fn parse_start_offset(last4: &str) -> u16 {
    let digits: String = last4.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    // Only overflow can fail here; anything that long is past the max
    match digits.parse::<u64>() {
        Ok(n) => n.min(MAX_OFFSET as u64) as u16,
        Err(_) => MAX_OFFSET,
    }
}

/// Clamp a requested attempt count into [0, 10000]
pub fn clamp_attempts(attempts: i64) -> u32 {
    attempts.clamp(0, MAX_ATTEMPTS as i64) as u32
}

fn sequential_queue(base: &str, start: u16, count: u32) -> Vec<String> {
    (0..count)
        .map(|i| {
            let offset = (start as u32 + i) % OFFSET_MODULUS;
            format!("{}{:04}", base, offset)
        })
        .collect()
}

/// Fisher–Yates: walk from the last index down to 1, swapping each slot with
/// a uniformly chosen index in `[0, i]`.
pub fn shuffle_in_place<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}
