//! ID generation utilities
//!
//! Provides functions for generating identifiers for call logs and notices.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Generate a unique call log ID
///
/// Format: `call_{timestamp_ms}_{random_hex}`
/// Example: `call_1738300800123_a1b2`
pub fn generate_call_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("call_{}_{:04x}", timestamp, random)
}
