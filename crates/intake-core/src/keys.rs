//! Storage key generation.
//!
//! Key format: `{unix_millis}_{token}{extension}`, e.g. `1714564800000_k3v9x0q2m.png`.
//! The millisecond prefix keeps keys roughly chronological; the 9-character base-36
//! token (36^9 values) makes collisions between concurrent calls negligible.

use chrono::{DateTime, Utc};
use rand::Rng;

const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const TOKEN_LEN: usize = 9;

/// Generate a fresh storage key for a validated extension (including the leading dot).
pub fn generate_file_key(extension: &str) -> String {
    generate_file_key_at(Utc::now(), extension)
}

/// Generate a storage key using `now` as the timestamp component.
pub fn generate_file_key_at(now: DateTime<Utc>, extension: &str) -> String {
    format!("{}_{}{}", now.timestamp_millis(), random_token(), extension)
}

fn random_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}
