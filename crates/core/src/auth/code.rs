//! One-time code generation.

use rand::Rng;

/// Generates a numeric code of `length` digits, zero padded.
#[must_use]
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}
