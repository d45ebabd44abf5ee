//! Hash-based identifier generation.
//!
//! Ids have the form `{prefix}-{hash}` (e.g. `dep-4k2x9q`). The hash is the
//! base36 encoding of a SHA-256 digest over a caller-supplied seed, the
//! current time and a nonce.
//!
//! # Features
//!
//! - **Adaptive length**: hash length grows with table size (6-8 characters)
//! - **Collision resistant**: retries with a new nonce while the candidate is taken
//! - **Store-checked**: "taken" is answered by the caller, so the check can run
//!   inside the same transaction that inserts the row
//!
//! # Example
//!
//! ```
//! use roadmap::id_generation::{IdGenerationError, IdGenerator};
//!
//! let generator = IdGenerator::new("dep", 10);
//! let id = generator
//!     .generate::<IdGenerationError, _>("project:a->project:b", |_| Ok(false))
//!     .unwrap();
//!
//! assert!(id.starts_with("dep-"));
//! ```

use chrono::Utc;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;

/// Longest hash a u64 can fill without padding (36^12 < 2^64).
const MAX_HASH_LENGTH: usize = 12;

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Unable to generate a unique ID after exhausting all nonces and length increases
    #[error("Unable to generate unique ID after {attempts} attempts")]
    CollisionExhausted {
        /// Number of candidates tried.
        attempts: u32,
    },

    /// Invalid length parameter
    #[error("Length must be between 1 and {MAX_HASH_LENGTH}")]
    InvalidLength,
}

/// Hash-based ID generator.
///
/// Holds no collision state of its own; create one per insert with the
/// current table size.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    table_size: usize,
}

impl IdGenerator {
    /// Create a generator for ids with `prefix`, sized for a table that
    /// currently holds `table_size` rows.
    pub fn new(prefix: impl Into<String>, table_size: usize) -> Self {
        Self {
            prefix: prefix.into(),
            table_size,
        }
    }

    /// The id prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate an id not rejected by `is_taken`.
    ///
    /// # Errors
    ///
    /// Propagates errors from `is_taken`, and returns
    /// `IdGenerationError::CollisionExhausted` (converted into `E`) when every
    /// candidate is taken.
    pub fn generate<E, F>(&self, seed: &str, mut is_taken: F) -> std::result::Result<String, E>
    where
        E: From<IdGenerationError>,
        F: FnMut(&str) -> std::result::Result<bool, E>,
    {
        let id_length = self.adaptive_length();

        for nonce in 0..MAX_NONCE {
            let id = self.hash_id(seed, nonce, id_length)?;

            if !is_taken(&id)? {
                if nonce > 0 {
                    debug!(nonce, id_length, "Generated unique ID after collision retries");
                }
                return Ok(id);
            }
        }

        // All nonces collided: one more attempt with a longer hash
        warn!(
            id_length,
            max_nonce = MAX_NONCE,
            "All nonces exhausted, increasing ID length"
        );
        let longer_id = self.hash_id(seed, 0, id_length + 1)?;
        if !is_taken(&longer_id)? {
            return Ok(longer_id);
        }

        Err(IdGenerationError::CollisionExhausted {
            attempts: MAX_NONCE + 1,
        }
        .into())
    }

    fn hash_id(
        &self,
        seed: &str,
        nonce: u32,
        length: usize,
    ) -> std::result::Result<String, IdGenerationError> {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let content = format!("{seed}|{timestamp}|{nonce}");

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let hash_bytes = hasher.finalize();

        let hash_str = encode_base36(&hash_bytes[..8], length)?;
        Ok(format!("{}-{}", self.prefix, hash_str))
    }

    /// Hash length by table size.
    ///
    /// - 0-500 rows: 6 chars
    /// - 501-5,000: 7 chars
    /// - 5,001+: 8 chars
    fn adaptive_length(&self) -> usize {
        match self.table_size {
            0..=500 => 6,
            501..=5000 => 7,
            _ => 8,
        }
    }
}

/// Encode the first eight bytes of `bytes` as a base36 string of exactly
/// `length` characters.
fn encode_base36(bytes: &[u8], length: usize) -> std::result::Result<String, IdGenerationError> {
    if length == 0 || length > MAX_HASH_LENGTH {
        return Err(IdGenerationError::InvalidLength);
    }

    let mut buf = [0u8; 8];
    let take = bytes.len().min(8);
    buf[..take].copy_from_slice(&bytes[..take]);
    let mut n = u64::from_be_bytes(buf);

    let mut result = Vec::with_capacity(length);
    while result.len() < length {
        // n % 36 < 36, always a valid index
        #[allow(clippy::cast_possible_truncation)]
        let remainder = (n % 36) as usize;
        result.push(BASE36_CHARS[remainder]);
        n /= 36;
    }
    result.reverse();

    Ok(result.into_iter().map(char::from).collect())
}

/// Check that `id` looks like `{prefix}-{base36 hash}`.
#[must_use]
pub fn validate_id(id: &str, prefix: &str) -> bool {
    let Some(hash) = id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };

    (4..=MAX_HASH_LENGTH).contains(&hash.len())
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn base36_encoding_has_requested_length() {
        let result = encode_base36(&[0x12, 0x34, 0x56, 0x78], 6).unwrap();
        assert_eq!(result.len(), 6);
        assert!(result.bytes().all(|b| BASE36_CHARS.contains(&b)));
    }

    #[test]
    fn base36_encoding_rejects_bad_length() {
        assert!(matches!(
            encode_base36(&[1, 2, 3], 0),
            Err(IdGenerationError::InvalidLength)
        ));
        assert!(matches!(
            encode_base36(&[1, 2, 3], MAX_HASH_LENGTH + 1),
            Err(IdGenerationError::InvalidLength)
        ));
    }

    #[test]
    fn adaptive_length_grows_with_table() {
        assert_eq!(IdGenerator::new("dep", 0).adaptive_length(), 6);
        assert_eq!(IdGenerator::new("dep", 500).adaptive_length(), 6);
        assert_eq!(IdGenerator::new("dep", 501).adaptive_length(), 7);
        assert_eq!(IdGenerator::new("dep", 10_000).adaptive_length(), 8);
    }

    #[test]
    fn generated_id_is_valid() {
        let generator = IdGenerator::new("dep", 0);
        let id = generator
            .generate::<IdGenerationError, _>("seed", |_| Ok(false))
            .unwrap();

        assert!(validate_id(&id, "dep"), "unexpected id format: {id}");
    }

    #[test]
    fn generate_retries_while_taken() {
        let generator = IdGenerator::new("dep", 0);
        let calls = Cell::new(0);

        let id = generator
            .generate::<IdGenerationError, _>("seed", |_| {
                calls.set(calls.get() + 1);
                Ok(calls.get() < 3)
            })
            .unwrap();

        assert_eq!(calls.get(), 3);
        assert!(validate_id(&id, "dep"));
    }

    #[test]
    fn generate_gives_up_when_everything_is_taken() {
        let generator = IdGenerator::new("dep", 0);
        let result = generator.generate::<IdGenerationError, _>("seed", |_| Ok(true));

        assert!(matches!(
            result,
            Err(IdGenerationError::CollisionExhausted { .. })
        ));
    }

    #[test]
    fn validate_id_checks_prefix_and_hash() {
        assert!(validate_id("dep-a3f8k2", "dep"));
        assert!(!validate_id("prj-a3f8k2", "dep"));
        assert!(!validate_id("dep-", "dep"));
        assert!(!validate_id("dep-ABCD", "dep"));
        assert!(!validate_id("depa3f8", "dep"));
    }
}
