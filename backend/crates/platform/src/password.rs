//! Password Hashing and Verification
//!
//! Salted password digests built from an array-mixing routine that imitates
//! the data-dependent memory access of memory-hard KDFs.
//!
//! ## Security Notes
//! - This is a bespoke construction, not Argon2/scrypt. It has had no
//!   cryptographic review.
//! - Verification compares digests with ordinary string equality.
//! - Working buffers are zeroized after each digest.
//!
//! ## Digest format
//! The digest is 32 words, each written as lowercase hex with a minimum width
//! of two characters. Words are full 32-bit values, so the total length is
//! not fixed (64 to 256 characters). Stored credentials depend on this exact
//! rendering.

use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

// ============================================================================
// Constants
// ============================================================================

/// Words in the mixing memory
pub const MEMORY_SIZE: usize = 1024;

/// Full passes over the memory
pub const ITERATIONS: u32 = 3;

/// Words in the extracted digest
pub const HASH_LENGTH: usize = 32;

/// Salt length used by [`generate_salt`] callers that have no preference
pub const DEFAULT_SALT_LENGTH: usize = 16;

const STATE_SIZE: usize = 8;
const MIX_MULTIPLIER: u32 = 0x045d_9f3b;

// ============================================================================
// Credential
// ============================================================================

/// Digest and the salt it was derived with
///
/// The salt must be stored next to the digest; neither is useful alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub hash: String,
    pub salt: String,
}

impl Credential {
    /// Recompute the digest for `password` and compare
    pub fn verify(&self, password: &str) -> bool {
        verify_password(password, &self.hash, &self.salt)
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Derive the hex digest of `password` under `salt`
///
/// Deterministic and total: empty and non-ASCII inputs are accepted. Each
/// character contributes only the low 8 bits of its code point.
pub fn hash(password: &str, salt: &str) -> String {
    let password = to_low_bytes(password);
    let salt = to_low_bytes(salt);
    encode_words(&digest_words(&password, &salt))
}

/// Random salt of `length` characters from `[a-zA-Z0-9]`
pub fn generate_salt(length: usize) -> String {
    generate_salt_with(&mut rand::rng(), length)
}

/// Random salt drawn from a caller-supplied source
pub fn generate_salt_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

/// Hash `password` under a fresh default-length salt
pub fn compose_hash(password: &str) -> Credential {
    compose_hash_with(&mut rand::rng(), password, DEFAULT_SALT_LENGTH)
}

/// Hash `password` under a fresh salt of `salt_length` from `rng`
pub fn compose_hash_with<R: Rng + ?Sized>(
    rng: &mut R,
    password: &str,
    salt_length: usize,
) -> Credential {
    let salt = generate_salt_with(rng, salt_length);
    Credential {
        hash: hash(password, &salt),
        salt,
    }
}

/// Whether `password` under `salt` reproduces `expected_hash`
pub fn verify_password(password: &str, expected_hash: &str, salt: &str) -> bool {
    hash(password, salt) == expected_hash
}

// ============================================================================
// Core routine
// ============================================================================

/// 32-bit integer finalizer
///
/// Two xor-shift-multiply rounds followed by a final xor-shift, all mod 2^32.
#[inline]
pub fn mix(value: u32, seed: u32) -> u32 {
    let mut h = value ^ seed;
    h = ((h >> 16) ^ h).wrapping_mul(MIX_MULTIPLIER);
    h = ((h >> 16) ^ h).wrapping_mul(MIX_MULTIPLIER);
    (h >> 16) ^ h
}

fn to_low_bytes(s: &str) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(s.chars().map(|c| (u32::from(c) & 0xff) as u8).collect())
}

/// Cyclic byte lookup; an empty input reads as zero
#[inline]
fn byte_at(bytes: &[u8], i: usize) -> u32 {
    if bytes.is_empty() {
        0
    } else {
        u32::from(bytes[i % bytes.len()])
    }
}

fn digest_words(password: &[u8], salt: &[u8]) -> Vec<u32> {
    let mut state = Zeroizing::new([0u32; STATE_SIZE]);
    for (i, word) in state.iter_mut().enumerate() {
        *word = mix(byte_at(password, i) ^ byte_at(salt, i), i as u32);
    }

    let mut memory = Zeroizing::new(vec![0u32; MEMORY_SIZE]);
    for (i, word) in memory.iter_mut().enumerate() {
        let seed = state[i % STATE_SIZE] ^ byte_at(password, i) ^ byte_at(salt, i);
        *word = mix(seed, i as u32);
    }

    // The reference index depends on the previously written word.
    for pass in 0..ITERATIONS {
        for i in 0..MEMORY_SIZE {
            let prev = memory[(i + MEMORY_SIZE - 1) % MEMORY_SIZE];
            let reference = memory[prev as usize % MEMORY_SIZE];
            let mixed = memory[i] ^ reference ^ state[i % STATE_SIZE];
            memory[i] = mix(mixed, i as u32 + pass);
            state[i % STATE_SIZE] ^= memory[i];
        }
    }

    let mut result = state.to_vec();
    for i in 0..HASH_LENGTH {
        let idx = (state[i % STATE_SIZE] as usize + i) % MEMORY_SIZE;
        let r = i % result.len();
        result[r] = mix(result[r] ^ memory[idx], i as u32);
    }
    while result.len() < HASH_LENGTH {
        let last = result[result.len() - 1];
        result.push(mix(last, result.len() as u32));
    }
    result.truncate(HASH_LENGTH);
    result
}

fn encode_words(words: &[u32]) -> String {
    words.iter().map(|w| format!("{:02x}", w)).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    const SECRET123_ABCD1234: &str = "1e94b621eb44325ee7dbd491ef3c1978a6c1d962186225fe4b25ccabd242e61fc170a68c3c5538aa4925121bb28bb93c90afbb4459c7b1529f20378266200f8c9f973f3403b01b521b885186e17f80ce6b721978c8b8d1d8c685c85f0f06609b156251cc248a271601f4996687555d16d87a839b4d1c4217e7f87932700d276";

    #[test]
    fn test_mix_known_values() {
        assert_eq!(mix(0, 0), 0);
        assert_eq!(mix(1, 0), 0x3125_1ba7);
        assert_eq!(mix(0x1234_5678, 7), 0x94c6_ddd2);
    }

    #[test]
    fn test_mix_seed_is_xored_in() {
        assert_eq!(mix(5, 3), mix(6, 0));
    }

    #[test]
    fn test_hash_known_vector() {
        let digest = hash("secret123", "abcd1234");
        assert_eq!(digest, SECRET123_ABCD1234);
        // One word renders as seven hex digits
        assert_eq!(digest.len(), 255);
    }

    #[test]
    fn test_hash_empty_inputs() {
        assert_eq!(
            hash("", ""),
            "3ed49a77b403ea4440963665ce8686c7af84fc5f57d525672b2b547eaab69a20763afeffa279c96521db8081225c3c916d92d8dcb13a10b43f97eebca0dc1102af6ff3964f15f23f87e4723c8c0c40cbc1f93f2995439c878c4f15df6fd52c446f442cbed887f3782dd271e6c737ecc93573059f4ce9819e25b82800a5c18d5e"
        );
    }

    #[test]
    fn test_hash_variable_width_digest() {
        let digest = hash("password", "salt");
        assert_eq!(digest.len(), 252);
        assert!(digest.starts_with("b4c820087ee13359"));
    }

    #[test]
    fn test_hash_non_ascii_uses_low_byte() {
        // 'é' is U+00E9, so it is kept as 0xe9
        assert!(hash("héllo", "sel").starts_with("3bd41c03ab1505f4"));
        // U+0169 and U+0069 share a low byte
        assert_eq!(hash("\u{169}", "s"), hash("i", "s"));
    }

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash("secret123", "abcd1234"), hash("secret123", "abcd1234"));
    }

    #[test]
    fn test_hash_digest_is_lowercase_hex() {
        let digest = hash("correct horse", "battery staple");
        assert!((64..=256).contains(&digest.len()));
        assert!(digest.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn test_salt_changes_digest() {
        assert_ne!(hash("secret123", "abcd1234"), hash("secret123", "abcd1235"));
    }

    #[test]
    fn test_generate_salt_shape() {
        let salt = generate_salt(DEFAULT_SALT_LENGTH);
        assert_eq!(salt.len(), 16);
        assert!(salt.chars().all(|c| c.is_ascii_alphanumeric()));

        assert_eq!(generate_salt(0), "");
        assert_eq!(generate_salt(64).len(), 64);
    }

    #[test]
    fn test_generate_salt_with_seeded_rng_is_reproducible() {
        let a = generate_salt_with(&mut StdRng::seed_from_u64(42), 16);
        let b = generate_salt_with(&mut StdRng::seed_from_u64(42), 16);
        assert_eq!(a, b);
    }

    #[test]
    fn test_compose_and_verify() {
        let credential = compose_hash("TestPassword123!");
        assert_eq!(credential.salt.len(), DEFAULT_SALT_LENGTH);
        assert_eq!(credential.hash, hash("TestPassword123!", &credential.salt));

        assert!(verify_password("TestPassword123!", &credential.hash, &credential.salt));
        assert!(credential.verify("TestPassword123!"));
        assert!(!credential.verify("WrongPassword123!"));
    }

    #[test]
    fn test_compose_hash_with_custom_length() {
        let mut rng = StdRng::seed_from_u64(7);
        let credential = compose_hash_with(&mut rng, "pw", 32);
        assert_eq!(credential.salt.len(), 32);
    }

    #[test]
    fn test_verify_rejects_tampered_hash() {
        let mut tampered = SECRET123_ABCD1234.to_string();
        tampered.replace_range(0..1, "f");
        assert!(!verify_password("secret123", &tampered, "abcd1234"));
        assert!(verify_password("secret123", SECRET123_ABCD1234, "abcd1234"));
    }

    #[test]
    fn test_credential_serde_shape() {
        let credential = Credential {
            hash: "ab".to_string(),
            salt: "cd".to_string(),
        };
        let json = serde_json::to_value(&credential).unwrap();
        assert_eq!(json, serde_json::json!({ "hash": "ab", "salt": "cd" }));
    }
}
