//! ObjectId-style Identifiers
//!
//! Lowercase hex laid out as
//! `timestamp | machine(6) | process(4) | counter(6)`.
//! The timestamp is unpadded, which makes an id 24 characters for any clock
//! reading between 1985 and 2106.
//!
//! The leading timestamp gives coarse chronological ordering, the counter
//! keeps ids produced by one generator within the same second distinct, and
//! the random machine/process fields give weak distinctness across processes.
//! There is no cross-process coordination.
//!
//! ## Usage
//! ```rust
//! use kernel::id::{ObjectIdGenerator, is_valid_id};
//!
//! let generator = ObjectIdGenerator::new();
//! let id = generator.generate();
//! assert_eq!(id.as_str().len(), 24);
//! assert!(is_valid_id(id.as_str()).is_ok());
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::error::app_error::{AppError, AppResult};

/// Length of a well-formed identifier
pub const OBJECT_ID_LENGTH: usize = 24;

/// Counter values cycle through `0..COUNTER_MODULUS`
pub const COUNTER_MODULUS: u32 = 0xFF_FFFF;

/// Machine, process and counter digits
const FIXED_FIELDS_LENGTH: usize = 16;

const MACHINE_MASK: u32 = 0xFF_FFFF;
const PROCESS_MASK: u32 = 0xFFFF;

// ============================================================================
// Validation errors
// ============================================================================

/// Why a string is not an identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectIdError {
    #[error("expected {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("non-hex character {found:?} at position {position}")]
    InvalidCharacter { position: usize, found: char },
}

// ============================================================================
// ObjectId
// ============================================================================

/// Identifier string
///
/// Ids from [`ObjectId::parse_str`] or deserialization have the checked
/// 24-character shape. Generated ids are 24 characters only while the
/// timestamp needs eight hex digits (see [`ObjectIdGenerator::generate_with`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Validate `s` and wrap it
    pub fn parse_str(s: &str) -> AppResult<Self> {
        check_shape(s)
            .map(|()| Self(s.to_string()))
            .map_err(|e| AppError::invalid_input(format!("Invalid ObjectId: {}", e)).with_source(e))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Seconds since the epoch encoded ahead of the fixed-width fields
    ///
    /// Reads everything but the trailing 16 characters, so unpadded
    /// timestamps of any width decode.
    pub fn timestamp_secs(&self) -> Option<u64> {
        let prefix = self.0.len().checked_sub(FIXED_FIELDS_LENGTH)?;
        u64::from_str_radix(self.0.get(..prefix)?, 16).ok()
    }
}

fn check_shape(s: &str) -> Result<(), ObjectIdError> {
    let actual = s.chars().count();
    if actual != OBJECT_ID_LENGTH {
        return Err(ObjectIdError::InvalidLength {
            expected: OBJECT_ID_LENGTH,
            actual,
        });
    }
    if let Some((position, found)) = s.chars().enumerate().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(ObjectIdError::InvalidCharacter { position, found });
    }
    Ok(())
}

/// Check that `id` has the identifier shape
///
/// Failures are returned as values; nothing panics.
#[inline]
pub fn is_valid_id(id: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(id)
}

impl FromStr for ObjectId {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        ObjectId::parse_str(s)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        check_shape(&raw).map_err(serde::de::Error::custom)?;
        Ok(Self(raw))
    }
}

// ============================================================================
// Counter
// ============================================================================

/// Monotonic counter shared by every id a generator produces
///
/// Each call to [`IdCounter::advance`] returns a value no other call has seen
/// until the counter wraps after [`COUNTER_MODULUS`] calls, regardless of how
/// many threads share it.
#[derive(Debug)]
pub struct IdCounter(AtomicU32);

impl IdCounter {
    /// Start at `start % COUNTER_MODULUS`
    pub fn new(start: u32) -> Self {
        Self(AtomicU32::new(start % COUNTER_MODULUS))
    }

    /// Start at a random position
    pub fn random() -> Self {
        Self::new(rand::rng().next_u32())
    }

    /// Advance and return the new value
    pub fn advance(&self) -> u32 {
        let prev = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| {
                Some((c + 1) % COUNTER_MODULUS)
            })
            .unwrap_or_else(|c| c);
        (prev + 1) % COUNTER_MODULUS
    }

    /// Current value without advancing
    pub fn current(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for IdCounter {
    fn default() -> Self {
        Self::random()
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Produces [`ObjectId`]s from the clock, a random source and an owned counter
#[derive(Debug, Default)]
pub struct ObjectIdGenerator {
    counter: IdCounter,
}

impl ObjectIdGenerator {
    /// Generator with a randomly seeded counter
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter(counter: IdCounter) -> Self {
        Self { counter }
    }

    pub fn counter(&self) -> &IdCounter {
        &self.counter
    }

    /// Generate using the thread RNG and the system clock
    pub fn generate(&self) -> ObjectId {
        self.generate_with(&mut rand::rng(), Utc::now())
    }

    /// Generate with an explicit random source and clock reading
    ///
    /// The timestamp field is the epoch seconds in hex without padding, so it
    /// is eight characters wide for any date between 1985 and 2106.
    pub fn generate_with<R: RngCore + ?Sized>(&self, rng: &mut R, now: DateTime<Utc>) -> ObjectId {
        let machine_id = rng.next_u32() & MACHINE_MASK;
        let process_id = rng.next_u32() & PROCESS_MASK;
        let counter = self.counter.advance();

        ObjectId(format!(
            "{:x}{:06x}{:04x}{:06x}",
            now.timestamp(),
            machine_id,
            process_id,
            counter
        ))
    }
}

static DEFAULT_GENERATOR: LazyLock<ObjectIdGenerator> = LazyLock::new(|| {
    let generator = ObjectIdGenerator::new();
    tracing::debug!(
        counter_start = generator.counter().current(),
        "Initialized process ObjectId generator"
    );
    generator
});

/// Generate an id from the process-wide default generator
pub fn generate_id() -> ObjectId {
    DEFAULT_GENERATOR.generate()
}
