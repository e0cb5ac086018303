//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum shared by the authentication primitives and
//! the layers that consume them.

use serde::Serialize;

/// Error classification
///
/// Verification failures are answered with `None`/`false` and never become an
/// [`AppError`](super::app_error::AppError), so only input-shape failures
/// have a kind.
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::InvalidInput;
/// assert_eq!(kind.as_str(), "Invalid Input");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed input (wrong shape, wrong length, bad characters)
    InvalidInput,
}

impl ErrorKind {
    /// Human readable label
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "Invalid Input",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
