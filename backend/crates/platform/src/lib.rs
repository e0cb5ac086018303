//! Platform Crate - Authentication Primitives
//!
//! This crate provides the technical foundations every login, registration
//! and session check builds on:
//! - Cryptographic utilities (HMAC-SHA256, base64url)
//! - Salted password digests (bespoke memory-hard-style mixing)
//! - HS256 signed tokens with optional expiry
//! - Runtime configuration for the above
//!
//! Identifiers live in `kernel::id`.

pub mod config;
pub mod crypto;
pub mod password;
pub mod token;

#[cfg(test)]
mod tests;
