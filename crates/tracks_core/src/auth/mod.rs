//! Authentication: salted digests, external directory delegation and the
//! per-scheme login dispatcher.
//!
//! # Invariants
//! - Plaintext passwords, salts and digests never reach the logs.
//! - Callers only learn "authenticated account" or "no account".

pub mod directory;
pub mod dispatcher;
pub mod password;
