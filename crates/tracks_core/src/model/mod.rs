//! Domain model for accounts and the work items they own.
//!
//! # Responsibility
//! - Define canonical records used by repositories and services.
//! - Hold field-level invariants (`validate`) next to the data they guard.
//!
//! # Invariants
//! - Every record is owned by exactly one account; there are no
//!   cross-account references.
//! - Item positions are contiguous `1..=N` per owner and kind.

pub mod account;
pub mod item;
pub mod todo;
