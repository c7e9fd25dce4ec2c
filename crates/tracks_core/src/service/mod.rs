//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers decoupled from storage details.

pub mod account_service;
pub mod deferred_scheduler;
pub mod param_resolver;
pub mod position_manager;
pub mod todo_service;
