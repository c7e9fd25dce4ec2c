//! Account and ordered-work-item core for Tracks.
//!
//! This crate owns the invariants of authentication, position-ranked
//! project/context lists, parameter-based item resolution and deferred todo
//! activation. Presentation layers call into it; it never calls out except
//! through the `CredentialValidator` and `Clock` seams.

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::directory::{CredentialValidator, NoDirectory, ValidatorError};
pub use auth::dispatcher::AuthenticationDispatcher;
pub use auth::password::{password_decision, salted_digest, PasswordDecision, PasswordHasher};
pub use clock::{start_of_day_millis, Clock, FixedClock, SystemClock};
pub use config::{AuthConfig, AuthScheme, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::account::{Account, AccountId, AccountValidationError, Credentials, NewAccount};
pub use model::item::{ItemId, ItemKind, PositionedItem, ReorderInputError};
pub use model::todo::{Todo, TodoId, TodoState, TodoValidationError};
pub use repo::account_repo::{AccountRepository, SqliteAccountRepository};
pub use repo::item_repo::{ItemRepository, SqliteItemRepository};
pub use repo::todo_repo::{SqliteTodoRepository, TodoRepository};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::{AccountError, AccountService};
pub use service::deferred_scheduler::{
    ActivationFailure, ActivationReport, DeferredActivationScheduler,
};
pub use service::param_resolver::{lookup_key, LookupKey, ParamResolver, Params};
pub use service::position_manager::{PositionError, PositionManager};
pub use service::todo_service::TodoService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
