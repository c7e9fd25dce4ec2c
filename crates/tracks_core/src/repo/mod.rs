//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity type.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Every query on owned rows is scoped by `account_id`.
//! - Lookups that miss return `Ok(None)`; `NotFound` is reserved for writes
//!   that target a missing row.
//! - Writes call the model's `validate()` before touching SQL.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::item::ReorderInputError;
use crate::model::todo::TodoValidationError;
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod account_repo;
pub mod item_repo;
pub mod todo_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error shared by all repositories.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Write targeted a row that does not exist for this owner.
    NotFound { entity: &'static str, id: i64 },
    /// Reorder request is not a permutation of the owner's items.
    InvalidReorder(ReorderInputError),
    TodoValidation(TodoValidationError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted into a valid model.
    InvalidData(String),
    /// Write collided with a unique column held by another row.
    Duplicate {
        entity: &'static str,
        field: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidReorder(err) => write!(f, "invalid reorder input: {err}"),
            Self::TodoValidation(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Duplicate { entity, field } => {
                write!(f, "{entity} with this {field} already exists")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidReorder(err) => Some(err),
            Self::TodoValidation(err) => Some(err),
            Self::NotFound { .. }
            | Self::UninitializedConnection { .. }
            | Self::InvalidData(_)
            | Self::Duplicate { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ReorderInputError> for RepoError {
    fn from(value: ReorderInputError) -> Self {
        Self::InvalidReorder(value)
    }
}

impl From<TodoValidationError> for RepoError {
    fn from(value: TodoValidationError) -> Self {
        Self::TodoValidation(value)
    }
}

/// Rejects connections that did not go through `open_db*`.
fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

/// True when `err` is a UNIQUE violation on `table.column`.
fn is_unique_violation(err: &rusqlite::Error, table_column: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, Some(message)) => {
            failure.code == ErrorCode::ConstraintViolation
                && message.starts_with("UNIQUE constraint failed")
                && message.contains(table_column)
        }
        _ => false,
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn int_to_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
