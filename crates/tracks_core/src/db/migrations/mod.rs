//! Ordered schema steps for the tracks store.
//!
//! | version | name               | adds                                   |
//! |---------|--------------------|----------------------------------------|
//! | 1       | accounts           | login identities and auth settings     |
//! | 2       | positioned_items   | ranked `projects` and `contexts`       |
//! | 3       | todos              | todos with deferred `show_from`        |
//! | 4       | todo_completion    | `todos.completed_at` for history       |
//!
//! Pending steps run in one transaction; `user_version` moves with each
//! step, so a failure leaves the store at its previous version.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "accounts",
        sql: include_str!("0001_accounts.sql"),
    },
    SchemaStep {
        version: 2,
        name: "positioned_items",
        sql: include_str!("0002_positioned_items.sql"),
    },
    SchemaStep {
        version: 3,
        name: "todos",
        sql: include_str!("0003_todos.sql"),
    },
    SchemaStep {
        version: 4,
        name: "todo_completion",
        sql: include_str!("0004_todo_completion.sql"),
    },
];

/// Schema version repositories expect on a ready connection.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the store is newer than this build.
/// - `Migration` naming the step that failed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }
    if from_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in SCHEMA_STEPS.iter().filter(|step| step.version > from_version) {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.execute_batch(&format!("PRAGMA user_version = {};", step.version)))
            .map_err(|source| DbError::Migration {
                version: step.version,
                name: step.name,
                source,
            })?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from_version} to_version={latest}");
    Ok(())
}
