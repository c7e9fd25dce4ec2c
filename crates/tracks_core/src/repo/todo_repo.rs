//! Todo repository contract and SQLite implementation.
//!
//! # Invariants
//! - Deferred listings order by `show_from ASC, created_at DESC, id DESC`.
//! - `activate_todo` only moves rows that are still `deferred`.
//! - Completed listings order by `completed_at DESC, id DESC`; both bounds
//!   of the completion window queries are inclusive.

use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::account::AccountId;
use crate::model::todo::{Todo, TodoId, TodoState};
use rusqlite::{params, Connection, Row};

const TODO_SELECT_SQL: &str = "SELECT
    id,
    account_id,
    description,
    state,
    show_from,
    created_at,
    completed_at
FROM todos";

/// Repository interface for todo persistence.
pub trait TodoRepository {
    /// Inserts `todo` and returns the stored row. `todo.id` and
    /// `todo.created_at` are assigned by the store.
    fn create_todo(&self, todo: &Todo) -> RepoResult<Todo>;
    fn get_todo(&self, account_id: AccountId, id: TodoId) -> RepoResult<Option<Todo>>;
    /// Every deferred todo of the owner.
    fn list_deferred(&self, account_id: AccountId) -> RepoResult<Vec<Todo>>;
    /// Deferred todos whose `show_from` is at or before `cutoff_ms`.
    fn list_deferred_ready(&self, account_id: AccountId, cutoff_ms: i64) -> RepoResult<Vec<Todo>>;
    /// Moves one deferred todo to `active`.
    fn activate_todo(&self, account_id: AccountId, id: TodoId) -> RepoResult<()>;
    /// Marks one not yet completed todo as completed at `completed_at_ms`.
    fn complete_todo(
        &self,
        account_id: AccountId,
        id: TodoId,
        completed_at_ms: i64,
    ) -> RepoResult<()>;
    /// Completed todos, most recently completed first.
    fn list_completed(&self, account_id: AccountId) -> RepoResult<Vec<Todo>>;
    /// Completed todos with `completed_at >= since_ms`.
    fn list_completed_since(&self, account_id: AccountId, since_ms: i64) -> RepoResult<Vec<Todo>>;
    /// Completed todos with `completed_at <= until_ms`.
    fn list_completed_until(&self, account_id: AccountId, until_ms: i64) -> RepoResult<Vec<Todo>>;
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_many(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Todo>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut todos = Vec::new();
        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(row)?);
        }
        Ok(todos)
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn create_todo(&self, todo: &Todo) -> RepoResult<Todo> {
        todo.validate()?;

        self.conn.execute(
            "INSERT INTO todos (account_id, description, state, show_from, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                todo.account_id,
                todo.description,
                todo.state.as_str(),
                todo.show_from,
                todo.completed_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_todo(todo.account_id, id)?
            .ok_or(RepoError::NotFound { entity: "todo", id })
    }

    fn get_todo(&self, account_id: AccountId, id: TodoId) -> RepoResult<Option<Todo>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TODO_SELECT_SQL} WHERE account_id = ?1 AND id = ?2;"
        ))?;
        let mut rows = stmt.query(params![account_id, id])?;
        rows.next()?.map(parse_todo_row).transpose()
    }

    fn list_deferred(&self, account_id: AccountId) -> RepoResult<Vec<Todo>> {
        self.query_many(
            &format!(
                "{TODO_SELECT_SQL}
                 WHERE account_id = ?1 AND state = 'deferred'
                 ORDER BY show_from ASC, created_at DESC, id DESC;"
            ),
            [account_id],
        )
    }

    fn list_deferred_ready(&self, account_id: AccountId, cutoff_ms: i64) -> RepoResult<Vec<Todo>> {
        self.query_many(
            &format!(
                "{TODO_SELECT_SQL}
                 WHERE account_id = ?1 AND state = 'deferred' AND show_from <= ?2
                 ORDER BY show_from ASC, created_at DESC, id DESC;"
            ),
            params![account_id, cutoff_ms],
        )
    }

    fn activate_todo(&self, account_id: AccountId, id: TodoId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE todos
             SET state = 'active',
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE account_id = ?1 AND id = ?2 AND state = 'deferred';",
            params![account_id, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "todo", id });
        }
        Ok(())
    }

    fn complete_todo(
        &self,
        account_id: AccountId,
        id: TodoId,
        completed_at_ms: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE todos
             SET state = 'completed',
                 completed_at = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE account_id = ?1 AND id = ?2 AND state <> 'completed';",
            params![account_id, id, completed_at_ms],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "todo", id });
        }
        Ok(())
    }

    fn list_completed(&self, account_id: AccountId) -> RepoResult<Vec<Todo>> {
        self.query_many(
            &format!(
                "{TODO_SELECT_SQL}
                 WHERE account_id = ?1 AND state = 'completed' AND completed_at IS NOT NULL
                 ORDER BY completed_at DESC, id DESC;"
            ),
            [account_id],
        )
    }

    fn list_completed_since(&self, account_id: AccountId, since_ms: i64) -> RepoResult<Vec<Todo>> {
        self.query_many(
            &format!(
                "{TODO_SELECT_SQL}
                 WHERE account_id = ?1 AND state = 'completed' AND completed_at >= ?2
                 ORDER BY completed_at DESC, id DESC;"
            ),
            params![account_id, since_ms],
        )
    }

    fn list_completed_until(&self, account_id: AccountId, until_ms: i64) -> RepoResult<Vec<Todo>> {
        self.query_many(
            &format!(
                "{TODO_SELECT_SQL}
                 WHERE account_id = ?1 AND state = 'completed' AND completed_at <= ?2
                 ORDER BY completed_at DESC, id DESC;"
            ),
            params![account_id, until_ms],
        )
    }
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<Todo> {
    let state_text: String = row.get("state")?;
    let state = TodoState::parse(&state_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid todo state `{state_text}` in todos.state"))
    })?;

    let todo = Todo {
        id: row.get("id")?,
        account_id: row.get("account_id")?,
        description: row.get("description")?,
        state,
        show_from: row.get("show_from")?,
        created_at: row.get("created_at")?,
        completed_at: row.get("completed_at")?,
    };
    todo.validate()?;
    Ok(todo)
}
