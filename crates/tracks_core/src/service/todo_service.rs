//! Todo creation, completion and completion-history use-cases.

use crate::model::account::AccountId;
use crate::model::todo::{Todo, TodoId, TodoState};
use crate::repo::todo_repo::TodoRepository;
use crate::repo::RepoResult;
use chrono::{DateTime, Utc};
use log::info;

/// Todo service facade.
pub struct TodoService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an immediately visible todo.
    pub fn create_todo(&self, account_id: AccountId, description: &str) -> RepoResult<Todo> {
        self.repo
            .create_todo(&draft(account_id, description, TodoState::Active, None))
    }

    /// Creates a todo hidden until `show_from`.
    pub fn defer_todo(
        &self,
        account_id: AccountId,
        description: &str,
        show_from: DateTime<Utc>,
    ) -> RepoResult<Todo> {
        self.repo.create_todo(&draft(
            account_id,
            description,
            TodoState::Deferred,
            Some(show_from.timestamp_millis()),
        ))
    }

    pub fn get_todo(&self, account_id: AccountId, id: TodoId) -> RepoResult<Option<Todo>> {
        self.repo.get_todo(account_id, id)
    }

    /// Deferred todos, earliest `show_from` first.
    pub fn list_deferred(&self, account_id: AccountId) -> RepoResult<Vec<Todo>> {
        self.repo.list_deferred(account_id)
    }

    /// Marks a todo completed at `at`.
    ///
    /// # Errors
    /// - `NotFound` when the todo is missing, foreign or already completed.
    pub fn complete_todo(
        &self,
        account_id: AccountId,
        id: TodoId,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        self.repo.complete_todo(account_id, id, at.timestamp_millis())?;
        info!("event=todo_complete module=todo status=ok account_id={account_id} todo_id={id}");
        Ok(())
    }

    /// Completed todos, most recently completed first.
    pub fn completed_todos(&self, account_id: AccountId) -> RepoResult<Vec<Todo>> {
        self.repo.list_completed(account_id)
    }

    /// Todos completed at or after `since`.
    pub fn completed_within(
        &self,
        account_id: AccountId,
        since: DateTime<Utc>,
    ) -> RepoResult<Vec<Todo>> {
        self.repo
            .list_completed_since(account_id, since.timestamp_millis())
    }

    /// Todos completed at or before `until`.
    pub fn completed_more_than(
        &self,
        account_id: AccountId,
        until: DateTime<Utc>,
    ) -> RepoResult<Vec<Todo>> {
        self.repo
            .list_completed_until(account_id, until.timestamp_millis())
    }
}

fn draft(account_id: AccountId, description: &str, state: TodoState, show_from: Option<i64>) -> Todo {
    Todo {
        id: 0,
        account_id,
        description: description.trim().to_string(),
        state,
        show_from,
        created_at: 0,
        completed_at: None,
    }
}
