//! Time-based activation of deferred todos.
//!
//! # Invariants
//! - Readiness is decided at day granularity: a todo is ready once its
//!   `show_from` is at or before local midnight of the current day in the
//!   account's time zone.
//! - Each activation persists on its own; one failure does not undo the
//!   others.

use crate::clock::{start_of_day_millis, Clock};
use crate::model::account::Account;
use crate::model::todo::TodoId;
use crate::repo::todo_repo::TodoRepository;
use crate::repo::{RepoError, RepoResult};
use chrono::{DateTime, Utc};
use log::{info, warn};

/// One todo that could not be activated.
#[derive(Debug)]
pub struct ActivationFailure {
    pub todo_id: TodoId,
    pub error: RepoError,
}

/// Outcome of one activation pass.
#[derive(Debug, Default)]
pub struct ActivationReport {
    pub activated: Vec<TodoId>,
    pub failed: Vec<ActivationFailure>,
}

impl ActivationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Promotes ready deferred todos to `active`.
pub struct DeferredActivationScheduler<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> DeferredActivationScheduler<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Activates every deferred todo of `account` that is ready at `now`.
    ///
    /// # Errors
    /// - Returns `Err` only when the candidate scan fails; per-todo failures
    ///   are collected in the report.
    pub fn activate_ready(&self, account: &Account, now: DateTime<Utc>) -> RepoResult<ActivationReport> {
        let cutoff_ms = start_of_day_millis(now, account.utc_offset_minutes);
        let candidates = self.repo.list_deferred_ready(account.id, cutoff_ms)?;

        let mut report = ActivationReport::default();
        for todo in candidates {
            match self.repo.activate_todo(account.id, todo.id) {
                Ok(()) => report.activated.push(todo.id),
                Err(error) => {
                    warn!(
                        "event=deferred_activate module=scheduler status=error account_id={} todo_id={} error={error}",
                        account.id, todo.id
                    );
                    report.failed.push(ActivationFailure {
                        todo_id: todo.id,
                        error,
                    });
                }
            }
        }

        info!(
            "event=deferred_activate module=scheduler status=ok account_id={} activated={} failed={}",
            account.id,
            report.activated.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Same as [`Self::activate_ready`] using `clock` for the current time.
    pub fn activate_ready_now(
        &self,
        account: &Account,
        clock: &impl Clock,
    ) -> RepoResult<ActivationReport> {
        self.activate_ready(account, clock.now())
    }
}
