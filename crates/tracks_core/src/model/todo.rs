//! Todo model, limited to what deferred activation and completion history
//! need.
//!
//! # Invariants
//! - A `Deferred` todo always has `show_from`.
//! - A `Completed` todo always has `completed_at`.

use crate::model::account::AccountId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type TodoId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoState {
    Active,
    /// Hidden until `show_from`.
    Deferred,
    Completed,
}

impl TodoState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deferred => "deferred",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "deferred" => Some(Self::Deferred),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    DeferredWithoutShowFrom,
    CompletedWithoutCompletedAt,
    EmptyDescription,
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeferredWithoutShowFrom => write!(f, "deferred todo requires show_from"),
            Self::CompletedWithoutCompletedAt => {
                write!(f, "completed todo requires completed_at")
            }
            Self::EmptyDescription => write!(f, "todo description must not be blank"),
        }
    }
}

impl Error for TodoValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub account_id: AccountId,
    pub description: String,
    pub state: TodoState,
    /// Unix epoch milliseconds.
    pub show_from: Option<i64>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds; set when the todo moves to `Completed`.
    pub completed_at: Option<i64>,
}

impl Todo {
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.description.trim().is_empty() {
            return Err(TodoValidationError::EmptyDescription);
        }
        if self.state == TodoState::Deferred && self.show_from.is_none() {
            return Err(TodoValidationError::DeferredWithoutShowFrom);
        }
        if self.state == TodoState::Completed && self.completed_at.is_none() {
            return Err(TodoValidationError::CompletedWithoutCompletedAt);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Todo, TodoState, TodoValidationError};

    fn todo(state: TodoState) -> Todo {
        Todo {
            id: 1,
            account_id: 1,
            description: "Call bank".to_string(),
            state,
            show_from: None,
            created_at: 0,
            completed_at: None,
        }
    }

    #[test]
    fn validate_requires_timestamps_for_deferred_and_completed() {
        assert!(todo(TodoState::Active).validate().is_ok());
        assert_eq!(
            todo(TodoState::Deferred).validate(),
            Err(TodoValidationError::DeferredWithoutShowFrom)
        );
        assert_eq!(
            todo(TodoState::Completed).validate(),
            Err(TodoValidationError::CompletedWithoutCompletedAt)
        );

        let done = Todo {
            completed_at: Some(1_700_000_000_000),
            ..todo(TodoState::Completed)
        };
        assert!(done.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_description() {
        let blank = Todo {
            description: "  ".to_string(),
            ..todo(TodoState::Active)
        };
        assert_eq!(blank.validate(), Err(TodoValidationError::EmptyDescription));
    }
}
