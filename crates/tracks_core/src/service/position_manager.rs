//! Ordered collection management for one owner's projects or contexts.
//!
//! # Responsibility
//! - Append, remove and reorder items while keeping positions dense.
//! - Navigate between neighbours that share a lifecycle state.
//!
//! # Invariants
//! - `reorder` is all-or-nothing; invalid input leaves positions untouched.
//! - Navigation only sees items in the same `state` as the anchor item.

use crate::model::account::AccountId;
use crate::model::item::{url_friendly_name, ItemId, ItemKind, PositionedItem, ReorderInputError};
use crate::repo::item_repo::ItemRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from position manager operations.
#[derive(Debug)]
pub enum PositionError {
    /// Reorder list is not a permutation of the owner's items.
    InvalidReorderInput(ReorderInputError),
    /// Name is blank or yields an empty slug.
    InvalidName,
    /// Target item does not exist in this collection.
    NotFound { kind: ItemKind, id: ItemId },
    Repo(RepoError),
}

impl Display for PositionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidReorderInput(err) => write!(f, "invalid reorder input: {err}"),
            Self::InvalidName => write!(f, "item name must contain letters or digits"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PositionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidReorderInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InvalidName | Self::NotFound { .. } => None,
        }
    }
}

impl From<RepoError> for PositionError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidReorder(err) => Self::InvalidReorderInput(err),
            other => Self::Repo(other),
        }
    }
}

/// Ordered view over one owner's collection of one item kind.
pub struct PositionManager<R: ItemRepository> {
    repo: R,
    account_id: AccountId,
    kind: ItemKind,
}

impl<R: ItemRepository> PositionManager<R> {
    pub fn new(repo: R, account_id: AccountId, kind: ItemKind) -> Self {
        Self {
            repo,
            account_id,
            kind,
        }
    }

    /// Appends an item at the end, deriving its slug from `name`.
    pub fn append(&self, name: &str) -> Result<PositionedItem, PositionError> {
        let name = name.trim();
        let slug = url_friendly_name(name);
        if slug.is_empty() {
            return Err(PositionError::InvalidName);
        }
        let item = self
            .repo
            .create_item(self.account_id, self.kind, name, &slug)?;
        info!(
            "event=item_append module=position status=ok kind={} item_id={} position={}",
            self.kind, item.id, item.position
        );
        Ok(item)
    }

    /// Deletes one item and closes the gap it leaves.
    pub fn remove(&self, id: ItemId) -> Result<(), PositionError> {
        self.repo
            .delete_item(self.account_id, self.kind, id)
            .map_err(|err| self.not_found_or(err, id))
    }

    /// Assigns positions `1..=N` in the order of `ordered_ids`.
    ///
    /// # Errors
    /// - `InvalidReorderInput` when an id is foreign, repeated or missing.
    pub fn reorder(&self, ordered_ids: &[ItemId]) -> Result<(), PositionError> {
        match self
            .repo
            .update_positions(self.account_id, self.kind, ordered_ids)
        {
            Ok(()) => {
                info!(
                    "event=item_reorder module=position status=ok kind={} count={}",
                    self.kind,
                    ordered_ids.len()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=item_reorder module=position status=error kind={} error={err}",
                    self.kind
                );
                Err(err.into())
            }
        }
    }

    pub fn set_state(&self, id: ItemId, state: &str) -> Result<(), PositionError> {
        self.repo
            .set_item_state(self.account_id, self.kind, id, state)
            .map_err(|err| self.not_found_or(err, id))
    }

    /// All items in ascending position order.
    pub fn items(&self) -> Result<Vec<PositionedItem>, PositionError> {
        Ok(self.repo.list_items(self.account_id, self.kind)?)
    }

    /// Items whose `state` equals `state`, in ascending position order.
    pub fn items_in_state(&self, state: &str) -> Result<Vec<PositionedItem>, PositionError> {
        let mut items = self.items()?;
        items.retain(|item| item.state == state);
        Ok(items)
    }

    /// Next item sharing `item.state`, or `None` when `item` is last or absent.
    pub fn next_from(&self, item: &PositionedItem) -> Result<Option<PositionedItem>, PositionError> {
        self.offset_from(item, 1)
    }

    /// Previous item sharing `item.state`, or `None` when `item` is first or
    /// absent.
    pub fn previous_from(
        &self,
        item: &PositionedItem,
    ) -> Result<Option<PositionedItem>, PositionError> {
        self.offset_from(item, -1)
    }

    fn offset_from(
        &self,
        item: &PositionedItem,
        offset: isize,
    ) -> Result<Option<PositionedItem>, PositionError> {
        let items = self.items_in_state(&item.state)?;
        let Some(index) = items.iter().position(|candidate| candidate.id == item.id) else {
            return Ok(None);
        };
        Ok(index
            .checked_add_signed(offset)
            .and_then(|target| items.into_iter().nth(target)))
    }

    fn not_found_or(&self, err: RepoError, id: ItemId) -> PositionError {
        match err {
            RepoError::NotFound { .. } => PositionError::NotFound {
                kind: self.kind,
                id,
            },
            other => other.into(),
        }
    }
}
