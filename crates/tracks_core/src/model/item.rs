//! Position-ranked work items (projects and contexts).
//!
//! # Invariants
//! - `position` is 1-based and contiguous within one owner and kind.
//! - A reorder request is a permutation of exactly the owner's item ids.

use crate::model::account::AccountId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static NON_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Numeric primary identity assigned by the store.
pub type ItemId = i64;

/// State given to freshly created items.
pub const DEFAULT_ITEM_STATE: &str = "active";

/// Which ordered collection an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Project,
    Context,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Context => "context",
        }
    }

    /// Backing table name.
    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::Context => "contexts",
        }
    }

    /// Request parameter keys that name an item of this kind by slug,
    /// in lookup priority order.
    pub fn alternate_param_keys(self) -> [&'static str; 2] {
        match self {
            Self::Project => ["project", "project_id"],
            Self::Context => ["context", "context_id"],
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One project or context row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionedItem {
    pub id: ItemId,
    pub account_id: AccountId,
    pub kind: ItemKind,
    pub name: String,
    /// URL-safe slug; unique enough for lookup within one owner.
    pub url_friendly_name: String,
    /// Free-text lifecycle tag such as `active`, `hidden` or `completed`.
    pub state: String,
    pub position: i64,
}

/// Derives a URL-safe slug from a display name.
///
/// Lowercases, collapses every run of non-alphanumeric characters to `_`,
/// and trims leading/trailing underscores.
pub fn url_friendly_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    NON_SLUG_RE
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Why a requested ordering cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderInputError {
    /// Id is not part of the owner's collection.
    ForeignItem(ItemId),
    /// Id appears more than once.
    DuplicateItem(ItemId),
    /// Owned ids left out of the request.
    MissingItems(Vec<ItemId>),
}

impl Display for ReorderInputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForeignItem(id) => write!(f, "item {id} is not owned by this account"),
            Self::DuplicateItem(id) => write!(f, "item {id} is listed more than once"),
            Self::MissingItems(ids) => write!(f, "ordering omits owned items {ids:?}"),
        }
    }
}

impl Error for ReorderInputError {}

/// Checks that `requested` is a permutation of `owned`.
pub fn check_permutation(owned: &[ItemId], requested: &[ItemId]) -> Result<(), ReorderInputError> {
    let owned_set: HashSet<ItemId> = owned.iter().copied().collect();
    let mut seen = HashSet::with_capacity(requested.len());
    for &id in requested {
        if !owned_set.contains(&id) {
            return Err(ReorderInputError::ForeignItem(id));
        }
        if !seen.insert(id) {
            return Err(ReorderInputError::DuplicateItem(id));
        }
    }

    let missing: Vec<ItemId> = owned
        .iter()
        .copied()
        .filter(|id| !seen.contains(id))
        .collect();
    if !missing.is_empty() {
        return Err(ReorderInputError::MissingItems(missing));
    }
    Ok(())
}
