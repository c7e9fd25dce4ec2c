//! Resolution of one owned item from loosely-typed request parameters.
//!
//! Keys are checked in a fixed priority order and only the first present
//! key is used; a miss under that key is final.
//!
//! 1. `url_friendly_name` -> slug lookup
//! 2. `id` made only of ASCII digits -> numeric lookup
//! 3. any other `id` -> slug lookup
//! 4. kind-specific keys (`project`/`project_id`, `context`/`context_id`)
//!    -> slug lookup

use crate::model::account::AccountId;
use crate::model::item::{ItemId, ItemKind, PositionedItem};
use crate::repo::item_repo::ItemRepository;
use crate::repo::RepoResult;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static NUMERIC_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid numeric id regex"));

/// Request parameter map as handed over by the presentation layer.
pub type Params = HashMap<String, String>;

/// Lookup selected from a parameter map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey<'a> {
    Id(ItemId),
    FriendlyName(&'a str),
    /// All-digit `id` too large for an `ItemId`; matches nothing.
    IdOutOfRange,
}

/// Picks the lookup dictated by the highest-priority key present.
pub fn lookup_key(kind: ItemKind, params: &Params) -> Option<LookupKey<'_>> {
    if let Some(name) = params.get("url_friendly_name") {
        return Some(LookupKey::FriendlyName(name));
    }
    if let Some(id) = params.get("id") {
        if NUMERIC_ID_RE.is_match(id) {
            return Some(
                id.parse::<ItemId>()
                    .map_or(LookupKey::IdOutOfRange, LookupKey::Id),
            );
        }
        return Some(LookupKey::FriendlyName(id));
    }
    kind.alternate_param_keys()
        .into_iter()
        .find_map(|key| params.get(key))
        .map(|value| LookupKey::FriendlyName(value.as_str()))
}

/// Finds items of one kind owned by one account.
pub struct ParamResolver<R: ItemRepository> {
    repo: R,
    account_id: AccountId,
    kind: ItemKind,
}

impl<R: ItemRepository> ParamResolver<R> {
    pub fn new(repo: R, account_id: AccountId, kind: ItemKind) -> Self {
        Self {
            repo,
            account_id,
            kind,
        }
    }

    /// Returns the matching item, or `None` when no key applies or the
    /// chosen lookup misses.
    pub fn resolve(&self, params: &Params) -> RepoResult<Option<PositionedItem>> {
        match lookup_key(self.kind, params) {
            None | Some(LookupKey::IdOutOfRange) => Ok(None),
            Some(LookupKey::Id(id)) => self.repo.get_item(self.account_id, self.kind, id),
            Some(LookupKey::FriendlyName(name)) => {
                self.repo
                    .find_by_friendly_name(self.account_id, self.kind, name)
            }
        }
    }
}
