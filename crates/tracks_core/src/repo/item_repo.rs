//! Positioned item (project/context) repository and SQLite implementation.
//!
//! # Responsibility
//! - Persist per-owner ordered collections and keep their positions dense.
//! - Own every SQL path that writes `position`.
//!
//! # Invariants
//! - Listing is deterministic: `position ASC, id ASC`.
//! - Positions stay contiguous `1..=N`: inserts append, deletes re-sequence,
//!   reorders rewrite the whole collection.
//! - Position rewrites run in one `IMMEDIATE` transaction, so concurrent
//!   writers on the same database serialize and readers never observe a
//!   half-applied order.

use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::account::AccountId;
use crate::model::item::{check_permutation, ItemId, ItemKind, PositionedItem, DEFAULT_ITEM_STATE};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

/// Repository interface for one owner's ordered item collections.
pub trait ItemRepository {
    /// Appends a new item at the end of the owner's order.
    fn create_item(
        &self,
        account_id: AccountId,
        kind: ItemKind,
        name: &str,
        url_friendly_name: &str,
    ) -> RepoResult<PositionedItem>;
    fn get_item(
        &self,
        account_id: AccountId,
        kind: ItemKind,
        id: ItemId,
    ) -> RepoResult<Option<PositionedItem>>;
    /// First item (by position) carrying `url_friendly_name`.
    fn find_by_friendly_name(
        &self,
        account_id: AccountId,
        kind: ItemKind,
        url_friendly_name: &str,
    ) -> RepoResult<Option<PositionedItem>>;
    /// All items ordered by ascending position.
    fn list_items(&self, account_id: AccountId, kind: ItemKind) -> RepoResult<Vec<PositionedItem>>;
    fn set_item_state(
        &self,
        account_id: AccountId,
        kind: ItemKind,
        id: ItemId,
        state: &str,
    ) -> RepoResult<()>;
    /// Assigns positions `1..=N` following `ordered_ids`.
    ///
    /// Fails with `InvalidReorder` and writes nothing unless `ordered_ids` is
    /// a permutation of the owner's item ids.
    fn update_positions(
        &self,
        account_id: AccountId,
        kind: ItemKind,
        ordered_ids: &[ItemId],
    ) -> RepoResult<()>;
    /// Deletes one item and closes the gap it leaves.
    fn delete_item(&self, account_id: AccountId, kind: ItemKind, id: ItemId) -> RepoResult<()>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(
        &self,
        account_id: AccountId,
        kind: ItemKind,
        name: &str,
        url_friendly_name: &str,
    ) -> RepoResult<PositionedItem> {
        let table = kind.table();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let next_position: i64 = tx.query_row(
            &format!("SELECT COALESCE(MAX(position), 0) + 1 FROM {table} WHERE account_id = ?1;"),
            [account_id],
            |row| row.get(0),
        )?;
        tx.execute(
            &format!(
                "INSERT INTO {table} (account_id, name, url_friendly_name, state, position)
                 VALUES (?1, ?2, ?3, ?4, ?5);"
            ),
            params![
                account_id,
                name,
                url_friendly_name,
                DEFAULT_ITEM_STATE,
                next_position
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        self.get_item(account_id, kind, id)?
            .ok_or(RepoError::NotFound {
                entity: kind.as_str(),
                id,
            })
    }

    fn get_item(
        &self,
        account_id: AccountId,
        kind: ItemKind,
        id: ItemId,
    ) -> RepoResult<Option<PositionedItem>> {
        let item = self
            .conn
            .query_row(
                &format!("{} WHERE account_id = ?1 AND id = ?2;", select_sql(kind)),
                params![account_id, id],
                |row| parse_item_row(row, kind),
            )
            .optional()?;
        Ok(item)
    }

    fn find_by_friendly_name(
        &self,
        account_id: AccountId,
        kind: ItemKind,
        url_friendly_name: &str,
    ) -> RepoResult<Option<PositionedItem>> {
        let item = self
            .conn
            .query_row(
                &format!(
                    "{} WHERE account_id = ?1 AND url_friendly_name = ?2
                     ORDER BY position ASC, id ASC
                     LIMIT 1;",
                    select_sql(kind)
                ),
                params![account_id, url_friendly_name],
                |row| parse_item_row(row, kind),
            )
            .optional()?;
        Ok(item)
    }

    fn list_items(&self, account_id: AccountId, kind: ItemKind) -> RepoResult<Vec<PositionedItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE account_id = ?1 ORDER BY position ASC, id ASC;",
            select_sql(kind)
        ))?;
        let items = stmt
            .query_map([account_id], |row| parse_item_row(row, kind))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    fn set_item_state(
        &self,
        account_id: AccountId,
        kind: ItemKind,
        id: ItemId,
        state: &str,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE {}
                 SET state = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE account_id = ?1 AND id = ?2;",
                kind.table()
            ),
            params![account_id, id, state],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: kind.as_str(),
                id,
            });
        }
        Ok(())
    }

    fn update_positions(
        &self,
        account_id: AccountId,
        kind: ItemKind,
        ordered_ids: &[ItemId],
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let owned = list_item_ids(&tx, account_id, kind)?;
        // Dropping `tx` on the error path rolls back; nothing was written yet.
        check_permutation(&owned, ordered_ids)?;
        write_positions(&tx, account_id, kind, ordered_ids)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_item(&self, account_id: AccountId, kind: ItemKind, id: ItemId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            &format!("DELETE FROM {} WHERE account_id = ?1 AND id = ?2;", kind.table()),
            params![account_id, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: kind.as_str(),
                id,
            });
        }
        let remaining = list_item_ids(&tx, account_id, kind)?;
        write_positions(&tx, account_id, kind, &remaining)?;
        tx.commit()?;
        Ok(())
    }
}

fn select_sql(kind: ItemKind) -> String {
    format!(
        "SELECT
            id,
            account_id,
            name,
            url_friendly_name,
            state,
            position
         FROM {}",
        kind.table()
    )
}

fn parse_item_row(row: &Row<'_>, kind: ItemKind) -> rusqlite::Result<PositionedItem> {
    Ok(PositionedItem {
        id: row.get("id")?,
        account_id: row.get("account_id")?,
        kind,
        name: row.get("name")?,
        url_friendly_name: row.get("url_friendly_name")?,
        state: row.get("state")?,
        position: row.get("position")?,
    })
}

fn list_item_ids(conn: &Connection, account_id: AccountId, kind: ItemKind) -> RepoResult<Vec<ItemId>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM {} WHERE account_id = ?1 ORDER BY position ASC, id ASC;",
        kind.table()
    ))?;
    let ids = stmt
        .query_map([account_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<ItemId>>>()?;
    Ok(ids)
}

fn write_positions(
    conn: &Connection,
    account_id: AccountId,
    kind: ItemKind,
    ordered_ids: &[ItemId],
) -> RepoResult<()> {
    let mut stmt = conn.prepare(&format!(
        "UPDATE {}
         SET position = ?3,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE account_id = ?1 AND id = ?2;",
        kind.table()
    ))?;
    for (index, id) in ordered_ids.iter().enumerate() {
        let position = i64::try_from(index + 1)
            .map_err(|_| RepoError::InvalidData(format!("position overflow at index {index}")))?;
        stmt.execute(params![account_id, id, position])?;
    }
    Ok(())
}
