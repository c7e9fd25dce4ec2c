//! Account repository contract and SQLite implementation.
//!
//! # Invariants
//! - `login` is unique (enforced by the schema); a collision surfaces as
//!   `RepoError::Duplicate`.
//! - `update_account` never writes `is_admin`; the digest and secret word are
//!   written only when new `Credentials` are passed.
//! - Deleting an account cascades to its projects, contexts and todos.

use super::{
    bool_to_int, ensure_connection_ready, int_to_bool, is_unique_violation, RepoError, RepoResult,
};
use crate::config::AuthScheme;
use crate::model::account::{Account, AccountId, Credentials};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::str::FromStr;

const ACCOUNT_SELECT_SQL: &str = "SELECT
    id,
    login,
    password,
    auth_scheme,
    auth_secret_word,
    is_admin,
    first_name,
    last_name,
    open_id_url,
    utc_offset_minutes
FROM accounts";

/// Repository interface for account persistence.
pub trait AccountRepository {
    /// Inserts `account` and returns the stored row. `account.id` is ignored.
    fn create_account(&self, account: &Account) -> RepoResult<Account>;
    /// Writes profile fields and, when given, replacement credentials in one
    /// transaction.
    fn update_account(
        &self,
        account: &Account,
        credentials: Option<&Credentials>,
    ) -> RepoResult<()>;
    fn set_admin(&self, id: AccountId, is_admin: bool) -> RepoResult<()>;
    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>>;
    fn find_by_login(&self, login: &str) -> RepoResult<Option<Account>>;
    /// First admin account by id, if any.
    fn find_admin(&self) -> RepoResult<Option<Account>>;
    fn count_accounts(&self) -> RepoResult<u64>;
    fn list_accounts(&self) -> RepoResult<Vec<Account>>;
    fn delete_account(&self, id: AccountId) -> RepoResult<()>;
}

/// SQLite-backed account repository.
pub struct SqliteAccountRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_one(&self, sql_suffix: &str, param: impl rusqlite::ToSql) -> RepoResult<Option<Account>> {
        let raw = self
            .conn
            .query_row(&format!("{ACCOUNT_SELECT_SQL} {sql_suffix}"), [param], |row| {
                RawAccount::from_row(row)
            })
            .optional()?;
        raw.map(RawAccount::into_account).transpose()
    }
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn create_account(&self, account: &Account) -> RepoResult<Account> {
        self.conn
            .execute(
                "INSERT INTO accounts (
                    login,
                    password,
                    auth_scheme,
                    auth_secret_word,
                    is_admin,
                    first_name,
                    last_name,
                    open_id_url,
                    utc_offset_minutes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    account.login,
                    account.password,
                    account.auth_scheme.as_str(),
                    account.auth_secret_word,
                    bool_to_int(account.is_admin),
                    account.first_name,
                    account.last_name,
                    account.open_id_url,
                    account.utc_offset_minutes,
                ],
            )
            .map_err(login_conflict_or)?;
        let id = self.conn.last_insert_rowid();
        self.get_account(id)?
            .ok_or(RepoError::NotFound { entity: "account", id })
    }

    fn update_account(
        &self,
        account: &Account,
        credentials: Option<&Credentials>,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx
            .execute(
                "UPDATE accounts
                 SET
                    login = ?2,
                    auth_scheme = ?3,
                    first_name = ?4,
                    last_name = ?5,
                    open_id_url = ?6,
                    utc_offset_minutes = ?7,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    account.id,
                    account.login,
                    account.auth_scheme.as_str(),
                    account.first_name,
                    account.last_name,
                    account.open_id_url,
                    account.utc_offset_minutes,
                ],
            )
            .map_err(login_conflict_or)?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "account",
                id: account.id,
            });
        }

        if let Some(credentials) = credentials {
            tx.execute(
                "UPDATE accounts
                 SET
                    password = ?2,
                    auth_secret_word = ?3
                 WHERE id = ?1;",
                params![
                    account.id,
                    credentials.password,
                    credentials.auth_secret_word,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn set_admin(&self, id: AccountId, is_admin: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE accounts
             SET
                is_admin = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, bool_to_int(is_admin)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "account",
                id,
            });
        }
        Ok(())
    }

    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>> {
        self.query_one("WHERE id = ?1;", id)
    }

    fn find_by_login(&self, login: &str) -> RepoResult<Option<Account>> {
        self.query_one("WHERE login = ?1;", login)
    }

    fn find_admin(&self) -> RepoResult<Option<Account>> {
        self.query_one("WHERE is_admin = ?1 ORDER BY id ASC LIMIT 1;", 1_i64)
    }

    fn count_accounts(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM accounts;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative account count `{count}`")))
    }

    fn list_accounts(&self) -> RepoResult<Vec<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut accounts = Vec::new();
        while let Some(row) = rows.next()? {
            accounts.push(RawAccount::from_row(row)?.into_account()?);
        }
        Ok(accounts)
    }

    fn delete_account(&self, id: AccountId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM accounts WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "account",
                id,
            });
        }
        Ok(())
    }
}

fn login_conflict_or(err: rusqlite::Error) -> RepoError {
    if is_unique_violation(&err, "accounts.login") {
        RepoError::Duplicate {
            entity: "account",
            field: "login",
        }
    } else {
        err.into()
    }
}

/// Column values as stored, before domain parsing.
struct RawAccount {
    id: AccountId,
    login: String,
    password: String,
    auth_scheme: String,
    auth_secret_word: String,
    is_admin: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    open_id_url: Option<String>,
    utc_offset_minutes: i32,
}

impl RawAccount {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            login: row.get("login")?,
            password: row.get("password")?,
            auth_scheme: row.get("auth_scheme")?,
            auth_secret_word: row.get("auth_secret_word")?,
            is_admin: row.get("is_admin")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            open_id_url: row.get("open_id_url")?,
            utc_offset_minutes: row.get("utc_offset_minutes")?,
        })
    }

    fn into_account(self) -> RepoResult<Account> {
        let auth_scheme = AuthScheme::from_str(&self.auth_scheme).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid auth scheme `{}` in accounts.auth_scheme",
                self.auth_scheme
            ))
        })?;

        let mut account = Account::new(self.login, auth_scheme);
        account.id = self.id;
        account.password = self.password;
        account.auth_secret_word = self.auth_secret_word;
        account.is_admin = int_to_bool(self.is_admin, "accounts.is_admin")?;
        account.first_name = self.first_name;
        account.last_name = self.last_name;
        account.open_id_url = self.open_id_url;
        account.utc_offset_minutes = self.utc_offset_minutes;
        Ok(account)
    }
}
