//! Account provisioning use-case service.
//!
//! # Responsibility
//! - Validate accounts against the active `AuthConfig` before persistence.
//! - Apply the rehash decision exactly once per staged password change.
//!
//! # Invariants
//! - A stored digest is never hashed again: only a confirmed staged
//!   plaintext produces a new digest.
//! - The secret word is generated on create and rotated whenever the digest
//!   changes.
//! - `is_admin` changes only through `set_admin`.
//! - A failed save leaves the caller's digest and secret word untouched.

use crate::auth::password::{password_decision, PasswordDecision, PasswordHasher};
use crate::clock::{Clock, SystemClock};
use crate::config::{AuthConfig, AuthScheme};
use crate::model::account::{
    Account, AccountId, AccountValidationError, Credentials, NewAccount,
};
use crate::repo::account_repo::AccountRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from account service operations.
#[derive(Debug)]
pub enum AccountError {
    Validation(AccountValidationError),
    NotFound(AccountId),
    Repo(RepoError),
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid account: {err}"),
            Self::NotFound(id) => write!(f, "account not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<AccountValidationError> for AccountError {
    fn from(value: AccountValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for AccountError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "account",
                id,
            } => Self::NotFound(id),
            RepoError::Duplicate {
                entity: "account",
                field: "login",
            } => Self::Validation(AccountValidationError::LoginTaken),
            other => Self::Repo(other),
        }
    }
}

/// Account service facade.
pub struct AccountService<R: AccountRepository, C: Clock = SystemClock> {
    repo: R,
    config: AuthConfig,
    hasher: PasswordHasher,
    clock: C,
}

impl<R: AccountRepository> AccountService<R, SystemClock> {
    pub fn new(repo: R, config: AuthConfig) -> Self {
        Self::with_clock(repo, config, SystemClock)
    }
}

impl<R: AccountRepository, C: Clock> AccountService<R, C> {
    pub fn with_clock(repo: R, config: AuthConfig, clock: C) -> Self {
        let hasher = PasswordHasher::from_config(&config);
        Self {
            repo,
            config,
            hasher,
            clock,
        }
    }

    /// Provisions a new, non-admin account.
    ///
    /// # Errors
    /// - `Validation` when a field rule fails or the login is taken.
    pub fn create_account(&self, new: NewAccount) -> Result<Account, AccountError> {
        let scheme = new.auth_scheme.unwrap_or(AuthScheme::Database);
        let mut account = Account::new(new.login, scheme);
        account.first_name = new.first_name;
        account.last_name = new.last_name;
        account.open_id_url = new.open_id_url;
        account.utc_offset_minutes = new.utc_offset_minutes;
        if let Some(password) = new.password {
            account.stage_password(password, new.password_confirmation);
        }

        account.validate(&self.config, true)?;
        if self.repo.find_by_login(&account.login)?.is_some() {
            return Err(AccountValidationError::LoginTaken.into());
        }

        match self.staged_credentials(&account) {
            Some(credentials) => {
                account.password = credentials.password;
                account.auth_secret_word = credentials.auth_secret_word;
            }
            None => {
                account.auth_secret_word =
                    self.hasher.secret_word(&account.login, self.clock.now());
            }
        }

        let stored = self.repo.create_account(&account)?;
        info!(
            "event=account_create module=account status=ok account_id={} scheme={}",
            stored.id, stored.auth_scheme
        );
        Ok(stored)
    }

    /// Persists `account`, hashing a staged password if one is confirmed.
    ///
    /// Only profile fields are taken from `account`. The digest, secret word
    /// and admin flag come from the store unless a confirmed password change
    /// replaces the first two. On success `account` is refreshed with the
    /// stored values and its staged fields are cleared.
    pub fn save_account(&self, account: &mut Account) -> Result<(), AccountError> {
        account.validate(&self.config, false)?;
        let stored = self
            .repo
            .get_account(account.id)?
            .ok_or(AccountError::NotFound(account.id))?;
        if let Some(existing) = self.repo.find_by_login(&account.login)? {
            if existing.id != account.id {
                return Err(AccountValidationError::LoginTaken.into());
            }
        }

        let credentials = self.staged_credentials(account);
        let rehashed = credentials.is_some();
        self.repo.update_account(account, credentials.as_ref())?;

        let Credentials {
            password,
            auth_secret_word,
        } = credentials.unwrap_or(Credentials {
            password: stored.password,
            auth_secret_word: stored.auth_secret_word,
        });
        account.password = password;
        account.auth_secret_word = auth_secret_word;
        account.is_admin = stored.is_admin;
        account.clear_staged_password();
        info!(
            "event=account_save module=account status=ok account_id={} rehashed={rehashed}",
            account.id
        );
        Ok(())
    }

    /// Stages `password`/`confirmation` and saves.
    pub fn change_password(
        &self,
        account: &mut Account,
        password: &str,
        confirmation: &str,
    ) -> Result<(), AccountError> {
        account.stage_password(password, Some(confirmation.to_string()));
        let result = self.save_account(account);
        if result.is_err() {
            account.clear_staged_password();
        }
        result
    }

    /// Grants or revokes admin rights.
    pub fn set_admin(&self, id: AccountId, is_admin: bool) -> Result<Account, AccountError> {
        self.repo.set_admin(id, is_admin)?;
        let account = self.repo.get_account(id)?.ok_or(AccountError::NotFound(id))?;
        info!("event=account_set_admin module=account status=ok account_id={id} is_admin={is_admin}");
        Ok(account)
    }

    pub fn get_account(&self, id: AccountId) -> Result<Option<Account>, AccountError> {
        Ok(self.repo.get_account(id)?)
    }

    /// True until the first account is provisioned.
    pub fn no_accounts_yet(&self) -> Result<bool, AccountError> {
        Ok(self.repo.count_accounts()? == 0)
    }

    pub fn find_admin(&self) -> Result<Option<Account>, AccountError> {
        Ok(self.repo.find_admin()?)
    }

    /// Deletes the account together with every item and todo it owns.
    pub fn delete_account(&self, id: AccountId) -> Result<(), AccountError> {
        self.repo.delete_account(id)?;
        info!("event=account_delete module=account status=ok account_id={id}");
        Ok(())
    }

    /// New digest and secret word when the staged password must be hashed.
    fn staged_credentials(&self, account: &Account) -> Option<Credentials> {
        let decision = password_decision(account.staged_password(), account.password_confirmation());
        match (decision, account.staged_password()) {
            (PasswordDecision::Rehash, Some(staged)) => Some(Credentials {
                password: self.hasher.hash(staged),
                auth_secret_word: self.hasher.secret_word(&account.login, self.clock.now()),
            }),
            _ => None,
        }
    }
}
