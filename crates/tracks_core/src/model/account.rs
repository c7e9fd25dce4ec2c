//! Account domain model.
//!
//! # Responsibility
//! - Describe one login identity and its authentication settings.
//! - Stage plaintext password changes until the persistence boundary decides
//!   whether to re-hash.
//!
//! # Invariants
//! - `password` holds a digest (or is empty for accounts without a local
//!   password); plaintext never lands in it.
//! - `auth_scheme` must be allowed by the active `AuthConfig`.
//! - `is_admin` is only changed through an explicit service call.

use crate::clock::MAX_UTC_OFFSET_MINUTES;
use crate::config::{AuthConfig, AuthScheme};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

/// Numeric primary identity assigned by the store.
pub type AccountId = i64;

pub const LOGIN_LENGTH: RangeInclusive<usize> = 3..=80;
pub const PASSWORD_LENGTH: RangeInclusive<usize> = 5..=40;

/// Field-level validation failures for accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    /// Login character count is outside `LOGIN_LENGTH`.
    LoginLength(usize),
    /// Another account already uses this login.
    LoginTaken,
    /// Scheme is not part of the configured allow-list.
    UnsupportedAuthScheme(AuthScheme),
    /// Database-scheme account is created without a password.
    PasswordRequired,
    /// Staged password character count is outside `PASSWORD_LENGTH`.
    PasswordLength(usize),
    /// Staged password and its confirmation differ.
    PasswordConfirmationMismatch,
    /// `open_id` scheme without an identity URL.
    OpenIdUrlRequired,
    /// UTC offset outside `-1439..=1439` minutes.
    UtcOffsetOutOfRange(i32),
}

impl Display for AccountValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoginLength(len) => write!(
                f,
                "login must be {}..={} characters, got {len}",
                LOGIN_LENGTH.start(),
                LOGIN_LENGTH.end()
            ),
            Self::LoginTaken => write!(f, "login is already taken"),
            Self::UnsupportedAuthScheme(scheme) => {
                write!(f, "auth scheme `{scheme}` is not enabled")
            }
            Self::PasswordRequired => write!(f, "password is required"),
            Self::PasswordLength(len) => write!(
                f,
                "password must be {}..={} characters, got {len}",
                PASSWORD_LENGTH.start(),
                PASSWORD_LENGTH.end()
            ),
            Self::PasswordConfirmationMismatch => {
                write!(f, "password does not match confirmation")
            }
            Self::OpenIdUrlRequired => write!(f, "open_id accounts require an identity url"),
            Self::UtcOffsetOutOfRange(value) => {
                write!(f, "utc offset {value} minutes is out of range")
            }
        }
    }
}

impl Error for AccountValidationError {}

/// Caller-supplied fields for provisioning an account.
///
/// Carries no admin flag; see `AccountService::set_admin`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewAccount {
    pub login: String,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub auth_scheme: Option<AuthScheme>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub open_id_url: Option<String>,
    pub utc_offset_minutes: i32,
}

impl NewAccount {
    /// Database-scheme account with matching password and confirmation.
    pub fn with_password(login: impl Into<String>, password: impl Into<String>) -> Self {
        let password = password.into();
        Self {
            login: login.into(),
            password_confirmation: Some(password.clone()),
            password: Some(password),
            auth_scheme: Some(AuthScheme::Database),
            ..Self::default()
        }
    }
}

/// Digest and secret word written together whenever the password changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub password: String,
    pub auth_secret_word: String,
}

/// Persisted account record.
///
/// `password`, `auth_secret_word` and `is_admin` are read-only from the
/// point of view of `save`: the store keeps its own values for them unless
/// a confirmed password change or an explicit admin grant replaces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub login: String,
    /// Salted digest of the current password.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub auth_scheme: AuthScheme,
    /// Opaque per-account token, rotated with every password digest change.
    #[serde(skip_serializing, default)]
    pub auth_secret_word: String,
    pub is_admin: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub open_id_url: Option<String>,
    /// The account's time zone, in minutes east of UTC.
    pub utc_offset_minutes: i32,
    #[serde(skip)]
    staged_password: Option<String>,
    #[serde(skip)]
    password_confirmation: Option<String>,
}

impl Account {
    /// Creates an unsaved account (`id == 0`) with no digest yet.
    pub fn new(login: impl Into<String>, auth_scheme: AuthScheme) -> Self {
        Self {
            id: 0,
            login: login.into(),
            password: String::new(),
            auth_scheme,
            auth_secret_word: String::new(),
            is_admin: false,
            first_name: None,
            last_name: None,
            open_id_url: None,
            utc_offset_minutes: 0,
            staged_password: None,
            password_confirmation: None,
        }
    }

    /// Stages a plaintext password change for the next save.
    pub fn stage_password(
        &mut self,
        password: impl Into<String>,
        confirmation: Option<String>,
    ) {
        self.staged_password = Some(password.into());
        self.password_confirmation = confirmation;
    }

    pub fn staged_password(&self) -> Option<&str> {
        self.staged_password.as_deref()
    }

    pub fn password_confirmation(&self) -> Option<&str> {
        self.password_confirmation.as_deref()
    }

    pub(crate) fn clear_staged_password(&mut self) {
        self.staged_password = None;
        self.password_confirmation = None;
    }

    /// Name shown in the UI, falling back to the login.
    pub fn display_name(&self) -> String {
        let first = non_blank(self.first_name.as_deref());
        let last = non_blank(self.last_name.as_deref());
        match (first, last) {
            (None, None) => self.login.clone(),
            (None, Some(last)) => last.to_string(),
            (Some(first), None) => first.to_string(),
            (Some(first), Some(last)) => format!("{first} {last}"),
        }
    }

    /// Checks field invariants against the active configuration.
    ///
    /// Login uniqueness needs the store and is checked by the service.
    pub fn validate(&self, config: &AuthConfig, is_new: bool) -> Result<(), AccountValidationError> {
        let login_len = self.login.chars().count();
        if !LOGIN_LENGTH.contains(&login_len) {
            return Err(AccountValidationError::LoginLength(login_len));
        }
        if !config.allows(self.auth_scheme) {
            return Err(AccountValidationError::UnsupportedAuthScheme(self.auth_scheme));
        }
        if self.auth_scheme == AuthScheme::OpenId && non_blank(self.open_id_url.as_deref()).is_none()
        {
            return Err(AccountValidationError::OpenIdUrlRequired);
        }
        if !(-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&self.utc_offset_minutes) {
            return Err(AccountValidationError::UtcOffsetOutOfRange(
                self.utc_offset_minutes,
            ));
        }

        match self.staged_password.as_deref() {
            Some(staged) => {
                if self.password_confirmation.as_deref() != Some(staged) {
                    return Err(AccountValidationError::PasswordConfirmationMismatch);
                }
                if self.auth_scheme == AuthScheme::Database {
                    let len = staged.chars().count();
                    if len == 0 {
                        return Err(AccountValidationError::PasswordRequired);
                    }
                    if !PASSWORD_LENGTH.contains(&len) {
                        return Err(AccountValidationError::PasswordLength(len));
                    }
                }
            }
            None if is_new && self.auth_scheme == AuthScheme::Database => {
                return Err(AccountValidationError::PasswordRequired);
            }
            None => {}
        }

        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}
