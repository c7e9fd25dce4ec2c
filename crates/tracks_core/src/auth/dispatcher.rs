//! Login dispatch by per-account authentication scheme.
//!
//! # Invariants
//! - Unknown login, wrong password, disabled scheme, store failure and
//!   directory failure all produce the same `None`.
//! - `ldap` accounts are only checked while `ldap` is in the allow-list.

use crate::auth::directory::{validate_or_reject, CredentialValidator};
use crate::auth::password::PasswordHasher;
use crate::config::{AuthConfig, AuthScheme};
use crate::model::account::Account;
use crate::repo::account_repo::AccountRepository;
use log::{error, info};

/// Resolves login attempts to accounts.
pub struct AuthenticationDispatcher<R: AccountRepository, V: CredentialValidator> {
    repo: R,
    config: AuthConfig,
    hasher: PasswordHasher,
    validator: V,
}

impl<R: AccountRepository, V: CredentialValidator> AuthenticationDispatcher<R, V> {
    pub fn new(repo: R, config: AuthConfig, validator: V) -> Self {
        let hasher = PasswordHasher::from_config(&config);
        Self {
            repo,
            config,
            hasher,
            validator,
        }
    }

    /// Returns the account when `password` is valid for `login`.
    pub fn authenticate(&self, login: &str, password: &str) -> Option<Account> {
        let candidate = match self.repo.find_by_login(login) {
            Ok(Some(account)) => account,
            Ok(None) => {
                info!("event=auth_attempt module=auth status=rejected");
                return None;
            }
            Err(err) => {
                error!(
                    "event=auth_attempt module=auth status=error error_code=account_lookup_failed error={err}"
                );
                return None;
            }
        };

        let scheme = candidate.auth_scheme;
        let accepted = match scheme {
            AuthScheme::Database => self.hasher.verify(password, &candidate.password),
            AuthScheme::Ldap if self.config.allows(AuthScheme::Ldap) => {
                validate_or_reject(&self.validator, login, password)
            }
            AuthScheme::Ldap | AuthScheme::OpenId => false,
        };

        if accepted {
            info!("event=auth_attempt module=auth status=ok scheme={scheme}");
            Some(candidate)
        } else {
            info!("event=auth_attempt module=auth status=rejected scheme={scheme}");
            None
        }
    }
}
