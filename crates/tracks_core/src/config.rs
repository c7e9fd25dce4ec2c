//! Authentication configuration.
//!
//! # Responsibility
//! - Hold the process-wide hashing salt and the allow-listed auth schemes.
//! - Parse scheme names coming from the environment or persisted rows.
//!
//! # Invariants
//! - An `AuthConfig` is immutable once built; callers pass it by value or
//!   reference into the services that need it.
//! - The salt is never empty.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Environment variable holding the hashing salt.
pub const SALT_ENV: &str = "TRACKS_SALT";
/// Environment variable holding the comma separated scheme allow-list.
pub const AUTH_SCHEMES_ENV: &str = "TRACKS_AUTH_SCHEMES";

/// Authentication method an account is configured to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// Local salted password digest.
    Database,
    /// External directory validator.
    Ldap,
    /// Delegated identity URL; never accepted by password authentication.
    OpenId,
}

impl AuthScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Ldap => "ldap",
            Self::OpenId => "open_id",
        }
    }
}

impl Display for AuthScheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthScheme {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "database" => Ok(Self::Database),
            "ldap" => Ok(Self::Ldap),
            "open_id" => Ok(Self::OpenId),
            other => Err(ConfigError::UnknownScheme(other.to_string())),
        }
    }
}

/// Errors raised while building an [`AuthConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Salt is missing or blank.
    MissingSalt,
    /// Scheme name is not one this crate knows.
    UnknownScheme(String),
    /// Allow-list resolved to zero schemes.
    NoSchemes,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSalt => write!(f, "`{SALT_ENV}` must be set to a non-empty value"),
            Self::UnknownScheme(value) => write!(
                f,
                "unknown auth scheme `{value}`; expected database|ldap|open_id"
            ),
            Self::NoSchemes => write!(f, "at least one auth scheme must be enabled"),
        }
    }
}

impl Error for ConfigError {}

/// Salt and scheme allow-list shared by hashing and authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    salt: String,
    schemes: BTreeSet<AuthScheme>,
}

impl AuthConfig {
    /// Builds a config from explicit values.
    ///
    /// # Errors
    /// - `MissingSalt` when `salt` is blank.
    /// - `NoSchemes` when `schemes` is empty.
    pub fn new(
        salt: impl Into<String>,
        schemes: impl IntoIterator<Item = AuthScheme>,
    ) -> Result<Self, ConfigError> {
        let salt = salt.into();
        if salt.trim().is_empty() {
            return Err(ConfigError::MissingSalt);
        }
        let schemes: BTreeSet<AuthScheme> = schemes.into_iter().collect();
        if schemes.is_empty() {
            return Err(ConfigError::NoSchemes);
        }
        Ok(Self { salt, schemes })
    }

    /// Reads `TRACKS_SALT` and `TRACKS_AUTH_SCHEMES` from the process
    /// environment. Schemes default to `database` when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let salt = lookup(SALT_ENV).ok_or(ConfigError::MissingSalt)?;
        let schemes = match lookup(AUTH_SCHEMES_ENV) {
            Some(raw) => raw
                .split(',')
                .filter(|part| !part.trim().is_empty())
                .map(AuthScheme::from_str)
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![AuthScheme::Database],
        };
        Self::new(salt, schemes)
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// Returns whether `scheme` is in the allow-list.
    pub fn allows(&self, scheme: AuthScheme) -> bool {
        self.schemes.contains(&scheme)
    }

    pub fn schemes(&self) -> impl Iterator<Item = AuthScheme> + '_ {
        self.schemes.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthConfig, AuthScheme, ConfigError};
    use std::collections::HashMap;

    fn lookup(values: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn from_lookup_defaults_to_database_scheme() {
        let config = AuthConfig::from_lookup(lookup(&[("TRACKS_SALT", "change-me")])).unwrap();
        assert_eq!(config.salt(), "change-me");
        assert!(config.allows(AuthScheme::Database));
        assert!(!config.allows(AuthScheme::Ldap));
    }

    #[test]
    fn from_lookup_parses_scheme_list() {
        let config = AuthConfig::from_lookup(lookup(&[
            ("TRACKS_SALT", "change-me"),
            ("TRACKS_AUTH_SCHEMES", "database, ldap"),
        ]))
        .unwrap();
        let schemes: Vec<_> = config.schemes().collect();
        assert_eq!(schemes, vec![AuthScheme::Database, AuthScheme::Ldap]);
    }

    #[test]
    fn from_lookup_rejects_unknown_scheme_and_missing_salt() {
        let err = AuthConfig::from_lookup(lookup(&[
            ("TRACKS_SALT", "s"),
            ("TRACKS_AUTH_SCHEMES", "database,kerberos"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::UnknownScheme("kerberos".to_string()));

        let err = AuthConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSalt);
    }

    #[test]
    fn new_rejects_blank_salt_and_empty_schemes() {
        assert_eq!(
            AuthConfig::new("  ", [AuthScheme::Database]).unwrap_err(),
            ConfigError::MissingSalt
        );
        assert_eq!(
            AuthConfig::new("salt", Vec::<AuthScheme>::new()).unwrap_err(),
            ConfigError::NoSchemes
        );
    }
}
