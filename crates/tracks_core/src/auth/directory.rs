//! External credential validator (LDAP-style directory) contract.

use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Transport or protocol failure while talking to the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorError {
    message: String,
}

impl ValidatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ValidatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "credential validator failed: {}", self.message)
    }
}

impl Error for ValidatorError {}

/// Black-box `validate(login, password)` call against an external directory.
///
/// Implementations block; callers that need a deadline enforce it around the
/// call.
pub trait CredentialValidator {
    fn validate(&self, login: &str, password: &str) -> Result<bool, ValidatorError>;
}

impl<F> CredentialValidator for F
where
    F: Fn(&str, &str) -> Result<bool, ValidatorError>,
{
    fn validate(&self, login: &str, password: &str) -> Result<bool, ValidatorError> {
        self(login, password)
    }
}

/// Validator for deployments without a directory; rejects everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectory;

impl CredentialValidator for NoDirectory {
    fn validate(&self, _login: &str, _password: &str) -> Result<bool, ValidatorError> {
        Ok(false)
    }
}

/// Runs `validator`, folding any error into `false`.
pub(crate) fn validate_or_reject(
    validator: &impl CredentialValidator,
    login: &str,
    password: &str,
) -> bool {
    match validator.validate(login, password) {
        Ok(valid) => valid,
        Err(err) => {
            warn!(
                "event=directory_validate module=auth status=error error_code=validator_failed error={err}"
            );
            false
        }
    }
}
