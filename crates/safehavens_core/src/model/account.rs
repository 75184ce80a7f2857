//! Account domain model.
//!
//! # Responsibility
//! - Describe a person able to authenticate and the roles they carry.
//!
//! # Invariants
//! - `handle` is required but uniqueness is not enforced by storage.
//! - A freshly built account is active and carries the `user` role.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type AccountId = Uuid;

/// Role tag every account receives on creation.
pub const ROLE_USER: &str = "user";
/// Role tag that marks a privileged account.
pub const ROLE_ADMIN: &str = "Admin";

/// Handle reserved for the bootstrap account.
pub const ADMIN_HANDLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    NilId,
    EmptyHandle,
    EmptyRole,
}

impl Display for AccountValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "account id must not be nil"),
            Self::EmptyHandle => write!(f, "account handle must not be empty"),
            Self::EmptyRole => write!(f, "account roles must not contain empty values"),
        }
    }
}

impl Error for AccountValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub handle: String,
    /// PHC-formatted credential hash. Never serialized.
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Unix epoch milliseconds.
    pub email_confirmed_at: Option<i64>,
    pub active: bool,
    pub roles: BTreeSet<String>,
}

impl Account {
    /// Creates an active account with the default `user` role.
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            handle: handle.into(),
            password_hash: None,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            email_confirmed_at: None,
            active: true,
            roles: BTreeSet::from([ROLE_USER.to_string()]),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Returns whether this account may run privileged operations.
    pub fn is_privileged(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    pub fn grant_role(&mut self, role: impl Into<String>) {
        self.roles.insert(role.into());
    }

    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if self.id.is_nil() {
            return Err(AccountValidationError::NilId);
        }
        if self.handle.trim().is_empty() {
            return Err(AccountValidationError::EmptyHandle);
        }
        if self.roles.iter().any(|role| role.trim().is_empty()) {
            return Err(AccountValidationError::EmptyRole);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Account, AccountValidationError, ROLE_ADMIN, ROLE_USER};

    #[test]
    fn new_account_is_active_plain_user() {
        let account = Account::new("alice");
        assert!(account.active);
        assert!(account.has_role(ROLE_USER));
        assert!(!account.is_privileged());
        assert_eq!(account.validate(), Ok(()));
    }

    #[test]
    fn granting_admin_keeps_user_role() {
        let mut account = Account::new("root");
        account.grant_role(ROLE_ADMIN);
        assert!(account.is_privileged());
        assert_eq!(account.roles.len(), 2);
    }

    #[test]
    fn blank_handle_is_rejected() {
        let account = Account::new("  ");
        assert_eq!(account.validate(), Err(AccountValidationError::EmptyHandle));
    }
}
