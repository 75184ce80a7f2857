//! Admin account bootstrap.
//!
//! # Responsibility
//! - Guarantee an `admin` account with the `Admin` role exists.
//! - Run on every landing request, not once per process, so every worker
//!   process of a deployment converges on the same state.
//!
//! # Invariants
//! - Failures are logged and reported as an outcome, never raised.
//! - The insert is conditional on the handle being absent, in a single
//!   statement; a concurrent creator makes this call report
//!   `AlreadyPresent`.
//! - Atomicity only holds within one database. Two stores behind one handle
//!   namespace can still both create an `admin`.

use crate::config::AdminCredentials;
use crate::credential::{CredentialError, CredentialHasher};
use crate::model::account::{Account, ADMIN_HANDLE, ROLE_ADMIN};
use crate::repo::account_repo::CredentialStore;
use crate::repo::{RepoError, RepoResult};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

const ADMIN_DISPLAY_NAME: &str = "Administrator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    NoAdmin,
    AdminExists,
}

#[derive(Debug)]
pub enum BootstrapFailure {
    Credential(CredentialError),
    Store(RepoError),
}

impl Display for BootstrapFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credential(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BootstrapFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Credential(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

#[derive(Debug)]
pub enum BootstrapOutcome {
    /// This call created the account.
    Created(Account),
    /// An `admin` account already existed, or appeared concurrently.
    AlreadyPresent,
    /// Creation failed; the next call will try again.
    Failed(BootstrapFailure),
}

impl BootstrapOutcome {
    pub fn state(&self) -> BootstrapState {
        match self {
            Self::Created(_) | Self::AlreadyPresent => BootstrapState::AdminExists,
            Self::Failed(_) => BootstrapState::NoAdmin,
        }
    }
}

pub struct AdminBootstrap<S: CredentialStore, H: CredentialHasher> {
    store: S,
    hasher: H,
    credentials: AdminCredentials,
}

impl<S: CredentialStore, H: CredentialHasher> AdminBootstrap<S, H> {
    pub fn new(store: S, hasher: H, credentials: AdminCredentials) -> Self {
        Self {
            store,
            hasher,
            credentials,
        }
    }

    pub fn state(&self) -> RepoResult<BootstrapState> {
        Ok(match self.store.find_by_handle(ADMIN_HANDLE)? {
            Some(_) => BootstrapState::AdminExists,
            None => BootstrapState::NoAdmin,
        })
    }

    /// Creates the `admin` account when it does not exist yet.
    pub fn ensure_admin(&self) -> BootstrapOutcome {
        match self.store.find_by_handle(ADMIN_HANDLE) {
            Ok(Some(_)) => {
                debug!("event=admin_bootstrap module=service status=skipped reason=present");
                return BootstrapOutcome::AlreadyPresent;
            }
            Ok(None) => {}
            Err(err) => return failed(BootstrapFailure::Store(err)),
        }

        let account = match self.build_admin() {
            Ok(account) => account,
            Err(err) => return failed(BootstrapFailure::Credential(err)),
        };

        match self.store.create_if_handle_absent(&account) {
            Ok(true) => {
                info!(
                    "event=admin_bootstrap module=service status=ok account_id={}",
                    account.id
                );
                BootstrapOutcome::Created(account)
            }
            Ok(false) => {
                info!(
                    "event=admin_bootstrap module=service status=skipped reason=created_concurrently"
                );
                BootstrapOutcome::AlreadyPresent
            }
            Err(err) => failed(BootstrapFailure::Store(err)),
        }
    }

    fn build_admin(&self) -> Result<Account, CredentialError> {
        let secret = self
            .credentials
            .secret
            .as_deref()
            .ok_or(CredentialError::MissingSecret)?;

        let mut account = Account::new(ADMIN_HANDLE);
        account.first_name = ADMIN_DISPLAY_NAME.to_string();
        account.last_name = ADMIN_DISPLAY_NAME.to_string();
        account.email = self.credentials.email.clone().unwrap_or_default();
        account.email_confirmed_at = Some(now_epoch_ms());
        account.password_hash = Some(self.hasher.hash_credential(secret)?);
        account.grant_role(ROLE_ADMIN);
        Ok(account)
    }
}

fn failed(failure: BootstrapFailure) -> BootstrapOutcome {
    error!("event=admin_bootstrap module=service status=error error={failure}");
    BootstrapOutcome::Failed(failure)
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
