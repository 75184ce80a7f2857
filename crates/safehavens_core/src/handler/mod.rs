//! Framework-agnostic request handlers.
//!
//! # Responsibility
//! - Gate state-changing operations on the CSRF verdict, authentication and
//!   role supplied by external collaborators.
//! - Turn service results into pages, flash-plus-redirect responses or
//!   themed error pages.
//!
//! # Invariants
//! - Gates run in order CSRF, authentication, role; nothing is written
//!   before all gates pass.
//! - Storage causes are logged, never shown to the caller.

mod forms;
mod response;
mod site;

pub use forms::{ReviewForm, VenueForm};
pub use response::{ErrorPage, Flash, FlashLevel, MainView, Response, Route, VenueFormView, View};
pub use site::{Site, SiteSettings};

use crate::model::account::{Account, ROLE_ADMIN};
use log::warn;
use std::collections::BTreeSet;

/// Authenticated caller as reported by the session collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub handle: String,
    pub roles: BTreeSet<String>,
}

impl Identity {
    pub fn new<I, S>(handle: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            handle: handle.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_account(account: &Account) -> Self {
        Self {
            handle: account.handle.clone(),
            roles: account.roles.clone(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Pass/fail decision of the CSRF collaborator for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsrfVerdict {
    Passed,
    Failed(String),
}

/// Everything the external collaborators tell the handlers about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub identity: Option<Identity>,
    pub csrf: CsrfVerdict,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self {
            identity: None,
            csrf: CsrfVerdict::Passed,
        }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            csrf: CsrfVerdict::Passed,
        }
    }

    pub fn with_csrf(mut self, csrf: CsrfVerdict) -> Self {
        self.csrf = csrf;
        self
    }
}

/// Why a request was stopped before reaching a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    Csrf(String),
    Unauthenticated,
    MissingRole(&'static str),
}

impl AccessError {
    fn into_response(self, operation: &'static str) -> Response {
        match self {
            Self::Csrf(reason) => {
                warn!("event=access_denied module=handler operation={operation} reason=csrf");
                Response::Error(ErrorPage::for_status(400, reason))
            }
            Self::Unauthenticated => {
                warn!(
                    "event=access_denied module=handler operation={operation} reason=unauthenticated"
                );
                Response::redirect(
                    Route::SignIn,
                    Flash::danger("Please sign in to access this page."),
                )
            }
            Self::MissingRole(role) => {
                warn!(
                    "event=access_denied module=handler operation={operation} reason=missing_role role={role}"
                );
                Response::redirect(
                    Route::Home,
                    Flash::danger("You do not have permission to access this page."),
                )
            }
        }
    }
}

/// Requirements a handler places on its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Gate {
    csrf: bool,
    role: Option<&'static str>,
}

impl Gate {
    /// Signed-in caller, read-only request.
    const VIEW: Self = Self {
        csrf: false,
        role: None,
    };
    /// Signed-in caller, state-changing request.
    const WRITE: Self = Self {
        csrf: true,
        role: None,
    };
    const ADMIN_VIEW: Self = Self {
        csrf: false,
        role: Some(ROLE_ADMIN),
    };
    const ADMIN_WRITE: Self = Self {
        csrf: true,
        role: Some(ROLE_ADMIN),
    };

    fn check<'ctx>(&self, ctx: &'ctx RequestContext) -> Result<&'ctx Identity, AccessError> {
        if self.csrf {
            if let CsrfVerdict::Failed(reason) = &ctx.csrf {
                return Err(AccessError::Csrf(reason.clone()));
            }
        }
        let identity = ctx.identity.as_ref().ok_or(AccessError::Unauthenticated)?;
        if let Some(role) = self.role {
            if !identity.has_role(role) {
                return Err(AccessError::MissingRole(role));
            }
        }
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessError, CsrfVerdict, Gate, Identity, RequestContext};

    #[test]
    fn csrf_failure_wins_over_missing_identity() {
        let ctx = RequestContext::anonymous().with_csrf(CsrfVerdict::Failed("bad token".into()));
        assert_eq!(
            Gate::ADMIN_WRITE.check(&ctx),
            Err(AccessError::Csrf("bad token".to_string()))
        );
        assert_eq!(Gate::VIEW.check(&ctx), Err(AccessError::Unauthenticated));
    }

    #[test]
    fn role_gate_requires_admin() {
        let user = RequestContext::signed_in(Identity::new("alice", ["user"]));
        assert_eq!(
            Gate::ADMIN_VIEW.check(&user),
            Err(AccessError::MissingRole("Admin"))
        );
        assert_eq!(Gate::WRITE.check(&user).map(|id| id.handle.as_str()), Ok("alice"));

        let admin = RequestContext::signed_in(Identity::new("admin", ["user", "Admin"]));
        assert!(Gate::ADMIN_WRITE.check(&admin).is_ok());
    }
}
