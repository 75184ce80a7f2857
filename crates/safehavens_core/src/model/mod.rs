//! Domain model for accounts, venues and reviews.
//!
//! # Responsibility
//! - Define the records persisted in the `accounts`, `venues` and `reviews`
//!   collections.
//! - Own field-shape validation enforced by repositories on every write.
//!
//! # Invariants
//! - Every record is identified by a stable, non-nil UUID.
//! - Venues and reviews reference owners by handle copy, never by id.

pub mod account;
pub mod review;
pub mod venue;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub use account::AccountValidationError;
pub use review::ReviewValidationError;
pub use venue::VenueValidationError;

/// Field-shape failure of any persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Account(AccountValidationError),
    Venue(VenueValidationError),
    Review(ReviewValidationError),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Account(err) => write!(f, "{err}"),
            Self::Venue(err) => write!(f, "{err}"),
            Self::Review(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Account(err) => Some(err),
            Self::Venue(err) => Some(err),
            Self::Review(err) => Some(err),
        }
    }
}

impl From<AccountValidationError> for ValidationError {
    fn from(value: AccountValidationError) -> Self {
        Self::Account(value)
    }
}

impl From<VenueValidationError> for ValidationError {
    fn from(value: VenueValidationError) -> Self {
        Self::Venue(value)
    }
}

impl From<ReviewValidationError> for ValidationError {
    fn from(value: ReviewValidationError) -> Self {
        Self::Review(value)
    }
}
