//! Core domain logic for the Safe Havens venue directory.
//!
//! Accounts, venues and reviews live in one SQLite database opened once per
//! process and handed to repositories explicitly.

pub mod config;
pub mod credential;
pub mod db;
pub mod handler;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AdminCredentials, AppConfig, ConfigError};
pub use credential::{Argon2Hasher, CredentialError, CredentialHasher};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::account::{Account, AccountId, ADMIN_HANDLE, ROLE_ADMIN, ROLE_USER};
pub use model::review::{FlagKind, Review, ReviewFlags, ReviewId};
pub use model::venue::{Venue, VenueCategories, VenueFields, VenueId};
pub use model::ValidationError;
pub use repo::account_repo::{CredentialStore, SqliteCredentialStore};
pub use repo::review_repo::{ReviewRepository, SqliteReviewRepository};
pub use repo::venue_repo::{SqliteVenueRepository, VenuePage, VenueRepository};
pub use repo::{RepoError, RepoResult};
pub use service::bootstrap::{AdminBootstrap, BootstrapOutcome, BootstrapState};
pub use service::import::{ImportError, VenueImporter};
pub use service::review_service::ReviewService;
pub use service::venue_service::{ReviewCascade, VenueDeletion, VenueService};
pub use service::{ErrorKind, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
