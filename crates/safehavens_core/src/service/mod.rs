//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level operations.
//! - Classify failures into validation / not-found / persistence kinds.
//!
//! # Invariants
//! - Services never bypass repository validation.
//! - Services remain storage-agnostic; they only see repository traits.

pub mod bootstrap;
pub mod import;
pub mod review_service;
pub mod venue_service;

use crate::model::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure category surfaced to the handler boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Persistence,
}

#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    NotFound { entity: &'static str, id: Uuid },
    /// Any storage failure; the cause is kept for server-side diagnostics.
    Persistence(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Persistence(err) => write!(f, "persistence failed: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Persistence(other),
        }
    }
}
