//! Bulk venue import from a JSON dataset.
//!
//! # Responsibility
//! - Read, parse and schema-check an external venue dataset.
//! - Insert every record as one all-or-nothing batch.
//!
//! # Invariants
//! - Each stage is a hard gate; the first failure aborts the whole import.
//! - Nothing is written unless every record passes validation.
//! - Imports do not deduplicate: running the same dataset twice doubles it.

use crate::logging::sanitize_message;
use crate::model::venue::{Venue, VenueCategories, VenueFields};
use crate::repo::venue_repo::VenueRepository;
use crate::repo::RepoError;
use log::{error, info};
use serde::Deserialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

/// One dataset record. Every field is a string; `link` may be omitted and
/// unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct VenueRecord {
    name: String,
    venue_type: String,
    address: String,
    post_code: String,
    city: String,
    country: String,
    lat: String,
    lng: String,
    #[serde(default)]
    link: String,
}

impl From<VenueRecord> for VenueFields {
    fn from(record: VenueRecord) -> Self {
        Self {
            name: record.name,
            category: Some(record.venue_type),
            address: record.address,
            post_code: record.post_code,
            city: record.city,
            country: record.country,
            link: record.link,
            lat: record.lat,
            lng: record.lng,
        }
    }
}

const MAX_LOGGED_NAME_CHARS: usize = 80;

#[derive(Debug)]
pub enum ImportError {
    SourceNotFound(PathBuf),
    /// The source exists but could not be read.
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Not JSON, or not a JSON array.
    MalformedSource(String),
    /// Record at 0-based `index` failed the schema check.
    SchemaViolation {
        index: usize,
        name: Option<String>,
        reason: String,
    },
    InsertFailure(RepoError),
}

impl ImportError {
    /// Stable cause label used in logs and flash messages.
    pub fn cause(&self) -> &'static str {
        match self {
            Self::SourceNotFound(_) => "source_not_found",
            Self::SourceUnreadable { .. } => "source_unreadable",
            Self::MalformedSource(_) => "malformed_source",
            Self::SchemaViolation { .. } => "schema_violation",
            Self::InsertFailure(_) => "insert_failure",
        }
    }
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceNotFound(path) => write!(f, "venue dataset not found: {}", path.display()),
            Self::SourceUnreadable { path, source } => {
                write!(f, "venue dataset unreadable: {}: {source}", path.display())
            }
            Self::MalformedSource(message) => write!(f, "venue dataset is malformed: {message}"),
            Self::SchemaViolation {
                index,
                name,
                reason,
            } => match name {
                Some(name) => {
                    write!(f, "record {} (`{name}`) violates schema: {reason}", index + 1)
                }
                None => write!(f, "record {} violates schema: {reason}", index + 1),
            },
            Self::InsertFailure(err) => write!(f, "venue batch insert failed: {err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SourceUnreadable { source, .. } => Some(source),
            Self::InsertFailure(err) => Some(err),
            _ => None,
        }
    }
}

pub struct VenueImporter<V: VenueRepository> {
    venues: V,
    categories: VenueCategories,
}

impl<V: VenueRepository> VenueImporter<V> {
    pub fn new(venues: V, categories: VenueCategories) -> Self {
        Self { venues, categories }
    }

    /// Imports the dataset at `path`. Returns the number of venues inserted.
    pub fn import_file(&self, path: &Path) -> Result<usize, ImportError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                return Err(aborted(ImportError::SourceNotFound(path.to_path_buf())))
            }
            Err(err) => {
                return Err(aborted(ImportError::SourceUnreadable {
                    path: path.to_path_buf(),
                    source: err,
                }))
            }
        };
        self.import_str(&raw)
    }

    /// Imports an in-memory JSON document.
    pub fn import_str(&self, raw: &str) -> Result<usize, ImportError> {
        let document: Value = serde_json::from_str(raw)
            .map_err(|err| aborted(ImportError::MalformedSource(err.to_string())))?;
        let records = match document {
            Value::Array(records) => records,
            _ => {
                return Err(aborted(ImportError::MalformedSource(
                    "top-level value must be an array of venue records".to_string(),
                )))
            }
        };

        let venues = records
            .iter()
            .enumerate()
            .map(|(index, record)| self.venue_from_record(index, record))
            .collect::<Result<Vec<_>, _>>()
            .map_err(aborted)?;

        let inserted = self
            .venues
            .insert_batch(&venues)
            .map_err(|err| aborted(ImportError::InsertFailure(err)))?;

        info!("event=venue_import module=service status=ok inserted={inserted}");
        Ok(inserted)
    }

    fn venue_from_record(&self, index: usize, record: &Value) -> Result<Venue, ImportError> {
        let violation = |reason: String| ImportError::SchemaViolation {
            index,
            name: record
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            reason,
        };

        // serde would also accept a positional array for a struct.
        if !record.is_object() {
            return Err(violation("record is not an object".to_string()));
        }
        let fields = VenueRecord::deserialize(record)
            .map(VenueFields::from)
            .map_err(|err| violation(err.to_string()))?;

        let venue = Venue::owned_by_admin(fields);
        venue
            .validate(&self.categories)
            .map_err(|err| violation(err.to_string()))?;
        Ok(venue)
    }
}

fn aborted(err: ImportError) -> ImportError {
    match &err {
        ImportError::SchemaViolation { index, name, .. } => error!(
            "event=venue_import module=service status=error cause={} record_index={} record_name={} error={}",
            err.cause(),
            index,
            sanitize_message(name.as_deref().unwrap_or("-"), MAX_LOGGED_NAME_CHARS),
            err
        ),
        _ => error!(
            "event=venue_import module=service status=error cause={} error={}",
            err.cause(),
            err
        ),
    }
    err
}
