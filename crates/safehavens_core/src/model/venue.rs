//! Venue domain model and category registry.
//!
//! # Responsibility
//! - Define the catalogued place record and its user-suppliable fields.
//! - Hold the central, extensible list of venue categories.
//!
//! # Invariants
//! - `category`, when present, is one of the active `VenueCategories`.
//! - Blank strings are valid for every other field.
//! - `owner` is a plain copy of the creator's handle, not a reference.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use super::account::ADMIN_HANDLE;

pub type VenueId = Uuid;

/// Categories known to every deployment. Extended, never reordered.
pub const DEFAULT_VENUE_CATEGORIES: &[&str] = &[
    "Bar or Pub",
    "Restaurant",
    "Club",
    "Theatre",
    "Health",
    "Gym",
    "Hotel",
    "Other",
    "Church",
    "Group",
    "Wedding Venue",
    "Neighbourhood",
    "Market",
    "Cabaret",
    "Café",
    "Museum",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueValidationError {
    NilId,
    UnknownCategory(String),
}

impl Display for VenueValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "venue id must not be nil"),
            Self::UnknownCategory(value) => write!(f, "unknown venue category: `{value}`"),
        }
    }
}

impl Error for VenueValidationError {}

/// Open list of venue categories.
///
/// Stored as validated strings so new categories only need a registry
/// entry, not a schema change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueCategories {
    names: Vec<String>,
}

impl Default for VenueCategories {
    fn default() -> Self {
        Self {
            names: DEFAULT_VENUE_CATEGORIES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }
}

impl VenueCategories {
    /// Returns the default list extended with `extra` names.
    ///
    /// Blank and already-known names are skipped.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut categories = Self::default();
        for name in extra {
            categories.register(name.as_ref());
        }
        categories
    }

    pub fn register(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return;
        }
        self.names.push(name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|known| known == name)
    }

    /// Registration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Alphabetical order, as offered in venue forms.
    pub fn sorted(&self) -> Vec<String> {
        let mut names = self.names.clone();
        names.sort();
        names
    }
}

/// Every field a caller supplies when creating or overwriting a venue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueFields {
    pub name: String,
    #[serde(rename = "venue_type")]
    pub category: Option<String>,
    pub address: String,
    pub post_code: String,
    pub city: String,
    pub country: String,
    pub link: String,
    pub lat: String,
    pub lng: String,
}

impl VenueFields {
    /// Convenience for the common "name only" case.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn normalized(mut self) -> Self {
        self.category = self
            .category
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    #[serde(rename = "venue_type")]
    pub category: Option<String>,
    pub address: String,
    pub post_code: String,
    pub city: String,
    pub country: String,
    pub link: String,
    pub lat: String,
    pub lng: String,
    /// Creator handle. Serialized as `user` to match the stored document.
    #[serde(rename = "user")]
    pub owner: String,
}

impl Venue {
    /// Builds a new venue with a generated id.
    ///
    /// A blank category is stored as absent.
    pub fn new(fields: VenueFields, owner: impl Into<String>) -> Self {
        let mut venue = Self {
            id: Uuid::new_v4(),
            name: String::new(),
            category: None,
            address: String::new(),
            post_code: String::new(),
            city: String::new(),
            country: String::new(),
            link: String::new(),
            lat: String::new(),
            lng: String::new(),
            owner: owner.into(),
        };
        venue.overwrite(fields);
        venue
    }

    /// Builds a venue owned by the bootstrap account.
    pub fn owned_by_admin(fields: VenueFields) -> Self {
        Self::new(fields, ADMIN_HANDLE)
    }

    /// Replaces every user-suppliable field. `id` and `owner` are kept.
    pub fn overwrite(&mut self, fields: VenueFields) {
        let fields = fields.normalized();
        self.name = fields.name;
        self.category = fields.category;
        self.address = fields.address;
        self.post_code = fields.post_code;
        self.city = fields.city;
        self.country = fields.country;
        self.link = fields.link;
        self.lat = fields.lat;
        self.lng = fields.lng;
    }

    pub fn validate(&self, categories: &VenueCategories) -> Result<(), VenueValidationError> {
        if self.id.is_nil() {
            return Err(VenueValidationError::NilId);
        }
        if let Some(category) = self.category.as_deref() {
            if !categories.contains(category) {
                return Err(VenueValidationError::UnknownCategory(category.to_string()));
            }
        }
        Ok(())
    }
}
