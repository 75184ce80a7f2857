//! Review domain model.
//!
//! # Responsibility
//! - Describe one submitted assessment of a venue.
//! - Carry the open, named boolean flag sets attached to a review.
//!
//! # Invariants
//! - `text` is at most `REVIEW_TEXT_MAX_CHARS` characters.
//! - `venue_id` is a weak reference; nothing guarantees the venue exists.
//! - Flag names are non-empty; unknown names are accepted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use super::venue::VenueId;

pub type ReviewId = Uuid;

pub const REVIEW_TEXT_MAX_CHARS: usize = 2000;

/// Inclusivity switches offered on the review form.
pub const DEFAULT_INCLUSIVITY_FLAGS: &[&str] = &["rainbow_flag", "welcoming", "program_focus"];
/// Category tags offered on the review form.
pub const DEFAULT_CATEGORY_TAGS: &[&str] = &["LGBTQ", "Trans", "Youth", "Shelter"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewValidationError {
    NilId,
    TextTooLong { chars: usize, max: usize },
    EmptyFlagName,
}

impl Display for ReviewValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "review id must not be nil"),
            Self::TextTooLong { chars, max } => {
                write!(f, "review text has {chars} characters; maximum is {max}")
            }
            Self::EmptyFlagName => write!(f, "review flag names must not be empty"),
        }
    }
}

impl Error for ReviewValidationError {}

/// Storage discriminator for the two flag sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    Inclusivity,
    Category,
}

impl FlagKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inclusivity => "inclusivity",
            Self::Category => "category",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "inclusivity" => Some(Self::Inclusivity),
            "category" => Some(Self::Category),
            _ => None,
        }
    }
}

/// Named boolean sets attached to a review.
///
/// New flags are added by name without touching the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFlags {
    pub inclusivity: BTreeMap<String, bool>,
    pub tags: BTreeMap<String, bool>,
}

impl ReviewFlags {
    /// Every default flag and tag, all switched off.
    pub fn defaults() -> Self {
        let off = |names: &[&str]| {
            names
                .iter()
                .map(|name| ((*name).to_string(), false))
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            inclusivity: off(DEFAULT_INCLUSIVITY_FLAGS),
            tags: off(DEFAULT_CATEGORY_TAGS),
        }
    }

    pub fn set(&mut self, kind: FlagKind, name: impl Into<String>, value: bool) {
        self.map_mut(kind).insert(name.into(), value);
    }

    /// Missing flags read as `false`.
    pub fn get(&self, kind: FlagKind, name: &str) -> bool {
        self.map(kind).get(name).copied().unwrap_or(false)
    }

    pub fn map(&self, kind: FlagKind) -> &BTreeMap<String, bool> {
        match kind {
            FlagKind::Inclusivity => &self.inclusivity,
            FlagKind::Category => &self.tags,
        }
    }

    fn map_mut(&mut self, kind: FlagKind) -> &mut BTreeMap<String, bool> {
        match kind {
            FlagKind::Inclusivity => &mut self.inclusivity,
            FlagKind::Category => &mut self.tags,
        }
    }

    /// Flattened `(kind, name, value)` view used by persistence.
    pub fn entries(&self) -> impl Iterator<Item = (FlagKind, &str, bool)> {
        let inclusivity = self
            .inclusivity
            .iter()
            .map(|(name, value)| (FlagKind::Inclusivity, name.as_str(), *value));
        let tags = self
            .tags
            .iter()
            .map(|(name, value)| (FlagKind::Category, name.as_str(), *value));
        inclusivity.chain(tags)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    #[serde(rename = "text_field")]
    pub text: String,
    #[serde(rename = "user")]
    pub owner: String,
    pub venue_id: VenueId,
    pub flags: ReviewFlags,
}

impl Review {
    pub fn new(
        venue_id: VenueId,
        owner: impl Into<String>,
        text: impl Into<String>,
        flags: ReviewFlags,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            owner: owner.into(),
            venue_id,
            flags,
        }
    }

    pub fn validate(&self) -> Result<(), ReviewValidationError> {
        if self.id.is_nil() {
            return Err(ReviewValidationError::NilId);
        }
        let chars = self.text.chars().count();
        if chars > REVIEW_TEXT_MAX_CHARS {
            return Err(ReviewValidationError::TextTooLong {
                chars,
                max: REVIEW_TEXT_MAX_CHARS,
            });
        }
        if self.flags.entries().any(|(_, name, _)| name.trim().is_empty()) {
            return Err(ReviewValidationError::EmptyFlagName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FlagKind, Review, ReviewFlags, ReviewValidationError, REVIEW_TEXT_MAX_CHARS};
    use uuid::Uuid;

    #[test]
    fn text_limit_counts_characters_not_bytes() {
        let at_limit = "é".repeat(REVIEW_TEXT_MAX_CHARS);
        let review = Review::new(Uuid::new_v4(), "alice", at_limit, ReviewFlags::default());
        assert_eq!(review.validate(), Ok(()));

        let over = Review::new(
            Uuid::new_v4(),
            "alice",
            "x".repeat(REVIEW_TEXT_MAX_CHARS + 1),
            ReviewFlags::default(),
        );
        assert_eq!(
            over.validate(),
            Err(ReviewValidationError::TextTooLong {
                chars: REVIEW_TEXT_MAX_CHARS + 1,
                max: REVIEW_TEXT_MAX_CHARS
            })
        );
    }

    #[test]
    fn flags_accept_new_names_and_default_to_false() {
        let mut flags = ReviewFlags::defaults();
        flags.set(FlagKind::Category, "Elders", true);

        assert!(flags.get(FlagKind::Category, "Elders"));
        assert!(!flags.get(FlagKind::Inclusivity, "welcoming"));
        assert!(!flags.get(FlagKind::Inclusivity, "never_defined"));
        assert_eq!(flags.entries().count(), 8);
    }

    #[test]
    fn empty_flag_name_is_rejected() {
        let mut flags = ReviewFlags::default();
        flags.set(FlagKind::Inclusivity, " ", true);
        let review = Review::new(Uuid::new_v4(), "alice", "ok", flags);
        assert_eq!(review.validate(), Err(ReviewValidationError::EmptyFlagName));
    }
}
