//! Venue use-case service.
//!
//! # Responsibility
//! - Create, page through, overwrite and delete venues.
//! - Apply the configured review cascade when a venue is deleted.
//!
//! # Invariants
//! - Updates replace every user-suppliable field; the owner is kept.
//! - Deleting a venue and cascading to reviews are two separate writes.

use crate::config::DEFAULT_VENUES_PER_PAGE;
use crate::model::venue::{Venue, VenueFields, VenueId};
use crate::repo::review_repo::ReviewRepository;
use crate::repo::venue_repo::{VenuePage, VenueRepository};
use crate::repo::RepoResult;
use crate::service::{ServiceError, ServiceResult};
use log::{error, info};

/// Which reviews disappear together with a deleted venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewCascade {
    /// Reviews whose owner handle equals the venue's owner handle,
    /// whatever venue they point at. Matches the deployed behavior.
    #[default]
    ByOwnerHandle,
    /// Reviews pointing at the deleted venue.
    ByVenueId,
}

impl ReviewCascade {
    fn apply<R: ReviewRepository>(self, reviews: &R, venue: &Venue) -> RepoResult<usize> {
        match self {
            Self::ByOwnerHandle => reviews.delete_by_owner(&venue.owner),
            Self::ByVenueId => reviews.delete_by_venue(venue.id),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ByOwnerHandle => "by_owner_handle",
            Self::ByVenueId => "by_venue_id",
        }
    }
}

/// Result of a venue deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueDeletion {
    pub venue: Venue,
    pub reviews_removed: usize,
}

pub struct VenueService<V: VenueRepository, R: ReviewRepository> {
    venues: V,
    reviews: R,
    page_size: u32,
    cascade: ReviewCascade,
}

impl<V: VenueRepository, R: ReviewRepository> VenueService<V, R> {
    pub fn new(venues: V, reviews: R) -> Self {
        Self {
            venues,
            reviews,
            page_size: DEFAULT_VENUES_PER_PAGE,
            cascade: ReviewCascade::default(),
        }
    }

    /// Overrides the listing page size. Zero is treated as one.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_cascade(mut self, cascade: ReviewCascade) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn create_venue(&self, fields: VenueFields, owner: &str) -> ServiceResult<Venue> {
        let venue = Venue::new(fields, owner);
        self.venues.create_venue(&venue)?;
        info!(
            "event=venue_create module=service status=ok venue_id={} owner={}",
            venue.id, venue.owner
        );
        Ok(venue)
    }

    /// Returns 1-based `page`; pages past the end are empty.
    pub fn list_venues(&self, page: u32) -> ServiceResult<VenuePage> {
        Ok(self.venues.list_page(page, self.page_size)?)
    }

    pub fn get_venue(&self, id: VenueId) -> ServiceResult<Venue> {
        self.venues
            .get_venue(id)?
            .ok_or(ServiceError::NotFound {
                entity: "venue",
                id,
            })
    }

    /// Overwrites every field of venue `id` with `fields`.
    ///
    /// Fields left blank in `fields` become blank in storage.
    pub fn update_venue(&self, id: VenueId, fields: VenueFields) -> ServiceResult<Venue> {
        let mut venue = self.get_venue(id)?;
        venue.overwrite(fields);
        self.venues.update_venue(&venue)?;
        info!("event=venue_update module=service status=ok venue_id={id}");
        Ok(venue)
    }

    /// Deletes venue `id`, then the reviews selected by the cascade policy.
    ///
    /// The two deletes are not atomic: when the cascade fails the venue is
    /// already gone and the error is returned.
    pub fn delete_venue(&self, id: VenueId) -> ServiceResult<VenueDeletion> {
        let venue = self.get_venue(id)?;
        self.venues.delete_venue(id)?;

        let reviews_removed = match self.cascade.apply(&self.reviews, &venue) {
            Ok(removed) => removed,
            Err(err) => {
                error!(
                    "event=venue_delete module=service status=error stage=cascade policy={} venue_id={} error={}",
                    self.cascade.as_str(),
                    id,
                    err
                );
                return Err(err.into());
            }
        };

        info!(
            "event=venue_delete module=service status=ok venue_id={} policy={} reviews_removed={}",
            id,
            self.cascade.as_str(),
            reviews_removed
        );
        Ok(VenueDeletion {
            venue,
            reviews_removed,
        })
    }

    pub fn count_venues(&self) -> ServiceResult<u64> {
        Ok(self.venues.count_venues()?)
    }
}
