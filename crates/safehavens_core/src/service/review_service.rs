//! Review use-case service.
//!
//! # Invariants
//! - Reviews may target venue ids that do not (or no longer) exist.

use crate::model::review::{Review, ReviewFlags, ReviewId};
use crate::model::venue::VenueId;
use crate::repo::review_repo::ReviewRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;

pub struct ReviewService<R: ReviewRepository> {
    reviews: R,
}

impl<R: ReviewRepository> ReviewService<R> {
    pub fn new(reviews: R) -> Self {
        Self { reviews }
    }

    /// Stores a review written by `owner` against `venue_id`.
    pub fn create_review(
        &self,
        venue_id: VenueId,
        owner: &str,
        text: impl Into<String>,
        flags: ReviewFlags,
    ) -> ServiceResult<Review> {
        let review = Review::new(venue_id, owner, text, flags);
        self.reviews.create_review(&review)?;
        info!(
            "event=review_create module=service status=ok review_id={} venue_id={}",
            review.id, venue_id
        );
        Ok(review)
    }

    pub fn get_review(&self, id: ReviewId) -> ServiceResult<Review> {
        self.reviews
            .get_review(id)?
            .ok_or(ServiceError::NotFound {
                entity: "review",
                id,
            })
    }

    pub fn list_for_venue(&self, venue_id: VenueId) -> ServiceResult<Vec<Review>> {
        Ok(self.reviews.list_by_venue(venue_id)?)
    }

    pub fn delete_review(&self, id: ReviewId) -> ServiceResult<()> {
        self.reviews.delete_review(id)?;
        info!("event=review_delete module=service status=ok review_id={id}");
        Ok(())
    }
}
