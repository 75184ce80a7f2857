//! Review repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist reviews together with their named flag sets.
//! - Provide the bulk deletes used by venue cascade policies.
//!
//! # Invariants
//! - A review and its flags are written in one transaction.
//! - `venue_id` is never checked against `venues`.
//! - Flag rows follow their review through `ON DELETE CASCADE`.

use super::{
    bool_to_int, ensure_connection_ready, parse_bool, parse_uuid, RepoError, RepoResult,
};
use crate::model::review::{FlagKind, Review, ReviewFlags, ReviewId};
use crate::model::venue::VenueId;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const REVIEW_SELECT_SQL: &str = "SELECT
    id,
    text_field,
    user,
    venue_id
FROM reviews";

/// Repository interface for review operations.
pub trait ReviewRepository {
    fn create_review(&self, review: &Review) -> RepoResult<ReviewId>;
    fn get_review(&self, id: ReviewId) -> RepoResult<Option<Review>>;
    /// Snapshot of every review pointing at `venue_id`, oldest first.
    fn list_by_venue(&self, venue_id: VenueId) -> RepoResult<Vec<Review>>;
    fn delete_review(&self, id: ReviewId) -> RepoResult<()>;
    /// Deletes every review written by `owner`. Returns the number removed.
    fn delete_by_owner(&self, owner: &str) -> RepoResult<usize>;
    /// Deletes every review pointing at `venue_id`. Returns the number removed.
    fn delete_by_venue(&self, venue_id: VenueId) -> RepoResult<usize>;
}

impl<R: ReviewRepository + ?Sized> ReviewRepository for &R {
    fn create_review(&self, review: &Review) -> RepoResult<ReviewId> {
        (**self).create_review(review)
    }

    fn get_review(&self, id: ReviewId) -> RepoResult<Option<Review>> {
        (**self).get_review(id)
    }

    fn list_by_venue(&self, venue_id: VenueId) -> RepoResult<Vec<Review>> {
        (**self).list_by_venue(venue_id)
    }

    fn delete_review(&self, id: ReviewId) -> RepoResult<()> {
        (**self).delete_review(id)
    }

    fn delete_by_owner(&self, owner: &str) -> RepoResult<usize> {
        (**self).delete_by_owner(owner)
    }

    fn delete_by_venue(&self, venue_id: VenueId) -> RepoResult<usize> {
        (**self).delete_by_venue(venue_id)
    }
}

/// SQLite-backed review repository.
pub struct SqliteReviewRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReviewRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["reviews", "review_flags"])?;
        Ok(Self { conn })
    }
}

impl ReviewRepository for SqliteReviewRepository<'_> {
    fn create_review(&self, review: &Review) -> RepoResult<ReviewId> {
        review.validate()?;

        let review_id = review.id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO reviews (id, text_field, user, venue_id)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                review_id.as_str(),
                review.text.as_str(),
                review.owner.as_str(),
                review.venue_id.to_string(),
            ],
        )?;
        for (kind, name, value) in review.flags.entries() {
            tx.execute(
                "INSERT INTO review_flags (review_id, kind, name, value)
                 VALUES (?1, ?2, ?3, ?4);",
                params![review_id.as_str(), kind.as_str(), name, bool_to_int(value)],
            )?;
        }
        tx.commit()?;

        Ok(review.id)
    }

    fn get_review(&self, id: ReviewId) -> RepoResult<Option<Review>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REVIEW_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_review_row(self.conn, row)?));
        }

        Ok(None)
    }

    fn list_by_venue(&self, venue_id: VenueId) -> RepoResult<Vec<Review>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REVIEW_SELECT_SQL}
             WHERE venue_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;

        let mut rows = stmt.query([venue_id.to_string()])?;
        let mut reviews = Vec::new();
        while let Some(row) = rows.next()? {
            reviews.push(parse_review_row(self.conn, row)?);
        }

        Ok(reviews)
    }

    fn delete_review(&self, id: ReviewId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM reviews WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "review",
                id,
            });
        }

        Ok(())
    }

    fn delete_by_owner(&self, owner: &str) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM reviews WHERE user = ?1;", [owner])?;
        Ok(removed)
    }

    fn delete_by_venue(&self, venue_id: VenueId) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM reviews WHERE venue_id = ?1;",
            [venue_id.to_string()],
        )?;
        Ok(removed)
    }
}

fn parse_review_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Review> {
    let id_text: String = row.get("id")?;
    let venue_text: String = row.get("venue_id")?;
    let flags = load_flags(conn, &id_text)?;

    Ok(Review {
        id: parse_uuid(&id_text, "reviews.id")?,
        text: row.get("text_field")?,
        owner: row.get("user")?,
        venue_id: parse_uuid(&venue_text, "reviews.venue_id")?,
        flags,
    })
}

fn load_flags(conn: &Connection, review_id: &str) -> RepoResult<ReviewFlags> {
    let mut stmt = conn.prepare(
        "SELECT kind, name, value
         FROM review_flags
         WHERE review_id = ?1
         ORDER BY kind ASC, name ASC;",
    )?;

    let mut rows = stmt.query([review_id])?;
    let mut flags = ReviewFlags::default();
    while let Some(row) = rows.next()? {
        let kind_text: String = row.get(0)?;
        let kind = FlagKind::parse(&kind_text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid flag kind `{kind_text}` in review_flags.kind"))
        })?;
        let name: String = row.get(1)?;
        let value = parse_bool(row.get(2)?, "review_flags.value")?;
        flags.set(kind, name, value);
    }

    Ok(flags)
}
