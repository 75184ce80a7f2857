//! Venue repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/list/get/update/delete over the `venues` collection.
//! - Insert import batches all-or-nothing.
//!
//! # Invariants
//! - Listing is ordered by `name ASC, id ASC` so pages are deterministic.
//! - Pages are 1-based; a page past the end is empty, not an error.
//! - Category validation uses the registry the repository was built with.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::venue::{Venue, VenueCategories, VenueId};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const VENUE_SELECT_SQL: &str = "SELECT
    id,
    name,
    venue_type,
    address,
    post_code,
    city,
    country,
    lat,
    lng,
    link,
    user
FROM venues";

const VENUE_INSERT_SQL: &str = "INSERT INTO venues (
    id,
    name,
    venue_type,
    address,
    post_code,
    city,
    country,
    lat,
    lng,
    link,
    user
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);";

/// One page of the venue listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenuePage {
    pub items: Vec<Venue>,
    /// Effective 1-based page number.
    pub page: u32,
    pub page_size: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

impl VenuePage {
    pub fn prev_page(&self) -> Option<u32> {
        self.has_prev.then(|| self.page - 1)
    }

    pub fn next_page(&self) -> Option<u32> {
        self.has_next.then(|| self.page + 1)
    }
}

/// Repository interface for venue CRUD operations.
pub trait VenueRepository {
    fn create_venue(&self, venue: &Venue) -> RepoResult<VenueId>;
    /// Inserts every venue or none of them.
    fn insert_batch(&self, venues: &[Venue]) -> RepoResult<usize>;
    fn list_page(&self, page: u32, page_size: u32) -> RepoResult<VenuePage>;
    fn get_venue(&self, id: VenueId) -> RepoResult<Option<Venue>>;
    /// Overwrites every stored field except `user` with the given record.
    fn update_venue(&self, venue: &Venue) -> RepoResult<()>;
    fn delete_venue(&self, id: VenueId) -> RepoResult<()>;
    fn count_venues(&self) -> RepoResult<u64>;
}

impl<V: VenueRepository + ?Sized> VenueRepository for &V {
    fn create_venue(&self, venue: &Venue) -> RepoResult<VenueId> {
        (**self).create_venue(venue)
    }

    fn insert_batch(&self, venues: &[Venue]) -> RepoResult<usize> {
        (**self).insert_batch(venues)
    }

    fn list_page(&self, page: u32, page_size: u32) -> RepoResult<VenuePage> {
        (**self).list_page(page, page_size)
    }

    fn get_venue(&self, id: VenueId) -> RepoResult<Option<Venue>> {
        (**self).get_venue(id)
    }

    fn update_venue(&self, venue: &Venue) -> RepoResult<()> {
        (**self).update_venue(venue)
    }

    fn delete_venue(&self, id: VenueId) -> RepoResult<()> {
        (**self).delete_venue(id)
    }

    fn count_venues(&self) -> RepoResult<u64> {
        (**self).count_venues()
    }
}

/// SQLite-backed venue repository.
pub struct SqliteVenueRepository<'conn> {
    conn: &'conn Connection,
    categories: VenueCategories,
}

impl<'conn> SqliteVenueRepository<'conn> {
    /// Constructs a repository validating against the default categories.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_categories(conn, VenueCategories::default())
    }

    pub fn with_categories(
        conn: &'conn Connection,
        categories: VenueCategories,
    ) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["venues"])?;
        Ok(Self { conn, categories })
    }

    pub fn categories(&self) -> &VenueCategories {
        &self.categories
    }
}

impl VenueRepository for SqliteVenueRepository<'_> {
    fn create_venue(&self, venue: &Venue) -> RepoResult<VenueId> {
        venue.validate(&self.categories)?;
        insert_venue(self.conn, venue)?;
        Ok(venue.id)
    }

    fn insert_batch(&self, venues: &[Venue]) -> RepoResult<usize> {
        for venue in venues {
            venue.validate(&self.categories)?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for venue in venues {
            insert_venue(&tx, venue)?;
        }
        tx.commit()?;

        Ok(venues.len())
    }

    fn list_page(&self, page: u32, page_size: u32) -> RepoResult<VenuePage> {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let offset = i64::from(page - 1) * i64::from(page_size);

        let mut stmt = self.conn.prepare(&format!(
            "{VENUE_SELECT_SQL}
             ORDER BY name ASC, id ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        // One extra row tells whether a next page exists.
        let mut rows = stmt.query(params![i64::from(page_size) + 1, offset])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_venue_row(row)?);
        }

        let has_next = items.len() > page_size as usize;
        items.truncate(page_size as usize);

        Ok(VenuePage {
            items,
            page,
            page_size,
            has_prev: page > 1,
            has_next,
        })
    }

    fn get_venue(&self, id: VenueId) -> RepoResult<Option<Venue>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{VENUE_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_venue_row(row)?));
        }

        Ok(None)
    }

    fn update_venue(&self, venue: &Venue) -> RepoResult<()> {
        venue.validate(&self.categories)?;

        let changed = self.conn.execute(
            "UPDATE venues
             SET
                name = ?2,
                venue_type = ?3,
                address = ?4,
                post_code = ?5,
                city = ?6,
                country = ?7,
                lat = ?8,
                lng = ?9,
                link = ?10,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                venue.id.to_string(),
                venue.name.as_str(),
                venue.category.as_deref(),
                venue.address.as_str(),
                venue.post_code.as_str(),
                venue.city.as_str(),
                venue.country.as_str(),
                venue.lat.as_str(),
                venue.lng.as_str(),
                venue.link.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "venue",
                id: venue.id,
            });
        }

        Ok(())
    }

    fn delete_venue(&self, id: VenueId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM venues WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "venue",
                id,
            });
        }

        Ok(())
    }

    fn count_venues(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM venues;", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

fn insert_venue(conn: &Connection, venue: &Venue) -> RepoResult<()> {
    conn.execute(
        VENUE_INSERT_SQL,
        params![
            venue.id.to_string(),
            venue.name.as_str(),
            venue.category.as_deref(),
            venue.address.as_str(),
            venue.post_code.as_str(),
            venue.city.as_str(),
            venue.country.as_str(),
            venue.lat.as_str(),
            venue.lng.as_str(),
            venue.link.as_str(),
            venue.owner.as_str(),
        ],
    )?;
    Ok(())
}

fn parse_venue_row(row: &Row<'_>) -> RepoResult<Venue> {
    let id_text: String = row.get("id")?;
    Ok(Venue {
        id: parse_uuid(&id_text, "venues.id")?,
        name: row.get("name")?,
        category: row.get("venue_type")?,
        address: row.get("address")?,
        post_code: row.get("post_code")?,
        city: row.get("city")?,
        country: row.get("country")?,
        lat: row.get("lat")?,
        lng: row.get("lng")?,
        link: row.get("link")?,
        owner: row.get("user")?,
    })
}
