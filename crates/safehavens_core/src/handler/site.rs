//! Route-level operations over the shared connection.
//!
//! # Responsibility
//! - Run the admin bootstrap on every landing request.
//! - Map venue, review and import results to flashes and redirects.
//!
//! # Invariants
//! - Repositories are built per call from the one injected connection.
//! - Persistence causes reach the log only; callers see a fixed message.

use super::forms::{ReviewForm, VenueForm};
use super::response::{ErrorPage, Flash, MainView, Response, Route, VenueFormView, View};
use super::{Gate, RequestContext};
use crate::config::{AdminCredentials, AppConfig};
use crate::credential::CredentialHasher;
use crate::model::review::{ReviewFlags, ReviewId};
use crate::model::venue::{VenueCategories, VenueId};
use crate::repo::account_repo::SqliteCredentialStore;
use crate::repo::review_repo::SqliteReviewRepository;
use crate::repo::venue_repo::SqliteVenueRepository;
use crate::repo::RepoResult;
use crate::service::bootstrap::{AdminBootstrap, BootstrapFailure, BootstrapOutcome};
use crate::service::import::{ImportError, VenueImporter};
use crate::service::review_service::ReviewService;
use crate::service::venue_service::{ReviewCascade, VenueService};
use crate::service::{ErrorKind, ServiceError};
use log::error;
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

type SqliteVenueService<'conn> =
    VenueService<SqliteVenueRepository<'conn>, SqliteReviewRepository<'conn>>;

/// Settings the handlers need from process configuration.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub admin: AdminCredentials,
    pub venues_per_page: u32,
    pub categories: VenueCategories,
    pub dataset_path: PathBuf,
    pub cascade: ReviewCascade,
}

impl From<&AppConfig> for SiteSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            admin: config.admin.clone(),
            venues_per_page: config.venues_per_page,
            categories: config.categories.clone(),
            dataset_path: config.dataset_path.clone(),
            cascade: ReviewCascade::default(),
        }
    }
}

pub struct Site<'conn, H: CredentialHasher> {
    conn: &'conn Connection,
    hasher: H,
    settings: SiteSettings,
}

impl<'conn, H: CredentialHasher> Site<'conn, H> {
    pub fn new(conn: &'conn Connection, hasher: H, settings: SiteSettings) -> Self {
        Self {
            conn,
            hasher,
            settings,
        }
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    /// Landing page. Creates the `admin` account first when it is missing.
    pub fn home(&self, _ctx: &RequestContext) -> Response {
        let outcome = match SqliteCredentialStore::try_new(self.conn) {
            Ok(store) => {
                let admin = self.settings.admin.clone();
                AdminBootstrap::new(store, &self.hasher, admin).ensure_admin()
            }
            Err(err) => {
                error!("event=admin_bootstrap module=handler status=error error={err}");
                BootstrapOutcome::Failed(BootstrapFailure::Store(err))
            }
        };

        let flashes = match outcome {
            BootstrapOutcome::Created(_) => vec![Flash::success("'admin' account created.")],
            BootstrapOutcome::AlreadyPresent => Vec::new(),
            BootstrapOutcome::Failed(_) => vec![Flash::danger("'admin' account not created.")],
        };
        Response::Page {
            view: View::Home,
            flashes,
        }
    }

    /// Public venue listing with the reviews of every listed venue.
    pub fn main_page(&self, _ctx: &RequestContext, page: u32) -> Response {
        let listed = self.venue_service().map_err(ServiceError::from).and_then(|service| {
            let venues = service.list_venues(page)?;
            let reviews = self.review_service()?;
            let mut by_venue = BTreeMap::new();
            for venue in &venues.items {
                by_venue.insert(venue.id, reviews.list_for_venue(venue.id)?);
            }
            Ok(MainView {
                venues,
                reviews: by_venue,
            })
        });

        match listed {
            Ok(view) => Response::page(View::Main(view)),
            Err(err) => internal_error("main_page", &err),
        }
    }

    pub fn add_venue_form(&self, ctx: &RequestContext) -> Response {
        if let Err(denied) = Gate::VIEW.check(ctx) {
            return denied.into_response("add_venue");
        }
        Response::page(View::AddVenue(VenueFormView {
            venue: None,
            categories: self.settings.categories.sorted(),
        }))
    }

    pub fn save_venue(&self, ctx: &RequestContext, form: VenueForm) -> Response {
        let identity = match Gate::WRITE.check(ctx) {
            Ok(identity) => identity,
            Err(denied) => return denied.into_response("save_venue"),
        };

        let saved = self
            .venue_service()
            .map_err(ServiceError::from)
            .and_then(|service| service.create_venue(form.into_fields(), &identity.handle));
        match saved {
            Ok(_) => Response::redirect(
                Route::Main { page: 1 },
                Flash::success("The venue was saved!"),
            ),
            Err(err) => write_failed("save_venue", err, "The venue was NOT saved!"),
        }
    }

    pub fn edit_venue_form(&self, ctx: &RequestContext, id: VenueId) -> Response {
        if let Err(denied) = Gate::ADMIN_VIEW.check(ctx) {
            return denied.into_response("edit_venue");
        }

        let venue = self
            .venue_service()
            .map_err(ServiceError::from)
            .and_then(|service| service.get_venue(id));
        match venue {
            Ok(venue) => Response::page(View::EditVenue(VenueFormView {
                venue: Some(venue),
                categories: self.settings.categories.sorted(),
            })),
            Err(err) if err.kind() == ErrorKind::NotFound => not_found(&err),
            Err(err) => internal_error("edit_venue", &err),
        }
    }

    /// Overwrites every venue field with the submitted form.
    pub fn update_venue(&self, ctx: &RequestContext, id: VenueId, form: VenueForm) -> Response {
        if let Err(denied) = Gate::ADMIN_WRITE.check(ctx) {
            return denied.into_response("update_venue");
        }

        let updated = self
            .venue_service()
            .map_err(ServiceError::from)
            .and_then(|service| service.update_venue(id, form.into_fields()));
        match updated {
            Ok(_) => Response::redirect(
                Route::Main { page: 1 },
                Flash::success("The venue was updated!"),
            ),
            Err(err) => write_failed("update_venue", err, "The venue was NOT updated!"),
        }
    }

    pub fn delete_venue(&self, ctx: &RequestContext, id: VenueId) -> Response {
        if let Err(denied) = Gate::ADMIN_WRITE.check(ctx) {
            return denied.into_response("delete_venue");
        }

        let deleted = self
            .venue_service()
            .map_err(ServiceError::from)
            .and_then(|service| service.delete_venue(id));
        match deleted {
            Ok(_) => Response::redirect(
                Route::Main { page: 1 },
                Flash::success("The venue was deleted!"),
            ),
            Err(err) => write_failed("delete_venue", err, "The venue was NOT deleted!"),
        }
    }

    pub fn add_review_form(&self, ctx: &RequestContext, venue_id: VenueId) -> Response {
        if let Err(denied) = Gate::VIEW.check(ctx) {
            return denied.into_response("add_review");
        }
        Response::page(View::AddReview {
            venue_id,
            flags: ReviewFlags::defaults(),
        })
    }

    /// Stores a review; the venue id is taken on trust.
    pub fn save_review(
        &self,
        ctx: &RequestContext,
        venue_id: VenueId,
        form: ReviewForm,
    ) -> Response {
        let identity = match Gate::WRITE.check(ctx) {
            Ok(identity) => identity,
            Err(denied) => return denied.into_response("save_review"),
        };

        let saved = self.review_service().and_then(|service| {
            service.create_review(venue_id, &identity.handle, form.text(), form.flags())
        });
        match saved {
            Ok(_) => Response::redirect(
                Route::Main { page: 1 },
                Flash::success("The review was saved!"),
            ),
            Err(err) => write_failed("save_review", err, "The review was NOT saved!"),
        }
    }

    pub fn delete_review(&self, ctx: &RequestContext, id: ReviewId) -> Response {
        if let Err(denied) = Gate::ADMIN_WRITE.check(ctx) {
            return denied.into_response("delete_review");
        }

        let deleted = self
            .review_service()
            .and_then(|service| service.delete_review(id));
        match deleted {
            Ok(()) => Response::redirect(
                Route::Main { page: 1 },
                Flash::success("The review was deleted!"),
            ),
            Err(err) => write_failed("delete_review", err, "The review was NOT deleted!"),
        }
    }

    /// Imports the configured venue dataset.
    pub fn load_venues(&self, ctx: &RequestContext) -> Response {
        if let Err(denied) = Gate::ADMIN_VIEW.check(ctx) {
            return denied.into_response("load_venues");
        }

        let path = self.settings.dataset_path.as_path();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let categories = self.settings.categories.clone();
        let imported = SqliteVenueRepository::with_categories(self.conn, categories)
            .map_err(ImportError::InsertFailure)
            .and_then(|venues| {
                VenueImporter::new(venues, self.settings.categories.clone()).import_file(path)
            });

        match imported {
            Ok(_) => Response::redirect(
                Route::Main { page: 1 },
                Flash::success("Venues Collection created."),
            ),
            Err(ImportError::SourceNotFound(_)) => Response::redirect(
                Route::Main { page: 1 },
                Flash::danger(format!("'{file_name}' can't be found.")),
            ),
            Err(ImportError::SourceUnreadable { .. }) => Response::redirect(
                Route::Main { page: 1 },
                Flash::danger(format!("'{file_name}' can't be read.")),
            ),
            Err(ImportError::MalformedSource(_)) => Response::redirect(
                Route::Main { page: 1 },
                Flash::danger(format!("'{file_name}' isn't a proper JSON file.")),
            ),
            Err(ImportError::SchemaViolation { .. }) => Response::redirect(
                Route::AdminDashboard,
                Flash::danger(format!("'{file_name}' has JSON Schema errors.")),
            ),
            Err(ImportError::InsertFailure(_)) => Response::redirect(
                Route::Main { page: 1 },
                Flash::danger("Venues Collection NOT created."),
            ),
        }
    }

    fn venue_service(&self) -> RepoResult<SqliteVenueService<'conn>> {
        let venues =
            SqliteVenueRepository::with_categories(self.conn, self.settings.categories.clone())?;
        let reviews = SqliteReviewRepository::try_new(self.conn)?;
        Ok(VenueService::new(venues, reviews)
            .with_page_size(self.settings.venues_per_page)
            .with_cascade(self.settings.cascade))
    }

    fn review_service(&self) -> Result<ReviewService<SqliteReviewRepository<'conn>>, ServiceError> {
        Ok(ReviewService::new(SqliteReviewRepository::try_new(self.conn)?))
    }
}

fn write_failed(operation: &'static str, err: ServiceError, message: &str) -> Response {
    match err.kind() {
        ErrorKind::NotFound => not_found(&err),
        ErrorKind::Validation => Response::redirect(
            Route::Main { page: 1 },
            Flash::danger(format!("{message} {err}")),
        ),
        ErrorKind::Persistence => {
            error!(
                "event={} module=handler status=error error={} cause={}",
                operation,
                err,
                root_cause(&err)
            );
            Response::redirect(Route::Main { page: 1 }, Flash::danger(message))
        }
    }
}

fn not_found(err: &ServiceError) -> Response {
    Response::Error(ErrorPage::for_status(404, err.to_string()))
}

fn internal_error(operation: &'static str, err: &ServiceError) -> Response {
    error!(
        "event={} module=handler status=error error={} cause={}",
        operation,
        err,
        root_cause(err)
    );
    Response::Error(ErrorPage::for_status(500, ""))
}

fn root_cause(err: &(dyn Error + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}
