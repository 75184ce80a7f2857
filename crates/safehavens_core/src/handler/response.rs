//! Handler responses: views, flashes, redirects and error pages.

use crate::model::review::{Review, ReviewFlags};
use crate::model::venue::{Venue, VenueId};
use crate::repo::venue_repo::VenuePage;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Danger,
}

impl FlashLevel {
    /// Category name used by the templates.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Danger => "danger",
        }
    }
}

/// One-shot notification shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Danger,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Main { page: u32 },
    SignIn,
    AdminDashboard,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Main { page } => format!("/main/{page}"),
            Self::SignIn => "/user/sign-in".to_string(),
            Self::AdminDashboard => "/admin_dashboard".to_string(),
        }
    }
}

/// Listing page: one page of venues plus the reviews of those venues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainView {
    pub venues: VenuePage,
    pub reviews: BTreeMap<VenueId, Vec<Review>>,
}

/// Data behind the add/edit venue forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueFormView {
    /// Present when editing.
    pub venue: Option<Venue>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Home,
    Main(MainView),
    AddVenue(VenueFormView),
    EditVenue(VenueFormView),
    AddReview { venue_id: VenueId, flags: ReviewFlags },
}

/// Themed error page with a recovery link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    pub status: u16,
    pub error_type: &'static str,
    pub excuse: &'static str,
    pub detail: String,
    pub recovery: Route,
}

impl ErrorPage {
    /// Builds the page for 400, 404, 405 or 500; other codes render as 500.
    pub fn for_status(status: u16, detail: impl Into<String>) -> Self {
        let (status, error_type, excuse) = match status {
            400 => (
                400,
                "Client: 400 - Bad Request",
                "Apologies, the Safe Havens Security Detail could not verify this request. Please click on [ Home ] to go to the Home Page, or sign out and back in.",
            ),
            404 => (
                404,
                "Client: 404 - Page Not Found",
                "Apologies, our Staff are lost in the Safe Havens! Please click on [ Home ] to go to the Home Page.",
            ),
            405 => (
                405,
                "Client: 405 - Method Not Allowed",
                "Apologies, our Staff won't allow you to do this! Please click on [ Home ] to go to the Home Page.",
            ),
            _ => (
                500,
                "Server: 500 - Internal Server Error",
                "Apologies, something serious occurred and the Staff are working on resolving the issue! Please click on [ Home ] to go to the Home Page.",
            ),
        };
        Self {
            status,
            error_type,
            excuse,
            detail: detail.into(),
            recovery: Route::Home,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Page { view: View, flashes: Vec<Flash> },
    Redirect { to: Route, flashes: Vec<Flash> },
    Error(ErrorPage),
}

impl Response {
    pub fn page(view: View) -> Self {
        Self::Page {
            view,
            flashes: Vec::new(),
        }
    }

    pub fn redirect(to: Route, flash: Flash) -> Self {
        Self::Redirect {
            to,
            flashes: vec![flash],
        }
    }

    /// HTTP status the serving layer should use.
    pub fn status(&self) -> u16 {
        match self {
            Self::Page { .. } => 200,
            Self::Redirect { .. } => 302,
            Self::Error(page) => page.status,
        }
    }

    pub fn flashes(&self) -> &[Flash] {
        match self {
            Self::Page { flashes, .. } | Self::Redirect { flashes, .. } => flashes,
            Self::Error(_) => &[],
        }
    }
}
