//! List page: filter draft, applied state and the URL.
//!
//! # Design
//! Three slices cooperate here:
//! - the *draft* filters the user is editing, never fetched on their own;
//! - the *applied* `ListParams` that drive the last/next fetch;
//! - the URL query, which is the source of truth for the applied slice.
//!
//! The only way the applied slice changes is `Hydrate`, i.e. the host
//! reporting that the URL changed. Submitting filters, sorting, paging and
//! clearing all just push a new URL. The single exception is reconciliation:
//! when the server answers with a different page number than requested, the
//! local page is corrected in place, with no navigation and no refetch.

use tracing::{debug, warn};

use super::{ApiCall, Controller, Effect, Generation, Reply};
use crate::error::ApiError;
use crate::query::{
    split_location, DriverFilters, DriverSort, FilterField, ListParams, ListQuery, PageSize, SuccessMarker, LIST_PATH,
};
use crate::types::{Driver, VehicleType};

const LOAD_FALLBACK: &str = "Failed to load data.";

#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    /// The URL query changed (mount, push, back/forward, shared link).
    Hydrate { query: String },
    EditField(FilterField, String),
    ToggleVehicleType(VehicleType),
    SubmitFilters,
    ClearFilters,
    ChangeSort(DriverSort),
    ChangePageSize(PageSize),
    /// Signed so that "previous" from page 0 can be expressed and ignored.
    GoToPage(i64),
    DismissSuccess,
    Completed {
        generation: u64,
        reply: Result<Reply, ApiError>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListController {
    draft: DriverFilters,
    applied: ListParams,
    success: Option<SuccessMarker>,
    hydrated: bool,
    rows: Vec<Driver>,
    total_elements: u64,
    total_pages: u32,
    loading: bool,
    error: Option<String>,
    generation: Generation,
}

/// Pure transition: `(state, event) -> (state, effects)`.
pub fn reduce(mut state: ListController, event: ListEvent) -> (ListController, Vec<Effect>) {
    let effects = state.update(event);
    (state, effects)
}

impl ListController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &DriverFilters {
        &self.draft
    }

    pub fn applied(&self) -> &ListParams {
        &self.applied
    }

    pub fn page(&self) -> u32 {
        self.applied.page
    }

    pub fn rows(&self) -> &[Driver] {
        &self.rows
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<SuccessMarker> {
        self.success
    }

    pub fn success_message(&self) -> Option<&'static str> {
        self.success.map(SuccessMarker::message)
    }

    pub fn total_label(&self) -> String {
        match self.total_elements {
            1 => "1 driver found".to_string(),
            n => format!("{n} drivers found"),
        }
    }

    pub fn showing_label(&self) -> String {
        format!("Showing {} of {}", self.rows.len(), self.total_elements)
    }

    pub fn page_label(&self) -> String {
        let current = if self.total_pages == 0 {
            0
        } else {
            u64::from(self.applied.page) + 1
        };
        format!("Page {current} of {}", self.total_pages)
    }

    pub fn can_go_previous(&self) -> bool {
        self.applied.page > 0 && !self.loading
    }

    pub fn can_go_next(&self) -> bool {
        u64::from(self.applied.page) + 1 < u64::from(self.total_pages) && !self.loading
    }

    fn hydrate(&mut self, query: &str) -> Vec<Effect> {
        let parsed = ListQuery::parse(query);
        self.draft = parsed.params.filters.clone();
        self.success = parsed.success;

        let changed = !self.hydrated || parsed.params != self.applied;
        self.applied = parsed.params;
        self.hydrated = true;

        if changed {
            vec![self.fetch()]
        } else {
            Vec::new()
        }
    }

    fn fetch(&mut self) -> Effect {
        let generation = self.generation.advance();
        self.loading = true;
        self.error = None;
        debug!(generation, page = self.applied.page, "fetching drivers");
        Effect::Call {
            generation,
            call: ApiCall::ListDrivers(self.applied.clone()),
        }
    }

    /// Push a URL for `params`; `Hydrate` will follow.
    fn navigate(params: ListParams) -> Vec<Effect> {
        vec![Effect::Navigate(ListQuery::new(params).list_location())]
    }

    fn with_applied(&self, update: impl FnOnce(&mut ListParams)) -> ListParams {
        let mut params = self.applied.clone();
        update(&mut params);
        params
    }

    fn complete(&mut self, generation: u64, reply: Result<Reply, ApiError>) -> Vec<Effect> {
        if !self.generation.is_current(generation) {
            debug!(generation, latest = self.generation.latest(), "discarding stale list response");
            return Vec::new();
        }
        self.loading = false;

        match reply {
            Ok(Reply::Page(page)) => {
                self.rows = page.content;
                self.total_elements = page.total_elements;
                self.total_pages = page.total_pages;
                if page.number != self.applied.page {
                    debug!(requested = self.applied.page, served = page.number, "reconciling page");
                    self.applied.page = page.number;
                }
                Vec::new()
            }
            Ok(other) => {
                warn!(?other, "unexpected reply for a list fetch");
                Vec::new()
            }
            Err(err) if err.is_unauthorized() => vec![Effect::RedirectToLogin],
            Err(err) => {
                self.error = Some(err.display_message(LOAD_FALLBACK));
                Vec::new()
            }
        }
    }
}

impl Controller for ListController {
    type Event = ListEvent;

    fn update(&mut self, event: ListEvent) -> Vec<Effect> {
        match event {
            ListEvent::Hydrate { query } => self.hydrate(&query),
            ListEvent::EditField(field, value) => {
                self.draft.set_field(field, value);
                Vec::new()
            }
            ListEvent::ToggleVehicleType(vehicle_type) => {
                self.draft.toggle_vehicle_type(vehicle_type);
                Vec::new()
            }
            ListEvent::SubmitFilters => {
                let filters = self.draft.clone();
                Self::navigate(self.with_applied(|p| {
                    p.filters = filters;
                    p.page = 0;
                }))
            }
            ListEvent::ClearFilters => {
                self.draft = DriverFilters::default();
                Self::navigate(self.with_applied(|p| {
                    p.filters = DriverFilters::default();
                    p.page = 0;
                }))
            }
            ListEvent::ChangeSort(sort) => Self::navigate(self.with_applied(|p| {
                p.sort = sort;
                p.page = 0;
            })),
            ListEvent::ChangePageSize(page_size) => Self::navigate(self.with_applied(|p| {
                p.page_size = page_size;
                p.page = 0;
            })),
            ListEvent::GoToPage(page) => {
                if page < 0 || page >= i64::from(self.total_pages) {
                    return Vec::new();
                }
                // Bounded by total_pages, which is a u32.
                let page = page as u32;
                Self::navigate(self.with_applied(|p| p.page = page))
            }
            ListEvent::DismissSuccess => {
                if self.success.is_none() {
                    return Vec::new();
                }
                Self::navigate(self.applied.clone())
            }
            ListEvent::Completed { generation, reply } => self.complete(generation, reply),
        }
    }

    fn completed(generation: u64, reply: Result<Reply, ApiError>) -> ListEvent {
        ListEvent::Completed { generation, reply }
    }

    fn on_navigate(&self, location: &str) -> Option<ListEvent> {
        let (path, query) = split_location(location);
        (path == LIST_PATH).then(|| ListEvent::Hydrate {
            query: query.to_string(),
        })
    }
}
