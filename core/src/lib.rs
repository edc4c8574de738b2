//! Client core for the driver management service.
//!
//! # Overview
//! Talks to the drivers REST API and models the pages that use it: a
//! filterable, sortable, paginated list whose state lives in the URL, a
//! detail page with edit and soft delete, a create page and a login gate.
//!
//! # Design
//! - `ApiClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values; a `Transport` does the round trip (host-does-IO).
//! - Every non-2xx response becomes an `ApiError` carrying the status, the
//!   backend message and any field errors. A 401 on an authenticated call
//!   invalidates the session.
//! - Page controllers are pure state machines returning `Effect`s; `Shell`
//!   is a blocking host that runs them.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod controller;
pub mod drivers;
pub mod error;
pub mod http;
pub mod query;
pub mod session;
pub mod shell;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use controller::{
    ApiCall, Controller, CreateController, CreateEvent, DetailController, DetailEvent, Effect, ListController,
    ListEvent, LoginController, LoginEvent, Reply,
};
pub use error::{ApiError, ErrorKind};
pub use http::{CacheMode, HttpMethod, HttpRequest, HttpResponse};
pub use query::{DriverFilters, DriverSort, ListParams, ListQuery, PageSize, SuccessMarker};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionContext, SessionStore};
pub use shell::Shell;
pub use transport::{Transport, UreqTransport};
pub use types::{Driver, DriverPayload, LoginRequest, LoginResponse, Page, VehicleType};
