//! Page controllers as pure state machines.
//!
//! # Design
//! A controller owns its page state, accepts events and returns `Effect`s.
//! It never performs I/O: backend calls, navigation and session writes are
//! described as values and carried out by the host (see `shell.rs`), which
//! answers each `Effect::Call` with a `Completed` event carrying the same
//! generation.
//!
//! Generations come from a per-controller counter. Only the latest issued
//! generation may change state; anything older is a superseded request and
//! is dropped, whatever order responses arrive in.

pub mod create;
pub mod detail;
pub mod form;
pub mod list;
pub mod login;

use uuid::Uuid;

use crate::error::ApiError;
use crate::query::ListParams;
use crate::session::Session;
use crate::types::{Driver, DriverPayload, LoginRequest, LoginResponse, Page};

pub use create::{CreateController, CreateEvent};
pub use detail::{DetailController, DetailEvent, LoadStatus};
pub use form::{DriverField, DriverForm, FormError};
pub use list::{reduce, ListController, ListEvent};
pub use login::{LoginController, LoginEvent};

/// Route of the login page.
pub const LOGIN_ROUTE: &str = "/login";

/// Something the host must do on a controller's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Push a navigation to `location`.
    Navigate(String),
    /// Leave for the login page; the session is already gone.
    RedirectToLogin,
    /// Run a backend call and answer with `Completed { generation, .. }`.
    Call { generation: u64, call: ApiCall },
    /// Persist a session issued by a successful login.
    StartSession(Session),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    ListDrivers(ListParams),
    GetDriver(Uuid),
    CreateDriver(DriverPayload),
    UpdateDriver(Uuid, DriverPayload),
    DeleteDriver(Uuid),
    Login(LoginRequest),
}

/// Successful outcome of an `ApiCall`.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Page(Page<Driver>),
    Driver(Driver),
    Deleted,
    LoggedIn(LoginResponse),
}

/// The seam between a controller and the host that runs its effects.
pub trait Controller {
    type Event;

    fn update(&mut self, event: Self::Event) -> Vec<Effect>;

    /// Wrap a finished call as this controller's completion event.
    fn completed(generation: u64, reply: Result<Reply, ApiError>) -> Self::Event;

    /// Event to feed back after the host navigated to `location`, if the
    /// location still belongs to this controller's page.
    fn on_navigate(&self, _location: &str) -> Option<Self::Event> {
        None
    }
}

/// Monotonic request-generation counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Generation(u64);

impl Generation {
    /// Issue a new generation, superseding every earlier one.
    pub fn advance(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.0 == generation
    }

    pub fn latest(&self) -> u64 {
        self.0
    }
}
