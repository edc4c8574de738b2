//! A blocking host that carries out controller effects.
//!
//! # Design
//! `Shell` owns the `ApiClient`, a `Transport` and the navigation state.
//! `dispatch` feeds one event to a controller and then drains the effects it
//! produces: calls are executed in order and answered with the controller's
//! `Completed` event, navigations update the location and are fed back
//! through `Controller::on_navigate`. A GUI host would do the same work
//! asynchronously; this one is what the CLI-style tests and integration
//! tests drive.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::controller::{ApiCall, Controller, Effect, Reply, LOGIN_ROUTE};
use crate::error::ApiError;
use crate::query::LIST_PATH;
use crate::transport::Transport;

#[derive(Debug)]
pub struct Shell<T: Transport> {
    client: ApiClient,
    transport: T,
    location: String,
    history: Vec<String>,
}

impl<T: Transport> Shell<T> {
    /// Start on the list page when a session is stored, otherwise on login.
    pub fn new(client: ApiClient, transport: T) -> Self {
        let location = if client.session().is_authenticated() {
            LIST_PATH
        } else {
            LOGIN_ROUTE
        };
        Self {
            client,
            transport,
            location: location.to_string(),
            history: Vec::new(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Locations left behind, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut ApiClient {
        &mut self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Feed `event` to `controller` and run every effect that follows.
    pub fn dispatch<C: Controller>(&mut self, controller: &mut C, event: C::Event) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            for effect in controller.update(event) {
                match effect {
                    Effect::Call { generation, call } => {
                        let reply = self.execute(call);
                        pending.push_back(C::completed(generation, reply));
                    }
                    Effect::Navigate(location) => {
                        self.push(location);
                        pending.extend(controller.on_navigate(&self.location));
                    }
                    Effect::RedirectToLogin => self.push(LOGIN_ROUTE.to_string()),
                    Effect::StartSession(session) => {
                        if let Err(e) = self.client.session_mut().begin(session) {
                            warn!(error = %e, "could not persist session");
                        }
                    }
                }
            }
        }
    }

    /// Navigate to `location` as if the user typed it, letting `controller`
    /// react when the location is one of its own.
    pub fn visit<C: Controller>(&mut self, controller: &mut C, location: &str) {
        self.push(location.to_string());
        if let Some(event) = controller.on_navigate(&self.location) {
            self.dispatch(controller, event);
        }
    }

    /// Step back one history entry. Returns `false` when there is none.
    pub fn back<C: Controller>(&mut self, controller: &mut C) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };
        debug!(from = %self.location, to = %previous, "navigating back");
        self.location = previous;
        if let Some(event) = controller.on_navigate(&self.location) {
            self.dispatch(controller, event);
        }
        true
    }

    /// Send the user to login unless a session is stored.
    pub fn require_auth(&mut self) -> bool {
        if self.client.session().is_authenticated() {
            return true;
        }
        if self.location != LOGIN_ROUTE {
            self.push(LOGIN_ROUTE.to_string());
        }
        false
    }

    pub fn logout(&mut self) {
        self.client.logout();
        self.push(LOGIN_ROUTE.to_string());
    }

    /// Run one backend call through the client.
    pub fn execute(&mut self, call: ApiCall) -> Result<Reply, ApiError> {
        let transport = &mut self.transport;
        match call {
            ApiCall::ListDrivers(params) => self.client.list_drivers(transport, &params).map(Reply::Page),
            ApiCall::GetDriver(id) => self.client.get_driver(transport, id).map(Reply::Driver),
            ApiCall::CreateDriver(payload) => self.client.create_driver(transport, &payload).map(Reply::Driver),
            ApiCall::UpdateDriver(id, payload) => {
                self.client.update_driver(transport, id, &payload).map(Reply::Driver)
            }
            ApiCall::DeleteDriver(id) => self.client.delete_driver(transport, id).map(|()| Reply::Deleted),
            ApiCall::Login(request) => {
                let request = self.client.build_login(&request)?;
                let response = transport.execute(request)?;
                self.client.parse_login(response).map(Reply::LoggedIn)
            }
        }
    }

    fn push(&mut self, location: String) {
        debug!(from = %self.location, to = %location, "navigating");
        let previous = std::mem::replace(&mut self.location, location);
        self.history.push(previous);
    }
}
