//! Login page.

use tracing::warn;

use super::{ApiCall, Controller, Effect, Generation, Reply};
use crate::error::ApiError;
use crate::query::LIST_PATH;
use crate::session::Session;
use crate::types::LoginRequest;

const MISSING_CREDENTIALS: &str = "Enter email and password to continue.";
const AUTH_FALLBACK: &str = "Could not authenticate. Check your credentials.";
const UNREACHABLE: &str = "Could not connect to the server.";

#[derive(Debug, Clone, PartialEq)]
pub enum LoginEvent {
    Submit {
        email: String,
        password: String,
    },
    Completed {
        generation: u64,
        reply: Result<Reply, ApiError>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginController {
    email: String,
    error: Option<String>,
    submitting: bool,
    generation: Generation,
}

impl LoginController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn submit(&mut self, email: String, password: String) -> Vec<Effect> {
        let email = email.trim().to_string();
        if email.is_empty() || password.is_empty() {
            self.error = Some(MISSING_CREDENTIALS.to_string());
            return Vec::new();
        }
        self.error = None;
        self.submitting = true;
        self.email = email.clone();
        vec![Effect::Call {
            generation: self.generation.advance(),
            call: ApiCall::Login(LoginRequest { email, password }),
        }]
    }

    fn complete(&mut self, generation: u64, reply: Result<Reply, ApiError>) -> Vec<Effect> {
        if !self.generation.is_current(generation) {
            return Vec::new();
        }
        self.submitting = false;
        match reply {
            Ok(Reply::LoggedIn(response)) => vec![
                Effect::StartSession(Session {
                    token: response.token,
                    expires_at: response.expires_at,
                    email: self.email.clone(),
                }),
                Effect::Navigate(LIST_PATH.to_string()),
            ],
            Ok(other) => {
                warn!(?other, "unexpected reply for login");
                Vec::new()
            }
            Err(ApiError::Transport(_)) => {
                self.error = Some(UNREACHABLE.to_string());
                Vec::new()
            }
            Err(err) => {
                self.error = Some(err.backend_message().unwrap_or(AUTH_FALLBACK).to_string());
                Vec::new()
            }
        }
    }
}

impl Controller for LoginController {
    type Event = LoginEvent;

    fn update(&mut self, event: LoginEvent) -> Vec<Effect> {
        match event {
            LoginEvent::Submit { email, password } => self.submit(email, password),
            LoginEvent::Completed { generation, reply } => self.complete(generation, reply),
        }
    }

    fn completed(generation: u64, reply: Result<Reply, ApiError>) -> LoginEvent {
        LoginEvent::Completed { generation, reply }
    }
}
