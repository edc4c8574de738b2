//! New-driver page.

use tracing::warn;

use super::{ApiCall, Controller, DriverField, DriverForm, Effect, Generation, Reply};
use crate::error::ApiError;
use crate::query::{ListQuery, SuccessMarker, LIST_PATH};
use crate::types::VehicleType;

pub(crate) const SAVE_FALLBACK: &str = "Failed to save driver.";

#[derive(Debug, Clone, PartialEq)]
pub enum CreateEvent {
    EditField(DriverField, String),
    ToggleVehicleType(VehicleType),
    Submit,
    Cancel,
    Completed {
        generation: u64,
        reply: Result<Reply, ApiError>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateController {
    form: DriverForm,
    error: Option<String>,
    submitting: bool,
    generation: Generation,
}

impl CreateController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &DriverForm {
        &self.form
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn submit(&mut self) -> Vec<Effect> {
        self.error = None;
        let payload = match self.form.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                self.error = Some(e.to_string());
                return Vec::new();
            }
        };
        self.submitting = true;
        vec![Effect::Call {
            generation: self.generation.advance(),
            call: ApiCall::CreateDriver(payload),
        }]
    }

    fn complete(&mut self, generation: u64, reply: Result<Reply, ApiError>) -> Vec<Effect> {
        if !self.generation.is_current(generation) {
            return Vec::new();
        }
        self.submitting = false;
        match reply {
            Ok(Reply::Driver(_)) => vec![Effect::Navigate(
                ListQuery::default().with_success(SuccessMarker::Created).list_location(),
            )],
            Ok(other) => {
                warn!(?other, "unexpected reply for create");
                Vec::new()
            }
            Err(err) if err.is_unauthorized() => {
                self.form = DriverForm::default();
                vec![Effect::RedirectToLogin]
            }
            Err(err) => {
                self.error = Some(err.display_message(SAVE_FALLBACK));
                Vec::new()
            }
        }
    }
}

impl Controller for CreateController {
    type Event = CreateEvent;

    fn update(&mut self, event: CreateEvent) -> Vec<Effect> {
        match event {
            CreateEvent::EditField(field, value) => {
                self.form.set_field(field, value);
                Vec::new()
            }
            CreateEvent::ToggleVehicleType(vehicle_type) => {
                self.form.toggle_vehicle_type(vehicle_type);
                Vec::new()
            }
            CreateEvent::Submit => self.submit(),
            CreateEvent::Cancel => vec![Effect::Navigate(LIST_PATH.to_string())],
            CreateEvent::Completed { generation, reply } => self.complete(generation, reply),
        }
    }

    fn completed(generation: u64, reply: Result<Reply, ApiError>) -> CreateEvent {
        CreateEvent::Completed { generation, reply }
    }
}
