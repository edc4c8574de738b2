//! Single-driver page: load, edit, save and delete.
//!
//! A 404 on load is terminal (`LoadStatus::NotFound`, offer the way back to
//! the list); any other load failure is retryable with `Load`. A 401 at any
//! point drops local state and redirects. Delete needs an explicit
//! `ConfirmDelete` after `RequestDelete`.

use tracing::{debug, warn};
use uuid::Uuid;

use super::create::SAVE_FALLBACK;
use super::{ApiCall, Controller, DriverField, DriverForm, Effect, Generation, Reply};
use crate::error::{ApiError, ErrorKind};
use crate::query::{ListQuery, SuccessMarker, LIST_PATH};
use crate::types::VehicleType;

const LOAD_FALLBACK: &str = "Failed to load data.";
const DELETE_FALLBACK: &str = "Failed to delete driver.";
const NOT_FOUND_MESSAGE: &str = "Driver not found.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready,
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailEvent {
    /// Mount, or the "try again" action after a failed load.
    Load,
    EditField(DriverField, String),
    ToggleVehicleType(VehicleType),
    Submit,
    Cancel,
    RequestDelete,
    ConfirmDelete,
    CancelDelete,
    Completed {
        generation: u64,
        reply: Result<Reply, ApiError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Load,
    Save,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailController {
    id: Uuid,
    status: LoadStatus,
    form: DriverForm,
    active: bool,
    saving: bool,
    deleting: bool,
    confirming_delete: bool,
    form_error: Option<String>,
    pending: Option<Pending>,
    generation: Generation,
}

impl DetailController {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            status: LoadStatus::Loading,
            form: DriverForm::default(),
            active: false,
            saving: false,
            deleting: false,
            confirming_delete: false,
            form_error: None,
            pending: None,
            generation: Generation::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn form(&self) -> &DriverForm {
        &self.form
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    pub fn is_confirming_delete(&self) -> bool {
        self.confirming_delete
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    /// Message for the load-failure and not-found states.
    pub fn load_error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::NotFound => Some(NOT_FOUND_MESSAGE),
            LoadStatus::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    fn call(&mut self, pending: Pending, call: ApiCall) -> Vec<Effect> {
        self.pending = Some(pending);
        vec![Effect::Call {
            generation: self.generation.advance(),
            call,
        }]
    }

    fn load(&mut self) -> Vec<Effect> {
        self.status = LoadStatus::Loading;
        self.form_error = None;
        self.call(Pending::Load, ApiCall::GetDriver(self.id))
    }

    fn submit(&mut self) -> Vec<Effect> {
        self.form_error = None;
        if self.status != LoadStatus::Ready {
            return Vec::new();
        }
        match self.form.to_payload() {
            Ok(payload) => {
                self.saving = true;
                self.call(Pending::Save, ApiCall::UpdateDriver(self.id, payload))
            }
            Err(e) => {
                self.form_error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    fn confirm_delete(&mut self) -> Vec<Effect> {
        if !self.confirming_delete || self.status != LoadStatus::Ready {
            return Vec::new();
        }
        self.confirming_delete = false;
        self.deleting = true;
        self.form_error = None;
        self.call(Pending::Delete, ApiCall::DeleteDriver(self.id))
    }

    /// Drop everything local and head to the login page.
    fn teardown(&mut self) -> Vec<Effect> {
        let generation = self.generation;
        *self = Self::new(self.id);
        self.generation = generation;
        vec![Effect::RedirectToLogin]
    }

    fn complete(&mut self, generation: u64, reply: Result<Reply, ApiError>) -> Vec<Effect> {
        if !self.generation.is_current(generation) {
            debug!(generation, "discarding stale detail response");
            return Vec::new();
        }
        let Some(pending) = self.pending.take() else {
            return Vec::new();
        };
        self.saving = false;
        self.deleting = false;

        if let Err(err) = &reply {
            if err.is_unauthorized() {
                return self.teardown();
            }
        }

        match (pending, reply) {
            (Pending::Load, Ok(Reply::Driver(driver))) => {
                self.form = DriverForm::from_driver(&driver);
                self.active = driver.active;
                self.status = LoadStatus::Ready;
                Vec::new()
            }
            (Pending::Load, Err(err)) => {
                self.status = match err.kind() {
                    ErrorKind::NotFound => LoadStatus::NotFound,
                    _ => LoadStatus::Failed(err.display_message(LOAD_FALLBACK)),
                };
                Vec::new()
            }
            (Pending::Save, Ok(Reply::Driver(_))) => vec![Effect::Navigate(
                ListQuery::default().with_success(SuccessMarker::Updated).list_location(),
            )],
            (Pending::Save, Err(err)) => {
                self.form_error = Some(err.display_message(SAVE_FALLBACK));
                Vec::new()
            }
            (Pending::Delete, Ok(Reply::Deleted)) => vec![Effect::Navigate(
                ListQuery::default().with_success(SuccessMarker::Deleted).list_location(),
            )],
            (Pending::Delete, Err(err)) => {
                self.form_error = Some(err.display_message(DELETE_FALLBACK));
                Vec::new()
            }
            (pending, Ok(other)) => {
                warn!(?pending, ?other, "unexpected reply for detail call");
                Vec::new()
            }
        }
    }
}

impl Controller for DetailController {
    type Event = DetailEvent;

    fn update(&mut self, event: DetailEvent) -> Vec<Effect> {
        match event {
            DetailEvent::Load => self.load(),
            DetailEvent::EditField(field, value) => {
                self.form.set_field(field, value);
                Vec::new()
            }
            DetailEvent::ToggleVehicleType(vehicle_type) => {
                self.form.toggle_vehicle_type(vehicle_type);
                Vec::new()
            }
            DetailEvent::Submit => self.submit(),
            DetailEvent::Cancel => vec![Effect::Navigate(LIST_PATH.to_string())],
            DetailEvent::RequestDelete => {
                self.confirming_delete = true;
                Vec::new()
            }
            DetailEvent::CancelDelete => {
                self.confirming_delete = false;
                Vec::new()
            }
            DetailEvent::ConfirmDelete => self.confirm_delete(),
            DetailEvent::Completed { generation, reply } => self.complete(generation, reply),
        }
    }

    fn completed(generation: u64, reply: Result<Reply, ApiError>) -> DetailEvent {
        DetailEvent::Completed { generation, reply }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::decode_error;
    use crate::types::Driver;

    fn driver(id: Uuid) -> Driver {
        Driver {
            id,
            name: "Marina Soares".to_string(),
            email: "marina@example.com".to_string(),
            phone: Some("+55 11 98888-0000".to_string()),
            city: "Campinas".to_string(),
            state: "SP".to_string(),
            vehicle_types: vec![VehicleType::Van, VehicleType::Truck],
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn generation_of(effects: &[Effect]) -> u64 {
        match effects {
            [Effect::Call { generation, .. }] => *generation,
            other => panic!("expected a single call, got {other:?}"),
        }
    }

    fn ready() -> DetailController {
        let id = Uuid::new_v4();
        let mut controller = DetailController::new(id);
        let generation = generation_of(&controller.update(DetailEvent::Load));
        controller.update(DetailEvent::Completed {
            generation,
            reply: Ok(Reply::Driver(driver(id))),
        });
        controller
    }

    #[test]
    fn load_fills_the_form() {
        let controller = ready();
        assert_eq!(controller.status(), &LoadStatus::Ready);
        assert_eq!(controller.form().name, "Marina Soares");
        assert_eq!(controller.form().phone, "+55 11 98888-0000");
        assert!(controller.is_active());
    }

    #[test]
    fn not_found_is_terminal_and_distinct() {
        let mut controller = DetailController::new(Uuid::nil());
        let generation = generation_of(&controller.update(DetailEvent::Load));
        controller.update(DetailEvent::Completed {
            generation,
            reply: Err(decode_error(404, r#"{"message":"Driver not found"}"#)),
        });
        assert_eq!(controller.status(), &LoadStatus::NotFound);
        assert_eq!(controller.load_error(), Some("Driver not found."));
    }

    #[test]
    fn other_load_failures_can_be_retried() {
        let mut controller = DetailController::new(Uuid::nil());
        let generation = generation_of(&controller.update(DetailEvent::Load));
        controller.update(DetailEvent::Completed {
            generation,
            reply: Err(decode_error(503, "")),
        });
        assert_eq!(
            controller.status(),
            &LoadStatus::Failed("Request failed with status 503".to_string())
        );

        let effects = controller.update(DetailEvent::Load);
        assert!(matches!(
            effects.as_slice(),
            [Effect::Call {
                call: ApiCall::GetDriver(_),
                ..
            }]
        ));
        assert_eq!(controller.status(), &LoadStatus::Loading);
    }

    #[test]
    fn save_success_navigates_with_updated_marker() {
        let mut controller = ready();
        controller.update(DetailEvent::EditField(DriverField::City, " Santos ".to_string()));
        let effects = controller.update(DetailEvent::Submit);
        let generation = match effects.as_slice() {
            [Effect::Call {
                generation,
                call: ApiCall::UpdateDriver(_, payload),
            }] => {
                assert_eq!(payload.city, "Santos");
                *generation
            }
            other => panic!("unexpected effects: {other:?}"),
        };
        assert!(controller.is_saving());
        let id = controller.id();
        let effects = controller.update(DetailEvent::Completed {
            generation,
            reply: Ok(Reply::Driver(driver(id))),
        });
        assert_eq!(effects, vec![Effect::Navigate("/drivers?success=updated".to_string())]);
        assert!(!controller.is_saving());
    }

    #[test]
    fn save_guard_rejects_empty_vehicle_types() {
        let mut controller = ready();
        controller.update(DetailEvent::ToggleVehicleType(VehicleType::Van));
        controller.update(DetailEvent::ToggleVehicleType(VehicleType::Truck));
        let effects = controller.update(DetailEvent::Submit);
        assert!(effects.is_empty());
        assert_eq!(controller.form_error(), Some("Select at least one vehicle type."));
    }

    #[test]
    fn save_validation_errors_are_flattened() {
        let mut controller = ready();
        let generation = generation_of(&controller.update(DetailEvent::Submit));
        controller.update(DetailEvent::Completed {
            generation,
            reply: Err(decode_error(
                400,
                r#"{"message":"Invalid data","fields":{"name":"must not be blank","state":"size must be 2"}}"#,
            )),
        });
        assert_eq!(controller.form_error(), Some("must not be blank size must be 2"));
        assert_eq!(controller.status(), &LoadStatus::Ready);
    }

    #[test]
    fn delete_needs_a_loaded_driver() {
        let mut controller = DetailController::new(Uuid::nil());
        let generation = generation_of(&controller.update(DetailEvent::Load));
        controller.update(DetailEvent::RequestDelete);
        assert!(controller.update(DetailEvent::ConfirmDelete).is_empty());

        controller.update(DetailEvent::Completed {
            generation,
            reply: Err(decode_error(404, "")),
        });
        controller.update(DetailEvent::RequestDelete);
        assert!(controller.update(DetailEvent::ConfirmDelete).is_empty());
        assert!(!controller.is_deleting());
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut controller = ready();
        assert!(controller.update(DetailEvent::ConfirmDelete).is_empty());

        assert!(controller.update(DetailEvent::RequestDelete).is_empty());
        assert!(controller.is_confirming_delete());
        controller.update(DetailEvent::CancelDelete);
        assert!(controller.update(DetailEvent::ConfirmDelete).is_empty());

        controller.update(DetailEvent::RequestDelete);
        let effects = controller.update(DetailEvent::ConfirmDelete);
        let generation = match effects.as_slice() {
            [Effect::Call {
                generation,
                call: ApiCall::DeleteDriver(id),
            }] => {
                assert_eq!(*id, controller.id());
                *generation
            }
            other => panic!("unexpected effects: {other:?}"),
        };
        let effects = controller.update(DetailEvent::Completed {
            generation,
            reply: Ok(Reply::Deleted),
        });
        assert_eq!(effects, vec![Effect::Navigate("/drivers?success=deleted".to_string())]);
    }

    #[test]
    fn delete_failure_stays_on_the_page() {
        let mut controller = ready();
        controller.update(DetailEvent::RequestDelete);
        let generation = generation_of(&controller.update(DetailEvent::ConfirmDelete));
        let effects = controller.update(DetailEvent::Completed {
            generation,
            reply: Err(decode_error(409, r#"{"message":"Driver is assigned to a route"}"#)),
        });
        assert!(effects.is_empty());
        assert_eq!(controller.form_error(), Some("Driver is assigned to a route"));
        assert!(!controller.is_deleting());
    }

    #[test]
    fn unauthorized_anywhere_resets_and_redirects() {
        let mut controller = ready();
        controller.update(DetailEvent::EditField(DriverField::Name, "Edited".to_string()));
        let generation = generation_of(&controller.update(DetailEvent::Submit));
        let effects = controller.update(DetailEvent::Completed {
            generation,
            reply: Err(decode_error(401, "")),
        });
        assert_eq!(effects, vec![Effect::RedirectToLogin]);
        assert_eq!(controller.form(), &DriverForm::default());
        assert_eq!(controller.status(), &LoadStatus::Loading);
        assert_eq!(controller.form_error(), None);
    }

    #[test]
    fn superseded_load_is_ignored() {
        let id = Uuid::new_v4();
        let mut controller = DetailController::new(id);
        let first = generation_of(&controller.update(DetailEvent::Load));
        let second = generation_of(&controller.update(DetailEvent::Load));
        controller.update(DetailEvent::Completed {
            generation: first,
            reply: Err(decode_error(500, "")),
        });
        assert_eq!(controller.status(), &LoadStatus::Loading);
        controller.update(DetailEvent::Completed {
            generation: second,
            reply: Ok(Reply::Driver(driver(id))),
        });
        assert_eq!(controller.status(), &LoadStatus::Ready);
    }
}
