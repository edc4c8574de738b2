//! The editable driver form shared by the create and detail pages.

use thiserror::Error;

use crate::query::toggle;
use crate::types::{Driver, DriverPayload, VehicleType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Select at least one vehicle type.")]
    NoVehicleType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverField {
    Name,
    Email,
    Phone,
    City,
    State,
}

/// Raw form values, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub state: String,
    pub vehicle_types: Vec<VehicleType>,
}

impl DriverForm {
    pub fn from_driver(driver: &Driver) -> Self {
        Self {
            name: driver.name.clone(),
            email: driver.email.clone(),
            phone: driver.phone.clone().unwrap_or_default(),
            city: driver.city.clone(),
            state: driver.state.clone(),
            vehicle_types: driver.vehicle_types.clone(),
        }
    }

    pub fn set_field(&mut self, field: DriverField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DriverField::Name => self.name = value,
            DriverField::Email => self.email = value,
            DriverField::Phone => self.phone = value,
            DriverField::City => self.city = value,
            DriverField::State => self.state = value,
        }
    }

    pub fn toggle_vehicle_type(&mut self, vehicle_type: VehicleType) {
        toggle(&mut self.vehicle_types, vehicle_type);
    }

    /// The payload to submit: strings trimmed, blank phone sent as `null`.
    ///
    /// Rejected locally when no vehicle type is selected.
    pub fn to_payload(&self) -> Result<DriverPayload, FormError> {
        if self.vehicle_types.is_empty() {
            return Err(FormError::NoVehicleType);
        }
        let phone = self.phone.trim();
        Ok(DriverPayload {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            vehicle_types: self.vehicle_types.clone(),
        })
    }
}
