//! Domain DTOs for the driver API.
//!
//! # Design
//! These types mirror the backend's JSON schema (camelCase) but are defined
//! independently from the mock-server crate. Integration tests catch any
//! schema drift between the two.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vehicle categories a driver can operate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VehicleType {
    Van,
    Toco,
    Bau,
    Sider,
    Truck,
    Bitruck,
}

impl VehicleType {
    pub const ALL: [VehicleType; 6] = [
        VehicleType::Van,
        VehicleType::Toco,
        VehicleType::Bau,
        VehicleType::Sider,
        VehicleType::Truck,
        VehicleType::Bitruck,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::Van => "VAN",
            VehicleType::Toco => "TOCO",
            VehicleType::Bau => "BAU",
            VehicleType::Sider => "SIDER",
            VehicleType::Truck => "TRUCK",
            VehicleType::Bitruck => "BITRUCK",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the known vehicle types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVehicleType(pub String);

impl fmt::Display for UnknownVehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown vehicle type: {}", self.0)
    }
}

impl std::error::Error for UnknownVehicleType {}

impl FromStr for VehicleType {
    type Err = UnknownVehicleType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownVehicleType(s.to_string()))
    }
}

/// A driver record as returned by the backend.
///
/// The client only ever holds a transient copy; the backend owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub vehicle_types: Vec<VehicleType>,
    pub active: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// The writable subset of `Driver`, sent on create and update.
///
/// `phone` is serialized as an explicit `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverPayload {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: String,
    pub state: String,
    pub vehicle_types: Vec<VehicleType>,
}

/// The backend's paging envelope.
///
/// `number` is the page the server actually returned, which may differ from
/// the one requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
}
