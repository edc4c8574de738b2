//! In-memory stand-in for the drivers backend.
//!
//! Serves the same routes and envelopes as the real service so the client
//! core can be exercised end-to-end: bearer login, paged and filtered
//! search, CRUD with soft delete, and the JSON error envelope.

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{OriginalUri, Path, RawQuery, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@fretemais.com";
pub const ADMIN_PASSWORD: &str = "fretemais@2026";

const VEHICLE_TYPES: [&str; 6] = ["VAN", "TOCO", "BAU", "SIDER", "TRUCK", "BITRUCK"];
const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: String,
    pub state: String,
    pub vehicle_types: Vec<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Body of `POST /drivers` and `PUT /drivers/{id}`. Missing fields are
/// reported by validation, not by the JSON extractor.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: String,
    pub state: String,
    pub vehicle_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutput {
    pub token: String,
    pub expires_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub content: Vec<Driver>,
    pub total_elements: usize,
    pub total_pages: usize,
    pub size: usize,
    pub number: usize,
}

#[derive(Clone, Default)]
pub struct AppState {
    pub drivers: Arc<RwLock<HashMap<Uuid, Driver>>>,
    pub tokens: Arc<RwLock<HashSet<String>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State preloaded with a few drivers, for running the binary by hand.
    pub fn seeded() -> Self {
        let seed = [
            ("João Silva", "joao@fretemais.com", "São Paulo", "SP", &["VAN", "TRUCK"][..]),
            ("Maria Oliveira", "maria@fretemais.com", "Campinas", "SP", &["BAU"][..]),
            ("Carlos Souza", "carlos@fretemais.com", "Rio de Janeiro", "RJ", &["SIDER", "BITRUCK"][..]),
        ];
        let mut drivers = HashMap::new();
        for (name, email, city, uf, types) in seed {
            let now = Utc::now().naive_utc();
            let driver = Driver {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
                phone: None,
                city: city.to_string(),
                state: uf.to_string(),
                vehicle_types: types.iter().map(|t| t.to_string()).collect(),
                active: true,
                created_at: now,
                updated_at: now,
            };
            drivers.insert(driver.id, driver);
        }
        Self {
            drivers: Arc::new(RwLock::new(drivers)),
            tokens: Arc::default(),
        }
    }
}

/// A non-2xx answer rendered as the backend's error envelope.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: String,
    path: String,
    fields: Option<Map<String, Value>>,
}

impl Failure {
    fn new(status: StatusCode, message: &str, path: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            path: path.to_string(),
            fields: None,
        }
    }

    fn not_found(path: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "Driver not found", path)
    }

    fn invalid(fields: Map<String, Value>, path: &str) -> Self {
        Self {
            fields: Some(fields),
            ..Self::new(StatusCode::BAD_REQUEST, "Invalid data", path)
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "status": self.status.as_u16(),
            "error": self.status.canonical_reason().unwrap_or_default(),
            "message": self.message,
            "path": self.path,
            "fields": self.fields,
        });
        (self.status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    app_with_state(AppState::new())
}

pub fn app_with_state(state: AppState) -> Router {
    let drivers = Router::new()
        .route("/drivers", get(list_drivers).post(create_driver))
        .route("/drivers/{id}", get(get_driver).put(update_driver).delete(delete_driver))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));
    Router::new()
        .route("/auth/login", post(login))
        .merge(drivers)
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, AppState::new()).await
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app_with_state(state)).await
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);
    let known = match token {
        Some(token) => state.tokens.read().await.contains(&token),
        None => false,
    };
    if !known {
        debug!(path = request.uri().path(), "rejecting request without a valid token");
        return Failure::new(StatusCode::UNAUTHORIZED, "Unauthorized access", request.uri().path()).into_response();
    }
    next.run(request).await
}

async fn login(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(input): Json<LoginInput>,
) -> Result<Json<LoginOutput>, Failure> {
    if input.email.trim() != ADMIN_EMAIL || input.password != ADMIN_PASSWORD {
        return Err(Failure::new(StatusCode::UNAUTHORIZED, "Invalid credentials", uri.path()));
    }
    let token = Uuid::new_v4().simple().to_string();
    state.tokens.write().await.insert(token.clone());
    let expires_at = (Utc::now() + chrono::Duration::hours(2)).to_rfc3339();
    info!(email = ADMIN_EMAIL, "issued token");
    Ok(Json(LoginOutput { token, expires_at }))
}

/// Parsed `GET /drivers` query. Unknown or malformed values fall back to
/// the defaults.
#[derive(Debug, PartialEq)]
pub struct DriverQuery {
    pub text: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub vehicle_types: Vec<String>,
    pub page: usize,
    pub size: usize,
    pub sort_by: String,
    pub sort_dir: String,
}

impl DriverQuery {
    pub fn parse(raw: &str) -> Self {
        let mut query = Self {
            text: None,
            city: None,
            state: None,
            vehicle_types: Vec::new(),
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_by: "CREATED_AT".to_string(),
            sort_dir: "DESC".to_string(),
        };
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            let value = value.trim().to_string();
            let present = (!value.is_empty()).then(|| value.clone());
            match key.as_ref() {
                // `name` is the older spelling of `text`.
                "text" | "name" => query.text = query.text.take().or(present),
                "city" => query.city = present,
                "state" => query.state = present,
                "vehicleTypes" => {
                    if VEHICLE_TYPES.contains(&value.as_str()) {
                        query.vehicle_types.push(value);
                    }
                }
                "page" => query.page = value.parse().unwrap_or(0),
                "size" => query.size = value.parse().ok().filter(|s| *s > 0).unwrap_or(DEFAULT_PAGE_SIZE),
                "sortBy" => query.sort_by = value,
                "sortDir" => query.sort_dir = value,
                _ => {}
            }
        }
        query
    }

    fn matches(&self, driver: &Driver) -> bool {
        if !driver.active {
            return false;
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let hit = [Some(&driver.name), Some(&driver.email), driver.phone.as_ref()]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if driver.city.to_lowercase() != city.to_lowercase() {
                return false;
            }
        }
        if let Some(state) = &self.state {
            if driver.state != state.to_uppercase() {
                return false;
            }
        }
        self.vehicle_types.is_empty() || driver.vehicle_types.iter().any(|t| self.vehicle_types.contains(t))
    }

    fn compare(&self, a: &Driver, b: &Driver) -> Ordering {
        let ordering = match self.sort_by.as_str() {
            "NAME" => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            "UPDATED_AT" => a.updated_at.cmp(&b.updated_at),
            _ => a.created_at.cmp(&b.created_at),
        }
        .then_with(|| a.id.cmp(&b.id));
        if self.sort_dir == "ASC" {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

async fn list_drivers(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Json<Page> {
    let query = DriverQuery::parse(raw.as_deref().unwrap_or_default());
    let drivers = state.drivers.read().await;
    let mut matching: Vec<Driver> = drivers.values().filter(|d| query.matches(d)).cloned().collect();
    matching.sort_by(|a, b| query.compare(a, b));

    let total_elements = matching.len();
    let total_pages = total_elements.div_ceil(query.size);
    // Past-the-end requests are served the last page.
    let number = query.page.min(total_pages.saturating_sub(1));
    let content = matching.into_iter().skip(number * query.size).take(query.size).collect();
    debug!(?query, total_elements, number, "listing drivers");

    Json(Page {
        content,
        total_elements,
        total_pages,
        size: query.size,
        number,
    })
}

fn validate(input: &DriverInput) -> Map<String, Value> {
    let mut fields = Map::new();
    if input.name.trim().is_empty() {
        fields.insert("name".into(), "Name is required".into());
    }
    let email = input.email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if !well_formed {
        fields.insert("email".into(), "Invalid email".into());
    }
    if input.city.trim().is_empty() {
        fields.insert("city".into(), "City is required".into());
    }
    let state = input.state.trim();
    if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
        fields.insert("state".into(), "State must have 2 letters".into());
    }
    if input.vehicle_types.is_empty() {
        fields.insert("vehicleTypes".into(), "Select at least one vehicle type".into());
    } else if input.vehicle_types.iter().any(|t| !VEHICLE_TYPES.contains(&t.as_str())) {
        fields.insert("vehicleTypes".into(), "Unknown vehicle type".into());
    }
    fields
}

fn apply(driver: &mut Driver, input: DriverInput) {
    driver.name = input.name.trim().to_string();
    driver.email = input.email.trim().to_string();
    driver.phone = input.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
    driver.city = input.city.trim().to_string();
    driver.state = input.state.trim().to_uppercase();
    driver.vehicle_types = input.vehicle_types;
}

async fn create_driver(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(input): Json<DriverInput>,
) -> Result<(StatusCode, Json<Driver>), Failure> {
    let fields = validate(&input);
    if !fields.is_empty() {
        return Err(Failure::invalid(fields, uri.path()));
    }
    let now = Utc::now().naive_utc();
    let mut driver = Driver {
        id: Uuid::new_v4(),
        name: String::new(),
        email: String::new(),
        phone: None,
        city: String::new(),
        state: String::new(),
        vehicle_types: Vec::new(),
        active: true,
        created_at: now,
        updated_at: now,
    };
    apply(&mut driver, input);
    state.drivers.write().await.insert(driver.id, driver.clone());
    debug!(id = %driver.id, "created driver");
    Ok((StatusCode::CREATED, Json(driver)))
}

fn parse_id(raw: &str, path: &str) -> Result<Uuid, Failure> {
    raw.parse().map_err(|_| Failure::not_found(path))
}

async fn get_driver(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<Json<Driver>, Failure> {
    let id = parse_id(&id, uri.path())?;
    let drivers = state.drivers.read().await;
    drivers
        .get(&id)
        .filter(|d| d.active)
        .cloned()
        .map(Json)
        .ok_or_else(|| Failure::not_found(uri.path()))
}

async fn update_driver(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    Json(input): Json<DriverInput>,
) -> Result<Json<Driver>, Failure> {
    let id = parse_id(&id, uri.path())?;
    let mut drivers = state.drivers.write().await;
    let driver = drivers
        .get_mut(&id)
        .filter(|d| d.active)
        .ok_or_else(|| Failure::not_found(uri.path()))?;
    let fields = validate(&input);
    if !fields.is_empty() {
        return Err(Failure::invalid(fields, uri.path()));
    }
    apply(driver, input);
    driver.updated_at = Utc::now().naive_utc();
    Ok(Json(driver.clone()))
}

async fn delete_driver(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> Result<StatusCode, Failure> {
    let id = parse_id(&id, uri.path())?;
    let mut drivers = state.drivers.write().await;
    let driver = drivers
        .get_mut(&id)
        .filter(|d| d.active)
        .ok_or_else(|| Failure::not_found(uri.path()))?;
    driver.active = false;
    driver.updated_at = Utc::now().naive_utc();
    debug!(%id, "soft-deleted driver");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(name: &str, city: &str, state: &str, types: &[&str]) -> Driver {
        let now = Utc::now().naive_utc();
        Driver {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            phone: Some("+55 11 90000-0000".to_string()),
            city: city.to_string(),
            state: state.to_string(),
            vehicle_types: types.iter().map(|t| t.to_string()).collect(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn query_defaults() {
        let query = DriverQuery::parse("");
        assert_eq!(query.page, 0);
        assert_eq!(query.size, 5);
        assert_eq!(query.sort_by, "CREATED_AT");
        assert_eq!(query.sort_dir, "DESC");
        assert!(query.vehicle_types.is_empty());
    }

    #[test]
    fn query_keeps_repeated_vehicle_types_and_drops_unknown_ones() {
        let query = DriverQuery::parse("vehicleTypes=VAN&vehicleTypes=BOAT&vehicleTypes=BAU&size=0");
        assert_eq!(query.vehicle_types, vec!["VAN", "BAU"]);
        assert_eq!(query.size, 5);
    }

    #[test]
    fn text_matches_name_email_or_phone() {
        let marina = driver("Marina Soares", "Campinas", "SP", &["VAN"]);
        assert!(DriverQuery::parse("text=marina").matches(&marina));
        assert!(DriverQuery::parse("text=example.com").matches(&marina));
        assert!(DriverQuery::parse("text=90000").matches(&marina));
        assert!(!DriverQuery::parse("text=carlos").matches(&marina));
    }

    #[test]
    fn city_is_case_insensitive_and_state_is_upper_cased() {
        let marina = driver("Marina Soares", "Campinas", "SP", &["VAN"]);
        assert!(DriverQuery::parse("city=campinas&state=sp").matches(&marina));
        assert!(!DriverQuery::parse("city=Santos").matches(&marina));
    }

    #[test]
    fn vehicle_types_match_any_of() {
        let marina = driver("Marina Soares", "Campinas", "SP", &["VAN", "TRUCK"]);
        assert!(DriverQuery::parse("vehicleTypes=BAU&vehicleTypes=TRUCK").matches(&marina));
        assert!(!DriverQuery::parse("vehicleTypes=BAU").matches(&marina));
    }

    #[test]
    fn inactive_drivers_never_match() {
        let mut marina = driver("Marina Soares", "Campinas", "SP", &["VAN"]);
        marina.active = false;
        assert!(!DriverQuery::parse("").matches(&marina));
    }

    #[test]
    fn validation_reports_fields_in_form_order() {
        let fields = validate(&DriverInput {
            state: "SPX".to_string(),
            ..DriverInput::default()
        });
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "email", "city", "state", "vehicleTypes"]);
    }

    #[test]
    fn driver_serializes_camel_case() {
        let json = serde_json::to_value(driver("Marina Soares", "Campinas", "SP", &["VAN"])).unwrap();
        assert_eq!(json["vehicleTypes"], serde_json::json!(["VAN"]));
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["active"], true);
    }
}
