//! Typed driver operations on top of `ApiClient`.
//!
//! Same build/parse split as the rest of the client. List requests are
//! marked `NoStore`: filters and paging change on every user action, so a
//! cached page is never acceptable.

use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{CacheMode, HttpMethod, HttpRequest, HttpResponse};
use crate::query::{api_query, ListParams};
use crate::transport::Transport;
use crate::types::{Driver, DriverPayload, Page};

pub const DRIVERS_PATH: &str = "/drivers";

impl ApiClient {
    pub fn build_list_drivers(&self, params: &ListParams) -> HttpRequest {
        let path = format!("{DRIVERS_PATH}?{}", api_query(params));
        let mut request = self.build_request(HttpMethod::Get, &path, None);
        request.cache = CacheMode::NoStore;
        request
    }

    pub fn build_get_driver(&self, id: Uuid) -> HttpRequest {
        let mut request = self.build_request(HttpMethod::Get, &format!("{DRIVERS_PATH}/{id}"), None);
        request.cache = CacheMode::NoStore;
        request
    }

    pub fn build_create_driver(&self, payload: &DriverPayload) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Post, DRIVERS_PATH, payload)
    }

    pub fn build_update_driver(&self, id: Uuid, payload: &DriverPayload) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Put, &format!("{DRIVERS_PATH}/{id}"), payload)
    }

    pub fn build_delete_driver(&self, id: Uuid) -> HttpRequest {
        self.build_request(HttpMethod::Delete, &format!("{DRIVERS_PATH}/{id}"), None)
    }

    pub fn parse_list_drivers(&mut self, response: HttpResponse) -> Result<Page<Driver>, ApiError> {
        self.parse_response(response)
    }

    pub fn parse_get_driver(&mut self, response: HttpResponse) -> Result<Driver, ApiError> {
        self.parse_response(response)
    }

    pub fn parse_create_driver(&mut self, response: HttpResponse) -> Result<Driver, ApiError> {
        self.parse_response(response)
    }

    pub fn parse_update_driver(&mut self, response: HttpResponse) -> Result<Driver, ApiError> {
        self.parse_response(response)
    }

    pub fn parse_delete_driver(&mut self, response: HttpResponse) -> Result<(), ApiError> {
        self.parse_response(response)
    }

    pub fn list_drivers(
        &mut self,
        transport: &mut dyn Transport,
        params: &ListParams,
    ) -> Result<Page<Driver>, ApiError> {
        let request = self.build_list_drivers(params);
        self.request(transport, request)
    }

    pub fn get_driver(&mut self, transport: &mut dyn Transport, id: Uuid) -> Result<Driver, ApiError> {
        let request = self.build_get_driver(id);
        self.request(transport, request)
    }

    pub fn create_driver(
        &mut self,
        transport: &mut dyn Transport,
        payload: &DriverPayload,
    ) -> Result<Driver, ApiError> {
        let request = self.build_create_driver(payload)?;
        self.request(transport, request)
    }

    pub fn update_driver(
        &mut self,
        transport: &mut dyn Transport,
        id: Uuid,
        payload: &DriverPayload,
    ) -> Result<Driver, ApiError> {
        let request = self.build_update_driver(id, payload)?;
        self.request(transport, request)
    }

    pub fn delete_driver(&mut self, transport: &mut dyn Transport, id: Uuid) -> Result<(), ApiError> {
        let request = self.build_delete_driver(id);
        self.request(transport, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{DriverFilters, DriverSort, PageSize};
    use crate::session::{MemorySessionStore, Session, SessionContext};
    use crate::types::VehicleType;

    fn client() -> ApiClient {
        ApiClient::new(
            "http://localhost:8080",
            SessionContext::new(MemorySessionStore::with_session(Session {
                token: "abc".to_string(),
                expires_at: String::new(),
                email: "admin@fretemais.com".to_string(),
            })),
        )
    }

    fn payload() -> DriverPayload {
        DriverPayload {
            name: "Marina Soares".to_string(),
            email: "marina@example.com".to_string(),
            phone: None,
            city: "Campinas".to_string(),
            state: "SP".to_string(),
            vehicle_types: vec![VehicleType::Van],
        }
    }

    #[test]
    fn list_request_carries_filters_paging_and_sort() {
        let params = ListParams {
            filters: DriverFilters {
                text: "Marina".to_string(),
                city: String::new(),
                state: "SP".to_string(),
                vehicle_types: vec![VehicleType::Van],
            },
            ..ListParams::default()
        };
        let req = client().build_list_drivers(&params);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            concat!(
                "http://localhost:8080/drivers",
                "?text=Marina&state=SP&vehicleTypes=VAN&page=0&size=5&sortBy=CREATED_AT&sortDir=DESC"
            )
        );
        assert_eq!(req.cache, CacheMode::NoStore);
        assert_eq!(req.header("authorization"), Some("Bearer abc"));
    }

    #[test]
    fn list_request_repeats_vehicle_types() {
        let params = ListParams {
            filters: DriverFilters {
                vehicle_types: vec![VehicleType::Truck, VehicleType::Bau],
                ..DriverFilters::default()
            },
            page: 2,
            page_size: PageSize::Ten,
            sort: DriverSort::NameAsc,
        };
        let req = client().build_list_drivers(&params);
        assert_eq!(
            req.url,
            "http://localhost:8080/drivers?vehicleTypes=TRUCK&vehicleTypes=BAU&page=2&size=10&sortBy=NAME&sortDir=ASC"
        );
    }

    #[test]
    fn create_and_update_send_json_bodies() {
        let c = client();
        let req = c.build_create_driver(&payload()).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8080/drivers");
        assert_eq!(req.header("content-type"), Some("application/json"));

        let id = Uuid::nil();
        let req = c.build_update_driver(id, &payload()).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(
            req.url,
            "http://localhost:8080/drivers/00000000-0000-0000-0000-000000000000"
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "Marina Soares");
        assert!(body["phone"].is_null());
    }

    #[test]
    fn delete_expects_no_content() {
        let mut c = client();
        let req = c.build_delete_driver(Uuid::nil());
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
        assert!(c.parse_delete_driver(HttpResponse::new(204, "")).is_ok());
    }

    #[test]
    fn get_not_found_is_typed() {
        let err = client()
            .parse_get_driver(HttpResponse::new(404, r#"{"message":"Driver not found"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[test]
    fn list_response_parses_the_paging_envelope() {
        let body = r#"{"content":[],"totalElements":12,"totalPages":3,"size":5,"number":2}"#;
        let page = client().parse_list_drivers(HttpResponse::new(200, body)).unwrap();
        assert_eq!(page.total_elements, 12);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.number, 2);
    }
}
