//! Filter, sort and paging state, and its two query-string renderings.
//!
//! # Design
//! The list page's applied state lives in the browser-style URL
//! (`/drivers?text=..&page=..`), so it round-trips through `ListQuery::parse`
//! and `ListQuery::to_query_string`. Parsing never fails: anything unknown or
//! malformed silently becomes the default. Rendering omits defaults, so the
//! empty query string is the default state.
//!
//! The backend query (`api_query`) is a different surface: it always carries
//! `page` and `size` and spells the sort as a `sortBy`/`sortDir` pair.

use crate::types::VehicleType;

/// Page size used when the URL carries none (or an unsupported one).
pub const DEFAULT_PAGE_SIZE: PageSize = PageSize::Five;

/// Path of the list page.
pub const LIST_PATH: &str = "/drivers";

/// Structured and free-text filters. All empty by default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverFilters {
    pub text: String,
    pub city: String,
    pub state: String,
    pub vehicle_types: Vec<VehicleType>,
}

/// The single-valued filter fields a user can type into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Text,
    City,
    State,
}

impl DriverFilters {
    pub fn set_field(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FilterField::Text => self.text = value,
            FilterField::City => self.city = value,
            FilterField::State => self.state = value,
        }
    }

    /// Add the type if absent, remove it if present. Other members keep
    /// their order.
    pub fn toggle_vehicle_type(&mut self, vehicle_type: VehicleType) {
        toggle(&mut self.vehicle_types, vehicle_type);
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
            && self.city.trim().is_empty()
            && self.state.trim().is_empty()
            && self.vehicle_types.is_empty()
    }

    /// Append the filter pairs shared by both query surfaces.
    fn append_to(&self, out: &mut form_urlencoded::Serializer<'_, String>) {
        for (name, value) in [("text", &self.text), ("city", &self.city), ("state", &self.state)] {
            let value = value.trim();
            if !value.is_empty() {
                out.append_pair(name, value);
            }
        }
        for vehicle_type in &self.vehicle_types {
            out.append_pair("vehicleTypes", vehicle_type.as_str());
        }
    }
}

pub(crate) fn toggle(set: &mut Vec<VehicleType>, vehicle_type: VehicleType) {
    if let Some(pos) = set.iter().position(|t| *t == vehicle_type) {
        set.remove(pos);
    } else {
        set.push(vehicle_type);
    }
}

/// Backend sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Name,
    CreatedAt,
    UpdatedAt,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Name => "NAME",
            SortBy::CreatedAt => "CREATED_AT",
            SortBy::UpdatedAt => "UPDATED_AT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// The sort options offered on the list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverSort {
    #[default]
    CreatedAtDesc,
    NameAsc,
    NameDesc,
    UpdatedAtDesc,
}

impl DriverSort {
    pub const ALL: [DriverSort; 4] = [
        DriverSort::CreatedAtDesc,
        DriverSort::NameAsc,
        DriverSort::NameDesc,
        DriverSort::UpdatedAtDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DriverSort::CreatedAtDesc => "CREATED_AT_DESC",
            DriverSort::NameAsc => "NAME_ASC",
            DriverSort::NameDesc => "NAME_DESC",
            DriverSort::UpdatedAtDesc => "UPDATED_AT_DESC",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DriverSort::CreatedAtDesc => "Most recent",
            DriverSort::NameAsc => "Name (A-Z)",
            DriverSort::NameDesc => "Name (Z-A)",
            DriverSort::UpdatedAtDesc => "Recently updated",
        }
    }

    pub fn sort_params(self) -> (SortBy, SortDir) {
        match self {
            DriverSort::CreatedAtDesc => (SortBy::CreatedAt, SortDir::Desc),
            DriverSort::NameAsc => (SortBy::Name, SortDir::Asc),
            DriverSort::NameDesc => (SortBy::Name, SortDir::Desc),
            DriverSort::UpdatedAtDesc => (SortBy::UpdatedAt, SortDir::Desc),
        }
    }

    /// Parse a `sort` query value; anything unknown is the default sort.
    pub fn from_query(raw: &str) -> Self {
        DriverSort::ALL
            .into_iter()
            .find(|s| s.as_str() == raw)
            .unwrap_or_default()
    }
}

/// Map a raw sort value to the backend's `(sortBy, sortDir)` pair.
pub fn resolve_sort_params(raw: &str) -> (SortBy, SortDir) {
    DriverSort::from_query(raw).sort_params()
}

/// Supported page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    Five,
    Ten,
}

impl PageSize {
    pub const ALL: [PageSize; 2] = [PageSize::Five, PageSize::Ten];

    pub fn new(size: u32) -> Option<Self> {
        PageSize::ALL.into_iter().find(|s| s.get() == size)
    }

    pub fn get(self) -> u32 {
        match self {
            PageSize::Five => 5,
            PageSize::Ten => 10,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        DEFAULT_PAGE_SIZE
    }
}

/// Marker left in the list URL after a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessMarker {
    Created,
    Updated,
    Deleted,
}

impl SuccessMarker {
    pub fn as_str(self) -> &'static str {
        match self {
            SuccessMarker::Created => "created",
            SuccessMarker::Updated => "updated",
            SuccessMarker::Deleted => "deleted",
        }
    }

    pub fn from_query(raw: &str) -> Option<Self> {
        match raw {
            "created" => Some(SuccessMarker::Created),
            "updated" => Some(SuccessMarker::Updated),
            "deleted" => Some(SuccessMarker::Deleted),
            _ => None,
        }
    }

    /// Banner text.
    pub fn message(self) -> &'static str {
        match self {
            SuccessMarker::Created => "Driver created successfully.",
            SuccessMarker::Updated => "Driver updated successfully.",
            SuccessMarker::Deleted => "Driver deleted successfully.",
        }
    }
}

/// The applied list state: what the last/next fetch asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub filters: DriverFilters,
    pub page: u32,
    pub page_size: PageSize,
    pub sort: DriverSort,
}

/// Everything the list URL carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub params: ListParams,
    pub success: Option<SuccessMarker>,
}

impl ListQuery {
    pub fn new(params: ListParams) -> Self {
        Self {
            params,
            success: None,
        }
    }

    pub fn with_success(mut self, marker: SuccessMarker) -> Self {
        self.success = Some(marker);
        self
    }

    /// Parse a list-page query string (with or without a leading `?`).
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut filters = DriverFilters::default();
        let mut text = None;
        let mut city = None;
        let mut state = None;
        let mut page = None;
        let mut page_size = None;
        let mut sort = None;
        let mut success = None;

        // Single-valued keys keep their first occurrence.
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "text" if text.is_none() => text = Some(value.into_owned()),
                "city" if city.is_none() => city = Some(value.into_owned()),
                "state" if state.is_none() => state = Some(value.into_owned()),
                "vehicleTypes" => {
                    if let Ok(t) = value.parse::<VehicleType>() {
                        if !filters.vehicle_types.contains(&t) {
                            filters.vehicle_types.push(t);
                        }
                    }
                }
                "page" if page.is_none() => page = Some(value.parse::<u32>().unwrap_or(0)),
                "size" if page_size.is_none() => {
                    page_size = Some(
                        value
                            .parse::<u32>()
                            .ok()
                            .and_then(PageSize::new)
                            .unwrap_or_default(),
                    )
                }
                "sort" if sort.is_none() => sort = Some(DriverSort::from_query(&value)),
                "success" if success.is_none() => success = Some(SuccessMarker::from_query(&value)),
                _ => {}
            }
        }

        filters.text = text.unwrap_or_default();
        filters.city = city.unwrap_or_default();
        filters.state = state.unwrap_or_default();

        Self {
            params: ListParams {
                filters,
                page: page.unwrap_or(0),
                page_size: page_size.unwrap_or_default(),
                sort: sort.unwrap_or_default(),
            },
            success: success.flatten(),
        }
    }

    /// Render the canonical query string, omitting every default.
    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        let params = &self.params;
        params.filters.append_to(&mut out);
        if params.page > 0 {
            out.append_pair("page", &params.page.to_string());
        }
        if params.page_size != DEFAULT_PAGE_SIZE {
            out.append_pair("size", &params.page_size.get().to_string());
        }
        if params.sort != DriverSort::default() {
            out.append_pair("sort", params.sort.as_str());
        }
        if let Some(marker) = self.success {
            out.append_pair("success", marker.as_str());
        }
        out.finish()
    }

    /// `/drivers` or `/drivers?<query>`.
    pub fn list_location(&self) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            LIST_PATH.to_string()
        } else {
            format!("{LIST_PATH}?{query}")
        }
    }
}

/// Query string for `GET /drivers` on the backend.
pub fn api_query(params: &ListParams) -> String {
    let (sort_by, sort_dir) = params.sort.sort_params();
    let mut out = form_urlencoded::Serializer::new(String::new());
    params.filters.append_to(&mut out);
    out.append_pair("page", &params.page.to_string());
    out.append_pair("size", &params.page_size.get().to_string());
    out.append_pair("sortBy", sort_by.as_str());
    out.append_pair("sortDir", sort_dir.as_str());
    out.finish()
}

/// Split a location such as `/drivers?page=2` into path and query.
pub fn split_location(location: &str) -> (&str, &str) {
    location.split_once('?').unwrap_or((location, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marina() -> DriverFilters {
        DriverFilters {
            text: "Marina".to_string(),
            city: String::new(),
            state: "SP".to_string(),
            vehicle_types: vec![VehicleType::Van],
        }
    }

    #[test]
    fn first_filter_value_wins_even_when_empty() {
        let parsed = ListQuery::parse("text=&text=b&city=Campinas&city=Santos");
        assert_eq!(parsed.params.filters.text, "");
        assert_eq!(parsed.params.filters.city, "Campinas");
    }

    #[test]
    fn empty_query_is_the_default_state() {
        let parsed = ListQuery::parse("");
        assert_eq!(parsed.params.filters, DriverFilters::default());
        assert_eq!(parsed.params.page, 0);
        assert_eq!(parsed.params.page_size, PageSize::Five);
        assert_eq!(parsed.params.sort, DriverSort::CreatedAtDesc);
        assert_eq!(parsed.success, None);
        assert_eq!(parsed, ListQuery::default());
    }

    #[test]
    fn defaults_are_omitted() {
        assert_eq!(ListQuery::default().to_query_string(), "");
        assert_eq!(ListQuery::default().list_location(), "/drivers");
    }

    #[test]
    fn example_filters_render_without_defaults() {
        let query = ListQuery::new(ListParams {
            filters: marina(),
            ..ListParams::default()
        });
        assert_eq!(query.to_query_string(), "text=Marina&state=SP&vehicleTypes=VAN");
    }

    #[test]
    fn non_default_values_are_emitted() {
        let query = ListQuery::new(ListParams {
            filters: DriverFilters::default(),
            page: 3,
            page_size: PageSize::Ten,
            sort: DriverSort::NameDesc,
        })
        .with_success(SuccessMarker::Deleted);
        assert_eq!(
            query.to_query_string(),
            "page=3&size=10&sort=NAME_DESC&success=deleted"
        );
    }

    #[test]
    fn render_then_parse_restores_the_state() {
        let original = ListQuery::new(ListParams {
            filters: DriverFilters {
                text: "João da Silva".to_string(),
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
                vehicle_types: vec![VehicleType::Truck, VehicleType::Van],
            },
            page: 7,
            page_size: PageSize::Ten,
            sort: DriverSort::UpdatedAtDesc,
        });
        let parsed = ListQuery::parse(&original.to_query_string());
        assert_eq!(parsed, original);
    }

    #[test]
    fn filter_values_are_trimmed_when_rendered() {
        let query = ListQuery::new(ListParams {
            filters: DriverFilters {
                text: "  ana ".to_string(),
                city: "   ".to_string(),
                ..DriverFilters::default()
            },
            ..ListParams::default()
        });
        assert_eq!(query.to_query_string(), "text=ana");
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let parsed = ListQuery::parse("?sort=BOGUS&page=-1&size=7&success=exploded");
        assert_eq!(parsed, ListQuery::default());

        let parsed = ListQuery::parse("page=abc&size=ten");
        assert_eq!(parsed.params.page, 0);
        assert_eq!(parsed.params.page_size, PageSize::Five);
    }

    #[test]
    fn unknown_vehicle_types_are_dropped() {
        let parsed = ListQuery::parse("vehicleTypes=VAN&vehicleTypes=BIKE&vehicleTypes=BAU");
        assert_eq!(
            parsed.params.filters.vehicle_types,
            vec![VehicleType::Van, VehicleType::Bau]
        );
    }

    #[test]
    fn success_marker_is_parsed() {
        let parsed = ListQuery::parse("success=created&page=1");
        assert_eq!(parsed.success, Some(SuccessMarker::Created));
        assert_eq!(parsed.params.page, 1);
    }

    #[test]
    fn toggling_twice_restores_membership_and_order() {
        let mut filters = DriverFilters {
            vehicle_types: vec![VehicleType::Truck, VehicleType::Van, VehicleType::Bau],
            ..DriverFilters::default()
        };
        let before = filters.clone();

        filters.toggle_vehicle_type(VehicleType::Sider);
        assert_eq!(filters.vehicle_types.last(), Some(&VehicleType::Sider));
        filters.toggle_vehicle_type(VehicleType::Sider);
        assert_eq!(filters, before);

        filters.toggle_vehicle_type(VehicleType::Van);
        assert_eq!(filters.vehicle_types, vec![VehicleType::Truck, VehicleType::Bau]);
    }

    #[test]
    fn api_query_matches_backend_contract() {
        let params = ListParams {
            filters: marina(),
            ..ListParams::default()
        };
        assert_eq!(
            api_query(&params),
            "text=Marina&state=SP&vehicleTypes=VAN&page=0&size=5&sortBy=CREATED_AT&sortDir=DESC"
        );
    }

    #[test]
    fn unknown_sort_resolves_to_created_at_desc() {
        assert_eq!(resolve_sort_params("nope"), (SortBy::CreatedAt, SortDir::Desc));
        assert_eq!(resolve_sort_params("NAME_ASC"), (SortBy::Name, SortDir::Asc));
        assert_eq!(resolve_sort_params("NAME_DESC"), (SortBy::Name, SortDir::Desc));
        assert_eq!(
            resolve_sort_params("UPDATED_AT_DESC"),
            (SortBy::UpdatedAt, SortDir::Desc)
        );
    }

    #[test]
    fn split_location_separates_query() {
        assert_eq!(split_location("/drivers?page=2"), ("/drivers", "page=2"));
        assert_eq!(split_location("/login"), ("/login", ""));
    }
}
