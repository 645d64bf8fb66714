//! # Inventory Filter
//!
//! Turns the inventory page's filter inputs into backend queries.
//!
//! The composer is pure: it owns no client and performs no I/O. A supplier
//! filter is indirect, so composition happens in two steps. First
//! [`InventoryFilter::supplier_query`] finds the supplier's cars in
//! `car_finance`; the caller then passes those ids to
//! [`InventoryFilter::cars_query`], or stops with an empty result when there
//! are none.
//!
//! [`InventoryFilter::reset`] and [`InventoryFilter::toggle_sort`] are the
//! page's button transitions, kept here so the UI and server agree on them.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::backend::Query;
use crate::format::{non_blank, to_number_or_null};
use crate::models::{CarStatus, ValidationError};

pub mod price_range;

pub use price_range::{DEFAULT_PRICE_STEP, PriceRange, clean_ceiling};

pub const CARS_TABLE: &str = "cars";

/// Columns read for inventory cards.
pub const CAR_LIST_COLUMNS: &str = "id,plate_number,vin,color,make,model,year,type,status,asking_price,mileage,main_image_url,created_at";

/// Columns matched by free-text search.
pub const CAR_SEARCH_COLUMNS: [&str; 4] = ["make", "model", "plate_number", "vin"];

/// Direction of the `created_at` ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            SortOrder::NewestFirst => SortOrder::OldestFirst,
            SortOrder::OldestFirst => SortOrder::NewestFirst,
        }
    }

    pub fn ascending(self) -> bool {
        self == SortOrder::OldestFirst
    }
}

/// Optional primary ordering, applied before `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Price,
    Year,
    Mileage,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Price => "asking_price",
            SortField::Year => "year",
            SortField::Mileage => "mileage",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "price" | "asking_price" => Some(SortField::Price),
            "year" => Some(SortField::Year),
            "mileage" => Some(SortField::Mileage),
            _ => None,
        }
    }
}

/// Inventory filter inputs as they arrive on the query string. Everything
/// is text; empty strings mean "unset".
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InventoryParams {
    /// Free text matched against make, model, plate number and VIN
    pub q: Option<String>,
    pub make: Option<String>,
    #[serde(rename = "type")]
    pub car_type: Option<String>,
    /// available | reserved | sold
    pub status: Option<String>,
    pub year: Option<String>,
    pub supplier_id: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    /// newest_first (default) | oldest_first
    pub sort: Option<String>,
    /// price | year | mileage
    pub sort_by: Option<String>,
    /// asc (default) | desc, for `sort_by`
    pub sort_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct InventoryFilter {
    pub search: String,
    pub make: Option<String>,
    #[serde(rename = "type")]
    pub car_type: Option<String>,
    pub status: Option<CarStatus>,
    pub year: Option<i32>,
    pub supplier_id: Option<Uuid>,
    pub price: PriceRange,
    pub sort: SortOrder,
    pub sort_by: Option<SortField>,
    pub sort_by_ascending: bool,
}

impl Default for InventoryFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            make: None,
            car_type: None,
            status: None,
            year: None,
            supplier_id: None,
            price: PriceRange::default(),
            sort: SortOrder::default(),
            sort_by: None,
            sort_by_ascending: true,
        }
    }
}

impl InventoryFilter {
    pub fn with_ceiling(ceiling: f64) -> Self {
        Self {
            price: PriceRange::new(ceiling),
            ..Self::default()
        }
    }

    /// Builds a filter from query-string inputs. Malformed categorical
    /// values are rejected; malformed prices are only flagged on the range.
    pub fn from_params(params: &InventoryParams, ceiling: f64) -> Result<Self, ValidationError> {
        let mut filter = Self::with_ceiling(ceiling);
        filter.search = non_blank(params.q.as_deref()).unwrap_or_default();
        filter.make = non_blank(params.make.as_deref());
        filter.car_type = non_blank(params.car_type.as_deref());

        if let Some(status) = non_blank(params.status.as_deref()) {
            filter.status = Some(status.parse()?);
        }

        if let Some(year) = non_blank(params.year.as_deref()) {
            let parsed = to_number_or_null(&year)
                .filter(|y| y.fract() == 0.0 && (1.0..=9999.0).contains(y))
                .ok_or_else(|| ValidationError::field("year", format!("'{year}' is not a year")))?;
            filter.year = Some(parsed as i32);
        }

        if let Some(raw) = non_blank(params.supplier_id.as_deref()) {
            let id = raw.parse::<Uuid>().map_err(|_| {
                ValidationError::field("supplier_id", format!("'{raw}' is not a supplier id"))
            })?;
            filter.supplier_id = Some(id);
        }

        if let Some(min) = params.min_price.as_deref() {
            filter.price.set_min_text(min);
        }
        if let Some(max) = params.max_price.as_deref() {
            filter.price.set_max_text(max);
        }

        if let Some(sort) = non_blank(params.sort.as_deref()) {
            filter.sort = match sort.to_lowercase().as_str() {
                "newest_first" | "newest" | "desc" => SortOrder::NewestFirst,
                "oldest_first" | "oldest" | "asc" => SortOrder::OldestFirst,
                other => {
                    return Err(ValidationError::field(
                        "sort",
                        format!("unknown sort order '{other}'"),
                    ));
                }
            };
        }

        if let Some(field) = non_blank(params.sort_by.as_deref()) {
            filter.sort_by = Some(SortField::parse(&field).ok_or_else(|| {
                ValidationError::field("sort_by", format!("cannot sort by '{field}'"))
            })?);
        }
        filter.sort_by_ascending = !matches!(
            non_blank(params.sort_dir.as_deref()).as_deref(),
            Some("desc")
        );

        Ok(filter)
    }

    /// Restores every input to its default; the price domain is kept.
    pub fn reset(&mut self) {
        let ceiling = self.price.ceiling();
        *self = Self::with_ceiling(ceiling);
    }

    pub fn toggle_sort(&mut self) {
        self.sort = self.sort.toggle();
    }

    pub fn is_default(&self) -> bool {
        self == &Self::with_ceiling(self.price.ceiling())
    }

    /// `car_finance` lookup for the supplier filter, if one is set.
    pub fn supplier_query(&self) -> Option<Query> {
        self.supplier_id.map(|id| {
            Query::table("car_finance")
                .select("car_id")
                .eq("supplier_id", id)
        })
    }

    /// The `cars` select. `restrict_to` carries the ids resolved by
    /// [`supplier_query`](Self::supplier_query).
    pub fn cars_query(&self, restrict_to: Option<&[Uuid]>) -> Query {
        let mut query = Query::table(CARS_TABLE)
            .select(CAR_LIST_COLUMNS)
            .search_any(&CAR_SEARCH_COLUMNS, &self.search);

        if let Some(make) = &self.make {
            query = query.eq("make", make);
        }
        if let Some(car_type) = &self.car_type {
            query = query.eq("type", car_type);
        }
        if let Some(status) = self.status {
            query = query.eq("status", status);
        }
        if let Some(year) = self.year {
            query = query.eq("year", year);
        }
        if let Some(ids) = restrict_to {
            query = query.in_list("id", ids);
        }

        let (min, max) = self.price.bounds();
        if let Some(min) = min {
            query = query.gte("asking_price", min);
        }
        if let Some(max) = max {
            query = query.lte("asking_price", max);
        }

        if let Some(field) = self.sort_by {
            query = query.order(field.column(), self.sort_by_ascending);
        }
        query.order("created_at", self.sort.ascending())
    }
}

/// Query for the single highest asking price.
pub fn price_ceiling_query() -> Query {
    Query::table(CARS_TABLE)
        .select("asking_price")
        .order_nulls_last("asking_price", false)
        .limit(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> InventoryParams {
        InventoryParams::default()
    }

    #[test]
    fn unfiltered_query_is_newest_first() {
        let q = InventoryFilter::with_ceiling(100_000.0).cars_query(None);
        assert_eq!(q.param("select"), Some(CAR_LIST_COLUMNS));
        assert_eq!(q.param("order"), Some("created_at.desc"));
        assert_eq!(q.params().len(), 2);
    }

    #[test]
    fn empty_strings_are_unset() {
        let p = InventoryParams {
            q: Some("  ".into()),
            make: Some("".into()),
            status: Some("".into()),
            year: Some(" ".into()),
            supplier_id: Some("".into()),
            min_price: Some("".into()),
            ..params()
        };
        let filter = InventoryFilter::from_params(&p, 100_000.0).unwrap();
        assert!(filter.is_default());
        assert_eq!(
            filter.cars_query(None),
            InventoryFilter::with_ceiling(100_000.0).cars_query(None)
        );
    }

    #[test]
    fn status_and_price_scenario() {
        let p = InventoryParams {
            status: Some("available".into()),
            min_price: Some("10000".into()),
            max_price: Some("50000".into()),
            ..params()
        };
        let q = InventoryFilter::from_params(&p, 100_000.0)
            .unwrap()
            .cars_query(None);
        assert_eq!(q.param("status"), Some("eq.available"));
        let prices: Vec<&str> = q
            .params()
            .iter()
            .filter(|(k, _)| k == "asking_price")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(prices, vec!["gte.10000", "lte.50000"]);
    }

    #[test]
    fn search_is_ored_over_designated_columns() {
        let p = InventoryParams {
            q: Some("Corolla".into()),
            ..params()
        };
        let q = InventoryFilter::from_params(&p, 100_000.0)
            .unwrap()
            .cars_query(None);
        assert_eq!(
            q.param("or"),
            Some("(make.ilike.*Corolla*,model.ilike.*Corolla*,plate_number.ilike.*Corolla*,vin.ilike.*Corolla*)")
        );
    }

    #[test]
    fn supplier_filter_resolves_through_finance() {
        let supplier = Uuid::new_v4();
        let p = InventoryParams {
            supplier_id: Some(supplier.to_string()),
            ..params()
        };
        let filter = InventoryFilter::from_params(&p, 100_000.0).unwrap();
        let lookup = filter.supplier_query().unwrap();
        assert_eq!(lookup.table_name(), "car_finance");
        assert_eq!(lookup.param("supplier_id"), Some(format!("eq.{supplier}").as_str()));

        let car = Uuid::new_v4();
        let q = filter.cars_query(Some(&[car]));
        assert_eq!(q.param("id"), Some(format!("in.({car})").as_str()));
        assert!(InventoryFilter::default().supplier_query().is_none());
    }

    #[test]
    fn malformed_categoricals_are_rejected() {
        let bad_status = InventoryParams {
            status: Some("leased".into()),
            ..params()
        };
        assert!(InventoryFilter::from_params(&bad_status, 1.0).is_err());

        let bad_year = InventoryParams {
            year: Some("20x1".into()),
            ..params()
        };
        let err = InventoryFilter::from_params(&bad_year, 1.0).unwrap_err();
        assert!(err.fields.contains_key("year"));

        for huge in ["1e10", "-2019", "0"] {
            let out_of_range = InventoryParams {
                year: Some(huge.into()),
                ..params()
            };
            let err = InventoryFilter::from_params(&out_of_range, 1.0).unwrap_err();
            assert!(err.fields.contains_key("year"), "{huge} accepted");
        }

        let bad_supplier = InventoryParams {
            supplier_id: Some("acme".into()),
            ..params()
        };
        assert!(InventoryFilter::from_params(&bad_supplier, 1.0).is_err());
    }

    #[test]
    fn malformed_price_is_flagged_not_rejected() {
        let p = InventoryParams {
            min_price: Some("cheap".into()),
            ..params()
        };
        let filter = InventoryFilter::from_params(&p, 100_000.0).unwrap();
        assert!(filter.price.min_invalid());
        assert!(filter.cars_query(None).param("asking_price").is_none());
    }

    #[test]
    fn primary_sort_precedes_created_at() {
        let p = InventoryParams {
            sort_by: Some("price".into()),
            sort_dir: Some("desc".into()),
            sort: Some("oldest_first".into()),
            ..params()
        };
        let mut filter = InventoryFilter::from_params(&p, 100_000.0).unwrap();
        assert_eq!(
            filter.cars_query(None).param("order"),
            Some("asking_price.desc,created_at.asc")
        );
        filter.toggle_sort();
        assert_eq!(
            filter.cars_query(None).param("order"),
            Some("asking_price.desc,created_at.desc")
        );
    }

    #[test]
    fn reset_returns_to_unfiltered_query() {
        let p = InventoryParams {
            q: Some("kia".into()),
            make: Some("Kia".into()),
            car_type: Some("SUV".into()),
            status: Some("sold".into()),
            year: Some("2020".into()),
            supplier_id: Some(Uuid::new_v4().to_string()),
            min_price: Some("1000".into()),
            max_price: Some("9000".into()),
            sort: Some("oldest_first".into()),
            sort_by: Some("year".into()),
            sort_dir: None,
        };
        let mut filter = InventoryFilter::from_params(&p, 100_000.0).unwrap();
        assert!(!filter.is_default());
        filter.reset();
        assert!(filter.is_default());
        assert_eq!(
            filter.cars_query(None),
            InventoryFilter::with_ceiling(100_000.0).cars_query(None)
        );
    }

    #[test]
    fn ceiling_query_reads_the_top_price() {
        let q = price_ceiling_query();
        assert_eq!(q.param("order"), Some("asking_price.desc.nullslast"));
        assert_eq!(q.param("limit"), Some("1"));
    }
}
