//! Car inventory records: the `cars` row, its `car_details` and
//! admin-only `car_finance` companions, and the draft submitted by the car form.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Validate, ValidationError, require_text};
use crate::format::{self, Variant, lenient_bool, lenient_number, non_blank};

/// Body types offered by the car form.
pub const CAR_TYPES: [&str; 8] = [
    "Sedan",
    "SUV",
    "Hatchback",
    "Coupe",
    "Pickup",
    "Van",
    "Crossover",
    "Other",
];

/// Makes and models offered before anything has been saved to `car_makes`/`car_models`.
pub const BUILTIN_CATALOG: &[(&str, &[&str])] = &[
    ("كيا", &["بيكانتو", "ريو", "سيراتو", "سبورتاج", "نيرو", "ستونيك", "سورينتو", "كارنفال"]),
    ("هيونداي", &["i10", "i20", "أكسنت", "إلنترا", "توسان", "كونا", "سانتافي", "أيونيك"]),
    ("تويوتا", &["كورولا", "ياريس", "كامري", "راف 4", "CH-R", "هايلكس", "لاند كروزر"]),
    ("سكودا", &["أوكتافيا", "سوبرب", "كودياك", "كاميك", "كاروك", "فابيا"]),
    ("فولكس فاجن", &["جولف", "بولو", "تيغوان", "باسات", "ت-روك"]),
    ("مازدا", &["3", "6", "CX-3", "CX-5", "CX-30"]),
    ("نيسان", &["ميكرا", "سنترا", "قشقاي", "إكس-تريل", "جوك"]),
    ("ميتسوبيشي", &["أتراج", "لانسر", "ASX", "أوتلاندر", "تريتون"]),
    ("سوزوكي", &["سويفت", "بالينو", "فيتارا", "سياز", "إرتيجا"]),
    ("بيجو", &["208", "2008", "3008", "508"]),
    ("رينو", &["كليو", "كابتور", "ميغان", "كوليوس"]),
    ("مرسيدس", &["A-Class", "C-Class", "E-Class", "GLA", "GLC"]),
    ("بي إم دبليو", &["1 Series", "3 Series", "5 Series", "X1", "X3"]),
    ("أودي", &["A3", "A4", "A6", "Q3", "Q5"]),
];

/// Inventory status of a car.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CarStatus {
    #[default]
    Available,
    Reserved,
    Sold,
}

impl CarStatus {
    pub const ALL: [CarStatus; 3] = [CarStatus::Available, CarStatus::Reserved, CarStatus::Sold];

    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Available => "available",
            CarStatus::Reserved => "reserved",
            CarStatus::Sold => "sold",
        }
    }

    pub fn label(&self) -> &'static str {
        format::status_label(self.as_str())
    }

    pub fn variant(&self) -> Variant {
        format::status_variant(self.as_str())
    }
}

impl fmt::Display for CarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(CarStatus::Available),
            "reserved" => Ok(CarStatus::Reserved),
            "sold" => Ok(CarStatus::Sold),
            other => Err(ValidationError::field(
                "status",
                format!("unknown car status '{other}'"),
            )),
        }
    }
}

/// A row of the `cars` table. Columns outside the selected set stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Car {
    pub id: Uuid,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    pub year: Option<i32>,
    #[serde(rename = "type")]
    pub car_type: Option<String>,
    #[serde(default)]
    pub status: CarStatus,
    pub asking_price: Option<f64>,
    pub mileage: Option<i64>,
    pub vin: Option<String>,
    pub plate_number: Option<String>,
    pub color: Option<String>,
    pub main_image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Car {
    pub fn title(&self) -> String {
        format::car_title(&self.make, &self.model, self.year)
    }
}

impl Validate for Car {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text(
            &[("make", &self.make), ("model", &self.model)],
            "car row is missing make or model",
        )?;
        if let Some(price) = self.asking_price
            && (!price.is_finite() || price < 0.0)
        {
            return Err(ValidationError::field(
                "asking_price",
                "asking price must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Car as shown on an inventory card: the row plus its display strings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CarCard {
    #[serde(flatten)]
    pub car: Car,
    pub title: String,
    pub status_label: String,
    pub status_variant: Variant,
    pub price_label: String,
}

impl From<Car> for CarCard {
    fn from(car: Car) -> Self {
        Self {
            title: car.title(),
            status_label: car.status.label().to_string(),
            status_variant: car.status.variant(),
            price_label: format::format_money_ils(car.asking_price),
            car,
        }
    }
}

/// Optional technical details kept in `car_details`, one row per car.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DetailsFields {
    pub on_road_date: Option<NaiveDate>,
    pub last_test_date: Option<NaiveDate>,
    pub test_valid_until: Option<NaiveDate>,
    pub ownership_type: Option<String>,
    pub owners_count: Option<i32>,
    pub trim_level: Option<String>,
    pub fuel_type: Option<String>,
    pub gearbox: Option<String>,
    pub engine_cc: Option<i32>,
    pub sunroof: Option<bool>,
}

impl DetailsFields {
    pub fn has_any(&self) -> bool {
        self != &DetailsFields::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CarDetails {
    pub car_id: Uuid,
    #[serde(flatten)]
    pub fields: DetailsFields,
}

impl Validate for CarDetails {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Internal cost and supplier data kept in `car_finance`. Admins see every
/// field; the sales role only ever selects `supplier_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinanceFields {
    pub supplier_id: Option<Uuid>,
    pub purchase_date: Option<NaiveDate>,
    pub internal_notes: Option<String>,
    pub purchase_price: Option<f64>,
    pub ad_spend: Option<f64>,
    pub fuel_cost: Option<f64>,
    pub other_cost: Option<f64>,
}

impl FinanceFields {
    pub fn has_any(&self) -> bool {
        self.supplier_id.is_some()
            || self.purchase_date.is_some()
            || self.internal_notes.as_deref().is_some_and(|n| !n.is_empty())
            || self.purchase_price.is_some()
            || self.ad_spend.is_some()
            || self.fuel_cost.is_some()
            || self.other_cost.is_some()
    }

    /// Sum of every recorded cost, `None` when nothing was recorded.
    pub fn total_cost(&self) -> Option<f64> {
        let costs = [
            self.purchase_price,
            self.ad_spend,
            self.fuel_cost,
            self.other_cost,
        ];
        if costs.iter().all(Option::is_none) {
            return None;
        }
        Some(costs.iter().flatten().sum())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CarFinance {
    pub car_id: Uuid,
    #[serde(flatten)]
    pub fields: FinanceFields,
}

impl Validate for CarFinance {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Just the `asking_price` column of a `cars` row.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AskingPrice {
    #[serde(default, deserialize_with = "lenient_number")]
    pub asking_price: Option<f64>,
}

impl Validate for AskingPrice {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// `car_makes` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarMake {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
}

impl Validate for CarMake {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// `car_models` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarModelName {
    pub make_id: Uuid,
    #[serde(default)]
    pub name: String,
}

impl Validate for CarModelName {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Image attached to a car form, base64 encoded.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data_base64: String,
}

impl ImageUpload {
    /// Lower-cased extension; anything longer than six characters falls back to `jpg`.
    pub fn extension(&self) -> String {
        let ext = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| "jpg".to_string());
        if ext.len() > 6 { "jpg".to_string() } else { ext }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DetailsDraft {
    #[serde(default)]
    pub on_road_date: Option<String>,
    #[serde(default)]
    pub last_test_date: Option<String>,
    #[serde(default)]
    pub test_valid_until: Option<String>,
    #[serde(default)]
    pub ownership_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub owners_count: Option<f64>,
    #[serde(default)]
    pub trim_level: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub gearbox: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub engine_cc: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub sunroof: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FinanceDraft {
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<String>,
    #[serde(default)]
    pub internal_notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub purchase_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub ad_spend: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub fuel_cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub other_cost: Option<f64>,
}

/// What the car form submits. Numbers may arrive as text.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CarDraft {
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub year: Option<f64>,
    #[serde(default, rename = "type")]
    pub car_type: Option<String>,
    #[serde(default)]
    pub status: Option<CarStatus>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub mileage: Option<f64>,
    #[serde(default)]
    pub plate_number: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub asking_price: Option<f64>,
    #[serde(default)]
    pub details: DetailsDraft,
    #[serde(default)]
    pub finance: FinanceDraft,
    #[serde(default)]
    pub image: Option<ImageUpload>,
}

/// Normalized `cars` write payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarPayload {
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    #[serde(rename = "type")]
    pub car_type: Option<String>,
    pub status: CarStatus,
    pub mileage: Option<i64>,
    pub plate_number: Option<String>,
    pub vin: Option<String>,
    pub color: Option<String>,
    pub asking_price: f64,
}

/// A car draft after trimming, coercion and validation.
#[derive(Debug, Clone)]
pub struct CarSubmission {
    pub car: CarPayload,
    pub details: DetailsFields,
    pub finance: FinanceFields,
    pub image: Option<ImageUpload>,
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    match non_blank(value) {
        None => Ok(None),
        Some(text) => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ValidationError::field(field, format!("'{text}' is not a YYYY-MM-DD date"))),
    }
}

/// Rounds to a whole number that fits `T`, or fails on `field`.
fn whole<T: TryFrom<i64>>(field: &str, value: Option<f64>) -> Result<Option<T>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let rounded = value.round();
    // i64::MAX is not representable in f64; the bound rounds up to 2^63.
    if rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        if let Ok(n) = T::try_from(rounded as i64) {
            return Ok(Some(n));
        }
    }
    Err(ValidationError::field(field, format!("{value} is out of range")))
}

impl DetailsDraft {
    pub fn normalize(self) -> Result<DetailsFields, ValidationError> {
        Ok(DetailsFields {
            on_road_date: parse_date("on_road_date", self.on_road_date.as_deref())?,
            last_test_date: parse_date("last_test_date", self.last_test_date.as_deref())?,
            test_valid_until: parse_date("test_valid_until", self.test_valid_until.as_deref())?,
            ownership_type: non_blank(self.ownership_type.as_deref()),
            owners_count: whole("owners_count", self.owners_count)?,
            trim_level: non_blank(self.trim_level.as_deref()),
            fuel_type: non_blank(self.fuel_type.as_deref()),
            gearbox: non_blank(self.gearbox.as_deref()),
            engine_cc: whole("engine_cc", self.engine_cc)?,
            sunroof: self.sunroof,
        })
    }
}

impl FinanceDraft {
    pub fn normalize(self) -> Result<FinanceFields, ValidationError> {
        let supplier_id = match non_blank(self.supplier_id.as_deref()) {
            None => None,
            Some(raw) => Some(raw.parse::<Uuid>().map_err(|_| {
                ValidationError::field("supplier_id", format!("'{raw}' is not a supplier id"))
            })?),
        };
        Ok(FinanceFields {
            supplier_id,
            purchase_date: parse_date("purchase_date", self.purchase_date.as_deref())?,
            internal_notes: non_blank(self.internal_notes.as_deref()),
            purchase_price: self.purchase_price,
            ad_spend: self.ad_spend,
            fuel_cost: self.fuel_cost,
            other_cost: self.other_cost,
        })
    }
}

impl CarDraft {
    pub fn into_submission(self) -> Result<CarSubmission, ValidationError> {
        let make = format::safe_text(self.make.as_deref());
        let model = format::safe_text(self.model.as_deref());
        require_text(
            &[("make", &make), ("model", &model)],
            "make and model are required",
        )?;

        let car = CarPayload {
            make,
            model,
            year: whole("year", self.year)?,
            car_type: non_blank(self.car_type.as_deref()),
            status: self.status.unwrap_or_default(),
            mileage: whole("mileage", self.mileage)?,
            plate_number: non_blank(self.plate_number.as_deref()),
            vin: non_blank(self.vin.as_deref()),
            color: non_blank(self.color.as_deref()),
            asking_price: self.asking_price.unwrap_or(0.0),
        };

        Ok(CarSubmission {
            car,
            details: self.details.normalize()?,
            finance: self.finance.normalize()?,
            image: self.image,
        })
    }
}
