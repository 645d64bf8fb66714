//! Inventory page: car listing, car details with finance, the car form and
//! the make/model catalog that feeds its pickers.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{EmptyState, Notice, Saved};
use crate::auth::{Permission, Session};
use crate::backend::{BackendClient, BackendError, Query};
use crate::config::AppConfig;
use crate::error::{ApiError, not_found};
use crate::filters::{CAR_LIST_COLUMNS, CARS_TABLE, InventoryFilter, clean_ceiling, price_ceiling_query};
use crate::format::safe_text;
use crate::models::car::{
    AskingPrice, BUILTIN_CATALOG, CarCard, CarMake, CarModelName, CarSubmission, DetailsFields, FinanceFields,
    ImageUpload,
};
use crate::models::supplier::SupplierOption;
use crate::models::{Car, CarDetails, CarDraft, CarFinance, Validate, ValidationError};

const DETAILS_COLUMNS: &str = "car_id,on_road_date,last_test_date,test_valid_until,ownership_type,owners_count,trim_level,fuel_type,gearbox,engine_cc,sunroof";
const FULL_FINANCE_COLUMNS: &str = "car_id,purchase_price,ad_spend,fuel_cost,other_cost,supplier_id,purchase_date,internal_notes";
const SUPPLIER_ONLY_FINANCE_COLUMNS: &str = "car_id,supplier_id";

const CATALOG_NOT_SAVED: &str = "تم حفظ السيارة، لكن لم يتم حفظ الشركة/الموديل في قائمة الاختيار.";
const IMAGE_NOT_UPLOADED: &str = "تم حفظ السيارة، لكن فشل رفع الصورة.";
const IMAGE_NOT_RECORDED: &str = "تم رفع الصورة، لكن لم يتم تسجيلها في معرض السيارة.";
const DETAILS_NOT_LOADED: &str = "تعذر تحميل تفاصيل السيارة.";
const FINANCE_NOT_LOADED: &str = "تعذر تحميل البيانات المالية.";

/// Make name -> sorted model names.
pub type Catalog = BTreeMap<String, Vec<String>>;

/// The inventory page's response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Inventory {
    pub cars: Vec<CarCard>,
    /// The filter as applied, including the price range state.
    pub filter: InventoryFilter,
    pub empty_state: Option<EmptyState>,
}

/// A single car with its companions, as the details view shows it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CarView {
    pub car: CarCard,
    pub details: Option<DetailsFields>,
    /// Full finance for admins; only `supplier_id` for sales.
    pub finance: Option<FinanceFields>,
    pub total_cost: Option<f64>,
    pub supplier_company: Option<String>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Deserialize)]
struct FinanceCarId {
    car_id: Uuid,
}

impl Validate for FinanceCarId {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct MakeModel {
    #[serde(default)]
    make: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

impl Validate for MakeModel {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

fn cars_empty_state(session: &Session) -> EmptyState {
    if session.can(Permission::ManageCars) {
        EmptyState::new("لا يوجد سيارات", "أضف أول سيارة.", Some("إضافة سيارة"))
    } else {
        EmptyState::new("لا يوجد سيارات", "لا يوجد سيارات للعرض.", None)
    }
}

fn finance_columns(session: &Session) -> &'static str {
    if session.can(Permission::ViewFullFinance) {
        FULL_FINANCE_COLUMNS
    } else {
        SUPPLIER_ONLY_FINANCE_COLUMNS
    }
}

/// Merges the built-in catalog, the saved catalog tables and the makes and
/// models already present in the inventory. Blank names are skipped.
pub fn merge_catalog<'a>(
    saved_makes: &[CarMake],
    saved_models: &[CarModelName],
    inventory: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Catalog {
    let mut merged: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut add = |make: &str, model: &str| {
        let (make, model) = (make.trim(), model.trim());
        if make.is_empty() {
            return;
        }
        let models = merged.entry(make.to_string()).or_default();
        if !model.is_empty() {
            models.insert(model.to_string());
        }
    };

    for (make, models) in BUILTIN_CATALOG {
        for model in *models {
            add(make, model);
        }
    }

    let make_names: HashMap<Uuid, &str> = saved_makes
        .iter()
        .map(|make| (make.id, make.name.as_str()))
        .collect();
    for model in saved_models {
        if let Some(make) = make_names.get(&model.make_id) {
            add(make, &model.name);
        }
    }

    for (make, model) in inventory {
        add(make, model);
    }

    merged
        .into_iter()
        .map(|(make, models)| (make, models.into_iter().collect()))
        .collect()
}

fn decode_image(image: &ImageUpload) -> Result<Vec<u8>, ValidationError> {
    BASE64
        .decode(image.data_base64.trim())
        .map_err(|err| ValidationError::field("image", format!("image is not valid base64: {err}")))
}

pub struct CarController<'a> {
    session: &'a Session,
    config: &'a AppConfig,
}

impl<'a> CarController<'a> {
    pub fn new(session: &'a Session, config: &'a AppConfig) -> Self {
        Self { session, config }
    }

    fn backend(&self) -> &BackendClient {
        &self.session.backend
    }

    /// Highest asking price in the inventory, rounded up to a clean step.
    pub async fn price_ceiling(&self) -> Result<f64, ApiError> {
        let rows: Vec<AskingPrice> = self.backend().select(&price_ceiling_query()).await?;
        let observed = rows.first().and_then(|row| row.asking_price);
        Ok(clean_ceiling(observed, self.config.price_step))
    }

    pub async fn list(&self, filter: InventoryFilter) -> Result<Inventory, ApiError> {
        let restrict_to = match filter.supplier_query() {
            None => None,
            Some(lookup) => {
                let rows: Vec<FinanceCarId> = self.backend().select(&lookup).await?;
                if rows.is_empty() {
                    tracing::debug!(supplier_id = ?filter.supplier_id, "Supplier has no cars");
                    return Ok(Inventory {
                        cars: Vec::new(),
                        empty_state: Some(cars_empty_state(self.session)),
                        filter,
                    });
                }
                Some(rows.into_iter().map(|row| row.car_id).collect::<Vec<_>>())
            }
        };

        let query = filter.cars_query(restrict_to.as_deref());
        let cars: Vec<CarCard> = self
            .backend()
            .select::<Car>(&query)
            .await?
            .into_iter()
            .map(CarCard::from)
            .collect();
        tracing::debug!(count = cars.len(), "Inventory loaded");

        Ok(Inventory {
            empty_state: EmptyState::when_empty(&cars, || cars_empty_state(self.session)),
            cars,
            filter,
        })
    }

    async fn find(&self, id: Uuid) -> Result<Car, ApiError> {
        let query = Query::table(CARS_TABLE)
            .select(CAR_LIST_COLUMNS)
            .eq("id", id);
        self.backend()
            .select_one::<Car>(&query)
            .await?
            .ok_or_else(|| not_found("Car"))
    }

    /// The car with details, finance and supplier name. Companion failures
    /// become notices; only a missing car is an error.
    pub async fn get(&self, id: Uuid) -> Result<CarView, ApiError> {
        let car = self.find(id).await?;
        let mut notices = Vec::new();

        let details_query = Query::table("car_details")
            .select(DETAILS_COLUMNS)
            .eq("car_id", id);
        let details = match self.backend().select_one::<CarDetails>(&details_query).await {
            Ok(row) => row.map(|row| row.fields),
            Err(err) => {
                tracing::warn!(car_id = %id, error = %err, "Car details failed to load");
                notices.push(Notice::warn(DETAILS_NOT_LOADED, &err));
                None
            }
        };

        let finance_query = Query::table("car_finance")
            .select(finance_columns(self.session))
            .eq("car_id", id);
        let finance = match self.backend().select_one::<CarFinance>(&finance_query).await {
            Ok(row) => row.map(|row| row.fields),
            Err(err) => {
                tracing::warn!(car_id = %id, error = %err, "Car finance failed to load");
                notices.push(Notice::warn(FINANCE_NOT_LOADED, &err));
                None
            }
        };

        let supplier_company = match finance.as_ref().and_then(|f| f.supplier_id) {
            None => None,
            Some(supplier_id) => {
                let query = Query::table("suppliers")
                    .select("id,company")
                    .eq("id", supplier_id);
                match self.backend().select_one::<SupplierOption>(&query).await {
                    Ok(row) => row.and_then(|s| s.company),
                    Err(err) => {
                        tracing::warn!(%supplier_id, error = %err, "Supplier name failed to load");
                        None
                    }
                }
            }
        };

        Ok(CarView {
            car: CarCard::from(car),
            total_cost: finance.as_ref().and_then(FinanceFields::total_cost),
            details,
            finance,
            supplier_company,
            notices,
        })
    }

    /// Creates the car (`id` is `None`) or updates it, then writes its
    /// companions and side effects.
    pub async fn save(&self, id: Option<Uuid>, draft: CarDraft) -> Result<Saved<CarCard>, ApiError> {
        self.session.require(Permission::ManageCars)?;
        let submission = draft.into_submission()?;
        let image_bytes = submission.image.as_ref().map(decode_image).transpose()?;
        let CarSubmission {
            car: payload,
            details,
            finance,
            image,
        } = submission;

        let mut car: Car = match id {
            Some(id) => {
                let query = Query::table(CARS_TABLE).eq("id", id);
                self.backend()
                    .update::<_, Car>(&query, &payload)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| not_found("Car"))?
            }
            None => self.backend().insert(CARS_TABLE, &payload).await?,
        };
        tracing::info!(car_id = %car.id, created = id.is_none(), "Car saved");

        if details.has_any() {
            let row = CarDetails {
                car_id: car.id,
                fields: details,
            };
            self.backend().upsert("car_details", "car_id", &row).await?;
        }
        if finance.has_any() {
            let row = CarFinance {
                car_id: car.id,
                fields: finance,
            };
            self.backend().upsert("car_finance", "car_id", &row).await?;
        }

        let mut notices = Vec::new();
        if let Err(err) = self.remember_make_model(&car.make, &car.model).await {
            tracing::warn!(car_id = %car.id, error = %err, "Catalog upsert failed");
            notices.push(Notice::warn(CATALOG_NOT_SAVED, &err));
        }

        if let (Some(image), Some(bytes)) = (image, image_bytes) {
            match self.attach_main_image(car.id, &image, bytes, &mut notices).await {
                Ok(url) => car.main_image_url = Some(url),
                Err(err) => {
                    tracing::warn!(car_id = %car.id, error = %err, "Main image upload failed");
                    notices.push(Notice::warn(IMAGE_NOT_UPLOADED, &err));
                }
            }
        }

        Ok(Saved {
            record: CarCard::from(car),
            notices,
        })
    }

    async fn remember_make_model(&self, make: &str, model: &str) -> Result<(), BackendError> {
        let (make, model) = (safe_text(Some(make)), safe_text(Some(model)));
        if make.is_empty() || model.is_empty() {
            return Ok(());
        }
        let rows: Vec<CarMake> = self
            .backend()
            .upsert_returning("car_makes", "name", &json!({ "name": make }))
            .await?;
        if let Some(make_row) = rows.first() {
            self.backend()
                .upsert(
                    "car_models",
                    "make_id,name",
                    &json!({ "make_id": make_row.id, "name": model }),
                )
                .await?;
        }
        Ok(())
    }

    /// Uploads the image, records it and makes it the car's main image.
    async fn attach_main_image(
        &self,
        car_id: Uuid,
        image: &ImageUpload,
        bytes: Vec<u8>,
        notices: &mut Vec<Notice>,
    ) -> Result<String, BackendError> {
        let path = format!("{car_id}/{}.{}", Uuid::new_v4(), image.extension());
        let content_type = image
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        self.backend().upload_object(&path, bytes, content_type).await?;
        let public_url = self.backend().public_url(&path);

        let record = json!({ "car_id": car_id, "path": path, "public_url": public_url });
        if let Err(err) = self.backend().insert_quiet("car_images", &record).await {
            tracing::warn!(%car_id, error = %err, "Image record insert failed");
            notices.push(Notice::warn(IMAGE_NOT_RECORDED, &err));
        }

        let query = Query::table(CARS_TABLE).eq("id", car_id);
        let _: Vec<Car> = self
            .backend()
            .update(&query, &json!({ "main_image_url": public_url }))
            .await?;
        Ok(public_url)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.session.require(Permission::ManageCars)?;
        self.backend()
            .delete(&Query::table(CARS_TABLE).eq("id", id))
            .await?;
        tracing::info!(car_id = %id, "Car deleted");
        Ok(())
    }

    /// Make -> models offered by the car form.
    pub async fn catalog(&self) -> Result<Catalog, ApiError> {
        let (makes, models) = match self.saved_catalog().await {
            Ok(saved) => saved,
            Err(err) => {
                tracing::warn!(error = %err, "Saved catalog unavailable, using built-in list");
                (Vec::new(), Vec::new())
            }
        };

        let inventory: Vec<MakeModel> = self
            .backend()
            .select(&Query::table(CARS_TABLE).select("make,model"))
            .await?;

        Ok(merge_catalog(
            &makes,
            &models,
            inventory.iter().map(|row| {
                (
                    row.make.as_deref().unwrap_or_default(),
                    row.model.as_deref().unwrap_or_default(),
                )
            }),
        ))
    }

    async fn saved_catalog(&self) -> Result<(Vec<CarMake>, Vec<CarModelName>), BackendError> {
        let makes = self
            .backend()
            .select(&Query::table("car_makes").select("id,name").order("name", true))
            .await?;
        let models = self
            .backend()
            .select(&Query::table("car_models").select("make_id,name"))
            .await?;
        Ok((makes, models))
    }

    /// Supplier picker entries, by company name.
    pub async fn supplier_options(&self) -> Result<Vec<SupplierOption>, ApiError> {
        self.session.require(Permission::ViewFullFinance)?;
        let query = Query::table("suppliers")
            .select("id,company")
            .order("company", true);
        Ok(self.backend().select(&query).await?)
    }
}
