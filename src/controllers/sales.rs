//! Sales page: the sales log, the record-a-sale form and its pickers.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::EmptyState;
use crate::auth::{Permission, Session};
use crate::backend::Query;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::filters::CARS_TABLE;
use crate::format::{format_money_ils, non_blank};
use crate::models::car::AskingPrice;
use crate::models::sale::{SaleLine, SalePayload};
use crate::models::{Car, CarStatus, Customer, PaymentMethod, SaleDraft, SaleListRow};

const LIST_VIEW: &str = "sales_list_view";
const LIST_COLUMNS: &str = "id,sold_at,sold_price,payment_method,car_title,customer_name,sales_user_name,salesperson_id";
const SEARCH_COLUMNS: [&str; 3] = ["car_title", "customer_name", "sales_user_name"];

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalesParams {
    /// Free text matched against car title, customer and salesperson
    pub q: Option<String>,
    /// Only sales since the first day of the current month
    pub month_only: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SalesList {
    pub sales: Vec<SaleLine>,
    /// Sum of the shown sales.
    pub total: f64,
    pub total_label: String,
    pub empty_state: Option<EmptyState>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CarOption {
    pub id: Uuid,
    pub title: String,
    pub status: CarStatus,
    pub asking_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentOption {
    pub value: PaymentMethod,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SaleFormOptions {
    /// Cars that are not sold yet, newest first.
    pub cars: Vec<CarOption>,
    pub customers: Vec<Customer>,
    pub payment_methods: Vec<PaymentOption>,
}

/// Midnight UTC on the first day of `now`'s month.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|start| start.and_utc())
        .unwrap_or(now)
}

pub(crate) fn list_query(params: &SalesParams, limit: usize, now: DateTime<Utc>) -> Query {
    let search = non_blank(params.q.as_deref()).unwrap_or_default();
    let mut query = Query::table(LIST_VIEW)
        .select(LIST_COLUMNS)
        .search_any(&SEARCH_COLUMNS, &search);
    if params.month_only.unwrap_or(false) {
        query = query.gte("sold_at", month_start(now));
    }
    query.order("sold_at", false).limit(limit)
}

pub struct SaleController<'a> {
    session: &'a Session,
    config: &'a AppConfig,
}

impl<'a> SaleController<'a> {
    pub fn new(session: &'a Session, config: &'a AppConfig) -> Self {
        Self { session, config }
    }

    /// Sales the caller may see, newest first. The backend restricts the
    /// sales role to its own sales.
    pub async fn list(&self, params: &SalesParams) -> Result<SalesList, ApiError> {
        let query = list_query(params, self.config.sales_page_limit, Utc::now());
        let rows: Vec<SaleListRow> = self.session.backend.select(&query).await?;
        let total: f64 = rows.iter().map(|row| row.sold_price).sum();
        let sales: Vec<SaleLine> = rows.into_iter().map(SaleLine::from).collect();

        Ok(SalesList {
            empty_state: EmptyState::when_empty(&sales, || {
                EmptyState::new(
                    "لا يوجد مبيعات",
                    "ابدأ بتسجيل أول عملية بيع.",
                    self.session
                        .can(Permission::RecordSales)
                        .then_some("تسجيل بيع"),
                )
            }),
            total,
            total_label: format_money_ils(Some(total)),
            sales,
        })
    }

    pub async fn form_options(&self) -> Result<SaleFormOptions, ApiError> {
        let cars_query = Query::table(CARS_TABLE)
            .select("id,make,model,year,status,asking_price")
            .neq("status", CarStatus::Sold)
            .order("created_at", false);
        let cars: Vec<Car> = self.session.backend.select(&cars_query).await?;

        let customers_query = Query::table("customers")
            .select("id,full_name,phone")
            .order("created_at", false);
        let customers: Vec<Customer> = self.session.backend.select(&customers_query).await?;

        Ok(SaleFormOptions {
            cars: cars
                .into_iter()
                .map(|car| CarOption {
                    id: car.id,
                    title: car.title(),
                    status: car.status,
                    asking_price: car.asking_price,
                })
                .collect(),
            customers,
            payment_methods: PaymentMethod::ALL
                .iter()
                .map(|method| PaymentOption {
                    value: *method,
                    label: method.label().to_string(),
                })
                .collect(),
        })
    }

    /// Records a sale. A missing sold price is taken from the car's asking price.
    pub async fn record(&self, draft: SaleDraft) -> Result<SalePayload, ApiError> {
        self.session.require(Permission::RecordSales)?;

        let asking_price = match draft.car_id {
            Some(car_id) if draft.needs_price() => {
                let query = Query::table(CARS_TABLE)
                    .select("asking_price")
                    .eq("id", car_id);
                self.session
                    .backend
                    .select_one::<AskingPrice>(&query)
                    .await?
                    .and_then(|row| row.asking_price)
            }
            _ => None,
        };

        let payload = draft.into_payload(asking_price, Utc::now())?;
        self.session.backend.insert_quiet("sales", &payload).await?;
        tracing::info!(
            car_id = %payload.car_id,
            user_id = %self.session.user.id,
            sold_price = payload.sold_price,
            "Sale recorded"
        );
        Ok(payload)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.session.require(Permission::DeleteSales)?;
        self.session
            .backend
            .delete(&Query::table("sales").eq("id", id))
            .await?;
        tracing::info!(sale_id = %id, "Sale deleted");
        Ok(())
    }
}
