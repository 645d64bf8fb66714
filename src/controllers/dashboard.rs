//! Dashboard: inventory counts, revenue, profit and the latest sales.

use serde::Serialize;
use serde_json::{Value, json};
use utoipa::ToSchema;

use super::{EmptyState, Icon, KpiCard};
use crate::auth::{Permission, Session};
use crate::backend::{BackendError, Query};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::filters::CARS_TABLE;
use crate::format::{Variant, format_money_ils};
use crate::models::CarStatus;
use crate::models::sale::{SaleLine, SaleListRow};

const RECENT_SALES_COLUMNS: &str =
    "id,sold_at,sold_price,payment_method,car_title,customer_name,sales_user_name";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Dashboard {
    pub title: String,
    pub subtitle: String,
    pub kpis: Vec<KpiCard>,
    pub recent_sales: Vec<SaleLine>,
    pub empty_state: Option<EmptyState>,
}

/// Figures behind the KPI cards.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Figures {
    pub available: u64,
    pub reserved: u64,
    pub sold: u64,
    pub revenue_total: f64,
    pub revenue_month: f64,
    /// Only loaded for callers who may see profit.
    pub profit_total: Option<f64>,
}

/// RPC results arrive as a number, a numeric string or null.
fn amount(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|n: &f64| n.is_finite()).unwrap_or(0.0)
}

fn card(label: &str, value: String, hint: &str, variant: Variant, icon: &str) -> KpiCard {
    KpiCard {
        label: label.to_string(),
        value,
        hint: Some(hint.to_string()),
        variant,
        icon: Icon::render(icon),
    }
}

/// Builds the KPI cards. Admins get revenue across all sales and a profit
/// card; the sales role sees its own revenue and a note instead.
pub fn kpi_cards(figures: &Figures, see_profit: bool) -> Vec<KpiCard> {
    let mut cards = vec![
        card(
            "سيارات متاحة",
            figures.available.to_string(),
            "جاهزة للبيع",
            Variant::Ok,
            "car",
        ),
        card(
            "محجوزة",
            figures.reserved.to_string(),
            "بانتظار قرار",
            Variant::Warn,
            "car",
        ),
        card(
            "مباعة",
            figures.sold.to_string(),
            "من المخزون",
            Variant::Info,
            "car",
        ),
        card(
            if see_profit { "إيرادات (كل المبيعات)" } else { "إيراداتك" },
            format_money_ils(Some(figures.revenue_total)),
            &format!("هذا الشهر: {}", format_money_ils(Some(figures.revenue_month))),
            Variant::Ok,
            "badge-dollar-sign",
        ),
    ];

    if see_profit {
        cards.push(card(
            "الربح التقريبي",
            format_money_ils(figures.profit_total),
            "(إيرادات - تكاليف داخلية)",
            Variant::Info,
            "trending-up",
        ));
    } else {
        cards.push(card(
            "ملاحظة",
            "المبيعات".to_string(),
            "لن ترى أسعار الشراء/المصاريف الداخلية",
            Variant::Warn,
            "users-round",
        ));
    }
    cards
}

pub struct DashboardController<'a> {
    session: &'a Session,
    config: &'a AppConfig,
}

impl<'a> DashboardController<'a> {
    pub fn new(session: &'a Session, config: &'a AppConfig) -> Self {
        Self { session, config }
    }

    async fn count_status(&self, status: CarStatus) -> Result<u64, BackendError> {
        let query = Query::table(CARS_TABLE).select("id").eq("status", status);
        self.session.backend.count(&query).await
    }

    async fn sum(&self, function: &str) -> Result<f64, BackendError> {
        let value: Value = self.session.backend.rpc(function, &json!({})).await?;
        Ok(amount(&value))
    }

    async fn figures(&self) -> Result<Figures, BackendError> {
        let see_profit = self.session.can(Permission::SeeProfit);
        Ok(Figures {
            available: self.count_status(CarStatus::Available).await?,
            reserved: self.count_status(CarStatus::Reserved).await?,
            sold: self.count_status(CarStatus::Sold).await?,
            revenue_total: self.sum("sales_sum_total").await?,
            revenue_month: self.sum("sales_sum_this_month").await?,
            profit_total: if see_profit {
                Some(self.sum("profit_sum_total").await?)
            } else {
                None
            },
        })
    }

    pub async fn load(&self) -> Result<Dashboard, ApiError> {
        let figures = self.figures().await?;

        let query = Query::table("sales_list_view")
            .select(RECENT_SALES_COLUMNS)
            .order("sold_at", false)
            .limit(self.config.recent_sales_limit);
        let rows: Vec<SaleListRow> = self.session.backend.select(&query).await?;
        let recent_sales: Vec<SaleLine> = rows.into_iter().map(SaleLine::from).collect();

        let name = self.session.profile.full_name.as_deref().unwrap_or_default();
        Ok(Dashboard {
            title: "لوحة التحكم".to_string(),
            subtitle: format!("مرحبًا {name} — دورك: {}", self.session.role.label()),
            kpis: kpi_cards(&figures, self.session.can(Permission::SeeProfit)),
            empty_state: EmptyState::when_empty(&recent_sales, || {
                EmptyState::new("آخر المبيعات", "لا يوجد مبيعات بعد.", None)
            }),
            recent_sales,
        })
    }
}
