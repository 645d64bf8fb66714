use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Validate, ValidationError};
use crate::format::{self, lenient_number, non_blank, number_or_zero};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Bank,
    Credit,
    Check,
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Bank,
        PaymentMethod::Credit,
        PaymentMethod::Check,
        PaymentMethod::Other,
    ];

    /// Reads a stored method regardless of case; `None` for anything unknown.
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(text))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Bank => "bank",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Check => "check",
            PaymentMethod::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "كاش",
            PaymentMethod::Bank => "تحويل بنكي",
            PaymentMethod::Credit => "بطاقة",
            PaymentMethod::Check => "شيك",
            PaymentMethod::Other => "أخرى",
        }
    }
}

/// A row of `sales_list_view`: the sale joined with car, customer and salesperson names.
///
/// `payment_method` is free text in storage and is kept as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SaleListRow {
    pub id: Uuid,
    pub sold_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub sold_price: f64,
    pub payment_method: Option<String>,
    pub car_title: Option<String>,
    pub customer_name: Option<String>,
    pub sales_user_name: Option<String>,
    pub salesperson_id: Option<Uuid>,
}

impl SaleListRow {
    /// Arabic label for a known method, the stored text otherwise, `-` when blank.
    pub fn payment_label(&self) -> String {
        let Some(raw) = non_blank(self.payment_method.as_deref()) else {
            return "-".to_string();
        };
        match PaymentMethod::from_text(&raw) {
            Some(method) => method.label().to_string(),
            None => raw,
        }
    }
}

impl Validate for SaleListRow {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.sold_price.is_finite() {
            return Err(ValidationError::field(
                "sold_price",
                "sold price is not a number",
            ));
        }
        Ok(())
    }
}

/// Sale row with display strings attached.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SaleLine {
    #[serde(flatten)]
    pub sale: SaleListRow,
    pub sold_at_label: String,
    pub price_label: String,
    pub payment_label: String,
}

impl From<SaleListRow> for SaleLine {
    fn from(sale: SaleListRow) -> Self {
        Self {
            sold_at_label: format::fmt_date_time_24(sale.sold_at.as_ref()),
            price_label: format::format_money_ils(Some(sale.sold_price)),
            payment_label: sale.payment_label(),
            sale,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SaleDraft {
    #[serde(default)]
    pub car_id: Option<Uuid>,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sold_price: Option<f64>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub sold_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Normalized `sales` insert payload. `salesperson_id` is left to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SalePayload {
    pub car_id: Uuid,
    pub customer_id: Uuid,
    pub sold_price: f64,
    pub payment_method: PaymentMethod,
    pub sold_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl SaleDraft {
    /// Whether the sold price has to be filled from the car's asking price.
    pub fn needs_price(&self) -> bool {
        self.sold_price.is_none()
    }

    /// Validates the draft; `asking_price` stands in for a missing sold price.
    pub fn into_payload(
        self,
        asking_price: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<SalePayload, ValidationError> {
        let car_id = self
            .car_id
            .ok_or_else(|| ValidationError::field("car_id", "choose a car"))?;
        let customer_id = self
            .customer_id
            .ok_or_else(|| ValidationError::field("customer_id", "choose a customer"))?;

        let sold_price = self.sold_price.or(asking_price).unwrap_or(0.0);
        if !sold_price.is_finite() || sold_price <= 0.0 {
            return Err(ValidationError::field(
                "sold_price",
                "sold price must be greater than zero",
            ));
        }

        Ok(SalePayload {
            car_id,
            customer_id,
            sold_price,
            payment_method: self.payment_method.unwrap_or_default(),
            sold_at: self.sold_at.unwrap_or(now),
            notes: non_blank(self.notes.as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ids() -> (Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn defaults_fill_price_method_and_time() {
        let (car, customer) = ids();
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let draft = SaleDraft {
            car_id: Some(car),
            customer_id: Some(customer),
            notes: Some("  ".to_string()),
            ..SaleDraft::default()
        };
        assert!(draft.needs_price());

        let payload = draft.into_payload(Some(64000.0), now).unwrap();
        assert_eq!(payload.sold_price, 64000.0);
        assert_eq!(payload.payment_method, PaymentMethod::Cash);
        assert_eq!(payload.sold_at, now);
        assert_eq!(payload.notes, None);
    }

    #[test]
    fn explicit_price_wins_over_asking_price() {
        let (car, customer) = ids();
        let payload = SaleDraft {
            car_id: Some(car),
            customer_id: Some(customer),
            sold_price: Some(60000.0),
            payment_method: Some(PaymentMethod::Bank),
            ..SaleDraft::default()
        }
        .into_payload(Some(64000.0), Utc::now())
        .unwrap();
        assert_eq!(payload.sold_price, 60000.0);
        assert_eq!(payload.payment_method, PaymentMethod::Bank);
    }

    #[test]
    fn car_customer_and_positive_price_are_required() {
        let (car, customer) = ids();
        let err = SaleDraft::default().into_payload(None, Utc::now()).unwrap_err();
        assert!(err.fields.contains_key("car_id"));

        let err = SaleDraft {
            car_id: Some(car),
            ..SaleDraft::default()
        }
        .into_payload(None, Utc::now())
        .unwrap_err();
        assert!(err.fields.contains_key("customer_id"));

        let err = SaleDraft {
            car_id: Some(car),
            customer_id: Some(customer),
            sold_price: Some(0.0),
            ..SaleDraft::default()
        }
        .into_payload(Some(50000.0), Utc::now())
        .unwrap_err();
        assert!(err.fields.contains_key("sold_price"));

        let err = SaleDraft {
            car_id: Some(car),
            customer_id: Some(customer),
            ..SaleDraft::default()
        }
        .into_payload(None, Utc::now())
        .unwrap_err();
        assert!(err.fields.contains_key("sold_price"));
    }

    #[test]
    fn sale_line_labels() {
        let row: SaleListRow = serde_json::from_value(serde_json::json!({
            "id": "0b8a1c8e-5a5f-4a62-9d36-1d5c1f1c0c01",
            "sold_at": "2025-01-15T09:30:00Z",
            "sold_price": 72000,
            "payment_method": "check",
            "car_title": "Kia Sportage 2020"
        }))
        .unwrap();
        let line = SaleLine::from(row);
        assert_eq!(line.price_label, "₪72,000");
        assert_eq!(line.payment_label, "شيك");
        assert_eq!(line.sold_at_label, "15/01/2025 09:30");
    }

    #[test]
    fn legacy_rows_decode_with_raw_method_and_null_price() {
        let rows = vec![
            serde_json::json!({
                "id": "0b8a1c8e-5a5f-4a62-9d36-1d5c1f1c0c02",
                "sold_price": null,
                "payment_method": "Cash"
            }),
            serde_json::json!({
                "id": "0b8a1c8e-5a5f-4a62-9d36-1d5c1f1c0c03",
                "sold_price": "41000",
                "payment_method": "installments"
            }),
            serde_json::json!({
                "id": "0b8a1c8e-5a5f-4a62-9d36-1d5c1f1c0c04",
                "sold_price": 9000,
                "payment_method": "  "
            }),
        ];

        let rows = crate::backend::decode_rows::<SaleListRow>("sales_list_view", rows).unwrap();

        assert_eq!(rows[0].sold_price, 0.0);
        assert_eq!(rows[0].payment_label(), "كاش");
        assert_eq!(rows[1].sold_price, 41000.0);
        assert_eq!(rows[1].payment_label(), "installments");
        assert_eq!(rows[2].payment_label(), "-");
    }

    #[test]
    fn payment_method_text_is_case_insensitive() {
        assert_eq!(PaymentMethod::from_text(" BANK "), Some(PaymentMethod::Bank));
        assert_eq!(PaymentMethod::from_text("wire"), None);
    }
}
