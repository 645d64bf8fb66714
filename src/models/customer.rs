use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Validate, ValidationError, require_text};
use crate::format::{non_blank, safe_text};

static EMAIL_SHAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Loose `local@domain.tld` shape check.
pub(crate) fn looks_like_email(value: &str) -> bool {
    EMAIL_SHAPE
        .as_ref()
        .map(|re| re.is_match(value))
        .unwrap_or(true)
}

/// A row of the `customers` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Validate for Customer {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text(
            &[("full_name", &self.full_name)],
            "customer row is missing full_name",
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CustomerDraft {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Normalized `customers` write payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerPayload {
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
}

impl CustomerDraft {
    pub fn into_payload(self) -> Result<CustomerPayload, ValidationError> {
        let full_name = safe_text(self.full_name.as_deref());
        require_text(&[("full_name", &full_name)], "customer name is required")?;

        let email = non_blank(self.email.as_deref());
        if let Some(email) = email.as_deref()
            && !looks_like_email(email)
        {
            return Err(ValidationError::field(
                "email",
                format!("'{email}' is not an email address"),
            ));
        }

        Ok(CustomerPayload {
            full_name,
            phone: non_blank(self.phone.as_deref()),
            email,
            city: non_blank(self.city.as_deref()),
            notes: non_blank(self.notes.as_deref()),
        })
    }
}
