use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::customer::looks_like_email;
use super::{Validate, ValidationError, require_text};
use crate::format::{non_blank, safe_text};

/// A row of the `suppliers` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Supplier {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Validate for Supplier {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&[("name", &self.name)], "supplier row is missing name")
    }
}

/// Supplier entry for the car form's supplier picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SupplierOption {
    pub id: Uuid,
    pub company: Option<String>,
}

impl Validate for SupplierOption {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SupplierDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierPayload {
    pub name: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

impl SupplierDraft {
    pub fn into_payload(self) -> Result<SupplierPayload, ValidationError> {
        let name = safe_text(self.name.as_deref());
        require_text(&[("name", &name)], "supplier name is required")?;

        let email = non_blank(self.email.as_deref());
        if let Some(email) = email.as_deref()
            && !looks_like_email(email)
        {
            return Err(ValidationError::field(
                "email",
                format!("'{email}' is not an email address"),
            ));
        }

        Ok(SupplierPayload {
            name,
            company: non_blank(self.company.as_deref()),
            phone: non_blank(self.phone.as_deref()),
            email,
            notes: non_blank(self.notes.as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required() {
        let err = SupplierDraft {
            company: Some("Auto Import Ltd".to_string()),
            ..SupplierDraft::default()
        }
        .into_payload()
        .unwrap_err();
        assert!(err.fields.contains_key("name"));
    }

    #[test]
    fn draft_is_trimmed() {
        let payload = SupplierDraft {
            name: Some(" Yossi ".to_string()),
            company: Some(" Auto Import Ltd ".to_string()),
            notes: Some(" ".to_string()),
            ..SupplierDraft::default()
        }
        .into_payload()
        .unwrap();
        assert_eq!(payload.name, "Yossi");
        assert_eq!(payload.company.as_deref(), Some("Auto Import Ltd"));
        assert_eq!(payload.notes, None);
    }
}
