//! # Data Models
//!
//! Typed records for every resource the back office reads from the backend,
//! plus the drafts the UI submits. Rows are validated when they cross the
//! backend boundary so controllers never see a half-filled record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub mod car;
pub mod customer;
pub mod profile;
pub mod sale;
pub mod supplier;

pub use car::{Car, CarDetails, CarDraft, CarFinance, CarStatus};
pub use customer::{Customer, CustomerDraft};
pub use profile::{Profile, Role};
pub use sale::{PaymentMethod, SaleDraft, SaleListRow};
pub use supplier::{Supplier, SupplierDraft};

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "showroom".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A record or draft that failed its field checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    /// Field name -> problem.
    pub fields: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Single-field failure; the problem doubles as the message.
    pub fn field(field: &str, problem: impl Into<String>) -> Self {
        let problem = problem.into();
        Self::new(problem.clone()).with_field(field, problem)
    }

    pub fn with_field(mut self, field: &str, problem: impl Into<String>) -> Self {
        self.fields.insert(field.to_string(), problem.into());
        self
    }
}

/// Field-level checks applied to rows read from the backend.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Collects missing required text fields into one error.
pub(crate) fn require_text(
    fields: &[(&str, &str)],
    message: &str,
) -> Result<(), ValidationError> {
    let mut error = ValidationError::new(message);
    for (name, value) in fields {
        if value.trim().is_empty() {
            error = error.with_field(name, "required");
        }
    }
    if error.fields.is_empty() {
        Ok(())
    } else {
        Err(error)
    }
}
