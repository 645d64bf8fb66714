use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Validate, ValidationError};

/// Back-office role. A profile whose role is missing or unrecognized has no role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Sales,
}

impl Role {
    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "sales" => Some(Role::Sales),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Sales => "sales",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "مدير",
            Role::Sales => "مبيعات",
        }
    }
}

fn optional_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Role::parse))
}

/// A row of the `profiles` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "optional_role")]
    pub role: Option<Role>,
}

impl Validate for Profile {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}
