//! Backend failure taxonomy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::ValidationError;

/// Postgres "undefined table", returned when the schema was never applied.
pub const PG_UNDEFINED_TABLE: &str = "42P01";

const SNIPPET_CHARS: usize = 200;

/// Error body as the backend reports it. PostgREST, auth and storage each
/// use slightly different keys, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BackendFault {
    /// Backend error code (Postgres SQLSTATE or service code)
    pub code: Option<String>,
    pub message: String,
    pub details: Option<String>,
    pub hint: Option<String>,
    /// Raw response body, truncated
    pub body_snippet: Option<String>,
}

impl BackendFault {
    /// Parses an error response body, falling back to the raw text.
    pub fn from_body(body: &str) -> Self {
        let snippet = truncate(body);
        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let Some(obj) = parsed.as_ref().and_then(|v| v.as_object()) else {
            return Self {
                message: snippet.clone().unwrap_or_default(),
                body_snippet: snippet,
                ..Self::default()
            };
        };

        let text = |key: &str| -> Option<String> {
            match obj.get(key)? {
                serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };

        Self {
            code: text("code").or_else(|| text("error_code")),
            message: text("message")
                .or_else(|| text("msg"))
                .or_else(|| text("error_description"))
                .or_else(|| text("error"))
                .unwrap_or_default(),
            details: text("details"),
            hint: text("hint"),
            body_snippet: snippet,
        }
    }
}

fn truncate(body: &str) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    if body.chars().count() > SNIPPET_CHARS {
        let cut: String = body.chars().take(SNIPPET_CHARS).collect();
        Some(format!("{cut}..."))
    } else {
        Some(body.to_string())
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-success status.
    #[error("{operation} failed with status {status}: {}", fault.message)]
    Api {
        operation: String,
        status: u16,
        fault: BackendFault,
    },
    /// The request never produced a response.
    #[error("{operation} could not reach the backend: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
    /// A row or response did not have the expected shape.
    #[error("unexpected {resource} data{}: {message}", row.map(|r| format!(" at row {r}")).unwrap_or_default())]
    Schema {
        resource: String,
        row: Option<usize>,
        message: String,
        fields: BTreeMap<String, String>,
    },
}

impl BackendError {
    pub fn schema(resource: &str, row: Option<usize>, message: impl Into<String>) -> Self {
        BackendError::Schema {
            resource: resource.to_string(),
            row,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub(crate) fn invalid_row(resource: &str, row: usize, error: ValidationError) -> Self {
        BackendError::Schema {
            resource: resource.to_string(),
            row: Some(row),
            message: error.message,
            fields: error.fields,
        }
    }

    /// HTTP status reported by the backend, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Backend error code, e.g. a Postgres SQLSTATE.
    pub fn code(&self) -> Option<&str> {
        match self {
            BackendError::Api { fault, .. } => fault.code.as_deref(),
            _ => None,
        }
    }

    pub fn is_missing_relation(&self) -> bool {
        self.code().is_some_and(|code| code.contains(PG_UNDEFINED_TABLE))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgrest_body_is_parsed() {
        let fault = BackendFault::from_body(
            r#"{"code":"42P01","message":"relation \"public.profiles\" does not exist","details":null,"hint":null}"#,
        );
        assert_eq!(fault.code.as_deref(), Some("42P01"));
        assert!(fault.message.contains("profiles"));
        assert_eq!(fault.details, None);
        assert!(fault.body_snippet.is_some());
    }

    #[test]
    fn auth_and_storage_bodies_are_parsed() {
        let fault = BackendFault::from_body(r#"{"code":401,"msg":"invalid JWT"}"#);
        assert_eq!(fault.code.as_deref(), Some("401"));
        assert_eq!(fault.message, "invalid JWT");

        let fault =
            BackendFault::from_body(r#"{"statusCode":"403","error":"Unauthorized","message":"new row violates policy"}"#);
        assert_eq!(fault.message, "new row violates policy");
    }

    #[test]
    fn non_json_body_becomes_message() {
        let fault = BackendFault::from_body("upstream timeout");
        assert_eq!(fault.message, "upstream timeout");
        assert_eq!(fault.code, None);
    }

    #[test]
    fn snippet_is_truncated_on_char_boundary() {
        let body = "ש".repeat(250);
        let fault = BackendFault::from_body(&body);
        let snippet = fault.body_snippet.unwrap();
        assert!(snippet.ends_with("..."));
        assert_eq!(snippet.chars().count(), SNIPPET_CHARS + 3);
    }

    #[test]
    fn missing_relation_is_detected() {
        let err = BackendError::Api {
            operation: "select:profiles".to_string(),
            status: 404,
            fault: BackendFault {
                code: Some("42P01".to_string()),
                ..BackendFault::default()
            },
        };
        assert!(err.is_missing_relation());
        assert!(err.is_not_found());
        assert!(err.to_string().contains("select:profiles"));

        let schema = BackendError::schema("cars", Some(3), "missing make");
        assert_eq!(schema.to_string(), "unexpected cars data at row 3: missing make");
    }
}
