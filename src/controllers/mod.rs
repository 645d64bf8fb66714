//! # Page Controllers
//!
//! One controller per back-office page. A controller borrows the caller's
//! [`Session`](crate::auth::Session) and the application config, performs
//! the page's backend calls in order, and returns a response shaped for the
//! page: records with display strings, an explicit empty state, and notices
//! for side effects that failed without failing the request.

use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::backend::BackendError;
use crate::format::Variant;

pub mod cars;
pub mod customers;
pub mod dashboard;
pub mod sales;
pub mod suppliers;

pub use cars::CarController;
pub use customers::CustomerController;
pub use dashboard::DashboardController;
pub use sales::SaleController;
pub use suppliers::SupplierController;

/// A message for the user that does not fail the request.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Notice {
    pub variant: Variant,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Notice {
    /// Warning about a failed side effect; the backend error goes in `details`.
    pub fn warn(message: impl Into<String>, error: &BackendError) -> Self {
        Self {
            variant: Variant::Warn,
            message: message.into(),
            details: Some(json!({
                "code": error.code(),
                "status": error.status(),
                "error": error.to_string(),
            })),
        }
    }
}

/// A written record plus whatever went wrong around it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Saved<T> {
    pub record: T,
    pub notices: Vec<Notice>,
}

/// What a list page shows instead of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EmptyState {
    pub title: String,
    pub description: String,
    /// Label of the primary action, when the caller may take it.
    pub action_label: Option<String>,
}

impl EmptyState {
    pub fn new(title: &str, description: &str, action_label: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            action_label: action_label.map(str::to_string),
        }
    }

    /// `Some(state)` only when there is nothing to show.
    pub(crate) fn when_empty<T>(rows: &[T], state: impl FnOnce() -> Self) -> Option<Self> {
        rows.is_empty().then(state)
    }
}

/// How a card's icon is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Icon {
    /// A ready-made element, drawn as given.
    Element { name: String },
    /// A component rendered at `size` pixels.
    Render { name: String, size: u16 },
    None,
}

impl Icon {
    pub fn render(name: &str) -> Self {
        Icon::Render {
            name: name.to_string(),
            size: 18,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct KpiCard {
    pub label: String,
    pub value: String,
    pub hint: Option<String>,
    pub variant: Variant,
    pub icon: Icon,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_is_tagged_by_kind() {
        assert_eq!(
            serde_json::to_value(Icon::render("car")).unwrap(),
            json!({"kind": "render", "name": "car", "size": 18})
        );
        assert_eq!(
            serde_json::to_value(Icon::Element {
                name: "badge".into()
            })
            .unwrap(),
            json!({"kind": "element", "name": "badge"})
        );
        assert_eq!(
            serde_json::to_value(Icon::None).unwrap(),
            json!({"kind": "none"})
        );
    }

    #[test]
    fn empty_state_only_for_empty_rows() {
        let state = || EmptyState::new("t", "d", None);
        assert!(EmptyState::when_empty::<u8>(&[], state).is_some());
        assert!(EmptyState::when_empty(&[1u8], state).is_none());
    }

    #[test]
    fn warn_notice_carries_backend_error() {
        let notice = Notice::warn(
            "image failed",
            &BackendError::schema("car_images", None, "bad"),
        );
        assert_eq!(notice.variant, Variant::Warn);
        assert!(notice.details.unwrap()["error"].is_string());
    }
}
