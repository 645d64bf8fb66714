//! # Authentication and Authorization
//!
//! Resolves the caller of a protected endpoint into a [`Session`]: the
//! access token is checked with the backend's auth service, the user's
//! `profiles` row supplies the role, and the role decides which
//! [`Permission`]s the handlers grant.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::backend::{AuthUser, BackendClient, Query};
use crate::error::{ApiError, config_missing, forbidden, role_not_assigned, unauthorized};
use crate::models::{Profile, Role};
use crate::server::AppState;

/// Something a role may or may not do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ManageCars,
    ViewFullFinance,
    ManageSuppliers,
    CreateCustomers,
    ManageCustomers,
    RecordSales,
    DeleteSales,
    SeeProfit,
}

impl Permission {
    pub fn granted_to(self, role: Role) -> bool {
        match self {
            Permission::CreateCustomers | Permission::RecordSales => true,
            Permission::ManageCars
            | Permission::ViewFullFinance
            | Permission::ManageSuppliers
            | Permission::ManageCustomers
            | Permission::DeleteSales
            | Permission::SeeProfit => role == Role::Admin,
        }
    }

    fn denial(self) -> &'static str {
        match self {
            Permission::ManageCars => "Only admins can change cars",
            Permission::ViewFullFinance => "Only admins can see car finance",
            Permission::ManageSuppliers => "Only admins can manage suppliers",
            Permission::CreateCustomers => "Not allowed to add customers",
            Permission::ManageCustomers => "Only admins can edit or delete customers",
            Permission::RecordSales => "Not allowed to record sales",
            Permission::DeleteSales => "Only admins can delete sales",
            Permission::SeeProfit => "Only admins can see profit",
        }
    }
}

/// Permission table for one role, as the UI consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Permissions {
    pub view_cars: bool,
    pub manage_cars: bool,
    pub view_full_finance: bool,
    pub manage_suppliers: bool,
    pub create_customers: bool,
    pub manage_customers: bool,
    pub record_sales: bool,
    pub delete_sales: bool,
    pub see_profit: bool,
}

impl Permissions {
    pub fn for_role(role: Role) -> Self {
        Self {
            view_cars: true,
            manage_cars: Permission::ManageCars.granted_to(role),
            view_full_finance: Permission::ViewFullFinance.granted_to(role),
            manage_suppliers: Permission::ManageSuppliers.granted_to(role),
            create_customers: Permission::CreateCustomers.granted_to(role),
            manage_customers: Permission::ManageCustomers.granted_to(role),
            record_sales: Permission::RecordSales.granted_to(role),
            delete_sales: Permission::DeleteSales.granted_to(role),
            see_profit: Permission::SeeProfit.granted_to(role),
        }
    }
}

/// An authenticated caller with a role, plus a backend client acting as them.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: AuthUser,
    pub profile: Profile,
    pub role: Role,
    pub backend: BackendClient,
}

impl Session {
    pub fn can(&self, permission: Permission) -> bool {
        permission.granted_to(self.role)
    }

    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if self.can(permission) {
            Ok(())
        } else {
            tracing::info!(user_id = %self.user.id, role = self.role.as_str(), ?permission, "Permission denied");
            Err(forbidden(Some(permission.denial())))
        }
    }
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))?
        .trim();

    if token.is_empty() {
        return Err(unauthorized(Some("Empty bearer token")));
    }
    Ok(token)
}

/// Loads the caller's profile and role with a client already carrying their token.
pub async fn resolve_session(backend: BackendClient) -> Result<Session, ApiError> {
    let user = backend.current_user().await.map_err(|err| match err.status() {
        Some(401 | 403) => unauthorized(Some("Invalid or expired access token")),
        _ => ApiError::from(err),
    })?;

    let query = Query::table("profiles")
        .select("id,full_name,role")
        .eq("id", user.id);
    let profile = backend
        .select_one::<Profile>(&query)
        .await?
        .ok_or_else(|| {
            tracing::warn!(user_id = %user.id, "No profile row for user");
            role_not_assigned()
        })?;

    let role = profile.role.ok_or_else(|| {
        tracing::warn!(user_id = %user.id, "Profile has no role");
        role_not_assigned()
    })?;

    tracing::debug!(user_id = %user.id, role = role.as_str(), "Session resolved");
    Ok(Session {
        user,
        profile,
        role,
        backend,
    })
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let backend = state.backend.as_ref().ok_or_else(config_missing)?;
        let token = extract_bearer_token(&parts.headers)?;
        resolve_session(backend.authorized(token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn malformed_authorization_is_401() {
        assert_eq!(
            extract_bearer_token(&HeaderMap::new()).unwrap_err().status,
            axum::http::StatusCode::UNAUTHORIZED
        );
        assert!(extract_bearer_token(&headers("Basic dGVzdDoxMjM=")).is_err());
        assert!(extract_bearer_token(&headers("Bearer   ")).is_err());
    }

    #[test]
    fn permission_table_matches_roles() {
        let admin = Permissions::for_role(Role::Admin);
        assert!(admin.manage_cars && admin.manage_suppliers && admin.see_profit);
        assert!(admin.delete_sales && admin.manage_customers);

        let sales = Permissions::for_role(Role::Sales);
        assert!(sales.view_cars);
        assert!(sales.create_customers);
        assert!(sales.record_sales);
        assert!(!sales.manage_cars);
        assert!(!sales.view_full_finance);
        assert!(!sales.manage_suppliers);
        assert!(!sales.manage_customers);
        assert!(!sales.delete_sales);
        assert!(!sales.see_profit);
    }
}
