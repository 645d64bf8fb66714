//! Suppliers page. Every operation is admin-only.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::EmptyState;
use crate::auth::{Permission, Session};
use crate::backend::Query;
use crate::error::{ApiError, not_found};
use crate::models::{Supplier, SupplierDraft};

const TABLE: &str = "suppliers";
const COLUMNS: &str = "id,name,company,phone,email,notes,created_at";
const SEARCH_COLUMNS: [&str; 4] = ["name", "company", "phone", "email"];

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SupplierList {
    pub suppliers: Vec<Supplier>,
    pub empty_state: Option<EmptyState>,
}

pub struct SupplierController<'a> {
    session: &'a Session,
}

impl<'a> SupplierController<'a> {
    /// Fails with 403 unless the caller may manage suppliers.
    pub fn new(session: &'a Session) -> Result<Self, ApiError> {
        session.require(Permission::ManageSuppliers)?;
        Ok(Self { session })
    }

    pub async fn list(&self, search: &str) -> Result<SupplierList, ApiError> {
        let query = Query::table(TABLE)
            .select(COLUMNS)
            .search_any(&SEARCH_COLUMNS, search)
            .order("created_at", false);
        let suppliers: Vec<Supplier> = self.session.backend.select(&query).await?;
        Ok(SupplierList {
            empty_state: EmptyState::when_empty(&suppliers, || {
                EmptyState::new("لا يوجد موردين", "ابدأ بإضافة أول مورد.", Some("إضافة مورد"))
            }),
            suppliers,
        })
    }

    pub async fn create(&self, draft: SupplierDraft) -> Result<Supplier, ApiError> {
        let payload = draft.into_payload()?;
        let supplier: Supplier = self.session.backend.insert(TABLE, &payload).await?;
        tracing::info!(supplier_id = %supplier.id, "Supplier created");
        Ok(supplier)
    }

    pub async fn update(&self, id: Uuid, draft: SupplierDraft) -> Result<Supplier, ApiError> {
        let payload = draft.into_payload()?;
        let query = Query::table(TABLE).select(COLUMNS).eq("id", id);
        let updated: Vec<Supplier> = self.session.backend.update(&query, &payload).await?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| not_found("Supplier"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.session
            .backend
            .delete(&Query::table(TABLE).eq("id", id))
            .await?;
        tracing::info!(supplier_id = %id, "Supplier deleted");
        Ok(())
    }
}
