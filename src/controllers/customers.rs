//! Customers page.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::EmptyState;
use crate::auth::{Permission, Session};
use crate::backend::Query;
use crate::error::{ApiError, not_found};
use crate::models::{Customer, CustomerDraft};

const TABLE: &str = "customers";
const COLUMNS: &str = "id,full_name,phone,email,city,notes,created_at";
const SEARCH_COLUMNS: [&str; 4] = ["full_name", "phone", "email", "city"];

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerList {
    pub customers: Vec<Customer>,
    pub empty_state: Option<EmptyState>,
}

pub(crate) fn list_query(search: &str) -> Query {
    Query::table(TABLE)
        .select(COLUMNS)
        .search_any(&SEARCH_COLUMNS, search)
        .order("created_at", false)
}

fn empty_state(session: &Session) -> EmptyState {
    if session.can(Permission::CreateCustomers) {
        EmptyState::new("لا يوجد زباين", "ابدأ بإضافة أول زبون.", Some("إضافة زبون"))
    } else {
        EmptyState::new("لا يوجد زباين", "لا تملك صلاحية إضافة زباين.", None)
    }
}

pub struct CustomerController<'a> {
    session: &'a Session,
}

impl<'a> CustomerController<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Newest first, optionally narrowed by a case-insensitive search.
    pub async fn list(&self, search: &str) -> Result<CustomerList, ApiError> {
        let customers: Vec<Customer> = self.session.backend.select(&list_query(search)).await?;
        Ok(CustomerList {
            empty_state: EmptyState::when_empty(&customers, || empty_state(self.session)),
            customers,
        })
    }

    pub async fn create(&self, draft: CustomerDraft) -> Result<Customer, ApiError> {
        self.session.require(Permission::CreateCustomers)?;
        let payload = draft.into_payload()?;
        let customer: Customer = self.session.backend.insert(TABLE, &payload).await?;
        tracing::info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn update(&self, id: Uuid, draft: CustomerDraft) -> Result<Customer, ApiError> {
        self.session.require(Permission::ManageCustomers)?;
        let payload = draft.into_payload()?;
        let query = Query::table(TABLE).select(COLUMNS).eq("id", id);
        let updated: Vec<Customer> = self.session.backend.update(&query, &payload).await?;
        let customer = updated
            .into_iter()
            .next()
            .ok_or_else(|| not_found("Customer"))?;
        tracing::info!(customer_id = %id, "Customer updated");
        Ok(customer)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.session.require(Permission::ManageCustomers)?;
        self.session
            .backend
            .delete(&Query::table(TABLE).eq("id", id))
            .await?;
        tracing::info!(customer_id = %id, "Customer deleted");
        Ok(())
    }
}
