//! # Backend Client
//!
//! Typed client for the hosted data backend: PostgREST tables and RPCs under
//! `/rest/v1`, object storage under `/storage/v1` and the auth service under
//! `/auth/v1`.
//!
//! One [`BackendClient`] is built at startup from [`BackendConfig`] and shared
//! through the application state. Handlers call [`BackendClient::authorized`]
//! to get a cheap clone that carries the caller's access token, so the
//! backend's row-level policies decide what each user may see.
//!
//! Every row read through the client is decoded into a typed record and
//! checked with [`Validate`]; a bad row becomes [`BackendError::Schema`]
//! naming the resource and row index.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::models::Validate;

pub mod auth;
pub mod error;
pub mod query;
pub mod storage;

pub use auth::AuthUser;
pub use error::{BackendError, BackendFault};
pub use query::{FilterValue, Query};

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: Url,
    pub anon_key: String,
    pub timeout: Duration,
    pub bucket: String,
}

impl BackendConfig {
    /// Absolute URL for a backend path such as `rest/v1/cars`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: Arc<BackendConfig>,
    bearer: Option<Arc<str>>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("url", &self.config.url.as_str())
            .field("authorized", &self.bearer.is_some())
            .finish()
    }
}

fn record(operation: &str, outcome: &'static str) {
    counter!(
        "backend_requests_total",
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| BackendError::Transport {
                operation: "client:build".to_string(),
                source,
            })?;
        Ok(Self {
            http,
            config: Arc::new(config),
            bearer: None,
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Clone that sends `token` instead of the public key as its bearer.
    pub fn authorized(&self, token: &str) -> Self {
        Self {
            http: self.http.clone(),
            config: Arc::clone(&self.config),
            bearer: Some(Arc::from(token)),
        }
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let bearer = self.bearer.as_deref().unwrap_or(&self.config.anon_key);
        self.http
            .request(method, self.config.endpoint(path))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    /// Sends the request and turns non-success statuses into [`BackendError::Api`].
    pub(crate) async fn send(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Response, BackendError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => {
                record(operation, "transport_error");
                tracing::warn!(operation, error = %source, "Backend request failed to send");
                return Err(BackendError::Transport {
                    operation: operation.to_string(),
                    source,
                });
            }
        };

        let status = response.status();
        if status.is_success() {
            record(operation, "ok");
            tracing::debug!(operation, status = status.as_u16(), "Backend request succeeded");
            return Ok(response);
        }

        record(operation, "error");
        let body = response.text().await.unwrap_or_default();
        let fault = BackendFault::from_body(&body);
        tracing::warn!(
            operation,
            status = status.as_u16(),
            code = fault.code.as_deref().unwrap_or(""),
            message = %fault.message,
            "Backend request returned an error"
        );
        Err(BackendError::Api {
            operation: operation.to_string(),
            status: status.as_u16(),
            fault,
        })
    }

    async fn rows<T>(&self, resource: &str, response: Response) -> Result<Vec<T>, BackendError>
    where
        T: DeserializeOwned + Validate,
    {
        let values: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|err| BackendError::schema(resource, None, err.to_string()))?;
        decode_rows(resource, values)
    }

    fn rest(&self, method: Method, query: &Query) -> RequestBuilder {
        self.request(method, &format!("rest/v1/{}", query.table_name()))
            .query(query.params())
    }

    /// Runs a select and decodes every row.
    pub async fn select<T>(&self, query: &Query) -> Result<Vec<T>, BackendError>
    where
        T: DeserializeOwned + Validate,
    {
        let operation = format!("select:{}", query.table_name());
        let response = self.send(&operation, self.rest(Method::GET, query)).await?;
        self.rows(query.table_name(), response).await
    }

    /// First row of a select, `None` when nothing matched.
    pub async fn select_one<T>(&self, query: &Query) -> Result<Option<T>, BackendError>
    where
        T: DeserializeOwned + Validate,
    {
        let rows = self.select(&query.clone().limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Exact row count without transferring rows.
    pub async fn count(&self, query: &Query) -> Result<u64, BackendError> {
        let operation = format!("count:{}", query.table_name());
        let request = self
            .rest(Method::HEAD, query)
            .header("Prefer", "count=exact");
        let response = self.send(&operation, request).await?;
        let range = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        parse_content_range(range).ok_or_else(|| {
            BackendError::schema(
                query.table_name(),
                None,
                format!("unreadable content-range '{range}'"),
            )
        })
    }

    /// Inserts one row and returns it as stored.
    pub async fn insert<P, T>(&self, table: &str, payload: &P) -> Result<T, BackendError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned + Validate,
    {
        let operation = format!("insert:{table}");
        let request = self
            .request(Method::POST, &format!("rest/v1/{table}"))
            .header("Prefer", "return=representation")
            .json(payload);
        let response = self.send(&operation, request).await?;
        self.rows(table, response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::schema(table, None, "insert returned no row"))
    }

    /// Inserts without reading the row back.
    pub async fn insert_quiet<P>(&self, table: &str, payload: &P) -> Result<(), BackendError>
    where
        P: Serialize + ?Sized,
    {
        let operation = format!("insert:{table}");
        let request = self
            .request(Method::POST, &format!("rest/v1/{table}"))
            .header("Prefer", "return=minimal")
            .json(payload);
        self.send(&operation, request).await?;
        Ok(())
    }

    /// Patches every row matching `query` and returns the updated rows.
    pub async fn update<P, T>(&self, query: &Query, payload: &P) -> Result<Vec<T>, BackendError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned + Validate,
    {
        let operation = format!("update:{}", query.table_name());
        let request = self
            .rest(Method::PATCH, query)
            .header("Prefer", "return=representation")
            .json(payload);
        let response = self.send(&operation, request).await?;
        self.rows(query.table_name(), response).await
    }

    fn upsert_request(&self, table: &str, on_conflict: &str, prefer: &str) -> RequestBuilder {
        self.request(Method::POST, &format!("rest/v1/{table}"))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", format!("resolution=merge-duplicates,{prefer}"))
    }

    /// Insert-or-merge on the `on_conflict` columns.
    pub async fn upsert<P>(
        &self,
        table: &str,
        on_conflict: &str,
        payload: &P,
    ) -> Result<(), BackendError>
    where
        P: Serialize + ?Sized,
    {
        let operation = format!("upsert:{table}");
        let request = self
            .upsert_request(table, on_conflict, "return=minimal")
            .json(payload);
        self.send(&operation, request).await?;
        Ok(())
    }

    /// Like [`upsert`](Self::upsert), returning the merged rows.
    pub async fn upsert_returning<P, T>(
        &self,
        table: &str,
        on_conflict: &str,
        payload: &P,
    ) -> Result<Vec<T>, BackendError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned + Validate,
    {
        let operation = format!("upsert:{table}");
        let request = self
            .upsert_request(table, on_conflict, "return=representation")
            .json(payload);
        let response = self.send(&operation, request).await?;
        self.rows(table, response).await
    }

    pub async fn delete(&self, query: &Query) -> Result<(), BackendError> {
        let operation = format!("delete:{}", query.table_name());
        self.send(&operation, self.rest(Method::DELETE, query))
            .await?;
        Ok(())
    }

    /// Calls a Postgres function through `/rest/v1/rpc/{name}`.
    pub async fn rpc<T>(&self, name: &str, args: &serde_json::Value) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
    {
        let operation = format!("rpc:{name}");
        let request = self
            .request(Method::POST, &format!("rest/v1/rpc/{name}"))
            .json(args);
        let response = self.send(&operation, request).await?;
        response
            .json()
            .await
            .map_err(|err| BackendError::schema(&format!("rpc {name}"), None, err.to_string()))
    }
}

pub(crate) fn decode_rows<T>(
    resource: &str,
    values: Vec<serde_json::Value>,
) -> Result<Vec<T>, BackendError>
where
    T: DeserializeOwned + Validate,
{
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let row: T = serde_json::from_value(value)
                .map_err(|err| BackendError::schema(resource, Some(index), err.to_string()))?;
            row.validate()
                .map_err(|err| BackendError::invalid_row(resource, index, err))?;
            Ok(row)
        })
        .collect()
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Customer;
    use serde_json::json;

    fn config() -> BackendConfig {
        BackendConfig {
            url: Url::parse("https://demo.backend.test/").unwrap(),
            anon_key: "anon".to_string(),
            timeout: Duration::from_secs(5),
            bucket: "car-images".to_string(),
        }
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            config().endpoint("/rest/v1/cars"),
            "https://demo.backend.test/rest/v1/cars"
        );
    }

    #[test]
    fn content_range_total() {
        assert_eq!(parse_content_range("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-9/*"), None);
        assert_eq!(parse_content_range(""), None);
    }

    #[test]
    fn decode_rows_names_the_bad_row() {
        let rows = vec![
            json!({"id": "5a0c0f4e-2b1d-4c8e-9f00-000000000001", "full_name": "Rana"}),
            json!({"id": "5a0c0f4e-2b1d-4c8e-9f00-000000000002", "full_name": " "}),
        ];
        let err = decode_rows::<Customer>("customers", rows).unwrap_err();
        match err {
            BackendError::Schema {
                resource,
                row,
                fields,
                ..
            } => {
                assert_eq!(resource, "customers");
                assert_eq!(row, Some(1));
                assert!(fields.contains_key("full_name"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decode_rows_reports_shape_errors() {
        let rows = vec![json!({"full_name": "No id"})];
        let err = decode_rows::<Customer>("customers", rows).unwrap_err();
        assert!(matches!(err, BackendError::Schema { row: Some(0), .. }));
    }

    #[test]
    fn authorized_clone_keeps_config() {
        let client = BackendClient::new(config()).unwrap();
        let user = client.authorized("user-token");
        assert_eq!(user.config().bucket, "car-images");
        assert!(format!("{user:?}").contains("authorized: true"));
    }
}
