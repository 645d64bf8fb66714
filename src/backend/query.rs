//! PostgREST query builder.
//!
//! A [`Query`] is a table name plus an ordered list of query parameters in
//! PostgREST's filter grammar (`col=eq.value`, `or=(...)`, `order=...`).
//! Two queries built from the same inputs compare equal, which is what the
//! filter tests rely on.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::CarStatus;

/// Characters with meaning inside `in.(...)` and `or=(...)` lists.
const RESERVED: &[char] = &[',', '(', ')', ':', '"', '\\', '.'];

/// Renders a value the way PostgREST expects it in a filter.
pub trait FilterValue {
    fn to_filter_value(&self) -> String;
}

impl FilterValue for str {
    fn to_filter_value(&self) -> String {
        self.to_string()
    }
}

impl FilterValue for String {
    fn to_filter_value(&self) -> String {
        self.clone()
    }
}

impl FilterValue for f64 {
    fn to_filter_value(&self) -> String {
        if self.fract() == 0.0 && self.abs() < 1e15 {
            format!("{}", *self as i64)
        } else {
            self.to_string()
        }
    }
}

impl FilterValue for i32 {
    fn to_filter_value(&self) -> String {
        self.to_string()
    }
}

impl FilterValue for i64 {
    fn to_filter_value(&self) -> String {
        self.to_string()
    }
}

impl FilterValue for Uuid {
    fn to_filter_value(&self) -> String {
        self.to_string()
    }
}

impl FilterValue for CarStatus {
    fn to_filter_value(&self) -> String {
        self.as_str().to_string()
    }
}

impl FilterValue for DateTime<Utc> {
    fn to_filter_value(&self) -> String {
        self.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

impl<T: FilterValue + ?Sized> FilterValue for &T {
    fn to_filter_value(&self) -> String {
        (**self).to_filter_value()
    }
}

/// Double-quotes a list item when it contains reserved characters.
pub fn quote_list_item(value: &str) -> String {
    if value.contains(RESERVED) || value.trim() != value {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// Backslash-escapes the `LIKE` wildcards in user text.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    params: Vec<(String, String)>,
}

impl Query {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            table: name.into(),
            params: Vec::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Value of the first parameter named `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn push(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_string(), value));
        self
    }

    pub fn select(self, columns: &str) -> Self {
        self.push("select", columns.to_string())
    }

    pub fn eq(self, column: &str, value: impl FilterValue) -> Self {
        let value = value.to_filter_value();
        self.push(column, format!("eq.{value}"))
    }

    pub fn neq(self, column: &str, value: impl FilterValue) -> Self {
        let value = value.to_filter_value();
        self.push(column, format!("neq.{value}"))
    }

    pub fn gte(self, column: &str, value: impl FilterValue) -> Self {
        let value = value.to_filter_value();
        self.push(column, format!("gte.{value}"))
    }

    pub fn lte(self, column: &str, value: impl FilterValue) -> Self {
        let value = value.to_filter_value();
        self.push(column, format!("lte.{value}"))
    }

    pub fn in_list<V: FilterValue>(self, column: &str, values: &[V]) -> Self {
        let items = values
            .iter()
            .map(|v| quote_list_item(&v.to_filter_value()))
            .collect::<Vec<_>>()
            .join(",");
        self.push(column, format!("in.({items})"))
    }

    /// Case-insensitive substring match of `text` against any of `columns`.
    /// Blank text adds nothing. `%` and `_` in `text` match literally.
    pub fn search_any(self, columns: &[&str], text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() || columns.is_empty() {
            return self;
        }
        let pattern = quote_list_item(&format!("*{}*", escape_like(text)));
        let clauses = columns
            .iter()
            .map(|col| format!("{col}.ilike.{pattern}"))
            .collect::<Vec<_>>()
            .join(",");
        self.push("or", format!("({clauses})"))
    }

    fn push_order(mut self, clause: String) -> Self {
        match self.params.iter_mut().find(|(k, _)| k == "order") {
            Some((_, existing)) => {
                existing.push(',');
                existing.push_str(&clause);
                self
            }
            None => self.push("order", clause),
        }
    }

    pub fn order(self, column: &str, ascending: bool) -> Self {
        let dir = if ascending { "asc" } else { "desc" };
        self.push_order(format!("{column}.{dir}"))
    }

    /// Like [`order`](Self::order) with NULLs sorted after every value.
    pub fn order_nulls_last(self, column: &str, ascending: bool) -> Self {
        let dir = if ascending { "asc" } else { "desc" };
        self.push_order(format!("{column}.{dir}.nullslast"))
    }

    pub fn limit(self, n: usize) -> Self {
        self.push("limit", n.to_string())
    }
}
