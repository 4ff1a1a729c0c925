//! Table query builder
//!
//! Filters are encoded as PostgREST query parameters: `col=eq.v`,
//! `col=is.null`, `col=in.(a,b)`.

use std::fmt::Display;

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::client::{read_json, SupabaseClient};
use crate::error::{AdminError, AdminResult};

const RETURN_REPRESENTATION: &str = "return=representation";
const UPSERT_PREFERENCE: &str = "resolution=merge-duplicates,return=representation";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Query against one table
#[must_use = "queries do nothing until a terminal method is awaited"]
pub struct QueryBuilder<'a> {
    client: &'a SupabaseClient,
    table: String,
    select: Option<String>,
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<usize>,
    on_conflict: Option<String>,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(client: &'a SupabaseClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            select: None,
            filters: Vec::new(),
            order: None,
            limit: None,
            on_conflict: None,
        }
    }

    /// Columns to return (`"*"` when not set)
    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.split(',').map(str::trim).collect::<Vec<_>>().join(","));
        self
    }

    /// `column = value`
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// `column IS NULL`
    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push((column.to_string(), "is.null".to_string()));
        self
    }

    /// `column IN (values)`
    pub fn in_<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let values: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
        self.filters
            .push((column.to_string(), format!("in.{}", format_in_list(&values))));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order = Some(format!("{column}.{direction}"));
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    /// Conflict target for [`QueryBuilder::upsert`]
    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.on_conflict = Some(columns.to_string());
        self
    }

    fn url(&self) -> String {
        self.client.rest_url(&self.table)
    }

    /// Query parameters for a read
    fn read_params(&self) -> Vec<(String, String)> {
        let mut params = vec![(
            "select".to_string(),
            self.select.clone().unwrap_or_else(|| "*".to_string()),
        )];
        params.extend(self.filters.iter().cloned());
        if let Some(order) = &self.order {
            params.push(("order".to_string(), order.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Query parameters for a write: filters plus the returned columns
    fn write_params(&self) -> Vec<(String, String)> {
        let mut params = self.filters.clone();
        if let Some(select) = &self.select {
            params.push(("select".to_string(), select.clone()));
        }
        params
    }

    /// Fetch all matching rows
    pub async fn execute<T: DeserializeOwned>(self) -> AdminResult<Vec<T>> {
        debug!(table = %self.table, filters = ?self.filters, "Selecting rows");
        let response = self
            .client
            .request(Method::GET, &self.url())
            .query(&self.read_params())
            .send()
            .await?;
        read_json(response).await
    }

    /// Fetch exactly one row; zero or several rows is [`AdminError::NotFound`]
    pub async fn single<T: DeserializeOwned>(self) -> AdminResult<T> {
        debug!(table = %self.table, filters = ?self.filters, "Selecting single row");
        let response = self
            .client
            .request(Method::GET, &self.url())
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .query(&self.read_params())
            .send()
            .await?;

        // PostgREST answers 406 when the result is not exactly one row
        if response.status() == reqwest::StatusCode::NOT_ACCEPTABLE {
            return Err(AdminError::NotFound(format!(
                "no single row in '{}' matching {}",
                self.table,
                describe_filters(&self.filters)
            )));
        }
        read_json(response).await
    }

    /// First matching row, if any
    pub async fn maybe_first<T: DeserializeOwned>(self) -> AdminResult<Option<T>> {
        let rows: Vec<T> = self.limit(1).execute().await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row (object body) or many (array body)
    pub async fn insert<B, T>(self, body: &B) -> AdminResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(table = %self.table, "Inserting rows");
        let response = self
            .client
            .request(Method::POST, &self.url())
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&self.write_params())
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    /// Insert, or merge into the row that conflicts on the primary key or
    /// the [`QueryBuilder::on_conflict`] columns
    pub async fn upsert<B, T>(self, body: &B) -> AdminResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(table = %self.table, on_conflict = ?self.on_conflict, "Upserting rows");
        let mut params = self.write_params();
        if let Some(columns) = &self.on_conflict {
            params.push(("on_conflict".to_string(), columns.clone()));
        }
        let response = self
            .client
            .request(Method::POST, &self.url())
            .header("Prefer", UPSERT_PREFERENCE)
            .query(&params)
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    /// Update matching rows; returns the updated rows
    pub async fn update<B, T>(self, body: &B) -> AdminResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if self.filters.is_empty() {
            return Err(AdminError::Validation(format!(
                "refusing to update every row of '{}'",
                self.table
            )));
        }
        debug!(table = %self.table, filters = ?self.filters, "Updating rows");
        let response = self
            .client
            .request(Method::PATCH, &self.url())
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&self.write_params())
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    /// Delete matching rows; returns the deleted rows
    pub async fn delete<T: DeserializeOwned>(self) -> AdminResult<Vec<T>> {
        if self.filters.is_empty() {
            return Err(AdminError::Validation(format!(
                "refusing to delete every row of '{}'",
                self.table
            )));
        }
        debug!(table = %self.table, filters = ?self.filters, "Deleting rows");
        let response = self
            .client
            .request(Method::DELETE, &self.url())
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&self.write_params())
            .send()
            .await?;
        read_json(response).await
    }
}

/// Render values as a PostgREST `in` list: `(a,b,c)`.
///
/// Values containing reserved characters are double-quoted.
pub fn format_in_list(values: &[String]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|value| {
            if value.contains([',', '(', ')', '"', ' ', '\\']) {
                format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
            } else {
                value.clone()
            }
        })
        .collect();
    format!("({})", items.join(","))
}

fn describe_filters(filters: &[(String, String)]) -> String {
    if filters.is_empty() {
        return "no filter".to_string();
    }
    filters
        .iter()
        .map(|(column, filter)| format!("{column}={filter}"))
        .collect::<Vec<_>>()
        .join("&")
}
