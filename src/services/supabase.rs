use crate::models::{PatientMatchInput, ProviderMatchInput, ProviderRow, SlotRow, WaitlistRow};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when reading from the hosted database
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Table names in the hosted database
#[derive(Debug, Clone)]
pub struct SupabaseTables {
    pub providers: String,
    pub slots: String,
    pub waitlist_entries: String,
}

impl Default for SupabaseTables {
    fn default() -> Self {
        Self {
            providers: "providers".to_string(),
            slots: "provider_slots".to_string(),
            waitlist_entries: "waitlist_entries".to_string(),
        }
    }
}

/// Read-only client for the hosted Postgres REST API
///
/// Fetches the provider behind an open slot and the active waitlist. Rows are
/// converted through `models::records`, so callers only see typed inputs.
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    client: Client,
    tables: SupabaseTables,
    page_size: usize,
}

/// PostgREST's default `max-rows`
pub const DEFAULT_PAGE_SIZE: usize = 1000;

impl SupabaseClient {
    pub fn new(
        base_url: String,
        api_key: String,
        tables: SupabaseTables,
        timeout_secs: u64,
    ) -> Result<Self, SupabaseError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            tables,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Rows requested per waitlist page
    ///
    /// Must not exceed the server's `max-rows`, otherwise a capped page looks
    /// like the last one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn get_rows(&self, url: &str) -> Result<Vec<Value>, SupabaseError> {
        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SupabaseError::Unauthorized);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Request to {} failed: {} - {}", url, status, body);
            return Err(SupabaseError::ApiError(format!("{} returned {}", url, status)));
        }

        let json: Value = response.json().await?;
        match json {
            Value::Array(rows) => Ok(rows),
            _ => Err(SupabaseError::InvalidResponse("Expected a JSON array of rows".into())),
        }
    }

    /// Fetch a provider by id
    pub async fn get_provider(&self, provider_id: &str) -> Result<ProviderMatchInput, SupabaseError> {
        let url = format!(
            "{}?id=eq.{}&select=*",
            self.table_url(&self.tables.providers),
            urlencoding::encode(provider_id)
        );

        tracing::debug!("Fetching provider {}", provider_id);

        let row = self
            .get_rows(&url)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("Provider {} not found", provider_id)))?;

        let provider: ProviderRow = serde_json::from_value(row)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse provider: {}", e)))?;

        Ok(provider.into_provider())
    }

    /// Fetch the provider that owns an open slot
    pub async fn get_slot_provider(&self, slot_id: &str) -> Result<ProviderMatchInput, SupabaseError> {
        let url = format!(
            "{}?id=eq.{}&select={}",
            self.table_url(&self.tables.slots),
            urlencoding::encode(slot_id),
            urlencoding::encode("*,providers(*)")
        );

        tracing::debug!("Fetching slot {}", slot_id);

        let row = self
            .get_rows(&url)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("Slot {} not found", slot_id)))?;

        let slot: SlotRow = serde_json::from_value(row)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse slot: {}", e)))?;

        match (slot.providers, slot.provider_id) {
            (Some(provider), _) => Ok(provider.into_provider()),
            (None, Some(provider_id)) => self.get_provider(&provider_id).await,
            (None, None) => Err(SupabaseError::InvalidResponse(format!(
                "Slot {} has no provider",
                slot.id
            ))),
        }
    }

    /// Fetch every active waitlist entry, oldest first
    ///
    /// Pages through the table with `limit`/`offset` until a short page comes
    /// back. Rows that cannot be parsed are skipped with a warning rather than
    /// failing the whole waitlist.
    pub async fn list_active_waitlist(&self) -> Result<Vec<PatientMatchInput>, SupabaseError> {
        let base = format!(
            "{}?status=eq.active&select={}&order=created_at.asc,id.asc",
            self.table_url(&self.tables.waitlist_entries),
            urlencoding::encode("*,patients(*)")
        );

        let mut patients = Vec::new();
        let mut offset = 0usize;
        let mut pages = 0usize;

        loop {
            let url = format!("{}&limit={}&offset={}", base, self.page_size, offset);
            let rows = self.get_rows(&url).await?;
            let received = rows.len();
            pages += 1;

            patients.extend(rows.into_iter().filter_map(|row| {
                match serde_json::from_value::<WaitlistRow>(row) {
                    Ok(entry) => Some(entry.into_patient()),
                    Err(e) => {
                        tracing::warn!("Skipping malformed waitlist row: {}", e);
                        None
                    }
                }
            }));

            offset += received;
            if received < self.page_size {
                break;
            }
        }

        tracing::debug!(
            "Loaded {} of {} waitlist rows in {} page(s)",
            patients.len(),
            offset,
            pages
        );

        Ok(patients)
    }

    /// Whether the REST endpoint answers with our credentials
    pub async fn health_check(&self) -> Result<bool, SupabaseError> {
        let response = self
            .client
            .get(format!("{}/rest/v1/", self.base_url))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}
