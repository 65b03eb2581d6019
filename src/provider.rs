// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

//! The DNS provider boundary: a trait the reconciler drives, and the
//! Cloudflare implementation of it.
//!
//! The provider API has no upsert. The operations consumed here are exactly
//! the three the reconciler's protocol needs: list records by name and type
//! (read), create record (write), and update record by id (write). Error
//! classification happens in this module so the reconciler and retry layers
//! decide on [`ProviderError`] variants, never on HTTP minutiae:
//!
//! - 429 and 5xx responses, connect errors, and timeouts become `Transient`
//! - an envelope error carrying one of the provider's "already exists" codes
//!   becomes `Conflict` — the application-level code, not the HTTP status,
//!   selects the conflict branch
//! - any other envelope failure becomes `Rejected` with the provider's detail

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use anyhow::{Context, Result};

use crate::config::ProviderSettings;
use crate::constants::{ATTEMPT_TIMEOUT_SECS, CONFLICT_ERROR_CODES};
use crate::errors::ProviderError;
use crate::record::RecordPayload;

/// A DNS record as reported by the provider.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProviderRecord {
    /// The provider's opaque record identifier, used for update-by-id
    pub id: String,
    /// Record type, e.g. `"A"` or `"SRV"`
    #[serde(rename = "type")]
    pub record_type: String,
    /// Fully qualified record name
    pub name: String,
}

/// The operations the reconciler needs from a DNS provider.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List records matching an exact type and fully qualified name.
    async fn list_records(
        &self,
        record_type: &str,
        fqdn: &str,
    ) -> Result<Vec<ProviderRecord>, ProviderError>;

    /// Create a record. Fails with [`ProviderError::Conflict`] when a record
    /// of this exact type and name already exists.
    async fn create_record(&self, payload: &RecordPayload)
        -> Result<ProviderRecord, ProviderError>;

    /// Replace an existing record's body, identified by provider record id.
    async fn update_record(
        &self,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<ProviderRecord, ProviderError>;
}

/// The provider's JSON response envelope.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    result: Option<T>,
}

/// One entry of the envelope's `errors` array.
#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    message: String,
}

/// Cloudflare v4 API client scoped to one zone.
pub struct CloudflareProvider {
    client: HttpClient,
    settings: ProviderSettings,
}

impl CloudflareProvider {
    /// Build a client with the per-attempt network timeout applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(ATTEMPT_TIMEOUT_SECS))
            .build()
            .context("failed to build provider HTTP client")?;
        Ok(Self { client, settings })
    }

    fn records_url(&self) -> String {
        format!(
            "{}/zones/{}/dns_records",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.zone_id
        )
    }

    fn record_url(&self, record_id: &str) -> String {
        format!("{}/{record_id}", self.records_url())
    }

    /// Send one request, authenticate it, and map the response onto the error
    /// taxonomy.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ProviderError> {
        let response = request
            .bearer_auth(&self.settings.api_token)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Transient {
                reason: format!("provider returned HTTP {status}"),
            });
        }

        // Parse the envelope even on 4xx: the application-level error code,
        // not the HTTP status, is what distinguishes a conflict from a
        // rejection.
        let envelope: ApiEnvelope<T> =
            response.json().await.map_err(|e| ProviderError::Transient {
                reason: format!("malformed provider response: {e}"),
            })?;

        if envelope.success {
            envelope.result.ok_or_else(|| ProviderError::Transient {
                reason: "provider reported success without a result".to_string(),
            })
        } else {
            Err(classify_api_errors(&envelope.errors))
        }
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn list_records(
        &self,
        record_type: &str,
        fqdn: &str,
    ) -> Result<Vec<ProviderRecord>, ProviderError> {
        debug!(record_type, fqdn, "listing provider records");
        let request = self
            .client
            .get(self.records_url())
            .query(&[("type", record_type), ("name", fqdn)]);
        let records: Vec<ProviderRecord> = self.send(request).await?;
        debug!(record_type, fqdn, count = records.len(), "provider records listed");
        Ok(records)
    }

    async fn create_record(
        &self,
        payload: &RecordPayload,
    ) -> Result<ProviderRecord, ProviderError> {
        debug!(record_type = payload.provider_type(), "creating provider record");
        let request = self.client.post(self.records_url()).json(payload);
        let record: ProviderRecord = self.send(request).await?;
        info!(
            record_type = %record.record_type,
            name = %record.name,
            record_id = %record.id,
            "provider record created"
        );
        Ok(record)
    }

    async fn update_record(
        &self,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<ProviderRecord, ProviderError> {
        debug!(
            record_type = payload.provider_type(),
            record_id, "updating provider record"
        );
        let request = self.client.put(self.record_url(record_id)).json(payload);
        let record: ProviderRecord = self.send(request).await?;
        info!(
            record_type = %record.record_type,
            name = %record.name,
            record_id = %record.id,
            "provider record updated in place"
        );
        Ok(record)
    }
}

/// Classify a request that never produced an HTTP response.
fn classify_send_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout {
            timeout_ms: ATTEMPT_TIMEOUT_SECS * 1000,
        }
    } else {
        ProviderError::Transient {
            reason: error.to_string(),
        }
    }
}

/// Classify an unsuccessful envelope by its application-level error codes.
fn classify_api_errors(errors: &[ApiError]) -> ProviderError {
    if let Some(conflict) = errors
        .iter()
        .find(|e| CONFLICT_ERROR_CODES.contains(&e.code))
    {
        return ProviderError::Conflict {
            code: conflict.code,
        };
    }
    match errors.first() {
        Some(error) => ProviderError::Rejected {
            code: error.code,
            message: error.message.clone(),
        },
        None => ProviderError::Rejected {
            code: 0,
            message: "provider reported failure without detail".to_string(),
        },
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod provider_tests;
