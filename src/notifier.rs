// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

//! Best-effort operator notification over a Discord-compatible webhook.
//!
//! The notifier consumes a finished `(request, result)` pair, renders one
//! embed, and posts it exactly once with its own short-timeout client. It is
//! a separate failure domain: errors are logged at `warn` and swallowed, the
//! post is never retried, and nothing here can change the outcome already
//! returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::constants::{NOTIFY_COLOR_FAILURE, NOTIFY_COLOR_SUCCESS, NOTIFY_TIMEOUT_SECS};
use crate::reconciler::ReconciliationResult;
use crate::request::ReconciliationRequest;

/// Posts reconciliation summaries to a fixed operator channel.
pub struct Notifier {
    client: HttpClient,
    webhook_url: Url,
}

impl Notifier {
    /// Build a notifier with its own 5-second-timeout HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(webhook_url: Url) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(NOTIFY_TIMEOUT_SECS))
            .build()
            .context("failed to build notifier HTTP client")?;
        Ok(Self {
            client,
            webhook_url,
        })
    }

    /// Post the summary once. One attempt, no retry; failure is swallowed.
    pub async fn notify(&self, request: &ReconciliationRequest, result: &ReconciliationResult) {
        let body = build_embed(request, result);
        match self
            .client
            .post(self.webhook_url.clone())
            .json(&body)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!("operator notification delivered");
            }
            Ok(response) => {
                warn!(status = %response.status(), "operator notification rejected");
            }
            Err(e) => {
                warn!(error = %e, "operator notification failed");
            }
        }
    }

    /// Spawn the notification detached so the caller's response path never
    /// waits on it.
    pub fn notify_detached(
        self: Arc<Self>,
        request: ReconciliationRequest,
        result: ReconciliationResult,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.notify(&request, &result).await;
        })
    }
}

/// Render the webhook body: one embed with the registration details and, on
/// failure, the per-record error detail.
pub(crate) fn build_embed(
    request: &ReconciliationRequest,
    result: &ReconciliationResult,
) -> Value {
    let success = result.success();
    let (title, color) = if success {
        ("DNS record created or updated", NOTIFY_COLOR_SUCCESS)
    } else {
        ("DNS reconciliation failed", NOTIFY_COLOR_FAILURE)
    };

    let port_text = request
        .target_port
        .map_or_else(|| "default".to_string(), |port| port.to_string());

    // The Subdomain field shows the bare name; the port-qualified string
    // appears only under "Connect With".
    let mut fields = vec![
        json!({ "name": "Subdomain", "value": result.fqdn, "inline": true }),
        json!({ "name": "IP", "value": request.target_address.to_string(), "inline": true }),
        json!({ "name": "Port", "value": port_text, "inline": true }),
    ];
    if let Some(email) = &request.contact_email {
        fields.push(json!({ "name": "Email", "value": email, "inline": true }));
    }
    fields.push(json!({
        "name": "Connect With",
        "value": format!("`{}`", result.connection_string),
        "inline": false,
    }));
    if !success {
        let detail: Vec<String> = result
            .errors()
            .iter()
            .map(|(kind, error)| format!("{kind} record: {error}"))
            .collect();
        fields.push(json!({ "name": "Errors", "value": detail.join("\n"), "inline": false }));
    }

    json!({
        "embeds": [{
            "title": title,
            "color": color,
            "fields": fields,
            "timestamp": Utc::now().to_rfc3339(),
        }]
    })
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod notifier_tests;
