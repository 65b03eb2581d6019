// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use wiremock::MockServer;

use subcraft::config::ProviderSettings;
use subcraft::provider::CloudflareProvider;
use subcraft::reconciler::Reconciler;
use subcraft::request::ReconciliationRequest;
use subcraft::retry::RetryPolicy;

pub const TEST_ZONE_ID: &str = "zone123";
pub const TEST_ROOT_DOMAIN: &str = "example-mc.net";

/// Provider settings pointed at a mock server.
pub fn settings_for(server: &MockServer) -> ProviderSettings {
    ProviderSettings {
        api_base: server.uri(),
        api_token: "test-token".to_string(),
        zone_id: TEST_ZONE_ID.to_string(),
        root_domain: TEST_ROOT_DOMAIN.to_string(),
    }
}

/// A provider talking to the mock server.
pub fn provider_for(server: &MockServer) -> CloudflareProvider {
    CloudflareProvider::new(settings_for(server)).expect("provider builds")
}

/// A reconciler over the mock server with a millisecond retry schedule so
/// transient-failure tests finish quickly.
pub fn reconciler_for(server: &MockServer) -> Reconciler<CloudflareProvider> {
    Reconciler::new(Arc::new(provider_for(server)), TEST_ROOT_DOMAIN).with_retry_policy(
        RetryPolicy {
            max_attempts: 3,
            initial_interval: Duration::from_millis(10),
            multiplier: 2.0,
            randomization_factor: 0.0,
        },
    )
}

/// A validated request for the `survival` subdomain.
pub fn survival_request(port: Option<u16>) -> ReconciliationRequest {
    ReconciliationRequest {
        name: "survival".to_string(),
        target_address: Ipv4Addr::new(203, 0, 113, 10),
        target_port: port,
        contact_email: None,
    }
}

/// The provider's success envelope around one record.
pub fn success_body(id: &str, record_type: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "errors": [],
        "result": { "id": id, "type": record_type, "name": name }
    })
}

/// The provider's failure envelope with a single error code.
pub fn error_body(code: i64, message: &str) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "errors": [{ "code": code, "message": message }],
        "result": null
    })
}

/// The provider's success envelope around a list of records.
pub fn list_body(records: &[(&str, &str, &str)]) -> serde_json::Value {
    let result: Vec<serde_json::Value> = records
        .iter()
        .map(|(id, record_type, name)| {
            serde_json::json!({ "id": id, "type": record_type, "name": name })
        })
        .collect();
    serde_json::json!({
        "success": true,
        "errors": [],
        "result": result
    })
}
