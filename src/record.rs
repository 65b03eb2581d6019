// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

//! The provider-side records this system owns and their desired payloads.
//!
//! Exactly two record kinds exist per managed name: an address (A) record and,
//! when the request carries a port, a service-locator (SRV) record. The
//! payload types serialize to the exact JSON bodies the provider's create and
//! update endpoints accept.

use std::fmt;

use serde::Serialize;

use crate::constants::{
    RECORD_TTL_AUTOMATIC, SRV_PRIORITY, SRV_PROTO, SRV_SERVICE, SRV_WEIGHT,
};
use crate::request::ReconciliationRequest;

/// The two provider-side DNS record types this system owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Maps `{name}.{root}` to the game server's IPv4 address
    Address,
    /// Maps `_minecraft._tcp.{name}.{root}` to a target host and port, so
    /// clients discover non-default ports without typing them
    ServiceLocator,
}

impl RecordKind {
    /// Wire value of the provider's `type` field for this kind.
    #[must_use]
    pub fn provider_type(self) -> &'static str {
        match self {
            Self::Address => "A",
            Self::ServiceLocator => "SRV",
        }
    }

    /// Fully qualified name for this kind under the given root domain.
    #[must_use]
    pub fn fqdn(self, name: &str, root_domain: &str) -> String {
        match self {
            Self::Address => format!("{name}.{root_domain}"),
            Self::ServiceLocator => {
                format!("{SRV_SERVICE}.{SRV_PROTO}.{name}.{root_domain}")
            }
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_type())
    }
}

/// Provider-specific record body, computed once from the request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RecordPayload {
    /// Address record body
    Address(AddressPayload),
    /// Service-locator record body
    ServiceLocator(ServiceLocatorPayload),
}

impl RecordPayload {
    /// Wire value of the `type` field inside this payload.
    #[must_use]
    pub fn provider_type(&self) -> &'static str {
        match self {
            Self::Address(_) => RecordKind::Address.provider_type(),
            Self::ServiceLocator(_) => RecordKind::ServiceLocator.provider_type(),
        }
    }
}

/// Body of an address record create/update.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AddressPayload {
    /// Always `"A"`
    #[serde(rename = "type")]
    pub record_type: &'static str,
    /// Fully qualified record name
    pub name: String,
    /// The game server's dotted-quad address
    pub content: String,
    /// Always the provider's "automatic" TTL
    pub ttl: u32,
    /// Always false: the protocol is raw TCP, and a reverse-proxying provider
    /// would break connectivity
    pub proxied: bool,
}

/// Body of a service-locator record create/update.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServiceLocatorPayload {
    /// Always `"SRV"`
    #[serde(rename = "type")]
    pub record_type: &'static str,
    /// Fully qualified record name, `_minecraft._tcp.{name}.{root}`
    pub name: String,
    /// SRV-specific fields
    pub data: SrvData,
    /// Always the provider's "automatic" TTL
    pub ttl: u32,
}

/// SRV rdata as the provider expects it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SrvData {
    pub service: &'static str,
    pub proto: &'static str,
    /// The bare subdomain label
    pub name: String,
    /// Policy constant, not user-controlled
    pub priority: u16,
    /// Policy constant, not user-controlled
    pub weight: u16,
    /// The user's requested port
    pub port: u16,
    /// The address record's FQDN, referenced by construction
    pub target: String,
}

/// One provider-side DNS record this system owns for a request.
#[derive(Debug, Clone)]
pub struct ManagedRecord {
    /// Which of the two managed kinds this is
    pub kind: RecordKind,
    /// Derived name the provider is queried by
    pub fully_qualified_name: String,
    /// The exact body a create or update should leave in place
    pub desired_payload: RecordPayload,
    /// Unset until an existing record is found or a create succeeds; once
    /// set, identifies the record for update-by-id
    pub provider_record_id: Option<String>,
}

impl ManagedRecord {
    /// The address record for a request. Always managed.
    #[must_use]
    pub fn address(request: &ReconciliationRequest, root_domain: &str) -> Self {
        let fqdn = RecordKind::Address.fqdn(&request.name, root_domain);
        let payload = RecordPayload::Address(AddressPayload {
            record_type: RecordKind::Address.provider_type(),
            name: fqdn.clone(),
            content: request.target_address.to_string(),
            ttl: RECORD_TTL_AUTOMATIC,
            proxied: false,
        });
        Self {
            kind: RecordKind::Address,
            fully_qualified_name: fqdn,
            desired_payload: payload,
            provider_record_id: None,
        }
    }

    /// The service-locator record for a request, or `None` when no port was
    /// requested.
    #[must_use]
    pub fn service_locator(request: &ReconciliationRequest, root_domain: &str) -> Option<Self> {
        let port = request.target_port?;
        let fqdn = RecordKind::ServiceLocator.fqdn(&request.name, root_domain);
        let target = RecordKind::Address.fqdn(&request.name, root_domain);
        let payload = RecordPayload::ServiceLocator(ServiceLocatorPayload {
            record_type: RecordKind::ServiceLocator.provider_type(),
            name: fqdn.clone(),
            data: SrvData {
                service: SRV_SERVICE,
                proto: SRV_PROTO,
                name: request.name.clone(),
                priority: SRV_PRIORITY,
                weight: SRV_WEIGHT,
                port,
                target,
            },
            ttl: RECORD_TTL_AUTOMATIC,
        });
        Some(Self {
            kind: RecordKind::ServiceLocator,
            fully_qualified_name: fqdn,
            desired_payload: payload,
            provider_record_id: None,
        })
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
