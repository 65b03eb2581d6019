// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

//! Raw submission normalization and validation.
//!
//! [`validate`] is the only constructor for [`ReconciliationRequest`]: a pure,
//! deterministic function with no network access, safe to re-run. Rules are
//! checked independently and every violation is reported, so a submission with
//! a two-character name and no address comes back with two errors, not one.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::constants::{NAME_MAX_LEN, NAME_MIN_LEN};
use crate::errors::ValidationError;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^[a-z0-9-]{{{NAME_MIN_LEN},{NAME_MAX_LEN}}}$"))
        .expect("name pattern is valid")
});

// Basic local@domain.tld shape; the email is display-only and never used in
// provider calls, so nothing stricter is warranted.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// A submission exactly as it arrives from the caller. Nothing here is trusted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRegistration {
    /// Requested subdomain label
    pub name: String,
    /// Game server IPv4 address, as typed
    pub target_address: String,
    /// Optional server port, as typed (empty counts as absent)
    pub target_port: Option<String>,
    /// Optional contact email for the operator notification
    pub contact_email: Option<String>,
}

/// A validated, normalized registration. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationRequest {
    /// Lowercase subdomain label, 3-32 chars of `[a-z0-9-]`
    pub name: String,
    /// Explicit game server address; there is no placeholder default
    pub target_address: Ipv4Addr,
    /// Absent means "address record only, no service-locator record"
    pub target_port: Option<u16>,
    /// Display-only; not used in provider calls
    pub contact_email: Option<String>,
}

impl ReconciliationRequest {
    /// The resolvable connection string handed back to the user on success,
    /// `name.rootDomain[:port]`.
    #[must_use]
    pub fn connection_string(&self, root_domain: &str) -> String {
        match self.target_port {
            Some(port) => format!("{}.{}:{}", self.name, root_domain, port),
            None => format!("{}.{}", self.name, root_domain),
        }
    }
}

/// Normalize and validate a raw submission.
///
/// The name is trimmed and lowercased before the charset check, mirroring what
/// the registration form does. Errors are accumulated, not short-circuited.
///
/// # Errors
///
/// Returns every rule violation found, in field order (name, address, port,
/// email).
pub fn validate(raw: &RawRegistration) -> Result<ReconciliationRequest, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let name = raw.name.trim().to_ascii_lowercase();
    if !NAME_RE.is_match(&name) {
        errors.push(ValidationError::InvalidName { name: name.clone() });
    }

    let address_text = raw.target_address.trim();
    let target_address = if address_text.is_empty() {
        errors.push(ValidationError::MissingAddress);
        None
    } else {
        match address_text.parse::<Ipv4Addr>() {
            Ok(address) => Some(address),
            Err(_) => {
                errors.push(ValidationError::InvalidAddress {
                    address: address_text.to_string(),
                });
                None
            }
        }
    };

    let target_port = match raw.target_port.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(text) => match text.parse::<u16>() {
            Ok(port) if port >= 1 => Some(port),
            _ => {
                errors.push(ValidationError::InvalidPort {
                    port: text.to_string(),
                });
                None
            }
        },
    };

    let contact_email = match raw.contact_email.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(text) if EMAIL_RE.is_match(text) => Some(text.to_string()),
        Some(text) => {
            errors.push(ValidationError::InvalidEmail {
                email: text.to_string(),
            });
            None
        }
    };

    // A missing address never falls through to a request; when target_address
    // is None the error list already explains why.
    let Some(target_address) = target_address else {
        return Err(errors);
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ReconciliationRequest {
        name,
        target_address,
        target_port,
        contact_email,
    })
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod request_tests;
