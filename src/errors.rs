// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

//! Error types for validation, provider operations, and notification.
//!
//! This module provides the error taxonomy the reconciler is built around:
//! - [`ValidationError`] — caller input malformed; never retried, never sent
//!   to the provider
//! - [`ProviderError`] — everything that can go wrong talking to the DNS
//!   provider, split so retry and fallback decisions are made on the type,
//!   not on error strings
//!
//! Notification failures carry no taxonomy of their own: the notifier swallows
//! and logs them, so an `anyhow` context chain is all they need.

use thiserror::Error;

/// A single rule violation found while validating a raw submission.
///
/// Validation accumulates every violation instead of short-circuiting, so the
/// caller can report all problems at once.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name is not 3-32 characters of lowercase letters, digits, and hyphens
    #[error("name '{name}' must be 3-32 characters: lowercase letters, digits, and hyphens only")]
    InvalidName {
        /// The normalized name that failed the check
        name: String,
    },

    /// Server address was not supplied
    ///
    /// An explicit, usable address is required; there is no placeholder
    /// default.
    #[error("server address is required")]
    MissingAddress,

    /// Server address is not an IPv4 dotted quad
    #[error("server address '{address}' is not a valid IPv4 address")]
    InvalidAddress {
        /// The rejected address text
        address: String,
    },

    /// Server port is not an integer in 1-65535
    #[error("server port '{port}' must be a number between 1 and 65535")]
    InvalidPort {
        /// The rejected port text
        port: String,
    },

    /// Contact email does not match the basic `local@domain.tld` shape
    #[error("contact email '{email}' is not a valid email address")]
    InvalidEmail {
        /// The rejected email text
        email: String,
    },
}

/// Errors that can occur while driving the DNS provider API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Create refused because a record of this exact type and name already
    /// exists.
    ///
    /// This is not a user-visible failure; it routes the apply onto the
    /// lookup-then-update path and is never retried as transient.
    #[error("record already exists at the provider (code {code})")]
    Conflict {
        /// The provider's application-level conflict code
        code: i64,
    },

    /// Non-conflict rejection (bad payload, auth failure, any other 4xx-class
    /// application error). Terminal for the record; never retried.
    #[error("provider rejected the request (code {code}): {message}")]
    Rejected {
        /// The provider's application-level error code
        code: i64,
        /// The provider's error detail, surfaced to the caller
        message: String,
    },

    /// Network error, 429, or 5xx-class provider failure. Retried with
    /// backoff, then surfaced as terminal once attempts are exhausted.
    #[error("transient provider failure: {reason}")]
    Transient {
        /// What went wrong, for logs and the aggregated result
        reason: String,
    },

    /// A request or a whole record apply exceeded its timeout
    #[error("provider operation timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that was exceeded, in milliseconds
        timeout_ms: u64,
    },

    /// The parent request was cancelled while the record apply was in flight
    #[error("reconciliation cancelled before the record was applied")]
    Cancelled,

    /// Create conflicted but the follow-up lookup found no record
    #[error("inconsistent provider state for '{fqdn}': create conflicted but lookup found nothing")]
    Inconsistent {
        /// The fully qualified name the provider claims exists
        fqdn: String,
    },
}

impl ProviderError {
    /// Returns true if the operation should be retried with backoff.
    ///
    /// Only network-level and 5xx-class failures qualify. A conflict routes to
    /// the lookup-then-update path instead, and a rejection is terminal.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Timeout { .. })
    }

    /// Returns true if this is the provider's "record already exists" signal.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
