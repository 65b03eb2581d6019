// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

//! Global constants for the subcraft reconciler.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance. Policy values
//! (TTL, SRV priority/weight, retry schedule) live here; credentials and zone
//! identifiers are configuration and never appear as constants.

// ============================================================================
// Provider API Constants
// ============================================================================

/// Default base URL for the Cloudflare v4 API
pub const PROVIDER_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Cloudflare error codes meaning "a record of this exact type and name
/// already exists". This application-level code, not the HTTP status, is what
/// routes a create onto the lookup-then-update path.
pub const CONFLICT_ERROR_CODES: &[i64] = &[81053, 81057, 81058];

/// TTL value the provider interprets as "automatic"
pub const RECORD_TTL_AUTOMATIC: u32 = 1;

// ============================================================================
// Service-Locator Record Policy
// ============================================================================

/// SRV service label for Minecraft service discovery
pub const SRV_SERVICE: &str = "_minecraft";

/// SRV protocol label (Minecraft speaks raw TCP)
pub const SRV_PROTO: &str = "_tcp";

/// Fixed SRV priority; the system manages exactly one backend per name
pub const SRV_PRIORITY: u16 = 0;

/// Fixed SRV weight; no load balancing across backends
pub const SRV_WEIGHT: u16 = 5;

// ============================================================================
// Name Constraints
// ============================================================================

/// Minimum subdomain label length
pub const NAME_MIN_LEN: usize = 3;

/// Maximum subdomain label length (shorter than the 63-char DNS label limit
/// to leave room for provider prefixes)
pub const NAME_MAX_LEN: usize = 32;

// ============================================================================
// Retry and Timeout Constants
// ============================================================================

/// Maximum attempts per provider operation (initial attempt plus retries)
pub const MAX_APPLY_ATTEMPTS: u32 = 3;

/// Initial retry interval (1 second)
pub const RETRY_INITIAL_INTERVAL_SECS: u64 = 1;

/// Backoff multiplier (exponential growth factor)
pub const RETRY_MULTIPLIER: f64 = 2.0;

/// Randomization factor to prevent thundering herd (±10%)
pub const RETRY_RANDOMIZATION_FACTOR: f64 = 0.1;

/// Per-attempt network timeout for provider requests (5 seconds)
pub const ATTEMPT_TIMEOUT_SECS: u64 = 5;

/// Overall timeout for one record's apply: the backoff schedule sum (~7s)
/// plus one request duration
pub const RECORD_APPLY_TIMEOUT_SECS: u64 = 12;

// ============================================================================
// Notifier Constants
// ============================================================================

/// Timeout for the single webhook post (5 seconds)
pub const NOTIFY_TIMEOUT_SECS: u64 = 5;

/// Embed accent color for a fully applied reconciliation
pub const NOTIFY_COLOR_SUCCESS: u32 = 0x00_ff88;

/// Embed accent color for a failed or partially applied reconciliation
pub const NOTIFY_COLOR_FAILURE: u32 = 0xed_4245;
