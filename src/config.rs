// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

//! Provider-side configuration.
//!
//! The bearer credential, zone identifier, and root domain are configuration
//! inputs, never request input and never compiled-in constants. The binary
//! populates this from flags and environment variables via `clap`.

use std::fmt;

/// Settings for talking to the DNS provider.
#[derive(Clone)]
pub struct ProviderSettings {
    /// Base URL of the provider API (overridable for tests)
    pub api_base: String,
    /// Static bearer credential sent on every request
    pub api_token: String,
    /// Identifier of the zone all managed records live in
    pub zone_id: String,
    /// Root domain subdomains are created under (e.g. `example-mc.net`)
    pub root_domain: String,
}

// Manual Debug so the credential never reaches logs.
impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_base", &self.api_base)
            .field("api_token", &"<redacted>")
            .field("zone_id", &self.zone_id)
            .field("root_domain", &self.root_domain)
            .finish()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
