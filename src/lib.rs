// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

//! # Subcraft - Subdomain DNS Record Reconciler
//!
//! Subcraft lets a user claim a human-readable subdomain for a Minecraft
//! server and makes it resolve through the Cloudflare API, handling the fact
//! that the provider has no native upsert: a second create for the same name
//! fails with a specific conflict code, and the network call itself can fail
//! transiently.
//!
//! ## Overview
//!
//! This library provides the core functionality for the reconciler, including:
//!
//! - Submission normalization and validation (pure, no I/O)
//! - The create-then-update-on-conflict reconciliation protocol with bounded
//!   retries and per-record timeouts
//! - A decoupled, best-effort operator notifier whose failures never affect
//!   the reconciliation outcome
//!
//! ## Modules
//!
//! - [`request`] - Raw submission validation into a [`request::ReconciliationRequest`]
//! - [`record`] - Managed record kinds, FQDN derivation, and provider payloads
//! - [`reconciler`] - The per-record state machine and aggregate result
//! - [`provider`] - The [`provider::DnsProvider`] trait and Cloudflare client
//! - [`retry`] - Exponential backoff for transient provider failures
//! - [`notifier`] - Webhook summaries to the operator channel
//! - [`config`] - Provider settings (credential, zone id, root domain)
//! - [`errors`] - The validation and provider error taxonomy
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use subcraft::config::ProviderSettings;
//! use subcraft::provider::CloudflareProvider;
//! use subcraft::reconciler::Reconciler;
//! use subcraft::request::{validate, RawRegistration};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let raw = RawRegistration {
//!     name: "survival".to_string(),
//!     target_address: "203.0.113.10".to_string(),
//!     target_port: Some("25566".to_string()),
//!     contact_email: None,
//! };
//! let request = validate(&raw).map_err(|errors| anyhow::anyhow!("{errors:?}"))?;
//!
//! let provider = Arc::new(CloudflareProvider::new(ProviderSettings {
//!     api_base: subcraft::constants::PROVIDER_API_BASE.to_string(),
//!     api_token: std::env::var("CLOUDFLARE_API_TOKEN")?,
//!     zone_id: std::env::var("CLOUDFLARE_ZONE_ID")?,
//!     root_domain: "example-mc.net".to_string(),
//! })?);
//!
//! let result = Reconciler::new(provider, "example-mc.net").reconcile(&request).await;
//! println!("connect via {}", result.connection_string);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod notifier;
pub mod provider;
pub mod reconciler;
pub mod record;
pub mod request;
pub mod retry;
