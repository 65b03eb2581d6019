// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use subcraft::config::ProviderSettings;
use subcraft::notifier::Notifier;
use subcraft::provider::CloudflareProvider;
use subcraft::reconciler::Reconciler;
use subcraft::request::{validate, RawRegistration};

/// Claim a subdomain and point it at a Minecraft server.
#[derive(Parser, Debug)]
#[command(name = "subcraft", version, about)]
struct Cli {
    /// Requested subdomain label (3-32 chars: a-z, 0-9, hyphens)
    #[arg(long)]
    name: String,

    /// IPv4 address of the game server
    #[arg(long)]
    address: String,

    /// Server port; omit when the server listens on the default game port
    #[arg(long)]
    port: Option<String>,

    /// Contact email shown in the operator notification
    #[arg(long)]
    email: Option<String>,

    /// Cloudflare API bearer token
    #[arg(long, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    api_token: String,

    /// Cloudflare zone identifier the managed records live in
    #[arg(long, env = "CLOUDFLARE_ZONE_ID")]
    zone_id: String,

    /// Root domain subdomains are created under (e.g. example-mc.net)
    #[arg(long, env = "ROOT_DOMAIN")]
    root_domain: String,

    /// Discord-compatible webhook URL for operator notifications
    #[arg(long, env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
    webhook_url: Option<Url>,

    /// Provider API base URL
    #[arg(
        long,
        env = "PROVIDER_API_BASE",
        default_value = subcraft::constants::PROVIDER_API_BASE,
        hide = true
    )]
    api_base: String,
}

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("subcraft")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Initialize logging with custom format
    //
    // Respects RUST_LOG environment variable if set, otherwise defaults to INFO level
    // Example: RUST_LOG=debug subcraft ...
    //
    // Respects RUST_LOG_FORMAT environment variable for output format
    // Example: RUST_LOG_FORMAT=json subcraft ...
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    let Cli {
        name,
        address,
        port,
        email,
        api_token,
        zone_id,
        root_domain,
        webhook_url,
        api_base,
    } = Cli::parse();

    let raw = RawRegistration {
        name,
        target_address: address,
        target_port: port,
        contact_email: email,
    };

    // Validation failures short-circuit before any provider call.
    let request = match validate(&raw) {
        Ok(request) => request,
        Err(errors) => {
            eprintln!("Registration rejected:");
            for error in &errors {
                eprintln!("  - {error}");
            }
            std::process::exit(2);
        }
    };

    debug!("initializing provider client");
    let provider = Arc::new(CloudflareProvider::new(ProviderSettings {
        api_base,
        api_token,
        zone_id,
        root_domain: root_domain.clone(),
    })?);
    let reconciler = Reconciler::new(provider, root_domain);

    // Ctrl-C stops in-flight retries; interrupted records are reported as
    // failed rather than left unknown.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling reconciliation");
                cancel.cancel();
            }
        });
    }

    info!(
        name = %request.name,
        address = %request.target_address,
        port = ?request.target_port,
        "starting reconciliation"
    );
    let result = reconciler.reconcile_with_cancel(&request, &cancel).await;

    // The notifier runs detached: its outcome never changes what we report.
    let notify_handle = match webhook_url {
        Some(url) => match Notifier::new(url) {
            Ok(notifier) => {
                Some(Arc::new(notifier).notify_detached(request.clone(), result.clone()))
            }
            Err(e) => {
                warn!(error = %e, "failed to build notifier, skipping notification");
                None
            }
        },
        None => None,
    };

    if result.success() {
        println!("Subdomain ready! Connect via: {}", result.connection_string);
    } else {
        eprintln!("Reconciliation failed:");
        for (kind, error) in result.errors() {
            eprintln!("  - {kind} record: {error}");
        }
    }

    // Keep the process alive just long enough for the detached webhook post;
    // the user-facing result is already printed.
    if let Some(handle) = notify_handle {
        let _ = handle.await;
    }

    if result.success() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
