// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

//! The DNS record reconciler.
//!
//! Given a validated request, [`Reconciler::reconcile`] drives the provider
//! API until its records match the desired `(name, address, port)` triple.
//! Per record kind the flow is a small state machine:
//!
//! ```text
//! UNKNOWN --create--> CREATED
//! UNKNOWN --create conflicts--> NEEDS_LOOKUP --found--> FOUND --update--> UPDATED
//!                               NEEDS_LOOKUP --nothing--> FAILED (inconsistent)
//! any state --non-conflict error, retries exhausted--> FAILED
//! ```
//!
//! Create is attempted first because most names are new; the lookup round-trip
//! is paid only when the provider signals its "already exists" conflict code.
//! The two record kinds are independent: they run concurrently, a failure on
//! one never rolls back the other, and each failure is aggregated into the
//! result instead of thrown. The result is never a silent success — if any
//! attempted record failed, the aggregate reports it.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::constants::RECORD_APPLY_TIMEOUT_SECS;
use crate::errors::ProviderError;
use crate::provider::DnsProvider;
use crate::record::{ManagedRecord, RecordKind};
use crate::request::ReconciliationRequest;
use crate::retry::{retry_provider_call, RetryPolicy};

/// Terminal state of one managed record's apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A fresh record was created
    Created {
        /// The provider's id for the new record
        record_id: String,
    },
    /// An existing record was updated in place, never duplicated
    Updated {
        /// The provider's id for the reused record
        record_id: String,
    },
    /// No port was requested, so no service-locator record is managed.
    /// Counts as success.
    Skipped,
    /// The record could not be applied; detail is attached
    Failed {
        /// Why the apply failed
        error: ProviderError,
    },
}

impl RecordOutcome {
    /// True only for the `Failed` state.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The provider record id, when one was created or reused.
    #[must_use]
    pub fn record_id(&self) -> Option<&str> {
        match self {
            Self::Created { record_id } | Self::Updated { record_id } => Some(record_id),
            Self::Skipped | Self::Failed { .. } => None,
        }
    }
}

/// How one record apply reached the provider.
enum AppliedVia {
    Create,
    Update,
}

/// Aggregate result of one reconciliation.
///
/// Created once per request, consumed by the caller for the user-facing
/// response and read-only by the notifier, then discarded — never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationResult {
    /// Outcome for the address record
    pub address: RecordOutcome,
    /// Outcome for the service-locator record
    pub service_locator: RecordOutcome,
    /// The address record's `name.rootDomain`, without a port
    pub fqdn: String,
    /// The resolvable `name.rootDomain[:port]` string for the user
    pub connection_string: String,
}

impl ReconciliationResult {
    /// True only if every attempted record kind was applied; `Skipped` counts
    /// as success.
    #[must_use]
    pub fn success(&self) -> bool {
        !self.address.is_failed() && !self.service_locator.is_failed()
    }

    /// Failed record kinds with their error detail, address record first.
    #[must_use]
    pub fn errors(&self) -> Vec<(RecordKind, &ProviderError)> {
        let mut errors = Vec::new();
        if let RecordOutcome::Failed { error } = &self.address {
            errors.push((RecordKind::Address, error));
        }
        if let RecordOutcome::Failed { error } = &self.service_locator {
            errors.push((RecordKind::ServiceLocator, error));
        }
        errors
    }
}

/// Drives a [`DnsProvider`] to match the desired state of one request.
///
/// Stateless between calls; the provider's record store is the source of
/// truth and nothing is cached locally. Concurrent reconciliations for the
/// same name race at the provider — the guarantee is at-least-once
/// application of the desired state, not serializability.
pub struct Reconciler<P> {
    provider: Arc<P>,
    root_domain: String,
    retry_policy: RetryPolicy,
    apply_timeout: Duration,
}

impl<P: DnsProvider> Reconciler<P> {
    /// Build a reconciler with the default retry schedule and per-record
    /// timeout.
    pub fn new(provider: Arc<P>, root_domain: impl Into<String>) -> Self {
        Self {
            provider,
            root_domain: root_domain.into(),
            retry_policy: RetryPolicy::default(),
            apply_timeout: Duration::from_secs(RECORD_APPLY_TIMEOUT_SECS),
        }
    }

    /// Override the retry schedule (tests use millisecond intervals).
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Override the per-record overall timeout.
    #[must_use]
    pub fn with_apply_timeout(mut self, timeout: Duration) -> Self {
        self.apply_timeout = timeout;
        self
    }

    /// Reconcile one request to completion.
    pub async fn reconcile(&self, request: &ReconciliationRequest) -> ReconciliationResult {
        self.reconcile_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like [`Self::reconcile`], but stops retrying when `cancel` fires.
    /// Interrupted records are marked failed with a cancellation error rather
    /// than left in an unknown state.
    pub async fn reconcile_with_cancel(
        &self,
        request: &ReconciliationRequest,
        cancel: &CancellationToken,
    ) -> ReconciliationResult {
        let address_record = ManagedRecord::address(request, &self.root_domain);
        let service_record = ManagedRecord::service_locator(request, &self.root_domain);

        // The SRV payload references the address FQDN by construction, so the
        // two applies have no ordering dependency and run concurrently.
        let (address, service_locator) = tokio::join!(
            self.apply_record(address_record, cancel),
            async {
                match service_record {
                    Some(record) => self.apply_record(record, cancel).await,
                    None => RecordOutcome::Skipped,
                }
            }
        );

        let result = ReconciliationResult {
            address,
            service_locator,
            fqdn: RecordKind::Address.fqdn(&request.name, &self.root_domain),
            connection_string: request.connection_string(&self.root_domain),
        };

        if result.success() {
            info!(
                name = %request.name,
                connection = %result.connection_string,
                "reconciliation complete"
            );
        } else {
            let failed: Vec<String> = result
                .errors()
                .iter()
                .map(|(kind, error)| format!("{kind}: {error}"))
                .collect();
            warn!(
                name = %request.name,
                failed = ?failed,
                "reconciliation finished with failures"
            );
        }
        result
    }

    /// Apply one record under the per-record overall timeout.
    async fn apply_record(
        &self,
        mut record: ManagedRecord,
        cancel: &CancellationToken,
    ) -> RecordOutcome {
        let kind = record.kind;
        let fqdn = record.fully_qualified_name.clone();

        let applied = tokio::time::timeout(
            self.apply_timeout,
            self.apply_record_inner(&mut record, cancel),
        )
        .await;

        match applied {
            // The id adopted onto the record during the apply is the
            // outcome's record id.
            Ok(Ok(via)) => match record.provider_record_id {
                Some(record_id) => match via {
                    AppliedVia::Create => RecordOutcome::Created { record_id },
                    AppliedVia::Update => RecordOutcome::Updated { record_id },
                },
                None => {
                    warn!(kind = %kind, fqdn = %fqdn, "record applied without a provider id");
                    RecordOutcome::Failed {
                        error: ProviderError::Inconsistent { fqdn },
                    }
                }
            },
            Ok(Err(error)) => {
                warn!(kind = %kind, fqdn = %fqdn, error = %error, "record apply failed");
                RecordOutcome::Failed { error }
            }
            Err(_) => {
                let error = ProviderError::Timeout {
                    timeout_ms: self.apply_timeout.as_millis().try_into().unwrap_or(u64::MAX),
                };
                warn!(kind = %kind, fqdn = %fqdn, error = %error, "record apply timed out");
                RecordOutcome::Failed { error }
            }
        }
    }

    /// Create first; fall back to lookup-then-update only on the provider's
    /// "already exists" conflict code. On success the provider's id has been
    /// adopted onto the record.
    async fn apply_record_inner(
        &self,
        record: &mut ManagedRecord,
        cancel: &CancellationToken,
    ) -> Result<AppliedVia, ProviderError> {
        let created = retry_provider_call(&self.retry_policy, cancel, "create record", || {
            self.provider.create_record(&record.desired_payload)
        })
        .await;

        match created {
            Ok(provider_record) => {
                info!(
                    kind = %record.kind,
                    fqdn = %record.fully_qualified_name,
                    record_id = %provider_record.id,
                    "record created"
                );
                record.provider_record_id = Some(provider_record.id);
                Ok(AppliedVia::Create)
            }
            Err(ProviderError::Conflict { code }) => {
                debug!(
                    kind = %record.kind,
                    fqdn = %record.fully_qualified_name,
                    code,
                    "create conflicted, looking up existing record"
                );

                let existing = retry_provider_call(&self.retry_policy, cancel, "list records", || {
                    self.provider
                        .list_records(record.kind.provider_type(), &record.fully_qualified_name)
                })
                .await?;

                let Some(found) = existing.into_iter().next() else {
                    return Err(ProviderError::Inconsistent {
                        fqdn: record.fully_qualified_name.clone(),
                    });
                };
                record.provider_record_id = Some(found.id.clone());

                // Update-by-id uses the id just adopted onto the record.
                let updated =
                    retry_provider_call(&self.retry_policy, cancel, "update record", || {
                        self.provider.update_record(&found.id, &record.desired_payload)
                    })
                    .await?;

                info!(
                    kind = %record.kind,
                    fqdn = %record.fully_qualified_name,
                    record_id = %updated.id,
                    "record updated in place"
                );
                Ok(AppliedVia::Update)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod reconciler_tests;
