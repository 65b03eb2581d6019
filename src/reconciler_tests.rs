// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

//! Unit tests for `reconciler.rs`
//!
//! Two in-memory providers drive these tests: `ScriptedProvider` replays
//! queued responses per record type and logs every call, and `FakeDns`
//! actually behaves like the provider (create conflicts when a record of the
//! same type and name exists) so idempotence can be checked end to end.

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use super::super::{Reconciler, RecordOutcome};
    use crate::errors::ProviderError;
    use crate::provider::{DnsProvider, ProviderRecord};
    use crate::record::RecordPayload;
    use crate::request::ReconciliationRequest;
    use crate::retry::RetryPolicy;

    fn request(port: Option<u16>) -> ReconciliationRequest {
        ReconciliationRequest {
            name: "survival".to_string(),
            target_address: Ipv4Addr::new(203, 0, 113, 10),
            target_port: port,
            contact_email: None,
        }
    }

    fn record(id: &str, record_type: &str, name: &str) -> ProviderRecord {
        ProviderRecord {
            id: id.to_string(),
            record_type: record_type.to_string(),
            name: name.to_string(),
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_interval: Duration::from_millis(20),
            multiplier: 2.0,
            randomization_factor: 0.0,
        }
    }

    fn transient() -> ProviderError {
        ProviderError::Transient {
            reason: "connection reset".to_string(),
        }
    }

    /// Replays queued responses, keyed by record type so the two concurrent
    /// applies cannot steal each other's replies.
    #[derive(Default)]
    struct ScriptedProvider {
        creates: Mutex<HashMap<String, VecDeque<Result<ProviderRecord, ProviderError>>>>,
        lists: Mutex<HashMap<String, VecDeque<Result<Vec<ProviderRecord>, ProviderError>>>>,
        updates: Mutex<HashMap<String, VecDeque<Result<ProviderRecord, ProviderError>>>>,
        calls: Mutex<Vec<String>>,
        update_ids: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn push_create(&self, record_type: &str, reply: Result<ProviderRecord, ProviderError>) {
            self.creates
                .lock()
                .expect("lock")
                .entry(record_type.to_string())
                .or_default()
                .push_back(reply);
        }

        fn push_list(
            &self,
            record_type: &str,
            reply: Result<Vec<ProviderRecord>, ProviderError>,
        ) {
            self.lists
                .lock()
                .expect("lock")
                .entry(record_type.to_string())
                .or_default()
                .push_back(reply);
        }

        fn push_update(&self, record_type: &str, reply: Result<ProviderRecord, ProviderError>) {
            self.updates
                .lock()
                .expect("lock")
                .entry(record_type.to_string())
                .or_default()
                .push_back(reply);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock").clone()
        }

        fn count(&self, call: &str) -> usize {
            self.calls().iter().filter(|c| c.as_str() == call).count()
        }

        fn update_ids(&self) -> Vec<String> {
            self.update_ids.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl DnsProvider for ScriptedProvider {
        async fn list_records(
            &self,
            record_type: &str,
            _fqdn: &str,
        ) -> Result<Vec<ProviderRecord>, ProviderError> {
            self.calls
                .lock()
                .expect("lock")
                .push(format!("list {record_type}"));
            self.lists
                .lock()
                .expect("lock")
                .get_mut(record_type)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| panic!("unexpected list call for {record_type}"))
        }

        async fn create_record(
            &self,
            payload: &RecordPayload,
        ) -> Result<ProviderRecord, ProviderError> {
            let record_type = payload.provider_type();
            self.calls
                .lock()
                .expect("lock")
                .push(format!("create {record_type}"));
            self.creates
                .lock()
                .expect("lock")
                .get_mut(record_type)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| panic!("unexpected create call for {record_type}"))
        }

        async fn update_record(
            &self,
            record_id: &str,
            payload: &RecordPayload,
        ) -> Result<ProviderRecord, ProviderError> {
            let record_type = payload.provider_type();
            self.calls
                .lock()
                .expect("lock")
                .push(format!("update {record_type}"));
            self.update_ids
                .lock()
                .expect("lock")
                .push(record_id.to_string());
            self.updates
                .lock()
                .expect("lock")
                .get_mut(record_type)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| panic!("unexpected update call for {record_type}"))
        }
    }

    fn reconciler(provider: Arc<ScriptedProvider>) -> Reconciler<ScriptedProvider> {
        Reconciler::new(provider, "example-mc.net").with_retry_policy(fast_policy())
    }

    #[tokio::test]
    async fn test_no_port_applies_address_only() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.push_create("A", Ok(record("id-a", "A", "survival.example-mc.net")));

        let result = reconciler(provider.clone()).reconcile(&request(None)).await;

        assert!(result.success());
        assert_eq!(
            result.address,
            RecordOutcome::Created {
                record_id: "id-a".to_string()
            }
        );
        assert_eq!(
            result.service_locator,
            RecordOutcome::Skipped,
            "no port means the service-locator record is skipped, not failed"
        );
        assert_eq!(provider.calls(), vec!["create A"]);
        assert_eq!(result.connection_string, "survival.example-mc.net");
    }

    #[tokio::test]
    async fn test_both_records_applied_with_port() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.push_create("A", Ok(record("id-a", "A", "survival.example-mc.net")));
        provider.push_create(
            "SRV",
            Ok(record("id-srv", "SRV", "_minecraft._tcp.survival.example-mc.net")),
        );

        let result = reconciler(provider.clone())
            .reconcile(&request(Some(25566)))
            .await;

        assert!(result.success());
        assert_eq!(result.address.record_id(), Some("id-a"));
        assert_eq!(result.service_locator.record_id(), Some("id-srv"));
        assert_eq!(result.fqdn, "survival.example-mc.net");
        assert_eq!(result.connection_string, "survival.example-mc.net:25566");
        assert_eq!(provider.count("create A"), 1);
        assert_eq!(provider.count("create SRV"), 1);
    }

    #[tokio::test]
    async fn test_conflict_routes_to_lookup_then_update() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.push_create("A", Err(ProviderError::Conflict { code: 81057 }));
        provider.push_list(
            "A",
            Ok(vec![record("existing-id", "A", "survival.example-mc.net")]),
        );
        provider.push_update("A", Ok(record("existing-id", "A", "survival.example-mc.net")));

        let result = reconciler(provider.clone()).reconcile(&request(None)).await;

        assert!(result.success());
        assert_eq!(
            result.address,
            RecordOutcome::Updated {
                record_id: "existing-id".to_string()
            },
            "the existing record id must be reused, never duplicated"
        );
        assert_eq!(
            provider.calls(),
            vec!["create A", "list A", "update A"],
            "exactly one lookup and one update; create is not retried as transient"
        );
        assert_eq!(
            provider.update_ids(),
            vec!["existing-id"],
            "the update targets the id the lookup found"
        );
    }

    #[tokio::test]
    async fn test_rejection_never_triggers_lookup() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.push_create(
            "A",
            Err(ProviderError::Rejected {
                code: 9207,
                message: "invalid record content".to_string(),
            }),
        );

        let result = reconciler(provider.clone()).reconcile(&request(None)).await;

        assert!(!result.success());
        assert!(matches!(
            &result.address,
            RecordOutcome::Failed {
                error: ProviderError::Rejected { code: 9207, .. }
            }
        ));
        assert_eq!(
            provider.count("list A"),
            0,
            "a non-conflict rejection must not be confused with a conflict"
        );
    }

    #[tokio::test]
    async fn test_conflict_with_empty_lookup_is_inconsistent() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.push_create("A", Err(ProviderError::Conflict { code: 81053 }));
        provider.push_list("A", Ok(vec![]));

        let result = reconciler(provider.clone()).reconcile(&request(None)).await;

        assert!(!result.success());
        assert!(matches!(
            &result.address,
            RecordOutcome::Failed {
                error: ProviderError::Inconsistent { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_partial_failure_does_not_roll_back() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.push_create("A", Ok(record("id-a", "A", "survival.example-mc.net")));
        provider.push_create(
            "SRV",
            Err(ProviderError::Rejected {
                code: 1004,
                message: "DNS Validation Error".to_string(),
            }),
        );

        let result = reconciler(provider.clone())
            .reconcile(&request(Some(25566)))
            .await;

        assert!(!result.success(), "one failed kind fails the aggregate");
        assert_eq!(
            result.address.record_id(),
            Some("id-a"),
            "the successful address apply stands"
        );
        assert!(result.service_locator.is_failed());

        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0.provider_type(), "SRV");
    }

    #[tokio::test]
    async fn test_transient_create_failures_retried() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.push_create("A", Err(transient()));
        provider.push_create("A", Err(transient()));
        provider.push_create("A", Ok(record("id-a", "A", "survival.example-mc.net")));

        let start = Instant::now();
        let result = reconciler(provider.clone()).reconcile(&request(None)).await;

        assert!(result.success());
        assert_eq!(provider.count("create A"), 3);
        // Two backoff sleeps happened: 20ms then 40ms.
        assert!(
            start.elapsed() >= Duration::from_millis(60),
            "elapsed time should reflect the backoff schedule"
        );
    }

    #[tokio::test]
    async fn test_transient_failures_exhaust_into_failed() {
        let provider = Arc::new(ScriptedProvider::default());
        for _ in 0..3 {
            provider.push_create("A", Err(transient()));
        }

        let result = reconciler(provider.clone()).reconcile(&request(None)).await;

        assert!(!result.success());
        assert!(matches!(
            &result.address,
            RecordOutcome::Failed {
                error: ProviderError::Transient { .. }
            }
        ));
        assert_eq!(provider.count("create A"), 3);
    }

    /// A provider whose calls never complete, for cancellation and timeout
    /// behavior.
    struct StalledProvider;

    #[async_trait]
    impl DnsProvider for StalledProvider {
        async fn list_records(
            &self,
            _record_type: &str,
            _fqdn: &str,
        ) -> Result<Vec<ProviderRecord>, ProviderError> {
            std::future::pending().await
        }

        async fn create_record(
            &self,
            _payload: &RecordPayload,
        ) -> Result<ProviderRecord, ProviderError> {
            std::future::pending().await
        }

        async fn update_record(
            &self,
            _record_id: &str,
            _payload: &RecordPayload,
        ) -> Result<ProviderRecord, ProviderError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancellation_marks_record_failed() {
        let reconciler = Reconciler::new(Arc::new(StalledProvider), "example-mc.net")
            .with_retry_policy(fast_policy());

        let cancel = CancellationToken::new();
        {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cancel.cancel();
            });
        }

        let start = Instant::now();
        let result = reconciler
            .reconcile_with_cancel(&request(None), &cancel)
            .await;

        assert!(!result.success());
        assert!(
            matches!(
                &result.address,
                RecordOutcome::Failed {
                    error: ProviderError::Cancelled
                }
            ),
            "an interrupted record is marked failed with a cancellation error, not left unknown"
        );
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_apply_timeout_marks_record_failed() {
        let reconciler = Reconciler::new(Arc::new(StalledProvider), "example-mc.net")
            .with_retry_policy(fast_policy())
            .with_apply_timeout(Duration::from_millis(50));

        let result = reconciler.reconcile(&request(None)).await;

        assert!(!result.success());
        assert!(matches!(
            &result.address,
            RecordOutcome::Failed {
                error: ProviderError::Timeout { .. }
            }
        ));
    }

    /// An in-memory provider with real conflict semantics: a second create for
    /// the same type and name fails with the provider's conflict code.
    #[derive(Default)]
    struct FakeDns {
        records: Mutex<HashMap<(String, String), (String, serde_json::Value)>>,
        next_id: AtomicU64,
    }

    impl FakeDns {
        fn record_count(&self) -> usize {
            self.records.lock().expect("lock").len()
        }

        fn content_of(&self, record_type: &str, fqdn: &str) -> Option<serde_json::Value> {
            self.records
                .lock()
                .expect("lock")
                .get(&(record_type.to_string(), fqdn.to_string()))
                .map(|(_, body)| body.clone())
        }
    }

    fn payload_name(payload: &RecordPayload) -> String {
        serde_json::to_value(payload).expect("payload serializes")["name"]
            .as_str()
            .expect("payload has a name")
            .to_string()
    }

    #[async_trait]
    impl DnsProvider for FakeDns {
        async fn list_records(
            &self,
            record_type: &str,
            fqdn: &str,
        ) -> Result<Vec<ProviderRecord>, ProviderError> {
            let records = self.records.lock().expect("lock");
            Ok(records
                .get(&(record_type.to_string(), fqdn.to_string()))
                .map(|(id, _)| record(id, record_type, fqdn))
                .into_iter()
                .collect())
        }

        async fn create_record(
            &self,
            payload: &RecordPayload,
        ) -> Result<ProviderRecord, ProviderError> {
            let key = (payload.provider_type().to_string(), payload_name(payload));
            let mut records = self.records.lock().expect("lock");
            if records.contains_key(&key) {
                return Err(ProviderError::Conflict { code: 81057 });
            }
            let id = format!("cf-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            let body = serde_json::to_value(payload).expect("payload serializes");
            records.insert(key.clone(), (id.clone(), body));
            Ok(record(&id, &key.0, &key.1))
        }

        async fn update_record(
            &self,
            record_id: &str,
            payload: &RecordPayload,
        ) -> Result<ProviderRecord, ProviderError> {
            let key = (payload.provider_type().to_string(), payload_name(payload));
            let mut records = self.records.lock().expect("lock");
            match records.get_mut(&key) {
                Some((id, body)) if id == record_id => {
                    *body = serde_json::to_value(payload).expect("payload serializes");
                    Ok(record(record_id, &key.0, &key.1))
                }
                _ => Err(ProviderError::Rejected {
                    code: 81044,
                    message: "Record does not exist.".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_reconcile_twice_is_idempotent() {
        let provider = Arc::new(FakeDns::default());
        let reconciler = Reconciler::new(provider.clone(), "example-mc.net")
            .with_retry_policy(fast_policy());
        let request = request(Some(25566));

        let first = reconciler.reconcile(&request).await;
        assert!(first.success());
        assert!(matches!(first.address, RecordOutcome::Created { .. }));
        assert!(matches!(first.service_locator, RecordOutcome::Created { .. }));

        let second = reconciler.reconcile(&request).await;
        assert!(second.success(), "re-reconciling unchanged state succeeds");
        assert!(matches!(second.address, RecordOutcome::Updated { .. }));
        assert_eq!(
            second.address.record_id(),
            first.address.record_id(),
            "the address record id is reused"
        );
        assert_eq!(
            second.service_locator.record_id(),
            first.service_locator.record_id(),
            "the service-locator record id is reused"
        );
        assert_eq!(
            provider.record_count(),
            2,
            "exactly one record per managed kind exists at the provider"
        );
    }

    #[tokio::test]
    async fn test_resubmission_with_new_address_updates_in_place() {
        let provider = Arc::new(FakeDns::default());
        let reconciler = Reconciler::new(provider.clone(), "example-mc.net")
            .with_retry_policy(fast_policy());

        let first = reconciler.reconcile(&request(None)).await;
        assert!(first.success());

        let moved = ReconciliationRequest {
            target_address: Ipv4Addr::new(198, 51, 100, 7),
            ..request(None)
        };
        let second = reconciler.reconcile(&moved).await;

        assert!(second.success());
        assert_eq!(
            second.address.record_id(),
            first.address.record_id(),
            "a changed address must update the same record, not duplicate it"
        );
        assert_eq!(provider.record_count(), 1);
        let body = provider
            .content_of("A", "survival.example-mc.net")
            .expect("record exists");
        assert_eq!(body["content"], "198.51.100.7");
    }
}
