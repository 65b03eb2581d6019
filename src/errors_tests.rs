// Copyright (c) 2026 the subcraft authors
// SPDX-License-Identifier: MIT

//! Unit tests for `errors.rs`

#[cfg(test)]
mod tests {
    use super::super::ProviderError;

    #[test]
    fn test_transient_errors_are_transient() {
        let network = ProviderError::Transient {
            reason: "connection refused".to_string(),
        };
        assert!(network.is_transient(), "network errors should be retryable");

        let timeout = ProviderError::Timeout { timeout_ms: 5000 };
        assert!(timeout.is_transient(), "timeouts should be retryable");
    }

    #[test]
    fn test_conflict_is_not_transient() {
        let conflict = ProviderError::Conflict { code: 81057 };
        assert!(
            !conflict.is_transient(),
            "a conflict routes to lookup-then-update, it is never retried as transient"
        );
        assert!(conflict.is_conflict());
    }

    #[test]
    fn test_terminal_errors_are_not_transient() {
        let rejected = ProviderError::Rejected {
            code: 9207,
            message: "invalid record content".to_string(),
        };
        assert!(!rejected.is_transient(), "rejections are terminal");
        assert!(!rejected.is_conflict());

        let cancelled = ProviderError::Cancelled;
        assert!(!cancelled.is_transient(), "cancellation is terminal");

        let inconsistent = ProviderError::Inconsistent {
            fqdn: "survival.example-mc.net".to_string(),
        };
        assert!(!inconsistent.is_transient());
    }

    #[test]
    fn test_rejected_display_carries_provider_detail() {
        let rejected = ProviderError::Rejected {
            code: 9207,
            message: "invalid record content".to_string(),
        };
        let text = rejected.to_string();
        assert!(text.contains("9207"));
        assert!(text.contains("invalid record content"));
    }

    #[test]
    fn test_conflict_display_carries_code() {
        let conflict = ProviderError::Conflict { code: 81053 };
        assert!(conflict.to_string().contains("81053"));
    }
}
