//! Concurrent wallet lookups with an all-settle join.

use std::time::Duration;

use futures::future::join_all;
use tracing::debug;

use crate::wallet::error::WalletError;
use crate::wallet::source::WalletSource;
use crate::wallet::types::{WalletQuery, WalletResult};

/// Run one lookup under `timeout`, folding every failure into the result.
pub async fn settle(
    source: &dyn WalletSource,
    query: &WalletQuery,
    timeout: Duration,
) -> WalletResult {
    match tokio::time::timeout(timeout, source.fetch(query)).await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            debug!(address = %query.address, chain = %query.chain, error = %err, "Wallet lookup failed");
            WalletResult::failed(query, err.reason())
        }
        Err(_) => {
            let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            debug!(address = %query.address, chain = %query.chain, millis, "Wallet lookup timed out");
            WalletResult::failed(query, WalletError::Timeout(millis).reason())
        }
    }
}

/// Look up every query concurrently.
///
/// Waits for all lookups to settle. The output has one entry per query, in
/// query order.
pub async fn fan_out(
    source: &dyn WalletSource,
    queries: &[WalletQuery],
    timeout: Duration,
) -> Vec<WalletResult> {
    join_all(queries.iter().map(|query| settle(source, query, timeout))).await
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::wallet::source::EndpointWalletSource;
    use crate::wallet::types::Chain;
    use async_trait::async_trait;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FailingSource;

    #[async_trait]
    impl WalletSource for FailingSource {
        async fn fetch(&self, _query: &WalletQuery) -> Result<WalletResult, WalletError> {
            Err(WalletError::Rpc("UNKNOWN_ACCOUNT".to_string()))
        }
    }

    #[tokio::test]
    async fn test_one_timeout_does_not_drop_the_other() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("address", "fast.near"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "address": "fast.near",
                "chain": "near",
                "balance": "3.0000 NEAR"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("address", "slow.near"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(10))
                    .set_body_json(serde_json::json!({
                        "address": "slow.near",
                        "chain": "near",
                        "balance": "9.0000 NEAR"
                    })),
            )
            .mount(&server)
            .await;

        let source = EndpointWalletSource::new(reqwest::Client::new(), &server.uri()).unwrap();
        let queries = vec![
            WalletQuery::new("slow.near", Chain::Near),
            WalletQuery::new("fast.near", Chain::Near),
        ];
        let timeout = Duration::from_millis(200);

        let started = Instant::now();
        let results = fan_out(&source, &queries, timeout).await;
        let elapsed = started.elapsed();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].address, "slow.near");
        assert!(results[0].error.is_some());
        assert_eq!(results[1].address, "fast.near");
        assert!(results[1].error.is_none());
        assert!(elapsed < timeout + Duration::from_secs(2), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_errors_become_results() {
        let queries = vec![
            WalletQuery::new("a.near", Chain::Near),
            WalletQuery::new("b.near", Chain::Near),
        ];
        let results = fan_out(&FailingSource, &queries, Duration::from_secs(1)).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(WalletResult::is_error));
        assert_eq!(results[1].error.as_deref(), Some("UNKNOWN_ACCOUNT"));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        assert!(fan_out(&FailingSource, &[], Duration::from_secs(1)).await.is_empty());
    }
}
