#[cfg(test)]
mod tests {
    use alloy::transports::http::reqwest::Url;
    use chain::error::{ChainError, is_range_rejection};
    use chain::rpc::NodeClient;

    #[test]
    fn test_range_rejections_are_recognised() {
        assert!(is_range_rejection("query returned more than 10000 results"));
        assert!(is_range_rejection("Block range is too wide"));
        assert!(is_range_rejection("exceed maximum block range: 5000"));
        assert!(is_range_rejection("eth_getLogs limit exceeded"));
        assert!(!is_range_rejection("header not found"));
        assert!(!is_range_rejection("execution reverted"));
    }

    #[test]
    fn test_only_network_errors_are_transient() {
        assert!(ChainError::Network("connection reset".into()).is_transient());
        assert!(
            !ChainError::RangeTooLarge { from: 1, to: 100_000, reason: "too wide".into() }
                .is_transient()
        );
        assert!(!ChainError::Subscription("filter not found".into()).is_transient());
    }

    #[tokio::test]
    async fn test_unreachable_node_reports_network_error() {
        // Nothing listens on the discard port.
        let node_client = NodeClient::new(Url::parse("http://127.0.0.1:9").unwrap());

        let err = node_client.get_latest_block_number().await.unwrap_err();

        assert!(err.is_transient(), "unexpected error kind: {err:?}");
    }
}
