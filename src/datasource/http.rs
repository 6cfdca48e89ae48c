//! JSON POST with retry, shared by the indexer and RPC clients.

use super::DataSourceError;
use backoff::future::retry_notify;
use backoff::ExponentialBackoff;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::warn;

/// Give up on a single remote query after this long.
const MAX_RETRY_ELAPSED: Duration = Duration::from_secs(20);

/// Longest excerpt of an error body carried into the error message.
const ERROR_BODY_LIMIT: usize = 200;

/// POST `payload` to `url`. Network errors, 429 and 5xx are retried with
/// exponential backoff; other failures return immediately.
pub(crate) async fn post_json(
    client: &Client,
    url: &str,
    payload: &serde_json::Value,
) -> Result<serde_json::Value, DataSourceError> {
    let policy = ExponentialBackoff {
        max_elapsed_time: Some(MAX_RETRY_ELAPSED),
        ..Default::default()
    };

    let notify = |e: DataSourceError, wait: Duration| {
        warn!("Request to {} failed ({}), retrying in {:?}", url, e, wait);
    };

    let attempt = || async {
        let response = client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| backoff::Error::transient(DataSourceError::NetworkError(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
    };

    retry_notify(policy, attempt, notify).await
}

/// Classify a non-success HTTP status as retryable or final.
fn status_error(status: StatusCode, body: &str) -> backoff::Error<DataSourceError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return backoff::Error::transient(DataSourceError::RateLimited);
    }
    let message: String = body.trim().chars().take(ERROR_BODY_LIMIT).collect();
    let err = DataSourceError::HttpError {
        status: status.as_u16(),
        message,
    };
    if status.is_server_error() {
        backoff::Error::transient(err)
    } else {
        backoff::Error::permanent(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_transient(err: &backoff::Error<DataSourceError>) -> bool {
        matches!(err, backoff::Error::Transient { .. })
    }

    #[test]
    fn test_rate_limit_is_retried() {
        let err = status_error(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(is_transient(&err));
    }

    #[test]
    fn test_server_error_is_retried() {
        let err = status_error(StatusCode::BAD_GATEWAY, "upstream timeout");
        assert!(is_transient(&err));
    }

    #[test]
    fn test_client_error_is_final() {
        match status_error(StatusCode::BAD_REQUEST, "  bad query  ") {
            backoff::Error::Permanent(DataSourceError::HttpError { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad query");
            }
            other => panic!("Expected permanent HttpError, got {:?}", other),
        }
    }

    #[test]
    fn test_error_body_truncated() {
        let body = "x".repeat(1000);
        match status_error(StatusCode::NOT_FOUND, &body) {
            backoff::Error::Permanent(DataSourceError::HttpError { message, .. }) => {
                assert_eq!(message.len(), ERROR_BODY_LIMIT);
            }
            other => panic!("Expected permanent HttpError, got {:?}", other),
        }
    }
}
