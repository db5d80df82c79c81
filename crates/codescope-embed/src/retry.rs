use std::future::Future;
use std::time::Duration;

use crate::error::EmbedError;

const BASE_BACKOFF_SECS: u64 = 1;

/// Parse the `Retry-After` header value as seconds, falling back to exponential backoff.
pub(crate) fn retry_delay(response: &reqwest::Response, attempt: u32) -> Duration {
    if let Some(val) = response.headers().get("retry-after")
        && let Ok(s) = val.to_str()
        && let Ok(secs) = s.trim().parse::<u64>()
    {
        return Duration::from_secs(secs);
    }
    backoff(attempt)
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(BASE_BACKOFF_SECS << attempt.min(16))
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

/// Send an HTTP request, retrying up to `max_retries` times on transient failures.
///
/// Transient means HTTP 429, any 5xx status, or a connect/timeout error. A 5xx on the
/// final attempt is handed back to the caller so it can report the status and body.
///
/// # Errors
///
/// Returns `EmbedError::RateLimited` if every attempt was answered with 429, or the
/// underlying `reqwest::Error` wrapped as `EmbedError::Http` for transport failures.
pub(crate) async fn send_with_retry<F, Fut>(
    provider_name: &str,
    max_retries: u32,
    mut f: F,
) -> Result<reqwest::Response, EmbedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..=max_retries {
        let response = match f().await {
            Ok(response) => response,
            Err(e) if is_transient(&e) && attempt < max_retries => {
                let delay = backoff(attempt);
                tracing::warn!(
                    provider = provider_name,
                    error = %e,
                    "request failed, retrying in {}s ({}/{max_retries})",
                    delay.as_secs(),
                    attempt + 1,
                );
                tokio::time::sleep(delay).await;
                continue;
            }
            Err(e) => return Err(EmbedError::Http(e)),
        };
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            if attempt == max_retries {
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(EmbedError::RateLimited);
                }
                return Ok(response);
            }
            let delay = retry_delay(&response, attempt);
            tracing::warn!(
                provider = provider_name,
                status = status.as_u16(),
                "request throttled, retrying in {}s ({}/{max_retries})",
                delay.as_secs(),
                attempt + 1,
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        return Ok(response);
    }

    Err(EmbedError::RateLimited)
}
