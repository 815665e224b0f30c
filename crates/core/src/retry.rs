use crate::error::RagError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Runs `operation` up to `max_retries + 1` times with exponential backoff
/// between attempts.
pub(crate) async fn with_retries<T, F, Fut>(
    backend: &str,
    max_retries: u32,
    operation: F,
) -> Result<T, RagError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RagError>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt < max_retries {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    warn!(
                        backend,
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs(),
                        error = %error,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(error);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| RagError::BackendResponse {
        backend: backend.to_string(),
        details: "retries exhausted".to_string(),
    }))
}
