use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use super::generator::GenerationError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Run one prompt through the generator.
///
/// Holds an upstream permit for the whole exchange, bounds the wait for that
/// permit and every attempt by `call_timeout`, and retries only
/// `NetworkError`s up to `max_retries` times. A request that never gets a
/// permit fails without retrying.
pub async fn generate_with_retry(state: &AppState, prompt: &str) -> Result<String, GenerationError> {
    let _permit = match timeout(state.call_timeout, state.upstream_permits.acquire()).await {
        Ok(Ok(permit)) => permit,
        Ok(Err(_)) => return Err(GenerationError::Network("upstream pool closed".to_string())),
        Err(_) => {
            warn!("no upstream capacity freed up in time");
            return Err(GenerationError::Network(format!(
                "no upstream capacity within {}s",
                state.call_timeout.as_secs_f32()
            )));
        }
    };

    let policy = state.retry;
    let mut attempt = 0;
    loop {
        let outcome = match timeout(state.call_timeout, state.generator.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Network(format!(
                "no answer within {}s",
                state.call_timeout.as_secs_f32()
            ))),
        };

        match outcome {
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                warn!(error = %err, attempt, "generation failed, retrying");
                sleep(policy.backoff * attempt).await;
            }
            Ok(text) => {
                if attempt > 0 {
                    info!(attempt, "generation succeeded after retry");
                }
                return Ok(text);
            }
            Err(err) => return Err(err),
        }
    }
}
