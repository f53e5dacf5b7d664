// src/state.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::config::Config;
use crate::services::generator::TextGenerator;
use crate::services::reply::RetryPolicy;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub retry: RetryPolicy,
    pub call_timeout: Duration,
    pub upstream_permits: Semaphore,
}

impl AppState {
    pub fn new(config: &Config, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            retry: RetryPolicy {
                backoff: config.retry_backoff,
                ..RetryPolicy::default()
            },
            call_timeout: config.upstream_timeout,
            upstream_permits: Semaphore::new(config.max_concurrent_upstream),
        }
    }
}
