#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use emotion_reply_backend::config::Config;
use emotion_reply_backend::services::generator::{GenerationError, TextGenerator};
use emotion_reply_backend::state::AppState;

/// Returns queued results in order and records every prompt it sees.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Upstream("script exhausted".to_string())))
    }
}

pub fn test_config() -> Config {
    Config {
        upstream_timeout: Duration::from_secs(5),
        retry_backoff: Duration::from_millis(1),
        ..Config::default()
    }
}

pub fn state_with(generator: Arc<ScriptedGenerator>) -> Arc<AppState> {
    Arc::new(AppState::new(&test_config(), generator))
}
