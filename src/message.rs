// src/message.rs
use serde::{Deserialize, Serialize};

pub const DEFAULT_EMOTION: &str = "neutral";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReplyRequest {
    #[serde(default)]
    pub emotion: Option<String>,
}

impl ReplyRequest {
    /// The caller's emotion label, or "neutral" when absent.
    pub fn emotion(&self) -> &str {
        self.emotion.as_deref().unwrap_or(DEFAULT_EMOTION)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReplyResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
