use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::info;

use crate::{
    error::AppError,
    message::{ReplyRequest, ReplyResponse},
    services::{prompt::build_prompt, reply::generate_with_retry},
    state::SharedState,
};

pub async fn get_reply_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ReplyRequest>, JsonRejection>,
) -> Result<Json<ReplyResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    let emotion = payload.emotion();
    info!(emotion, "reply requested");

    let prompt = build_prompt(emotion);
    let reply = generate_with_retry(&state, &prompt).await?;

    Ok(Json(ReplyResponse { reply }))
}
