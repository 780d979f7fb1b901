//! Recompute trigger.
//!
//! Queues the conversation for the external math worker and drops the
//! cache's absent memo so the result lands as soon as it is computed. The
//! work itself happens elsewhere; this endpoint only acknowledges the queue
//! write.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::info;

use crate::store::{RecomputeQueue, Store, StoreError};
use crate::types::ConversationId;

use super::AppState;

#[derive(Debug, Error)]
pub enum RecomputeError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for RecomputeError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

pub async fn recompute_handler<S, Q>(
    State(app): State<AppState<S, Q>>,
    Path(conversation): Path<u64>,
) -> Result<StatusCode, RecomputeError>
where
    S: Store + 'static,
    Q: RecomputeQueue + 'static,
{
    let conversation = ConversationId(conversation);

    app.recompute().enqueue_recompute(conversation).await?;
    app.cache().mark_dirty(conversation);

    info!(conversation = %conversation, "recompute queued");
    Ok(StatusCode::ACCEPTED)
}
