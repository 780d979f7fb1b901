//! A participant's cluster and group assignment under the latest snapshot.
//!
//! Resolution goes through [`ClusterIndexResolver`]; a participant the math
//! worker has not placed yet comes back with null ids rather than an error.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;

use crate::cache::{CacheError, Lookup};
use crate::resolver::ClusterIndexResolver;
use crate::store::{RecomputeQueue, Store};
use crate::types::{BaseClusterId, ConversationId, GroupId, MathTick, ParticipantId};

use super::AppState;

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("no results computed yet for {conversation}")]
    NoResults { conversation: ConversationId },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl IntoResponse for AssignmentError {
    fn into_response(self) -> Response {
        let status = match self {
            AssignmentError::NoResults { .. } => StatusCode::NOT_FOUND,
            AssignmentError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub conversation: ConversationId,
    pub participant: ParticipantId,
    pub math_tick: MathTick,

    /// `None` means the participant is unassigned under this snapshot.
    pub base_cluster_id: Option<BaseClusterId>,
    pub group_id: Option<GroupId>,
}

pub async fn assignment_handler<S, Q>(
    State(app): State<AppState<S, Q>>,
    Path((conversation, participant)): Path<(u64, u64)>,
) -> Result<Json<AssignmentResponse>, AssignmentError>
where
    S: Store + 'static,
    Q: RecomputeQueue + 'static,
{
    let conversation = ConversationId(conversation);
    let participant = ParticipantId(participant);

    app.cache().ensure_cached(app.store(), conversation).await?;

    let entry = match app.cache().get(conversation, None) {
        Lookup::Fresh(entry) => entry,
        Lookup::NotModified => return Err(AssignmentError::NoResults { conversation }),
    };

    let resolver = ClusterIndexResolver::new(&entry.snapshot);
    Ok(Json(AssignmentResponse {
        conversation,
        participant,
        math_tick: entry.math_tick,
        base_cluster_id: resolver.base_cluster_id(participant),
        group_id: resolver.group_id(participant),
    }))
}
