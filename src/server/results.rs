//! Conditional delivery of clustering result snapshots.
//!
//! A client may make its request conditional in exactly one way: an explicit
//! `math_tick` query parameter, or validator tokens in `If-None-Match`.
//! Supplying both is rejected outright rather than guessing which the client
//! meant. Either way the condition resolves to a freshness floor, and the
//! cache serves a payload only when it holds something strictly newer.
//!
//! Anything else is a single uniform empty not-modified response. A client
//! cannot tell "unchanged" apart from "never computed"; clients poll, and the
//! payload arrives on a later poll once the math worker has produced it.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::cache::{floor_from_header, CacheError, Lookup};
use crate::store::{RecomputeQueue, Store};
use crate::types::{ConversationId, MathTick};

use super::AppState;

#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("supply either math_tick or If-None-Match, not both")]
    AmbiguousCondition,

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl IntoResponse for ResultsError {
    fn into_response(self) -> Response {
        let status = match self {
            ResultsError::AmbiguousCondition => StatusCode::BAD_REQUEST,
            ResultsError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    math_tick: Option<u64>,
}

pub async fn results_handler<S, Q>(
    State(app): State<AppState<S, Q>>,
    Path(conversation): Path<u64>,
    Query(query): Query<ResultsQuery>,
    headers: HeaderMap,
) -> Result<Response, ResultsError>
where
    S: Store + 'static,
    Q: RecomputeQueue + 'static,
{
    let conversation = ConversationId(conversation);

    let validator_header = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok());
    if query.math_tick.is_some() && validator_header.is_some() {
        return Err(ResultsError::AmbiguousCondition);
    }
    let floor = match query.math_tick {
        Some(tick) => Some(MathTick(tick)),
        None => validator_header.and_then(floor_from_header),
    };

    app.cache().ensure_cached(app.store(), conversation).await?;

    match app.cache().get(conversation, floor) {
        Lookup::Fresh(entry) => {
            debug!(
                conversation = %conversation,
                math_tick = %entry.math_tick,
                "serving cached results"
            );
            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/json".to_owned()),
                    (header::CONTENT_ENCODING, "gzip".to_owned()),
                    (header::ETAG, entry.validator.as_str().to_owned()),
                ],
                entry.gzipped.clone(),
            )
                .into_response())
        }
        Lookup::NotModified => Ok(StatusCode::NOT_MODIFIED.into_response()),
    }
}
