use axum::{
    Json,
    extract::{Query, State},
};

use tidepool_types::api::FeedQuery;
use tidepool_types::models::EnrichedPost;

use crate::convert;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /feed?user=: posts by everyone `user` follows, newest first.
pub async fn home_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<EnrichedPost>>, ApiError> {
    let rows = state.store(move |db| db.home_feed(&query.user)).await?;
    Ok(Json(convert::all(rows)))
}
