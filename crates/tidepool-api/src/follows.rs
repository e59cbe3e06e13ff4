use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use tidepool_types::api::{
    FollowQuery, FollowerCountResponse, IsFollowingResponse, SetFollowStateRequest,
};
use tidepool_types::models::Follower;

use crate::convert;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /follows: follow or unfollow depending on `follow`.
pub async fn set_follow_state(
    State(state): State<AppState>,
    Json(req): Json<SetFollowStateRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .store(move |db| db.set_follow_state(&req.follower, &req.followed, req.follow))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /follows?follower=&followed=
pub async fn is_following(
    State(state): State<AppState>,
    Query(query): Query<FollowQuery>,
) -> Result<Json<IsFollowingResponse>, ApiError> {
    let is_following = state
        .store(move |db| db.is_following(&query.follower, &query.followed))
        .await?;
    Ok(Json(IsFollowingResponse { is_following }))
}

/// GET /users/{username}/followers
pub async fn list_followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Follower>>, ApiError> {
    let rows = state.store(move |db| db.list_followers(&username)).await?;
    Ok(Json(convert::all(rows)))
}

/// GET /users/{username}/followers/count
pub async fn follower_count(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<FollowerCountResponse>, ApiError> {
    let count = state.store(move |db| db.follower_count(&username)).await?;
    Ok(Json(FollowerCountResponse { count }))
}
