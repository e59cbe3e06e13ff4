use axum::{
    Json,
    extract::{Path, Query, State},
};

use tidepool_db::models::SearchFilter;
use tidepool_types::api::{HashtagQuery, SearchQuery};
use tidepool_types::models::{EnrichedPost, PostHashtags};

use crate::convert;
use crate::error::ApiError;
use crate::state::AppState;

/// Empty query fields switch their filter off.
fn filter_from_query(query: SearchQuery) -> SearchFilter {
    let non_empty = |value: String| (!value.is_empty()).then_some(value);
    SearchFilter {
        title: non_empty(query.title),
        hashtag: non_empty(query.hashtag),
    }
}

/// GET /posts/search?title=&hashtag=
pub async fn search_posts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<EnrichedPost>>, ApiError> {
    let filter = filter_from_query(query);
    let rows = state.store(move |db| db.search_posts(&filter)).await?;
    Ok(Json(convert::all(rows)))
}

/// GET /users/{username}/posts/by-hashtag?hashtag=
pub async fn posts_by_hashtag(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<HashtagQuery>,
) -> Result<Json<Vec<EnrichedPost>>, ApiError> {
    let rows = state
        .store(move |db| db.posts_by_hashtag_for_user(&query.hashtag, &username))
        .await?;
    Ok(Json(convert::all(rows)))
}

/// GET /users/{username}/hashtags
pub async fn hashtags_for_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<PostHashtags>>, ApiError> {
    let rows = state.store(move |db| db.hashtags_for_user(&username)).await?;
    Ok(Json(convert::all(rows)))
}
