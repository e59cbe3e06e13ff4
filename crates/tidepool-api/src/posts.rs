use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use tidepool_db::models::NewPost;
use tidepool_types::api::{CreatePostRequest, PostDetailQuery, RandomPostResponse};
use tidepool_types::models::{Post, PostDetail};

use crate::convert;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .store(move |db| {
            db.create_post(&NewPost {
                id: &req.id,
                author: &req.author,
                title: &req.title,
                description: &req.description,
                score: req.score,
                hashtags: &req.hashtags,
                image: req.image.as_deref(),
            })
        })
        .await?;

    info!("Post {} created by {}", row.id, row.author);
    Ok((StatusCode::CREATED, Json(Post::from(row))))
}

/// GET /posts/{post_id}?viewer=: zero or one element. An unknown id is not an error.
pub async fn post_detail(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Query(query): Query<PostDetailQuery>,
) -> Result<Json<Vec<PostDetail>>, ApiError> {
    let row = state
        .store(move |db| db.post_detail(&post_id, &query.viewer))
        .await?;
    Ok(Json(row.into_iter().map(PostDetail::from).collect()))
}

/// GET /users/{username}/posts
pub async fn user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let rows = state.store(move |db| db.user_posts(&username)).await?;
    Ok(Json(convert::all(rows)))
}

/// GET /posts/random: zero or one element.
pub async fn random_post(
    State(state): State<AppState>,
) -> Result<Json<Vec<RandomPostResponse>>, ApiError> {
    let id = state.store(|db| db.random_post_id()).await?;
    Ok(Json(id.into_iter().map(|id| RandomPostResponse { id }).collect()))
}
