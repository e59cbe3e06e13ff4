use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use tidepool_db::models::NewUser;
use tidepool_types::api::{AvailabilityQuery, AvailabilityResponse, CreateUserRequest, PhotoBody};
use tidepool_types::models::{User, UserProfile};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /users: the credential is stored as given and never echoed back.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .store(move |db| {
            db.create_user(&NewUser {
                id: &req.id,
                username: &req.username,
                email: &req.email,
                password: &req.password,
            })
        })
        .await?;

    info!("Registered user {}", row.username);
    Ok((StatusCode::CREATED, Json(User::from(row))))
}

/// GET /users/availability?username=&email=
pub async fn check_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let status = state
        .store(move |db| db.check_availability(&query.username, &query.email))
        .await?;
    Ok(Json(AvailabilityResponse { status }))
}

/// GET /users/{username}/photo: `null` for unknown users.
pub async fn get_photo(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Option<PhotoBody>>, ApiError> {
    let photo = state.store(move |db| db.get_user_photo(&username)).await?;
    Ok(Json(photo.map(|photo| PhotoBody { photo })))
}

/// PUT /users/{username}/photo
pub async fn set_photo(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(body): Json<PhotoBody>,
) -> Result<StatusCode, ApiError> {
    state
        .store(move |db| db.set_user_photo(&username, &body.photo))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/{username}/profile: zero or one element.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let profile = state.store(move |db| db.get_user_profile(&username)).await?;
    Ok(Json(profile.into_iter().map(UserProfile::from).collect()))
}
