pub mod convert;
pub mod error;
pub mod feed;
pub mod follows;
pub mod posts;
pub mod search;
pub mod state;
pub mod uploads;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// All routes, without transport layers (CORS, tracing) which the binary adds.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/feed", get(feed::home_feed))
        .route("/posts", post(posts::create_post))
        .route("/posts/search", get(search::search_posts))
        .route("/posts/random", get(posts::random_post))
        .route("/posts/{post_id}", get(posts::post_detail))
        .route("/users", post(users::create_user))
        .route("/users/availability", get(users::check_availability))
        .route("/users/{username}/photo", get(users::get_photo).put(users::set_photo))
        .route("/users/{username}/profile", get(users::get_profile))
        .route("/users/{username}/followers", get(follows::list_followers))
        .route("/users/{username}/followers/count", get(follows::follower_count))
        .route("/users/{username}/posts", get(posts::user_posts))
        .route("/users/{username}/posts/by-hashtag", get(search::posts_by_hashtag))
        .route("/users/{username}/hashtags", get(search::hashtags_for_user))
        .route("/follows", get(follows::is_following).post(follows::set_follow_state))
        .route("/uploads", post(uploads::issue_upload_target))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
