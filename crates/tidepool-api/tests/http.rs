//! End-to-end tests: drive the router in-process against an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use tidepool_api::router;
use tidepool_api::state::AppStateInner;
use tidepool_api::uploads::SignedUrlIssuer;
use tidepool_db::Database;

fn app() -> Router {
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        store_timeout: Duration::from_secs(5),
        uploads: Box::new(SignedUrlIssuer::new(
            "https://uploads.example.com/tidepool",
            "https://cdn.example.com",
            "test-secret",
            Duration::from_secs(60),
        )),
    });
    router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

async fn create_user(app: &Router, id: &str, username: &str) {
    let (status, body) = post(
        app,
        "/users",
        json!({
            "id": id,
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "hunter2",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
}

async fn create_post(app: &Router, id: &str, author: &str, title: &str, hashtags: &[&str]) -> (StatusCode, Value) {
    post(
        app,
        "/posts",
        json!({
            "id": id,
            "author": author,
            "title": title,
            "description": "test post",
            "score": 4.0,
            "hashtags": hashtags,
        }),
    )
    .await
}

async fn set_follow(app: &Router, follower: &str, followed: &str, follow: bool) -> StatusCode {
    post(
        app,
        "/follows",
        json!({ "follower": follower, "followed": followed, "follow": follow }),
    )
    .await
    .0
}

/// alice follows bob; bob posted "Cat nap" #cat, carol posted "Dog walk" #dog.
async fn fixture() -> Router {
    let app = app();
    create_user(&app, "u-alice", "alice").await;
    create_user(&app, "u-bob", "bob").await;
    create_user(&app, "u-carol", "carol").await;
    assert_eq!(set_follow(&app, "alice", "bob", true).await, StatusCode::NO_CONTENT);
    assert_eq!(create_post(&app, "1", "bob", "Cat nap", &["cat"]).await.0, StatusCode::CREATED);
    assert_eq!(create_post(&app, "2", "carol", "Dog walk", &["dog"]).await.0, StatusCode::CREATED);
    app
}

fn ids(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn fixture_feed_search_and_follow_state() {
    let app = fixture().await;

    let (status, feed) = get(&app, "/feed?user=alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&feed), vec!["1"]);
    assert_eq!(feed[0]["author"], "bob");
    assert_eq!(feed[0]["author_photo"], "");

    let (_, found) = get(&app, "/posts/search?title=&hashtag=dog").await;
    assert_eq!(ids(&found), vec!["2"]);

    let (_, following) = get(&app, "/follows?follower=alice&followed=carol").await;
    assert_eq!(following, json!({ "is_following": false }));
}

#[tokio::test]
async fn search_modes() {
    let app = fixture().await;
    create_post(&app, "3", "carol", "cat and dog", &["dog"]).await;
    create_post(&app, "4", "bob", "cat alone", &["solo"]).await;

    let (_, by_title) = get(&app, "/posts/search?title=cat&hashtag=").await;
    assert_eq!(ids(&by_title), vec!["4", "3"]);

    let (_, by_both) = get(&app, "/posts/search?title=cat&hashtag=dog").await;
    assert_eq!(ids(&by_both), vec!["3"]);

    let (status, _) = get(&app, "/posts/search?title=&hashtag=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn follow_lifecycle() {
    let app = fixture().await;

    assert_eq!(set_follow(&app, "carol", "bob", true).await, StatusCode::NO_CONTENT);
    let (_, followers) = get(&app, "/users/bob/followers").await;
    assert_eq!(
        followers,
        json!([{ "username": "alice", "photo": "" }, { "username": "carol", "photo": "" }])
    );

    // second follow is rejected and leaves the count alone
    assert_eq!(set_follow(&app, "carol", "bob", true).await, StatusCode::CONFLICT);
    let (_, count) = get(&app, "/users/bob/followers/count").await;
    assert_eq!(count, json!({ "count": 2 }));

    assert_eq!(set_follow(&app, "carol", "bob", false).await, StatusCode::NO_CONTENT);
    assert_eq!(set_follow(&app, "carol", "bob", false).await, StatusCode::NO_CONTENT);
    let (_, following) = get(&app, "/follows?follower=carol&followed=bob").await;
    assert_eq!(following["is_following"], false);

    assert_eq!(set_follow(&app, "carol", "carol", true).await, StatusCode::BAD_REQUEST);
    assert_eq!(set_follow(&app, "carol", "ghost", true).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_detail_and_random() {
    let app = fixture().await;

    let (_, detail) = get(&app, "/posts/1?viewer=alice").await;
    assert_eq!(detail.as_array().unwrap().len(), 1);
    assert_eq!(detail[0]["is_following"], true);
    assert_eq!(detail[0]["hashtags"], json!(["cat"]));

    let (_, detail) = get(&app, "/posts/2?viewer=alice").await;
    assert_eq!(detail[0]["is_following"], false);

    let (status, missing) = get(&app, "/posts/404?viewer=alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(missing, json!([]));

    let (_, random) = get(&app, "/posts/random").await;
    let id = random[0]["id"].as_str().unwrap();
    assert!(id == "1" || id == "2");
}

#[tokio::test]
async fn user_pages() {
    let app = fixture().await;

    let (_, profile) = get(&app, "/users/bob/profile").await;
    assert_eq!(
        profile,
        json!([{ "id": "u-bob", "username": "bob", "photo": "", "follower_count": 1 }])
    );
    let (_, profile) = get(&app, "/users/ghost/profile").await;
    assert_eq!(profile, json!([]));

    let status = send(
        &app,
        Method::PUT,
        "/users/bob/photo",
        Some(json!({ "photo": "https://cdn.example.com/bob.png" })),
    )
    .await
    .0;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, photo) = get(&app, "/users/bob/photo").await;
    assert_eq!(photo, json!({ "photo": "https://cdn.example.com/bob.png" }));
    let (_, photo) = get(&app, "/users/ghost/photo").await;
    assert_eq!(photo, Value::Null);

    let (_, posts) = get(&app, "/users/bob/posts").await;
    assert_eq!(ids(&posts), vec!["1"]);

    let (_, tagged) = get(&app, "/users/carol/posts/by-hashtag?hashtag=dog").await;
    assert_eq!(ids(&tagged), vec!["2"]);
    let (_, tagged) = get(&app, "/users/bob/posts/by-hashtag?hashtag=dog").await;
    assert_eq!(tagged, json!([]));

    let (_, hashtags) = get(&app, "/users/bob/hashtags").await;
    assert_eq!(
        hashtags,
        json!([{ "post_id": "1", "title": "Cat nap", "hashtags": ["cat"] }])
    );
}

#[tokio::test]
async fn registration_rules() {
    let app = fixture().await;

    let (_, status) = get(&app, "/users/availability?username=alice&email=alice@example.com").await;
    assert_eq!(status, json!({ "status": "email_taken" }));
    let (_, status) = get(&app, "/users/availability?username=alice&email=new@example.com").await;
    assert_eq!(status, json!({ "status": "username_taken" }));
    let (_, status) = get(&app, "/users/availability?username=dana&email=dana@example.com").await;
    assert_eq!(status, json!({ "status": "available" }));

    let (status, body) = post(
        &app,
        "/users",
        json!({ "id": "u-x", "username": "alice", "email": "x@example.com", "password": "pw" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("username"));

    let (status, body) = post(
        &app,
        "/users",
        json!({ "id": "u-dana", "username": "dana", "email": "dana@example.com", "password": "pw" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "dana");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn duplicate_post_is_rejected() {
    let app = fixture().await;

    let (status, _) = create_post(&app, "1", "carol", "Again", &["x"]).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (_, posts) = get(&app, "/users/carol/posts").await;
    assert_eq!(ids(&posts), vec!["2"]);

    let (status, _) = create_post(&app, "9", "ghost", "Nobody", &["x"]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_targets() {
    let app = app();

    let (status, target) = post(
        &app,
        "/uploads",
        json!({ "file_name": "cat.png", "file_type": "image/png" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let file_url = target["file_url"].as_str().unwrap();
    assert!(file_url.starts_with("https://cdn.example.com/images/"));
    assert!(file_url.ends_with("-cat.png"));
    assert!(target["upload_url"].as_str().unwrap().contains("signature="));

    let (status, _) = post(&app, "/uploads", json!({ "file_name": "", "file_type": "image/png" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_check() {
    let (status, body) = get(&app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}
