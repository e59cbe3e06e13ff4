use serde::{Deserialize, Serialize};

use crate::models::Availability;

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub status: Availability,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PhotoBody {
    pub photo: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowerCountResponse {
    pub count: i64,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub id: String,
    pub author: String,
    pub title: String,
    pub description: String,
    pub score: f64,
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub user: String,
}

/// Raw search parameters. Empty strings mean "no filter on this field".
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub hashtag: String,
}

#[derive(Debug, Deserialize)]
pub struct HashtagQuery {
    pub hashtag: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostDetailQuery {
    #[serde(default)]
    pub viewer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RandomPostResponse {
    pub id: String,
}

// -- Follows --

#[derive(Debug, Deserialize)]
pub struct FollowQuery {
    pub follower: String,
    pub followed: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetFollowStateRequest {
    pub follower: String,
    pub followed: String,
    pub follow: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IsFollowingResponse {
    pub is_following: bool,
}

// -- Uploads --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadTargetRequest {
    pub file_name: String,
    pub file_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTargetResponse {
    pub upload_url: String,
    pub file_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
