use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public view of a registered user. The credential never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub photo: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author: String,
    pub title: String,
    pub description: String,
    pub score: f64,
    pub hashtags: Vec<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A post joined with its author's profile photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPost {
    #[serde(flatten)]
    pub post: Post,
    pub author_photo: String,
}

/// Single-post view: the enriched post plus whether the viewer follows its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author_photo: String,
    pub is_following: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follower {
    pub username: String,
    pub photo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub photo: String,
    pub follower_count: i64,
}

/// Hashtag set of one post, as listed on an author's page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostHashtags {
    pub post_id: String,
    pub title: String,
    pub hashtags: Vec<String>,
}

/// Result of the registration precondition check. Email collisions win over
/// username collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    EmailTaken,
    UsernameTaken,
}
