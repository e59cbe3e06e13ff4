//! Row to API model conversions.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use crate::models::{
    EnrichedPostRow, FollowerRow, HashtagRow, PostDetailRow, PostRow, ProfileRow, UserRow,
};
use tidepool_types::models::{
    EnrichedPost, Follower, Post, PostDetail, PostHashtags, User, UserProfile,
};

/// Store timestamps are RFC 3339; rows written by older tooling may carry
/// SQLite's bare "YYYY-MM-DD HH:MM:SS" form, which is read as UTC.
fn parse_timestamp(raw: &str, owner: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on '{}': {}", raw, owner, e);
            DateTime::default()
        })
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let created_at = parse_timestamp(&row.created_at, &row.id);
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            photo: row.photo,
            created_at,
        }
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let created_at = parse_timestamp(&row.created_at, &row.id);
        Post {
            id: row.id,
            author: row.author,
            title: row.title,
            description: row.description,
            score: row.score,
            hashtags: row.hashtags,
            image: row.image,
            created_at,
        }
    }
}

impl From<EnrichedPostRow> for EnrichedPost {
    fn from(row: EnrichedPostRow) -> Self {
        EnrichedPost {
            post: row.post.into(),
            author_photo: row.author_photo,
        }
    }
}

impl From<PostDetailRow> for PostDetail {
    fn from(row: PostDetailRow) -> Self {
        PostDetail {
            post: row.post.into(),
            author_photo: row.author_photo,
            is_following: row.is_following,
        }
    }
}

impl From<FollowerRow> for Follower {
    fn from(row: FollowerRow) -> Self {
        Follower {
            username: row.username,
            photo: row.photo,
        }
    }
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        UserProfile {
            id: row.id,
            username: row.username,
            photo: row.photo,
            follower_count: row.follower_count,
        }
    }
}

impl From<HashtagRow> for PostHashtags {
    fn from(row: HashtagRow) -> Self {
        PostHashtags {
            post_id: row.post_id,
            title: row.title,
            hashtags: row.hashtags,
        }
    }
}
