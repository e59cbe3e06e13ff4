/// Database row types. These map directly to SQLite rows.
/// Distinct from tidepool-types API models to keep the DB layer independent.

#[derive(Debug)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub photo: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostRow {
    pub id: String,
    pub author: String,
    pub title: String,
    pub description: String,
    pub score: f64,
    pub hashtags: Vec<String>,
    pub image: Option<String>,
    pub created_at: String,
}

/// Post joined with the author's photo.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPostRow {
    pub post: PostRow,
    pub author_photo: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostDetailRow {
    pub post: PostRow,
    pub author_photo: String,
    pub is_following: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerRow {
    pub username: String,
    pub photo: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRow {
    pub id: String,
    pub username: String,
    pub photo: String,
    pub follower_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashtagRow {
    pub post_id: String,
    pub title: String,
    pub hashtags: Vec<String>,
}

// -- Inputs --

pub struct NewUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

pub struct NewPost<'a> {
    pub id: &'a str,
    pub author: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub score: f64,
    pub hashtags: &'a [String],
    pub image: Option<&'a str>,
}

/// Post search filters. `None` disables a predicate; `Some("")` is matched literally.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub title: Option<String>,
    pub hashtag: Option<String>,
}
