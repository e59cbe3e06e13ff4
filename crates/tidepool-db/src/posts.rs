use rusqlite::Row;
use rusqlite::types::Type;
use tracing::debug;

use crate::error::require;
use crate::models::{EnrichedPostRow, NewPost, PostRow};
use crate::{Database, Result, StoreError};

/// Post columns in the order `map_post` reads them. Queries alias posts as `p`.
macro_rules! post_columns {
    () => {
        "p.id, p.author, p.title, p.description, p.score, p.hashtags, p.image, p.created_at"
    };
}
pub(crate) use post_columns;

impl Database {
    pub fn create_post(&self, post: &NewPost<'_>) -> Result<PostRow> {
        require("id", post.id)?;
        require("author", post.author)?;
        require("title", post.title)?;
        require("description", post.description)?;
        if !post.score.is_finite() {
            return Err(StoreError::InvalidInput("score must be a finite number".into()));
        }
        let hashtags = normalize_hashtags(post.hashtags)?;
        let hashtags_json = serde_json::to_string(&hashtags)
            .map_err(|e| StoreError::InvalidInput(format!("hashtags: {}", e)))?;

        let row = self
            .with_conn_mut(|conn| {
                conn.execute(
                    "INSERT INTO posts (id, author, title, description, score, hashtags, image)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![
                        post.id,
                        post.author,
                        post.title,
                        post.description,
                        post.score,
                        hashtags_json,
                        post.image,
                    ],
                )?;
                let row = conn.query_row(
                    concat!("SELECT ", post_columns!(), " FROM posts p WHERE p.id = ?1"),
                    [post.id],
                    map_post,
                )?;
                Ok(row)
            })
            .map_err(|e| match e {
                StoreError::NotFound(_) => {
                    StoreError::NotFound(format!("author '{}'", post.author))
                }
                other => other,
            })?;

        debug!("Created post {} by {}", row.id, row.author);
        Ok(row)
    }

    pub fn post_count(&self) -> Result<i64> {
        self.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM posts", [], |r| r.get(0))?))
    }
}

/// Trim tags, reject blank ones and drop repeats, keeping first-seen order.
fn normalize_hashtags(tags: &[String]) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(StoreError::InvalidInput("hashtags must not be blank".into()));
        }
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    Ok(out)
}

pub(crate) fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    let hashtags: String = row.get(5)?;
    Ok(PostRow {
        id: row.get(0)?,
        author: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        score: row.get(4)?,
        hashtags: decode_hashtags(5, &hashtags)?,
        image: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Reads `post_columns!()` followed by the author's photo.
pub(crate) fn map_enriched_post(row: &Row<'_>) -> rusqlite::Result<EnrichedPostRow> {
    Ok(EnrichedPostRow {
        post: map_post(row)?,
        author_photo: row.get(8)?,
    })
}

pub(crate) fn decode_hashtags(idx: usize, raw: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::seeded;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|t| t.to_string()).collect()
    }

    fn new_post<'a>(id: &'a str, author: &'a str, hashtags: &'a [String]) -> NewPost<'a> {
        NewPost {
            id,
            author,
            title: "Sunset",
            description: "Over the bay",
            score: 3.0,
            hashtags,
            image: Some("https://img/sunset.jpg"),
        }
    }

    #[test]
    fn create_post_dedupes_hashtags() {
        let db = seeded();
        let hashtags = tags(&["sea", " sky", "sea"]);
        let row = db.create_post(&new_post("10", "carol", &hashtags)).unwrap();

        assert_eq!(row.hashtags, vec!["sea", "sky"]);
        assert_eq!(row.image.as_deref(), Some("https://img/sunset.jpg"));
        assert!(!row.created_at.is_empty());
    }

    #[test]
    fn duplicate_post_id_conflicts_without_changing_count() {
        let db = seeded();
        let before = db.post_count().unwrap();

        let hashtags = tags(&["x"]);
        let err = db.create_post(&new_post("1", "carol", &hashtags)).unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)), "{err:?}");
        assert_eq!(db.post_count().unwrap(), before);
    }

    #[test]
    fn unknown_author_is_not_found() {
        let db = seeded();
        let hashtags = tags(&["x"]);
        let err = db.create_post(&new_post("11", "mallory", &hashtags)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref m) if m.contains("mallory")), "{err:?}");
    }

    #[test]
    fn invalid_fields_are_rejected() {
        let db = seeded();

        let blank = tags(&["ok", "  "]);
        assert!(matches!(
            db.create_post(&new_post("12", "carol", &blank)),
            Err(StoreError::InvalidInput(_))
        ));

        let hashtags = tags(&["ok"]);
        let mut post = new_post("13", "carol", &hashtags);
        post.score = f64::NAN;
        assert!(matches!(db.create_post(&post), Err(StoreError::InvalidInput(_))));

        let mut post = new_post("14", "carol", &hashtags);
        post.title = "";
        assert!(matches!(db.create_post(&post), Err(StoreError::InvalidInput(_))));
    }
}
