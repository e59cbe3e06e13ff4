use rusqlite::OptionalExtension;

use crate::models::{EnrichedPostRow, PostDetailRow, PostRow};
use crate::posts::{map_enriched_post, map_post, post_columns};
use crate::{Database, Result};

impl Database {
    /// Posts by every author the viewer follows, newest first.
    /// An unknown viewer follows nobody and gets an empty feed.
    pub fn home_feed(&self, viewer: &str) -> Result<Vec<EnrichedPostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(concat!(
                "SELECT ",
                post_columns!(),
                ", author.photo
                 FROM follows f
                 JOIN users viewer ON viewer.id = f.follower_id
                 JOIN users author ON author.id = f.followed_id
                 JOIN posts p ON p.author = author.username
                 WHERE viewer.username = ?1
                 ORDER BY p.created_at DESC, p.rowid DESC"
            ))?;

            let rows = stmt
                .query_map([viewer], map_enriched_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Single post with its author's photo and whether `viewer` follows the author.
    pub fn post_detail(&self, post_id: &str, viewer: &str) -> Result<Option<PostDetailRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    concat!(
                        "SELECT ",
                        post_columns!(),
                        ", author.photo, f.follower_id IS NOT NULL
                         FROM posts p
                         JOIN users author ON author.username = p.author
                         LEFT JOIN users viewer ON viewer.username = ?2
                         LEFT JOIN follows f
                             ON f.follower_id = viewer.id AND f.followed_id = author.id
                         WHERE p.id = ?1"
                    ),
                    (post_id, viewer),
                    |row| {
                        Ok(PostDetailRow {
                            post: map_post(row)?,
                            author_photo: row.get(8)?,
                            is_following: row.get(9)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn user_posts(&self, username: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(concat!(
                "SELECT ",
                post_columns!(),
                " FROM posts p
                 WHERE p.author = ?1
                 ORDER BY p.created_at DESC, p.rowid DESC"
            ))?;

            let rows = stmt
                .query_map([username], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn random_post_id(&self) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let id = conn
                .query_row("SELECT id FROM posts ORDER BY random() LIMIT 1", [], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(id)
        })
    }
}
