use rusqlite::ToSql;

use crate::models::{EnrichedPostRow, HashtagRow, SearchFilter};
use crate::posts::{decode_hashtags, map_enriched_post, post_columns};
use crate::{Database, Result, StoreError};

/// Enriched-post query with a fixed WHERE clause. Filter values are always bound.
macro_rules! enriched_posts_where {
    ($predicate:literal) => {
        concat!(
            "SELECT ",
            post_columns!(),
            ", u.photo
             FROM posts p
             JOIN users u ON u.username = p.author
             WHERE ",
            $predicate,
            " ORDER BY p.created_at DESC, p.rowid DESC"
        )
    };
}

const SEARCH_BY_TITLE: &str = enriched_posts_where!("instr(p.title, ?1) > 0");

const SEARCH_BY_HASHTAG: &str =
    enriched_posts_where!("EXISTS (SELECT 1 FROM json_each(p.hashtags) h WHERE h.value = ?1)");

const SEARCH_BY_TITLE_AND_HASHTAG: &str = enriched_posts_where!(
    "instr(p.title, ?1) > 0
     AND EXISTS (SELECT 1 FROM json_each(p.hashtags) h WHERE h.value = ?2)"
);

const POSTS_BY_HASHTAG_FOR_AUTHOR: &str = enriched_posts_where!(
    "p.author = ?2
     AND EXISTS (SELECT 1 FROM json_each(p.hashtags) h WHERE h.value = ?1)"
);

impl Database {
    /// Title substring (case-sensitive) and/or hashtag overlap. Both filters
    /// together are a conjunction; no filter at all is rejected.
    pub fn search_posts(&self, filter: &SearchFilter) -> Result<Vec<EnrichedPostRow>> {
        let (sql, params): (&str, Vec<&dyn ToSql>) =
            match (filter.title.as_ref(), filter.hashtag.as_ref()) {
                (Some(title), None) => (SEARCH_BY_TITLE, vec![title as &dyn ToSql]),
                (None, Some(hashtag)) => (SEARCH_BY_HASHTAG, vec![hashtag as &dyn ToSql]),
                (Some(title), Some(hashtag)) => (
                    SEARCH_BY_TITLE_AND_HASHTAG,
                    vec![title as &dyn ToSql, hashtag as &dyn ToSql],
                ),
                (None, None) => {
                    return Err(StoreError::InvalidInput(
                        "search needs a title or a hashtag".into(),
                    ));
                }
            };

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(params.as_slice(), map_enriched_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Posts by `username` whose hashtag set contains `hashtag`.
    pub fn posts_by_hashtag_for_user(
        &self,
        hashtag: &str,
        username: &str,
    ) -> Result<Vec<EnrichedPostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(POSTS_BY_HASHTAG_FOR_AUTHOR)?;
            let rows = stmt
                .query_map((hashtag, username), map_enriched_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// One entry per post of `username` with its hashtag set.
    pub fn hashtags_for_user(&self, username: &str) -> Result<Vec<HashtagRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, hashtags
                 FROM posts
                 WHERE author = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;

            let rows = stmt
                .query_map([username], |row| {
                    let raw: String = row.get(2)?;
                    Ok(HashtagRow {
                        post_id: row.get(0)?,
                        title: row.get(1)?,
                        hashtags: decode_hashtags(2, &raw)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}
