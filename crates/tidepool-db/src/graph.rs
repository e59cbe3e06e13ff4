use rusqlite::OptionalExtension;
use tracing::debug;

use crate::models::FollowerRow;
use crate::users::resolve_user_id;
use crate::{Database, Result, StoreError};

impl Database {
    // -- Mutations --

    /// Insert the edge `follower -> followed`. Both users must exist, the edge
    /// must not exist yet, and nobody follows themselves.
    pub fn follow(&self, follower: &str, followed: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let follower_id = resolve_user_id(&tx, follower)?;
            let followed_id = resolve_user_id(&tx, followed)?;
            if follower_id == followed_id {
                return Err(StoreError::InvalidInput("users cannot follow themselves".into()));
            }

            tx.execute(
                "INSERT INTO follows (follower_id, followed_id) VALUES (?1, ?2)",
                (&follower_id, &followed_id),
            )
            .map_err(|e| match StoreError::from(e) {
                StoreError::Conflict(_) => {
                    StoreError::Conflict(format!("{} already follows {}", follower, followed))
                }
                other => other,
            })?;

            self.ensure_live()?;
            tx.commit()?;
            Ok(())
        })?;

        debug!("{} now follows {}", follower, followed);
        Ok(())
    }

    /// Remove the edge if present. Removing a missing edge succeeds.
    pub fn unfollow(&self, follower: &str, followed: &str) -> Result<()> {
        let removed = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let follower_id = resolve_user_id(&tx, follower)?;
            let followed_id = resolve_user_id(&tx, followed)?;
            let removed = tx.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                (&follower_id, &followed_id),
            )?;

            self.ensure_live()?;
            tx.commit()?;
            Ok(removed)
        })?;

        debug!("{} unfollowed {} ({} edge removed)", follower, followed, removed);
        Ok(())
    }

    pub fn set_follow_state(&self, follower: &str, followed: &str, follow: bool) -> Result<()> {
        if follow {
            self.follow(follower, followed)
        } else {
            self.unfollow(follower, followed)
        }
    }

    // -- Queries --

    /// False when either user is unknown.
    pub fn is_following(&self, viewer: &str, target: &str) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS (
                     SELECT 1
                     FROM follows f
                     JOIN users follower ON follower.id = f.follower_id
                     JOIN users followed ON followed.id = f.followed_id
                     WHERE follower.username = ?1 AND followed.username = ?2
                 )",
                (viewer, target),
                |row| row.get(0),
            )?)
        })
    }

    /// Users following `username`, oldest edge first.
    pub fn list_followers(&self, username: &str) -> Result<Vec<FollowerRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT follower.username, follower.photo
                 FROM follows f
                 JOIN users follower ON follower.id = f.follower_id
                 JOIN users followed ON followed.id = f.followed_id
                 WHERE followed.username = ?1
                 ORDER BY f.created_at, f.rowid",
            )?;

            let rows = stmt
                .query_map([username], |row| {
                    Ok(FollowerRow {
                        username: row.get(0)?,
                        photo: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Incoming edge count, aggregated in the store. Unknown users have 0.
    pub fn follower_count(&self, username: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn
                .query_row(
                    "SELECT COUNT(f.follower_id)
                     FROM users u
                     JOIN follows f ON f.followed_id = u.id
                     WHERE u.username = ?1
                     GROUP BY u.id",
                    [username],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(count.unwrap_or(0))
        })
    }
}
