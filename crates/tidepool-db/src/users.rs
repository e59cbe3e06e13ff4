use rusqlite::{Connection, OptionalExtension, Row};
use tidepool_types::models::Availability;
use tracing::debug;

use crate::error::require;
use crate::models::{NewUser, ProfileRow, UserRow};
use crate::{Database, Result, StoreError};

const USER_COLUMNS: &str = "id, username, email, password, photo, created_at";

impl Database {
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<UserRow> {
        require("id", user.id)?;
        require("username", user.username)?;
        require("email", user.email)?;
        require("password", user.password)?;

        let row = self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
                (user.id, user.username, user.email, user.password),
            )?;
            let row = conn.query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                [user.id],
                map_user,
            )?;
            Ok(row)
        })?;

        debug!("Created user {} ({})", row.username, row.id);
        Ok(row)
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                    [username],
                    map_user,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Email is checked before username, so a double collision reports `EmailTaken`.
    pub fn check_availability(&self, username: &str, email: &str) -> Result<Availability> {
        self.with_conn(|conn| {
            if exists(conn, "SELECT EXISTS (SELECT 1 FROM users WHERE email = ?1)", email)? {
                return Ok(Availability::EmailTaken);
            }
            if exists(conn, "SELECT EXISTS (SELECT 1 FROM users WHERE username = ?1)", username)? {
                return Ok(Availability::UsernameTaken);
            }
            Ok(Availability::Available)
        })
    }

    pub fn get_user_photo(&self, username: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let photo = conn
                .query_row("SELECT photo FROM users WHERE username = ?1", [username], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(photo)
        })
    }

    pub fn set_user_photo(&self, username: &str, photo: &str) -> Result<()> {
        let updated = self.with_conn_mut(|conn| {
            Ok(conn.execute(
                "UPDATE users SET photo = ?2 WHERE username = ?1",
                (username, photo),
            )?)
        })?;

        if updated == 0 {
            return Err(StoreError::NotFound(format!("user '{}'", username)));
        }
        Ok(())
    }

    /// Profile with follower count, computed in one LEFT JOIN + GROUP BY.
    pub fn get_user_profile(&self, username: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT u.id, u.username, u.photo, COUNT(f.follower_id)
                     FROM users u
                     LEFT JOIN follows f ON f.followed_id = u.id
                     WHERE u.username = ?1
                     GROUP BY u.id, u.username, u.photo",
                    [username],
                    |row| {
                        Ok(ProfileRow {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            photo: row.get(2)?,
                            follower_count: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }
}

/// Resolve a username to its identifier, failing with `NotFound` when unknown.
pub(crate) fn resolve_user_id(conn: &Connection, username: &str) -> Result<String> {
    conn.query_row("SELECT id FROM users WHERE username = ?1", [username], |row| {
        row.get(0)
    })
    .optional()?
    .ok_or_else(|| StoreError::NotFound(format!("user '{}'", username)))
}

fn exists(conn: &Connection, sql: &str, value: &str) -> Result<bool> {
    Ok(conn.query_row(sql, [value], |row| row.get(0))?)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        photo: row.get(4)?,
        created_at: row.get(5)?,
    })
}
