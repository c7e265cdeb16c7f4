//! Data access for users and their like/invite relations.
//!
//! Free functions over an injected pool; each call is a single logical
//! unit of work against one connection.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Deserialize;

use crate::auth::password;
use crate::db::models::{ReceivedInvite, SentInvite, User, UserDetail};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;
use crate::store::sql::PartialUpdate;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl NewUser {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push("username must not be empty");
        }
        if self.username.len() > 25 {
            errors.push("username must be at most 25 characters");
        }
        if self.password.len() < 5 {
            errors.push("password must be at least 5 characters");
        }
        if self.first_name.trim().is_empty() {
            errors.push("firstName must not be empty");
        }
        if self.last_name.trim().is_empty() {
            errors.push("lastName must not be empty");
        }
        if !self.email.contains('@') {
            errors.push("email must be a valid address");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::BadRequest(errors.join("; ")))
        }
    }
}

/// Sparse update; only supplied fields change. Built by the routes from
/// their own request types, which is where the admin flag gets gated.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub is_admin: Option<bool>,
}

impl UserUpdate {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        if let Some(ref password) = self.password {
            if password.len() < 5 {
                errors.push("password must be at least 5 characters");
            }
        }
        if let Some(ref email) = self.email {
            if !email.contains('@') {
                errors.push("email must be a valid address");
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::BadRequest(errors.join("; ")))
        }
    }
}

/// Verify a username/password pair. Returns the user without the password
/// hash; a missing user and a wrong password are indistinguishable to the
/// caller.
pub fn authenticate(pool: &DbPool, username: &str, password_input: &str) -> AppResult<User> {
    let conn = pool.get()?;
    let row = conn
        .query_row(
            "SELECT username, password, first_name, last_name, email, is_admin
             FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok((
                    row.get::<_, String>(1)?,
                    User {
                        username: row.get(0)?,
                        first_name: row.get(2)?,
                        last_name: row.get(3)?,
                        email: row.get(4)?,
                        is_admin: row.get(5)?,
                    },
                ))
            },
        )
        .optional()?;

    if let Some((hashed, user)) = row {
        if password::verify(password_input, &hashed) {
            return Ok(user);
        }
    }

    Err(AppError::Unauthorized("Invalid username/password".into()))
}

pub fn register(pool: &DbPool, data: NewUser, bcrypt_cost: u32) -> AppResult<User> {
    let conn = pool.get()?;

    let duplicate: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1",
        params![data.username],
        |row| row.get(0),
    )?;
    if duplicate {
        return Err(AppError::BadRequest(format!(
            "Duplicate username: {}",
            data.username
        )));
    }

    let hashed = password::hash(&data.password, bcrypt_cost)?;
    conn.execute(
        "INSERT INTO users (username, password, first_name, last_name, email, is_admin)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            data.username,
            hashed,
            data.first_name,
            data.last_name,
            data.email,
            data.is_admin
        ],
    )?;

    Ok(User {
        username: data.username,
        first_name: data.first_name,
        last_name: data.last_name,
        email: data.email,
        is_admin: data.is_admin,
    })
}

pub fn find_all(pool: &DbPool) -> AppResult<Vec<User>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT username, first_name, last_name, email, is_admin
         FROM users ORDER BY username",
    )?;
    let users = stmt
        .query_map([], map_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Full view of a user: profile plus post ids, liked post ids, and invites
/// sent and received.
pub fn get(pool: &DbPool, username: &str) -> AppResult<UserDetail> {
    let conn = pool.get()?;
    let user = user_row(&conn, username)?
        .ok_or_else(|| AppError::NotFound(format!("No user: {username}")))?;

    let mut stmt = conn.prepare("SELECT id FROM posts WHERE username = ?1")?;
    let posts = stmt
        .query_map(params![username], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;

    let mut stmt = conn.prepare("SELECT post_id FROM likes WHERE username = ?1")?;
    let liked_posts = stmt
        .query_map(params![username], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT i.post_id, p.username
         FROM invites AS i
         INNER JOIN posts AS p ON i.post_id = p.id
         WHERE i.username = ?1",
    )?;
    let sent_invites = stmt
        .query_map(params![username], |row| {
            Ok(SentInvite {
                post_id: row.get(0)?,
                post_owner: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT i.username, i.post_id
         FROM invites AS i
         WHERE i.post_id IN (SELECT id FROM posts WHERE username = ?1)",
    )?;
    let received_invites = stmt
        .query_map(params![username], |row| {
            Ok(ReceivedInvite {
                username: row.get(0)?,
                post_id: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(UserDetail {
        user,
        posts,
        liked_posts,
        sent_invites,
        received_invites,
    })
}

pub fn get_email(pool: &DbPool, username: &str) -> AppResult<String> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT email FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("No user: {username}")))
}

pub fn update(
    pool: &DbPool,
    username: &str,
    data: UserUpdate,
    bcrypt_cost: u32,
) -> AppResult<User> {
    let mut update = PartialUpdate::new();
    update.set("first_name", data.first_name);
    update.set("last_name", data.last_name);
    update.set("email", data.email);
    update.set("is_admin", data.is_admin);
    if let Some(ref password_input) = data.password {
        update.set("password", Some(password::hash(password_input, bcrypt_cost)?));
    }
    update.require_fields()?;

    let conn = pool.get()?;
    let sql = format!(
        "UPDATE users SET {} WHERE username = ?{}",
        update.set_clause(),
        update.key_index()
    );
    let changed = conn.execute(&sql, params_from_iter(update.params_with(&username)))?;
    if changed == 0 {
        return Err(AppError::NotFound(format!("No user: {username}")));
    }

    user_row(&conn, username)?.ok_or_else(|| AppError::NotFound(format!("No user: {username}")))
}

pub fn remove(pool: &DbPool, username: &str) -> AppResult<()> {
    let conn = pool.get()?;
    let changed = conn.execute("DELETE FROM users WHERE username = ?1", params![username])?;
    if changed == 0 {
        return Err(AppError::NotFound(format!("No user: {username}")));
    }
    Ok(())
}

pub fn like_post(pool: &DbPool, username: &str, post_id: i64) -> AppResult<()> {
    let conn = pool.get()?;
    check_post_and_user(&conn, username, post_id)?;
    conn.execute(
        "INSERT INTO likes (username, post_id) VALUES (?1, ?2)",
        params![username, post_id],
    )?;
    Ok(())
}

pub fn unlike_post(pool: &DbPool, username: &str, post_id: i64) -> AppResult<()> {
    let conn = pool.get()?;
    let changed = conn.execute(
        "DELETE FROM likes WHERE username = ?1 AND post_id = ?2",
        params![username, post_id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound("No such like.".into()));
    }
    Ok(())
}

pub fn invite_post(pool: &DbPool, username: &str, post_id: i64) -> AppResult<()> {
    let conn = pool.get()?;
    check_post_and_user(&conn, username, post_id)?;
    conn.execute(
        "INSERT INTO invites (username, post_id) VALUES (?1, ?2)",
        params![username, post_id],
    )?;
    Ok(())
}

pub fn uninvite_post(pool: &DbPool, username: &str, post_id: i64) -> AppResult<()> {
    let conn = pool.get()?;
    let changed = conn.execute(
        "DELETE FROM invites WHERE username = ?1 AND post_id = ?2",
        params![username, post_id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound("No such invite.".into()));
    }
    Ok(())
}

fn user_row(conn: &Connection, username: &str) -> Result<Option<User>, rusqlite::Error> {
    conn.query_row(
        "SELECT username, first_name, last_name, email, is_admin
         FROM users WHERE username = ?1",
        params![username],
        map_user,
    )
    .optional()
}

fn map_user(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        username: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        is_admin: row.get(4)?,
    })
}

/// Like/invite inserts check both ends of the relation first so the caller
/// gets a precise NotFound instead of a constraint violation.
fn check_post_and_user(conn: &Connection, username: &str, post_id: i64) -> AppResult<()> {
    let post_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
        params![post_id],
        |row| row.get(0),
    )?;
    if !post_exists {
        return Err(AppError::NotFound(format!("No post: {post_id}")));
    }

    let user_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )?;
    if !user_exists {
        return Err(AppError::NotFound(format!("No username: {username}")));
    }

    Ok(())
}
