//! Data access for posts and their comments.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Deserialize;

use crate::db::models::{Comment, Post, PostDetail, PostSummary};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;
use crate::store::sql::PartialUpdate;

/// Timestamps are stored by SQLite and rendered to the minute on the way out.
const DATE_FMT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone)]
pub struct NewPost {
    pub item_name: String,
    pub username: String,
    pub city: Option<String>,
    pub img_url: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub age_group: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PostUpdate {
    pub item_name: Option<String>,
    pub city: Option<String>,
    pub img_url: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub age_group: Option<String>,
}

impl PostUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref item_name) = self.item_name {
            if item_name.trim().is_empty() {
                return Err(AppError::BadRequest("itemName must not be empty".into()));
            }
        }
        Ok(())
    }
}

pub fn create(pool: &DbPool, data: NewPost) -> AppResult<Post> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO posts (item_name, username, city, img_url, description, category, age_group)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            data.item_name,
            data.username,
            data.city,
            data.img_url,
            data.description,
            data.category,
            data.age_group
        ],
    )?;
    let id = conn.last_insert_rowid();

    post_row(&conn, id)?.ok_or_else(|| AppError::Internal(format!("Post {id} vanished after insert")))
}

/// All posts, newest first, optionally filtered by a case-insensitive
/// substring match on the item name.
pub fn find_all(pool: &DbPool, item_name: Option<&str>) -> AppResult<Vec<PostSummary>> {
    let conn = pool.get()?;
    let base = format!(
        "SELECT id, item_name, username, strftime('{DATE_FMT}', post_date),
                city, img_url, category, age_group
         FROM posts"
    );

    let posts = if let Some(item_name) = item_name {
        let sql = format!("{base} WHERE item_name LIKE '%' || ?1 || '%' ORDER BY post_date DESC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![item_name], map_summary)?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    } else {
        let sql = format!("{base} ORDER BY post_date DESC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_summary)?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    Ok(posts)
}

/// A post with its comments, newest comment first.
pub fn get(pool: &DbPool, id: i64) -> AppResult<PostDetail> {
    let conn = pool.get()?;
    let post = post_row(&conn, id)?.ok_or_else(|| AppError::NotFound(format!("No post: {id}")))?;

    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, post_id, text, strftime('{DATE_FMT}', comment_date)
         FROM comments
         WHERE post_id = ?1
         ORDER BY comment_date DESC, id DESC"
    ))?;
    let comments = stmt
        .query_map(params![id], map_comment)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PostDetail { post, comments })
}

pub fn update(pool: &DbPool, id: i64, data: PostUpdate) -> AppResult<Post> {
    let mut update = PartialUpdate::new();
    update.set("item_name", data.item_name);
    update.set("city", data.city);
    update.set("img_url", data.img_url);
    update.set("description", data.description);
    update.set("category", data.category);
    update.set("age_group", data.age_group);
    update.require_fields()?;

    let conn = pool.get()?;
    let sql = format!(
        "UPDATE posts SET {} WHERE id = ?{}",
        update.set_clause(),
        update.key_index()
    );
    let changed = conn.execute(&sql, params_from_iter(update.params_with(&id)))?;
    if changed == 0 {
        return Err(AppError::NotFound(format!("No post: {id}")));
    }

    post_row(&conn, id)?.ok_or_else(|| AppError::NotFound(format!("No post: {id}")))
}

pub fn remove(pool: &DbPool, id: i64) -> AppResult<()> {
    let conn = pool.get()?;
    let changed = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(AppError::NotFound(format!("No post: {id}")));
    }
    Ok(())
}

pub fn get_comment(pool: &DbPool, id: i64) -> AppResult<Comment> {
    let conn = pool.get()?;
    conn.query_row(
        &format!(
            "SELECT id, username, post_id, text, strftime('{DATE_FMT}', comment_date)
             FROM comments WHERE id = ?1"
        ),
        params![id],
        map_comment,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("No comment: {id}")))
}

pub fn add_comment(pool: &DbPool, username: &str, post_id: i64, text: &str) -> AppResult<Comment> {
    let conn = pool.get()?;

    let post_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
        params![post_id],
        |row| row.get(0),
    )?;
    if !post_exists {
        return Err(AppError::NotFound(format!("No post: {post_id}")));
    }

    conn.execute(
        "INSERT INTO comments (username, post_id, text) VALUES (?1, ?2, ?3)",
        params![username, post_id, text],
    )?;
    let id = conn.last_insert_rowid();

    conn.query_row(
        &format!(
            "SELECT id, username, post_id, text, strftime('{DATE_FMT}', comment_date)
             FROM comments WHERE id = ?1"
        ),
        params![id],
        map_comment,
    )
    .map_err(AppError::from)
}

pub fn remove_comment(pool: &DbPool, id: i64) -> AppResult<()> {
    let conn = pool.get()?;
    let changed = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(AppError::NotFound(format!("No comment: {id}")));
    }
    Ok(())
}

fn post_row(conn: &Connection, id: i64) -> Result<Option<Post>, rusqlite::Error> {
    conn.query_row(
        &format!(
            "SELECT id, item_name, username, strftime('{DATE_FMT}', post_date),
                    city, img_url, description, category, age_group
             FROM posts WHERE id = ?1"
        ),
        params![id],
        |row| {
            Ok(Post {
                id: row.get(0)?,
                item_name: row.get(1)?,
                username: row.get(2)?,
                post_date: row.get(3)?,
                city: row.get(4)?,
                img_url: row.get(5)?,
                description: row.get(6)?,
                category: row.get(7)?,
                age_group: row.get(8)?,
            })
        },
    )
    .optional()
}

fn map_summary(row: &rusqlite::Row) -> Result<PostSummary, rusqlite::Error> {
    Ok(PostSummary {
        id: row.get(0)?,
        item_name: row.get(1)?,
        username: row.get(2)?,
        post_date: row.get(3)?,
        city: row.get(4)?,
        img_url: row.get(5)?,
        category: row.get(6)?,
        age_group: row.get(7)?,
    })
}

fn map_comment(row: &rusqlite::Row) -> Result<Comment, rusqlite::Error> {
    Ok(Comment {
        id: row.get(0)?,
        username: row.get(1)?,
        post_id: row.get(2)?,
        text: row.get(3)?,
        comment_date: row.get(4)?,
    })
}
