//! SQL access for users and videos. Every video statement is scoped by
//! `user_id`.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::error::{AppError, Result};
use crate::filters::{self, VideoFilter};
use crate::models::{NewVideo, User, Video, VideoStatus, VideoUpdate};
use crate::text_format;

pub async fn insert_user(pool: &SqlitePool, email: &str, username: &str, password_hash: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, username, password_hash, created_at) VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(email)
    .bind(username)
    .bind(password_hash)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Email or username already registered".to_string())
        }
        other => AppError::Database(other),
    })
}

pub async fn find_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?)
}

/// Trimmed value, or `None` when blank. Stored values are already in the
/// form the text import would read back.
fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_single_line(field: &str, value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(AppError::Validation(format!("{} must be a single line", field)));
    }
    Ok(())
}

fn require_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    require_single_line("Title", title)?;
    Ok(title.to_string())
}

fn normalize_url(url: Option<String>) -> Result<Option<String>> {
    let url = normalize_optional(url);
    if let Some(url) = &url {
        require_single_line("URL", url)?;
    }
    Ok(url)
}

/// Multi-line text that would be cut short by a block marker on export.
fn normalize_text(field: &str, value: Option<String>) -> Result<Option<String>> {
    let value = normalize_optional(value);
    if value.as_deref().is_some_and(text_format::has_marker_line) {
        return Err(AppError::Validation(format!(
            "{} cannot contain a line starting with a block marker such as [URL]",
            field
        )));
    }
    Ok(value)
}

/// Inserts a video for `user_id`. A `completed` video is stamped with the
/// creation time as its completion time.
pub async fn insert_video(pool: &SqlitePool, user_id: i64, video: NewVideo) -> Result<Video> {
    let title = require_title(&video.title)?;
    let description = normalize_text("Description", video.description)?;
    let script = normalize_text("Script", video.script)?;
    let url = normalize_url(video.url)?;
    let search_text = filters::search_text(&title, description.as_deref(), script.as_deref());
    let now = Utc::now();
    let completed_at = (video.status == VideoStatus::Completed).then_some(now);

    let created = sqlx::query_as::<_, Video>(
        "INSERT INTO videos (title, description, script, url, status, created_at, completed_at, search_text, user_id) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(title)
    .bind(description)
    .bind(script)
    .bind(url)
    .bind(video.status.as_str())
    .bind(now)
    .bind(completed_at)
    .bind(search_text)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(created)
}

pub async fn find_video(pool: &SqlitePool, user_id: i64, id: i64) -> Result<Video> {
    sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
}

pub async fn list_videos(
    pool: &SqlitePool,
    user_id: i64,
    filter: &VideoFilter,
    skip: u32,
    limit: u32,
) -> Result<Vec<Video>> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM videos");
    filter.push_where(&mut builder, user_id);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(i64::from(limit));
    builder.push(" OFFSET ");
    builder.push_bind(i64::from(skip));

    Ok(builder.build_query_as::<Video>().fetch_all(pool).await?)
}

/// All of the owner's videos in default list order.
pub async fn all_videos(pool: &SqlitePool, user_id: i64) -> Result<Vec<Video>> {
    Ok(sqlx::query_as::<_, Video>(
        "SELECT * FROM videos WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

pub async fn count_videos(pool: &SqlitePool, user_id: i64, filter: &VideoFilter) -> Result<i64> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM videos");
    filter.push_where(&mut builder, user_id);

    let row = builder.build().fetch_one(pool).await?;
    Ok(row.try_get::<i64, _>(0)?)
}

/// Applies a partial update and returns the stored result.
pub async fn update_video(pool: &SqlitePool, user_id: i64, id: i64, update: VideoUpdate) -> Result<Video> {
    let mut video = find_video(pool, user_id, id).await?;

    if let Some(title) = update.title {
        video.title = require_title(&title)?;
    }
    if let Some(description) = update.description {
        video.description = normalize_text("Description", description)?;
    }
    if let Some(script) = update.script {
        video.script = normalize_text("Script", script)?;
    }
    if let Some(url) = update.url {
        video.url = normalize_url(url)?;
    }
    if let Some(status) = update.status {
        video.status = status;
        if status == VideoStatus::Completed && video.completed_at.is_none() {
            video.completed_at = Some(Utc::now());
        }
    }
    if let Some(completed_at) = update.completed_at {
        video.completed_at = completed_at;
    }

    let search_text = filters::search_text(&video.title, video.description.as_deref(), video.script.as_deref());

    let updated = sqlx::query_as::<_, Video>(
        "UPDATE videos SET title = ?, description = ?, script = ?, url = ?, status = ?, completed_at = ?, \
         search_text = ? WHERE id = ? AND user_id = ? RETURNING *",
    )
    .bind(&video.title)
    .bind(&video.description)
    .bind(&video.script)
    .bind(&video.url)
    .bind(video.status.as_str())
    .bind(video.completed_at)
    .bind(search_text)
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    Ok(updated)
}

pub async fn delete_video(pool: &SqlitePool, user_id: i64, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM videos WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Video not found".to_string()));
    }
    Ok(())
}

fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    builder.push(" AND id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

/// Updates status and/or completion time on every listed video the caller
/// owns. Ids that are missing or belong to someone else are skipped.
pub async fn bulk_update(
    pool: &SqlitePool,
    user_id: i64,
    ids: &[i64],
    status: Option<VideoStatus>,
    completed_at: Option<DateTime<Utc>>,
) -> Result<u64> {
    if ids.is_empty() {
        return Err(AppError::NotFound("No videos found".to_string()));
    }

    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE videos SET status = ");
    match status {
        Some(status) => {
            builder.push_bind(status.as_str());
        }
        None => {
            builder.push("status");
        }
    }

    builder.push(", completed_at = ");
    match (completed_at, status) {
        (Some(explicit), _) => {
            builder.push_bind(explicit);
        }
        (None, Some(VideoStatus::Completed)) => {
            builder.push("COALESCE(completed_at, ");
            builder.push_bind(Utc::now());
            builder.push(")");
        }
        (None, _) => {
            builder.push("completed_at");
        }
    }

    builder.push(" WHERE user_id = ");
    builder.push_bind(user_id);
    push_id_list(&mut builder, ids);

    let updated = builder.build().execute(pool).await?.rows_affected();
    if updated == 0 {
        return Err(AppError::NotFound("No videos found".to_string()));
    }
    Ok(updated)
}

/// Deletes every listed video the caller owns, skipping the rest.
pub async fn bulk_delete(pool: &SqlitePool, user_id: i64, ids: &[i64]) -> Result<u64> {
    if ids.is_empty() {
        return Err(AppError::NotFound("No videos found".to_string()));
    }

    let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM videos WHERE user_id = ");
    builder.push_bind(user_id);
    push_id_list(&mut builder, ids);

    let deleted = builder.build().execute(pool).await?.rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound("No videos found".to_string()));
    }
    Ok(deleted)
}

/// Number of the owner's videos in each status.
pub async fn status_counts(pool: &SqlitePool, user_id: i64) -> Result<Vec<(VideoStatus, i64)>> {
    let rows = sqlx::query("SELECT status, COUNT(*) AS total FROM videos WHERE user_id = ? GROUP BY status")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| -> Result<(VideoStatus, i64)> {
            let status: String = row.try_get("status")?;
            let total: i64 = row.try_get("total")?;
            Ok((status.parse()?, total))
        })
        .collect()
}
