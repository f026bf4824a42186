use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

/// JWT payload. `sub` is the user id rendered as a decimal string.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Production stage of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VideoStatus {
    #[default]
    Planned,
    InProduction,
    InEditing,
    Completed,
}

impl VideoStatus {
    pub const ALL: [VideoStatus; 4] = [
        VideoStatus::Planned,
        VideoStatus::InProduction,
        VideoStatus::InEditing,
        VideoStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Planned => "planned",
            VideoStatus::InProduction => "in-production",
            VideoStatus::InEditing => "in-editing",
            VideoStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VideoStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown status '{}'", s)))
    }
}

impl TryFrom<String> for VideoStatus {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub script: Option<String>,
    pub url: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: VideoStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub user_id: i64,
}

/// Fields of a video that can be written by the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVideo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: VideoStatus,
}

/// Partial update. The nested `Option` distinguishes an absent field
/// (leave untouched) from an explicit `null` (clear it).
#[derive(Debug, Default, Deserialize)]
pub struct VideoUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub script: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub url: Option<Option<String>>,
    pub status: Option<VideoStatus>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoQuery {
    pub search: Option<String>,
    pub status_filter: Option<String>,
    pub time_filter: Option<String>,
    #[serde(default)]
    pub skip: u32,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
    pub video_ids: Vec<i64>,
    #[serde(default)]
    pub status: Option<VideoStatus>,
    #[serde(default, alias = "completion_date")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkDeleteRequest {
    pub video_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkUpdateResponse {
    pub success: bool,
    pub updated_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
    pub success: bool,
    pub deleted_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub success: bool,
    pub imported_count: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_videos: i64,
    pub planned: i64,
    pub in_production: i64,
    pub in_editing: i64,
    pub completed: i64,
    pub level: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tokens_are_kebab_case() {
        let json = serde_json::to_string(&VideoStatus::InProduction).unwrap();
        assert_eq!(json, "\"in-production\"");
        for status in VideoStatus::ALL {
            assert_eq!(status.as_str().parse::<VideoStatus>().unwrap(), status);
        }
        assert!("done".parse::<VideoStatus>().is_err());
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let update: VideoUpdate =
            serde_json::from_str(r#"{"description": null, "title": "New"}"#).unwrap();
        assert_eq!(update.title.as_deref(), Some("New"));
        assert_eq!(update.description, Some(None));
        assert_eq!(update.script, None);
        assert_eq!(update.completed_at, None);
    }

    #[test]
    fn new_video_defaults_to_planned() {
        let video: NewVideo = serde_json::from_str(r#"{"title": "Intro"}"#).unwrap();
        assert_eq!(video.status, VideoStatus::Planned);
        assert!(video.description.is_none());
    }
}
