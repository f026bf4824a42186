use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{StatsResponse, VideoStatus};
use crate::repository;

pub const VIDEOS_PER_LEVEL: i64 = 5;
pub const MAX_LEVEL: i64 = 99;

/// One level per five completed videos, starting at 1 and capped at 99.
pub fn level_for(completed: i64) -> i64 {
    (completed.max(0) / VIDEOS_PER_LEVEL + 1).min(MAX_LEVEL)
}

pub fn summarize(counts: &[(VideoStatus, i64)]) -> StatsResponse {
    let mut stats = StatsResponse::default();
    for &(status, count) in counts {
        stats.total_videos += count;
        match status {
            VideoStatus::Planned => stats.planned += count,
            VideoStatus::InProduction => stats.in_production += count,
            VideoStatus::InEditing => stats.in_editing += count,
            VideoStatus::Completed => stats.completed += count,
        }
    }
    stats.level = level_for(stats.completed);
    stats
}

pub async fn user_stats(pool: &SqlitePool, user_id: i64) -> Result<StatsResponse> {
    let counts = repository::status_counts(pool, user_id).await?;
    Ok(summarize(&counts))
}
