//! Translation of list/count query parameters into owner-scoped SQL.

use chrono::{DateTime, Duration, Utc};
use sqlx::{QueryBuilder, Sqlite};

use crate::error::Result;
use crate::models::{VideoQuery, VideoStatus};

pub const DEFAULT_LIMIT: u32 = 12;

/// Relative creation-time window selected by a `time_filter` token.
pub fn time_window(token: &str) -> Option<Duration> {
    let window = match token {
        "1h" => Duration::hours(1),
        "4h" => Duration::hours(4),
        "6h" => Duration::hours(6),
        "12h" => Duration::hours(12),
        "1d" => Duration::days(1),
        "3d" => Duration::days(3),
        "1w" | "1s" => Duration::weeks(1),
        "1mo" | "1m" => Duration::days(30),
        "3mo" | "3m" => Duration::days(90),
        "6mo" | "6m" => Duration::days(180),
        "1y" | "1a" => Duration::days(365),
        _ => return None,
    };
    Some(window)
}

/// Filters shared by the list and count queries.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VideoFilter {
    pub search: Option<String>,
    pub status: Option<VideoStatus>,
    pub created_since: Option<DateTime<Utc>>,
}

impl VideoFilter {
    /// Empty strings count as "not given"; unknown time tokens are dropped.
    pub fn from_query(query: &VideoQuery, now: DateTime<Utc>) -> Result<Self> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let status = match query.status_filter.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Some(s.parse::<VideoStatus>()?),
            _ => None,
        };

        let created_since = query
            .time_filter
            .as_deref()
            .and_then(|token| time_window(token.trim()))
            .map(|window| now - window);

        Ok(Self {
            search,
            status,
            created_since,
        })
    }

    /// Appends `WHERE user_id = ? AND ...` to `builder`.
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Sqlite>, user_id: i64) {
        builder.push(" WHERE user_id = ");
        builder.push_bind(user_id);

        if let Some(search) = &self.search {
            builder.push(" AND search_text LIKE ");
            builder.push_bind(like_pattern(search));
            builder.push(" ESCAPE '\\'");
        }

        if let Some(status) = self.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }

        if let Some(since) = self.created_since {
            builder.push(" AND created_at >= ");
            builder.push_bind(since);
        }
    }
}

/// Text matched by `search`: title, description and script, lower-cased
/// with Unicode rules. SQLite's `LOWER` folds ASCII only, so the folded
/// form is computed here and stored next to the record.
pub fn search_text(title: &str, description: Option<&str>, script: Option<&str>) -> String {
    [Some(title), description, script]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(SEARCH_FIELD_SEPARATOR)
}

// Keeps a term from matching across the end of one field and the start of
// the next.
const SEARCH_FIELD_SEPARATOR: &str = "\u{1f}";

/// Lower-cased `%term%` with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
