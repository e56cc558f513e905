//! Typed views over legacy rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

use crate::db::Row;
use crate::error::AppError;
use crate::models::{MAPPING_COLUMN, MEDIA_IDS_COLUMN};

fn required_id(row: &Row, column: &str) -> Result<i64, AppError> {
    row.int(column)
        .ok_or_else(|| AppError::Internal(format!("legacy row without integer '{}'", column)))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses legacy timestamps. Zero dates and blanks are `None`.
pub fn parse_legacy_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() || value.starts_with("0000-00-00") {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Parses a JSON list of post IDs that may hold numbers or numeric strings.
pub fn parse_id_list(value: &str) -> Vec<i64> {
    match serde_json::from_str::<JsonValue>(value) {
        Ok(JsonValue::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                JsonValue::Number(n) => n.as_i64(),
                JsonValue::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .collect(),
        _ => vec![],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyUser {
    pub user_id: i64,
    pub login: String,
    pub email: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub display_picture: Option<String>,
    pub mapped_id: String,
}

impl LegacyUser {
    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(Self {
            user_id: required_id(row, "user_id")?,
            login: row.text("user_login"),
            email: row.text("user_email"),
            display_name: row.text("user_display_name"),
            bio: non_empty(row.text("user_bio")),
            facebook: non_empty(row.text("user_facebook")),
            twitter: non_empty(row.text("user_twitter")),
            website: non_empty(row.text("user_website")),
            display_picture: non_empty(row.text("user_display_picture")),
            mapped_id: row.text(MAPPING_COLUMN),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyArticle {
    pub post_id: i64,
    pub title: String,
    pub excerpt: String,
    pub publish_status: i64,
    pub restrict_to_lan: bool,
    pub hits: i64,
    pub comment_count: i64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub mapped_id: String,
    pub media_ids: Vec<String>,
}

impl LegacyArticle {
    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(Self {
            post_id: required_id(row, "post_id")?,
            title: row.text("post_title"),
            excerpt: row.text("post_excerpt"),
            publish_status: row.int("post_publish_status").unwrap_or(0),
            restrict_to_lan: row.int("restrict_to_lan") == Some(1),
            hits: row.int("post_hits").unwrap_or(0),
            comment_count: row.int("post_comment_count").unwrap_or(0),
            created: parse_legacy_datetime(&row.text("post_created")),
            modified: parse_legacy_datetime(&row.text("post_modified")),
            mapped_id: row.text(MAPPING_COLUMN),
            media_ids: row
                .text(MEDIA_IDS_COLUMN)
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyCompany {
    pub company_id: i64,
    pub name: String,
    pub alias: Option<String>,
    pub location: Option<String>,
    pub avatar: Option<String>,
    pub mapped_id: String,
}

impl LegacyCompany {
    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(Self {
            company_id: required_id(row, "company_id")?,
            name: row.text("company_name"),
            alias: non_empty(row.text("company_alias")),
            location: non_empty(row.text("company_location")),
            avatar: non_empty(row.text("company_avatar")),
            mapped_id: row.text(MAPPING_COLUMN),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyIssue {
    pub issue_id: i64,
    pub name: String,
    pub thumbnail: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// `featured_top_4` followed by `featured_posts`.
    pub listed_posts: Vec<i64>,
    pub mapped_id: String,
}

impl LegacyIssue {
    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        let issue_id = required_id(row, "issue_id")?;
        let date = |column: &str| {
            parse_legacy_datetime(&row.text(column)).ok_or_else(|| {
                AppError::Internal(format!("issue #{} has no valid '{}'", issue_id, column))
            })
        };

        let mut listed_posts = parse_id_list(&row.text("featured_top_4"));
        listed_posts.extend(parse_id_list(&row.text("featured_posts")));

        Ok(Self {
            issue_id,
            name: row.text("issue_name"),
            thumbnail: non_empty(row.text("thumbnail")),
            start_date: date("start_date")?,
            end_date: date("end_date")?,
            listed_posts,
            mapped_id: row.text(MAPPING_COLUMN),
        })
    }
}

/// A post tag or admin label; the SQL source aliases both to `tag_*`.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyTag {
    pub tag_id: i64,
    pub text: String,
    pub mapped_id: String,
}

impl LegacyTag {
    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(Self {
            tag_id: required_id(row, "tag_id")?,
            text: row.text("tag_text"),
            mapped_id: row.text(MAPPING_COLUMN),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyLive {
    pub live_id: i64,
    pub company_mapped_id: String,
    pub live_type: i64,
    pub category: String,
    pub recruits: i64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Raw JSON `{degree: [{branch, name: [..]}]}`.
    pub students_recruited: String,
    pub ctc: String,
    pub bonus: String,
    pub mapped_id: String,
}

impl LegacyLive {
    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(Self {
            live_id: required_id(row, "live_id")?,
            company_mapped_id: row.text("company_mapped_id"),
            live_type: row.int("live_type").unwrap_or(0),
            category: row.text("category"),
            recruits: row.int("students_recruited_count").unwrap_or(0),
            year: row.int("year").unwrap_or(0) as i32,
            month: row.int("month").unwrap_or(1) as u32,
            day: row.int("day").unwrap_or(1) as u32,
            students_recruited: row.text("students_recruited"),
            ctc: row.text("ctc"),
            bonus: row.text("bonus"),
            mapped_id: row.text(MAPPING_COLUMN),
        })
    }
}
