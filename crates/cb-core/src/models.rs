//! # Domain Models
//!
//! These structs represent the core entities of the club board.
//! Ids are SQLite rowids; timestamps are Tokyo wall-clock times.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Display name used when a poster leaves the name field blank.
pub const DEFAULT_NAME: &str = "Anonymous Student";

/// A topic category (e.g., "Study Club")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Club {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Validated input for a new club.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClub {
    pub(crate) name: String,
    pub(crate) description: String,
}

impl NewClub {
    pub fn new(name: &str, description: &str) -> Result<Self> {
        let mut missing = Vec::new();
        if name.trim().is_empty() {
            missing.push("name");
        }
        if description.trim().is_empty() {
            missing.push("description");
        }
        if !missing.is_empty() {
            return Err(AppError::missing_fields(&missing));
        }
        Ok(Self {
            name: name.trim().to_string(),
            description: description.trim().to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A discussion topic inside a club.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    pub club_id: i64,
    pub title: String,
    /// Body of the opening post; mirrored into the first Response
    pub description: String,
    pub created_at: NaiveDateTime,
    #[serde(skip_serializing)]
    pub delete_password: String,
}

/// A thread row as shown in a club listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: i64,
    pub club_id: i64,
    pub title: String,
    pub description: String,
    pub created_at: NaiveDateTime,
    /// Number of responses, opening post included
    pub response_count: i64,
}

/// A search result: a thread joined with the name of its club.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub thread_id: i64,
    pub club_id: i64,
    pub club_name: String,
    pub title: String,
    pub description: String,
    pub created_at: NaiveDateTime,
}

/// A single post within a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub thread_id: i64,
    pub text: String,
    pub name: String,
    pub created_at: NaiveDateTime,
    /// Daily pseudonym derived from ip + date
    pub anon_id: String,
    #[serde(skip_serializing)]
    pub ip_address: String,
    /// Absent on rows written before per-response passwords existed
    #[serde(skip_serializing)]
    pub delete_password: Option<String>,
    /// Reference returned by the MediaStore
    pub image_filename: Option<String>,
}

/// Row data for a thread insert.
#[derive(Debug, Clone)]
pub struct NewThread {
    pub club_id: i64,
    pub title: String,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub delete_password: String,
}

/// Row data for a response insert. The thread id is supplied separately
/// because the opening post does not know it until the thread exists.
#[derive(Debug, Clone)]
pub struct NewResponse {
    pub text: String,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub anon_id: String,
    pub ip_address: String,
    pub delete_password: Option<String>,
    pub image_filename: Option<String>,
}

/// Raw bytes of an uploaded image, before the MediaStore normalizes them.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub original_name: String,
}

/// Validated user input for a new thread.
#[derive(Debug, Clone)]
pub struct ThreadDraft {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) delete_password: String,
    pub(crate) image: Option<ImageUpload>,
}

impl ThreadDraft {
    /// Fails with a ValidationError naming every blank field.
    pub fn new(
        title: &str,
        description: &str,
        delete_password: &str,
        image: Option<ImageUpload>,
    ) -> Result<Self> {
        let mut missing = Vec::new();
        if title.trim().is_empty() {
            missing.push("title");
        }
        if description.trim().is_empty() {
            missing.push("description");
        }
        if delete_password.trim().is_empty() {
            missing.push("delete_password");
        }
        if !missing.is_empty() {
            return Err(AppError::missing_fields(&missing));
        }
        Ok(Self {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            // compared verbatim on deletion
            delete_password: delete_password.to_string(),
            image,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn delete_password(&self) -> &str {
        &self.delete_password
    }
}

/// Validated user input for a reply.
#[derive(Debug, Clone)]
pub struct ReplyDraft {
    pub(crate) name: Option<String>,
    pub(crate) content: String,
    pub(crate) delete_password: String,
    pub(crate) image: Option<ImageUpload>,
}

impl ReplyDraft {
    pub fn new(
        name: Option<&str>,
        content: &str,
        delete_password: &str,
        image: Option<ImageUpload>,
    ) -> Result<Self> {
        let mut missing = Vec::new();
        if content.trim().is_empty() {
            missing.push("content");
        }
        if delete_password.trim().is_empty() {
            missing.push("delete_password");
        }
        if !missing.is_empty() {
            return Err(AppError::missing_fields(&missing));
        }
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        Ok(Self {
            name,
            content: content.trim().to_string(),
            delete_password: delete_password.to_string(),
            image,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// The poster's chosen name; `None` means the default name applies.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn delete_password(&self) -> &str {
        &self.delete_password
    }
}

/// Thread ordering inside a club listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Creation time, newest first
    #[default]
    Newest,
    /// Response count, restricted to recently created threads
    Popular,
}

impl SortMode {
    /// Unknown or absent values fall back to `Newest`.
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("popular") => SortMode::Popular,
            _ => SortMode::Newest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Newest => "newest",
            SortMode::Popular => "popular",
        }
    }
}

/// One page of a club's thread listing.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadPage {
    pub threads: Vec<ThreadSummary>,
    pub sort: SortMode,
    pub page: u32,
    pub page_size: u32,
    /// Threads matching the sort filter across all pages
    pub total: u64,
    pub total_pages: u32,
}

/// Parses a 1-based page number; anything unusable becomes page 1.
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1)
}

/// ceil(total / page_size)
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size)) as u32
}
