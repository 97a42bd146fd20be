use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// A timestamped, tagged unit of content owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub user_id: String,
    pub file_id: Option<String>,
    pub text: Option<String>,
    /// Raw tags as ingested. Use [`Chunk::normalized_tags`] for any
    /// comparison or counting.
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Chunk {
    pub fn new(id: String, user_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            file_id: None,
            text: None,
            tags: Vec::new(),
            summary: None,
            created_at,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|text| !text.is_empty())
    }

    /// Tags lowercased and trimmed, blanks dropped, duplicates removed
    /// keeping the first occurrence.
    pub fn normalized_tags(&self) -> Vec<String> {
        normalize_tags(&self.tags)
    }

    /// Usable for branch detection: has text and at least one tag.
    pub fn is_usable(&self) -> bool {
        self.has_text() && !self.normalized_tags().is_empty()
    }
}

/// Content submitted for ingestion; the owner and id are assigned on store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewChunk {
    pub text: Option<String>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub file_id: Option<String>,
    /// Defaults to the ingestion time.
    pub created_at: Option<DateTime<Utc>>,
}

/// Timestamps are stored as four-digit-year RFC 3339 text, which only sorts
/// chronologically for years 0000 through 9999.
pub fn is_storable_timestamp(ts: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&ts.year())
}

pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = normalize_tag(tag);
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}
