use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized post/tab types shared by the engine, the store and the TUI.

/// Where a post originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "X")]
    X,
    #[serde(rename = "RSS")]
    Rss,
    #[serde(rename = "YouTube")]
    YouTube,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::X => "X",
            Source::Rss => "RSS",
            Source::YouTube => "YouTube",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_name: String,
    pub author_handle: String,
    #[serde(default)]
    pub author_avatar: String,
    pub content: String,
    pub likes: u64,
    #[serde(default)]
    pub reposts: u64,
    pub source: Source,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_bookmarked: bool,
}

impl Post {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// View mode selected by the filter pills. The first three restrict by source,
/// the last two only reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FeedFilter {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "X")]
    X,
    #[serde(rename = "RSS")]
    Rss,
    #[serde(rename = "YouTube")]
    YouTube,
    #[serde(rename = "recent")]
    Recent,
    #[serde(rename = "popular")]
    Popular,
}

impl FeedFilter {
    /// Pill order in the dashboard.
    pub const ALL: [FeedFilter; 6] = [
        FeedFilter::All,
        FeedFilter::X,
        FeedFilter::Rss,
        FeedFilter::YouTube,
        FeedFilter::Recent,
        FeedFilter::Popular,
    ];

    /// The source this mode restricts to, if any.
    pub fn source(&self) -> Option<Source> {
        match self {
            FeedFilter::X => Some(Source::X),
            FeedFilter::Rss => Some(Source::Rss),
            FeedFilter::YouTube => Some(Source::YouTube),
            FeedFilter::All | FeedFilter::Recent | FeedFilter::Popular => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeedFilter::All => "ALL FEEDS",
            FeedFilter::X => "X (TWITTER)",
            FeedFilter::Rss => "RSS FEEDS",
            FeedFilter::YouTube => "YOUTUBE",
            FeedFilter::Recent => "NEWEST",
            FeedFilter::Popular => "VIRAL",
        }
    }
}

/// A named stream grouping posts by authorship or source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub id: String,
    pub name: String,
    /// Author handles allowed into this stream.
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub rss_urls: Vec<String>,
    #[serde(default)]
    pub notifications_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_filter: Option<FeedFilter>,
}

impl Tab {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sources: Vec::new(),
            rss_urls: Vec::new(),
            notifications_enabled: false,
            default_filter: None,
        }
    }
}

/// Wallet-backed user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub wallet_address: String,
    pub fin_token_balance: u64,
}

/// Short relative age, e.g. "2h ago".
pub fn relative_age(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - date).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m ago", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_filter_source_restriction() {
        assert_eq!(FeedFilter::X.source(), Some(Source::X));
        assert_eq!(FeedFilter::Rss.source(), Some(Source::Rss));
        assert_eq!(FeedFilter::Recent.source(), None);
        assert_eq!(FeedFilter::Popular.source(), None);
        assert_eq!(FeedFilter::All.source(), None);
    }

    #[test]
    fn test_source_serializes_as_display_name() {
        let json = serde_json::to_string(&Source::YouTube).unwrap();
        assert_eq!(json, "\"YouTube\"");
        let back: Source = serde_json::from_str("\"RSS\"").unwrap();
        assert_eq!(back, Source::Rss);
    }

    #[test]
    fn test_relative_age() {
        let now = Utc::now();
        assert_eq!(relative_age(now, now), "just now");
        assert_eq!(relative_age(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(relative_age(now - Duration::hours(2), now), "2h ago");
        assert_eq!(relative_age(now - Duration::hours(50), now), "2d ago");
    }
}
