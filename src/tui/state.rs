use crate::feed::types::{relative_age, FeedFilter, Post, Source, Tab, User};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Authenticating,
    Dashboard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryStatus {
    Idle,
    Loading,
    Ready(String),
}

/// Read-only snapshot the TUI renders. Rebuilt by the app after every change.
#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub gate_message: Option<String>,
    pub min_fin_balance: u64,
    pub user: Option<User>,
    pub tabs: Vec<TabRow>,
    pub active_tab_name: String,
    pub posts: Vec<PostRow>,
    pub search: String,
    pub filter: FeedFilter,
    pub tag_filter: Option<String>,
    pub summary: SummaryStatus,
    pub logs: VecDeque<LogEntry>,
    pub start_time: Instant,
}

#[derive(Debug, Clone)]
pub struct TabRow {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub notifications_enabled: bool,
    pub handles: Vec<String>,
    pub rss_urls: Vec<String>,
}

impl TabRow {
    pub fn from_tab(tab: &Tab, active: bool) -> Self {
        Self {
            id: tab.id.clone(),
            name: tab.name.clone(),
            active,
            notifications_enabled: tab.notifications_enabled,
            handles: tab.sources.clone(),
            rss_urls: tab.rss_urls.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: String,
    pub author_name: String,
    pub author_handle: String,
    pub source: Source,
    pub age: String,
    pub content: String,
    pub likes: u64,
    pub reposts: u64,
    pub tags: Vec<String>,
    pub liked: bool,
    pub bookmarked: bool,
}

impl PostRow {
    pub fn from_post(post: &Post, now: DateTime<Utc>) -> Self {
        Self {
            id: post.id.clone(),
            author_name: post.author_name.clone(),
            author_handle: post.author_handle.clone(),
            source: post.source,
            age: relative_age(post.date, now),
            content: post.content.clone(),
            likes: post.likes,
            reposts: post.reposts,
            tags: post.tags.clone(),
            liked: post.is_liked,
            bookmarked: post.is_bookmarked,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Landing,
            gate_message: None,
            min_fin_balance: 0,
            user: None,
            tabs: Vec::new(),
            active_tab_name: String::new(),
            posts: Vec::new(),
            search: String::new(),
            filter: FeedFilter::All,
            tag_filter: None,
            summary: SummaryStatus::Idle,
            logs: VecDeque::with_capacity(50),
            start_time: Instant::now(),
        }
    }

    pub fn push_log(&mut self, level: &str, message: String) {
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        if self.logs.len() >= 50 {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            time,
            level: level.to_string(),
            message,
        });
    }

    pub fn uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        format!("{}h {:02}m", h, m)
    }
}
