use super::query;
use crate::feed::types::{FeedFilter, Post, Tab, User};
use rand::Rng;

/// Partial tab update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TabUpdate {
    pub name: Option<String>,
    pub sources: Option<Vec<String>>,
    pub rss_urls: Option<Vec<String>>,
    pub notifications_enabled: Option<bool>,
    pub default_filter: Option<Option<FeedFilter>>,
}

/// Everything the dashboard shows, owned in one place. Mutations happen here;
/// the visible list is always recomputed from scratch by [`query::query`].
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub user: Option<User>,
    tabs: Vec<Tab>,
    active_tab_id: Option<String>,
    posts: Vec<Post>,
    search: String,
    filter: FeedFilter,
    tag_filter: Option<String>,
}

/// Trim, drop a leading `#`, lower-case. Tags are stored in this form.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').trim().to_lowercase()
}

impl Dashboard {
    pub fn new(tabs: Vec<Tab>, posts: Vec<Post>) -> Self {
        let active_tab_id = tabs.first().map(|t| t.id.clone());
        Self {
            user: None,
            tabs,
            active_tab_id,
            posts,
            search: String::new(),
            filter: FeedFilter::All,
            tag_filter: None,
        }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        let id = self.active_tab_id.as_deref()?;
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn active_tab_id(&self) -> Option<&str> {
        self.active_tab_id.as_deref()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filter(&self) -> FeedFilter {
        self.filter
    }

    pub fn tag_filter(&self) -> Option<&str> {
        self.tag_filter.as_deref()
    }

    /// Posts visible under the current tab, search, filter and tag filter.
    pub fn visible(&self) -> Vec<&Post> {
        query::query(
            &self.posts,
            self.active_tab(),
            &self.search,
            self.filter,
            self.tag_filter.as_deref(),
        )
    }

    /// Content of the first `limit` visible posts, in display order.
    pub fn summary_contents(&self, limit: usize) -> Vec<String> {
        self.visible()
            .into_iter()
            .take(limit)
            .map(|p| p.content.clone())
            .collect()
    }

    // --- query parameters ---

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_filter(&mut self, filter: FeedFilter) {
        self.filter = filter;
    }

    /// Empty input clears the tag filter.
    pub fn set_tag_filter(&mut self, tag: Option<&str>) {
        self.tag_filter = tag.map(normalize_tag).filter(|t| !t.is_empty());
    }

    // --- post actions ---

    /// Flip the liked flag, adjusting the like count. Returns false for an unknown id.
    pub fn toggle_like(&mut self, post_id: &str) -> bool {
        let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) else {
            return false;
        };
        if post.is_liked {
            post.likes = post.likes.saturating_sub(1);
        } else {
            post.likes += 1;
        }
        post.is_liked = !post.is_liked;
        true
    }

    pub fn toggle_bookmark(&mut self, post_id: &str) -> bool {
        let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) else {
            return false;
        };
        post.is_bookmarked = !post.is_bookmarked;
        true
    }

    /// Append a normalized tag. Returns false if the post is unknown, the tag
    /// is empty, or the post already carries it.
    pub fn add_tag(&mut self, post_id: &str, raw: &str) -> bool {
        let tag = normalize_tag(raw);
        if tag.is_empty() {
            return false;
        }
        let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) else {
            return false;
        };
        if post.has_tag(&tag) {
            return false;
        }
        post.tags.push(tag);
        true
    }

    // --- tab CRUD ---

    /// Create an empty "New Stream" tab and make it active. Returns its id.
    pub fn add_tab(&mut self) -> String {
        let mut rng = rand::thread_rng();
        let id = loop {
            let candidate = random_id(&mut rng);
            if !self.tabs.iter().any(|t| t.id == candidate) {
                break candidate;
            }
        };
        self.tabs.push(Tab::new(id.clone(), "New Stream"));
        self.active_tab_id = Some(id.clone());
        id
    }

    /// Remove a tab. The last remaining tab cannot be deleted. Deleting the
    /// active tab activates the first remaining one.
    pub fn delete_tab(&mut self, tab_id: &str) -> bool {
        if self.tabs.len() <= 1 || !self.tabs.iter().any(|t| t.id == tab_id) {
            return false;
        }
        self.tabs.retain(|t| t.id != tab_id);
        if self.active_tab_id.as_deref() == Some(tab_id) {
            self.active_tab_id = self.tabs.first().map(|t| t.id.clone());
        }
        true
    }

    pub fn update_tab(&mut self, tab_id: &str, update: TabUpdate) -> bool {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id == tab_id) else {
            return false;
        };
        if let Some(name) = update.name {
            tab.name = name;
        }
        if let Some(sources) = update.sources {
            tab.sources = sources;
        }
        if let Some(rss_urls) = update.rss_urls {
            tab.rss_urls = rss_urls;
        }
        if let Some(enabled) = update.notifications_enabled {
            tab.notifications_enabled = enabled;
        }
        if let Some(default_filter) = update.default_filter {
            tab.default_filter = default_filter;
        }
        true
    }

    pub fn rename_tab(&mut self, tab_id: &str, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.update_tab(
            tab_id,
            TabUpdate {
                name: Some(name.to_string()),
                ..Default::default()
            },
        )
    }

    pub fn toggle_notifications(&mut self, tab_id: &str) -> bool {
        let Some(enabled) = self.find_tab(tab_id).map(|t| t.notifications_enabled) else {
            return false;
        };
        self.update_tab(
            tab_id,
            TabUpdate {
                notifications_enabled: Some(!enabled),
                ..Default::default()
            },
        )
    }

    pub fn add_rss_url(&mut self, tab_id: &str, url: &str) -> bool {
        let url = url.trim();
        let Some(tab) = self.find_tab(tab_id) else {
            return false;
        };
        if url.is_empty() {
            return false;
        }
        let mut rss_urls = tab.rss_urls.clone();
        rss_urls.push(url.to_string());
        self.update_tab(
            tab_id,
            TabUpdate {
                rss_urls: Some(rss_urls),
                ..Default::default()
            },
        )
    }

    /// Add an author handle to a tab's allow-list (leading `@` stripped).
    pub fn add_handle(&mut self, tab_id: &str, handle: &str) -> bool {
        let handle = handle.trim().trim_start_matches('@');
        let Some(tab) = self.find_tab(tab_id) else {
            return false;
        };
        if handle.is_empty() || tab.sources.iter().any(|h| h == handle) {
            return false;
        }
        let mut sources = tab.sources.clone();
        sources.push(handle.to_string());
        self.update_tab(
            tab_id,
            TabUpdate {
                sources: Some(sources),
                ..Default::default()
            },
        )
    }

    pub fn remove_handle(&mut self, tab_id: &str, handle: &str) -> bool {
        let Some(tab) = self.find_tab(tab_id) else {
            return false;
        };
        if !tab.sources.iter().any(|h| h == handle) {
            return false;
        }
        let sources = tab.sources.iter().filter(|h| *h != handle).cloned().collect();
        self.update_tab(
            tab_id,
            TabUpdate {
                sources: Some(sources),
                ..Default::default()
            },
        )
    }

    /// Activate a tab, applying its default filter when it has one.
    pub fn select_tab(&mut self, tab_id: &str) -> bool {
        let Some(default_filter) = self.find_tab(tab_id).map(|t| t.default_filter) else {
            return false;
        };
        self.active_tab_id = Some(tab_id.to_string());
        if let Some(filter) = default_filter {
            self.filter = filter;
        }
        true
    }

    /// Move the active tab by `delta` positions, wrapping around.
    pub fn cycle_tab(&mut self, delta: isize) -> bool {
        if self.tabs.is_empty() {
            return false;
        }
        let len = self.tabs.len() as isize;
        let current = self
            .active_tab_id
            .as_deref()
            .and_then(|id| self.tabs.iter().position(|t| t.id == id))
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        let id = self.tabs[next].id.clone();
        self.select_tab(&id)
    }

    // --- profile ---

    pub fn update_profile(&mut self, name: Option<&str>, avatar: Option<&str>) -> bool {
        let Some(user) = self.user.as_mut() else {
            return false;
        };
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            user.name = name.to_string();
        }
        if let Some(avatar) = avatar {
            let avatar = avatar.trim();
            user.avatar = if avatar.is_empty() { None } else { Some(avatar.to_string()) };
        }
        true
    }

    fn find_tab(&self, tab_id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }
}

fn random_id(rng: &mut impl Rng) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::mock::MockFeed;
    use chrono::Utc;

    fn demo() -> Dashboard {
        let feed = MockFeed::new(Utc::now());
        Dashboard::new(MockFeed::tabs(), feed.posts())
    }

    #[test]
    fn test_first_tab_is_active() {
        let d = demo();
        assert_eq!(d.active_tab().map(|t| t.name.as_str()), Some("General"));
        let handles: Vec<&str> = d.visible().iter().map(|p| p.author_handle.as_str()).collect();
        assert_eq!(handles, vec!["naval", "paulg"]);
    }

    #[test]
    fn test_crypto_tab_includes_rss_bypass() {
        let mut d = demo();
        assert!(d.select_tab("2"));
        let handles: Vec<&str> = d.visible().iter().map(|p| p.author_handle.as_str()).collect();
        assert_eq!(handles, vec!["VitalikButerin", "techcrunch"]);
    }

    #[test]
    fn test_toggle_like_round_trip() {
        let mut d = demo();
        let before = d.posts()[0].likes;
        assert!(d.toggle_like("1"));
        assert!(d.posts()[0].is_liked);
        assert_eq!(d.posts()[0].likes, before + 1);
        assert!(d.toggle_like("1"));
        assert!(!d.posts()[0].is_liked);
        assert_eq!(d.posts()[0].likes, before);
        assert!(!d.toggle_like("missing"));
    }

    #[test]
    fn test_toggle_bookmark() {
        let mut d = demo();
        assert!(d.toggle_bookmark("3"));
        assert!(d.posts()[2].is_bookmarked);
    }

    #[test]
    fn test_add_tag_normalizes_and_dedupes() {
        let mut d = demo();
        assert!(d.add_tag("1", "  #Wisdom "));
        assert_eq!(d.posts()[0].tags, vec!["philosophy", "wisdom"]);
        assert!(!d.add_tag("1", "WISDOM"));
        assert!(!d.add_tag("1", "  # "));
    }

    #[test]
    fn test_tag_filter_normalized() {
        let mut d = demo();
        d.select_tab("2");
        d.set_tag_filter(Some("#Crypto"));
        assert_eq!(d.tag_filter(), Some("crypto"));
        assert_eq!(d.visible().len(), 1);
        d.set_tag_filter(Some("  "));
        assert_eq!(d.tag_filter(), None);
    }

    #[test]
    fn test_add_tab_becomes_active_and_is_unfiltered() {
        let mut d = demo();
        let id = d.add_tab();
        assert_eq!(id.len(), 9);
        assert_eq!(d.active_tab_id(), Some(id.as_str()));
        assert_eq!(d.active_tab().unwrap().name, "New Stream");
        assert_eq!(d.visible().len(), 5);
    }

    #[test]
    fn test_delete_last_tab_refused() {
        let mut d = Dashboard::new(vec![Tab::new("only", "Only")], Vec::new());
        assert!(!d.delete_tab("only"));
        assert_eq!(d.tabs().len(), 1);
    }

    #[test]
    fn test_delete_active_tab_activates_first() {
        let mut d = demo();
        d.select_tab("3");
        assert!(d.delete_tab("3"));
        assert_eq!(d.active_tab_id(), Some("1"));
        assert!(d.delete_tab("1"));
        assert_eq!(d.active_tab_id(), Some("2"));
    }

    #[test]
    fn test_select_tab_applies_default_filter() {
        let mut d = demo();
        d.update_tab(
            "3",
            TabUpdate {
                default_filter: Some(Some(FeedFilter::Popular)),
                ..Default::default()
            },
        );
        assert!(d.select_tab("3"));
        assert_eq!(d.filter(), FeedFilter::Popular);
        assert!(!d.select_tab("nope"));
    }

    #[test]
    fn test_rss_and_handle_edits() {
        let mut d = demo();
        assert!(!d.add_rss_url("1", "   "));
        assert!(d.add_rss_url("1", "https://example.com/feed"));
        assert_eq!(d.tabs()[0].rss_urls, vec!["https://example.com/feed"]);
        assert!(d.add_handle("1", "@lexfridman"));
        assert!(!d.add_handle("1", "lexfridman"));
        assert!(d.remove_handle("1", "naval"));
        assert_eq!(d.tabs()[0].sources, vec!["paulg", "lexfridman"]);
    }

    #[test]
    fn test_cycle_tab_wraps() {
        let mut d = demo();
        assert!(d.cycle_tab(-1));
        assert_eq!(d.active_tab_id(), Some("3"));
        assert!(d.cycle_tab(1));
        assert_eq!(d.active_tab_id(), Some("1"));
    }

    #[test]
    fn test_summary_contents_capped() {
        let mut d = demo();
        d.select_tab("2");
        assert_eq!(d.summary_contents(1).len(), 1);
        assert_eq!(d.summary_contents(10).len(), 2);
    }

    #[test]
    fn test_update_profile_requires_user() {
        let mut d = demo();
        assert!(!d.update_profile(Some("x"), None));
        d.user = Some(User {
            id: "u".into(),
            name: "Old".into(),
            avatar: None,
            wallet_address: "0x".into(),
            fin_token_balance: 0,
        });
        assert!(d.update_profile(Some("  New  "), Some("https://a/b.png")));
        let user = d.user.as_ref().unwrap();
        assert_eq!(user.name, "New");
        assert_eq!(user.avatar.as_deref(), Some("https://a/b.png"));
    }
}
