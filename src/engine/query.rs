use crate::feed::types::{FeedFilter, Post, Source, Tab};

/// Parsed free-text search box contents.
///
/// Operator prefixes are checked in order (`from:`, `source:`, `#`); the first
/// match wins and the trimmed remainder is the operand. Anything else is a
/// plain substring search over content, author name and handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Everything,
    From(String),
    Source(String),
    Tag(String),
    Text(String),
}

impl SearchQuery {
    pub fn parse(raw: &str) -> Self {
        let q = raw.trim().to_lowercase();
        if q.is_empty() {
            return SearchQuery::Everything;
        }
        if let Some(handle) = q.strip_prefix("from:") {
            return SearchQuery::From(handle.trim().to_string());
        }
        if let Some(name) = q.strip_prefix("source:") {
            return SearchQuery::Source(name.trim().to_string());
        }
        if let Some(tag) = q.strip_prefix('#') {
            return SearchQuery::Tag(tag.trim().to_string());
        }
        SearchQuery::Text(q)
    }

    pub fn matches(&self, post: &Post) -> bool {
        match self {
            SearchQuery::Everything => true,
            SearchQuery::From(handle) => post.author_handle.to_lowercase().contains(handle.as_str()),
            SearchQuery::Source(name) => post.source.as_str().to_lowercase().contains(name.as_str()),
            SearchQuery::Tag(tag) => post.tags.iter().any(|t| t.to_lowercase().contains(tag.as_str())),
            SearchQuery::Text(text) => {
                post.content.to_lowercase().contains(text.as_str())
                    || post.author_name.to_lowercase().contains(text.as_str())
                    || post.author_handle.to_lowercase().contains(text.as_str())
            }
        }
    }
}

/// Stage 1: stream membership.
///
/// A tab with no handles is unfiltered. Otherwise a post belongs if its author
/// is on the allow-list, or it is an RSS post and the tab has any RSS URL at
/// all. There is no per-feed association between RSS posts and URLs.
pub fn in_tab(post: &Post, tab: Option<&Tab>) -> bool {
    let Some(tab) = tab else { return true };
    if tab.sources.is_empty() {
        return true;
    }
    tab.sources.iter().any(|h| *h == post.author_handle)
        || (post.source == Source::Rss && !tab.rss_urls.is_empty())
}

/// Stage 2: structural source restriction. Sort-only modes pass everything.
pub fn matches_source(post: &Post, filter: FeedFilter) -> bool {
    filter.source().is_none_or(|src| post.source == src)
}

/// Stage 3: exact tag match. Callers normalize the tag before setting it.
pub fn matches_tag(post: &Post, tag_filter: Option<&str>) -> bool {
    tag_filter.is_none_or(|tag| post.has_tag(tag))
}

/// Derive the visible post list.
///
/// Every stage must pass (logical AND). The result borrows from `posts` and
/// keeps the original relative order unless `filter` is `Recent` or
/// `Popular`, which sort stably (newest first / most liked first).
pub fn query<'a>(
    posts: &'a [Post],
    active_tab: Option<&Tab>,
    search: &str,
    filter: FeedFilter,
    tag_filter: Option<&str>,
) -> Vec<&'a Post> {
    let search = SearchQuery::parse(search);

    let mut result: Vec<&Post> = posts
        .iter()
        .filter(|p| in_tab(p, active_tab))
        .filter(|p| matches_source(p, filter))
        .filter(|p| matches_tag(p, tag_filter))
        .filter(|p| search.matches(p))
        .collect();

    match filter {
        FeedFilter::Recent => result.sort_by(|a, b| b.date.cmp(&a.date)),
        FeedFilter::Popular => result.sort_by(|a, b| b.likes.cmp(&a.likes)),
        _ => {}
    }

    result
}
