// Integration tests for the feed query engine

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use curated_feed::engine::query;
    use curated_feed::feed::mock::MockFeed;
    use curated_feed::feed::types::{FeedFilter, Post, Source, Tab};

    fn post(id: &str, handle: &str, source: Source) -> Post {
        Post {
            id: id.to_string(),
            author_name: handle.to_uppercase(),
            author_handle: handle.to_string(),
            author_avatar: String::new(),
            content: format!("post by {}", handle),
            likes: 0,
            reposts: 0,
            source,
            date: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            tags: Vec::new(),
            is_liked: false,
            is_bookmarked: false,
        }
    }

    fn ids(result: &[&Post]) -> Vec<String> {
        result.iter().map(|p| p.id.clone()).collect()
    }

    fn two_posts() -> Vec<Post> {
        vec![
            post("1", "naval", Source::X),
            post("2", "techcrunch", Source::Rss),
        ]
    }

    #[test]
    fn test_rss_bypass_needs_an_rss_url() {
        let posts = two_posts();
        let mut tab = Tab::new("t", "General");
        tab.sources = vec!["naval".to_string()];

        let result = query(&posts, Some(&tab), "", FeedFilter::All, None);
        assert_eq!(ids(&result), vec!["1"]);

        tab.rss_urls = vec!["http://x".to_string()];
        let result = query(&posts, Some(&tab), "", FeedFilter::All, None);
        assert_eq!(ids(&result), vec!["1", "2"]);
    }

    #[test]
    fn test_from_operator_without_tab() {
        let posts = two_posts();
        let result = query(&posts, None, "from:techcrunch", FeedFilter::All, None);
        assert_eq!(ids(&result), vec!["2"]);
        assert!(result.iter().all(|p| p.author_handle.contains("techcrunch")));
    }

    #[test]
    fn test_hash_operator_matches_tags() {
        let mut a = post("a", "vitalik", Source::X);
        a.tags = vec!["crypto".to_string(), "ai".to_string()];
        let mut b = post("b", "lex", Source::YouTube);
        b.tags = vec!["ai".to_string()];
        let posts = vec![a, b];

        let result = query(&posts, None, "#crypto", FeedFilter::All, None);
        assert_eq!(ids(&result), vec!["a"]);
    }

    #[test]
    fn test_popular_orders_by_likes() {
        let mut posts: Vec<Post> = ["p5", "p50", "p1"]
            .iter()
            .map(|id| post(id, "naval", Source::X))
            .collect();
        posts[0].likes = 5;
        posts[1].likes = 50;
        posts[2].likes = 1;

        let result = query(&posts, None, "", FeedFilter::Popular, None);
        assert_eq!(ids(&result), vec!["p50", "p5", "p1"]);
    }

    #[test]
    fn test_mock_feed_properties() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let posts = MockFeed::new(now).posts();
        let original = posts.clone();
        let tabs = MockFeed::tabs();

        let searches = ["", "  ", "ai", "from:paul", "source:rss", "#ai", "nothing-matches"];
        let tag_filters = [None, Some("ai"), Some("crypto")];

        for tab in tabs.iter().map(Some).chain(std::iter::once(None)) {
            for filter in FeedFilter::ALL {
                for search in searches {
                    for tag in tag_filters {
                        let first = query(&posts, tab, search, filter, tag);
                        let second = query(&posts, tab, search, filter, tag);

                        // idempotent
                        assert_eq!(ids(&first), ids(&second));

                        // subset, no duplicates, fields untouched
                        let mut seen = std::collections::HashSet::new();
                        for p in &first {
                            assert!(seen.insert(p.id.clone()));
                            assert!(original.contains(*p));
                        }

                        if filter == FeedFilter::Recent {
                            assert!(first.windows(2).all(|w| w[0].date >= w[1].date));
                        }
                        if filter == FeedFilter::Popular {
                            assert!(first.windows(2).all(|w| w[0].likes >= w[1].likes));
                        }
                    }
                }
            }
        }
        assert_eq!(posts, original);
    }

    #[test]
    fn test_blank_search_equals_no_search() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let posts = MockFeed::new(now).posts();
        let tab = &MockFeed::tabs()[1];
        let plain = query(&posts, Some(tab), "", FeedFilter::All, None);
        let blank = query(&posts, Some(tab), "   ", FeedFilter::All, None);
        assert_eq!(ids(&plain), ids(&blank));
    }

    #[test]
    fn test_stages_compose_with_and() {
        let mut x = post("x", "naval", Source::X);
        x.tags = vec!["ai".to_string()];
        let mut rss = post("rss", "techcrunch", Source::Rss);
        rss.tags = vec!["ai".to_string()];
        let posts = vec![x, rss];

        let mut tab = Tab::new("t", "Mixed");
        tab.sources = vec!["naval".to_string()];
        tab.rss_urls = vec!["http://x".to_string()];

        // Both pass the tab and tag stages; only one survives the source stage.
        let result = query(&posts, Some(&tab), "", FeedFilter::Rss, Some("ai"));
        assert_eq!(ids(&result), vec!["rss"]);

        // The search stage still applies on top.
        let result = query(&posts, Some(&tab), "naval", FeedFilter::Rss, Some("ai"));
        assert!(result.is_empty());
    }

    #[test]
    fn test_recent_is_stable_on_ties() {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut posts: Vec<Post> = ["old", "tie-a", "tie-b"]
            .iter()
            .map(|id| post(id, "naval", Source::X))
            .collect();
        posts[0].date = base;
        posts[1].date = base + Duration::hours(1);
        posts[2].date = base + Duration::hours(1);

        let result = query(&posts, None, "", FeedFilter::Recent, None);
        assert_eq!(ids(&result), vec!["tie-a", "tie-b", "old"]);
    }

    #[test]
    fn test_popular_is_stable_on_ties() {
        let mut posts: Vec<Post> = ["tie-a", "top", "tie-b", "tie-c"]
            .iter()
            .map(|id| post(id, "naval", Source::X))
            .collect();
        for p in posts.iter_mut() {
            p.likes = 7;
        }
        posts[1].likes = 40;

        let result = query(&posts, None, "", FeedFilter::Popular, None);
        assert_eq!(ids(&result), vec!["top", "tie-a", "tie-b", "tie-c"]);
    }

    #[test]
    fn test_popular_keeps_mock_order_when_all_tied() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut posts = MockFeed::new(now).posts();
        for p in posts.iter_mut() {
            p.likes = 7;
        }
        let result = query(&posts, None, "", FeedFilter::Popular, None);
        assert_eq!(ids(&result), vec!["1", "2", "3", "4", "5"]);
    }
}
