use super::types::*;
use super::PostFeed;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

/// Hard-coded demo content. Publish times are relative to `now` so the feed
/// always looks fresh.
pub struct MockFeed {
    now: DateTime<Utc>,
}

impl MockFeed {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn posts(&self) -> Vec<Post> {
        let post = |id: &str,
                    name: &str,
                    handle: &str,
                    seed: &str,
                    content: &str,
                    likes: u64,
                    reposts: u64,
                    source: Source,
                    minutes_ago: i64,
                    tags: &[&str]| Post {
            id: id.to_string(),
            author_name: name.to_string(),
            author_handle: handle.to_string(),
            author_avatar: format!("https://picsum.photos/seed/{}/100/100", seed),
            content: content.to_string(),
            likes,
            reposts,
            source,
            date: self.now - Duration::minutes(minutes_ago),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_liked: false,
            is_bookmarked: false,
        };

        vec![
            post(
                "1",
                "Naval Ravikant",
                "naval",
                "naval",
                "The closer you are to the truth, the more silent you become inside.",
                12_400,
                2_100,
                Source::X,
                120,
                &["philosophy"],
            ),
            post(
                "2",
                "Paul Graham",
                "paulg",
                "paulg",
                "The best way to increase your discipline is to choose something you actually want to do.",
                8_500,
                1_200,
                Source::X,
                240,
                &["startups"],
            ),
            post(
                "3",
                "Vitalik Buterin",
                "VitalikButerin",
                "vitalik",
                "The most important property of a public good is that it is non-excludable and non-rivalrous.",
                15_600,
                3_400,
                Source::X,
                360,
                &["crypto", "public-goods"],
            ),
            post(
                "4",
                "TechCrunch",
                "techcrunch",
                "tc",
                "OpenAI announces new search capabilities, directly challenging traditional search engines.",
                4_200,
                900,
                Source::Rss,
                480,
                &["ai", "search"],
            ),
            post(
                "5",
                "Lex Fridman",
                "lexfridman",
                "lex",
                "Talking with creators about the future of human-AI collaboration. The possibilities are endless.",
                11_000,
                1_500,
                Source::YouTube,
                600,
                &["ai", "podcast"],
            ),
        ]
    }

    pub fn tabs() -> Vec<Tab> {
        vec![
            Tab {
                sources: vec!["naval".to_string(), "paulg".to_string()],
                ..Tab::new("1", "General")
            },
            Tab {
                sources: vec!["VitalikButerin".to_string()],
                rss_urls: vec!["https://vitalik.ca/feed.xml".to_string()],
                notifications_enabled: true,
                ..Tab::new("2", "Crypto")
            },
            Tab {
                sources: vec!["techcrunch".to_string()],
                notifications_enabled: true,
                ..Tab::new("3", "Work")
            },
        ]
    }
}

#[async_trait]
impl PostFeed for MockFeed {
    async fn fetch_posts(&mut self) -> Result<Vec<Post>> {
        Ok(self.posts())
    }

    fn initial_tabs(&self) -> Vec<Tab> {
        Self::tabs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_feed_serves_demo_posts() {
        let now = Utc::now();
        let mut feed = MockFeed::new(now);
        let posts = feed.fetch_posts().await.unwrap();
        assert_eq!(posts.len(), 5);
        assert!(posts.iter().all(|p| p.date < now));
        assert_eq!(posts.iter().filter(|p| p.source == Source::Rss).count(), 1);
    }

    #[test]
    fn test_initial_tabs_have_unique_ids() {
        let tabs = MockFeed::new(Utc::now()).initial_tabs();
        let mut ids: Vec<&str> = tabs.iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), tabs.len());
    }
}
