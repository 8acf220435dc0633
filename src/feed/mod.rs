pub mod mock;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;
use types::{Post, Tab};

#[async_trait]
pub trait PostFeed: Send + Sync {
    async fn fetch_posts(&mut self) -> Result<Vec<Post>>;
    /// Streams offered to a first-time user.
    fn initial_tabs(&self) -> Vec<Tab>;
}
