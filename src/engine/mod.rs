pub mod dashboard;
pub mod query;

pub use dashboard::{normalize_tag, Dashboard, TabUpdate};
pub use query::{query, SearchQuery};
