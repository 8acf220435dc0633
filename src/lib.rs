pub mod app;
pub mod config;
pub mod engine;
pub mod feed;
pub mod store;
pub mod summary;
pub mod tui;
pub mod wallet;
