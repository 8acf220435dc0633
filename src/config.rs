use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".curated-feed")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummaryConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
    /// Number of visible posts fed into the prompt.
    #[serde(default = "default_max_posts")]
    pub max_posts: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}
fn default_system_instruction() -> String {
    "You are a Gen Z analyst tracking high-signal data. Be brief, use modern terminology, and highlight key trends.".to_string()
}
fn default_max_posts() -> usize { crate::summary::DEFAULT_MAX_POSTS }
fn default_request_timeout() -> u64 { 30_000 }

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            system_instruction: default_system_instruction(),
            max_posts: default_max_posts(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WalletConfig {
    /// FIN balance required to pass the gate.
    #[serde(default = "default_min_fin_balance")]
    pub min_fin_balance: u64,
    #[serde(default = "default_connect_delay")]
    pub connect_delay_ms: u64,
}

fn default_min_fin_balance() -> u64 { 1000 }
fn default_connect_delay() -> u64 { 1500 }

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            min_fin_balance: default_min_fin_balance(),
            connect_delay_ms: default_connect_delay(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    #[serde(default = "default_tick")]
    pub tick_ms: u64,
}

fn default_tick() -> u64 { 100 }

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        // Strip BOM if present (common on Windows-created files)
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for (key, value) in parse_env_lines(content) {
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }

    /// Summary API key from `GEMINI_API_KEY`, falling back to `API_KEY`.
    /// `None` leaves the summary feature unconfigured.
    pub fn summary_api_key() -> Option<String> {
        ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .map(|key| sanitize_key(&key))
            .find(|key| !key.is_empty())
    }
}

/// KEY=VALUE pairs from .env text, skipping blanks and comments.
fn parse_env_lines(content: &str) -> Vec<(&str, &str)> {
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim().trim_matches('"').trim_matches('\'')))
        .collect()
}

/// Strip carriage returns, BOM, and other invisible chars from a key value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}
