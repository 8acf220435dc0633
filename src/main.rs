use anyhow::{Context, Result};
use curated_feed::app::App;
use curated_feed::config::Config;
use curated_feed::engine::Dashboard;
use curated_feed::feed::{mock::MockFeed, PostFeed};
use curated_feed::store::{self, FileStore, KvStore};
use curated_feed::summary::{gemini::GeminiSummarizer, Summarizer, Unconfigured};
use curated_feed::tui::{self, TuiCommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct Args {
    config: PathBuf,
    reset: bool,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args {
        config: PathBuf::from("config.toml"),
        reset: false,
    };
    let mut args = args.skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                parsed.config = PathBuf::from(path);
            }
            "--reset" => parsed.reset = true,
            other => anyhow::bail!("unknown argument: {}", other),
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_file = std::fs::File::create("curated-feed.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "curated_feed=info".into()),
        )
        .with_writer(log_file)
        .init();

    let args = parse_args(std::env::args())?;
    let config = Config::load(&args.config)?;

    // Load saved keys from .env (real env vars take precedence)
    Config::load_env_file();

    let store: Arc<dyn KvStore> = Arc::new(FileStore::open(&config.store.dir)?);
    if args.reset {
        store::clear(store.as_ref()).context("Failed to reset stored state")?;
        tracing::info!(dir = %config.store.dir.display(), "stored state cleared");
    }

    // Persisted state wins; the mock feed seeds a first run.
    let snapshot = store::load_snapshot(store.as_ref());
    let mut feed = MockFeed::new(chrono::Utc::now());
    let tabs = snapshot.tabs.unwrap_or_else(|| feed.initial_tabs());
    let posts = match snapshot.posts {
        Some(posts) => posts,
        None => feed.fetch_posts().await?,
    };
    tracing::info!(tabs = tabs.len(), posts = posts.len(), "dashboard loaded");

    let mut dashboard = Dashboard::new(tabs, posts);
    dashboard.user = snapshot.user;

    let summarizer: Arc<dyn Summarizer> = match Config::summary_api_key() {
        Some(key) => Arc::new(GeminiSummarizer::new(key, &config.summary)?),
        None => {
            tracing::warn!("no GEMINI_API_KEY set, summaries disabled");
            Arc::new(Unconfigured)
        }
    };

    let tick = Duration::from_millis(config.ui.tick_ms.max(10));
    let (mut app, mut events_rx, state_rx) = App::new(config, dashboard, store, summarizer);
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<TuiCommand>(16);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(cmd) = cmd_rx.recv() => {
                    if !app.handle_command(cmd) {
                        break;
                    }
                }
                Some(event) = events_rx.recv() => app.handle_event(event),
                else => break,
            }
        }
        tracing::debug!("app loop stopped");
    });

    tui::run_tui(state_rx, cmd_tx, tick).await?;

    tracing::debug!("shutting down");
    Ok(())
}
