use crate::config::Config;
use crate::engine::{Dashboard, TabUpdate};
use crate::feed::types::User;
use crate::store::{self, KvStore};
use crate::summary::pending::PendingSummaryRegistry;
use crate::summary::{self, Summarizer, SummaryOutcome};
use crate::tui::state::{AppState, PostRow, Screen, SummaryStatus, TabRow};
use crate::tui::TuiCommand;
use crate::wallet::{self, GateResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Results of background work, delivered back to the app loop.
#[derive(Debug)]
pub enum AppEvent {
    Wallet(GateResult),
    Summary {
        tab_id: String,
        request_id: u64,
        outcome: Option<SummaryOutcome>,
    },
}

/// Owns the dashboard model and everything that mutates it. The TUI only
/// ever sees the [`AppState`] snapshots published on the watch channel.
pub struct App {
    config: Config,
    dashboard: Dashboard,
    screen: Screen,
    gate_message: Option<String>,
    store: Arc<dyn KvStore>,
    summarizer: Arc<dyn Summarizer>,
    pending: PendingSummaryRegistry,
    summaries: HashMap<String, String>, // tab id -> summary text
    state: AppState,
    events_tx: mpsc::Sender<AppEvent>,
    state_tx: watch::Sender<AppState>,
}

impl App {
    pub fn new(
        config: Config,
        dashboard: Dashboard,
        store: Arc<dyn KvStore>,
        summarizer: Arc<dyn Summarizer>,
    ) -> (Self, mpsc::Receiver<AppEvent>, watch::Receiver<AppState>) {
        let (events_tx, events_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(AppState::new());
        let mut app = Self {
            config,
            dashboard,
            screen: Screen::Landing,
            gate_message: None,
            store,
            summarizer,
            pending: PendingSummaryRegistry::new(),
            summaries: HashMap::new(),
            state: AppState::new(),
            events_tx,
            state_tx,
        };
        app.publish();
        (app, events_rx, state_rx)
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Apply one user command. Returns false when the app should exit.
    pub fn handle_command(&mut self, cmd: TuiCommand) -> bool {
        tracing::debug!(?cmd, "command");
        match cmd {
            TuiCommand::Quit => return false,
            TuiCommand::Connect => self.connect(),
            TuiCommand::Logout => {
                self.screen = Screen::Landing;
                self.gate_message = None;
                self.log("INFO", "wallet disconnected".to_string());
            }
            TuiCommand::SelectTab(id) => {
                self.dashboard.select_tab(&id);
            }
            TuiCommand::CycleTab(delta) => {
                self.dashboard.cycle_tab(delta);
            }
            TuiCommand::AddTab => {
                let id = self.dashboard.add_tab();
                self.log("INFO", format!("created stream {}", id));
                self.save_tabs();
            }
            TuiCommand::DeleteTab => {
                if let Some(id) = self.active_tab_id() {
                    if self.dashboard.delete_tab(&id) {
                        self.summaries.remove(&id);
                        self.pending.complete(&id);
                        self.log("INFO", format!("deleted stream {}", id));
                        self.save_tabs();
                    } else {
                        self.log("WARN", "cannot delete the last stream".to_string());
                    }
                }
            }
            TuiCommand::RenameTab(name) => self.edit_active_tab(|d, id| d.rename_tab(id, &name)),
            TuiCommand::ToggleNotifications => self.edit_active_tab(|d, id| d.toggle_notifications(id)),
            TuiCommand::AddHandle(handle) => self.edit_active_tab(|d, id| d.add_handle(id, &handle)),
            TuiCommand::RemoveHandle(handle) => {
                let handle = handle.trim().trim_start_matches('@').to_string();
                self.edit_active_tab(|d, id| d.remove_handle(id, &handle))
            }
            TuiCommand::AddRss(url) => self.edit_active_tab(|d, id| d.add_rss_url(id, &url)),
            TuiCommand::SetSearch(search) => self.dashboard.set_search(search),
            TuiCommand::SetFilter(filter) => self.dashboard.set_filter(filter),
            TuiCommand::PinFilter => {
                let filter = self.dashboard.filter();
                self.edit_active_tab(|d, id| {
                    d.update_tab(
                        id,
                        TabUpdate {
                            default_filter: Some(Some(filter)),
                            ..Default::default()
                        },
                    )
                });
            }
            TuiCommand::SetTagFilter(tag) => self.dashboard.set_tag_filter(tag.as_deref()),
            TuiCommand::ToggleLike(post_id) => {
                if self.dashboard.toggle_like(&post_id) {
                    self.save_posts();
                }
            }
            TuiCommand::ToggleBookmark(post_id) => {
                if self.dashboard.toggle_bookmark(&post_id) {
                    self.save_posts();
                }
            }
            TuiCommand::AddTag { post_id, tag } => {
                if self.dashboard.add_tag(&post_id, &tag) {
                    self.save_posts();
                }
            }
            TuiCommand::Summarize => self.request_summary(),
            TuiCommand::DismissSummary => {
                if let Some(id) = self.active_tab_id() {
                    self.summaries.remove(&id);
                }
            }
            TuiCommand::UpdateProfileName(name) => {
                if self.dashboard.update_profile(Some(&name), None) {
                    self.save_user();
                }
            }
            TuiCommand::UpdateProfileAvatar(avatar) => {
                if self.dashboard.update_profile(None, Some(&avatar)) {
                    self.save_user();
                }
            }
        }
        self.publish();
        true
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Wallet(GateResult::Granted(user)) => {
                self.log("INFO", format!("access granted to {}", user.wallet_address));
                self.dashboard.user = Some(user);
                self.screen = Screen::Dashboard;
                self.gate_message = None;
                self.save_user();
            }
            AppEvent::Wallet(GateResult::InsufficientBalance { user, required }) => {
                tracing::warn!(balance = user.fin_token_balance, required, "FIN balance below gate");
                self.screen = Screen::Landing;
                self.gate_message = Some(format!(
                    "Insufficient FIN: {} held, {} required",
                    user.fin_token_balance, required
                ));
            }
            AppEvent::Summary {
                tab_id,
                request_id,
                outcome,
            } => {
                if self.pending.complete_request(&tab_id, request_id).is_none() {
                    tracing::debug!(tab = %tab_id, request_id, "dropping stale summary");
                } else if !self.dashboard.tabs().iter().any(|t| t.id == tab_id) {
                    tracing::debug!(tab = %tab_id, "summary for deleted tab");
                } else if let Some(outcome) = outcome {
                    if outcome == SummaryOutcome::Failed {
                        self.log("ERROR", "summary generation failed".to_string());
                    }
                    self.summaries.insert(tab_id, outcome.message().to_string());
                }
            }
        }
        self.publish();
    }

    fn connect(&mut self) {
        if self.screen != Screen::Landing {
            return;
        }
        self.screen = Screen::Authenticating;
        self.gate_message = None;

        let saved = self
            .dashboard
            .user
            .clone()
            .or_else(|| store::load::<User>(self.store.as_ref(), store::USER_KEY));
        let delay = Duration::from_millis(self.config.wallet.connect_delay_ms);
        let min_balance = self.config.wallet.min_fin_balance;
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = wallet::connect(saved, delay, min_balance).await;
            let _ = events_tx.send(AppEvent::Wallet(result)).await;
        });
    }

    fn request_summary(&mut self) {
        let Some(tab) = self.dashboard.active_tab() else { return };
        let tab_id = tab.id.clone();
        let label = tab.name.clone();

        let contents = self.dashboard.summary_contents(self.config.summary.max_posts);
        if contents.is_empty() {
            return;
        }

        // A response that never arrives must not block the tab forever.
        let max_age = Duration::from_millis(self.config.summary.request_timeout_ms.saturating_mul(2));
        for expired in self.pending.expire_older_than(max_age) {
            tracing::warn!(tab = %expired.tab_name, "summary request expired");
        }

        let Some(request_id) = self.pending.try_register(tab_id.clone(), label.clone()) else {
            tracing::debug!(tab = %label, "summary already in flight");
            return;
        };
        self.summaries.remove(&tab_id);
        self.log("INFO", format!("summarizing {} posts for {}", contents.len(), label));

        let summarizer = self.summarizer.clone();
        let max_posts = self.config.summary.max_posts;
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = summary::generate(summarizer.as_ref(), &label, &contents, max_posts).await;
            let _ = events_tx
                .send(AppEvent::Summary {
                    tab_id,
                    request_id,
                    outcome,
                })
                .await;
        });
    }

    fn active_tab_id(&self) -> Option<String> {
        self.dashboard.active_tab_id().map(str::to_string)
    }

    fn edit_active_tab(&mut self, edit: impl FnOnce(&mut Dashboard, &str) -> bool) {
        let Some(id) = self.active_tab_id() else { return };
        if edit(&mut self.dashboard, &id) {
            self.save_tabs();
        }
    }

    fn save_tabs(&self) {
        if let Err(e) = store::save(self.store.as_ref(), store::TABS_KEY, self.dashboard.tabs()) {
            tracing::warn!(error = %format!("{:#}", e), "failed to save tabs");
        }
    }

    fn save_posts(&self) {
        if let Err(e) = store::save(self.store.as_ref(), store::POSTS_KEY, self.dashboard.posts()) {
            tracing::warn!(error = %format!("{:#}", e), "failed to save posts");
        }
    }

    fn save_user(&self) {
        let Some(user) = self.dashboard.user.as_ref() else { return };
        if let Err(e) = store::save(self.store.as_ref(), store::USER_KEY, user) {
            tracing::warn!(error = %format!("{:#}", e), "failed to save user");
        }
    }

    fn log(&mut self, level: &str, message: String) {
        tracing::info!(level, "{}", message);
        self.state.push_log(level, message);
    }

    fn summary_status(&self) -> SummaryStatus {
        let Some(id) = self.dashboard.active_tab_id() else {
            return SummaryStatus::Idle;
        };
        if self.pending.is_pending(id) {
            SummaryStatus::Loading
        } else if let Some(text) = self.summaries.get(id) {
            SummaryStatus::Ready(text.clone())
        } else {
            SummaryStatus::Idle
        }
    }

    /// Rebuild the snapshot from the model and hand a copy to the TUI.
    pub fn publish(&mut self) {
        let now = chrono::Utc::now();
        let active_id = self.dashboard.active_tab_id();
        let tabs = self
            .dashboard
            .tabs()
            .iter()
            .map(|t| TabRow::from_tab(t, Some(t.id.as_str()) == active_id))
            .collect();
        let posts = self
            .dashboard
            .visible()
            .into_iter()
            .map(|p| PostRow::from_post(p, now))
            .collect();
        let summary = self.summary_status();

        let s = &mut self.state;
        s.screen = self.screen;
        s.gate_message = self.gate_message.clone();
        s.min_fin_balance = self.config.wallet.min_fin_balance;
        s.user = self.dashboard.user.clone();
        s.tabs = tabs;
        s.active_tab_name = self
            .dashboard
            .active_tab()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| "Feed".to_string());
        s.posts = posts;
        s.search = self.dashboard.search().to_string();
        s.filter = self.dashboard.filter();
        s.tag_filter = self.dashboard.tag_filter().map(str::to_string);
        s.summary = summary;

        self.state_tx.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::mock::MockFeed;
    use crate::store::MemoryStore;
    use crate::summary::Unconfigured;

    fn app() -> (App, mpsc::Receiver<AppEvent>) {
        let mut config = Config::default();
        config.wallet.connect_delay_ms = 0;
        let dashboard = Dashboard::new(MockFeed::tabs(), MockFeed::new(chrono::Utc::now()).posts());
        let (app, events, _state) =
            App::new(config, dashboard, Arc::new(MemoryStore::new()), Arc::new(Unconfigured));
        (app, events)
    }

    #[tokio::test]
    async fn test_reply_for_deleted_tab_leaves_no_summary() {
        let (mut app, mut events) = app();
        app.handle_command(TuiCommand::Summarize);
        app.handle_command(TuiCommand::DeleteTab);
        assert!(!app.pending.is_pending("1"));

        let event = events.recv().await.unwrap();
        app.handle_event(event);
        assert!(app.summaries.is_empty());
        assert_eq!(app.pending.count(), 0);
    }
}
