use std::borrow::Cow;

use super::state::{AppState, PostRow, Screen, SummaryStatus};
use super::{InputMode, UiState};
use crate::feed::types::{FeedFilter, Source};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const SIDEBAR_WIDTH: u16 = 30;

pub fn draw(f: &mut Frame, state: &AppState, ui: &UiState, spinner_frame: u8) {
    match state.screen {
        Screen::Landing | Screen::Authenticating => draw_gate(f, state, spinner_frame),
        Screen::Dashboard => draw_dashboard(f, state, ui, spinner_frame),
    }
}

fn spinner(frame: u8) -> char {
    SPINNER_FRAMES[(frame as usize) % SPINNER_FRAMES.len()]
}

fn draw_gate(f: &mut Frame, state: &AppState, spinner_frame: u8) {
    let area = centered(f.area(), 56, 11);

    let mut lines = vec![
        Line::from(Span::styled(
            "CURATED FEED",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::styled(
            format!("Hold at least {} FIN to enter.", state.min_fin_balance),
            Style::default().fg(Color::DarkGray),
        ),
        Line::raw(""),
    ];

    if state.screen == Screen::Authenticating {
        lines.push(Line::from(vec![
            Span::styled(spinner(spinner_frame).to_string(), Style::default().fg(Color::Yellow)),
            Span::raw(" Connecting wallet..."),
        ]));
    } else {
        lines.push(Line::from(vec![
            Span::styled("[Enter]", Style::default().fg(Color::Yellow)),
            Span::raw(" connect wallet  "),
            Span::styled("[q]", Style::default().fg(Color::Yellow)),
            Span::raw("uit"),
        ]));
    }

    if let Some(msg) = &state.gate_message {
        lines.push(Line::raw(""));
        lines.push(Line::styled(msg.as_str(), Style::default().fg(Color::Red)));
    }

    let para = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(para, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

fn draw_dashboard(f: &mut Frame, state: &AppState, ui: &UiState, spinner_frame: u8) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(f.area());

    draw_sidebar(f, state, columns[0]);

    let summary_height = match &state.summary {
        SummaryStatus::Idle => 0,
        SummaryStatus::Loading => 3,
        SummaryStatus::Ready(_) => 6,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(summary_height),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(columns[1]);

    draw_header(f, state, chunks[0]);
    draw_summary(f, state, chunks[1], spinner_frame);
    draw_filters(f, state, chunks[2]);
    draw_posts(f, state, ui, chunks[3]);
    draw_input(f, state, ui, chunks[4]);
    draw_footer(f, state, chunks[5]);
}

fn draw_sidebar(f: &mut Frame, state: &AppState, area: Rect) {
    let max_width = area.width.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = vec![Line::styled(
        " STREAMS",
        Style::default().fg(Color::DarkGray),
    )];

    for tab in &state.tabs {
        let marker = if tab.active { "▸ " } else { "  " };
        let style = if tab.active {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let mut spans = vec![
            Span::raw(marker),
            Span::styled(truncate_with_ellipsis(&tab.name, max_width.saturating_sub(5)).into_owned(), style),
        ];
        if tab.notifications_enabled {
            spans.push(Span::styled(" 🔔", Style::default().fg(Color::Yellow)));
        }
        lines.push(Line::from(spans));
    }

    if let Some(active) = state.tabs.iter().find(|t| t.active) {
        lines.push(Line::raw(""));
        lines.push(Line::styled(" SOURCES", Style::default().fg(Color::DarkGray)));
        if active.handles.is_empty() && active.rss_urls.is_empty() {
            lines.push(Line::styled("  (everything)", Style::default().fg(Color::DarkGray)));
        }
        for handle in &active.handles {
            let text = format!("  @{}", handle);
            lines.push(Line::raw(truncate_with_ellipsis(&text, max_width).into_owned()));
        }
        for url in &active.rss_urls {
            let text = format!("  rss {}", url);
            lines.push(Line::styled(
                truncate_with_ellipsis(&text, max_width).into_owned(),
                Style::default().fg(Color::Magenta),
            ));
        }
    }

    let block = Block::default().borders(Borders::ALL);
    let inner_height = area.height.saturating_sub(2) as usize;

    // The profile sits on the bottom row of the sidebar.
    if let Some(user) = &state.user {
        let footer_rows = if user.avatar.is_some() { 4 } else { 3 };
        while lines.len() + footer_rows < inner_height {
            lines.push(Line::raw(""));
        }
        lines.push(Line::styled(
            format!(" {}", truncate_with_ellipsis(&user.name, max_width.saturating_sub(1))),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        if let Some(avatar) = &user.avatar {
            lines.push(Line::styled(
                format!(" {}", truncate_with_ellipsis(avatar, max_width.saturating_sub(1))),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::styled(
            format!(" {}", user.wallet_address),
            Style::default().fg(Color::DarkGray),
        ));
        lines.push(Line::styled(
            format!(" {} FIN", user.fin_token_balance),
            Style::default().fg(Color::Green),
        ));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect) {
    let mut spans = vec![
        Span::styled(
            format!(" {}", state.active_tab_name),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {} items", state.posts.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if !state.search.is_empty() {
        spans.push(Span::styled("  search: ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(state.search.as_str(), Style::default().fg(Color::Yellow)));
    }
    if let Some(tag) = &state.tag_filter {
        spans.push(Span::styled(format!("  #{}", tag), Style::default().fg(Color::Magenta)));
        spans.push(Span::styled(" (f to clear)", Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::styled(
        format!("  up {}", state.uptime()),
        Style::default().fg(Color::DarkGray),
    ));

    let para = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(para, area);
}

fn draw_summary(f: &mut Frame, state: &AppState, area: Rect, spinner_frame: u8) {
    if area.height == 0 {
        return;
    }
    let block = Block::default()
        .title(" AI Summary ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let para = match &state.summary {
        SummaryStatus::Idle => return,
        SummaryStatus::Loading => Paragraph::new(Line::from(vec![
            Span::styled(spinner(spinner_frame).to_string(), Style::default().fg(Color::Yellow)),
            Span::raw(" Synthesizing intel..."),
        ])),
        SummaryStatus::Ready(text) => Paragraph::new(text.as_str()).wrap(Wrap { trim: true }),
    };
    f.render_widget(para.block(block), area);
}

fn draw_filters(f: &mut Frame, state: &AppState, area: Rect) {
    let titles: Vec<Line> = FeedFilter::ALL
        .iter()
        .enumerate()
        .map(|(i, filter)| Line::from(format!("{} {}", i + 1, filter.label())))
        .collect();
    let selected = FeedFilter::ALL
        .iter()
        .position(|f| *f == state.filter)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(tabs, area);
}

fn source_color(source: Source) -> Color {
    match source {
        Source::X => Color::White,
        Source::Rss => Color::Magenta,
        Source::YouTube => Color::Red,
    }
}

fn post_item(post: &PostRow, width: usize) -> ListItem<'static> {
    let mut header = vec![
        Span::styled(
            format!("{:<8}", post.source.as_str()),
            Style::default().fg(source_color(post.source)),
        ),
        Span::styled(post.author_name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(" @{} · {}", post.author_handle, post.age),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if post.bookmarked {
        header.push(Span::styled("  ★", Style::default().fg(Color::Yellow)));
    }

    let content = Line::raw(format!(
        "  {}",
        truncate_with_ellipsis(&post.content.replace('\n', " "), width.saturating_sub(2))
    ));

    let like_style = if post.liked {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut meta = vec![
        Span::styled(format!("  ♥ {}", post.likes), like_style),
        Span::styled(format!("  ⟳ {}", post.reposts), Style::default().fg(Color::DarkGray)),
    ];
    for tag in &post.tags {
        meta.push(Span::styled(format!("  #{}", tag), Style::default().fg(Color::Magenta)));
    }

    ListItem::new(vec![Line::from(header), content, Line::from(meta), Line::raw("")])
}

fn draw_posts(f: &mut Frame, state: &AppState, ui: &UiState, area: Rect) {
    let block = Block::default().borders(Borders::ALL);

    if state.posts.is_empty() {
        let para = Paragraph::new(vec![
            Line::raw(""),
            Line::styled("Signal Lost", Style::default().add_modifier(Modifier::BOLD)),
            Line::styled(
                "No posts match the current stream, filter or search.",
                Style::default().fg(Color::DarkGray),
            ),
        ])
        .alignment(Alignment::Center)
        .block(block);
        f.render_widget(para, area);
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = state.posts.iter().map(|p| post_item(p, width)).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));
    let mut list_state = ListState::default().with_selected(Some(ui.selected));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_input(f: &mut Frame, state: &AppState, ui: &UiState, area: Rect) {
    let line = if ui.mode == InputMode::Normal {
        match state.logs.back() {
            Some(l) => {
                let color = match l.level.as_str() {
                    "ERROR" => Color::Red,
                    "WARN" => Color::Yellow,
                    _ => Color::DarkGray,
                };
                let prefix = format!(" {} [{}] ", l.time, l.level);
                let msg_max = (area.width as usize).saturating_sub(prefix.len());
                Line::from(vec![
                    Span::styled(prefix, Style::default().fg(color)),
                    Span::raw(truncate_with_ellipsis(&l.message, msg_max).into_owned()),
                ])
            }
            None => Line::raw(""),
        }
    } else {
        Line::from(vec![
            Span::styled(format!(" {}: ", ui.mode.prompt()), Style::default().fg(Color::Yellow)),
            Span::raw(ui.buffer.as_str()),
            Span::styled("█", Style::default().fg(Color::Yellow)),
        ])
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_footer(f: &mut Frame, state: &AppState, area: Rect) {
    let keys: &[(&str, &str)] = if state.summary == SummaryStatus::Idle {
        &[
            ("[q]", "uit  "),
            ("[Tab]", " stream  "),
            ("[/]", " search  "),
            ("[1-6]", " filter  "),
            ("[l]", "ike  "),
            ("[b]", "ookmark  "),
            ("[t]", "ag  "),
            ("[f]", "ilter tag  "),
            ("[s]", "ummarize  "),
            ("[n]", "ew  "),
            ("[d]", "elete  "),
            ("[r]", "ename  "),
            ("[a/A]", " add/remove handle  "),
            ("[u]", "rl  "),
            ("[m]", "ute  "),
            ("[P]", "in filter  "),
            ("[p]", "rofile  "),
            ("[v]", " avatar  "),
            ("[F1-9]", " jump  "),
            ("[o]", "ut  "),
        ]
    } else {
        &[
            ("[q]", "uit  "),
            ("[x]", " dismiss summary  "),
            ("[s]", "ummarize again  "),
        ]
    };

    let mut spans = vec![Span::raw(" ")];
    for (key, label) in keys {
        spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(*label));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn truncate_with_ellipsis(s: &str, max_width: usize) -> Cow<'_, str> {
    let char_count = s.chars().count();
    if char_count <= max_width {
        Cow::Borrowed(s)
    } else if max_width <= 3 {
        Cow::Owned(".".repeat(max_width))
    } else {
        let end = s
            .char_indices()
            .nth(max_width - 3)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        Cow::Owned(format!("{}...", &s[..end]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        let ui = UiState::default();
        terminal.draw(|f| draw(f, state, &ui, 0)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_truncate_short_string_unchanged() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate_with_ellipsis("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_very_small_width() {
        assert_eq!(truncate_with_ellipsis("hello", 2), "..");
    }

    #[test]
    fn test_truncate_multibyte_chars() {
        assert_eq!(truncate_with_ellipsis("ñáéíóú", 5), "ñá...");
    }

    #[test]
    fn test_landing_shows_gate() {
        let mut state = AppState::new();
        state.min_fin_balance = 1000;
        let text = rendered(&state);
        assert!(text.contains("CURATED FEED"));
        assert!(text.contains("1000 FIN"));
    }

    #[test]
    fn test_empty_dashboard_shows_signal_lost() {
        let mut state = AppState::new();
        state.screen = Screen::Dashboard;
        state.active_tab_name = "General".to_string();
        let text = rendered(&state);
        assert!(text.contains("Signal Lost"));
        assert!(text.contains("0 items"));
    }
}
