use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use cricscore_terminal::clipboard::Osc52Clipboard;
use cricscore_terminal::config::{self, FeedConfig};
use cricscore_terminal::cricapi::CricApiSource;
use cricscore_terminal::detect::LiveRule;
use cricscore_terminal::fake_feed::FakeSource;
use cricscore_terminal::notify::BellNotifier;
use cricscore_terminal::persist::{FileStore, KeyValueStore, MemoryStore};
use cricscore_terminal::prefs::PreferenceStore;
use cricscore_terminal::state::AppState;
use cricscore_terminal::view::{self, countdown};
use cricscore_terminal::{FeedParts, Match, MatchFeed};

const FAKE_FAILURE_RATE: f64 = 0.05;
const SUGGESTION_LIMIT: usize = 5;

struct App {
    feed: MatchFeed,
    should_quit: bool,
}

impl App {
    fn new(cfg: &FeedConfig) -> Self {
        let store: Box<dyn KeyValueStore> = match cfg.state_dir.as_ref() {
            Some(dir) => Box::new(FileStore::new(dir)),
            None => Box::new(MemoryStore::new()),
        };
        let prefs = PreferenceStore::new(store, config::system_prefers_dark());
        let mut feed = MatchFeed::new(FeedParts {
            prefs,
            notifier: Box::new(BellNotifier::new(cfg.notifications)),
            clipboard: Box::new(Osc52Clipboard::stdout()),
            live_rule: LiveRule::default(),
            debounce: cfg.debounce,
            page_size: cfg.page_size,
        });
        if cfg.state_dir.is_none() {
            feed.state
                .push_log("[WARN] No state directory; preferences last for this session only");
        }

        if cfg.fake_feed {
            feed.start(FakeSource::new(FAKE_FAILURE_RATE), cfg.poll_interval);
        } else {
            if cfg.api_key.is_empty() {
                feed.state
                    .push_log("[WARN] CRICAPI_KEY is not set; requests will be rejected");
            }
            let source = CricApiSource::new(cfg.endpoint.clone(), cfg.api_key.clone());
            feed.start(source, cfg.poll_interval);
        }

        Self {
            feed,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.feed.state.search_active {
            self.on_search_key(key);
            return;
        }
        self.feed.state.toast = None;
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') => self.feed.state.search_active = true,
            KeyCode::Char('j') | KeyCode::Down => self.feed.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.feed.state.select_prev(),
            KeyCode::Char('t') => self.feed.cycle_filter_type(),
            KeyCode::Char('f') => self.feed.cycle_status_filter(),
            KeyCode::Char('s') => self.feed.cycle_sort(),
            KeyCode::Char('m') => self.feed.toggle_dark_mode(),
            KeyCode::Char('r') => self.feed.retry(),
            KeyCode::Char('c') => self.feed.share_selected(),
            KeyCode::Char('b') => match self.feed.toggle_selected_bookmark() {
                Some(true) => self.feed.state.toast = Some("Bookmarked".to_string()),
                Some(false) => self.feed.state.toast = Some("Bookmark removed".to_string()),
                None => {}
            },
            KeyCode::Char('n') => {
                if !self.feed.load_more() {
                    self.feed.state.toast = Some("No more matches".to_string());
                }
            }
            KeyCode::Char('d') | KeyCode::Enter => {
                self.feed.state.details_open =
                    !self.feed.state.details_open && self.feed.state.selected_match().is_some();
            }
            KeyCode::Char('?') => self.feed.state.help_overlay = !self.feed.state.help_overlay,
            KeyCode::Esc => {
                self.feed.state.details_open = false;
                self.feed.state.help_overlay = false;
            }
            _ => {}
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        let now = Instant::now();
        match key.code {
            KeyCode::Enter => {
                self.feed.submit_search();
                self.feed.state.search_active = false;
            }
            KeyCode::Esc => self.feed.state.search_active = false,
            KeyCode::Backspace => {
                let mut input = self.feed.state.search_input.clone();
                input.pop();
                self.feed.set_search_input(&input, now);
            }
            KeyCode::Tab => {
                let first = view::suggest(
                    &self.feed.state.matches,
                    &self.feed.state.search_input,
                    1,
                )
                .into_iter()
                .next();
                if let Some(suggestion) = first {
                    self.feed.set_search_input(&suggestion, now);
                }
            }
            KeyCode::Char(c) => {
                let mut input = self.feed.state.search_input.clone();
                input.push(c);
                self.feed.set_search_input(&input, now);
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let cfg = FeedConfig::from_env();

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend).context("failed to start terminal")?;

    let mut app = App::new(&cfg);
    let res = run_app(&mut terminal, &mut app);
    app.feed.stop();

    disable_raw_mode().context("failed to restore terminal")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    res.context("terminal loop failed")
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        app.feed.pump();
        app.feed.tick(Instant::now());

        terminal.draw(|f| ui(f, &app.feed.state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[derive(Clone, Copy)]
struct Palette {
    bg: Color,
    fg: Color,
    dim: Color,
    accent: Color,
    live: Color,
    warn: Color,
    selected_bg: Color,
}

fn palette(dark: bool) -> Palette {
    if dark {
        Palette {
            bg: Color::Black,
            fg: Color::Gray,
            dim: Color::DarkGray,
            accent: Color::Cyan,
            live: Color::LightGreen,
            warn: Color::LightRed,
            selected_bg: Color::Rgb(40, 44, 52),
        }
    } else {
        Palette {
            bg: Color::White,
            fg: Color::Black,
            dim: Color::Gray,
            accent: Color::Blue,
            live: Color::Green,
            warn: Color::Red,
            selected_bg: Color::Rgb(225, 230, 240),
        }
    }
}

fn ui(frame: &mut Frame, state: &AppState) {
    let pal = palette(state.dark_mode);
    let area = frame.size();
    frame.render_widget(
        Block::default().style(Style::default().bg(pal.bg).fg(pal.fg)),
        area,
    );

    let banner_height = u16::from(!state.online) + u16::from(state.error.is_some());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(banner_height),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(area);

    render_header(frame, chunks[0], state, pal);
    render_banners(frame, chunks[1], state, pal);
    render_list(frame, chunks[2], state, pal);
    render_footer(frame, chunks[3], state, pal);

    if state.search_active {
        render_suggestions(frame, chunks[2], state, pal);
    }
    if state.details_open
        && let Some(m) = state.selected_match()
    {
        render_details(frame, area, m, pal);
    }
    if state.help_overlay {
        render_help_overlay(frame, area, pal);
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState, pal: Palette) {
    let freshness = if state.loading {
        "Loading...".to_string()
    } else if state.showing_cached {
        "Cached".to_string()
    } else if let Some(at) = state.last_updated {
        format!("Updated {}", at.with_timezone(&Local).format("%H:%M:%S"))
    } else {
        "Waiting for feed".to_string()
    };
    let title = Line::from(vec![
        Span::styled(
            " LIVE CRICKET SCORE ",
            Style::default().fg(pal.accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "| Type: {} | {} | Sort: {} | {}",
            state.params.filter_type,
            state.params.status.label(),
            state.params.sort.label(),
            freshness
        )),
    ]);

    let cursor = if state.search_active { "_" } else { "" };
    let search_style = if state.search_active {
        Style::default().fg(pal.accent)
    } else {
        Style::default().fg(pal.dim)
    };
    let committed = if state.committed_search.is_empty() {
        String::new()
    } else {
        format!("  (showing \"{}\")", state.committed_search)
    };
    let search = Line::from(vec![
        Span::styled(" Search: ", search_style),
        Span::raw(format!("{}{cursor}", state.search_input)),
        Span::styled(committed, Style::default().fg(pal.dim)),
    ]);

    let header =
        Paragraph::new(vec![title, search]).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn render_banners(frame: &mut Frame, area: Rect, state: &AppState, pal: Palette) {
    let mut lines = Vec::new();
    if !state.online {
        lines.push(Line::styled(
            " You are offline. Showing the last loaded matches.",
            Style::default().fg(pal.bg).bg(pal.warn),
        ));
    }
    if let Some(err) = state.error.as_ref() {
        lines.push(Line::styled(
            format!(" Failed to load matches: {err}. Press r to retry."),
            Style::default().fg(pal.warn).add_modifier(Modifier::BOLD),
        ));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_list(frame: &mut Frame, area: Rect, state: &AppState, pal: Palette) {
    let visible = state.visible_indices();
    if visible.is_empty() {
        let msg = if state.loading && state.matches.is_empty() {
            "Loading matches..."
        } else {
            "No Matches Found!"
        };
        frame.render_widget(
            Paragraph::new(msg).style(Style::default().fg(pal.dim)),
            area,
        );
        return;
    }

    const ROW_HEIGHT: u16 = 3;
    if area.height < ROW_HEIGHT {
        return;
    }
    let rows = (area.height / ROW_HEIGHT) as usize;
    let (start, end) = visible_range(state.selected, visible.len(), rows);
    let now_ts = Utc::now().timestamp();

    for (i, pos) in (start..end).enumerate() {
        let idx = visible[pos];
        let Some(m) = state.matches.get(idx) else {
            continue;
        };
        let row_area = Rect {
            x: area.x,
            y: area.y + (i as u16) * ROW_HEIGHT,
            width: area.width,
            height: ROW_HEIGHT,
        };
        let selected = pos == state.selected;
        let row_style = if selected {
            Style::default().bg(pal.selected_bg)
        } else {
            Style::default()
        };

        let star = if state.is_bookmarked(idx) { "* " } else { "  " };
        let line1 = Line::from(vec![
            Span::styled(star, Style::default().fg(pal.accent)),
            Span::styled(
                m.series.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", m.match_type.to_uppercase()),
                Style::default().fg(pal.dim),
            ),
        ]);
        let line2 = Line::from(format!(
            "  {} {}   vs   {} {}",
            m.t1,
            m.t1s.as_deref().unwrap_or("-"),
            m.t2,
            m.t2s.as_deref().unwrap_or("-"),
        ));
        let status_style = if m.is_ongoing() && !view::is_completed(m) {
            Style::default().fg(pal.live)
        } else {
            Style::default().fg(pal.dim)
        };
        let mut status = m.status.clone().unwrap_or_default();
        if let Some(cd) = countdown(m, now_ts) {
            status = format!("{status} | starts in {}", cd.label());
        }
        let line3 = Line::styled(format!("  {status}"), status_style);

        frame.render_widget(
            Paragraph::new(vec![line1, line2, line3]).style(row_style),
            row_area,
        );
    }
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState, pal: Palette) {
    let shown = state.visible_indices().len();
    let total = state.filtered_count();
    let more = if state.has_more() { " | n Load more" } else { "" };
    let keys = format!(
        "{shown}/{total} | / Search | j/k Move | t Type | f Filter | s Sort | b Bookmark | d Details | c Share | m Theme{more} | ? Help | q Quit"
    );
    let status = state
        .toast
        .clone()
        .or_else(|| state.logs.back().cloned())
        .unwrap_or_default();
    let footer = Paragraph::new(vec![
        Line::styled(status, Style::default().fg(pal.dim)),
        Line::from(keys),
    ]);
    frame.render_widget(footer, area);
}

fn render_suggestions(frame: &mut Frame, area: Rect, state: &AppState, pal: Palette) {
    let items = view::suggest(&state.matches, &state.search_input, SUGGESTION_LIMIT);
    if items.is_empty() || area.height < 3 {
        return;
    }
    let height = (items.len() as u16 + 2).min(area.height);
    let width = area.width.min(40);
    let popup = Rect {
        x: area.x + 9,
        y: area.y,
        width: width.min(area.width.saturating_sub(9)),
        height,
    };
    let lines: Vec<Line> = items.into_iter().map(Line::from).collect();
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().bg(pal.bg).fg(pal.fg))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Tab to complete "),
            ),
        popup,
    );
}

fn render_details(frame: &mut Frame, area: Rect, m: &Match, pal: Palette) {
    let popup = centered_rect(70, 60, area);
    let field = |label: &str, value: Option<&str>| {
        Line::from(vec![
            Span::styled(format!("{label:<8}"), Style::default().fg(pal.dim)),
            Span::raw(value.unwrap_or("-").to_string()),
        ])
    };
    let lines = vec![
        Line::styled(
            format!("{} vs {}", m.t1, m.t2),
            Style::default().fg(pal.accent).add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
        field("Series", Some(m.series.as_str())),
        field("Type", Some(m.match_type.as_str())),
        field("Status", m.status.as_deref()),
        field("Start", m.date_time_gmt.as_deref()),
        field("Venue", m.venue.as_deref()),
        field("Toss", m.toss.as_deref()),
        field("Score 1", m.t1s.as_deref()),
        field("Score 2", m.t2s.as_deref()),
        field("Logo 1", Some(m.t1_logo())),
        field("Logo 2", Some(m.t2_logo())),
    ];
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().bg(pal.bg).fg(pal.fg))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Match details (Esc) "),
            ),
        popup,
    );
}

fn render_help_overlay(frame: &mut Frame, area: Rect, pal: Palette) {
    let popup = centered_rect(60, 70, area);
    let text = "\
/         search series or teams (Enter submits, Tab completes)
j/k       move selection
t         cycle match type (All, T20, ODI, Test, ...)
f         cycle status filter
s         cycle sort by start time
b         bookmark / unbookmark
n         load more
d, Enter  match details
c         copy match summary
m         dark / light theme
r         retry the last request
q         quit";
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().bg(pal.bg).fg(pal.fg))
            .block(Block::default().borders(Borders::ALL).title(" Help ")),
        popup,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total <= visible {
        return (0, total);
    }
    let half = visible / 2;
    let start = selected.saturating_sub(half).min(total - visible);
    (start, start + visible)
}
