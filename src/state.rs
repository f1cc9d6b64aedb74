use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{FetchResult, Match, MatchKey};
use crate::view::{self, SortOption, StatusFilter, ViewContext, ViewParams};

const MAX_LOGS: usize = 200;

/// Everything the front end renders. Mutated only on the shell thread, either
/// through [`apply_delta`] or through [`crate::sync::MatchFeed`].
#[derive(Debug, Clone)]
pub struct AppState {
    pub matches: Vec<Match>,
    /// `matches` came from the persisted cache, not from this session.
    pub showing_cached: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub online: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub latest_started: u64,
    pub applied_generation: u64,
    pub committed_search: String,
    pub search_input: String,
    pub search_active: bool,
    pub params: ViewParams,
    pub bookmarks: BTreeSet<MatchKey>,
    pub dark_mode: bool,
    pub today: NaiveDate,
    pub selected: usize,
    pub details_open: bool,
    pub help_overlay: bool,
    pub toast: Option<String>,
    pub logs: VecDeque<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            matches: Vec::new(),
            showing_cached: false,
            loading: false,
            error: None,
            online: true,
            last_updated: None,
            latest_started: 0,
            applied_generation: 0,
            committed_search: String::new(),
            search_input: String::new(),
            search_active: false,
            params: ViewParams::default(),
            bookmarks: BTreeSet::new(),
            dark_mode: false,
            today: Utc::now().date_naive(),
            selected: 0,
            details_open: false,
            help_overlay: false,
            toast: None,
            logs: VecDeque::new(),
        }
    }

    pub fn view_context(&self) -> ViewContext<'_> {
        ViewContext {
            today: self.today,
            bookmarks: &self.bookmarks,
        }
    }

    /// Positions in `matches` currently on screen, in display order.
    pub fn visible_indices(&self) -> Vec<usize> {
        view::project_indices(&self.matches, &self.params, self.view_context())
    }

    pub fn visible_matches(&self) -> Vec<Match> {
        view::project(&self.matches, &self.params, self.view_context())
    }

    pub fn filtered_count(&self) -> usize {
        view::filtered_count(&self.matches, &self.params, self.view_context())
    }

    pub fn has_more(&self) -> bool {
        view::has_more(&self.matches, &self.params, self.view_context())
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.visible_indices().get(self.selected).copied()
    }

    pub fn selected_match(&self) -> Option<&Match> {
        self.selected_index().and_then(|idx| self.matches.get(idx))
    }

    pub fn selected_key(&self) -> Option<MatchKey> {
        let idx = self.selected_index()?;
        self.matches.get(idx).map(|m| m.key(idx))
    }

    pub fn is_bookmarked(&self, idx: usize) -> bool {
        self.matches
            .get(idx)
            .is_some_and(|m| self.bookmarks.contains(&m.key(idx)))
    }

    pub fn select_next(&mut self) {
        let total = self.visible_indices().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.visible_indices().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
    }

    pub fn clamp_selection(&mut self) {
        let total = self.visible_indices().len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    /// Grows the page; a no-op once every filtered row is already shown.
    pub fn load_more(&mut self) -> bool {
        if !self.has_more() {
            return false;
        }
        self.params.page = self.params.page.max(1).saturating_add(1);
        true
    }

    pub fn reset_page(&mut self) {
        self.params.page = 1;
        self.selected = 0;
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.params.status = status;
        self.reset_page();
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.params.sort = sort;
        self.clamp_selection();
    }

    pub fn set_filter_type(&mut self, filter_type: &str) {
        self.params.filter_type = filter_type.trim().to_string();
        self.reset_page();
    }

    /// Forgets request numbering from a previous poller.
    pub fn reset_generations(&mut self) {
        self.latest_started = 0;
        self.applied_generation = 0;
        self.loading = false;
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    FetchStarted {
        generation: u64,
        search: String,
    },
    FetchFinished {
        generation: u64,
        search: String,
        result: FetchResult,
    },
    Log(String),
}

/// Applies one delta. Returns true when the match list was replaced, which is
/// the caller's cue to run change detection and refresh the cache.
///
/// Failures and empty payloads keep whatever list is already shown.
pub fn apply_delta(state: &mut AppState, delta: Delta) -> bool {
    match delta {
        Delta::FetchStarted { generation, search } => {
            state.latest_started = state.latest_started.max(generation);
            state.loading = true;
            if !search.is_empty() {
                state.push_log(format!("[INFO] Searching \"{search}\""));
            }
            false
        }
        Delta::FetchFinished {
            generation,
            search,
            result,
        } => {
            if generation < state.applied_generation {
                state.push_log(format!(
                    "[INFO] Dropped stale response #{generation} for \"{search}\""
                ));
                return false;
            }
            state.applied_generation = generation;
            state.loading = state.latest_started > generation;

            match result {
                FetchResult::Success(matches) => {
                    let count = matches.len();
                    state.matches = matches;
                    state.showing_cached = false;
                    state.error = None;
                    state.online = true;
                    state.last_updated = Some(Utc::now());
                    state.clamp_selection();
                    state.push_log(format!("[INFO] Feed updated: {count} matches"));
                    true
                }
                FetchResult::EmptyOrMalformed => {
                    state.online = true;
                    state.error = Some("No usable match data in the response".to_string());
                    state.push_log("[WARN] Feed response had no match data");
                    false
                }
                FetchResult::Failure(err) => {
                    state.online = !err.is_offline();
                    state.error = Some(err.to_string());
                    state.push_log(format!("[WARN] Feed fetch failed: {err}"));
                    false
                }
            }
        }
        Delta::Log(msg) => {
            state.push_log(msg);
            false
        }
    }
}
