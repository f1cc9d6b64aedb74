use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::clipboard::{Clipboard, share_text};
use crate::cricapi::DataSource;
use crate::detect::{ChangeDetector, LiveRule};
use crate::feed::{PollerHandle, spawn_poller};
use crate::model::MatchKey;
use crate::notify::{Notifier, Permission, alert_newly_live, alert_title};
use crate::prefs::{FilterPrefs, PreferenceStore, toggle_bookmark};
use crate::schedule::Debouncer;
use crate::state::{AppState, Delta, apply_delta};
use crate::view::{MATCH_TYPES, SortOption, StatusFilter, present_types};

/// Collaborators and timing handed to [`MatchFeed::new`].
pub struct FeedParts {
    pub prefs: PreferenceStore,
    pub notifier: Box<dyn Notifier>,
    pub clipboard: Box<dyn Clipboard>,
    pub live_rule: LiveRule,
    pub debounce: Duration,
    pub page_size: usize,
}

/// The match feed synchronizer: owns the shell-side state and every side
/// effect that follows a state change (alerts, persistence, clipboard).
pub struct MatchFeed {
    pub state: AppState,
    detector: ChangeDetector,
    prefs: PreferenceStore,
    notifier: Box<dyn Notifier>,
    clipboard: Box<dyn Clipboard>,
    debouncer: Debouncer,
    poller: Option<PollerHandle>,
    rx: Option<Receiver<Delta>>,
}

impl MatchFeed {
    /// Loads preferences once, shows the cached feed if there is one and asks
    /// for notification permission if it was never decided.
    pub fn new(parts: FeedParts) -> Self {
        let FeedParts {
            mut prefs,
            mut notifier,
            clipboard,
            live_rule,
            debounce,
            page_size,
        } = parts;

        let loaded = prefs.load();
        let mut state = AppState::new();
        state.dark_mode = loaded.dark_mode;
        state.bookmarks = loaded.bookmarks;
        state.params.filter_type = loaded.filters.filter_type;
        state.params.status = loaded.filters.status;
        state.params.sort = loaded.filters.sort;
        state.params.page_size = page_size.max(1);
        if !loaded.cached_matches.is_empty() {
            state.push_log(format!(
                "[INFO] Showing {} cached matches until the first fetch",
                loaded.cached_matches.len()
            ));
            state.matches = loaded.cached_matches;
            state.showing_cached = true;
        }

        if notifier.permission() == Permission::Default {
            let decided = notifier.request_permission();
            state.push_log(format!(
                "[INFO] Live alerts {}",
                if decided == Permission::Granted {
                    "enabled"
                } else {
                    "disabled"
                }
            ));
        }

        let mut feed = Self {
            state,
            detector: ChangeDetector::new(live_rule),
            prefs,
            notifier,
            clipboard,
            debouncer: Debouncer::new(debounce, ""),
            poller: None,
            rx: None,
        };
        feed.flush_storage_errors();
        feed
    }

    /// Spawns the poller against `source`. Replaces any running poller; the
    /// new one numbers its requests from 1 again.
    pub fn start<S: DataSource + 'static>(&mut self, source: S, interval: Duration) {
        self.stop();
        self.state.reset_generations();
        let (tx, rx) = mpsc::channel();
        let search = self.debouncer.committed().to_string();
        self.poller = Some(spawn_poller(source, interval, search, tx));
        self.rx = Some(rx);
    }

    /// Stops the poller and drops any undelivered results.
    pub fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.shutdown();
        }
        self.rx = None;
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_some()
    }

    /// Applies every delta the poller has produced so far.
    pub fn pump(&mut self) -> usize {
        let Some(rx) = self.rx.as_ref() else {
            return 0;
        };
        let pending: Vec<Delta> = rx.try_iter().collect();
        let count = pending.len();
        for delta in pending {
            self.apply(delta);
        }
        count
    }

    /// Applies one delta and runs the side effects of a replaced list: live
    /// alerts and a refreshed offline cache.
    pub fn apply(&mut self, delta: Delta) {
        if !apply_delta(&mut self.state, delta) {
            return;
        }
        let newly_live = self.detector.observe(&self.state.matches);
        for m in &newly_live {
            self.state.push_log(format!("[ALERT] {}", alert_title(m)));
        }
        if let Err(err) = alert_newly_live(self.notifier.as_mut(), &newly_live)
            && self.notifier.permission() == Permission::Granted
        {
            self.state.push_log(format!("[WARN] {err}"));
        }
        self.prefs.save_cached_matches(&self.state.matches);
        self.flush_storage_errors();
    }

    /// Timer tick: advances the debounce window and the calendar date.
    pub fn tick(&mut self, now: Instant) {
        self.state.today = Utc::now().date_naive();
        if let Some(term) = self.debouncer.poll(now) {
            self.commit_search(term);
        }
    }

    /// Raw keystroke input; commits after the quiet window.
    pub fn set_search_input(&mut self, input: &str, now: Instant) {
        self.state.search_input = input.to_string();
        self.debouncer.push(input, now);
    }

    /// Explicit submit: commits immediately.
    pub fn submit_search(&mut self) {
        let input = self.state.search_input.clone();
        if let Some(term) = self.debouncer.submit(&input) {
            self.commit_search(term);
        }
    }

    pub fn committed_search(&self) -> &str {
        self.debouncer.committed()
    }

    pub fn retry(&mut self) {
        match self.poller.as_ref() {
            Some(poller) if poller.retry() => {
                self.state.push_log("[INFO] Retrying last request");
            }
            _ => self.state.push_log("[WARN] Feed poller is not running"),
        }
    }

    pub fn toggle_bookmark(&mut self, key: &MatchKey) -> bool {
        let bookmarked = toggle_bookmark(&mut self.state.bookmarks, key);
        self.prefs.save_bookmarks(&self.state.bookmarks);
        self.flush_storage_errors();
        if self.state.params.status == StatusFilter::Bookmarked {
            self.state.clamp_selection();
        }
        bookmarked
    }

    pub fn toggle_selected_bookmark(&mut self) -> Option<bool> {
        let key = self.state.selected_key()?;
        Some(self.toggle_bookmark(&key))
    }

    pub fn set_dark_mode(&mut self, dark_mode: bool) {
        self.state.dark_mode = dark_mode;
        self.prefs.save_dark_mode(dark_mode);
        self.flush_storage_errors();
    }

    pub fn toggle_dark_mode(&mut self) {
        self.set_dark_mode(!self.state.dark_mode);
    }

    pub fn set_filter_type(&mut self, filter_type: &str) {
        self.state.set_filter_type(filter_type);
        self.save_filters();
    }

    /// Steps through the common types, then any other type the feed carries.
    pub fn cycle_filter_type(&mut self) {
        let mut options: Vec<String> = MATCH_TYPES.iter().map(|t| t.to_string()).collect();
        for ty in present_types(&self.state.matches) {
            if !options.iter().any(|o| o.eq_ignore_ascii_case(&ty)) {
                options.push(ty);
            }
        }
        let current = &self.state.params.filter_type;
        let next = options
            .iter()
            .position(|o| o.eq_ignore_ascii_case(current))
            .map(|idx| (idx + 1) % options.len())
            .unwrap_or(0);
        let next = options[next].clone();
        self.set_filter_type(&next);
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.state.set_status_filter(status);
        self.save_filters();
    }

    pub fn cycle_status_filter(&mut self) {
        self.set_status_filter(self.state.params.status.next());
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.state.set_sort(sort);
        self.save_filters();
    }

    pub fn cycle_sort(&mut self) {
        self.set_sort(self.state.params.sort.next());
    }

    pub fn load_more(&mut self) -> bool {
        self.state.load_more()
    }

    /// Copies the selected match summary; failures become a toast.
    pub fn share_selected(&mut self) {
        let Some(m) = self.state.selected_match() else {
            self.state.toast = Some("Nothing selected to share".to_string());
            return;
        };
        let text = share_text(m);
        self.state.toast = Some(match self.clipboard.write_text(&text) {
            Ok(()) => "Copied match summary".to_string(),
            Err(err) => format!("Could not copy: {err}"),
        });
    }

    pub fn is_session_only(&self) -> bool {
        self.prefs.is_session_only()
    }

    pub fn live_ids(&self) -> &std::collections::HashSet<MatchKey> {
        self.detector.live_ids()
    }

    fn commit_search(&mut self, term: String) {
        self.state.committed_search = term.clone();
        self.state.reset_page();
        if let Some(poller) = self.poller.as_ref()
            && !poller.set_search(term)
        {
            self.state.push_log("[WARN] Feed poller is not running");
        }
    }

    fn save_filters(&mut self) {
        let filters = FilterPrefs {
            filter_type: self.state.params.filter_type.clone(),
            status: self.state.params.status,
            sort: self.state.params.sort,
        };
        self.prefs.save_filters(&filters);
        self.flush_storage_errors();
    }

    fn flush_storage_errors(&mut self) {
        let session_only = self.prefs.is_session_only();
        for err in self.prefs.drain_errors() {
            if session_only {
                self.state
                    .push_log(format!("[WARN] {err}; keeping preferences for this session"));
            } else {
                self.state.push_log(format!("[WARN] {err}"));
            }
        }
    }
}

impl Drop for MatchFeed {
    fn drop(&mut self) {
        self.stop();
    }
}
