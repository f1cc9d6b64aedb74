use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FeedError;
use crate::model::{Match, MatchKey};
use crate::persist::KeyValueStore;
use crate::view::{ALL_TYPES, SortOption, StatusFilter};

pub const DARK_MODE_KEY: &str = "cricscore.darkMode";
pub const BOOKMARKS_KEY: &str = "cricscore.bookmarks";
pub const FILTERS_KEY: &str = "cricscore.filters";
pub const CACHED_FEED_KEY: &str = "cricscore.cachedMatches";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPrefs {
    pub filter_type: String,
    pub status: StatusFilter,
    pub sort: SortOption,
}

impl Default for FilterPrefs {
    fn default() -> Self {
        Self {
            filter_type: ALL_TYPES.to_string(),
            status: StatusFilter::All,
            sort: SortOption::None,
        }
    }
}

/// On-disk shape of [`FilterPrefs`]. Each field falls back independently.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFilters {
    #[serde(default)]
    filter_type: Option<String>,
    #[serde(default)]
    status_filter: Option<String>,
    #[serde(default)]
    sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Preferences {
    pub dark_mode: bool,
    pub bookmarks: BTreeSet<MatchKey>,
    pub filters: FilterPrefs,
    pub cached_matches: Vec<Match>,
}

/// Flips membership of `key`; returns true when it is now bookmarked.
pub fn toggle_bookmark(bookmarks: &mut BTreeSet<MatchKey>, key: &MatchKey) -> bool {
    if bookmarks.remove(key) {
        false
    } else {
        bookmarks.insert(key.clone());
        true
    }
}

/// Typed access to the preference categories over any [`KeyValueStore`].
///
/// Failures never escape: reads fall back to defaults, writes are dropped and
/// the store is flagged session-only. The caller's in-memory copy stays the
/// source of truth for the rest of the session.
pub struct PreferenceStore {
    store: Box<dyn KeyValueStore>,
    system_dark: Option<bool>,
    session_only: bool,
    errors: Vec<FeedError>,
}

impl PreferenceStore {
    pub fn new(store: Box<dyn KeyValueStore>, system_dark: Option<bool>) -> Self {
        Self {
            store,
            system_dark,
            session_only: false,
            errors: Vec::new(),
        }
    }

    pub fn load(&mut self) -> Preferences {
        let dark_mode = self
            .read_json::<bool>(DARK_MODE_KEY)
            .or(self.system_dark)
            .unwrap_or(false);
        let bookmarks = self
            .read_json::<BTreeSet<MatchKey>>(BOOKMARKS_KEY)
            .unwrap_or_default();
        let filters = self
            .read_json::<StoredFilters>(FILTERS_KEY)
            .map(filters_from_stored)
            .unwrap_or_default();
        let cached_matches = self
            .read_json::<Vec<Match>>(CACHED_FEED_KEY)
            .unwrap_or_default();

        Preferences {
            dark_mode,
            bookmarks,
            filters,
            cached_matches,
        }
    }

    pub fn save_dark_mode(&mut self, dark_mode: bool) {
        self.write_json(DARK_MODE_KEY, &dark_mode);
    }

    pub fn save_bookmarks(&mut self, bookmarks: &BTreeSet<MatchKey>) {
        if bookmarks.is_empty() {
            self.remove(BOOKMARKS_KEY);
        } else {
            self.write_json(BOOKMARKS_KEY, bookmarks);
        }
    }

    pub fn save_filters(&mut self, filters: &FilterPrefs) {
        let stored = StoredFilters {
            filter_type: Some(filters.filter_type.clone()),
            status_filter: Some(filters.status.label().to_string()),
            sort: Some(filters.sort.label().to_string()),
        };
        self.write_json(FILTERS_KEY, &stored);
    }

    pub fn save_cached_matches(&mut self, matches: &[Match]) {
        self.write_json(CACHED_FEED_KEY, &matches);
    }

    /// True once any write has failed this session.
    pub fn is_session_only(&self) -> bool {
        self.session_only
    }

    /// Errors swallowed since the last call, for the console. Includes
    /// malformed values that `load` replaced with defaults.
    pub fn drain_errors(&mut self) -> Vec<FeedError> {
        std::mem::take(&mut self.errors)
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&mut self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(%err, key, "preference read failed");
                self.errors.push(err);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%err, key, "ignoring malformed preference");
                self.errors.push(FeedError::StorageFailure {
                    key: key.to_string(),
                    reason: format!("ignored malformed value: {err}"),
                });
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                self.record_write_error(FeedError::StorageFailure {
                    key: key.to_string(),
                    reason: err.to_string(),
                });
                return;
            }
        };
        if let Err(err) = self.store.set(key, &json) {
            self.record_write_error(err);
        }
    }

    fn remove(&mut self, key: &str) {
        if let Err(err) = self.store.remove(key) {
            self.record_write_error(err);
        }
    }

    fn record_write_error(&mut self, err: FeedError) {
        warn!(%err, "preference write failed; keeping session copy");
        self.session_only = true;
        self.errors.push(err);
    }
}

fn filters_from_stored(stored: StoredFilters) -> FilterPrefs {
    let defaults = FilterPrefs::default();
    FilterPrefs {
        filter_type: stored
            .filter_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or(defaults.filter_type),
        status: stored
            .status_filter
            .as_deref()
            .and_then(StatusFilter::parse)
            .unwrap_or(defaults.status),
        sort: stored
            .sort
            .as_deref()
            .and_then(SortOption::parse)
            .unwrap_or(defaults.sort),
    }
}
