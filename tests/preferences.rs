use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use cricscore_terminal::persist::{FileStore, KeyValueStore, MemoryStore};
use cricscore_terminal::prefs::{
    BOOKMARKS_KEY, CACHED_FEED_KEY, DARK_MODE_KEY, FILTERS_KEY, FilterPrefs, PreferenceStore,
    toggle_bookmark,
};
use cricscore_terminal::view::{SortOption, StatusFilter};
use cricscore_terminal::{Match, MatchKey};

fn unique_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!(
        "cricscore_prefs_{tag}_{}_{nanos}",
        std::process::id()
    ))
}

#[test]
fn empty_store_yields_defaults() {
    let mut prefs = PreferenceStore::new(Box::new(MemoryStore::new()), None);
    let loaded = prefs.load();
    assert!(!loaded.dark_mode);
    assert!(loaded.bookmarks.is_empty());
    assert_eq!(loaded.filters, FilterPrefs::default());
    assert!(loaded.cached_matches.is_empty());
    assert!(!prefs.is_session_only());
}

#[test]
fn system_preference_seeds_dark_mode_until_saved() {
    let store = MemoryStore::new();
    let mut prefs = PreferenceStore::new(Box::new(store.clone()), Some(true));
    assert!(prefs.load().dark_mode);

    prefs.save_dark_mode(false);
    assert_eq!(store.raw(DARK_MODE_KEY).as_deref(), Some("false"));
    assert!(!prefs.load().dark_mode);
}

#[test]
fn malformed_values_fall_back_per_category() {
    let store = MemoryStore::new();
    store.insert_raw(DARK_MODE_KEY, "not-json");
    store.insert_raw(BOOKMARKS_KEY, "{\"oops\":1}");
    store.insert_raw(CACHED_FEED_KEY, "[1,2]");
    store.insert_raw(
        FILTERS_KEY,
        r#"{"filterType":"ODI","statusFilter":"Sideways","sort":"Latest First"}"#,
    );

    let mut prefs = PreferenceStore::new(Box::new(store), Some(false));
    let loaded = prefs.load();
    assert!(!loaded.dark_mode);
    assert!(loaded.bookmarks.is_empty());
    assert!(loaded.cached_matches.is_empty());
    assert_eq!(loaded.filters.filter_type, "ODI");
    assert_eq!(loaded.filters.status, StatusFilter::All);
    assert_eq!(loaded.filters.sort, SortOption::LatestFirst);

    let errors = prefs.drain_errors();
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|e| e.to_string().contains("ignored malformed value")));
    assert!(!prefs.is_session_only());
}

#[test]
fn filters_round_trip_through_labels() {
    let store = MemoryStore::new();
    let mut prefs = PreferenceStore::new(Box::new(store.clone()), None);
    let filters = FilterPrefs {
        filter_type: "Test".to_string(),
        status: StatusFilter::Today,
        sort: SortOption::EarliestFirst,
    };
    prefs.save_filters(&filters);

    let raw = store.raw(FILTERS_KEY).expect("filters written");
    assert!(raw.contains("\"statusFilter\":\"Today's Matches\""));
    assert_eq!(prefs.load().filters, filters);
}

#[test]
fn double_toggle_restores_bookmarks() {
    let mut bookmarks = BTreeSet::from([MatchKey::from("a")]);
    let before = bookmarks.clone();
    let key = MatchKey::from("b");

    assert!(toggle_bookmark(&mut bookmarks, &key));
    assert!(bookmarks.contains(&key));
    assert!(!toggle_bookmark(&mut bookmarks, &key));
    assert_eq!(bookmarks, before);
}

#[test]
fn empty_bookmark_set_removes_the_key() {
    let store = MemoryStore::new();
    let mut prefs = PreferenceStore::new(Box::new(store.clone()), None);
    prefs.save_bookmarks(&BTreeSet::from([MatchKey::from("x")]));
    assert!(store.raw(BOOKMARKS_KEY).is_some());

    prefs.save_bookmarks(&BTreeSet::new());
    assert!(store.raw(BOOKMARKS_KEY).is_none());
}

#[test]
fn failed_write_is_swallowed_and_marks_session_only() {
    let store = MemoryStore::new();
    store.reject_writes(true);
    let mut prefs = PreferenceStore::new(Box::new(store.clone()), None);

    prefs.save_bookmarks(&BTreeSet::from([MatchKey::from("x")]));
    assert!(prefs.is_session_only());
    let errors = prefs.drain_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains(BOOKMARKS_KEY));
    assert!(prefs.drain_errors().is_empty());
    assert!(store.raw(BOOKMARKS_KEY).is_none());
}

#[test]
fn file_store_persists_across_instances() {
    let dir = unique_dir("roundtrip");
    let feed = vec![Match {
        id: Some("42".to_string()),
        t1: "India".to_string(),
        t2: "Australia".to_string(),
        status: Some("Live".to_string()),
        ..Match::default()
    }];

    {
        let mut prefs = PreferenceStore::new(Box::new(FileStore::new(&dir)), None);
        prefs.save_dark_mode(true);
        prefs.save_bookmarks(&BTreeSet::from([MatchKey::from("42")]));
        prefs.save_cached_matches(&feed);
        assert!(!prefs.is_session_only());
    }

    let mut prefs = PreferenceStore::new(Box::new(FileStore::new(&dir)), Some(false));
    let loaded = prefs.load();
    assert!(loaded.dark_mode);
    assert!(loaded.bookmarks.contains(&MatchKey::from("42")));
    assert_eq!(loaded.cached_matches, feed);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn file_store_missing_keys_are_absent_not_errors() {
    let dir = unique_dir("missing");
    let mut store = FileStore::new(&dir);
    assert_eq!(store.get("nothing.here").ok(), Some(None));
    assert!(store.remove("nothing.here").is_ok());
    let _ = fs::remove_dir_all(&dir);
}
