//! Live cricket score feed: polling, live-change alerts, persisted
//! preferences and the filtered view, behind a terminal front end.
//!
//! Library code emits `tracing` events for embedders; the bundled binary
//! installs no subscriber and shows user-facing messages in its console log.

pub mod clipboard;
pub mod config;
pub mod cricapi;
pub mod detect;
pub mod error;
pub mod fake_feed;
pub mod feed;
pub mod http_client;
pub mod model;
pub mod notify;
pub mod persist;
pub mod prefs;
pub mod schedule;
pub mod state;
pub mod sync;
pub mod view;

pub use error::{FeedError, Result};
pub use model::{FetchResult, Match, MatchKey};
pub use sync::{FeedParts, MatchFeed};
