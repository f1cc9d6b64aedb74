use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.cricapi.com/v1/cricScore";
pub const DEFAULT_POLL_SECS: u64 = 60;
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_PAGE_SIZE: usize = 10;

const STATE_DIR: &str = "cricscore_terminal";

/// Notification permission decided ahead of time through `NOTIFICATIONS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPreset {
    Undecided,
    On,
    Off,
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub endpoint: String,
    pub api_key: String,
    pub poll_interval: Duration,
    pub debounce: Duration,
    pub page_size: usize,
    pub fake_feed: bool,
    pub state_dir: Option<PathBuf>,
    pub notifications: NotifyPreset,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            page_size: DEFAULT_PAGE_SIZE,
            fake_feed: false,
            state_dir: default_state_dir(),
            notifications: NotifyPreset::Undecided,
        }
    }
}

impl FeedConfig {
    /// Reads the process environment. Call `dotenvy` first if `.env` files
    /// should take part.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let endpoint = env::var("CRICAPI_URL")
            .ok()
            .filter(|val| !val.trim().is_empty())
            .unwrap_or(defaults.endpoint);
        let api_key = env::var("CRICAPI_KEY")
            .map(|val| val.trim().to_string())
            .unwrap_or_default();
        let poll_interval = Duration::from_secs(
            env::var("POLL_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(DEFAULT_POLL_SECS)
                .max(10),
        );
        let debounce = Duration::from_millis(
            env::var("SEARCH_DEBOUNCE_MS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(DEFAULT_DEBOUNCE_MS)
                .clamp(100, 5000),
        );
        let page_size = env::var("PAGE_SIZE")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, 100);
        let fake_feed = env::var("FAKE_FEED").is_ok_and(|val| is_truthy(&val));
        let state_dir = env::var("CRICSCORE_STATE_DIR")
            .ok()
            .filter(|val| !val.trim().is_empty())
            .map(PathBuf::from)
            .or(defaults.state_dir);
        let notifications = match env::var("NOTIFICATIONS") {
            Ok(val) if is_truthy(&val) => NotifyPreset::On,
            Ok(val) if is_falsy(&val) => NotifyPreset::Off,
            _ => NotifyPreset::Undecided,
        };

        Self {
            endpoint,
            api_key,
            poll_interval,
            debounce,
            page_size,
            fake_feed,
            state_dir,
            notifications,
        }
    }
}

/// Terminal background hint from `COLORFGBG` ("fg;bg"). Backgrounds 0-6 and 8
/// are the dark half of the 16-colour palette.
pub fn system_prefers_dark() -> Option<bool> {
    let raw = env::var("COLORFGBG").ok()?;
    colorfgbg_is_dark(&raw)
}

pub fn colorfgbg_is_dark(raw: &str) -> Option<bool> {
    let bg = raw.rsplit(';').next()?.trim().parse::<u8>().ok()?;
    Some(matches!(bg, 0..=6 | 8))
}

fn default_state_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CONFIG_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(STATE_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".config").join(STATE_DIR))
}

fn is_truthy(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn is_falsy(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorfgbg_background_decides_darkness() {
        assert_eq!(colorfgbg_is_dark("15;0"), Some(true));
        assert_eq!(colorfgbg_is_dark("0;15"), Some(false));
        assert_eq!(colorfgbg_is_dark("12;default;8"), Some(true));
        assert_eq!(colorfgbg_is_dark("garbage"), None);
    }
}
