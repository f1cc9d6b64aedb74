use std::io::{IsTerminal, Write};

use crate::config::NotifyPreset;
use crate::error::{FeedError, Result};
use crate::model::Match;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Not asked yet.
    Default,
    Granted,
    Denied,
}

/// One-way alert channel. Callers check [`Notifier::permission`] first; the
/// feed asks for permission once at startup and never blocks on it.
pub trait Notifier {
    fn permission(&self) -> Permission;
    fn request_permission(&mut self) -> Permission;
    fn notify(&mut self, title: &str, body: &str) -> Result<()>;
}

pub fn alert_title(m: &Match) -> String {
    format!("{} vs {} is live", display_team(&m.t1), display_team(&m.t2))
}

pub fn alert_body(m: &Match) -> String {
    let status = m.status.as_deref().unwrap_or_default();
    if m.series.trim().is_empty() {
        status.to_string()
    } else {
        format!("{} | {status}", m.series.trim())
    }
}

/// Sends one alert per match. Nothing is sent without granted permission.
/// Returns how many alerts went out.
pub fn alert_newly_live(notifier: &mut dyn Notifier, matches: &[Match]) -> Result<usize> {
    if matches.is_empty() {
        return Ok(0);
    }
    if notifier.permission() != Permission::Granted {
        return Err(FeedError::NotificationUnavailable(
            "permission not granted".to_string(),
        ));
    }
    let mut sent = 0;
    for m in matches {
        notifier.notify(&alert_title(m), &alert_body(m))?;
        sent += 1;
    }
    Ok(sent)
}

/// Rings the terminal bell. The alert text itself reaches the user through
/// the console log, which the feed writes alongside.
pub struct BellNotifier {
    permission: Permission,
}

impl BellNotifier {
    pub fn new(preset: NotifyPreset) -> Self {
        let permission = match preset {
            NotifyPreset::Undecided => Permission::Default,
            NotifyPreset::On => Permission::Granted,
            NotifyPreset::Off => Permission::Denied,
        };
        Self { permission }
    }
}

impl Notifier for BellNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        if self.permission == Permission::Default {
            self.permission = if std::io::stdout().is_terminal() {
                Permission::Granted
            } else {
                Permission::Denied
            };
        }
        self.permission
    }

    fn notify(&mut self, _title: &str, _body: &str) -> Result<()> {
        let mut out = std::io::stdout();
        out.write_all(b"\x07")
            .and_then(|_| out.flush())
            .map_err(|err| FeedError::NotificationUnavailable(err.to_string()))
    }
}

/// Always denied; used when alerts are switched off.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn request_permission(&mut self) -> Permission {
        Permission::Denied
    }

    fn notify(&mut self, _title: &str, _body: &str) -> Result<()> {
        Err(FeedError::NotificationUnavailable(
            "notifications disabled".to_string(),
        ))
    }
}

fn display_team(name: &str) -> &str {
    let name = name.trim();
    if name.is_empty() { "TBA" } else { name }
}
