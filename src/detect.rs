use std::collections::HashSet;

use crate::model::{Match, MatchKey};

/// Which statuses count as "live" for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiveRule {
    /// Any present status other than the upcoming sentinel.
    #[default]
    NotUpcoming,
    /// Status mentions "started" or "live", case-insensitive.
    Keyword,
}

impl LiveRule {
    pub fn is_live(self, m: &Match) -> bool {
        match self {
            LiveRule::NotUpcoming => m.is_ongoing(),
            LiveRule::Keyword => m.status.as_deref().is_some_and(|s| {
                let lower = s.to_lowercase();
                lower.contains("started") || lower.contains("live")
            }),
        }
    }
}

/// Live matches in `matches` that were not live before, in feed order, plus
/// the full set of keys that are live now. The returned set replaces
/// `previous` rather than extending it.
pub fn detect_newly_live(
    previous: &HashSet<MatchKey>,
    matches: &[Match],
    rule: LiveRule,
) -> (Vec<Match>, HashSet<MatchKey>) {
    let mut newly_live = Vec::new();
    let mut live_now = HashSet::new();
    for (pos, m) in matches.iter().enumerate() {
        if !rule.is_live(m) {
            continue;
        }
        let key = m.key(pos);
        if !previous.contains(&key) && !live_now.contains(&key) {
            newly_live.push(m.clone());
        }
        live_now.insert(key);
    }
    (newly_live, live_now)
}

/// Owns the live-key set between successful fetches. Nothing here is
/// persisted; a restart alerts again for matches already live.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    rule: LiveRule,
    live: HashSet<MatchKey>,
}

impl ChangeDetector {
    pub fn new(rule: LiveRule) -> Self {
        Self {
            rule,
            live: HashSet::new(),
        }
    }

    /// Feed a successful fetch; returns the matches that just went live.
    pub fn observe(&mut self, matches: &[Match]) -> Vec<Match> {
        let (newly_live, live_now) = detect_newly_live(&self.live, matches, self.rule);
        self.live = live_now;
        newly_live
    }

    pub fn live_ids(&self) -> &HashSet<MatchKey> {
        &self.live
    }
}
