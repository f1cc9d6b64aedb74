use std::collections::HashSet;

use cricscore_terminal::detect::{ChangeDetector, LiveRule, detect_newly_live};
use cricscore_terminal::{Match, MatchKey};

fn m(id: Option<&str>, status: Option<&str>) -> Match {
    Match {
        id: id.map(str::to_string),
        status: status.map(str::to_string),
        t1: "A".to_string(),
        t2: "B".to_string(),
        ..Match::default()
    }
}

fn keys(ids: &[&str]) -> HashSet<MatchKey> {
    ids.iter().map(|id| MatchKey::from(*id)).collect()
}

#[test]
fn first_live_match_is_reported() {
    let matches = vec![m(Some("1"), Some("Live"))];
    let (newly, updated) = detect_newly_live(&HashSet::new(), &matches, LiveRule::NotUpcoming);
    assert_eq!(newly, matches);
    assert_eq!(updated, keys(&["1"]));
}

#[test]
fn already_live_matches_are_not_reported_again() {
    let matches = vec![m(Some("1"), Some("Live")), m(Some("2"), Some("Live"))];
    let (newly, updated) = detect_newly_live(&keys(&["1"]), &matches, LiveRule::NotUpcoming);
    assert_eq!(newly.len(), 1);
    assert_eq!(newly[0].id.as_deref(), Some("2"));
    assert_eq!(updated, keys(&["1", "2"]));
}

#[test]
fn upcoming_and_statusless_matches_are_not_live() {
    let matches = vec![
        m(Some("1"), Some("Match not started")),
        m(Some("2"), Some("match NOT started")),
        m(Some("3"), None),
        m(Some("4"), Some("  ")),
    ];
    let (newly, updated) = detect_newly_live(&HashSet::new(), &matches, LiveRule::NotUpcoming);
    assert!(newly.is_empty());
    assert!(updated.is_empty());
}

#[test]
fn live_set_is_replaced_not_merged() {
    let mut detector = ChangeDetector::new(LiveRule::NotUpcoming);
    assert_eq!(detector.observe(&[m(Some("1"), Some("Live"))]).len(), 1);

    // Match 1 drops out of the feed; it is forgotten rather than kept.
    assert_eq!(detector.observe(&[m(Some("2"), Some("Live"))]).len(), 1);
    assert_eq!(detector.live_ids(), &keys(&["2"]));

    // Coming back counts as newly live again.
    let back = detector.observe(&[m(Some("1"), Some("Live")), m(Some("2"), Some("Live"))]);
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].id.as_deref(), Some("1"));
}

#[test]
fn kickoff_transition_alerts_once() {
    let mut detector = ChangeDetector::default();
    assert!(detector.observe(&[m(Some("7"), Some("Match not started"))]).is_empty());
    assert_eq!(detector.observe(&[m(Some("7"), Some("India opt to bowl"))]).len(), 1);
    assert!(detector.observe(&[m(Some("7"), Some("India 45/1"))]).is_empty());
}

#[test]
fn keyword_rule_only_counts_started_or_live() {
    let matches = vec![
        m(Some("1"), Some("Match started")),
        m(Some("2"), Some("LIVE: India batting")),
        m(Some("3"), Some("Pakistan won by 4 wkts")),
    ];
    let (newly, updated) = detect_newly_live(&HashSet::new(), &matches, LiveRule::Keyword);
    assert_eq!(newly.len(), 2);
    assert_eq!(updated, keys(&["1", "2"]));
}

#[test]
fn matches_without_ids_use_their_position() {
    let matches = vec![m(None, Some("Live")), m(None, Some("Live"))];
    let (newly, updated) = detect_newly_live(&HashSet::new(), &matches, LiveRule::NotUpcoming);
    assert_eq!(newly.len(), 2);
    assert_eq!(updated, keys(&["#0", "#1"]));
}

#[test]
fn duplicate_ids_in_one_response_alert_once() {
    let matches = vec![m(Some("1"), Some("Live")), m(Some("1"), Some("Live"))];
    let (newly, _) = detect_newly_live(&HashSet::new(), &matches, LiveRule::NotUpcoming);
    assert_eq!(newly.len(), 1);
}
