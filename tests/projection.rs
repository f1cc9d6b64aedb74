use std::collections::BTreeSet;

use chrono::NaiveDate;
use cricscore_terminal::model::parse_gmt_timestamp;
use cricscore_terminal::view::{
    SortOption, StatusFilter, ViewContext, ViewParams, countdown, has_more, project, suggest,
    suggestions,
};
use cricscore_terminal::{Match, MatchKey};

fn fixture(id: usize, match_type: &str, status: &str, day: u32, hour: u32) -> Match {
    Match {
        id: Some(format!("m{id}")),
        series: format!("Series {}", id % 3),
        match_type: match_type.to_string(),
        status: Some(status.to_string()),
        t1: format!("Team {id}"),
        t2: format!("Team {}", id + 100),
        date_time_gmt: Some(format!("2024-03-{day:02}T{hour:02}:00:00")),
        ..Match::default()
    }
}

/// 15 matches: twelve T20s (eleven live, one upcoming), two ODIs, one Test.
fn mixed_feed() -> Vec<Match> {
    let mut out = Vec::new();
    for i in 0..11 {
        out.push(fixture(i, if i % 2 == 0 { "t20" } else { "T20" }, "Live", 1 + i as u32, 10));
    }
    out.push(fixture(11, "t20", "Match not started", 20, 9));
    out.push(fixture(12, "odi", "India won by 5 wkts", 3, 8));
    out.push(fixture(13, "odi", "Live", 4, 8));
    out.push(fixture(14, "test", "Match drawn", 5, 8));
    out
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date")
}

fn params(filter_type: &str, status: StatusFilter, sort: SortOption, page: usize) -> ViewParams {
    ViewParams {
        filter_type: filter_type.to_string(),
        status,
        sort,
        page,
        page_size: 10,
    }
}

#[test]
fn t20_ongoing_latest_first_first_page() {
    let feed = mixed_feed();
    let bookmarks = BTreeSet::new();
    let ctx = ViewContext {
        today: today(),
        bookmarks: &bookmarks,
    };
    let p = params("T20", StatusFilter::Ongoing, SortOption::LatestFirst, 1);
    let out = project(&feed, &p, ctx);

    assert_eq!(out.len(), 10);
    assert!(out.iter().all(|m| m.match_type.eq_ignore_ascii_case("t20")));
    assert!(out.iter().all(|m| m.status.as_deref() != Some("Match not started")));
    let stamps: Vec<i64> = out.iter().map(|m| m.start_timestamp().unwrap_or(0)).collect();
    assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(out[0].id.as_deref(), Some("m10"));
    assert!(has_more(&feed, &p, ctx));
}

#[test]
fn projection_is_deterministic() {
    let feed = mixed_feed();
    let bookmarks = BTreeSet::from([MatchKey::from("m3")]);
    let ctx = ViewContext {
        today: today(),
        bookmarks: &bookmarks,
    };
    for status in StatusFilter::CYCLE {
        for sort in [SortOption::None, SortOption::LatestFirst, SortOption::EarliestFirst] {
            let p = params("All", status, sort, 2);
            assert_eq!(project(&feed, &p, ctx), project(&feed, &p, ctx));
        }
    }
}

#[test]
fn load_more_grows_then_saturates() {
    let feed = mixed_feed();
    let bookmarks = BTreeSet::new();
    let ctx = ViewContext {
        today: today(),
        bookmarks: &bookmarks,
    };
    assert_eq!(project(&feed, &params("All", StatusFilter::All, SortOption::None, 1), ctx).len(), 10);
    assert_eq!(project(&feed, &params("All", StatusFilter::All, SortOption::None, 2), ctx).len(), 15);
    assert_eq!(project(&feed, &params("All", StatusFilter::All, SortOption::None, 50), ctx).len(), 15);
    // Page zero behaves like page one.
    assert_eq!(project(&feed, &params("All", StatusFilter::All, SortOption::None, 0), ctx).len(), 10);
    assert!(!has_more(&feed, &params("All", StatusFilter::All, SortOption::None, 2), ctx));
}

#[test]
fn default_sort_keeps_feed_order() {
    let feed = mixed_feed();
    let bookmarks = BTreeSet::new();
    let ctx = ViewContext {
        today: today(),
        bookmarks: &bookmarks,
    };
    let out = project(&feed, &params("odi", StatusFilter::All, SortOption::None, 1), ctx);
    let ids: Vec<_> = out.iter().filter_map(|m| m.id.as_deref()).collect();
    assert_eq!(ids, vec!["m12", "m13"]);
}

#[test]
fn status_filters_partition_by_keywords() {
    let feed = mixed_feed();
    let bookmarks = BTreeSet::new();
    let ctx = ViewContext {
        today: today(),
        bookmarks: &bookmarks,
    };
    let ids = |status| -> Vec<String> {
        project(&feed, &params("All", status, SortOption::None, 5), ctx)
            .into_iter()
            .filter_map(|m| m.id)
            .collect()
    };
    assert_eq!(ids(StatusFilter::Upcoming), vec!["m11"]);
    assert_eq!(ids(StatusFilter::Completed), vec!["m12", "m14"]);
    assert_eq!(ids(StatusFilter::Today), vec!["m3", "m13"]);
    assert_eq!(ids(StatusFilter::Ongoing).len(), 14);
}

#[test]
fn bookmarked_filter_uses_the_bookmark_set() {
    let feed = mixed_feed();
    let bookmarks = BTreeSet::from([MatchKey::from("m14"), MatchKey::from("gone")]);
    let ctx = ViewContext {
        today: today(),
        bookmarks: &bookmarks,
    };
    let out = project(&feed, &params("All", StatusFilter::Bookmarked, SortOption::None, 1), ctx);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id.as_deref(), Some("m14"));
}

#[test]
fn missing_timestamps_sort_as_epoch_zero() {
    let mut feed = vec![
        fixture(1, "t20", "Live", 2, 10),
        fixture(2, "t20", "Live", 1, 10),
    ];
    feed.push(Match {
        id: Some("undated".to_string()),
        match_type: "t20".to_string(),
        status: Some("Live".to_string()),
        date_time_gmt: Some("TBD".to_string()),
        ..Match::default()
    });
    let bookmarks = BTreeSet::new();
    let ctx = ViewContext {
        today: today(),
        bookmarks: &bookmarks,
    };

    let earliest = project(&feed, &params("All", StatusFilter::All, SortOption::EarliestFirst, 1), ctx);
    assert_eq!(earliest[0].id.as_deref(), Some("undated"));
    let latest = project(&feed, &params("All", StatusFilter::All, SortOption::LatestFirst, 1), ctx);
    assert_eq!(latest.last().and_then(|m| m.id.as_deref()), Some("undated"));
}

#[test]
fn suggestions_are_lowercased_and_unique() {
    let feed = vec![
        Match {
            series: "Asia Cup".to_string(),
            t1: "India".to_string(),
            t2: "Pakistan".to_string(),
            ..Match::default()
        },
        Match {
            series: "ASIA CUP".to_string(),
            t1: "INDIA".to_string(),
            t2: " ".to_string(),
            ..Match::default()
        },
    ];
    assert_eq!(suggestions(&feed), vec!["asia cup", "india", "pakistan"]);
    assert_eq!(suggest(&feed, "In", 5), vec!["india"]);
    assert_eq!(suggest(&feed, "a", 2), vec!["asia cup", "india"]);
    assert!(suggest(&feed, "", 5).is_empty());
}

#[test]
fn countdown_only_for_upcoming_with_a_start_time() {
    let upcoming = fixture(1, "t20", "Match not started", 2, 10);
    let start = parse_gmt_timestamp("2024-03-02T10:00:00").expect("valid timestamp");
    let cd = countdown(&upcoming, start - 3_900).expect("countdown");
    assert_eq!(cd.label(), "1h 05m");

    let live = fixture(2, "t20", "Live", 2, 10);
    assert!(countdown(&live, start - 60).is_none());
}
