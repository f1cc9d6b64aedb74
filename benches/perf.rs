use std::collections::{BTreeSet, HashSet};

use chrono::{NaiveDate, TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use cricscore_terminal::cricapi::parse_feed_json;
use cricscore_terminal::detect::{LiveRule, detect_newly_live};
use cricscore_terminal::fake_feed::FakeSource;
use cricscore_terminal::view::{
    SortOption, StatusFilter, ViewContext, ViewParams, project, suggest,
};
use cricscore_terminal::{Match, MatchKey};

const MATCH_TYPES: [&str; 3] = ["t20", "odi", "test"];

fn synthetic_feed(n: usize) -> Vec<Match> {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let seed = FakeSource::seeded(7, now).snapshot();
    (0..n)
        .map(|i| {
            let mut m = seed[i % seed.len()].clone();
            m.id = Some(format!("bench-{i}"));
            m.match_type = MATCH_TYPES[i % MATCH_TYPES.len()].to_string();
            m.series = format!("Series {}", i % 40);
            m.date_time_gmt = Some(format!(
                "2024-03-{:02}T{:02}:00:00",
                1 + i % 28,
                i % 24
            ));
            m
        })
        .collect()
}

fn feed_json(matches: &[Match]) -> String {
    serde_json::json!({ "status": "success", "data": matches }).to_string()
}

fn bench_project(c: &mut Criterion) {
    let feed = synthetic_feed(2_000);
    let bookmarks: BTreeSet<MatchKey> = (0..2_000)
        .step_by(7)
        .map(|i| MatchKey(format!("bench-{i}")))
        .collect();
    let ctx = ViewContext {
        today: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        bookmarks: &bookmarks,
    };
    let params = ViewParams {
        filter_type: "T20".to_string(),
        status: StatusFilter::Ongoing,
        sort: SortOption::LatestFirst,
        page: 3,
        page_size: 10,
    };

    c.bench_function("project_2000", |b| {
        b.iter(|| {
            let out = project(black_box(&feed), black_box(&params), ctx);
            black_box(out.len());
        })
    });

    let bookmarked = ViewParams {
        status: StatusFilter::Bookmarked,
        sort: SortOption::EarliestFirst,
        ..params.clone()
    };
    c.bench_function("project_bookmarked_2000", |b| {
        b.iter(|| {
            let out = project(black_box(&feed), black_box(&bookmarked), ctx);
            black_box(out.len());
        })
    });
}

fn bench_parse(c: &mut Criterion) {
    let raw = feed_json(&synthetic_feed(500));
    c.bench_function("parse_feed_500", |b| {
        b.iter(|| {
            let result = parse_feed_json(black_box(&raw));
            black_box(result.is_success());
        })
    });
}

fn bench_detect(c: &mut Criterion) {
    let feed = synthetic_feed(2_000);
    let (_, half_live) = detect_newly_live(&HashSet::new(), &feed[..1_000], LiveRule::NotUpcoming);
    c.bench_function("detect_newly_live_2000", |b| {
        b.iter(|| {
            let (newly, live) =
                detect_newly_live(black_box(&half_live), black_box(&feed), LiveRule::NotUpcoming);
            black_box((newly.len(), live.len()));
        })
    });
}

fn bench_suggest(c: &mut Criterion) {
    let feed = synthetic_feed(2_000);
    c.bench_function("suggest_2000", |b| {
        b.iter(|| {
            let out = suggest(black_box(&feed), black_box("ser"), 8);
            black_box(out.len());
        })
    });
}

criterion_group!(benches, bench_project, bench_parse, bench_detect, bench_suggest);
criterion_main!(benches);
