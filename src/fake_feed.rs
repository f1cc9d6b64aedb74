use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cricapi::DataSource;
use crate::error::FeedError;
use crate::model::{FetchResult, Match, UPCOMING_STATUS};

#[derive(Debug, Clone)]
enum Phase {
    Upcoming,
    Live {
        runs: u16,
        wickets: u8,
        balls: u16,
        chasing: Option<(u16, u8, u16)>,
    },
    Finished {
        result: String,
        t1s: String,
        t2s: String,
    },
}

#[derive(Debug, Clone)]
struct Fixture {
    id: String,
    series: &'static str,
    match_type: &'static str,
    t1: &'static str,
    t2: &'static str,
    venue: &'static str,
    start: DateTime<Utc>,
    phase: Phase,
}

/// Offline stand-in for the scoring API. Fixtures start, progress and finish
/// across successive fetches so every code path (live alerts, countdowns,
/// completed filters, failures) shows up without a network.
pub struct FakeSource {
    rng: StdRng,
    fixtures: Vec<Fixture>,
    failure_rate: f64,
}

impl FakeSource {
    pub fn new(failure_rate: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), failure_rate, Utc::now())
    }

    /// Deterministic variant for tests and benches.
    pub fn seeded(seed: u64, now: DateTime<Utc>) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), 0.0, now)
    }

    fn with_rng(rng: StdRng, failure_rate: f64, now: DateTime<Utc>) -> Self {
        Self {
            rng,
            fixtures: seed_fixtures(now),
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }

    pub fn snapshot(&self) -> Vec<Match> {
        self.fixtures.iter().map(to_match).collect()
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        for fixture in &mut self.fixtures {
            let mut next = None;
            match &mut fixture.phase {
                Phase::Upcoming => {
                    if fixture.start <= now {
                        next = Some(Phase::Live {
                            runs: 0,
                            wickets: 0,
                            balls: 0,
                            chasing: None,
                        });
                    }
                }
                Phase::Live {
                    runs,
                    wickets,
                    balls,
                    chasing,
                } => {
                    *balls += self.rng.gen_range(3..=9);
                    *runs += self.rng.gen_range(0..=14);
                    if self.rng.gen_bool(0.15) && *wickets < 10 {
                        *wickets += 1;
                    }
                    let limit = max_balls(fixture.match_type);
                    *balls = (*balls).min(limit);
                    let innings_over = *wickets >= 10 || *balls >= limit;
                    match *chasing {
                        None if innings_over => {
                            *chasing = Some((*runs, *wickets, *balls));
                            *runs = 0;
                            *wickets = 0;
                            *balls = 0;
                        }
                        Some((target, target_wkts, target_balls))
                            if *runs > target || innings_over =>
                        {
                            let result = if *runs > target {
                                format!("{} won by {} wkts", fixture.t2, 10 - *wickets)
                            } else if *runs == target {
                                "Match tied".to_string()
                            } else {
                                format!("{} won by {} runs", fixture.t1, target - *runs)
                            };
                            let t1s = score_text(target, target_wkts, target_balls);
                            let t2s = score_text(*runs, *wickets, *balls);
                            next = Some(Phase::Finished { result, t1s, t2s });
                        }
                        _ => {}
                    }
                }
                Phase::Finished { .. } => {}
            }
            if let Some(phase) = next {
                fixture.phase = phase;
            }
        }
    }
}

impl DataSource for FakeSource {
    fn fetch(&mut self, search: &str) -> FetchResult {
        if self.failure_rate > 0.0 && self.rng.gen_bool(self.failure_rate) {
            return FetchResult::Failure(FeedError::Rejected {
                reason: "rate limited (fake feed)".to_string(),
            });
        }
        self.advance(Utc::now());
        let needle = search.trim().to_lowercase();
        let matches = self
            .fixtures
            .iter()
            .filter(|f| {
                needle.is_empty()
                    || [f.series, f.t1, f.t2]
                        .iter()
                        .any(|name| name.to_lowercase().contains(&needle))
            })
            .map(to_match)
            .collect();
        FetchResult::Success(matches)
    }

    fn name(&self) -> &str {
        "fake feed"
    }
}

fn max_balls(match_type: &str) -> u16 {
    match match_type {
        "t20" => 120,
        "odi" => 300,
        _ => 540,
    }
}

fn score_text(runs: u16, wickets: u8, balls: u16) -> String {
    format!("{runs}/{wickets} ({}.{})", balls / 6, balls % 6)
}

fn to_match(f: &Fixture) -> Match {
    let (status, t1s, t2s) = match &f.phase {
        Phase::Upcoming => (UPCOMING_STATUS.to_string(), None, None),
        Phase::Live {
            runs,
            wickets,
            balls,
            chasing: None,
        } => (
            format!("{} opt to bat", f.t1),
            Some(score_text(*runs, *wickets, *balls)),
            None,
        ),
        Phase::Live {
            runs,
            wickets,
            balls,
            chasing: Some((target_runs, target_wkts, target_balls)),
        } => (
            format!("{} need {} runs", f.t2, (target_runs + 1).saturating_sub(*runs)),
            Some(score_text(*target_runs, *target_wkts, *target_balls)),
            Some(score_text(*runs, *wickets, *balls)),
        ),
        Phase::Finished { result, t1s, t2s } => {
            (result.clone(), Some(t1s.clone()), Some(t2s.clone()))
        }
    };

    Match {
        id: Some(f.id.clone()),
        series: f.series.to_string(),
        match_type: f.match_type.to_string(),
        status: Some(status),
        t1: f.t1.to_string(),
        t2: f.t2.to_string(),
        t1img: None,
        t2img: None,
        t1s,
        t2s,
        date_time_gmt: Some(f.start.format("%Y-%m-%dT%H:%M:%S").to_string()),
        venue: Some(f.venue.to_string()),
        toss: Some(format!("{} won the toss", f.t1)),
    }
}

fn seed_fixtures(now: DateTime<Utc>) -> Vec<Fixture> {
    let fixture = |id: &str,
                   series: &'static str,
                   match_type: &'static str,
                   t1: &'static str,
                   t2: &'static str,
                   venue: &'static str,
                   start_mins: i64| Fixture {
        id: id.to_string(),
        series,
        match_type,
        t1,
        t2,
        venue,
        start: now + ChronoDuration::minutes(start_mins),
        phase: Phase::Upcoming,
    };

    vec![
        fixture("fake-1", "Asia Cup", "t20", "India [IND]", "Pakistan [PAK]", "Dubai", -40),
        fixture("fake-2", "Asia Cup", "t20", "Sri Lanka [SL]", "Bangladesh [BAN]", "Sharjah", 3),
        fixture("fake-3", "The Ashes", "test", "England [ENG]", "Australia [AUS]", "Lord's", -300),
        fixture(
            "fake-4",
            "Champions Trophy",
            "odi",
            "New Zealand [NZ]",
            "South Africa [SA]",
            "Karachi",
            12,
        ),
        fixture(
            "fake-5",
            "Champions Trophy",
            "odi",
            "Afghanistan [AFG]",
            "West Indies [WI]",
            "Lahore",
            90,
        ),
        fixture(
            "fake-6",
            "Big Bash League",
            "t20",
            "Sydney Sixers",
            "Perth Scorchers",
            "SCG",
            1_440,
        ),
        fixture("fake-7", "County Championship", "test", "Surrey", "Essex", "The Oval", -1_000),
        fixture("fake-8", "IPL", "t20", "Mumbai Indians", "Chennai Super Kings", "Wankhede", 6),
    ]
}
