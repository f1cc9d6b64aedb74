//! Pure derivation of what the list shows. Nothing in here touches the
//! network, the store or the clock; "today" and the bookmark set come in as
//! arguments.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;

use crate::config::DEFAULT_PAGE_SIZE;
use crate::model::{Match, MatchKey};
use crate::schedule::Countdown;

pub const ALL_TYPES: &str = "All";

/// Match types offered when cycling; the feed vocabulary is open, so any
/// string is accepted by [`project`].
pub const MATCH_TYPES: &[&str] = &[ALL_TYPES, "T20", "ODI", "Test"];

const COMPLETED_KEYWORDS: &[&str] = &["won", "drawn", "completed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Ongoing,
    Upcoming,
    Today,
    Completed,
    Bookmarked,
}

impl StatusFilter {
    pub const CYCLE: [StatusFilter; 6] = [
        StatusFilter::All,
        StatusFilter::Ongoing,
        StatusFilter::Upcoming,
        StatusFilter::Today,
        StatusFilter::Completed,
        StatusFilter::Bookmarked,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All Matches",
            StatusFilter::Ongoing => "Ongoing Matches",
            StatusFilter::Upcoming => "Upcoming Matches",
            StatusFilter::Today => "Today's Matches",
            StatusFilter::Completed => "Completed Matches",
            StatusFilter::Bookmarked => "Bookmarked",
        }
    }

    /// Accepts the label or its first word, case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::CYCLE.into_iter().find(|f| {
            let label = f.label();
            raw.eq_ignore_ascii_case(label)
                || label
                    .split_whitespace()
                    .next()
                    .map(|word| word.trim_end_matches("'s"))
                    .is_some_and(|word| raw.eq_ignore_ascii_case(word))
        })
    }

    pub fn next(self) -> Self {
        let idx = Self::CYCLE.iter().position(|f| *f == self).unwrap_or(0);
        Self::CYCLE[(idx + 1) % Self::CYCLE.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    /// Feed order.
    #[default]
    None,
    LatestFirst,
    EarliestFirst,
}

impl SortOption {
    pub fn label(self) -> &'static str {
        match self {
            SortOption::None => "Default",
            SortOption::LatestFirst => "Latest First",
            SortOption::EarliestFirst => "Earliest First",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        [
            SortOption::None,
            SortOption::LatestFirst,
            SortOption::EarliestFirst,
        ]
        .into_iter()
        .find(|s| raw.eq_ignore_ascii_case(s.label()))
    }

    pub fn next(self) -> Self {
        match self {
            SortOption::None => SortOption::LatestFirst,
            SortOption::LatestFirst => SortOption::EarliestFirst,
            SortOption::EarliestFirst => SortOption::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewParams {
    pub filter_type: String,
    pub status: StatusFilter,
    pub sort: SortOption,
    /// 1-based; 0 is treated as 1.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            filter_type: ALL_TYPES.to_string(),
            status: StatusFilter::All,
            sort: SortOption::None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewParams {
    pub fn limit(&self) -> usize {
        self.page.max(1).saturating_mul(self.page_size.max(1))
    }
}

/// Inputs that are not part of the user's selections.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub today: NaiveDate,
    pub bookmarks: &'a BTreeSet<MatchKey>,
}

/// Filtered, sorted and paginated copy of `matches`.
pub fn project(matches: &[Match], params: &ViewParams, ctx: ViewContext<'_>) -> Vec<Match> {
    project_indices(matches, params, ctx)
        .into_iter()
        .map(|idx| matches[idx].clone())
        .collect()
}

/// Same as [`project`] but yields positions in `matches`, which keeps the
/// positional fallback key available to the caller.
pub fn project_indices(matches: &[Match], params: &ViewParams, ctx: ViewContext<'_>) -> Vec<usize> {
    let mut indices = filtered_indices(matches, params, ctx);
    sort_indices(matches, &mut indices, params.sort);
    indices.truncate(params.limit());
    indices
}

/// Number of rows that pass the filters, before pagination.
pub fn filtered_count(matches: &[Match], params: &ViewParams, ctx: ViewContext<'_>) -> usize {
    filtered_indices(matches, params, ctx).len()
}

pub fn has_more(matches: &[Match], params: &ViewParams, ctx: ViewContext<'_>) -> bool {
    filtered_count(matches, params, ctx) > params.limit()
}

fn filtered_indices(matches: &[Match], params: &ViewParams, ctx: ViewContext<'_>) -> Vec<usize> {
    matches
        .iter()
        .enumerate()
        .filter(|(_, m)| matches_type(m, &params.filter_type))
        .filter(|(pos, m)| matches_status(m, *pos, params.status, ctx))
        .map(|(pos, _)| pos)
        .collect()
}

fn sort_indices(matches: &[Match], indices: &mut [usize], sort: SortOption) {
    let ts = |idx: &usize| matches[*idx].start_timestamp().unwrap_or(0);
    match sort {
        SortOption::None => {}
        SortOption::EarliestFirst => indices.sort_by_key(ts),
        SortOption::LatestFirst => indices.sort_by(|a, b| ts(b).cmp(&ts(a))),
    }
}

pub fn matches_type(m: &Match, filter_type: &str) -> bool {
    let filter_type = filter_type.trim();
    filter_type.is_empty()
        || filter_type.eq_ignore_ascii_case(ALL_TYPES)
        || m.match_type.trim().eq_ignore_ascii_case(filter_type)
}

fn matches_status(m: &Match, pos: usize, filter: StatusFilter, ctx: ViewContext<'_>) -> bool {
    match filter {
        StatusFilter::All => true,
        StatusFilter::Ongoing => m.is_ongoing(),
        StatusFilter::Upcoming => m.is_upcoming(),
        StatusFilter::Today => m.start_date() == Some(ctx.today),
        StatusFilter::Completed => is_completed(m),
        StatusFilter::Bookmarked => ctx.bookmarks.contains(&m.key(pos)),
    }
}

pub fn is_completed(m: &Match) -> bool {
    let Some(status) = m.status.as_deref() else {
        return false;
    };
    let lower = status.to_lowercase();
    COMPLETED_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Lower-cased, de-duplicated series and team names, sorted.
pub fn suggestions(matches: &[Match]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    for m in matches {
        for name in [&m.series, &m.t1, &m.t2] {
            let name = name.trim();
            if !name.is_empty() {
                seen.insert(name.to_lowercase());
            }
        }
    }
    seen.into_iter().collect()
}

/// Autocomplete candidates: names starting with `input` first, then names
/// containing it elsewhere.
pub fn suggest(matches: &[Match], input: &str, limit: usize) -> Vec<String> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let all = suggestions(matches);
    let (mut prefixed, rest): (Vec<String>, Vec<String>) = all
        .into_iter()
        .filter(|name| name.contains(&needle) && *name != needle)
        .partition(|name| name.starts_with(&needle));
    prefixed.extend(rest);
    prefixed.truncate(limit);
    prefixed
}

/// Time to the scheduled start for fixtures that have not begun.
pub fn countdown(m: &Match, now_ts: i64) -> Option<Countdown> {
    if !m.is_upcoming() {
        return None;
    }
    m.start_timestamp()
        .map(|start| Countdown::from_timestamps(start, now_ts))
}

/// Distinct match types present in the feed, upper-cased, for the filter bar.
pub fn present_types(matches: &[Match]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for m in matches {
        let ty = m.match_type.trim().to_uppercase();
        if !ty.is_empty() && seen.insert(ty.clone()) {
            out.push(ty);
        }
    }
    out
}
