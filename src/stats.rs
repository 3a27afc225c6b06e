//! Raw statistics records and the aggregation that turns them into what a
//! card displays.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Colour used when no repository ever reported one for a language.
pub const DEFAULT_LANGUAGE_COLOR: &str = "#858585";
pub const DEFAULT_LANGUAGE_COUNT: usize = 5;
pub const MAX_LANGUAGE_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub name: Option<String>,
    pub login: String,
}

impl UserIdentity {
    /// Display name, or the handle when no name is set.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.login,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEdge {
    pub name: String,
    pub color: Option<String>,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub stargazer_count: u64,
    pub languages: Vec<LanguageEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributionDay {
    pub date: NaiveDate,
    pub contribution_count: u32,
}

/// Days grouped by week, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionCalendar {
    pub weeks: Vec<Vec<ContributionDay>>,
}

impl ContributionCalendar {
    pub fn days(&self) -> impl DoubleEndedIterator<Item = &ContributionDay> {
        self.weeks.iter().flatten()
    }
}

/// Everything the data source reports about one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsRecord {
    pub user: UserIdentity,
    pub commits: u64,
    pub repository_count: u64,
    pub pull_requests: u64,
    pub issues: u64,
    pub followers: u64,
    pub following: u64,
    pub repositories: Vec<Repository>,
    pub calendar: ContributionCalendar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageStat {
    pub name: String,
    pub color: String,
    pub size: u64,
    pub percentage: f64,
}

/// Normalized summary a card is rendered from. Serialized into the raw-data
/// cache tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub user: UserIdentity,
    pub total_commits: u64,
    pub total_repos: u64,
    pub total_prs: u64,
    pub total_issues: u64,
    pub total_stars: u64,
    pub followers: u64,
    pub following: u64,
    pub languages: Vec<LanguageStat>,
    pub contribution_streak: u32,
}

impl AggregatedStats {
    pub fn value(&self, kind: StatKind) -> u64 {
        match kind {
            StatKind::Commits => self.total_commits,
            StatKind::Repos => self.total_repos,
            StatKind::PullRequests => self.total_prs,
            StatKind::Issues => self.total_issues,
            StatKind::Stars => self.total_stars,
            StatKind::Followers => self.followers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub include_languages: bool,
    pub language_count: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            include_languages: true,
            language_count: DEFAULT_LANGUAGE_COUNT,
        }
    }
}

/// Statistic kinds a card can show as a row/tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Commits,
    Repos,
    PullRequests,
    Issues,
    Stars,
    Followers,
}

impl StatKind {
    pub const ALL: [StatKind; 6] = [
        StatKind::Commits,
        StatKind::Repos,
        StatKind::PullRequests,
        StatKind::Issues,
        StatKind::Stars,
        StatKind::Followers,
    ];

    pub fn from_param(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.param() == name)
    }

    /// Name used in the `stats` request parameter.
    pub fn param(self) -> &'static str {
        match self {
            StatKind::Commits => "commits",
            StatKind::Repos => "repos",
            StatKind::PullRequests => "prs",
            StatKind::Issues => "issues",
            StatKind::Stars => "stars",
            StatKind::Followers => "followers",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatKind::Commits => "Commits",
            StatKind::Repos => "Repositories",
            StatKind::PullRequests => "Pull Requests",
            StatKind::Issues => "Issues",
            StatKind::Stars => "Stars",
            StatKind::Followers => "Followers",
        }
    }
}

/// One displayed statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayStat {
    pub kind: StatKind,
    pub label: &'static str,
    pub value: u64,
}

pub fn display_stats(stats: &AggregatedStats, kinds: &[StatKind]) -> Vec<DisplayStat> {
    kinds
        .iter()
        .map(|&kind| DisplayStat {
            kind,
            label: kind.label(),
            value: stats.value(kind),
        })
        .collect()
}

pub fn aggregate(
    record: &StatisticsRecord,
    options: AggregateOptions,
    today: NaiveDate,
) -> AggregatedStats {
    let total_stars = record.repositories.iter().map(|r| r.stargazer_count).sum();

    let languages = if options.include_languages {
        rank_languages(&record.repositories, options.language_count)
    } else {
        Vec::new()
    };

    AggregatedStats {
        user: record.user.clone(),
        total_commits: record.commits,
        total_repos: record.repository_count,
        total_prs: record.pull_requests,
        total_issues: record.issues,
        total_stars,
        followers: record.followers,
        following: record.following,
        languages,
        contribution_streak: current_streak(&record.calendar, today),
    }
}

/// Merge language edges across repositories, rank by size and keep the top
/// `count`.
///
/// A language's colour is the last non-empty colour seen in repository order.
/// Percentages are relative to all languages, before truncation.
pub fn rank_languages(repositories: &[Repository], count: usize) -> Vec<LanguageStat> {
    let mut merged: IndexMap<&str, (u64, Option<&str>)> = IndexMap::new();

    for edge in repositories.iter().flat_map(|r| &r.languages) {
        let entry = merged.entry(edge.name.as_str()).or_insert((0, None));
        entry.0 = entry.0.saturating_add(edge.size);
        if let Some(color) = edge.color.as_deref().filter(|c| !c.is_empty()) {
            entry.1 = Some(color);
        }
    }

    let total: u64 = merged.values().map(|(size, _)| size).sum();

    let mut languages: Vec<LanguageStat> = merged
        .into_iter()
        .map(|(name, (size, color))| LanguageStat {
            name: name.to_string(),
            color: color.unwrap_or(DEFAULT_LANGUAGE_COLOR).to_string(),
            size,
            percentage: percentage(size, total),
        })
        .collect();

    // stable: equal sizes keep first-seen order
    languages.sort_by(|a, b| b.size.cmp(&a.size));
    languages.truncate(count);
    languages
}

fn percentage(size: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        size as f64 * 100.0 / total as f64
    }
}

/// Length of the most recent run of days with contributions.
///
/// Days after `today` are skipped. Zero days before the run starts are
/// skipped too, so an idle `today` does not reset a streak that ended
/// yesterday.
pub fn current_streak(calendar: &ContributionCalendar, today: NaiveDate) -> u32 {
    let mut streak = 0;

    for day in calendar.days().rev() {
        if day.date > today {
            continue;
        }
        if day.contribution_count > 0 {
            streak += 1;
        } else if streak > 0 {
            break;
        }
    }

    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn repo(stars: u64, langs: &[(&str, Option<&str>, u64)]) -> Repository {
        Repository {
            name: "repo".into(),
            stargazer_count: stars,
            languages: langs
                .iter()
                .map(|(name, color, size)| LanguageEdge {
                    name: name.to_string(),
                    color: color.map(str::to_string),
                    size: *size,
                })
                .collect(),
        }
    }

    fn calendar(counts: &[(NaiveDate, u32)]) -> ContributionCalendar {
        let days: Vec<_> = counts
            .iter()
            .map(|&(date, contribution_count)| ContributionDay {
                date,
                contribution_count,
            })
            .collect();
        ContributionCalendar {
            weeks: days.chunks(7).map(<[_]>::to_vec).collect(),
        }
    }

    fn record(repositories: Vec<Repository>) -> StatisticsRecord {
        StatisticsRecord {
            user: UserIdentity {
                name: None,
                login: "octocat".into(),
            },
            commits: 10,
            repository_count: repositories.len() as u64,
            pull_requests: 2,
            issues: 3,
            followers: 4,
            following: 5,
            repositories,
            calendar: ContributionCalendar::default(),
        }
    }

    #[test]
    fn same_language_merges_last_color_wins() {
        let repos = vec![
            repo(1, &[("Rust", Some("#aaa"), 100)]),
            repo(2, &[("Rust", Some("#bbb"), 300)]),
        ];
        let langs = rank_languages(&repos, 5);
        assert_eq!(langs.len(), 1);
        assert_eq!(langs[0].size, 400);
        assert_eq!(langs[0].color, "#bbb");
        assert_eq!(langs[0].percentage, 100.0);
    }

    #[test]
    fn missing_color_keeps_previous() {
        let repos = vec![
            repo(0, &[("Go", Some("#00add8"), 10)]),
            repo(0, &[("Go", None, 10), ("Nix", None, 5)]),
        ];
        let langs = rank_languages(&repos, 5);
        assert_eq!(langs[0].color, "#00add8");
        assert_eq!(langs[1].color, DEFAULT_LANGUAGE_COLOR);
    }

    #[test]
    fn zero_total_size_reports_zero_percent() {
        let repos = vec![repo(0, &[("C", Some("#555"), 0)])];
        let langs = rank_languages(&repos, 5);
        assert_eq!(langs[0].percentage, 0.0);
    }

    #[test]
    fn ranks_by_size_ties_in_first_seen_order_then_truncates() {
        let repos = vec![repo(
            0,
            &[
                ("A", None, 10),
                ("B", None, 50),
                ("C", None, 10),
                ("D", None, 30),
            ],
        )];
        let langs = rank_languages(&repos, 3);
        let names: Vec<_> = langs.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["B", "D", "A"]);
        let sum: f64 = langs.iter().map(|l| l.percentage).sum();
        assert!(sum < 100.0);
        assert_eq!(langs[0].percentage, 50.0);
    }

    #[test]
    fn aggregate_sums_stars_and_respects_language_flag() {
        let rec = record(vec![
            repo(5, &[("Rust", Some("#dea584"), 1)]),
            repo(7, &[]),
        ]);
        let today = date(2024, 3, 1);

        let with = aggregate(&rec, AggregateOptions::default(), today);
        assert_eq!(with.total_stars, 12);
        assert_eq!(with.total_repos, 2);
        assert_eq!(with.languages.len(), 1);

        let without = aggregate(
            &rec,
            AggregateOptions {
                include_languages: false,
                language_count: 5,
            },
            today,
        );
        assert!(without.languages.is_empty());
        assert_eq!(without.total_stars, 12);
    }

    #[test]
    fn streak_counts_recent_run() {
        let today = date(2024, 3, 10);
        let cal = calendar(&[
            (date(2024, 3, 5), 4),
            (date(2024, 3, 6), 2),
            (date(2024, 3, 7), 0),
            (date(2024, 3, 8), 1),
            (date(2024, 3, 9), 3),
            (date(2024, 3, 10), 2),
        ]);
        assert_eq!(current_streak(&cal, today), 3);
    }

    #[test]
    fn future_days_are_ignored() {
        let today = date(2024, 3, 10);
        let cal = calendar(&[
            (date(2024, 3, 8), 0),
            (date(2024, 3, 9), 1),
            (date(2024, 3, 10), 1),
            (date(2024, 3, 11), 9),
            (date(2024, 3, 12), 9),
        ]);
        assert_eq!(current_streak(&cal, today), 2);
    }

    #[test]
    fn idle_today_does_not_break_streak() {
        let today = date(2024, 3, 10);
        let cal = calendar(&[
            (date(2024, 3, 7), 0),
            (date(2024, 3, 8), 5),
            (date(2024, 3, 9), 5),
            (date(2024, 3, 10), 0),
        ]);
        assert_eq!(current_streak(&cal, today), 2);
    }

    #[test]
    fn empty_calendar_has_no_streak() {
        assert_eq!(
            current_streak(&ContributionCalendar::default(), date(2024, 1, 1)),
            0
        );
    }

    #[test]
    fn display_stats_follow_requested_order() {
        let stats = aggregate(
            &record(vec![repo(3, &[])]),
            AggregateOptions::default(),
            date(2024, 1, 1),
        );
        let shown = display_stats(&stats, &[StatKind::Stars, StatKind::Commits]);
        assert_eq!(shown[0].label, "Stars");
        assert_eq!(shown[0].value, 3);
        assert_eq!(shown[1].value, 10);
    }
}
