use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Months, NaiveDate, Utc};
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::source::{FetchOptions, StatsSource};
use crate::stats::{
    ContributionCalendar, ContributionDay, LanguageEdge, Repository, StatisticsRecord,
    UserIdentity,
};

const ENDPOINT: &str = "https://api.github.com/graphql";
const USER_AGENT: &str = "statcard";

const USER_STATS_QUERY: &str = r#"
query GetUserStats(
    $username: String!
    $from: DateTime!
    $withLanguages: Boolean!
    $languageCount: Int!
) {
    user(login: $username) {
        name
        login
        followers { totalCount }
        following { totalCount }
        repositories(
            first: 100
            ownerAffiliations: OWNER
            privacy: PUBLIC
            orderBy: {field: UPDATED_AT, direction: DESC}
        ) {
            totalCount
            nodes {
                name
                stargazerCount
                languages(first: $languageCount, orderBy: {field: SIZE, direction: DESC}) @include(if: $withLanguages) {
                    edges {
                        size
                        node { name color }
                    }
                }
            }
        }
        contributionsCollection(from: $from) {
            totalCommitContributions
            restrictedContributionsCount
            contributionCalendar {
                weeks {
                    contributionDays { contributionCount date }
                }
            }
        }
        pullRequests { totalCount }
        issues { totalCount }
    }
}
"#;

#[derive(Deserialize)]
struct CountObj {
    #[serde(rename = "totalCount")]
    total_count: u64,
}

#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    http: Arc<Client>,
}

impl GithubClient {
    /// Create a GitHub GraphQL client authenticated with `token`.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            token: Arc::new(token.into()),
            http: Arc::new(http),
        })
    }

    /// Low-level GraphQL request with basic retry/backoff and `errors` checking.
    ///
    /// `NOT_FOUND` errors are passed through with the payload so callers can
    /// report a missing user instead of a failure.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        const MAX_RETRIES: usize = 4;
        let mut attempt = 0usize;

        loop {
            attempt += 1;

            let resp = self
                .http
                .post(ENDPOINT)
                .bearer_auth(&*self.token)
                .json(&json!({ "query": query, "variables": variables }))
                .send()
                .await
                .context("Network error sending GraphQL request")?;

            let status = resp.status();
            let headers = resp.headers().clone();

            // Parse JSON (even for non-2xx to capture error payloads)
            let json: Value = resp
                .json()
                .await
                .context("Failed to parse JSON from GitHub")?;

            if let Some(errors) = json.get("errors") {
                if !only_not_found(errors) {
                    return Err(anyhow::anyhow!("GraphQL reported errors: {errors:#}"));
                }
            }

            if status.is_success() {
                return Ok(json);
            }

            // If rate limited, honor Retry-After header when present
            if status.as_u16() == 429 {
                if attempt >= MAX_RETRIES {
                    return Err(anyhow::anyhow!(
                        "GitHub API returned 429 (rate-limited) and retries exhausted"
                    ));
                }
                let wait_secs = headers
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(2);
                warn!(attempt, wait_secs, "GitHub rate limited, retrying");
                sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            // Retry on 5xx server errors
            if status.is_server_error() && attempt < MAX_RETRIES {
                let backoff = Duration::from_millis(250u64.saturating_mul(1 << (attempt - 1)));
                warn!(attempt, status = status.as_u16(), "GitHub server error, retrying");
                sleep(backoff).await;
                continue;
            }

            return Err(anyhow::anyhow!(
                "GitHub API returned HTTP {}: {json:#}",
                status.as_u16()
            ));
        }
    }
}

fn only_not_found(errors: &Value) -> bool {
    errors.as_array().is_some_and(|list| {
        !list.is_empty()
            && list
                .iter()
                .all(|e| e.get("type").and_then(Value::as_str) == Some("NOT_FOUND"))
    })
}

#[derive(Deserialize)]
struct StatsResponse {
    data: Option<StatsData>,
}
#[derive(Deserialize)]
struct StatsData {
    user: Option<UserNode>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    name: Option<String>,
    login: String,
    followers: CountObj,
    following: CountObj,
    repositories: RepoConnection,
    contributions_collection: ContribCollection,
    pull_requests: CountObj,
    issues: CountObj,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoConnection {
    total_count: u64,
    nodes: Option<Vec<RepoNode>>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoNode {
    name: String,
    stargazer_count: u64,
    languages: Option<LanguageConnection>,
}
#[derive(Deserialize)]
struct LanguageConnection {
    edges: Option<Vec<LanguageEdgeNode>>,
}
#[derive(Deserialize)]
struct LanguageEdgeNode {
    size: u64,
    node: LanguageNode,
}
#[derive(Deserialize)]
struct LanguageNode {
    name: String,
    color: Option<String>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContribCollection {
    total_commit_contributions: u64,
    restricted_contributions_count: u64,
    contribution_calendar: CalendarNode,
}
#[derive(Deserialize)]
struct CalendarNode {
    weeks: Vec<WeekNode>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeekNode {
    contribution_days: Vec<DayNode>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DayNode {
    contribution_count: u32,
    date: NaiveDate,
}

impl From<UserNode> for StatisticsRecord {
    fn from(user: UserNode) -> Self {
        let contributions = user.contributions_collection;
        let repositories = user
            .repositories
            .nodes
            .unwrap_or_default()
            .into_iter()
            .map(|repo| Repository {
                name: repo.name,
                stargazer_count: repo.stargazer_count,
                languages: repo
                    .languages
                    .and_then(|l| l.edges)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|edge| LanguageEdge {
                        name: edge.node.name,
                        color: edge.node.color,
                        size: edge.size,
                    })
                    .collect(),
            })
            .collect();

        let weeks = contributions
            .contribution_calendar
            .weeks
            .into_iter()
            .map(|w| {
                w.contribution_days
                    .into_iter()
                    .map(|d| ContributionDay {
                        date: d.date,
                        contribution_count: d.contribution_count,
                    })
                    .collect()
            })
            .collect();

        StatisticsRecord {
            user: UserIdentity {
                name: user.name,
                login: user.login,
            },
            commits: contributions.total_commit_contributions
                + contributions.restricted_contributions_count,
            repository_count: user.repositories.total_count,
            pull_requests: user.pull_requests.total_count,
            issues: user.issues.total_count,
            followers: user.followers.total_count,
            following: user.following.total_count,
            repositories,
            calendar: ContributionCalendar { weeks },
        }
    }
}

fn parse_statistics(json: Value) -> Result<Option<StatisticsRecord>> {
    let parsed: StatsResponse =
        serde_json::from_value(json).context("Failed to deserialize user statistics response")?;
    Ok(parsed
        .data
        .and_then(|d| d.user)
        .map(StatisticsRecord::from))
}

fn query_variables(handle: &str, options: FetchOptions, from: DateTime<Utc>) -> Value {
    json!({
        "username": handle,
        "from": from.to_rfc3339(),
        "withLanguages": options.include_languages,
        "languageCount": options.language_count,
    })
}

#[async_trait]
impl StatsSource for GithubClient {
    async fn fetch_statistics(
        &self,
        handle: &str,
        options: FetchOptions,
    ) -> Result<Option<StatisticsRecord>> {
        info!(handle, "Fetching GitHub stats");
        let now = Utc::now();
        let from = now.checked_sub_months(Months::new(12)).unwrap_or(now);
        let json = self
            .graphql(USER_STATS_QUERY, query_variables(handle, options, from))
            .await?;
        parse_statistics(json)
    }
}
