//! The request pipeline: validate, rate-limit, look up caches, fetch on miss,
//! render.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{error, info};

use crate::cache::CachePolicy;
use crate::error::{CardError, retry_after_header};
use crate::layout::Card;
use crate::params::{CardParams, CardRequest};
use crate::rate_limit::RateLimiter;
use crate::source::{FetchOptions, StatsSource};
use crate::stats::{self, AggregateOptions, AggregatedStats, LanguageStat, MAX_LANGUAGE_COUNT};
use crate::theme;

pub const SVG_CONTENT_TYPE: &str = "image/svg+xml; charset=utf-8";

/// What the HTTP layer sends back. Error outcomes still carry an SVG body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardResponse {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(&'static str, String)>,
}

impl CardResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Numbers behind a preview, for display next to the image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewData {
    pub commits: u64,
    pub repos: u64,
    pub prs: u64,
    pub issues: u64,
    pub stars: u64,
    pub followers: u64,
    pub streak: u32,
    pub languages: Vec<LanguageStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub svg: String,
    /// Markdown image pointing at the stats endpoint with these options.
    pub markdown: String,
    pub data: PreviewData,
}

pub struct CardService {
    source: Arc<dyn StatsSource>,
    cache: CachePolicy,
    limiter: RateLimiter,
    base_url: String,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl CardService {
    pub fn new(source: Arc<dyn StatsSource>, cache: CachePolicy, limiter: RateLimiter) -> Self {
        Self {
            source,
            cache,
            limiter,
            base_url: crate::config::DEFAULT_BASE_URL.to_string(),
            today: local_today,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the clock used for streaks.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Full request handling for one client.
    pub async fn respond(&self, client_id: &str, params: &CardParams) -> CardResponse {
        let started = Instant::now();
        let outcome = self.checked_render(client_id, params).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok((svg, request)) => {
                let max_age = request.config.cache_ttl.as_secs();
                info!(
                    handle = %request.handle,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "rendered card"
                );
                CardResponse {
                    status: 200,
                    body: svg,
                    headers: vec![
                        ("Content-Type", SVG_CONTENT_TYPE.to_string()),
                        (
                            "Cache-Control",
                            format!(
                                "public, max-age={max_age}, stale-while-revalidate={}",
                                max_age * 2
                            ),
                        ),
                        ("X-Response-Time", format!("{}ms", elapsed.as_millis())),
                        ("X-Content-Type-Options", "nosniff".to_string()),
                    ],
                }
            }
            Err(err) => {
                if let CardError::Upstream(e) = &err {
                    error!(error = %format!("{e:#}"), "stats upstream failed");
                } else {
                    info!(status = err.status_code(), %err, "card request rejected");
                }
                error_response(&err)
            }
        }
    }

    async fn checked_render(
        &self,
        client_id: &str,
        params: &CardParams,
    ) -> Result<(String, CardRequest), CardError> {
        let request = params.validate()?;

        let decision = self.limiter.check(client_id).await;
        if !decision.allowed {
            return Err(CardError::RateLimited {
                limit: decision.limit,
                retry_after: decision.reset_in,
            });
        }

        let svg = self.render_card(&request).await?;
        Ok((svg, request))
    }

    /// Render through the full-response cache.
    pub async fn render_card(&self, request: &CardRequest) -> Result<String, CardError> {
        if let Some(svg) = self.cache.cached_response(request).await {
            return Ok(svg);
        }

        let stats = self
            .load_stats(&request.handle, request.config.show_languages)
            .await?;
        let svg = render(&stats, request);
        self.cache.store_response(request, svg.clone()).await;
        Ok(svg)
    }

    /// Aggregated statistics through the raw-data cache. Languages are kept up
    /// to the maximum count so one entry serves every `langs_count`.
    pub async fn load_stats(
        &self,
        handle: &str,
        include_languages: bool,
    ) -> Result<AggregatedStats, CardError> {
        if let Some(stats) = self.cache.cached_stats(handle, include_languages).await {
            return Ok(stats);
        }

        let options = FetchOptions {
            include_languages,
            language_count: MAX_LANGUAGE_COUNT,
        };
        let record = self
            .source
            .fetch_statistics(handle, options)
            .await?
            .ok_or_else(|| CardError::NotFound(handle.to_string()))?;

        let stats = stats::aggregate(
            &record,
            AggregateOptions {
                include_languages,
                language_count: MAX_LANGUAGE_COUNT,
            },
            (self.today)(),
        );
        self.cache
            .store_stats(handle, include_languages, &stats)
            .await;
        Ok(stats)
    }

    /// Always re-rendered; only the raw data is cached.
    pub async fn preview(&self, request: &CardRequest) -> Result<Preview, CardError> {
        let stats = self
            .load_stats(&request.handle, request.config.show_languages)
            .await?;
        let svg = render(&stats, request);

        let mut languages = stats.languages.clone();
        languages.truncate(request.config.langs_count);

        Ok(Preview {
            svg,
            markdown: self.markdown(request),
            data: PreviewData {
                commits: stats.total_commits,
                repos: stats.total_repos,
                prs: stats.total_prs,
                issues: stats.total_issues,
                stars: stats.total_stars,
                followers: stats.followers,
                streak: stats.contribution_streak,
                languages,
            },
        })
    }

    /// `![GitHub Stats](<base>/api/stats?user=...)` for a request. Options at
    /// their defaults are left out of the URL.
    pub fn markdown(&self, request: &CardRequest) -> String {
        let c = &request.config;
        let mut names: Vec<&str> = c.stats.iter().map(|k| k.param()).collect();
        if c.show_languages {
            names.push("langs");
        }

        let mut query = vec![
            ("user", request.handle.clone()),
            ("theme", c.theme.clone()),
            ("stats", names.join(",")),
        ];
        if c.layout != crate::layout::Layout::Grid {
            query.push(("layout", c.layout.param().to_string()));
        }
        if c.hide_border {
            query.push(("hide_border", "true".to_string()));
        }
        if c.hide_username {
            query.push(("hide_username", "true".to_string()));
        }
        if c.border_radius != crate::params::DEFAULT_BORDER_RADIUS {
            query.push(("border_radius", c.border_radius.to_string()));
        }
        if c.langs_count != stats::DEFAULT_LANGUAGE_COUNT {
            query.push(("langs_count", c.langs_count.to_string()));
        }
        for (key, color) in [
            ("bg_color", &c.colors.bg),
            ("text_color", &c.colors.text),
            ("title_color", &c.colors.title),
            ("icon_color", &c.colors.icon),
        ] {
            if let Some(color) = color {
                query.push((key, color.trim_start_matches('#').to_string()));
            }
        }

        let query: Vec<String> = query
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect();
        format!(
            "![GitHub Stats]({}/api/stats?{})",
            self.base_url,
            query.join("&")
        )
    }
}

/// Resolve the theme and hand everything to the selected layout.
pub fn render(stats: &AggregatedStats, request: &CardRequest) -> String {
    let config = &request.config;
    let theme = theme::resolve(&config.theme, &config.colors);
    let shown = stats::display_stats(stats, &config.stats);
    let card = Card {
        user: &stats.user,
        stats: &shown,
        languages: &stats.languages,
        theme: &theme,
        config,
    };
    config.layout.render(&card)
}

pub fn error_response(err: &CardError) -> CardResponse {
    let mut headers = vec![("Content-Type", SVG_CONTENT_TYPE.to_string())];
    if let CardError::RateLimited { limit, retry_after } = err {
        headers.push(("X-RateLimit-Limit", limit.to_string()));
        headers.push(("X-RateLimit-Remaining", "0".to_string()));
        headers.push(("Retry-After", retry_after_header(*retry_after)));
    }
    CardResponse {
        status: err.status_code(),
        body: err.to_svg(),
        headers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::cache::MemoryStore;
    use crate::stats::{ContributionCalendar, LanguageEdge, Repository, StatisticsRecord, UserIdentity};

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatsSource for CountingSource {
        async fn fetch_statistics(
            &self,
            handle: &str,
            options: FetchOptions,
        ) -> anyhow::Result<Option<StatisticsRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(options.language_count, MAX_LANGUAGE_COUNT);
            match handle {
                "ghost" => Ok(None),
                "broken" => Err(anyhow::anyhow!("bad credentials token=abc")),
                _ => Ok(Some(StatisticsRecord {
                    user: UserIdentity {
                        name: Some("The Octocat".into()),
                        login: handle.to_string(),
                    },
                    commits: 1_234,
                    repository_count: 7,
                    pull_requests: 3,
                    issues: 1,
                    followers: 9,
                    following: 0,
                    repositories: vec![Repository {
                        name: "hello".into(),
                        stargazer_count: 5,
                        languages: vec![LanguageEdge {
                            name: "Rust".into(),
                            color: Some("#dea584".into()),
                            size: 100,
                        }],
                    }],
                    calendar: ContributionCalendar::default(),
                })),
            }
        }
    }

    fn service(max: u32) -> (CardService, Arc<CountingSource>) {
        let source = Arc::new(CountingSource::default());
        let service = CardService::new(
            source.clone(),
            CachePolicy::new(Arc::new(MemoryStore::new())),
            RateLimiter::in_memory(max, Duration::from_secs(60)),
        )
        .with_base_url("https://cards.example.com")
        .with_today(|| NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        (service, source)
    }

    #[tokio::test]
    async fn success_carries_cache_headers() {
        let (service, _) = service(10);
        let mut params = CardParams::for_user("octocat");
        params.cache_seconds = Some("600".into());
        let response = service.respond("1.2.3.4", &params).await;

        assert_eq!(response.status, 200);
        assert!(response.body.starts_with("<svg"));
        assert_eq!(response.header("content-type"), Some(SVG_CONTENT_TYPE));
        assert_eq!(
            response.header("Cache-Control"),
            Some("public, max-age=600, stale-while-revalidate=1200")
        );
        assert!(response.header("X-Response-Time").is_some());
    }

    #[tokio::test]
    async fn invalid_params_never_reach_source_or_limiter() {
        let (service, source) = service(1);
        let mut params = CardParams::for_user("octocat");
        params.border_radius = Some("99".into());

        let response = service.respond("a", &params).await;
        assert_eq!(response.status, 400);
        assert!(response.body.contains("border_radius"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        let ok = service.respond("a", &CardParams::for_user("octocat")).await;
        assert_eq!(ok.status, 200);
    }

    #[tokio::test]
    async fn missing_user_is_404_card() {
        let (service, _) = service(10);
        let response = service.respond("a", &CardParams::for_user("ghost")).await;
        assert_eq!(response.status, 404);
        assert!(response.body.contains("User &quot;ghost&quot; not found"));
    }

    #[tokio::test]
    async fn upstream_failure_hides_details() {
        let (service, _) = service(10);
        let response = service.respond("a", &CardParams::for_user("broken")).await;
        assert_eq!(response.status, 502);
        assert!(!response.body.contains("token=abc"));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_response_headers() {
        let (service, _) = service(1);
        let params = CardParams::for_user("octocat");
        assert_eq!(service.respond("a", &params).await.status, 200);

        let denied = service.respond("a", &params).await;
        assert_eq!(denied.status, 429);
        assert_eq!(denied.header("X-RateLimit-Limit"), Some("1"));
        assert_eq!(denied.header("X-RateLimit-Remaining"), Some("0"));
        assert_eq!(denied.header("Retry-After"), Some("60"));
        assert!(denied.body.contains("Rate limit exceeded"));
    }

    #[tokio::test]
    async fn variants_share_the_data_tier() {
        let (service, source) = service(10);
        let dark = CardParams::for_user("octocat");
        let mut nord = CardParams::for_user("OctoCat");
        nord.theme = Some("nord".into());
        nord.layout = Some("compact".into());

        assert_eq!(service.respond("a", &dark).await.status, 200);
        assert_eq!(service.respond("a", &dark).await.status, 200);
        assert_eq!(service.respond("a", &nord).await.status, 200);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn preview_reports_numbers_and_markdown() {
        let (service, _) = service(10);
        let mut params = CardParams::for_user("octocat");
        params.layout = Some("horizontal".into());
        params.bg_color = Some("112233".into());
        let request = params.validate().unwrap();

        let preview = service.preview(&request).await.unwrap();
        assert_eq!(preview.data.commits, 1_234);
        assert_eq!(preview.data.stars, 5);
        assert_eq!(preview.data.languages.len(), 1);
        assert!(preview.svg.contains("The Octocat"));
        assert_eq!(
            preview.markdown,
            "![GitHub Stats](https://cards.example.com/api/stats?user=octocat&theme=dark\
             &stats=commits%2Crepos%2Clangs&layout=horizontal&bg_color=112233)"
        );
    }
}
