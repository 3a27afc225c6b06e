//! Request parameters: the raw, string-typed query and its validated form.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::ParamError;
use crate::layout::Layout;
use crate::stats::{DEFAULT_LANGUAGE_COUNT, MAX_LANGUAGE_COUNT, StatKind};
use crate::theme::{self, ColorOverrides, DEFAULT_THEME};

pub const DEFAULT_STATS: &str = "commits,repos,langs";
pub const DEFAULT_BORDER_RADIUS: u8 = 10;
pub const MAX_BORDER_RADIUS: u8 = 20;
pub const DEFAULT_CACHE_SECONDS: u64 = 1800;
pub const MAX_CACHE_SECONDS: u64 = 86_400;

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]{1,39}$").expect("valid handle regex"));
static STATS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z,]*$").expect("valid stats regex"));
static HEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{6}$").expect("valid colour regex"));

/// Query parameters exactly as received. Missing keys take their defaults
/// during validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardParams {
    pub user: String,
    pub stats: Option<String>,
    pub theme: Option<String>,
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub icon_color: Option<String>,
    pub title_color: Option<String>,
    pub border_radius: Option<String>,
    pub hide_border: Option<String>,
    pub hide_username: Option<String>,
    pub layout: Option<String>,
    pub langs_count: Option<String>,
    pub cache_seconds: Option<String>,
}

impl CardParams {
    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Self::default()
        }
    }

    /// Build from `key=value` pairs. Unrecognised keys are ignored; `cache`
    /// is accepted as an alias for `cache_seconds`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "user" => params.user = value,
                "stats" => params.stats = Some(value),
                "theme" => params.theme = Some(value),
                "bg_color" => params.bg_color = Some(value),
                "text_color" => params.text_color = Some(value),
                "icon_color" => params.icon_color = Some(value),
                "title_color" => params.title_color = Some(value),
                "border_radius" => params.border_radius = Some(value),
                "hide_border" => params.hide_border = Some(value),
                "hide_username" => params.hide_username = Some(value),
                "layout" => params.layout = Some(value),
                "langs_count" => params.langs_count = Some(value),
                "cache" | "cache_seconds" => params.cache_seconds = Some(value),
                _ => {}
            }
        }
        params
    }

    /// Check every rule and collect all failures into one error.
    pub fn validate(&self) -> Result<CardRequest, ParamError> {
        let mut problems = Vec::new();

        if !HANDLE_RE.is_match(&self.user) {
            problems.push("user must be 1-39 letters, digits or hyphens".to_string());
        }

        let stats = self.stats.as_deref().unwrap_or(DEFAULT_STATS);
        if !STATS_RE.is_match(stats) {
            problems.push("stats must be a comma-separated list of names".to_string());
        }
        let (kinds, show_languages) = parse_stats(stats);

        let border_radius = bounded(
            "border_radius",
            self.border_radius.as_deref(),
            u64::from(DEFAULT_BORDER_RADIUS),
            0..=u64::from(MAX_BORDER_RADIUS),
            &mut problems,
        ) as u8;
        let langs_count = bounded(
            "langs_count",
            self.langs_count.as_deref(),
            DEFAULT_LANGUAGE_COUNT as u64,
            1..=MAX_LANGUAGE_COUNT as u64,
            &mut problems,
        ) as usize;
        let cache_seconds = bounded(
            "cache_seconds",
            self.cache_seconds.as_deref(),
            DEFAULT_CACHE_SECONDS,
            0..=MAX_CACHE_SECONDS,
            &mut problems,
        );

        let colors = ColorOverrides {
            bg: hex_color("bg_color", self.bg_color.as_deref(), &mut problems),
            text: hex_color("text_color", self.text_color.as_deref(), &mut problems),
            title: hex_color("title_color", self.title_color.as_deref(), &mut problems),
            icon: hex_color("icon_color", self.icon_color.as_deref(), &mut problems),
        };

        if !problems.is_empty() {
            return Err(ParamError(problems.join(", ")));
        }

        let theme = match self.theme.as_deref() {
            Some(name) if theme::is_known_theme(name) => name.to_string(),
            _ => DEFAULT_THEME.to_string(),
        };

        Ok(CardRequest {
            handle: self.user.clone(),
            config: RenderConfig {
                theme,
                colors,
                border_radius,
                hide_border: flag(self.hide_border.as_deref()),
                hide_username: flag(self.hide_username.as_deref()),
                layout: Layout::from_param(self.layout.as_deref().unwrap_or_default()),
                stats: kinds,
                show_languages,
                langs_count,
                cache_ttl: Duration::from_secs(cache_seconds),
            },
        })
    }
}

fn flag(value: Option<&str>) -> bool {
    value == Some("true")
}

fn bounded(
    name: &str,
    raw: Option<&str>,
    default: u64,
    range: std::ops::RangeInclusive<u64>,
    problems: &mut Vec<String>,
) -> u64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(v) if range.contains(&v) => v,
        _ => {
            problems.push(format!(
                "{name} must be an integer between {} and {}",
                range.start(),
                range.end()
            ));
            default
        }
    }
}

fn hex_color(name: &str, raw: Option<&str>, problems: &mut Vec<String>) -> Option<String> {
    match raw {
        None | Some("") => None,
        Some(hex) if HEX_RE.is_match(hex) => Some(format!("#{hex}")),
        Some(_) => {
            problems.push(format!("{name} must be 6 hex digits"));
            None
        }
    }
}

/// Known statistic kinds in first-seen order, plus whether `langs` was asked
/// for. Unknown names are dropped.
fn parse_stats(raw: &str) -> (Vec<StatKind>, bool) {
    let mut kinds = Vec::new();
    let mut langs = false;
    for name in raw.split(',').filter(|s| !s.is_empty()) {
        if name == "langs" {
            langs = true;
        } else if let Some(kind) = StatKind::from_param(name) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }
    (kinds, langs)
}

/// Visual options for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub theme: String,
    pub colors: ColorOverrides,
    pub border_radius: u8,
    pub hide_border: bool,
    pub hide_username: bool,
    pub layout: Layout,
    pub stats: Vec<StatKind>,
    pub show_languages: bool,
    pub langs_count: usize,
    pub cache_ttl: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            colors: ColorOverrides::default(),
            border_radius: DEFAULT_BORDER_RADIUS,
            hide_border: false,
            hide_username: false,
            layout: Layout::Grid,
            stats: vec![StatKind::Commits, StatKind::Repos],
            show_languages: false,
            langs_count: DEFAULT_LANGUAGE_COUNT,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_SECONDS),
        }
    }
}

/// A validated request: whose card, and how to draw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRequest {
    pub handle: String,
    pub config: RenderConfig,
}
