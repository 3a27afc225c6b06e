//! Card layouts.
//!
//! All three layouts take the same [`Card`] and produce a complete SVG
//! document. They differ only in their sizing constants and in how the
//! statistic tiles and the language section are arranged.

mod compact;
mod grid;
mod horizontal;

use crate::format::one_decimal;
use crate::icons::IconSet;
use crate::params::RenderConfig;
use crate::stats::{DisplayStat, LanguageStat, UserIdentity};
use crate::svg::{self, Node};
use crate::theme::Theme;

const FONT_STACK: &str =
    "Mona Sans, Inter, -apple-system, BlinkMacSystemFont, Segoe UI, Helvetica, Arial, sans-serif";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    /// Two-column grid of tiles.
    #[default]
    Grid,
    /// Single stacked column.
    Compact,
    /// One horizontal strip.
    Horizontal,
}

impl Layout {
    /// Unknown names select the grid layout.
    pub fn from_param(name: &str) -> Self {
        match name {
            "compact" => Layout::Compact,
            "horizontal" => Layout::Horizontal,
            _ => Layout::Grid,
        }
    }

    pub fn param(self) -> &'static str {
        match self {
            Layout::Grid => "default",
            Layout::Compact => "compact",
            Layout::Horizontal => "horizontal",
        }
    }

    pub fn geometry(self, card: &Card<'_>) -> Geometry {
        let stat_count = card.stats.len();
        let language_rows = card.languages().map(<[_]>::len);
        let hide_username = card.config.hide_username;
        match self {
            Layout::Grid => grid::geometry(stat_count, language_rows, hide_username),
            Layout::Compact => compact::geometry(stat_count, language_rows, hide_username),
            Layout::Horizontal => horizontal::geometry(stat_count, language_rows, hide_username),
        }
    }

    pub fn render(self, card: &Card<'_>) -> String {
        let geo = self.geometry(card);
        let (typography, body) = match self {
            Layout::Grid => (grid::TYPOGRAPHY, grid::body(card, &geo)),
            Layout::Compact => (compact::TYPOGRAPHY, compact::body(card, &geo)),
            Layout::Horizontal => (horizontal::TYPOGRAPHY, horizontal::body(card, &geo)),
        };
        frame(card, &geo, &typography)
            .child(
                Node::group()
                    .class("container animate-fade")
                    .child(header(card, &geo))
                    .children(body),
            )
            .to_markup()
    }
}

/// Inputs shared by every layout.
#[derive(Debug, Clone, Copy)]
pub struct Card<'a> {
    pub user: &'a UserIdentity,
    pub stats: &'a [DisplayStat],
    pub languages: &'a [LanguageStat],
    pub theme: &'a Theme,
    pub config: &'a RenderConfig,
}

impl Card<'_> {
    /// Languages to draw, or `None` when the section is hidden.
    pub fn languages(&self) -> Option<&[LanguageStat]> {
        if !self.config.show_languages {
            return None;
        }
        let n = self.languages.len().min(self.config.langs_count);
        Some(&self.languages[..n])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub header_height: f64,
    /// Offset of the header block from the top edge.
    pub header_top: f64,
    pub subtitle_offset: f64,
    /// Column width for layouts that split the width evenly.
    pub column_width: f64,
}

#[derive(Debug, Clone, Copy)]
struct Typography {
    title: u32,
    subtitle: u32,
    label: u32,
    value: u32,
    language: u32,
    section: u32,
    uppercase_labels: bool,
}

fn stylesheet(theme: &Theme, t: &Typography) -> String {
    let label_case = if t.uppercase_labels {
        " text-transform: uppercase; letter-spacing: 0.5px; opacity: 0.7;"
    } else {
        ""
    };
    format!(
        ".container {{ font-family: {FONT_STACK}; }}
.title {{ font-size: {title}px; font-weight: 700; fill: {title_color}; }}
.section-title {{ font-size: {section}px; font-weight: 700; fill: {title_color}; }}
.subtitle {{ font-size: {subtitle}px; font-weight: 400; fill: {text}; opacity: 0.8; }}
.stat-card-bg {{ fill: {stat_bg}; opacity: 0.5; }}
.stat-label {{ font-size: {label}px; font-weight: 600; fill: {text};{label_case} }}
.stat-value {{ font-size: {value}px; font-weight: 700; fill: {title_color}; }}
.lang-label {{ font-size: {lang}px; font-weight: 600; fill: {text}; }}
.lang-percent {{ font-size: {lang}px; font-weight: 400; fill: {text}; opacity: 0.7; }}
@keyframes fadeIn {{ from {{ opacity: 0; }} to {{ opacity: 1; }} }}
.animate-fade {{ animation: fadeIn 0.5s ease-out forwards; }}",
        title = t.title,
        section = t.section,
        subtitle = t.subtitle,
        label = t.label,
        value = t.value,
        lang = t.language,
        title_color = theme.title,
        text = theme.text,
        stat_bg = theme.stat_bg,
    )
}

/// Root element, `<defs>` and the background rectangle.
fn frame(card: &Card<'_>, geo: &Geometry, typography: &Typography) -> Node {
    let mut icons = IconSet::new();
    for stat in card.stats {
        icons.register(stat.kind);
    }

    let mut background = Node::rect(geo.width, geo.height)
        .attr("fill", card.theme.bg.as_str())
        .attr("rx", card.config.border_radius.to_string());
    if !card.config.hide_border {
        background = background
            .attr("stroke", card.theme.border.as_str())
            .attr("stroke-width", "1")
            .attr("stroke-opacity", "0.5");
    }

    svg::document(geo.width, geo.height)
        .child(
            Node::new("defs")
                .child(svg::style(stylesheet(card.theme, typography)))
                .children(icons.symbols(&card.theme.icon)),
        )
        .child(background)
}

fn header(card: &Card<'_>, geo: &Geometry) -> Node {
    let mut block = Node::translated(geo.padding, geo.header_top).child(
        Node::text(card.user.display_name())
            .attr("x", "0")
            .attr("y", "0")
            .class("title")
            .attr("dominant-baseline", "hanging"),
    );
    if !card.config.hide_username {
        block.push(
            Node::text(format!("@{}", card.user.login))
                .attr("x", "0")
                .num("y", geo.subtitle_offset)
                .class("subtitle")
                .attr("dominant-baseline", "hanging"),
        );
    }
    block
}

/// Extra language rows beyond the five each section is sized for.
fn extra_language_rows(rows: usize) -> f64 {
    rows.saturating_sub(5) as f64
}

fn percent_label(lang: &LanguageStat) -> String {
    format!("{}%", one_decimal(lang.percentage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::RenderConfig;
    use crate::stats::StatKind;
    use crate::theme::{self, ColorOverrides};

    fn user() -> UserIdentity {
        UserIdentity {
            name: Some("The <Octo> Cat".into()),
            login: "octocat".into(),
        }
    }

    fn stats(n: usize) -> Vec<DisplayStat> {
        StatKind::ALL
            .iter()
            .take(n)
            .map(|&kind| DisplayStat {
                kind,
                label: kind.label(),
                value: 1_234,
            })
            .collect()
    }

    fn languages() -> Vec<LanguageStat> {
        ["Rust", "Go", "C&C++"]
            .iter()
            .enumerate()
            .map(|(i, name)| LanguageStat {
                name: name.to_string(),
                color: "#dea584".into(),
                size: 100 - i as u64,
                percentage: 33.3,
            })
            .collect()
    }

    fn height(layout: Layout, n: usize, show_languages: bool) -> f64 {
        let config = RenderConfig {
            layout,
            show_languages,
            ..RenderConfig::default()
        };
        let theme = theme::resolve("dark", &ColorOverrides::default());
        let user = user();
        let stats = stats(n);
        let langs = languages();
        let card = Card {
            user: &user,
            stats: &stats,
            languages: &langs,
            theme: &theme,
            config: &config,
        };
        layout.geometry(&card).height
    }

    const LAYOUTS: [Layout; 3] = [Layout::Grid, Layout::Compact, Layout::Horizontal];

    #[test]
    fn height_grows_with_stat_count() {
        for layout in LAYOUTS {
            for show in [false, true] {
                let heights: Vec<f64> = (0..=6).map(|n| height(layout, n, show)).collect();
                assert!(
                    heights.windows(2).all(|w| w[0] <= w[1]),
                    "{layout:?}: {heights:?}"
                );
            }
        }
    }

    #[test]
    fn language_section_adds_height() {
        for layout in LAYOUTS {
            for n in 0..=6 {
                assert!(height(layout, n, true) > height(layout, n, false), "{layout:?}");
            }
        }
    }

    #[test]
    fn unknown_layout_is_grid() {
        assert_eq!(Layout::from_param("grid"), Layout::Grid);
        assert_eq!(Layout::from_param(""), Layout::Grid);
        assert_eq!(Layout::from_param("compact"), Layout::Compact);
        assert_eq!(Layout::from_param("horizontal"), Layout::Horizontal);
    }

    #[test]
    fn every_layout_escapes_and_shows_values() {
        let theme = theme::resolve("dracula", &ColorOverrides::default());
        let user = user();
        let stats = stats(3);
        let langs = languages();
        for layout in LAYOUTS {
            let config = RenderConfig {
                layout,
                show_languages: true,
                hide_border: true,
                ..RenderConfig::default()
            };
            let card = Card {
                user: &user,
                stats: &stats,
                languages: &langs,
                theme: &theme,
                config: &config,
            };
            let svg = layout.render(&card);
            assert!(svg.starts_with("<svg "), "{layout:?}");
            assert!(svg.contains("The &lt;Octo&gt; Cat"));
            assert!(!svg.contains("<Octo>"));
            assert!(svg.contains("@octocat"));
            assert!(svg.contains("C&amp;C++"));
            assert!(svg.contains(">1.2k<"));
            assert!(svg.contains(">33.3%<"));
            assert!(svg.contains(r##"href="#icon-commits""##));
            assert!(!svg.contains("stroke-opacity"));
        }
    }

    #[test]
    fn hide_username_drops_subtitle() {
        let theme = theme::resolve("dark", &ColorOverrides::default());
        let user = user();
        let config = RenderConfig {
            hide_username: true,
            ..RenderConfig::default()
        };
        let card = Card {
            user: &user,
            stats: &[],
            languages: &[],
            theme: &theme,
            config: &config,
        };
        let svg = Layout::Grid.render(&card);
        assert!(!svg.contains("@octocat"));
        assert!(svg.contains(r##"stroke="#30363d""##));
    }

    #[test]
    fn languages_truncate_to_configured_count() {
        let user = user();
        let langs = languages();
        let config = RenderConfig {
            show_languages: true,
            langs_count: 2,
            ..RenderConfig::default()
        };
        let theme = theme::resolve("dark", &ColorOverrides::default());
        let card = Card {
            user: &user,
            stats: &[],
            languages: &langs,
            theme: &theme,
            config: &config,
        };
        assert_eq!(card.languages().map(<[_]>::len), Some(2));
        assert!(!Layout::Compact.render(&card).contains("C&amp;C++"));
    }

    #[test]
    fn percent_ties_round_up() {
        let lang = LanguageStat {
            name: "Nix".into(),
            color: "#7e7eff".into(),
            size: 49,
            percentage: 100.0 * 49.0 / 400.0,
        };
        assert_eq!(percent_label(&lang), "12.3%");
    }
}
