//! Default layout: 480px card, two columns of tiles, bar list of languages.

use super::{Card, Geometry, Typography, extra_language_rows, percent_label};
use crate::format::format_number;
use crate::icons::symbol_id;
use crate::svg::Node;

const WIDTH: f64 = 480.0;
const PADDING: f64 = 20.0;
const TILE_WIDTH: f64 = 212.0;
const TILE_HEIGHT: f64 = 50.0;
const GAP: f64 = 15.0;
const LANG_SECTION_HEIGHT: f64 = 200.0;
const LANG_ROW_HEIGHT: f64 = 28.0;
const BOTTOM_MARGIN: f64 = 20.0;
const BAR_X: f64 = 100.0;
const BAR_TRACK: f64 = 250.0;

pub(super) const TYPOGRAPHY: Typography = Typography {
    title: 20,
    subtitle: 14,
    label: 10,
    value: 18,
    language: 12,
    section: 16,
    uppercase_labels: true,
};

fn rows(stat_count: usize) -> f64 {
    stat_count.div_ceil(2) as f64
}

pub(super) fn geometry(
    stat_count: usize,
    language_rows: Option<usize>,
    hide_username: bool,
) -> Geometry {
    let header_height = if hide_username { 70.0 } else { 90.0 };
    let tail = match language_rows {
        Some(n) => LANG_SECTION_HEIGHT + extra_language_rows(n) * LANG_ROW_HEIGHT,
        None => BOTTOM_MARGIN,
    };

    Geometry {
        width: WIDTH,
        height: header_height + rows(stat_count) * (TILE_HEIGHT + GAP) + tail,
        padding: PADDING,
        header_height,
        header_top: 35.0,
        subtitle_offset: 28.0,
        column_width: TILE_WIDTH,
    }
}

pub(super) fn body(card: &Card<'_>, geo: &Geometry) -> Vec<Node> {
    let mut nodes: Vec<Node> = card
        .stats
        .iter()
        .enumerate()
        .map(|(i, stat)| {
            let col = (i % 2) as f64;
            let row = (i / 2) as f64;
            let x = PADDING + col * (geo.column_width + GAP);
            let y = geo.header_height + row * (TILE_HEIGHT + GAP);

            Node::translated(x, y)
                .child(
                    Node::rect(geo.column_width, TILE_HEIGHT)
                        .attr("rx", "6")
                        .class("stat-card-bg"),
                )
                .child(Node::translated(12.0, 15.0).child(Node::use_ref(&symbol_id(stat.kind), 20.0)))
                .child(
                    Node::text(stat.label)
                        .attr("x", "44")
                        .attr("y", "19")
                        .class("stat-label")
                        .attr("dominant-baseline", "middle"),
                )
                .child(
                    Node::text(format_number(stat.value))
                        .num("x", geo.column_width - 15.0)
                        .attr("y", "35")
                        .class("stat-value")
                        .attr("text-anchor", "end")
                        .attr("dominant-baseline", "middle"),
                )
        })
        .collect();

    if let Some(languages) = card.languages() {
        let top = geo.header_height + rows(card.stats.len()) * (TILE_HEIGHT + GAP) + 15.0;
        let section = Node::translated(PADDING, top)
            .child(
                Node::text("Top Languages")
                    .attr("x", "0")
                    .attr("y", "0")
                    .class("section-title"),
            )
            .children(languages.iter().enumerate().map(|(i, lang)| {
                Node::translated(0.0, 35.0 + i as f64 * LANG_ROW_HEIGHT)
                    .child(
                        Node::text(lang.name.as_str())
                            .attr("x", "0")
                            .attr("y", "0")
                            .class("lang-label")
                            .attr("dominant-baseline", "middle"),
                    )
                    .child(
                        Node::rect(BAR_TRACK, 8.0)
                            .num("x", BAR_X)
                            .attr("y", "-4")
                            .attr("rx", "4")
                            .attr("fill", card.theme.text.as_str())
                            .attr("fill-opacity", "0.1"),
                    )
                    .child(
                        Node::rect((BAR_TRACK / 100.0 * lang.percentage).max(8.0), 8.0)
                            .num("x", BAR_X)
                            .attr("y", "-4")
                            .attr("rx", "4")
                            .attr("fill", lang.color.as_str()),
                    )
                    .child(
                        Node::text(percent_label(lang))
                            .attr("x", "400")
                            .attr("y", "1")
                            .class("lang-percent")
                            .attr("text-anchor", "end")
                            .attr("dominant-baseline", "middle"),
                    )
            }));
        nodes.push(section);
    }

    nodes
}
