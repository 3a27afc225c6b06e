//! Narrow 320px card with one statistic per row.

use super::{Card, Geometry, Typography, extra_language_rows, percent_label};
use crate::format::format_number;
use crate::icons::symbol_id;
use crate::svg::Node;

const WIDTH: f64 = 320.0;
const PADDING: f64 = 16.0;
const ROW_HEIGHT: f64 = 36.0;
const LANG_SECTION_HEIGHT: f64 = 150.0;
const LANG_ROW_HEIGHT: f64 = 22.0;
const RIGHT_EDGE: f64 = WIDTH - 2.0 * PADDING;

pub(super) const TYPOGRAPHY: Typography = Typography {
    title: 16,
    subtitle: 12,
    label: 12,
    value: 14,
    language: 11,
    section: 14,
    uppercase_labels: false,
};

pub(super) fn geometry(
    stat_count: usize,
    language_rows: Option<usize>,
    hide_username: bool,
) -> Geometry {
    let header_height = if hide_username { 50.0 } else { 65.0 };
    let languages = language_rows
        .map(|n| LANG_SECTION_HEIGHT + extra_language_rows(n) * LANG_ROW_HEIGHT)
        .unwrap_or(0.0);

    Geometry {
        width: WIDTH,
        height: header_height + stat_count as f64 * ROW_HEIGHT + languages + PADDING,
        padding: PADDING,
        header_height,
        header_top: 20.0,
        subtitle_offset: 22.0,
        column_width: RIGHT_EDGE,
    }
}

pub(super) fn body(card: &Card<'_>, geo: &Geometry) -> Vec<Node> {
    let mut nodes: Vec<Node> = card
        .stats
        .iter()
        .enumerate()
        .map(|(i, stat)| {
            Node::translated(PADDING, geo.header_height + i as f64 * ROW_HEIGHT)
                .child(Node::use_ref(&symbol_id(stat.kind), 16.0).attr("y", "2"))
                .child(
                    Node::text(stat.label)
                        .attr("x", "24")
                        .attr("y", "12")
                        .class("stat-label")
                        .attr("dominant-baseline", "middle"),
                )
                .child(
                    Node::text(format_number(stat.value))
                        .num("x", geo.column_width)
                        .attr("y", "12")
                        .class("stat-value")
                        .attr("text-anchor", "end")
                        .attr("dominant-baseline", "middle"),
                )
        })
        .collect();

    if let Some(languages) = card.languages() {
        let top = geo.header_height + card.stats.len() as f64 * ROW_HEIGHT + 10.0;
        nodes.push(
            Node::translated(PADDING, top)
                .child(
                    Node::text("Top Languages")
                        .attr("x", "0")
                        .attr("y", "0")
                        .class("section-title"),
                )
                .children(languages.iter().enumerate().map(|(i, lang)| {
                    Node::translated(0.0, 25.0 + i as f64 * LANG_ROW_HEIGHT)
                        .child(
                            Node::rect((1.8 * lang.percentage).max(6.0), 6.0)
                                .attr("x", "0")
                                .attr("y", "-4")
                                .attr("rx", "3")
                                .attr("fill", lang.color.as_str()),
                        )
                        .child(
                            Node::text(lang.name.as_str())
                                .attr("x", "200")
                                .attr("y", "0")
                                .class("lang-label")
                                .attr("text-anchor", "end")
                                .attr("dominant-baseline", "middle"),
                        )
                        .child(
                            Node::text(percent_label(lang))
                                .num("x", geo.column_width)
                                .attr("y", "0")
                                .class("lang-percent")
                                .attr("text-anchor", "end")
                                .attr("dominant-baseline", "middle"),
                        )
                })),
        );
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_heights() {
        assert_eq!(geometry(3, None, false).height, 65.0 + 108.0 + 16.0);
        assert_eq!(geometry(3, Some(2), true).height, 50.0 + 108.0 + 150.0 + 16.0);
        assert_eq!(geometry(0, Some(6), false).height, 65.0 + 172.0 + 16.0);
        assert_eq!(geometry(1, None, false).width, 320.0);
    }
}
