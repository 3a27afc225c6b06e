//! Wide strip: statistics side by side, languages as one stacked bar with a
//! legend underneath.

use super::{Card, Geometry, Typography};
use crate::format::format_number;
use crate::icons::symbol_id;
use crate::svg::Node;

const MIN_WIDTH: f64 = 480.0;
const PADDING: f64 = 20.0;
const MAX_COLUMN: f64 = 120.0;
const STRIP_BUDGET: f64 = 600.0 - 2.0 * PADDING;
const STATS_HEIGHT: f64 = 60.0;
const LANG_SECTION_HEIGHT: f64 = 150.0;
const LEGEND_COLUMNS: usize = 5;
const LEGEND_ROW_HEIGHT: f64 = 20.0;
const ICON_SIZE: f64 = 16.0;

pub(super) const TYPOGRAPHY: Typography = Typography {
    title: 18,
    subtitle: 13,
    label: 9,
    value: 20,
    language: 11,
    section: 14,
    uppercase_labels: true,
};

fn column_width(stat_count: usize) -> f64 {
    if stat_count == 0 {
        MAX_COLUMN
    } else {
        MAX_COLUMN.min(STRIP_BUDGET / stat_count as f64)
    }
}

pub(super) fn geometry(
    stat_count: usize,
    language_rows: Option<usize>,
    hide_username: bool,
) -> Geometry {
    let header_height = if hide_username { 55.0 } else { 70.0 };
    let column = column_width(stat_count);
    let languages = language_rows
        .map(|n| {
            let legend_rows = n.div_ceil(LEGEND_COLUMNS).max(1);
            LANG_SECTION_HEIGHT + (legend_rows - 1) as f64 * LEGEND_ROW_HEIGHT
        })
        .unwrap_or(0.0);

    Geometry {
        width: MIN_WIDTH.max(stat_count as f64 * column + 2.0 * PADDING),
        height: header_height + STATS_HEIGHT + languages + PADDING,
        padding: PADDING,
        header_height,
        header_top: 25.0,
        subtitle_offset: 24.0,
        column_width: column,
    }
}

pub(super) fn body(card: &Card<'_>, geo: &Geometry) -> Vec<Node> {
    let center = geo.column_width / 2.0;
    let strip = Node::translated(PADDING, geo.header_height).children(
        card.stats.iter().enumerate().map(|(i, stat)| {
            Node::translated(i as f64 * geo.column_width, 0.0)
                .child(
                    Node::use_ref(&symbol_id(stat.kind), ICON_SIZE)
                        .num("x", center - ICON_SIZE / 2.0)
                        .attr("y", "0"),
                )
                .child(
                    Node::text(stat.label)
                        .num("x", center)
                        .attr("y", "20")
                        .class("stat-label")
                        .attr("text-anchor", "middle")
                        .attr("dominant-baseline", "hanging"),
                )
                .child(
                    Node::text(format_number(stat.value))
                        .num("x", center)
                        .attr("y", "34")
                        .class("stat-value")
                        .attr("text-anchor", "middle")
                        .attr("dominant-baseline", "hanging"),
                )
        }),
    );
    let mut nodes = vec![strip];

    if let Some(languages) = card.languages() {
        let max_width = geo.width - 2.0 * PADDING;

        let mut bar = Node::translated(0.0, 25.0).child(
            Node::rect(max_width, 8.0)
                .attr("rx", "4")
                .attr("fill", card.theme.text.as_str())
                .attr("fill-opacity", "0.1"),
        );
        let mut offset = 0.0;
        for (i, lang) in languages.iter().enumerate() {
            let width = lang.percentage / 100.0 * max_width;
            let mut segment = Node::rect(width, 8.0)
                .num("x", offset)
                .attr("y", "0")
                .attr("fill", lang.color.as_str());
            if i == 0 {
                segment = segment.attr("rx", "4");
            }
            bar.push(segment);
            offset += width;
        }

        let legend_column = max_width / LEGEND_COLUMNS as f64;
        let legend = Node::translated(0.0, 45.0).children(languages.iter().enumerate().map(
            |(i, lang)| {
                let col = (i % LEGEND_COLUMNS) as f64;
                let row = (i / LEGEND_COLUMNS) as f64;
                Node::translated(col * legend_column, row * LEGEND_ROW_HEIGHT)
                    .child(
                        Node::rect(8.0, 8.0)
                            .attr("rx", "2")
                            .attr("fill", lang.color.as_str()),
                    )
                    .child(
                        Node::text(lang.name.as_str())
                            .attr("x", "12")
                            .attr("y", "4")
                            .class("lang-label")
                            .attr("dominant-baseline", "middle"),
                    )
                    .child(
                        Node::text(super::percent_label(lang))
                            .num("x", legend_column - 8.0)
                            .attr("y", "4")
                            .class("lang-percent")
                            .attr("text-anchor", "end")
                            .attr("dominant-baseline", "middle"),
                    )
            },
        ));

        nodes.push(
            Node::translated(PADDING, geo.header_height + STATS_HEIGHT)
                .child(
                    Node::text("Top Languages")
                        .attr("x", "0")
                        .attr("y", "0")
                        .class("section-title"),
                )
                .child(bar)
                .child(legend),
        );
    }

    nodes
}
