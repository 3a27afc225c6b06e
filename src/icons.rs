//! Octicon glyphs for the statistic kinds, emitted once per render as
//! `<symbol>` definitions.

use indexmap::IndexSet;

use crate::stats::StatKind;
use crate::svg::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub path: &'static str,
    pub view_box: &'static str,
}

/// Drawn when a kind has no glyph.
pub const FALLBACK_GLYPH: Glyph = Glyph {
    path: "M12,2 A10,10 0 1,0 22,12 A10,10 0 1,0 12,2",
    view_box: "0 0 24 24",
};

/// Keyed by the `stats` parameter name of each kind.
const OCTICONS: &[(&str, Glyph)] = &[
    (
        "commits",
        Glyph {
            path: "M11.93 8.5a4.002 4.002 0 0 1-7.86 0H.75a.75.75 0 0 1 0-1.5h3.32a4.002 4.002 0 0 1 7.86 0h3.32a.75.75 0 0 1 0 1.5Zm-1.43-.75a2.5 2.5 0 1 0-5 0 2.5 2.5 0 0 0 5 0Z",
            view_box: "0 0 16 16",
        },
    ),
    (
        "repos",
        Glyph {
            path: "M2 2.5A2.5 2.5 0 0 1 4.5 0h8.75a.75.75 0 0 1 .75.75v12.5a.75.75 0 0 1-.75.75h-2.5a.75.75 0 0 1 0-1.5h1.75v-2h-8a1 1 0 0 0-.714 1.7.75.75 0 1 1-1.072 1.05A2.495 2.495 0 0 1 2 11.5Zm10.5-1h-8a1 1 0 0 0-1 1v6.708A2.486 2.486 0 0 1 4.5 9h8ZM5 12.25a.25.25 0 0 1 .25-.25h3.5a.25.25 0 0 1 .25.25v3.25a.25.25 0 0 1-.4.2l-1.45-1.087a.249.249 0 0 0-.3 0L5.4 15.7a.25.25 0 0 1-.4-.2Z",
            view_box: "0 0 16 16",
        },
    ),
    (
        "prs",
        Glyph {
            path: "M1.5 3.25a2.25 2.25 0 1 1 3 2.122v5.256a2.251 2.251 0 1 1-1.5 0V5.372A2.25 2.25 0 0 1 1.5 3.25Zm5.677-.177L9.573.677A.25.25 0 0 1 10 .854V2.5h1A2.5 2.5 0 0 1 13.5 5v5.628a2.251 2.251 0 1 1-1.5 0V5a1 1 0 0 0-1-1h-1v1.646a.25.25 0 0 1-.427.177L7.177 3.427a.25.25 0 0 1 0-.354ZM3.75 2.5a.75.75 0 1 0 0 1.5.75.75 0 0 0 0-1.5Zm0 9.5a.75.75 0 1 0 0 1.5.75.75 0 0 0 0-1.5Zm8.25.75a.75.75 0 1 0 1.5 0 .75.75 0 0 0-1.5 0Z",
            view_box: "0 0 16 16",
        },
    ),
    (
        "issues",
        Glyph {
            path: "M8 9.5a1.5 1.5 0 1 0 0-3 1.5 1.5 0 0 0 0 3ZM8 0a8 8 0 1 1 0 16A8 8 0 0 1 8 0ZM1.5 8a6.5 6.5 0 1 0 13 0 6.5 6.5 0 0 0-13 0Z",
            view_box: "0 0 16 16",
        },
    ),
    (
        "stars",
        Glyph {
            path: "M8 .25a.75.75 0 0 1 .673.418l1.882 3.815 4.21.612a.75.75 0 0 1 .416 1.279l-3.046 2.97.719 4.192a.751.751 0 0 1-1.088.791L8 12.347l-3.766 1.98a.75.75 0 0 1-1.088-.79l.72-4.194L.818 6.374a.75.75 0 0 1 .416-1.28l4.21-.611L7.327.668A.75.75 0 0 1 8 .25Zm0 2.445L6.615 5.5a.75.75 0 0 1-.564.41l-3.097.45 2.24 2.184a.75.75 0 0 1 .216.664l-.528 3.084 2.769-1.456a.75.75 0 0 1 .698 0l2.77 1.456-.53-3.084a.75.75 0 0 1 .216-.664l2.24-2.183-3.096-.45a.75.75 0 0 1-.564-.41L8 2.694Z",
            view_box: "0 0 16 16",
        },
    ),
    (
        "followers",
        Glyph {
            path: "M2 5.5a3.5 3.5 0 1 1 5.898 2.549 5.508 5.508 0 0 1 3.034 4.084.75.75 0 1 1-1.482.235 4 4 0 0 0-7.9 0 .75.75 0 0 1-1.482-.236A5.507 5.507 0 0 1 3.102 8.05 3.493 3.493 0 0 1 2 5.5ZM11 4a3.001 3.001 0 0 1 2.22 5.018 5.01 5.01 0 0 1 2.56 3.012.749.749 0 0 1-.885.954.752.752 0 0 1-.549-.514 3.507 3.507 0 0 0-2.522-2.372.75.75 0 0 1-.574-.73v-.352a.75.75 0 0 1 .416-.672A1.5 1.5 0 0 0 11 5.5.75.75 0 0 1 11 4Zm-5.5-.5a2 2 0 1 0-.001 3.999A2 2 0 0 0 5.5 3.5Z",
            view_box: "0 0 16 16",
        },
    ),
];

pub fn glyph_for(kind: StatKind) -> Glyph {
    glyph_named(kind.param())
}

/// Lookup by parameter name (`"stars"`, `"prs"`, ...). Unknown names get the
/// fallback glyph.
pub fn glyph_named(name: &str) -> Glyph {
    OCTICONS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, g)| *g)
        .unwrap_or(FALLBACK_GLYPH)
}

pub fn symbol_id(kind: StatKind) -> String {
    format!("icon-{}", kind.param())
}

/// Symbols requested during one render. Registering a kind twice is a no-op.
#[derive(Debug, Default)]
pub struct IconSet {
    kinds: IndexSet<StatKind>,
}

impl IconSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `kind` is registered.
    pub fn register(&mut self, kind: StatKind) -> bool {
        self.kinds.insert(kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// One `<symbol>` per registered kind, filled with `color`.
    pub fn symbols(&self, color: &str) -> Vec<Node> {
        self.kinds
            .iter()
            .map(|&kind| {
                let glyph = glyph_for(kind);
                Node::new("symbol")
                    .attr("id", symbol_id(kind))
                    .attr("viewBox", glyph.view_box)
                    .child(
                        Node::group()
                            .attr("fill", color)
                            .attr("stroke", "none")
                            .child(Node::new("path").attr("d", glyph.path)),
                    )
            })
            .collect()
    }
}
