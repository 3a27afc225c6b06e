//! Named palettes and per-render colour overrides.

/// Concrete colour set used by the layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub bg: String,
    pub text: String,
    pub title: String,
    pub icon: String,
    pub border: String,
    pub stat_bg: String,
}

#[derive(Clone, Copy)]
struct Palette {
    bg: &'static str,
    text: &'static str,
    title: &'static str,
    icon: &'static str,
    border: &'static str,
    stat_bg: &'static str,
}

pub const DEFAULT_THEME: &str = "dark";

const PALETTES: [(&str, Palette); 6] = [
    (
        "dark",
        Palette {
            bg: "#0d1117",
            text: "#c9d1d9",
            title: "#58a6ff",
            icon: "#79c0ff",
            border: "#30363d",
            stat_bg: "#161b22",
        },
    ),
    (
        "light",
        Palette {
            bg: "#ffffff",
            text: "#24292f",
            title: "#0969da",
            icon: "#1f6feb",
            border: "#d0d7de",
            stat_bg: "#f6f8fa",
        },
    ),
    (
        "dracula",
        Palette {
            bg: "#282a36",
            text: "#f8f8f2",
            title: "#ff79c6",
            icon: "#bd93f9",
            border: "#6272a4",
            stat_bg: "#44475a",
        },
    ),
    (
        "monokai",
        Palette {
            bg: "#272822",
            text: "#f8f8f2",
            title: "#66d9ef",
            icon: "#a6e22e",
            border: "#75715e",
            stat_bg: "#3e3d32",
        },
    ),
    (
        "nord",
        Palette {
            bg: "#2e3440",
            text: "#d8dee9",
            title: "#88c0d0",
            icon: "#81a1c1",
            border: "#4c566a",
            stat_bg: "#3b4252",
        },
    ),
    (
        "gruvbox",
        Palette {
            bg: "#282828",
            text: "#ebdbb2",
            title: "#fabd2f",
            icon: "#b8bb26",
            border: "#504945",
            stat_bg: "#3c3836",
        },
    ),
];

/// Optional replacements for the four overridable fields. `border` and
/// `stat_bg` always come from the named palette.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorOverrides {
    pub bg: Option<String>,
    pub text: Option<String>,
    pub title: Option<String>,
    pub icon: Option<String>,
}

/// Names of the built-in palettes, in declaration order.
pub fn theme_names() -> impl Iterator<Item = &'static str> {
    PALETTES.iter().map(|(name, _)| *name)
}

pub fn is_known_theme(name: &str) -> bool {
    PALETTES.iter().any(|(n, _)| *n == name)
}

fn palette(name: &str) -> Palette {
    PALETTES
        .iter()
        .find(|(n, _)| *n == name)
        .or_else(|| PALETTES.iter().find(|(n, _)| *n == DEFAULT_THEME))
        .map(|(_, p)| *p)
        .unwrap_or(PALETTES[0].1)
}

/// Unknown or empty names resolve to the default palette without error.
pub fn resolve(name: &str, overrides: &ColorOverrides) -> Theme {
    let base = palette(name);
    let pick = |over: &Option<String>, fallback: &'static str| match over {
        Some(c) if !c.is_empty() => c.clone(),
        _ => fallback.to_string(),
    };

    Theme {
        bg: pick(&overrides.bg, base.bg),
        text: pick(&overrides.text, base.text),
        title: pick(&overrides.title, base.title),
        icon: pick(&overrides.icon, base.icon),
        border: base.border.to_string(),
        stat_bg: base.stat_bg.to_string(),
    }
}
