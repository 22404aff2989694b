//! Built-in themes and the theme container.

use crate::util::escape_html;

/// Whether a theme is light or dark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Appearance {
    Light,
    Dark,
}

/// A named visual theme.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ThemeData {
    /// Stable identifier, used in class names and configuration.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    pub appearance: Appearance,
    /// Theme name understood by the diagram engine.
    pub diagram_theme: &'static str,
    /// CSS custom properties emitted on the container.
    pub variables: &'static [(&'static str, &'static str)],
}

pub static LIGHT: ThemeData = ThemeData {
    id: "light",
    name: "Light",
    appearance: Appearance::Light,
    diagram_theme: "default",
    variables: &[
        ("--mdlive-bg", "#ffffff"),
        ("--mdlive-fg", "#1f2328"),
        ("--mdlive-muted", "#59636e"),
        ("--mdlive-link", "#0969da"),
        ("--mdlive-border", "#d1d9e0"),
        ("--mdlive-code-bg", "#f6f8fa"),
    ],
};

pub static DARK: ThemeData = ThemeData {
    id: "dark",
    name: "Dark",
    appearance: Appearance::Dark,
    diagram_theme: "dark",
    variables: &[
        ("--mdlive-bg", "#0d1117"),
        ("--mdlive-fg", "#e6edf3"),
        ("--mdlive-muted", "#9198a1"),
        ("--mdlive-link", "#4493f8"),
        ("--mdlive-border", "#3d444d"),
        ("--mdlive-code-bg", "#151b23"),
    ],
};

pub static SEPIA: ThemeData = ThemeData {
    id: "sepia",
    name: "Sepia",
    appearance: Appearance::Light,
    diagram_theme: "neutral",
    variables: &[
        ("--mdlive-bg", "#f4ecd8"),
        ("--mdlive-fg", "#5b4636"),
        ("--mdlive-muted", "#8a7560"),
        ("--mdlive-link", "#8b4513"),
        ("--mdlive-border", "#d8c9a8"),
        ("--mdlive-code-bg", "#ede2c8"),
    ],
};

pub static SOLARIZED_DARK: ThemeData = ThemeData {
    id: "solarized-dark",
    name: "Solarized Dark",
    appearance: Appearance::Dark,
    diagram_theme: "dark",
    variables: &[
        ("--mdlive-bg", "#002b36"),
        ("--mdlive-fg", "#839496"),
        ("--mdlive-muted", "#586e75"),
        ("--mdlive-link", "#268bd2"),
        ("--mdlive-border", "#073642"),
        ("--mdlive-code-bg", "#073642"),
    ],
};

/// All built-in themes, default first.
pub static BUILTIN_THEMES: [&ThemeData; 4] = [&LIGHT, &DARK, &SEPIA, &SOLARIZED_DARK];

impl ThemeData {
    /// Look up a built-in theme by ID.
    #[must_use]
    pub fn find(id: &str) -> Option<&'static ThemeData> {
        BUILTIN_THEMES.iter().copied().find(|theme| theme.id == id)
    }

    /// Inline `style` value declaring the theme's custom properties.
    #[must_use]
    pub fn style(&self) -> String {
        self.variables
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Wrap rendered content in a container tagged with this theme.
    #[must_use]
    pub fn wrap(&self, html: &str) -> String {
        let id = escape_html(self.id);
        format!(
            r#"<div class="mdlive-theme theme-{id}" data-theme="{id}" style="{}">{html}</div>"#,
            escape_html(&self.style())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_builtin() {
        assert_eq!(ThemeData::find("dark").map(|t| t.name), Some("Dark"));
        assert_eq!(
            ThemeData::find("solarized-dark").map(|t| t.diagram_theme),
            Some("dark")
        );
        assert!(ThemeData::find("neon").is_none());
    }

    #[test]
    fn test_builtin_ids_unique() {
        let mut ids: Vec<_> = BUILTIN_THEMES.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), BUILTIN_THEMES.len());
    }

    #[test]
    fn test_wrap() {
        let html = SEPIA.wrap("<p>x</p>");
        assert!(html.starts_with(r#"<div class="mdlive-theme theme-sepia" data-theme="sepia" style="--mdlive-bg: #f4ecd8; "#));
        assert!(html.ends_with("<p>x</p></div>"));
    }

    #[test]
    fn test_light_is_first() {
        assert_eq!(BUILTIN_THEMES[0].id, "light");
    }
}
