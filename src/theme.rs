//! Theme colors loaded from the terminal's kitty color scheme
//! Reads colors from ~/.config/kitty/current-theme.conf

use ratatui::style::Color;
use std::collections::HashMap;
use std::fs;

use crate::status::Severity;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub critical: Color,  // Expired pod, empty battery (color1/red)
    pub warning: Color,   // Running low (color3/yellow)
    pub good: Color,      // Healthy battery (color2/green)
    pub info: Color,      // Reservoir level (color4/blue)
    pub neutral: Color,   // Unknown values (color8/gray)
    pub text: Color,      // Primary text (foreground)
    pub text_dim: Color,  // Units, placeholders
    pub insulin: Color,   // Pod reservoir fill (color6/cyan)
    pub accent: Color,    // Borders, key hints (color5/magenta)
    pub inactive: Color,  // Inactive borders
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired fallback
        Self {
            critical: Color::Rgb(243, 139, 168),
            warning: Color::Rgb(249, 226, 175),
            good: Color::Rgb(166, 227, 161),
            info: Color::Rgb(137, 180, 250),
            neutral: Color::Rgb(127, 132, 156),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            insulin: Color::Rgb(148, 226, 213),
            accent: Color::Rgb(203, 166, 247),
            inactive: Color::Rgb(88, 91, 112),
        }
    }
}

impl Theme {
    /// Load theme from the kitty color scheme, or fall back to defaults
    pub fn load() -> Self {
        Self::load_kitty_theme().unwrap_or_default()
    }

    /// Color for a severity
    pub fn severity(&self, severity: Severity) -> Color {
        match severity {
            Severity::Critical => self.critical,
            Severity::Warning => self.warning,
            Severity::Good => self.good,
            Severity::Info => self.info,
            Severity::Unknown => self.neutral,
        }
    }

    fn load_kitty_theme() -> Option<Self> {
        let path = dirs::config_dir()?.join("kitty/current-theme.conf");
        let content = fs::read_to_string(&path).ok()?;
        let theme = Self::from_kitty_conf(&content);
        if theme.is_some() {
            tracing::debug!("Loaded theme from {}", path.display());
        }
        theme
    }

    /// Map the ANSI palette of a kitty.conf onto our roles
    fn from_kitty_conf(content: &str) -> Option<Self> {
        let colors = Self::parse_kitty_conf(content);
        if colors.is_empty() {
            return None;
        }

        let fallback = Self::default();
        let pick = |keys: &[&str], default: Color| {
            keys.iter()
                .find_map(|k| colors.get(*k))
                .copied()
                .unwrap_or(default)
        };

        Some(Self {
            critical: pick(&["color1", "color9"], fallback.critical),
            warning: pick(&["color3", "color11"], fallback.warning),
            good: pick(&["color2", "color10"], fallback.good),
            info: pick(&["color4", "color12"], fallback.info),
            neutral: pick(&["color8"], fallback.neutral),
            text: pick(&["foreground", "color7"], fallback.text),
            text_dim: pick(&["color8", "color7"], fallback.text_dim),
            insulin: pick(&["color6", "color14"], fallback.insulin),
            accent: pick(&["color5", "color13"], fallback.accent),
            inactive: pick(&["inactive_border_color", "color0"], fallback.inactive),
        })
    }

    /// Parse kitty.conf format: `key value` or `key #hexcolor`
    fn parse_kitty_conf(content: &str) -> HashMap<String, Color> {
        let mut colors = HashMap::new();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once(char::is_whitespace) {
                if let Some(color) = Self::parse_hex_color(value) {
                    colors.insert(key.trim().to_string(), color);
                }
            }
        }

        colors
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(Theme::parse_hex_color("#ff0080"), Some(Color::Rgb(255, 0, 128)));
        assert_eq!(Theme::parse_hex_color("#fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(Theme::parse_hex_color("red"), None);
        assert_eq!(Theme::parse_hex_color("#12345"), None);
    }

    #[test]
    fn test_kitty_conf_maps_roles() {
        let conf = "\
# comment
foreground #cdd6f4
color1     #ff0000
color2\t#00ff00
font_family JetBrains Mono
";
        let theme = Theme::from_kitty_conf(conf).unwrap();
        assert_eq!(theme.critical, Color::Rgb(255, 0, 0));
        assert_eq!(theme.good, Color::Rgb(0, 255, 0));
        assert_eq!(theme.text, Color::Rgb(205, 214, 244));
        // Missing keys keep the fallback
        assert_eq!(theme.info, Theme::default().info);
    }

    #[test]
    fn test_kitty_conf_without_colors() {
        assert!(Theme::from_kitty_conf("font_size 12\n").is_none());
    }

    #[test]
    fn test_severity_colors() {
        let theme = Theme::default();
        assert_eq!(theme.severity(Severity::Critical), theme.critical);
        assert_eq!(theme.severity(Severity::Unknown), theme.neutral);
    }
}
