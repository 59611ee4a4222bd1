//! Terminal colors for status lines and similarity scores.

use console::Style;
use owo_colors::OwoColorize;
use std::fmt::Display;
use std::sync::LazyLock;

pub static THEME: LazyLock<Theme> = LazyLock::new(Theme::default);

/// Kind of status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Error,
}

/// How close a recommendation is, for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Strong,
    Fair,
    Weak,
}

impl ScoreBand {
    /// Cosine similarity of 0.5 and up is a strong match, 0.25 a fair one.
    #[must_use]
    pub fn of(score: f32) -> Self {
        if score >= 0.5 {
            Self::Strong
        } else if score >= 0.25 {
            Self::Fair
        } else {
            Self::Weak
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub dim: Style,
    pub path: Style,
    pub number: Style,
    strong: Style,
    fair: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            dim: Style::new().dim(),
            path: Style::new().magenta(),
            number: Style::new().cyan(),
            strong: Style::new().green().bright(),
            fair: Style::new().yellow(),
        }
    }
}

impl Theme {
    /// Honors `NO_COLOR` and non-terminal stdout.
    pub fn colors_enabled() -> bool {
        use is_terminal::IsTerminal;
        std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
    }

    /// One status line with a leading icon.
    pub fn status(&self, tone: Tone, text: impl Display) -> String {
        let icon = match tone {
            Tone::Success => "✓",
            Tone::Warning => "⚠",
            Tone::Error => "✗",
        };
        if !Self::colors_enabled() {
            return format!("{icon} {text}");
        }
        match tone {
            Tone::Success => format!("{} {}", icon.green(), text.bright_green()),
            Tone::Warning => format!("{} {}", icon.yellow(), text.bright_yellow()),
            Tone::Error => format!("{} {}", icon.red(), text.bright_red()),
        }
    }

    pub fn paint(&self, style: &Style, text: impl Display) -> String {
        if Self::colors_enabled() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Score with three decimals, colored by [`ScoreBand`].
    pub fn score(&self, score: f32) -> String {
        let text = format!("{score:.3}");
        match ScoreBand::of(score) {
            ScoreBand::Strong => self.paint(&self.strong, text),
            ScoreBand::Fair => self.paint(&self.fair, text),
            ScoreBand::Weak => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bands() {
        assert_eq!(ScoreBand::of(0.91), ScoreBand::Strong);
        assert_eq!(ScoreBand::of(0.5), ScoreBand::Strong);
        assert_eq!(ScoreBand::of(0.3), ScoreBand::Fair);
        assert_eq!(ScoreBand::of(-0.2), ScoreBand::Weak);
    }

    #[test]
    fn test_status_keeps_text() {
        let line = THEME.status(Tone::Warning, "No mentors matched");
        assert!(line.contains("No mentors matched"));
        assert!(line.contains('⚠'));
    }
}
