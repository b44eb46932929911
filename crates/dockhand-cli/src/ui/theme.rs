//! Colors and icons used by every console view.

use crossterm::style::Color;
use dockhand_schema::StepStatus;

/// Visual constants for console output.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub colors: ColorScheme,
    pub icons: Icons,
}

#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Step labels
    pub step: Color,
    /// Durations, commands, hints
    pub secondary: Color,
    pub success: Color,
    pub skipped: Color,
    pub warning: Color,
    pub error: Color,
    /// A step that is running
    pub active: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            step: Color::Cyan,
            secondary: Color::DarkGrey,
            success: Color::Green,
            skipped: Color::DarkGrey,
            warning: Color::Yellow,
            error: Color::Red,
            active: Color::Blue,
        }
    }
}

/// Status icons (○ ● ✓ ✗ ⚠ ℹ).
#[derive(Debug, Clone)]
pub struct Icons {
    pub pending: &'static str,
    pub active: &'static str,
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            pending: "○",
            active: "●",
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
        }
    }
}

impl Theme {
    /// Icon and color for a finished step.
    pub fn status(&self, status: StepStatus) -> (&'static str, Color) {
        match status {
            StepStatus::Success => (self.icons.success, self.colors.success),
            StepStatus::Skipped => (self.icons.pending, self.colors.skipped),
            StepStatus::Failed => (self.icons.error, self.colors.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_icons_are_distinct() {
        let theme = Theme::default();
        let (ok, _) = theme.status(StepStatus::Success);
        let (skip, _) = theme.status(StepStatus::Skipped);
        let (fail, color) = theme.status(StepStatus::Failed);
        assert_ne!(ok, fail);
        assert_ne!(ok, skip);
        assert_eq!(color, Color::Red);
    }
}
