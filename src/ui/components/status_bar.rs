use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::timer::SessionMetrics;
use crate::ui::theme::Theme;

/// Result of the last finished line plus the running mistake count.
pub struct StatusBar<'a> {
    pub last: Option<SessionMetrics>,
    pub mistakes: u32,
    pub theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(last: Option<SessionMetrics>, mistakes: u32, theme: &'a Theme) -> Self {
        Self {
            last,
            mistakes,
            theme,
        }
    }
}

pub fn format_metrics(last: Option<SessionMetrics>) -> (String, String) {
    match last {
        Some(m) => (format!("{} cpm", m.speed), m.errors.to_string()),
        None => ("-".to_string(), "-".to_string()),
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let (speed, errors) = format_metrics(self.last);
        let label = Style::default().fg(colors.text_pending());
        let value = Style::default()
            .fg(colors.accent())
            .add_modifier(Modifier::BOLD);

        let line = Line::from(vec![
            Span::styled(" Speed: ", label),
            Span::styled(speed, value),
            Span::styled("   Errors: ", label),
            Span::styled(errors, value),
            Span::styled("   This line: ", label),
            Span::styled(
                self.mistakes.to_string(),
                if self.mistakes > 0 {
                    Style::default().fg(colors.warning())
                } else {
                    Style::default().fg(colors.fg())
                },
            ),
        ]);

        Paragraph::new(line)
            .block(
                Block::bordered()
                    .border_style(Style::default().fg(colors.border()))
                    .style(Style::default().bg(colors.bg())),
            )
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_metrics() {
        assert_eq!(format_metrics(None), ("-".to_string(), "-".to_string()));
        let metrics = SessionMetrics {
            speed: 212,
            errors: 3,
            elapsed_secs: 9.5,
        };
        assert_eq!(
            format_metrics(Some(metrics)),
            ("212 cpm".to_string(), "3".to_string())
        );
    }
}
