use std::time::Instant;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::typist::TypingSession;
use crate::ui::theme::Theme;

/// The practice line with typed, next and pending characters styled, and
/// the practice field below it.
pub struct PromptArea<'a> {
    session: &'a TypingSession,
    now: Instant,
    theme: &'a Theme,
}

impl<'a> PromptArea<'a> {
    pub fn new(session: &'a TypingSession, now: Instant, theme: &'a Theme) -> Self {
        Self {
            session,
            now,
            theme,
        }
    }
}

/// Spaces are shown as a middle dot so they are visible at the cursor.
fn display_char(ch: char) -> String {
    match ch {
        ' ' => "\u{00b7}".to_string(),
        '\t' => "\u{2192}".to_string(),
        _ => ch.to_string(),
    }
}

impl Widget for PromptArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let flashing = self.session.is_flashing_error(self.now);

        let block = Block::bordered()
            .title(" Practice ")
            .border_style(Style::default().fg(if flashing {
                colors.error()
            } else {
                colors.border_focused()
            }))
            .style(Style::default().bg(colors.bg()));

        let Some(target) = self.session.target() else {
            let idle = Paragraph::new(Line::from(Span::styled(
                "No practice text. Pick a lesson and level (F4/F5).",
                Style::default().fg(colors.text_pending()),
            )))
            .block(block);
            idle.render(area, buf);
            return;
        };

        let cursor = self.session.typed_len();
        let prompt_spans: Vec<Span> = target
            .iter()
            .enumerate()
            .map(|(idx, &ch)| {
                let style = if idx < cursor {
                    Style::default().fg(colors.text_correct())
                } else if idx == cursor && flashing {
                    Style::default()
                        .fg(colors.text_incorrect())
                        .bg(colors.text_incorrect_bg())
                        .add_modifier(Modifier::UNDERLINED)
                } else if idx == cursor {
                    Style::default()
                        .fg(colors.text_cursor_fg())
                        .bg(colors.text_cursor_bg())
                } else {
                    Style::default().fg(colors.text_pending())
                };
                let text = if idx == cursor {
                    display_char(ch)
                } else {
                    ch.to_string()
                };
                Span::styled(text, style)
            })
            .collect();

        let field_style = if flashing {
            Style::default().fg(colors.text_incorrect())
        } else {
            Style::default().fg(colors.fg())
        };

        let lines = vec![
            Line::from(prompt_spans),
            Line::from(""),
            Line::from(vec![
                Span::styled("> ", Style::default().fg(colors.accent())),
                Span::styled(self.session.input().to_string(), field_style),
                Span::styled("_", Style::default().fg(colors.accent_dim())),
            ]),
        ];

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::typist::PromptSource;

    struct Fixed(Option<&'static str>);

    impl PromptSource for Fixed {
        fn new_prompt(&mut self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn rendered(session: &TypingSession, now: Instant) -> String {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 40, 6);
        let mut buf = Buffer::empty(area);
        PromptArea::new(session, now, &theme).render(area, &mut buf);
        (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_display_char_marks_space() {
        assert_eq!(display_char(' '), "\u{00b7}");
        assert_eq!(display_char('a'), "a");
    }

    #[test]
    fn test_renders_prompt_and_field() {
        let now = Instant::now();
        let mut source = Fixed(Some("fj fj"));
        let mut session = TypingSession::new(Duration::from_millis(150));
        session.new_prompt(&mut source, now);
        session.type_char('f', &mut source, now);

        let text = rendered(&session, now);
        assert!(text.contains("fj\u{00b7}fj") || text.contains("fj fj"));
        assert!(text.contains("> f_"));
    }

    #[test]
    fn test_idle_message() {
        let now = Instant::now();
        let mut source = Fixed(None);
        let mut session = TypingSession::new(Duration::from_millis(150));
        session.new_prompt(&mut source, now);
        assert!(rendered(&session, now).contains("No practice text"));
    }
}
