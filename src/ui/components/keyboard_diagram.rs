use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Widget};

use crate::keyboard::display::{char_display_name, key_caption};
use crate::keyboard::finger::{Finger, FingerAssignment, Hand};
use crate::keyboard::highlight::KeyHighlight;
use crate::keyboard::layout::KeyMap;
use crate::keyboard::model::{KeyboardModel, PhysicalKey};
use crate::ui::theme::Theme;

pub struct KeyboardDiagram<'a> {
    pub model: &'a KeyboardModel,
    pub keymap: &'a KeyMap,
    pub highlight: &'a KeyHighlight,
    pub hints: bool,
    pub theme: &'a Theme,
}

impl<'a> KeyboardDiagram<'a> {
    pub fn new(
        model: &'a KeyboardModel,
        keymap: &'a KeyMap,
        highlight: &'a KeyHighlight,
        hints: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            model,
            keymap,
            highlight,
            hints,
            theme,
        }
    }

    /// Rows needed inside the border: one per key row plus the hint line.
    pub fn inner_height(model: &KeyboardModel, hints: bool) -> u16 {
        model.rows.len() as u16 + u16::from(hints)
    }
}

fn finger_color(assignment: FingerAssignment) -> Color {
    match (assignment.hand, assignment.finger) {
        (Hand::Left, Finger::Pinky) => Color::Rgb(180, 100, 100),
        (Hand::Left, Finger::Ring) => Color::Rgb(180, 140, 80),
        (Hand::Left, Finger::Middle) => Color::Rgb(120, 160, 80),
        (Hand::Left, Finger::Index) => Color::Rgb(80, 140, 180),
        (Hand::Right, Finger::Index) => Color::Rgb(100, 140, 200),
        (Hand::Right, Finger::Middle) => Color::Rgb(120, 160, 80),
        (Hand::Right, Finger::Ring) => Color::Rgb(180, 140, 80),
        (Hand::Right, Finger::Pinky) => Color::Rgb(180, 100, 100),
        _ => Color::Rgb(120, 120, 120),
    }
}

/// Column width of one keyboard unit that lets the widest row fit.
fn unit_width(model: &KeyboardModel, available: u16) -> u16 {
    let widest = model
        .rows
        .iter()
        .zip(model.row_offsets())
        .map(|(row, offset)| offset + row.iter().map(|k| k.width).sum::<u16>())
        .max()
        .unwrap_or(1)
        .max(1);
    (available / widest).clamp(3, 6)
}

/// Centre `text` in a cell `width` columns wide, truncating if needed.
fn fit_caption(text: &str, width: usize) -> String {
    let text: String = text.chars().take(width).collect();
    let len = text.chars().count();
    let left = (width - len) / 2;
    let right = width - len - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

/// The "which finger" line shown under the keyboard in hints mode.
pub fn finger_hint(
    model: &KeyboardModel,
    keymap: &KeyMap,
    highlight: &KeyHighlight,
) -> Option<String> {
    let ch = highlight.target()?;
    let key = highlight.active_key()?;
    let mut hint = format!(
        "{}: {}",
        char_display_name(ch),
        model.finger_for(key).describe()
    );
    if let Some(modifier) = keymap.modifier_for(ch) {
        let shift = model.finger_for(modifier.position());
        hint.push_str(&format!(" + {} shift", shift.describe()));
    }
    Some(hint)
}

impl Widget for KeyboardDiagram<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" Keyboard ({}) ", self.model.shape))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 3 || inner.width < 30 {
            return;
        }

        let unit = unit_width(self.model, inner.width);
        let offsets = self.model.row_offsets();

        for (row_idx, row) in self.model.rows.iter().enumerate() {
            let y = inner.y + row_idx as u16;
            if y >= inner.y + inner.height {
                break;
            }

            let mut x = inner.x + offsets.get(row_idx).copied().unwrap_or(0) * unit;
            for key in row {
                let cell = key.width * unit;
                if x + cell > inner.x + inner.width {
                    break;
                }
                let style = self.key_style(key);
                let caption = key_caption(key.name, self.keymap.label(key.name));
                let text = fit_caption(&caption, cell.saturating_sub(1) as usize);
                buf.set_string(x, y, &text, style);
                x += cell;
            }
        }

        if self.hints {
            let y = inner.y + self.model.rows.len() as u16;
            if y < inner.y + inner.height {
                if let Some(hint) = finger_hint(self.model, self.keymap, self.highlight) {
                    buf.set_string(
                        inner.x + 1,
                        y,
                        &hint,
                        Style::default().fg(colors.text_pending()),
                    );
                }
            }
        }
    }
}

impl KeyboardDiagram<'_> {
    fn key_style(&self, key: &PhysicalKey) -> Style {
        let colors = &self.theme.colors;
        if self.highlight.is_pulsing(key.name) {
            Style::default()
                .fg(colors.bg())
                .bg(colors.focused_key())
                .add_modifier(Modifier::BOLD)
        } else if self.highlight.is_active(key.name) {
            Style::default()
                .fg(colors.bg())
                .bg(colors.accent())
                .add_modifier(Modifier::BOLD)
        } else if self.hints && !key.is_special() {
            Style::default()
                .fg(colors.fg())
                .bg(finger_color(self.model.finger_for(key.name)))
        } else {
            Style::default().fg(colors.fg()).bg(colors.accent_dim())
        }
    }
}
