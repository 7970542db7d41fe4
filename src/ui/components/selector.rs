use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};

use crate::ui::theme::Theme;

/// Placeholder shown while the options of a selector are not yet known.
pub const LOADING: &str = "(loading...)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorKind {
    Layout,
    Variant,
    Lesson,
    Level,
    Shape,
}

impl SelectorKind {
    pub fn title(self) -> &'static str {
        match self {
            SelectorKind::Layout => "Layout",
            SelectorKind::Variant => "Variant",
            SelectorKind::Lesson => "Lesson",
            SelectorKind::Level => "Level",
            SelectorKind::Shape => "Keyboard shape",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorItem {
    /// Value applied on selection (an id, a name or an index).
    pub value: String,
    pub label: String,
}

impl SelectorItem {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A pick-one list popup.
#[derive(Clone, Debug)]
pub struct Selector {
    pub kind: SelectorKind,
    pub items: Vec<SelectorItem>,
    pub selected: usize,
}

impl Selector {
    /// Opens with `current` preselected when it is among the items.
    pub fn new(kind: SelectorKind, items: Vec<SelectorItem>, current: Option<&str>) -> Self {
        let selected = current
            .and_then(|value| items.iter().position(|item| item.value == value))
            .unwrap_or(0);
        Self {
            kind,
            items,
            selected,
        }
    }

    pub fn next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1) % self.items.len();
        }
    }

    pub fn prev(&mut self) {
        if self.items.is_empty() {
            return;
        }
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.items.len() - 1;
        }
    }

    pub fn current(&self) -> Option<&SelectorItem> {
        self.items.get(self.selected)
    }
}

pub struct SelectorView<'a> {
    selector: &'a Selector,
    theme: &'a Theme,
}

impl<'a> SelectorView<'a> {
    pub fn new(selector: &'a Selector, theme: &'a Theme) -> Self {
        Self { selector, theme }
    }
}

impl Widget for SelectorView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        Clear.render(area, buf);
        let block = Block::bordered()
            .title(format!(" {} ", self.selector.kind.title()))
            .title_bottom(" Enter select  Esc close ")
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.selector.items.is_empty() {
            Paragraph::new(Span::styled(
                LOADING,
                Style::default().fg(colors.text_pending()),
            ))
            .render(inner, buf);
            return;
        }

        // Keep the selection on screen in long lists.
        let visible = inner.height.max(1) as usize;
        let first = self.selector.selected.saturating_sub(visible - 1);

        let lines: Vec<Line> = self
            .selector
            .items
            .iter()
            .enumerate()
            .skip(first)
            .take(visible)
            .map(|(i, item)| {
                let is_selected = i == self.selector.selected;
                let indicator = if is_selected { ">" } else { " " };
                Line::from(Span::styled(
                    format!(" {indicator} {}", item.label),
                    Style::default()
                        .fg(if is_selected {
                            colors.accent()
                        } else {
                            colors.fg()
                        })
                        .add_modifier(if is_selected {
                            Modifier::BOLD
                        } else {
                            Modifier::empty()
                        }),
                ))
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}
