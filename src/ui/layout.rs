use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen regions of the practice screen, top to bottom.
pub struct AppLayout {
    pub header: Rect,
    pub prompt: Rect,
    /// `None` when the terminal is too short for the keyboard.
    pub keyboard: Option<Rect>,
    pub status: Rect,
    pub footer: Rect,
}

impl AppLayout {
    pub fn new(area: Rect, keyboard_height: u16) -> Self {
        const PROMPT: u16 = 5;
        const STATUS: u16 = 3;

        let fixed = 1 + PROMPT + STATUS + 1;
        let show_keyboard = area.height >= fixed + keyboard_height && area.width >= 32;

        let mut constraints = vec![Constraint::Length(1), Constraint::Min(PROMPT)];
        if show_keyboard {
            constraints.push(Constraint::Length(keyboard_height));
        }
        constraints.push(Constraint::Length(STATUS));
        constraints.push(Constraint::Length(1));

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        if show_keyboard {
            Self {
                header: rows[0],
                prompt: rows[1],
                keyboard: Some(rows[2]),
                status: rows[3],
                footer: rows[4],
            }
        } else {
            Self {
                header: rows[0],
                prompt: rows[1],
                keyboard: None,
                status: rows[2],
                footer: rows[3],
            }
        }
    }
}

pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = " ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints {
        if hint.is_empty() {
            continue;
        }
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width {
            current = candidate;
            has_hint = true;
        } else {
            if has_hint {
                out.push(current);
            }
            current = format!("{prefix}{hint}");
            has_hint = true;
        }
    }

    if has_hint {
        out.push(current);
    }
    out
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 40;
    const MIN_POPUP_HEIGHT: u16 = 8;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);

    Rect::new(left, top, target_w, target_h)
}
