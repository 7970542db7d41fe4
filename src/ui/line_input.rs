use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Submit,
    Cancel,
}

/// Single-line editor used by the layout jump prompt, with Tab completion
/// over a fixed candidate list.
pub struct LineInput {
    text: String,
    /// Cursor position as a char index (0 = before first char).
    cursor: usize,
    candidates: Vec<String>,
    completions: Vec<String>,
    completion_index: Option<usize>,
    /// Text snapshot when Tab was first pressed.
    completion_seed: String,
}

impl LineInput {
    pub fn new(text: &str, candidates: Vec<String>) -> Self {
        let cursor = text.chars().count();
        Self {
            text: text.to_string(),
            cursor,
            candidates,
            completions: Vec::new(),
            completion_index: None,
            completion_seed: String::new(),
        }
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    /// Returns (before_cursor, cursor_char, after_cursor) for styled rendering.
    /// When cursor is at end of text, cursor_char is None.
    pub fn render_parts(&self) -> (&str, Option<char>, &str) {
        let byte_offset = self.char_to_byte(self.cursor);
        match self.text[byte_offset..].chars().next() {
            Some(ch) => {
                let next_byte = byte_offset + ch.len_utf8();
                (&self.text[..byte_offset], Some(ch), &self.text[next_byte..])
            }
            None => (&self.text, None, ""),
        }
    }

    pub fn handle(&mut self, key: KeyEvent) -> InputResult {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return InputResult::Cancel,
            KeyCode::Enter => return InputResult::Submit,

            KeyCode::Left => {
                self.reset_completion();
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                self.reset_completion();
                if self.cursor < self.text.chars().count() {
                    self.cursor += 1;
                }
            }
            KeyCode::Home => {
                self.reset_completion();
                self.cursor = 0;
            }
            KeyCode::End => {
                self.reset_completion();
                self.cursor = self.text.chars().count();
            }
            KeyCode::Backspace => {
                self.reset_completion();
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_at_cursor();
                }
            }
            KeyCode::Delete => {
                self.reset_completion();
                self.remove_at_cursor();
            }
            KeyCode::Tab => self.tab_complete(true),
            KeyCode::BackTab => self.tab_complete(false),
            KeyCode::Char('a') if ctrl => {
                self.reset_completion();
                self.cursor = 0;
            }
            KeyCode::Char('e') if ctrl => {
                self.reset_completion();
                self.cursor = self.text.chars().count();
            }
            KeyCode::Char('u') if ctrl => {
                self.reset_completion();
                self.text.clear();
                self.cursor = 0;
            }
            KeyCode::Char(ch) if !ctrl => {
                self.reset_completion();
                let byte_offset = self.char_to_byte(self.cursor);
                self.text.insert(byte_offset, ch);
                self.cursor += 1;
            }
            _ => {}
        }
        InputResult::Continue
    }

    /// Convert char index to byte offset.
    fn char_to_byte(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    fn remove_at_cursor(&mut self) {
        let byte_offset = self.char_to_byte(self.cursor);
        if let Some(ch) = self.text[byte_offset..].chars().next() {
            self.text
                .replace_range(byte_offset..byte_offset + ch.len_utf8(), "");
        }
    }

    fn reset_completion(&mut self) {
        self.completions.clear();
        self.completion_index = None;
        self.completion_seed.clear();
    }

    fn tab_complete(&mut self, forward: bool) {
        // Only complete at end of line
        if self.cursor < self.text.chars().count() {
            return;
        }

        match self.completion_index {
            None => {
                self.completion_seed = self.text.clone();
                self.completions = self
                    .candidates
                    .iter()
                    .filter(|c| c.starts_with(&self.completion_seed))
                    .cloned()
                    .collect();
                if self.completions.is_empty() {
                    return;
                }
                self.completion_index = Some(0);
                self.apply_completion(0);
            }
            Some(idx) => {
                let count = self.completions.len();
                let next = if forward {
                    (idx + 1) % count
                } else {
                    (idx + count - 1) % count
                };
                self.completion_index = Some(next);
                self.apply_completion(next);
            }
        }
    }

    fn apply_completion(&mut self, idx: usize) {
        self.text = self.completions[idx].clone();
        self.cursor = self.text.chars().count();
    }
}
