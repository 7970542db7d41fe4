use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press does to the practice field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldAction {
    Type(char),
    /// Empty the field and restart the attempt.
    Clear,
    /// Editing keys the practice field swallows.
    Ignore,
}

pub fn field_action(key: &KeyEvent) -> FieldAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    match key.code {
        KeyCode::Char('u') if ctrl => FieldAction::Clear,
        KeyCode::Char(ch) if !ctrl && !alt => FieldAction::Type(ch),
        // Backspace, Delete, Tab and Esc cannot be used to edit the field;
        // mistakes are corrected automatically.
        _ => FieldAction::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_printable_chars_are_typed() {
        assert_eq!(field_action(&key(KeyCode::Char('a'))), FieldAction::Type('a'));
        assert_eq!(
            field_action(&KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            FieldAction::Type('A')
        );
        assert_eq!(field_action(&key(KeyCode::Char(' '))), FieldAction::Type(' '));
    }

    #[test]
    fn test_editing_keys_are_swallowed() {
        for code in [
            KeyCode::Backspace,
            KeyCode::Delete,
            KeyCode::Tab,
            KeyCode::Esc,
            KeyCode::Enter,
        ] {
            assert_eq!(field_action(&key(code)), FieldAction::Ignore);
        }
    }

    #[test]
    fn test_ctrl_u_clears() {
        assert_eq!(
            field_action(&KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL)),
            FieldAction::Clear
        );
        assert_eq!(
            field_action(&KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL)),
            FieldAction::Ignore
        );
    }
}
