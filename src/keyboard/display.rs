//! Display names for physical keys and characters.
//!
//! Layout files only describe character-bearing keys; the labels of the
//! control keys are fixed here.

use crate::keyboard::layout::KeyLabel;

/// Fixed label for control keys that no layout redefines.
pub fn special_label(position: &str) -> Option<&'static str> {
    match position {
        "BKSP" => Some("Bksp"),
        "TAB" => Some("Tab"),
        "CAPS" => Some("Caps"),
        "RTRN" => Some("Enter"),
        "LFSH" | "RTSH" => Some("Shift"),
        "SPCE" => Some("Space"),
        _ => None,
    }
}

/// Text printed on a key cap: the shifted glyph, followed by the base glyph
/// when the base is not simply its lowercase form.
pub fn key_caption(position: &str, label: Option<&KeyLabel>) -> String {
    if let Some(text) = special_label(position) {
        return text.to_string();
    }
    let Some(label) = label else {
        return String::new();
    };
    let lowered: String = label.shift.to_lowercase().collect();
    if lowered == label.base.to_string() {
        label.shift.to_string()
    } else {
        format!("{}{}", label.shift, label.base)
    }
}

/// Human-readable name for a character in hint text.
pub fn char_display_name(ch: char) -> String {
    match ch {
        ' ' => "Space".to_string(),
        '\t' => "Tab".to_string(),
        '\n' => "Enter".to_string(),
        _ => ch.to_string(),
    }
}
