use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::keyboard::layout::{KeyMap, ShiftKey};

/// Visual key state of the on-screen keyboard: the key (and shift key) the
/// user should press next, plus short pulses on keys that were just pressed.
#[derive(Clone, Debug)]
pub struct KeyHighlight {
    target: Option<char>,
    active_key: Option<String>,
    active_mod: Option<ShiftKey>,
    pulses: HashMap<String, Instant>,
    pulse: Duration,
}

impl KeyHighlight {
    pub fn new(pulse: Duration) -> Self {
        Self {
            target: None,
            active_key: None,
            active_mod: None,
            pulses: HashMap::new(),
            pulse,
        }
    }

    /// Highlight the key for `ch`, clearing the previous key and modifier.
    /// `None` (or a character with no key) leaves nothing highlighted.
    pub fn highlight(&mut self, ch: Option<char>, keymap: &KeyMap) {
        self.active_key = None;
        self.active_mod = None;
        self.target = ch;

        let Some(ch) = ch else {
            return;
        };
        self.active_key = keymap.key_for(ch).map(str::to_string);
        self.active_mod = keymap.modifier_for(ch);
    }

    /// Start a pulse on the key that produces `ch`. Pulses run out on their
    /// own and are never cancelled.
    pub fn press(&mut self, ch: char, keymap: &KeyMap, now: Instant) {
        if let Some(position) = keymap.key_for(ch) {
            self.pulses.insert(position.to_string(), now + self.pulse);
        }
    }

    /// Drop pulses that have run out. Called on every tick.
    pub fn expire(&mut self, now: Instant) {
        self.pulses.retain(|_, until| *until > now);
    }

    pub fn is_active(&self, position: &str) -> bool {
        self.active_key.as_deref() == Some(position)
            || self.active_mod.map(ShiftKey::position) == Some(position)
    }

    pub fn is_pulsing(&self, position: &str) -> bool {
        self.pulses.contains_key(position)
    }

    pub fn target(&self) -> Option<char> {
        self.target
    }

    pub fn active_key(&self) -> Option<&str> {
        self.active_key.as_deref()
    }

    pub fn active_modifier(&self) -> Option<ShiftKey> {
        self.active_mod
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::layout::LayoutDocument;
    use crate::keyboard::model::KeyboardModel;

    fn keymap() -> KeyMap {
        let doc = LayoutDocument::parse(
            "t",
            r#"<layout><variant id="v" name="V">
                <key name="AC01" base="a" shift="A"/>
                <key name="AC08" base="k" shift="K"/>
            </variant></layout>"#,
        )
        .unwrap();
        doc.resolve("v", &KeyboardModel::default()).unwrap()
    }

    #[test]
    fn test_highlight_replaces_previous() {
        let keymap = keymap();
        let mut hl = KeyHighlight::new(Duration::from_millis(150));

        hl.highlight(Some('A'), &keymap);
        assert!(hl.is_active("AC01"));
        assert!(hl.is_active("RTSH"));

        hl.highlight(Some('k'), &keymap);
        assert!(hl.is_active("AC08"));
        assert!(!hl.is_active("AC01"));
        assert!(!hl.is_active("RTSH"));
        assert_eq!(hl.active_modifier(), None);
    }

    #[test]
    fn test_highlight_none_clears() {
        let keymap = keymap();
        let mut hl = KeyHighlight::new(Duration::from_millis(150));
        hl.highlight(Some('K'), &keymap);
        assert!(hl.is_active("LFSH"));
        hl.highlight(None, &keymap);
        assert_eq!(hl.active_key(), None);
        assert_eq!(hl.target(), None);
    }

    #[test]
    fn test_unknown_char_highlights_nothing() {
        let keymap = keymap();
        let mut hl = KeyHighlight::new(Duration::from_millis(150));
        hl.highlight(Some('z'), &keymap);
        assert_eq!(hl.active_key(), None);
        assert_eq!(hl.target(), Some('z'));
    }

    #[test]
    fn test_pulse_is_independent_and_expires() {
        let keymap = keymap();
        let mut hl = KeyHighlight::new(Duration::from_millis(150));
        let t0 = Instant::now();

        hl.highlight(Some('k'), &keymap);
        hl.press('a', &keymap, t0);
        assert!(hl.is_pulsing("AC01"));
        assert!(hl.is_active("AC08"));

        hl.expire(t0 + Duration::from_millis(100));
        assert!(hl.is_pulsing("AC01"));
        hl.expire(t0 + Duration::from_millis(200));
        assert!(!hl.is_pulsing("AC01"));
        assert!(hl.is_active("AC08"));
    }
}
