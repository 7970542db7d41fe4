use std::borrow::Cow;

use icu_normalizer::ComposingNormalizerBorrowed;

/// NFC-normalize text read from definition files so that precomposed
/// characters coming from the terminal compare equal to decomposed ones
/// written in the XML.
pub fn nfc(text: &str) -> Cow<'_, str> {
    ComposingNormalizerBorrowed::new_nfc().normalize(text)
}

/// The single character a layout attribute describes, if it is exactly one
/// character after normalization.
pub fn single_char(value: &str) -> Option<char> {
    let normalized = nfc(value);
    let mut chars = normalized.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}
