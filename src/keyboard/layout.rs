use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{DefinitionError, DefinitionKind, DefinitionResult};
use crate::keyboard::finger::Hand;
use crate::keyboard::model::{KeyboardModel, Shape};
use crate::text;

// Raw XML shapes. Attribute names follow the layout file format.

#[derive(Debug, Deserialize)]
struct RawLayout {
    #[serde(rename = "variant", default)]
    variants: Vec<RawVariant>,
}

#[derive(Debug, Deserialize)]
struct RawVariant {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "@include", default)]
    include: Option<String>,
    #[serde(rename = "key", default)]
    keys: Vec<RawKey>,
}

#[derive(Debug, Deserialize)]
struct RawKey {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@base", default)]
    base: Option<String>,
    #[serde(rename = "@shift", default)]
    shift: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyDef {
    pub position: String,
    pub base: Option<char>,
    pub shift: Option<char>,
}

#[derive(Clone, Debug)]
pub struct Variant {
    pub id: String,
    pub name: String,
    pub include: Option<String>,
    pub keys: Vec<KeyDef>,
}

#[derive(Clone, Debug)]
pub struct LayoutDocument {
    pub id: String,
    pub variants: Vec<Variant>,
}

impl LayoutDocument {
    pub fn parse(id: &str, xml: &str) -> DefinitionResult<Self> {
        let raw: RawLayout =
            quick_xml::de::from_str(xml).map_err(|source| DefinitionError::Malformed {
                kind: DefinitionKind::Layout,
                name: id.to_string(),
                source,
            })?;

        if raw.variants.is_empty() {
            return Err(DefinitionError::Empty {
                kind: DefinitionKind::Layout,
                name: id.to_string(),
                what: "variants",
            });
        }

        let variants = raw
            .variants
            .into_iter()
            .map(|v| Variant {
                name: v.name.unwrap_or_else(|| v.id.clone()),
                id: v.id,
                include: v.include.filter(|s| !s.is_empty()),
                keys: v
                    .keys
                    .into_iter()
                    .map(|k| KeyDef {
                        position: k.name,
                        base: k.base.as_deref().and_then(text::single_char),
                        shift: k.shift.as_deref().and_then(text::single_char),
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            id: id.to_string(),
            variants,
        })
    }

    pub fn variant(&self, id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// First variant in document order.
    pub fn default_variant(&self) -> Option<&Variant> {
        self.variants.first()
    }

    /// `(id, display name)` pairs sorted by display name, for the selector.
    pub fn variant_options(&self) -> Vec<(&str, &str)> {
        let mut options: Vec<(&str, &str)> = self
            .variants
            .iter()
            .map(|v| (v.id.as_str(), v.name.as_str()))
            .collect();
        options.sort_by(|a, b| a.1.cmp(b.1));
        options
    }

    /// Build the complete character mapping for a variant, applying its
    /// `include` chain first. `None` when the variant does not exist.
    pub fn resolve(&self, variant_id: &str, model: &KeyboardModel) -> Option<KeyMap> {
        let variant = self.variant(variant_id)?;
        let mut keymap = KeyMap::with_space(model);
        let mut visited = HashSet::new();
        self.apply(variant, model, &mut keymap, &mut visited);
        Some(keymap)
    }

    fn apply(
        &self,
        variant: &Variant,
        model: &KeyboardModel,
        keymap: &mut KeyMap,
        visited: &mut HashSet<String>,
    ) {
        if !visited.insert(variant.id.clone()) {
            tracing::warn!(layout = %self.id, variant = %variant.id, "include cycle, skipping");
            return;
        }

        if let Some(ref include) = variant.include {
            match self.variant(include) {
                Some(base) => self.apply(base, model, keymap, visited),
                None => {
                    tracing::debug!(layout = %self.id, include = %include, "included variant not found")
                }
            }
        }

        for key in &variant.keys {
            keymap.insert(key, model);
        }
    }
}

/// Which shift key produces a shifted character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftKey {
    Left,
    Right,
}

impl ShiftKey {
    pub fn position(self) -> &'static str {
        match self {
            ShiftKey::Left => "LFSH",
            ShiftKey::Right => "RTSH",
        }
    }

    /// Touch typists press the shift key on the opposite hand.
    fn opposite_of(hand: Hand) -> Self {
        match hand {
            Hand::Left => ShiftKey::Right,
            Hand::Right => ShiftKey::Left,
        }
    }
}

/// Glyphs printed on a physical key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyLabel {
    pub base: char,
    pub shift: char,
}

#[derive(Clone, Debug, Default)]
pub struct KeyMap {
    keys: HashMap<char, String>,
    modifiers: HashMap<char, ShiftKey>,
    labels: HashMap<String, KeyLabel>,
}

impl KeyMap {
    fn with_space(model: &KeyboardModel) -> Self {
        let mut keymap = Self::default();
        if model.contains("SPCE") {
            keymap.keys.insert(' ', "SPCE".to_string());
        }
        keymap
    }

    fn insert(&mut self, key: &KeyDef, model: &KeyboardModel) {
        if !model.contains(&key.position) {
            tracing::trace!(position = %key.position, shape = %model.shape, "no such key on this shape");
            return;
        }
        let Some(base) = key.base else {
            return;
        };
        let shift = key.shift.unwrap_or(base);

        // A derived variant replaces whatever the base put on this position.
        if let Some(previous) = self.labels.remove(&key.position) {
            for ch in [previous.base, previous.shift] {
                if self.keys.get(&ch) == Some(&key.position) {
                    self.keys.remove(&ch);
                    self.modifiers.remove(&ch);
                }
            }
        }

        self.keys.insert(base, key.position.clone());
        self.keys.insert(shift, key.position.clone());
        self.modifiers.remove(&base);
        if base != shift {
            let hand = model.finger_for(&key.position).hand;
            self.modifiers.insert(shift, ShiftKey::opposite_of(hand));
        }
        self.labels
            .insert(key.position.clone(), KeyLabel { base, shift });
    }

    /// Physical position producing `ch`.
    pub fn key_for(&self, ch: char) -> Option<&str> {
        self.keys.get(&ch).map(String::as_str)
    }

    /// Shift key required for `ch`, if it is a shifted character.
    pub fn modifier_for(&self, ch: char) -> Option<ShiftKey> {
        self.modifiers.get(&ch).copied()
    }

    pub fn label(&self, position: &str) -> Option<&KeyLabel> {
        self.labels.get(position)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// `layout[-variant]`: the linkable form of a layout selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutRef {
    pub layout: String,
    pub variant: Option<String>,
}

impl LayoutRef {
    pub fn new(layout: &str, variant: Option<&str>) -> Self {
        Self {
            layout: layout.to_string(),
            variant: variant.map(str::to_string),
        }
    }
}

impl fmt::Display for LayoutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant {
            Some(ref variant) => write!(f, "{}-{}", self.layout, variant),
            None => f.write_str(&self.layout),
        }
    }
}

impl FromStr for LayoutRef {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('#');
        let (layout, variant) = match s.split_once('-') {
            Some((layout, variant)) => (layout, Some(variant).filter(|v| !v.is_empty())),
            None => (s, None),
        };
        if !is_valid_name(layout) {
            return Err(DefinitionError::InvalidName(s.to_string()));
        }
        Ok(Self::new(layout, variant))
    }
}

/// Definition names become file names; keep them to a safe alphabet.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && !name.starts_with('.')
}

/// The loaded layout, its selected variant and the resulting key mapping.
#[derive(Debug, Default)]
pub struct LayoutRegistry {
    document: Option<LayoutDocument>,
    variant: Option<String>,
    keymap: KeyMap,
    model: KeyboardModel,
}

impl LayoutRegistry {
    pub fn new(shape: Shape) -> Self {
        Self {
            model: KeyboardModel::new(shape),
            ..Self::default()
        }
    }

    /// Install a freshly loaded document and select `requested` (or the
    /// default variant). Returns the selected variant id.
    pub fn install(&mut self, document: LayoutDocument, requested: Option<&str>) -> Option<String> {
        let wanted = requested
            .filter(|id| document.variant(id).is_some())
            .or_else(|| {
                if let Some(id) = requested {
                    tracing::warn!(layout = %document.id, variant = id, "unknown variant, using default");
                }
                document.default_variant().map(|v| v.id.as_str())
            })
            .map(str::to_string);

        self.document = Some(document);
        self.variant = None;
        self.keymap = KeyMap::default();

        let id = wanted?;
        self.select_variant(&id).then_some(id)
    }

    /// Select a variant of the loaded layout. Unknown ids are ignored and
    /// the previous mapping is kept.
    pub fn select_variant(&mut self, id: &str) -> bool {
        let Some(ref document) = self.document else {
            return false;
        };
        match document.resolve(id, &self.model) {
            Some(keymap) => {
                tracing::debug!(layout = %document.id, variant = id, keys = keymap.len(), "variant selected");
                self.keymap = keymap;
                self.variant = Some(id.to_string());
                true
            }
            None => false,
        }
    }

    /// Changing the shape changes key hands and available positions, so the
    /// mapping is rebuilt from scratch.
    pub fn set_shape(&mut self, shape: Shape) {
        self.model = KeyboardModel::new(shape);
        if let (Some(document), Some(variant)) = (&self.document, &self.variant) {
            self.keymap = document.resolve(variant, &self.model).unwrap_or_default();
        }
    }

    pub fn current_ref(&self) -> Option<LayoutRef> {
        let document = self.document.as_ref()?;
        Some(LayoutRef::new(&document.id, self.variant.as_deref()))
    }

    pub fn document(&self) -> Option<&LayoutDocument> {
        self.document.as_ref()
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn model(&self) -> &KeyboardModel {
        &self.model
    }

    pub fn shape(&self) -> Shape {
        self.model.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<layout>
  <variant id="us" name="US English">
    <key name="AE02" base="2" shift="@"/>
    <key name="AD01" base="q" shift="Q"/>
    <key name="AC01" base="a" shift="A"/>
    <key name="AC07" base="j" shift="J"/>
    <key name="AC11" base="'" shift="&quot;"/>
    <key name="BKSL" base="\" shift="|"/>
  </variant>
  <variant id="gb" name="British English" include="us">
    <key name="AE02" base="2" shift="&quot;"/>
    <key name="AC11" base="'" shift="@"/>
    <key name="LSGT" base="\" shift="|"/>
  </variant>
  <variant id="loop" name="Loop" include="loop2"/>
  <variant id="loop2" name="Another Loop" include="loop">
    <key name="AD01" base="x" shift="X"/>
  </variant>
</layout>"#;

    fn doc() -> LayoutDocument {
        LayoutDocument::parse("qwerty", SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_variants() {
        let doc = doc();
        assert_eq!(doc.variants.len(), 4);
        let gb = doc.variant("gb").unwrap();
        assert_eq!(gb.name, "British English");
        assert_eq!(gb.include.as_deref(), Some("us"));
        assert_eq!(gb.keys[0].shift, Some('"'));
        assert_eq!(doc.default_variant().unwrap().id, "us");
    }

    #[test]
    fn test_variant_options_sorted_by_name() {
        let doc = doc();
        let names: Vec<&str> = doc.variant_options().iter().map(|(_, n)| *n).collect();
        assert_eq!(
            names,
            vec!["Another Loop", "British English", "Loop", "US English"]
        );
    }

    #[test]
    fn test_parse_rejects_empty_and_malformed() {
        assert!(matches!(
            LayoutDocument::parse("x", "<layout></layout>"),
            Err(DefinitionError::Empty { .. })
        ));
        assert!(matches!(
            LayoutDocument::parse("x", "<layout><variant></layout>"),
            Err(DefinitionError::Malformed { .. })
        ));
    }

    #[test]
    fn test_base_and_shift_map_to_same_key() {
        let model = KeyboardModel::new(Shape::Pc104);
        let keymap = doc().resolve("us", &model).unwrap();
        assert_eq!(keymap.key_for('a'), Some("AC01"));
        assert_eq!(keymap.key_for('A'), Some("AC01"));
        assert_eq!(keymap.key_for(' '), Some("SPCE"));
        assert_eq!(keymap.modifier_for('a'), None);
        // left hand letter -> right shift, right hand letter -> left shift
        assert_eq!(keymap.modifier_for('A'), Some(ShiftKey::Right));
        assert_eq!(keymap.modifier_for('J'), Some(ShiftKey::Left));
    }

    #[test]
    fn test_include_unions_keys_and_derived_wins() {
        let model = KeyboardModel::new(Shape::Pc105);
        let keymap = doc().resolve("gb", &model).unwrap();

        // inherited from us
        assert_eq!(keymap.key_for('q'), Some("AD01"));
        assert_eq!(keymap.key_for('j'), Some("AC07"));
        // overridden by gb
        assert_eq!(keymap.key_for('"'), Some("AE02"));
        assert_eq!(keymap.key_for('@'), Some("AC11"));
        assert_eq!(keymap.label("AE02").unwrap().shift, '"');
        assert_eq!(keymap.label("AC11").unwrap().shift, '@');
        // gb-only position
        assert_eq!(keymap.key_for('|'), Some("LSGT"));
    }

    #[test]
    fn test_positions_missing_from_shape_are_skipped() {
        let pc104 = KeyboardModel::new(Shape::Pc104);
        let keymap = doc().resolve("gb", &pc104).unwrap();
        // LSGT does not exist on pc104, but BKSL from us does
        assert_eq!(keymap.key_for('|'), Some("BKSL"));
        assert!(keymap.label("LSGT").is_none());
    }

    #[test]
    fn test_include_cycle_terminates() {
        let model = KeyboardModel::default();
        let keymap = doc().resolve("loop", &model).unwrap();
        assert_eq!(keymap.key_for('x'), Some("AD01"));
    }

    #[test]
    fn test_unknown_variant_is_noop() {
        let mut registry = LayoutRegistry::new(Shape::Pc104);
        registry.install(doc(), Some("us"));
        assert!(!registry.select_variant("nope"));
        assert_eq!(registry.variant(), Some("us"));
        assert_eq!(registry.keymap().key_for('q'), Some("AD01"));
    }

    #[test]
    fn test_install_defaults_to_first_variant() {
        let mut registry = LayoutRegistry::new(Shape::Pc104);
        assert_eq!(registry.install(doc(), None).as_deref(), Some("us"));
        assert_eq!(registry.install(doc(), Some("bogus")).as_deref(), Some("us"));
        assert_eq!(registry.install(doc(), Some("gb")).as_deref(), Some("gb"));
        assert_eq!(registry.current_ref().unwrap().to_string(), "qwerty-gb");
    }

    #[test]
    fn test_switching_variant_rebuilds_mapping() {
        let mut registry = LayoutRegistry::new(Shape::Pc104);
        registry.install(doc(), Some("loop2"));
        assert_eq!(registry.keymap().key_for('x'), Some("AD01"));
        assert!(registry.select_variant("us"));
        assert_eq!(registry.keymap().key_for('x'), None);
        assert_eq!(registry.keymap().key_for('q'), Some("AD01"));
    }

    #[test]
    fn test_set_shape_rebuilds_mapping() {
        let mut registry = LayoutRegistry::new(Shape::Pc104);
        registry.install(doc(), Some("gb"));
        assert_eq!(registry.keymap().key_for('|'), Some("BKSL"));
        registry.set_shape(Shape::Pc105);
        assert_eq!(registry.keymap().key_for('|'), Some("LSGT"));
    }

    #[test]
    fn test_layout_ref_parse_and_display() {
        let r: LayoutRef = "qwerty-gb".parse().unwrap();
        assert_eq!(r, LayoutRef::new("qwerty", Some("gb")));
        assert_eq!(r.to_string(), "qwerty-gb");

        let r: LayoutRef = "#dvorak".parse().unwrap();
        assert_eq!(r, LayoutRef::new("dvorak", None));
        assert_eq!(r.to_string(), "dvorak");

        let r: LayoutRef = "colemak-".parse().unwrap();
        assert_eq!(r.variant, None);

        assert!("".parse::<LayoutRef>().is_err());
        assert!("../etc-x".parse::<LayoutRef>().is_err());
    }
}
