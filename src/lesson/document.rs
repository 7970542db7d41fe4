use serde::Deserialize;

use crate::error::{DefinitionError, DefinitionKind, DefinitionResult};
use crate::text;

// KTouch lecture format. Elements we do not use (Comment, FontSuggestions)
// are skipped by the deserializer.

#[derive(Debug, Deserialize)]
struct RawLecture {
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Levels", default)]
    levels: RawLevels,
}

#[derive(Debug, Default, Deserialize)]
struct RawLevels {
    #[serde(rename = "Level", default)]
    levels: Vec<RawLevel>,
}

#[derive(Debug, Deserialize)]
struct RawLevel {
    #[serde(rename = "NewCharacters", default)]
    new_characters: Option<String>,
    #[serde(rename = "Line", default)]
    lines: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    /// Characters introduced by this level.
    pub label: String,
    pub lines: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LessonDocument {
    pub id: String,
    pub title: String,
    pub levels: Vec<Level>,
}

impl LessonDocument {
    pub fn parse(id: &str, xml: &str) -> DefinitionResult<Self> {
        let raw: RawLecture =
            quick_xml::de::from_str(xml).map_err(|source| DefinitionError::Malformed {
                kind: DefinitionKind::Lesson,
                name: id.to_string(),
                source,
            })?;

        if raw.levels.levels.is_empty() {
            return Err(DefinitionError::Empty {
                kind: DefinitionKind::Lesson,
                name: id.to_string(),
                what: "levels",
            });
        }

        let levels = raw
            .levels
            .levels
            .into_iter()
            .map(|level| Level {
                label: level
                    .new_characters
                    .map(|s| text::nfc(s.trim()).into_owned())
                    .unwrap_or_default(),
                lines: level
                    .lines
                    .iter()
                    .filter(|line| !line.trim().is_empty())
                    .map(|line| text::nfc(line).into_owned())
                    .collect(),
            })
            .collect();

        Ok(Self {
            id: id.to_string(),
            title: raw
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| id.to_string()),
            levels,
        })
    }

    /// Selector labels, `"1: fj"`, `"2: dk"`, ...
    pub fn level_labels(&self) -> Vec<String> {
        self.levels
            .iter()
            .enumerate()
            .map(|(i, level)| format!("{}: {}", i + 1, level.label))
            .collect()
    }
}
