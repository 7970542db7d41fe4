use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::lesson::document::{LessonDocument, Level};
use crate::session::typist::PromptSource;

/// The loaded lesson, its selected level and the random source used to
/// draw practice lines.
pub struct LessonRegistry {
    document: Option<LessonDocument>,
    level: usize,
    rng: SmallRng,
}

impl LessonRegistry {
    pub fn new(rng: SmallRng) -> Self {
        Self {
            document: None,
            level: 0,
            rng,
        }
    }

    pub fn from_entropy() -> Self {
        Self::new(SmallRng::from_entropy())
    }

    /// Install a freshly loaded lesson and select `level`. Returns the level
    /// actually selected.
    pub fn install(&mut self, document: LessonDocument, level: usize) -> usize {
        self.document = Some(document);
        self.select_level(level)
    }

    /// Select a level. Indices outside the lesson fall back to the first
    /// level.
    pub fn select_level(&mut self, index: usize) -> usize {
        let count = self.level_count();
        self.level = if index < count { index } else { 0 };
        if index >= count && count > 0 {
            tracing::debug!(index, count, "level out of range, using first level");
        }
        self.level
    }

    pub fn level_count(&self) -> usize {
        self.document.as_ref().map_or(0, |d| d.levels.len())
    }

    pub fn level_labels(&self) -> Vec<String> {
        self.document
            .as_ref()
            .map(LessonDocument::level_labels)
            .unwrap_or_default()
    }

    pub fn current_level(&self) -> Option<&Level> {
        self.document.as_ref()?.levels.get(self.level)
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn document(&self) -> Option<&LessonDocument> {
        self.document.as_ref()
    }

    pub fn lesson_id(&self) -> Option<&str> {
        self.document.as_ref().map(|d| d.id.as_str())
    }
}

impl PromptSource for LessonRegistry {
    /// Draw a line from the current level uniformly at random, with
    /// replacement. `None` when no lesson is loaded or the level is empty.
    fn new_prompt(&mut self) -> Option<String> {
        let level = self.document.as_ref()?.levels.get(self.level)?;
        if level.lines.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..level.lines.len());
        Some(level.lines[idx].clone())
    }
}

/// Parse a persisted level index. Anything unparsable means the first level.
pub fn level_from_setting(value: Option<&str>) -> usize {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}
