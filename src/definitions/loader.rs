use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use crate::definitions::source::DefinitionSource;
use crate::error::{DefinitionKind, DefinitionResult};
use crate::event::AppEvent;
use crate::keyboard::layout::LayoutDocument;
use crate::lesson::LessonDocument;

/// A finished background load, posted back into the event loop.
#[derive(Debug)]
pub enum LoadResult {
    Layout {
        seq: u64,
        name: String,
        /// Variant to select once the document is installed.
        variant: Option<String>,
        result: DefinitionResult<LayoutDocument>,
    },
    Lesson {
        seq: u64,
        name: String,
        level: usize,
        result: DefinitionResult<LessonDocument>,
    },
}

impl LoadResult {
    pub fn kind(&self) -> DefinitionKind {
        match self {
            LoadResult::Layout { .. } => DefinitionKind::Layout,
            LoadResult::Lesson { .. } => DefinitionKind::Lesson,
        }
    }

    pub fn seq(&self) -> u64 {
        match self {
            LoadResult::Layout { seq, .. } | LoadResult::Lesson { seq, .. } => *seq,
        }
    }
}

/// Starts definition loads on helper threads.
///
/// Every request gets a fresh sequence number per kind; only the completion
/// carrying the latest number is accepted, so a slow earlier load cannot
/// overwrite a newer selection.
pub struct Loader {
    source: Arc<DefinitionSource>,
    tx: mpsc::Sender<AppEvent>,
    layout_seq: u64,
    lesson_seq: u64,
}

impl Loader {
    pub fn new(source: Arc<DefinitionSource>, tx: mpsc::Sender<AppEvent>) -> Self {
        Self {
            source,
            tx,
            layout_seq: 0,
            lesson_seq: 0,
        }
    }

    pub fn source(&self) -> &DefinitionSource {
        &self.source
    }

    pub fn request_layout(&mut self, name: &str, variant: Option<&str>) -> u64 {
        self.layout_seq += 1;
        let seq = self.layout_seq;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let name = name.to_string();
        let variant = variant.map(str::to_string);
        tracing::debug!(seq, layout = %name, "loading layout");

        thread::spawn(move || {
            let result = source.load_layout(&name);
            let _ = tx.send(AppEvent::Loaded(LoadResult::Layout {
                seq,
                name,
                variant,
                result,
            }));
        });
        seq
    }

    pub fn request_lesson(&mut self, name: &str, level: usize) -> u64 {
        self.lesson_seq += 1;
        let seq = self.lesson_seq;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let name = name.to_string();
        tracing::debug!(seq, lesson = %name, "loading lesson");

        thread::spawn(move || {
            let result = source.load_lesson(&name);
            let _ = tx.send(AppEvent::Loaded(LoadResult::Lesson {
                seq,
                name,
                level,
                result,
            }));
        });
        seq
    }

    /// Whether a completion answers the most recent request of its kind.
    pub fn is_current(&self, loaded: &LoadResult) -> bool {
        let latest = match loaded.kind() {
            DefinitionKind::Layout => self.layout_seq,
            DefinitionKind::Lesson => self.lesson_seq,
        };
        loaded.seq() == latest
    }
}
