use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::keyboard::layout::LayoutRef;
use crate::keyboard::model::Shape;
use crate::lesson::registry::level_from_setting;

pub const KB_LAYOUT: &str = "kbLayout";
pub const KB_SHAPE: &str = "kbShape";
pub const KB_HINTS: &str = "kbHints";
pub const LESSON_NAME: &str = "lessonName";
pub const LESSON_LEVEL: &str = "lessonLevel";

/// String key/value persistence.
pub trait SettingsBackend {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

/// Settings kept as a flat JSON object in the user's data directory.
pub struct FileBackend {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileBackend {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "unreadable settings, starting fresh");
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        let tmp_path = self.path.with_extension("tmp");

        let json = serde_json::to_string_pretty(&self.values)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl SettingsBackend for FileBackend {
    fn get_item(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

/// Session-only fallback when nothing can be written to disk.
#[derive(Default)]
pub struct MemoryBackend {
    values: BTreeMap<String, String>,
}

impl SettingsBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Typed access to the persisted preferences.
pub struct SettingsStore {
    backend: Box<dyn SettingsBackend>,
}

impl SettingsStore {
    pub fn new(backend: Box<dyn SettingsBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::default()))
    }

    /// Durable storage in the data directory, or memory if that fails.
    pub fn open_default() -> Self {
        let path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("typist")
            .join("settings.json");
        Self::open_or_memory(path)
    }

    pub fn open_or_memory(path: PathBuf) -> Self {
        match FileBackend::open(path) {
            Ok(backend) => {
                tracing::debug!(path = %backend.path().display(), "settings file opened");
                Self::new(Box::new(backend))
            }
            Err(e) => {
                tracing::warn!(error = %e, "settings not persisted, falling back to memory");
                Self::in_memory()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.backend.get_item(key).filter(|v| !v.is_empty())
    }

    /// Write failures are logged and otherwise ignored.
    pub fn set(&mut self, key: &str, value: &str) {
        if let Err(e) = self.backend.set_item(key, value) {
            tracing::warn!(key, error = %e, "failed to persist setting");
        }
    }

    pub fn remove(&mut self, key: &str) {
        if let Err(e) = self.backend.remove_item(key) {
            tracing::warn!(key, error = %e, "failed to remove setting");
        }
    }

    pub fn layout(&self) -> Option<LayoutRef> {
        self.get(KB_LAYOUT)?.parse().ok()
    }

    pub fn set_layout(&mut self, layout: &LayoutRef) {
        self.set(KB_LAYOUT, &layout.to_string());
    }

    pub fn shape(&self) -> Shape {
        self.get(KB_SHAPE)
            .map(|s| Shape::from_setting(&s))
            .unwrap_or_default()
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.set(KB_SHAPE, shape.as_str());
    }

    /// Hints are on unless explicitly switched off.
    pub fn hints(&self) -> bool {
        self.get(KB_HINTS).as_deref() != Some("off")
    }

    pub fn set_hints(&mut self, on: bool) {
        self.set(KB_HINTS, if on { "on" } else { "off" });
    }

    pub fn lesson_name(&self) -> Option<String> {
        self.get(LESSON_NAME)
    }

    pub fn set_lesson_name(&mut self, name: &str) {
        self.set(LESSON_NAME, name);
    }

    pub fn lesson_level(&self) -> usize {
        level_from_setting(self.get(LESSON_LEVEL).as_deref())
    }

    pub fn set_lesson_level(&mut self, level: usize) {
        self.set(LESSON_LEVEL, &level.to_string());
    }
}
