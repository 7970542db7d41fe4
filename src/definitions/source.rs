use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use rust_embed::Embed;

use crate::config::Config;
use crate::definitions::cache::{DiskCache, fetch_url};
use crate::error::{DefinitionError, DefinitionKind, DefinitionResult};
use crate::keyboard::layout::{LayoutDocument, is_valid_name};
use crate::lesson::LessonDocument;

#[derive(Embed)]
#[folder = "assets/definitions/"]
struct BundledDefinitions;

struct Remote {
    base_url: String,
    cache: Option<DiskCache>,
}

/// Resolves definition names to file contents.
///
/// Lookup order: the user definitions directory, the definitions bundled
/// into the binary, then the remote base URL (cached on disk).
pub struct DefinitionSource {
    user_dir: Option<PathBuf>,
    remote: Option<Remote>,
}

impl DefinitionSource {
    pub fn new(user_dir: Option<PathBuf>) -> Self {
        Self {
            user_dir,
            remote: None,
        }
    }

    pub fn bundled_only() -> Self {
        Self::new(None)
    }

    pub fn with_remote(mut self, base_url: &str, cache_dir: PathBuf) -> Self {
        self.remote = Some(Remote {
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: DiskCache::new(cache_dir),
        });
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let source = Self::new(Some(PathBuf::from(&config.definitions_dir)));
        match config.remote_base_url() {
            Some(url) => source.with_remote(url, PathBuf::from(&config.definitions_cache_dir)),
            None => source,
        }
    }

    /// Raw text of the named definition.
    pub fn fetch(&self, kind: DefinitionKind, name: &str) -> DefinitionResult<String> {
        if !is_valid_name(name) {
            return Err(DefinitionError::InvalidName(name.to_string()));
        }
        let rel = kind.relative_path(name);

        if let Some(ref dir) = self.user_dir {
            let path = dir.join(&rel);
            if path.is_file() {
                tracing::debug!(path = %path.display(), "using user definition");
                return Ok(fs::read_to_string(path)?);
            }
        }

        if let Some(file) = BundledDefinitions::get(&rel) {
            return Ok(String::from_utf8_lossy(file.data.as_ref()).into_owned());
        }

        if let Some(ref remote) = self.remote {
            if let Some(text) = remote.cache.as_ref().and_then(|c| c.get(&rel)) {
                return Ok(text);
            }
            let url = format!("{}/{}", remote.base_url, rel);
            if let Some(text) = fetch_url(&url) {
                if let Some(ref cache) = remote.cache {
                    cache.put(&rel, &text);
                }
                return Ok(text);
            }
        }

        Err(DefinitionError::NotFound {
            kind,
            name: name.to_string(),
        })
    }

    pub fn load_layout(&self, name: &str) -> DefinitionResult<LayoutDocument> {
        let xml = self.fetch(DefinitionKind::Layout, name)?;
        LayoutDocument::parse(name, &xml)
    }

    pub fn load_lesson(&self, name: &str) -> DefinitionResult<LessonDocument> {
        let xml = self.fetch(DefinitionKind::Lesson, name)?;
        LessonDocument::parse(name, &xml)
    }

    /// Names of every bundled or user-provided definition of `kind`, sorted.
    pub fn available(&self, kind: DefinitionKind) -> Vec<String> {
        let mut names: BTreeSet<String> = BundledDefinitions::iter()
            .filter_map(|path| name_from_path(kind, &path))
            .collect();

        if let Some(ref dir) = self.user_dir {
            let subdir = kind.subdir();
            if let Ok(entries) = fs::read_dir(dir.join(subdir)) {
                for entry in entries.flatten() {
                    let file = entry.file_name().to_string_lossy().to_string();
                    if let Some(name) = name_from_path(kind, &format!("{subdir}/{file}")) {
                        names.insert(name);
                    }
                }
            }
        }

        names.into_iter().collect()
    }
}

/// `layouts/qwerty.xml` -> `qwerty` for the matching kind.
fn name_from_path(kind: DefinitionKind, path: &str) -> Option<String> {
    let rest = path.strip_prefix(kind.subdir())?.strip_prefix('/')?;
    let name = rest.strip_suffix(kind.extension())?;
    is_valid_name(name).then(|| name.to_string())
}
