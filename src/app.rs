use std::time::Instant;

use rand::rngs::SmallRng;

use crate::config::Config;
use crate::definitions::{LoadResult, Loader};
use crate::error::DefinitionKind;
use crate::keyboard::highlight::KeyHighlight;
use crate::keyboard::layout::{LayoutRef, LayoutRegistry};
use crate::keyboard::model::Shape;
use crate::lesson::LessonRegistry;
use crate::lesson::registry::level_from_setting;
use crate::session::typist::{InputOutcome, TypingSession};
use crate::store::settings::{KB_SHAPE, SettingsStore};
use crate::ui::components::selector::{LOADING, Selector, SelectorItem, SelectorKind};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// Selections given on the command line. Anything unset comes from the
/// stored settings, then from the config defaults.
#[derive(Clone, Debug, Default)]
pub struct Startup {
    pub layout: Option<LayoutRef>,
    pub lesson: Option<String>,
    pub level: Option<usize>,
    pub shape: Option<Shape>,
    pub no_hints: bool,
}

pub struct App {
    pub config: Config,
    pub theme: Theme,
    pub settings: SettingsStore,
    pub layouts: LayoutRegistry,
    pub lessons: LessonRegistry,
    pub session: TypingSession,
    pub highlight: KeyHighlight,
    pub hints: bool,
    pub available_layouts: Vec<String>,
    pub available_lessons: Vec<String>,
    /// A layout request is outstanding (or the last one failed).
    pub layout_loading: bool,
    pub lesson_loading: bool,
    pub selector: Option<Selector>,
    pub jump: Option<LineInput>,
    pub message: Option<String>,
    pub should_quit: bool,
    loader: Loader,
}

impl App {
    pub fn new(config: Config, settings: SettingsStore, loader: Loader, rng: SmallRng) -> Self {
        let theme = Theme::load_or_default(&config.theme);
        let available_layouts = loader.source().available(DefinitionKind::Layout);
        let available_lessons = loader.source().available(DefinitionKind::Lesson);
        let session = TypingSession::new(config.error_flash());
        let highlight = KeyHighlight::new(config.key_pulse());

        Self {
            theme,
            settings,
            layouts: LayoutRegistry::default(),
            lessons: LessonRegistry::new(rng),
            session,
            highlight,
            hints: true,
            available_layouts,
            available_lessons,
            layout_loading: false,
            lesson_loading: false,
            selector: None,
            jump: None,
            message: None,
            should_quit: false,
            loader,
            config,
        }
    }

    /// Restore the previous selections and start loading definitions.
    pub fn start(&mut self, startup: Startup) {
        let shape = startup.shape.unwrap_or_else(|| {
            self.settings
                .get(KB_SHAPE)
                .map(|s| Shape::from_setting(&s))
                .unwrap_or_else(|| Shape::from_setting(&self.config.default_shape))
        });
        self.layouts.set_shape(shape);
        self.settings.set_shape(shape);

        self.hints = !startup.no_hints && self.settings.hints();
        self.settings.set_hints(self.hints);

        // The command line wins over the stored layout.
        let layout = startup
            .layout
            .or_else(|| self.settings.layout())
            .or_else(|| self.config.default_layout.parse().ok())
            .unwrap_or_else(|| LayoutRef::new("qwerty", None));
        self.request_layout(&layout);

        let lesson = startup
            .lesson
            .or_else(|| self.settings.lesson_name())
            .unwrap_or_else(|| self.config.default_lesson.clone());
        let level = startup.level.unwrap_or_else(|| self.settings.lesson_level());
        self.request_lesson(&lesson, level);
    }

    fn request_layout(&mut self, layout: &LayoutRef) {
        self.layout_loading = true;
        self.loader
            .request_layout(&layout.layout, layout.variant.as_deref());
    }

    fn request_lesson(&mut self, name: &str, level: usize) {
        self.lesson_loading = true;
        self.loader.request_lesson(name, level);
    }

    /// Install a finished load, unless a newer request superseded it.
    pub fn handle_loaded(&mut self, loaded: LoadResult, now: Instant) {
        if !self.loader.is_current(&loaded) {
            tracing::debug!(seq = loaded.seq(), kind = loaded.kind().as_str(), "ignoring stale load");
            return;
        }

        match loaded {
            LoadResult::Layout {
                name,
                variant,
                result,
                ..
            } => match result {
                Ok(document) => {
                    self.layouts.install(document, variant.as_deref());
                    self.layout_loading = false;
                    if let Some(current) = self.layouts.current_ref() {
                        tracing::info!(layout = %current, "layout loaded");
                        self.settings.set_layout(&current);
                    }
                    self.new_prompt(now);
                }
                Err(e) => {
                    tracing::warn!(layout = %name, error = %e, "failed to load layout");
                    self.message = Some(format!("Could not load layout '{name}'"));
                }
            },
            LoadResult::Lesson {
                name,
                level,
                result,
                ..
            } => match result {
                Ok(document) => {
                    let level = self.lessons.install(document, level);
                    self.lesson_loading = false;
                    tracing::info!(lesson = %name, level, "lesson loaded");
                    self.settings.set_lesson_name(&name);
                    self.settings.set_lesson_level(level);
                    self.new_prompt(now);
                }
                Err(e) => {
                    tracing::warn!(lesson = %name, error = %e, "failed to load lesson");
                    self.message = Some(format!("Could not load lesson '{name}'"));
                }
            },
        }
    }

    /// Discard the current attempt and show a fresh line.
    pub fn new_prompt(&mut self, now: Instant) {
        self.session.new_prompt(&mut self.lessons, now);
        self.refresh_highlight();
    }

    fn refresh_highlight(&mut self) {
        self.highlight
            .highlight(self.session.next_char(), self.layouts.keymap());
    }

    pub fn type_char(&mut self, ch: char, now: Instant) -> InputOutcome {
        self.highlight.press(ch, self.layouts.keymap(), now);
        let outcome = self.session.type_char(ch, &mut self.lessons, now);
        if let Some(metrics) = outcome.metrics {
            tracing::info!(speed = metrics.speed, errors = metrics.errors, "line completed");
        }
        self.refresh_highlight();
        outcome
    }

    pub fn clear_input(&mut self, now: Instant) {
        self.session.clear_input(&mut self.lessons, now);
        self.refresh_highlight();
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.highlight.expire(now);
    }

    pub fn select_layout(&mut self, name: &str) {
        self.request_layout(&LayoutRef::new(name, None));
    }

    /// Unknown ids are ignored.
    pub fn select_variant(&mut self, id: &str, now: Instant) -> bool {
        if !self.layouts.select_variant(id) {
            return false;
        }
        if let Some(current) = self.layouts.current_ref() {
            self.settings.set_layout(&current);
        }
        self.new_prompt(now);
        true
    }

    /// Apply a linkable `layout-variant` reference if it differs from the
    /// current selection.
    pub fn apply_layout_ref(&mut self, layout: LayoutRef, now: Instant) {
        if self.layouts.current_ref().as_ref() == Some(&layout) {
            return;
        }
        let loaded = self
            .layouts
            .document()
            .is_some_and(|doc| doc.id == layout.layout);
        if loaded && !self.layout_loading {
            let variant = layout.variant.clone().or_else(|| {
                self.layouts
                    .document()
                    .and_then(|doc| doc.default_variant())
                    .map(|v| v.id.clone())
            });
            if let Some(variant) = variant {
                self.select_variant(&variant, now);
            }
        } else {
            self.request_layout(&layout);
        }
    }

    pub fn select_lesson(&mut self, name: &str) {
        self.request_lesson(name, 0);
    }

    pub fn select_level(&mut self, index: usize, now: Instant) {
        let level = self.lessons.select_level(index);
        self.settings.set_lesson_level(level);
        self.new_prompt(now);
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.layouts.set_shape(shape);
        self.settings.set_shape(shape);
        self.refresh_highlight();
    }

    pub fn toggle_hints(&mut self) {
        self.hints = !self.hints;
        self.settings.set_hints(self.hints);
    }

    pub fn open_selector(&mut self, kind: SelectorKind) {
        let (items, current): (Vec<SelectorItem>, Option<String>) = match kind {
            SelectorKind::Layout => (
                self.available_layouts
                    .iter()
                    .map(|name| SelectorItem::new(name.as_str(), name.as_str()))
                    .collect(),
                self.layouts.document().map(|d| d.id.clone()),
            ),
            SelectorKind::Variant => {
                let items = match self.layouts.document() {
                    Some(doc) if !self.layout_loading => doc
                        .variant_options()
                        .into_iter()
                        .map(|(id, name)| SelectorItem::new(id, name))
                        .collect(),
                    _ => Vec::new(),
                };
                (items, self.layouts.variant().map(str::to_string))
            }
            SelectorKind::Lesson => (
                self.available_lessons
                    .iter()
                    .map(|name| SelectorItem::new(name.as_str(), name.as_str()))
                    .collect(),
                self.lessons.lesson_id().map(str::to_string),
            ),
            SelectorKind::Level => {
                let items = if self.lesson_loading {
                    Vec::new()
                } else {
                    self.lessons
                        .level_labels()
                        .into_iter()
                        .enumerate()
                        .map(|(i, label)| SelectorItem::new(i.to_string(), label))
                        .collect()
                };
                (items, Some(self.lessons.level().to_string()))
            }
            SelectorKind::Shape => (
                Shape::ALL
                    .iter()
                    .map(|s| SelectorItem::new(s.as_str(), s.as_str()))
                    .collect(),
                Some(self.layouts.shape().as_str().to_string()),
            ),
        };
        self.selector = Some(Selector::new(kind, items, current.as_deref()));
    }

    /// Apply the highlighted entry of the open selector and close it.
    pub fn apply_selector(&mut self, now: Instant) {
        let Some(selector) = self.selector.take() else {
            return;
        };
        let Some(item) = selector.current() else {
            return;
        };
        let value = item.value.clone();
        match selector.kind {
            SelectorKind::Layout => self.select_layout(&value),
            SelectorKind::Variant => {
                self.select_variant(&value, now);
            }
            SelectorKind::Lesson => self.select_lesson(&value),
            SelectorKind::Level => {
                let index = level_from_setting(Some(&value));
                self.select_level(index, now);
            }
            SelectorKind::Shape => self.set_shape(Shape::from_setting(&value)),
        }
    }

    pub fn open_jump(&mut self) {
        let current = self
            .layouts
            .current_ref()
            .map(|r| r.to_string())
            .unwrap_or_default();
        let mut candidates = self.available_layouts.clone();
        if let Some(doc) = self.layouts.document() {
            candidates.extend(
                doc.variants
                    .iter()
                    .map(|v| LayoutRef::new(&doc.id, Some(&v.id)).to_string()),
            );
        }
        candidates.sort();
        candidates.dedup();
        self.jump = Some(LineInput::new(&current, candidates));
    }

    pub fn submit_jump(&mut self, now: Instant) {
        let Some(input) = self.jump.take() else {
            return;
        };
        match input.value().parse::<LayoutRef>() {
            Ok(layout) => self.apply_layout_ref(layout, now),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring layout reference");
                self.message = Some(e.to_string());
            }
        }
    }

    /// Header text: the linkable layout reference and lesson position.
    pub fn header_text(&self) -> String {
        let layout = if self.layout_loading {
            LOADING.to_string()
        } else {
            self.layouts
                .current_ref()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        let lesson = match self.lessons.document() {
            Some(_) if self.lesson_loading => LOADING.to_string(),
            Some(doc) => {
                let level = self
                    .lessons
                    .level_labels()
                    .get(self.lessons.level())
                    .cloned()
                    .unwrap_or_default();
                format!("{} [{}]", doc.title, level)
            }
            None => LOADING.to_string(),
        };
        format!(" #{layout} | {lesson} | {} ", self.layouts.shape())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::time::Duration;

    use rand::SeedableRng;

    use super::*;
    use crate::definitions::DefinitionSource;
    use crate::event::AppEvent;

    fn make_app() -> (App, mpsc::Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel();
        let loader = Loader::new(Arc::new(DefinitionSource::bundled_only()), tx);
        let app = App::new(
            Config::default(),
            SettingsStore::in_memory(),
            loader,
            SmallRng::seed_from_u64(7),
        );
        (app, rx)
    }

    /// Deliver `count` load completions to the app.
    fn pump(app: &mut App, rx: &mpsc::Receiver<AppEvent>, count: usize) {
        for _ in 0..count {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                AppEvent::Loaded(loaded) => app.handle_loaded(loaded, Instant::now()),
                _ => panic!("expected a load completion"),
            }
        }
    }

    fn started() -> (App, mpsc::Receiver<AppEvent>) {
        let (mut app, rx) = make_app();
        app.start(Startup::default());
        pump(&mut app, &rx, 2);
        (app, rx)
    }

    #[test]
    fn test_startup_loads_defaults_and_persists() {
        let (app, _rx) = started();
        assert_eq!(app.layouts.current_ref(), Some(LayoutRef::new("qwerty", Some("us"))));
        assert_eq!(app.lessons.lesson_id(), Some("english"));
        assert!(app.session.target().is_some());
        assert!(app.highlight.active_key().is_some());
        assert_eq!(app.settings.layout(), Some(LayoutRef::new("qwerty", Some("us"))));
        assert_eq!(app.settings.lesson_name().as_deref(), Some("english"));
        assert_eq!(app.settings.lesson_level(), 0);
        assert!(!app.layout_loading);
        assert!(!app.lesson_loading);
    }

    #[test]
    fn test_command_line_layout_wins_over_settings() {
        let (mut app, rx) = make_app();
        app.settings.set_layout(&LayoutRef::new("dvorak", None));
        app.start(Startup {
            layout: Some(LayoutRef::new("qwerty", Some("gb"))),
            ..Startup::default()
        });
        pump(&mut app, &rx, 2);
        assert_eq!(app.layouts.current_ref(), Some(LayoutRef::new("qwerty", Some("gb"))));
        assert_eq!(app.settings.layout(), Some(LayoutRef::new("qwerty", Some("gb"))));
    }

    #[test]
    fn test_stored_selections_restored() {
        let (mut app, rx) = make_app();
        app.settings.set_layout(&LayoutRef::new("dvorak", None));
        app.settings.set_lesson_name("numbers");
        app.settings.set_lesson_level(2);
        app.settings.set_hints(false);
        app.start(Startup::default());
        pump(&mut app, &rx, 2);
        assert_eq!(app.layouts.document().unwrap().id, "dvorak");
        assert_eq!(app.lessons.lesson_id(), Some("numbers"));
        assert_eq!(app.lessons.level(), 2);
        assert!(!app.hints);
    }

    #[test]
    fn test_stale_lesson_load_is_dropped() {
        let (mut app, rx) = started();
        app.select_lesson("numbers");
        app.select_lesson("english");
        pump(&mut app, &rx, 2);
        assert_eq!(app.lessons.lesson_id(), Some("english"));
        assert!(!app.lesson_loading);
    }

    #[test]
    fn test_variant_selection_persists_and_restarts_prompt() {
        let (mut app, _rx) = started();
        let now = Instant::now();
        app.type_char('\u{1}', now);
        assert!(app.select_variant("gb", now));
        assert_eq!(app.settings.layout(), Some(LayoutRef::new("qwerty", Some("gb"))));
        assert_eq!(app.session.typed_len(), 0);
        assert_eq!(app.session.mistakes(), 0);

        assert!(!app.select_variant("nope", now));
        assert_eq!(app.layouts.variant(), Some("gb"));
    }

    #[test]
    fn test_typing_the_prompt_moves_on() {
        let (mut app, _rx) = started();
        let t0 = Instant::now();
        let target: Vec<char> = app.session.target().unwrap().to_vec();
        let mut last = InputOutcome::default();
        for (i, &ch) in target.iter().enumerate() {
            assert_eq!(app.highlight.target(), Some(ch));
            last = app.type_char(ch, t0 + Duration::from_millis(100 * i as u64));
        }
        assert!(last.completed);
        assert_eq!(app.session.typed_len(), 0);
        assert!(app.session.target().is_some());
    }

    #[test]
    fn test_failed_layout_load_keeps_previous_layout() {
        let (mut app, rx) = started();
        app.select_layout("nosuchlayout");
        pump(&mut app, &rx, 1);
        assert_eq!(app.layouts.document().unwrap().id, "qwerty");
        assert!(app.layout_loading);
        assert!(app.message.is_some());

        app.open_selector(SelectorKind::Variant);
        assert!(app.selector.as_ref().unwrap().items.is_empty());
    }

    #[test]
    fn test_jump_to_variant_of_loaded_layout() {
        let (mut app, _rx) = started();
        app.open_jump();
        assert_eq!(app.jump.as_ref().unwrap().value(), "qwerty-us");
        app.jump = Some(LineInput::new("qwerty-gb", Vec::new()));
        app.submit_jump(Instant::now());
        assert_eq!(app.layouts.variant(), Some("gb"));
    }

    #[test]
    fn test_jump_to_other_layout_loads_it() {
        let (mut app, rx) = started();
        app.jump = Some(LineInput::new("colemak", Vec::new()));
        app.submit_jump(Instant::now());
        assert!(app.layout_loading);
        pump(&mut app, &rx, 1);
        assert_eq!(app.layouts.current_ref(), Some(LayoutRef::new("colemak", Some("us"))));
    }

    #[test]
    fn test_invalid_jump_reports_message() {
        let (mut app, _rx) = started();
        app.jump = Some(LineInput::new("../x", Vec::new()));
        app.submit_jump(Instant::now());
        assert!(app.message.is_some());
        assert_eq!(app.layouts.document().unwrap().id, "qwerty");
    }

    #[test]
    fn test_level_selector_applies_and_persists() {
        let (mut app, _rx) = started();
        app.open_selector(SelectorKind::Level);
        let selector = app.selector.as_mut().unwrap();
        selector.next();
        selector.next();
        app.apply_selector(Instant::now());
        assert_eq!(app.lessons.level(), 2);
        assert_eq!(app.settings.lesson_level(), 2);
        assert!(app.selector.is_none());
    }

    #[test]
    fn test_shape_and_hints_persist() {
        let (mut app, _rx) = started();
        app.set_shape(Shape::Pc105);
        assert_eq!(app.settings.shape(), Shape::Pc105);
        assert!(app.layouts.model().contains("LSGT"));
        app.toggle_hints();
        assert!(!app.settings.hints());
    }

    #[test]
    fn test_header_shows_layout_reference() {
        let (app, _rx) = started();
        assert!(app.header_text().contains("#qwerty-us"));
    }
}
