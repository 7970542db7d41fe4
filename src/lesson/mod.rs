pub mod document;
pub mod registry;

pub use document::{LessonDocument, Level};
pub use registry::LessonRegistry;
