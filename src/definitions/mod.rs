pub mod cache;
pub mod loader;
pub mod source;

pub use loader::{LoadResult, Loader};
pub use source::DefinitionSource;
