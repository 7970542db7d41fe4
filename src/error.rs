use thiserror::Error;

/// Which kind of definition file a load refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Layout,
    Lesson,
}

impl DefinitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DefinitionKind::Layout => "layout",
            DefinitionKind::Lesson => "lesson",
        }
    }

    pub fn subdir(self) -> &'static str {
        match self {
            DefinitionKind::Layout => "layouts",
            DefinitionKind::Lesson => "lessons",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DefinitionKind::Layout => ".xml",
            DefinitionKind::Lesson => ".ktouch.xml",
        }
    }

    /// Relative path of a definition inside a definitions root.
    pub fn relative_path(self, name: &str) -> String {
        format!("{}/{}{}", self.subdir(), name, self.extension())
    }
}

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("{} '{name}' not found", kind.as_str())]
    NotFound { kind: DefinitionKind, name: String },

    #[error("invalid definition name '{0}'")]
    InvalidName(String),

    #[error("malformed {} '{name}': {source}", kind.as_str())]
    Malformed {
        kind: DefinitionKind,
        name: String,
        #[source]
        source: quick_xml::DeError,
    },

    #[error("{} '{name}' defines no {what}", kind.as_str())]
    Empty {
        kind: DefinitionKind,
        name: String,
        what: &'static str,
    },

    #[error("i/o error reading definition: {0}")]
    Io(#[from] std::io::Error),
}

pub type DefinitionResult<T> = Result<T, DefinitionError>;
