use std::path::PathBuf;

/// Failures of structural config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Section names cannot be empty.
    #[error("section name is empty")]
    EmptySectionName,

    #[error("section not found: {0}")]
    SectionNotFound(String),

    #[error("value not found: {section}.{key}")]
    ValueNotFound { section: String, key: String },

    /// A write or clear needs a current section.
    #[error("no section selected")]
    NoSectionSelected,

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encrypted file or encrypted save without a key.
    #[error("no encryption key set")]
    MissingEncryptionKey,

    #[error("section stack is empty")]
    EmptySectionStack,

    #[error("cannot store an empty list")]
    EmptyList,

    #[error("load history is not enabled")]
    HistoryDisabled,

    /// The value has no spelling that reloads as the same value.
    #[error("value cannot be written to a config file: {section}.{key}")]
    Unrepresentable { section: String, key: String },

    /// Inheritance chain longer than the resolution limit.
    #[error("cyclic reference while resolving {section}.{key}")]
    CyclicReference { section: String, key: String },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
