// Application state module
// Shared, read-only view of the configuration handed to every request

use std::path::PathBuf;

use super::types::Config;

/// Application state
///
/// Nothing in here changes after startup; requests only read it.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    /// Canonical document root for static files
    pub document_root: PathBuf,
}

impl AppState {
    /// Create `AppState`, resolving the document root from the configuration
    pub fn new(config: Config) -> std::io::Result<Self> {
        let document_root = config.document_root()?;
        Ok(Self {
            config,
            document_root,
        })
    }

    /// Create `AppState` serving from an explicit directory
    #[cfg(test)]
    pub fn with_root(config: Config, root: &std::path::Path) -> Self {
        Self {
            config,
            document_root: root.canonicalize().expect("test root must exist"),
        }
    }
}
