//! Template source loading

use std::fmt;
use std::path::Path;

/// Source of raw template text
///
/// The default [`FsLoader`] reads from disk. Other implementations can serve
/// templates from memory or wrap the filesystem to observe reads.
pub trait TemplateLoader: Send + Sync {
    /// Read the full text of the template at `path`
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file is missing or unreadable.
    fn load(&self, path: &Path) -> std::io::Result<String>;
}

/// Reads templates straight from the filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl TemplateLoader for FsLoader {
    fn load(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

impl fmt::Debug for dyn TemplateLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TemplateLoader")
    }
}
