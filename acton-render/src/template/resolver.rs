//! Template name to filesystem path resolution

use std::path::{Component, Path, PathBuf};

use crate::error::{RenderError, RenderResult};

/// Turns logical template names into absolute, normalized file paths
///
/// Layout references and render-call names resolve against the root
/// directory; partial references resolve against the including file's
/// directory via [`PathResolver::resolve_sibling`].
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    default_extension: String,
}

impl PathResolver {
    /// Create a resolver for `root` that appends `default_extension` to bare names
    ///
    /// A missing leading dot on the extension is added.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, default_extension: &str) -> Self {
        let default_extension = match default_extension.trim() {
            "" => String::new(),
            ext if ext.starts_with('.') => ext.to_string(),
            ext => format!(".{ext}"),
        };

        Self {
            root: root.into(),
            default_extension,
        }
    }

    /// Root directory names are resolved against
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extension appended to bare names, including the dot
    #[must_use]
    pub fn default_extension(&self) -> &str {
        &self.default_extension
    }

    /// Resolve `name` relative to the root directory
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Path`] if the name is empty, contains a NUL byte,
    /// or the working directory needed to make it absolute is unavailable.
    pub fn resolve(&self, name: &str) -> RenderResult<PathBuf> {
        self.resolve_in(&self.root, name)
    }

    /// Resolve `name` relative to the directory containing `base_file`
    ///
    /// # Errors
    ///
    /// Same as [`PathResolver::resolve`].
    pub fn resolve_sibling(&self, base_file: &Path, name: &str) -> RenderResult<PathBuf> {
        let dir = base_file.parent().unwrap_or_else(|| Path::new(""));
        self.resolve_in(dir, name)
    }

    fn resolve_in(&self, dir: &Path, name: &str) -> RenderResult<PathBuf> {
        if name.trim().is_empty() {
            return Err(RenderError::path(name, "template name is empty"));
        }
        if name.contains('\0') {
            return Err(RenderError::path(name, "template name contains a NUL byte"));
        }

        let joined = dir.join(self.with_extension(name));
        let absolute =
            std::path::absolute(&joined).map_err(|e| RenderError::path(name, e.to_string()))?;

        Ok(normalize(&absolute))
    }

    fn with_extension(&self, name: &str) -> String {
        if Path::new(name).extension().is_some() {
            name.to_string()
        } else {
            format!("{name}{}", self.default_extension)
        }
    }
}

/// Fold `.` and `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
