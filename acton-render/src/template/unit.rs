//! Compiled units: linked templates ready for execution

use minijinja::{default_auto_escape_callback, Environment, UndefinedBehavior};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::chain::{DependencyChain, PartialMap};
use super::loader::TemplateLoader;
use super::scanner::normalize_markers;
use crate::error::{RenderError, RenderResult};

/// A template linked with its layouts and partials
///
/// Immutable once built. The cache hands out shared references, so a unit
/// is never modified in place; a fresh build replaces it wholesale.
#[derive(Debug)]
pub struct CompiledUnit {
    env: Environment<'static>,
    entry: String,
    chain: Vec<PathBuf>,
    partials: PartialMap,
}

impl CompiledUnit {
    /// Parse and link every file of `chain` into one environment
    ///
    /// Partials are registered first, then the layout chain outermost to
    /// leaf, so a chain member shadows a partial of the same name.
    /// `configure` runs on the fresh environment before any template is
    /// added and is where functions and globals are installed.
    ///
    /// # Errors
    ///
    /// - [`RenderError::Io`] if a partial cannot be read; an absent
    ///   `ignore missing` partial is skipped instead
    /// - [`RenderError::Parse`] if any file has invalid syntax
    pub fn link<F>(
        chain: DependencyChain,
        loader: &dyn TemplateLoader,
        default_extension: &str,
        configure: F,
    ) -> RenderResult<Self>
    where
        F: FnOnce(&mut Environment<'static>),
    {
        let mut env = base_environment(default_extension);
        configure(&mut env);

        for (name, path) in chain.partials.iter() {
            let source = match loader.load(path) {
                Ok(source) => source,
                Err(e) if e.kind() == ErrorKind::NotFound && chain.partials.is_optional(name) => {
                    tracing::trace!(
                        partial = name,
                        path = %path.display(),
                        "skipping missing optional partial"
                    );
                    continue;
                }
                Err(e) => return Err(RenderError::io(path, e)),
            };
            add_template(&mut env, name.to_string(), &source)?;
        }

        let entry = chain.leaf().name.clone();
        let paths = chain.layouts.iter().map(|link| link.path.clone()).collect();

        for link in chain.layouts {
            add_template(&mut env, link.name, &link.source)?;
        }

        tracing::debug!(entry = %entry, partials = chain.partials.len(), "linked template");

        Ok(Self {
            env,
            entry,
            chain: paths,
            partials: chain.partials,
        })
    }

    /// Build a unit from a single in-memory template with no layout or partials
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Parse`] if `source` has invalid syntax.
    pub fn from_source(name: &str, source: &str) -> RenderResult<Self> {
        let mut env = base_environment(".html");
        add_template(&mut env, name.to_string(), source)?;

        Ok(Self {
            env,
            entry: name.to_string(),
            chain: Vec::new(),
            partials: PartialMap::default(),
        })
    }

    /// Name of the template executed first
    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Layout chain paths, outermost first
    #[must_use]
    pub fn chain(&self) -> &[PathBuf] {
        &self.chain
    }

    /// Partials linked into this unit
    #[must_use]
    pub const fn partials(&self) -> &PartialMap {
        &self.partials
    }

    /// Render the entry point against `model`
    ///
    /// The output is fully buffered; nothing is produced on failure.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Execution`] when the engine fails, for example
    /// on a field the model does not have.
    pub fn execute<S: Serialize + ?Sized>(&self, model: &S) -> RenderResult<String> {
        self.env
            .get_template(&self.entry)
            .and_then(|tmpl| tmpl.render(model))
            .map_err(|source| RenderError::Execution {
                name: self.entry.clone(),
                source,
            })
    }
}

fn base_environment(default_extension: &str) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    // Layout and partial names are usually written without an extension;
    // pick escaping as if the default extension were present.
    let extension = default_extension.to_string();
    env.set_auto_escape_callback(move |name| {
        if Path::new(name).extension().is_some() {
            default_auto_escape_callback(name)
        } else {
            default_auto_escape_callback(&format!("{name}{extension}"))
        }
    });

    env
}

fn add_template(env: &mut Environment<'static>, name: String, source: &str) -> RenderResult<()> {
    env.add_template_owned(name.clone(), normalize_markers(source))
        .map_err(|source| RenderError::Parse { name, source })
}
