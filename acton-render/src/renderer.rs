//! The caller-owned rendering context
//!
//! A [`Renderer`] owns its options, its template cache and its custom
//! functions. Options are fixed at construction, so nothing needs to guard
//! configuration reads during rendering. Clones share the same cache.

use minijinja::Value;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use crate::config::RenderOptions;
use crate::error::{RenderError, RenderResult};
use crate::template::{
    functions, ChainBuilder, CompiledUnit, DependencyChain, FsLoader, PathResolver,
    TemplateCache, TemplateLoader,
};

/// Shared state behind every clone of a [`Renderer`]
#[derive(Debug)]
pub(crate) struct RendererInner {
    options: RenderOptions,
    resolver: PathResolver,
    loader: Arc<dyn TemplateLoader>,
    cache: TemplateCache,
    functions: Vec<(String, Value)>,
}

/// Resolves, links, caches and executes view templates
///
/// # Example
///
/// ```rust,no_run
/// use acton_render::{config::RenderOptions, Renderer};
/// use serde_json::json;
///
/// # fn example() -> Result<(), acton_render::RenderError> {
/// let renderer = Renderer::new(RenderOptions::default());
/// let html = renderer.render_to_string("home", &json!({ "Name": "x" }))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Renderer {
    inner: Arc<RendererInner>,
}

impl Renderer {
    /// Create a renderer reading templates from the filesystem
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        Self::builder(options).build()
    }

    /// Start building a renderer with custom functions or a custom loader
    #[must_use]
    pub fn builder(options: RenderOptions) -> RendererBuilder {
        RendererBuilder {
            options,
            loader: Arc::new(FsLoader),
            functions: Vec::new(),
        }
    }

    pub(crate) fn upgrade(inner: &Weak<RendererInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    /// Options this renderer was built with
    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.inner.options
    }

    /// Whether compiled units are cached
    #[must_use]
    pub fn is_caching_enabled(&self) -> bool {
        self.inner.cache.is_enabled()
    }

    /// Number of cached compiled units
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.inner.cache.len()
    }

    /// Resolve a template name against the root directory
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Path`] if the name cannot be normalized.
    pub fn resolve(&self, name: &str) -> RenderResult<PathBuf> {
        self.inner.resolver.resolve(name)
    }

    /// Layout chain and partials for a template, without compiling it
    ///
    /// # Errors
    ///
    /// See [`ChainBuilder::build`].
    pub fn dependency_chain(&self, name: &str) -> RenderResult<DependencyChain> {
        let path = self.resolve(name)?;
        self.chain_builder().build(&path)
    }

    /// Compiled unit for `name`, from the cache when possible
    ///
    /// # Errors
    ///
    /// Any path, I/O, parse or cycle error met while building the unit.
    pub fn compiled(&self, name: &str) -> RenderResult<Arc<CompiledUnit>> {
        let path = self.resolve(name)?;
        self.inner.cache.get_or_build(&path, || self.compile(&path))
    }

    fn chain_builder(&self) -> ChainBuilder<'_> {
        ChainBuilder::new(&self.inner.resolver, self.inner.loader.as_ref())
    }

    fn compile(&self, path: &Path) -> RenderResult<CompiledUnit> {
        let chain = self.chain_builder().build(path)?;
        let host = Arc::downgrade(&self.inner);

        CompiledUnit::link(
            chain,
            self.inner.loader.as_ref(),
            self.inner.resolver.default_extension(),
            |env| functions::install(env, &host, &self.inner.functions),
        )
    }

    /// Render `name` against `model` into a string
    ///
    /// # Errors
    ///
    /// Any error from [`Renderer::compiled`] or [`CompiledUnit::execute`].
    pub fn render_to_string<S: Serialize + ?Sized>(
        &self,
        name: &str,
        model: &S,
    ) -> RenderResult<String> {
        let unit = self.compiled(name)?;
        unit.execute(model).inspect_err(|err| {
            tracing::debug!(template = name, error = %err, "template execution failed");
        })
    }

    /// Render `name` against `model` into `writer`
    ///
    /// Nothing is written unless rendering succeeds.
    ///
    /// # Errors
    ///
    /// Any render error, or [`RenderError::Io`] if writing fails.
    pub fn execute_html<W, S>(&self, writer: &mut W, name: &str, model: &S) -> RenderResult<()>
    where
        W: Write + ?Sized,
        S: Serialize + ?Sized,
    {
        let html = self.render_to_string(name, model)?;
        writer
            .write_all(html.as_bytes())
            .map_err(|e| RenderError::io(name, e))
    }
}

/// Builder for a [`Renderer`]
#[derive(Debug)]
pub struct RendererBuilder {
    options: RenderOptions,
    loader: Arc<dyn TemplateLoader>,
    functions: Vec<(String, Value)>,
}

impl RendererBuilder {
    /// Read templates through `loader` instead of the filesystem
    #[must_use]
    pub fn loader(mut self, loader: Arc<dyn TemplateLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Make `func` callable from templates as `name`
    ///
    /// Custom functions override built-ins of the same name. Build the value
    /// with [`Value::from_function`].
    #[must_use]
    pub fn function(mut self, name: impl Into<String>, func: Value) -> Self {
        let name = name.into();
        self.functions.retain(|(existing, _)| *existing != name);
        self.functions.push((name, func));
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Renderer {
        let resolver = PathResolver::new(
            self.options.root_directory.clone(),
            &self.options.default_extension,
        );
        let cache = TemplateCache::new(self.options.cache_enabled);

        tracing::debug!(
            root = %self.options.root_directory.display(),
            cache_enabled = self.options.cache_enabled,
            functions = self.functions.len(),
            "renderer created"
        );

        Renderer {
            inner: Arc::new(RendererInner {
                options: self.options,
                resolver,
                loader: self.loader,
                cache,
                functions: self.functions,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptionOverrides;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn renderer(root: &Path, cache: bool) -> Renderer {
        Renderer::new(RenderOptions::default().with_overrides(OptionOverrides {
            root_directory: Some(root.display().to_string()),
            cache_enabled: Some(cache),
            ..OptionOverrides::default()
        }))
    }

    #[test]
    fn test_render_simple_template() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("hello.html"), "Hello {{ name }}!").unwrap();

        let out = renderer(temp.path(), true)
            .render_to_string("hello", &json!({ "name": "World" }))
            .unwrap();
        assert_eq!(out, "Hello World!");
    }

    #[test]
    fn test_renderer_clones_share_cache() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.html"), "a").unwrap();

        let first = renderer(temp.path(), true);
        let second = first.clone();
        first.compiled("a").unwrap();

        assert_eq!(second.cache_len(), 1);
    }

    #[test]
    fn test_custom_function() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("f.html"), "{{ greet(name) }}").unwrap();

        let renderer = Renderer::builder(RenderOptions {
            root_directory: temp.path().to_path_buf(),
            ..RenderOptions::default()
        })
        .function(
            "greet",
            Value::from_function(|name: String| format!("hi {name}")),
        )
        .build();

        let out = renderer
            .render_to_string("f", &json!({ "name": "ann" }))
            .unwrap();
        assert_eq!(out, "hi ann");
    }

    #[test]
    fn test_nested_render_function() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("outer.html"), r#"<ul>{{ render("inner", item) }}</ul>"#)
            .unwrap();
        fs::write(temp.path().join("inner.html"), "<li>{{ label }}</li>").unwrap();

        let renderer = renderer(temp.path(), true);
        let out = renderer
            .render_to_string("outer", &json!({ "item": { "label": "one" } }))
            .unwrap();

        assert_eq!(out, "<ul><li>one</li></ul>");
        assert_eq!(renderer.cache_len(), 2);
    }

    #[test]
    fn test_render_each_sequence_and_map() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("list.html"), "{{ render_each(\"_row\", rows) }}").unwrap();
        fs::write(temp.path().join("_row.html"), "[{{ n }}]").unwrap();
        fs::write(temp.path().join("pairs.html"), "{{ render_each(\"_pair\", pairs) }}").unwrap();
        fs::write(temp.path().join("_pair.html"), "{{ key }}={{ value }};").unwrap();
        fs::write(temp.path().join("titled.html"), "{{ render_each(\"_titled\", pairs) }}").unwrap();
        fs::write(temp.path().join("_titled.html"), "{{ Key }}:{{ Value }} ").unwrap();

        let renderer = renderer(temp.path(), false);
        let rows = renderer
            .render_to_string("list", &json!({ "rows": [{ "n": 1 }, { "n": 2 }] }))
            .unwrap();
        assert_eq!(rows, "[1][2]");

        let pairs = renderer
            .render_to_string("pairs", &json!({ "pairs": { "a": 1, "b": 2 } }))
            .unwrap();
        assert_eq!(pairs, "a=1;b=2;");

        let titled = renderer
            .render_to_string("titled", &json!({ "pairs": { "a": 1, "b": 2 } }))
            .unwrap();
        assert_eq!(titled, "a:1 b:2 ");
    }

    #[test]
    fn test_unknown_nested_template_fails() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("outer.html"), r#"{{ render("partial_unknown") }}"#).unwrap();

        let err = renderer(temp.path(), true)
            .render_to_string("outer", &json!({}))
            .unwrap_err();
        assert!(matches!(err, RenderError::Execution { .. }));
        assert!(err.to_string().contains("partial_unknown.html"));
    }

    #[test]
    fn test_execute_html_writes_nothing_on_error() {
        let temp = TempDir::new().unwrap();
        let mut sink = Vec::new();

        let err = renderer(temp.path(), true)
            .execute_html(&mut sink, "missing", &json!({}))
            .unwrap_err();

        assert!(err.is_io());
        assert!(sink.is_empty());
    }
}
