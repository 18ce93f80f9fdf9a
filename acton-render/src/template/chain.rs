//! Dependency chain construction
//!
//! Starting from a leaf template, follows `extends` markers up to the
//! outermost layout and collects every partial referenced along the way.
//!
//! Layout references resolve against the root directory; partial references
//! resolve against the directory of the file that mentions them, even when
//! that file is itself a layout.

use std::path::{Path, PathBuf};

use super::loader::TemplateLoader;
use super::resolver::PathResolver;
use super::scanner;
use crate::error::{RenderError, RenderResult};

/// One file in a layout chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    /// Name the engine knows the file by
    ///
    /// Ancestors use the reference their child wrote in its `extends`
    /// marker; the leaf uses its resolved path.
    pub name: String,
    /// Resolved file location
    pub path: PathBuf,
    /// Raw file text as read during chain construction
    pub source: String,
}

/// Partial name to resolved path, in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialMap {
    entries: Vec<(String, PathBuf)>,
    optional: Vec<String>,
}

impl PartialMap {
    /// Insert or overwrite `name`; an overwritten entry keeps its position
    pub fn insert(&mut self, name: String, path: PathBuf) {
        self.optional.retain(|existing| *existing != name);
        self.put(name, path);
    }

    /// Like [`insert`](Self::insert), but a missing file is skipped at link time
    pub fn insert_optional(&mut self, name: String, path: PathBuf) {
        if !self.optional.contains(&name) {
            self.optional.push(name.clone());
        }
        self.put(name, path);
    }

    fn put(&mut self, name: String, path: PathBuf) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = path,
            None => self.entries.push((name, path)),
        }
    }

    /// Merge `other` on top of `self`; `other` wins on name collisions
    pub fn extend(&mut self, other: Self) {
        for (name, path) in other.entries {
            if other.optional.contains(&name) {
                self.insert_optional(name, path);
            } else {
                self.insert(name, path);
            }
        }
    }

    /// Whether `name` was only referenced with `ignore missing`
    #[must_use]
    pub fn is_optional(&self, name: &str) -> bool {
        self.optional.iter().any(|existing| existing == name)
    }

    /// Resolved path for `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, path)| path.as_path())
    }

    /// Iterate over `(name, path)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    /// Number of partials
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no partials were found
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every file a template needs, in link order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyChain {
    /// `[outermost ancestor, ..., immediate parent, leaf]`
    pub layouts: Vec<ChainLink>,
    /// Partials discovered across the whole chain
    pub partials: PartialMap,
}

impl DependencyChain {
    /// The template that was requested
    #[must_use]
    pub fn leaf(&self) -> &ChainLink {
        // `walk` always pushes the current file last
        &self.layouts[self.layouts.len() - 1]
    }

    /// Resolved paths of the layout chain, outermost first
    #[must_use]
    pub fn paths(&self) -> Vec<&Path> {
        self.layouts.iter().map(|link| link.path.as_path()).collect()
    }
}

/// Walks layout and partial markers from a leaf template
pub struct ChainBuilder<'a> {
    resolver: &'a PathResolver,
    loader: &'a dyn TemplateLoader,
}

impl<'a> ChainBuilder<'a> {
    /// Create a builder reading through `loader`
    #[must_use]
    pub const fn new(resolver: &'a PathResolver, loader: &'a dyn TemplateLoader) -> Self {
        Self { resolver, loader }
    }

    /// Build the chain for an already-resolved leaf path
    ///
    /// # Errors
    ///
    /// - [`RenderError::Io`] if any file in the chain cannot be read
    /// - [`RenderError::Path`] if a marker names an unresolvable path
    /// - [`RenderError::CyclicLayout`] if an ancestor extends a descendant
    pub fn build(&self, leaf: &Path) -> RenderResult<DependencyChain> {
        let mut visited = Vec::new();
        let chain = self.walk(leaf, leaf.display().to_string(), &mut visited)?;

        tracing::trace!(
            leaf = %leaf.display(),
            layouts = chain.layouts.len(),
            partials = chain.partials.len(),
            "built dependency chain"
        );

        Ok(chain)
    }

    fn walk(
        &self,
        path: &Path,
        name: String,
        visited: &mut Vec<PathBuf>,
    ) -> RenderResult<DependencyChain> {
        if visited.iter().any(|seen| seen == path) {
            let mut chain = visited.clone();
            chain.push(path.to_path_buf());
            return Err(RenderError::CyclicLayout { chain });
        }
        visited.push(path.to_path_buf());

        let source = self
            .loader
            .load(path)
            .map_err(|e| RenderError::io(path, e))?;
        let scanned = scanner::scan(&source);

        let mut local = PartialMap::default();
        for partial in scanned.partials {
            let resolved = self.resolver.resolve_sibling(path, &partial)?;
            if scanned.optional_partials.contains(&partial) {
                local.insert_optional(partial, resolved);
            } else {
                local.insert(partial, resolved);
            }
        }

        let link = ChainLink {
            name,
            path: path.to_path_buf(),
            source,
        };

        match scanned.layout {
            Some(layout) => {
                let parent_path = self.resolver.resolve(&layout)?;
                let mut chain = self.walk(&parent_path, layout, visited)?;
                chain.layouts.push(link);
                chain.partials.extend(local);
                Ok(chain)
            }
            None => Ok(DependencyChain {
                layouts: vec![link],
                partials: local,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::loader::FsLoader;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn build(root: &Path, name: &str) -> RenderResult<DependencyChain> {
        let resolver = PathResolver::new(root, ".html");
        let leaf = resolver.resolve(name)?;
        ChainBuilder::new(&resolver, &FsLoader).build(&leaf)
    }

    #[test]
    fn test_leaf_without_layout_is_its_own_chain() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "home.html", "<p>{{ name }}</p>");

        let chain = build(temp.path(), "home").unwrap();
        assert_eq!(chain.paths(), vec![temp.path().join("home.html")]);
        assert!(chain.partials.is_empty());
        assert_eq!(chain.leaf().name, temp.path().join("home.html").display().to_string());
    }

    #[test]
    fn test_two_level_chain_is_ancestor_first() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.html", "A");
        write(temp.path(), "b.html", r#"{{ extends "a" }}B"#);

        let chain = build(temp.path(), "b").unwrap();
        assert_eq!(
            chain.paths(),
            vec![temp.path().join("a.html"), temp.path().join("b.html")]
        );
        assert_eq!(chain.layouts[0].name, "a");
    }

    #[test]
    fn test_three_level_chain() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.html", "A");
        write(temp.path(), "b.html", r#"{% extends "a" %}"#);
        write(temp.path(), "c.html", r#"{% extends "b" %}"#);

        let chain = build(temp.path(), "c").unwrap();
        let names: Vec<_> = chain
            .paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.html", "b.html", "c.html"]);
    }

    #[test]
    fn test_layouts_resolve_against_root() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "_layout.html", "root layout");
        write(temp.path(), "admin/_layout.html", "admin layout");
        write(temp.path(), "admin/users.html", r#"{{ extends "_layout" }}"#);

        let chain = build(temp.path(), "admin/users").unwrap();
        assert_eq!(chain.layouts[0].path, temp.path().join("_layout.html"));
    }

    #[test]
    fn test_partials_resolve_against_including_file() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "layouts/base.html",
            r#"{% include "_header" %}{% block body %}{% endblock %}"#,
        );
        write(temp.path(), "layouts/_header.html", "header");
        write(
            temp.path(),
            "pages/show.html",
            r#"{% extends "layouts/base" %}{% block body %}{{ template "_card" . }}{% endblock %}"#,
        );
        write(temp.path(), "pages/_card.html", "card");

        let chain = build(temp.path(), "pages/show").unwrap();
        assert_eq!(
            chain.partials.get("_header"),
            Some(temp.path().join("layouts/_header.html").as_path())
        );
        assert_eq!(
            chain.partials.get("_card"),
            Some(temp.path().join("pages/_card.html").as_path())
        );
    }

    #[test]
    fn test_child_partial_overrides_ancestor_partial() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "base.html", r#"{% include "_nav" %}{% include "_foot" %}"#);
        write(
            temp.path(),
            "section/page.html",
            r#"{% extends "base" %}{% include "_nav" %}"#,
        );

        let chain = build(temp.path(), "section/page").unwrap();
        let entries: Vec<_> = chain.partials.iter().map(|(n, p)| (n.to_string(), p.to_path_buf())).collect();
        assert_eq!(
            entries,
            vec![
                ("_nav".to_string(), temp.path().join("section/_nav.html")),
                ("_foot".to_string(), temp.path().join("_foot.html")),
            ]
        );
    }

    #[test]
    fn test_missing_leaf_is_io_error_with_path() {
        let temp = TempDir::new().unwrap();
        let err = build(temp.path(), "view_unknown").unwrap_err();
        assert!(err.is_io());
        assert!(err.to_string().contains("view_unknown.html"));
    }

    #[test]
    fn test_missing_layout_is_io_error() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "page.html", r#"{{ extends "gone" }}"#);

        let err = build(temp.path(), "page").unwrap_err();
        match err {
            RenderError::Io { path, .. } => assert_eq!(path, temp.path().join("gone.html")),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_is_detected() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.html", r#"{{ extends "b" }}"#);
        write(temp.path(), "b.html", r#"{{ extends "a" }}"#);

        let err = build(temp.path(), "a").unwrap_err();
        match err {
            RenderError::CyclicLayout { chain } => {
                assert_eq!(chain.len(), 3);
                assert_eq!(chain.first(), chain.last());
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_self_extension_is_a_cycle() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "loop.html", r#"{% extends "loop" %}"#);

        let err = build(temp.path(), "loop").unwrap_err();
        assert!(matches!(err, RenderError::CyclicLayout { .. }));
    }

    #[test]
    fn test_partial_map_keeps_position_on_overwrite() {
        let mut map = PartialMap::default();
        map.insert("_a".into(), PathBuf::from("/1"));
        map.insert("_b".into(), PathBuf::from("/2"));
        map.insert("_a".into(), PathBuf::from("/3"));

        let entries: Vec<_> = map.iter().collect();
        assert_eq!(
            entries,
            vec![("_a", Path::new("/3")), ("_b", Path::new("/2"))]
        );
    }

    #[test]
    fn test_ignore_missing_partials_are_optional() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "page.html",
            r#"{% include "_banner" ignore missing %}{% include '_nav' %}"#,
        );

        let chain = build(temp.path(), "page").unwrap();
        assert!(chain.partials.is_optional("_banner"));
        assert!(!chain.partials.is_optional("_nav"));
        assert_eq!(
            chain.partials.get("_banner"),
            Some(temp.path().join("_banner.html").as_path())
        );
    }

    #[test]
    fn test_required_reference_clears_optional_flag() {
        let mut map = PartialMap::default();
        map.insert_optional("_a".into(), PathBuf::from("/1"));
        assert!(map.is_optional("_a"));

        map.insert("_a".into(), PathBuf::from("/2"));
        assert!(!map.is_optional("_a"));
        assert_eq!(map.len(), 1);
    }
}
