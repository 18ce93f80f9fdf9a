//! View template pipeline
//!
//! A request for a view named `home` goes through these steps:
//!
//! 1. [`PathResolver`] turns `home` into `<root>/home.html`
//! 2. [`ChainBuilder`] reads the file, follows its `extends` marker up to the
//!    outermost layout and collects every `_partial` reference on the way
//! 3. [`CompiledUnit::link`] registers all of those files in one engine
//!    environment
//! 4. [`TemplateCache`] keeps the unit, keyed by resolved path
//! 5. [`CompiledUnit::execute`] renders the leaf, which pulls in its layouts
//!
//! # Marker syntax
//!
//! ```text
//! {{ extends "_layout" }}          {% extends "_layout" %}
//! {{ template "_header" . }}       {% include "_header" %}
//! ```
//!
//! Both spellings are accepted, with either quote style. Only partial names
//! starting with `_` are collected. `{% include "_x" ignore missing %}` makes
//! the partial optional.

pub mod cache;
pub mod chain;
pub(crate) mod functions;
pub mod loader;
pub mod resolver;
pub mod scanner;
pub mod unit;

pub use cache::TemplateCache;
pub use chain::{ChainBuilder, ChainLink, DependencyChain, PartialMap};
pub use loader::{FsLoader, TemplateLoader};
pub use resolver::PathResolver;
pub use scanner::ScanResult;
pub use unit::CompiledUnit;
