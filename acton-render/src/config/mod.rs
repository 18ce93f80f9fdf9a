//! Configuration management for acton-render
//!
//! Render options are fixed when a [`Renderer`](crate::Renderer) is built and
//! read-only afterwards. Every field has a default; an explicitly supplied
//! non-blank value overrides its default independently of the others.
//!
//! Options can be loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `ACTON_RENDER_` prefix)
//! 2. `./config.toml` (development)
//! 3. `/etc/acton-render/{service}/config.toml` (system config)
//! 4. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! # config.toml
//! root_directory = "views"
//! default_extension = ".html"
//! default_charset = "UTF-8"
//! json_indent = "  "
//! cache_enabled = true
//! ```
//!
//! # Usage
//!
//! ```rust
//! use acton_render::config::{OptionOverrides, RenderOptions};
//!
//! let options = RenderOptions::default().with_overrides(OptionOverrides {
//!     root_directory: Some("templates".into()),
//!     default_extension: Some("   ".into()), // blank: default kept
//!     ..OptionOverrides::default()
//! });
//!
//! assert_eq!(options.root_directory.to_str(), Some("templates"));
//! assert_eq!(options.default_extension, ".html");
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `Content-Type` for plain text
pub const CONTENT_TYPE_TEXT: &str = "text/plain";
/// `Content-Type` for HTML
pub const CONTENT_TYPE_HTML: &str = "text/html";
/// `Content-Type` for XHTML
pub const CONTENT_TYPE_XHTML: &str = "application/xhtml+xml";
/// `Content-Type` for XML
pub const CONTENT_TYPE_XML: &str = "text/xml";
/// `Content-Type` for JSON
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// `Content-Type` for binary files
pub const CONTENT_TYPE_BINARY: &str = "application/octet-stream";
/// Default charset
pub const CHARSET_UTF8: &str = "UTF-8";

const ENV_PREFIX: &str = "ACTON_RENDER_";

/// View rendering options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Directory that template names and layout references resolve against
    pub root_directory: PathBuf,

    /// Conventional name of the site layout
    ///
    /// Informational only: nothing applies it implicitly. Each view names
    /// its layout with an `extends` marker.
    pub default_layout: String,

    /// Extension appended to template names that carry none
    pub default_extension: String,

    /// Media type used for HTML responses
    pub default_html_content_type: String,

    /// Charset appended to every textual `Content-Type`
    pub default_charset: String,

    /// Indentation for JSON output; empty means compact
    pub json_indent: String,

    /// Indentation for XML output; empty means compact
    pub xml_indent: String,

    /// Keep compiled templates for the renderer's lifetime
    pub cache_enabled: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            root_directory: PathBuf::from("views"),
            default_layout: "_layout".to_string(),
            default_extension: ".html".to_string(),
            default_html_content_type: CONTENT_TYPE_HTML.to_string(),
            default_charset: CHARSET_UTF8.to_string(),
            json_indent: String::new(),
            xml_indent: String::new(),
            cache_enabled: true,
        }
    }
}

/// Partial option set; `None` and blank strings leave the current value alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionOverrides {
    /// See [`RenderOptions::root_directory`]
    pub root_directory: Option<String>,
    /// See [`RenderOptions::default_layout`]
    pub default_layout: Option<String>,
    /// See [`RenderOptions::default_extension`]
    pub default_extension: Option<String>,
    /// See [`RenderOptions::default_html_content_type`]
    pub default_html_content_type: Option<String>,
    /// See [`RenderOptions::default_charset`]
    pub default_charset: Option<String>,
    /// See [`RenderOptions::json_indent`]
    pub json_indent: Option<String>,
    /// See [`RenderOptions::xml_indent`]
    pub xml_indent: Option<String>,
    /// See [`RenderOptions::cache_enabled`]
    pub cache_enabled: Option<bool>,
}

impl RenderOptions {
    /// Apply every non-blank override on top of `self`
    #[must_use]
    pub fn with_overrides(mut self, overrides: OptionOverrides) -> Self {
        if let Some(root) = non_blank(overrides.root_directory) {
            self.root_directory = PathBuf::from(root);
        }
        try_set(overrides.default_layout, &mut self.default_layout);
        try_set(overrides.default_extension, &mut self.default_extension);
        try_set(
            overrides.default_html_content_type,
            &mut self.default_html_content_type,
        );
        try_set(overrides.default_charset, &mut self.default_charset);
        // Indents are whitespace by nature; only an empty string means "unset".
        if let Some(indent) = overrides.json_indent.filter(|s| !s.is_empty()) {
            self.json_indent = indent;
        }
        if let Some(indent) = overrides.xml_indent.filter(|s| !s.is_empty()) {
            self.xml_indent = indent;
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache_enabled = enabled;
        }
        self
    }

    /// Full `Content-Type` value for HTML responses
    #[must_use]
    pub fn html_content_type(&self) -> String {
        format!(
            "{}; charset={}",
            self.default_html_content_type, self.default_charset
        )
    }

    /// `Content-Type` value for a fixed media type with the configured charset
    #[must_use]
    pub fn content_type(&self, media_type: &str) -> String {
        format!("{media_type}; charset={}", self.default_charset)
    }

    /// Load options from a specific TOML file, then `ACTON_RENDER_*` variables
    ///
    /// # Errors
    ///
    /// Returns an error if the file or the environment holds values of the
    /// wrong type.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use acton_render::config::RenderOptions;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let options = RenderOptions::load_from("./config/production.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let overrides: OptionOverrides = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;

        Ok(Self::default().with_overrides(overrides))
    }

    /// Load options for a service from the standard locations
    ///
    /// Precedence, lowest first: defaults, `/etc/acton-render/{service_name}/config.toml`,
    /// `./config.toml`, `ACTON_RENDER_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any source holds values of the wrong type.
    pub fn load_for_service(service_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new();

        let system_config = PathBuf::from("/etc/acton-render")
            .join(service_name)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let overrides: OptionOverrides = figment.extract()?;
        Ok(Self::default().with_overrides(overrides))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn try_set(value: Option<String>, option: &mut String) {
    if let Some(s) = non_blank(value) {
        *option = s;
    }
}
