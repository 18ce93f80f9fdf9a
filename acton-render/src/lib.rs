//! acton-render: layout-aware view rendering for axum services
//!
//! Templates live under one root directory. A view declares its layout with
//! an `extends` marker and pulls in `_partials` by name; the renderer follows
//! those markers, links every file into one compiled unit, caches it by path
//! and renders it against any `serde::Serialize` model.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use acton_render::prelude::*;
//! use axum::{extract::State, response::Response, routing::get, Router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     acton_render::observability::init()?;
//!
//!     let options = RenderOptions::load_for_service("my-app")?;
//!     let app = Router::new()
//!         .route("/", get(index))
//!         .route("/api", get(api))
//!         .with_state(Renderer::new(options));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//!
//! async fn index(State(renderer): State<Renderer>) -> Response {
//!     // views/home.html: {{ extends "_layout" }}{% block content %}...{% endblock %}
//!     renderer.html("home", &json!({ "Title": "Hello" }))
//! }
//!
//! async fn api(State(renderer): State<Renderer>) -> Response {
//!     renderer.json(&json!({ "ok": true }))
//! }
//! ```
//!
//! # Configuration
//!
//! See [`config::RenderOptions`]. Every option has a default, and
//! `ACTON_RENDER_*` environment variables override file settings.

// Lint configuration is handled at the workspace level in Cargo.toml

pub mod config;
pub mod error;
pub mod observability;
pub mod renderer;
pub mod response;
pub mod template;

pub use error::{RenderError, RenderResult};
pub use renderer::{Renderer, RendererBuilder};

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! ```rust
    //! use acton_render::prelude::*;
    //! ```

    pub use crate::config::{OptionOverrides, RenderOptions};
    pub use crate::error::{RenderError, RenderResult};
    pub use crate::renderer::{Renderer, RendererBuilder};
    pub use crate::response::{file, nothing};
    pub use crate::template::{CompiledUnit, TemplateLoader};

    pub use axum;
    pub use minijinja::Value;

    // Convenience for view models
    pub use serde_json::json;
}
