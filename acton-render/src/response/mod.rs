//! Response helpers
//!
//! HTTP responders for every supported representation, plus writer-level
//! encoders that work without any HTTP machinery.
//!
//! | Helper | Content type |
//! |--------|--------------|
//! | [`Renderer::html`] | configured HTML type with charset |
//! | [`Renderer::json`] | `application/json` with charset |
//! | [`Renderer::xml`] | `text/xml` with charset |
//! | [`Renderer::plain`] | `text/plain` with charset |
//! | [`nothing`] | none, empty body |
//! | [`file`] | `application/octet-stream` |
//!
//! Every HTTP helper turns a [`RenderError`] into a
//! `500 Internal Server Error` with the error text as a plain-text body.
//!
//! # Examples
//!
//! ```rust,no_run
//! use acton_render::{config::RenderOptions, Renderer};
//! use axum::{extract::State, response::Response, routing::get, Router};
//! use serde_json::json;
//!
//! async fn home(State(renderer): State<Renderer>) -> Response {
//!     renderer.html("home", &json!({ "Title": "Welcome" }))
//! }
//!
//! let app: Router = Router::new()
//!     .route("/", get(home))
//!     .with_state(Renderer::new(RenderOptions::default()));
//! ```

pub mod codec;
mod file;

pub use file::file;

use axum::{
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::io::Write;

use crate::config::{CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT, CONTENT_TYPE_XML};
use crate::error::{RenderError, RenderResult};
use crate::renderer::Renderer;

/// Empty response with `status`
#[must_use]
pub fn nothing(status: StatusCode) -> Response {
    status.into_response()
}

impl Renderer {
    /// Render the view `name` as an HTML response
    #[must_use]
    pub fn html<S: Serialize + ?Sized>(&self, name: &str, model: &S) -> Response {
        self.html_with_headers(HeaderMap::new(), name, model)
    }

    /// Render the view `name` as an HTML response carrying `headers`
    ///
    /// The configured HTML content type is applied only when `headers` does
    /// not already contain one. On failure the response is a plain-text 500
    /// that still carries `headers`, minus `Content-Type` and
    /// `Content-Length`.
    #[must_use]
    pub fn html_with_headers<S: Serialize + ?Sized>(
        &self,
        mut headers: HeaderMap,
        name: &str,
        model: &S,
    ) -> Response {
        match self.render_to_string(name, model) {
            Ok(body) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    if let Ok(value) = HeaderValue::from_str(&self.options().html_content_type()) {
                        headers.insert(CONTENT_TYPE, value);
                    }
                }
                (headers, body).into_response()
            }
            Err(err) => {
                headers.remove(CONTENT_TYPE);
                headers.remove(CONTENT_LENGTH);
                let mut response = err.into_response();
                response.headers_mut().extend(headers);
                response
            }
        }
    }

    /// Serialize `model` as a JSON response
    #[must_use]
    pub fn json<S: Serialize + ?Sized>(&self, model: &S) -> Response {
        match self.marshal_json(model) {
            Ok(body) => self.typed(CONTENT_TYPE_JSON, body),
            Err(err) => err.into_response(),
        }
    }

    /// Serialize `model` as an XML response
    #[must_use]
    pub fn xml<S: Serialize + ?Sized>(&self, model: &S) -> Response {
        match self.marshal_xml(model) {
            Ok(body) => self.typed(CONTENT_TYPE_XML, body),
            Err(err) => err.into_response(),
        }
    }

    /// Plain-text response
    #[must_use]
    pub fn plain(&self, text: impl Into<String>) -> Response {
        self.typed(CONTENT_TYPE_TEXT, text.into())
    }

    fn typed(&self, media_type: &str, body: impl IntoResponse) -> Response {
        let content_type = self.options().content_type(media_type);
        match HeaderValue::from_str(&content_type) {
            Ok(value) => ([(CONTENT_TYPE, value)], body).into_response(),
            Err(_) => RenderError::Encode {
                format: "header",
                reason: format!("invalid content type '{content_type}'"),
            }
            .into_response(),
        }
    }

    /// JSON bytes of `model` using the configured indent, newline-terminated
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Encode`] if serialization fails.
    pub fn marshal_json<S: Serialize + ?Sized>(&self, model: &S) -> RenderResult<Vec<u8>> {
        codec::to_json(model, &self.options().json_indent)
    }

    /// XML text of `model` using the configured indent
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Encode`] if serialization fails.
    pub fn marshal_xml<S: Serialize + ?Sized>(&self, model: &S) -> RenderResult<String> {
        codec::to_xml(model, &self.options().xml_indent)
    }

    /// Write `model` as JSON to `writer`
    ///
    /// # Errors
    ///
    /// [`RenderError::Encode`] on serialization failure, [`RenderError::Io`]
    /// if the writer fails.
    pub fn encode_json<W, S>(&self, writer: &mut W, model: &S) -> RenderResult<()>
    where
        W: Write + ?Sized,
        S: Serialize + ?Sized,
    {
        let bytes = self.marshal_json(model)?;
        writer
            .write_all(&bytes)
            .map_err(|e| RenderError::io("<json writer>", e))
    }

    /// Write `model` as XML to `writer`
    ///
    /// # Errors
    ///
    /// [`RenderError::Encode`] on serialization failure, [`RenderError::Io`]
    /// if the writer fails.
    pub fn encode_xml<W, S>(&self, writer: &mut W, model: &S) -> RenderResult<()>
    where
        W: Write + ?Sized,
        S: Serialize + ?Sized,
    {
        let text = self.marshal_xml(model)?;
        writer
            .write_all(text.as_bytes())
            .map_err(|e| RenderError::io("<xml writer>", e))
    }
}
