//! Template functions available in every compiled unit
//!
//! | Function | Usage |
//! |----------|-------|
//! | `render` | `{{ render("cards/_card", item) }}` |
//! | `render_each` | `{{ render_each("rows/_row", items) }}` |
//! | `format_time` | `{{ format_time(post.created_at, "%d %B %Y %H:%M") }}` |
//! | `format_float` | `{{ format_float(price, 2) }}` |
//! | `format_int` | `{{ format_int(flags, 2) }}` |
//!
//! `render_each` over a map renders each entry with `key` and `value`
//! (also spelled `Key` and `Value`).
//!
//! `render` and `render_each` go through the owning renderer, so nested
//! templates get their own layouts, partials and cache entries.

use chrono::{DateTime, NaiveDateTime};
use minijinja::{context, value::ValueKind, Environment, Error, ErrorKind, Value};
use std::fmt::{self, Write as _};
use std::sync::Weak;

use crate::error::RenderError;
use crate::renderer::{Renderer, RendererInner};

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Register built-ins, then the renderer's custom functions on top
pub fn install(
    env: &mut Environment<'static>,
    host: &Weak<RendererInner>,
    custom: &[(String, Value)],
) {
    env.add_function("format_time", format_time);
    env.add_function("format_float", format_float);
    env.add_function("format_int", format_int);

    let renderer = host.clone();
    env.add_function("render", move |name: String, model: Option<Value>| {
        render(&renderer, &name, &model.unwrap_or_else(|| context! {}))
    });

    let renderer = host.clone();
    env.add_function("render_each", move |name: String, collection: Value| {
        render_each(&renderer, &name, &collection)
    });

    for (name, func) in custom {
        env.add_global(name.clone(), func.clone());
    }
}

fn host(renderer: &Weak<RendererInner>) -> Result<Renderer, Error> {
    Renderer::upgrade(renderer).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            "renderer was dropped while a template was executing",
        )
    })
}

fn engine_error(err: RenderError) -> Error {
    Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
}

fn render(renderer: &Weak<RendererInner>, name: &str, model: &Value) -> Result<Value, Error> {
    let html = host(renderer)?
        .render_to_string(name, model)
        .map_err(engine_error)?;
    Ok(Value::from_safe_string(html))
}

fn render_each(
    renderer: &Weak<RendererInner>,
    name: &str,
    collection: &Value,
) -> Result<Value, Error> {
    let renderer = host(renderer)?;
    let mut html = String::new();

    match collection.kind() {
        ValueKind::Undefined | ValueKind::None => {}
        ValueKind::Map => {
            for key in collection.try_iter()? {
                let value = collection.get_item(&key)?;
                let entry = context! {
                    Key => key.clone(),
                    Value => value.clone(),
                    key => key,
                    value => value,
                };
                html.push_str(&renderer.render_to_string(name, &entry).map_err(engine_error)?);
            }
        }
        ValueKind::String => {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                "render_each expects a sequence or a map, got a string",
            ));
        }
        _ => {
            for item in collection.try_iter()? {
                html.push_str(&renderer.render_to_string(name, &item).map_err(engine_error)?);
            }
        }
    }

    Ok(Value::from_safe_string(html))
}

/// Format an RFC 3339 string, a `YYYY-MM-DD HH:MM:SS` string or a unix
/// timestamp with a strftime pattern
fn format_time(value: Value, format: &str) -> Result<String, Error> {
    if let Some(text) = value.as_str() {
        if let Ok(time) = DateTime::parse_from_rfc3339(text) {
            return write_formatted(time.format(format));
        }
        for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(time) = NaiveDateTime::parse_from_str(text, pattern) {
                return write_formatted(time.format(format));
            }
        }
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("format_time: cannot parse '{text}' as a time"),
        ));
    }

    let seconds = i64::try_from(value)?;
    let time = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("format_time: timestamp {seconds} is out of range"),
        )
    })?;
    write_formatted(time.format(format))
}

fn write_formatted(formatted: impl fmt::Display) -> Result<String, Error> {
    let mut out = String::new();
    write!(out, "{formatted}").map_err(|_| {
        Error::new(
            ErrorKind::InvalidOperation,
            "format_time: invalid format string",
        )
    })?;
    Ok(out)
}

/// Fixed-point decimal with `precision` digits after the point
fn format_float(value: f64, precision: usize) -> String {
    format!("{value:.precision$}")
}

/// Integer in any radix from 2 to 36, lowercase digits
fn format_int(value: i64, base: u32) -> Result<String, Error> {
    if !(2..=36).contains(&base) {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("format_int: base {base} is outside 2..=36"),
        ));
    }

    let mut n = value.unsigned_abs();
    if n == 0 {
        return Ok("0".to_string());
    }

    let base = u64::from(base);
    let mut digits = Vec::new();
    while n > 0 {
        // n % base < 36, so the index is always in bounds
        #[allow(clippy::cast_possible_truncation)]
        digits.push(DIGITS[(n % base) as usize]);
        n /= base;
    }
    if value < 0 {
        digits.push(b'-');
    }
    digits.reverse();

    Ok(String::from_utf8_lossy(&digits).into_owned())
}
