//! Static file responses with single-range and conditional request support

use axum::{
    body::Body,
    http::{
        header::{
            ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, IF_MODIFIED_SINCE,
            LAST_MODIFIED, RANGE,
        },
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use httpdate::HttpDate;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;

use crate::config::CONTENT_TYPE_BINARY;
use crate::error::RenderError;

/// Serve the file at `path` as `application/octet-stream`
///
/// Missing files and directories produce `404 Not Found`. A `Range` header
/// with a single byte range yields `206 Partial Content`; an
/// `If-Modified-Since` header that is not older than the file yields
/// `304 Not Modified`.
///
/// # Examples
///
/// ```rust,no_run
/// use acton_render::response::file;
/// use axum::{http::HeaderMap, routing::get, Router};
///
/// let app: Router = Router::new().route(
///     "/download",
///     get(|headers: HeaderMap| async move { file("assets/report.bin", &headers).await }),
/// );
/// ```
pub async fn file(path: impl AsRef<Path>, request_headers: &HeaderMap) -> Response {
    let path = path.as_ref();

    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return not_found(path),
        Err(e) if e.kind() == ErrorKind::NotFound => return not_found(path),
        Err(e) => return RenderError::io(path, e).into_response(),
    };

    let modified = metadata.modified().ok().map(HttpDate::from);
    if let (Some(modified), Some(since)) = (modified, if_modified_since(request_headers)) {
        if SystemTime::from(modified) <= SystemTime::from(since) {
            return StatusCode::NOT_MODIFIED.into_response();
        }
    }

    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) => return RenderError::io(path, e).into_response(),
    };

    tracing::debug!(path = %path.display(), bytes = data.len(), "serving file");

    let Some(range) = request_headers.get(RANGE) else {
        return build_file_response(data, modified, None);
    };

    match byte_range(range, data.len()) {
        Ok((start, end)) => {
            let content_range = format!("bytes {start}-{end}/{}", data.len());
            build_file_response(data[start..=end].to_vec(), modified, Some(&content_range))
        }
        Err(err) => err.into_response(),
    }
}

fn not_found(path: &Path) -> Response {
    tracing::debug!(path = %path.display(), "file not found");
    StatusCode::NOT_FOUND.into_response()
}

fn if_modified_since(headers: &HeaderMap) -> Option<HttpDate> {
    headers
        .get(IF_MODIFIED_SINCE)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Parse a single `bytes=` range into inclusive offsets
fn byte_range(header: &HeaderValue, file_size: usize) -> Result<(usize, usize), RangeError> {
    let ranges = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("bytes="))
        .ok_or(RangeError::Invalid)?;

    if ranges.contains(',') {
        return Err(RangeError::Invalid);
    }

    let (start_str, end_str) = ranges.split_once('-').ok_or(RangeError::Invalid)?;
    let parse = |s: &str| s.trim().parse::<usize>().map_err(|_| RangeError::Invalid);

    if file_size == 0 {
        return Err(RangeError::NotSatisfiable(file_size));
    }
    let last = file_size - 1;

    let (start, end) = if start_str.trim().is_empty() {
        // "-500": the final 500 bytes
        let suffix = parse(end_str)?;
        if suffix == 0 {
            return Err(RangeError::NotSatisfiable(file_size));
        }
        (file_size.saturating_sub(suffix), last)
    } else if end_str.trim().is_empty() {
        (parse(start_str)?, last)
    } else {
        (parse(start_str)?, parse(end_str)?.min(last))
    };

    if start > end || start >= file_size {
        return Err(RangeError::NotSatisfiable(file_size));
    }

    Ok((start, end))
}

fn build_file_response(
    data: Vec<u8>,
    modified: Option<HttpDate>,
    content_range: Option<&str>,
) -> Response {
    let status = if content_range.is_some() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut response = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, CONTENT_TYPE_BINARY)
        .header(CONTENT_LENGTH, data.len())
        .header(ACCEPT_RANGES, "bytes");

    if let Some(content_range) = content_range {
        response = response.header(CONTENT_RANGE, content_range);
    }
    if let Some(modified) = modified {
        response = response.header(LAST_MODIFIED, modified.to_string());
    }

    response
        .body(Body::from(data))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

#[derive(Debug, Error)]
enum RangeError {
    #[error("invalid range request")]
    Invalid,
    #[error("range not satisfiable (file size: {0})")]
    NotSatisfiable(usize),
}

impl IntoResponse for RangeError {
    fn into_response(self) -> Response {
        match self {
            Self::Invalid => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
            Self::NotSatisfiable(size) => Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(CONTENT_RANGE, format!("bytes */{size}"))
                .body(Body::from(self.to_string()))
                .unwrap_or_else(|_| Response::new(Body::empty())),
        }
    }
}
