//! JSON and XML encoding of view models

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::RenderResult;

/// Encode `model` as JSON followed by a single newline
///
/// An empty `indent` produces compact output; anything else is used verbatim
/// as the per-level indentation.
///
/// # Errors
///
/// Returns [`crate::RenderError::Encode`] if the model cannot be serialized.
pub fn to_json<S: Serialize + ?Sized>(model: &S, indent: &str) -> RenderResult<Vec<u8>> {
    let mut out = if indent.is_empty() {
        serde_json::to_vec(model)?
    } else {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        model.serialize(&mut serializer)?;
        buf
    };
    out.push(b'\n');
    Ok(out)
}

/// Encode `model` as XML rooted at its type name
///
/// `indent` is expected to repeat one character (`"  "`, `"\t"`); its first
/// character and length select the indentation. No trailing newline.
///
/// # Errors
///
/// Returns [`crate::RenderError::Encode`] if the model has no usable root
/// element name or a value cannot be represented.
pub fn to_xml<S: Serialize + ?Sized>(model: &S, indent: &str) -> RenderResult<String> {
    let mut out = String::new();
    let mut serializer = quick_xml::se::Serializer::new(&mut out);
    if let Some(ch) = indent.chars().next() {
        serializer.indent(ch, indent.chars().count());
    }
    model.serialize(serializer)?;
    Ok(out)
}
