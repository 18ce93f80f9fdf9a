//! Layout and partial marker scanning
//!
//! Markers are found by pattern matching over the raw template text rather
//! than by parsing the template language. A marker inside a comment or a
//! string literal is matched like any other.
//!
//! Two spellings are accepted for each marker:
//!
//! | Marker  | Expression form             | Statement form              |
//! |---------|-----------------------------|-----------------------------|
//! | layout  | `{{ extends "base" }}`      | `{% extends "base" %}`      |
//! | partial | `{{ template "_nav" . }}`   | `{% include "_nav" %}`      |
//!
//! Targets may be single- or double-quoted. Whitespace control dashes
//! (`{%-`, `-%}`) are kept, and a partial may carry `ignore missing`, in
//! which case an absent file is skipped instead of failing the build.
//!
//! Partial targets must start with `_` (after any `./` or `../` segments).
//! [`normalize_markers`] rewrites every marker into the statement form the
//! engine understands. Only the first layout marker counts; later ones are
//! dropped.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// 1: opening dash, 2/3: double/single quoted target, 4: closing dash
static LAYOUT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{[{%](-?)\s*extends\s+(?:"([^"]+)"|'([^']+)')\s*(-?)[}%]\}"#)
        .expect("Invalid regex")
});

// 1: opening dash, 2/3: double/single quoted target, 4: `ignore missing`,
// 5: closing dash
static PARTIAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\{[{%](-?)\s*(?:template|include)\s+(?:"((?:\.{1,2}/)*_[^"]+)"|'((?:\.{1,2}/)*_[^']+)')(\s+ignore\s+missing)?(?:\s+\.|\s+with\s+context)?\s*(-?)[}%]\}"#,
    )
    .expect("Invalid regex")
});

/// Markers found in one template file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Parent layout reference, first marker wins
    pub layout: Option<String>,
    /// Partial references in order of first appearance, without duplicates
    pub partials: Vec<String>,
    /// Members of `partials` whose every reference says `ignore missing`
    pub optional_partials: Vec<String>,
}

/// Extract the layout reference and partial references from `source`
#[must_use]
pub fn scan(source: &str) -> ScanResult {
    ScanResult {
        layout: layout_ref(source),
        partials: partial_refs(source),
        optional_partials: optional_partial_refs(source),
    }
}

/// First `extends` reference in `source`, if any
#[must_use]
pub fn layout_ref(source: &str) -> Option<String> {
    LAYOUT_PATTERN
        .captures(source)
        .and_then(|caps| target(&caps, 2, 3).map(str::to_string))
        .filter(|name| !name.is_empty())
}

/// Every partial reference in `source`
#[must_use]
pub fn partial_refs(source: &str) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    for caps in PARTIAL_PATTERN.captures_iter(source) {
        if let Some(name) = target(&caps, 2, 3) {
            if !refs.iter().any(|seen| seen == name) {
                refs.push(name.to_string());
            }
        }
    }
    refs
}

/// Partial references that only ever appear with `ignore missing`
#[must_use]
pub fn optional_partial_refs(source: &str) -> Vec<String> {
    let mut optional: Vec<String> = Vec::new();
    let mut required: Vec<String> = Vec::new();
    for caps in PARTIAL_PATTERN.captures_iter(source) {
        let Some(name) = target(&caps, 2, 3) else {
            continue;
        };
        if caps.get(4).is_none() {
            if !required.iter().any(|seen| seen == name) {
                required.push(name.to_string());
            }
        } else if !optional.iter().any(|seen| seen == name) {
            optional.push(name.to_string());
        }
    }
    optional.retain(|name| !required.contains(name));
    optional
}

/// Rewrite layout and partial markers into engine statement syntax
///
/// Reference names are trimmed so they match the names the linker
/// registers files under. Quote style, whitespace control and
/// `ignore missing` survive the rewrite.
#[must_use]
pub fn normalize_markers(source: &str) -> String {
    let mut extended = false;
    let source = LAYOUT_PATTERN.replace_all(source, |caps: &Captures<'_>| {
        if extended {
            return String::new();
        }
        extended = true;
        format!(
            "{{%{} extends {} {}%}}",
            group(caps, 1),
            quoted(caps, 2, 3),
            group(caps, 4)
        )
    });
    PARTIAL_PATTERN
        .replace_all(&source, |caps: &Captures<'_>| {
            let ignore = if caps.get(4).is_some() {
                " ignore missing"
            } else {
                ""
            };
            format!(
                "{{%{} include {}{} {}%}}",
                group(caps, 1),
                quoted(caps, 2, 3),
                ignore,
                group(caps, 5)
            )
        })
        .into_owned()
}

fn target<'h>(caps: &Captures<'h>, double: usize, single: usize) -> Option<&'h str> {
    caps.get(double)
        .or_else(|| caps.get(single))
        .map(|m| m.as_str().trim())
}

fn quoted(caps: &Captures<'_>, double: usize, single: usize) -> String {
    match (caps.get(double), caps.get(single)) {
        (Some(name), _) => format!("\"{}\"", name.as_str().trim()),
        (None, Some(name)) => format!("'{}'", name.as_str().trim()),
        (None, None) => String::new(),
    }
}

fn group<'h>(caps: &Captures<'h>, index: usize) -> &'h str {
    caps.get(index).map_or("", |m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_expression_form() {
        let source = format!("{{{{ extends {:?}}}}} ", "desktop/layout");
        assert_eq!(layout_ref(&source).as_deref(), Some("desktop/layout"));
    }

    #[test]
    fn test_layout_statement_form() {
        let source = r#"{% extends "_layout" %}{% block content %}x{% endblock %}"#;
        assert_eq!(layout_ref(source).as_deref(), Some("_layout"));
    }

    #[test]
    fn test_layout_whitespace_tolerated() {
        let source = "{{   extends   \"  base  \"   }}";
        assert_eq!(layout_ref(source).as_deref(), Some("base"));
    }

    #[test]
    fn test_first_layout_wins() {
        let source = r#"{{ extends "first" }} {{ extends "second" }}"#;
        assert_eq!(layout_ref(source).as_deref(), Some("first"));
    }

    #[test]
    fn test_no_markers() {
        let result = scan("<p>{{ name }}</p>");
        assert_eq!(result, ScanResult::default());
    }

    #[test]
    fn test_partials_keep_first_appearance_order() {
        let source = r#"
            {{ template "_header" . }}
            {% include "_sidebar" %}
            {{ template "_header" }}
            {% include "../_footer" with context %}
        "#;
        assert_eq!(
            partial_refs(source),
            vec!["_header", "_sidebar", "../_footer"]
        );
    }

    #[test]
    fn test_non_underscore_targets_are_not_partials() {
        let source = r#"{% include "header" %}{{ template "content" . }}"#;
        assert!(partial_refs(source).is_empty());
    }

    #[test]
    fn test_markers_inside_comments_still_match() {
        let source = r#"{# {% include "_hidden" %} #}"#;
        assert_eq!(partial_refs(source), vec!["_hidden"]);
    }

    #[test]
    fn test_normalize_rewrites_expression_markers() {
        let source = r#"{{ extends "_layout" }}{% block body %}{{ template "_nav" . }}{% endblock %}"#;
        assert_eq!(
            normalize_markers(source),
            r#"{% extends "_layout" %}{% block body %}{% include "_nav" %}{% endblock %}"#
        );
    }

    #[test]
    fn test_normalize_leaves_statement_markers_equivalent() {
        let source = r#"{% extends "base" %}{% include "_nav" with context %}"#;
        assert_eq!(
            normalize_markers(source),
            r#"{% extends "base" %}{% include "_nav" %}"#
        );
    }

    #[test]
    fn test_normalize_ignores_plain_expressions() {
        let source = "<h1>{{ title }}</h1>";
        assert_eq!(normalize_markers(source), source);
    }

    #[test]
    fn test_normalize_keeps_only_first_layout() {
        let source = r#"{{ extends "first" }}{{ extends "second" }}{% block b %}x{% endblock %}"#;
        assert_eq!(
            normalize_markers(source),
            r#"{% extends "first" %}{% block b %}x{% endblock %}"#
        );
    }

    #[test]
    fn test_normalize_keeps_whitespace_control() {
        let source = "a\n  {%- include \"_nav\" -%}\n  {{- extends \"base\" }}";
        assert_eq!(
            normalize_markers(source),
            "a\n  {%- include \"_nav\" -%}\n  {%- extends \"base\" %}"
        );
    }

    #[test]
    fn test_single_quoted_targets() {
        let source = "{% extends 'base' %}{% include '_nav' %}";
        assert_eq!(layout_ref(source).as_deref(), Some("base"));
        assert_eq!(partial_refs(source), vec!["_nav"]);
        assert_eq!(normalize_markers(source), source);
    }

    #[test]
    fn test_ignore_missing_partials() {
        let source = r#"{% include "_nav" ignore missing %}{% include "_ad" ignore missing %}{% include "_ad" %}"#;
        let result = scan(source);
        assert_eq!(result.partials, vec!["_nav", "_ad"]);
        assert_eq!(result.optional_partials, vec!["_nav"]);
        assert_eq!(normalize_markers(source), source);
    }
}
