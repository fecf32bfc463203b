//! Post-processing of result trees: media-type inference and the HTML
//! encoding `<meta>` element.

use log::debug;
use std::fmt;
use xslbridge_traits::{MetaAttributes, ResultTree};

/// Media type of a transformation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Html,
    Text,
    Xml,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Html => "text/html",
            MediaType::Text => "text/plain",
            MediaType::Xml => "application/xml",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The effective output method: the declared one, or `html` when nothing
/// is declared and the engine built an HTML document.
fn effective_method<T: ResultTree + ?Sized>(tree: &T) -> Option<&str> {
    match tree.output_method() {
        Some(method) => Some(method),
        None if tree.is_html_document() => Some("html"),
        None => None,
    }
}

pub fn infer_media_type<T: ResultTree + ?Sized>(tree: &T) -> MediaType {
    match effective_method(tree) {
        Some("html") => MediaType::Html,
        Some("text") => MediaType::Text,
        _ => MediaType::Xml,
    }
}

fn declares_encoding(meta: &MetaAttributes) -> bool {
    meta.charset.is_some()
        || meta
            .http_equiv
            .as_deref()
            .is_some_and(|value| value.eq_ignore_ascii_case("Content-Type"))
}

/// Makes sure an HTML result declares its encoding with
/// `<meta http-equiv="Content-Type">` rather than `<meta charset>`.
///
/// When the `<head>` has neither, the `http-equiv` form is prepended so the
/// serializer updates it instead of inserting its own `charset` element.
/// Returns whether an element was inserted.
pub fn normalize_html_meta<T: ResultTree + ?Sized>(tree: &mut T) -> bool {
    if effective_method(tree) != Some("html") {
        return false;
    }
    let encoding = tree.output_encoding().unwrap_or("UTF-8").to_string();
    let Some(head) = tree.html_head() else {
        return false;
    };
    if head.metas().iter().any(declares_encoding) {
        return false;
    }

    let content = format!("text/html; charset={}", encoding);
    debug!("Inserting <meta http-equiv=\"Content-Type\" content=\"{}\">", content);
    head.prepend_meta("Content-Type", &content);
    true
}
