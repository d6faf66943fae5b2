use super::request::SourceKind;

/// Number of characters of free text kept in a source label.
pub const SOURCE_PREVIEW_CHARS: usize = 100;

/// Plain-text payload derived from a request, plus how to report its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContent {
    pub body: String,
    pub source_kind: SourceKind,
    /// The original URL, or a preview of free text. Only used for reporting.
    pub source_label: String,
}

impl ResolvedContent {
    /// Content taken verbatim from free text.
    pub fn from_text(text: impl Into<String>) -> Self {
        let body = text.into();
        let source_label = preview(&body);

        Self {
            body,
            source_kind: SourceKind::Text,
            source_label,
        }
    }

    /// Content extracted from the page behind `url`.
    pub fn from_url(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            source_kind: SourceKind::Url,
            source_label: url.into(),
        }
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(SOURCE_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
