use std::fmt;

use super::request::SourceKind;

/// The user-turn prompt sent to a provider. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    text: String,
}

impl Prompt {
    /// Build the processing prompt for resolved content.
    ///
    /// The template is static apart from two substitutions: the noun naming
    /// the source kind and the body itself, embedded verbatim.
    pub fn build(body: &str, source_kind: SourceKind) -> Self {
        let noun = match source_kind {
            SourceKind::Text => "text",
            SourceKind::Url => "web page content",
        };

        let text = format!(
            "
Please process the following {noun} and return a well-formatted JSON response:

{body}

Requirements:
- Return valid JSON format
- Include relevant information extracted or generated from the {noun}
- Structure the response logically
- If the {noun} contains questions, provide answers
- If the {noun} contains data, organize it appropriately
- If processing a web page, extract key information, summarize content, and identify main topics
"
        );

        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters, as reported in logs.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Prompt {
    fn from(s: &str) -> Self {
        Prompt { text: s.to_string() }
    }
}
