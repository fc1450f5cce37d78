use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// One entry of the post listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: Option<String>,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// One fetched page of the listing. `next_cursor` is the URL of the
/// following page, `None` once the listing is exhausted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<PostSummary>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    Paragraph,
    Heading(u8),
    Preformatted,
    ListItem,
    OrderedListItem,
}

impl SpanKind {
    /// Maps a Prismic element type. Unknown types read as paragraphs.
    pub fn from_prismic(kind: &str) -> Self {
        match kind {
            "heading1" => SpanKind::Heading(1),
            "heading2" => SpanKind::Heading(2),
            "heading3" => SpanKind::Heading(3),
            "heading4" => SpanKind::Heading(4),
            "heading5" => SpanKind::Heading(5),
            "heading6" => SpanKind::Heading(6),
            "preformatted" => SpanKind::Preformatted,
            "list-item" => SpanKind::ListItem,
            "o-list-item" => SpanKind::OrderedListItem,
            _ => SpanKind::Paragraph,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkKind {
    Strong,
    Emphasis,
    Hyperlink(String),
}

/// Inline formatting over `start..end`, counted in characters of the span text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineMark {
    pub start: usize,
    pub end: usize,
    pub kind: MarkKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub kind: SpanKind,
    pub text: String,
    pub marks: Vec<InlineMark>,
}

impl TextSpan {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: SpanKind::Paragraph,
            text: text.into(),
            marks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RichTextBlock {
    pub heading: Option<String>,
    pub body: Vec<TextSpan>,
}

/// A full post as shown on its own page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDocument {
    pub uid: Option<String>,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: Option<String>,
    pub content: Vec<RichTextBlock>,
}

impl From<&PostDocument> for PostSummary {
    fn from(doc: &PostDocument) -> Self {
        PostSummary {
            uid: doc.uid.clone(),
            first_publication_date: doc.first_publication_date,
            title: doc.title.clone(),
            subtitle: doc.subtitle.clone(),
            author: doc.author.clone(),
        }
    }
}
