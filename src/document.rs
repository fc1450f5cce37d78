//! Decoding of Prismic payloads into the crate's models.
//!
//! Every field of a post is normalized here, once: missing or null strings
//! become empty strings, timestamps are parsed, and rich text is mapped to
//! [`TextSpan`]s. Nothing downstream sees raw JSON.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{InlineMark, MarkKind, Page, PostDocument, PostSummary, RichTextBlock, SpanKind, TextSpan};
use crate::pagination::InvalidPageError;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("document is not a JSON object")]
    NotAnObject,
    #[error("document has no `data` object")]
    MissingData,
    #[error("invalid publication date: {0:?}")]
    InvalidTimestamp(String),
    #[error("malformed document field: {0}")]
    InvalidContent(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct RawDocument {
    uid: Option<String>,
    first_publication_date: Option<String>,
    data: Option<RawData>,
}

#[derive(Deserialize)]
struct RawData {
    title: Option<String>,
    subtitle: Option<String>,
    author: Option<String>,
    banner: Option<RawBanner>,
    content: Option<Vec<RawBlock>>,
}

#[derive(Deserialize)]
struct RawBanner {
    url: Option<String>,
}

#[derive(Deserialize)]
struct RawBlock {
    heading: Option<String>,
    #[serde(default)]
    body: Vec<RawSpan>,
}

#[derive(Deserialize)]
struct RawSpan {
    #[serde(rename = "type")]
    kind: Option<String>,
    // Anything but a string counts as empty text
    text: Option<Value>,
    #[serde(default)]
    spans: Vec<RawMark>,
}

#[derive(Deserialize)]
struct RawMark {
    start: usize,
    end: usize,
    #[serde(rename = "type")]
    kind: String,
    data: Option<RawMarkData>,
}

#[derive(Deserialize)]
struct RawMarkData {
    url: Option<String>,
}

/// Decodes a single Prismic document of type `posts`
pub fn decode_post(value: &Value) -> Result<PostDocument, DecodeError> {
    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }

    let raw: RawDocument = serde_json::from_value(value.clone())?;
    let data = raw.data.ok_or(DecodeError::MissingData)?;

    let first_publication_date = raw
        .first_publication_date
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;

    let content = data
        .content
        .unwrap_or_default()
        .into_iter()
        .map(decode_block)
        .collect();

    Ok(PostDocument {
        uid: raw.uid,
        first_publication_date,
        title: data.title.unwrap_or_default(),
        subtitle: data.subtitle.unwrap_or_default(),
        author: data.author.unwrap_or_default(),
        banner_url: data.banner.and_then(|b| b.url),
        content,
    })
}

pub fn decode_summary(value: &Value) -> Result<PostSummary, DecodeError> {
    decode_post(value).map(|doc| PostSummary::from(&doc))
}

/// Decodes a search response (`results` + `next_page`) into a [`Page`]
pub fn decode_page(value: &Value) -> Result<Page, InvalidPageError> {
    let results = value
        .get("results")
        .and_then(Value::as_array)
        .ok_or(InvalidPageError::MissingItems)?;

    let items = results
        .iter()
        .enumerate()
        .map(|(index, item)| {
            decode_summary(item).map_err(|source| InvalidPageError::Item { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let next_cursor = value
        .get("next_page")
        .and_then(Value::as_str)
        .map(String::from);

    Ok(Page { items, next_cursor })
}

/// Accepts RFC 3339 as well as Prismic's `2021-03-15T19:25:28+0000`
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DecodeError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| DecodeError::InvalidTimestamp(value.to_string()))
}

fn decode_block(raw: RawBlock) -> RichTextBlock {
    RichTextBlock {
        heading: raw.heading,
        body: raw.body.into_iter().map(decode_span).collect(),
    }
}

fn decode_span(raw: RawSpan) -> TextSpan {
    let text = raw
        .text
        .as_ref()
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let marks = raw
        .spans
        .into_iter()
        .filter(|m| m.start < m.end)
        .filter_map(|m| {
            let kind = match m.kind.as_str() {
                "strong" => MarkKind::Strong,
                "em" => MarkKind::Emphasis,
                "hyperlink" => MarkKind::Hyperlink(m.data.and_then(|d| d.url)?),
                _ => return None,
            };
            Some(InlineMark { start: m.start, end: m.end, kind })
        })
        .collect();

    TextSpan {
        kind: SpanKind::from_prismic(raw.kind.as_deref().unwrap_or("paragraph")),
        text,
        marks,
    }
}
