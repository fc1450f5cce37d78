//! Presentation helpers: a sanitizing rich-text serializer and date formatting.
//!
//! All markup leaves this module as [`SafeHtml`], which can only be built by
//! escaping text, so post content never reaches a renderer unescaped.

use std::fmt;

use chrono::{DateTime, Locale, Utc};

use crate::models::{InlineMark, MarkKind, PostDocument, SpanKind, TextSpan};

/// Markup whose text content has been escaped
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SafeHtml(String);

impl SafeHtml {
    pub fn escape(text: &str) -> Self {
        let mut out = String::with_capacity(text.len());
        push_escaped(&mut out, text);
        SafeHtml(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Converts the markup to wrapped terminal text
    pub fn to_plain_text(&self, width: usize) -> String {
        html2text::from_read(self.0.as_bytes(), width)
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(PartialEq)]
enum ListKind {
    Unordered,
    Ordered,
}

/// Serializes rich-text spans to HTML
/// Consecutive list items are grouped into one `<ul>` or `<ol>`.
pub fn render_rich_text(spans: &[TextSpan]) -> SafeHtml {
    let mut out = String::new();
    let mut open_list: Option<ListKind> = None;

    for span in spans {
        let list = match span.kind {
            SpanKind::ListItem => Some(ListKind::Unordered),
            SpanKind::OrderedListItem => Some(ListKind::Ordered),
            _ => None,
        };

        if open_list != list {
            if let Some(kind) = open_list.take() {
                out.push_str(close_list_tag(&kind));
            }
            if let Some(kind) = &list {
                out.push_str(match kind {
                    ListKind::Unordered => "<ul>",
                    ListKind::Ordered => "<ol>",
                });
            }
            open_list = list;
        }

        let tag = match span.kind {
            SpanKind::Paragraph => "p".to_string(),
            SpanKind::Heading(level) => format!("h{}", level.clamp(1, 6)),
            SpanKind::Preformatted => "pre".to_string(),
            SpanKind::ListItem | SpanKind::OrderedListItem => "li".to_string(),
        };

        out.push('<');
        out.push_str(&tag);
        out.push('>');
        push_marked_text(&mut out, &span.text, &span.marks);
        out.push_str("</");
        out.push_str(&tag);
        out.push('>');
    }

    if let Some(kind) = open_list {
        out.push_str(close_list_tag(&kind));
    }

    SafeHtml(out)
}

/// Renders every block of a post as `<h2>` heading followed by its body
pub fn render_post(post: &PostDocument) -> SafeHtml {
    let mut out = String::new();
    for block in &post.content {
        if let Some(heading) = block.heading.as_deref().filter(|h| !h.is_empty()) {
            out.push_str("<h2>");
            push_escaped(&mut out, heading);
            out.push_str("</h2>");
        }
        out.push_str(render_rich_text(&block.body).as_str());
    }
    SafeHtml(out)
}

/// `d MMM yyyy` in Brazilian Portuguese, e.g. `15 mar 2021`
pub fn format_publication_date(date: DateTime<Utc>) -> String {
    date.format_localized("%-d %b %Y", Locale::pt_BR).to_string()
}

fn close_list_tag(kind: &ListKind) -> &'static str {
    match kind {
        ListKind::Unordered => "</ul>",
        ListKind::Ordered => "</ol>",
    }
}

fn is_safe_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

fn open_tag(out: &mut String, mark: &InlineMark) {
    match &mark.kind {
        MarkKind::Strong => out.push_str("<strong>"),
        MarkKind::Emphasis => out.push_str("<em>"),
        MarkKind::Hyperlink(url) => {
            out.push_str("<a href=\"");
            push_escaped(out, url.trim());
            out.push_str("\" rel=\"noopener noreferrer\">");
        }
    }
}

fn close_tag(out: &mut String, mark: &InlineMark) {
    out.push_str(match mark.kind {
        MarkKind::Strong => "</strong>",
        MarkKind::Emphasis => "</em>",
        MarkKind::Hyperlink(_) => "</a>",
    });
}

/// Writes `text` with its marks as nested tags. Overlapping marks are
/// closed and reopened at segment boundaries so the output stays well formed.
fn push_marked_text(out: &mut String, text: &str, marks: &[InlineMark]) {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut marks: Vec<InlineMark> = marks
        .iter()
        .filter(|m| match &m.kind {
            MarkKind::Hyperlink(url) => is_safe_url(url),
            _ => true,
        })
        .map(|m| InlineMark {
            start: m.start.min(len),
            end: m.end.min(len),
            kind: m.kind.clone(),
        })
        .filter(|m| m.start < m.end)
        .collect();

    if marks.is_empty() {
        push_escaped(out, text);
        return;
    }

    // Outer marks first: earlier start, then longer range
    marks.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut bounds: Vec<usize> = marks.iter().flat_map(|m| [m.start, m.end]).collect();
    bounds.push(0);
    bounds.push(len);
    bounds.sort_unstable();
    bounds.dedup();

    let mut open: Vec<usize> = Vec::new();

    for window in bounds.windows(2) {
        let (from, to) = (window[0], window[1]);
        let active: Vec<usize> = (0..marks.len())
            .filter(|&i| marks[i].start <= from && marks[i].end >= to)
            .collect();

        let common = open
            .iter()
            .zip(active.iter())
            .take_while(|(a, b)| a == b)
            .count();

        while open.len() > common {
            if let Some(i) = open.pop() {
                close_tag(out, &marks[i]);
            }
        }
        for &i in &active[common..] {
            open_tag(out, &marks[i]);
            open.push(i);
        }

        let segment: String = chars[from..to].iter().collect();
        push_escaped(out, &segment);
    }

    while let Some(i) = open.pop() {
        close_tag(out, &marks[i]);
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RichTextBlock;
    use chrono::TimeZone;

    fn mark(start: usize, end: usize, kind: MarkKind) -> InlineMark {
        InlineMark { start, end, kind }
    }

    #[test]
    fn test_escapes_text() {
        let spans = vec![TextSpan::paragraph("<script>alert('x')</script> & co")];
        assert_eq!(
            render_rich_text(&spans).as_str(),
            "<p>&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; co</p>"
        );
    }

    #[test]
    fn test_groups_list_items() {
        let mut spans = vec![TextSpan::paragraph("intro")];
        for text in ["one", "two"] {
            spans.push(TextSpan { kind: SpanKind::ListItem, text: text.into(), marks: vec![] });
        }
        spans.push(TextSpan { kind: SpanKind::OrderedListItem, text: "first".into(), marks: vec![] });
        spans.push(TextSpan { kind: SpanKind::Heading(3), text: "end".into(), marks: vec![] });

        assert_eq!(
            render_rich_text(&spans).as_str(),
            "<p>intro</p><ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><h3>end</h3>"
        );
    }

    #[test]
    fn test_nested_marks() {
        let span = TextSpan {
            kind: SpanKind::Paragraph,
            text: "bold and link".into(),
            marks: vec![
                mark(0, 13, MarkKind::Strong),
                mark(9, 13, MarkKind::Hyperlink("https://example.com/?a=1&b=2".into())),
            ],
        };
        assert_eq!(
            render_rich_text(&[span]).as_str(),
            "<p><strong>bold and <a href=\"https://example.com/?a=1&amp;b=2\" \
             rel=\"noopener noreferrer\">link</a></strong></p>"
        );
    }

    #[test]
    fn test_overlapping_marks_stay_well_formed() {
        let span = TextSpan {
            kind: SpanKind::Paragraph,
            text: "abcdef".into(),
            marks: vec![mark(0, 4, MarkKind::Strong), mark(2, 6, MarkKind::Emphasis)],
        };
        assert_eq!(
            render_rich_text(&[span]).as_str(),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_unsafe_links_render_as_text() {
        let span = TextSpan {
            kind: SpanKind::Paragraph,
            text: "click me".into(),
            marks: vec![mark(0, 8, MarkKind::Hyperlink("javascript:alert(1)".into()))],
        };
        assert_eq!(render_rich_text(&[span]).as_str(), "<p>click me</p>");
    }

    #[test]
    fn test_marks_past_end_are_clamped() {
        let span = TextSpan {
            kind: SpanKind::Paragraph,
            text: "olá".into(),
            marks: vec![mark(1, 40, MarkKind::Emphasis), mark(10, 20, MarkKind::Strong)],
        };
        assert_eq!(render_rich_text(&[span]).as_str(), "<p>o<em>lá</em></p>");
    }

    #[test]
    fn test_render_post_headings() {
        let post = PostDocument {
            uid: Some("hooks".into()),
            first_publication_date: None,
            title: "Hooks".into(),
            subtitle: String::new(),
            author: String::new(),
            banner_url: None,
            content: vec![
                RichTextBlock {
                    heading: Some("Why <hooks>".into()),
                    body: vec![TextSpan::paragraph("text")],
                },
                RichTextBlock {
                    heading: Some(String::new()),
                    body: vec![TextSpan::paragraph("more")],
                },
            ],
        };
        assert_eq!(
            render_post(&post).as_str(),
            "<h2>Why &lt;hooks&gt;</h2><p>text</p><p>more</p>"
        );
        assert!(render_post(&post).to_plain_text(80).contains("more"));
    }

    #[test]
    fn test_format_publication_date() {
        let date = Utc.with_ymd_and_hms(2021, 3, 5, 19, 25, 28).unwrap();
        assert_eq!(format_publication_date(date), "5 mar 2021");
    }
}
