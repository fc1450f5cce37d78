use thiserror::Error;
use crate::models::RichTextBlock;

pub const DEFAULT_WORDS_PER_MINUTE: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("words per minute must be a positive number, got {0}")]
pub struct InvalidRateError(pub f64);

/// Estimates how many minutes it takes to read `content`
/// Counts space-delimited tokens of the body text and of the headings,
/// then rounds `words / words_per_minute` up to the next minute.
/// Estimates above `u32::MAX` minutes saturate at `u32::MAX`.
pub fn estimate_reading_minutes(
    content: &[RichTextBlock],
    words_per_minute: f64,
) -> Result<u32, InvalidRateError> {
    validate_rate(words_per_minute)?;

    let body_text = content
        .iter()
        .flat_map(|block| block.body.iter())
        .map(|span| span.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let heading_text = content
        .iter()
        .filter_map(|block| block.heading.as_deref())
        .filter(|heading| !heading.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let total_words = word_count(&body_text) + word_count(&heading_text);
    let minutes = (total_words as f64 / words_per_minute).ceil();

    Ok(minutes.min(u32::MAX as f64) as u32)
}

pub fn estimate_reading_minutes_default(content: &[RichTextBlock]) -> u32 {
    // The default rate always validates.
    estimate_reading_minutes(content, DEFAULT_WORDS_PER_MINUTE).unwrap_or(0)
}

pub fn validate_rate(words_per_minute: f64) -> Result<(), InvalidRateError> {
    if words_per_minute.is_finite() && words_per_minute > 0.0 {
        Ok(())
    } else {
        Err(InvalidRateError(words_per_minute))
    }
}

/// Tokens between single spaces. Tabs and newlines do not split words.
pub fn word_count(text: &str) -> usize {
    text.split(' ').filter(|token| !token.is_empty()).count()
}

#[cfg(test)]
#[path = "reading_time_tests.rs"]
mod tests;
