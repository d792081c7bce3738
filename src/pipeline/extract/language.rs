//! Lightweight language detection for extracted text.
//!
//! The operator's documents arrive in English, Malayalam, or a mix of the
//! two. No external dependencies — Malayalam lives in its own Unicode
//! block, so character counting is reliable enough for routing purposes.

use crate::models::Language;

/// Detect the primary language of extracted text.
///
/// Ratios are computed over letter-like characters only, so punctuation
/// and digits do not dilute the signal. Very short inputs are reported
/// as `Unknown` rather than guessed.
pub fn detect_language(text: &str) -> Language {
    let trimmed = text.trim();
    if trimmed.chars().count() < 10 {
        return Language::Unknown;
    }

    let malayalam = count_malayalam_chars(trimmed);
    let english = count_ascii_letters(trimmed);
    let total = malayalam + english;

    if total == 0 {
        return Language::Unknown;
    }

    let ml_ratio = malayalam as f64 / total as f64;
    let en_ratio = english as f64 / total as f64;

    if ml_ratio > 0.3 && en_ratio > 0.3 {
        Language::MixedEnMl
    } else if ml_ratio > 0.5 {
        Language::Malayalam
    } else if en_ratio > 0.7 {
        Language::English
    } else {
        Language::Mixed
    }
}

/// Characters in the Malayalam Unicode block (U+0D00..U+0D7F).
fn count_malayalam_chars(text: &str) -> usize {
    text.chars()
        .filter(|c| ('\u{0D00}'..='\u{0D7F}').contains(c))
        .count()
}

fn count_ascii_letters(text: &str) -> usize {
    text.chars().filter(|c| c.is_ascii_alphabetic()).count()
}
