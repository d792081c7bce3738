//! Content sniffing for inline payloads. Webhook bodies arrive as free
//! text that may actually be base64-wrapped bytes or a pasted CSV table.

use base64::Engine;

/// Heuristic: does this string look like a base64 blob rather than prose?
/// Short strings never qualify; otherwise require that at least 90% of
/// characters come from the base64 alphabet.
pub fn looks_like_base64(content: &str) -> bool {
    let trimmed = content.trim();
    if trimmed.len() < 50 {
        return false;
    }

    let invalid = trimmed
        .chars()
        .filter(|c| !c.is_ascii_alphanumeric() && !matches!(c, '+' | '/' | '=' | '\n' | '\r'))
        .count();

    (invalid as f64) < (trimmed.len() as f64) * 0.1
}

/// Heuristic: does this look like tabular CSV content? Needs at least two
/// lines, a comma in the header, and consistent column counts across the
/// first few rows (within one column of the header).
pub fn looks_like_csv(content: &str) -> bool {
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return false;
    }

    let header_commas = lines[0].matches(',').count();
    if header_commas == 0 {
        return false;
    }

    let sample = &lines[..lines.len().min(5)];
    let consistent = sample
        .iter()
        .filter(|line| {
            let commas = line.matches(',').count();
            commas.abs_diff(header_commas) <= 1
        })
        .count();

    (consistent as f64) >= (sample.len() as f64) * 0.8
}

/// Unwrap inline payloads before extraction. Base64 blobs that decode to
/// valid UTF-8 are replaced by their decoded text; anything else passes
/// through untouched. Returns the text plus a flag noting whether a
/// decode happened.
pub fn decode_inline_content(content: &str) -> (String, bool) {
    if !looks_like_base64(content) {
        return (content.to_string(), false);
    }

    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    match base64::engine::general_purpose::STANDARD.decode(&compact) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => (text, true),
            Err(_) => (content.to_string(), false),
        },
        Err(_) => (content.to_string(), false),
    }
}
