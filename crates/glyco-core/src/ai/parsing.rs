//! Cleanup helpers for model responses
//!
//! Models often wrap a plain-text answer in code fences or quotes, or lead
//! with a chatty preamble line. These functions strip that packaging.

use crate::error::{Error, Result};

/// Preambles some models put on their own line before the answer
const PREAMBLES: &[&str] = &["here is", "here's", "sure,", "sure!", "certainly"];

/// Clean a raw model response into display text
///
/// Returns `Error::Backend` if nothing is left after cleanup.
pub fn clean_generated_text(response: &str) -> Result<String> {
    let mut text = strip_code_fence(response.trim()).trim();

    // Drop a one-line preamble ending in ':' ("Here is your summary:")
    if let Some((first, rest)) = text.split_once('\n') {
        let lowered = first.trim().to_lowercase();
        if lowered.ends_with(':') && PREAMBLES.iter().any(|p| lowered.starts_with(p)) {
            text = rest.trim();
        }
    }

    let text = strip_wrapping_quotes(text).trim();

    if text.is_empty() {
        return Err(Error::Backend(format!(
            "Empty response from model | Raw: {}",
            truncate(response, 200)
        )));
    }

    Ok(text.to_string())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return text;
    };
    // Drop a language tag on the opening fence line
    match inner.split_once('\n') {
        Some((tag, body)) if !tag.trim().contains(' ') => body,
        _ => inner,
    }
}

fn strip_wrapping_quotes(text: &str) -> &str {
    for (open, close) in [('"', '"'), ('\u{201C}', '\u{201D}')] {
        if let Some(inner) = text.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
            if !inner.contains(open) && !inner.contains(close) {
                return inner;
            }
        }
    }
    text
}

/// Truncate for log and error messages, on a char boundary
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
