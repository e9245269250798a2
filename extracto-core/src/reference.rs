//! Reference extractor: document/counterparty numbers buried in free text.

use std::sync::LazyLock;

use regex::Regex;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*?\d+").expect("valid digit-run regex"));

const MIN_DIGITS: usize = 3;
const MAX_DIGITS: usize = 18;

/// A token counts as a reference when it is `\*?\d{3,18}` as a whole.
pub fn is_reference_token(token: &str) -> bool {
    let digits = token.strip_prefix('*').unwrap_or(token);
    (MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Scan `lines` left to right and return up to `max_count` reference tokens.
pub fn extract_references<S: AsRef<str>>(lines: &[S], max_count: usize) -> Vec<String> {
    let mut refs = Vec::new();
    scan(&mut refs, lines, max_count, false);
    refs
}

/// Append references found in `lines` to `refs`, skipping ones already there,
/// until `refs` holds `max_count` entries.
pub fn fill_references<S: AsRef<str>>(refs: &mut Vec<String>, lines: &[S], max_count: usize) {
    scan(refs, lines, max_count, true);
}

fn scan<S: AsRef<str>>(refs: &mut Vec<String>, lines: &[S], max_count: usize, dedupe: bool) {
    for line in lines {
        for token in DIGIT_RUN.find_iter(line.as_ref()).map(|m| m.as_str()) {
            if refs.len() >= max_count {
                return;
            }
            if is_reference_token(token) && !(dedupe && refs.iter().any(|r| r == token)) {
                refs.push(token.to_string());
            }
        }
    }
}

/// Strip quotes and left zero padding: `'000123'` -> `123`.
pub fn clean_reference(raw: &str) -> String {
    raw.trim().trim_matches('\'').trim_start_matches('0').to_string()
}

/// Join two references as `A-B` when both are present and distinct.
pub fn compose_reference(first: &str, second: &str) -> String {
    let (first, second) = (first.trim(), second.trim());
    match (first.is_empty(), second.is_empty()) {
        (false, false) if first != second => format!("{first}-{second}"),
        (false, _) => first.to_string(),
        (true, _) => second.to_string(),
    }
}
