//! Small utility helpers used across modules.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch. Game and session timestamps are plain
/// u64 millis so records stay serde-friendly.
pub fn now_ms() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_millis() as u64)
    .unwrap_or(0)
}

/// Canonical answer form: trimmed, all internal whitespace removed.
/// Answers are numeric (integers, short decimals, fractions like "2/3"),
/// so whitespace is the only thing we forgive.
pub fn normalize_answer(s: &str) -> String {
  s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Exact-match validation on the normalized forms. No tolerance/epsilon;
/// the generator only produces integer and short-decimal answers.
pub fn answers_match(submitted: &str, canonical: &str) -> bool {
  !canonical.is_empty() && normalize_answer(submitted) == normalize_answer(canonical)
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max { s.to_string() } else { format!("{}… ({} bytes total)", &s[..max], s.len()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn whitespace_is_forgiven() {
    assert!(answers_match("  42 ", "42"));
    assert!(answers_match("1 / 2", "1/2"));
    assert!(answers_match("\t-17\n", "-17"));
  }

  #[test]
  fn value_must_be_exact() {
    assert!(!answers_match("42.0", "42"));
    assert!(!answers_match("041", "41"));
    assert!(!answers_match("", "0"));
  }

  #[test]
  fn empty_canonical_never_matches() {
    assert!(!answers_match("", ""));
  }
}
