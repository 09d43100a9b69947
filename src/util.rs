//! Small utility helpers used across modules.

/// Path marker every Wikipedia article URL carries.
pub const ARTICLE_MARKER: &str = "wikipedia.org/wiki/";

/// True if the input textually looks like a Wikipedia article URL.
/// Intentionally loose: the service does the real validation.
pub fn is_article_url(url: &str) -> bool {
  url.contains(ARTICLE_MARKER)
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge error bodies.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) { end -= 1; }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}
