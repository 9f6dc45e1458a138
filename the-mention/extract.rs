//! Finding committed mentions in plain text.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

static MENTION_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?:^|[\s(])@([\w.\-]+)").expect("mention regex should compile"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionRef {
  pub handle: String,
  /// Char range of `@handle` in the text.
  pub range:  Range<usize>,
}

/// Every distinct `@handle` in `text`, in order of first appearance. Trailing
/// periods are treated as sentence punctuation.
pub fn extract_mentions(text: &str) -> Vec<MentionRef> {
  let mut mentions: Vec<MentionRef> = Vec::new();
  for captures in MENTION_REGEX.captures_iter(text) {
    let Some(handle) = captures.get(1) else {
      continue;
    };
    let name = handle.as_str().trim_end_matches('.');
    if name.is_empty() || mentions.iter().any(|mention| mention.handle == name) {
      continue;
    }
    // The trigger is the byte right before the handle.
    let start = text[..handle.start() - 1].chars().count();
    mentions.push(MentionRef {
      handle: name.to_string(),
      range:  start..start + 1 + name.chars().count(),
    });
  }
  mentions
}

/// Handle as shown to users, without the namespace decorations.
pub fn format_handle(handle: &str) -> &str {
  let handle = handle.strip_prefix("lens/").unwrap_or(handle);
  handle.strip_suffix(".lens").unwrap_or(handle)
}
