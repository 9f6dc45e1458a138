//! Mention span classification.
//!
//! Given the text of the line being edited and the cursor position, decide
//! whether the user is typing a mention and, if so, which part of the text
//! would be replaced by the mention token.
//!
//! # Patterns
//!
//! A mention starts with [`TRIGGER`] placed at the start of the text or after
//! whitespace or an opening parenthesis, and runs up to the cursor. Two
//! patterns are tried, the first one that matches wins:
//!
//! - **Word-boundary form**: up to [`LENGTH_LIMIT`] valid characters, each
//!   optionally followed by a single join (a space, a punctuation character,
//!   or a period followed by a space). This lets display names with several
//!   words match, while two joins in a row end the mention.
//! - **Alias form**: up to [`ALIAS_LENGTH_LIMIT`] valid characters and no
//!   joins at all.
//!
//! Valid characters are everything except the trigger, [`PUNCTUATION`] and
//! whitespace.
//!
//! # Offsets
//!
//! All offsets are char offsets into the window content. Matching never looks
//! past the cursor and carries no state between calls.
//!
//! ```ignore
//! use the_mention::matcher::match_mention;
//!
//! let span = match_mention("hey @ali how are you", 8).unwrap();
//! assert_eq!(span.lead_offset, 4);
//! assert_eq!(span.matching_string, "ali");
//! assert_eq!(span.replaceable_string, "@ali");
//! ```

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{
  Regex,
  RegexBuilder,
};

use crate::{
  document::TextWindow,
  trigger::{
    CompetingTrigger,
    TypeaheadTrigger,
  },
};

pub const TRIGGER: char = '@';

/// Characters that can never be part of a mention run.
pub const PUNCTUATION: &str = r#".,+*?$@|#{}()^-[]\/!%'"~=<>_:;"#;

/// Maximum number of characters (joins aside) in the word-boundary form.
pub const LENGTH_LIMIT: usize = 75;

/// Maximum length of the alias form.
pub const ALIAS_LENGTH_LIMIT: usize = 50;

pub const DEFAULT_MIN_MATCH_LEN: usize = 1;

/// Class body of the whitespace that separates a trigger from the text before
/// it. Unicode `White_Space` minus U+0085, plus U+FEFF, the set browsers use
/// for `\s`.
const WHITESPACE: &str = r"\t\n\x0B\x0C\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}";

// The bounded repetitions expand into a large program, the default limit is
// too tight for the word-boundary form.
const REGEX_SIZE_LIMIT: usize = 1 << 25;

static WORD_BOUNDARY_REGEX: Lazy<Regex> = Lazy::new(|| {
  let unit = format!("{}{}", valid_chars(TRIGGER), valid_joins());
  typeahead_regex(TRIGGER, &unit, LENGTH_LIMIT).expect("mention regex should compile")
});

static ALIAS_REGEX: Lazy<Regex> = Lazy::new(|| {
  typeahead_regex(TRIGGER, &valid_chars(TRIGGER), ALIAS_LENGTH_LIMIT)
    .expect("mention alias regex should compile")
});

/// A mention being typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchSpan {
  /// Char offset of the trigger, after any leading whitespace or `(`.
  pub lead_offset:        usize,
  /// Text after the trigger, used as the search query.
  pub matching_string:    String,
  /// Trigger plus matching string, the exact text replaced on commit.
  pub replaceable_string: String,
}

impl MatchSpan {
  /// Length of the replaceable text in chars.
  pub fn len_chars(&self) -> usize {
    self.replaceable_string.chars().count()
  }

  /// Char range of the replaceable text, ending at the cursor.
  pub fn range(&self) -> Range<usize> {
    self.lead_offset..self.lead_offset + self.len_chars()
  }
}

/// Classify `content` up to `cursor` with the default minimum query length.
pub fn match_mention(content: &str, cursor: usize) -> Option<MatchSpan> {
  match_mention_with(content, cursor, DEFAULT_MIN_MATCH_LEN)
}

/// Classify `content` up to `cursor`, requiring at least `min_len` chars
/// after the trigger. A cursor past the end is clamped to the end.
pub fn match_mention_with(content: &str, cursor: usize, min_len: usize) -> Option<MatchSpan> {
  match_text(text_before_cursor(content, cursor), min_len)
}

fn match_text(text: &str, min_len: usize) -> Option<MatchSpan> {
  // The minimum length is checked against whichever pattern matched first,
  // a short word-boundary match does not fall through to the alias form.
  let captures = WORD_BOUNDARY_REGEX
    .captures(text)
    .or_else(|| ALIAS_REGEX.captures(text))?;
  span_from_captures(text, &captures, min_len)
}

/// Mention classification bound to a competing trigger.
///
/// Whenever the competing trigger claims the text, the mention is suppressed,
/// no matter how well the mention pattern matches.
pub struct MentionMatcher {
  min_len:   usize,
  competing: Box<dyn CompetingTrigger>,
}

impl Default for MentionMatcher {
  fn default() -> Self {
    Self::new(DEFAULT_MIN_MATCH_LEN)
  }
}

impl MentionMatcher {
  /// A matcher that yields to the `/` command menu.
  pub fn new(min_len: usize) -> Self {
    Self {
      min_len,
      competing: Box::new(TypeaheadTrigger::slash()),
    }
  }

  pub fn with_competing(mut self, competing: impl CompetingTrigger + 'static) -> Self {
    self.competing = Box::new(competing);
    self
  }

  pub fn min_len(&self) -> usize {
    self.min_len
  }

  pub fn classify(&self, window: &TextWindow) -> Option<MatchSpan> {
    let text = text_before_cursor(&window.content, window.cursor);
    let span = match_text(text, self.min_len);
    if self.competing.claims(text) {
      if span.is_some() {
        tracing::trace!(text, "mention suppressed by competing trigger");
      }
      return None;
    }
    span
  }
}

/// The part of `content` in front of the char offset `cursor`.
pub(crate) fn text_before_cursor(content: &str, cursor: usize) -> &str {
  let end = content
    .char_indices()
    .nth(cursor)
    .map_or(content.len(), |(idx, _)| idx);
  &content[..end]
}

/// `[^<trigger><punctuation><whitespace>]`
pub(crate) fn valid_chars(trigger: char) -> String {
  format!(
    r"[^{}{}{WHITESPACE}]",
    escape_class([trigger]),
    escape_class(PUNCTUATION.chars())
  )
}

fn valid_joins() -> String {
  format!(r"(?:\.[ |$]| |[{}]|)", escape_class(PUNCTUATION.chars()))
}

/// Anchored-at-end typeahead pattern. Group 1 is the leading boundary, group 2
/// the replaceable text and group 3 the text after the trigger.
pub(crate) fn typeahead_regex(trigger: char, unit: &str, limit: usize) -> Result<Regex, regex::Error> {
  let pattern = format!(
    r"(^|[{WHITESPACE}]|\()([{}]((?:{unit}){{0,{limit}}}))$",
    escape_class([trigger])
  );
  RegexBuilder::new(&pattern)
    .size_limit(REGEX_SIZE_LIMIT)
    .build()
}

pub(crate) fn span_from_captures(
  text: &str,
  captures: &regex::Captures<'_>,
  min_len: usize,
) -> Option<MatchSpan> {
  let replaceable = captures.get(2)?;
  let matching = captures.get(3)?;
  if matching.as_str().chars().count() < min_len {
    return None;
  }
  Some(MatchSpan {
    lead_offset:        text[..replaceable.start()].chars().count(),
    matching_string:    matching.as_str().to_string(),
    replaceable_string: replaceable.as_str().to_string(),
  })
}

fn escape_class(chars: impl IntoIterator<Item = char>) -> String {
  let mut buf = [0u8; 4];
  chars
    .into_iter()
    .map(|ch| regex::escape(ch.encode_utf8(&mut buf)))
    .collect()
}

#[cfg(test)]
mod tests {
  use quickcheck::TestResult;

  use super::*;

  fn span(lead_offset: usize, matching: &str) -> Option<MatchSpan> {
    Some(MatchSpan {
      lead_offset,
      matching_string: matching.to_string(),
      replaceable_string: format!("@{matching}"),
    })
  }

  fn at_end(content: &str) -> Option<MatchSpan> {
    match_mention(content, content.chars().count())
  }

  #[test]
  fn trigger_positions() {
    assert_eq!(at_end("@a"), span(0, "a"));
    assert_eq!(at_end("hello @alice"), span(6, "alice"));
    assert_eq!(at_end("(@bob"), span(1, "bob"));
    assert_eq!(at_end("line\n@carol"), span(5, "carol"));
    assert_eq!(at_end("mail@bob"), None);
    assert_eq!(at_end("x(@bob"), span(2, "bob"));
  }

  #[test]
  fn trigger_alone_is_not_a_match() {
    assert_eq!(at_end("@"), None);
    assert_eq!(at_end("hey @"), None);
    assert_eq!(match_mention_with("hey @", 5, 0), span(4, ""));
  }

  #[test]
  fn single_joins_are_allowed() {
    assert_eq!(at_end("@Jane Doe"), span(0, "Jane Doe"));
    assert_eq!(at_end("@jane.doe"), span(0, "jane.doe"));
    assert_eq!(at_end("@jane. doe"), span(0, "jane. doe"));
    assert_eq!(at_end("hi @jane "), span(3, "jane "));
  }

  #[test]
  fn consecutive_joins_end_the_match() {
    assert_eq!(at_end("@jane  doe"), None);
    assert_eq!(at_end("@jane,,doe"), None);
  }

  #[test]
  fn length_limits() {
    let run = "a".repeat(LENGTH_LIMIT);
    assert_eq!(at_end(&format!("@{run}")), span(0, &run));

    let run = "a".repeat(LENGTH_LIMIT + 1);
    assert_eq!(at_end(&format!("@{run}")), None);

    let joined = vec!["ab"; 30].join(" ");
    assert_eq!(at_end(&format!("@{joined}")), span(0, &joined));
  }

  #[test]
  fn only_text_before_the_cursor_counts() {
    assert_eq!(match_mention("hey @ali how are you", 8), span(4, "ali"));
    assert_eq!(match_mention("hey @ali how are you", 4), None);
    assert_eq!(match_mention("hey @ali", 100), span(4, "ali"));
  }

  #[test]
  fn offsets_are_chars() {
    let span = match_mention("héllo wörld @zoë", 16).unwrap();
    assert_eq!(span.lead_offset, 12);
    assert_eq!(span.matching_string, "zoë");
    assert_eq!(span.range(), 12..16);
  }

  #[test]
  fn browser_whitespace_separates_trigger() {
    assert_eq!(at_end("a\u{feff}@bob"), span(2, "bob"));
    assert_eq!(at_end("a\u{3000}@bob"), span(2, "bob"));
    assert_eq!(at_end("a\u{85}@bob"), None);
    assert_eq!(at_end("@bo\u{85}b"), span(0, "bo\u{85}b"));
  }

  #[test]
  fn competing_trigger_suppresses_match() {
    let window = TextWindow::new("hey @ali", 8);
    assert_eq!(MentionMatcher::default().classify(&window), span(4, "ali"));

    let matcher = MentionMatcher::default().with_competing(|_: &str| true);
    assert_eq!(matcher.classify(&window), None);
  }

  #[test]
  fn slash_command_wins_over_mention() {
    let matcher = MentionMatcher::default();
    assert_eq!(matcher.classify(&TextWindow::new("/ali", 4)), None);
    assert_eq!(matcher.classify(&TextWindow::new("@ali /", 6)), None);
  }

  quickcheck::quickcheck! {
    fn classification_is_idempotent(content: String, cursor: usize) -> bool {
      let cursor = cursor % (content.chars().count() + 2);
      match_mention(&content, cursor) == match_mention(&content, cursor)
    }

    fn trigger_after_word_char_never_matches(prefix: String, run: String) -> TestResult {
      let prefix: String = prefix.chars().filter(|c| c.is_alphanumeric()).collect();
      if prefix.is_empty() {
        return TestResult::discard();
      }
      let run: String = run.chars().filter(|c| c.is_alphanumeric()).take(20).collect();
      let content = format!("{prefix}@{run}");
      TestResult::from_bool(at_end(&content).is_none())
    }

    fn replaceable_string_reproduces_trigger_run(lead: String, run: String) -> TestResult {
      let run: String = run.chars().filter(|c| c.is_alphanumeric()).take(ALIAS_LENGTH_LIMIT).collect();
      if run.is_empty() {
        return TestResult::discard();
      }
      let content = format!("{lead} @{run}");
      let Some(span) = at_end(&content) else {
        return TestResult::failed();
      };
      let chars: Vec<char> = content.chars().collect();
      let reproduced: String = chars[span.range()].iter().collect();
      TestResult::from_bool(
        span.replaceable_string == format!("@{run}")
          && reproduced == span.replaceable_string
          && span.lead_offset == lead.chars().count() + 1,
      )
    }
  }
}
