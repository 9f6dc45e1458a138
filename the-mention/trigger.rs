//! Other typeahead triggers sharing the composer with mentions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::matcher::{
  LENGTH_LIMIT,
  MatchSpan,
  span_from_captures,
  typeahead_regex,
  valid_chars,
};

pub const SLASH_TRIGGER: char = '/';

static SLASH_REGEX: Lazy<Regex> = Lazy::new(|| {
  typeahead_regex(SLASH_TRIGGER, &valid_chars(SLASH_TRIGGER), LENGTH_LIMIT)
    .expect("slash trigger regex should compile")
});

/// Decides whether another typeahead menu owns the text before the cursor.
pub trait CompetingTrigger: Send + Sync {
  fn claims(&self, text: &str) -> bool;
}

impl<F> CompetingTrigger for F
where
  F: Fn(&str) -> bool + Send + Sync,
{
  fn claims(&self, text: &str) -> bool {
    (self)(text)
  }
}

/// Never claims anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompetingTrigger;

impl CompetingTrigger for NoCompetingTrigger {
  fn claims(&self, _text: &str) -> bool {
    false
  }
}

/// A plain single-token typeahead trigger such as the `/` command menu: the
/// trigger after start of text, whitespace or `(`, followed by up to
/// `max_len` characters that are neither punctuation nor whitespace.
#[derive(Debug, Clone)]
pub struct TypeaheadTrigger {
  trigger: char,
  min_len: usize,
  regex:   Regex,
}

impl TypeaheadTrigger {
  pub fn new(trigger: char, min_len: usize, max_len: usize) -> Result<Self, regex::Error> {
    Ok(Self {
      trigger,
      min_len,
      regex: typeahead_regex(trigger, &valid_chars(trigger), max_len)?,
    })
  }

  /// The `/` command trigger, which claims the text as soon as the slash is
  /// typed.
  pub fn slash() -> Self {
    Self {
      trigger: SLASH_TRIGGER,
      min_len: 0,
      regex:   SLASH_REGEX.clone(),
    }
  }

  pub fn trigger(&self) -> char {
    self.trigger
  }

  pub fn find(&self, text: &str) -> Option<MatchSpan> {
    let captures = self.regex.captures(text)?;
    span_from_captures(text, &captures, self.min_len)
  }
}

impl CompetingTrigger for TypeaheadTrigger {
  fn claims(&self, text: &str) -> bool {
    self.find(text).is_some()
  }
}
