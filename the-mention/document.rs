//! The editable document as seen by the mention engine.
//!
//! The engine only ever reads the cursor-adjacent [`TextWindow`] and writes
//! through the four [`Document`] operations. Offsets handed to
//! [`Document::replace_range`] are char offsets relative to the window the
//! document reported last.

use std::ops::Range;

use ropey::Rope;

/// Text of the node or line being edited, with the cursor inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextWindow {
  pub content: String,
  /// Char offset of the cursor within `content`.
  pub cursor:  usize,
}

impl TextWindow {
  pub fn new(content: impl Into<String>, cursor: usize) -> Self {
    Self {
      content: content.into(),
      cursor,
    }
  }

  /// Window with the cursor after the last char.
  pub fn at_end(content: impl Into<String>) -> Self {
    let content = content.into();
    let cursor = content.chars().count();
    Self { content, cursor }
  }
}

/// Structured mention node referencing an account handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MentionToken {
  pub handle: String,
}

impl MentionToken {
  pub fn new(handle: impl Into<String>) -> Self {
    Self {
      handle: handle.into(),
    }
  }

  /// Plain text rendering of the token.
  pub fn text(&self) -> String {
    format!("@{}", self.handle)
  }

  pub fn len_chars(&self) -> usize {
    1 + self.handle.chars().count()
  }
}

pub trait Document {
  fn text_window(&self) -> TextWindow;

  /// Replace the window-relative char range `from..to` with `token`.
  fn replace_range(&mut self, from: usize, to: usize, token: &MentionToken);

  /// Insert plain text at the cursor and move the cursor past it.
  fn insert_text(&mut self, text: &str);

  /// Place the cursor right after the most recently inserted `token`.
  fn move_cursor_after(&mut self, token: &MentionToken);
}

/// A committed mention inside a [`TextDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionRange {
  pub handle: String,
  /// Absolute char range of the rendered token.
  pub range:  Range<usize>,
}

/// Rope backed plain-text document with a single cursor.
///
/// The window is the run of text holding the cursor: its line, starting after
/// the last committed mention, the way a rich-text editor keeps mentions in
/// their own nodes. Mention tokens are rendered as `@handle` and their
/// positions are tracked across later edits.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
  text:       Rope,
  cursor:     usize,
  mentions:   Vec<MentionRange>,
  last_token: Option<usize>,
}

impl TextDocument {
  /// Document with the cursor at the end of `text`.
  pub fn new(text: &str) -> Self {
    let text = Rope::from_str(text);
    let cursor = text.len_chars();
    Self {
      text,
      cursor,
      ..Default::default()
    }
  }

  pub fn with_cursor(text: &str, cursor: usize) -> Self {
    let mut doc = Self::new(text);
    doc.set_cursor(cursor);
    doc
  }

  pub fn text(&self) -> String {
    self.text.to_string()
  }

  pub fn cursor(&self) -> usize {
    self.cursor
  }

  pub fn set_cursor(&mut self, cursor: usize) {
    self.cursor = cursor.min(self.text.len_chars());
  }

  pub fn mentions(&self) -> &[MentionRange] {
    &self.mentions
  }

  /// Delete the char before the cursor.
  pub fn backspace(&mut self) {
    if self.cursor == 0 {
      return;
    }
    let from = self.cursor - 1;
    self.remove(from..self.cursor);
    self.cursor = from;
  }

  /// Start of the text run holding the cursor: the line start, or the end of
  /// the last mention before the cursor on that line.
  fn window_origin(&self) -> usize {
    let line_start = self.text.line_to_char(self.text.char_to_line(self.cursor));
    self
      .mentions
      .iter()
      .map(|mention| mention.range.end)
      .filter(|&end| end >= line_start && end <= self.cursor)
      .max()
      .unwrap_or(line_start)
  }

  fn remove(&mut self, range: Range<usize>) {
    let removed = range.len();
    self.text.remove(range.clone());
    let before = self.mentions.len();
    self.mentions.retain(|mention| {
      mention.range.end <= range.start || mention.range.start >= range.end
    });
    if self.mentions.len() != before {
      self.last_token = None;
    }
    for mention in &mut self.mentions {
      if mention.range.start >= range.end {
        mention.range.start -= removed;
        mention.range.end -= removed;
      }
    }
  }

  fn insert(&mut self, at: usize, text: &str) -> usize {
    let inserted = text.chars().count();
    self.text.insert(at, text);
    for mention in &mut self.mentions {
      if mention.range.start >= at {
        mention.range.start += inserted;
        mention.range.end += inserted;
      }
    }
    inserted
  }
}

impl Document for TextDocument {
  fn text_window(&self) -> TextWindow {
    let origin = self.window_origin();
    let content: String = self
      .text
      .chars_at(origin)
      .take_while(|&ch| ch != '\n' && ch != '\r')
      .collect();
    TextWindow::new(content, self.cursor - origin)
  }

  fn replace_range(&mut self, from: usize, to: usize, token: &MentionToken) {
    let origin = self.window_origin();
    let len = self.text.len_chars();
    let start = (origin + from).min(len);
    let end = (origin + to).clamp(start, len);

    self.remove(start..end);
    let inserted = self.insert(start, &token.text());
    let token_end = start + inserted;

    if self.cursor >= end {
      self.cursor = self.cursor - (end - start) + inserted;
    } else if self.cursor > start {
      self.cursor = token_end;
    }

    let position = self
      .mentions
      .partition_point(|mention| mention.range.start < start);
    self.mentions.insert(position, MentionRange {
      handle: token.handle.clone(),
      range:  start..token_end,
    });
    self.last_token = Some(position);
  }

  fn insert_text(&mut self, text: &str) {
    let inserted = self.insert(self.cursor, text);
    self.cursor += inserted;
  }

  fn move_cursor_after(&mut self, token: &MentionToken) {
    let Some(mention) = self.last_token.and_then(|idx| self.mentions.get(idx)) else {
      return;
    };
    if mention.handle == token.handle {
      self.cursor = mention.range.end;
    }
  }
}
