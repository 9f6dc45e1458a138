//! Turning a chosen suggestion into a document edit.

use thiserror::Error;

use crate::{
  candidate::Candidate,
  document::{
    Document,
    MentionToken,
  },
  state::EngineState,
};

/// Commit attempted outside of its contract. These are programming errors,
/// never caused by user input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommitError {
  #[error("no mention is being typed")]
  NoActiveSpan,
  #[error("candidate {id} is not among the current suggestions")]
  UnknownCandidate { id: String },
}

/// Replace `from..to` (window-relative chars) with `token`, then type
/// `trailing` after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMutation {
  pub from:     usize,
  pub to:       usize,
  pub token:    MentionToken,
  pub trailing: String,
}

impl DocumentMutation {
  /// Window-relative cursor once the mutation is applied.
  pub fn cursor_after(&self) -> usize {
    self.from + self.token.len_chars() + self.trailing.chars().count()
  }

  pub fn apply<D: Document + ?Sized>(&self, doc: &mut D) {
    doc.replace_range(self.from, self.to, &self.token);
    doc.move_cursor_after(&self.token);
    doc.insert_text(&self.trailing);
  }
}

/// Build the mutation replacing the typed mention with `chosen` and reset
/// `state`. On error `state` is left untouched.
pub fn commit(state: &mut EngineState, chosen: &Candidate) -> Result<DocumentMutation, CommitError> {
  let span = state.match_span.as_ref().ok_or(CommitError::NoActiveSpan)?;
  if state.candidate(&chosen.id).is_none() {
    return Err(CommitError::UnknownCandidate {
      id: chosen.id.clone(),
    });
  }

  let range = span.range();
  let mutation = DocumentMutation {
    from:     range.start,
    to:       range.end,
    token:    MentionToken::new(chosen.handle.clone()),
    trailing: " ".to_string(),
  };
  state.clear();
  Ok(mutation)
}
