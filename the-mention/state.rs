use crate::{
  candidate::{
    Candidate,
    CandidateList,
  },
  matcher::MatchSpan,
};

/// Where the engine stands between two events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  /// No mention at the cursor.
  Idle,
  /// A mention is being typed, suggestions are pending or empty.
  Matching,
  /// A mention is being typed and suggestions are available.
  Suggesting,
}

/// Mention state of a single composer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineState {
  pub active_query: Option<String>,
  pub candidates:   CandidateList,
  pub match_span:   Option<MatchSpan>,
}

impl EngineState {
  pub fn phase(&self) -> Phase {
    match (&self.match_span, self.candidates.is_empty()) {
      (None, _) => Phase::Idle,
      (Some(_), true) => Phase::Matching,
      (Some(_), false) => Phase::Suggesting,
    }
  }

  pub fn is_idle(&self) -> bool {
    self.phase() == Phase::Idle
  }

  pub fn candidate(&self, id: &str) -> Option<&Candidate> {
    self.candidates.iter().find(|candidate| candidate.id == id)
  }

  pub fn clear(&mut self) {
    self.active_query = None;
    self.candidates.clear();
    self.match_span = None;
  }
}
