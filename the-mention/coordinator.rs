//! Query lifecycle: from a classified span to an applied candidate list.
//!
//! Every fetch carries the query it was issued for. When it completes, its
//! result is applied only if that query is still the active one, otherwise it
//! is dropped. There is no hard cancellation of in-flight searches, losing
//! the span or typing further simply makes their results stale.

use std::sync::Arc;

use crate::{
  candidate::{
    RawProfile,
    normalize,
  },
  config::{
    CandidateConfig,
    MentionConfig,
  },
  matcher::MatchSpan,
  observe::{
    self,
    Observer,
  },
  search::SearchError,
  state::EngineState,
};

/// Result of a search, tagged with the query it was issued for.
#[derive(Debug)]
pub struct FetchOutcome {
  pub query:  String,
  pub result: Result<Vec<RawProfile>, SearchError>,
}

/// What a new classification means for the query lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
  /// Nothing to fetch or clear.
  Unchanged,
  /// A new query became active and must be searched.
  Fetch(String),
  /// The span was lost and the state cleared.
  Cleared,
  /// The query became empty. It is not searched and a pending search for the
  /// previous query must be dropped.
  Unsearched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDisposition {
  /// The result belonged to the active query, the list now has this many
  /// candidates.
  Applied(usize),
  /// The query was superseded before the result arrived.
  Stale,
  /// The active query's search failed, the list is empty.
  Failed,
}

pub struct FetchCoordinator {
  limit:      usize,
  candidates: CandidateConfig,
  observer:   Arc<dyn Observer>,
}

impl FetchCoordinator {
  pub fn new(config: &MentionConfig, observer: Arc<dyn Observer>) -> Self {
    Self {
      limit: config.max_suggestions,
      candidates: config.candidates.clone(),
      observer,
    }
  }

  pub fn limit(&self) -> usize {
    self.limit
  }

  pub fn on_span(&self, state: &mut EngineState, span: Option<MatchSpan>) -> Transition {
    let Some(span) = span else {
      if state.match_span.is_none() && state.active_query.is_none() {
        return Transition::Unchanged;
      }
      state.clear();
      return Transition::Cleared;
    };

    if state.active_query.as_deref() == Some(span.matching_string.as_str()) {
      state.match_span = Some(span);
      return Transition::Unchanged;
    }

    // Candidates of the previous query stay until the new result lands.
    let query = span.matching_string.clone();
    state.active_query = Some(query.clone());
    state.match_span = Some(span);
    if query.is_empty() {
      Transition::Unsearched
    } else {
      Transition::Fetch(query)
    }
  }

  pub fn on_complete(&self, state: &mut EngineState, outcome: FetchOutcome) -> FetchDisposition {
    let FetchOutcome { query, result } = outcome;
    if state.active_query.as_deref() != Some(query.as_str()) {
      tracing::trace!(query = %query, "dropping stale mention results");
      return FetchDisposition::Stale;
    }

    match result {
      Ok(raw) => {
        state.candidates = normalize(&raw, self.limit, &self.candidates);
        tracing::debug!(query = %query, count = state.candidates.len(), "mention candidates applied");
        FetchDisposition::Applied(state.candidates.len())
      },
      Err(err) => {
        state.candidates.clear();
        self
          .observer
          .record(observe::SEARCH_FAILED, &[("query", query), ("error", err.to_string())]);
        FetchDisposition::Failed
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use parking_lot::Mutex;

  use super::*;
  use crate::{
    matcher::match_mention,
    state::Phase,
  };

  #[derive(Default)]
  struct Recorder(Mutex<Vec<(String, Vec<(String, String)>)>>);

  impl Observer for Recorder {
    fn record(&self, event: &str, attributes: &[(&str, String)]) {
      let attributes = attributes
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
      self.0.lock().push((event.to_string(), attributes));
    }
  }

  fn coordinator() -> (FetchCoordinator, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let coordinator = FetchCoordinator::new(&MentionConfig::default(), recorder.clone());
    (coordinator, recorder)
  }

  fn typed(text: &str) -> Option<MatchSpan> {
    match_mention(text, text.chars().count())
  }

  fn found(query: &str, handles: &[&str]) -> FetchOutcome {
    let profiles = handles
      .iter()
      .map(|handle| {
        RawProfile {
          id:       format!("id-{handle}"),
          name:     None,
          handle:   handle.to_string(),
          picture:  None,
          owned_by: "0x1".to_string(),
        }
      })
      .collect();
    FetchOutcome {
      query:  query.to_string(),
      result: Ok(profiles),
    }
  }

  #[test]
  fn only_latest_query_is_applied() {
    let (coordinator, _) = coordinator();
    let mut state = EngineState::default();

    let mut fetches = Vec::new();
    for text in ["@al", "@ali", "@alice"] {
      if let Transition::Fetch(query) = coordinator.on_span(&mut state, typed(text)) {
        fetches.push(query);
      }
    }
    assert_eq!(fetches, ["al", "ali", "alice"]);

    let dispositions = [
      coordinator.on_complete(&mut state, found("alice", &["alice.lens"])),
      coordinator.on_complete(&mut state, found("al", &["al.lens", "alan.lens"])),
      coordinator.on_complete(&mut state, found("ali", &["ali.lens"])),
    ];
    assert_eq!(dispositions, [
      FetchDisposition::Applied(1),
      FetchDisposition::Stale,
      FetchDisposition::Stale,
    ]);
    assert_eq!(state.candidates[0].handle, "alice.lens");
    assert_eq!(state.phase(), Phase::Suggesting);
  }

  #[test]
  fn same_query_does_not_refetch() {
    let (coordinator, _) = coordinator();
    let mut state = EngineState::default();

    assert_eq!(
      coordinator.on_span(&mut state, typed("@bob")),
      Transition::Fetch("bob".into())
    );
    assert_eq!(
      coordinator.on_span(&mut state, typed("@bob")),
      Transition::Unchanged
    );
    assert_eq!(
      coordinator.on_span(&mut state, typed("hi @bob")),
      Transition::Unchanged
    );
    assert_eq!(state.match_span.as_ref().map(|s| s.lead_offset), Some(3));
  }

  #[test]
  fn losing_the_span_clears_and_drops_results() {
    let (coordinator, _) = coordinator();
    let mut state = EngineState::default();

    coordinator.on_span(&mut state, typed("@bo"));
    coordinator.on_complete(&mut state, found("bo", &["bob.lens"]));
    assert_eq!(state.phase(), Phase::Suggesting);

    coordinator.on_span(&mut state, typed("@bob"));
    assert_eq!(coordinator.on_span(&mut state, typed("@bob  ")), Transition::Cleared);
    assert_eq!(state, EngineState::default());
    assert_eq!(
      coordinator.on_complete(&mut state, found("bob", &["bob.lens"])),
      FetchDisposition::Stale
    );
    assert_eq!(coordinator.on_span(&mut state, None), Transition::Unchanged);

    // Coming back to the same text is a fresh query.
    assert_eq!(
      coordinator.on_span(&mut state, typed("@bob")),
      Transition::Fetch("bob".into())
    );
  }

  #[test]
  fn candidates_stay_visible_while_query_changes() {
    let (coordinator, _) = coordinator();
    let mut state = EngineState::default();

    coordinator.on_span(&mut state, typed("@ca"));
    coordinator.on_complete(&mut state, found("ca", &["carol.lens", "cato.lens"]));
    coordinator.on_span(&mut state, typed("@car"));

    assert_eq!(state.active_query.as_deref(), Some("car"));
    assert_eq!(state.candidates.len(), 2);
  }

  #[test]
  fn failure_empties_list_and_is_reported() {
    let (coordinator, recorder) = coordinator();
    let mut state = EngineState::default();

    coordinator.on_span(&mut state, typed("@da"));
    coordinator.on_complete(&mut state, found("da", &["dave.lens"]));
    coordinator.on_span(&mut state, typed("@dan"));
    let disposition = coordinator.on_complete(&mut state, FetchOutcome {
      query:  "dan".to_string(),
      result: Err(SearchError::Unavailable("timeout".to_string())),
    });

    assert_eq!(disposition, FetchDisposition::Failed);
    assert_eq!(state.phase(), Phase::Matching);
    let events = recorder.0.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, observe::SEARCH_FAILED);
    assert_eq!(events[0].1[0], ("query".to_string(), "dan".to_string()));
  }

  #[test]
  fn stale_failure_is_silent() {
    let (coordinator, recorder) = coordinator();
    let mut state = EngineState::default();

    coordinator.on_span(&mut state, typed("@ed"));
    coordinator.on_span(&mut state, typed("@eddy"));
    let disposition = coordinator.on_complete(&mut state, FetchOutcome {
      query:  "ed".to_string(),
      result: Err(SearchError::Unavailable("offline".to_string())),
    });

    assert_eq!(disposition, FetchDisposition::Stale);
    assert!(recorder.0.lock().is_empty());
  }

  #[test]
  fn empty_query_is_not_searched() {
    let recorder = Arc::new(Recorder::default());
    let config = MentionConfig {
      min_query_len: 0,
      ..MentionConfig::default()
    };
    let coordinator = FetchCoordinator::new(&config, recorder);
    let mut state = EngineState::default();

    let bare = || crate::matcher::match_mention_with("@", 1, 0);
    assert_eq!(coordinator.on_span(&mut state, bare()), Transition::Unsearched);
    assert_eq!(state.phase(), Phase::Matching);
    assert_eq!(coordinator.on_span(&mut state, bare()), Transition::Unchanged);
    assert_eq!(
      coordinator.on_span(&mut state, typed("@f")),
      Transition::Fetch("f".into())
    );

    // Deleting back to the trigger drops the pending search.
    assert_eq!(coordinator.on_span(&mut state, bare()), Transition::Unsearched);
    assert_eq!(state.active_query.as_deref(), Some(""));
  }
}
