//! Per-composer mention engine.
//!
//! [`MentionEngine`] owns the [`EngineState`] of one composer and drives it
//! through the mention state machine:
//!
//! - **Idle**: no mention at the cursor
//! - **Matching**: a mention is being typed, suggestions may still be loading
//! - **Suggesting**: suggestions are available
//!
//! Every edit goes through [`MentionEngine::on_edit`], which reclassifies the
//! text window from scratch. Losing the span at any point returns the engine
//! to idle. Selecting a suggestion ([`MentionEngine::select`]) commits it to
//! the document and returns to idle as well.
//!
//! Searches run in the background on the tokio runtime the engine was created
//! on. Their outcomes queue up until the owner feeds them back with
//! [`MentionEngine::poll_outcomes`] or [`MentionEngine::next_outcome`], so all
//! state changes happen on the owner's thread.
//!
//! Handing queries to the search hook never blocks. When the hook falls behind,
//! only the latest query event is kept and delivered on the next call.

use std::sync::Arc;

use the_composer_event::{
  AsyncHook,
  HookSender,
};
use tokio::sync::mpsc::{
  self,
  UnboundedReceiver,
};

use crate::{
  candidate::Candidate,
  commit::{
    CommitError,
    DocumentMutation,
    commit,
  },
  config::MentionConfig,
  coordinator::{
    FetchCoordinator,
    FetchDisposition,
    FetchOutcome,
    Transition,
  },
  document::{
    Document,
    TextWindow,
  },
  hook::{
    QueryEvent,
    QueryHook,
  },
  matcher::MentionMatcher,
  observe::{
    self,
    Observer,
  },
  search::ProfileSearch,
  state::{
    EngineState,
    Phase,
  },
};

pub struct MentionEngine {
  config:      MentionConfig,
  matcher:     MentionMatcher,
  coordinator: FetchCoordinator,
  state:       EngineState,
  observer:    Arc<dyn Observer>,
  queries:     HookSender<QueryEvent>,
  /// Latest query event the hook had no room for.
  unsent:      Option<QueryEvent>,
  outcomes:    UnboundedReceiver<FetchOutcome>,
}

impl MentionEngine {
  /// Engine yielding to the `/` command menu.
  pub fn new(
    config: MentionConfig,
    search: Arc<dyn ProfileSearch>,
    observer: Arc<dyn Observer>,
  ) -> Self {
    let matcher = MentionMatcher::new(config.min_query_len);
    Self::with_matcher(config, matcher, search, observer)
  }

  pub fn with_matcher(
    config: MentionConfig,
    matcher: MentionMatcher,
    search: Arc<dyn ProfileSearch>,
    observer: Arc<dyn Observer>,
  ) -> Self {
    let (tx, outcomes) = mpsc::unbounded_channel();
    let queries = QueryHook::new(search, config.max_suggestions, config.debounce(), tx).spawn();
    let coordinator = FetchCoordinator::new(&config, observer.clone());
    Self {
      config,
      matcher,
      coordinator,
      state: EngineState::default(),
      observer,
      queries,
      unsent: None,
      outcomes,
    }
  }

  pub fn config(&self) -> &MentionConfig {
    &self.config
  }

  pub fn state(&self) -> &EngineState {
    &self.state
  }

  pub fn phase(&self) -> Phase {
    self.state.phase()
  }

  pub fn candidates(&self) -> &[Candidate] {
    &self.state.candidates
  }

  /// Reclassify after an edit or cursor move.
  pub fn on_edit(&mut self, window: &TextWindow) -> Phase {
    let span = self.matcher.classify(window);
    match self.coordinator.on_span(&mut self.state, span) {
      Transition::Fetch(query) => {
        tracing::debug!(query = %query, "mention query changed");
        self.queue(QueryEvent::Settle(query));
      },
      Transition::Cleared => {
        tracing::debug!("mention span lost");
        self.queue(QueryEvent::Clear);
      },
      Transition::Unsearched => self.queue(QueryEvent::Clear),
      Transition::Unchanged => self.flush(),
    }
    self.state.phase()
  }

  pub fn on_document<D: Document + ?Sized>(&mut self, doc: &D) -> Phase {
    self.on_edit(&doc.text_window())
  }

  pub fn apply_outcome(&mut self, outcome: FetchOutcome) -> FetchDisposition {
    self.coordinator.on_complete(&mut self.state, outcome)
  }

  /// Apply every outcome that already arrived, without waiting. Returns how
  /// many were applied to the active query.
  pub fn poll_outcomes(&mut self) -> usize {
    self.flush();
    let mut applied = 0;
    while let Ok(outcome) = self.outcomes.try_recv() {
      if matches!(self.apply_outcome(outcome), FetchDisposition::Applied(_)) {
        applied += 1;
      }
    }
    applied
  }

  /// Wait for the next search outcome and apply it.
  ///
  /// Stays pending while no search is in flight, so race it against the
  /// composer's other events. Returns `None` only once the search hook has
  /// shut down.
  pub async fn next_outcome(&mut self) -> Option<FetchDisposition> {
    while self.unsent.is_some() {
      if !self.queries.ready().await {
        self.unsent = None;
        break;
      }
      self.flush();
    }
    let outcome = self.outcomes.recv().await?;
    Some(self.apply_outcome(outcome))
  }

  /// Commit `chosen` into `doc` in place of the typed mention.
  ///
  /// Selecting without an active mention or with a candidate that is not
  /// suggested panics in debug builds and does nothing in release builds.
  pub fn select<D: Document + ?Sized>(
    &mut self,
    doc: &mut D,
    chosen: &Candidate,
  ) -> Option<DocumentMutation> {
    let mutation = match commit(&mut self.state, chosen) {
      Ok(mutation) => mutation,
      Err(err) => {
        contract_violation(&err);
        return None;
      },
    };

    mutation.apply(doc);
    self.queue(QueryEvent::Clear);
    self.observer.record(observe::SELECTED, &[
      ("id", chosen.id.clone()),
      ("handle", chosen.handle.clone()),
    ]);
    Some(mutation)
  }

  /// [`select`](Self::select) by candidate id.
  pub fn select_id<D: Document + ?Sized>(&mut self, doc: &mut D, id: &str) -> Option<DocumentMutation> {
    let Some(chosen) = self.state.candidate(id).cloned() else {
      contract_violation(&CommitError::UnknownCandidate { id: id.to_string() });
      return None;
    };
    self.select(doc, &chosen)
  }

  /// Forget the current mention, e.g. when the composer closes.
  pub fn reset(&mut self) {
    self.state.clear();
    self.queue(QueryEvent::Clear);
  }

  /// Hand `event` to the hook without blocking. It supersedes any event still
  /// waiting for room, since the hook only acts on the latest one.
  fn queue(&mut self, event: QueryEvent) {
    self.unsent = self.queries.offer(event);
  }

  fn flush(&mut self) {
    if let Some(event) = self.unsent.take() {
      self.queue(event);
    }
  }
}

fn contract_violation(err: &CommitError) {
  if cfg!(debug_assertions) {
    panic!("mention commit contract violated: {err}");
  }
  tracing::error!(%err, "ignoring mention commit");
}
