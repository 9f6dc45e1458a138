//! Debounced issuing of profile searches.

use std::{
  sync::Arc,
  time::Duration,
};

use the_composer_event::AsyncHook;
use tokio::{
  sync::mpsc::UnboundedSender,
  time::Instant,
};

use crate::{
  coordinator::FetchOutcome,
  search::ProfileSearch,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
  /// The active query changed, search for it once typing settles.
  Settle(String),
  /// The span was lost or committed, forget the pending query.
  Clear,
}

/// Searches the latest settled query in the background and reports the
/// outcome, tagged with its query, to the owning engine.
pub struct QueryHook {
  search:   Arc<dyn ProfileSearch>,
  limit:    usize,
  debounce: Duration,
  pending:  Option<String>,
  outcomes: UnboundedSender<FetchOutcome>,
}

impl QueryHook {
  pub fn new(
    search: Arc<dyn ProfileSearch>,
    limit: usize,
    debounce: Duration,
    outcomes: UnboundedSender<FetchOutcome>,
  ) -> Self {
    Self {
      search,
      limit,
      debounce,
      pending: None,
      outcomes,
    }
  }
}

impl AsyncHook for QueryHook {
  type Event = QueryEvent;

  fn handle_event(&mut self, event: Self::Event, _timeout: Option<Instant>) -> Option<Instant> {
    match event {
      QueryEvent::Settle(query) => {
        self.pending = Some(query);
        Some(Instant::now() + self.debounce)
      },
      QueryEvent::Clear => {
        self.pending = None;
        None
      },
    }
  }

  fn finish_debounce(&mut self) {
    let Some(query) = self.pending.take() else {
      return;
    };

    tracing::debug!(query = %query, "searching mention candidates");
    let search = self.search.clone();
    let outcomes = self.outcomes.clone();
    let limit = self.limit;
    tokio::spawn(async move {
      let result = search.search(&query, limit).await;
      // The composer may be gone by now.
      let _ = outcomes.send(FetchOutcome { query, result });
    });
  }
}
