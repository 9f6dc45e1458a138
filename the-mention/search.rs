//! Remote profile search collaborator.

use async_trait::async_trait;
use thiserror::Error;

use crate::candidate::RawProfile;

#[derive(Debug, Error)]
pub enum SearchError {
  #[error("profile search unavailable: {0}")]
  Unavailable(String),
  #[error("profile search rejected the request ({status}): {message}")]
  Rejected { status: u16, message: String },
  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

/// Looks up profiles matching a partial handle or name.
///
/// Results are expected in relevance order. The engine calls this once per
/// settled query and may have several calls in flight at the same time.
#[async_trait]
pub trait ProfileSearch: Send + Sync {
  async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawProfile>, SearchError>;
}

/// In-memory search over a fixed set of profiles.
///
/// A profile matches when its handle or name contains the query, ignoring
/// case. Results keep the directory order.
#[derive(Debug, Clone, Default)]
pub struct ProfileDirectory {
  profiles: Vec<RawProfile>,
}

impl ProfileDirectory {
  pub fn new(profiles: Vec<RawProfile>) -> Self {
    Self { profiles }
  }

  pub fn lookup(&self, query: &str, limit: usize) -> Vec<RawProfile> {
    let query = query.to_lowercase();
    self
      .profiles
      .iter()
      .filter(|profile| {
        profile.handle.to_lowercase().contains(&query)
          || profile
            .name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&query))
      })
      .take(limit)
      .cloned()
      .collect()
  }
}

#[async_trait]
impl ProfileSearch for ProfileDirectory {
  async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawProfile>, SearchError> {
    Ok(self.lookup(query, limit))
  }
}
