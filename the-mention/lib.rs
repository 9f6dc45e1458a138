//! Inline `@` mentions for the post composer.
//!
//! The pieces, leaf first:
//!
//! - [`matcher`]: classifies the text before the cursor into a [`MatchSpan`]
//! - [`candidate`]: turns raw search results into display-ready suggestions
//! - [`coordinator`] and [`hook`]: debounce searches and drop stale results
//! - [`commit`]: replaces the typed mention with a mention token
//! - [`engine`]: ties them together for one composer

pub mod candidate;
pub mod commit;
pub mod config;
pub mod coordinator;
pub mod document;
pub mod engine;
pub mod extract;
pub mod hook;
pub mod matcher;
pub mod observe;
pub mod search;
pub mod state;
pub mod trigger;

pub use candidate::{
  Candidate,
  CandidateList,
  RawProfile,
};
pub use config::MentionConfig;
pub use document::{
  Document,
  MentionToken,
  TextDocument,
  TextWindow,
};
pub use engine::MentionEngine;
pub use matcher::{
  MatchSpan,
  match_mention,
};
pub use search::{
  ProfileSearch,
  SearchError,
};
pub use state::{
  EngineState,
  Phase,
};
