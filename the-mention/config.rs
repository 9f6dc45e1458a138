use std::time::Duration;

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::matcher::DEFAULT_MIN_MATCH_LEN;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid mention config: {0}")]
  Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct MentionConfig {
  /// Chars required after the trigger before a search is issued.
  pub min_query_len:   usize,
  /// Quiet period after the last query change before searching.
  pub debounce_ms:     u64,
  /// Number of suggestions requested and shown.
  pub max_suggestions: usize,
  pub candidates:      CandidateConfig,
}

impl Default for MentionConfig {
  fn default() -> Self {
    Self {
      min_query_len:   DEFAULT_MIN_MATCH_LEN,
      debounce_ms:     100,
      max_suggestions: 5,
      candidates:      CandidateConfig::default(),
    }
  }
}

impl MentionConfig {
  pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(source)?)
  }

  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }
}

/// How avatar URLs are resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct CandidateConfig {
  pub ipfs_gateway:     String,
  pub arweave_gateway:  String,
  /// Prefix of the generated avatar, the account address is appended.
  pub fallback_avatar:  String,
  /// Optional image CDN prefix put in front of every avatar URL.
  pub avatar_transform: Option<String>,
}

impl Default for CandidateConfig {
  fn default() -> Self {
    Self {
      ipfs_gateway:     "https://gw.ipfs-lens.dev/ipfs/".to_string(),
      arweave_gateway:  "https://arweave.net/".to_string(),
      fallback_avatar:  "https://cdn.stamp.fyi/avatar/eth:".to_string(),
      avatar_transform: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_source_is_default() {
    assert_eq!(MentionConfig::from_toml("").unwrap(), MentionConfig::default());
  }

  #[test]
  fn partial_override() {
    let config = MentionConfig::from_toml(
      r#"
      debounce-ms = 0
      max-suggestions = 8

      [candidates]
      avatar-transform = "https://ik.imagekit.io/lens/tr:w-60,h-60"
      "#,
    )
    .unwrap();

    assert_eq!(config.debounce(), Duration::ZERO);
    assert_eq!(config.max_suggestions, 8);
    assert_eq!(config.min_query_len, 1);
    assert_eq!(
      config.candidates.avatar_transform.as_deref(),
      Some("https://ik.imagekit.io/lens/tr:w-60,h-60")
    );
    assert_eq!(config.candidates.arweave_gateway, "https://arweave.net/");
  }

  #[test]
  fn unknown_keys_are_rejected() {
    let err = MentionConfig::from_toml("max-results = 3").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
  }
}
