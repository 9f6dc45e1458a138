//! Mapping of raw profile search results into display-ready suggestions.
//!
//! The search service returns profiles in relevance order. [`normalize`] keeps
//! that order, cleans up names and avatars and caps the list. The same input
//! always produces the same output.

use serde::{
  Deserialize,
  Serialize,
};

use crate::config::CandidateConfig;

/// A profile as returned by the search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProfile {
  pub id:       String,
  #[serde(default)]
  pub name:     Option<String>,
  pub handle:   String,
  #[serde(default)]
  pub picture:  Option<AvatarSource>,
  /// Address of the account owner.
  pub owned_by: String,
}

/// Where a profile's picture comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AvatarSource {
  /// Structured media set, `url` is the original size image.
  Primary { url: Option<String> },
  /// Content-addressed image such as an NFT picture.
  ContentAddressed { uri: String },
}

/// Avatar choice for a profile, in resolution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar<'a> {
  Primary(&'a str),
  ContentAddressed(&'a str),
  /// Generated from the owner address.
  Fallback(&'a str),
}

impl<'a> Avatar<'a> {
  pub fn resolve(profile: &'a RawProfile) -> Self {
    match &profile.picture {
      Some(AvatarSource::Primary { url: Some(url) }) if !url.is_empty() => Avatar::Primary(url),
      Some(AvatarSource::ContentAddressed { uri }) if !uri.is_empty() => {
        Avatar::ContentAddressed(uri)
      },
      _ => Avatar::Fallback(&profile.owned_by),
    }
  }

  pub fn url(&self, config: &CandidateConfig) -> String {
    let url = match self {
      Avatar::Primary(url) | Avatar::ContentAddressed(url) => sanitize_storage_url(url, config),
      Avatar::Fallback(address) => {
        format!("{}{}?s=300", config.fallback_avatar, address.to_lowercase())
      },
    };
    match &config.avatar_transform {
      Some(transform) if !url.is_empty() => format!("{}/{url}", transform.trim_end_matches('/')),
      _ => url,
    }
  }
}

/// A suggestion eligible for selection. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
  pub id:           String,
  pub display_name: String,
  pub handle:       String,
  pub avatar_url:   String,
}

pub type CandidateList = Vec<Candidate>;

pub fn normalize(raw: &[RawProfile], limit: usize, config: &CandidateConfig) -> CandidateList {
  raw
    .iter()
    .take(limit)
    .map(|profile| {
      let display_name = profile
        .name
        .as_deref()
        .map(sanitize_display_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| profile.handle.clone());
      Candidate {
        id: profile.id.clone(),
        display_name,
        handle: profile.handle.clone(),
        avatar_url: Avatar::resolve(profile).url(config),
      }
    })
    .collect()
}

/// Strip invisible formatting characters used to spoof names, then trim.
pub fn sanitize_display_name(name: &str) -> String {
  name
    .chars()
    .filter(|ch| !is_invisible_format_char(*ch))
    .collect::<String>()
    .trim()
    .to_string()
}

fn is_invisible_format_char(ch: char) -> bool {
  matches!(
    ch,
    '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2069}' | '\u{FEFF}'
  )
}

/// Rewrite decentralised storage links to their HTTP gateways.
pub fn sanitize_storage_url(url: &str, config: &CandidateConfig) -> String {
  const IPFS_PREFIXES: [&str; 3] = ["https://ipfs.io/ipfs/", "ipfs://ipfs/", "ipfs://"];

  if is_cid_v0(url) {
    return format!("{}{url}", config.ipfs_gateway);
  }
  for prefix in IPFS_PREFIXES {
    if let Some(rest) = url.strip_prefix(prefix) {
      return format!("{}{rest}", config.ipfs_gateway);
    }
  }
  if let Some(rest) = url.strip_prefix("ar://") {
    return format!("{}{rest}", config.arweave_gateway);
  }
  url.to_string()
}

/// Bare base58 `Qm...` IPFS hash.
fn is_cid_v0(url: &str) -> bool {
  const BASE58: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

  url.len() == 46
    && url.starts_with("Qm")
    && url[2..].chars().all(|ch| BASE58.contains(ch))
}
