//! Event plumbing shared by composer plugins.
//!
//! Composer plugins react to keystrokes synchronously but most of their work
//! (remote lookups, debouncing) happens off the input path. [`AsyncHook`]
//! moves that work onto a background tokio task fed through a channel.

mod debounce;

pub use debounce::{
  AsyncHook,
  HookSender,
  send_blocking,
  try_send,
};
