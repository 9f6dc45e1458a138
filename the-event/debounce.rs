//! Utilities for declaring an async (usually debounced) composer hook

use std::time::Duration;

use futures_executor::block_on;
use tokio::{
  sync::mpsc::{
    self,
    Sender,
    error::TrySendError,
  },
  time::Instant,
};

/// Maximum time to block when sending to a full channel.
/// Typing must never stall on a busy hook, so the message is dropped instead.
const SEND_TIMEOUT_MS: u64 = 2;

/// Capacity of the channel feeding a hook. Bursts of keystrokes are drained
/// quickly, the headroom only matters when the runtime is briefly starved.
const HOOK_CHANNEL_CAPACITY: usize = 256;

/// Async hooks run as a background tokio task that waits for events sent from
/// the composer's input path. Every event is handed to
/// [`AsyncHook::handle_event`], which either consumes it right away or arms a
/// debounce deadline. Once the deadline passes without a newer event
/// rescheduling it, [`AsyncHook::finish_debounce`] runs.
pub trait AsyncHook: Sync + Send + 'static + Sized {
  type Event: Sync + Send + 'static;

  /// Called immediately whenever an event is received. Returning `Some`
  /// (re)arms the debounce deadline, returning `None` disarms it. The current
  /// deadline is passed in so a hook can keep it instead of extending it.
  fn handle_event(&mut self, event: Self::Event, timeout: Option<Instant>) -> Option<Instant>;

  /// Called whenever the debounce deadline is reached
  fn finish_debounce(&mut self);

  /// Start the hook on the current tokio runtime.
  ///
  /// Outside of a runtime nothing is spawned: events sent to the returned
  /// sender are dropped, so synchronous unit tests never need a runtime.
  fn spawn(self) -> HookSender<Self::Event> {
    let (tx, rx) = mpsc::channel(HOOK_CHANNEL_CAPACITY);
    if tokio::runtime::Handle::try_current().is_ok() {
      tokio::spawn(run(self, rx));
    } else {
      log::debug!("no tokio runtime, async hook not started");
    }
    HookSender { tx }
  }
}

async fn run<Hook: AsyncHook>(mut hook: Hook, mut rx: mpsc::Receiver<Hook::Event>) {
  let mut deadline = None;
  loop {
    let event = match deadline {
      Some(deadline_) => {
        let res = tokio::time::timeout_at(deadline_, rx.recv()).await;
        match res {
          Ok(event) => event,
          Err(_) => {
            hook.finish_debounce();
            deadline = None;
            continue;
          },
        }
      },
      None => rx.recv().await,
    };
    let Some(event) = event else {
      break;
    };
    deadline = hook.handle_event(event, deadline);
  }
}

/// Sending half of a spawned [`AsyncHook`].
///
/// Dropping every clone closes the channel, which stops the hook task after
/// it has handled the events already queued.
#[derive(Debug)]
pub struct HookSender<E> {
  tx: Sender<E>,
}

impl<E> Clone for HookSender<E> {
  fn clone(&self) -> Self {
    Self {
      tx: self.tx.clone(),
    }
  }
}

impl<E> HookSender<E> {
  /// See [`send_blocking`].
  pub fn send(&self, event: E) {
    send_blocking(&self.tx, event)
  }

  /// See [`try_send`].
  pub fn try_send(&self, event: E) -> bool {
    try_send(&self.tx, event)
  }

  /// Send without ever blocking. A full channel hands the event back so the
  /// caller can retry later, a closed channel drops it.
  pub fn offer(&self, event: E) -> Option<E> {
    match self.tx.try_send(event) {
      Ok(()) => None,
      Err(TrySendError::Full(event)) => Some(event),
      Err(TrySendError::Closed(_)) => None,
    }
  }

  /// Wait until the channel has room for an event. Returns false if the hook
  /// is gone. Cancel safe, nothing is sent.
  pub async fn ready(&self) -> bool {
    self.tx.reserve().await.is_ok()
  }

  /// Whether the hook task is gone (or was never started).
  pub fn is_closed(&self) -> bool {
    self.tx.is_closed()
  }
}

/// Send an event to a channel, blocking only briefly if the channel is full.
///
/// - First attempts a non-blocking send (fast path)
/// - If the channel is full, blocks for at most `SEND_TIMEOUT_MS` milliseconds
/// - If still full after timeout, the message is dropped
pub fn send_blocking<T>(tx: &Sender<T>, data: T) {
  match tx.try_send(data) {
    Ok(()) => {},
    Err(TrySendError::Full(data)) => {
      let _ = block_on(tx.send_timeout(data, Duration::from_millis(SEND_TIMEOUT_MS)));
    },
    Err(TrySendError::Closed(_)) => {
      log::warn!("Attempted to send to closed channel");
    },
  }
}

/// Try to send an event without blocking at all.
/// Returns true if the event was sent, false if the channel was full or closed.
pub fn try_send<T>(tx: &Sender<T>, data: T) -> bool {
  tx.try_send(data).is_ok()
}
