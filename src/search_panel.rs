//! Query box and the in-flight search request.

use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::backend::{SearchBackend, SearchError, SearchResult};

type SearchReply = Result<SearchResult, SearchError>;

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

#[derive(Default)]
pub struct SearchPanel {
  pub query: String,
  /// Cursor position within `query` (char index).
  pub cursor: usize,
  /// Horizontal scroll offset of the rendered query (display columns).
  pub scroll: usize,
  message: String,
  pending: Option<oneshot::Receiver<SearchReply>>,
  pending_query: Option<String>,
  /// Task driving the in-flight request, aborted when a newer submit supersedes it.
  request_handle: Option<JoinHandle<()>>,
}

impl SearchPanel {
  pub fn new() -> Self {
    Self::default()
  }

  // --- Editing ---

  pub fn insert_char(&mut self, c: char) {
    let byte_idx = char_to_byte_index(&self.query, self.cursor);
    self.query.insert(byte_idx, c);
    self.cursor += 1;
  }

  pub fn backspace(&mut self) {
    if self.cursor > 0 {
      self.cursor -= 1;
      let byte_idx = char_to_byte_index(&self.query, self.cursor);
      self.query.remove(byte_idx);
    }
  }

  pub fn delete(&mut self) {
    if self.cursor < self.query.chars().count() {
      let byte_idx = char_to_byte_index(&self.query, self.cursor);
      self.query.remove(byte_idx);
    }
  }

  pub fn move_left(&mut self) {
    self.cursor = self.cursor.saturating_sub(1);
  }

  pub fn move_right(&mut self) {
    if self.cursor < self.query.chars().count() {
      self.cursor += 1;
    }
  }

  pub fn move_home(&mut self) {
    self.cursor = 0;
  }

  pub fn move_end(&mut self) {
    self.cursor = self.query.chars().count();
  }

  pub fn clear(&mut self) {
    self.query.clear();
    self.cursor = 0;
    self.scroll = 0;
  }

  // --- Search ---

  /// Human-readable status of the last successful search ("" before the first one).
  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn set_message(&mut self, msg: String) {
    self.message = msg;
  }

  pub fn is_pending(&self) -> bool {
    self.pending.is_some()
  }

  pub fn pending_query(&self) -> Option<&str> {
    self.pending_query.as_deref()
  }

  /// Send the trimmed query to `backend` on a background task.
  ///
  /// Returns the submitted query, or `None` when it was blank (nothing is sent). Any request
  /// still in flight is cancelled.
  pub fn submit(&mut self, backend: &Arc<dyn SearchBackend>) -> Option<String> {
    let query = self.query.trim().to_string();
    if query.is_empty() {
      return None;
    }
    if let Some(previous) = self.pending_query.take() {
      warn!(previous = %previous, query = %query, "search: superseding in-flight request");
    }
    self.cancel();
    info!(query = %query, "search: submitted");

    let request = backend.search(query.clone());
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
      let _ = tx.send(request.await);
    });
    self.request_handle = Some(handle);
    self.pending = Some(rx);
    self.pending_query = Some(query.clone());
    Some(query)
  }

  /// Abort the in-flight request, if any. Its reply will never be delivered.
  fn cancel(&mut self) {
    self.pending = None;
    if let Some(handle) = self.request_handle.take() {
      handle.abort();
    }
  }

  /// Non-blocking check for the reply to the latest submit.
  pub fn poll(&mut self) -> Option<SearchReply> {
    let mut rx = self.pending.take()?;
    match rx.try_recv() {
      Ok(reply) => {
        self.pending_query = None;
        self.request_handle = None;
        Some(reply)
      }
      Err(oneshot::error::TryRecvError::Empty) => {
        self.pending = Some(rx);
        None
      }
      Err(oneshot::error::TryRecvError::Closed) => {
        self.pending_query = None;
        self.request_handle = None;
        Some(Err(SearchError::TaskFailed))
      }
    }
  }
}
