//! Search backend capability.
//!
//! The backend is an external collaborator that turns a query into a status message and an
//! ordered list of clips. Two transports are provided: an HTTP endpoint taking a JSON body,
//! and a local program that prints the same JSON document on stdout.

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::BackendSpec;

/// One clip: an external video id plus the 1-based subtitle start second.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoRef {
  pub id: String,
  pub start: f64,
}

/// Backend response. Both fields are required; a response missing either is malformed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResult {
  pub msg: String,
  pub videos: Vec<VideoRef>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
  query: &'a str,
}

#[derive(Error, Debug)]
pub enum SearchError {
  #[error("backend request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("backend returned HTTP {0}")]
  Status(u16),

  #[error("malformed backend response: {0}")]
  Malformed(#[from] serde_json::Error),

  #[error("backend not available: {0}")]
  Unavailable(String),

  #[error("backend error: {0}")]
  Backend(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("search task ended without a response")]
  TaskFailed,
}

/// Anything that can answer a query. Object safe so the UI can hold `Arc<dyn SearchBackend>`.
pub trait SearchBackend: Send + Sync {
  fn search(&self, query: String) -> BoxFuture<'static, Result<SearchResult, SearchError>>;
}

/// Decode a backend JSON document.
pub fn parse_response(body: &[u8]) -> Result<SearchResult, SearchError> {
  Ok(serde_json::from_slice(body)?)
}

// --- HTTP ---

pub struct HttpBackend {
  client: Client,
  url: String,
}

impl HttpBackend {
  pub fn new(url: impl Into<String>) -> Self {
    Self { client: Client::new(), url: url.into() }
  }
}

impl SearchBackend for HttpBackend {
  fn search(&self, query: String) -> BoxFuture<'static, Result<SearchResult, SearchError>> {
    let client = self.client.clone();
    let url = self.url.clone();
    async move {
      debug!(url = %url, query = %query, "http backend: POST");
      let response = client.post(&url).json(&SearchRequest { query: &query }).send().await?;
      let status = response.status();
      if !status.is_success() {
        return Err(SearchError::Status(status.as_u16()));
      }
      let body = response.bytes().await?;
      parse_response(&body)
    }
    .boxed()
  }
}

// --- Local program ---

/// Runs `<program> [args...] -- <query>` and reads the JSON result from stdout.
pub struct CommandBackend {
  program: String,
  args: Vec<String>,
}

impl CommandBackend {
  pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
    Self { program: program.into(), args }
  }
}

impl SearchBackend for CommandBackend {
  fn search(&self, query: String) -> BoxFuture<'static, Result<SearchResult, SearchError>> {
    let program = self.program.clone();
    let args = self.args.clone();
    async move {
      debug!(program = %program, query = %query, "command backend: spawn");
      let output = Command::new(&program)
        .args(&args)
        .args(["--", query.as_str()])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
          if e.kind() == std::io::ErrorKind::NotFound {
            SearchError::Unavailable(format!("{} not found on PATH", program))
          } else {
            SearchError::Io(e)
          }
        })?;

      if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let detail = if stderr.is_empty() { format!("{} exited with {}", program, output.status) } else { stderr };
        return Err(SearchError::Backend(detail));
      }

      parse_response(&output.stdout)
    }
    .boxed()
  }
}

/// Build the backend described by the resolved settings.
pub fn from_spec(spec: &BackendSpec) -> Arc<dyn SearchBackend> {
  match spec {
    BackendSpec::Http { url } => {
      info!(url = %url, "using HTTP search backend");
      Arc::new(HttpBackend::new(url.clone()))
    }
    BackendSpec::Command { program, args } => {
      info!(program = %program, "using command search backend");
      Arc::new(CommandBackend::new(program.clone(), args.clone()))
    }
  }
}


#[cfg(test)]
pub(crate) mod testing {
  use super::*;
  use std::collections::HashMap;
  use std::sync::Mutex;

  /// Canned reply for one query.
  #[derive(Clone)]
  pub enum Answer {
    Found(SearchResult),
    Fail(String),
    Hang,
    Panic,
  }

  /// In-memory backend answering from a fixed table and recording every query it receives.
  #[derive(Default)]
  pub struct FakeBackend {
    answers: HashMap<String, Answer>,
    calls: Mutex<Vec<String>>,
  }

  impl FakeBackend {
    pub fn new() -> Self {
      Self::default()
    }

    pub fn answer(mut self, query: &str, answer: Answer) -> Self {
      self.answers.insert(query.to_string(), answer);
      self
    }

    pub fn found(self, query: &str, msg: &str, videos: &[(&str, f64)]) -> Self {
      let videos = videos.iter().map(|(id, start)| VideoRef { id: id.to_string(), start: *start }).collect();
      self.answer(query, Answer::Found(SearchResult { msg: msg.to_string(), videos }))
    }

    pub fn calls(&self) -> Vec<String> {
      self.calls.lock().unwrap().clone()
    }
  }

  impl SearchBackend for FakeBackend {
    fn search(&self, query: String) -> BoxFuture<'static, Result<SearchResult, SearchError>> {
      self.calls.lock().unwrap().push(query.clone());
      match self.answers.get(&query).cloned() {
        Some(Answer::Found(result)) => futures::future::ready(Ok(result)).boxed(),
        Some(Answer::Fail(msg)) => futures::future::ready(Err(SearchError::Backend(msg))).boxed(),
        Some(Answer::Hang) => futures::future::pending().boxed(),
        Some(Answer::Panic) => {
          futures::future::lazy(|_| -> Result<SearchResult, SearchError> { panic!("backend crashed") }).boxed()
        }
        None => futures::future::ready(Err(SearchError::Backend(format!("no answer for {}", query)))).boxed(),
      }
    }
  }
}
