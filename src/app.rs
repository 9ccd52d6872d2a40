use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::backend::SearchBackend;
use crate::browser::VideoBrowser;
use crate::config::Settings;
use crate::constants::constants;
use crate::embed::EmbedTarget;
use crate::player::ClipPlayer;
use crate::search_panel::SearchPanel;
use crate::theme::{DARK, Theme};
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Typing in the search box.
  Input,
  /// Paging through clips with Previous / Next.
  Browse,
}

pub struct App {
  pub mode: AppMode,
  pub panel: SearchPanel,
  pub browser: VideoBrowser,
  pub player: ClipPlayer,
  pub settings: Settings,
  pub last_error: Option<String>,
  pub should_quit: bool,
  backend: Arc<dyn SearchBackend>,
  /// Clip the run loop should hand to the player next.
  play_request: Option<EmbedTarget>,
  /// Set when the playing clip no longer belongs to the list on screen.
  stop_request: bool,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(settings: Settings, backend: Arc<dyn SearchBackend>, viewport: &Viewport) -> Self {
    Self {
      mode: AppMode::Input,
      panel: SearchPanel::new(),
      browser: VideoBrowser::new(viewport.subscribe()),
      player: ClipPlayer::new(),
      settings,
      last_error: None,
      should_quit: false,
      backend,
      play_request: None,
      stop_request: false,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    &DARK
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  /// Clear the current error message and its expiry timer.
  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after the configured delay.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  // --- Search ---

  pub fn trigger_search(&mut self) {
    if self.panel.submit(&self.backend).is_some() {
      self.clear_error();
    } else {
      self.set_error("Enter a search term.".to_string());
    }
  }

  /// Apply background results. A failed search leaves the message and the clip list as they were.
  pub fn check_pending(&mut self) {
    if let Some(reply) = self.panel.poll() {
      match reply {
        Ok(result) => {
          self.panel.set_message(result.msg);
          self.browser.reset(result.videos);
          info!(msg = %self.panel.message(), count = self.browser.len(), "search: results arrived");
          if self.browser.is_empty() {
            self.mode = AppMode::Input;
            self.play_request = None;
            self.stop_request = true;
          } else {
            self.mode = AppMode::Browse;
            self.queue_autoplay();
          }
        }
        Err(e) => {
          warn!(err = %e, "search: failed");
          self.set_error(format!("Search failed: {}", e));
        }
      }
    }

    if self.browser.sync_viewport() {
      debug!(height = self.browser.viewport_height(), "viewport resized");
    }
    self.expire_error();
  }

  // --- Browsing ---

  /// Embed target of the clip on screen, with the configured caption language.
  pub fn current_target(&self) -> Option<EmbedTarget> {
    self.browser.embed_target(&self.settings.caption_lang)
  }

  pub fn show_prev(&mut self) {
    if self.browser.prev() {
      self.queue_autoplay();
    }
  }

  pub fn show_next(&mut self) {
    if self.browser.next() {
      self.queue_autoplay();
    }
  }

  /// Ask for the current clip to be played regardless of the autoplay setting.
  pub fn request_play(&mut self) {
    self.play_request = self.current_target();
    if let Some(ref target) = self.play_request {
      debug!(index = self.browser.current_index(), video_id = %target.video_id, "play requested");
    }
  }

  fn queue_autoplay(&mut self) {
    if self.settings.autoplay {
      self.request_play();
    } else {
      debug!("autoplay off: not starting player");
      self.play_request = None;
      self.stop_request = true;
    }
  }

  pub fn take_play_request(&mut self) -> Option<EmbedTarget> {
    self.play_request.take()
  }

  /// Whether the player is due to be stopped on the next [`App::drive_player`].
  pub fn stop_pending(&self) -> bool {
    self.stop_request
  }

  /// Apply pending stop and play requests to the player.
  pub async fn drive_player(&mut self) {
    if std::mem::take(&mut self.stop_request)
      && self.player.is_playing()
      && let Err(e) = self.player.stop().await
    {
      warn!(err = %e, "player: failed to stop");
      self.set_error(format!("Playback error: {:#}", e));
    }
    if let Some(target) = self.take_play_request()
      && let Err(e) = self.player.play(&target).await
    {
      warn!(err = %e, "player: failed to start");
      self.set_error(format!("Playback error: {:#}", e));
      let _ = self.player.stop().await;
    }
    self.player.check_mpv_status();
  }

  pub async fn stop_playback(&mut self) -> anyhow::Result<()> {
    self.player.stop().await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::testing::{Answer, FakeBackend};
  use crate::viewport::ViewportSize;

  fn app_with(fake: FakeBackend, settings: Settings) -> (Viewport, App) {
    let viewport = Viewport::new(ViewportSize::new(100, 40));
    let app = App::new(settings, Arc::new(fake), &viewport);
    (viewport, app)
  }

  fn type_query(app: &mut App, query: &str) {
    app.panel.clear();
    for c in query.chars() {
      app.panel.insert_char(c);
    }
  }

  async fn settle(app: &mut App) {
    for _ in 0..100 {
      if !app.panel.is_pending() {
        return;
      }
      tokio::task::yield_now().await;
      app.check_pending();
    }
  }

  fn hello_backend() -> FakeBackend {
    FakeBackend::new().found("hello", "2 results", &[("abc", 5.0), ("def", 20.0)])
  }

  #[tokio::test]
  async fn hello_end_to_end() {
    let (_vp, mut app) = app_with(hello_backend(), Settings::default());
    type_query(&mut app, "hello");
    app.trigger_search();
    assert_eq!(app.panel.pending_query(), Some("hello"));
    settle(&mut app).await;

    assert_eq!(app.panel.message(), "2 results");
    assert_eq!(app.panel.pending_query(), None);
    assert_eq!(app.mode, AppMode::Browse);
    assert_eq!(app.browser.position_label().as_deref(), Some("Video 1/2"));
    assert_eq!(app.current_target().map(|t| t.start), Some(4));
    assert!(!app.browser.can_prev());
    assert!(app.browser.can_next());

    app.show_next();
    assert_eq!(app.browser.position_label().as_deref(), Some("Video 2/2"));
    let target = app.current_target().unwrap();
    assert_eq!(target.video_id, "def");
    assert_eq!(target.start, 19);
    assert!(!app.browser.can_next());
    assert!(app.browser.can_prev());
  }

  #[tokio::test]
  async fn autoplay_queues_current_clip() {
    let (_vp, mut app) = app_with(hello_backend(), Settings::default());
    type_query(&mut app, "hello");
    app.trigger_search();
    settle(&mut app).await;

    let first = app.take_play_request().expect("autoplay after results");
    assert_eq!(first.video_id, "abc");
    assert!(first.autoplay && first.captions);
    assert_eq!(first.lang, "zh");
    assert!(app.take_play_request().is_none());

    app.show_prev(); // disabled: nothing queued
    assert!(app.take_play_request().is_none());

    app.show_next();
    assert_eq!(app.take_play_request().map(|t| t.video_id), Some("def".to_string()));
    app.show_next(); // disabled
    assert!(app.take_play_request().is_none());
  }

  #[tokio::test]
  async fn autoplay_off_only_plays_on_request() {
    let settings = Settings { autoplay: false, caption_lang: "ja".into(), ..Settings::default() };
    let (_vp, mut app) = app_with(hello_backend(), settings);
    type_query(&mut app, "hello");
    app.trigger_search();
    settle(&mut app).await;
    assert!(app.take_play_request().is_none());

    app.show_next();
    assert!(app.take_play_request().is_none());

    app.request_play();
    let target = app.take_play_request().unwrap();
    assert_eq!(target.video_id, "def");
    assert_eq!(target.lang, "ja");
  }

  #[tokio::test]
  async fn failed_search_keeps_previous_results() {
    let fake = hello_backend().answer("broken", Answer::Fail("index offline".into()));
    let (_vp, mut app) = app_with(fake, Settings::default());
    type_query(&mut app, "hello");
    app.trigger_search();
    settle(&mut app).await;
    app.show_next();

    type_query(&mut app, "broken");
    app.trigger_search();
    settle(&mut app).await;

    assert_eq!(app.panel.message(), "2 results");
    assert_eq!(app.browser.len(), 2);
    assert_eq!(app.browser.current_index(), 1, "failed search must not reset browsing");
    assert_eq!(app.last_error.as_deref(), Some("Search failed: backend error: index offline"));
    assert!(!app.panel.is_pending());
  }

  #[tokio::test]
  async fn blank_query_sets_error_without_request() {
    let (_vp, mut app) = app_with(FakeBackend::new(), Settings::default());
    type_query(&mut app, "  ");
    app.trigger_search();
    assert_eq!(app.last_error.as_deref(), Some("Enter a search term."));
    assert!(!app.panel.is_pending());
  }

  #[tokio::test]
  async fn new_search_resets_to_first_clip() {
    let (_vp, mut app) = app_with(hello_backend(), Settings::default());
    type_query(&mut app, "hello");
    app.trigger_search();
    settle(&mut app).await;
    app.show_next();
    assert_eq!(app.browser.current_index(), 1);

    // Same query, same content: still a fresh list.
    app.trigger_search();
    settle(&mut app).await;
    assert_eq!(app.browser.current_index(), 0);
  }

  #[tokio::test]
  async fn empty_results_clear_browser_and_return_to_input() {
    let fake = hello_backend().found("nothing", "0 results", &[]);
    let (_vp, mut app) = app_with(fake, Settings::default());
    type_query(&mut app, "hello");
    app.trigger_search();
    settle(&mut app).await;
    assert_eq!(app.mode, AppMode::Browse);
    let _ = app.take_play_request();

    type_query(&mut app, "nothing");
    app.trigger_search();
    settle(&mut app).await;
    assert_eq!(app.panel.message(), "0 results");
    assert!(app.browser.is_empty());
    assert!(app.current_target().is_none());
    assert_eq!(app.mode, AppMode::Input);
    assert!(app.take_play_request().is_none());
    assert!(app.stop_pending(), "old clip must not keep playing under an empty list");

    app.drive_player().await;
    assert!(!app.stop_pending());
    assert!(!app.player.is_playing());
    assert!(app.last_error.is_none());
  }

  #[tokio::test]
  async fn results_with_autoplay_replace_instead_of_stopping() {
    let (_vp, mut app) = app_with(hello_backend(), Settings::default());
    type_query(&mut app, "hello");
    app.trigger_search();
    settle(&mut app).await;
    assert!(!app.stop_pending());
    assert!(app.take_play_request().is_some());
  }

  #[tokio::test]
  async fn new_results_without_autoplay_stop_the_old_clip() {
    let settings = Settings { autoplay: false, ..Settings::default() };
    let (_vp, mut app) = app_with(hello_backend(), settings);
    type_query(&mut app, "hello");
    app.trigger_search();
    settle(&mut app).await;
    assert!(app.stop_pending());
    assert!(app.take_play_request().is_none());

    app.drive_player().await;
    assert!(!app.stop_pending());
  }

  #[tokio::test]
  async fn resize_reaches_browser_on_next_check() {
    let (viewport, mut app) = app_with(FakeBackend::new(), Settings::default());
    assert_eq!(app.browser.embed_height(), 20);
    viewport.resize(ViewportSize::new(100, 60));
    app.check_pending();
    assert_eq!(app.browser.embed_height(), 30);
  }

  #[tokio::test]
  async fn error_expires() {
    let (_vp, mut app) = app_with(FakeBackend::new(), Settings::default());
    app.set_error("boom".into());
    app.expire_error();
    assert_eq!(app.last_error.as_deref(), Some("boom"));
    app.error_time = Instant::now().checked_sub(Duration::from_secs(constants().error_dismiss_secs + 1));
    app.expire_error();
    assert!(app.last_error.is_none());
  }
}
