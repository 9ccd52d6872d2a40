//! Paged browser over the clips returned by the last successful search.

use tracing::debug;

use crate::backend::VideoRef;
use crate::constants::constants;
use crate::embed::EmbedTarget;
use crate::viewport::ViewportSubscription;

/// Pagination state over one result list.
///
/// `current` is always a valid index while the list is non-empty and `0` otherwise. The owner
/// calls [`VideoBrowser::reset`] whenever it replaces the list; nothing else moves `current`
/// except [`VideoBrowser::prev`] and [`VideoBrowser::next`].
pub struct VideoBrowser {
  videos: Vec<VideoRef>,
  current: usize,
  viewport_height: u16,
  viewport: ViewportSubscription,
}

impl VideoBrowser {
  pub fn new(viewport: ViewportSubscription) -> Self {
    let viewport_height = viewport.current().height;
    Self { videos: Vec::new(), current: 0, viewport_height, viewport }
  }

  /// Replace the list and go back to the first clip, even if the content is unchanged.
  pub fn reset(&mut self, videos: Vec<VideoRef>) {
    debug!(count = videos.len(), "browser: reset");
    self.videos = videos;
    self.current = 0;
  }

  pub fn is_empty(&self) -> bool {
    self.videos.is_empty()
  }

  pub fn len(&self) -> usize {
    self.videos.len()
  }

  pub fn current_index(&self) -> usize {
    self.current
  }

  pub fn current(&self) -> Option<&VideoRef> {
    self.videos.get(self.current)
  }

  pub fn can_prev(&self) -> bool {
    !self.videos.is_empty() && self.current > 0
  }

  pub fn can_next(&self) -> bool {
    !self.videos.is_empty() && self.current < self.videos.len() - 1
  }

  /// Step back one clip. Returns `false` (and does nothing) on the first clip.
  pub fn prev(&mut self) -> bool {
    if !self.can_prev() {
      return false;
    }
    self.current -= 1;
    debug!(current = self.current, "browser: prev");
    true
  }

  /// Step forward one clip. Returns `false` (and does nothing) on the last clip.
  pub fn next(&mut self) -> bool {
    if !self.can_next() {
      return false;
    }
    self.current += 1;
    debug!(current = self.current, "browser: next");
    true
  }

  /// "Video i/n", 1-based. `None` when there is nothing to browse.
  pub fn position_label(&self) -> Option<String> {
    if self.videos.is_empty() {
      return None;
    }
    Some(format!("Video {}/{}", self.current + 1, self.videos.len()))
  }

  pub fn embed_target(&self, lang: &str) -> Option<EmbedTarget> {
    self.current().map(|video| EmbedTarget::for_video(video, lang))
  }

  /// Pick up a pending viewport resize. Returns `true` when the height changed.
  pub fn sync_viewport(&mut self) -> bool {
    match self.viewport.changed() {
      Some(size) if size.height != self.viewport_height => {
        self.viewport_height = size.height;
        true
      }
      _ => false,
    }
  }

  pub fn viewport_height(&self) -> u16 {
    self.viewport_height
  }

  /// Rows given to the embed pane: a fixed share of the viewport height.
  pub fn embed_height(&self) -> u16 {
    (u32::from(self.viewport_height) * u32::from(constants().embed_height_percent) / 100) as u16
  }
}
