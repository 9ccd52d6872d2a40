//! Terminal viewport size provider.
//!
//! The run loop owns a [`Viewport`] and publishes every resize event into it. Components that
//! size themselves against the viewport hold a [`ViewportSubscription`]; dropping the
//! subscription is the unsubscribe.

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
  pub width: u16,
  pub height: u16,
}

impl ViewportSize {
  pub fn new(width: u16, height: u16) -> Self {
    Self { width, height }
  }
}

pub struct Viewport {
  tx: watch::Sender<ViewportSize>,
}

impl Viewport {
  pub fn new(initial: ViewportSize) -> Self {
    let (tx, _) = watch::channel(initial);
    Self { tx }
  }

  /// Publish a new size. Subscribers only see a change when the size actually differs.
  pub fn resize(&self, size: ViewportSize) {
    self.tx.send_if_modified(|current| {
      if *current == size {
        false
      } else {
        *current = size;
        true
      }
    });
  }

  pub fn subscribe(&self) -> ViewportSubscription {
    ViewportSubscription { rx: self.tx.subscribe() }
  }

  /// Number of live subscriptions.
  #[cfg(test)]
  pub fn subscriber_count(&self) -> usize {
    self.tx.receiver_count()
  }
}

pub struct ViewportSubscription {
  rx: watch::Receiver<ViewportSize>,
}

impl ViewportSubscription {
  pub fn current(&self) -> ViewportSize {
    *self.rx.borrow()
  }

  /// Returns the new size if it changed since the last call, marking it seen.
  pub fn changed(&mut self) -> Option<ViewportSize> {
    if self.rx.has_changed().unwrap_or(false) { Some(*self.rx.borrow_and_update()) } else { None }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn subscription_starts_at_current_size() {
    let viewport = Viewport::new(ViewportSize::new(80, 24));
    let mut sub = viewport.subscribe();
    assert_eq!(sub.current(), ViewportSize::new(80, 24));
    assert_eq!(sub.changed(), None);
  }

  #[test]
  fn resize_is_seen_once() {
    let viewport = Viewport::new(ViewportSize::new(80, 24));
    let mut sub = viewport.subscribe();
    viewport.resize(ViewportSize::new(120, 40));
    assert_eq!(sub.changed(), Some(ViewportSize::new(120, 40)));
    assert_eq!(sub.changed(), None);
    assert_eq!(sub.current(), ViewportSize::new(120, 40));
  }

  #[test]
  fn identical_resize_is_not_a_change() {
    let viewport = Viewport::new(ViewportSize::new(80, 24));
    let mut sub = viewport.subscribe();
    viewport.resize(ViewportSize::new(80, 24));
    assert_eq!(sub.changed(), None);
  }

  #[test]
  fn dropping_subscription_unsubscribes() {
    let viewport = Viewport::new(ViewportSize::new(80, 24));
    let a = viewport.subscribe();
    let b = viewport.subscribe();
    assert_eq!(viewport.subscriber_count(), 2);
    drop(a);
    assert_eq!(viewport.subscriber_count(), 1);
    drop(b);
    assert_eq!(viewport.subscriber_count(), 0);
    // Publishing with no subscribers is fine, and late subscribers see the latest size.
    viewport.resize(ViewportSize::new(10, 10));
    assert_eq!(viewport.subscribe().current(), ViewportSize::new(10, 10));
  }

  #[test]
  fn subscription_outliving_viewport_reports_no_change() {
    let viewport = Viewport::new(ViewportSize::new(80, 24));
    let mut sub = viewport.subscribe();
    drop(viewport);
    assert_eq!(sub.changed(), None);
    assert_eq!(sub.current(), ViewportSize::new(80, 24));
  }
}
