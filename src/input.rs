use anyhow::{Context, Result};
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::warn;

use crate::app::{App, AppMode};

// --- Event Handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
    if app.player.is_playing() {
      app.stop_playback().await.context("Failed to stop playback")?;
    }
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('o') {
    open_in_browser(app);
    return Ok(());
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Browse => handle_browse_key(app, key).await.context("Failed to handle browse key event")?,
  }
  Ok(())
}

/// Open the embed URL of the current clip in the system browser.
fn open_in_browser(app: &mut App) {
  let Some(target) = app.current_target() else { return };
  let url = match target.embed_url() {
    Ok(url) => url,
    Err(e) => {
      app.set_error(format!("{:#}", e));
      return;
    }
  };
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  match std::process::Command::new(cmd)
    .arg(url.as_str())
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()
  {
    Ok(mut child) => {
      // Reap the child in a background thread to avoid zombie processes.
      std::thread::spawn(move || {
        let _ = child.wait();
      });
    }
    Err(e) => {
      warn!(err = %e, "failed to open browser");
      app.set_error(format!("Failed to open browser: {}", e));
    }
  }
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.trigger_search();
    }
    KeyCode::Char(c) => app.panel.insert_char(c),
    KeyCode::Backspace => app.panel.backspace(),
    KeyCode::Delete => app.panel.delete(),
    KeyCode::Left => app.panel.move_left(),
    KeyCode::Right => app.panel.move_right(),
    KeyCode::Home => app.panel.move_home(),
    KeyCode::End => app.panel.move_end(),
    KeyCode::Esc => {
      if !app.panel.query.is_empty() {
        app.panel.clear();
      } else if !app.browser.is_empty() {
        app.mode = AppMode::Browse;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down | KeyCode::Tab => {
      if !app.browser.is_empty() {
        app.mode = AppMode::Browse;
      }
    }
    _ => {}
  }
}

async fn handle_browse_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  match key.code {
    KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => app.show_prev(),
    KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') => app.show_next(),
    KeyCode::Enter => app.request_play(),
    KeyCode::Char(' ') => {
      if app.player.is_playing()
        && let Err(e) = app.player.toggle_pause().await
      {
        app.set_error(format!("Pause error: {}", e));
      }
    }
    KeyCode::Esc | KeyCode::Up | KeyCode::Tab | KeyCode::Char('/') => {
      app.mode = AppMode::Input;
    }
    _ => {}
  }
  Ok(())
}
