use anyhow::{Context, Result, anyhow};
use std::process::Stdio;
use tokio::{
  io::BufReader as TokioBufReader,
  io::AsyncBufReadExt,
  process::{Child as TokioChild, Command},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::{info, warn};

use crate::embed::EmbedTarget;

/// Build the mpv command line for one clip.
///
/// mpv reads a negative `--start` as "seconds before the end", so a negative offset is not
/// forwarded and playback starts at the beginning instead.
pub fn mpv_args(target: &EmbedTarget, ipc_socket: &str) -> Result<Vec<String>> {
  let mut args = vec![
    "--force-window=immediate".to_string(),
    "--autofit=100%x50%".to_string(),
    "--term-status-msg=Time: ${time-pos/full} / ${duration/full} | Title: ${media-title} | ${pause} ${percent-pos}%"
      .to_string(),
    format!("--input-ipc-server={}", ipc_socket),
  ];
  if target.start >= 0 {
    args.push(format!("--start={}", target.start));
  } else {
    warn!(video_id = %target.video_id, start = target.start, "player: negative start offset, playing from 0");
  }
  if target.captions {
    args.push(format!("--slang={}", target.lang));
    args.push("--sub-visibility=yes".to_string());
    args.push(format!("--ytdl-raw-options=write-subs=,write-auto-subs=,sub-langs={}", target.lang));
  }
  if !target.autoplay {
    args.push("--pause".to_string());
  }
  args.push(target.watch_url()?.to_string());
  Ok(args)
}

/// Drives an external mpv window for the clip currently shown in the browser.
pub struct ClipPlayer {
  pub(crate) current_process: Option<TokioChild>,
  pub current_target: Option<EmbedTarget>,
  mpv_monitor_handle: Option<JoinHandle<()>>,
  mpv_status_rx: Option<mpsc::Receiver<String>>,
  last_mpv_status: Option<String>,
  ipc_socket_path: Option<String>,
  pub paused: bool,
}

impl ClipPlayer {
  pub fn new() -> Self {
    Self {
      current_process: None,
      current_target: None,
      mpv_monitor_handle: None,
      mpv_status_rx: None,
      last_mpv_status: None,
      ipc_socket_path: None,
      paused: false,
    }
  }

  pub fn is_playing(&self) -> bool {
    self.current_process.is_some()
  }

  pub fn check_mpv_status(&mut self) {
    if let Some(rx) = &mut self.mpv_status_rx {
      while let Ok(status) = rx.try_recv() {
        self.last_mpv_status = Some(status);
      }
    }
  }

  pub fn last_mpv_status(&self) -> Option<&str> {
    self.last_mpv_status.as_deref()
  }

  pub async fn play(&mut self, target: &EmbedTarget) -> Result<()> {
    self.stop().await.context("Failed to stop previous playback")?;

    let socket_path = std::env::temp_dir().join(format!("clipseek-mpv-{}.sock", std::process::id()));
    let socket_path_str = socket_path.to_str().context("Temp dir path is not valid UTF-8")?.to_string();
    // Remove stale socket if it exists from a previous crash.
    let _ = std::fs::remove_file(&socket_path);

    let args = mpv_args(target, &socket_path_str)?;
    info!(video_id = %target.video_id, start = target.start, "player: starting mpv");

    let mut cmd = Command::new("mpv");
    cmd.args(&args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    // Send stderr to null: if piped but never drained, the pipe buffer
    // fills and mpv blocks.
    cmd.stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    let stdout = child.stdout.take().context("Failed to get mpv stdout")?;
    let (tx, rx) = mpsc::channel::<String>(10);
    self.mpv_status_rx = Some(rx);

    let monitor_handle = tokio::spawn(async move {
      let reader = TokioBufReader::new(stdout);
      let mut lines = reader.lines();
      while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
          break;
        }
      }
    });

    self.current_process = Some(child);
    self.current_target = Some(target.clone());
    self.mpv_monitor_handle = Some(monitor_handle);
    self.ipc_socket_path = Some(socket_path_str);
    self.paused = !target.autoplay;
    Ok(())
  }

  #[cfg(unix)]
  pub async fn toggle_pause(&mut self) -> Result<()> {
    let Some(ref socket_path) = self.ipc_socket_path else {
      return Ok(());
    };
    let stream = tokio::net::UnixStream::connect(socket_path).await.context("Failed to connect to mpv IPC socket")?;
    stream.writable().await.context("mpv IPC socket not writable")?;
    let cmd = b"{\"command\":[\"cycle\",\"pause\"]}\n";
    let written = stream.try_write(cmd).context("Failed to send pause command to mpv")?;
    if written < cmd.len() {
      return Err(anyhow!("Partial write to mpv IPC socket: wrote {} of {} bytes", written, cmd.len()));
    }
    self.paused = !self.paused;
    Ok(())
  }

  #[cfg(not(unix))]
  pub async fn toggle_pause(&mut self) -> Result<()> {
    Err(anyhow!("Pause is only supported on Unix platforms"))
  }

  pub async fn stop(&mut self) -> Result<()> {
    if let Some(handle) = self.mpv_monitor_handle.take() {
      handle.abort();
      let _ = handle.await;
    }
    self.mpv_status_rx = None;
    self.last_mpv_status = None;

    if let Some(mut child) = self.current_process.take() {
      child.kill().await.context("Failed to kill mpv process")?;
      let _ = child.wait().await;
      info!("player: stopped");
    }

    self.current_target = None;
    self.paused = false;

    if let Some(path) = self.ipc_socket_path.take() {
      let _ = std::fs::remove_file(&path);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn target(start: i64) -> EmbedTarget {
    EmbedTarget { video_id: "abc".into(), start, autoplay: true, captions: true, lang: "zh".into() }
  }

  #[test]
  fn mpv_args_seek_and_captions() {
    let args = mpv_args(&target(4), "/tmp/sock").unwrap();
    assert!(args.contains(&"--start=4".to_string()));
    assert!(args.contains(&"--slang=zh".to_string()));
    assert!(args.contains(&"--sub-visibility=yes".to_string()));
    assert!(args.contains(&"--input-ipc-server=/tmp/sock".to_string()));
    assert!(!args.contains(&"--pause".to_string()));
    assert_eq!(args.last().map(String::as_str), Some("https://www.youtube.com/watch?v=abc"));
  }

  #[test]
  fn mpv_args_zero_start_is_forwarded() {
    let args = mpv_args(&target(0), "/tmp/sock").unwrap();
    assert!(args.contains(&"--start=0".to_string()));
  }

  #[test]
  fn mpv_args_skip_negative_start() {
    let args = mpv_args(&target(-1), "/tmp/sock").unwrap();
    assert!(!args.iter().any(|a| a.starts_with("--start=")));
  }

  #[test]
  fn mpv_args_without_autoplay_start_paused() {
    let mut t = target(4);
    t.autoplay = false;
    t.captions = false;
    let args = mpv_args(&t, "/tmp/sock").unwrap();
    assert!(args.contains(&"--pause".to_string()));
    assert!(!args.iter().any(|a| a.starts_with("--slang=")));
  }

  #[tokio::test]
  async fn idle_player_stop_is_noop() {
    let mut player = ClipPlayer::new();
    assert!(!player.is_playing());
    player.stop().await.unwrap();
    assert!(player.current_target.is_none());
    assert!(player.last_mpv_status().is_none());
  }
}
