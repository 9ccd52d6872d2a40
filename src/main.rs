mod app;
mod backend;
mod browser;
mod config;
mod constants;
mod embed;
mod input;
mod player;
mod search_panel;
mod theme;
mod ui;
mod viewport;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use backend::SearchBackend;
use config::{Config, Overrides, Settings};
use constants::constants;
use viewport::{Viewport, ViewportSize};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// HTTP endpoint of the search backend; receives POST {"query": "..."}
  #[arg(long, value_name = "URL", conflicts_with = "backend_cmd")]
  backend_url: Option<String>,

  /// Local search program, run as: PROGRAM [ARGS...] -- QUERY, printing JSON on stdout
  #[arg(long, value_name = "PROGRAM")]
  backend_cmd: Option<String>,

  /// Extra argument for --backend-cmd, placed before the query (repeatable)
  #[arg(long = "backend-arg", value_name = "ARG", requires = "backend_cmd", allow_hyphen_values = true)]
  backend_args: Vec<String>,

  /// Caption and player language code (default: zh)
  #[arg(long, value_name = "LANG")]
  lang: Option<String>,

  /// Don't start playback when the current clip changes
  #[arg(long)]
  no_autoplay: bool,

  /// Print a shell completion script and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<clap_complete::Shell>,
}

impl Args {
  fn overrides(&self) -> Overrides {
    Overrides {
      backend_url: self.backend_url.clone(),
      backend_command: self.backend_cmd.clone(),
      backend_args: self.backend_args.clone(),
      caption_lang: self.lang.clone(),
      no_autoplay: self.no_autoplay,
    }
  }
}

// --- Logging ---

/// Log to a file: stdout belongs to the TUI. Filter with `CLIPSEEK_LOG`.
fn init_logging() -> Result<WorkerGuard> {
  let dir = config::log_dir();
  std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;
  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, "clipseek.log"));
  let filter = EnvFilter::try_from_env("CLIPSEEK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
  Ok(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), env!("CARGO_PKG_NAME"), &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = init_logging()?;
  let settings = Settings::resolve(args.overrides(), Config::load());
  info!(?settings, version = env!("CARGO_PKG_VERSION"), "starting");
  let backend = backend::from_spec(&settings.backend);

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, settings, backend).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, settings: Settings, backend: Arc<dyn SearchBackend>) -> Result<()> {
  let size = terminal.size().context("Failed to read terminal size")?;
  let viewport = Viewport::new(ViewportSize::new(size.width, size.height));
  let mut app = App::new(settings, backend, &viewport);
  let poll_interval = Duration::from_millis(constants().poll_interval_ms);

  loop {
    app.check_pending();
    app.drive_player().await;

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(poll_interval)? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key).await?;
        }
        Event::Resize(width, height) => viewport.resize(ViewportSize::new(width, height)),
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.stop_playback().await?;
  info!("exiting");
  Ok(())
}
