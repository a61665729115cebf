mod api;
mod app;
mod config;
mod constants;
mod export;
mod input;
mod theme;
mod transcript;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use api::{ApiClient, extract_video_id};
use app::App;
use config::Config;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Browse, search and export cached YouTube transcripts", long_about = None)]
struct Args {
  /// Transcript API base URL (overrides prefs.toml)
  #[arg(long, env = "YTT_API_URL")]
  api_url: Option<String>,

  /// Open this video's stored transcript on startup (URL or video ID)
  #[arg(short, long)]
  video: Option<String>,

  /// Caption languages to request, in preference order (e.g. "en,de")
  #[arg(short, long, value_delimiter = ',')]
  languages: Option<Vec<String>>,
}

// --- Logging ---

/// Log to a daily rolling file; stdout belongs to the TUI.
fn init_logging() -> Result<WorkerGuard> {
  let dir = config::log_dir();
  std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;
  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, "ytt.log"));
  let filter = EnvFilter::try_from_env("YTT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
  Ok(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let _log_guard = init_logging()?;

  let mut config = Config::load();
  if let Some(url) = &args.api_url {
    config.api_url = Some(url.clone());
  }
  let languages = args.languages.clone().filter(|l| !l.is_empty()).unwrap_or_else(|| config.languages());
  let client = ApiClient::new(&config.api_url())?;
  info!(api_url = %client.base_url(), ?languages, "starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut app = App::new(config, client, languages);
  app.trigger_list();
  if let Some(video) = &args.video {
    match extract_video_id(video) {
      Some(video_id) => app.trigger_open(&video_id),
      None => app.set_error(format!("Invalid URL: '{}' is not a YouTube URL or video ID", video)),
    }
  }

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  loop {
    app.check_pending()?;
    app.expire_notices();

    terminal.draw(|frame| ui::ui(frame, app))?;

    // Poll without blocking the runtime so spawned requests keep progressing.
    if event::poll(Duration::from_millis(0))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key)?;
        }
        _ => {}
      }
    } else {
      tokio::time::sleep(Duration::from_millis(50)).await;
    }

    if app.should_quit {
      break;
    }
  }
  info!("exiting");
  Ok(())
}
