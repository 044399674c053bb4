mod app;
mod config;
mod constants;
mod error;
mod gemini;
mod input;
mod prompt;
mod quiz;
mod score;
mod session;
mod theme;
mod ui;
mod video;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind},
    execute,
  },
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use config::Config;
use gemini::GeminiClient;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Quiz yourself on a YouTube video from its transcript", long_about = None)]
struct Args {
  /// Gemini model to use (default: from prefs.toml, else gemini-2.5-flash)
  #[arg(short, long)]
  model: Option<String>,

  /// Prefill the video URL field
  #[arg(short, long)]
  url: Option<String>,

  /// Prefill the transcript field from a local text file
  #[arg(short, long, value_name = "FILE")]
  transcript_file: Option<PathBuf>,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Logging ---

/// Log to a daily file in the cache dir; the terminal belongs to the TUI.
/// Filter via `YTQUIZ_LOG` (e.g. `YTQUIZ_LOG=ytquiz=debug`).
fn init_tracing() -> Option<WorkerGuard> {
  let proj_dirs = ProjectDirs::from("", "", "ytquiz")?;
  let log_dir = proj_dirs.cache_dir().join("logs");
  std::fs::create_dir_all(&log_dir).ok()?;

  let appender = tracing_appender::rolling::daily(log_dir, "ytquiz.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_env("YTQUIZ_LOG").unwrap_or_else(|_| EnvFilter::new("ytquiz=info"));

  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "ytquiz", &mut std::io::stdout());
    return Ok(());
  }

  let _guard = init_tracing();

  let transcript = match args.transcript_file {
    Some(ref path) => Some(
      std::fs::read_to_string(path).with_context(|| format!("Failed to read transcript from {}", path.display()))?,
    ),
    None => None,
  };

  let config = Config::load();
  let model = config.resolve_model(args.model.as_deref());
  let client = GeminiClient::new(config.resolve_api_key(), model);
  info!(model = %client.model(), has_key = client.has_api_key(), "ytquiz starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    let _ = execute!(std::io::stdout(), DisableBracketedPaste);
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  execute!(std::io::stdout(), EnableBracketedPaste).context("Failed to enable bracketed paste")?;
  let app = App::new(client, config, args.url, transcript);
  let result = run(&mut terminal, app);
  let _ = execute!(std::io::stdout(), DisableBracketedPaste);
  ratatui::restore();
  result
}

fn run(terminal: &mut DefaultTerminal, mut app: App) -> Result<()> {
  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, &mut app)).context("Failed to draw frame")?;

    if event::poll(Duration::from_millis(100)).context("Failed to poll terminal events")? {
      match event::read().context("Failed to read terminal event")? {
        Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key_event(&mut app, key),
        Event::Paste(text) => input::handle_paste(&mut app, &text),
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  info!("ytquiz exiting");
  Ok(())
}
