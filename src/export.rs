use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::api::Transcript;

/// Plain-text export: header, captions section, timestamps section.
pub fn render_export(transcript: &Transcript) -> String {
  format!(
    "Title: {}\nAuthor: {}\nVideo ID: {}\nCreated: {}\n\n=== CAPTIONS ===\n{}\n\n=== TIMESTAMPS ===\n{}\n",
    transcript.title,
    transcript.author_name,
    transcript.video_id,
    format_local(&transcript.created_at),
    transcript.captions,
    transcript.timestamps.join("\n"),
  )
}

/// Render a UTC timestamp in the local timezone for display.
pub fn format_local(dt: &chrono::DateTime<chrono::Utc>) -> String {
  dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn export_file_name(video_id: &str) -> String {
  format!("{}-transcript.txt", video_id)
}

/// Write the export into `dir`, creating it if needed. Returns the written path.
pub fn write_export(transcript: &Transcript, dir: &Path) -> Result<PathBuf> {
  std::fs::create_dir_all(dir).with_context(|| format!("Failed to create export directory {}", dir.display()))?;
  let path = dir.join(export_file_name(&transcript.video_id));
  std::fs::write(&path, render_export(transcript))
    .with_context(|| format!("Failed to write transcript to {}", path.display()))?;
  info!(path = %path.display(), "export: transcript saved");
  Ok(path)
}

// --- Clipboard ---
//
// OSC 52 asks the terminal to set the system clipboard:
//   \x1B]52;c;<base64 payload>\x07
// Supported by kitty, WezTerm, Ghostty, iTerm2, foot, tmux (with set-clipboard on).

fn osc52_sequence(text: &str) -> String {
  format!("\x1B]52;c;{}\x07", BASE64.encode(text.as_bytes()))
}

/// Copy `text` to the clipboard through the terminal.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
  let mut stdout = std::io::stdout();
  write!(stdout, "{}", osc52_sequence(text)).context("Failed to write clipboard escape")?;
  stdout.flush().context("Failed to flush clipboard escape")?;
  Ok(())
}

// --- Browser ---

/// Open `url` in the default browser without blocking the UI.
pub fn open_in_browser(url: &str) -> Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  let mut child = std::process::Command::new(cmd)
    .arg(url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()
    .with_context(|| format!("Failed to launch {}", cmd))?;
  // Reap the child in a background thread to avoid zombie processes.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}
