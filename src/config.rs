use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::constants::constants;

/// User preferences persisted as `prefs.toml` in the platform config dir.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub api_url: Option<String>,
  pub languages: Option<Vec<String>>,
  pub export_dir: Option<PathBuf>,
}

fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "ytt")
}

/// Directory holding the rolling log files.
pub fn log_dir() -> PathBuf {
  project_dirs().map(|d| d.data_local_dir().join("logs")).unwrap_or_else(|| std::env::temp_dir().join("ytt-logs"))
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = project_dirs() {
      return Self::load_from(&proj_dirs.config_dir().join("prefs.toml"));
    }
    Self::default()
  }

  /// Read preferences from `path`, falling back to defaults if missing or unparsable.
  pub fn load_from(path: &Path) -> Self {
    let Ok(content) = std::fs::read_to_string(path) else {
      return Self::default();
    };
    match toml::from_str(&content) {
      Ok(config) => config,
      Err(e) => {
        warn!(path = %path.display(), err = %e, "config: ignoring unparsable prefs");
        Self::default()
      }
    }
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = project_dirs() {
      self.save_to(&proj_dirs.config_dir().join("prefs.toml"));
    }
  }

  pub fn save_to(&self, path: &Path) {
    if let Some(dir) = path.parent()
      && std::fs::create_dir_all(dir).is_ok()
      && let Ok(content) = toml::to_string(self)
      && let Err(e) = std::fs::write(path, content)
    {
      warn!(path = %path.display(), err = %e, "config: failed to save prefs");
    }
  }

  /// Base URL of the transcript API, without a trailing slash.
  pub fn api_url(&self) -> String {
    let url = self.api_url.as_deref().unwrap_or(&constants().default_api_url);
    url.trim_end_matches('/').to_string()
  }

  pub fn languages(&self) -> Vec<String> {
    match &self.languages {
      Some(langs) if !langs.is_empty() => langs.clone(),
      _ => constants().default_languages.clone(),
    }
  }

  /// Where exported transcripts are written: configured dir, else Downloads, else cwd.
  pub fn export_dir(&self) -> PathBuf {
    if let Some(dir) = &self.export_dir {
      return dir.clone();
    }
    UserDirs::new()
      .and_then(|d| d.download_dir().map(Path::to_path_buf))
      .unwrap_or_else(|| PathBuf::from("."))
  }
}
