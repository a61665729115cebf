//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! with no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Transcript API
  pub default_api_url: String,
  pub default_languages: Vec<String>,
  pub request_timeout_secs: u64,

  // Library listing
  pub library_page_size: usize,

  // Caption segmentation
  pub sentences_per_paragraph: usize,

  // Notifications
  pub error_expiry_secs: u64,
  pub info_expiry_secs: u64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert!(c.default_api_url.starts_with("http"));
    assert_eq!(c.default_languages, vec!["en".to_string()]);
    assert!(c.library_page_size > 0);
    assert_eq!(c.sentences_per_paragraph, 4);
    assert!(c.info_expiry_secs <= c.error_expiry_secs);
  }
}
