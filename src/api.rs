use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::constants::constants;

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id regex"));

// --- Models ---

/// A transcript as stored by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transcript {
  pub video_id: String,
  pub title: String,
  pub author_name: String,
  #[serde(default)]
  pub thumbnail_url: Option<String>,
  #[serde(default)]
  pub captions: String,
  #[serde(default)]
  pub timestamps: Vec<String>,
  #[serde(deserialize_with = "iso_datetime")]
  pub created_at: DateTime<Utc>,
  #[serde(deserialize_with = "iso_datetime")]
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct FetchRequest<'a> {
  video: &'a str,
  languages: &'a [String],
  force: bool,
}

/// Result of a fetch: the transcript plus whether the backend served it from cache.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchResponse {
  #[serde(rename = "data")]
  pub transcript: Transcript,
  #[serde(default)]
  pub cached: bool,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
  #[serde(default)]
  transcripts: Vec<Transcript>,
}

/// Accepts RFC 3339 timestamps and offset-less ISO timestamps (taken as UTC).
fn iso_datetime<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error> {
  let raw = String::deserialize(deserializer)?;
  if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
    return Ok(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
    .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
    .map(|naive| naive.and_utc())
    .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
}

// --- Errors ---

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  #[error("{message} (HTTP {status})")]
  Status { status: u16, message: String },
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("unexpected response from transcript API: {0}")]
  Decode(#[from] serde_json::Error),
}

/// Best human-readable message from an error response body.
fn error_message(status: StatusCode, body: &str) -> String {
  if let Ok(val) = serde_json::from_str::<serde_json::Value>(body) {
    for key in ["detail", "message", "error"] {
      if let Some(msg) = val.get(key).and_then(|v| v.as_str()) {
        return msg.to_string();
      }
    }
  }
  let body = body.trim();
  if !body.is_empty() {
    return body.to_string();
  }
  status.canonical_reason().unwrap_or("Request failed").to_string()
}

// --- Video ids ---

/// Extract an 11-character YouTube video id from a bare id or any common URL form.
pub fn extract_video_id(input: &str) -> Option<String> {
  let trimmed = input.trim();
  if VIDEO_ID.is_match(trimmed) {
    return Some(trimmed.to_string());
  }

  let with_scheme = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{}", trimmed) };
  let url = Url::parse(&with_scheme).ok()?;
  let host = url.host_str()?.to_lowercase();
  let host = host.trim_start_matches("www.").trim_start_matches("m.").trim_start_matches("music.");
  let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

  let candidate = match host {
    "youtu.be" => segments.next().map(str::to_string),
    "youtube.com" | "youtube-nocookie.com" => match segments.next() {
      Some("watch") => url.query_pairs().find(|(k, _)| k == "v").map(|(_, v)| v.into_owned()),
      Some("embed" | "shorts" | "live" | "v") => segments.next().map(str::to_string),
      _ => None,
    },
    _ => None,
  }?;

  VIDEO_ID.is_match(&candidate).then_some(candidate)
}

pub fn watch_url(video_id: &str) -> String {
  format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Watch URL that starts playback at `seconds`.
pub fn watch_url_at(video_id: &str, seconds: u32) -> String {
  format!("https://www.youtube.com/watch?v={}&t={}s", video_id, seconds)
}

// --- Client ---

/// Thin JSON client for the transcript backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
  http: Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: &str) -> Result<Self> {
    let http = Client::builder()
      .timeout(Duration::from_secs(constants().request_timeout_secs))
      .user_agent(concat!("ytt/", env!("CARGO_PKG_VERSION")))
      .build()
      .context("Failed to build HTTP client")?;
    Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}/{}", self.base_url, path)
  }

  /// Fetch (or re-fetch with `force`) the transcript for a video URL or id.
  pub async fn fetch(&self, video: &str, languages: &[String], force: bool) -> Result<FetchResponse, ApiError> {
    info!(video = %video, force, "api: fetching transcript");
    let response =
      self.http.post(self.endpoint("transcripts")).json(&FetchRequest { video, languages, force }).send().await?;
    let fetched: FetchResponse = Self::decode(response).await?;
    info!(video_id = %fetched.transcript.video_id, cached = fetched.cached, "api: transcript fetched");
    Ok(fetched)
  }

  pub async fn get(&self, video_id: &str) -> Result<Transcript, ApiError> {
    debug!(video_id = %video_id, "api: loading transcript");
    let response = self.http.get(self.endpoint(&format!("transcripts/{}", video_id))).send().await?;
    Self::decode(response).await
  }

  pub async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Transcript>, ApiError> {
    debug!(limit, offset, "api: listing transcripts");
    let url = self.endpoint(&format!("transcripts?limit={}&offset={}", limit, offset));
    let response = self.http.get(url).send().await?;
    let list: ListResponse = Self::decode(response).await?;
    Ok(list.transcripts)
  }

  pub async fn delete(&self, video_id: &str) -> Result<(), ApiError> {
    info!(video_id = %video_id, "api: deleting transcript");
    let response = self.http.delete(self.endpoint(&format!("transcripts/{}", video_id))).send().await?;
    Self::check(response).await?;
    Ok(())
  }

  async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    warn!(status = status.as_u16(), message = %message, "api: request failed");
    Err(ApiError::Status { status: status.as_u16(), message })
  }

  async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = Self::check(response).await?.text().await?;
    Ok(serde_json::from_str(&body)?)
  }
}
