use anyhow::Result;
use ratatui::widgets::ListState;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::api::{self, ApiClient, ApiError, FetchResponse, Transcript};
use crate::config::Config;
use crate::constants::constants;
use crate::export;
use crate::input::LineInput;
use crate::theme::{THEMES, theme_index};
use crate::transcript::TranscriptView;

// --- Types ---

pub type FetchResult = Result<FetchResponse, ApiError>;
pub type OpenResult = Result<Transcript, ApiError>;
pub type ListResult = Result<Vec<Transcript>, ApiError>;
pub type DeleteResult = (String, Result<(), ApiError>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Home,
  Viewer,
}

/// Which home-screen widget owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Library,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerTab {
  Captions,
  Timestamps,
}

impl ViewerTab {
  pub fn toggle(self) -> Self {
    match self {
      ViewerTab::Captions => ViewerTab::Timestamps,
      ViewerTab::Timestamps => ViewerTab::Captions,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      ViewerTab::Captions => "Captions",
      ViewerTab::Timestamps => "Timestamps",
    }
  }
}

/// One page of cached transcripts from the backend.
#[derive(Debug)]
pub struct Library {
  pub items: Vec<Transcript>,
  pub offset: usize,
  pub limit: usize,
  pub list_state: ListState,
  pub loading: bool,
}

impl Library {
  pub fn new(limit: usize) -> Self {
    Self { items: Vec::new(), offset: 0, limit: limit.max(1), list_state: ListState::default(), loading: false }
  }

  pub fn has_previous(&self) -> bool {
    self.offset >= self.limit
  }

  /// A full page suggests there may be more.
  pub fn has_next(&self) -> bool {
    self.items.len() == self.limit
  }

  pub fn show_pagination(&self) -> bool {
    self.offset > 0 || self.has_next()
  }

  /// Human range label, e.g. `11–20`.
  pub fn range_label(&self) -> String {
    format!("{}–{}", self.offset + 1, self.offset + self.items.len())
  }

  pub fn selected(&self) -> Option<&Transcript> {
    self.items.get(self.list_state.selected()?)
  }

  pub fn select_next(&mut self) {
    let count = self.items.len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
    }
  }

  pub fn select_previous(&mut self) {
    let count = self.items.len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.list_state.select(Some(i));
    }
  }

  fn set_items(&mut self, items: Vec<Transcript>) {
    self.items = items;
    self.list_state.select(if self.items.is_empty() { None } else { Some(0) });
  }
}

/// Which viewer widget owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerFocus {
  Browse,
  Search,
}

/// An open transcript and its per-session search state.
#[derive(Debug)]
pub struct Viewer {
  pub transcript: Transcript,
  pub view: TranscriptView,
  pub tab: ViewerTab,
  pub focus: ViewerFocus,
  pub search: LineInput,
  /// First visible line of the captions pane.
  pub caption_scroll: u16,
  pub entry_list: ListState,
}

impl Viewer {
  pub fn new(transcript: Transcript) -> Self {
    let view = TranscriptView::new(&transcript.captions, &transcript.timestamps);
    let mut entry_list = ListState::default();
    if !view.entries().is_empty() {
      entry_list.select(Some(0));
    }
    Self {
      transcript,
      view,
      tab: ViewerTab::Captions,
      focus: ViewerFocus::Browse,
      search: LineInput::default(),
      caption_scroll: 0,
      entry_list,
    }
  }

  /// Push the search box contents into the view and reposition on the first hit.
  pub fn apply_search(&mut self) {
    self.view.set_query(&self.search.text);
    self.caption_scroll = 0;
    self.sync_selection();
  }

  pub fn clear_search(&mut self) {
    self.search.clear();
    self.view.clear_query();
    self.caption_scroll = 0;
    self.sync_selection();
  }

  pub fn next_match(&mut self) {
    self.view.next_match();
    self.sync_selection();
  }

  pub fn previous_match(&mut self) {
    self.view.previous_match();
    self.sync_selection();
  }

  /// Keep the timestamp list selection on the current match (or the top).
  fn sync_selection(&mut self) {
    let row = self.view.current_match_row().or(if self.view.entries().is_empty() { None } else { Some(0) });
    self.entry_list.select(row);
  }

  pub fn select_next_entry(&mut self) {
    let count = self.view.entries().len();
    if count > 0 {
      let i = self.entry_list.selected().map_or(0, |i| (i + 1).min(count - 1));
      self.entry_list.select(Some(i));
    }
  }

  pub fn select_previous_entry(&mut self) {
    if !self.view.entries().is_empty() {
      let i = self.entry_list.selected().map_or(0, |i| i.saturating_sub(1));
      self.entry_list.select(Some(i));
    }
  }

  pub fn scroll_down(&mut self, lines: u16) {
    self.caption_scroll = self.caption_scroll.saturating_add(lines);
  }

  pub fn scroll_up(&mut self, lines: u16) {
    self.caption_scroll = self.caption_scroll.saturating_sub(lines);
  }

  /// Text the copy action puts on the clipboard for the active tab.
  pub fn copy_payload(&self) -> String {
    match self.tab {
      ViewerTab::Captions => self.transcript.captions.clone(),
      ViewerTab::Timestamps => self.transcript.timestamps.join("\n"),
    }
  }

  /// Watch URL for the selected timestamp row.
  pub fn selected_entry_url(&self) -> Option<String> {
    let entry = self.view.entries().get(self.entry_list.selected()?)?;
    Some(api::watch_url_at(&self.transcript.video_id, entry.seconds))
  }
}

/// In-flight request receivers, polled once per frame.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) fetch_rx: Option<oneshot::Receiver<FetchResult>>,
  pub(crate) open_rx: Option<oneshot::Receiver<OpenResult>>,
  pub(crate) list_rx: Option<oneshot::Receiver<ListResult>>,
  pub(crate) delete_rx: Option<oneshot::Receiver<DeleteResult>>,
}

pub struct App {
  pub screen: Screen,
  pub mode: AppMode,
  pub input: LineInput,
  pub theme_index: usize,
  pub library: Library,
  pub viewer: Option<Viewer>,
  /// Video (URL or id) of the last fetch, for forced refetches.
  pub last_fetched: Option<String>,
  /// Video id awaiting delete confirmation.
  pub pending_delete: Option<String>,
  /// Video id currently being deleted.
  pub deleting: Option<String>,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Informational message, lower priority than status/error.
  pub info_message: Option<String>,
  pub should_quit: bool,
  pub(crate) tasks: AsyncTasks,
  client: ApiClient,
  config: Config,
  languages: Vec<String>,
  error_time: Option<Instant>,
  info_time: Option<Instant>,
}

impl App {
  pub fn new(config: Config, client: ApiClient, languages: Vec<String>) -> Self {
    let theme_index = config.theme_name.as_deref().map_or(0, theme_index);
    Self {
      screen: Screen::Home,
      mode: AppMode::Input,
      input: LineInput::default(),
      theme_index,
      library: Library::new(constants().library_page_size),
      viewer: None,
      last_fetched: None,
      pending_delete: None,
      deleting: None,
      last_error: None,
      status_message: None,
      info_message: None,
      should_quit: false,
      tasks: AsyncTasks::default(),
      client,
      config,
      languages,
      error_time: None,
      info_time: None,
    }
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    // Safety: theme_index comes from theme_index() or modular arithmetic in next_theme().
    &THEMES[self.theme_index]
  }

  pub fn api_url(&self) -> &str {
    self.client.base_url()
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Show a short-lived notice, dismissed by `expire_notices`.
  pub fn notify(&mut self, msg: String) {
    self.info_message = Some(msg);
    self.info_time = Some(Instant::now());
  }

  /// Show a notice that stays until replaced (e.g. a prompt awaiting an answer).
  fn prompt(&mut self, msg: String) {
    self.info_message = Some(msg);
    self.info_time = None;
  }

  fn clear_info(&mut self) {
    self.info_message = None;
    self.info_time = None;
  }

  /// Clear stale error and info messages.
  pub fn expire_notices(&mut self) {
    self.expire_at(Instant::now());
  }

  fn expire_at(&mut self, now: Instant) {
    if let Some(t) = self.error_time
      && now.duration_since(t) >= Duration::from_secs(constants().error_expiry_secs)
    {
      self.clear_error();
    }
    if let Some(t) = self.info_time
      && now.duration_since(t) >= Duration::from_secs(constants().info_expiry_secs)
    {
      self.clear_info();
    }
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  // --- Requests ---

  /// Fetch the transcript for the video in the input box.
  pub fn trigger_fetch(&mut self) {
    let video = self.input.text.trim().to_string();
    if video.is_empty() {
      self.set_error("Please enter a YouTube URL or video ID".to_string());
      return;
    }
    if api::extract_video_id(&video).is_none() {
      self.set_error("Invalid URL: please enter a valid YouTube URL or video ID".to_string());
      return;
    }
    self.start_fetch(video, false);
  }

  /// Re-fetch the last fetched (or currently open) video, bypassing the backend cache.
  pub fn trigger_refetch(&mut self) {
    let video = match (&self.screen, &self.viewer, &self.last_fetched) {
      (Screen::Viewer, Some(viewer), _) => viewer.transcript.video_id.clone(),
      (_, _, Some(video)) => video.clone(),
      _ => {
        self.set_error("Nothing to refetch yet.".to_string());
        return;
      }
    };
    self.start_fetch(video, true);
  }

  fn start_fetch(&mut self, video: String, force: bool) {
    if self.tasks.fetch_rx.is_some() {
      return;
    }
    self.clear_error();
    self.clear_info();
    self.status_message = Some(if force { "Refetching…".to_string() } else { "Fetching…".to_string() });
    self.last_fetched = Some(video.clone());

    let client = self.client.clone();
    let languages = self.languages.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(client.fetch(&video, &languages, force).await);
    });
    self.tasks.fetch_rx = Some(rx);
  }

  /// Load one stored transcript into the viewer.
  pub fn trigger_open(&mut self, video_id: &str) {
    info!(video_id = %video_id, "viewer: opening transcript");
    self.clear_error();
    self.status_message = Some("Loading transcript…".to_string());

    let client = self.client.clone();
    let video_id = video_id.to_string();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(client.get(&video_id).await);
    });
    self.tasks.open_rx = Some(rx);
  }

  /// (Re)load the current library page.
  pub fn trigger_list(&mut self) {
    self.library.loading = true;
    let client = self.client.clone();
    let (limit, offset) = (self.library.limit, self.library.offset);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(client.list(limit, offset).await);
    });
    self.tasks.list_rx = Some(rx);
  }

  pub fn library_previous_page(&mut self) {
    if self.library.has_previous() && !self.library.loading {
      self.library.offset -= self.library.limit;
      self.trigger_list();
    }
  }

  pub fn library_next_page(&mut self) {
    if self.library.has_next() && !self.library.loading {
      self.library.offset += self.library.limit;
      self.trigger_list();
    }
  }

  /// Ask for confirmation before deleting the selected library entry.
  pub fn request_delete(&mut self) {
    if self.deleting.is_some() {
      return;
    }
    let Some(entry) = self.library.selected() else { return };
    let (video_id, title) = (entry.video_id.clone(), entry.title.clone());
    self.prompt(format!("Delete '{}'? (y/n)", title));
    self.pending_delete = Some(video_id);
  }

  /// Resolve a pending delete confirmation.
  pub fn confirm_delete(&mut self, confirmed: bool) {
    let Some(video_id) = self.pending_delete.take() else { return };
    self.clear_info();
    if !confirmed {
      return;
    }
    self.deleting = Some(video_id.clone());
    let client = self.client.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = client.delete(&video_id).await;
      let _ = tx.send((video_id, result));
    });
    self.tasks.delete_rx = Some(rx);
  }

  // --- Viewer actions ---

  pub fn close_viewer(&mut self) {
    self.viewer = None;
    self.screen = Screen::Home;
  }

  pub fn save_export(&mut self) {
    let Some(viewer) = &self.viewer else { return };
    match export::write_export(&viewer.transcript, &self.config.export_dir()) {
      Ok(path) => self.notify(format!("Transcript saved to {}", path.display())),
      Err(e) => self.set_error(format!("Save failed: {:#}", e)),
    }
  }

  pub fn copy_active_tab(&mut self) {
    let Some(viewer) = &self.viewer else { return };
    match export::copy_to_clipboard(&viewer.copy_payload()) {
      Ok(()) => self.notify("Copied to clipboard".to_string()),
      Err(e) => self.set_error(format!("Failed to copy to clipboard: {:#}", e)),
    }
  }

  pub fn open_url(&mut self, url: &str) {
    if let Err(e) = export::open_in_browser(url) {
      self.set_error(format!("Failed to open browser: {:#}", e));
    }
  }

  // --- Polling ---

  pub fn check_pending(&mut self) -> Result<()> {
    if let Some(mut rx) = self.tasks.fetch_rx.take() {
      match rx.try_recv() {
        Ok(result) => {
          self.status_message = None;
          match result {
            Ok(fetched) => {
              self.notify(if fetched.cached {
                "Retrieved from cache: loaded instantly".to_string()
              } else {
                "Transcript fetched: successfully stored".to_string()
              });
              // A completed fetch supersedes any open still in flight.
              if self.tasks.open_rx.take().is_some() {
                info!("viewer: dropping superseded transcript load");
              }
              self.show_transcript(fetched.transcript);
              self.trigger_list();
            }
            Err(e) => {
              error!(err = %e, "api: fetch failed");
              self.set_error(format!("Failed to fetch transcript: {}", e));
            }
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.fetch_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Fetch task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.open_rx.take() {
      match rx.try_recv() {
        Ok(result) => {
          self.status_message = None;
          match result {
            Ok(transcript) => self.show_transcript(transcript),
            Err(e) => {
              warn!(err = %e, "viewer: failed to load transcript");
              self.set_error(format!("Failed to load transcript: {}", e));
              if self.viewer.is_none() {
                self.screen = Screen::Home;
              }
            }
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.open_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Load task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.list_rx.take() {
      match rx.try_recv() {
        Ok(result) => {
          self.library.loading = false;
          match result {
            Ok(items) => self.library.set_items(items),
            Err(e) => self.set_error(format!("Failed to load transcripts: {}", e)),
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.list_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.library.loading = false;
        }
      }
    }

    if let Some(mut rx) = self.tasks.delete_rx.take() {
      match rx.try_recv() {
        Ok((video_id, result)) => {
          self.deleting = None;
          match result {
            Ok(()) => {
              info!(video_id = %video_id, "library: transcript deleted");
              self.notify("Deleted: transcript removed".to_string());
              self.trigger_list();
            }
            Err(e) => self.set_error(format!("Failed to delete: {}", e)),
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.delete_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.deleting = None;
        }
      }
    }

    Ok(())
  }

  /// Replace any open transcript with `transcript` and switch to the viewer.
  fn show_transcript(&mut self, transcript: Transcript) {
    info!(
      video_id = %transcript.video_id,
      timestamps = transcript.timestamps.len(),
      "viewer: transcript ready"
    );
    self.viewer = Some(Viewer::new(transcript));
    self.screen = Screen::Viewer;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn transcript(video_id: &str) -> Transcript {
    Transcript {
      video_id: video_id.to_string(),
      title: format!("Video {}", video_id),
      author_name: "Someone".to_string(),
      thumbnail_url: None,
      captions: "Apples are red. Bananas are yellow.".to_string(),
      timestamps: vec![
        "[00:00:01] apples are red".to_string(),
        "[00:00:05] bananas are yellow".to_string(),
        "[00:01:00] more apples".to_string(),
      ],
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  // --- Library paging ---

  #[test]
  fn library_first_page_has_no_previous() {
    let mut lib = Library::new(2);
    lib.set_items(vec![transcript("a"), transcript("b")]);
    assert!(!lib.has_previous());
    assert!(lib.has_next());
    assert!(lib.show_pagination());
    assert_eq!(lib.range_label(), "1–2");
  }

  #[test]
  fn library_short_page_has_no_next() {
    let mut lib = Library::new(10);
    lib.offset = 10;
    lib.set_items(vec![transcript("a")]);
    assert!(lib.has_previous());
    assert!(!lib.has_next());
    assert_eq!(lib.range_label(), "11–11");
  }

  #[test]
  fn library_single_short_page_hides_pagination() {
    let mut lib = Library::new(10);
    lib.set_items(vec![transcript("a")]);
    assert!(!lib.show_pagination());
  }

  #[test]
  fn library_selection_wraps() {
    let mut lib = Library::new(10);
    lib.set_items(vec![transcript("a"), transcript("b")]);
    lib.select_previous();
    assert_eq!(lib.selected().map(|t| t.video_id.as_str()), Some("b"));
    lib.select_next();
    assert_eq!(lib.selected().map(|t| t.video_id.as_str()), Some("a"));
  }

  #[test]
  fn library_empty_page_clears_selection() {
    let mut lib = Library::new(10);
    lib.set_items(Vec::new());
    assert!(lib.selected().is_none());
  }

  // --- Viewer ---

  #[test]
  fn viewer_search_selects_first_match_row() {
    let mut viewer = Viewer::new(transcript("v"));
    viewer.tab = ViewerTab::Timestamps;
    viewer.search.text = "apples".to_string();
    viewer.apply_search();
    assert_eq!(viewer.view.entries().len(), 2);
    assert_eq!(viewer.entry_list.selected(), Some(0));
    viewer.next_match();
    assert_eq!(viewer.entry_list.selected(), Some(1));
    assert_eq!(viewer.selected_entry_url().as_deref(), Some("https://www.youtube.com/watch?v=v&t=60s"));
  }

  #[test]
  fn viewer_no_match_clears_selection() {
    let mut viewer = Viewer::new(transcript("v"));
    viewer.search.text = "kiwi".to_string();
    viewer.apply_search();
    assert!(viewer.view.entries().is_empty());
    assert_eq!(viewer.entry_list.selected(), None);
    viewer.next_match();
    assert_eq!(viewer.view.search().position(), 0);
  }

  #[test]
  fn viewer_clear_search_restores_everything() {
    let mut viewer = Viewer::new(transcript("v"));
    viewer.search.text = "banana".to_string();
    viewer.apply_search();
    viewer.clear_search();
    assert_eq!(viewer.view.entries().len(), 3);
    assert_eq!(viewer.entry_list.selected(), Some(0));
  }

  #[test]
  fn viewer_copy_payload_follows_tab() {
    let mut viewer = Viewer::new(transcript("v"));
    assert_eq!(viewer.copy_payload(), "Apples are red. Bananas are yellow.");
    viewer.tab = viewer.tab.toggle();
    assert_eq!(viewer.copy_payload(), "[00:00:01] apples are red\n[00:00:05] bananas are yellow\n[00:01:00] more apples");
  }

  #[test]
  fn viewer_entry_selection_is_clamped() {
    let mut viewer = Viewer::new(transcript("v"));
    for _ in 0..5 {
      viewer.select_next_entry();
    }
    assert_eq!(viewer.entry_list.selected(), Some(2));
    for _ in 0..5 {
      viewer.select_previous_entry();
    }
    assert_eq!(viewer.entry_list.selected(), Some(0));
  }

  // --- App ---

  fn app() -> App {
    let client = ApiClient::new("http://127.0.0.1:9").unwrap();
    App::new(Config::default(), client, vec!["en".to_string()])
  }

  #[test]
  fn fetch_requires_input() {
    let mut app = app();
    app.trigger_fetch();
    assert_eq!(app.last_error.as_deref(), Some("Please enter a YouTube URL or video ID"));
    assert!(app.tasks.fetch_rx.is_none());
  }

  #[test]
  fn fetch_rejects_invalid_video() {
    let mut app = app();
    app.input.text = "https://example.com/nope".to_string();
    app.trigger_fetch();
    assert!(app.last_error.as_deref().is_some_and(|e| e.starts_with("Invalid URL")));
    assert!(app.tasks.fetch_rx.is_none());
  }

  #[test]
  fn refetch_without_history_is_an_error() {
    let mut app = app();
    app.trigger_refetch();
    assert_eq!(app.last_error.as_deref(), Some("Nothing to refetch yet."));
  }

  #[test]
  fn delete_needs_confirmation() {
    let mut app = app();
    app.library.set_items(vec![transcript("a")]);
    app.request_delete();
    assert_eq!(app.pending_delete.as_deref(), Some("a"));
    app.confirm_delete(false);
    assert!(app.pending_delete.is_none());
    assert!(app.deleting.is_none());
    assert!(app.tasks.delete_rx.is_none());
  }

  #[test]
  fn close_viewer_returns_home() {
    let mut app = app();
    app.show_transcript(transcript("v"));
    assert_eq!(app.screen, Screen::Viewer);
    app.close_viewer();
    assert_eq!(app.screen, Screen::Home);
    assert!(app.viewer.is_none());
  }

  // --- Notices ---

  #[test]
  fn notices_expire_but_prompts_stay() {
    let mut app = app();
    let now = Instant::now();
    app.notify("Copied to clipboard".to_string());
    app.expire_at(now + Duration::from_secs(constants().info_expiry_secs + 1));
    assert!(app.info_message.is_none());

    app.library.set_items(vec![transcript("a")]);
    app.request_delete();
    app.expire_at(now + Duration::from_secs(3600));
    assert_eq!(app.info_message.as_deref(), Some("Delete 'Video a'? (y/n)"));
  }

  #[test]
  fn errors_expire_after_delay() {
    let mut app = app();
    let now = Instant::now();
    app.set_error("boom".to_string());
    app.expire_at(now);
    assert_eq!(app.last_error.as_deref(), Some("boom"));
    app.expire_at(now + Duration::from_secs(constants().error_expiry_secs + 1));
    assert!(app.last_error.is_none());
  }

  // --- Pending requests ---

  fn http_error(status: u16) -> ApiError {
    ApiError::Status { status, message: "boom".to_string() }
  }

  #[test]
  fn failed_load_without_viewer_stays_home() {
    let mut app = app();
    let (tx, rx) = oneshot::channel();
    app.tasks.open_rx = Some(rx);
    assert!(tx.send(Err(http_error(404))).is_ok());
    app.check_pending().unwrap();
    assert_eq!(app.screen, Screen::Home);
    assert!(app.viewer.is_none());
    assert!(app.last_error.as_deref().is_some_and(|e| e.starts_with("Failed to load transcript")));
    assert!(app.tasks.open_rx.is_none());
  }

  #[test]
  fn failed_load_keeps_open_viewer() {
    let mut app = app();
    let (tx, rx) = oneshot::channel();
    app.tasks.open_rx = Some(rx);
    app.show_transcript(transcript("aaaaaaaaaaa"));
    assert!(tx.send(Err(http_error(500))).is_ok());
    app.check_pending().unwrap();
    assert_eq!(app.screen, Screen::Viewer);
    assert_eq!(app.viewer.as_ref().map(|v| v.transcript.video_id.as_str()), Some("aaaaaaaaaaa"));
    assert!(app.last_error.is_some());
  }

  #[test]
  fn successful_load_opens_viewer() {
    let mut app = app();
    let (tx, rx) = oneshot::channel();
    app.status_message = Some("Loading transcript…".to_string());
    app.tasks.open_rx = Some(rx);
    assert!(tx.send(Ok(transcript("bbbbbbbbbbb"))).is_ok());
    app.check_pending().unwrap();
    assert_eq!(app.screen, Screen::Viewer);
    assert!(app.status_message.is_none());
    assert_eq!(app.viewer.as_ref().map(|v| v.view.entries().len()), Some(3));
  }

  #[tokio::test]
  async fn cached_fetch_reports_cache_hit() {
    let mut app = app();
    let (tx, rx) = oneshot::channel();
    app.tasks.fetch_rx = Some(rx);
    assert!(tx.send(Ok(FetchResponse { transcript: transcript("ccccccccccc"), cached: true })).is_ok());
    app.check_pending().unwrap();
    assert_eq!(app.info_message.as_deref(), Some("Retrieved from cache: loaded instantly"));
    assert_eq!(app.screen, Screen::Viewer);
    assert!(app.library.loading);
  }

  #[tokio::test]
  async fn fresh_fetch_reports_stored() {
    let mut app = app();
    let (tx, rx) = oneshot::channel();
    app.tasks.fetch_rx = Some(rx);
    assert!(tx.send(Ok(FetchResponse { transcript: transcript("ddddddddddd"), cached: false })).is_ok());
    app.check_pending().unwrap();
    assert_eq!(app.info_message.as_deref(), Some("Transcript fetched: successfully stored"));
  }

  #[tokio::test]
  async fn fetch_result_supersedes_pending_open() {
    let mut app = app();
    let (open_tx, open_rx) = oneshot::channel::<OpenResult>();
    let (fetch_tx, fetch_rx) = oneshot::channel();
    app.tasks.open_rx = Some(open_rx);
    app.tasks.fetch_rx = Some(fetch_rx);
    assert!(fetch_tx.send(Ok(FetchResponse { transcript: transcript("fetched0000"), cached: false })).is_ok());
    app.check_pending().unwrap();
    assert!(app.tasks.open_rx.is_none());
    assert!(open_tx.send(Ok(transcript("opened00000"))).is_err());
    app.check_pending().unwrap();
    assert_eq!(app.viewer.as_ref().map(|v| v.transcript.video_id.as_str()), Some("fetched0000"));
  }

  #[test]
  fn failed_fetch_leaves_state_intact() {
    let mut app = app();
    app.library.set_items(vec![transcript("a")]);
    let (tx, rx) = oneshot::channel();
    app.tasks.fetch_rx = Some(rx);
    assert!(tx.send(Err(http_error(502))).is_ok());
    app.check_pending().unwrap();
    assert_eq!(app.screen, Screen::Home);
    assert_eq!(app.library.items.len(), 1);
    assert!(app.last_error.as_deref().is_some_and(|e| e.starts_with("Failed to fetch transcript")));
  }

  #[test]
  fn dropped_fetch_task_is_reported() {
    let mut app = app();
    let (tx, rx) = oneshot::channel::<FetchResult>();
    app.tasks.fetch_rx = Some(rx);
    drop(tx);
    app.check_pending().unwrap();
    assert_eq!(app.last_error.as_deref(), Some("Fetch task failed."));
    assert!(app.tasks.fetch_rx.is_none());
  }

  #[test]
  fn pending_receivers_survive_until_ready() {
    let mut app = app();
    let (_tx, rx) = oneshot::channel::<ListResult>();
    app.tasks.list_rx = Some(rx);
    app.check_pending().unwrap();
    assert!(app.tasks.list_rx.is_some());
  }

  #[test]
  fn list_error_resets_loading() {
    let mut app = app();
    let (tx, rx) = oneshot::channel();
    app.library.loading = true;
    app.tasks.list_rx = Some(rx);
    assert!(tx.send(Err(http_error(503))).is_ok());
    app.check_pending().unwrap();
    assert!(!app.library.loading);
    assert!(app.last_error.as_deref().is_some_and(|e| e.starts_with("Failed to load transcripts")));
  }

  #[test]
  fn list_result_replaces_page() {
    let mut app = app();
    let (tx, rx) = oneshot::channel();
    app.library.loading = true;
    app.tasks.list_rx = Some(rx);
    assert!(tx.send(Ok(vec![transcript("a"), transcript("b")])).is_ok());
    app.check_pending().unwrap();
    assert!(!app.library.loading);
    assert_eq!(app.library.selected().map(|t| t.video_id.as_str()), Some("a"));
  }

  #[tokio::test]
  async fn successful_delete_reloads_library() {
    let mut app = app();
    let (tx, rx) = oneshot::channel();
    app.deleting = Some("a".to_string());
    app.tasks.delete_rx = Some(rx);
    assert!(tx.send(("a".to_string(), Ok(()))).is_ok());
    app.check_pending().unwrap();
    assert!(app.deleting.is_none());
    assert_eq!(app.info_message.as_deref(), Some("Deleted: transcript removed"));
    assert!(app.library.loading);
    assert!(app.tasks.list_rx.is_some());
  }

  #[test]
  fn failed_delete_keeps_page() {
    let mut app = app();
    app.library.set_items(vec![transcript("a")]);
    let (tx, rx) = oneshot::channel();
    app.deleting = Some("a".to_string());
    app.tasks.delete_rx = Some(rx);
    assert!(tx.send(("a".to_string(), Err(http_error(500)))).is_ok());
    app.check_pending().unwrap();
    assert!(app.deleting.is_none());
    assert_eq!(app.library.items.len(), 1);
    assert!(app.tasks.list_rx.is_none());
    assert!(app.last_error.as_deref().is_some_and(|e| e.starts_with("Failed to delete")));
  }
}
