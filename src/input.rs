use anyhow::Result;
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::api;
use crate::app::{App, AppMode, Screen, ViewerFocus, ViewerTab};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Single-line editable text with a char-indexed cursor.
#[derive(Debug, Clone, Default)]
pub struct LineInput {
  pub text: String,
  /// Cursor position as a char index.
  pub cursor: usize,
  /// Horizontal scroll offset in display columns, maintained by the renderer.
  pub scroll: usize,
}

impl LineInput {
  pub fn clear(&mut self) {
    self.text.clear();
    self.cursor = 0;
    self.scroll = 0;
  }

  fn len(&self) -> usize {
    self.text.chars().count()
  }

  /// Apply an editing key. Returns true when the text changed.
  pub fn handle_key(&mut self, code: KeyCode) -> bool {
    match code {
      KeyCode::Char(c) => {
        let byte_idx = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_idx, c);
        self.cursor += 1;
        true
      }
      KeyCode::Backspace => {
        if self.cursor > 0 {
          self.cursor -= 1;
          let byte_idx = char_to_byte_index(&self.text, self.cursor);
          self.text.remove(byte_idx);
          return true;
        }
        false
      }
      KeyCode::Delete => {
        if self.cursor < self.len() {
          let byte_idx = char_to_byte_index(&self.text, self.cursor);
          self.text.remove(byte_idx);
          return true;
        }
        false
      }
      KeyCode::Left => {
        self.cursor = self.cursor.saturating_sub(1);
        false
      }
      KeyCode::Right => {
        if self.cursor < self.len() {
          self.cursor += 1;
        }
        false
      }
      KeyCode::Home => {
        self.cursor = 0;
        false
      }
      KeyCode::End => {
        self.cursor = self.len();
        false
      }
      _ => false,
    }
  }
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
    app.trigger_refetch();
    return Ok(());
  }

  // A pending delete swallows the next key as its answer.
  if app.pending_delete.is_some() {
    app.confirm_delete(matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')));
    return Ok(());
  }

  match app.screen {
    Screen::Home => match app.mode {
      AppMode::Input => handle_input_key(app, key),
      AppMode::Library => handle_library_key(app, key),
    },
    Screen::Viewer => handle_viewer_key(app, key),
  }
  Ok(())
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.trigger_fetch();
    }
    KeyCode::Esc => {
      if !app.input.text.is_empty() {
        app.input.clear();
      } else if !app.library.items.is_empty() {
        app.mode = AppMode::Library;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down | KeyCode::Tab => {
      if !app.library.items.is_empty() {
        app.mode = AppMode::Library;
      }
    }
    code => {
      app.input.handle_key(code);
    }
  }
}

fn handle_library_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      if let Some(video_id) = app.library.selected().map(|t| t.video_id.clone()) {
        app.trigger_open(&video_id);
      }
    }
    KeyCode::Down | KeyCode::Char('j') => app.library.select_next(),
    KeyCode::Up | KeyCode::Char('k') => app.library.select_previous(),
    KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown => app.library_next_page(),
    KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => app.library_previous_page(),
    KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
    KeyCode::Char('r') => app.trigger_list(),
    KeyCode::Esc | KeyCode::Tab | KeyCode::Char('/') => {
      app.mode = AppMode::Input;
    }
    KeyCode::Char('q') => {
      app.should_quit = true;
    }
    _ => {}
  }
}

fn handle_viewer_key(app: &mut App, key: event::KeyEvent) {
  let Some(viewer) = app.viewer.as_mut() else {
    app.screen = Screen::Home;
    return;
  };

  if viewer.focus == ViewerFocus::Search {
    match key.code {
      KeyCode::Enter => viewer.focus = ViewerFocus::Browse,
      KeyCode::Esc => {
        viewer.clear_search();
        viewer.focus = ViewerFocus::Browse;
      }
      KeyCode::Down => viewer.next_match(),
      KeyCode::Up => viewer.previous_match(),
      KeyCode::Tab => viewer.tab = viewer.tab.toggle(),
      code => {
        if viewer.search.handle_key(code) {
          viewer.apply_search();
        }
      }
    }
    return;
  }

  match key.code {
    KeyCode::Tab | KeyCode::BackTab => viewer.tab = viewer.tab.toggle(),
    KeyCode::Char('/') => viewer.focus = ViewerFocus::Search,
    KeyCode::Char('n') => viewer.next_match(),
    KeyCode::Char('N') => viewer.previous_match(),
    KeyCode::Down | KeyCode::Char('j') => match viewer.tab {
      ViewerTab::Captions => viewer.scroll_down(1),
      ViewerTab::Timestamps => viewer.select_next_entry(),
    },
    KeyCode::Up | KeyCode::Char('k') => match viewer.tab {
      ViewerTab::Captions => viewer.scroll_up(1),
      ViewerTab::Timestamps => viewer.select_previous_entry(),
    },
    KeyCode::PageDown => viewer.scroll_down(10),
    KeyCode::PageUp => viewer.scroll_up(10),
    KeyCode::Enter => {
      if let Some(url) = viewer.selected_entry_url() {
        app.open_url(&url);
      }
    }
    KeyCode::Char('o') => {
      let url = api::watch_url(&viewer.transcript.video_id);
      app.open_url(&url);
    }
    KeyCode::Char('c') => app.copy_active_tab(),
    KeyCode::Char('s') => app.save_export(),
    KeyCode::Esc => {
      if viewer.search.text.is_empty() {
        app.close_viewer();
      } else {
        viewer.clear_search();
      }
    }
    KeyCode::Char('q') => app.close_viewer(),
    _ => {}
  }
}
