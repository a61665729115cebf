use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::api;
use crate::app::{App, AppMode, Screen, Viewer, ViewerFocus, ViewerTab};
use crate::export::format_local;
use crate::input::LineInput;
use crate::theme::Theme;
use crate::transcript::{Highlighter, SearchPhase};

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// Rows `lines` occupy when hard-wrapped at `width` columns.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
  let width = usize::from(width.max(1));
  let rows: usize = lines.iter().map(|l| l.width().max(1).div_ceil(width)).sum();
  rows.min(usize::from(u16::MAX)) as u16
}

fn rounded_block(theme: &Theme) -> Block<'static> {
  Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border))
}

/// Spans for `text` with every search hit emphasised.
fn highlighted<'a>(text: &'a str, highlighter: &Highlighter, theme: &Theme, base: Style) -> Vec<Span<'a>> {
  highlighter
    .fragments(text)
    .into_iter()
    .map(|f| {
      if f.matched {
        Span::styled(f.text, Style::default().fg(theme.mark_fg).bg(theme.mark_bg).add_modifier(Modifier::BOLD))
      } else {
        Span::styled(f.text, base)
      }
    })
    .collect()
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  match app.screen {
    Screen::Home => render_library(frame, app, main_area),
    Screen::Viewer => render_viewer(frame, app, main_area),
  }
  render_status(frame, app, status_area);
  render_input_area(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let left = Line::from(Span::styled(" ▤ ytt ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let right_text = format!("{}  v{} ", app.api_url(), env!("CARGO_PKG_VERSION"));
  let width = right_text.chars().count() as u16;
  let right = Line::from(Span::styled(right_text, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width: width.min(area.width), ..area };
  frame.render_widget(right, right_area);
}

// --- Home ---

fn render_library(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.mode == AppMode::Library;
  let border = if focused { theme.accent } else { theme.border };

  let mut title = vec![Span::styled(" Library ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))];
  if app.library.loading {
    title.push(Span::styled("(loading…) ", Style::default().fg(theme.muted)));
  } else if app.library.show_pagination() {
    let prev = if app.library.has_previous() { "◀ " } else { "  " };
    let next = if app.library.has_next() { " ▶" } else { "  " };
    title.push(Span::styled(format!("{}{}{} ", prev, app.library.range_label(), next), Style::default().fg(theme.muted)));
  }
  let block = rounded_block(theme).title(Line::from(title)).border_style(Style::default().fg(border));

  if app.library.items.is_empty() {
    let text = if app.library.loading {
      vec![Line::from(""), Line::from(Span::styled("Loading transcripts…", Style::default().fg(theme.muted)))]
    } else {
      vec![
        Line::from(""),
        Line::from(Span::styled("No transcripts yet", Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled("Paste a YouTube URL or video ID below and press Enter.", Style::default().fg(theme.muted))),
      ]
    };
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
    return;
  }

  let inner_w = area.width.saturating_sub(4) as usize;
  let deleting = app.deleting.as_deref();
  let items: Vec<ListItem> = app
    .library
    .items
    .iter()
    .enumerate()
    .map(|(i, t)| {
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      let right = if deleting == Some(t.video_id.as_str()) {
        "deleting…".to_string()
      } else {
        format!("{}  {}", t.author_name, t.video_id)
      };
      let right_w = right.chars().count();
      let title = truncate_str(&t.title, inner_w.saturating_sub(right_w + 2));
      let gap = inner_w.saturating_sub(title.chars().count() + right_w);
      ListItem::new(Line::from(vec![
        Span::styled(title, Style::default().fg(theme.fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(theme.muted)),
      ]))
      .bg(bg)
    })
    .collect();

  let mut list = List::new(items).block(block);
  if focused {
    list = list
      .highlight_symbol("▶ ")
      .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  }
  frame.render_stateful_widget(list, area, &mut app.library.list_state);
}

// --- Viewer ---

fn render_viewer(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let Some(viewer) = app.viewer.as_mut() else { return };

  let [info_area, tabs_area, body_area] =
    Layout::vertical([Constraint::Length(7), Constraint::Length(1), Constraint::Min(3)]).areas(area);

  render_info_card(frame, theme, viewer, info_area);
  render_tabs(frame, theme, viewer, tabs_area);
  match viewer.tab {
    ViewerTab::Captions => render_captions(frame, theme, viewer, body_area),
    ViewerTab::Timestamps => render_timestamps(frame, theme, viewer, body_area),
  }
}

fn render_info_card(frame: &mut Frame, theme: &Theme, viewer: &Viewer, area: Rect) {
  let t = &viewer.transcript;
  let inner_w = area.width.saturating_sub(4) as usize;
  let label = |name: &'static str, value: String| {
    Line::from(vec![
      Span::styled(format!("{:<10}", name), Style::default().fg(theme.muted)),
      Span::styled(truncate_str(&value, inner_w.saturating_sub(10)), Style::default().fg(theme.fg)),
    ])
  };
  let lines = vec![
    Line::from(Span::styled(truncate_str(&t.title, inner_w), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    label("Author", t.author_name.clone()),
    label("Video ID", t.video_id.clone()),
    label("Created", format_local(&t.created_at)),
    label("Updated", format_local(&t.updated_at)),
  ];
  let watch = api::watch_url(&t.video_id);
  let block = rounded_block(theme)
    .title(Span::styled(" Transcript ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)))
    .title_bottom(Line::from(Span::styled(format!(" {} ", watch), Style::default().fg(theme.accent))).right_aligned())
    .padding(Padding::horizontal(1));
  frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_tabs(frame: &mut Frame, theme: &Theme, viewer: &Viewer, area: Rect) {
  let mut spans = vec![Span::raw(" ")];
  for tab in [ViewerTab::Captions, ViewerTab::Timestamps] {
    let style = if tab == viewer.tab {
      Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.muted)
    };
    spans.push(Span::styled(format!(" {} ", tab.label()), style));
    spans.push(Span::raw(" "));
  }

  let search = viewer.view.search();
  if search.phase() == SearchPhase::Searching {
    let summary = match viewer.tab {
      ViewerTab::Captions => format!("{} paragraphs match", viewer.view.paragraphs().len()),
      ViewerTab::Timestamps if search.matches().is_empty() => "0 matches".to_string(),
      ViewerTab::Timestamps => {
        format!("{}/{} of {}", search.position() + 1, search.matches().len(), viewer.view.all_entries().len())
      }
    };
    spans.push(Span::styled(format!("  {}", summary), Style::default().fg(theme.status)));
  }
  frame.render_widget(Line::from(spans), area);
}

fn no_matches(frame: &mut Frame, theme: &Theme, block: Block, area: Rect) {
  let text = vec![Line::from(""), Line::from(Span::styled("No matches found", Style::default().fg(theme.muted)))];
  frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
}

fn render_captions(frame: &mut Frame, theme: &Theme, viewer: &mut Viewer, area: Rect) {
  let block = rounded_block(theme).padding(Padding::horizontal(1));
  let searching = viewer.view.search().phase() == SearchPhase::Searching;
  if searching && viewer.view.paragraphs().is_empty() {
    no_matches(frame, theme, block, area);
    return;
  }

  let base = Style::default().fg(theme.fg);
  let highlighter = viewer.view.highlighter();
  let mut lines: Vec<Line> = Vec::new();
  for (i, paragraph) in viewer.view.paragraphs().iter().enumerate() {
    if i > 0 {
      lines.push(Line::from(""));
    }
    // Keep explicit line breaks inside a paragraph.
    for text_line in paragraph.text.split('\n') {
      lines.push(Line::from(highlighted(text_line, highlighter, theme, base)));
    }
  }

  // Character-wrap estimate; word wrapping may add a few rows.
  let total = wrapped_height(&lines, area.width.saturating_sub(4));
  viewer.caption_scroll = viewer.caption_scroll.min(total.saturating_sub(1));

  let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
  frame.render_widget(paragraph.scroll((viewer.caption_scroll, 0)).block(block), area);
}

fn render_timestamps(frame: &mut Frame, theme: &Theme, viewer: &mut Viewer, area: Rect) {
  let block = rounded_block(theme);
  let searching = viewer.view.search().phase() == SearchPhase::Searching;
  if searching && viewer.view.entries().is_empty() {
    no_matches(frame, theme, block, area);
    return;
  }

  let base = Style::default().fg(theme.fg);
  let highlighter = viewer.view.highlighter();
  let current = viewer.view.search().current_match();
  let items: Vec<ListItem> = viewer
    .view
    .entries()
    .iter()
    .map(|entry| {
      let marker = if searching && current == Some(entry.index) { "●" } else { " " };
      let mut spans = vec![
        Span::styled(marker, Style::default().fg(theme.status)),
        Span::styled(format!(" {}  ", entry.time), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
      ];
      spans.extend(highlighted(&entry.text, highlighter, theme, base));
      ListItem::new(Line::from(spans))
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().bg(theme.stripe_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, area, &mut viewer.entry_list);
}

// --- Status / input / footer ---

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ✓ {}", info), Style::default().fg(theme.info))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input_area(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  match app.screen {
    Screen::Home => {
      let focused = app.mode == AppMode::Input;
      render_line_input(frame, theme, &mut app.input, " Fetch transcript: YouTube URL or video ID ", focused, area);
    }
    Screen::Viewer => {
      let Some(viewer) = app.viewer.as_mut() else { return };
      let focused = viewer.focus == ViewerFocus::Search;
      let title = format!(" Search in {} ", viewer.tab.label().to_lowercase());
      render_line_input(frame, theme, &mut viewer.search, &title, focused, area);
    }
  }
}

fn render_line_input(frame: &mut Frame, theme: &Theme, input: &mut LineInput, title: &str, focused: bool, area: Rect) {
  let border_color = if focused { theme.accent } else { theme.border };
  let input_block = rounded_block(theme)
    .title(title.to_string())
    .title_style(Style::default().fg(border_color))
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&input.text, input.cursor);

  if cursor_col < input.scroll {
    input.scroll = cursor_col;
  } else if cursor_col >= input.scroll + inner_w {
    input.scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let scroll = input.scroll;
  let visible: String = input
    .text
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= scroll)
    .take_while(|(start, _, _)| *start < scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if focused {
    let cursor_x = area.x + 2 + (cursor_col - scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn footer_keys(app: &App) -> Vec<(&'static str, &'static str)> {
  if app.pending_delete.is_some() {
    return vec![("y", "Delete"), ("any", "Cancel")];
  }
  match app.screen {
    Screen::Home => match app.mode {
      AppMode::Input => {
        let mut k = vec![("Enter", "Fetch")];
        if app.last_fetched.is_some() {
          k.push(("^r", "Refetch"));
        }
        if !app.library.items.is_empty() {
          k.push(("↓", "Library"));
        }
        k.push(("^t", "Theme"));
        k.push(("Esc", if app.library.items.is_empty() { "Quit" } else { "Library" }));
        k
      }
      AppMode::Library => vec![
        ("Enter", "Open"),
        ("j/k", "Navigate"),
        ("h/l", "Page"),
        ("d", "Delete"),
        ("r", "Reload"),
        ("Esc", "Input"),
      ],
    },
    Screen::Viewer => {
      let focus = app.viewer.as_ref().map(|v| (v.focus, v.tab));
      match focus {
        Some((ViewerFocus::Search, _)) => vec![("Enter", "Done"), ("↑/↓", "Prev/Next"), ("Tab", "Switch"), ("Esc", "Clear")],
        Some((ViewerFocus::Browse, ViewerTab::Timestamps)) => vec![
          ("/", "Search"),
          ("n/N", "Next/Prev"),
          ("Enter", "Watch at"),
          ("c", "Copy"),
          ("s", "Save"),
          ("Tab", "Captions"),
          ("Esc", "Back"),
        ],
        _ => vec![
          ("/", "Search"),
          ("j/k", "Scroll"),
          ("o", "Watch"),
          ("c", "Copy"),
          ("s", "Save"),
          ("^r", "Refetch"),
          ("Tab", "Timestamps"),
          ("Esc", "Back"),
        ],
      }
    }
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys = footer_keys(app);

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
