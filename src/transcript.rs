//! Caption segmentation, timestamp parsing and in-memory search.
//!
//! Everything here is synchronous and pure: views are rebuilt from the
//! immutable transcript text plus the current query, never patched in place.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

use crate::constants::constants;

/// Runs of two or more newlines separate natural paragraphs.
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").expect("valid paragraph regex"));

/// Sentence terminator(s) plus the whitespace after them.
static SENTENCE_BOUNDARY: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"[.!?]+\s+").expect("valid sentence boundary regex"));

/// Leading `HH:MM:SS` marker, optionally bracketed, then the line content.
static TIMESTAMP_LINE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?s)^\s*\[?([0-9]{2}):([0-9]{2}):([0-9]{2})\]?\s*(.*)$").expect("valid timestamp regex")
});

const DEFAULT_TIME: &str = "00:00:00";

// --- Types ---

/// A display paragraph derived from the caption blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
  pub text: String,
  pub index: usize,
}

/// One parsed timestamp line.
///
/// `index` is the line's position in the original `timestamps` list and
/// survives filtering, so UI rows keyed by it stay addressable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampEntry {
  pub time: String,
  pub text: String,
  pub seconds: u32,
  pub index: usize,
}

/// Anything with searchable text.
pub trait Searchable {
  fn search_text(&self) -> &str;
}

impl Searchable for Paragraph {
  fn search_text(&self) -> &str {
    &self.text
  }
}

impl Searchable for TimestampEntry {
  fn search_text(&self) -> &str {
    &self.text
  }
}

// --- Segmentation ---

/// Split caption text into display paragraphs using the configured sentence chunk size.
pub fn segment(captions: &str) -> Vec<Paragraph> {
  segment_with(captions, constants().sentences_per_paragraph)
}

/// Split caption text into paragraphs.
///
/// Natural breaks (blank lines) win when there is more than one non-empty
/// piece. Otherwise sentences are grouped `sentences_per_paragraph` at a time.
/// Never returns an empty vec: if nothing survives, the original text is the
/// single paragraph.
pub fn segment_with(captions: &str, sentences_per_paragraph: usize) -> Vec<Paragraph> {
  let natural: Vec<&str> = PARAGRAPH_BREAK.split(captions).map(str::trim).filter(|p| !p.is_empty()).collect();

  let texts = if natural.len() > 1 {
    natural.into_iter().map(str::to_string).collect()
  } else {
    chunk_sentences(captions, sentences_per_paragraph.max(1))
  };

  if texts.is_empty() {
    return vec![Paragraph { text: captions.to_string(), index: 0 }];
  }
  texts.into_iter().enumerate().map(|(index, text)| Paragraph { text, index }).collect()
}

/// Sentence tokens with their terminating punctuation and whitespace attached.
/// The final token is whatever follows the last boundary (possibly empty).
fn sentence_tokens(text: &str) -> Vec<&str> {
  let mut tokens = Vec::new();
  let mut start = 0;
  for boundary in SENTENCE_BOUNDARY.find_iter(text) {
    tokens.push(&text[start..boundary.end()]);
    start = boundary.end();
  }
  tokens.push(&text[start..]);
  tokens
}

fn chunk_sentences(text: &str, per_paragraph: usize) -> Vec<String> {
  let tokens = sentence_tokens(text);
  let last = tokens.len().saturating_sub(1);

  let mut paragraphs = Vec::new();
  let mut buffer = String::new();
  let mut count = 0;
  for (i, token) in tokens.iter().enumerate() {
    buffer.push_str(token);
    count += 1;
    if count >= per_paragraph || i == last {
      let trimmed = buffer.trim();
      if !trimmed.is_empty() {
        paragraphs.push(trimmed.to_string());
      }
      buffer.clear();
      count = 0;
    }
  }
  paragraphs
}

// --- Timestamps ---

/// Parse raw timestamp lines, one entry per line, preserving input positions.
pub fn parse_timestamps<S: AsRef<str>>(lines: &[S]) -> Vec<TimestampEntry> {
  lines.iter().enumerate().map(|(index, line)| parse_timestamp_line(line.as_ref(), index)).collect()
}

fn parse_timestamp_line(line: &str, index: usize) -> TimestampEntry {
  match split_marker(line) {
    Some((time, text, seconds)) => TimestampEntry { time, text, seconds, index },
    None => TimestampEntry { time: DEFAULT_TIME.to_string(), text: line.to_string(), seconds: 0, index },
  }
}

fn split_marker(line: &str) -> Option<(String, String, u32)> {
  let caps = TIMESTAMP_LINE.captures(line)?;
  let hours: u32 = caps[1].parse().ok()?;
  let minutes: u32 = caps[2].parse().ok()?;
  let seconds: u32 = caps[3].parse().ok()?;
  let time = format!("{}:{}:{}", &caps[1], &caps[2], &caps[3]);
  Some((time, caps[4].to_string(), hours * 3600 + minutes * 60 + seconds))
}

// --- Search ---

/// Whether `query` should be treated as "no search".
pub fn is_blank(query: &str) -> bool {
  query.trim().is_empty()
}

/// Case-insensitive substring filter. Blank queries return everything.
/// Order and indices are preserved.
pub fn filter<T: Searchable + Clone>(items: &[T], query: &str) -> Vec<T> {
  filter_with(items, &Highlighter::new(query))
}

/// Keep the items `matcher` accepts, using the same folding as highlighting.
fn filter_with<T: Searchable + Clone>(items: &[T], matcher: &Highlighter) -> Vec<T> {
  items.iter().filter(|item| matcher.is_match(item.search_text())).cloned().collect()
}

/// A contiguous span of text, marked when it matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
  pub text: &'a str,
  pub matched: bool,
}

/// Compiled literal, case-insensitive matcher for one query.
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
  pattern: Option<Regex>,
}

impl Highlighter {
  pub fn new(query: &str) -> Self {
    if is_blank(query) {
      return Self::default();
    }
    // Escaped: the query is a literal, never a pattern.
    let pattern = RegexBuilder::new(&regex::escape(query)).case_insensitive(true).build().ok();
    Self { pattern }
  }

  /// Whether `text` contains the query. An empty matcher accepts everything.
  pub fn is_match(&self, text: &str) -> bool {
    self.pattern.as_ref().is_none_or(|p| p.is_match(text))
  }

  /// Split `text` into alternating plain and matched fragments, in order.
  pub fn fragments<'a>(&self, text: &'a str) -> Vec<Fragment<'a>> {
    let Some(pattern) = &self.pattern else {
      return vec![Fragment { text, matched: false }];
    };

    let mut out = Vec::new();
    let mut last = 0;
    for m in pattern.find_iter(text) {
      if m.start() > last {
        out.push(Fragment { text: &text[last..m.start()], matched: false });
      }
      out.push(Fragment { text: m.as_str(), matched: true });
      last = m.end();
    }
    if last < text.len() || out.is_empty() {
      out.push(Fragment { text: &text[last..], matched: false });
    }
    out
  }
}

// --- Search session ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
  #[default]
  Idle,
  Searching,
}

/// Query plus a cursor over the indices of matching timestamp entries.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
  query: String,
  matches: Vec<usize>,
  position: usize,
}

impl SearchState {
  pub fn phase(&self) -> SearchPhase {
    if is_blank(&self.query) { SearchPhase::Idle } else { SearchPhase::Searching }
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  /// Entry indices currently matching, in transcript order.
  pub fn matches(&self) -> &[usize] {
    &self.matches
  }

  pub fn position(&self) -> usize {
    self.position
  }

  /// Replace the query and re-derive matches from `visible`, the already-filtered
  /// entries. The cursor always restarts at the first match.
  pub fn update(&mut self, query: &str, visible: &[TimestampEntry]) {
    self.query = query.to_string();
    self.matches = if is_blank(query) { Vec::new() } else { visible.iter().map(|e| e.index).collect() };
    self.position = 0;
  }

  pub fn clear(&mut self) {
    self.query.clear();
    self.matches.clear();
    self.position = 0;
  }

  pub fn next(&mut self) {
    let count = self.matches.len();
    if count > 0 {
      self.position = (self.position + 1) % count;
    }
  }

  pub fn previous(&mut self) {
    let count = self.matches.len();
    if count > 0 {
      self.position = (self.position + count - 1) % count;
    }
  }

  /// The entry index under the cursor, if any.
  pub fn current_match(&self) -> Option<usize> {
    self.matches.get(self.position).copied()
  }
}

// --- View ---

/// Display-ready derivation of one transcript, memoised on the query.
#[derive(Debug, Clone)]
pub struct TranscriptView {
  paragraphs: Vec<Paragraph>,
  entries: Vec<TimestampEntry>,
  search: SearchState,
  visible_paragraphs: Vec<Paragraph>,
  visible_entries: Vec<TimestampEntry>,
  highlighter: Highlighter,
}

impl TranscriptView {
  pub fn new<S: AsRef<str>>(captions: &str, timestamps: &[S]) -> Self {
    let paragraphs = segment(captions);
    let entries = parse_timestamps(timestamps);
    Self {
      visible_paragraphs: paragraphs.clone(),
      visible_entries: entries.clone(),
      paragraphs,
      entries,
      search: SearchState::default(),
      highlighter: Highlighter::default(),
    }
  }

  /// Apply a new query. Re-filtering only happens when the query actually changed.
  pub fn set_query(&mut self, query: &str) {
    if query == self.search.query() {
      return;
    }
    self.highlighter = Highlighter::new(query);
    self.visible_paragraphs = filter_with(&self.paragraphs, &self.highlighter);
    self.visible_entries = filter_with(&self.entries, &self.highlighter);
    self.search.update(query, &self.visible_entries);
  }

  pub fn clear_query(&mut self) {
    self.search.clear();
    self.visible_paragraphs = self.paragraphs.clone();
    self.visible_entries = self.entries.clone();
    self.highlighter = Highlighter::default();
  }

  pub fn next_match(&mut self) {
    self.search.next();
  }

  pub fn previous_match(&mut self) {
    self.search.previous();
  }

  pub fn search(&self) -> &SearchState {
    &self.search
  }

  pub fn paragraphs(&self) -> &[Paragraph] {
    &self.visible_paragraphs
  }

  pub fn entries(&self) -> &[TimestampEntry] {
    &self.visible_entries
  }

  pub fn all_entries(&self) -> &[TimestampEntry] {
    &self.entries
  }

  pub fn highlighter(&self) -> &Highlighter {
    &self.highlighter
  }

  /// Row of the current match within `entries()`, for scrolling.
  pub fn current_match_row(&self) -> Option<usize> {
    let target = self.search.current_match()?;
    self.visible_entries.iter().position(|e| e.index == target)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn highlight<'a>(text: &'a str, query: &str) -> Vec<Fragment<'a>> {
    Highlighter::new(query).fragments(text)
  }

  fn texts(paragraphs: &[Paragraph]) -> Vec<&str> {
    paragraphs.iter().map(|p| p.text.as_str()).collect()
  }

  // --- segment ---

  #[test]
  fn segment_natural_paragraphs_are_trimmed() {
    let paragraphs = segment("  First part.  \n\n\n Second part \n\nThird");
    assert_eq!(texts(&paragraphs), vec!["First part.", "Second part", "Third"]);
    assert_eq!(paragraphs.iter().map(|p| p.index).collect::<Vec<_>>(), vec![0, 1, 2]);
  }

  #[test]
  fn segment_drops_empty_natural_pieces() {
    let paragraphs = segment("\n\nalpha\n\n   \n\nbeta\n\n");
    assert_eq!(texts(&paragraphs), vec!["alpha", "beta"]);
  }

  #[test]
  fn segment_groups_four_sentences() {
    let paragraphs = segment("One. Two! Three? Four. Five. Six.");
    assert_eq!(texts(&paragraphs), vec!["One. Two! Three? Four.", "Five. Six."]);
    assert_eq!(paragraphs[1].index, 1);
  }

  #[test]
  fn segment_keeps_repeated_punctuation_with_sentence() {
    let paragraphs = segment_with("Wait... what?! Really. ok", 2);
    assert_eq!(texts(&paragraphs), vec!["Wait... what?!", "Really. ok"]);
  }

  #[test]
  fn segment_single_newline_is_not_a_break() {
    let paragraphs = segment("line one\nline two");
    assert_eq!(texts(&paragraphs), vec!["line one\nline two"]);
  }

  #[test]
  fn segment_empty_input_yields_single_empty_paragraph() {
    assert_eq!(segment(""), vec![Paragraph { text: String::new(), index: 0 }]);
  }

  #[test]
  fn segment_whitespace_input_is_kept_verbatim() {
    assert_eq!(segment("   "), vec![Paragraph { text: "   ".to_string(), index: 0 }]);
  }

  #[test]
  fn segment_without_breaks_never_exceeds_chunk_or_emits_empty() {
    let captions = (0..23).map(|i| format!("Sentence number {}.", i)).collect::<Vec<_>>().join(" ");
    let paragraphs = segment(&captions);
    assert_eq!(paragraphs.len(), 6);
    for p in &paragraphs {
      assert!(!p.text.trim().is_empty());
      assert!(sentence_tokens(&p.text).len() <= 5);
    }
  }

  #[test]
  fn segment_is_deterministic() {
    let captions = "A. B. C. D. E. F. G. H. I.";
    assert_eq!(segment(captions), segment(captions));
  }

  // --- parse_timestamps ---

  #[test]
  fn parse_bracketed_marker() {
    assert_eq!(
      parse_timestamps(&["[00:01:05] hello"]),
      vec![TimestampEntry { time: "00:01:05".to_string(), text: "hello".to_string(), seconds: 65, index: 0 }]
    );
  }

  #[test]
  fn parse_bare_marker() {
    let entries = parse_timestamps(&["01:02:03 big number"]);
    assert_eq!(entries[0].time, "01:02:03");
    assert_eq!(entries[0].text, "big number");
    assert_eq!(entries[0].seconds, 3723);
  }

  #[test]
  fn parse_no_marker_degrades() {
    assert_eq!(
      parse_timestamps(&["no marker here"]),
      vec![TimestampEntry { time: "00:00:00".to_string(), text: "no marker here".to_string(), seconds: 0, index: 0 }]
    );
  }

  #[test]
  fn parse_marker_not_at_start_is_plain_text() {
    let entries = parse_timestamps(&["said at 00:00:10 maybe"]);
    assert_eq!(entries[0].seconds, 0);
    assert_eq!(entries[0].text, "said at 00:00:10 maybe");
  }

  #[test]
  fn parse_marker_with_empty_text() {
    let entries = parse_timestamps(&["[00:00:09]"]);
    assert_eq!(entries[0].text, "");
    assert_eq!(entries[0].seconds, 9);
  }

  #[test]
  fn parse_preserves_length_and_indices() {
    let lines = vec!["[00:00:01] a".to_string(), "junk".to_string(), String::new(), "[00:00:04] d".to_string()];
    let entries = parse_timestamps(&lines);
    assert_eq!(entries.len(), lines.len());
    for (i, e) in entries.iter().enumerate() {
      assert_eq!(e.index, i);
    }
  }

  // --- filter ---

  fn fruit_entries() -> Vec<TimestampEntry> {
    parse_timestamps(&["[00:00:01] apple", "[00:00:02] Banana", "[00:00:03] grape"])
  }

  #[test]
  fn filter_empty_query_returns_input() {
    let entries = fruit_entries();
    assert_eq!(filter(&entries, ""), entries);
    assert_eq!(filter(&entries, "   "), entries);
  }

  #[test]
  fn filter_is_case_insensitive_and_keeps_index() {
    let entries = fruit_entries();
    let hits = filter(&entries, "AN");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "Banana");
    assert_eq!(hits[0].index, 1);
  }

  #[test]
  fn filter_applies_to_paragraphs() {
    let paragraphs = segment("Cats purr.\n\nDogs bark.\n\nCATS nap.");
    let hits = filter(&paragraphs, "cats");
    assert_eq!(hits.iter().map(|p| p.index).collect::<Vec<_>>(), vec![0, 2]);
  }

  #[test]
  fn filter_and_highlight_fold_case_alike() {
    // Long s and the Kelvin sign fold to ASCII letters but do not lowercase to them.
    let entries = parse_timestamps(&["[00:00:01] ſtop", "[00:00:02] 5 \u{212A}", "[00:00:03] none"]);
    let hits = filter(&entries, "S");
    assert_eq!(hits.iter().map(|e| e.index).collect::<Vec<_>>(), vec![0]);
    assert!(Highlighter::new("S").fragments(&hits[0].text)[0].matched);

    let hits = filter(&entries, "k");
    assert_eq!(hits.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1]);
    assert!(Highlighter::new("k").fragments(&hits[0].text).iter().any(|f| f.matched));
  }

  // --- highlight ---

  #[test]
  fn highlight_treats_query_literally() {
    let fragments = highlight("a.b*c", ".b*");
    assert_eq!(
      fragments,
      vec![Fragment { text: "a", matched: false }, Fragment { text: ".b*", matched: true }, Fragment {
        text: "c",
        matched: false
      }]
    );
  }

  #[test]
  fn highlight_marks_every_occurrence_case_insensitively() {
    let fragments = highlight("The cat and the CAT", "cat");
    let marked: Vec<&str> = fragments.iter().filter(|f| f.matched).map(|f| f.text).collect();
    assert_eq!(marked, vec!["cat", "CAT"]);
    let rebuilt: String = fragments.iter().map(|f| f.text).collect();
    assert_eq!(rebuilt, "The cat and the CAT");
  }

  #[test]
  fn highlight_blank_query_leaves_text_alone() {
    assert_eq!(highlight("hello", "  "), vec![Fragment { text: "hello", matched: false }]);
  }

  #[test]
  fn highlight_metacharacter_queries_do_not_fail() {
    for q in ["(", "[", "\\", "$^", "a|b", "{2}"] {
      let fragments = highlight("x ( [ \\ $^ a|b {2}", q);
      assert!(fragments.iter().any(|f| f.matched), "query {:?} should match literally", q);
    }
  }

  // --- SearchState ---

  #[test]
  fn next_with_no_matches_is_noop() {
    let mut state = SearchState::default();
    state.update("zzz", &[]);
    state.next();
    state.previous();
    assert_eq!(state.position(), 0);
    assert_eq!(state.current_match(), None);
  }

  #[test]
  fn navigation_wraps_both_ways() {
    let entries = parse_timestamps(&["[00:00:01] ab", "[00:00:02] x", "[00:00:03] ab", "[00:00:04] ab"]);
    let visible = filter(&entries, "ab");
    let mut state = SearchState::default();
    state.update("ab", &visible);
    assert_eq!(state.matches(), &[0, 2, 3]);
    state.previous();
    assert_eq!(state.current_match(), Some(3));
    state.next();
    assert_eq!(state.current_match(), Some(0));
    state.next();
    state.next();
    state.next();
    assert_eq!(state.position(), 0);
  }

  #[test]
  fn phase_follows_query() {
    let mut state = SearchState::default();
    assert_eq!(state.phase(), SearchPhase::Idle);
    state.update("a", &[]);
    assert_eq!(state.phase(), SearchPhase::Searching);
    state.clear();
    assert_eq!(state.phase(), SearchPhase::Idle);
  }

  // --- TranscriptView ---

  #[test]
  fn view_query_change_resets_cursor() {
    let mut view =
      TranscriptView::new("Apple pie. Banana bread.", &["[00:00:01] apple", "[00:00:02] apple", "[00:00:03] pear"]);
    view.set_query("app");
    view.next_match();
    assert_eq!(view.search().position(), 1);
    view.set_query("appl");
    assert_eq!(view.search().position(), 0);
    assert_eq!(view.current_match_row(), Some(0));
  }

  #[test]
  fn view_same_query_keeps_cursor() {
    let mut view = TranscriptView::new("", &["[00:00:01] a", "[00:00:02] a"]);
    view.set_query("a");
    view.next_match();
    view.set_query("a");
    assert_eq!(view.search().position(), 1);
  }

  #[test]
  fn view_filters_keep_original_indices() {
    let mut view = TranscriptView::new("", &["[00:00:01] apple", "[00:00:02] banana", "[00:00:03] grape"]);
    view.set_query("an");
    assert_eq!(view.entries().len(), 1);
    assert_eq!(view.entries()[0].index, 1);
    assert_eq!(view.all_entries().len(), 3);
    view.clear_query();
    assert_eq!(view.entries().len(), 3);
    assert_eq!(view.search().phase(), SearchPhase::Idle);
  }
}
