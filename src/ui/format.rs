use chrono::{TimeZone, Utc};
use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..."
/// if truncated. Counts characters, not bytes: titles here carry
/// accents and slicing through one panics.
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Get the display color for an article category
pub fn category_color(category: &str) -> Color {
  match category {
    "INNOVATION" => Color::Cyan,
    "SÉCURITÉ" => Color::Red,
    "NOUVEAUTÉ" => Color::Green,
    "TUTO" => Color::Yellow,
    "DOMOTIQUE" => Color::Magenta,
    _ => Color::White,
  }
}

/// Render an epoch-millis timestamp for lists and bylines
pub fn format_date(millis: Option<i64>) -> String {
  match millis.and_then(|ms| Utc.timestamp_millis_opt(ms).single()) {
    Some(dt) => dt.format("%d %b %Y").to_string(),
    None => "undated".to_string(),
  }
}

/// Compact counter for views and comments
pub fn format_count(count: u64) -> String {
  if count < 1000 {
    count.to_string()
  } else {
    format!("{:.1}k", count as f64 / 1000.0)
  }
}
