use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by the overlay that the owning view handles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
  /// Buffer changed (emitted on each keystroke)
  Changed(String),
  /// Input submitted (overlay closed, value returned)
  Submitted(String),
  /// Input dismissed (overlay closed, buffer discarded)
  Cancelled,
}

/// A one-line text entry drawn over the content area. Serves both the
/// list search and comment entry; the owning view decides which key
/// activates it.
#[derive(Debug, Clone)]
pub struct TextOverlay {
  title: &'static str,
  prefix: &'static str,
  buffer: String,
  active: bool,
}

impl TextOverlay {
  pub fn new(title: &'static str, prefix: &'static str) -> Self {
    Self {
      title,
      prefix,
      buffer: String::new(),
      active: false,
    }
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn value(&self) -> &str {
    &self.buffer
  }

  /// Open the overlay with an empty buffer
  pub fn activate(&mut self) {
    self.active = true;
    self.buffer.clear();
  }

  /// Handle a key while active. Returns `None` when inactive or the
  /// key means nothing here.
  pub fn handle_key(&mut self, key: KeyEvent) -> Option<OverlayEvent> {
    if !self.active {
      return None;
    }

    match key.code {
      KeyCode::Esc => {
        self.active = false;
        self.buffer.clear();
        Some(OverlayEvent::Cancelled)
      }
      KeyCode::Enter => {
        self.active = false;
        Some(OverlayEvent::Submitted(std::mem::take(&mut self.buffer)))
      }
      KeyCode::Backspace => {
        self.buffer.pop();
        Some(OverlayEvent::Changed(self.buffer.clone()))
      }
      KeyCode::Char(c) => {
        self.buffer.push(c);
        Some(OverlayEvent::Changed(self.buffer.clone()))
      }
      _ => None,
    }
  }

  /// Render the overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60);
    let height = 3; // Just input line with borders

    // Position at top-left of content area with small margin
    let x = area.x + 1;
    let y = area.y + 1;

    let overlay_area = Rect::new(x, y, width, height);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(self.title);

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let input_line = Line::from(vec![
      Span::styled(self.prefix, Style::default().fg(Color::Yellow)),
      Span::raw(self.buffer.as_str()),
      Span::styled("_", Style::default().fg(Color::Yellow)), // Cursor
    ]);
    frame.render_widget(Paragraph::new(input_line), inner);
  }
}
