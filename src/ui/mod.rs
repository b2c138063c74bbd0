pub mod components;
pub mod format;
pub mod view;
pub mod views;

use crate::app::{App, Mode};
use crate::cache::Payload;
use crate::query::{Query, QueryState, SyncStatus};
use ratatui::prelude::*;
use ratatui::widgets::{ListState, Paragraph};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  if let Some(view) = app.current_view_mut() {
    view.render(frame, chunks[0]);
  }

  draw_status_bar(frame, chunks[1], app);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Min(1),     // Mode line
      Constraint::Length(26), // Connectivity
    ])
    .split(area);

  let (content, style) = match app.mode() {
    Mode::Normal => match app.toast_text() {
      Some(toast) => (toast.to_string(), Style::default().fg(Color::Yellow)),
      None => {
        let hint = format!(
          "{}  |  :command  j/k:nav  Enter:open  q:back  Ctrl-C:quit",
          app.breadcrumb()
        );
        (hint, Style::default().fg(Color::DarkGray))
      }
    },
    Mode::Command => {
      let suggestion = app
        .autocomplete_suggestions()
        .get(app.selected_suggestion())
        .map(|cmd| format!("  ({} - {})", cmd.name, cmd.description))
        .unwrap_or_default();
      (
        format!(":{}{}", app.command_input(), suggestion),
        Style::default().fg(Color::Yellow),
      )
    }
  };

  frame.render_widget(Paragraph::new(content).style(style), chunks[0]);

  let (net, net_style) = if app.online() {
    ("online", Style::default().fg(Color::DarkGray))
  } else {
    (
      "OFFLINE - cached data",
      Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )
  };
  frame.render_widget(
    Paragraph::new(net)
      .alignment(Alignment::Right)
      .style(net_style),
    chunks[1],
  );
}

/// Keep a list selection inside bounds as the data changes under it
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    _ => {}
  }
}

/// Short annotation for block titles describing where a query stands
pub fn sync_suffix<T: Payload>(query: &Query<T>) -> String {
  match query.state() {
    QueryState::Loading => " (loading...)".to_string(),
    QueryState::Unavailable(e) => format!(" (error: {})", e),
    QueryState::Ready { status, .. } => match status {
      SyncStatus::Reconciling => " (syncing...)".to_string(),
      SyncStatus::Offline => " (cached)".to_string(),
      SyncStatus::Synced => String::new(),
    },
    QueryState::Idle => String::new(),
  }
}
