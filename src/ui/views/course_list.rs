use crate::content::{ContentService, CourseSummary};
use crate::query::Query;
use crate::ui::format::truncate;
use crate::ui::view::{View, ViewAction};
use crate::ui::{ensure_valid_selection, sync_suffix};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// View for the course catalogue
pub struct CourseListView {
  service: ContentService,
  query: Query<Vec<CourseSummary>>,
  list_state: ListState,
}

impl CourseListView {
  pub fn new(service: ContentService) -> Self {
    let mut query = Query::idle();
    query.follow(service.load_courses());

    Self {
      service,
      query,
      list_state: ListState::default(),
    }
  }

  fn courses(&self) -> &[CourseSummary] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn refresh_query(&mut self) {
    self.query.poll();
    if self.query.in_flight() {
      return;
    }
    if self.query.data().is_some() {
      self.query.follow(self.service.retry_courses());
    } else {
      self.query.follow(self.service.load_courses());
    }
  }
}

impl View for CourseListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Char('r') => {
        self.refresh_query();
      }
      KeyCode::Char('R') => {
        self.query.follow(self.service.reload_courses());
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.courses().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = format!(" Courses ({}){} ", len, sync_suffix(&self.query));
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = if self.query.is_loading() {
        "Loading..."
      } else if self.query.error().is_some() {
        "Nothing cached and the backend is unreachable. Press 'r' to retry."
      } else {
        "No courses in the catalogue."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .courses()
      .iter()
      .map(|course| {
        let line = Line::from(vec![
          Span::styled(
            format!("{:<8}", truncate(&course.diploma, 8)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<10}", truncate(&course.duration, 10)),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(" "),
          Span::raw(truncate(&course.title, 56)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn breadcrumb_label(&self) -> String {
    "Courses".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn refresh(&mut self) {
    self.refresh_query();
  }
}
