use crate::content::{Article, ContentService, CATEGORIES, PAGE_SIZE};
use crate::query::Query;
use crate::ui::components::{OverlayEvent, TextOverlay};
use crate::ui::format::{category_color, format_date, truncate};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::ArticleDetailView;
use crate::ui::{ensure_valid_selection, sync_suffix};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// View for browsing all published articles
pub struct ArticleListView {
  service: ContentService,
  query: Query<Vec<Article>>,
  list_state: ListState,
  search: TextOverlay,
  filter: String,
  /// Index into CATEGORIES, or None for all
  category: Option<usize>,
  page: usize,
}

impl ArticleListView {
  pub fn new(service: ContentService) -> Self {
    let mut query = Query::idle();
    query.follow(service.load_articles());

    Self {
      service,
      query,
      list_state: ListState::default(),
      search: TextOverlay::new(" Search ", "/"),
      filter: String::new(),
      category: None,
      page: 0,
    }
  }

  fn filtered(&self) -> Vec<&Article> {
    let needle = self.filter.to_lowercase();
    let category = self.category.map(|i| CATEGORIES[i]);

    self
      .query
      .data()
      .map(|v| v.as_slice())
      .unwrap_or(&[])
      .iter()
      .filter(|article| category.is_none_or(|c| article.category == c))
      .filter(|article| {
        needle.is_empty()
          || article.title.to_lowercase().contains(&needle)
          || article.excerpt.to_lowercase().contains(&needle)
      })
      .collect()
  }

  fn page_count(&self) -> usize {
    self.filtered().len().div_ceil(PAGE_SIZE).max(1)
  }

  fn current_page(&self) -> Vec<&Article> {
    self
      .filtered()
      .into_iter()
      .skip(self.page * PAGE_SIZE)
      .take(PAGE_SIZE)
      .collect()
  }

  fn title(&self) -> String {
    let mut title = format!(" Articles ({})", self.filtered().len());
    if let Some(i) = self.category {
      title.push_str(&format!(" [{}]", CATEGORIES[i]));
    }
    if !self.filter.is_empty() {
      title.push_str(&format!(" /{}", self.filter));
    }
    let pages = self.page_count();
    if pages > 1 {
      title.push_str(&format!(" {}/{}", self.page + 1, pages));
    }
    title.push_str(&sync_suffix(&self.query));
    title.push(' ');
    title
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    self.page = self.page.min(self.page_count() - 1);
    let len = self.current_page().len();
    ensure_valid_selection(&mut self.list_state, len);

    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = if self.query.is_loading() {
        "Loading..."
      } else if self.query.error().is_some() {
        "Nothing cached and the backend is unreachable. Press 'r' to retry."
      } else if !self.filter.is_empty() || self.category.is_some() {
        "No articles match the filter."
      } else {
        "No articles found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .current_page()
      .iter()
      .map(|article| {
        let line = Line::from(vec![
          Span::styled(
            format!("{:<10}", truncate(&article.category, 10)),
            Style::default().fg(category_color(&article.category)),
          ),
          Span::raw(" "),
          Span::styled(
            format_date(article.created_at),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw("  "),
          Span::raw(truncate(&article.title, 64)),
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

  fn refresh_query(&mut self) {
    self.query.poll();
    if self.query.in_flight() {
      // A reconciliation for this slot is already running.
      return;
    }
    if self.query.data().is_some() {
      self.query.follow(self.service.retry_articles());
    } else {
      self.query.follow(self.service.load_articles());
    }
  }
}

impl View for ArticleListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.search.is_active() {
      match self.search.handle_key(key) {
        Some(OverlayEvent::Changed(value)) => {
          self.filter = value;
          self.page = 0;
        }
        Some(OverlayEvent::Submitted(value)) => {
          self.filter = value;
          self.page = 0;
        }
        Some(OverlayEvent::Cancelled) => {
          self.filter.clear();
          self.page = 0;
        }
        None => {}
      }
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('/') => {
        self.search.activate();
      }
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Char('n') | KeyCode::Right => {
        if self.page + 1 < self.page_count() {
          self.page += 1;
          self.list_state.select(Some(0));
        }
      }
      KeyCode::Char('p') | KeyCode::Left => {
        if self.page > 0 {
          self.page -= 1;
          self.list_state.select(Some(0));
        }
      }
      KeyCode::Char('f') => {
        // Cycle category filter: all -> each category -> all
        self.category = match self.category {
          None => Some(0),
          Some(i) if i + 1 < CATEGORIES.len() => Some(i + 1),
          Some(_) => None,
        };
        self.page = 0;
      }
      KeyCode::Char('r') => {
        self.refresh_query();
      }
      KeyCode::Char('R') => {
        self.query.follow(self.service.reload_articles());
      }
      KeyCode::Enter => {
        if let Some(idx) = self.list_state.selected() {
          if let Some(article) = self.current_page().get(idx) {
            let id = article.id.clone();
            return ViewAction::Push(Box::new(ArticleDetailView::new(self.service.clone(), id)));
          }
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.category {
      Some(i) => format!("Articles [{}]", CATEGORIES[i]),
      None => "Articles".to_string(),
    }
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn refresh(&mut self) {
    self.refresh_query();
  }

  fn wants_text_input(&self) -> bool {
    self.search.is_active()
  }
}
