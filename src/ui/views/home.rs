use crate::content::{Article, ContentService, LATEST_COUNT};
use crate::query::Query;
use crate::ui::format::{category_color, format_count, format_date, truncate};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::ArticleDetailView;
use crate::ui::{ensure_valid_selection, sync_suffix};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Landing view: the latest articles next to the most-read ranking.
pub struct HomeView {
  service: ContentService,
  articles: Query<Vec<Article>>,
  popular: Query<Vec<Article>>,
  /// Ranking derived from the cached article list, used when the
  /// popular slot itself cannot be served.
  popular_fallback: Option<Vec<Article>>,
  list_state: ListState,
}

impl HomeView {
  pub fn new(service: ContentService) -> Self {
    let mut articles = Query::idle();
    articles.follow(service.load_articles());
    let mut popular = Query::idle();
    popular.follow(service.load_popular());

    Self {
      service,
      articles,
      popular,
      popular_fallback: None,
      list_state: ListState::default(),
    }
  }

  fn latest(&self) -> &[Article] {
    let all = self.articles.data().map(|v| v.as_slice()).unwrap_or(&[]);
    &all[..all.len().min(LATEST_COUNT)]
  }

  fn ranking(&self) -> &[Article] {
    match self.popular.data() {
      Some(articles) => articles.as_slice(),
      None => self.popular_fallback.as_deref().unwrap_or(&[]),
    }
  }

  fn render_latest(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.latest().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = format!(" Latest articles{} ", sync_suffix(&self.articles));
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = if self.articles.is_loading() {
        "Loading..."
      } else if self.articles.error().is_some() {
        "Nothing cached and the backend is unreachable. Press 'r' to retry."
      } else {
        "No articles yet."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .latest()
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
          Span::raw(truncate(&article.title, 56)),
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

  fn render_ranking(&self, frame: &mut Frame, area: Rect) {
    let title = if self.popular.data().is_none() && self.popular_fallback.is_some() {
      " Most read (from cache) ".to_string()
    } else {
      format!(" Most read{} ", sync_suffix(&self.popular))
    };

    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let ranking = self.ranking();
    if ranking.is_empty() {
      let content = if self.popular.is_loading() {
        "Loading..."
      } else {
        "No ranking available."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let lines: Vec<Line> = ranking
      .iter()
      .enumerate()
      .map(|(i, article)| {
        Line::from(vec![
          Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::Cyan)),
          Span::raw(truncate(&article.title, 24)),
          Span::styled(
            format!(" ({})", format_count(article.views)),
            Style::default().fg(Color::DarkGray),
          ),
        ])
      })
      .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn refresh_queries(&mut self) {
    self.articles.poll();
    if !self.articles.in_flight() {
      if self.articles.data().is_some() {
        self.articles.follow(self.service.retry_articles());
      } else {
        self.articles.follow(self.service.load_articles());
      }
    }
    self.popular.poll();
    if !self.popular.in_flight() {
      if self.popular.data().is_some() {
        self.popular.follow(self.service.retry_popular());
      } else {
        self.popular.follow(self.service.load_popular());
      }
    }
  }
}

impl View for HomeView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Char('r') => {
        self.refresh_queries();
      }
      KeyCode::Char('R') => {
        self.articles.follow(self.service.reload_articles());
        self.popular.follow(self.service.reload_popular());
        self.popular_fallback = None;
      }
      KeyCode::Enter => {
        if let Some(idx) = self.list_state.selected() {
          if let Some(article) = self.latest().get(idx) {
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
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
      .split(area);

    self.render_latest(frame, chunks[0]);
    self.render_ranking(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Home".to_string()
  }

  fn tick(&mut self) {
    self.articles.poll();
    if self.popular.poll() {
      if self.popular.error().is_some() && self.popular_fallback.is_none() {
        self.popular_fallback = Some(self.service.popular_from_cached_list());
      } else if self.popular.data().is_some() {
        self.popular_fallback = None;
      }
    }
  }

  fn refresh(&mut self) {
    self.refresh_queries();
  }
}
