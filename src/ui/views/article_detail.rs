use crate::content::{Article, Comment, ContentService};
use crate::query::{Call, CallState, Query, SyncStatus};
use crate::ui::components::{OverlayEvent, TextOverlay};
use crate::ui::format::{category_color, format_count, format_date, truncate};
use crate::ui::view::{View, ViewAction};
use crate::ui::sync_suffix;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Reading view for one article: body, related suggestions and the
/// live comment thread.
pub struct ArticleDetailView {
  service: ContentService,
  article: Query<Article>,
  /// Slug resolution, for views opened by `:open <slug>`
  resolve: Call<crate::cache::Snapshot<Article>>,
  id: Option<String>,
  slug: Option<String>,
  comments: Call<Vec<Comment>>,
  related: Call<Vec<Article>>,
  post: Call<()>,
  comment_input: TextOverlay,
  notice: Option<String>,
  viewed: bool,
  aux_started: bool,
  scroll: u16,
}

impl ArticleDetailView {
  fn empty(service: ContentService) -> Self {
    Self {
      service,
      article: Query::idle(),
      resolve: Call::idle(),
      id: None,
      slug: None,
      comments: Call::idle(),
      related: Call::idle(),
      post: Call::idle(),
      comment_input: TextOverlay::new(" Comment ", "> "),
      notice: None,
      viewed: false,
      aux_started: false,
      scroll: 0,
    }
  }

  pub fn new(service: ContentService, id: String) -> Self {
    let mut view = Self::empty(service);
    view.article.follow(view.service.load_article(&id));
    view.id = Some(id);
    view
  }

  /// Open by url slug; the article id is only known once the backend
  /// (or the cached list) has resolved it.
  pub fn by_slug(service: ContentService, slug: String) -> Self {
    let mut view = Self::empty(service);
    view.slug = Some(slug.clone());

    let svc = view.service.clone();
    view
      .resolve
      .start(async move { svc.article_by_slug(&slug).await });
    view
  }

  fn start_aux(&mut self) {
    let Some(article) = self.article.data().cloned() else {
      return;
    };

    if !self.viewed {
      self.viewed = true;
      self.service.record_view(&article.id);
    }

    let svc = self.service.clone();
    let id = article.id.clone();
    self.comments.start(async move { svc.comments(&id).await });

    let svc = self.service.clone();
    self
      .related
      .start(async move { Ok(svc.related(&article).await) });
  }

  fn submit_comment(&mut self, text: String) {
    let text = text.trim().to_string();
    if text.len() < 2 {
      self.notice = Some("Comment too short.".to_string());
      return;
    }
    let Some(article) = self.article.data() else {
      return;
    };

    let author = std::env::var("USER")
      .ok()
      .filter(|u| !u.is_empty())
      .unwrap_or_else(|| "reader".to_string());
    let svc = self.service.clone();
    let id = article.id.clone();
    self.notice = None;
    self
      .post
      .start(async move { svc.post_comment(&id, &author, &text).await });
  }

  fn related_articles(&self) -> &[Article] {
    match self.related.state() {
      CallState::Done(articles) => articles.as_slice(),
      _ => &[],
    }
  }

  fn render_header(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" Article{} ", sync_suffix(&self.article)))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let lines = match self.article.data() {
      Some(article) => vec![
        Line::from(Span::styled(
          article.title.clone(),
          Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
          Span::styled(
            article.category.clone(),
            Style::default().fg(category_color(&article.category)),
          ),
          Span::styled(
            format!(
              "  {}  {}",
              format_date(article.created_at),
              if article.author.is_empty() {
                "ElectroInfo".to_string()
              } else {
                article.author.clone()
              }
            ),
            Style::default().fg(Color::DarkGray),
          ),
        ]),
        Line::from(Span::styled(
          format!(
            "{} views  {} comments",
            format_count(article.views),
            format_count(article.comments_count)
          ),
          Style::default().fg(Color::DarkGray),
        )),
      ],
      None => {
        let text = if self.resolve.is_running() || self.article.is_loading() {
          "Loading...".to_string()
        } else if let Some(e) = self.article.error() {
          format!("{}. Press 'r' to retry.", e)
        } else {
          String::new()
        };
        vec![Line::from(Span::styled(
          text,
          Style::default().fg(Color::DarkGray),
        ))]
      }
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn render_body(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let content = self
      .article
      .data()
      .map(|a| a.content.clone())
      .unwrap_or_default();

    let paragraph = Paragraph::new(content)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0))
      .block(block);
    frame.render_widget(paragraph, area);
  }

  fn render_related(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Related ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let related = self.related_articles();
    let lines: Vec<Line> = if related.is_empty() {
      let text = match self.related.state() {
        CallState::Running => "(loading...)",
        CallState::Done(_) => "No related articles.",
        _ => "",
      };
      vec![Line::from(Span::styled(
        text,
        Style::default().fg(Color::DarkGray),
      ))]
    } else {
      related
        .iter()
        .enumerate()
        .map(|(i, article)| {
          Line::from(vec![
            Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::Cyan)),
            Span::raw(truncate(&article.title, 48)),
            Span::styled(
              format!("  {}", format_date(article.created_at)),
              Style::default().fg(Color::DarkGray),
            ),
          ])
        })
        .collect()
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn render_comments(&self, frame: &mut Frame, area: Rect) {
    let title = match self.comments.state() {
      CallState::Done(list) => format!(" Comments ({}) - 'c' to write ", list.len()),
      _ => " Comments - 'c' to write ".to_string(),
    };
    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let mut lines: Vec<Line> = Vec::new();
    if let Some(notice) = &self.notice {
      lines.push(Line::from(Span::styled(
        notice.clone(),
        Style::default().fg(Color::Yellow),
      )));
    }

    match self.comments.state() {
      CallState::Running => {
        lines.push(Line::from(Span::styled(
          "(loading...)",
          Style::default().fg(Color::DarkGray),
        )));
      }
      CallState::Done(list) if list.is_empty() => {
        lines.push(Line::from(Span::styled(
          "No comments yet.",
          Style::default().fg(Color::DarkGray),
        )));
      }
      CallState::Done(list) => {
        for comment in list {
          lines.push(Line::from(Span::styled(
            format!("{} • {}", comment.author, format_date(comment.created_at)),
            Style::default().fg(Color::Cyan),
          )));
          lines.push(Line::from(Span::raw(comment.text.clone())));
        }
      }
      CallState::Failed(e) if e == "offline" => {
        lines.push(Line::from(Span::styled(
          "Comments need a connection. Press 'r' when back online.",
          Style::default().fg(Color::DarkGray),
        )));
      }
      CallState::Failed(e) => {
        lines.push(Line::from(Span::styled(
          format!("Comments unavailable: {}", e),
          Style::default().fg(Color::DarkGray),
        )));
      }
      CallState::Idle => {}
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    frame.render_widget(paragraph, area);
  }
}

impl View for ArticleDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.comment_input.is_active() {
      if let Some(OverlayEvent::Submitted(text)) = self.comment_input.handle_key(key) {
        self.submit_comment(text);
      }
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('c') => {
        if self.article.data().is_some() {
          self.comment_input.activate();
        }
      }
      KeyCode::Char('j') | KeyCode::Down => {
        self.scroll = self.scroll.saturating_add(1);
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.scroll = self.scroll.saturating_sub(1);
      }
      KeyCode::Char(c @ '1'..='3') => {
        let idx = c as usize - '1' as usize;
        if let Some(article) = self.related_articles().get(idx) {
          let id = article.id.clone();
          return ViewAction::Push(Box::new(ArticleDetailView::new(self.service.clone(), id)));
        }
      }
      KeyCode::Char('r') => {
        self.refresh();
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(5),
        Constraint::Min(3),
        Constraint::Length(5),
        Constraint::Length(8),
      ])
      .split(area);

    self.render_header(frame, chunks[0]);
    self.render_body(frame, chunks[1]);
    self.render_related(frame, chunks[2]);
    self.render_comments(frame, chunks[3]);
    self.comment_input.render_overlay(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    if let Some(article) = self.article.data() {
      truncate(&article.title, 24)
    } else if let Some(slug) = &self.slug {
      format!("/{}", slug)
    } else {
      "Article".to_string()
    }
  }

  fn tick(&mut self) {
    if self.resolve.poll() {
      match self.resolve.take_settled() {
        Some(Ok(snapshot)) => {
          self.id = Some(snapshot.data.id.clone());
          let status = if snapshot.stale {
            SyncStatus::Offline
          } else {
            SyncStatus::Synced
          };
          self.article.supply(snapshot, status);
        }
        Some(Err(e)) => self.article.fail(e),
        None => {}
      }
    }

    self.article.poll();

    if !self.aux_started && self.article.data().is_some() {
      self.aux_started = true;
      self.start_aux();
    }

    self.comments.poll();
    self.related.poll();

    if self.post.poll() {
      match self.post.take_settled() {
        Some(Ok(())) => {
          self.notice = Some("Comment posted.".to_string());
          // Re-read the thread so the new comment shows up.
          if let Some(article) = self.article.data() {
            let svc = self.service.clone();
            let id = article.id.clone();
            self.comments.start(async move { svc.comments(&id).await });
          }
        }
        Some(Err(e)) => {
          self.notice = Some(format!("Comment not posted: {}", e));
        }
        None => {}
      }
    }
  }

  fn refresh(&mut self) {
    if let Some(id) = self.id.clone() {
      self.article.poll();
      if self.article.in_flight() {
        return;
      }
      if self.article.data().is_some() {
        self.article.follow(self.service.retry_article(&id));
      } else {
        self.article.follow(self.service.load_article(&id));
      }
      if self.aux_started {
        self.start_aux();
      }
    } else if let Some(slug) = self.slug.clone() {
      if !self.resolve.is_running() {
        let svc = self.service.clone();
        self
          .resolve
          .start(async move { svc.article_by_slug(&slug).await });
      }
    }
  }

  fn wants_text_input(&self) -> bool {
    self.comment_input.is_active()
  }
}
