use crate::commands::{self, Command};
use crate::content::{ContentService, SubscribeOutcome};
use crate::event::{Event, EventHandler};
use crate::net::ConnectivityOracle;
use crate::query::Call;
use crate::ui;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{ArticleDetailView, ArticleListView, CourseListView, HomeView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long a status-bar notice stays visible
const TOAST_TTL: Duration = Duration::from_secs(3);

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// Content service shared with every view
  service: ContentService,

  /// Connectivity oracle, also owned by the background prober
  oracle: Arc<ConnectivityOracle>,

  /// Last connectivity state seen by the UI
  online: bool,

  /// Transient status-bar notice
  toast: Option<(String, Instant)>,

  /// In-flight newsletter subscription, driven from the command line
  subscribe_call: Call<SubscribeOutcome>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(service: ContentService, oracle: Arc<ConnectivityOracle>) -> Self {
    let online = oracle.is_online();
    let root: Box<dyn View> = Box::new(HomeView::new(service.clone()));

    Self {
      view_stack: vec![root],
      mode: Mode::Normal,
      command_input: String::new(),
      selected_suggestion: 0,
      service,
      oracle,
      online,
      toast: None,
      subscribe_call: Call::idle(),
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250), self.oracle.subscribe());

    // Main loop
    while !self.should_quit {
      // Draw UI
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Handle events
      if let Some(event) = events.next().await {
        self.handle_event(event)?;
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_event(&mut self, event: Event) -> Result<()> {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.handle_tick(),
      Event::Net(online) => self.handle_connectivity(online),
    }
    Ok(())
  }

  fn handle_tick(&mut self) {
    if let Some(view) = self.view_stack.last_mut() {
      view.tick();
    }

    self.subscribe_call.poll();
    if let Some(result) = self.subscribe_call.take_settled() {
      match result {
        Ok(SubscribeOutcome::Subscribed) => self.toast("Subscribed."),
        Ok(SubscribeOutcome::AlreadySubscribed) => self.toast("Already subscribed."),
        Err(e) => self.toast(format!("Subscribe failed: {}", e)),
      }
    }

    if let Some((_, shown_at)) = &self.toast {
      if shown_at.elapsed() > TOAST_TTL {
        self.toast = None;
      }
    }
  }

  fn handle_connectivity(&mut self, online: bool) {
    if online == self.online {
      return;
    }
    self.online = online;

    if online {
      self.toast("Back online - refreshing");
      // Views below the top also went stale while disconnected
      for view in &mut self.view_stack {
        view.refresh();
      }
    } else {
      self.toast("Connection lost - showing cached data");
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Command => self.handle_command_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // An active text overlay owns the keyboard
    let wants_input = self
      .view_stack
      .last()
      .is_some_and(|view| view.wants_text_input());
    if wants_input {
      self.dispatch_to_view(key);
      return;
    }

    match key.code {
      KeyCode::Char(':') => {
        self.mode = Mode::Command;
        self.command_input.clear();
      }
      _ => self.dispatch_to_view(key),
    }
  }

  fn handle_command_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        // Navigate autocomplete suggestions
        let suggestions = self.autocomplete_suggestions();
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        // Navigate autocomplete suggestions backwards
        let suggestions = self.autocomplete_suggestions();
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0; // Reset selection on input change
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0; // Reset selection on input change
      }
      _ => {}
    }
  }

  fn dispatch_to_view(&mut self, key: KeyEvent) {
    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply_action(action);
  }

  fn apply_action(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn execute_command(&mut self) {
    let input = std::mem::take(&mut self.command_input);
    let (head, args) = match input.split_once(' ') {
      Some((head, args)) => (head.trim(), args.trim()),
      None => (input.trim(), ""),
    };

    // Resolve the command - either the selected suggestion or the literal input
    let suggestions = commands::get_suggestions(head);
    let cmd = if !suggestions.is_empty() && self.selected_suggestion < suggestions.len() {
      suggestions[self.selected_suggestion].name.to_string()
    } else {
      head.to_lowercase()
    };

    match cmd.as_str() {
      "home" => self.reset_root(Box::new(HomeView::new(self.service.clone()))),
      "articles" => self.reset_root(Box::new(ArticleListView::new(self.service.clone()))),
      "courses" => self.reset_root(Box::new(CourseListView::new(self.service.clone()))),
      "open" => {
        if args.is_empty() {
          self.toast("Usage: :open <slug>");
        } else {
          let view = ArticleDetailView::by_slug(self.service.clone(), args.to_string());
          self.view_stack.push(Box::new(view));
        }
      }
      "subscribe" => {
        if args.contains('@') {
          let service = self.service.clone();
          let email = args.to_string();
          self
            .subscribe_call
            .start(async move { service.subscribe(&email).await });
          self.toast("Subscribing...");
        } else {
          self.toast("Usage: :subscribe <email>");
        }
      }
      "refresh" => {
        if let Some(view) = self.view_stack.last_mut() {
          view.refresh();
        }
      }
      "quit" => {
        self.should_quit = true;
      }
      _ => {
        // Unknown command
      }
    }
  }

  fn toast(&mut self, text: impl Into<String>) {
    self.toast = Some((text.into(), Instant::now()));
  }

  fn reset_root(&mut self, view: Box<dyn View>) {
    self.view_stack.clear();
    self.view_stack.push(view);
  }

  // Accessors for UI rendering
  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn command_input(&self) -> &str {
    &self.command_input
  }

  pub fn breadcrumb(&self) -> String {
    self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect::<Vec<_>>()
      .join(" > ")
  }

  pub fn autocomplete_suggestions(&self) -> Vec<&'static Command> {
    let head = self.command_input.split_whitespace().next().unwrap_or("");
    commands::get_suggestions(head)
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }

  pub fn online(&self) -> bool {
    self.online
  }

  pub fn toast_text(&self) -> Option<&str> {
    self.toast.as_ref().map(|(text, _)| text.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{EntryManager, Fetcher, MemoryStore};
  use crate::content::service::testing::ScriptedRemote;
  use crate::content::ContentSlots;

  fn fixture() -> App {
    let store = Arc::new(MemoryStore::new());
    let entries = EntryManager::new(store, "test".to_string());
    let oracle = Arc::new(ConnectivityOracle::new(true));
    let fetcher = Fetcher::new(entries, oracle.handle());
    let remote = Arc::new(ScriptedRemote::new());
    let service = ContentService::new(remote, fetcher, ContentSlots::default());
    App::new(service, oracle)
  }

  #[tokio::test]
  async fn test_quit_command() {
    let mut app = fixture();
    app.command_input = "quit".to_string();
    app.execute_command();
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_open_requires_slug() {
    let mut app = fixture();
    app.command_input = "open".to_string();
    app.execute_command();
    assert_eq!(app.view_stack.len(), 1);
    assert!(app.toast_text().is_some());
  }

  #[tokio::test]
  async fn test_open_pushes_detail_view() {
    let mut app = fixture();
    app.command_input = "open reseau-local-guide".to_string();
    app.execute_command();
    assert_eq!(app.view_stack.len(), 2);
  }

  #[tokio::test]
  async fn test_subscribe_validates_email() {
    let mut app = fixture();
    app.command_input = "subscribe not-an-email".to_string();
    app.execute_command();
    assert!(!app.subscribe_call.is_running());

    app.command_input = "subscribe reader@example.com".to_string();
    app.execute_command();
    assert!(app.subscribe_call.is_running());
  }

  #[tokio::test]
  async fn test_pop_on_root_quits() {
    let mut app = fixture();
    app.apply_action(ViewAction::Pop);
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_command_with_args_resolves_head() {
    let mut app = fixture();
    app.command_input = "sub reader@example.com".to_string();
    app.execute_command();
    assert!(app.subscribe_call.is_running());
  }
}
