use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, comment entry) and
/// return actions for the App to execute. This creates a clean
/// delegation chain: App → View → Components
///
/// Views that load data asynchronously own `Query<T>` or `Call<T>`
/// values and poll them in `tick()`.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to allow views to poll async queries
  fn tick(&mut self) {}

  /// Reconcile this view's data with the backend. Called on the
  /// `:refresh` command and whenever connectivity returns.
  fn refresh(&mut self) {}

  /// True while the view is capturing free text (search, comment
  /// entry), so global shortcuts stay out of the way.
  fn wants_text_input(&self) -> bool {
    false
  }
}
