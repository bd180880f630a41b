//! Component system for the Actorbench TUI.
//!
//! Components are stateless views over [`App`]: they turn key events into
//! state changes and [`Effect`]s, and render a region of the frame.

use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect, text::Span};

use crate::app::{App, Effect};

pub(crate) trait Component {
    /// Handles a key while this component has focus. Effects are executed by
    /// the runtime after the call returns.
    fn handle_key_events(&mut self, _app: &mut App, _key: KeyEvent) -> Vec<Effect> {
        Vec::new()
    }

    /// Contextual key hints shown in the bottom strip while focused.
    fn get_hint_spans(&self, _app: &App) -> Vec<Span<'static>> {
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App);
}
