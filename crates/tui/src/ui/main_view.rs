//! Top-level view: routes keys to the focused pane and draws the screen.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use super::components::{ActorsComponent, AuthComponent, Component, ExecutionComponent, SchemaViewComponent};
use super::layout::MainLayout;
use super::theme::helpers as th;
use crate::app::{App, Effect, Pane};

#[derive(Debug, Default)]
pub struct MainView {
    auth: AuthComponent,
    actors: ActorsComponent,
    schema: SchemaViewComponent,
    execution: ExecutionComponent,
}

impl MainView {
    fn focused_component(&mut self, app: &App) -> &mut dyn Component {
        if !app.session.is_authenticated() {
            return &mut self.auth;
        }
        match app.focus {
            Pane::Actors => &mut self.actors,
            Pane::Schema => &mut self.schema,
            Pane::Form => &mut self.execution,
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, app: &App) {
        let theme = &*app.theme;
        let mut spans = vec![
            Span::styled(" Apify Integration ", theme.accent_emphasis_style().add_modifier(Modifier::BOLD)),
            Span::styled("Modern Actor Execution Platform", theme.text_muted_style()),
        ];
        if app.session.is_authenticated() {
            spans.push(Span::styled("   ● Connected to Apify", theme.status_success()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_hints(&mut self, frame: &mut Frame, area: Rect, app: &App) {
        let theme = &*app.theme;
        let mut spans = vec![Span::styled("Hints: ", theme.text_muted_style())];
        spans.extend(self.focused_component(app).get_hint_spans(app));
        if app.session.is_authenticated() {
            spans.extend(th::build_hint_spans(theme, &[("Tab", " Next pane  "), ("Ctrl+L", " Logout  ")]));
        }
        spans.extend(th::build_hint_spans(theme, &[("Ctrl+C", " Quit ")]));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

impl Component for MainView {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        if app.session.is_authenticated() {
            match key.code {
                KeyCode::Char('l') if control => return vec![Effect::Logout],
                KeyCode::Tab => {
                    app.focus = app.focus.next();
                    return Vec::new();
                }
                KeyCode::BackTab => {
                    app.focus = app.focus.previous();
                    return Vec::new();
                }
                KeyCode::Esc if app.execution.running => return vec![Effect::CancelRun],
                _ => {}
            }
        }
        let component = self.focused_component(app);
        component.handle_key_events(app, key)
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        frame.render_widget(Block::default().style(th::panel_style(&*app.theme)), rect);

        if !app.session.is_authenticated() {
            let (header, body, hints) = MainLayout::login(rect);
            self.render_header(frame, header, app);
            self.auth.render(frame, body, app);
            self.render_hints(frame, hints, app);
            return;
        }

        let layout = MainLayout::responsive(rect);
        self.render_header(frame, layout.header, app);
        self.actors.render(frame, layout.actors, app);
        self.schema.render(frame, layout.schema, app);
        self.execution.render(frame, layout.execution, app);
        self.render_hints(frame, layout.hints, app);
    }
}
