//! API key entry screen.

use actorbench_util::mask_secret;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
};

use super::{Component, throbber};
use crate::app::{App, Effect};
use crate::ui::theme::helpers as th;

const CONSOLE_URL: &str = "https://console.apify.com/account/integrations";

#[derive(Debug, Default)]
pub struct AuthComponent;

impl AuthComponent {
    fn dialog_area(area: Rect) -> Rect {
        let width = area.width.min(72);
        let height = area.height.min(14);
        Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        }
    }
}

impl Component for AuthComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        if app.auth.loading {
            return Vec::new();
        }
        match key.code {
            KeyCode::Enter => {
                if app.auth.key.is_blank() {
                    return Vec::new();
                }
                vec![Effect::Authenticate(app.auth.key.input().to_string())]
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.auth.show_key = !app.auth.show_key;
                Vec::new()
            }
            _ => {
                app.auth.key.handle_key(key, false);
                Vec::new()
            }
        }
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'static>> {
        let toggle = if app.auth.show_key { " Hide key  " } else { " Show key  " };
        th::build_hint_spans(&*app.theme, &[("Enter", " Connect  "), ("Ctrl+S", toggle)])
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let theme = &*app.theme;
        let area = Self::dialog_area(rect);
        frame.render_widget(Clear, area);
        let block = th::block(theme, Some(" Connect to Apify "), true);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [intro, label, input, help, _, button, error] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .areas(inner);

        frame.render_widget(
            Paragraph::new("Use your Apify API key to access your actors and execute them.")
                .style(theme.text_secondary_style())
                .wrap(Wrap { trim: true }),
            intro,
        );

        let toggle = if app.auth.show_key { "[Hide]" } else { "[Show]" };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("API Key ", theme.text_secondary_style().add_modifier(Modifier::BOLD)),
                Span::styled(toggle, theme.accent_primary_style()),
            ])),
            label,
        );

        let key = &app.auth.key;
        let input_line = if key.input().is_empty() {
            Line::from(Span::styled("Enter your Apify API key", theme.text_muted_style()))
        } else if app.auth.show_key {
            Line::from(Span::styled(key.input().to_string(), th::input_style(theme, true, true)))
        } else {
            Line::from(Span::styled(mask_secret(key.input()), th::input_style(theme, true, true)))
        };
        frame.render_widget(Paragraph::new(input_line), input);
        if !app.auth.loading {
            let x = input.x.saturating_add(key.cursor_column()).min(input.right().saturating_sub(1));
            frame.set_cursor_position(Position::new(x, input.y));
        }

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("You can find your API key in your Apify Console ", theme.text_muted_style()),
                Span::styled(format!("({CONSOLE_URL})"), theme.status_info()),
            ]))
            .wrap(Wrap { trim: true }),
            help,
        );

        let enabled = !key.is_blank() && !app.auth.loading;
        let label = if app.auth.loading {
            format!(" {} Connecting to Apify... ", throbber(app.throbber_idx))
        } else {
            " Connect & Explore ".to_string()
        };
        frame.render_widget(
            Paragraph::new(Span::styled(label, th::button_primary_style(theme, enabled))),
            button,
        );

        if let Some(message) = app.auth.error.as_deref() {
            frame.render_widget(
                Paragraph::new(Span::styled(message.to_string(), theme.status_error())).wrap(Wrap { trim: true }),
                error,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StaticPlatform, buffer_contains, render_to_buffer, session_with};

    fn type_key(component: &mut AuthComponent, app: &mut App, text: &str) {
        for c in text.chars() {
            component.handle_key_events(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    #[test]
    fn key_is_masked_until_revealed() {
        let mut app = App::new(session_with(StaticPlatform::default()));
        let mut component = AuthComponent;
        type_key(&mut component, &mut app, "secret");

        let buffer = render_to_buffer(80, 20, |frame| {
            let area = frame.area();
            component.render(frame, area, &mut app)
        });
        assert!(buffer_contains(&buffer, "••••••"));
        assert!(!buffer_contains(&buffer, "secret"));
        assert!(buffer_contains(&buffer, "Connect to Apify"));

        component.handle_key_events(&mut app, KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        let buffer = render_to_buffer(80, 20, |frame| {
            let area = frame.area();
            component.render(frame, area, &mut app)
        });
        assert!(buffer_contains(&buffer, "secret"));
        assert!(buffer_contains(&buffer, "[Hide]"));
    }

    #[test]
    fn enter_submits_only_a_non_blank_key() {
        let mut app = App::new(session_with(StaticPlatform::default()));
        let mut component = AuthComponent;
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);

        type_key(&mut component, &mut app, "  ");
        assert!(component.handle_key_events(&mut app, enter).is_empty());

        type_key(&mut component, &mut app, "key");
        assert_eq!(
            component.handle_key_events(&mut app, enter),
            vec![Effect::Authenticate("  key".to_string())]
        );
    }

    #[test]
    fn error_and_placeholder_are_rendered() {
        let mut app = App::new(session_with(StaticPlatform::default()));
        app.auth.error = Some("User was not found".to_string());
        let mut component = AuthComponent;

        let buffer = render_to_buffer(80, 20, |frame| {
            let area = frame.area();
            component.render(frame, area, &mut app)
        });
        assert!(buffer_contains(&buffer, "Enter your Apify API key"));
        assert!(buffer_contains(&buffer, "User was not found"));
    }
}
