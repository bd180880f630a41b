//! Actor directory list.

use actorbench_util::format_optional_date;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph, Wrap},
};

use super::Component;
use crate::app::{App, Effect, Pane};
use crate::ui::theme::helpers as th;

#[derive(Debug, Default)]
pub struct ActorsComponent;

impl Component for ActorsComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        let count = app.session.actors().len();
        if count == 0 {
            return Vec::new();
        }
        let current = app.actor_list.selected().unwrap_or(0);
        match key.code {
            KeyCode::Up => app.actor_list.select(Some(current.saturating_sub(1))),
            KeyCode::Down => app.actor_list.select(Some((current + 1).min(count - 1))),
            KeyCode::Home => app.actor_list.select(Some(0)),
            KeyCode::End => app.actor_list.select(Some(count - 1)),
            KeyCode::Enter => {
                if let Some(actor) = app.session.actors().get(current) {
                    return vec![Effect::SelectActor(actor.clone())];
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'static>> {
        th::build_hint_spans(&*app.theme, &[("↑/↓", " Move  "), ("Enter", " Select  ")])
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let theme = &*app.theme;
        let focused = app.focus == Pane::Actors;
        let block = th::block(theme, Some(" Select an Actor "), focused);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        let actors = app.session.actors();
        if actors.is_empty() {
            let [_, message] = Layout::vertical([Constraint::Percentage(40), Constraint::Min(2)]).areas(inner);
            let text = vec![
                Line::from(Span::styled(
                    "No actors found in your account",
                    theme.text_secondary_style().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "Create actors in your Apify Console to see them here",
                    theme.text_muted_style(),
                )),
            ];
            frame.render_widget(Paragraph::new(text).centered().wrap(Wrap { trim: true }), message);
            return;
        }

        let selected_id = app.session.selected_actor().map(|actor| actor.id.as_str());
        let items: Vec<ListItem> = actors
            .iter()
            .map(|actor| {
                let marker = if selected_id == Some(actor.id.as_str()) { "● " } else { "  " };
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(marker, theme.status_success()),
                        Span::styled(actor.display_name().to_string(), theme.accent_emphasis_style()),
                    ]),
                    Line::from(Span::styled(
                        format!("  {}", actor.description_or_placeholder()),
                        theme.text_secondary_style(),
                    )),
                    Line::from(Span::styled(
                        format!(
                            "  {} · {} runs",
                            format_optional_date(actor.modified_at.as_ref()),
                            actor.stats.total_runs
                        ),
                        theme.text_muted_style(),
                    )),
                ])
            })
            .collect();

        let list = List::new(items).highlight_style(th::list_selected_style(theme));
        frame.render_stateful_widget(list, inner, &mut app.actor_list);
    }
}
