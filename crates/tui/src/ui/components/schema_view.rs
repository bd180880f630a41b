//! Read-only view of the selected actor's input schema.

use actorbench_engine::{SchemaRow, schema_rows};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::{Component, throbber};
use crate::app::{App, Effect, Pane};
use crate::ui::theme::{Theme, helpers as th};

#[derive(Debug, Default)]
pub struct SchemaViewComponent;

/// Word-wraps `text` to `width` columns with every line indented.
pub(crate) fn wrapped_lines(text: &str, width: u16, indent: &str, style: Style) -> Vec<Line<'static>> {
    let options = textwrap::Options::new(usize::from(width.max(1)))
        .initial_indent(indent)
        .subsequent_indent(indent);
    textwrap::wrap(text, options)
        .into_iter()
        .map(|line| Line::from(Span::styled(line.into_owned(), style)))
        .collect()
}

fn row_lines(row: &SchemaRow, width: u16, theme: &dyn Theme) -> Vec<Line<'static>> {
    let indent = "  ".repeat(row.depth);
    let detail_indent = format!("{indent}  ");
    let mut lines = Vec::new();

    if row.is_array_item {
        lines.push(Line::from(Span::styled(format!("{indent}Array items:"), theme.text_muted_style())));
    }

    let mut header = vec![
        Span::raw(indent.clone()),
        Span::styled(row.name.clone(), theme.accent_emphasis_style()),
    ];
    if row.required {
        header.push(Span::styled(" required", th::badge_style(theme)));
    }
    header.push(Span::styled(format!("  {}", row.kind_label), theme.syntax_type_style()));
    lines.push(Line::from(header));

    if let Some(default) = &row.default_json {
        lines.extend(wrapped_lines(
            &format!("default: {default}"),
            width,
            &detail_indent,
            theme.text_muted_style(),
        ));
    }
    if let Some(description) = &row.description {
        lines.extend(wrapped_lines(description, width, &detail_indent, theme.text_secondary_style()));
    }
    if !row.choices.is_empty() {
        lines.extend(wrapped_lines(
            &format!("Options: {}", row.choices.join(", ")),
            width,
            &detail_indent,
            theme.text_muted_style(),
        ));
    }
    lines
}

/// Everything the pane shows for the current selection, wrapped to `width`.
pub(crate) fn schema_lines(app: &App, width: u16) -> Vec<Line<'static>> {
    let theme = &*app.theme;
    let Some(actor) = app.session.selected_actor() else {
        return vec![Line::from(Span::styled(
            "Select an actor to view its input schema",
            theme.text_muted_style(),
        ))];
    };

    let mut lines = vec![Line::from(Span::styled(
        actor.display_name().to_string(),
        theme.accent_emphasis_style().add_modifier(Modifier::UNDERLINED),
    ))];
    lines.extend(wrapped_lines(actor.description_or_placeholder(), width, "", theme.text_secondary_style()));
    lines.push(Line::default());

    if app.schema_pane.loading {
        lines.push(Line::from(vec![
            Span::styled(throbber(app.throbber_idx), theme.status_info()),
            Span::styled(" Loading schema...", theme.text_secondary_style()),
        ]));
        return lines;
    }

    match app.session.schema().filter(|schema| schema.has_properties()) {
        None => {
            lines.push(Line::from(Span::styled(
                "No input schema available",
                theme.text_secondary_style().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                "This actor doesn't require any input parameters",
                theme.text_muted_style(),
            )));
        }
        Some(schema) => {
            lines.push(Line::from(Span::styled(
                schema.title.clone(),
                theme.text_primary_style().add_modifier(Modifier::BOLD),
            )));
            for row in schema_rows(schema) {
                lines.extend(row_lines(&row, width, theme));
            }
        }
    }
    lines
}

impl Component for SchemaViewComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        let scroll = &mut app.schema_pane.scroll;
        match key.code {
            KeyCode::Up => scroll.scroll_lines(-1),
            KeyCode::Down => scroll.scroll_lines(1),
            KeyCode::PageUp => scroll.scroll_pages(-1),
            KeyCode::PageDown => scroll.scroll_pages(1),
            KeyCode::Home => scroll.reset(),
            _ => {}
        }
        Vec::new()
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'static>> {
        th::build_hint_spans(&*app.theme, &[("↑/↓", " Scroll  "), ("PgUp/PgDn", " Page  ")])
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let focused = app.focus == Pane::Schema;
        let block = th::block(&*app.theme, Some(" Input Schema "), focused);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        let lines = schema_lines(app, inner.width);
        app.schema_pane.scroll.update(lines.len(), inner.height);
        let paragraph = Paragraph::new(lines).scroll((app.schema_pane.scroll.offset(), 0));
        frame.render_widget(paragraph, inner);
    }
}
