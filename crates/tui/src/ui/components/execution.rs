//! Execution pane: the generated input form, the execute action and the
//! result of the latest run.

use actorbench_engine::{ControlKind, PollEnd};
use actorbench_types::{ContainerKind, ExecutionResult, RunStatus};
use actorbench_util::format_timestamp;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::common::json_syntax::highlight_json_value;
use super::common::{EditOutcome, FieldEditor};
use super::schema_view::wrapped_lines;
use super::{Component, throbber};
use crate::app::{App, Effect, Pane};
use crate::ui::theme::{Theme, helpers as th};

const FIELD_INDENT: &str = "    ";

#[derive(Debug, Default)]
pub struct ExecutionComponent;

/// Rendered form plus the rows occupied by the focused field.
struct FormLines {
    lines: Vec<Line<'static>>,
    focused_rows: (usize, usize),
    /// Row and column of the text cursor, when the focused field has one.
    cursor: Option<(usize, u16)>,
}

fn editor_lines(editor: &FieldEditor, focused: bool, width: u16, theme: &dyn Theme) -> (Vec<Line<'static>>, Option<(usize, u16)>) {
    let field = editor.field();
    let mut lines = Vec::new();
    let marker = if focused { "› " } else { "  " };
    let mut label = vec![
        Span::styled(marker, theme.accent_primary_style()),
        Span::styled(field.label.clone(), theme.text_primary_style().add_modifier(Modifier::BOLD)),
    ];
    if field.required {
        label.push(Span::styled(" *", th::badge_style(theme)));
    }
    label.push(Span::styled(format!("  {}", field.name), theme.text_muted_style()));
    lines.push(Line::from(label));

    let value_style = th::input_style(theme, !editor.is_rejected(), focused);
    let mut cursor = None;
    match &field.control {
        ControlKind::Choice { .. } => {
            let arrows = if focused { theme.accent_primary_style() } else { theme.text_muted_style() };
            lines.push(Line::from(vec![
                Span::styled(format!("{FIELD_INDENT}◀ "), arrows),
                Span::styled(editor.choice_label(), value_style),
                Span::styled(" ▶", arrows),
            ]));
        }
        ControlKind::Toggle => {
            let mark = if editor.is_checked() { "[x]" } else { "[ ]" };
            lines.push(Line::from(Span::styled(format!("{FIELD_INDENT}{mark}"), value_style)));
        }
        ControlKind::Numeric { .. } | ControlKind::JsonEditor { .. } | ControlKind::Text { .. } => {
            let draft = editor.draft();
            if draft.input().is_empty() {
                for placeholder in field.placeholder.lines() {
                    lines.push(Line::from(Span::styled(
                        format!("{FIELD_INDENT}{placeholder}"),
                        theme.text_muted_style().add_modifier(Modifier::ITALIC),
                    )));
                }
                if field.placeholder.is_empty() {
                    lines.push(Line::from(Span::raw(FIELD_INDENT)));
                }
                if focused {
                    cursor = Some((1, FIELD_INDENT.len() as u16));
                }
            } else {
                for text in draft.input().split('\n') {
                    lines.push(Line::from(Span::styled(format!("{FIELD_INDENT}{text}"), value_style)));
                }
                if focused {
                    cursor = Some((1 + draft.cursor_line(), FIELD_INDENT.len() as u16 + draft.cursor_column()));
                }
            }
            if editor.is_rejected() {
                let message = match field.control {
                    ControlKind::JsonEditor {
                        container: ContainerKind::Array,
                    } => "Expected a JSON array; the last valid value is kept",
                    ControlKind::JsonEditor { .. } => "Expected a JSON object; the last valid value is kept",
                    _ => "Not a valid number; the last valid value is kept",
                };
                lines.push(Line::from(Span::styled(format!("{FIELD_INDENT}{message}"), theme.status_error())));
            }
        }
    }

    if let Some(description) = &field.description {
        lines.extend(wrapped_lines(description, width, FIELD_INDENT, theme.text_muted_style()));
    }
    lines.push(Line::default());
    (lines, cursor)
}

fn form_lines(app: &App, width: u16) -> FormLines {
    let theme = &*app.theme;
    let execution = &app.execution;
    let mut lines = Vec::new();
    let mut focused_rows = (0, 0);
    let mut cursor = None;

    if execution.editors.is_empty() {
        lines.push(Line::from(Span::styled(
            "No input parameters; the run uses the default payload.",
            theme.text_muted_style(),
        )));
        return FormLines {
            lines,
            focused_rows,
            cursor,
        };
    }

    lines.push(Line::from(Span::styled("Input Parameters", theme.text_secondary_style().add_modifier(Modifier::BOLD))));
    for (index, editor) in execution.editors.iter().enumerate() {
        let focused = index == execution.focused;
        let start = lines.len();
        let (editor_lines, editor_cursor) = editor_lines(editor, focused && app.focus == Pane::Form, width, theme);
        lines.extend(editor_lines);
        if focused {
            focused_rows = (start, lines.len());
            cursor = editor_cursor.map(|(row, column)| (start + row, column));
        }
    }
    FormLines {
        lines,
        focused_rows,
        cursor,
    }
}

fn status_icon(status: &RunStatus, throbber_idx: usize, theme: &dyn Theme) -> Span<'static> {
    match status {
        RunStatus::Succeeded => Span::styled("✓", theme.status_success()),
        RunStatus::Failed | RunStatus::TimedOut | RunStatus::Aborted => Span::styled("✗", theme.status_error()),
        RunStatus::Ready | RunStatus::Running => Span::styled(throbber(throbber_idx), theme.status_info()),
        _ => Span::styled("●", theme.status_warning()),
    }
}

fn ended_note(ended: &PollEnd) -> Option<String> {
    match ended {
        PollEnd::Terminal => None,
        PollEnd::Cancelled => Some("Stopped following the run; showing the last known state.".to_string()),
        PollEnd::PollFailed(error) => Some(format!("Status check failed ({error}); showing the last known state.")),
        PollEnd::BudgetExhausted => {
            Some("Stopped waiting after the configured limit; showing the last known state.".to_string())
        }
    }
}

fn result_lines(result: &ExecutionResult, ended: Option<&PollEnd>, app: &App, width: u16) -> Vec<Line<'static>> {
    let theme = &*app.theme;
    let label = |text: &'static str| Span::styled(text, theme.text_secondary_style());
    let value = |text: String| Span::styled(text, theme.text_primary_style().add_modifier(Modifier::BOLD));

    let mut lines = vec![
        Line::from(Span::styled("Execution Result", theme.text_secondary_style().add_modifier(Modifier::BOLD))),
        Line::from(vec![
            status_icon(&result.status, app.throbber_idx, theme),
            Span::raw(" "),
            value(result.status.to_string()),
            Span::styled(format!("  run {}", result.id), theme.text_muted_style()),
        ]),
    ];
    if let Some(note) = ended.and_then(ended_note) {
        lines.extend(wrapped_lines(&note, width, "", theme.status_warning()));
    }
    if let Some(started_at) = result.started_at.as_ref() {
        lines.push(Line::from(vec![label("Started: "), value(format_timestamp(started_at))]));
    }
    lines.push(Line::from(vec![label("Duration: "), value(result.stats.duration_label())]));
    lines.push(Line::from(vec![label("Compute Units: "), value(result.stats.compute_units.to_string())]));
    lines.push(Line::from(vec![
        label("Memory (Max): "),
        value(format!("{} MB", result.stats.peak_memory_mib())),
    ]));
    lines.push(Line::from(vec![
        label("CPU (Avg): "),
        value(format!("{:.1}%", result.stats.cpu_avg_percent())),
    ]));

    if let Some(output) = &result.output {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Output", theme.text_secondary_style().add_modifier(Modifier::BOLD))));
        lines.extend(highlight_json_value(output, theme));
    }
    if let Some(error) = &result.error {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Error Details", theme.status_error().add_modifier(Modifier::BOLD))));
        lines.extend(wrapped_lines(error, width, "", theme.status_error()));
    }
    lines
}

/// Lines for the area below the execute button.
fn outcome_lines(app: &App, width: u16) -> Vec<Line<'static>> {
    let theme = &*app.theme;
    let execution = &app.execution;
    if let Some(message) = &execution.error {
        let mut lines = vec![Line::from(Span::styled(
            "Execution Failed",
            theme.status_error().add_modifier(Modifier::BOLD),
        ))];
        lines.extend(wrapped_lines(message, width, "", theme.status_error()));
        return lines;
    }
    match &execution.result {
        Some(result) => result_lines(result, execution.ended.as_ref(), app, width),
        None if execution.running => vec![Line::from(vec![
            Span::styled(throbber(app.throbber_idx), theme.status_info()),
            Span::styled(" Submitting run...", theme.text_secondary_style()),
        ])],
        None => Vec::new(),
    }
}

impl ExecutionComponent {
    fn apply_edit(app: &mut App, key: KeyEvent) -> bool {
        let execution = &mut app.execution;
        let Some(editor) = execution.editors.get_mut(execution.focused) else {
            return false;
        };
        match editor.handle_key(key) {
            EditOutcome::Ignored => false,
            EditOutcome::Handled => true,
            EditOutcome::Changed(coercion) => {
                let name = editor.field().name.clone();
                execution.form.apply(&name, coercion);
                true
            }
        }
    }
}

impl Component for ExecutionComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        if app.session.selected_actor().is_none() {
            return Vec::new();
        }
        if key.code == KeyCode::Char('e') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Effect::Execute];
        }
        let stepping = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Up if !stepping => {
                app.execution.focus_previous();
                return Vec::new();
            }
            KeyCode::Down if !stepping => {
                app.execution.focus_next();
                return Vec::new();
            }
            KeyCode::PageUp => {
                app.execution.result_scroll.scroll_pages(-1);
                return Vec::new();
            }
            KeyCode::PageDown => {
                app.execution.result_scroll.scroll_pages(1);
                return Vec::new();
            }
            _ => {}
        }
        if app.execution.on_execute_button() {
            if key.code == KeyCode::Enter {
                return vec![Effect::Execute];
            }
            return Vec::new();
        }
        if !Self::apply_edit(app, key) && key.code == KeyCode::Enter {
            app.execution.focus_next();
        }
        Vec::new()
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'static>> {
        let mut hints = vec![("↑/↓", " Field  "), ("Ctrl+E", " Execute  "), ("PgUp/PgDn", " Scroll result  ")];
        if app
            .execution
            .editors
            .get(app.execution.focused)
            .is_some_and(|editor| editor.field().control.step().is_some())
        {
            hints.push(("Ctrl+↑/↓", " Step  "));
        }
        if app.execution.running {
            hints.push(("Esc", " Stop polling  "));
        }
        th::build_hint_spans(&*app.theme, &hints)
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let focused = app.focus == Pane::Form;
        let block = th::block(&*app.theme, Some(" Execute Actor "), focused);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        if app.session.selected_actor().is_none() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "Select an actor to configure and run it",
                    app.theme.text_muted_style(),
                )),
                inner,
            );
            return;
        }

        let has_outcome = app.execution.running || app.execution.result.is_some() || app.execution.error.is_some();
        let [form_area, button_area, outcome_area] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(1),
            if has_outcome { Constraint::Percentage(50) } else { Constraint::Length(0) },
        ])
        .areas(inner);

        let form = form_lines(app, form_area.width);
        let scroll = &mut app.execution.form_scroll;
        scroll.update(form.lines.len(), form_area.height);
        scroll.ensure_visible(form.focused_rows.0, form.focused_rows.1);
        scroll.update(form.lines.len(), form_area.height);
        let offset = scroll.offset();
        frame.render_widget(Paragraph::new(form.lines).scroll((offset, 0)), form_area);

        if focused
            && !app.execution.on_execute_button()
            && let Some((row, column)) = form.cursor
            && let Some(visible_row) = row.checked_sub(usize::from(offset))
            && visible_row < usize::from(form_area.height)
        {
            let x = form_area.x.saturating_add(column).min(form_area.right().saturating_sub(1));
            frame.set_cursor_position(Position::new(x, form_area.y + visible_row as u16));
        }

        let theme = &*app.theme;
        let running = app.execution.running;
        let button_label = if running {
            format!(" {} Executing Actor... ", throbber(app.throbber_idx))
        } else {
            " ▶ Execute Actor ".to_string()
        };
        let mut button_style = th::button_primary_style(theme, !running);
        if focused && app.execution.on_execute_button() {
            button_style = button_style.add_modifier(Modifier::UNDERLINED);
        }
        let mut button = vec![Span::styled(button_label, button_style)];
        if running {
            button.push(Span::styled("  Esc to stop polling", theme.text_muted_style()));
        }
        frame.render_widget(Paragraph::new(Line::from(button)), button_area);

        if has_outcome {
            let lines = outcome_lines(app, outcome_area.width);
            let scroll = &mut app.execution.result_scroll;
            scroll.update(lines.len(), outcome_area.height);
            frame.render_widget(
                Paragraph::new(lines).style(Style::default()).scroll((scroll.offset(), 0)),
                outcome_area,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{actor, authenticated_app, buffer_contains, render_to_buffer, snapshot};
    use actorbench_engine::search_scraper_schema;
    use actorbench_types::RunStats;
    use serde_json::json;

    fn app_with_form() -> App {
        let mut app = authenticated_app(vec![actor("a1")]);
        app.session.begin_selection(actor("a1")).expect("selection");
        app.session.apply_schema("a1", Some(search_scraper_schema()));
        app.execution.reset(app.session.schema());
        app.focus = Pane::Form;
        app
    }

    fn render(app: &mut App) -> ratatui::buffer::Buffer {
        render_to_buffer(90, 40, |frame| {
            let area = frame.area();
            ExecutionComponent.render(frame, area, app)
        })
    }

    fn press(app: &mut App, code: KeyCode) -> Vec<Effect> {
        ExecutionComponent.handle_key_events(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn form_shows_fields_with_placeholders() {
        let mut app = app_with_form();
        let buffer = render(&mut app);

        assert!(buffer_contains(&buffer, "Input Parameters"));
        assert!(buffer_contains(&buffer, "› Start URLs *  startUrls"));
        assert!(buffer_contains(&buffer, "Max Concurrency  maxConcurrency"));
        assert!(buffer_contains(&buffer, "    []"));
        assert!(buffer_contains(&buffer, "    en"));
        assert!(buffer_contains(&buffer, "Execute Actor"));
    }

    #[test]
    fn typing_commits_coerced_values() {
        let mut app = app_with_form();
        press(&mut app, KeyCode::Down);
        for c in "25".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(app.execution.form.get("maxRequestRetries"), Some(&json!(25)));

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.execution.form.get("maxRequestRetries"), Some(&json!(25)));
        assert!(buffer_contains(&render(&mut app), "Not a valid number"));
    }

    #[test]
    fn ctrl_arrows_step_the_focused_integer() {
        let mut app = app_with_form();
        press(&mut app, KeyCode::Down);
        let up = KeyEvent::new(KeyCode::Up, KeyModifiers::CONTROL);

        ExecutionComponent.handle_key_events(&mut app, up);
        ExecutionComponent.handle_key_events(&mut app, up);

        assert_eq!(app.execution.focused, 1);
        assert_eq!(app.execution.form.get("maxRequestRetries"), Some(&json!(2)));
    }

    #[test]
    fn execute_button_and_shortcut_request_a_run() {
        let mut app = app_with_form();
        for _ in 0..10 {
            press(&mut app, KeyCode::Down);
        }
        assert!(app.execution.on_execute_button());
        assert_eq!(press(&mut app, KeyCode::Enter), vec![Effect::Execute]);

        let shortcut = KeyEvent::new(KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert_eq!(ExecutionComponent.handle_key_events(&mut app, shortcut), vec![Effect::Execute]);
    }

    #[test]
    fn result_panel_shows_stats_output_and_errors() {
        let mut app = app_with_form();
        let mut result = snapshot(RunStatus::Succeeded);
        result.stats = RunStats {
            duration_millis: 125_000,
            compute_units: 0.25,
            mem_max_bytes: 256.0 * 1024.0 * 1024.0,
            cpu_avg_usage: 12.34,
            ..RunStats::default()
        };
        result.output = Some(json!({"items": 3}));
        result.started_at = Some("2024-05-01T08:00:00Z".parse().expect("timestamp"));
        app.execution.result = Some(result);
        app.execution.ended = Some(PollEnd::Terminal);

        let buffer = render(&mut app);
        assert!(buffer_contains(&buffer, "✓ SUCCEEDED"));
        assert!(buffer_contains(&buffer, "Started: 2024-05-01 08:00:00 UTC"));
        assert!(buffer_contains(&buffer, "Duration: 2m 5s"));
        assert!(buffer_contains(&buffer, "Compute Units: 0.25"));
        assert!(buffer_contains(&buffer, "Memory (Max): 256 MB"));
        assert!(buffer_contains(&buffer, "CPU (Avg): 12.3%"));
        assert!(buffer_contains(&buffer, "\"items\": 3"));
    }

    #[test]
    fn submission_failure_is_shown() {
        let mut app = app_with_form();
        app.execution.error = Some("bad input".to_string());

        let buffer = render(&mut app);
        assert!(buffer_contains(&buffer, "Execution Failed"));
        assert!(buffer_contains(&buffer, "bad input"));
    }

    #[test]
    fn cancelled_poll_is_explained() {
        let mut app = app_with_form();
        app.execution.result = Some(snapshot(RunStatus::Running));
        app.execution.ended = Some(PollEnd::Cancelled);

        assert!(buffer_contains(&render(&mut app), "Stopped following the run"));
    }
}
