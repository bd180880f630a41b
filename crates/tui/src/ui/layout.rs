//! Screen layout for the Actorbench TUI.
use ratatui::prelude::*;

/// Areas of the authenticated screen.
pub(super) struct MainLayout {
    pub header: Rect,
    pub actors: Rect,
    pub schema: Rect,
    pub execution: Rect,
    pub hints: Rect,
}

impl MainLayout {
    /// Splits the screen into header, panes and a one-line hints bar.
    ///
    /// Wide terminals show the actor list beside the schema and form columns;
    /// narrow ones stack all three panes.
    pub fn responsive(size: Rect) -> Self {
        let [header, body, hints] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1)]).areas(size);

        if body.width >= 120 {
            let [actors, details] = Layout::horizontal([Constraint::Percentage(35), Constraint::Min(40)]).areas(body);
            let [schema, execution] =
                Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(details);
            return Self {
                header,
                actors,
                schema,
                execution,
                hints,
            };
        }

        let [actors, schema, execution] = Layout::vertical([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(40),
        ])
        .areas(body);
        Self {
            header,
            actors,
            schema,
            execution,
            hints,
        }
    }

    /// Header, body and hints rows of the key entry screen.
    pub fn login(size: Rect) -> (Rect, Rect, Rect) {
        let [header, body, hints] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1)]).areas(size);
        (header, body, hints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_screens_place_panes_side_by_side() {
        let layout = MainLayout::responsive(Rect::new(0, 0, 160, 40));
        assert_eq!(layout.actors.y, layout.schema.y);
        assert_eq!(layout.schema.y, layout.execution.y);
        assert!(layout.actors.x < layout.schema.x && layout.schema.x < layout.execution.x);
        assert_eq!(layout.hints.y, 39);
    }

    #[test]
    fn narrow_screens_stack_panes() {
        let layout = MainLayout::responsive(Rect::new(0, 0, 80, 40));
        assert_eq!(layout.actors.x, layout.execution.x);
        assert!(layout.actors.y < layout.schema.y && layout.schema.y < layout.execution.y);
    }
}
