//! Per-field editing state for the generated run form.
//!
//! The form's committed values live in [`FormState`](actorbench_engine::FormState);
//! a [`FieldEditor`] holds what the user is typing. The two differ whenever a
//! draft does not coerce, e.g. half-typed JSON, and the draft stays on screen
//! while the committed value is left alone.

use actorbench_engine::{Coercion, ControlKind, FormField, RawInput};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::TextInputState;

/// What a key did to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The key is not an editing key for this control.
    Ignored,
    /// Cursor or selection moved; nothing to commit.
    Handled,
    /// The input changed; commit this coercion.
    Changed(Coercion),
}

#[derive(Debug, Clone)]
pub struct FieldEditor {
    field: FormField,
    draft: TextInputState,
    choice_index: usize,
    checked: bool,
    rejected: bool,
}

impl FieldEditor {
    pub fn new(field: FormField) -> Self {
        Self {
            field,
            draft: TextInputState::new(),
            choice_index: 0,
            checked: false,
            rejected: false,
        }
    }

    pub fn field(&self) -> &FormField {
        &self.field
    }

    pub fn draft(&self) -> &TextInputState {
        &self.draft
    }

    /// True when the current draft did not coerce and the committed value
    /// was kept.
    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Label of the highlighted choice; the placeholder until one is picked.
    pub fn choice_label(&self) -> String {
        self.field.control.choice_labels().get(self.choice_index).cloned().unwrap_or_default()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditOutcome {
        match &self.field.control {
            ControlKind::Choice { .. } => {
                let count = self.field.control.choice_labels().len();
                let next = match key.code {
                    KeyCode::Left => self.choice_index.saturating_sub(1),
                    KeyCode::Right | KeyCode::Char(' ') => (self.choice_index + 1).min(count.saturating_sub(1)),
                    _ => return EditOutcome::Ignored,
                };
                if next == self.choice_index {
                    return EditOutcome::Handled;
                }
                self.choice_index = next;
                let label = self.choice_label();
                self.commit(RawInput::Text(&label))
            }
            ControlKind::Toggle => match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => {
                    self.checked = !self.checked;
                    self.commit(RawInput::Checked(self.checked))
                }
                _ => EditOutcome::Ignored,
            },
            ControlKind::Numeric { .. }
                if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Up | KeyCode::Down) =>
            {
                self.step_number(key.code == KeyCode::Up)
            }
            ControlKind::Numeric { .. } | ControlKind::JsonEditor { .. } | ControlKind::Text { .. } => {
                let multiline = self.field.control.is_multiline();
                if self.draft.handle_key(key, multiline) {
                    let text = self.draft.input().to_string();
                    return self.commit(RawInput::Text(&text));
                }
                match key.code {
                    KeyCode::Left | KeyCode::Right | KeyCode::Home | KeyCode::End => EditOutcome::Handled,
                    _ => EditOutcome::Ignored,
                }
            }
        }
    }

    /// Moves a numeric draft by the control's step. Blank drafts start at 0;
    /// drafts that are not whole numbers are left alone.
    fn step_number(&mut self, up: bool) -> EditOutcome {
        let Some(step) = self.field.control.step() else {
            return EditOutcome::Ignored;
        };
        let current = match self.draft.input().trim() {
            "" => 0,
            text => match text.parse::<i64>() {
                Ok(value) => value,
                Err(_) => return EditOutcome::Handled,
            },
        };
        let next = if up { current.saturating_add(step) } else { current.saturating_sub(step) };
        self.draft.set_input(next.to_string());
        let text = self.draft.input().to_string();
        self.commit(RawInput::Text(&text))
    }

    fn commit(&mut self, raw: RawInput<'_>) -> EditOutcome {
        let coercion = self.field.control.coerce(raw);
        self.rejected = coercion == Coercion::Keep;
        EditOutcome::Changed(coercion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actorbench_engine::{FormState, form_fields};
    use actorbench_types::{ActorSchema, PropertyKind, ScalarKind, SchemaProperty};
    use indexmap::IndexMap;
    use serde_json::json;

    fn schema() -> ActorSchema {
        let mut properties = IndexMap::new();
        properties.insert(
            "startUrls".to_string(),
            SchemaProperty {
                title: Some("Start URLs".to_string()),
                description: None,
                default: None,
                kind: PropertyKind::Array { items: None },
            },
        );
        properties.insert(
            "mode".to_string(),
            SchemaProperty {
                title: Some("Mode".to_string()),
                description: None,
                default: None,
                kind: PropertyKind::Enum {
                    declared: "string".to_string(),
                    values: vec![json!("fast"), json!("slow")],
                },
            },
        );
        properties.insert("debug".to_string(), SchemaProperty::scalar("Debug", ScalarKind::Boolean));
        properties.insert("maxPages".to_string(), SchemaProperty::scalar("Max pages", ScalarKind::Integer));
        ActorSchema {
            title: "Input".to_string(),
            kind: "object".to_string(),
            schema_version: 1,
            description: None,
            properties,
            required: Vec::new(),
        }
    }

    fn editor(name: &str) -> FieldEditor {
        let field = form_fields(&schema()).into_iter().find(|field| field.name == name).expect("field");
        FieldEditor::new(field)
    }

    fn type_text(editor: &mut FieldEditor, form: &mut FormState, text: &str) {
        for c in text.chars() {
            if let EditOutcome::Changed(coercion) = editor.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)) {
                let name = editor.field().name.clone();
                form.apply(&name, coercion);
            }
        }
    }

    #[test]
    fn invalid_json_draft_keeps_committed_value() {
        let mut editor = editor("startUrls");
        let mut form = FormState::new();

        type_text(&mut editor, &mut form, r#"[{"url":"a"}]"#);
        assert_eq!(form.get("startUrls"), Some(&json!([{"url": "a"}])));
        assert!(!editor.is_rejected());

        if let EditOutcome::Changed(coercion) = editor.handle_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE)) {
            form.apply("startUrls", coercion);
        }
        assert_eq!(editor.draft().input(), r#"[{"url":"a"}"#);
        assert!(editor.is_rejected());
        assert_eq!(form.get("startUrls"), Some(&json!([{"url": "a"}])));
    }

    #[test]
    fn choice_cycles_from_placeholder_and_back() {
        let mut editor = editor("mode");
        assert_eq!(editor.choice_label(), "Select an option...");

        let right = KeyEvent::new(KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(editor.handle_key(right), EditOutcome::Changed(Coercion::Set(json!("fast"))));
        assert_eq!(editor.handle_key(right), EditOutcome::Changed(Coercion::Set(json!("slow"))));
        assert_eq!(editor.handle_key(right), EditOutcome::Handled);

        let left = KeyEvent::new(KeyCode::Left, KeyModifiers::NONE);
        editor.handle_key(left);
        assert_eq!(editor.handle_key(left), EditOutcome::Changed(Coercion::Clear));
        assert_eq!(editor.handle_key(KeyEvent::new(KeyCode::Up, KeyModifiers::NONE)), EditOutcome::Ignored);
    }

    #[test]
    fn toggle_commits_literal_booleans() {
        let mut editor = editor("debug");
        let space = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(editor.handle_key(space), EditOutcome::Changed(Coercion::Set(json!(true))));
        assert_eq!(editor.handle_key(space), EditOutcome::Changed(Coercion::Set(json!(false))));
        assert!(!editor.is_checked());
    }

    #[test]
    fn clearing_a_number_removes_the_value() {
        let mut editor = editor("maxPages");
        let mut form = FormState::new();
        type_text(&mut editor, &mut form, "12");
        assert_eq!(form.get("maxPages"), Some(&json!(12)));

        for _ in 0..2 {
            if let EditOutcome::Changed(coercion) = editor.handle_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE)) {
                form.apply("maxPages", coercion);
            }
        }
        assert_eq!(form.get("maxPages"), None);
    }

    #[test]
    fn ctrl_arrows_step_integers_by_whole_numbers() {
        let mut urls = editor("startUrls");
        let mut editor = editor("maxPages");
        let up = KeyEvent::new(KeyCode::Up, KeyModifiers::CONTROL);
        let down = KeyEvent::new(KeyCode::Down, KeyModifiers::CONTROL);

        assert_eq!(editor.handle_key(up), EditOutcome::Changed(Coercion::Set(json!(1))));
        assert_eq!(editor.handle_key(up), EditOutcome::Changed(Coercion::Set(json!(2))));
        assert_eq!(editor.handle_key(down), EditOutcome::Changed(Coercion::Set(json!(1))));
        assert_eq!(editor.draft().input(), "1");

        editor.handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE));
        assert_eq!(editor.handle_key(up), EditOutcome::Handled);
        assert_eq!(editor.draft().input(), "1x");

        assert_eq!(urls.handle_key(up), EditOutcome::Ignored);
    }
}
