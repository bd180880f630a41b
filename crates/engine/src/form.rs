//! Schema-driven input controls.
//!
//! Each schema property maps to one [`ControlKind`]. A control turns the
//! user's raw text or checkbox state into a [`Coercion`] without touching the
//! network, and [`FormState`] commits coercions into the name-keyed input map
//! that is later overlaid onto the run payload.

use actorbench_types::{ActorSchema, ContainerKind, PropertyKind, ScalarKind, SchemaProperty};
use serde_json::{Map, Number, Value};

/// Descriptions longer than this many characters get a multi-line editor.
pub const MULTILINE_DESCRIPTION_THRESHOLD: usize = 100;

/// Leading entry of every choice list; selecting it clears the value.
pub const PLACEHOLDER_LABEL: &str = "Select an option...";

/// Editable control selected for a property.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    Choice { options: Vec<Value> },
    Toggle,
    Numeric { integer: bool },
    JsonEditor { container: ContainerKind },
    Text { multiline: bool },
}

/// What the user produced in a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput<'a> {
    Text(&'a str),
    Checked(bool),
}

/// Outcome of coercing raw input against a control.
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    /// Commit this value.
    Set(Value),
    /// Remove the value so the run default applies.
    Clear,
    /// Input is not (yet) a valid value; the committed value stays.
    Keep,
}

impl ControlKind {
    pub fn for_property(property: &SchemaProperty) -> Self {
        match &property.kind {
            PropertyKind::Enum { values, .. } => ControlKind::Choice { options: values.clone() },
            PropertyKind::Scalar(ScalarKind::Boolean) => ControlKind::Toggle,
            PropertyKind::Scalar(ScalarKind::Integer) => ControlKind::Numeric { integer: true },
            PropertyKind::Scalar(ScalarKind::Number) => ControlKind::Numeric { integer: false },
            PropertyKind::Array { .. } => ControlKind::JsonEditor {
                container: ContainerKind::Array,
            },
            PropertyKind::Object { .. } => ControlKind::JsonEditor {
                container: ContainerKind::Object,
            },
            PropertyKind::Scalar(_) => ControlKind::Text {
                multiline: property
                    .description
                    .as_deref()
                    .is_some_and(|description| description.chars().count() > MULTILINE_DESCRIPTION_THRESHOLD),
            },
        }
    }

    /// Converts raw control input into the property's declared kind.
    pub fn coerce(&self, raw: RawInput<'_>) -> Coercion {
        match (self, raw) {
            (ControlKind::Toggle, RawInput::Checked(checked)) => Coercion::Set(Value::Bool(checked)),
            (ControlKind::Toggle, RawInput::Text(text)) => Coercion::Set(Value::Bool(text.trim() == "true")),
            (_, RawInput::Checked(_)) => Coercion::Keep,
            (ControlKind::Choice { options }, RawInput::Text(text)) => {
                if text.is_empty() || text == PLACEHOLDER_LABEL {
                    return Coercion::Clear;
                }
                options
                    .iter()
                    .find(|option| value_label(option) == text)
                    .map(|option| Coercion::Set(option.clone()))
                    .unwrap_or(Coercion::Keep)
            }
            (ControlKind::Numeric { integer }, RawInput::Text(text)) => coerce_number(text, *integer),
            (ControlKind::JsonEditor { container }, RawInput::Text(text)) => {
                if text.trim().is_empty() {
                    return Coercion::Set(container.empty_value());
                }
                match (*container, serde_json::from_str::<Value>(text)) {
                    (ContainerKind::Array, Ok(value @ Value::Array(_)))
                    | (ContainerKind::Object, Ok(value @ Value::Object(_))) => Coercion::Set(value),
                    _ => Coercion::Keep,
                }
            }
            (ControlKind::Text { .. }, RawInput::Text(text)) => {
                if text.is_empty() {
                    Coercion::Clear
                } else {
                    Coercion::Set(Value::String(text.to_string()))
                }
            }
        }
    }

    /// Choice list as shown to the user, placeholder first. Empty for
    /// non-choice controls.
    pub fn choice_labels(&self) -> Vec<String> {
        match self {
            ControlKind::Choice { options } => std::iter::once(PLACEHOLDER_LABEL.to_string())
                .chain(options.iter().map(value_label))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Increment for numeric controls; integers step by whole numbers.
    pub fn step(&self) -> Option<i64> {
        match self {
            ControlKind::Numeric { integer: true } => Some(1),
            _ => None,
        }
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self, ControlKind::Text { multiline: true } | ControlKind::JsonEditor { .. })
    }
}

fn coerce_number(text: &str, integer: bool) -> Coercion {
    let text = text.trim();
    if text.is_empty() {
        return Coercion::Clear;
    }
    if let Ok(whole) = text.parse::<i64>() {
        return Coercion::Set(Value::Number(whole.into()));
    }
    let Ok(parsed) = text.parse::<f64>() else {
        return Coercion::Keep;
    };
    if integer {
        if parsed.fract() != 0.0 || parsed.abs() > i64::MAX as f64 {
            return Coercion::Keep;
        }
        return Coercion::Set(Value::Number((parsed as i64).into()));
    }
    Number::from_f64(parsed).map(|number| Coercion::Set(Value::Number(number))).unwrap_or(Coercion::Keep)
}

/// String form of a literal, as used for choice labels and matching.
pub fn value_label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Renders a committed value as editable text. Structured values are pretty
/// printed so the text parses back to the same structure.
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
        other => other.to_string(),
    }
}

/// One generated form row.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub description: Option<String>,
    pub control: ControlKind,
    /// Hint shown while the field is empty, derived from the default.
    pub placeholder: String,
}

/// Builds the form rows for a schema in declared property order.
pub fn form_fields(schema: &ActorSchema) -> Vec<FormField> {
    schema
        .properties
        .iter()
        .map(|(name, property)| {
            let control = ControlKind::for_property(property);
            FormField {
                name: name.clone(),
                label: property.label(name).to_string(),
                required: schema.is_required(name),
                description: property.description.clone(),
                placeholder: placeholder_for(&control, property),
                control,
            }
        })
        .collect()
}

fn placeholder_for(control: &ControlKind, property: &SchemaProperty) -> String {
    match (control, property.default.as_ref()) {
        (ControlKind::JsonEditor { container: ContainerKind::Array }, _) => "[]".to_string(),
        (ControlKind::JsonEditor { .. }, Some(default)) => display_text(default),
        (ControlKind::JsonEditor { .. }, None) => "{}".to_string(),
        (_, Some(default)) => value_label(default),
        (_, None) => String::new(),
    }
}

/// Pending input values keyed by property name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    values: Map<String, Value>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Commits a coercion. Returns true when the stored value changed.
    pub fn apply(&mut self, name: &str, coercion: Coercion) -> bool {
        match coercion {
            Coercion::Set(value) => {
                if self.values.get(name) == Some(&value) {
                    return false;
                }
                self.values.insert(name.to_string(), value);
                true
            }
            Coercion::Clear => self.values.remove(name).is_some(),
            Coercion::Keep => false,
        }
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn property(value: Value) -> SchemaProperty {
        serde_json::from_value(value).expect("property")
    }

    #[test]
    fn enum_choices_are_placeholder_then_literals_in_order() {
        let control = ControlKind::for_property(&property(json!({ "type": "string", "enum": ["fast", "thorough", 3] })));

        assert_eq!(control.choice_labels(), vec![PLACEHOLDER_LABEL, "fast", "thorough", "3"]);
        assert_eq!(control.coerce(RawInput::Text("3")), Coercion::Set(json!(3)));
        assert_eq!(control.coerce(RawInput::Text("fast")), Coercion::Set(json!("fast")));
        assert_eq!(control.coerce(RawInput::Text(PLACEHOLDER_LABEL)), Coercion::Clear);
    }

    #[test]
    fn controls_follow_the_declared_kind() {
        assert_eq!(ControlKind::for_property(&property(json!({ "type": "boolean" }))), ControlKind::Toggle);
        assert_eq!(
            ControlKind::for_property(&property(json!({ "type": "integer" }))).step(),
            Some(1)
        );
        assert_eq!(ControlKind::for_property(&property(json!({ "type": "number" }))).step(), None);
        assert_eq!(
            ControlKind::for_property(&property(json!({ "type": "object" }))),
            ControlKind::JsonEditor {
                container: ContainerKind::Object
            }
        );
        assert_eq!(
            ControlKind::for_property(&property(json!({}))),
            ControlKind::Text { multiline: false }
        );
    }

    #[test]
    fn long_descriptions_get_a_multiline_text_editor() {
        let at_threshold = "x".repeat(MULTILINE_DESCRIPTION_THRESHOLD);
        let over_threshold = "x".repeat(MULTILINE_DESCRIPTION_THRESHOLD + 1);

        let short = ControlKind::for_property(&property(json!({ "type": "string", "description": at_threshold })));
        let long = ControlKind::for_property(&property(json!({ "type": "string", "description": over_threshold })));

        assert_eq!(short, ControlKind::Text { multiline: false });
        assert_eq!(long, ControlKind::Text { multiline: true });
    }

    #[test]
    fn numeric_input_clears_on_empty_and_rejects_fractions_for_integers() {
        let integer = ControlKind::Numeric { integer: true };
        let number = ControlKind::Numeric { integer: false };

        assert_eq!(integer.coerce(RawInput::Text("")), Coercion::Clear);
        assert_eq!(integer.coerce(RawInput::Text("12")), Coercion::Set(json!(12)));
        assert_eq!(integer.coerce(RawInput::Text("4.0")), Coercion::Set(json!(4)));
        assert_eq!(integer.coerce(RawInput::Text("2.5")), Coercion::Keep);
        assert_eq!(integer.coerce(RawInput::Text("1e")), Coercion::Keep);
        assert_eq!(number.coerce(RawInput::Text("2.5")), Coercion::Set(json!(2.5)));
        assert_eq!(number.coerce(RawInput::Text("0")), Coercion::Set(json!(0)));
    }

    #[test]
    fn toggle_commits_literal_booleans() {
        assert_eq!(ControlKind::Toggle.coerce(RawInput::Checked(true)), Coercion::Set(json!(true)));
        assert_eq!(ControlKind::Toggle.coerce(RawInput::Checked(false)), Coercion::Set(json!(false)));
    }

    #[test]
    fn invalid_json_leaves_the_committed_value_unchanged() {
        let control = ControlKind::JsonEditor {
            container: ContainerKind::Array,
        };
        let mut state = FormState::new();

        assert!(state.apply("startUrls", control.coerce(RawInput::Text(r#"[{"url": "https://a.example"}]"#))));
        let committed = state.get("startUrls").cloned();

        assert!(!state.apply("startUrls", control.coerce(RawInput::Text(r#"[{"url": "#))));
        assert_eq!(state.get("startUrls").cloned(), committed);

        assert!(state.apply("startUrls", control.coerce(RawInput::Text("  "))));
        assert_eq!(state.get("startUrls"), Some(&json!([])));
    }

    #[test]
    fn json_of_the_wrong_container_kind_is_not_committed() {
        let array = ControlKind::JsonEditor {
            container: ContainerKind::Array,
        };
        let mut state = FormState::new();
        assert!(state.apply("startUrls", array.coerce(RawInput::Text(r#"[{"url":"a"}]"#))));

        assert_eq!(array.coerce(RawInput::Text("5")), Coercion::Keep);
        assert!(!state.apply("startUrls", array.coerce(RawInput::Text(r#""a""#))));
        assert!(!state.apply("startUrls", array.coerce(RawInput::Text("{}"))));
        assert_eq!(state.get("startUrls"), Some(&json!([{"url": "a"}])));

        let object = ControlKind::JsonEditor {
            container: ContainerKind::Object,
        };
        assert_eq!(object.coerce(RawInput::Text("[1]")), Coercion::Keep);
        assert_eq!(object.coerce(RawInput::Text("null")), Coercion::Keep);
        assert_eq!(object.coerce(RawInput::Text(r#"{"a":1}"#)), Coercion::Set(json!({"a": 1})));
    }

    #[test]
    fn display_text_round_trips_structured_values() {
        let control = ControlKind::JsonEditor {
            container: ContainerKind::Object,
        };
        let value = json!({ "nested": { "list": [1, 2, { "deep": true }] }, "name": "x" });

        assert_eq!(control.coerce(RawInput::Text(&display_text(&value))), Coercion::Set(value));
    }

    #[test]
    fn empty_text_clears_the_field() {
        let control = ControlKind::Text { multiline: false };
        let mut state = FormState::new();

        state.apply("query", control.coerce(RawInput::Text("rust")));
        assert_eq!(state.get("query"), Some(&json!("rust")));
        assert!(state.apply("query", control.coerce(RawInput::Text(""))));
        assert!(state.is_empty());
    }

    #[test]
    fn form_fields_follow_property_order_with_required_markers() {
        let schema: ActorSchema = serde_json::from_value(json!({
            "title": "Input",
            "type": "object",
            "schemaVersion": 1,
            "properties": {
                "startUrls": { "title": "Start URLs", "type": "array" },
                "maxConcurrency": { "type": "integer", "default": 10 },
                "mode": { "title": "Mode", "type": "object", "default": { "a": 1 } }
            },
            "required": ["startUrls"]
        }))
        .expect("schema");

        let fields = form_fields(&schema);

        assert_eq!(
            fields.iter().map(|field| field.label.as_str()).collect::<Vec<_>>(),
            vec!["Start URLs", "maxConcurrency", "Mode"]
        );
        assert!(fields[0].required);
        assert!(!fields[1].required);
        assert_eq!(fields[0].placeholder, "[]");
        assert_eq!(fields[1].placeholder, "10");
        assert_eq!(fields[2].placeholder, "{\n  \"a\": 1\n}");
    }
}
