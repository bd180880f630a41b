//! Actor input schema model.
//!
//! The platform describes actor inputs with a JSON-schema-like document in
//! which every node is a flat object carrying optional `enum`, `items` and
//! `properties` keys. Internally each node is a [`SchemaProperty`] whose
//! [`PropertyKind`] says what the node actually is, so consumers match on one
//! tag instead of probing several optional attributes. The wire form is kept
//! by converting through a private raw representation on (de)serialization.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root input schema of an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSchema {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default = "default_root_kind")]
    pub kind: String,
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, SchemaProperty>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

fn default_root_kind() -> String {
    "object".to_string()
}

impl ActorSchema {
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|required| required == name)
    }

    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }
}

/// Primitive kinds a scalar node may declare.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Number,
    Integer,
    Boolean,
    /// Any declared type this client has no dedicated control for.
    Other(String),
}

impl ScalarKind {
    fn from_declared(declared: &str) -> Self {
        match declared {
            "" | "string" => ScalarKind::String,
            "number" => ScalarKind::Number,
            "integer" => ScalarKind::Integer,
            "boolean" => ScalarKind::Boolean,
            other => ScalarKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Number => "number",
            ScalarKind::Integer => "integer",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Other(other) => other,
        }
    }
}

/// Structured JSON container kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Array,
    Object,
}

impl ContainerKind {
    /// Value committed when the editor is cleared.
    pub fn empty_value(self) -> Value {
        match self {
            ContainerKind::Array => Value::Array(Vec::new()),
            ContainerKind::Object => Value::Object(serde_json::Map::new()),
        }
    }
}

/// What a schema node is.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    /// Closed set of literal values. `declared` keeps the node's `type`.
    Enum { declared: String, values: Vec<Value> },
    Object {
        properties: IndexMap<String, SchemaProperty>,
        required: Vec<String>,
    },
    Array { items: Option<Box<SchemaProperty>> },
    Scalar(ScalarKind),
}

/// One node of the input schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchemaProperty", into = "RawSchemaProperty")]
pub struct SchemaProperty {
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub kind: PropertyKind,
}

impl SchemaProperty {
    pub fn scalar(title: &str, kind: ScalarKind) -> Self {
        Self {
            title: Some(title.to_string()),
            description: None,
            default: None,
            kind: PropertyKind::Scalar(kind),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// The declared type name, as the schema author wrote it.
    pub fn kind_label(&self) -> &str {
        match &self.kind {
            PropertyKind::Enum { declared, .. } => declared,
            PropertyKind::Object { .. } => "object",
            PropertyKind::Array { .. } => "array",
            PropertyKind::Scalar(scalar) => scalar.as_str(),
        }
    }

    /// Title when present, otherwise the property name.
    pub fn label<'a>(&'a self, name: &'a str) -> &'a str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => name,
        }
    }

    pub fn enum_values(&self) -> Option<&[Value]> {
        match &self.kind {
            PropertyKind::Enum { values, .. } => Some(values),
            _ => None,
        }
    }
}

/// Error raised when a schema node cannot be interpreted.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unsupported `type` declaration: {0}")]
    InvalidType(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawSchemaProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Box<RawSchemaProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<IndexMap<String, RawSchemaProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    required: Option<Vec<String>>,
}

/// Reads a `type` declaration. JSON-schema unions such as `["string", "null"]`
/// resolve to their first non-null member.
fn declared_type(kind: Option<&Value>) -> Result<String, SchemaError> {
    match kind {
        None | Some(Value::Null) => Ok("string".to_string()),
        Some(Value::String(name)) => Ok(name.clone()),
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .find(|name| *name != "null")
            .map(str::to_string)
            .ok_or_else(|| SchemaError::InvalidType(Value::Array(names.clone()).to_string())),
        Some(other) => Err(SchemaError::InvalidType(other.to_string())),
    }
}

impl TryFrom<RawSchemaProperty> for SchemaProperty {
    type Error = SchemaError;

    fn try_from(raw: RawSchemaProperty) -> Result<Self, Self::Error> {
        let declared = declared_type(raw.kind.as_ref())?;

        let kind = match (raw.enum_values, declared.as_str()) {
            (Some(values), _) => PropertyKind::Enum { declared, values },
            (None, "object") => {
                let mut properties = IndexMap::new();
                for (name, child) in raw.properties.unwrap_or_default() {
                    properties.insert(name, SchemaProperty::try_from(child)?);
                }
                PropertyKind::Object {
                    properties,
                    required: raw.required.unwrap_or_default(),
                }
            }
            (None, "array") => {
                let items = match raw.items {
                    Some(items) => Some(Box::new(SchemaProperty::try_from(*items)?)),
                    None => None,
                };
                PropertyKind::Array { items }
            }
            (None, other) => PropertyKind::Scalar(ScalarKind::from_declared(other)),
        };

        Ok(Self {
            title: raw.title,
            description: raw.description,
            default: raw.default,
            kind,
        })
    }
}

impl From<SchemaProperty> for RawSchemaProperty {
    fn from(property: SchemaProperty) -> Self {
        let mut raw = RawSchemaProperty {
            title: property.title,
            description: property.description,
            default: property.default,
            ..RawSchemaProperty::default()
        };
        match property.kind {
            PropertyKind::Enum { declared, values } => {
                raw.kind = Some(Value::String(declared));
                raw.enum_values = Some(values);
            }
            PropertyKind::Object { properties, required } => {
                raw.kind = Some(Value::String("object".into()));
                if !properties.is_empty() {
                    raw.properties = Some(properties.into_iter().map(|(name, child)| (name, child.into())).collect());
                }
                if !required.is_empty() {
                    raw.required = Some(required);
                }
            }
            PropertyKind::Array { items } => {
                raw.kind = Some(Value::String("array".into()));
                raw.items = items.map(|items| Box::new(RawSchemaProperty::from(*items)));
            }
            PropertyKind::Scalar(scalar) => {
                raw.kind = Some(Value::String(scalar.as_str().to_string()));
            }
        }
        raw
    }
}
