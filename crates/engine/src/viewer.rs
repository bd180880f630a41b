//! Read-only flattening of a schema tree into display rows.

use actorbench_types::{ActorSchema, PropertyKind, SchemaProperty};

/// Name given to the row describing an array's item schema.
pub const ARRAY_ITEM_NAME: &str = "item";

/// One property as displayed by the schema viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRow {
    pub name: String,
    /// Nesting level; top-level properties are at depth 0.
    pub depth: usize,
    pub required: bool,
    pub kind_label: String,
    /// Default value as compact JSON.
    pub default_json: Option<String>,
    pub description: Option<String>,
    /// Enum literals as compact JSON.
    pub choices: Vec<String>,
    /// True for the row describing an array's items.
    pub is_array_item: bool,
}

/// Flattens the schema depth-first in declared property order.
///
/// Required markers come from the enclosing object's required list: the root
/// schema for top-level properties, the parent object node below that.
pub fn schema_rows(schema: &ActorSchema) -> Vec<SchemaRow> {
    let mut rows = Vec::new();
    for (name, property) in &schema.properties {
        push_rows(&mut rows, name, property, 0, schema.is_required(name), false);
    }
    rows
}

fn push_rows(rows: &mut Vec<SchemaRow>, name: &str, property: &SchemaProperty, depth: usize, required: bool, is_array_item: bool) {
    rows.push(SchemaRow {
        name: name.to_string(),
        depth,
        required,
        kind_label: property.kind_label().to_string(),
        default_json: property.default.as_ref().map(|value| value.to_string()),
        description: property.description.clone(),
        choices: property
            .enum_values()
            .map(|values| values.iter().map(|value| value.to_string()).collect())
            .unwrap_or_default(),
        is_array_item,
    });

    match &property.kind {
        PropertyKind::Object {
            properties,
            required: required_names,
        } => {
            for (child_name, child) in properties {
                let child_required = required_names.iter().any(|required| required == child_name);
                push_rows(rows, child_name, child, depth + 1, child_required, false);
            }
        }
        PropertyKind::Array { items: Some(items) } => {
            push_rows(rows, ARRAY_ITEM_NAME, items, depth + 1, false, true);
        }
        PropertyKind::Array { items: None } | PropertyKind::Enum { .. } | PropertyKind::Scalar(_) => {}
    }
}
