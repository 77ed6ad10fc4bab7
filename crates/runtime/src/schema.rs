//! JSON-schema derivation
//!
//! Maps IR type forms to the JSON-schema fragments used for
//! schema-constrained model completion. The full cast envelope
//! (`{type: "object", properties: {value: ...}, required: ["value"]}`)
//! is assembled by `Klass::value_schema`; this module produces the inner
//! `value` fragment.

use aua_compiler::ir::TypeForm;
use serde_json::json;

use crate::registry::TypeRegistry;

/// Self-referential type declarations bottom out as plain strings past
/// this depth instead of recursing forever.
const MAX_DEPTH: usize = 8;

pub fn derive(form: &TypeForm, registry: &TypeRegistry) -> serde_json::Value {
    derive_at(form, registry, 0)
}

fn derive_at(form: &TypeForm, registry: &TypeRegistry, depth: usize) -> serde_json::Value {
    if depth > MAX_DEPTH {
        return json!({"type": "string"});
    }
    match form {
        TypeForm::Reference(name) => match name.as_str() {
            "Int" => json!({"type": "integer"}),
            "Float" => json!({"type": "number"}),
            "Str" => json!({"type": "string"}),
            "Bool" => json!({"type": "boolean"}),
            "Nihil" => json!({"type": "string"}),
            "List" => json!({"type": "array", "items": {"type": "string"}}),
            "Dict" => json!({"type": "object"}),
            _ => match registry.get(name) {
                Some(klass) => derive_at(&klass.form(), registry, depth + 1),
                None => json!({"type": "string"}),
            },
        },
        TypeForm::Constant(value) => json!({"enum": [value]}),
        TypeForm::Generic { base, params } => match (base.as_str(), params.as_slice()) {
            ("List", [element]) => json!({
                "type": "array",
                "items": derive_at(element, registry, depth + 1),
            }),
            ("Dict", [_, value]) => json!({
                "type": "object",
                "additionalProperties": derive_at(value, registry, depth + 1),
            }),
            _ => json!({"type": "string"}),
        },
        TypeForm::Record(fields) => {
            let mut properties = serde_json::Map::new();
            let mut required = Vec::new();
            for (name, ty) in fields {
                properties.insert(name.clone(), derive_at(ty, registry, depth + 1));
                required.push(json!(name));
            }
            json!({
                "type": "object",
                "properties": properties,
                "required": required,
            })
        }
        TypeForm::Union(variants) => {
            let choices: Vec<serde_json::Value> = variants
                .iter()
                .map(|v| match v {
                    TypeForm::Constant(value) => json!(value),
                    TypeForm::Reference(name) => json!(name),
                    other => json!(other.render()),
                })
                .collect();
            json!({"type": "string", "enum": choices})
        }
    }
}
