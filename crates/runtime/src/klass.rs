//! Type descriptors (klasses)
//!
//! A [`Klass`] is the runtime face of a type: it can name itself, render a
//! human-readable introspection, derive the JSON schema that constrains
//! model output, and construct a concrete [`Value`] from the raw JSON the
//! model returned. One variant per IR type kind, plus the primitives and
//! the `List`/`Dict` generic bases.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use aua_compiler::ir::TypeForm;
use aua_core::{AuaError, Result};
use serde_json::json;

use crate::registry::TypeRegistry;
use crate::schema;
use crate::value::{RecordData, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Klass {
    Int,
    Float,
    Str,
    Bool,
    Nihil,
    Time,
    List,
    Dict,
    /// A string-literal constant type.
    Constant(String),
    /// `List<T>`, `Dict<K, V>`, or another parameterized base.
    Generic { base: String, params: Vec<TypeForm> },
    Record {
        name: String,
        fields: Vec<(String, TypeForm)>,
    },
    Union {
        /// `None` for anonymous (inline) unions.
        name: Option<String>,
        variants: Vec<TypeForm>,
    },
}

impl Klass {
    pub fn name(&self) -> String {
        match self {
            Klass::Int => "Int".to_string(),
            Klass::Float => "Float".to_string(),
            Klass::Str => "Str".to_string(),
            Klass::Bool => "Bool".to_string(),
            Klass::Nihil => "Nihil".to_string(),
            Klass::Time => "Time".to_string(),
            Klass::List => "List".to_string(),
            Klass::Dict => "Dict".to_string(),
            Klass::Constant(value) => format!("'{}'", value),
            Klass::Generic { .. } => self.form().render(),
            Klass::Record { name, .. } => name.clone(),
            Klass::Union { name, variants } => name
                .clone()
                .unwrap_or_else(|| TypeForm::Union(variants.clone()).render()),
        }
    }

    /// Human-readable description used in cast prompts and `inspect`.
    pub fn introspect(&self) -> String {
        match self {
            Klass::Record { name, fields } => {
                format!("{} {}", name, TypeForm::Record(fields.clone()).render())
            }
            Klass::Union {
                name: Some(name),
                variants,
            } => format!("{} ({})", name, TypeForm::Union(variants.clone()).render()),
            Klass::Union { name: None, variants } => {
                TypeForm::Union(variants.clone()).render()
            }
            other => other.name(),
        }
    }

    /// The IR type form this klass describes.
    pub fn form(&self) -> TypeForm {
        match self {
            Klass::Int => TypeForm::Reference("Int".to_string()),
            Klass::Float => TypeForm::Reference("Float".to_string()),
            Klass::Str => TypeForm::Reference("Str".to_string()),
            Klass::Bool => TypeForm::Reference("Bool".to_string()),
            Klass::Nihil => TypeForm::Reference("Nihil".to_string()),
            Klass::Time => TypeForm::Reference("Time".to_string()),
            Klass::List => TypeForm::Reference("List".to_string()),
            Klass::Dict => TypeForm::Reference("Dict".to_string()),
            Klass::Constant(value) => TypeForm::Constant(value.clone()),
            Klass::Generic { base, params } => TypeForm::Generic {
                base: base.clone(),
                params: params.clone(),
            },
            Klass::Record { fields, .. } => TypeForm::Record(fields.clone()),
            Klass::Union { variants, .. } => TypeForm::Union(variants.clone()),
        }
    }

    /// The literal choices of a union klass, as strings.
    pub fn union_values(&self) -> Option<Vec<String>> {
        match self {
            Klass::Union { variants, .. } => Some(
                variants
                    .iter()
                    .map(|v| match v {
                        TypeForm::Constant(value) => value.clone(),
                        TypeForm::Reference(name) => name.clone(),
                        other => other.render(),
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    /// The schema fragment for this klass's value.
    pub fn json_schema(&self, registry: &TypeRegistry) -> serde_json::Value {
        schema::derive(&self.form(), registry)
    }

    /// The full cast envelope: an object with a required `value` field.
    pub fn value_schema(&self, registry: &TypeRegistry) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "value": self.json_schema(registry) },
            "required": ["value"],
        })
    }

    /// The named schema handed to the model client for a cast.
    pub fn cast_schema(&self, registry: &TypeRegistry) -> serde_json::Value {
        json!({
            "name": self.name(),
            "schema": self.value_schema(registry),
        })
    }

    /// Build a concrete value from the raw JSON the model produced for a
    /// cast. Record fields whose declared type names a registered record
    /// recurse through that record's `construct`; everything else wraps
    /// via the primitive wrappers.
    pub fn construct(&self, raw: serde_json::Value, registry: &TypeRegistry) -> Result<Value> {
        match self {
            Klass::Int => raw
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| shape_error("an integer", &raw)),
            Klass::Float => raw
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| shape_error("a number", &raw)),
            Klass::Bool => raw
                .as_bool()
                .map(Value::Bool)
                .ok_or_else(|| shape_error("a boolean", &raw)),
            Klass::Str => Ok(Value::Str(json_display(&raw))),
            Klass::Nihil => Ok(Value::Nihil),
            Klass::Time => Err(AuaError::Type(
                "cannot construct Time values from a cast".to_string(),
            )),
            Klass::List | Klass::Dict => Ok(json_to_value(&raw)),
            Klass::Constant(expected) => match raw.as_str() {
                Some(s) => Ok(Value::Str(s.to_string())),
                None => Ok(Value::Str(expected.clone())),
            },
            Klass::Generic { base, params } => match base.as_str() {
                "List" if params.len() == 1 => {
                    let items = raw
                        .as_array()
                        .ok_or_else(|| shape_error("an array", &raw))?;
                    let element = registry.klass_from_form(&params[0])?;
                    let items = items
                        .iter()
                        .map(|item| element.construct(item.clone(), registry))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(Value::List(items))
                }
                "Dict" if params.len() == 2 => {
                    let entries = raw
                        .as_object()
                        .ok_or_else(|| shape_error("an object", &raw))?;
                    let value_klass = registry.klass_from_form(&params[1])?;
                    let mut dict = HashMap::new();
                    for (key, entry) in entries {
                        dict.insert(key.clone(), value_klass.construct(entry.clone(), registry)?);
                    }
                    Ok(Value::Dict(dict))
                }
                _ => Ok(json_to_value(&raw)),
            },
            Klass::Record { name, fields } => {
                let object = raw
                    .as_object()
                    .ok_or_else(|| shape_error("an object", &raw))?;
                let mut values = HashMap::new();
                for (field, form) in fields {
                    let sub = object.get(field).cloned().unwrap_or(serde_json::Value::Null);
                    let value = match form {
                        TypeForm::Reference(type_name) => match registry.get(type_name) {
                            Some(nested @ Klass::Record { .. }) => {
                                nested.construct(sub, registry)?
                            }
                            _ => json_to_value(&sub),
                        },
                        _ => json_to_value(&sub),
                    };
                    values.insert(field.clone(), value);
                }
                Ok(Value::Record(Rc::new(RecordData {
                    type_name: name.clone(),
                    fields: fields.clone(),
                    values: RefCell::new(values),
                })))
            }
            Klass::Union { .. } => match raw.as_str() {
                Some(s) => Ok(Value::Str(s.to_string())),
                None => Ok(Value::Str(json_display(&raw))),
            },
        }
    }
}

fn shape_error(expected: &str, raw: &serde_json::Value) -> AuaError {
    AuaError::Model(format!(
        "schema-constrained response expected {}, got {}",
        expected, raw
    ))
}

/// Map arbitrary JSON onto the primitive value wrappers.
pub fn json_to_value(raw: &serde_json::Value) -> Value {
    match raw {
        serde_json::Value::Null => Value::Nihil,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(entries) => Value::Dict(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), json_to_value(v)))
                .collect(),
        ),
    }
}

/// A plain-string rendering of a JSON value.
fn json_display(raw: &serde_json::Value) -> String {
    match raw {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_values_mix_constants_and_references() {
        let union = Klass::Union {
            name: Some("Answer".to_string()),
            variants: vec![
                TypeForm::Constant("yes".to_string()),
                TypeForm::Constant("no".to_string()),
                TypeForm::Reference("Maybe".to_string()),
            ],
        };
        assert_eq!(
            union.union_values(),
            Some(vec![
                "yes".to_string(),
                "no".to_string(),
                "Maybe".to_string()
            ])
        );
    }

    #[test]
    fn test_generic_klass_names_render_recursively() {
        let klass = Klass::Generic {
            base: "Dict".to_string(),
            params: vec![
                TypeForm::Reference("Str".to_string()),
                TypeForm::Generic {
                    base: "List".to_string(),
                    params: vec![TypeForm::Reference("Int".to_string())],
                },
            ],
        };
        assert_eq!(klass.name(), "Dict<Str, List<Int>>");
    }

    #[test]
    fn test_construct_generic_list_of_ints() {
        let registry = TypeRegistry::new();
        let klass = Klass::Generic {
            base: "List".to_string(),
            params: vec![TypeForm::Reference("Int".to_string())],
        };
        let value = klass.construct(json!([1, 2, 3]), &registry).unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_construct_record_keys_match_field_definitions() {
        let registry = TypeRegistry::new();
        let klass = Klass::Record {
            name: "Point".to_string(),
            fields: vec![
                ("x".to_string(), TypeForm::Reference("Int".to_string())),
                ("y".to_string(), TypeForm::Reference("Int".to_string())),
            ],
        };
        let value = klass.construct(json!({"x": 3, "y": 4}), &registry).unwrap();
        match value {
            Value::Record(data) => {
                let values = data.values.borrow();
                let mut keys: Vec<&String> = values.keys().collect();
                keys.sort();
                assert_eq!(keys, vec!["x", "y"]);
                assert_eq!(values["x"], Value::Int(3));
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_construct_int_rejects_non_integer() {
        let registry = TypeRegistry::new();
        let err = Klass::Int.construct(json!("five"), &registry).unwrap_err();
        assert!(matches!(err, AuaError::Model(_)));
    }
}
