//! YAML codec for the `load_yaml`, `parse_yaml`, and `dump_yaml` builtins
//!
//! Trees of primitives, lists, and string-keyed dicts round-trip exactly.
//! Richer values (records, objects, functions) serialize as their mapping
//! or display forms.

use std::collections::HashMap;

use aua_core::{AuaError, Result};

use crate::value::Value;

pub fn parse_str(text: &str) -> Result<Value> {
    let parsed: serde_yaml::Value = serde_yaml::from_str(text)
        .map_err(|e| AuaError::Value(format!("malformed YAML: {}", e)))?;
    Ok(yaml_to_value(&parsed))
}

pub fn dump(value: &Value) -> Result<String> {
    serde_yaml::to_string(&value_to_yaml(value))
        .map_err(|e| AuaError::Value(format!("cannot dump value as YAML: {}", e)))
}

pub fn yaml_to_value(yaml: &serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Nihil,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_yaml::Value::String(s) => Value::Str(s.clone()),
        serde_yaml::Value::Sequence(items) => {
            Value::List(items.iter().map(yaml_to_value).collect())
        }
        serde_yaml::Value::Mapping(entries) => {
            let mut dict = HashMap::new();
            for (key, entry) in entries {
                let key = match key.as_str() {
                    Some(s) => s.to_string(),
                    None => serde_yaml::to_string(key)
                        .map(|s| s.trim_end().to_string())
                        .unwrap_or_default(),
                };
                dict.insert(key, yaml_to_value(entry));
            }
            Value::Dict(dict)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}

pub fn value_to_yaml(value: &Value) -> serde_yaml::Value {
    match value.untag() {
        Value::Int(n) => serde_yaml::Value::Number((*n).into()),
        Value::Float(x) => serde_yaml::Value::Number((*x).into()),
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Str(s) => serde_yaml::Value::String(s.clone()),
        Value::Nihil => serde_yaml::Value::Null,
        Value::List(items) => {
            serde_yaml::Value::Sequence(items.iter().map(value_to_yaml).collect())
        }
        Value::Dict(entries) => {
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort();
            let mut mapping = serde_yaml::Mapping::new();
            for key in keys {
                mapping.insert(
                    serde_yaml::Value::String(key.clone()),
                    value_to_yaml(&entries[key]),
                );
            }
            serde_yaml::Value::Mapping(mapping)
        }
        Value::ObjectLiteral(fields) => {
            let mut mapping = serde_yaml::Mapping::new();
            for (name, field) in fields.borrow().iter() {
                mapping.insert(serde_yaml::Value::String(name.clone()), value_to_yaml(field));
            }
            serde_yaml::Value::Mapping(mapping)
        }
        Value::Record(data) => {
            let values = data.values.borrow();
            let mut mapping = serde_yaml::Mapping::new();
            for (name, _) in &data.fields {
                let field = values.get(name).cloned().unwrap_or(Value::Nihil);
                mapping.insert(serde_yaml::Value::String(name.clone()), value_to_yaml(&field));
            }
            serde_yaml::Value::Mapping(mapping)
        }
        other => serde_yaml::Value::String(other.display_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_primitive_tree() {
        let original = Value::Dict(HashMap::from([
            ("name".to_string(), Value::Str("aua".to_string())),
            (
                "versions".to_string(),
                Value::List(vec![Value::Int(1), Value::Int(2)]),
            ),
            ("stable".to_string(), Value::Bool(true)),
            ("missing".to_string(), Value::Nihil),
        ]));
        let dumped = dump(&original).unwrap();
        assert_eq!(parse_str(&dumped).unwrap(), original);
    }

    #[test]
    fn test_parse_plain_document() {
        let value = parse_str("a: 1\nb:\n  - x\n  - y\n").unwrap();
        match value {
            Value::Dict(entries) => {
                assert_eq!(entries["a"], Value::Int(1));
                assert_eq!(
                    entries["b"],
                    Value::List(vec![
                        Value::Str("x".to_string()),
                        Value::Str("y".to_string())
                    ])
                );
            }
            other => panic!("expected dict, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_yaml_is_value_error() {
        assert!(matches!(
            parse_str("a: [unclosed").unwrap_err(),
            AuaError::Value(_)
        ));
    }
}
