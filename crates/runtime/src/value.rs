//! Runtime values for Aua
//!
//! All values are one closed tagged sum. Compound values that Aua code can
//! mutate through member assignment (object literals, records) share their
//! storage behind `Rc<RefCell<...>>`, so a value held in two bindings
//! observes the same mutation. The interpreter is single-threaded, so `Rc`
//! suffices.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use aua_compiler::ir::{Stmt, TypeForm};

use crate::env::EnvRef;
use crate::klass::Klass;

/// A user-defined function: parameters, translated body, and the
/// environment captured at definition time (lexical scoping).
pub struct FunctionData {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub env: EnvRef,
}

impl fmt::Debug for FunctionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The captured environment is omitted: it can contain this
        // function, and printing it would recurse forever.
        f.debug_struct("FunctionData")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A constructed record instance. `values` keys are exactly the field
/// names of `fields`.
#[derive(Debug)]
pub struct RecordData {
    pub type_name: String,
    pub fields: Vec<(String, TypeForm)>,
    pub values: RefCell<HashMap<String, Value>>,
}

/// Every runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Nihil,
    List(Vec<Value>),
    Dict(HashMap<String, Value>),
    /// Anonymous `{ field: value }` object; insertion order preserved.
    ObjectLiteral(Rc<RefCell<Vec<(String, Value)>>>),
    Record(Rc<RecordData>),
    Time(SystemTime),
    Function(Rc<FunctionData>),
    Klass(Klass),
    /// A value tagged with the declared type it was cast to.
    Tagged {
        value: Box<Value>,
        annotation: String,
    },
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.untag(), other.untag()) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Nihil, Value::Nihil) => true,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::ObjectLiteral(a), Value::ObjectLiteral(b)) => *a.borrow() == *b.borrow(),
            (Value::Record(a), Value::Record(b)) => {
                a.type_name == b.type_name && *a.values.borrow() == *b.values.borrow()
            }
            (Value::Time(a), Value::Time(b)) => a == b,
            // Functions compare by identity; equality of behavior is
            // undecidable.
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Klass(a), Value::Klass(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Strip any cast annotation, recursively.
    pub fn untag(&self) -> &Value {
        match self {
            Value::Tagged { value, .. } => value.untag(),
            other => other,
        }
    }

    /// Wrap with a type annotation.
    pub fn tagged(self, annotation: impl Into<String>) -> Value {
        Value::Tagged {
            value: Box::new(self),
            annotation: annotation.into(),
        }
    }

    /// The declared or intrinsic type name, as `typeof` reports it.
    pub fn type_name(&self) -> String {
        match self {
            Value::Tagged { annotation, .. } => annotation.clone(),
            Value::Int(_) => "Int".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::Str(_) => "Str".to_string(),
            Value::Nihil => "Nihil".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Dict(_) => "Dict".to_string(),
            Value::ObjectLiteral(_) => "Object".to_string(),
            Value::Record(data) => data.type_name.clone(),
            Value::Time(_) => "Time".to_string(),
            Value::Function(_) => "Fun".to_string(),
            Value::Klass(_) => "Klass".to_string(),
        }
    }

    /// Truthiness: `false`, `nihil`, `0`, and the empty string are false;
    /// everything else is true.
    pub fn truthy(&self) -> bool {
        match self.untag() {
            Value::Bool(b) => *b,
            Value::Nihil => false,
            Value::Int(0) => false,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Plain string rendering, as `to_s` and string concatenation use it:
    /// strings render without quotes, everything else as its inspect form.
    pub fn display_string(&self) -> String {
        match self.untag() {
            Value::Str(s) => s.clone(),
            other => other.inspect(),
        }
    }

    /// Diagnostic rendering, as the `inspect` builtin returns it.
    pub fn inspect(&self) -> String {
        match self.untag() {
            Value::Int(n) => n.to_string(),
            Value::Float(x) => {
                // Keep a decimal point so floats read as floats.
                if x.fract() == 0.0 && x.is_finite() {
                    format!("{:.1}", x)
                } else {
                    x.to_string()
                }
            }
            Value::Bool(b) => b.to_string(),
            Value::Str(s) => format!("\"{}\"", s),
            Value::Nihil => "nihil".to_string(),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(Value::inspect).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Dict(entries) => {
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                let entries: Vec<String> = keys
                    .into_iter()
                    .map(|k| format!("{}: {}", k, entries[k].inspect()))
                    .collect();
                format!("{{ {} }}", entries.join(", "))
            }
            Value::ObjectLiteral(fields) => {
                let fields: Vec<String> = fields
                    .borrow()
                    .iter()
                    .map(|(name, value)| format!("{}: {}", name, value.inspect()))
                    .collect();
                format!("{{ {} }}", fields.join(", "))
            }
            Value::Record(data) => {
                let values = data.values.borrow();
                let fields: Vec<String> = data
                    .fields
                    .iter()
                    .map(|(name, _)| {
                        let value = values.get(name).map(Value::inspect).unwrap_or_default();
                        format!("{}: {}", name, value)
                    })
                    .collect();
                format!("{} {{ {} }}", data.type_name, fields.join(", "))
            }
            Value::Time(t) => {
                let secs = t
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                format!("time({})", secs)
            }
            Value::Function(f) => format!("fun {}({})", f.name, f.params.join(", ")),
            Value::Klass(k) => k.introspect(),
            Value::Tagged { .. } => unreachable!("untag strips annotations"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness_table() {
        assert!(Value::Bool(true).truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(!Value::Nihil.truthy());
        assert!(!Value::Int(0).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(Value::Int(-1).truthy());
        assert!(Value::Str("x".to_string()).truthy());
        assert!(Value::Float(0.0).truthy());
        assert!(Value::List(Vec::new()).truthy());
    }

    #[test]
    fn test_equality_looks_through_annotations() {
        let plain = Value::List(vec![Value::Int(1)]);
        let tagged = Value::List(vec![Value::Int(1)]).tagged("List<Int>");
        assert_eq!(plain, tagged);
    }

    #[test]
    fn test_inspect_renderings() {
        assert_eq!(Value::Int(5).inspect(), "5");
        assert_eq!(Value::Float(2.0).inspect(), "2.0");
        assert_eq!(Value::Str("hi".to_string()).inspect(), "\"hi\"");
        assert_eq!(Value::Nihil.inspect(), "nihil");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Str("a".to_string())]).inspect(),
            "[1, \"a\"]"
        );
    }

    #[test]
    fn test_type_name_prefers_annotation() {
        let tagged = Value::List(vec![]).tagged("List<Int>");
        assert_eq!(tagged.type_name(), "List<Int>");
        assert_eq!(Value::Int(1).type_name(), "Int");
    }

    #[test]
    fn test_display_string_unquotes_strings() {
        assert_eq!(Value::Str("hi".to_string()).display_string(), "hi");
        assert_eq!(Value::Int(3).display_string(), "3");
    }
}
