//! The type registry
//!
//! A process-lifetime mapping from type names to klasses, seeded with the
//! primitives and extended by `type` declarations. Redefining a name
//! replaces the previous klass (last writer wins); instances constructed
//! from the old klass stay valid because they carry their own field
//! definitions.

use std::collections::HashMap;

use aua_compiler::ir::TypeForm;
use aua_core::{AuaError, Result};

use crate::klass::Klass;

pub struct TypeRegistry {
    types: HashMap<String, Klass>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut types = HashMap::new();
        types.insert("Int".to_string(), Klass::Int);
        types.insert("Float".to_string(), Klass::Float);
        types.insert("Str".to_string(), Klass::Str);
        types.insert("Bool".to_string(), Klass::Bool);
        types.insert("Nihil".to_string(), Klass::Nihil);
        types.insert("List".to_string(), Klass::List);
        types.insert("Dict".to_string(), Klass::Dict);
        TypeRegistry { types }
    }

    pub fn get(&self, name: &str) -> Option<&Klass> {
        self.types.get(name)
    }

    pub fn lookup(&self, name: &str) -> Result<Klass> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| AuaError::Type(format!("undefined type '{}'", name)))
    }

    /// Register a declared type and return its klass. Records and unions
    /// take the declared name; anything else registers as an alias.
    pub fn register(&mut self, name: &str, form: &TypeForm) -> Result<Klass> {
        let klass = match form {
            TypeForm::Record(fields) => Klass::Record {
                name: name.to_string(),
                fields: fields.clone(),
            },
            TypeForm::Union(variants) => Klass::Union {
                name: Some(name.to_string()),
                variants: variants.clone(),
            },
            other => self.klass_from_form(other)?,
        };
        self.types.insert(name.to_string(), klass.clone());
        Ok(klass)
    }

    /// Build a klass from an IR type form without registering it.
    pub fn klass_from_form(&self, form: &TypeForm) -> Result<Klass> {
        match form {
            TypeForm::Reference(name) => self.lookup(name),
            TypeForm::Constant(value) => Ok(Klass::Constant(value.clone())),
            TypeForm::Generic { base, params } => Ok(Klass::Generic {
                base: base.clone(),
                params: params.clone(),
            }),
            TypeForm::Record(fields) => Ok(Klass::Record {
                name: form.render(),
                fields: fields.clone(),
            }),
            TypeForm::Union(variants) => Ok(Klass::Union {
                name: None,
                variants: variants.clone(),
            }),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::new()
    }
}
