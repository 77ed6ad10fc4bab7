//! The Aua virtual machine
//!
//! A tree walker over the IR statement vocabulary. One `Vm` owns the
//! global environment, the type registry, and the model-client handle;
//! evaluation is strictly sequential and side effects happen in source
//! order. The value of the last statement is the value of the program,
//! and the magic binding `_` always holds the most recent top-level
//! value.

use std::cell::RefCell;
use std::rc::Rc;

use aua_compiler::ir::Stmt;
use aua_core::{AuaError, Document, Result};
use tracing::debug;

use crate::builtins;
use crate::chat::ModelClient;
use crate::env::{Env, EnvRef};
use crate::klass::Klass;
use crate::registry::TypeRegistry;
use crate::value::{FunctionData, Value};

pub struct Vm {
    pub(crate) globals: EnvRef,
    pub(crate) registry: TypeRegistry,
    pub(crate) client: Rc<dyn ModelClient>,
}

impl Vm {
    pub fn new(client: Rc<dyn ModelClient>) -> Self {
        let globals = Env::root();
        let registry = TypeRegistry::new();
        // The prelude binds the primitive klasses by name, so `Int` in
        // source resolves to a klass value.
        for name in ["Int", "Float", "Str", "Bool", "Nihil", "List", "Dict"] {
            let klass = registry.get(name).cloned().expect("seeded primitive");
            Env::define(&globals, name, Value::Klass(klass));
        }
        Vm {
            globals,
            registry,
            client,
        }
    }

    /// Compile and evaluate one source document against this VM's
    /// environment. REPL sessions call this repeatedly.
    pub fn eval_source(&mut self, doc: &Document) -> Result<Value> {
        let stmts = aua_compiler::compile(doc)?;
        self.eval_program(&stmts)
    }

    /// Evaluate a program; returns the value of its last statement.
    pub fn eval_program(&mut self, stmts: &[Stmt]) -> Result<Value> {
        let env = Rc::clone(&self.globals);
        let mut last = Value::Nihil;
        for stmt in stmts {
            last = self.eval(stmt, &env)?;
            Env::define(&env, "_", last.clone());
        }
        Ok(last)
    }

    pub(crate) fn eval_block(&mut self, stmts: &[Stmt], env: &EnvRef) -> Result<Value> {
        let mut last = Value::Nihil;
        for stmt in stmts {
            last = self.eval(stmt, env)?;
        }
        Ok(last)
    }

    fn eval(&mut self, stmt: &Stmt, env: &EnvRef) -> Result<Value> {
        match stmt {
            Stmt::Int(n) => Ok(Value::Int(*n)),
            Stmt::Float(x) => Ok(Value::Float(*x)),
            Stmt::Bool(b) => Ok(Value::Bool(*b)),
            Stmt::Str(s) => Ok(Value::Str(s.clone())),
            Stmt::Nihil => Ok(Value::Nihil),

            Stmt::Let { name, rhs } => {
                let value = self.eval(rhs, env)?;
                Env::assign(env, name, value.clone());
                Ok(value)
            }

            Stmt::Id(name) => Env::lookup(env, name)
                .ok_or_else(|| AuaError::Name(format!("undefined variable '{}'", name))),

            Stmt::Send {
                receiver,
                method,
                args,
            } => {
                // Logical operators short-circuit: the right operand only
                // evaluates when the left doesn't decide the answer.
                if method == "and" {
                    let left = self.eval(receiver, env)?;
                    if !left.truthy() {
                        return Ok(Value::Bool(false));
                    }
                    let right = self.eval(&args[0], env)?;
                    return Ok(Value::Bool(right.truthy()));
                }
                if method == "or" {
                    let left = self.eval(receiver, env)?;
                    if left.truthy() {
                        return Ok(Value::Bool(true));
                    }
                    let right = self.eval(&args[0], env)?;
                    return Ok(Value::Bool(right.truthy()));
                }
                let receiver = self.eval(receiver, env)?;
                let args = args
                    .iter()
                    .map(|a| self.eval(a, env))
                    .collect::<Result<Vec<_>>>()?;
                self.dispatch(receiver, method, args)
            }

            Stmt::Cat(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&self.eval(part, env)?.display_string());
                }
                Ok(Value::Str(out))
            }

            Stmt::Cons(elements) => {
                let elements = elements
                    .iter()
                    .map(|e| self.eval(e, env))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::List(elements))
            }

            Stmt::Gen(prompt) => {
                let prompt = self.eval(prompt, env)?.display_string();
                debug!(chars = prompt.len(), "generative literal");
                let reply = self.client.ask(&prompt)?;
                Ok(Value::Str(reply))
            }

            Stmt::Cast { value, target } => {
                let value = self.eval(value, env)?;
                match self.eval(target, env)? {
                    Value::Klass(klass) => self.cast_value(value, &klass),
                    other => Err(AuaError::Type(format!(
                        "cast target must be a type, got {}",
                        other.type_name()
                    ))),
                }
            }

            Stmt::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|a| self.eval(a, env))
                    .collect::<Result<Vec<_>>>()?;
                match Env::lookup(env, name) {
                    Some(Value::Function(function)) => self.call_function(&function, args),
                    _ if builtins::is_builtin(name) => self.call_builtin(name, args),
                    Some(other) => Err(AuaError::Type(format!(
                        "'{}' is a {}, not a function",
                        name,
                        other.type_name()
                    ))),
                    None => Err(AuaError::Name(format!(
                        "unknown function or builtin '{}'",
                        name
                    ))),
                }
            }

            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond, env)?.truthy() {
                    self.eval_block(then, env)
                } else {
                    self.eval_block(otherwise, env)
                }
            }

            Stmt::While { cond, body } => {
                while self.eval(cond, env)?.truthy() {
                    self.eval_block(body, env)?;
                }
                Ok(Value::Nihil)
            }

            Stmt::TypeDeclaration { name, form } => {
                let klass = self.registry.register(name, form)?;
                let value = Value::Klass(klass);
                Env::define(env, name, value.clone());
                Ok(value)
            }

            Stmt::FunctionDefinition { name, params, body } => {
                let function = Value::Function(Rc::new(FunctionData {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    env: Rc::clone(env),
                }));
                // Bound before any call, so the body can refer to itself.
                Env::define(env, name, function.clone());
                Ok(function)
            }

            Stmt::ObjectLiteral(fields) => {
                let mut evaluated = Vec::new();
                for (name, field) in fields {
                    evaluated.push((name.clone(), self.eval(field, env)?));
                }
                Ok(Value::ObjectLiteral(Rc::new(RefCell::new(evaluated))))
            }

            Stmt::LookupType(name) => Ok(Value::Klass(self.registry.lookup(name)?)),

            Stmt::UnionTypeLookup(name) => match self.registry.lookup(name)? {
                klass @ Klass::Union { .. } => Ok(Value::Klass(klass)),
                other => Err(AuaError::Type(format!(
                    "'{}' is not a union type",
                    other.name()
                ))),
            },

            Stmt::DynamicUnionClass(choices) => Ok(Value::Klass(Klass::Union {
                name: None,
                variants: choices.clone(),
            })),

            Stmt::InlineKlass(form) => Ok(Value::Klass(self.registry.klass_from_form(form)?)),

            Stmt::MemberAccess { object, field } => {
                let object = self.eval(object, env)?;
                self.access_member(object, field)
            }

            Stmt::MemberAssignment {
                object,
                field,
                value,
            } => {
                let object = self.eval(object, env)?;
                let value = self.eval(value, env)?;
                self.assign_member(&object, field, value.clone())?;
                Ok(value)
            }
        }
    }

    // ------------------------------------------------------------------
    // Members and methods
    // ------------------------------------------------------------------

    fn access_member(&mut self, object: Value, field: &str) -> Result<Value> {
        match object.untag() {
            Value::Record(data) => {
                if let Some(value) = data.values.borrow().get(field) {
                    return Ok(value.clone());
                }
                Err(AuaError::Value(format!(
                    "record '{}' has no field '{}'",
                    data.type_name, field
                )))
            }
            Value::ObjectLiteral(fields) => {
                if let Some((_, value)) = fields.borrow().iter().find(|(name, _)| name == field) {
                    return Ok(value.clone());
                }
                Err(AuaError::Value(format!("object has no field '{}'", field)))
            }
            Value::Dict(entries) => entries
                .get(field)
                .cloned()
                .ok_or_else(|| AuaError::Value(format!("dict has no key '{}'", field))),
            _ => self.dispatch(object.clone(), field, Vec::new()),
        }
    }

    fn assign_member(&mut self, object: &Value, field: &str, value: Value) -> Result<()> {
        match object.untag() {
            Value::Record(data) => {
                if !data.fields.iter().any(|(name, _)| name == field) {
                    return Err(AuaError::Value(format!(
                        "record '{}' has no field '{}'",
                        data.type_name, field
                    )));
                }
                data.values.borrow_mut().insert(field.to_string(), value);
                Ok(())
            }
            Value::ObjectLiteral(fields) => {
                let mut fields = fields.borrow_mut();
                match fields.iter_mut().find(|(name, _)| name == field) {
                    Some(slot) => slot.1 = value,
                    None => fields.push((field.to_string(), value)),
                }
                Ok(())
            }
            other => Err(AuaError::Type(format!(
                "cannot assign member '{}' on {}",
                field,
                other.type_name()
            ))),
        }
    }

    /// Operator and named-method dispatch, keyed on the receiver's kind.
    pub(crate) fn dispatch(&mut self, receiver: Value, method: &str, args: Vec<Value>) -> Result<Value> {
        match method {
            "add" | "sub" | "mul" | "div" | "pow" => {
                let [arg] = take_args::<1>(method, args)?;
                arithmetic(method, receiver, arg)
            }
            "eq" => {
                let [arg] = take_args::<1>(method, args)?;
                Ok(Value::Bool(receiver == arg))
            }
            "lt" | "gt" | "le" | "ge" => {
                let [arg] = take_args::<1>(method, args)?;
                compare(method, receiver, arg)
            }
            "not" => {
                take_args::<0>(method, args)?;
                Ok(Value::Bool(!receiver.truthy()))
            }
            "negate" => {
                take_args::<0>(method, args)?;
                match receiver.untag() {
                    Value::Int(n) => n
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| AuaError::Value("integer overflow".to_string())),
                    Value::Float(x) => Ok(Value::Float(-x)),
                    other => Err(AuaError::Type(format!(
                        "cannot negate {}",
                        other.type_name()
                    ))),
                }
            }
            "to_s" => {
                take_args::<0>(method, args)?;
                Ok(Value::Str(receiver.display_string()))
            }
            "to_i" => {
                take_args::<0>(method, args)?;
                match receiver.untag() {
                    Value::Int(n) => Ok(Value::Int(*n)),
                    Value::Float(x) => Ok(Value::Int(*x as i64)),
                    Value::Str(s) => s.trim().parse().map(Value::Int).map_err(|_| {
                        AuaError::Value(format!("cannot convert \"{}\" to Int", s))
                    }),
                    other => Err(AuaError::Type(format!(
                        "cannot convert {} to Int",
                        other.type_name()
                    ))),
                }
            }
            _ => Err(AuaError::Name(format!(
                "unknown method '{}' for {}",
                method,
                receiver.type_name()
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    pub(crate) fn call_function(&mut self, function: &FunctionData, args: Vec<Value>) -> Result<Value> {
        if args.len() != function.params.len() {
            return Err(AuaError::Arity(format!(
                "{} expects {} arguments, got {}",
                function.name,
                function.params.len(),
                args.len()
            )));
        }
        // The new frame parents to the captured environment, not the
        // caller's.
        let frame = Env::child(&function.env);
        for (param, arg) in function.params.iter().zip(args) {
            Env::define(&frame, param, arg);
        }
        self.eval_block(&function.body, &frame)
    }

    // ------------------------------------------------------------------
    // Casting
    // ------------------------------------------------------------------

    /// The cast algorithm: derive the schema envelope, build the prompt,
    /// ask the model, parse, construct, and annotate.
    pub(crate) fn cast_value(&mut self, value: Value, klass: &Klass) -> Result<Value> {
        let schema = klass.cast_schema(&self.registry);
        let prompt = cast_prompt(&value, klass);
        debug!(klass = %klass.name(), "cast");
        let reply = self.client.ask_with_schema(&prompt, &schema)?;
        let parsed: serde_json::Value = serde_json::from_str(&reply).map_err(|e| {
            AuaError::Model(format!("schema-constrained reply is not valid JSON: {}", e))
        })?;
        let raw = parsed.get("value").cloned().ok_or_else(|| {
            AuaError::Model("schema-constrained reply is missing the 'value' field".to_string())
        })?;
        let constructed = klass.construct(raw, &self.registry)?;
        match klass {
            Klass::Generic { .. } => Ok(constructed.tagged(klass.name())),
            _ => Ok(constructed),
        }
    }

    /// Model-decided equivalence for `~=`.
    pub(crate) fn semantic_eq(&mut self, left: &Value, right: &Value) -> Result<Value> {
        let schema = serde_json::json!({
            "name": "semantic_fuzzy_eq",
            "schema": {
                "type": "object",
                "properties": {
                    "value": {"type": "boolean"},
                    "reason": {"type": "string"},
                },
                "required": ["value"],
            },
        });
        let prompt = format!(
            "You are an English-language runtime.\n\
             Decide whether these two objects are semantically equivalent.\n\
             The first object is {}.\n\
             The second object is {}.\n\
             Give a short reason and answer.",
            left.inspect(),
            right.inspect()
        );
        let reply = self.client.ask_with_schema(&prompt, &schema)?;
        let parsed: serde_json::Value = serde_json::from_str(&reply).map_err(|e| {
            AuaError::Model(format!("schema-constrained reply is not valid JSON: {}", e))
        })?;
        parsed
            .get("value")
            .and_then(serde_json::Value::as_bool)
            .map(Value::Bool)
            .ok_or_else(|| {
                AuaError::Model("equivalence reply is missing a boolean 'value'".to_string())
            })
    }
}

/// Check builtin/method arity and hand back the arguments as an array.
fn take_args<const N: usize>(what: &str, args: Vec<Value>) -> Result<[Value; N]> {
    let got = args.len();
    args.try_into()
        .map_err(|_| AuaError::Arity(format!("{} expects {} arguments, got {}", what, N, got)))
}

fn arithmetic(op: &str, left: Value, right: Value) -> Result<Value> {
    match (left.untag(), right.untag()) {
        (Value::Int(a), Value::Int(b)) => int_arithmetic(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(match op {
            "add" => a + b,
            "sub" => a - b,
            "mul" => a * b,
            "div" => a / b,
            _ => a.powf(*b),
        })),
        (Value::Str(a), Value::Str(b)) if op == "add" => Ok(Value::Str(format!("{}{}", a, b))),
        (l, r) => Err(AuaError::Type(format!(
            "unsupported operand types for {}: {} and {}",
            op,
            l.type_name(),
            r.type_name()
        ))),
    }
}

fn int_arithmetic(op: &str, a: i64, b: i64) -> Result<Value> {
    let result = match op {
        "add" => a.checked_add(b),
        "sub" => a.checked_sub(b),
        "mul" => a.checked_mul(b),
        "div" => {
            if b == 0 {
                return Err(AuaError::Value("division by zero".to_string()));
            }
            a.checked_div(b)
        }
        _ => {
            if b < 0 {
                return Err(AuaError::Value(format!(
                    "negative exponent {} in integer power",
                    b
                )));
            }
            u32::try_from(b).ok().and_then(|e| a.checked_pow(e))
        }
    };
    result
        .map(Value::Int)
        .ok_or_else(|| AuaError::Value("integer overflow".to_string()))
}

fn compare(op: &str, left: Value, right: Value) -> Result<Value> {
    let ordering = match (left.untag(), right.untag()) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
        (l, r) => {
            return Err(AuaError::Type(format!(
                "unsupported operand types for {}: {} and {}",
                op,
                l.type_name(),
                r.type_name()
            )));
        }
    };
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    Ok(Value::Bool(match op {
        "lt" => ordering.is_lt(),
        "gt" => ordering.is_gt(),
        "le" => ordering.is_le(),
        _ => ordering.is_ge(),
    }))
}

/// Build the prompt for a cast, with type-specific guidance.
fn cast_prompt(value: &Value, klass: &Klass) -> String {
    let mut prompt = format!(
        "You are an English-language runtime.\n\
         Provide a 'translation' of the given object in the requested type {}. \
         Be forgiving and humanizing.\n\
         The object is {}.\n",
        klass.introspect(),
        value.inspect()
    );
    match klass {
        Klass::List => prompt.push_str(
            "Respond with a list of items; split enumerations and comma-separated text into separate items.\n",
        ),
        Klass::Generic { base, .. } if base == "List" => prompt.push_str(
            "Respond with a list of items; split enumerations and comma-separated text into separate items.\n",
        ),
        Klass::Bool => prompt.push_str(
            "Interpret the object conservatively: answer true only for clearly affirmative values.\n",
        ),
        Klass::Int => prompt.push_str(
            "If the object spells a number out in words, answer with its numeral value.\n",
        ),
        Klass::Str => prompt.push_str("Respond with a plain string rendering of the object.\n"),
        Klass::Nihil => prompt.push_str(
            "If the object carries no meaningful content, respond with an empty string.\n",
        ),
        Klass::Union { .. } => {
            prompt.push_str("Choose exactly one of:\n");
            for choice in klass.union_values().unwrap_or_default() {
                prompt.push_str(&format!("- {}\n", choice));
            }
        }
        _ => {}
    }
    prompt
}
