//! Lexically scoped environments
//!
//! A chain of frames with parent links. Lookups walk outward. Assignment
//! updates the innermost frame that already binds the name, else binds in
//! the current frame. Function calls push a frame whose parent is the
//! function's captured environment, not the caller's.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

pub type EnvRef = Rc<RefCell<Env>>;

pub struct Env {
    vars: HashMap<String, Value>,
    parent: Option<EnvRef>,
}

impl Env {
    /// The outermost frame.
    pub fn root() -> EnvRef {
        Rc::new(RefCell::new(Env {
            vars: HashMap::new(),
            parent: None,
        }))
    }

    /// Push a new frame under `parent`.
    pub fn child(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Env {
            vars: HashMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    /// Bind in this frame, shadowing any outer binding of the same name.
    pub fn define(env: &EnvRef, name: impl Into<String>, value: Value) {
        env.borrow_mut().vars.insert(name.into(), value);
    }

    /// Assign: update the innermost frame that already binds `name`, else
    /// bind in this frame.
    pub fn assign(env: &EnvRef, name: &str, value: Value) {
        let mut frame = Rc::clone(env);
        loop {
            if frame.borrow().vars.contains_key(name) {
                frame.borrow_mut().vars.insert(name.to_string(), value);
                return;
            }
            let parent = frame.borrow().parent.clone();
            match parent {
                Some(next) => frame = next,
                None => break,
            }
        }
        env.borrow_mut().vars.insert(name.to_string(), value);
    }

    /// Look a name up through the chain.
    pub fn lookup(env: &EnvRef, name: &str) -> Option<Value> {
        let mut frame = Rc::clone(env);
        loop {
            if let Some(value) = frame.borrow().vars.get(name) {
                return Some(value.clone());
            }
            let parent = frame.borrow().parent.clone();
            match parent {
                Some(next) => frame = next,
                None => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outward() {
        let root = Env::root();
        Env::define(&root, "x", Value::Int(1));
        let inner = Env::child(&root);
        assert_eq!(Env::lookup(&inner, "x"), Some(Value::Int(1)));
        assert_eq!(Env::lookup(&inner, "y"), None);
    }

    #[test]
    fn test_assign_updates_enclosing_binding() {
        let root = Env::root();
        Env::define(&root, "x", Value::Int(1));
        let inner = Env::child(&root);
        Env::assign(&inner, "x", Value::Int(2));
        assert_eq!(Env::lookup(&root, "x"), Some(Value::Int(2)));
    }

    #[test]
    fn test_assign_unbound_binds_in_current_frame() {
        let root = Env::root();
        let inner = Env::child(&root);
        Env::assign(&inner, "local", Value::Int(3));
        assert_eq!(Env::lookup(&inner, "local"), Some(Value::Int(3)));
        assert_eq!(Env::lookup(&root, "local"), None);
    }

    #[test]
    fn test_define_shadows_outer_binding() {
        let root = Env::root();
        Env::define(&root, "x", Value::Int(1));
        let inner = Env::child(&root);
        Env::define(&inner, "x", Value::Int(9));
        assert_eq!(Env::lookup(&inner, "x"), Some(Value::Int(9)));
        assert_eq!(Env::lookup(&root, "x"), Some(Value::Int(1)));
    }
}
