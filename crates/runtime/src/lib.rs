//! Aua Runtime Library
//!
//! Owns everything downstream of the front end: runtime values, lexically
//! scoped environments, the type registry and klasses, JSON-schema
//! derivation, the model client, builtins, and the tree-walking VM.
//!
//! The top-level entry point is [`run`], which wires the whole pipeline:
//!
//! ```rust,no_run
//! let value = aua_runtime::run("x = 5; y = x + 2; y * 3").unwrap();
//! assert_eq!(value, aua_runtime::Value::Int(21));
//! ```
//!
//! Callers that need to control model interaction (tests, embedders)
//! supply their own client through [`run_with_client`].

pub mod builtins;
pub mod chat;
pub mod env;
pub mod http;
pub mod klass;
pub mod registry;
pub mod schema;
pub mod value;
pub mod vm;
pub mod yaml;

pub use chat::{HttpModelClient, ModelClient, ModelConfig, ScriptedClient};
pub use klass::Klass;
pub use registry::TypeRegistry;
pub use value::Value;
pub use vm::Vm;

use std::rc::Rc;

use aua_core::{Document, Result};
use tracing::error;

/// Run a source program with the configured HTTP model client.
pub fn run(source: &str) -> Result<Value> {
    let client = HttpModelClient::from_env()?;
    run_with_client(source, Rc::new(client))
}

/// Run a source program against a caller-supplied model client.
pub fn run_with_client(source: &str, client: Rc<dyn ModelClient>) -> Result<Value> {
    let doc = Document::new("<input>", source);
    let mut vm = Vm::new(client);
    vm.eval_source(&doc).inspect_err(|e| {
        error!(error = %e, "run failed");
    })
}
