//! Built-in operations
//!
//! The fixed, name-keyed table of host operations an Aua program can
//! call. Builtins own the side-effecting edges of the interpreter:
//! terminal I/O, time, randomness, model chat, URL fetching, YAML, file
//! I/O, and source imports.

use std::io::{BufRead, Write};
use std::path::Path;

use aua_core::{AuaError, Document, Result};
use rand::Rng;

use crate::http;
use crate::value::Value;
use crate::vm::Vm;
use crate::yaml;

/// Every builtin, in dispatch order.
const BUILTINS: &[&str] = &[
    "inspect",
    "rand",
    "time",
    "say",
    "ask",
    "chat",
    "see_url",
    "cast",
    "typeof",
    "semantic_fuzzy_eq",
    "size",
    "write_file",
    "list_files",
    "load_yaml",
    "parse_yaml",
    "dump_yaml",
    "import",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

impl Vm {
    pub(crate) fn call_builtin(&mut self, name: &str, args: Vec<Value>) -> Result<Value> {
        match name {
            "inspect" => {
                let [value] = arity(name, args)?;
                Ok(Value::Str(value.inspect()))
            }
            "typeof" => {
                let [value] = arity(name, args)?;
                Ok(Value::Str(value.type_name()))
            }
            "size" => {
                let [value] = arity(name, args)?;
                let size = match value.untag() {
                    Value::List(items) => items.len(),
                    Value::Dict(entries) => entries.len(),
                    Value::Str(s) => s.chars().count(),
                    Value::ObjectLiteral(fields) => fields.borrow().len(),
                    Value::Record(data) => data.fields.len(),
                    other => {
                        return Err(AuaError::Type(format!(
                            "size is not defined for {}",
                            other.type_name()
                        )));
                    }
                };
                Ok(Value::Int(size as i64))
            }
            "rand" => {
                let [bound] = arity(name, args)?;
                match bound.untag() {
                    Value::Int(n) if *n >= 0 => {
                        Ok(Value::Int(rand::thread_rng().gen_range(0..=*n)))
                    }
                    Value::Int(n) => Err(AuaError::Value(format!(
                        "rand bound must be non-negative, got {}",
                        n
                    ))),
                    other => Err(AuaError::Type(format!(
                        "rand expects an Int bound, got {}",
                        other.type_name()
                    ))),
                }
            }
            "time" => {
                // Accepts an optional (ignored) argument.
                if args.len() > 1 {
                    return Err(AuaError::Arity(format!(
                        "time expects 0 or 1 arguments, got {}",
                        args.len()
                    )));
                }
                Ok(Value::Time(std::time::SystemTime::now()))
            }
            "say" => {
                let [value] = arity(name, args)?;
                println!("{}", value.display_string());
                Ok(Value::Nihil)
            }
            "ask" => {
                let [prompt] = arity(name, args)?;
                print!("{}", prompt.display_string());
                std::io::stdout()
                    .flush()
                    .map_err(|e| AuaError::Io(format!("cannot write prompt: {}", e)))?;
                let mut line = String::new();
                let read = std::io::stdin()
                    .lock()
                    .read_line(&mut line)
                    .map_err(|e| AuaError::Io(format!("cannot read from stdin: {}", e)))?;
                if read == 0 {
                    return Err(AuaError::Io("stdin closed".to_string()));
                }
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Ok(Value::Str(line))
            }
            "chat" => {
                let [prompt] = arity(name, args)?;
                let reply = self.client.ask(&prompt.display_string())?;
                Ok(Value::Str(reply))
            }
            "see_url" => {
                let [url] = arity(name, args)?;
                match url.untag() {
                    Value::Str(url) => Ok(Value::Str(http::fetch(url)?)),
                    other => Err(AuaError::Type(format!(
                        "see_url expects a Str, got {}",
                        other.type_name()
                    ))),
                }
            }
            "cast" => {
                let [value, target] = arity(name, args)?;
                match target.untag() {
                    Value::Klass(klass) => {
                        let klass = klass.clone();
                        self.cast_value(value, &klass)
                    }
                    other => Err(AuaError::Type(format!(
                        "cast target must be a type, got {}",
                        other.type_name()
                    ))),
                }
            }
            "semantic_fuzzy_eq" => {
                let [left, right] = arity(name, args)?;
                self.semantic_eq(&left, &right)
            }
            "write_file" => {
                let [path, content] = arity(name, args)?;
                match path.untag() {
                    Value::Str(path) => {
                        std::fs::write(path, content.display_string()).map_err(|e| {
                            AuaError::Io(format!("cannot write '{}': {}", path, e))
                        })?;
                        Ok(Value::Nihil)
                    }
                    other => Err(AuaError::Type(format!(
                        "write_file expects a Str path, got {}",
                        other.type_name()
                    ))),
                }
            }
            "list_files" => {
                let [dir] = arity(name, args)?;
                match dir.untag() {
                    Value::Str(dir) => list_files(dir),
                    other => Err(AuaError::Type(format!(
                        "list_files expects a Str path, got {}",
                        other.type_name()
                    ))),
                }
            }
            "load_yaml" => {
                let [path] = arity(name, args)?;
                match path.untag() {
                    Value::Str(path) => {
                        if !Path::new(path).exists() {
                            return Ok(Value::Nihil);
                        }
                        let text = std::fs::read_to_string(path).map_err(|e| {
                            AuaError::Io(format!("cannot read '{}': {}", path, e))
                        })?;
                        yaml::parse_str(&text)
                    }
                    other => Err(AuaError::Type(format!(
                        "load_yaml expects a Str path, got {}",
                        other.type_name()
                    ))),
                }
            }
            "parse_yaml" => {
                let [text] = arity(name, args)?;
                yaml::parse_str(&text.display_string())
            }
            "dump_yaml" => {
                let [value] = arity(name, args)?;
                Ok(Value::Str(yaml::dump(&value)?))
            }
            "import" => {
                let [path] = arity(name, args)?;
                match path.untag() {
                    Value::Str(path) => {
                        let text = std::fs::read_to_string(path).map_err(|e| {
                            AuaError::Io(format!("cannot import '{}': {}", path, e))
                        })?;
                        let doc = Document::new(path.clone(), text);
                        // Imported code runs in the same global
                        // environment as the importer.
                        self.eval_source(&doc)
                    }
                    other => Err(AuaError::Type(format!(
                        "import expects a Str path, got {}",
                        other.type_name()
                    ))),
                }
            }
            _ => Err(AuaError::Name(format!("unknown builtin '{}'", name))),
        }
    }
}

/// Sorted file names (not directories) in `dir`; a non-existent
/// directory reads as empty.
fn list_files(dir: &str) -> Result<Value> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Value::List(Vec::new()));
        }
        Err(e) => return Err(AuaError::Io(format!("cannot list '{}': {}", dir, e))),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AuaError::Io(format!("cannot list '{}': {}", dir, e)))?;
        let is_file = entry
            .file_type()
            .map_err(|e| AuaError::Io(format!("cannot list '{}': {}", dir, e)))?
            .is_file();
        if is_file {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(Value::List(names.into_iter().map(Value::Str).collect()))
}

fn arity<const N: usize>(name: &str, args: Vec<Value>) -> Result<[Value; N]> {
    let got = args.len();
    args.try_into()
        .map_err(|_| AuaError::Arity(format!("{} expects {} arguments, got {}", name, N, got)))
}
