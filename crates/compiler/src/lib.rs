//! Aua Compiler Library
//!
//! Front end of the Aua interpreter: turns source text into the flat
//! statement vocabulary the virtual machine executes.
//!
//! Pipeline: source text -> [`Lexer`] -> tokens -> [`Parser`] -> AST ->
//! [`translate_program`] -> IR statements.
//!
//! ```rust
//! use aua_core::Document;
//! use aua_compiler::compile;
//!
//! let doc = Document::new("<input>", "x = 5; x + 2");
//! let stmts = compile(&doc).unwrap();
//! assert_eq!(stmts.len(), 2);
//! ```

pub mod ast;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod translate;

pub use ast::{Ast, BinOp, Node, StrPart, TypeExpr};
pub use ir::{Stmt, TypeForm};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenKind};
pub use translate::{translate, translate_program};

use aua_core::{Document, Result};
use tracing::debug;

/// Compile a source document all the way to VM statements.
pub fn compile(doc: &Document) -> Result<Vec<Stmt>> {
    let tokens = Lexer::new(doc).tokenize()?;
    debug!(document = doc.name(), tokens = tokens.len(), "lexed");
    let ast = Parser::new(doc, tokens).parse()?;
    debug!(document = doc.name(), "parsed");
    let stmts = translate_program(&ast)?;
    debug!(document = doc.name(), statements = stmts.len(), "translated");
    Ok(stmts)
}
