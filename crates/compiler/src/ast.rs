//! Abstract Syntax Tree for Aua
//!
//! A uniform tagged-variant tree: every node is a [`Node`] plus the cursor
//! where it began. Type syntax gets its own small tree ([`TypeExpr`]) so
//! the translator can lower it into IR type forms without the VM ever
//! seeing raw type nodes.

use aua_core::Cursor;

/// Binary operators as they appear in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// The VM method name this operator dispatches to.
    pub fn method(&self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
            BinOp::Pow => "pow",
            BinOp::Eq => "eq",
            BinOp::Ne => "ne",
            BinOp::Lt => "lt",
            BinOp::Gt => "gt",
            BinOp::Le => "le",
            BinOp::Ge => "ge",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

/// One piece of a structured (interpolated) string.
#[derive(Debug, Clone, PartialEq)]
pub enum StrPart {
    Lit(String),
    Interp(Ast),
}

/// Type syntax as written in source: references, constants, generics,
/// records, unions.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// A named type: `Int`, `Point`.
    Reference(String),
    /// A string-literal constant type: `'yes'`.
    Constant(String),
    /// `Name<T, ...>`.
    Generic { base: String, params: Vec<TypeExpr> },
    /// `{ field: Type, ... }`.
    Record(Vec<(String, TypeExpr)>),
    /// `A | B | ...`.
    Union(Vec<TypeExpr>),
}

/// The node payload of one AST vertex.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Int(i64),
    Float(f64),
    Bool(bool),
    Nihil,
    /// Single-quoted string.
    SimpleStr(String),
    /// Double-quoted string assembled from parts and interpolations.
    StructuredStr(Vec<StrPart>),
    /// Triple-quoted generative literal, possibly with interpolations.
    StructuredGenLit(Vec<StrPart>),
    Id(String),
    Negate(Box<Ast>),
    Not(Box<Ast>),
    Binop {
        op: BinOp,
        left: Box<Ast>,
        right: Box<Ast>,
    },
    /// `target = value` where target is an identifier or member chain.
    Assign {
        target: Box<Ast>,
        value: Box<Ast>,
    },
    /// Call of a named function/builtin or of a member method.
    Call {
        callee: Box<Ast>,
        args: Vec<Ast>,
    },
    Seq(Vec<Ast>),
    If {
        cond: Box<Ast>,
        then: Box<Ast>,
        otherwise: Option<Box<Ast>>,
    },
    While {
        cond: Box<Ast>,
        body: Box<Ast>,
    },
    TypeDeclaration {
        name: String,
        ty: TypeExpr,
    },
    FunctionDefinition {
        name: String,
        params: Vec<String>,
        body: Box<Ast>,
    },
    ObjectLiteral(Vec<(String, Ast)>),
    ArrayLiteral(Vec<Ast>),
    Member {
        object: Box<Ast>,
        field: String,
    },
    /// `value as Type`.
    CastAs {
        value: Box<Ast>,
        ty: TypeExpr,
    },
    /// `value ~ Type` (union cast).
    CastUnion {
        value: Box<Ast>,
        ty: TypeExpr,
    },
    /// `left ~= right` (model-decided equivalence).
    SemanticEq {
        left: Box<Ast>,
        right: Box<Ast>,
    },
}

/// An AST vertex: node payload plus source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub node: Node,
    pub location: Cursor,
}

impl Ast {
    pub fn new(node: Node, location: Cursor) -> Self {
        Ast { node, location }
    }
}
