//! Intermediate representation for the Aua VM
//!
//! Two closed sums cross the boundary between the front end and the
//! runtime: [`TypeForm`], the type shapes shared by the registry and the
//! JSON-schema derivation, and [`Stmt`], the flat instruction vocabulary
//! the VM evaluates. The VM never sees AST nodes.

/// The closed set of type shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeForm {
    /// A name to resolve against the type registry: `Int`, `Point`.
    Reference(String),
    /// A string-literal constant type: `'yes'`.
    Constant(String),
    /// `Base<Param, ...>`.
    Generic {
        base: String,
        params: Vec<TypeForm>,
    },
    /// `{ field: Type, ... }` with declaration order preserved.
    Record(Vec<(String, TypeForm)>),
    /// `A | B | ...`.
    Union(Vec<TypeForm>),
}

impl TypeForm {
    /// Render the form the way it is written in source. Used for type
    /// annotations and `introspect` output.
    pub fn render(&self) -> String {
        match self {
            TypeForm::Reference(name) => name.clone(),
            TypeForm::Constant(value) => format!("'{}'", value),
            TypeForm::Generic { base, params } => {
                let params: Vec<String> = params.iter().map(TypeForm::render).collect();
                format!("{}<{}>", base, params.join(", "))
            }
            TypeForm::Record(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(name, ty)| format!("{}: {}", name, ty.render()))
                    .collect();
                format!("{{ {} }}", fields.join(", "))
            }
            TypeForm::Union(variants) => {
                let variants: Vec<String> = variants.iter().map(TypeForm::render).collect();
                variants.join(" | ")
            }
        }
    }
}

/// One VM instruction. A program is a `Vec<Stmt>` evaluated in order;
/// the value of the last statement is the value of the program.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    // Literals reify directly.
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Nihil,

    /// Bind or rebind a name.
    Let { name: String, rhs: Box<Stmt> },
    /// Read a name.
    Id(String),
    /// Dispatch an operator or named method on a receiver.
    Send {
        receiver: Box<Stmt>,
        method: String,
        args: Vec<Stmt>,
    },
    /// String concatenation of evaluated parts.
    Cat(Vec<Stmt>),
    /// List construction.
    Cons(Vec<Stmt>),
    /// Generative evaluation: the prompt value goes to the model.
    Gen(Box<Stmt>),
    /// Cast `value` to the klass `target` evaluates to.
    Cast {
        value: Box<Stmt>,
        target: Box<Stmt>,
    },
    /// Call a builtin or user function by name.
    Call { name: String, args: Vec<Stmt> },
    If {
        cond: Box<Stmt>,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    While {
        cond: Box<Stmt>,
        body: Vec<Stmt>,
    },
    /// Register a named type.
    TypeDeclaration { name: String, form: TypeForm },
    /// Bind a function value.
    FunctionDefinition {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    ObjectLiteral(Vec<(String, Stmt)>),
    /// Resolve a named klass from the registry.
    LookupType(String),
    /// Resolve a named klass and require it to be a union.
    UnionTypeLookup(String),
    /// Build an anonymous union klass from inline choices.
    DynamicUnionClass(Vec<TypeForm>),
    /// Build a klass from an inline type form (generic, record, union).
    InlineKlass(TypeForm),
    MemberAccess {
        object: Box<Stmt>,
        field: String,
    },
    MemberAssignment {
        object: Box<Stmt>,
        field: String,
        value: Box<Stmt>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_generic_and_union() {
        let form = TypeForm::Generic {
            base: "Dict".to_string(),
            params: vec![
                TypeForm::Reference("Str".to_string()),
                TypeForm::Generic {
                    base: "List".to_string(),
                    params: vec![TypeForm::Reference("Int".to_string())],
                },
            ],
        };
        assert_eq!(form.render(), "Dict<Str, List<Int>>");

        let union = TypeForm::Union(vec![
            TypeForm::Constant("yes".to_string()),
            TypeForm::Constant("no".to_string()),
        ]);
        assert_eq!(union.render(), "'yes' | 'no'");
    }

    #[test]
    fn test_render_record() {
        let form = TypeForm::Record(vec![
            ("x".to_string(), TypeForm::Reference("Int".to_string())),
            ("y".to_string(), TypeForm::Reference("Int".to_string())),
        ]);
        assert_eq!(form.render(), "{ x: Int, y: Int }");
    }
}
