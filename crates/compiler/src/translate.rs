//! AST-to-IR translation
//!
//! Lowers the parser's tree into the VM's flat instruction vocabulary.
//! Arithmetic on two concrete literals of matching type folds to a
//! literal instruction here; everything else becomes a `send` the VM
//! dispatches at runtime. Division by a literal zero is deliberately left
//! unfolded so the runtime raises its value error.

use aua_core::{AuaError, Result};

use crate::ast::{Ast, BinOp, Node, StrPart, TypeExpr};
use crate::ir::{Stmt, TypeForm};

/// Translate a program root (a `Seq`) into a statement list.
pub fn translate_program(ast: &Ast) -> Result<Vec<Stmt>> {
    match &ast.node {
        Node::Seq(stmts) => stmts.iter().map(translate).collect(),
        _ => Ok(vec![translate(ast)?]),
    }
}

/// Translate one AST node into one statement.
pub fn translate(ast: &Ast) -> Result<Stmt> {
    match &ast.node {
        Node::Int(value) => Ok(Stmt::Int(*value)),
        Node::Float(value) => Ok(Stmt::Float(*value)),
        Node::Bool(value) => Ok(Stmt::Bool(*value)),
        Node::Nihil => Ok(Stmt::Nihil),
        Node::SimpleStr(value) => Ok(Stmt::Str(value.clone())),
        Node::Id(name) => Ok(Stmt::Id(name.clone())),

        Node::StructuredStr(parts) => translate_parts(parts).map(|stmts| match stmts {
            Folded::Literal(text) => Stmt::Str(text),
            Folded::Parts(parts) => Stmt::Cat(parts),
        }),
        Node::StructuredGenLit(parts) => {
            let prompt = match translate_parts(parts)? {
                Folded::Literal(text) => Stmt::Str(text),
                Folded::Parts(parts) => Stmt::Cat(parts),
            };
            Ok(Stmt::Gen(Box::new(prompt)))
        }

        Node::Negate(inner) => match translate(inner)? {
            Stmt::Int(n) => Ok(Stmt::Int(-n)),
            Stmt::Float(x) => Ok(Stmt::Float(-x)),
            other => Ok(Stmt::Send {
                receiver: Box::new(other),
                method: "negate".to_string(),
                args: Vec::new(),
            }),
        },
        Node::Not(inner) => Ok(Stmt::Send {
            receiver: Box::new(translate(inner)?),
            method: "not".to_string(),
            args: Vec::new(),
        }),

        Node::Binop { op, left, right } => translate_binop(*op, left, right),

        Node::Assign { target, value } => match &target.node {
            Node::Id(name) => Ok(Stmt::Let {
                name: name.clone(),
                rhs: Box::new(translate(value)?),
            }),
            Node::Member { object, field } => Ok(Stmt::MemberAssignment {
                object: Box::new(translate(object)?),
                field: field.clone(),
                value: Box::new(translate(value)?),
            }),
            _ => Err(AuaError::Type(
                "invalid assignment target".to_string(),
            )),
        },

        Node::Call { callee, args } => {
            let args = args.iter().map(translate).collect::<Result<Vec<_>>>()?;
            match &callee.node {
                Node::Id(name) => Ok(Stmt::Call {
                    name: name.clone(),
                    args,
                }),
                Node::Member { object, field } => Ok(Stmt::Send {
                    receiver: Box::new(translate(object)?),
                    method: field.clone(),
                    args,
                }),
                _ => Err(AuaError::Type(
                    "only named functions and methods can be called".to_string(),
                )),
            }
        }

        Node::Seq(stmts) => {
            // A bare sequence in expression position evaluates each
            // statement; the VM wraps it as an `if true` block.
            let body = stmts.iter().map(translate).collect::<Result<Vec<_>>>()?;
            Ok(Stmt::If {
                cond: Box::new(Stmt::Bool(true)),
                then: body,
                otherwise: Vec::new(),
            })
        }

        Node::If {
            cond,
            then,
            otherwise,
        } => Ok(Stmt::If {
            cond: Box::new(translate(cond)?),
            then: translate_block(then)?,
            otherwise: match otherwise {
                Some(branch) => translate_block(branch)?,
                None => Vec::new(),
            },
        }),

        Node::While { cond, body } => Ok(Stmt::While {
            cond: Box::new(translate(cond)?),
            body: translate_block(body)?,
        }),

        Node::TypeDeclaration { name, ty } => Ok(Stmt::TypeDeclaration {
            name: name.clone(),
            form: lower_type(ty),
        }),

        Node::FunctionDefinition { name, params, body } => Ok(Stmt::FunctionDefinition {
            name: name.clone(),
            params: params.clone(),
            body: translate_block(body)?,
        }),

        Node::ObjectLiteral(fields) => {
            let fields = fields
                .iter()
                .map(|(name, value)| Ok((name.clone(), translate(value)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Stmt::ObjectLiteral(fields))
        }

        Node::ArrayLiteral(elements) => {
            let elements = elements.iter().map(translate).collect::<Result<Vec<_>>>()?;
            Ok(Stmt::Cons(elements))
        }

        Node::Member { object, field } => Ok(Stmt::MemberAccess {
            object: Box::new(translate(object)?),
            field: field.clone(),
        }),

        Node::CastAs { value, ty } => {
            let target = match ty {
                TypeExpr::Reference(name) => Stmt::LookupType(name.clone()),
                other => Stmt::InlineKlass(lower_type(other)),
            };
            Ok(Stmt::Cast {
                value: Box::new(translate(value)?),
                target: Box::new(target),
            })
        }

        Node::CastUnion { value, ty } => {
            let target = match ty {
                TypeExpr::Union(variants) => {
                    Stmt::DynamicUnionClass(variants.iter().map(lower_type).collect())
                }
                TypeExpr::Reference(name) => Stmt::UnionTypeLookup(name.clone()),
                other => {
                    return Err(AuaError::Type(format!(
                        "union cast requires a union or a named type, got {}",
                        lower_type(other).render()
                    )));
                }
            };
            Ok(Stmt::Cast {
                value: Box::new(translate(value)?),
                target: Box::new(target),
            })
        }

        Node::SemanticEq { left, right } => Ok(Stmt::Call {
            name: "semantic_fuzzy_eq".to_string(),
            args: vec![translate(left)?, translate(right)?],
        }),
    }
}

/// Translate a branch body: a `Seq` flattens, anything else is a
/// one-statement block.
fn translate_block(ast: &Ast) -> Result<Vec<Stmt>> {
    match &ast.node {
        Node::Seq(stmts) => stmts.iter().map(translate).collect(),
        _ => Ok(vec![translate(ast)?]),
    }
}

enum Folded {
    Literal(String),
    Parts(Vec<Stmt>),
}

fn translate_parts(parts: &[StrPart]) -> Result<Folded> {
    if parts.iter().all(|p| matches!(p, StrPart::Lit(_))) {
        let mut text = String::new();
        for part in parts {
            if let StrPart::Lit(lit) = part {
                text.push_str(lit);
            }
        }
        return Ok(Folded::Literal(text));
    }
    let mut stmts = Vec::new();
    for part in parts {
        match part {
            StrPart::Lit(lit) => stmts.push(Stmt::Str(lit.clone())),
            StrPart::Interp(expr) => stmts.push(translate(expr)?),
        }
    }
    Ok(Folded::Parts(stmts))
}

fn translate_binop(op: BinOp, left: &Ast, right: &Ast) -> Result<Stmt> {
    let left = translate(left)?;
    let right = translate(right)?;

    if let Some(folded) = fold(op, &left, &right) {
        return Ok(folded);
    }

    if op == BinOp::Ne {
        // a != b is not(a == b)
        let eq = Stmt::Send {
            receiver: Box::new(left),
            method: "eq".to_string(),
            args: vec![right],
        };
        return Ok(Stmt::Send {
            receiver: Box::new(eq),
            method: "not".to_string(),
            args: Vec::new(),
        });
    }

    Ok(Stmt::Send {
        receiver: Box::new(left),
        method: op.method().to_string(),
        args: vec![right],
    })
}

/// Fold arithmetic on two concrete literals of matching type. Folding
/// never hides a runtime error: division by zero, overflow, and negative
/// exponents stay unfolded for the VM to reject.
fn fold(op: BinOp, left: &Stmt, right: &Stmt) -> Option<Stmt> {
    match (left, right) {
        (Stmt::Int(a), Stmt::Int(b)) => {
            let folded = match op {
                BinOp::Add => a.checked_add(*b),
                BinOp::Sub => a.checked_sub(*b),
                BinOp::Mul => a.checked_mul(*b),
                BinOp::Div if *b != 0 => a.checked_div(*b),
                BinOp::Pow if *b >= 0 => u32::try_from(*b).ok().and_then(|e| a.checked_pow(e)),
                _ => None,
            };
            folded.map(Stmt::Int)
        }
        (Stmt::Float(a), Stmt::Float(b)) => match op {
            BinOp::Add => Some(Stmt::Float(a + b)),
            BinOp::Sub => Some(Stmt::Float(a - b)),
            BinOp::Mul => Some(Stmt::Float(a * b)),
            BinOp::Div => Some(Stmt::Float(a / b)),
            BinOp::Pow => Some(Stmt::Float(a.powf(*b))),
            _ => None,
        },
        (Stmt::Str(a), Stmt::Str(b)) if op == BinOp::Add => Some(Stmt::Str(format!("{}{}", a, b))),
        _ => None,
    }
}

fn lower_type(ty: &TypeExpr) -> TypeForm {
    match ty {
        TypeExpr::Reference(name) => TypeForm::Reference(name.clone()),
        TypeExpr::Constant(value) => TypeForm::Constant(value.clone()),
        TypeExpr::Generic { base, params } => TypeForm::Generic {
            base: base.clone(),
            params: params.iter().map(lower_type).collect(),
        },
        TypeExpr::Record(fields) => TypeForm::Record(
            fields
                .iter()
                .map(|(name, ty)| (name.clone(), lower_type(ty)))
                .collect(),
        ),
        TypeExpr::Union(variants) => TypeForm::Union(variants.iter().map(lower_type).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use aua_core::Document;

    fn lower(source: &str) -> Vec<Stmt> {
        let doc = Document::new("test", source);
        let ast = Parser::parse_document(&doc).unwrap();
        translate_program(&ast).unwrap()
    }

    #[test]
    fn test_concrete_arithmetic_folds() {
        assert_eq!(lower("1 + 2"), vec![Stmt::Int(3)]);
        assert_eq!(lower("2 ** 10"), vec![Stmt::Int(1024)]);
        assert_eq!(lower("'a' + 'b'"), vec![Stmt::Str("ab".to_string())]);
    }

    #[test]
    fn test_division_by_literal_zero_stays_unfolded() {
        match &lower("1 / 0")[0] {
            Stmt::Send { method, .. } => assert_eq!(method, "div"),
            other => panic!("expected send, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_numeric_operands_stay_unfolded() {
        assert!(matches!(lower("1 + 2.0")[0], Stmt::Send { .. }));
    }

    #[test]
    fn test_assignment_lowers_to_let() {
        match &lower("x = 5")[0] {
            Stmt::Let { name, rhs } => {
                assert_eq!(name, "x");
                assert_eq!(**rhs, Stmt::Int(5));
            }
            other => panic!("expected let, got {:?}", other),
        }
    }

    #[test]
    fn test_member_assignment_lowers() {
        assert!(matches!(
            lower("p.x = 9")[0],
            Stmt::MemberAssignment { .. }
        ));
    }

    #[test]
    fn test_ne_lowers_to_not_eq() {
        match &lower("a != b")[0] {
            Stmt::Send { receiver, method, .. } => {
                assert_eq!(method, "not");
                assert!(matches!(
                    &**receiver,
                    Stmt::Send { method, .. } if method == "eq"
                ));
            }
            other => panic!("expected send, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_interpolated_string_folds_to_str() {
        assert_eq!(lower("\"hello\""), vec![Stmt::Str("hello".to_string())]);
    }

    #[test]
    fn test_interpolated_string_lowers_to_cat() {
        match &lower("\"hi ${name}!\"")[0] {
            Stmt::Cat(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[1], Stmt::Id("name".to_string()));
            }
            other => panic!("expected cat, got {:?}", other),
        }
    }

    #[test]
    fn test_generative_literal_lowers_to_gen() {
        assert_eq!(
            lower("\"\"\"a haiku\"\"\""),
            vec![Stmt::Gen(Box::new(Stmt::Str("a haiku".to_string())))]
        );
        match &lower("\"\"\"about ${topic}\"\"\"")[0] {
            Stmt::Gen(prompt) => assert!(matches!(&**prompt, Stmt::Cat(_))),
            other => panic!("expected gen, got {:?}", other),
        }
    }

    #[test]
    fn test_named_cast_defers_type_lookup() {
        match &lower("x as Point")[0] {
            Stmt::Cast { target, .. } => {
                assert_eq!(**target, Stmt::LookupType("Point".to_string()));
            }
            other => panic!("expected cast, got {:?}", other),
        }
    }

    #[test]
    fn test_inline_generic_cast_builds_klass_inline() {
        match &lower("x as List<Int>")[0] {
            Stmt::Cast { target, .. } => {
                assert!(matches!(**target, Stmt::InlineKlass(_)));
            }
            other => panic!("expected cast, got {:?}", other),
        }
    }

    #[test]
    fn test_union_cast_lowers_to_dynamic_union() {
        match &lower("x ~ 'a' | 'b'")[0] {
            Stmt::Cast { target, .. } => match &**target {
                Stmt::DynamicUnionClass(choices) => assert_eq!(choices.len(), 2),
                other => panic!("expected dynamic union, got {:?}", other),
            },
            other => panic!("expected cast, got {:?}", other),
        }
        match &lower("x ~ YesNo")[0] {
            Stmt::Cast { target, .. } => {
                assert_eq!(**target, Stmt::UnionTypeLookup("YesNo".to_string()));
            }
            other => panic!("expected cast, got {:?}", other),
        }
    }

    #[test]
    fn test_semantic_eq_lowers_to_builtin_call() {
        match &lower("a ~= b")[0] {
            Stmt::Call { name, args } => {
                assert_eq!(name, "semantic_fuzzy_eq");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_function_definition_carries_params_and_body() {
        match &lower("fun add(a, b) a + b end")[0] {
            Stmt::FunctionDefinition { name, params, body } => {
                assert_eq!(name, "add");
                assert_eq!(params, &["a".to_string(), "b".to_string()]);
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected function definition, got {:?}", other),
        }
    }
}
