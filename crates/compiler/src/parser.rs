//! Recursive-descent parser for Aua
//!
//! Statements are expressions; a program is a sequence of them separated
//! by newlines or `;`. Binary operators are parsed by precedence climbing
//! (loosest to tightest): cast (`as`, `~`), `||`, `&&`, comparisons and
//! `~=`, additive, multiplicative, `**` (right-associative), unary,
//! postfix (member access and calls), primary.
//!
//! There is no error recovery: the first error is reported with a
//! cursor-indicated context window and parsing aborts.

use aua_core::{AuaError, Cursor, Document, Result};

use crate::ast::{Ast, BinOp, Node, StrPart, TypeExpr};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

pub struct Parser<'a> {
    doc: &'a Document,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(doc: &'a Document, tokens: Vec<Token>) -> Self {
        Parser {
            doc,
            tokens,
            pos: 0,
        }
    }

    /// Lex and parse a whole document.
    pub fn parse_document(doc: &'a Document) -> Result<Ast> {
        let tokens = Lexer::new(doc).tokenize()?;
        Parser::new(doc, tokens).parse()
    }

    /// Parse a program: a `Seq` of statements.
    pub fn parse(&mut self) -> Result<Ast> {
        let start = self.location();
        let mut stmts = Vec::new();
        loop {
            self.skip_eos();
            if self.check(&TokenKind::Eof) {
                break;
            }
            stmts.push(self.parse_statement()?);
        }
        Ok(Ast::new(Node::Seq(stmts), start))
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        // The token stream always ends with Eof, so the last token is a
        // safe fallback.
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("token stream ends with Eof"))
    }

    fn location(&self) -> Cursor {
        self.peek().location
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn consume_if(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_eos(&mut self) {
        while self.check(&TokenKind::Eos) {
            self.advance();
        }
    }

    fn error_at(&self, message: &str, at: Cursor) -> AuaError {
        AuaError::Parse(self.doc.diagnostic(message, at, None))
    }

    fn unexpected(&self, expected: &str) -> AuaError {
        let token = self.peek();
        self.error_at(
            &format!("expected {}, got {}", expected, token.kind.describe()),
            token.location,
        )
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_id(&mut self, expected: &str) -> Result<(String, Cursor)> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Id(name) => {
                self.advance();
                Ok((name, token.location))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self) -> Result<Ast> {
        match self.peek().kind {
            TokenKind::Type => self.parse_type_declaration(),
            TokenKind::Fun => self.parse_function_definition(),
            _ => self.parse_expression_statement(),
        }
    }

    /// Expression, assignment, or command call.
    fn parse_expression_statement(&mut self) -> Result<Ast> {
        let expr = self.parse_expr()?;

        if self.check(&TokenKind::Assign) {
            let eq_at = self.location();
            self.advance();
            match expr.node {
                Node::Id(_) | Node::Member { .. } => {}
                _ => {
                    return Err(self.error_at(
                        "invalid assignment target: expected identifier or member access",
                        eq_at,
                    ));
                }
            }
            let location = expr.location;
            // The right-hand side may itself be a command call or another
            // assignment.
            let value = self.parse_expression_statement()?;
            return Ok(Ast::new(
                Node::Assign {
                    target: Box::new(expr),
                    value: Box::new(value),
                },
                location,
            ));
        }

        // Command call: a bare identifier followed by something that can
        // start an argument. `say "hi"` calls; a lone `say` is a read.
        if let Node::Id(_) = expr.node {
            if self.starts_command_argument() {
                let location = expr.location;
                let args = self.parse_command_arguments()?;
                return Ok(Ast::new(
                    Node::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    location,
                ));
            }
        }

        Ok(expr)
    }

    fn starts_command_argument(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Bool(_)
                | TokenKind::Nihil
                | TokenKind::SimpleStr(_)
                | TokenKind::StrStart
                | TokenKind::GenLit(_)
                | TokenKind::Id(_)
                | TokenKind::LBracket
                | TokenKind::LBrace
        )
    }

    /// Arguments run until an end-of-statement boundary; commas separate.
    fn parse_command_arguments(&mut self) -> Result<Vec<Ast>> {
        let mut args = vec![self.parse_expr()?];
        while self.consume_if(&TokenKind::Comma) {
            args.push(self.parse_expr()?);
        }
        Ok(args)
    }

    fn parse_type_declaration(&mut self) -> Result<Ast> {
        let start = self.location();
        self.advance(); // type
        let (name, _) = self.expect_id("type name after 'type'")?;
        self.expect(&TokenKind::Assign, "'=' after type name")?;
        let ty = self.parse_type_expr()?;
        Ok(Ast::new(Node::TypeDeclaration { name, ty }, start))
    }

    fn parse_function_definition(&mut self) -> Result<Ast> {
        let start = self.location();
        self.advance(); // fun
        let (name, _) = self.expect_id("function name after 'fun'")?;
        self.expect(&TokenKind::LParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let (param, _) = self.expect_id("parameter name")?;
                params.push(param);
                if !self.consume_if(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "')' after parameters")?;
        let body = self.parse_block(&[TokenKind::End])?;
        self.expect(&TokenKind::End, "'end' to close function definition")?;
        Ok(Ast::new(
            Node::FunctionDefinition {
                name,
                params,
                body: Box::new(body),
            },
            start,
        ))
    }

    /// Statements until one of `terminators` (or end of input, which the
    /// caller turns into a diagnostic by expecting its terminator).
    fn parse_block(&mut self, terminators: &[TokenKind]) -> Result<Ast> {
        let start = self.location();
        let mut stmts = Vec::new();
        loop {
            self.skip_eos();
            if self.check(&TokenKind::Eof) || terminators.iter().any(|t| self.check(t)) {
                break;
            }
            stmts.push(self.parse_statement()?);
        }
        Ok(Ast::new(Node::Seq(stmts), start))
    }

    // ------------------------------------------------------------------
    // Expressions, loosest first
    // ------------------------------------------------------------------

    fn parse_expr(&mut self) -> Result<Ast> {
        self.parse_cast()
    }

    fn parse_cast(&mut self) -> Result<Ast> {
        let mut left = self.parse_or()?;
        loop {
            if self.check(&TokenKind::As) {
                self.advance();
                let ty = self.parse_type_expr()?;
                let location = left.location;
                left = Ast::new(
                    Node::CastAs {
                        value: Box::new(left),
                        ty,
                    },
                    location,
                );
            } else if self.check(&TokenKind::Tilde) {
                self.advance();
                let ty = self.parse_type_expr()?;
                let location = left.location;
                left = Ast::new(
                    Node::CastUnion {
                        value: Box::new(left),
                        ty,
                    },
                    location,
                );
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_or(&mut self) -> Result<Ast> {
        let mut left = self.parse_and()?;
        while self.consume_if(&TokenKind::OrOr) {
            let right = self.parse_and()?;
            left = binop(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Ast> {
        let mut left = self.parse_comparison()?;
        while self.consume_if(&TokenKind::AndAnd) {
            let right = self.parse_comparison()?;
            left = binop(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Ast> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Eq => Some(BinOp::Eq),
                TokenKind::Ne => Some(BinOp::Ne),
                TokenKind::Lt => Some(BinOp::Lt),
                TokenKind::Gt => Some(BinOp::Gt),
                TokenKind::Le => Some(BinOp::Le),
                TokenKind::Ge => Some(BinOp::Ge),
                TokenKind::TildeEq => None,
                _ => return Ok(left),
            };
            match op {
                Some(op) => {
                    self.advance();
                    let right = self.parse_additive()?;
                    left = binop(op, left, right);
                }
                None => {
                    // `~=` asks the model whether the operands are
                    // semantically equivalent.
                    self.advance();
                    let right = self.parse_additive()?;
                    let location = left.location;
                    left = Ast::new(
                        Node::SemanticEq {
                            left: Box::new(left),
                            right: Box::new(right),
                        },
                        location,
                    );
                }
            }
        }
    }

    fn parse_additive(&mut self) -> Result<Ast> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binop(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Ast> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_power()?;
            left = binop(op, left, right);
        }
    }

    fn parse_power(&mut self) -> Result<Ast> {
        let base = self.parse_unary()?;
        if self.consume_if(&TokenKind::StarStar) {
            // Right-associative: 2 ** 3 ** 2 is 2 ** (3 ** 2).
            let exponent = self.parse_power()?;
            return Ok(binop(BinOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Ast> {
        let start = self.location();
        if self.consume_if(&TokenKind::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Ast::new(Node::Negate(Box::new(operand)), start));
        }
        if self.consume_if(&TokenKind::Bang) {
            let operand = self.parse_unary()?;
            return Ok(Ast::new(Node::Not(Box::new(operand)), start));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Ast> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check(&TokenKind::Dot) {
                self.advance();
                let (field, field_at) = self.expect_id("member name after '.'")?;
                let location = expr.location;
                let member = Ast::new(
                    Node::Member {
                        object: Box::new(expr),
                        field,
                    },
                    location,
                );
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_paren_arguments()?;
                    expr = Ast::new(
                        Node::Call {
                            callee: Box::new(member),
                            args,
                        },
                        field_at,
                    );
                } else {
                    expr = member;
                }
            } else if self.check(&TokenKind::LParen) {
                let location = expr.location;
                let args = self.parse_paren_arguments()?;
                expr = Ast::new(
                    Node::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    location,
                );
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_paren_arguments(&mut self) -> Result<Vec<Ast>> {
        self.expect(&TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.consume_if(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "')' to close argument list")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Ast> {
        let token = self.peek().clone();
        let at = token.location;
        match token.kind {
            TokenKind::Int(value) => {
                self.advance();
                Ok(Ast::new(Node::Int(value), at))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Ast::new(Node::Float(value), at))
            }
            TokenKind::Bool(value) => {
                self.advance();
                Ok(Ast::new(Node::Bool(value), at))
            }
            TokenKind::Nihil => {
                self.advance();
                Ok(Ast::new(Node::Nihil, at))
            }
            TokenKind::SimpleStr(value) => {
                self.advance();
                Ok(Ast::new(Node::SimpleStr(value), at))
            }
            TokenKind::Id(name) => {
                self.advance();
                Ok(Ast::new(Node::Id(name), at))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')' to close '('")?;
                Ok(inner)
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::StrStart => self.parse_structured_string(),
            TokenKind::GenLit(payload) => {
                self.advance();
                self.parse_generative(&payload, at)
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Ast> {
        let start = self.location();
        self.advance(); // [
        let mut elements = Vec::new();
        self.skip_eos();
        if !self.check(&TokenKind::RBracket) {
            loop {
                elements.push(self.parse_expr()?);
                self.skip_eos();
                if !self.consume_if(&TokenKind::Comma) {
                    break;
                }
                self.skip_eos();
            }
        }
        self.expect(&TokenKind::RBracket, "']' to close array literal")?;
        Ok(Ast::new(Node::ArrayLiteral(elements), start))
    }

    fn parse_object_literal(&mut self) -> Result<Ast> {
        let start = self.location();
        self.advance(); // {
        let mut fields = Vec::new();
        self.skip_eos();
        if !self.check(&TokenKind::RBrace) {
            loop {
                let (name, _) = self.expect_id("field name")?;
                self.expect(&TokenKind::Colon, "':' after field name")?;
                fields.push((name, self.parse_expr()?));
                self.skip_eos();
                if !self.consume_if(&TokenKind::Comma) {
                    break;
                }
                self.skip_eos();
            }
        }
        self.expect(&TokenKind::RBrace, "'}' to close object literal")?;
        Ok(Ast::new(Node::ObjectLiteral(fields), start))
    }

    fn parse_structured_string(&mut self) -> Result<Ast> {
        let start = self.location();
        self.advance(); // str-start
        let mut parts = Vec::new();
        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::StrPart(text) => {
                    self.advance();
                    parts.push(StrPart::Lit(text));
                }
                TokenKind::InterpStart => {
                    self.advance();
                    let expr = self.parse_expression_statement()?;
                    self.expect(&TokenKind::InterpEnd, "'}' to close interpolation")?;
                    parts.push(StrPart::Interp(expr));
                }
                TokenKind::StrEnd => {
                    self.advance();
                    return Ok(Ast::new(Node::StructuredStr(parts), start));
                }
                _ => return Err(self.unexpected("string content")),
            }
        }
    }

    /// A generative literal is captured verbatim by the lexer; when the
    /// payload contains `${...}`, each interpolation source is parsed as
    /// its own expression so the prompt is assembled at runtime.
    fn parse_generative(&mut self, payload: &str, at: Cursor) -> Result<Ast> {
        let mut parts = Vec::new();
        let mut rest = payload;
        while let Some(open) = rest.find("${") {
            if open > 0 {
                parts.push(StrPart::Lit(rest[..open].to_string()));
            }
            let body = &rest[open + 2..];
            let close = matching_brace(body).ok_or_else(|| {
                self.error_at("unterminated interpolation in generative literal", at)
            })?;
            let source = &body[..close];
            parts.push(StrPart::Interp(self.parse_fragment(source, at)?));
            rest = &body[close + 1..];
        }
        if !rest.is_empty() || parts.is_empty() {
            parts.push(StrPart::Lit(rest.to_string()));
        }
        Ok(Ast::new(Node::StructuredGenLit(parts), at))
    }

    /// Parse one embedded expression from a generative-literal payload.
    fn parse_fragment(&mut self, source: &str, at: Cursor) -> Result<Ast> {
        let doc = Document::new(format!("{}:generative", self.doc.name()), source);
        let tokens = Lexer::new(&doc).tokenize()?;
        let mut sub = Parser::new(&doc, tokens);
        let expr = sub.parse_expression_statement()?;
        sub.skip_eos();
        if !sub.check(&TokenKind::Eof) {
            return Err(self.error_at(
                &format!("trailing input after interpolated expression '{}'", source),
                at,
            ));
        }
        Ok(expr)
    }

    fn parse_if(&mut self) -> Result<Ast> {
        let start = self.location();
        self.advance(); // if
        self.parse_if_tail(start)
    }

    /// Everything after the `if`/`elif` keyword: condition plus branches.
    fn parse_if_tail(&mut self, start: Cursor) -> Result<Ast> {
        let cond = self.parse_expr()?;

        if self.consume_if(&TokenKind::Then) {
            if !self.check(&TokenKind::Eos) {
                // Ternary form: if cond then a else b
                let then = self.parse_statement()?;
                let otherwise = if self.consume_if(&TokenKind::Else) {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                // A trailing `end` is accepted so the ternary form reads
                // well inside block bodies.
                self.consume_if(&TokenKind::End);
                return Ok(Ast::new(
                    Node::If {
                        cond: Box::new(cond),
                        then: Box::new(then),
                        otherwise,
                    },
                    start,
                ));
            }
        }

        // Block form: statements until elif/else/end.
        let then = self.parse_block(&[TokenKind::Elif, TokenKind::Else, TokenKind::End])?;
        let otherwise = if self.check(&TokenKind::Elif) {
            let elif_at = self.location();
            self.advance();
            Some(Box::new(self.parse_if_tail(elif_at)?))
        } else if self.consume_if(&TokenKind::Else) {
            let body = self.parse_block(&[TokenKind::End])?;
            self.expect(&TokenKind::End, "'end' to close 'if'")?;
            Some(Box::new(body))
        } else {
            self.expect(&TokenKind::End, "'end' to close 'if'")?;
            None
        };
        Ok(Ast::new(
            Node::If {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise,
            },
            start,
        ))
    }

    fn parse_while(&mut self) -> Result<Ast> {
        let start = self.location();
        self.advance(); // while
        let cond = self.parse_expr()?;
        let body = self.parse_block(&[TokenKind::End])?;
        self.expect(&TokenKind::End, "'end' to close 'while'")?;
        Ok(Ast::new(
            Node::While {
                cond: Box::new(cond),
                body: Box::new(body),
            },
            start,
        ))
    }

    // ------------------------------------------------------------------
    // Type expressions
    // ------------------------------------------------------------------

    fn parse_type_expr(&mut self) -> Result<TypeExpr> {
        let first = self.parse_type_base()?;
        if !self.check(&TokenKind::Pipe) {
            return Ok(first);
        }
        let mut variants = vec![first];
        while self.consume_if(&TokenKind::Pipe) {
            variants.push(self.parse_type_base()?);
        }
        Ok(TypeExpr::Union(variants))
    }

    fn parse_type_base(&mut self) -> Result<TypeExpr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::SimpleStr(value) => {
                self.advance();
                Ok(TypeExpr::Constant(value))
            }
            TokenKind::StrStart => {
                // A quoted fragment used as a constant type.
                self.advance();
                let value = match self.peek().kind.clone() {
                    TokenKind::StrPart(text) => {
                        self.advance();
                        text
                    }
                    TokenKind::StrEnd => String::new(),
                    TokenKind::InterpStart => {
                        return Err(self.error_at(
                            "interpolation is not allowed in a type constant",
                            token.location,
                        ));
                    }
                    _ => return Err(self.unexpected("string content")),
                };
                self.expect(&TokenKind::StrEnd, "'\"' to close type constant")?;
                Ok(TypeExpr::Constant(value))
            }
            TokenKind::Id(name) => {
                self.advance();
                if self.consume_if(&TokenKind::Lt) {
                    let mut params = vec![self.parse_type_expr()?];
                    while self.consume_if(&TokenKind::Comma) {
                        params.push(self.parse_type_expr()?);
                    }
                    self.expect(&TokenKind::Gt, "'>' to close type parameters")?;
                    Ok(TypeExpr::Generic { base: name, params })
                } else {
                    Ok(TypeExpr::Reference(name))
                }
            }
            TokenKind::LBrace => {
                self.advance();
                let mut fields = Vec::new();
                self.skip_eos();
                if !self.check(&TokenKind::RBrace) {
                    loop {
                        let (name, _) = self.expect_id("field name")?;
                        self.expect(&TokenKind::Colon, "':' after field name")?;
                        fields.push((name, self.parse_type_expr()?));
                        self.skip_eos();
                        if !self.consume_if(&TokenKind::Comma) {
                            break;
                        }
                        self.skip_eos();
                    }
                }
                self.expect(&TokenKind::RBrace, "'}' to close record type")?;
                Ok(TypeExpr::Record(fields))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_type_expr()?;
                self.expect(&TokenKind::RParen, "')' to close type expression")?;
                Ok(inner)
            }
            _ => Err(self.unexpected("type expression")),
        }
    }
}

fn binop(op: BinOp, left: Ast, right: Ast) -> Ast {
    let location = left.location;
    Ast::new(
        Node::Binop {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        location,
    )
}

/// Find the `}` that closes an interpolation opened just before `body`,
/// counting nested braces. Returns the byte index of the closer.
fn matching_brace(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in body.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Ast {
        let doc = Document::new("test", source);
        Parser::parse_document(&doc).unwrap()
    }

    fn parse_err(source: &str) -> AuaError {
        let doc = Document::new("test", source);
        Parser::parse_document(&doc).unwrap_err()
    }

    fn statements(ast: &Ast) -> &[Ast] {
        match &ast.node {
            Node::Seq(stmts) => stmts,
            other => panic!("expected Seq at program root, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_assignment_and_arithmetic() {
        let program = parse("x = 5; y = x + 2");
        let stmts = statements(&program);
        assert_eq!(stmts.len(), 2);
        match &stmts[0].node {
            Node::Assign { target, value } => {
                assert_eq!(target.node, Node::Id("x".to_string()));
                assert_eq!(value.node, Node::Int(5));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_precedence_mul_over_add() {
        let program = parse("1 + 2 * 3");
        let stmts = statements(&program);
        match &stmts[0].node {
            Node::Binop { op, left, right } => {
                assert_eq!(*op, BinOp::Add);
                assert_eq!(left.node, Node::Int(1));
                assert!(matches!(
                    right.node,
                    Node::Binop {
                        op: BinOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("expected binop, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_power_right_associative() {
        let program = parse("2 ** 3 ** 2");
        match &statements(&program)[0].node {
            Node::Binop { op, left, right } => {
                assert_eq!(*op, BinOp::Pow);
                assert_eq!(left.node, Node::Int(2));
                assert!(matches!(
                    right.node,
                    Node::Binop {
                        op: BinOp::Pow,
                        ..
                    }
                ));
            }
            other => panic!("expected binop, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_deeply_nested_parens_collapse() {
        let program = parse("((((x))))");
        assert_eq!(statements(&program)[0].node, Node::Id("x".to_string()));
    }

    #[test]
    fn test_parse_command_call() {
        let program = parse("say 'hello', 'world'");
        match &statements(&program)[0].node {
            Node::Call { callee, args } => {
                assert_eq!(callee.node, Node::Id("say".to_string()));
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_bare_identifier_is_a_read() {
        let program = parse("say");
        assert_eq!(statements(&program)[0].node, Node::Id("say".to_string()));
    }

    #[test]
    fn test_parse_explicit_call_with_parens() {
        let program = parse("fact(5)");
        match &statements(&program)[0].node {
            Node::Call { callee, args } => {
                assert_eq!(callee.node, Node::Id("fact".to_string()));
                assert_eq!(args[0].node, Node::Int(5));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_member_access_chain() {
        let program = parse("p.x + p.y");
        match &statements(&program)[0].node {
            Node::Binop { left, .. } => match &left.node {
                Node::Member { object, field } => {
                    assert_eq!(object.node, Node::Id("p".to_string()));
                    assert_eq!(field, "x");
                }
                other => panic!("expected member access, got {:?}", other),
            },
            other => panic!("expected binop, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_member_assignment() {
        let program = parse("p.x = 9");
        match &statements(&program)[0].node {
            Node::Assign { target, .. } => {
                assert!(matches!(target.node, Node::Member { .. }));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ternary_if() {
        let program = parse("if false then 1 else 2");
        match &statements(&program)[0].node {
            Node::If {
                cond,
                then,
                otherwise,
            } => {
                assert_eq!(cond.node, Node::Bool(false));
                assert_eq!(then.node, Node::Int(1));
                assert_eq!(otherwise.as_ref().unwrap().node, Node::Int(2));
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_block_if_with_elif_and_else() {
        let program = parse("if a\n1\nelif b\n2\nelse\n3\nend");
        match &statements(&program)[0].node {
            Node::If { otherwise, .. } => {
                let nested = otherwise.as_ref().unwrap();
                assert!(matches!(nested.node, Node::If { .. }));
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_one_line_while() {
        let program = parse("while counter < 3 counter = counter + 1 end");
        match &statements(&program)[0].node {
            Node::While { cond, body } => {
                assert!(matches!(cond.node, Node::Binop { op: BinOp::Lt, .. }));
                match &body.node {
                    Node::Seq(stmts) => assert_eq!(stmts.len(), 1),
                    other => panic!("expected Seq body, got {:?}", other),
                }
            }
            other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_with_ternary_body() {
        let program = parse("fun fact(n) if n <= 1 then 1 else n * fact(n - 1) end end");
        match &statements(&program)[0].node {
            Node::FunctionDefinition { name, params, body } => {
                assert_eq!(name, "fact");
                assert_eq!(params, &["n".to_string()]);
                match &body.node {
                    Node::Seq(stmts) => assert!(matches!(stmts[0].node, Node::If { .. })),
                    other => panic!("expected Seq body, got {:?}", other),
                }
            }
            other => panic!("expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_type_declaration_union() {
        let program = parse("type YesNo = 'yes' | 'no'");
        match &statements(&program)[0].node {
            Node::TypeDeclaration { name, ty } => {
                assert_eq!(name, "YesNo");
                assert_eq!(
                    ty,
                    &TypeExpr::Union(vec![
                        TypeExpr::Constant("yes".to_string()),
                        TypeExpr::Constant("no".to_string()),
                    ])
                );
            }
            other => panic!("expected type declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_type_declaration_record_and_generic() {
        let program = parse("type Inventory = { items: List<Str>, total: Int }");
        match &statements(&program)[0].node {
            Node::TypeDeclaration { ty, .. } => match ty {
                TypeExpr::Record(fields) => {
                    assert_eq!(fields.len(), 2);
                    assert_eq!(
                        fields[0].1,
                        TypeExpr::Generic {
                            base: "List".to_string(),
                            params: vec![TypeExpr::Reference("Str".to_string())],
                        }
                    );
                }
                other => panic!("expected record type, got {:?}", other),
            },
            other => panic!("expected type declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_cast_binds_loosest() {
        let program = parse("x + 1 as Int");
        match &statements(&program)[0].node {
            Node::CastAs { value, ty } => {
                assert!(matches!(value.node, Node::Binop { op: BinOp::Add, .. }));
                assert_eq!(ty, &TypeExpr::Reference("Int".to_string()));
            }
            other => panic!("expected cast, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_union_cast_inline() {
        let program = parse("answer ~ 'yes' | 'no'");
        match &statements(&program)[0].node {
            Node::CastUnion { ty, .. } => {
                assert!(matches!(ty, TypeExpr::Union(_)));
            }
            other => panic!("expected union cast, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_semantic_eq() {
        let program = parse("a ~= b");
        assert!(matches!(
            statements(&program)[0].node,
            Node::SemanticEq { .. }
        ));
    }

    #[test]
    fn test_parse_object_and_array_literals() {
        let program = parse("p = { x: 3, y: 4 }\nxs = [1, 2, 3]");
        let stmts = statements(&program);
        match &stmts[0].node {
            Node::Assign { value, .. } => match &value.node {
                Node::ObjectLiteral(fields) => assert_eq!(fields.len(), 2),
                other => panic!("expected object literal, got {:?}", other),
            },
            other => panic!("expected assignment, got {:?}", other),
        }
        match &stmts[1].node {
            Node::Assign { value, .. } => match &value.node {
                Node::ArrayLiteral(elements) => assert_eq!(elements.len(), 3),
                other => panic!("expected array literal, got {:?}", other),
            },
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_structured_string_with_interpolation() {
        let program = parse("\"hi ${name}!\"");
        match &statements(&program)[0].node {
            Node::StructuredStr(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[0], StrPart::Lit("hi ".to_string()));
                assert!(matches!(parts[1], StrPart::Interp(_)));
                assert_eq!(parts[2], StrPart::Lit("!".to_string()));
            }
            other => panic!("expected structured string, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_generative_literal_with_interpolation() {
        let program = parse("\"\"\"write about ${topic} briefly\"\"\"");
        match &statements(&program)[0].node {
            Node::StructuredGenLit(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[0], StrPart::Lit("write about ".to_string()));
                assert!(matches!(parts[1], StrPart::Interp(_)));
            }
            other => panic!("expected generative literal, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_generative_literal_without_interpolation() {
        let program = parse("\"\"\"a haiku\"\"\"");
        match &statements(&program)[0].node {
            Node::StructuredGenLit(parts) => {
                assert_eq!(parts, &[StrPart::Lit("a haiku".to_string())]);
            }
            other => panic!("expected generative literal, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_end_is_error() {
        let err = parse_err("while x < 3\nx = x + 1");
        assert!(err.to_string().contains("expected 'end'"));
    }

    #[test]
    fn test_parse_invalid_assignment_target_is_error() {
        let err = parse_err("1 = 2");
        assert!(err.to_string().contains("invalid assignment target"));
    }

    #[test]
    fn test_parse_expected_got_diagnostic() {
        let err = parse_err("fun f( end");
        let message = err.to_string();
        assert!(message.contains("expected"));
        assert!(message.contains("got"));
    }
}
