//! Context-aware lexer for Aua
//!
//! Single-pass, character-oriented, with a small mode stack for the string
//! sub-languages. Double-quoted strings interpolate (`"a ${x} b"` emits
//! start/part/interpolation tokens), single-quoted strings do not, and
//! triple-quoted generative literals are captured verbatim as one payload.
//! Interpolations re-enter normal lexing and may themselves contain
//! strings, so the mode stack nests arbitrarily deep.
//!
//! Tokens are produced one per [`Lexer::next_token`] call; [`Lexer::tokenize`]
//! materializes the whole stream for the parser.

use std::collections::VecDeque;

use aua_core::{AuaError, Cursor, Document, Result};

use crate::token::{Token, TokenKind};

/// Lexer sub-modes. Normal mode is implicit (empty stack or below an
/// interpolation frame).
#[derive(Debug, Clone, PartialEq)]
enum Mode {
    /// Inside a double-quoted string body.
    Str,
    /// Inside `${ ... }`; `depth` counts open braces so `}` only closes
    /// the interpolation at depth zero.
    Interp { depth: usize },
}

pub struct Lexer<'a> {
    doc: &'a Document,
    chars: Vec<char>,
    pos: usize,
    cursor: Cursor,
    modes: Vec<Mode>,
    /// Tokens queued when one scan step produces more than one token
    /// (e.g. a string part followed by its closing quote).
    pending: VecDeque<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Lexer {
            doc,
            chars: doc.text().chars().collect(),
            pos: 0,
            cursor: Cursor::default(),
            modes: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Materialize the full token stream, ending with `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Produce the next token, honoring the current mode.
    pub fn next_token(&mut self) -> Result<Token> {
        if let Some(token) = self.pending.pop_front() {
            return Ok(token);
        }
        match self.modes.last() {
            Some(Mode::Str) => self.lex_string_body(),
            _ => self.lex_normal(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        self.cursor.advance(ch);
        Some(ch)
    }

    fn error(&self, message: &str, at: Cursor, hint: Option<&str>) -> AuaError {
        AuaError::Lex(self.doc.diagnostic(message, at, hint))
    }

    fn lex_normal(&mut self) -> Result<Token> {
        loop {
            // Whitespace other than newline separates tokens silently.
            while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
                self.bump();
            }
            // Comments run to end of line; the newline itself still
            // produces an end-of-statement token.
            if self.peek() == Some('#') {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.bump();
                }
                continue;
            }
            break;
        }

        let start = self.cursor;
        let Some(ch) = self.peek() else {
            if self.modes.is_empty() {
                return Ok(Token::new(TokenKind::Eof, start));
            }
            return Err(self.error(
                "unexpected end of input inside string interpolation",
                start,
                Some("hint: close the interpolation with '}' and the string with '\"'"),
            ));
        };

        match ch {
            '\n' | ';' => {
                self.bump();
                Ok(Token::new(TokenKind::Eos, start))
            }
            '"' => {
                if self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') {
                    self.lex_generative(start)
                } else {
                    self.bump();
                    self.modes.push(Mode::Str);
                    Ok(Token::new(TokenKind::StrStart, start))
                }
            }
            '\'' => self.lex_simple_string(start),
            '0'..='9' => self.lex_number(start),
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.lex_word(start)),
            '{' => {
                self.bump();
                if let Some(Mode::Interp { depth }) = self.modes.last_mut() {
                    *depth += 1;
                }
                Ok(Token::new(TokenKind::LBrace, start))
            }
            '}' => {
                self.bump();
                if let Some(Mode::Interp { depth }) = self.modes.last_mut() {
                    if *depth == 0 {
                        self.modes.pop();
                        return Ok(Token::new(TokenKind::InterpEnd, start));
                    }
                    *depth -= 1;
                }
                Ok(Token::new(TokenKind::RBrace, start))
            }
            _ => self.lex_operator(start),
        }
    }

    /// Longest-match operator scanning: two-character forms win over their
    /// one-character prefixes.
    fn lex_operator(&mut self, start: Cursor) -> Result<Token> {
        let ch = self.bump().expect("caller checked");
        let next = self.peek();
        let kind = match (ch, next) {
            ('*', Some('*')) => {
                self.bump();
                TokenKind::StarStar
            }
            ('*', _) => TokenKind::Star,
            ('=', Some('=')) => {
                self.bump();
                TokenKind::Eq
            }
            ('=', _) => TokenKind::Assign,
            ('!', Some('=')) => {
                self.bump();
                TokenKind::Ne
            }
            ('!', _) => TokenKind::Bang,
            ('<', Some('=')) => {
                self.bump();
                TokenKind::Le
            }
            ('<', _) => TokenKind::Lt,
            ('>', Some('=')) => {
                self.bump();
                TokenKind::Ge
            }
            ('>', _) => TokenKind::Gt,
            ('&', Some('&')) => {
                self.bump();
                TokenKind::AndAnd
            }
            ('|', Some('|')) => {
                self.bump();
                TokenKind::OrOr
            }
            ('|', _) => TokenKind::Pipe,
            ('~', Some('=')) => {
                self.bump();
                TokenKind::TildeEq
            }
            ('~', _) => TokenKind::Tilde,
            ('+', _) => TokenKind::Plus,
            ('-', _) => TokenKind::Minus,
            ('/', _) => TokenKind::Slash,
            ('.', _) => TokenKind::Dot,
            (',', _) => TokenKind::Comma,
            (':', _) => TokenKind::Colon,
            ('(', _) => TokenKind::LParen,
            (')', _) => TokenKind::RParen,
            ('[', _) => TokenKind::LBracket,
            (']', _) => TokenKind::RBracket,
            ('&', _) => {
                return Err(self.error(
                    "unexpected character '&'",
                    start,
                    Some("hint: logical and is spelled '&&'"),
                ));
            }
            _ => {
                return Err(self.error(&format!("unexpected character '{}'", ch), start, None));
            }
        };
        Ok(Token::new(kind, start))
    }

    fn lex_word(&mut self, start: Cursor) -> Token {
        let mut lexeme = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                lexeme.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        let kind = match lexeme.as_str() {
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "else" => TokenKind::Else,
            "elif" => TokenKind::Elif,
            "end" => TokenKind::End,
            "while" => TokenKind::While,
            "fun" => TokenKind::Fun,
            "type" => TokenKind::Type,
            "as" => TokenKind::As,
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            "nihil" => TokenKind::Nihil,
            _ => TokenKind::Id(lexeme),
        };
        Token::new(kind, start)
    }

    fn lex_number(&mut self, start: Cursor) -> Result<Token> {
        let mut text = String::new();
        while matches!(self.peek(), Some('0'..='9')) {
            text.push(self.bump().expect("digit"));
        }
        let mut is_float = false;
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some('0'..='9')) {
            is_float = true;
            text.push(self.bump().expect("dot"));
            while matches!(self.peek(), Some('0'..='9')) {
                text.push(self.bump().expect("digit"));
            }
        }
        if is_float && self.peek() == Some('.') && matches!(self.peek_at(1), Some('0'..='9')) {
            return Err(self.error(
                &format!("malformed number '{}.': more than one decimal point", text),
                start,
                None,
            ));
        }
        if matches!(self.peek(), Some(ch) if ch.is_ascii_alphabetic() || ch == '_') {
            return Err(self.error(
                &format!("number '{}' followed by identifier character", text),
                start,
                Some("hint: separate the number and the name with whitespace"),
            ));
        }

        let kind = if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| self.error(&format!("malformed float '{}'", text), start, None))?;
            TokenKind::Float(value)
        } else {
            let value: i64 = text.parse().map_err(|_| {
                self.error(&format!("integer '{}' out of range", text), start, None)
            })?;
            TokenKind::Int(value)
        };
        Ok(Token::new(kind, start))
    }

    fn lex_simple_string(&mut self, start: Cursor) -> Result<Token> {
        self.bump(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(self.error(
                        "unterminated string",
                        start,
                        Some("hint: close the string with '''"),
                    ));
                }
                Some('\'') => {
                    self.bump();
                    return Ok(Token::new(TokenKind::SimpleStr(text), start));
                }
                Some(ch) => {
                    text.push(ch);
                    self.bump();
                }
            }
        }
    }

    /// Capture a `"""..."""` payload verbatim. Interpolation markers inside
    /// the payload are left alone; the parser decides whether to treat the
    /// literal as structured.
    fn lex_generative(&mut self, start: Cursor) -> Result<Token> {
        self.bump();
        self.bump();
        self.bump();
        let mut payload = String::new();
        loop {
            if self.peek().is_none() {
                return Err(self.error(
                    "unterminated generative literal",
                    start,
                    Some("hint: close the literal with '\"\"\"'"),
                ));
            }
            if self.peek() == Some('"')
                && self.peek_at(1) == Some('"')
                && self.peek_at(2) == Some('"')
            {
                self.bump();
                self.bump();
                self.bump();
                return Ok(Token::new(TokenKind::GenLit(payload), start));
            }
            payload.push(self.bump().expect("checked above"));
        }
    }

    /// Inside a double-quoted string: accumulate literal text until the
    /// closing quote or a `${` interpolation opener.
    fn lex_string_body(&mut self) -> Result<Token> {
        let start = self.cursor;
        let mut buf = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(self.error(
                        "unterminated string",
                        start,
                        Some("hint: close the string with '\"'"),
                    ));
                }
                Some('"') => {
                    let quote_at = self.cursor;
                    self.bump();
                    self.modes.pop();
                    if buf.is_empty() {
                        return Ok(Token::new(TokenKind::StrEnd, quote_at));
                    }
                    self.pending
                        .push_back(Token::new(TokenKind::StrEnd, quote_at));
                    return Ok(Token::new(TokenKind::StrPart(buf), start));
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    let opener_at = self.cursor;
                    self.bump();
                    self.bump();
                    self.modes.push(Mode::Interp { depth: 0 });
                    if buf.is_empty() {
                        return Ok(Token::new(TokenKind::InterpStart, opener_at));
                    }
                    self.pending
                        .push_back(Token::new(TokenKind::InterpStart, opener_at));
                    return Ok(Token::new(TokenKind::StrPart(buf), start));
                }
                Some(ch) => {
                    buf.push(ch);
                    self.bump();
                }
            }
        }
    }
}
