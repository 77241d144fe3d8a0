//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct, its helper methods and the public
//! entry points ([`parse_declarations`], [`parse_statements`],
//! [`parse_expression`], [`parse_script`]).
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, token helpers, location tracking, indentation helpers
//! - `declarations`: classes, fields, constructors, methods and types
//! - `statements`: statements, blocks and the `for` desugaring
//! - `expressions`: expressions, one method per precedence level
//!
//! # Locations
//!
//! Node locations come from a stack of start offsets: a rule calls
//! [`Parser::push_start`] before consuming its first token and
//! [`Parser::pop_loc`] (or [`Parser::dup_loc`] inside left-associative loops)
//! once done. The end of a location is always the end of the last consumed token.

use crate::interpreter::errors::Error;
use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, Scanner, TokenKind};
use std::rc::Rc;
use thiserror::Error as ThisError;

pub(crate) type PResult<T> = Result<T, Error>;

/// Syntax error
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub loc: Loc,
}

/// Parser settings
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    /// Reject programs whose indentation contradicts their block structure
    pub check_indentation: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            check_indentation: true,
        }
    }
}

/// Saved parser position for bounded lookahead
#[derive(Clone)]
pub(crate) struct ParserState<'a> {
    scanner: Scanner<'a>,
    token: TokenKind,
    last_pos: usize,
    last_value: &'a str,
    depth: usize,
}

/// Recursive descent parser over one document
pub struct Parser<'a> {
    pub(crate) doc: DocId,
    pub(crate) text: &'a str,
    pub(crate) scanner: Scanner<'a>,
    /// Current (not yet consumed) token
    pub(crate) token: TokenKind,
    /// End offset of the last consumed token
    pub(crate) last_pos: usize,
    /// Text of the last consumed number or identifier
    pub(crate) last_value: &'a str,
    pos_stack: Vec<usize>,
    pub(crate) options: ParserOptions,
}

impl<'a> Parser<'a> {
    pub fn new(doc: DocId, text: &'a str, options: ParserOptions) -> PResult<Self> {
        let mut scanner = Scanner::new(doc, text);
        let token = scanner.next_token()?;
        Ok(Parser {
            doc,
            text,
            scanner,
            token,
            last_pos: 0,
            last_value: "",
            pos_stack: Vec::new(),
            options,
        })
    }

    /// Parse the whole document as a list of declarations
    pub fn parse_declarations(&mut self) -> PResult<Vec<Declaration>> {
        let mut declarations = Vec::new();
        while !self.is_at_end() {
            declarations.push(self.parse_declaration()?);
        }
        Ok(declarations)
    }

    /// Parse the whole document as a list of top-level statements
    pub fn parse_statements(&mut self) -> PResult<Vec<Rc<Stmt>>> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    /// Parse the whole document as a single expression
    pub fn parse_single_expression(&mut self) -> PResult<Rc<Expr>> {
        let expr = self.parse_expression()?;
        if !self.is_at_end() {
            return Err(self.error(format!("Expected end of expression, found {}", self.token)));
        }
        Ok(expr)
    }

    /// Parse a document mixing declarations and top-level statements
    pub fn parse_script(&mut self) -> PResult<Script> {
        let mut script = Script::default();
        while !self.is_at_end() {
            if self.check_keyword(Keyword::Class) || self.at_method_header()? {
                script.declarations.push(self.parse_declaration()?);
            } else {
                script.statements.push(self.parse_statement()?);
            }
        }
        Ok(script)
    }

    // ===== Location tracking =====

    pub(crate) fn push_start(&mut self) {
        self.pos_stack.push(self.scanner.token_start());
    }

    pub(crate) fn pop_loc(&mut self) -> Loc {
        let start = self.pos_stack.pop().unwrap_or(self.last_pos);
        Loc::new(self.doc, start, self.last_pos.max(start))
    }

    pub(crate) fn dup_loc(&self) -> Loc {
        let start = self.pos_stack.last().copied().unwrap_or(self.last_pos);
        Loc::new(self.doc, start, self.last_pos.max(start))
    }

    /// Location of the current token
    pub(crate) fn token_loc(&self) -> Loc {
        Loc::new(self.doc, self.scanner.token_start(), self.scanner.pos())
    }

    pub(crate) fn token_start(&self) -> usize {
        self.scanner.token_start()
    }

    // ===== Errors =====

    pub(crate) fn error(&self, message: impl Into<String>) -> Error {
        self.error_at(self.token_loc(), message)
    }

    pub(crate) fn error_at(&self, loc: Loc, message: impl Into<String>) -> Error {
        Error::Parse(ParseError {
            message: message.into(),
            loc,
        })
    }

    // ===== Token helpers =====

    pub(crate) fn advance(&mut self) -> PResult<()> {
        self.last_value = self.scanner.value();
        self.last_pos = self.scanner.pos();
        self.token = self.scanner.next_token()?;
        Ok(())
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.token == TokenKind::Eof
    }

    pub(crate) fn check_op(&self, op: &str) -> bool {
        matches!(self.token, TokenKind::Op(current) if current == op)
    }

    pub(crate) fn check_keyword(&self, keyword: Keyword) -> bool {
        self.token == TokenKind::Keyword(keyword)
    }

    pub(crate) fn match_op(&mut self, op: &str) -> PResult<bool> {
        if self.check_op(op) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn expect_op(&mut self, op: &str, ctx: &str) -> PResult<()> {
        if self.check_op(op) {
            self.advance()
        } else {
            Err(self.error(format!("Expected '{}' {}, found {}", op, ctx, self.token)))
        }
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> PResult<()> {
        self.expect_op(";", ctx)
    }

    /// Expect a lowercase identifier naming a variable, parameter, field or method
    pub(crate) fn expect_ident(&mut self, what: &str) -> PResult<(String, Loc)> {
        let loc = self.token_loc();
        match self.token {
            TokenKind::Ident => {
                self.advance()?;
                Ok((self.last_value.to_string(), loc))
            }
            TokenKind::TypeIdent => Err(self.error(format!(
                "A {} name must start with a lowercase letter",
                what
            ))),
            TokenKind::Keyword(keyword) => Err(self.error(format!(
                "'{}' is a reserved word and cannot be used as a {} name",
                keyword.as_str(),
                what
            ))),
            _ => Err(self.error(format!("Expected {} name, found {}", what, self.token))),
        }
    }

    // ===== Lookahead =====

    pub(crate) fn save(&self) -> ParserState<'a> {
        ParserState {
            scanner: self.scanner.clone(),
            token: self.token,
            last_pos: self.last_pos,
            last_value: self.last_value,
            depth: self.pos_stack.len(),
        }
    }

    pub(crate) fn restore(&mut self, state: ParserState<'a>) {
        self.scanner = state.scanner;
        self.token = state.token;
        self.last_pos = state.last_pos;
        self.last_value = state.last_value;
        self.pos_stack.truncate(state.depth);
    }

    /// Whether the upcoming tokens read `[modifiers] Type name (`
    fn at_method_header(&mut self) -> PResult<bool> {
        let state = self.save();
        let result = self.scan_method_header();
        self.restore(state);
        // Lexical errors are reported again when the statement is parsed
        Ok(result.unwrap_or(false))
    }

    fn scan_method_header(&mut self) -> PResult<bool> {
        if matches!(
            self.token,
            TokenKind::Keyword(
                Keyword::Public
                    | Keyword::Private
                    | Keyword::Protected
                    | Keyword::Static
                    | Keyword::Final
            )
        ) {
            return Ok(true);
        }
        match self.token {
            TokenKind::Keyword(Keyword::Int | Keyword::Boolean | Keyword::Void)
            | TokenKind::TypeIdent
            | TokenKind::Ident => self.advance()?,
            TokenKind::Keyword(keyword) if keyword.is_unsupported_primitive() => self.advance()?,
            _ => return Ok(false),
        }
        while self.check_op("[") {
            self.advance()?;
            if !self.match_op("]")? {
                return Ok(false);
            }
        }
        if !matches!(self.token, TokenKind::Ident | TokenKind::TypeIdent) {
            return Ok(false);
        }
        self.advance()?;
        Ok(self.check_op("("))
    }

    // ===== Indentation helpers =====

    fn line_start(&self, offset: usize) -> usize {
        self.text
            .get(..offset)
            .and_then(|prefix| prefix.rfind('\n'))
            .map_or(0, |newline| newline + 1)
    }

    /// Whether only whitespace precedes `offset` on its line
    pub(crate) fn starts_line(&self, offset: usize) -> bool {
        let start = self.line_start(offset);
        self.text
            .get(start..offset)
            .is_some_and(|prefix| prefix.chars().all(|c| c == ' ' || c == '\t'))
    }

    /// Indentation width of the line containing `offset`; a tab counts as four columns
    pub(crate) fn indentation(&self, offset: usize) -> usize {
        let start = self.line_start(offset);
        self.text[start..]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .map(|c| if c == '\t' { 4 } else { 1 })
            .sum()
    }
}

/// Parse declarations (classes and top-level methods)
pub fn parse_declarations(doc: DocId, text: &str) -> Result<Vec<Declaration>, Error> {
    Parser::new(doc, text, ParserOptions::default())?.parse_declarations()
}

/// Parse top-level statements
pub fn parse_statements(doc: DocId, text: &str) -> Result<Vec<Rc<Stmt>>, Error> {
    Parser::new(doc, text, ParserOptions::default())?.parse_statements()
}

/// Parse a single expression spanning the whole text
pub fn parse_expression(doc: DocId, text: &str) -> Result<Rc<Expr>, Error> {
    Parser::new(doc, text, ParserOptions::default())?.parse_single_expression()
}

/// Parse a script of interleaved declarations and statements
pub fn parse_script(doc: DocId, text: &str) -> Result<Script, Error> {
    Parser::new(doc, text, ParserOptions::default())?.parse_script()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: DocId = DocId(0);

    #[test]
    fn test_parse_script_separates_declarations() {
        let source = "\
class Point {
    int x;
}
int twice(int n) {
    return n * 2;
}
int y = twice(3);
Point p = new Point();
";
        let script = parse_script(DOC, source).unwrap();
        assert_eq!(script.declarations.len(), 2);
        assert_eq!(script.statements.len(), 2);
        match &script.declarations[1] {
            Declaration::Method(method) => {
                assert_eq!(method.name, "twice");
                assert_eq!(method.params.len(), 1);
            }
            other => panic!("Expected method declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_locations_cover_tokens() {
        let source = "1 + 2 * 3";
        let expr = parse_expression(DOC, source).unwrap();
        assert_eq!(expr.loc, Loc::new(DOC, 0, 9));
        assert_eq!(&source[expr.instr_loc.start..expr.instr_loc.end], "+");
        match &expr.kind {
            ExprKind::Binary { right, .. } => {
                assert_eq!(right.loc, Loc::new(DOC, 4, 9));
                assert_eq!(&source[right.instr_loc.start..right.instr_loc.end], "*");
            }
            other => panic!("Expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse_expression(DOC, "1 2").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(err.loc(), Some(Loc::new(DOC, 2, 3)));
    }

    #[test]
    fn test_lex_error_propagates() {
        let err = parse_statements(DOC, "int x = 1 # 2;").unwrap_err();
        assert!(matches!(err, Error::Lex(_)));
    }
}
