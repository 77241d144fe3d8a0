//! Statement parsing implementation
//!
//! This module handles parsing of all statement types:
//!
//! - Variable declarations: `int x = 42;`, `int[] xs = {1, 2};`
//! - Control flow: `if`/`else`, `while`, `for`
//! - `return`, `assert`
//! - Blocks: `{ ... }`
//! - Expression statements: calls, assignments, increments
//!
//! # Grammar
//!
//! ```text
//! statement ::= block | while_stmt | for_stmt | if_stmt | return_stmt
//!             | assert_stmt | var_decl | expr_stmt
//! ```
//!
//! `for (init; cond; update, ...) body` is desugared into
//! `{ init; while (cond) { body; update; ... } }` with a missing condition
//! replaced by `true`.
//!
//! # Indentation
//!
//! When [`ParserOptions::check_indentation`](super::parse::ParserOptions) is set,
//! statements that start their own line must be indented more than the line
//! that opened their block and aligned with their siblings. Unbraced bodies
//! are checked so that a following statement is not indented as if it were
//! part of the body.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, TokenKind};
use crate::parser::parse::{PResult, Parser};
use std::rc::Rc;

impl<'a> Parser<'a> {
    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> PResult<Rc<Stmt>> {
        let token = self.token;
        match token {
            TokenKind::Op("{") => {
                let start = self.token_start();
                let instr_loc = self.token_loc();
                self.push_start();
                let (statements, _) = self.parse_braced_block(start)?;
                Ok(Stmt::new(self.pop_loc(), instr_loc, StmtKind::Block(statements)))
            }
            TokenKind::Keyword(Keyword::While) => self.parse_while_statement(),
            TokenKind::Keyword(Keyword::For) => self.parse_for_statement(),
            TokenKind::Keyword(Keyword::If) => self.parse_if_statement(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return_statement(),
            TokenKind::Keyword(Keyword::Assert) => self.parse_assert_statement(),
            TokenKind::Keyword(Keyword::Else) => Err(self.error("'else' without a matching 'if'")),
            TokenKind::Keyword(Keyword::Class) => Err(self.error(
                "Classes cannot be declared inside a method or among statements",
            )),
            TokenKind::Keyword(
                Keyword::Public
                | Keyword::Private
                | Keyword::Protected
                | Keyword::Static
                | Keyword::Final,
            ) => Err(self.error(format!(
                "Modifier {} is not allowed on a local variable",
                self.token
            ))),
            TokenKind::Op(";") => Err(self.error("Empty statement: remove this ';'")),
            _ if self.at_declaration()? => self.parse_var_declaration(),
            _ => self.parse_expression_statement(),
        }
    }

    /// Whether the current tokens start a local variable declaration
    fn at_declaration(&mut self) -> PResult<bool> {
        match self.token {
            TokenKind::Keyword(Keyword::Int | Keyword::Boolean | Keyword::Void)
            | TokenKind::TypeIdent => Ok(true),
            TokenKind::Keyword(keyword) => Ok(keyword.is_unsupported_primitive()),
            TokenKind::Ident => {
                // `point p = ...`: a lowercase class name used as a type
                let state = self.save();
                self.advance()?;
                let looks_like_type = self.token == TokenKind::Ident
                    || (self.check_op("[") && {
                        self.advance()?;
                        self.check_op("]")
                    });
                self.restore(state);
                Ok(looks_like_type)
            }
            _ => Ok(false),
        }
    }

    /// Parse `{ statements }` and return the statements and the location of the closing brace.
    /// `header_start` is the offset of the construct that owns the block.
    pub(crate) fn parse_braced_block(
        &mut self,
        header_start: usize,
    ) -> PResult<(Vec<Rc<Stmt>>, Loc)> {
        let open = self.token_loc();
        self.expect_op("{", "to start a block")?;

        let header_indent = self.indentation(header_start);
        let mut statements = Vec::new();
        let mut first_indent = None;

        while !self.check_op("}") {
            if self.is_at_end() {
                return Err(self.error_at(open, "This '{' is never closed: expected '}'"));
            }
            self.check_statement_indentation(header_indent, &mut first_indent)?;
            statements.push(self.parse_statement()?);
        }

        self.check_closing_brace(header_start)?;
        let closing = self.token_loc();
        self.advance()?;
        Ok((statements, closing))
    }

    fn check_statement_indentation(
        &self,
        header_indent: usize,
        first_indent: &mut Option<usize>,
    ) -> PResult<()> {
        let start = self.token_start();
        if !self.options.check_indentation || !self.starts_line(start) {
            return Ok(());
        }
        let indent = self.indentation(start);
        if indent <= header_indent {
            return Err(self.error(
                "More indentation expected; if this statement is not part of the block, insert a closing brace '}' before it",
            ));
        }
        match first_indent {
            Some(expected) if *expected != indent => Err(self.error(
                "Inconsistent indentation: this statement should be aligned with the statements before it",
            )),
            Some(_) => Ok(()),
            None => {
                *first_indent = Some(indent);
                Ok(())
            }
        }
    }

    pub(crate) fn check_closing_brace(&self, header_start: usize) -> PResult<()> {
        let start = self.token_start();
        if self.options.check_indentation
            && self.starts_line(start)
            && self.indentation(start) != self.indentation(header_start)
        {
            return Err(self.error(
                "This closing brace should be aligned with the line that opened the block",
            ));
        }
        Ok(())
    }

    /// Parse the body of `if`, `else`, `while` or `for`: a block or a single statement
    fn parse_body(&mut self, keyword: &str, header_start: usize) -> PResult<Rc<Stmt>> {
        if self.check_op("{") {
            let instr_loc = self.token_loc();
            self.push_start();
            let (statements, _) = self.parse_braced_block(header_start)?;
            return Ok(Stmt::new(self.pop_loc(), instr_loc, StmtKind::Block(statements)));
        }

        let body_start = self.token_start();
        let own_line = self.options.check_indentation && self.starts_line(body_start);
        let body_indent = self.indentation(body_start);
        if own_line && body_indent <= self.indentation(header_start) {
            return Err(self.error(format!(
                "More indentation expected: the body of '{}' must be indented more than the '{}' line, or enclosed in braces",
                keyword, keyword
            )));
        }

        let body = self.parse_statement()?;
        if matches!(body.kind, StmtKind::VarDecl { .. }) {
            return Err(self.error_at(
                body.loc,
                format!(
                    "A variable declaration cannot be the body of '{}'; enclose it in braces",
                    keyword
                ),
            ));
        }

        let next = self.token_start();
        if own_line
            && !self.is_at_end()
            && !self.check_op("}")
            && !self.check_keyword(Keyword::Else)
            && self.starts_line(next)
            && self.indentation(next) >= body_indent
        {
            return Err(self.error(format!(
                "This statement is indented as if it belonged to the body of the '{}' above; enclose the body in braces '{{ }}'",
                keyword
            )));
        }
        Ok(body)
    }

    fn parse_while_statement(&mut self) -> PResult<Rc<Stmt>> {
        let header_start = self.token_start();
        let keyword_loc = self.token_loc();
        self.push_start();
        self.advance()?; // 'while'

        self.expect_op("(", "after 'while'")?;
        let cond = self.parse_expression()?;
        self.expect_op(")", "after loop condition")?;
        let body = self.parse_body("while", header_start)?;

        Ok(Stmt::new(
            self.pop_loc(),
            keyword_loc,
            StmtKind::While { cond, body },
        ))
    }

    fn parse_if_statement(&mut self) -> PResult<Rc<Stmt>> {
        let header_start = self.token_start();
        let keyword_loc = self.token_loc();
        self.push_start();
        self.advance()?; // 'if'

        self.expect_op("(", "after 'if'")?;
        let cond = self.parse_expression()?;
        self.expect_op(")", "after condition")?;
        let then_branch = self.parse_body("if", header_start)?;

        let else_branch = if self.check_keyword(Keyword::Else) {
            let else_start = self.token_start();
            self.advance()?;
            if self.check_keyword(Keyword::If) {
                Some(self.parse_if_statement()?)
            } else {
                Some(self.parse_body("else", else_start)?)
            }
        } else {
            None
        };

        Ok(Stmt::new(
            self.pop_loc(),
            keyword_loc,
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
        ))
    }

    fn parse_for_statement(&mut self) -> PResult<Rc<Stmt>> {
        let header_start = self.token_start();
        let keyword_loc = self.token_loc();
        self.push_start();
        self.advance()?; // 'for'
        self.expect_op("(", "after 'for'")?;

        let init = if self.match_op(";")? {
            None
        } else if self.at_declaration()? {
            Some(self.parse_var_declaration()?)
        } else {
            self.push_start();
            let expr = self.parse_expression()?;
            self.expect_semicolon("after for-loop initializer")?;
            let instr_loc = expr.instr_loc;
            Some(Stmt::new(self.pop_loc(), instr_loc, StmtKind::Expr(expr)))
        };

        let cond = if self.check_op(";") {
            let loc = self.token_loc();
            Expr::new(loc, loc, ExprKind::BoolLiteral(true))
        } else {
            self.parse_expression()?
        };
        self.expect_semicolon("after for-loop condition")?;

        let mut updates = Vec::new();
        if !self.check_op(")") {
            loop {
                let expr = self.parse_expression()?;
                updates.push(Stmt::new(expr.loc, expr.instr_loc, StmtKind::Expr(expr)));
                if !self.match_op(",")? {
                    break;
                }
            }
        }
        self.expect_op(")", "after for-loop header")?;

        let body = self.parse_body("for", header_start)?;
        let loop_body = if updates.is_empty() {
            body
        } else {
            let (loc, instr_loc) = (body.loc, body.instr_loc);
            let mut statements = vec![body];
            statements.extend(updates);
            Stmt::new(loc, instr_loc, StmtKind::Block(statements))
        };

        let loc = self.pop_loc();
        let while_loop = Stmt::new(
            loc,
            keyword_loc,
            StmtKind::While {
                cond,
                body: loop_body,
            },
        );
        Ok(match init {
            Some(init) => Stmt::new(loc, keyword_loc, StmtKind::Block(vec![init, while_loop])),
            None => while_loop,
        })
    }

    fn parse_return_statement(&mut self) -> PResult<Rc<Stmt>> {
        let keyword_loc = self.token_loc();
        self.push_start();
        self.advance()?; // 'return'

        let value = if self.check_op(";") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon("after return statement")?;

        Ok(Stmt::new(self.pop_loc(), keyword_loc, StmtKind::Return(value)))
    }

    fn parse_assert_statement(&mut self) -> PResult<Rc<Stmt>> {
        let keyword_loc = self.token_loc();
        self.push_start();
        self.advance()?; // 'assert'

        let cond = self.parse_expression()?;
        self.expect_semicolon("after assertion")?;

        Ok(Stmt::new(self.pop_loc(), keyword_loc, StmtKind::Assert(cond)))
    }

    /// Parse `Type name = init;`
    fn parse_var_declaration(&mut self) -> PResult<Rc<Stmt>> {
        self.push_start();
        let ty = self.parse_type("variable")?;
        if matches!(ty.kind, TypeExprKind::Void) {
            return Err(self.error_at(ty.loc, "A variable cannot have type void"));
        }
        let (name, name_loc) = self.expect_ident("variable")?;

        if self.check_op("(") {
            return Err(self.error(
                "Methods cannot be declared inside a method or among statements",
            ));
        }
        if self.check_op(";") {
            return Err(self.error(format!(
                "Variable '{}' must be initialized when it is declared: expected '='",
                name
            )));
        }
        self.expect_op("=", "after variable name")?;

        let init = if self.check_op("{") {
            match &ty.kind {
                TypeExprKind::Array(element) => self.parse_array_initializer((**element).clone())?,
                _ => {
                    return Err(self.error(
                        "An initializer list '{ ... }' can only initialize an array variable",
                    ))
                }
            }
        } else {
            self.parse_expression()?
        };
        self.expect_semicolon("after variable declaration")?;

        Ok(Stmt::new(
            self.pop_loc(),
            name_loc,
            StmtKind::VarDecl {
                ty,
                name,
                name_loc,
                init,
            },
        ))
    }

    fn parse_expression_statement(&mut self) -> PResult<Rc<Stmt>> {
        self.push_start();
        let expr = self.parse_expression()?;
        self.expect_semicolon("after expression")?;
        let instr_loc = expr.instr_loc;
        Ok(Stmt::new(self.pop_loc(), instr_loc, StmtKind::Expr(expr)))
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::errors::Error;
    use crate::parser::ast::*;
    use crate::parser::parse::{parse_statements, Parser, ParserOptions};

    fn parse_error(source: &str) -> String {
        match parse_statements(DocId(0), source) {
            Err(Error::Parse(e)) => e.message,
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_for_desugars_to_while() {
        let stmts = parse_statements(
            DocId(0),
            "for (int i = 0; i < 3; i++) {\n    x += i;\n}\n",
        )
        .unwrap();
        assert_eq!(stmts.len(), 1);
        let StmtKind::Block(outer) = &stmts[0].kind else {
            panic!("Expected block, got {:?}", stmts[0].kind);
        };
        assert!(matches!(outer[0].kind, StmtKind::VarDecl { .. }));
        let StmtKind::While { body, .. } = &outer[1].kind else {
            panic!("Expected while loop, got {:?}", outer[1].kind);
        };
        let StmtKind::Block(body) = &body.kind else {
            panic!("Expected loop body block");
        };
        assert_eq!(body.len(), 2);
        assert!(matches!(body[1].kind, StmtKind::Expr(_)));
    }

    #[test]
    fn test_for_without_condition() {
        let stmts = parse_statements(DocId(0), "for (;;) {\n    x++;\n}\n").unwrap();
        let StmtKind::While { cond, .. } = &stmts[0].kind else {
            panic!("Expected while loop");
        };
        assert!(matches!(cond.kind, ExprKind::BoolLiteral(true)));
    }

    #[test]
    fn test_uppercase_variable_name() {
        let msg = parse_error("int X = 5;");
        assert!(msg.contains("must start with a lowercase letter"), "{}", msg);
    }

    #[test]
    fn test_lowercase_type_name() {
        let msg = parse_error("point p = null;");
        assert!(msg.contains("uppercase"), "{}", msg);
    }

    #[test]
    fn test_initializer_required() {
        let msg = parse_error("int x;");
        assert!(msg.contains("must be initialized"), "{}", msg);
    }

    #[test]
    fn test_array_initializer_sugar() {
        let stmts = parse_statements(DocId(0), "int[] xs = {1, 2, 3};").unwrap();
        let StmtKind::VarDecl { init, .. } = &stmts[0].kind else {
            panic!("Expected declaration");
        };
        match &init.kind {
            ExprKind::NewArray {
                length: None,
                initializer: Some(elements),
                ..
            } => assert_eq!(elements.len(), 3),
            other => panic!("Expected array creation, got {:?}", other),
        }
    }

    #[test]
    fn test_block_needs_more_indentation() {
        let msg = parse_error("while (x < 3) {\nx++;\n}\n");
        assert!(msg.starts_with("More indentation expected"), "{}", msg);
    }

    #[test]
    fn test_inconsistent_indentation() {
        let msg = parse_error("if (b) {\n    x++;\n      y++;\n}\n");
        assert!(msg.starts_with("Inconsistent indentation"), "{}", msg);
    }

    #[test]
    fn test_misleading_unbraced_body() {
        let msg = parse_error("while (x < 3)\n    x++;\n    y++;\n");
        assert!(msg.contains("as if it belonged to the body of the 'while'"), "{}", msg);
    }

    #[test]
    fn test_unbraced_body_ok() {
        let stmts =
            parse_statements(DocId(0), "if (x < 3)\n    x++;\nelse\n    x--;\ny++;\n").unwrap();
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn test_indentation_check_can_be_disabled() {
        let options = ParserOptions {
            check_indentation: false,
        };
        let source = "while (x < 3) {\nx++;\n    }\n";
        let stmts = Parser::new(DocId(0), source, options)
            .unwrap()
            .parse_statements()
            .unwrap();
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_declaration_as_body_rejected() {
        let msg = parse_error("if (b) int x = 1;");
        assert!(msg.contains("cannot be the body"), "{}", msg);
    }
}
