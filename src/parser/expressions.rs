//! Expression parsing implementation
//!
//! One method per precedence level, loosest first:
//!
//! ```text
//! assignment     ::= or (assign_op assignment)?          right-associative
//! or             ::= and ("||" or)?                      right-associative
//! and            ::= bit_or ("&&" and)?                  right-associative
//! bit_or         ::= bit_xor ("|" bit_xor)*
//! bit_xor        ::= bit_and ("^" bit_and)*
//! bit_and        ::= comparison ("&" comparison)*
//! comparison     ::= shift (cmp_op shift)?               not chainable
//! shift          ::= additive (("<<" | ">>" | ">>>") additive)*
//! additive       ::= multiplicative (("+" | "-") multiplicative)*
//! multiplicative ::= unary (("*" | "/" | "%") unary)*
//! unary          ::= ("-" | "!" | "~" | "++" | "--") unary | postfix
//! postfix        ::= primary ("." ident args? | "[" expr "]" | "++" | "--")*
//! primary        ::= number | "true" | "false" | "null" | "this"
//!                  | ident args? | "(" expr ")" | creation
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, TokenKind};
use crate::parser::parse::{PResult, Parser};
use std::rc::Rc;

fn assignment_op(op: &str) -> Option<Option<BinaryOp>> {
    Some(match op {
        "=" => None,
        "+=" => Some(BinaryOp::Add),
        "-=" => Some(BinaryOp::Sub),
        "*=" => Some(BinaryOp::Mul),
        "/=" => Some(BinaryOp::Div),
        "%=" => Some(BinaryOp::Mod),
        "&=" => Some(BinaryOp::BitAnd),
        "|=" => Some(BinaryOp::BitOr),
        "^=" => Some(BinaryOp::BitXor),
        "<<=" => Some(BinaryOp::Shl),
        ">>=" => Some(BinaryOp::Shr),
        ">>>=" => Some(BinaryOp::UShr),
        _ => return None,
    })
}

fn comparison_op(op: &str) -> Option<BinaryOp> {
    Some(match op {
        "<" => BinaryOp::Lt,
        "<=" => BinaryOp::Le,
        ">" => BinaryOp::Gt,
        ">=" => BinaryOp::Ge,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::Ne,
        _ => return None,
    })
}

impl<'a> Parser<'a> {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> PResult<Rc<Expr>> {
        self.parse_assignment()
    }

    fn current_op(&self) -> Option<&'static str> {
        match self.token {
            TokenKind::Op(op) => Some(op),
            _ => None,
        }
    }

    fn parse_assignment(&mut self) -> PResult<Rc<Expr>> {
        self.push_start();
        let target = self.parse_or()?;

        if let Some(op) = self.current_op().and_then(assignment_op) {
            let op_loc = self.token_loc();
            self.advance()?;
            let value = self.parse_assignment()?;
            return Ok(Expr::new(
                self.pop_loc(),
                op_loc,
                ExprKind::Assign { op, target, value },
            ));
        }

        self.pop_loc();
        Ok(target)
    }

    /// Right-associative logical operator level
    fn parse_logical(
        &mut self,
        symbol: &str,
        op: BinaryOp,
        operand: fn(&mut Self) -> PResult<Rc<Expr>>,
        this_level: fn(&mut Self) -> PResult<Rc<Expr>>,
    ) -> PResult<Rc<Expr>> {
        self.push_start();
        let left = operand(self)?;
        if self.check_op(symbol) {
            let op_loc = self.token_loc();
            self.advance()?;
            let right = this_level(self)?;
            return Ok(Expr::new(
                self.pop_loc(),
                op_loc,
                ExprKind::Binary { op, left, right },
            ));
        }
        self.pop_loc();
        Ok(left)
    }

    fn parse_or(&mut self) -> PResult<Rc<Expr>> {
        self.parse_logical("||", BinaryOp::Or, Self::parse_and, Self::parse_or)
    }

    fn parse_and(&mut self) -> PResult<Rc<Expr>> {
        self.parse_logical("&&", BinaryOp::And, Self::parse_bit_or, Self::parse_and)
    }

    /// Left-associative binary operator level
    fn parse_left_assoc(
        &mut self,
        ops: &[(&str, BinaryOp)],
        operand: fn(&mut Self) -> PResult<Rc<Expr>>,
    ) -> PResult<Rc<Expr>> {
        self.push_start();
        let mut expr = operand(self)?;
        loop {
            let Some(&(_, op)) = ops.iter().find(|(symbol, _)| self.check_op(symbol)) else {
                self.pop_loc();
                return Ok(expr);
            };
            let op_loc = self.token_loc();
            self.advance()?;
            let right = operand(self)?;
            expr = Expr::new(
                self.dup_loc(),
                op_loc,
                ExprKind::Binary {
                    op,
                    left: expr,
                    right,
                },
            );
        }
    }

    fn parse_bit_or(&mut self) -> PResult<Rc<Expr>> {
        self.parse_left_assoc(&[("|", BinaryOp::BitOr)], Self::parse_bit_xor)
    }

    fn parse_bit_xor(&mut self) -> PResult<Rc<Expr>> {
        self.parse_left_assoc(&[("^", BinaryOp::BitXor)], Self::parse_bit_and)
    }

    fn parse_bit_and(&mut self) -> PResult<Rc<Expr>> {
        self.parse_left_assoc(&[("&", BinaryOp::BitAnd)], Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> PResult<Rc<Expr>> {
        self.push_start();
        let left = self.parse_shift()?;

        let Some(op) = self.current_op().and_then(comparison_op) else {
            self.pop_loc();
            return Ok(left);
        };
        let op_loc = self.token_loc();
        self.advance()?;
        let right = self.parse_shift()?;

        if self.current_op().and_then(comparison_op).is_some() {
            return Err(self.error(
                "Comparisons cannot be chained; combine them with '&&' (e.g. a < b && b < c)",
            ));
        }

        Ok(Expr::new(
            self.pop_loc(),
            op_loc,
            ExprKind::Binary { op, left, right },
        ))
    }

    fn parse_shift(&mut self) -> PResult<Rc<Expr>> {
        self.parse_left_assoc(
            &[
                ("<<", BinaryOp::Shl),
                (">>", BinaryOp::Shr),
                (">>>", BinaryOp::UShr),
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> PResult<Rc<Expr>> {
        self.parse_left_assoc(
            &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> PResult<Rc<Expr>> {
        self.parse_left_assoc(
            &[
                ("*", BinaryOp::Mul),
                ("/", BinaryOp::Div),
                ("%", BinaryOp::Mod),
            ],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> PResult<Rc<Expr>> {
        enum Prefix {
            Unary(UnaryOp),
            IncDec(IncDecOp),
        }
        let prefix = match self.token {
            TokenKind::Op("-") => Prefix::Unary(UnaryOp::Neg),
            TokenKind::Op("!") => Prefix::Unary(UnaryOp::Not),
            TokenKind::Op("~") => Prefix::Unary(UnaryOp::BitNot),
            TokenKind::Op("++") => Prefix::IncDec(IncDecOp::Increment),
            TokenKind::Op("--") => Prefix::IncDec(IncDecOp::Decrement),
            _ => return self.parse_postfix(),
        };

        let op_loc = self.token_loc();
        self.push_start();
        self.advance()?;
        let operand = self.parse_unary()?;
        let kind = match prefix {
            Prefix::Unary(op) => ExprKind::Unary { op, operand },
            Prefix::IncDec(op) => ExprKind::IncDec {
                op,
                prefix: true,
                target: operand,
            },
        };
        Ok(Expr::new(self.pop_loc(), op_loc, kind))
    }

    fn parse_postfix(&mut self) -> PResult<Rc<Expr>> {
        self.push_start();
        let mut expr = self.parse_primary()?;

        loop {
            if self.check_op(".") {
                let dot_start = self.token_start();
                self.advance()?;
                let (name, name_loc) = match self.token {
                    TokenKind::Ident => {
                        let loc = self.token_loc();
                        self.advance()?;
                        (self.last_value.to_string(), loc)
                    }
                    TokenKind::TypeIdent => {
                        return Err(self.error(
                            "A field or method name must start with a lowercase letter",
                        ))
                    }
                    _ => {
                        return Err(self.error(format!(
                            "Expected field or method name after '.', found {}",
                            self.token
                        )))
                    }
                };
                if self.check_op("(") {
                    let args = self.parse_arguments()?;
                    expr = Expr::new(
                        self.dup_loc(),
                        name_loc,
                        ExprKind::Call {
                            callee: Callee::Method {
                                receiver: expr,
                                name,
                            },
                            args,
                        },
                    );
                } else {
                    expr = Expr::new(
                        self.dup_loc(),
                        Loc::new(self.doc, dot_start, name_loc.end),
                        ExprKind::Select {
                            target: expr,
                            field: name,
                        },
                    );
                }
            } else if self.check_op("[") {
                let bracket_start = self.token_start();
                self.advance()?;
                let index = self.parse_expression()?;
                self.expect_op("]", "after array index")?;
                expr = Expr::new(
                    self.dup_loc(),
                    Loc::new(self.doc, bracket_start, self.last_pos),
                    ExprKind::Subscript {
                        target: expr,
                        index,
                    },
                );
            } else if self.check_op("++") || self.check_op("--") {
                let op = if self.check_op("++") {
                    IncDecOp::Increment
                } else {
                    IncDecOp::Decrement
                };
                let op_loc = self.token_loc();
                self.advance()?;
                expr = Expr::new(
                    self.dup_loc(),
                    op_loc,
                    ExprKind::IncDec {
                        op,
                        prefix: false,
                        target: expr,
                    },
                );
            } else {
                self.pop_loc();
                return Ok(expr);
            }
        }
    }

    fn parse_arguments(&mut self) -> PResult<Vec<Rc<Expr>>> {
        self.expect_op("(", "to start the argument list")?;
        let mut args = Vec::new();
        if !self.check_op(")") {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_op(",")? {
                    break;
                }
            }
        }
        self.expect_op(")", "after arguments")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> PResult<Rc<Expr>> {
        let loc = self.token_loc();
        let kind = match self.token {
            TokenKind::Number => {
                let value = self
                    .scanner
                    .value()
                    .bytes()
                    .fold(0i32, |acc, digit| {
                        acc.wrapping_mul(10).wrapping_add(i32::from(digit - b'0'))
                    });
                ExprKind::IntLiteral(value)
            }
            TokenKind::Keyword(Keyword::True) => ExprKind::BoolLiteral(true),
            TokenKind::Keyword(Keyword::False) => ExprKind::BoolLiteral(false),
            TokenKind::Keyword(Keyword::Null) => ExprKind::NullLiteral,
            TokenKind::Keyword(Keyword::This) => ExprKind::This,
            TokenKind::Keyword(Keyword::New) => return self.parse_creation(),
            TokenKind::Ident => {
                self.push_start();
                self.advance()?;
                let name = self.last_value.to_string();
                if self.check_op("(") {
                    let args = self.parse_arguments()?;
                    return Ok(Expr::new(
                        self.pop_loc(),
                        loc,
                        ExprKind::Call {
                            callee: Callee::Function(name),
                            args,
                        },
                    ));
                }
                self.pop_loc();
                return Ok(Expr::new(loc, loc, ExprKind::Variable(name)));
            }
            TokenKind::Op("(") => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.expect_op(")", "to close the parenthesized expression")?;
                return Ok(inner);
            }
            TokenKind::TypeIdent => {
                return Err(self.error(format!(
                    "Class name '{}' cannot be used as a value; static members are not supported",
                    self.scanner.value()
                )))
            }
            _ => return Err(self.error(format!("Expected expression, found {}", self.token))),
        };
        self.advance()?;
        Ok(Expr::new(loc, loc, kind))
    }

    /// `new C(args)`, `new T[len]`, `new T[]{...}`, `new T[len]{...}`
    fn parse_creation(&mut self) -> PResult<Rc<Expr>> {
        let new_loc = self.token_loc();
        self.push_start();
        self.advance()?; // 'new'

        self.push_start();
        let base = self.parse_base_type("object or array")?;
        let base = TypeExpr::new(self.pop_loc(), base);

        if self.check_op("(") {
            if !matches!(base.kind, TypeExprKind::Named(_)) {
                return Err(self.error_at(
                    base.loc,
                    format!("Cannot create an object of primitive type {}", base),
                ));
            }
            let args = self.parse_arguments()?;
            return Ok(Expr::new(
                self.pop_loc(),
                Loc::new(self.doc, new_loc.start, base.loc.end),
                ExprKind::New { class: base, args },
            ));
        }

        if !self.check_op("[") {
            return Err(self.error(format!(
                "Expected '(' or '[' after 'new {}', found {}",
                base, self.token
            )));
        }
        if matches!(base.kind, TypeExprKind::Void) {
            return Err(self.error_at(base.loc, "There are no arrays of void"));
        }
        self.advance()?; // '['
        let length = if self.check_op("]") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_op("]", "after array length")?;

        // Extra `[]` pairs make the element type itself an array type
        let mut element = base;
        while self.check_op("[") {
            self.advance()?;
            self.expect_op("]", "in array type")?;
            let loc = element.loc.join(Loc::new(self.doc, self.last_pos, self.last_pos));
            element = TypeExpr::new(loc, TypeExprKind::Array(Box::new(element)));
        }

        let initializer = if self.check_op("{") {
            Some(self.parse_initializer_elements(&element)?)
        } else {
            None
        };

        Ok(Expr::new(
            self.pop_loc(),
            new_loc,
            ExprKind::NewArray {
                element,
                length,
                initializer,
            },
        ))
    }

    /// `{ e1, e2, ... }` creating an array with the given element type
    pub(crate) fn parse_array_initializer(&mut self, element: TypeExpr) -> PResult<Rc<Expr>> {
        let open_loc = self.token_loc();
        self.push_start();
        let elements = self.parse_initializer_elements(&element)?;
        Ok(Expr::new(
            self.pop_loc(),
            open_loc,
            ExprKind::NewArray {
                element,
                length: None,
                initializer: Some(elements),
            },
        ))
    }

    /// Elements of a braced initializer; nested braces initialize nested arrays
    fn parse_initializer_elements(&mut self, element: &TypeExpr) -> PResult<Vec<Rc<Expr>>> {
        self.expect_op("{", "to start the array initializer")?;
        let mut elements = Vec::new();
        while !self.check_op("}") {
            let value = match (&element.kind, self.check_op("{")) {
                (TypeExprKind::Array(inner), true) => {
                    self.parse_array_initializer((**inner).clone())?
                }
                _ => self.parse_expression()?,
            };
            elements.push(value);
            if !self.match_op(",")? {
                break;
            }
        }
        self.expect_op("}", "to close the array initializer")?;
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::errors::Error;
    use crate::parser::ast::*;
    use crate::parser::parse::parse_expression;
    use std::rc::Rc;

    fn parse(source: &str) -> Rc<Expr> {
        parse_expression(DocId(0), source).unwrap()
    }

    fn binary_op(expr: &Expr) -> BinaryOp {
        match &expr.kind {
            ExprKind::Binary { op, .. } => *op,
            other => panic!("Expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        let expr = parse("a + b * c == d && e");
        assert_eq!(binary_op(&expr), BinaryOp::And);
        let ExprKind::Binary { left, .. } = &expr.kind else {
            unreachable!()
        };
        assert_eq!(binary_op(left), BinaryOp::Eq);
    }

    #[test]
    fn test_assignment_right_associative() {
        let expr = parse("a = b += 2");
        match &expr.kind {
            ExprKind::Assign {
                op: None, value, ..
            } => assert!(matches!(
                value.kind,
                ExprKind::Assign {
                    op: Some(BinaryOp::Add),
                    ..
                }
            )),
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_comparison_rejected() {
        let err = parse_expression(DocId(0), "a < b < c").unwrap_err();
        match err {
            Error::Parse(e) => assert!(e.message.contains("cannot be chained")),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_postfix_chain() {
        let expr = parse("p.items[i].next.get(1)");
        match &expr.kind {
            ExprKind::Call {
                callee: Callee::Method { name, receiver },
                args,
            } => {
                assert_eq!(name, "get");
                assert_eq!(args.len(), 1);
                assert!(matches!(receiver.kind, ExprKind::Select { .. }));
            }
            other => panic!("Expected method call, got {:?}", other),
        }
    }

    #[test]
    fn test_array_creation_forms() {
        assert!(matches!(
            parse("new int[3]").kind,
            ExprKind::NewArray {
                length: Some(_),
                initializer: None,
                ..
            }
        ));
        match &parse("new int[][]{{1}, {2, 3}}").kind {
            ExprKind::NewArray {
                element,
                length: None,
                initializer: Some(rows),
            } => {
                assert_eq!(element.to_string(), "int[]");
                assert_eq!(rows.len(), 2);
            }
            other => panic!("Expected array creation, got {:?}", other),
        }
    }

    #[test]
    fn test_int_literal_wraps() {
        assert!(matches!(
            parse("2147483648").kind,
            ExprKind::IntLiteral(i32::MIN)
        ));
    }

    #[test]
    fn test_increments() {
        assert!(matches!(
            parse("i++").kind,
            ExprKind::IncDec {
                prefix: false,
                op: IncDecOp::Increment,
                ..
            }
        ));
        assert!(matches!(
            parse("--i").kind,
            ExprKind::IncDec {
                prefix: true,
                op: IncDecOp::Decrement,
                ..
            }
        ));
    }
}
