//! Declaration parsing implementation
//!
//! This module handles parsing of declarations:
//!
//! - Class declarations: `class Name { members }`
//! - Members: fields, at most one constructor, methods
//! - Top-level methods: `type name(params) { ... }`
//! - Types: `int`, `boolean`, `void`, class names, arrays `T[]`
//!
//! # Grammar
//!
//! ```text
//! declaration ::= class_decl | method_decl
//! class_decl  ::= "class" TypeIdent "{" member* "}"
//! member      ::= access? ( field | constructor | method_decl )
//! field       ::= type ident ";"
//! constructor ::= TypeIdent "(" params ")" block
//! method_decl ::= type ident "(" params ")" block
//! type        ::= ("int" | "boolean" | "void" | TypeIdent) ("[" "]")*
//! ```
//!
//! Modifiers Java has but the language does not (`static`, `final`,
//! `protected`) and field initializers are reported with dedicated messages.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, TokenKind};
use crate::parser::parse::{PResult, Parser};
use std::rc::Rc;

impl<'a> Parser<'a> {
    /// Parse a class or top-level method declaration
    pub(crate) fn parse_declaration(&mut self) -> PResult<Declaration> {
        if self.check_keyword(Keyword::Class) {
            return Ok(Declaration::Class(self.parse_class()?));
        }

        let header_start = self.token_start();
        self.push_start();
        let access = self.parse_modifiers()?;
        let return_type = self.parse_type("method return")?;
        let (name, name_loc) = self.expect_ident("method")?;
        if !self.check_op("(") {
            return Err(self.error(format!(
                "Expected '(' after method name '{}', found {}",
                name, self.token
            )));
        }
        let method = self.parse_method_rest(
            header_start,
            access,
            return_type,
            name,
            name_loc,
            false,
        )?;
        Ok(Declaration::Method(method))
    }

    fn parse_class(&mut self) -> PResult<Rc<ClassDecl>> {
        let header_start = self.token_start();
        self.push_start();
        self.advance()?; // 'class'

        let name_loc = self.token_loc();
        let name = match self.token {
            TokenKind::TypeIdent => {
                self.advance()?;
                self.last_value.to_string()
            }
            TokenKind::Ident => {
                return Err(self.error("A class name must start with an uppercase letter"))
            }
            _ => return Err(self.error(format!("Expected class name, found {}", self.token))),
        };

        self.expect_op("{", "after class name")?;

        let mut fields = Vec::new();
        let mut constructor: Option<Rc<MethodDecl>> = None;
        let mut methods = Vec::new();
        let mut member_indent = None;

        while !self.check_op("}") {
            if self.is_at_end() {
                return Err(self.error(format!("Expected '}}' to close class '{}'", name)));
            }
            self.check_member_indentation(header_start, &mut member_indent)?;

            let member_start = self.token_start();
            self.push_start();
            let access = self.parse_modifiers()?;

            // Constructor: the class name directly followed by '('
            if self.token == TokenKind::TypeIdent {
                let state = self.save();
                let ctor_loc = self.token_loc();
                self.advance()?;
                let ctor_name = self.last_value.to_string();
                if self.check_op("(") {
                    if ctor_name != name {
                        return Err(self.error_at(
                            ctor_loc,
                            format!(
                                "A constructor must have the same name as its class ('{}'); a method needs a return type",
                                name
                            ),
                        ));
                    }
                    if constructor.is_some() {
                        return Err(self.error_at(
                            ctor_loc,
                            "A class can have at most one constructor",
                        ));
                    }
                    let void = TypeExpr::new(ctor_loc, TypeExprKind::Void);
                    constructor = Some(self.parse_method_rest(
                        member_start,
                        access,
                        void,
                        ctor_name,
                        ctor_loc,
                        true,
                    )?);
                    continue;
                }
                self.restore(state);
            }

            let ty = self.parse_type("member")?;
            let (member_name, member_name_loc) = self.expect_ident("field or method")?;

            if self.check_op("(") {
                methods.push(self.parse_method_rest(
                    member_start,
                    access,
                    ty,
                    member_name,
                    member_name_loc,
                    false,
                )?);
                continue;
            }

            if self.check_op("=") {
                return Err(self.error(
                    "Fields cannot be initialized in their declaration; assign them in the constructor instead",
                ));
            }
            if matches!(ty.kind, TypeExprKind::Void) {
                return Err(self.error_at(ty.loc, "A field cannot have type void"));
            }
            self.expect_semicolon("after field declaration")?;
            fields.push(FieldDecl {
                loc: self.pop_loc(),
                access,
                ty,
                name: member_name,
            });
        }

        self.check_closing_brace(header_start)?;
        self.advance()?; // '}'

        Ok(Rc::new(ClassDecl {
            loc: self.pop_loc(),
            name_loc,
            name,
            fields,
            constructor,
            methods,
        }))
    }

    /// Parse `public`/`private`; reject the modifiers the language does not have
    fn parse_modifiers(&mut self) -> PResult<Access> {
        let mut access = None;
        loop {
            let found = match self.token {
                TokenKind::Keyword(Keyword::Public) => Access::Public,
                TokenKind::Keyword(Keyword::Private) => Access::Private,
                TokenKind::Keyword(Keyword::Protected) => {
                    return Err(self.error(
                        "'protected' is not supported: there is no inheritance; use 'public' or 'private'",
                    ))
                }
                TokenKind::Keyword(Keyword::Static) => {
                    return Err(self.error(
                        "'static' is not supported: declare top-level methods without 'static'",
                    ))
                }
                TokenKind::Keyword(Keyword::Final) => {
                    return Err(self.error("'final' is not supported"))
                }
                _ => return Ok(access.unwrap_or_default()),
            };
            if access.is_some() {
                return Err(self.error("At most one accessibility modifier is allowed"));
            }
            access = Some(found);
            self.advance()?;
        }
    }

    /// Parse parameters and body; `self.token` is the opening parenthesis
    fn parse_method_rest(
        &mut self,
        header_start: usize,
        access: Access,
        return_type: TypeExpr,
        name: String,
        name_loc: Loc,
        is_constructor: bool,
    ) -> PResult<Rc<MethodDecl>> {
        self.expect_op("(", "after method name")?;
        let mut params: Vec<Param> = Vec::new();
        if !self.check_op(")") {
            loop {
                self.push_start();
                let ty = self.parse_type("parameter")?;
                if matches!(ty.kind, TypeExprKind::Void) {
                    return Err(self.error_at(ty.loc, "A parameter cannot have type void"));
                }
                let (param_name, _) = self.expect_ident("parameter")?;
                params.push(Param {
                    loc: self.pop_loc(),
                    ty,
                    name: param_name,
                });
                if !self.match_op(",")? {
                    break;
                }
            }
        }
        self.expect_op(")", "after parameters")?;

        if self.check_op(";") {
            return Err(self.error("Expected method body '{'; abstract methods are not supported"));
        }
        if !self.check_op("{") {
            return Err(self.error(format!(
                "Expected '{{' to start the body of '{}', found {}",
                name, self.token
            )));
        }
        let (mut body, closing) = self.parse_braced_block(header_start)?;
        body.push(Stmt::new(closing, closing, StmtKind::ImplicitReturn));

        Ok(Rc::new(MethodDecl {
            loc: self.pop_loc(),
            name_loc,
            access,
            return_type,
            name,
            params,
            body,
            is_constructor,
        }))
    }

    /// Parse a type: a base type followed by any number of `[]`
    pub(crate) fn parse_type(&mut self, ctx: &str) -> PResult<TypeExpr> {
        self.push_start();
        let base = self.parse_base_type(ctx)?;
        let mut ty = TypeExpr::new(self.dup_loc(), base);
        while self.check_op("[") {
            self.advance()?;
            self.expect_op("]", "in array type")?;
            if matches!(ty.kind, TypeExprKind::Void) {
                return Err(self.error_at(ty.loc, "There are no arrays of void"));
            }
            ty = TypeExpr::new(self.dup_loc(), TypeExprKind::Array(Box::new(ty)));
        }
        self.pop_loc();
        Ok(ty)
    }

    pub(crate) fn parse_base_type(&mut self, ctx: &str) -> PResult<TypeExprKind> {
        let kind = match self.token {
            TokenKind::Keyword(Keyword::Int) => TypeExprKind::Int,
            TokenKind::Keyword(Keyword::Boolean) => TypeExprKind::Boolean,
            TokenKind::Keyword(Keyword::Void) => TypeExprKind::Void,
            TokenKind::TypeIdent => TypeExprKind::Named(self.scanner.value().to_string()),
            TokenKind::Keyword(keyword) if keyword.is_unsupported_primitive() => {
                return Err(self.error(format!(
                    "Type '{}' is not supported; use int instead",
                    keyword.as_str()
                )))
            }
            TokenKind::Ident => {
                return Err(self.error(format!(
                    "Unknown type '{}': a class name must start with an uppercase letter",
                    self.scanner.value()
                )))
            }
            _ => {
                return Err(self.error(format!(
                    "Expected {} type, found {}",
                    ctx, self.token
                )))
            }
        };
        self.advance()?;
        Ok(kind)
    }

    fn check_member_indentation(
        &self,
        header_start: usize,
        member_indent: &mut Option<usize>,
    ) -> PResult<()> {
        let start = self.token_start();
        if !self.options.check_indentation || !self.starts_line(start) {
            return Ok(());
        }
        let indent = self.indentation(start);
        if indent <= self.indentation(header_start) {
            return Err(self.error(
                "More indentation expected: class members must be indented more than the class header",
            ));
        }
        match member_indent {
            Some(expected) if *expected != indent => Err(self.error(
                "Inconsistent indentation: this member should be aligned with the previous members",
            )),
            Some(_) => Ok(()),
            None => {
                *member_indent = Some(indent);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::errors::Error;
    use crate::parser::ast::*;
    use crate::parser::parse::parse_declarations;

    fn parse_error(source: &str) -> String {
        match parse_declarations(DocId(0), source) {
            Err(Error::Parse(e)) => e.message,
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_class() {
        let source = "\
class Account {
    private int balance;
    Account(int initial) {
        balance = initial;
    }
    public int getBalance() {
        return balance;
    }
}
";
        let decls = parse_declarations(DocId(0), source).unwrap();
        assert_eq!(decls.len(), 1);
        match &decls[0] {
            Declaration::Class(class) => {
                assert_eq!(class.name, "Account");
                assert_eq!(class.fields.len(), 1);
                assert_eq!(class.fields[0].access, Access::Private);
                let ctor = class.constructor.as_ref().unwrap();
                assert!(ctor.is_constructor);
                assert_eq!(ctor.params.len(), 1);
                assert_eq!(class.methods.len(), 1);
                assert_eq!(class.methods[0].access, Access::Public);
                // The body ends with the implicit return at the closing brace
                let last = class.methods[0].body.last().unwrap();
                assert!(matches!(last.kind, StmtKind::ImplicitReturn));
                assert_eq!(&source[last.loc.start..last.loc.end], "}");
            }
            other => panic!("Expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_lowercase_class_name() {
        assert!(parse_error("class point {\n}\n").contains("uppercase"));
    }

    #[test]
    fn test_field_initializer_rejected() {
        let msg = parse_error("class A {\n    int x = 1;\n}\n");
        assert!(msg.contains("constructor"), "{}", msg);
    }

    #[test]
    fn test_two_constructors_rejected() {
        let msg = parse_error("class A {\n    A() {\n    }\n    A(int x) {\n    }\n}\n");
        assert!(msg.contains("at most one constructor"), "{}", msg);
    }

    #[test]
    fn test_unsupported_modifiers() {
        assert!(parse_error("class A {\n    static int x;\n}\n").contains("'static'"));
        assert!(parse_error("class A {\n    public private int x;\n}\n")
            .contains("accessibility"));
    }

    #[test]
    fn test_unsupported_primitive() {
        let msg = parse_error("double half(int x) {\n    return x;\n}\n");
        assert!(msg.contains("use int"), "{}", msg);
    }

    #[test]
    fn test_misnamed_constructor() {
        let msg = parse_error("class A {\n    B() {\n    }\n}\n");
        assert!(msg.contains("same name as its class"), "{}", msg);
    }
}
