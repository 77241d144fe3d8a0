//! Static type checker
//!
//! Checking runs in two phases:
//!
//! 1. [`check_declarations`] enters every class and top-level method into a
//!    [`Program`], resolves all field, parameter and return types (so
//!    declarations may refer to classes declared later), then checks every method
//!    and constructor body.
//! 2. [`Checker::for_toplevel`] checks top-level statements and expressions
//!    against a checked program and the variables already declared at the top
//!    level of the session.
//!
//! Every expression gets its static type recorded on the node. Errors carry the
//! location of the offending construct and, for type mismatches, the reason the
//! expected type was expected.

use crate::interpreter::errors::{CheckError, Error};
use crate::interpreter::type_system::{return_type, Class, Program};
use crate::parser::ast::*;
use log::debug;
use rustc_hash::FxHashMap;
use std::rc::Rc;

type CResult<T> = Result<T, Error>;

/// Enter, resolve and check a list of declarations
pub fn check_declarations(declarations: &[Declaration]) -> Result<Program, Error> {
    let mut program = Program::new();

    for declaration in declarations {
        match declaration {
            Declaration::Class(class) => program.add_class(Rc::clone(class))?,
            Declaration::Method(method) => program.add_method(Rc::clone(method))?,
        }
    }

    // Resolve signatures before any body so that bodies may use any declaration
    for class in program.classes() {
        for field in class.fields() {
            program.resolve(&field.ty)?;
        }
        for method in class.constructor().into_iter().chain(class.decl.methods.iter()) {
            resolve_signature(&program, method)?;
        }
    }
    for method in program.methods() {
        resolve_signature(&program, method)?;
    }

    for class in program.classes() {
        for method in class.constructor().into_iter().chain(class.decl.methods.iter()) {
            Checker::new(&program, Some(Rc::clone(class))).check_method(method)?;
        }
    }
    for method in program.methods() {
        Checker::new(&program, None).check_method(method)?;
    }

    debug!(
        "checked {} classes and {} top-level methods",
        program.classes().len(),
        program.methods().len()
    );
    Ok(program)
}

fn resolve_signature(program: &Program, method: &MethodDecl) -> CResult<()> {
    program.resolve(&method.return_type)?;
    for param in &method.params {
        program.resolve(&param.ty)?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct VarInfo {
    ty: Type,
}

/// Type checker for method bodies and top-level code
pub struct Checker<'p> {
    program: &'p Program,
    scopes: Vec<FxHashMap<String, VarInfo>>,
    /// Enclosing class of the method being checked
    class: Option<Rc<Class>>,
    /// Result type of the enclosing method; `None` at the top level
    result_type: Option<Type>,
}

impl<'p> Checker<'p> {
    fn new(program: &'p Program, class: Option<Rc<Class>>) -> Self {
        Checker {
            program,
            scopes: vec![FxHashMap::default()],
            class,
            result_type: None,
        }
    }

    /// Checker for top-level code, aware of the variables declared so far
    pub fn for_toplevel<'b>(
        program: &'p Program,
        bindings: impl IntoIterator<Item = (&'b str, &'b Type)>,
    ) -> Self {
        let mut checker = Checker::new(program, None);
        for (name, ty) in bindings {
            checker.scopes[0].insert(name.to_string(), VarInfo { ty: ty.clone() });
        }
        checker
    }

    /// Check a list of top-level statements
    pub fn check_statements(&mut self, statements: &[Rc<Stmt>]) -> CResult<()> {
        for stmt in statements {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    /// Check a top-level expression and return its type
    pub fn check_expression(&mut self, expr: &Expr) -> CResult<Type> {
        self.check_expr(expr)
    }

    fn check_method(&mut self, method: &MethodDecl) -> CResult<()> {
        self.result_type = Some(return_type(method));
        for param in &method.params {
            let ty = self.program.resolve(&param.ty)?;
            self.declare(&param.name, ty, param.loc, "parameter")?;
        }
        for stmt in &method.body {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    // ===== Scopes =====

    fn declare(&mut self, name: &str, ty: Type, loc: Loc, what: &'static str) -> CResult<()> {
        let scope = self
            .scopes
            .last_mut()
            .ok_or_else(|| Error::check(loc, CheckError::UndeclaredVariable { name: name.into() }))?;
        if scope.contains_key(name) {
            return Err(Error::check(
                loc,
                CheckError::Duplicate {
                    what,
                    name: name.to_string(),
                },
            ));
        }
        scope.insert(name.to_string(), VarInfo { ty });
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<&VarInfo> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> CResult<T>) -> CResult<T> {
        self.scopes.push(FxHashMap::default());
        let result = f(self);
        self.scopes.pop();
        result
    }

    // ===== Statements =====

    fn check_stmt(&mut self, stmt: &Stmt) -> CResult<()> {
        match &stmt.kind {
            StmtKind::VarDecl {
                ty,
                name,
                name_loc,
                init,
            } => {
                let declared = self.program.resolve(ty)?;
                if declared == Type::Void {
                    return Err(Error::check(
                        ty.loc,
                        CheckError::BadType {
                            ty: declared.to_string(),
                            reason: "variables cannot have type void",
                        },
                    ));
                }
                let actual = self.check_value(init)?;
                self.expect_assignable(
                    init,
                    &actual,
                    &declared,
                    || format!("variable '{}' is declared with type {}", name, declared),
                )?;
                self.declare(name, declared, *name_loc, "variable")
            }

            StmtKind::Expr(expr) => {
                if !matches!(
                    expr.kind,
                    ExprKind::Assign { .. }
                        | ExprKind::IncDec { .. }
                        | ExprKind::Call { .. }
                        | ExprKind::New { .. }
                ) {
                    return Err(Error::check(expr.loc, CheckError::NotAStatement));
                }
                self.check_expr(expr).map(|_| ())
            }

            StmtKind::Return(value) => {
                let Some(expected) = self.result_type.clone() else {
                    return Err(Error::check(stmt.instr_loc, CheckError::ReturnOutsideMethod));
                };
                match (value, &expected) {
                    (None, Type::Void) => Ok(()),
                    (None, _) => Err(Error::check(
                        stmt.loc,
                        CheckError::MissingReturnValue { expected },
                    )),
                    (Some(value), Type::Void) => {
                        Err(Error::check(value.loc, CheckError::UnexpectedReturnValue))
                    }
                    (Some(value), _) => {
                        let actual = self.check_value(value)?;
                        self.expect_assignable(value, &actual, &expected, || {
                            format!("the method's return type is {}", expected)
                        })
                    }
                }
            }

            StmtKind::Block(statements) => self.with_scope(|checker| {
                for stmt in statements {
                    checker.check_stmt(stmt)?;
                }
                Ok(())
            }),

            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.expect_type(cond, &Type::Boolean, "the condition of 'if' must be boolean")?;
                self.with_scope(|checker| checker.check_stmt(then_branch))?;
                if let Some(else_branch) = else_branch {
                    self.with_scope(|checker| checker.check_stmt(else_branch))?;
                }
                Ok(())
            }

            StmtKind::While { cond, body } => {
                self.expect_type(cond, &Type::Boolean, "a loop condition must be boolean")?;
                self.with_scope(|checker| checker.check_stmt(body))
            }

            StmtKind::Assert(cond) => {
                self.expect_type(cond, &Type::Boolean, "an assertion must be boolean")
            }

            StmtKind::ImplicitReturn => Ok(()),
        }
    }

    // ===== Expressions =====

    /// Check an expression and record its type on the node
    fn check_expr(&mut self, expr: &Expr) -> CResult<Type> {
        let ty = self.infer(expr)?;
        expr.set_ty(ty.clone());
        Ok(ty)
    }

    /// Check an expression whose value is used
    fn check_value(&mut self, expr: &Expr) -> CResult<Type> {
        let ty = self.check_expr(expr)?;
        if ty == Type::Void {
            return Err(Error::check(expr.loc, CheckError::VoidValue));
        }
        Ok(ty)
    }

    fn expect_type(&mut self, expr: &Expr, expected: &Type, explanation: &str) -> CResult<()> {
        let actual = self.check_value(expr)?;
        if actual != *expected {
            return Err(Error::check(
                expr.loc,
                CheckError::TypeMismatch {
                    expected: expected.to_string(),
                    found: actual,
                    explanation: explanation.to_string(),
                },
            ));
        }
        Ok(())
    }

    fn expect_assignable(
        &self,
        expr: &Expr,
        actual: &Type,
        expected: &Type,
        explanation: impl FnOnce() -> String,
    ) -> CResult<()> {
        if actual.is_assignable_to(expected) {
            return Ok(());
        }
        Err(Error::check(
            expr.loc,
            CheckError::TypeMismatch {
                expected: expected.to_string(),
                found: actual.clone(),
                explanation: explanation(),
            },
        ))
    }

    fn infer(&mut self, expr: &Expr) -> CResult<Type> {
        match &expr.kind {
            ExprKind::IntLiteral(_) => Ok(Type::Int),
            ExprKind::BoolLiteral(_) => Ok(Type::Boolean),
            ExprKind::NullLiteral => Ok(Type::Null),

            ExprKind::This => match &self.class {
                Some(class) => Ok(class.ty()),
                None => Err(Error::check(expr.loc, CheckError::ThisOutsideClass)),
            },

            ExprKind::Variable(name) => {
                if let Some(var) = self.lookup(name) {
                    return Ok(var.ty.clone());
                }
                // Unqualified field of the enclosing class
                if let Some((_, field)) = self.class.as_ref().and_then(|c| c.field(name)) {
                    return self.program.resolve(&field.ty);
                }
                Err(Error::check(
                    expr.loc,
                    CheckError::UndeclaredVariable { name: name.clone() },
                ))
            }

            ExprKind::Unary { op, operand } => {
                let (expected, ty) = match op {
                    UnaryOp::Neg | UnaryOp::BitNot => (Type::Int, Type::Int),
                    UnaryOp::Not => (Type::Boolean, Type::Boolean),
                };
                self.expect_type(
                    operand,
                    &expected,
                    &format!("the operand of '{}' must be {}", op.symbol(), expected),
                )?;
                Ok(ty)
            }

            ExprKind::Binary { op, left, right } => self.check_binary(expr, *op, left, right),

            ExprKind::Assign { op, target, value } => {
                let target_ty = self.check_target(target)?;
                match op {
                    None => {
                        let actual = self.check_value(value)?;
                        self.expect_assignable(value, &actual, &target_ty, || {
                            self.describe_target(target, &target_ty)
                        })?;
                    }
                    Some(op) => {
                        let operand_ty = self.compound_operand_type(target, &target_ty, *op)?;
                        self.expect_type(
                            value,
                            &operand_ty,
                            &format!("the operands of '{}=' must be {}", op.symbol(), operand_ty),
                        )?;
                    }
                }
                Ok(target_ty)
            }

            ExprKind::IncDec { target, op, .. } => {
                let target_ty = self.check_target(target)?;
                if target_ty != Type::Int {
                    let symbol = match op {
                        IncDecOp::Increment => "++",
                        IncDecOp::Decrement => "--",
                    };
                    return Err(Error::check(
                        target.loc,
                        CheckError::TypeMismatch {
                            expected: Type::Int.to_string(),
                            found: target_ty,
                            explanation: format!("only int variables can be used with '{}'", symbol),
                        },
                    ));
                }
                Ok(Type::Int)
            }

            ExprKind::New { class, args } => {
                let ty = self.program.resolve(class)?;
                let Type::Class(class_ref) = &ty else {
                    return Err(Error::check(
                        class.loc,
                        CheckError::BadType {
                            ty: ty.to_string(),
                            reason: "only classes can be instantiated with 'new C(...)'",
                        },
                    ));
                };
                let Some(class) = self.program.class_by_ref(class_ref).cloned() else {
                    return Err(Error::check(
                        expr.loc,
                        CheckError::ClassNotFound {
                            name: class_ref.name.to_string(),
                        },
                    ));
                };
                let callee = format!("the constructor of class {}", class.name());
                match class.constructor() {
                    Some(ctor) => self.check_arguments(expr, &callee, ctor, args)?,
                    None if !args.is_empty() => {
                        return Err(Error::check(
                            expr.loc,
                            CheckError::ArityMismatch {
                                callee,
                                expected: 0,
                                found: args.len(),
                            },
                        ))
                    }
                    None => {}
                }
                Ok(ty)
            }

            ExprKind::NewArray {
                element,
                length,
                initializer,
            } => {
                let element_ty = self.program.resolve(element)?;
                match (length, initializer) {
                    (Some(_), Some(_)) => {
                        return Err(Error::check(
                            expr.loc,
                            CheckError::BadArrayCreation {
                                reason: "give either a length or an initializer, not both",
                            },
                        ))
                    }
                    (None, None) => {
                        return Err(Error::check(
                            expr.loc,
                            CheckError::BadArrayCreation {
                                reason: "a length or an initializer is required",
                            },
                        ))
                    }
                    (Some(length), None) => {
                        self.expect_type(length, &Type::Int, "an array length must be int")?
                    }
                    (None, Some(elements)) => {
                        for value in elements {
                            let actual = self.check_value(value)?;
                            self.expect_assignable(value, &actual, &element_ty, || {
                                format!("the elements of this array have type {}", element_ty)
                            })?;
                        }
                    }
                }
                Ok(Type::Array(Box::new(element_ty)))
            }

            ExprKind::Select { target, field } => {
                let target_ty = self.check_value(target)?;
                match &target_ty {
                    Type::Class(class_ref) => {
                        let class = self.class_of(target, class_ref)?;
                        match class.field(field) {
                            Some((_, decl)) => self.program.resolve(&decl.ty),
                            None => Err(Error::check(
                                expr.instr_loc,
                                CheckError::FieldNotFound {
                                    class: class.name().to_string(),
                                    field: field.clone(),
                                },
                            )),
                        }
                    }
                    Type::Array(_) if field == "length" => Ok(Type::Int),
                    Type::Array(_) => Err(Error::check(
                        expr.instr_loc,
                        CheckError::FieldNotFound {
                            class: target_ty.to_string(),
                            field: field.clone(),
                        },
                    )),
                    _ => Err(Error::check(
                        target.loc,
                        CheckError::NotAnObject { found: target_ty },
                    )),
                }
            }

            ExprKind::Subscript { target, index } => {
                let target_ty = self.check_value(target)?;
                let Type::Array(element) = target_ty else {
                    return Err(Error::check(
                        target.loc,
                        CheckError::TypeMismatch {
                            expected: "an array".to_string(),
                            found: target_ty,
                            explanation: "only arrays can be indexed".to_string(),
                        },
                    ));
                };
                self.expect_type(index, &Type::Int, "an array index must be int")?;
                Ok(*element)
            }

            ExprKind::Call { callee, args } => self.check_call(expr, callee, args),
        }
    }

    fn check_binary(&mut self, expr: &Expr, op: BinaryOp, left: &Expr, right: &Expr) -> CResult<Type> {
        match op {
            BinaryOp::And | BinaryOp::Or => {
                let explanation = format!("the operands of '{}' must be boolean", op.symbol());
                self.expect_type(left, &Type::Boolean, &explanation)?;
                self.expect_type(right, &Type::Boolean, &explanation)?;
                Ok(Type::Boolean)
            }

            BinaryOp::Eq | BinaryOp::Ne => {
                let is_fresh = |e: &Expr| matches!(e.kind, ExprKind::New { .. } | ExprKind::NewArray { .. });
                if is_fresh(left) || is_fresh(right) {
                    return Err(Error::check(expr.loc, CheckError::FreshObjectComparison));
                }
                let left_ty = self.check_value(left)?;
                let right_ty = self.check_value(right)?;
                let comparable = if left_ty.is_primitive() || right_ty.is_primitive() {
                    left_ty == right_ty
                } else {
                    left_ty == right_ty
                        || left_ty.is_assignable_to(&right_ty)
                        || right_ty.is_assignable_to(&left_ty)
                };
                if !comparable {
                    return Err(Error::check(
                        expr.loc,
                        CheckError::IncomparableTypes {
                            left: left_ty,
                            right: right_ty,
                        },
                    ));
                }
                Ok(Type::Boolean)
            }

            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let explanation = format!("the operands of '{}' must be int", op.symbol());
                self.expect_type(left, &Type::Int, &explanation)?;
                self.expect_type(right, &Type::Int, &explanation)?;
                Ok(Type::Boolean)
            }

            _ => {
                let left_ty = self.check_value(left)?;
                // &, | and ^ also work on booleans, without short-circuit
                let bitwise = matches!(op, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor);
                let operand_ty = if bitwise && left_ty == Type::Boolean {
                    Type::Boolean
                } else {
                    Type::Int
                };
                let explanation = format!("the operands of '{}' must be {}", op.symbol(), operand_ty);
                if left_ty != operand_ty {
                    return Err(Error::check(
                        left.loc,
                        CheckError::TypeMismatch {
                            expected: operand_ty.to_string(),
                            found: left_ty,
                            explanation,
                        },
                    ));
                }
                self.expect_type(right, &operand_ty, &explanation)?;
                Ok(operand_ty)
            }
        }
    }

    /// Check an assignment target and return its type
    fn check_target(&mut self, target: &Expr) -> CResult<Type> {
        match &target.kind {
            ExprKind::Variable(_) | ExprKind::Subscript { .. } => self.check_value(target),
            ExprKind::Select { target: object, field } => {
                let ty = self.check_value(target)?;
                if field == "length" && matches!(object.ty(), Some(Type::Array(_))) {
                    return Err(Error::check(
                        target.loc,
                        CheckError::BadAssignmentTarget {
                            reason: "the length of an array cannot be changed".to_string(),
                        },
                    ));
                }
                Ok(ty)
            }
            ExprKind::This => Err(Error::check(
                target.loc,
                CheckError::BadAssignmentTarget {
                    reason: "'this' cannot be assigned".to_string(),
                },
            )),
            _ => Err(Error::check(
                target.loc,
                CheckError::BadAssignmentTarget {
                    reason: "only variables, fields and array elements can be assigned".to_string(),
                },
            )),
        }
    }

    fn compound_operand_type(&self, target: &Expr, target_ty: &Type, op: BinaryOp) -> CResult<Type> {
        let boolean_ok = matches!(op, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor);
        match target_ty {
            Type::Int => Ok(Type::Int),
            Type::Boolean if boolean_ok => Ok(Type::Boolean),
            _ => Err(Error::check(
                target.loc,
                CheckError::TypeMismatch {
                    expected: Type::Int.to_string(),
                    found: target_ty.clone(),
                    explanation: format!("the operands of '{}=' must be int", op.symbol()),
                },
            )),
        }
    }

    fn describe_target(&self, target: &Expr, ty: &Type) -> String {
        match &target.kind {
            ExprKind::Variable(name) if self.lookup(name).is_some() => {
                format!("variable '{}' is declared with type {}", name, ty)
            }
            ExprKind::Variable(name) | ExprKind::Select { field: name, .. } => {
                format!("field '{}' is declared with type {}", name, ty)
            }
            _ => format!("the elements of this array have type {}", ty),
        }
    }

    fn class_of(&self, expr: &Expr, class_ref: &ClassRef) -> CResult<Rc<Class>> {
        self.program.class_by_ref(class_ref).cloned().ok_or_else(|| {
            Error::check(
                expr.loc,
                CheckError::ClassNotFound {
                    name: class_ref.name.to_string(),
                },
            )
        })
    }

    fn check_call(&mut self, expr: &Expr, callee: &Callee, args: &[Rc<Expr>]) -> CResult<Type> {
        let method = match callee {
            Callee::Function(name) => {
                let in_class = self.class.as_ref().and_then(|c| c.method(name)).cloned();
                match in_class.or_else(|| self.program.method(name).cloned()) {
                    Some(method) => method,
                    None => {
                        let owner = match &self.class {
                            Some(class) => format!("class {} (or the program)", class.name()),
                            None => "the program".to_string(),
                        };
                        return Err(Error::check(
                            expr.instr_loc,
                            CheckError::MethodNotFound {
                                owner,
                                name: name.clone(),
                            },
                        ));
                    }
                }
            }
            Callee::Method { receiver, name } => {
                let receiver_ty = self.check_value(receiver)?;
                match &receiver_ty {
                    Type::Class(class_ref) => {
                        let class = self.class_of(receiver, class_ref)?;
                        match class.method(name) {
                            Some(method) => Rc::clone(method),
                            None => {
                                return Err(Error::check(
                                    expr.instr_loc,
                                    CheckError::MethodNotFound {
                                        owner: format!("class {}", class.name()),
                                        name: name.clone(),
                                    },
                                ))
                            }
                        }
                    }
                    Type::Array(_) if name == "clone" => {
                        if !args.is_empty() {
                            return Err(Error::check(
                                expr.loc,
                                CheckError::ArityMismatch {
                                    callee: "method 'clone'".to_string(),
                                    expected: 0,
                                    found: args.len(),
                                },
                            ));
                        }
                        return Ok(receiver_ty);
                    }
                    Type::Array(_) => {
                        return Err(Error::check(
                            expr.instr_loc,
                            CheckError::MethodNotFound {
                                owner: format!("type {}", receiver_ty),
                                name: name.clone(),
                            },
                        ))
                    }
                    _ => {
                        return Err(Error::check(
                            receiver.loc,
                            CheckError::NotAnObject { found: receiver_ty },
                        ))
                    }
                }
            }
        };

        self.check_arguments(expr, &format!("method '{}'", method.name), &method, args)?;
        Ok(return_type(&method))
    }

    fn check_arguments(
        &mut self,
        expr: &Expr,
        callee: &str,
        method: &MethodDecl,
        args: &[Rc<Expr>],
    ) -> CResult<()> {
        if args.len() != method.params.len() {
            return Err(Error::check(
                expr.loc,
                CheckError::ArityMismatch {
                    callee: callee.to_string(),
                    expected: method.params.len(),
                    found: args.len(),
                },
            ));
        }
        for (arg, param) in args.iter().zip(&method.params) {
            let expected = self.program.resolve(&param.ty)?;
            let actual = self.check_value(arg)?;
            self.expect_assignable(arg, &actual, &expected, || {
                format!(
                    "parameter '{}' of {} has type {}",
                    param.name, callee, expected
                )
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::{parse_declarations, parse_statements};
    use pretty_assertions::assert_eq;

    const DOC: DocId = DocId(0);

    fn check_program(source: &str) -> Result<Program, Error> {
        check_declarations(&parse_declarations(DOC, source).unwrap())
    }

    fn check_toplevel(declarations: &str, statements: &str) -> Result<(), Error> {
        let program = check_program(declarations).unwrap();
        let stmts = parse_statements(DOC, statements).unwrap();
        Checker::for_toplevel(&program, std::iter::empty()).check_statements(&stmts)
    }

    fn check_kind(result: Result<(), Error>) -> CheckError {
        match result {
            Err(Error::Check { kind, .. }) => kind,
            other => panic!("Expected check error, got {:?}", other),
        }
    }

    #[test]
    fn test_forward_class_reference() {
        let source = "\
class Node {
    Node next;
    Box box;
}
class Box {
    int value;
}
";
        let program = check_program(source).unwrap();
        assert_eq!(program.classes().len(), 2);
    }

    #[test]
    fn test_unknown_class() {
        let err = check_program("class A {\n    Missing m;\n}\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Check {
                kind: CheckError::ClassNotFound { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_method() {
        let err = check_program("void f() {\n}\nvoid f() {\n}\n").unwrap_err();
        assert!(err.to_string().contains("already declared"));
    }

    #[test]
    fn test_type_mismatch_explains_declaration() {
        let kind = check_kind(check_toplevel("", "int x = true;"));
        assert_eq!(
            kind,
            CheckError::TypeMismatch {
                expected: "int".to_string(),
                found: Type::Boolean,
                explanation: "variable 'x' is declared with type int".to_string(),
            }
        );
    }

    #[test]
    fn test_arity_mismatch() {
        let kind = check_kind(check_toplevel(
            "int add(int a, int b) {\n    return a + b;\n}\n",
            "int s = add(1);",
        ));
        assert_eq!(
            kind,
            CheckError::ArityMismatch {
                callee: "method 'add'".to_string(),
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn test_argument_type_mismatch_names_parameter() {
        let kind = check_kind(check_toplevel(
            "int inc(int n) {\n    return n + 1;\n}\n",
            "int s = inc(false);",
        ));
        match kind {
            CheckError::TypeMismatch { explanation, .. } => {
                assert_eq!(explanation, "parameter 'n' of method 'inc' has type int")
            }
            other => panic!("Expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_redeclaration_rejected_shadowing_allowed() {
        let kind = check_kind(check_toplevel("", "int x = 1;\nint x = 2;"));
        assert!(matches!(kind, CheckError::Duplicate { what: "variable", .. }));
        check_toplevel("", "int x = 1;\nif (x > 0) {\n    int x = 2;\n}\n").unwrap();
    }

    #[test]
    fn test_fresh_object_comparison() {
        let kind = check_kind(check_toplevel(
            "class P {\n}\n",
            "P p = new P();\nboolean b = p == new P();",
        ));
        assert_eq!(kind, CheckError::FreshObjectComparison);
    }

    #[test]
    fn test_not_a_statement() {
        let kind = check_kind(check_toplevel("", "int x = 1;\nx + 1;"));
        assert_eq!(kind, CheckError::NotAStatement);
    }

    #[test]
    fn test_array_length_is_read_only() {
        let kind = check_kind(check_toplevel("", "int[] a = new int[2];\na.length = 3;"));
        assert!(matches!(kind, CheckError::BadAssignmentTarget { .. }));
    }

    #[test]
    fn test_array_creation_needs_exactly_one_form() {
        let kind = check_kind(check_toplevel("", "int[] a = new int[2]{1, 2};"));
        assert!(matches!(kind, CheckError::BadArrayCreation { .. }));
    }

    #[test]
    fn test_return_rules() {
        let err = check_program("int f() {\n    return;\n}\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Check {
                kind: CheckError::MissingReturnValue { .. },
                ..
            }
        ));
        let err = check_program("void f() {\n    return 1;\n}\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Check {
                kind: CheckError::UnexpectedReturnValue,
                ..
            }
        ));
        let kind = check_kind(check_toplevel("", "return;"));
        assert_eq!(kind, CheckError::ReturnOutsideMethod);
    }

    #[test]
    fn test_methods_do_not_see_toplevel_but_see_fields() {
        let source = "\
class Counter {
    int count;
    void bump() {
        count++;
        this.count = count + step();
    }
    int step() {
        return 1;
    }
}
";
        check_program(source).unwrap();
        let err = check_program("int f() {\n    return x;\n}\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Check {
                kind: CheckError::UndeclaredVariable { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_expression_types_recorded() {
        let program = check_program("").unwrap();
        let expr = crate::parser::parse::parse_expression(DOC, "1 < 2 && true").unwrap();
        let ty = Checker::for_toplevel(&program, std::iter::empty())
            .check_expression(&expr)
            .unwrap();
        assert_eq!(ty, Type::Boolean);
        assert_eq!(expr.ty(), Some(Type::Boolean));
    }

    #[test]
    fn test_toplevel_bindings_seed_scope() {
        let program = check_program("").unwrap();
        let stmts = parse_statements(DOC, "x = x + 1;").unwrap();
        let existing = [("x".to_string(), Type::Int)];
        Checker::for_toplevel(&program, existing.iter().map(|(n, t)| (n.as_str(), t)))
            .check_statements(&stmts)
            .unwrap();
        let redeclare = parse_statements(DOC, "int x = 0;").unwrap();
        assert!(
            Checker::for_toplevel(&program, existing.iter().map(|(n, t)| (n.as_str(), t)))
                .check_statements(&redeclare)
                .is_err()
        );
    }
}
