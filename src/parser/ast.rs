//! Abstract Syntax Tree definitions
//!
//! Every node records two ranges of its source document:
//! - `loc`: the full extent of the construct
//! - `instr_loc`: the part highlighted when execution is suspended at the node
//!   (the operator, keyword, name or literal)
//!
//! Children are held through [`Rc`] so that the evaluator can keep pending work
//! items around without borrowing the tree. The only mutable parts of a node are
//! the type annotations written once by the checker.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Opaque handle of a source document. The core never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct DocId(pub u32);

/// Half-open byte range `[start, end)` within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Loc {
    pub doc: DocId,
    pub start: usize,
    pub end: usize,
}

impl Loc {
    pub fn new(doc: DocId, start: usize, end: usize) -> Self {
        Loc { doc, start, end }
    }

    /// Smallest range covering both `self` and `other`
    pub fn join(self, other: Loc) -> Loc {
        Loc {
            doc: self.doc,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Identity of a declared class. Two class types are equal iff their ids are.
#[derive(Debug, Clone)]
pub struct ClassRef {
    pub id: usize,
    pub name: Rc<str>,
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClassRef {}

impl std::hash::Hash for ClassRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Static types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Boolean,
    Void,
    /// Type of the `null` literal; assignable to every reference type
    Null,
    Class(ClassRef),
    Array(Box<Type>),
}

impl Type {
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Null | Type::Class(_) | Type::Array(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Int | Type::Boolean)
    }

    /// Whether a value of type `self` may be stored where `target` is expected
    pub fn is_assignable_to(&self, target: &Type) -> bool {
        match (self, target) {
            (Type::Null, t) => t.is_reference() && *t != Type::Null,
            (a, b) => a == b,
        }
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Boolean => write!(f, "boolean"),
            Type::Void => write!(f, "void"),
            Type::Null => write!(f, "null"),
            Type::Class(class) => write!(f, "{}", class.name),
            Type::Array(elem) => write!(f, "{}[]", elem),
        }
    }
}

/// Syntactic form of a type, as written in the source
#[derive(Debug, Clone)]
pub enum TypeExprKind {
    Int,
    Boolean,
    Void,
    Named(String),
    Array(Box<TypeExpr>),
}

/// A type expression together with the type the checker resolved it to
#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub loc: Loc,
    pub kind: TypeExprKind,
    resolved: OnceCell<Type>,
}

impl TypeExpr {
    pub fn new(loc: Loc, kind: TypeExprKind) -> Self {
        TypeExpr {
            loc,
            kind,
            resolved: OnceCell::new(),
        }
    }

    /// The resolved type, if the checker has visited this node
    pub fn resolved(&self) -> Option<&Type> {
        self.resolved.get()
    }

    pub(crate) fn set_resolved(&self, ty: Type) -> &Type {
        self.resolved.get_or_init(|| ty)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeExprKind::Int => write!(f, "int"),
            TypeExprKind::Boolean => write!(f, "boolean"),
            TypeExprKind::Void => write!(f, "void"),
            TypeExprKind::Named(name) => write!(f, "{}", name),
            TypeExprKind::Array(elem) => write!(f, "{}[]", elem),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Bitwise and shifts
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,

    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,

    // Logical (short-circuit)
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Increment,
    Decrement,
}

/// Callee of a call expression
#[derive(Debug, Clone)]
pub enum Callee {
    /// Unqualified `name(args)`: a method of the enclosing class or a top-level method
    Function(String),
    /// `receiver.name(args)`
    Method { receiver: Rc<Expr>, name: String },
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral(i32),
    BoolLiteral(bool),
    NullLiteral,
    This,
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Rc<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Rc<Expr>,
        right: Rc<Expr>,
    },
    /// `target = value` when `op` is `None`, `target op= value` otherwise
    Assign {
        op: Option<BinaryOp>,
        target: Rc<Expr>,
        value: Rc<Expr>,
    },
    IncDec {
        op: IncDecOp,
        prefix: bool,
        target: Rc<Expr>,
    },
    New {
        class: TypeExpr,
        args: Vec<Rc<Expr>>,
    },
    NewArray {
        element: TypeExpr,
        length: Option<Rc<Expr>>,
        initializer: Option<Vec<Rc<Expr>>>,
    },
    Select {
        target: Rc<Expr>,
        field: String,
    },
    Subscript {
        target: Rc<Expr>,
        index: Rc<Expr>,
    },
    Call {
        callee: Callee,
        args: Vec<Rc<Expr>>,
    },
}

/// Expression node
#[derive(Debug)]
pub struct Expr {
    pub loc: Loc,
    pub instr_loc: Loc,
    pub kind: ExprKind,
    ty: RefCell<Option<Type>>,
}

impl Expr {
    pub fn new(loc: Loc, instr_loc: Loc, kind: ExprKind) -> Rc<Self> {
        Rc::new(Expr {
            loc,
            instr_loc,
            kind,
            ty: RefCell::new(None),
        })
    }

    /// Static type recorded by the checker
    pub fn ty(&self) -> Option<Type> {
        self.ty.borrow().clone()
    }

    pub(crate) fn set_ty(&self, ty: Type) {
        *self.ty.borrow_mut() = Some(ty);
    }

    /// Whether the expression is a valid assignment target syntactically
    pub fn is_place(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Variable(_) | ExprKind::Select { .. } | ExprKind::Subscript { .. }
        )
    }
}

#[derive(Debug)]
pub enum StmtKind {
    VarDecl {
        ty: TypeExpr,
        name: String,
        name_loc: Loc,
        init: Rc<Expr>,
    },
    Expr(Rc<Expr>),
    Return(Option<Rc<Expr>>),
    Block(Vec<Rc<Stmt>>),
    If {
        cond: Rc<Expr>,
        then_branch: Rc<Stmt>,
        else_branch: Option<Rc<Stmt>>,
    },
    While {
        cond: Rc<Expr>,
        body: Rc<Stmt>,
    },
    Assert(Rc<Expr>),
    /// Reached when control falls off the closing brace of a method body
    ImplicitReturn,
}

/// Statement node
#[derive(Debug)]
pub struct Stmt {
    pub loc: Loc,
    pub instr_loc: Loc,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(loc: Loc, instr_loc: Loc, kind: StmtKind) -> Rc<Self> {
        Rc::new(Stmt {
            loc,
            instr_loc,
            kind,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    Package,
    Public,
    Private,
}

#[derive(Debug)]
pub struct Param {
    pub loc: Loc,
    pub ty: TypeExpr,
    pub name: String,
}

#[derive(Debug)]
pub struct FieldDecl {
    pub loc: Loc,
    pub access: Access,
    pub ty: TypeExpr,
    pub name: String,
}

/// Method, top-level method or constructor
#[derive(Debug)]
pub struct MethodDecl {
    pub loc: Loc,
    pub name_loc: Loc,
    pub access: Access,
    /// `void` for constructors
    pub return_type: TypeExpr,
    pub name: String,
    pub params: Vec<Param>,
    /// Body statements; the last one is always [`StmtKind::ImplicitReturn`]
    pub body: Vec<Rc<Stmt>>,
    pub is_constructor: bool,
}

impl MethodDecl {
    /// Location of the closing brace of the body
    pub fn closing_brace(&self) -> Loc {
        self.body.last().map(|s| s.loc).unwrap_or(self.loc)
    }
}

#[derive(Debug)]
pub struct ClassDecl {
    pub loc: Loc,
    pub name_loc: Loc,
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub constructor: Option<Rc<MethodDecl>>,
    pub methods: Vec<Rc<MethodDecl>>,
}

#[derive(Debug, Clone)]
pub enum Declaration {
    Class(Rc<ClassDecl>),
    Method(Rc<MethodDecl>),
}

/// A source file mixing declarations and top-level statements
#[derive(Debug, Default)]
pub struct Script {
    pub declarations: Vec<Declaration>,
    pub statements: Vec<Rc<Stmt>>,
}
