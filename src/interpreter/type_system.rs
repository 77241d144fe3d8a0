//! Class table and type resolution
//!
//! A [`Program`] is the checked form of the declarations: the classes (each with
//! its field and method index) and the top-level methods. It resolves written
//! [`TypeExpr`]s to [`Type`]s, caching the result on the node so the evaluator
//! never resolves a type twice.
//!
//! # Class identity
//!
//! Class types compare by [`ClassRef::id`], the position of the class in its
//! program. Heap objects keep an `Rc<Class>`, so objects created before a reload
//! still display with their original class.

use crate::interpreter::errors::{CheckError, Error};
use crate::memory::value::Value;
use crate::parser::ast::{ClassDecl, ClassRef, FieldDecl, MethodDecl, Type, TypeExpr, TypeExprKind};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// A declared class with lookup tables
#[derive(Debug)]
pub struct Class {
    pub class_ref: ClassRef,
    pub decl: Rc<ClassDecl>,
    field_index: FxHashMap<String, usize>,
    method_index: FxHashMap<String, Rc<MethodDecl>>,
}

impl Class {
    /// Index the members of `decl`, rejecting duplicate field and method names
    pub fn new(id: usize, decl: Rc<ClassDecl>) -> Result<Self, Error> {
        let mut field_index = FxHashMap::default();
        for (index, field) in decl.fields.iter().enumerate() {
            if field_index.insert(field.name.clone(), index).is_some() {
                return Err(Error::check(
                    field.loc,
                    CheckError::Duplicate {
                        what: "field",
                        name: field.name.clone(),
                    },
                ));
            }
        }

        let mut method_index = FxHashMap::default();
        for method in &decl.methods {
            if method_index
                .insert(method.name.clone(), Rc::clone(method))
                .is_some()
            {
                return Err(Error::check(
                    method.name_loc,
                    CheckError::Duplicate {
                        what: "method",
                        name: method.name.clone(),
                    },
                ));
            }
        }

        Ok(Class {
            class_ref: ClassRef {
                id,
                name: Rc::from(decl.name.as_str()),
            },
            decl,
            field_index,
            method_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn ty(&self) -> Type {
        Type::Class(self.class_ref.clone())
    }

    /// Field slot index and declaration
    pub fn field(&self, name: &str) -> Option<(usize, &FieldDecl)> {
        let index = *self.field_index.get(name)?;
        Some((index, &self.decl.fields[index]))
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.decl.fields
    }

    pub fn method(&self, name: &str) -> Option<&Rc<MethodDecl>> {
        self.method_index.get(name)
    }

    pub fn constructor(&self) -> Option<&Rc<MethodDecl>> {
        self.decl.constructor.as_ref()
    }

    /// Initial field values of a new instance
    pub fn field_defaults(&self) -> Vec<Value> {
        self.decl
            .fields
            .iter()
            .map(|f| f.ty.resolved().map_or(Value::Null, Value::default_for))
            .collect()
    }
}

/// Checked declarations: classes and top-level methods
#[derive(Debug, Default)]
pub struct Program {
    classes: Vec<Rc<Class>>,
    class_index: FxHashMap<String, usize>,
    methods: Vec<Rc<MethodDecl>>,
    method_index: FxHashMap<String, usize>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class; the class id is its position
    pub(crate) fn add_class(&mut self, decl: Rc<ClassDecl>) -> Result<(), Error> {
        if self.class_index.contains_key(&decl.name) {
            return Err(Error::check(
                decl.name_loc,
                CheckError::Duplicate {
                    what: "class",
                    name: decl.name.clone(),
                },
            ));
        }
        let id = self.classes.len();
        let class = Class::new(id, decl)?;
        self.class_index.insert(class.decl.name.clone(), id);
        self.classes.push(Rc::new(class));
        Ok(())
    }

    pub(crate) fn add_method(&mut self, method: Rc<MethodDecl>) -> Result<(), Error> {
        if self.method_index.contains_key(&method.name) {
            return Err(Error::check(
                method.name_loc,
                CheckError::Duplicate {
                    what: "method",
                    name: method.name.clone(),
                },
            ));
        }
        self.method_index
            .insert(method.name.clone(), self.methods.len());
        self.methods.push(method);
        Ok(())
    }

    pub fn class(&self, name: &str) -> Option<&Rc<Class>> {
        self.class_index.get(name).map(|&id| &self.classes[id])
    }

    pub fn class_by_ref(&self, class_ref: &ClassRef) -> Option<&Rc<Class>> {
        self.classes
            .get(class_ref.id)
            .filter(|class| class.class_ref == *class_ref)
    }

    pub fn classes(&self) -> &[Rc<Class>] {
        &self.classes
    }

    /// Top-level method by name
    pub fn method(&self, name: &str) -> Option<&Rc<MethodDecl>> {
        self.method_index.get(name).map(|&id| &self.methods[id])
    }

    pub fn methods(&self) -> &[Rc<MethodDecl>] {
        &self.methods
    }

    /// Resolve a written type, caching the result on the node
    pub fn resolve(&self, ty: &TypeExpr) -> Result<Type, Error> {
        if let Some(resolved) = ty.resolved() {
            return Ok(resolved.clone());
        }
        let resolved = match &ty.kind {
            TypeExprKind::Int => Type::Int,
            TypeExprKind::Boolean => Type::Boolean,
            TypeExprKind::Void => Type::Void,
            TypeExprKind::Named(name) => match self.class(name) {
                Some(class) => class.ty(),
                None => {
                    return Err(Error::check(
                        ty.loc,
                        CheckError::ClassNotFound { name: name.clone() },
                    ))
                }
            },
            TypeExprKind::Array(element) => Type::Array(Box::new(self.resolve(element)?)),
        };
        Ok(ty.set_resolved(resolved).clone())
    }
}

/// Declared return type of a checked method; `void` for constructors
pub fn return_type(method: &MethodDecl) -> Type {
    method
        .return_type
        .resolved()
        .cloned()
        .unwrap_or(Type::Void)
}

/// Display name of a method for call stacks and diagnostics
pub fn method_title(class: Option<&str>, method: &MethodDecl) -> String {
    match class {
        Some(class) if method.is_constructor => format!("new {}", class),
        Some(class) => format!("{}.{}", class, method.name),
        None => method.name.clone(),
    }
}
