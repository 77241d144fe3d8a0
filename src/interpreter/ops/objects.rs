//! Object creation and method invocation
//!
//! # Calls
//!
//! Invoking a method pushes a frame whose first scope has no parent, binds the
//! parameters positionally and schedules the body on top of a
//! [`Task::CallBoundary`]. The body always ends with the implicit return at its
//! closing brace, so control never reaches the boundary itself.
//!
//! An unqualified call inside a class resolves to a method of that class
//! first, then to a top-level method.
//!
//! # Creation
//!
//! `new C(args)` allocates an instance with default field values. When `C` has
//! a constructor, it runs with `this` bound to the new object; its `void`
//! result is discarded and the reference pushed afterwards.

use crate::interpreter::engine::{internal, Session, Task};
use crate::interpreter::errors::{Error, RuntimeError};
use crate::interpreter::type_system::{method_title, Class};
use crate::memory::heap::HeapObject;
use crate::memory::stack::LocalBinding;
use crate::memory::value::{ObjectId, Value};
use crate::parser::ast::{Callee, Expr, ExprKind, MethodDecl, Type};
use log::trace;
use std::rc::Rc;

impl Session {
    /// `new C(args)` with the arguments on the operand stack
    pub(crate) fn apply_new(&mut self, expr: &Expr) -> Result<(), Error> {
        let ExprKind::New { class, args } = &expr.kind else {
            return Err(internal(expr.loc, "not an object creation"));
        };
        let class = match class.resolved() {
            Some(Type::Class(class_ref)) => self.program.class_by_ref(class_ref).cloned(),
            _ => None,
        }
        .ok_or_else(|| internal(expr.loc, "object creation was not type checked"))?;

        let arguments = self.pop_values(args.len(), expr.loc)?;
        let object = self.heap.allocate(HeapObject::Instance {
            fields: class.field_defaults(),
            class: Rc::clone(&class),
        });
        trace!("allocated {}{}", class.name(), object);

        match class.constructor().cloned() {
            Some(constructor) => {
                self.schedule([Task::Discard, Task::PushValue(Value::Ref(object))]);
                self.invoke(constructor, Some(&class), Some(object), arguments, expr)
            }
            None => {
                self.push_value(Value::Ref(object));
                Ok(())
            }
        }
    }

    /// `new T[n]` or `new T[]{...}` with the length or the elements on the operand stack
    pub(crate) fn apply_new_array(&mut self, expr: &Expr) -> Result<(), Error> {
        let ExprKind::NewArray {
            element,
            length,
            initializer,
        } = &expr.kind
        else {
            return Err(internal(expr.loc, "not an array creation"));
        };
        let element = element
            .resolved()
            .cloned()
            .ok_or_else(|| internal(expr.loc, "array creation was not type checked"))?;

        let elements = match (length, initializer) {
            (Some(length), None) => {
                let n = self.pop_int(length.loc)?;
                let size = usize::try_from(n).map_err(|_| {
                    Error::execution(length.loc, RuntimeError::NegativeArrayLength { length: n })
                })?;
                let limit = self.config.max_array_length;
                if size > limit {
                    return Err(Error::execution(
                        length.loc,
                        RuntimeError::ArrayTooLarge { length: n, limit },
                    ));
                }
                vec![Value::default_for(&element); size]
            }
            (None, Some(values)) => self.pop_values(values.len(), expr.loc)?,
            _ => return Err(internal(expr.loc, "array creation without a single form")),
        };
        let array = self.heap.allocate(HeapObject::Array { element, elements });
        self.push_value(Value::Ref(array));
        Ok(())
    }

    /// A call with its receiver (if any) and arguments on the operand stack
    pub(crate) fn apply_call(&mut self, expr: &Expr, callee: &Callee, arity: usize) -> Result<(), Error> {
        let arguments = self.pop_values(arity, expr.loc)?;
        match callee {
            Callee::Function(name) => {
                let this = self.call_stack.current_frame().and_then(|frame| frame.this);
                if let Some(this) = this {
                    let class = self.instance_class(this, expr)?;
                    if let Some(method) = class.method(name).cloned() {
                        return self.invoke(method, Some(&class), Some(this), arguments, expr);
                    }
                }
                let method = self
                    .program
                    .method(name)
                    .cloned()
                    .ok_or_else(|| internal(expr.loc, format!("no method named '{}'", name)))?;
                self.invoke(method, None, None, arguments, expr)
            }

            Callee::Method { receiver, name } => {
                let reference = self.pop_value(receiver.loc)?;
                let object = self.dereference(reference, receiver.loc)?;
                let class = match self.object(object, receiver.loc)? {
                    HeapObject::Instance { class, .. } => Some(Rc::clone(class)),
                    HeapObject::Array { .. } => None,
                };
                match class {
                    Some(class) => {
                        let method = class.method(name).cloned().ok_or_else(|| {
                            internal(expr.loc, format!("class {} has no method '{}'", class.name(), name))
                        })?;
                        self.invoke(method, Some(&class), Some(object), arguments, expr)
                    }
                    None if name == "clone" => {
                        let copy = self.clone_array(object, expr.loc)?;
                        self.push_value(Value::Ref(copy));
                        Ok(())
                    }
                    None => Err(internal(expr.loc, format!("arrays have no method '{}'", name))),
                }
            }
        }
    }

    fn instance_class(&self, object: ObjectId, expr: &Expr) -> Result<Rc<Class>, Error> {
        match self.object(object, expr.loc)? {
            HeapObject::Instance { class, .. } => Ok(Rc::clone(class)),
            HeapObject::Array { .. } => Err(internal(expr.loc, "'this' is an array")),
        }
    }

    /// Push a frame for `method` and schedule its body
    pub(crate) fn invoke(
        &mut self,
        method: Rc<MethodDecl>,
        class: Option<&Class>,
        this: Option<ObjectId>,
        arguments: Vec<Value>,
        call: &Expr,
    ) -> Result<(), Error> {
        let limit = self.config.max_call_depth;
        // The bottom frame holds the top level and is not a call
        if self.call_stack.depth() > limit {
            return Err(Error::execution(call.loc, RuntimeError::StackOverflow { limit }));
        }
        if arguments.len() != method.params.len() {
            return Err(internal(call.loc, "argument count differs from the parameter count"));
        }

        let mut parameters = Vec::with_capacity(arguments.len());
        for (param, value) in method.params.iter().zip(arguments) {
            let ty = param
                .ty
                .resolved()
                .cloned()
                .ok_or_else(|| internal(param.loc, "parameter was not type checked"))?;
            parameters.push(LocalBinding {
                name: param.name.clone(),
                ty,
                value,
                decl_loc: param.loc,
            });
        }

        let title = method_title(class.map(Class::name), &method);
        trace!("call {} at depth {}", title, self.call_stack.depth());
        self.call_stack
            .push_frame(title, Some(Rc::clone(&method)), this, Some(call.loc));
        for binding in parameters {
            self.call_stack.declare(binding);
        }

        self.tasks.push(Task::CallBoundary);
        self.tasks
            .extend(method.body.iter().rev().map(|stmt| Task::Exec(Rc::clone(stmt))));
        Ok(())
    }
}
