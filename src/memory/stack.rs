//! Call stack implementation
//!
//! This module provides the call stack for method execution:
//! - [`CallStack`]: the frames plus the scope arena they share
//! - [`StackFrame`]: a single method activation with its operand stack
//! - [`Scopes`]: arena of lexical scopes addressed by [`ScopeId`]
//! - [`LocalBinding`]: a named, typed variable slot
//!
//! # Scoping
//!
//! Scopes are created and destroyed in strict LIFO order (a block or call always
//! ends before its enclosing one), so the arena is a vector that is truncated on
//! exit. Each scope maps names to slot indices in its own binding vector and
//! links to its parent. A method's first scope has no parent: method bodies
//! cannot see the caller's or the top-level variables.
//!
//! # Operand stacks
//!
//! Every frame has an operand stack. Evaluating an expression pushes exactly one
//! value on the current frame's operand stack; operators pop their operands and
//! push their result.

use super::value::{ObjectId, Value};
use crate::parser::ast::{Loc, MethodDecl, Type};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Index of a scope in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

/// Unique identity of a frame for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u64);

/// Variable slot
#[derive(Debug, Clone)]
pub struct LocalBinding {
    pub name: String,
    pub ty: Type,
    pub value: Value,
    pub decl_loc: Loc,
}

#[derive(Debug, Clone)]
struct Scope {
    parent: Option<ScopeId>,
    bindings: Vec<LocalBinding>,
    index: FxHashMap<String, usize>,
}

/// Arena of lexical scopes
#[derive(Debug, Clone, Default)]
pub struct Scopes {
    scopes: Vec<Scope>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent,
            bindings: Vec::new(),
            index: FxHashMap::default(),
        });
        id
    }

    /// Discard `scope` and every scope created after it
    pub fn truncate(&mut self, scope: ScopeId) {
        self.scopes.truncate(scope.0);
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes.get(scope.0).and_then(|s| s.parent)
    }

    /// Add a binding to `scope`. Returns false if the name is already declared in that scope.
    pub fn declare(&mut self, scope: ScopeId, binding: LocalBinding) -> bool {
        let Some(target) = self.scopes.get_mut(scope.0) else {
            return false;
        };
        if target.index.contains_key(&binding.name) {
            return false;
        }
        target.index.insert(binding.name.clone(), target.bindings.len());
        target.bindings.push(binding);
        true
    }

    /// Find `name` starting at `scope` and walking outward
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, usize)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let data = self.scopes.get(id.0)?;
            if let Some(&slot) = data.index.get(name) {
                return Some((id, slot));
            }
            current = data.parent;
        }
        None
    }

    pub fn binding(&self, (scope, slot): (ScopeId, usize)) -> Option<&LocalBinding> {
        self.scopes.get(scope.0)?.bindings.get(slot)
    }

    pub fn binding_mut(&mut self, (scope, slot): (ScopeId, usize)) -> Option<&mut LocalBinding> {
        self.scopes.get_mut(scope.0)?.bindings.get_mut(slot)
    }

    /// Bindings of a single scope in declaration order
    pub fn bindings(&self, scope: ScopeId) -> &[LocalBinding] {
        self.scopes
            .get(scope.0)
            .map_or(&[][..], |s| s.bindings.as_slice())
    }

    /// Scopes from `scope` outward
    pub fn chain(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), move |id| self.parent(*id))
            .take_while(move |id| id.0 < self.scopes.len())
    }

    /// Every live binding value, for reachability
    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.scopes
            .iter()
            .flat_map(|s| s.bindings.iter().map(|b| b.value))
    }
}

/// Activation record of a method (or of the top level)
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub id: FrameId,
    /// Method name, `Class.method`, or `(toplevel)`
    pub title: String,
    /// Method being executed; `None` for the top-level frame
    pub method: Option<Rc<MethodDecl>>,
    /// Receiver of an instance method or constructor
    pub this: Option<ObjectId>,
    /// Scope created for the call; parameters live here
    pub base_scope: ScopeId,
    /// Innermost scope currently active
    pub scope: ScopeId,
    pub operands: Vec<Value>,
    /// Location of the call expression that created the frame
    pub call_loc: Option<Loc>,
}

impl StackFrame {
    /// Scopes of this frame, innermost first
    pub fn scope_chain<'s>(&self, scopes: &'s Scopes) -> impl Iterator<Item = ScopeId> + 's {
        let base = self.base_scope;
        scopes.chain(self.scope).take_while(move |id| *id >= base)
    }
}

/// The call stack
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<StackFrame>,
    scopes: Scopes,
    next_frame_id: u64,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new frame with a fresh, parentless scope
    pub fn push_frame(
        &mut self,
        title: String,
        method: Option<Rc<MethodDecl>>,
        this: Option<ObjectId>,
        call_loc: Option<Loc>,
    ) -> &mut StackFrame {
        let scope = self.scopes.push(None);
        self.next_frame_id += 1;
        self.frames.push(StackFrame {
            id: FrameId(self.next_frame_id),
            title,
            method,
            this,
            base_scope: scope,
            scope,
            operands: Vec::new(),
            call_loc,
        });
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Pop the top frame and discard its scopes
    pub fn pop_frame(&mut self) -> Option<StackFrame> {
        let frame = self.frames.pop()?;
        self.scopes.truncate(frame.base_scope);
        Some(frame)
    }

    /// Pop every frame above the bottom one and clear what is left of it
    /// except its base scope.
    pub fn unwind_to_bottom(&mut self) {
        self.frames.truncate(1);
        if let Some(bottom) = self.frames.first_mut() {
            self.scopes.truncate(ScopeId(bottom.base_scope.0 + 1));
            bottom.scope = bottom.base_scope;
            bottom.operands.clear();
        }
    }

    /// Remove every frame and scope
    pub fn clear(&mut self) {
        self.frames.clear();
        self.scopes = Scopes::new();
    }

    pub fn current_frame(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    pub fn current_frame_mut(&mut self) -> Option<&mut StackFrame> {
        self.frames.last_mut()
    }

    /// Get all frames, bottom first (for UI display)
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    // ===== Scopes of the current frame =====

    /// Open a nested scope in the current frame; returns the scope to restore on exit
    pub fn enter_scope(&mut self) -> Option<ScopeId> {
        let frame = self.frames.last_mut()?;
        let previous = frame.scope;
        frame.scope = self.scopes.push(Some(previous));
        Some(previous)
    }

    /// Close scopes of the current frame down to `restore`
    pub fn exit_scope(&mut self, restore: ScopeId) {
        if let Some(frame) = self.frames.last_mut() {
            if frame.scope > restore {
                self.scopes.truncate(ScopeId(restore.0 + 1));
                frame.scope = restore;
            }
        }
    }

    /// Declare a variable in the innermost scope of the current frame
    pub fn declare(&mut self, binding: LocalBinding) -> bool {
        match self.frames.last() {
            Some(frame) => self.scopes.declare(frame.scope, binding),
            None => false,
        }
    }

    /// Look a variable up in the scopes of the current frame
    pub fn lookup(&self, name: &str) -> Option<&LocalBinding> {
        let frame = self.frames.last()?;
        self.scopes
            .lookup(frame.scope, name)
            .and_then(|slot| self.scopes.binding(slot))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut LocalBinding> {
        let frame = self.frames.last()?;
        let slot = self.scopes.lookup(frame.scope, name)?;
        self.scopes.binding_mut(slot)
    }

    /// Bindings of the bottom frame's base scope (the persistent top-level variables)
    pub fn toplevel_bindings(&self) -> &[LocalBinding] {
        match self.frames.first() {
            Some(frame) => self.scopes.bindings(frame.base_scope),
            None => &[],
        }
    }

    // ===== Operands =====

    pub fn push_operand(&mut self, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.operands.push(value);
        }
    }

    pub fn pop_operand(&mut self) -> Option<Value> {
        self.frames.last_mut()?.operands.pop()
    }

    /// Pop the top `n` operands, returned in push order
    pub fn pop_operands(&mut self, n: usize) -> Option<Vec<Value>> {
        let frame = self.frames.last_mut()?;
        let split = frame.operands.len().checked_sub(n)?;
        Some(frame.operands.split_off(split))
    }

    pub fn peek_operand(&self, depth: usize) -> Option<Value> {
        let operands = &self.frames.last()?.operands;
        operands
            .len()
            .checked_sub(depth + 1)
            .map(|index| operands[index])
    }

    /// Every value held by frames and scopes, for reachability
    pub fn root_values(&self) -> impl Iterator<Item = Value> + '_ {
        self.scopes.values().chain(self.frames.iter().flat_map(|f| {
            f.operands
                .iter()
                .copied()
                .chain(f.this.map(Value::Ref))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::DocId;

    fn binding(name: &str, value: i32) -> LocalBinding {
        LocalBinding {
            name: name.to_string(),
            ty: Type::Int,
            value: Value::Int(value),
            decl_loc: Loc::new(DocId(0), 0, 0),
        }
    }

    #[test]
    fn test_shadowing_and_scope_exit() {
        let mut stack = CallStack::new();
        stack.push_frame("(toplevel)".into(), None, None, None);
        assert!(stack.declare(binding("x", 1)));

        let restore = stack.enter_scope().unwrap();
        assert!(stack.declare(binding("x", 2)));
        assert_eq!(stack.lookup("x").unwrap().value, Value::Int(2));

        stack.exit_scope(restore);
        assert_eq!(stack.lookup("x").unwrap().value, Value::Int(1));
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let mut stack = CallStack::new();
        stack.push_frame("(toplevel)".into(), None, None, None);
        assert!(stack.declare(binding("x", 1)));
        assert!(!stack.declare(binding("x", 2)));
    }

    #[test]
    fn test_callee_cannot_see_caller() {
        let mut stack = CallStack::new();
        stack.push_frame("(toplevel)".into(), None, None, None);
        stack.declare(binding("x", 1));
        stack.push_frame("f".into(), None, None, None);
        assert!(stack.lookup("x").is_none());
        stack.declare(binding("y", 2));
        let popped = stack.pop_frame().unwrap();
        assert_eq!(popped.title, "f");
        assert_eq!(stack.scopes().len(), 1);
        assert_eq!(stack.lookup("x").unwrap().value, Value::Int(1));
    }

    #[test]
    fn test_frame_ids_are_unique() {
        let mut stack = CallStack::new();
        let a = stack.push_frame("a".into(), None, None, None).id;
        stack.pop_frame();
        let b = stack.push_frame("a".into(), None, None, None).id;
        assert_ne!(a, b);
    }

    #[test]
    fn test_operands() {
        let mut stack = CallStack::new();
        stack.push_frame("(toplevel)".into(), None, None, None);
        stack.push_operand(Value::Int(1));
        stack.push_operand(Value::Int(2));
        stack.push_operand(Value::Int(3));
        assert_eq!(stack.peek_operand(0), Some(Value::Int(3)));
        assert_eq!(
            stack.pop_operands(2),
            Some(vec![Value::Int(2), Value::Int(3)])
        );
        assert_eq!(stack.pop_operands(2), None);
        assert_eq!(stack.pop_operand(), Some(Value::Int(1)));
    }

    #[test]
    fn test_unwind_to_bottom() {
        let mut stack = CallStack::new();
        stack.push_frame("(toplevel)".into(), None, None, None);
        stack.declare(binding("x", 1));
        stack.enter_scope();
        stack.push_operand(Value::Int(5));
        stack.push_frame("f".into(), None, None, None);
        stack.unwind_to_bottom();
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.scopes().len(), 1);
        assert!(stack.current_frame().unwrap().operands.is_empty());
        assert_eq!(stack.toplevel_bindings().len(), 1);
    }
}
