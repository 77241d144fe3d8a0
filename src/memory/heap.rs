//! Heap of class instances and arrays
//!
//! Objects are created by `new` and never freed. For display, a mark pass from
//! the roots (bindings, operand stacks, receivers and kept results) decides which
//! objects are still reachable; [`Heap::visible_objects`] only lists those.
//! Reachability never changes execution semantics.

use super::value::{ObjectId, Value};
use crate::interpreter::type_system::Class;
use crate::parser::ast::Type;
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

/// A heap-allocated object
#[derive(Debug, Clone)]
pub enum HeapObject {
    /// Class instance with fields in declaration order
    Instance { class: Rc<Class>, fields: Vec<Value> },
    /// Fixed-length array
    Array { element: Type, elements: Vec<Value> },
}

impl HeapObject {
    /// Type of the object itself
    pub fn ty(&self) -> Type {
        match self {
            HeapObject::Instance { class, .. } => Type::Class(class.class_ref.clone()),
            HeapObject::Array { element, .. } => Type::Array(Box::new(element.clone())),
        }
    }

    /// All slots of the object
    pub fn slots(&self) -> &[Value] {
        match self {
            HeapObject::Instance { fields, .. } => fields,
            HeapObject::Array { elements, .. } => elements,
        }
    }

    /// Objects referenced from the slots of this object
    pub fn references(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.slots().iter().filter_map(Value::as_object)
    }
}

/// Heap storage with display-only reachability tracking
#[derive(Debug, Clone, Default)]
pub struct Heap {
    objects: FxHashMap<ObjectId, HeapObject>,
    next_id: u32,
    visible: FxHashSet<ObjectId>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new object; it stays visible until the next mark pass
    pub fn allocate(&mut self, object: HeapObject) -> ObjectId {
        self.next_id += 1;
        let id = ObjectId(self.next_id);
        self.objects.insert(id, object);
        self.visible.insert(id);
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&HeapObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut HeapObject> {
        self.objects.get_mut(&id)
    }

    /// Number of objects ever allocated (reachable or not)
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drop every object
    pub fn clear(&mut self) {
        self.objects.clear();
        self.visible.clear();
        self.next_id = 0;
    }

    /// Recompute the visible set as everything reachable from `roots`.
    /// Returns the number of objects hidden by this pass.
    pub fn mark_visible(&mut self, roots: impl IntoIterator<Item = ObjectId>) -> usize {
        let mut reached = FxHashSet::default();
        let mut worklist: Vec<ObjectId> = roots.into_iter().collect();
        while let Some(id) = worklist.pop() {
            if !reached.insert(id) {
                continue;
            }
            if let Some(object) = self.objects.get(&id) {
                worklist.extend(object.references().filter(|r| !reached.contains(r)));
            }
        }
        let hidden = self.visible.iter().filter(|id| !reached.contains(*id)).count();
        self.visible = reached;
        hidden
    }

    pub fn is_visible(&self, id: ObjectId) -> bool {
        self.visible.contains(&id)
    }

    /// Visible objects in allocation order
    pub fn visible_objects(&self) -> Vec<(ObjectId, &HeapObject)> {
        let mut objects: Vec<_> = self
            .objects
            .iter()
            .filter(|(id, _)| self.visible.contains(*id))
            .map(|(id, object)| (*id, object))
            .collect();
        objects.sort_by_key(|(id, _)| *id);
        objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_array(values: &[Value]) -> HeapObject {
        HeapObject::Array {
            element: Type::Int,
            elements: values.to_vec(),
        }
    }

    fn ref_array(values: &[Value]) -> HeapObject {
        HeapObject::Array {
            element: Type::Array(Box::new(Type::Int)),
            elements: values.to_vec(),
        }
    }

    #[test]
    fn test_allocation_ids_are_distinct() {
        let mut heap = Heap::new();
        let a = heap.allocate(int_array(&[Value::Int(1)]));
        let b = heap.allocate(int_array(&[Value::Int(1)]));
        assert_ne!(a, b);
        assert_eq!(heap.len(), 2);
        assert!(heap.is_visible(a) && heap.is_visible(b));
    }

    #[test]
    fn test_mark_follows_references() {
        let mut heap = Heap::new();
        let inner = heap.allocate(int_array(&[Value::Int(1)]));
        let outer = heap.allocate(ref_array(&[Value::Ref(inner), Value::Null]));
        let garbage = heap.allocate(int_array(&[]));

        let hidden = heap.mark_visible([outer]);
        assert_eq!(hidden, 1);
        assert!(heap.is_visible(outer));
        assert!(heap.is_visible(inner));
        assert!(!heap.is_visible(garbage));
        // Unreachable objects are hidden, not freed
        assert!(heap.get(garbage).is_some());
        let ids: Vec<_> = heap.visible_objects().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![inner, outer]);
    }

    #[test]
    fn test_mark_handles_cycles() {
        let mut heap = Heap::new();
        let a = heap.allocate(ref_array(&[Value::Null]));
        let b = heap.allocate(ref_array(&[Value::Ref(a)]));
        if let Some(HeapObject::Array { elements, .. }) = heap.get_mut(a) {
            elements[0] = Value::Ref(b);
        }
        assert_eq!(heap.mark_visible([a]), 0);
        assert!(heap.is_visible(b));
        assert_eq!(heap.mark_visible([]), 2);
    }
}
