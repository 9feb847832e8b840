//! The Class heap object (spec.md §4.4): a named bundle holding an
//! instance prototype, optional static members, an optional parent class
//! forming an acyclic chain, and an optional factory callable.

use crate::gc::Gc;
use crate::heap::object::SlateObject;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub prototype: Gc<SlateObject>,
    pub statics: Gc<SlateObject>,
    pub parent: Option<Gc<ClassDef>>,
    pub factory: Option<Value>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        ClassDef {
            name: name.into(),
            prototype: Gc::new(SlateObject::new()),
            statics: Gc::new(SlateObject::new()),
            parent: None,
            factory: None,
        }
    }

    /// Walk `self`, then `self.parent`, then its parent, etc., returning
    /// the first hit (spec.md §4.5 step 2). The instance's own properties
    /// are checked by the caller before reaching here.
    pub fn lookup_method(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.prototype.borrow().get(name) {
            return Some(v.clone());
        }
        let mut parent = self.parent.clone();
        while let Some(class) = parent {
            let hit = class.borrow().prototype.borrow().get(name).cloned();
            if hit.is_some() {
                return hit;
            }
            parent = class.borrow().parent.clone();
        }
        None
    }

    /// Static lookup: no prototype walk, direct on this class's own
    /// static-members object (spec.md §4.5).
    pub fn lookup_static(&self, name: &str) -> Option<Value> {
        self.statics.borrow().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_resolution_walks_parent_chain() {
        let mut base = ClassDef::new("Base");
        base.prototype.borrow_mut().set("greet", Value::Int32(1));
        let base = Gc::new(base);

        let mut derived = ClassDef::new("Derived");
        derived.parent = Some(base);
        let derived = Gc::new(derived);

        assert!(derived.borrow().lookup_method("greet").is_some());
        assert!(derived.borrow().lookup_method("missing").is_none());
    }
}
