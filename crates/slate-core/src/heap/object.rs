//! The Object heap object (spec.md §4.4): an insertion-ordered mapping
//! from string keys to values, used both for user records and as the
//! prototype/static-members holder for classes.

use crate::gc::Gc;
use crate::heap::class::ClassDef;
use crate::value::Value;
use indexmap::IndexMap;

/// An Object's own field map, plus the optional back-pointer to its
/// governing Class (spec.md §3.1) set when an instance is synthesised by
/// `ClassDef`'s factory-less default constructor (spec.md §4.9). Object
/// *literals* (`{}` expressions) leave this `None` and fall back to the
/// builtin `Object` class for method resolution (spec.md §4.5).
#[derive(Debug, Clone, Default)]
pub struct SlateObject {
    fields: IndexMap<String, Value>,
    governing_class: Option<Gc<ClassDef>>,
}

impl SlateObject {
    pub fn new() -> Self {
        SlateObject { fields: IndexMap::new(), governing_class: None }
    }

    pub fn with_class(class: Gc<ClassDef>) -> Self {
        SlateObject { fields: IndexMap::new(), governing_class: Some(class) }
    }

    pub fn governing_class(&self) -> Option<&Gc<ClassDef>> {
        self.governing_class.as_ref()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Insertion order is preserved for existing keys; a new key is
    /// appended (spec.md §3.3).
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Returns the removed value, if any. Uses shift-remove so the
    /// remaining keys keep their relative order (spec.md §3.3).
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_preserves_remaining_order() {
        let mut obj = SlateObject::new();
        obj.set("a", Value::Int32(1));
        obj.set("b", Value::Int32(2));
        obj.set("c", Value::Int32(3));
        obj.delete("b");
        let keys: Vec<&str> = obj.keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn set_existing_key_keeps_position() {
        let mut obj = SlateObject::new();
        obj.set("a", Value::Int32(1));
        obj.set("b", Value::Int32(2));
        obj.set("a", Value::Int32(99));
        let keys: Vec<&str> = obj.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
