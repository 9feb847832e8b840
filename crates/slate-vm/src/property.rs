//! Property lookup and assignment (spec.md §4.5): own-properties-first for
//! Objects, then a walk up the governing Class's parent chain, binding any
//! callable hit from the chain (not from own properties) to the receiver.

use rustc_hash::FxHashMap;
use slate_core::error::{RuntimeError, RuntimeResult};
use slate_core::gc::Gc;
use slate_core::heap::bound_method::BoundMethodObj;
use slate_core::heap::class::ClassDef;
use slate_core::value::Value;

fn resolve_builtin_class(
    globals: &FxHashMap<String, Value>,
    name: &str,
) -> Option<Gc<ClassDef>> {
    match globals.get(name) {
        Some(Value::Class(class)) => Some(class.clone()),
        _ => None,
    }
}

fn bind_if_callable(receiver: &Value, hit: Value) -> Value {
    if hit.is_callable() {
        Value::BoundMethod(Gc::new(BoundMethodObj::new(receiver.clone(), hit)))
    } else {
        hit
    }
}

/// `receiver.name` (spec.md §4.5). Returns `Value::Undefined` rather than
/// an error when nothing is found anywhere in the chain.
pub fn get_property(
    globals: &FxHashMap<String, Value>,
    receiver: &Value,
    name: &str,
) -> RuntimeResult<Value> {
    if let Value::Object(obj) = receiver {
        let obj_ref = obj.borrow();
        if let Some(v) = obj_ref.get(name) {
            return Ok(v.clone());
        }
        let class = obj_ref
            .governing_class()
            .cloned()
            .or_else(|| resolve_builtin_class(globals, "Object"));
        drop(obj_ref);
        return Ok(match class.and_then(|c| c.borrow().lookup_method(name)) {
            Some(hit) => bind_if_callable(receiver, hit),
            None => Value::Undefined,
        });
    }

    if let Value::Class(class) = receiver {
        return Ok(class.borrow().lookup_static(name).unwrap_or(Value::Undefined));
    }

    let class_name = match receiver.governing_class_name() {
        Some(name) => name,
        None => return Ok(Value::Undefined),
    };
    match resolve_builtin_class(globals, class_name).and_then(|c| c.borrow().lookup_method(name)) {
        Some(hit) => Ok(bind_if_callable(receiver, hit)),
        None => Ok(Value::Undefined),
    }
}

/// `receiver.name = value` (spec.md §4.5's dispatch, generalised to
/// assignment): direct field assignment on an Object, direct static
/// assignment on a Class (no chain walk for either, mirroring the read
/// side's "no binding" rule for statics). Not otherwise defined.
pub fn set_property(receiver: &Value, name: &str, value: Value) -> RuntimeResult<()> {
    match receiver {
        Value::Object(obj) => {
            obj.borrow_mut().set(name, value);
            Ok(())
        }
        Value::Class(class) => {
            class.borrow().statics.borrow_mut().set(name, value);
            Ok(())
        }
        other => Err(RuntimeError::type_error(format!(
            "cannot set property '{name}' on a {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_core::heap::object::SlateObject;

    #[test]
    fn own_property_wins_over_class_chain() {
        let mut class = ClassDef::new("Widget");
        class.prototype.borrow_mut().set("label", Value::Int32(1));
        let class = Gc::new(class);

        let mut obj = SlateObject::with_class(class);
        obj.set("label", Value::Int32(99));
        let receiver = Value::Object(Gc::new(obj));

        let globals = FxHashMap::default();
        let hit = get_property(&globals, &receiver, "label").unwrap();
        assert!(matches!(hit, Value::Int32(99)));
    }

    #[test]
    fn chain_hit_binds_receiver() {
        let mut class = ClassDef::new("Widget");
        class.prototype.borrow_mut().set(
            "describe",
            Value::Native(|_ctx, _args| Ok(Value::Int32(7))),
        );
        let class = Gc::new(class);
        let obj = SlateObject::with_class(class);
        let receiver = Value::Object(Gc::new(obj));

        let globals = FxHashMap::default();
        let hit = get_property(&globals, &receiver, "describe").unwrap();
        assert!(matches!(hit, Value::BoundMethod(_)));
    }

    #[test]
    fn missing_property_is_undefined() {
        let obj = SlateObject::new();
        let receiver = Value::Object(Gc::new(obj));
        let globals = FxHashMap::default();
        let hit = get_property(&globals, &receiver, "nope").unwrap();
        assert!(matches!(hit, Value::Undefined));
    }
}
