//! `Array`, `Object`, and `Range` builtin classes (spec.md §4.4).

use crate::builtins::support::{arg, expect_array, expect_object, expect_usize, new_string, opt_arg};
use slate_core::equals;
use slate_core::error::{RuntimeError, RuntimeResult};
use slate_core::gc::Gc;
use slate_core::heap::array::SlateArray;
use slate_core::heap::class::ClassDef;
use slate_core::heap::iterator::IteratorState;
use slate_core::heap::range::RangeVal;
use slate_core::value::{NativeContext, Value};

fn method_length(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Int32(expect_array(arg(args, 0)?)?.borrow().len() as i32))
}

fn method_push(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let arr = expect_array(arg(args, 0)?)?;
    arr.borrow_mut().push(arg(args, 1)?.clone());
    Ok(Value::Int32(arr.borrow().len() as i32))
}

fn method_pop(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    expect_array(arg(args, 0)?)?.borrow_mut().pop()
}

fn method_index_of(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let arr = expect_array(arg(args, 0)?)?;
    let needle = arg(args, 1)?;
    let arr = arr.borrow();
    for (i, v) in arr.as_slice().iter().enumerate() {
        if equals::equals(v, needle) {
            return Ok(Value::Int32(i as i32));
        }
    }
    Ok(Value::Int32(-1))
}

fn method_contains(ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    match method_index_of(ctx, args)? {
        Value::Int32(i) => Ok(Value::Boolean(i >= 0)),
        _ => unreachable!(),
    }
}

fn method_copy(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Array(Gc::new(expect_array(arg(args, 0)?)?.borrow().copy())))
}

fn method_slice(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let arr = expect_array(arg(args, 0)?)?;
    let start = match opt_arg(args, 1) {
        Some(Value::Int32(n)) => *n as i64,
        _ => 0,
    };
    let end = match opt_arg(args, 2) {
        Some(Value::Int32(n)) => *n as i64,
        _ => arr.borrow().len() as i64,
    };
    Ok(Value::Array(Gc::new(arr.borrow().slice(start, end))))
}

fn method_reverse(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let arr = expect_array(arg(args, 0)?)?;
    arr.borrow_mut().reverse();
    Ok(Value::Array(arr))
}

fn method_fill(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let arr = expect_array(arg(args, 0)?)?;
    arr.borrow_mut().fill(arg(args, 1)?.clone());
    Ok(Value::Array(arr))
}

fn method_map(ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let arr = expect_array(arg(args, 0)?)?;
    let callable = arg(args, 1)?;
    let mapped = arr.borrow().map(ctx, callable)?;
    Ok(Value::Array(Gc::new(mapped)))
}

fn method_filter(ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let arr = expect_array(arg(args, 0)?)?;
    let predicate = arg(args, 1)?;
    let filtered = arr.borrow().filter(ctx, predicate)?;
    Ok(Value::Array(Gc::new(filtered)))
}

fn method_flat_map(ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let arr = expect_array(arg(args, 0)?)?;
    let callable = arg(args, 1)?;
    let flattened = arr.borrow().flat_map(ctx, callable)?;
    Ok(Value::Array(Gc::new(flattened)))
}

fn method_to_string(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let arr = expect_array(arg(args, 0)?)?;
    Ok(new_string(arr.borrow().to_debug_string(|v| format!("{v:?}"))))
}

fn method_iterator(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let arr = expect_array(arg(args, 0)?)?;
    Ok(Value::Iterator(Gc::new(IteratorState::over_array(arr))))
}

/// `Array(range)` materialises a numeric Range into an array (spec.md
/// §4.4's factory example).
fn factory_array(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    match opt_arg(args, 0) {
        None => Ok(Value::Array(Gc::new(SlateArray::new()))),
        Some(Value::Range(r)) => {
            let r = r.borrow();
            let (start, end, step) = r
                .as_numeric_bounds()
                .ok_or_else(|| RuntimeError::type_error("only numeric ranges materialise to arrays"))?;
            let mut it = IteratorState::over_numeric_range(start, end, r.exclusive, step);
            let mut out = Vec::new();
            while it.has_next() {
                out.push(it.next()?);
            }
            Ok(Value::Array(Gc::new(SlateArray::from_vec(out))))
        }
        Some(other) => Err(RuntimeError::type_error(format!(
            "cannot construct an Array from a {}",
            other.type_name()
        ))),
    }
}

fn method_get(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let obj = expect_object(arg(args, 0)?)?;
    let key = crate::builtins::support::expect_string(arg(args, 1)?)?;
    Ok(obj.borrow().get(key.borrow().as_str()).cloned().unwrap_or(Value::Undefined))
}

fn method_set(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let obj = expect_object(arg(args, 0)?)?;
    let key = crate::builtins::support::expect_string(arg(args, 1)?)?;
    let value = arg(args, 2)?.clone();
    obj.borrow_mut().set(key.borrow().as_str().to_owned(), value.clone());
    Ok(value)
}

fn method_delete(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let obj = expect_object(arg(args, 0)?)?;
    let key = crate::builtins::support::expect_string(arg(args, 1)?)?;
    Ok(obj.borrow_mut().delete(key.borrow().as_str()).unwrap_or(Value::Undefined))
}

fn method_has(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let obj = expect_object(arg(args, 0)?)?;
    let key = crate::builtins::support::expect_string(arg(args, 1)?)?;
    Ok(Value::Boolean(obj.borrow().has(key.borrow().as_str())))
}

fn method_keys(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let obj = expect_object(arg(args, 0)?)?;
    let keys: Vec<Value> = obj.borrow().keys().map(new_string).collect();
    Ok(Value::Array(Gc::new(SlateArray::from_vec(keys))))
}

fn method_object_iterator(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let obj = expect_object(arg(args, 0)?)?;
    Ok(Value::Iterator(Gc::new(IteratorState::over_object_keys(&obj.borrow()))))
}

fn factory_object(_ctx: &mut dyn NativeContext, _args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Object(Gc::new(slate_core::heap::object::SlateObject::new())))
}

fn range_receiver(args: &[Value]) -> RuntimeResult<Gc<RangeVal>> {
    match arg(args, 0)? {
        Value::Range(r) => Ok(r.clone()),
        other => Err(RuntimeError::type_error(format!("expected a Range, got {}", other.type_name()))),
    }
}

fn method_range_iterator(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let r = range_receiver(args)?;
    let r = r.borrow();
    let (start, end, step) = r
        .as_numeric_bounds()
        .ok_or_else(|| RuntimeError::type_error("only numeric ranges are iterable"))?;
    Ok(Value::Iterator(Gc::new(IteratorState::over_numeric_range(start, end, r.exclusive, step))))
}

fn method_range_to_array(ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    factory_array(ctx, &[Value::Range(range_receiver(args)?)])
}

fn factory_range(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let start = arg(args, 0)?.clone();
    let end = arg(args, 1)?.clone();
    let exclusive = matches!(opt_arg(args, 2), Some(Value::Boolean(true)));
    let step = opt_arg(args, 3).cloned();
    Ok(Value::Range(Gc::new(RangeVal::new(start, end, exclusive, step))))
}

pub fn array_class() -> ClassDef {
    let mut class = ClassDef::new("Array");
    let p = class.prototype.clone();
    let mut p = p.borrow_mut();
    p.set("length", Value::Native(method_length));
    p.set("push", Value::Native(method_push));
    p.set("pop", Value::Native(method_pop));
    p.set("indexOf", Value::Native(method_index_of));
    p.set("contains", Value::Native(method_contains));
    p.set("copy", Value::Native(method_copy));
    p.set("slice", Value::Native(method_slice));
    p.set("reverse", Value::Native(method_reverse));
    p.set("fill", Value::Native(method_fill));
    p.set("map", Value::Native(method_map));
    p.set("filter", Value::Native(method_filter));
    p.set("flatMap", Value::Native(method_flat_map));
    p.set("toString", Value::Native(method_to_string));
    p.set("iterator", Value::Native(method_iterator));
    drop(p);
    class.factory = Some(Value::Native(factory_array));
    class
}

pub fn object_class() -> ClassDef {
    let mut class = ClassDef::new("Object");
    let p = class.prototype.clone();
    let mut p = p.borrow_mut();
    p.set("get", Value::Native(method_get));
    p.set("set", Value::Native(method_set));
    p.set("delete", Value::Native(method_delete));
    p.set("has", Value::Native(method_has));
    p.set("keys", Value::Native(method_keys));
    p.set("iterator", Value::Native(method_object_iterator));
    drop(p);
    class.factory = Some(Value::Native(factory_object));
    class
}

pub fn range_class() -> ClassDef {
    let mut class = ClassDef::new("Range");
    let p = class.prototype.clone();
    let mut p = p.borrow_mut();
    p.set("iterator", Value::Native(method_range_iterator));
    p.set("toArray", Value::Native(method_range_to_array));
    drop(p);
    class.factory = Some(Value::Native(factory_range));
    class
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopCtx;
    impl NativeContext for NoopCtx {
        fn call(&mut self, _callee: &Value, _args: &[Value]) -> RuntimeResult<Value> {
            Err(RuntimeError::internal("no calls expected in this test"))
        }
        fn now_millis(&self) -> i64 {
            0
        }
    }

    #[test]
    fn push_returns_new_length() {
        let mut ctx = NoopCtx;
        let arr = Value::Array(Gc::new(SlateArray::new()));
        let v = method_push(&mut ctx, &[arr, Value::Int32(1)]).unwrap();
        assert!(matches!(v, Value::Int32(1)));
    }

    #[test]
    fn index_of_missing_is_negative_one() {
        let mut ctx = NoopCtx;
        let arr = Value::Array(Gc::new(SlateArray::from_vec(vec![Value::Int32(1)])));
        let v = method_index_of(&mut ctx, &[arr, Value::Int32(9)]).unwrap();
        assert!(matches!(v, Value::Int32(-1)));
    }

    #[test]
    fn object_set_then_get_round_trips() {
        let mut ctx = NoopCtx;
        let obj = Value::Object(Gc::new(slate_core::heap::object::SlateObject::new()));
        method_set(&mut ctx, &[obj.clone(), new_string("k"), Value::Int32(5)]).unwrap();
        let v = method_get(&mut ctx, &[obj, new_string("k")]).unwrap();
        assert!(matches!(v, Value::Int32(5)));
    }
}
