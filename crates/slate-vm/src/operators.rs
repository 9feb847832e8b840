//! Operator desugaring (spec.md §4.6): arithmetic/comparison opcodes take
//! a numeric-tower fast path when both operands qualify, and otherwise
//! resolve to a method call on the left operand through the same
//! property-dispatch chain as `receiver.name` property access.

use crate::property::get_property;
use rustc_hash::FxHashMap;
use slate_core::bigint::BigInt;
use slate_core::equals;
use slate_core::error::{RuntimeError, RuntimeResult};
use slate_core::gc::Gc;
use slate_core::heap::array::SlateArray;
use slate_core::heap::object::SlateObject;
use slate_core::numeric;
use slate_core::value::{NativeContext, Value};
use std::cmp::Ordering;

fn dispatch_unary(
    ctx: &mut dyn NativeContext,
    globals: &FxHashMap<String, Value>,
    a: &Value,
    method: &str,
) -> RuntimeResult<Value> {
    let bound = get_property(globals, a, method)?;
    if !bound.is_callable() {
        return Err(RuntimeError::type_error(format!(
            "{} has no '{method}' method",
            a.type_name()
        )));
    }
    ctx.call(&bound, &[])
}

fn dispatch_binary(
    ctx: &mut dyn NativeContext,
    globals: &FxHashMap<String, Value>,
    a: &Value,
    b: &Value,
    method: &str,
) -> RuntimeResult<Value> {
    let bound = get_property(globals, a, method)?;
    if !bound.is_callable() {
        return Err(RuntimeError::type_error(format!(
            "{} has no '{method}' method",
            a.type_name()
        )));
    }
    ctx.call(&bound, std::slice::from_ref(b))
}

macro_rules! arithmetic_op {
    ($name:ident, $numeric_fn:path, $method:literal) => {
        pub fn $name(
            ctx: &mut dyn NativeContext,
            globals: &FxHashMap<String, Value>,
            a: &Value,
            b: &Value,
        ) -> RuntimeResult<Value> {
            if a.is_number() && b.is_number() {
                return $numeric_fn(a, b);
            }
            dispatch_binary(ctx, globals, a, b, $method)
        }
    };
}

arithmetic_op!(add, numeric::add, "plus");
arithmetic_op!(sub, numeric::sub, "minus");
arithmetic_op!(mul, numeric::mul, "times");
arithmetic_op!(div, numeric::div, "divide");
arithmetic_op!(modulo, numeric::modulo, "mod");
arithmetic_op!(pow, numeric::pow, "pow");

fn as_integer_bigint(v: &Value, op: &str) -> RuntimeResult<BigInt> {
    match v {
        Value::Int32(n) => Ok(BigInt::from_i32(*n)),
        Value::BigInt(b) => Ok(b.borrow().clone()),
        other => Err(RuntimeError::type_error(format!(
            "cannot apply '{op}' to a {}",
            other.type_name()
        ))),
    }
}

fn normalize_bigint(b: BigInt) -> Value {
    match b.to_i32() {
        (true, n) => Value::Int32(n),
        (false, _) => Value::BigInt(Gc::new(b)),
    }
}

macro_rules! bitwise_op {
    ($name:ident, $bigint_fn:ident, $method:literal) => {
        pub fn $name(
            ctx: &mut dyn NativeContext,
            globals: &FxHashMap<String, Value>,
            a: &Value,
            b: &Value,
        ) -> RuntimeResult<Value> {
            if a.is_number() && b.is_number() {
                let (x, y) = (as_integer_bigint(a, $method)?, as_integer_bigint(b, $method)?);
                return Ok(normalize_bigint(x.$bigint_fn(&y)));
            }
            dispatch_binary(ctx, globals, a, b, $method)
        }
    };
}

bitwise_op!(bit_and, bitand, "bitAnd");
bitwise_op!(bit_or, bitor, "bitOr");
bitwise_op!(bit_xor, bitxor, "bitXor");

pub fn bit_not(
    ctx: &mut dyn NativeContext,
    globals: &FxHashMap<String, Value>,
    a: &Value,
) -> RuntimeResult<Value> {
    if a.is_number() {
        return Ok(normalize_bigint(as_integer_bigint(a, "bitNot")?.bitnot()));
    }
    dispatch_unary(ctx, globals, a, "bitNot")
}

fn shift_amount(b: &Value) -> RuntimeResult<u32> {
    match b {
        Value::Int32(n) if *n >= 0 => Ok(*n as u32),
        Value::Int32(_) => Err(RuntimeError::range_error("shift amount must be non-negative")),
        other => Err(RuntimeError::type_error(format!(
            "shift amount must be an Int, got {}",
            other.type_name()
        ))),
    }
}

pub fn shl(
    ctx: &mut dyn NativeContext,
    globals: &FxHashMap<String, Value>,
    a: &Value,
    b: &Value,
) -> RuntimeResult<Value> {
    if a.is_number() && b.is_number() {
        let x = as_integer_bigint(a, "shiftLeft")?;
        return Ok(normalize_bigint(x.shl(shift_amount(b)?)));
    }
    dispatch_binary(ctx, globals, a, b, "shiftLeft")
}

pub fn shr(
    ctx: &mut dyn NativeContext,
    globals: &FxHashMap<String, Value>,
    a: &Value,
    b: &Value,
) -> RuntimeResult<Value> {
    if a.is_number() && b.is_number() {
        let x = as_integer_bigint(a, "shiftRight")?;
        return Ok(normalize_bigint(x.shr(shift_amount(b)?)));
    }
    dispatch_binary(ctx, globals, a, b, "shiftRight")
}

pub fn negate(
    ctx: &mut dyn NativeContext,
    globals: &FxHashMap<String, Value>,
    a: &Value,
) -> RuntimeResult<Value> {
    if a.is_number() {
        return numeric::negate(a);
    }
    dispatch_unary(ctx, globals, a, "negate")
}

pub fn logical_not(
    ctx: &mut dyn NativeContext,
    globals: &FxHashMap<String, Value>,
    a: &Value,
) -> RuntimeResult<Value> {
    if let Value::Boolean(b) = a {
        return Ok(Value::Boolean(!b));
    }
    dispatch_unary(ctx, globals, a, "not")
}

pub fn logical_and(
    ctx: &mut dyn NativeContext,
    globals: &FxHashMap<String, Value>,
    a: &Value,
    b: &Value,
) -> RuntimeResult<Value> {
    if let (Value::Boolean(x), Value::Boolean(y)) = (a, b) {
        return Ok(Value::Boolean(*x && *y));
    }
    dispatch_binary(ctx, globals, a, b, "and")
}

pub fn logical_or(
    ctx: &mut dyn NativeContext,
    globals: &FxHashMap<String, Value>,
    a: &Value,
    b: &Value,
) -> RuntimeResult<Value> {
    if let (Value::Boolean(x), Value::Boolean(y)) = (a, b) {
        return Ok(Value::Boolean(*x || *y));
    }
    dispatch_binary(ctx, globals, a, b, "or")
}

pub fn logical_xor(
    ctx: &mut dyn NativeContext,
    globals: &FxHashMap<String, Value>,
    a: &Value,
    b: &Value,
) -> RuntimeResult<Value> {
    if let (Value::Boolean(x), Value::Boolean(y)) = (a, b) {
        return Ok(Value::Boolean(*x ^ *y));
    }
    dispatch_binary(ctx, globals, a, b, "xor")
}

/// `== !=` (spec.md §4.6): total over every value pair, matching the
/// defined cross-type rule (`Null` only equals `Null`, numbers never equal
/// non-numbers, numbers compare tower-wide) and the hashing rules
/// (spec.md §4.7) by construction.
pub fn equals_op(a: &Value, b: &Value) -> bool {
    equals::equals(a, b)
}

/// `< <= > >=` (spec.md §4.6): numeric fast path, else a `compare` method
/// call returning an `Int32` of -1/0/+1.
pub fn compare(
    ctx: &mut dyn NativeContext,
    globals: &FxHashMap<String, Value>,
    a: &Value,
    b: &Value,
) -> RuntimeResult<Ordering> {
    if a.is_number() && b.is_number() {
        return numeric::compare_numeric(a, b)
            .ok_or_else(|| RuntimeError::type_error("comparison against NaN is unordered"));
    }
    match dispatch_binary(ctx, globals, a, b, "compare")? {
        Value::Int32(n) => Ok(n.cmp(&0)),
        other => Err(RuntimeError::type_error(format!(
            "compare() must return an Int, got {}",
            other.type_name()
        ))),
    }
}

/// `receiver[key]` (spec.md §4.6 `get`).
pub fn get_index(receiver: &Value, key: &Value) -> RuntimeResult<Value> {
    match receiver {
        Value::Array(arr) => {
            let arr = arr.borrow();
            let idx = index_for(key, arr.len())?;
            Ok(arr.get(idx).cloned().unwrap_or(Value::Undefined))
        }
        Value::Object(obj) => {
            let key = key_as_str(key)?;
            Ok(obj.borrow().get(&key).cloned().unwrap_or(Value::Undefined))
        }
        Value::Buffer(buf) => {
            let idx = index_for(key, buf.len())?;
            Ok(Value::Int32(buf[idx] as i32))
        }
        other => Err(RuntimeError::type_error(format!("cannot index a {}", other.type_name()))),
    }
}

/// `receiver[key] = value` (spec.md §4.6 `set`).
pub fn set_index(receiver: &Value, key: &Value, value: Value) -> RuntimeResult<()> {
    match receiver {
        Value::Array(arr) => {
            let mut arr = arr.borrow_mut();
            let idx = index_for(key, arr.len())?;
            set_array_slot(&mut arr, idx, value);
            Ok(())
        }
        Value::Object(obj) => {
            let key = key_as_str(key)?;
            obj.borrow_mut().set(key, value);
            Ok(())
        }
        other => Err(RuntimeError::type_error(format!(
            "cannot assign an index on a {}",
            other.type_name()
        ))),
    }
}

fn set_array_slot(arr: &mut SlateArray, idx: usize, value: Value) {
    // `SlateArray` exposes no direct index-assignment; rebuild via the
    // public slice/push surface rather than adding a setter whose only
    // caller is this opcode.
    let mut rebuilt: Vec<Value> = arr.as_slice().to_vec();
    rebuilt[idx] = value;
    *arr = SlateArray::from_vec(rebuilt);
}

fn index_for(key: &Value, len: usize) -> RuntimeResult<usize> {
    let i = match key {
        Value::Int32(n) => *n as i64,
        other => {
            return Err(RuntimeError::type_error(format!(
                "index must be an Int, got {}",
                other.type_name()
            )))
        }
    };
    let resolved = if i < 0 { i + len as i64 } else { i };
    if resolved < 0 || resolved as usize >= len {
        return Err(RuntimeError::range_error(format!(
            "index {i} out of bounds for length {len}"
        )));
    }
    Ok(resolved as usize)
}

fn key_as_str(key: &Value) -> RuntimeResult<String> {
    match key {
        Value::String(s) => Ok(s.borrow().as_str().to_owned()),
        other => {
            Err(RuntimeError::type_error(format!("object key must be a String, got {}", other.type_name())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_core::gc::Gc;

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
    fn numeric_fast_path_skips_dispatch() {
        let mut ctx = NoopCtx;
        let globals = FxHashMap::default();
        let sum = add(&mut ctx, &globals, &Value::Int32(1), &Value::Int32(2)).unwrap();
        assert!(matches!(sum, Value::Int32(3)));
    }

    #[test]
    fn negative_array_index_wraps() {
        let arr = Value::Array(Gc::new(SlateArray::from_vec(vec![
            Value::Int32(10),
            Value::Int32(20),
            Value::Int32(30),
        ])));
        let v = get_index(&arr, &Value::Int32(-1)).unwrap();
        assert!(matches!(v, Value::Int32(30)));
    }

    #[test]
    fn object_index_missing_key_is_undefined() {
        let obj = Value::Object(Gc::new(SlateObject::new()));
        let key = Value::String(Gc::new(slate_core::heap::string::SlateString::new("x")));
        let v = get_index(&obj, &key).unwrap();
        assert!(matches!(v, Value::Undefined));
    }

    #[test]
    fn out_of_bounds_array_index_is_range_error() {
        let arr = Value::Array(Gc::new(SlateArray::new()));
        assert!(get_index(&arr, &Value::Int32(0)).is_err());
    }
}
