//! Shared argument-extraction helpers for native method implementations.
//! Every native method receives `self` (or, for static factories, its
//! first declared parameter) as `args[0]` — the call machinery prepends
//! the receiver when unwrapping a `BoundMethod` (spec.md §4.9).

use slate_core::error::{RuntimeError, RuntimeResult};
use slate_core::gc::Gc;
use slate_core::heap::array::SlateArray;
use slate_core::heap::buffer::{BufferBuilderState, BufferReaderState};
use slate_core::heap::object::SlateObject;
use slate_core::heap::string::SlateString;
use slate_core::value::Value;

pub fn arg(args: &[Value], i: usize) -> RuntimeResult<&Value> {
    args.get(i).ok_or_else(|| RuntimeError::arity_error(format!("missing argument {i}")))
}

pub fn opt_arg(args: &[Value], i: usize) -> Option<&Value> {
    args.get(i)
}

pub fn expect_string(v: &Value) -> RuntimeResult<Gc<SlateString>> {
    match v {
        Value::String(s) => Ok(s.clone()),
        other => Err(RuntimeError::type_error(format!("expected a String, got {}", other.type_name()))),
    }
}

pub fn expect_array(v: &Value) -> RuntimeResult<Gc<SlateArray>> {
    match v {
        Value::Array(a) => Ok(a.clone()),
        other => Err(RuntimeError::type_error(format!("expected an Array, got {}", other.type_name()))),
    }
}

pub fn expect_object(v: &Value) -> RuntimeResult<Gc<SlateObject>> {
    match v {
        Value::Object(o) => Ok(o.clone()),
        other => Err(RuntimeError::type_error(format!("expected an Object, got {}", other.type_name()))),
    }
}

pub fn expect_buffer(v: &Value) -> RuntimeResult<bytes::Bytes> {
    match v {
        Value::Buffer(b) => Ok(b.clone()),
        other => Err(RuntimeError::type_error(format!("expected a Buffer, got {}", other.type_name()))),
    }
}

pub fn expect_buffer_builder(v: &Value) -> RuntimeResult<Gc<BufferBuilderState>> {
    match v {
        Value::BufferBuilder(b) => Ok(b.clone()),
        other => {
            Err(RuntimeError::type_error(format!("expected a BufferBuilder, got {}", other.type_name())))
        }
    }
}

pub fn expect_buffer_reader(v: &Value) -> RuntimeResult<Gc<BufferReaderState>> {
    match v {
        Value::BufferReader(b) => Ok(b.clone()),
        other => {
            Err(RuntimeError::type_error(format!("expected a BufferReader, got {}", other.type_name())))
        }
    }
}

pub fn expect_int(v: &Value) -> RuntimeResult<i64> {
    match v {
        Value::Int32(n) => Ok(*n as i64),
        other => Err(RuntimeError::type_error(format!("expected an Int, got {}", other.type_name()))),
    }
}

pub fn expect_usize(v: &Value) -> RuntimeResult<usize> {
    let n = expect_int(v)?;
    usize::try_from(n).map_err(|_| RuntimeError::range_error(format!("expected a non-negative Int, got {n}")))
}

pub fn new_string(s: impl Into<String>) -> Value {
    Value::String(Gc::new(SlateString::new(s)))
}
