//! `Buffer`, `BufferBuilder`, `BufferReader` builtin classes (spec.md §4.3).

use crate::builtins::support::{
    arg, expect_buffer, expect_buffer_builder, expect_buffer_reader, expect_int, expect_usize,
    expect_string, new_string, opt_arg,
};
use slate_core::bigint::BigInt;
use slate_core::error::{RuntimeError, RuntimeResult};
use slate_core::gc::Gc;
use slate_core::heap::buffer;
use slate_core::heap::buffer::{BufferBuilderState, BufferReaderState};
use slate_core::heap::class::ClassDef;
use slate_core::value::{NativeContext, Value};
use std::cmp::Ordering;

fn method_size(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Int32(expect_buffer(arg(args, 0)?)?.len() as i32))
}

fn method_slice(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let buf = expect_buffer(arg(args, 0)?)?;
    let offset = expect_usize(arg(args, 1)?)?;
    let len = expect_usize(arg(args, 2)?)?;
    Ok(Value::Buffer(buffer::slice(&buf, offset, len)?))
}

fn method_concat(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let a = expect_buffer(arg(args, 0)?)?;
    let b = expect_buffer(arg(args, 1)?)?;
    Ok(Value::Buffer(buffer::concat(&a, &b)))
}

fn method_equals(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let a = expect_buffer(arg(args, 0)?)?;
    Ok(Value::Boolean(match opt_arg(args, 1) {
        Some(Value::Buffer(b)) => a == *b,
        _ => false,
    }))
}

fn method_compare(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let a = expect_buffer(arg(args, 0)?)?;
    let b = expect_buffer(arg(args, 1)?)?;
    Ok(Value::Int32(match buffer::lex_compare(&a, &b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }))
}

fn method_to_hex(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(new_string(buffer::to_hex(&expect_buffer(arg(args, 0)?)?)))
}

fn factory_buffer(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    match opt_arg(args, 0) {
        None => Ok(Value::Buffer(bytes::Bytes::new())),
        Some(Value::String(s)) => Ok(Value::Buffer(buffer::from_hex(s.borrow().as_str())?)),
        Some(other) => Err(RuntimeError::type_error(format!(
            "cannot construct a Buffer from a {}",
            other.type_name()
        ))),
    }
}

fn read_file(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let path = expect_string(arg(args, 0)?)?;
    Ok(match buffer::read_file(path.borrow().as_str()) {
        Some(data) => Value::Buffer(data),
        None => Value::Null,
    })
}

fn write_file(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let path = expect_string(arg(args, 0)?)?;
    let data = expect_buffer(arg(args, 1)?)?;
    Ok(Value::Boolean(buffer::write_file(path.borrow().as_str(), &data)))
}

macro_rules! builder_append {
    ($name:ident, $method:ident, $arg_ty:ty, $cast:expr) => {
        fn $name(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
            let builder = expect_buffer_builder(arg(args, 0)?)?;
            let n = expect_int(arg(args, 1)?)?;
            builder.borrow_mut().$method($cast(n) as $arg_ty);
            Ok(Value::BufferBuilder(builder))
        }
    };
}

builder_append!(builder_append_u8, append_u8, u8, |n: i64| n);
builder_append!(builder_append_u16_le, append_u16_le, u16, |n: i64| n);
builder_append!(builder_append_u32_le, append_u32_le, u32, |n: i64| n);
builder_append!(builder_append_u64_le, append_u64_le, u64, |n: i64| n);
builder_append!(builder_append_u16_be, append_u16_be, u16, |n: i64| n);
builder_append!(builder_append_u32_be, append_u32_be, u32, |n: i64| n);
builder_append!(builder_append_u64_be, append_u64_be, u64, |n: i64| n);

fn builder_append_bytes(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let builder = expect_buffer_builder(arg(args, 0)?)?;
    let data = expect_buffer(arg(args, 1)?)?;
    builder.borrow_mut().append_bytes(&data);
    Ok(Value::BufferBuilder(builder))
}

fn builder_append_buffer(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let builder = expect_buffer_builder(arg(args, 0)?)?;
    let data = expect_buffer(arg(args, 1)?)?;
    builder.borrow_mut().append_buffer(&data);
    Ok(Value::BufferBuilder(builder))
}

fn builder_append_cstring(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let builder = expect_buffer_builder(arg(args, 0)?)?;
    let s = expect_string(arg(args, 1)?)?;
    builder.borrow_mut().append_cstring(s.borrow().as_str());
    Ok(Value::BufferBuilder(builder))
}

fn builder_len(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Int32(expect_buffer_builder(arg(args, 0)?)?.borrow().len() as i32))
}

fn builder_is_empty(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Boolean(expect_buffer_builder(arg(args, 0)?)?.borrow().is_empty()))
}

/// `finish` consumes the builder's contents per spec.md §4.3, leaving the
/// builder itself empty rather than invalidating it.
fn builder_finish(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Buffer(expect_buffer_builder(arg(args, 0)?)?.borrow_mut().finish()))
}

fn factory_buffer_builder(_ctx: &mut dyn NativeContext, _args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::BufferBuilder(Gc::new(BufferBuilderState::new())))
}

fn reader_position(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Int32(expect_buffer_reader(arg(args, 0)?)?.borrow().position() as i32))
}

fn reader_remaining(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Int32(expect_buffer_reader(arg(args, 0)?)?.borrow().remaining() as i32))
}

fn reader_can_read(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let reader = expect_buffer_reader(arg(args, 0)?)?;
    let n = expect_usize(arg(args, 1)?)?;
    Ok(Value::Boolean(reader.borrow().can_read(n)))
}

fn reader_seek(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let reader = expect_buffer_reader(arg(args, 0)?)?;
    let pos = expect_usize(arg(args, 1)?)?;
    reader.borrow_mut().seek(pos)?;
    Ok(Value::BufferReader(reader))
}

/// u16 always fits in Int32; u32/u64 may not, so those renormalise to
/// BigInt rather than truncate (spec.md §4.1 rule 2).
fn from_u32(v: u32) -> Value {
    match BigInt::from_u32(v).to_i32() {
        (true, n) => Value::Int32(n),
        (false, _) => Value::BigInt(Gc::new(BigInt::from_u32(v))),
    }
}

fn from_u64(v: u64) -> Value {
    match BigInt::from_u64(v).to_i32() {
        (true, n) => Value::Int32(n),
        (false, _) => Value::BigInt(Gc::new(BigInt::from_u64(v))),
    }
}

macro_rules! reader_read_small {
    ($name:ident, $method:ident) => {
        fn $name(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
            let reader = expect_buffer_reader(arg(args, 0)?)?;
            let v = reader.borrow_mut().$method()?;
            Ok(Value::Int32(v as i32))
        }
    };
}

reader_read_small!(reader_read_u8, read_u8);
reader_read_small!(reader_read_u16_le, read_u16_le);
reader_read_small!(reader_read_u16_be, read_u16_be);

fn reader_read_u32_le(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let reader = expect_buffer_reader(arg(args, 0)?)?;
    Ok(from_u32(reader.borrow_mut().read_u32_le()?))
}

fn reader_read_u32_be(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let reader = expect_buffer_reader(arg(args, 0)?)?;
    Ok(from_u32(reader.borrow_mut().read_u32_be()?))
}

fn reader_read_u64_le(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let reader = expect_buffer_reader(arg(args, 0)?)?;
    Ok(from_u64(reader.borrow_mut().read_u64_le()?))
}

fn reader_read_u64_be(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let reader = expect_buffer_reader(arg(args, 0)?)?;
    Ok(from_u64(reader.borrow_mut().read_u64_be()?))
}

fn reader_read_bytes(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let reader = expect_buffer_reader(arg(args, 0)?)?;
    let n = expect_usize(arg(args, 1)?)?;
    Ok(Value::Buffer(reader.borrow_mut().read_bytes(n)?))
}

fn factory_buffer_reader(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let data = expect_buffer(arg(args, 0)?)?;
    Ok(Value::BufferReader(Gc::new(BufferReaderState::new(data))))
}

pub fn buffer_class() -> ClassDef {
    let mut class = ClassDef::new("Buffer");
    let p = class.prototype.clone();
    let mut p = p.borrow_mut();
    p.set("size", Value::Native(method_size));
    p.set("slice", Value::Native(method_slice));
    p.set("concat", Value::Native(method_concat));
    p.set("equals", Value::Native(method_equals));
    p.set("compare", Value::Native(method_compare));
    p.set("toHex", Value::Native(method_to_hex));
    drop(p);
    class.statics.borrow_mut().set("readFile", Value::Native(read_file));
    class.statics.borrow_mut().set("writeFile", Value::Native(write_file));
    class.factory = Some(Value::Native(factory_buffer));
    class
}

pub fn buffer_builder_class() -> ClassDef {
    let mut class = ClassDef::new("BufferBuilder");
    let p = class.prototype.clone();
    let mut p = p.borrow_mut();
    p.set("appendU8", Value::Native(builder_append_u8));
    p.set("appendU16LE", Value::Native(builder_append_u16_le));
    p.set("appendU32LE", Value::Native(builder_append_u32_le));
    p.set("appendU64LE", Value::Native(builder_append_u64_le));
    p.set("appendU16BE", Value::Native(builder_append_u16_be));
    p.set("appendU32BE", Value::Native(builder_append_u32_be));
    p.set("appendU64BE", Value::Native(builder_append_u64_be));
    p.set("appendBytes", Value::Native(builder_append_bytes));
    p.set("appendBuffer", Value::Native(builder_append_buffer));
    p.set("appendCString", Value::Native(builder_append_cstring));
    p.set("length", Value::Native(builder_len));
    p.set("isEmpty", Value::Native(builder_is_empty));
    p.set("finish", Value::Native(builder_finish));
    drop(p);
    class.factory = Some(Value::Native(factory_buffer_builder));
    class
}

pub fn buffer_reader_class() -> ClassDef {
    let mut class = ClassDef::new("BufferReader");
    let p = class.prototype.clone();
    let mut p = p.borrow_mut();
    p.set("position", Value::Native(reader_position));
    p.set("remaining", Value::Native(reader_remaining));
    p.set("canRead", Value::Native(reader_can_read));
    p.set("seek", Value::Native(reader_seek));
    p.set("readU8", Value::Native(reader_read_u8));
    p.set("readU16LE", Value::Native(reader_read_u16_le));
    p.set("readU32LE", Value::Native(reader_read_u32_le));
    p.set("readU64LE", Value::Native(reader_read_u64_le));
    p.set("readU16BE", Value::Native(reader_read_u16_be));
    p.set("readU32BE", Value::Native(reader_read_u32_be));
    p.set("readU64BE", Value::Native(reader_read_u64_be));
    p.set("readBytes", Value::Native(reader_read_bytes));
    drop(p);
    class.factory = Some(Value::Native(factory_buffer_reader));
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
    fn builder_to_reader_round_trip() {
        let mut ctx = NoopCtx;
        let builder = Value::BufferBuilder(Gc::new(BufferBuilderState::new()));
        builder_append_u32_le(&mut ctx, &[builder.clone(), Value::Int32(0x11223344)]).unwrap();
        let buf = builder_finish(&mut ctx, &[builder]).unwrap();
        let reader = factory_buffer_reader(&mut ctx, &[buf]).unwrap();
        let v = reader_read_u32_le(&mut ctx, &[reader]).unwrap();
        assert!(matches!(v, Value::Int32(0x11223344)));
    }
}
