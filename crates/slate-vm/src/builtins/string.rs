//! `String` and `StringBuilder` builtin classes (spec.md §4.4).

use crate::builtins::support::{arg, expect_string, new_string};
use slate_core::error::{RuntimeError, RuntimeResult};
use slate_core::gc::Gc;
use slate_core::heap::class::ClassDef;
use slate_core::heap::string::StringBuilder;
use slate_core::value::{NativeContext, Value};

fn receiver_str(args: &[Value]) -> RuntimeResult<Gc<slate_core::heap::string::SlateString>> {
    expect_string(arg(args, 0)?)
}

fn method_length(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Int32(receiver_str(args)?.borrow().len() as i32))
}

fn method_is_empty(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Boolean(receiver_str(args)?.borrow().is_empty()))
}

fn method_substring(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let s = receiver_str(args)?;
    let start = crate::builtins::support::expect_usize(arg(args, 1)?)?;
    let end = crate::builtins::support::expect_usize(arg(args, 2)?)?;
    match s.borrow().substring(start, end) {
        Some(sub) => Ok(new_string(sub.as_str())),
        None => Err(RuntimeError::range_error(format!(
            "substring({start}, {end}) out of bounds or not on a character boundary"
        ))),
    }
}

fn method_to_uppercase(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(new_string(receiver_str(args)?.borrow().to_uppercase_ascii().as_str()))
}

fn method_to_lowercase(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(new_string(receiver_str(args)?.borrow().to_lowercase_ascii().as_str()))
}

fn method_trim(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(new_string(receiver_str(args)?.borrow().trim().as_str()))
}

fn method_starts_with(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let needle = expect_string(arg(args, 1)?)?;
    Ok(Value::Boolean(receiver_str(args)?.borrow().starts_with(needle.borrow().as_str())))
}

fn method_ends_with(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let needle = expect_string(arg(args, 1)?)?;
    Ok(Value::Boolean(receiver_str(args)?.borrow().ends_with(needle.borrow().as_str())))
}

fn method_contains(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let needle = expect_string(arg(args, 1)?)?;
    Ok(Value::Boolean(receiver_str(args)?.borrow().contains(needle.borrow().as_str())))
}

fn method_index_of(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let needle = expect_string(arg(args, 1)?)?;
    let idx = receiver_str(args)?.borrow().index_of(needle.borrow().as_str());
    Ok(Value::Int32(idx as i32))
}

fn method_replace_first(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let needle = expect_string(arg(args, 1)?)?;
    let replacement = expect_string(arg(args, 2)?)?;
    let result = receiver_str(args)?
        .borrow()
        .replace_first(needle.borrow().as_str(), replacement.borrow().as_str());
    Ok(new_string(result.as_str()))
}

fn method_concat(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let other = expect_string(arg(args, 1)?)?;
    let result = receiver_str(args)?.borrow().concat(other.borrow().as_str());
    Ok(new_string(result.as_str()))
}

fn method_to_string(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::String(receiver_str(args)?))
}

fn method_equals(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let a = receiver_str(args)?;
    Ok(Value::Boolean(match arg(args, 1)? {
        Value::String(b) => a.borrow().as_str() == b.borrow().as_str(),
        _ => false,
    }))
}

fn method_compare(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let a = receiver_str(args)?;
    let b = expect_string(arg(args, 1)?)?;
    let ordering = a.borrow().as_str().cmp(b.borrow().as_str());
    Ok(Value::Int32(ordering as i32))
}

/// `String(x)` stringifies any value per spec.md §4.4's debug-string
/// convention (the same one `toString()` on other classes uses).
fn factory_string(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    match arg(args, 0)? {
        Value::String(s) => Ok(Value::String(s.clone())),
        other => Ok(new_string(format!("{other:?}"))),
    }
}

fn builder_receiver(args: &[Value]) -> RuntimeResult<Gc<StringBuilder>> {
    match arg(args, 0)? {
        Value::StringBuilder(b) => Ok(b.clone()),
        other => Err(RuntimeError::type_error(format!(
            "expected a StringBuilder, got {}",
            other.type_name()
        ))),
    }
}

fn builder_append(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let builder = builder_receiver(args)?;
    let text = expect_string(arg(args, 1)?)?;
    builder.borrow_mut().append(text.borrow().as_str());
    Ok(Value::StringBuilder(builder))
}

fn builder_len(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Int32(builder_receiver(args)?.borrow().len() as i32))
}

fn builder_is_empty(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Boolean(builder_receiver(args)?.borrow().is_empty()))
}

fn builder_clear(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    let builder = builder_receiver(args)?;
    builder.borrow_mut().clear();
    Ok(Value::StringBuilder(builder))
}

fn builder_finish(_ctx: &mut dyn NativeContext, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::String(Gc::new(builder_receiver(args)?.borrow().finish())))
}

fn factory_string_builder(_ctx: &mut dyn NativeContext, _args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::StringBuilder(Gc::new(StringBuilder::new())))
}

pub fn string_class() -> ClassDef {
    let mut class = ClassDef::new("String");
    let p = class.prototype.clone();
    let mut p = p.borrow_mut();
    p.set("length", Value::Native(method_length));
    p.set("isEmpty", Value::Native(method_is_empty));
    p.set("substring", Value::Native(method_substring));
    p.set("toUpperCase", Value::Native(method_to_uppercase));
    p.set("toLowerCase", Value::Native(method_to_lowercase));
    p.set("trim", Value::Native(method_trim));
    p.set("startsWith", Value::Native(method_starts_with));
    p.set("endsWith", Value::Native(method_ends_with));
    p.set("contains", Value::Native(method_contains));
    p.set("indexOf", Value::Native(method_index_of));
    p.set("replaceFirst", Value::Native(method_replace_first));
    p.set("concat", Value::Native(method_concat));
    p.set("toString", Value::Native(method_to_string));
    p.set("equals", Value::Native(method_equals));
    p.set("compare", Value::Native(method_compare));
    drop(p);
    class.factory = Some(Value::Native(factory_string));
    class
}

pub fn string_builder_class() -> ClassDef {
    let mut class = ClassDef::new("StringBuilder");
    let p = class.prototype.clone();
    let mut p = p.borrow_mut();
    p.set("append", Value::Native(builder_append));
    p.set("length", Value::Native(builder_len));
    p.set("isEmpty", Value::Native(builder_is_empty));
    p.set("clear", Value::Native(builder_clear));
    p.set("finish", Value::Native(builder_finish));
    drop(p);
    class.factory = Some(Value::Native(factory_string_builder));
    class
}
