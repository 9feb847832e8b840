//! Value equality (spec.md §4.6, §8 invariants 2-4).
//!
//! Cross-type equality is narrow: `Null` equals only `Null`; any number
//! compared with a non-number is false; two numbers compare by the
//! tower-wide rule regardless of tag. Same-tag heap types are either
//! structural (String/Array/Range/Object/Buffer, matching their §4.7 hash
//! rules) or identity-based (everything hashed by object identity there).

use crate::gc::Gc;
use crate::heap::array::SlateArray;
use crate::heap::object::SlateObject;
use crate::heap::range::RangeVal;
use crate::numeric;
use crate::value::Value;

pub fn equals(a: &Value, b: &Value) -> bool {
    if a.is_number() && b.is_number() {
        return numeric::equals_numeric(a, b);
    }
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Undefined, Value::Undefined) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::String(x), Value::String(y)) => x.borrow().as_str() == y.borrow().as_str(),
        (Value::Array(x), Value::Array(y)) => {
            Gc::ptr_eq(x, y) || array_equals(&x.borrow(), &y.borrow())
        }
        (Value::Object(x), Value::Object(y)) => {
            Gc::ptr_eq(x, y) || object_equals(&x.borrow(), &y.borrow())
        }
        (Value::Range(x), Value::Range(y)) => {
            Gc::ptr_eq(x, y) || range_equals(&x.borrow(), &y.borrow())
        }
        (Value::Buffer(x), Value::Buffer(y)) => x == y,
        (Value::StringBuilder(x), Value::StringBuilder(y)) => Gc::ptr_eq(x, y),
        (Value::Class(x), Value::Class(y)) => Gc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) => Gc::ptr_eq(x, y),
        (Value::Closure(x), Value::Closure(y)) => Gc::ptr_eq(x, y),
        (Value::Native(x), Value::Native(y)) => std::ptr::eq(*x as *const (), *y as *const ()),
        (Value::BoundMethod(x), Value::BoundMethod(y)) => Gc::ptr_eq(x, y),
        (Value::Iterator(x), Value::Iterator(y)) => Gc::ptr_eq(x, y),
        (Value::BufferBuilder(x), Value::BufferBuilder(y)) => Gc::ptr_eq(x, y),
        (Value::BufferReader(x), Value::BufferReader(y)) => Gc::ptr_eq(x, y),
        (Value::LocalDate(x), Value::LocalDate(y)) => {
            Gc::ptr_eq(x, y) || *x.borrow() == *y.borrow()
        }
        (Value::LocalTime(x), Value::LocalTime(y)) => {
            Gc::ptr_eq(x, y) || *x.borrow() == *y.borrow()
        }
        (Value::LocalDateTime(x), Value::LocalDateTime(y)) => {
            Gc::ptr_eq(x, y) || *x.borrow() == *y.borrow()
        }
        (Value::Instant(x), Value::Instant(y)) => Gc::ptr_eq(x, y) || *x.borrow() == *y.borrow(),
        _ => false,
    }
}

fn array_equals(a: &SlateArray, b: &SlateArray) -> bool {
    a.len() == b.len()
        && a.as_slice().iter().zip(b.as_slice()).all(|(x, y)| equals(x, y))
}

fn range_equals(a: &RangeVal, b: &RangeVal) -> bool {
    if a.exclusive != b.exclusive || !equals(&a.start, &b.start) || !equals(&a.end, &b.end) {
        return false;
    }
    match (&a.step, &b.step) {
        (None, None) => true,
        (Some(x), Some(y)) => equals(x, y),
        _ => false,
    }
}

fn object_equals(a: &SlateObject, b: &SlateObject) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|(k, v)| b.get(k).is_some_and(|bv| equals(v, bv)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_equals_only_null() {
        assert!(equals(&Value::Null, &Value::Null));
        assert!(!equals(&Value::Null, &Value::Undefined));
        assert!(!equals(&Value::Null, &Value::Int32(0)));
    }

    #[test]
    fn number_vs_non_number_is_false() {
        assert!(!equals(&Value::Int32(1), &Value::Boolean(true)));
    }

    #[test]
    fn cross_tower_numeric_equality() {
        assert!(equals(&Value::Int32(1), &Value::Float64(1.0)));
    }

    #[test]
    fn nan_never_equals_itself() {
        let nan = Value::Float64(f64::NAN);
        assert!(!equals(&nan, &Value::Float64(f64::NAN)));
    }

    #[test]
    fn object_equality_ignores_key_order() {
        let mut a = SlateObject::new();
        a.set("x", Value::Int32(1));
        a.set("y", Value::Int32(2));
        let mut b = SlateObject::new();
        b.set("y", Value::Int32(2));
        b.set("x", Value::Int32(1));
        assert!(object_equals(&a, &b));
    }
}
