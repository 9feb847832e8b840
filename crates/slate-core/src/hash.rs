//! Value hashing (spec.md §4.7). FNV-1a is used throughout for its
//! simplicity and because it folds naturally over nested hashes.
//!
//! `equals(a, b) ⇒ hash(a) == hash(b)` (spec.md §8 invariant 3) requires
//! two resolutions beyond the literal per-tag rules (both documented as
//! Open Question resolutions in `DESIGN.md`):
//!
//! - §4.6 makes numeric equality cross-tower (`Int32(1) == Float64(1.0)`),
//!   so every numeric tag is hashed through the same canonical `f64`
//!   conversion `equals` itself uses, rather than through the tag-specific
//!   bit patterns §4.7 describes in isolation.
//! - The datetime tags (`LocalDate`/`LocalTime`/`LocalDateTime`/`Instant`)
//!   fall back to structural equality in `equals.rs` when two distinct
//!   objects hold the same value, so they're hashed structurally here too
//!   rather than by heap identity.

use crate::gc::{identity_hash, Gc};
use crate::heap::array::SlateArray;
use crate::heap::object::SlateObject;
use crate::heap::range::RangeVal;
use crate::numeric;
use crate::value::Value;
use std::hash::{Hash, Hasher};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a_continue(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

pub fn fnv1a_bytes(bytes: &[u8]) -> u64 {
    fnv1a_continue(FNV_OFFSET, bytes)
}

fn fold_u64(hash: u64, value: u64) -> u64 {
    fnv1a_continue(hash, &value.to_le_bytes())
}

/// `std::hash::Hasher` over the FNV-1a scheme so `Hash`-deriving types
/// (the `chrono`-backed datetime wrappers) fold into the same hash space
/// as every other value tag.
struct FnvHasher(u64);

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        self.0 = fnv1a_continue(self.0, bytes);
    }
}

fn hash_structural<T: Hash>(v: &T) -> u64 {
    let mut hasher = FnvHasher(FNV_OFFSET);
    v.hash(&mut hasher);
    hasher.finish()
}

const UNDEFINED_HASH: u64 = 0x756e646566696e65; // "undefine" in ascii, a fixed distinct constant
const NAN_HASH: u64 = 0x7ff8000000000000; // canonical quiet-NaN bit pattern

/// Canonical hash for any value on the numeric tower: NaN canonicalises to
/// a single constant, +0.0/-0.0 both hash to 0 (spec.md §4.7).
fn hash_numeric(v: &Value) -> u64 {
    let f = numeric::to_f64_lossy(v);
    if f.is_nan() {
        NAN_HASH
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

pub fn hash_value(v: &Value) -> u64 {
    match v {
        Value::Null => 0,
        Value::Undefined => UNDEFINED_HASH,
        Value::Boolean(b) => *b as u64,
        Value::Int32(_) | Value::BigInt(_) | Value::Float32(_) | Value::Float64(_) => {
            hash_numeric(v)
        }
        Value::String(s) => fnv1a_bytes(s.borrow().as_bytes()),
        Value::Array(arr) => hash_array(&arr.borrow()),
        Value::Range(r) => hash_range(&r.borrow()),
        Value::Object(obj) => hash_object(&obj.borrow()),
        Value::StringBuilder(sb) => hash_identity(sb),
        Value::Class(c) => hash_identity(c),
        Value::Function(f) => hash_identity(f),
        Value::Closure(c) => hash_identity(c),
        Value::Native(f) => fold_u64(FNV_OFFSET, *f as usize as u64),
        Value::BoundMethod(bm) => hash_identity(bm),
        Value::Iterator(it) => hash_identity(it),
        Value::Buffer(b) => fnv1a_bytes(b.as_ref()),
        Value::BufferBuilder(b) => hash_identity(b),
        Value::BufferReader(b) => hash_identity(b),
        // Hashed structurally, not by identity: `equals` falls back to
        // structural `PartialEq` for these tags, and invariant 3
        // (`equals(a,b) ⇒ hash(a)==hash(b)`) requires the two to agree.
        Value::LocalDate(d) => hash_structural(&*d.borrow()),
        Value::LocalTime(t) => hash_structural(&*t.borrow()),
        Value::LocalDateTime(dt) => hash_structural(&*dt.borrow()),
        Value::Instant(i) => hash_structural(&*i.borrow()),
    }
}

fn hash_identity<T>(gc: &Gc<T>) -> u64 {
    fold_u64(FNV_OFFSET, identity_hash(gc))
}

fn hash_array(arr: &SlateArray) -> u64 {
    let mut h = fold_u64(FNV_OFFSET, arr.len() as u64);
    for v in arr.as_slice() {
        h = fold_u64(h, hash_value(v));
    }
    h
}

fn hash_range(r: &RangeVal) -> u64 {
    let mut h = fold_u64(FNV_OFFSET, hash_value(&r.start));
    h = fold_u64(h, hash_value(&r.end));
    h = fold_u64(h, r.exclusive as u64);
    if let Some(step) = &r.step {
        h = fold_u64(h, hash_value(step));
    }
    h
}

/// Order-independent: the fold combines each key/value pair with XOR so
/// two objects holding the same mapping hash equal regardless of
/// insertion order (spec.md §4.7).
fn hash_object(obj: &SlateObject) -> u64 {
    let mut acc = 0u64;
    for (k, v) in obj.iter() {
        let entry = fold_u64(fnv1a_bytes(k.as_bytes()), hash_value(v));
        acc ^= entry;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gc::Gc;
    use crate::heap::object::SlateObject;

    #[test]
    fn int_and_equal_float_hash_equal() {
        assert_eq!(hash_value(&Value::Int32(1)), hash_value(&Value::Float64(1.0)));
    }

    #[test]
    fn positive_and_negative_zero_hash_equal() {
        assert_eq!(hash_value(&Value::Float64(0.0)), hash_value(&Value::Float64(-0.0)));
    }

    #[test]
    fn object_hash_commutes_over_key_order() {
        let mut a = SlateObject::new();
        a.set("x", Value::Int32(1));
        a.set("y", Value::Int32(2));

        let mut b = SlateObject::new();
        b.set("y", Value::Int32(2));
        b.set("x", Value::Int32(1));

        assert_eq!(hash_object(&a), hash_object(&b));
    }

    #[test]
    fn distinct_datetime_objects_with_equal_value_hash_equal() {
        use crate::heap::datetime::LocalDate;
        let a = Value::LocalDate(Gc::new(LocalDate::from_ymd(2024, 2, 29).unwrap()));
        let b = Value::LocalDate(Gc::new(LocalDate::from_ymd(2024, 2, 29).unwrap()));
        assert!(!Gc::ptr_eq(
            match &a { Value::LocalDate(g) => g, _ => unreachable!() },
            match &b { Value::LocalDate(g) => g, _ => unreachable!() },
        ));
        assert_eq!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn array_hash_sensitive_to_order() {
        let a = Value::Array(Gc::new(crate::heap::array::SlateArray::from_vec(vec![
            Value::Int32(1),
            Value::Int32(2),
        ])));
        let b = Value::Array(Gc::new(crate::heap::array::SlateArray::from_vec(vec![
            Value::Int32(2),
            Value::Int32(1),
        ])));
        assert_ne!(hash_value(&a), hash_value(&b));
    }
}
