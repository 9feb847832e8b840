//! The numeric tower and its promotion rules (spec.md §4.1).
//!
//! ```text
//! Int32 → BigInt → Float64
//!          ↗
//!      Float32 → Float64
//! ```

use crate::bigint::BigInt;
use crate::error::{RuntimeError, RuntimeResult};
use crate::gc::Gc;
use crate::value::Value;
use std::cmp::Ordering;

/// Overflow-aware `i32` helpers (spec.md §4.1's "overflow-aware helpers").
pub fn checked_add_i32(a: i32, b: i32) -> (bool, i32) {
    match a.checked_add(b) {
        Some(v) => (false, v),
        None => (true, 0),
    }
}

pub fn checked_sub_i32(a: i32, b: i32) -> (bool, i32) {
    match a.checked_sub(b) {
        Some(v) => (false, v),
        None => (true, 0),
    }
}

pub fn checked_mul_i32(a: i32, b: i32) -> (bool, i32) {
    match a.checked_mul(b) {
        Some(v) => (false, v),
        None => (true, 0),
    }
}

pub fn checked_add_i64(a: i64, b: i64) -> (bool, i64) {
    match a.checked_add(b) {
        Some(v) => (false, v),
        None => (true, 0),
    }
}

pub fn checked_sub_i64(a: i64, b: i64) -> (bool, i64) {
    match a.checked_sub(b) {
        Some(v) => (false, v),
        None => (true, 0),
    }
}

pub fn checked_mul_i64(a: i64, b: i64) -> (bool, i64) {
    match a.checked_mul(b) {
        Some(v) => (false, v),
        None => (true, 0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    Int32,
    BigInt,
    Float32,
    Float64,
}

fn tier_of(v: &Value) -> Option<Tier> {
    match v {
        Value::Int32(_) => Some(Tier::Int32),
        Value::BigInt(_) => Some(Tier::BigInt),
        Value::Float32(_) => Some(Tier::Float32),
        Value::Float64(_) => Some(Tier::Float64),
        _ => None,
    }
}

fn as_bigint(v: &Value) -> BigInt {
    match v {
        Value::Int32(n) => BigInt::from_i32(*n),
        Value::BigInt(b) => b.borrow().clone(),
        _ => unreachable!("as_bigint called on non-integer tower value"),
    }
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int32(n) => *n as f64,
        Value::BigInt(b) => b.borrow().to_f64(),
        Value::Float32(f) => *f as f64,
        Value::Float64(f) => *f,
        _ => unreachable!("as_f64 called on non-numeric value"),
    }
}

/// Renormalise a BigInt result to Int32 if it fits, per spec.md §4.1 rule 2.
fn normalize_bigint(b: BigInt) -> Value {
    match b.to_i32() {
        (true, n) => Value::Int32(n),
        (false, _) => Value::BigInt(Gc::new(b)),
    }
}

fn widest_float_tier(a: Tier, b: Tier) -> Tier {
    if a == Tier::Float32 && b == Tier::Float32 {
        Tier::Float32
    } else {
        Tier::Float64
    }
}

fn binary_float(a: &Value, b: &Value, tier: Tier, op: impl Fn(f64, f64) -> f64) -> Value {
    let result = op(as_f64(a), as_f64(b));
    match tier {
        Tier::Float32 => Value::Float32(result as f32),
        _ => Value::Float64(result),
    }
}

/// `+ - * **` promotion per spec.md §4.1 rules 1-3.
fn binary_numeric(
    a: &Value,
    b: &Value,
    op_name: &str,
    int_op: impl Fn(i32, i32) -> (bool, i32),
    big_op: impl Fn(&BigInt, &BigInt) -> BigInt,
    float_op: impl Fn(f64, f64) -> f64,
) -> RuntimeResult<Value> {
    let (ta, tb) = (
        tier_of(a).ok_or_else(|| type_error(a, op_name))?,
        tier_of(b).ok_or_else(|| type_error(b, op_name))?,
    );

    if ta >= Tier::Float32 || tb >= Tier::Float32 {
        let tier = widest_float_tier(ta, tb);
        return Ok(binary_float(a, b, tier, float_op));
    }
    if ta == Tier::BigInt || tb == Tier::BigInt {
        return Ok(normalize_bigint(big_op(&as_bigint(a), &as_bigint(b))));
    }
    let (ia, ib) = (as_i32(a), as_i32(b));
    let (overflowed, result) = int_op(ia, ib);
    if overflowed {
        return Ok(normalize_bigint(big_op(&BigInt::from_i32(ia), &BigInt::from_i32(ib))));
    }
    Ok(Value::Int32(result))
}

fn as_i32(v: &Value) -> i32 {
    match v {
        Value::Int32(n) => *n,
        _ => unreachable!("as_i32 called on non-Int32 value"),
    }
}

fn type_error(v: &Value, op: &str) -> RuntimeError {
    RuntimeError::type_error(format!("cannot apply '{op}' to a {}", v.type_name()))
}

pub fn add(a: &Value, b: &Value) -> RuntimeResult<Value> {
    binary_numeric(a, b, "plus", checked_add_i32, BigInt::add, |x, y| x + y)
}

pub fn sub(a: &Value, b: &Value) -> RuntimeResult<Value> {
    binary_numeric(a, b, "minus", checked_sub_i32, BigInt::sub, |x, y| x - y)
}

pub fn mul(a: &Value, b: &Value) -> RuntimeResult<Value> {
    binary_numeric(a, b, "times", checked_mul_i32, BigInt::mul, |x, y| x * y)
}

/// `/` and `mod` use floor semantics (spec.md §4.1), except for floats
/// where `/` is IEEE division. Division/modulo by a zero *integer* divisor
/// is a fatal Arithmetic error; float division by zero follows IEEE
/// (produces infinity/NaN).
pub fn div(a: &Value, b: &Value) -> RuntimeResult<Value> {
    let (ta, tb) = (
        tier_of(a).ok_or_else(|| type_error(a, "divide"))?,
        tier_of(b).ok_or_else(|| type_error(b, "divide"))?,
    );
    if ta >= Tier::Float32 || tb >= Tier::Float32 {
        let tier = widest_float_tier(ta, tb);
        return Ok(binary_float(a, b, tier, |x, y| x / y));
    }
    let (bi_a, bi_b) = (as_bigint(a), as_bigint(b));
    match bi_a.div_floor(&bi_b) {
        Some(q) => Ok(normalize_bigint(q)),
        None => Err(RuntimeError::arithmetic_error("division by zero")),
    }
}

pub fn modulo(a: &Value, b: &Value) -> RuntimeResult<Value> {
    let (ta, tb) = (
        tier_of(a).ok_or_else(|| type_error(a, "mod"))?,
        tier_of(b).ok_or_else(|| type_error(b, "mod"))?,
    );
    if ta >= Tier::Float32 || tb >= Tier::Float32 {
        let tier = widest_float_tier(ta, tb);
        return Ok(binary_float(a, b, tier, |x, y| x - (x / y).floor() * y));
    }
    let (bi_a, bi_b) = (as_bigint(a), as_bigint(b));
    match bi_a.mod_floor(&bi_b) {
        Some(r) => Ok(normalize_bigint(r)),
        None => Err(RuntimeError::arithmetic_error("modulo by zero")),
    }
}

/// `**`. Negative or excessively large exponents are an Overflow error
/// (Open Question resolution, see `DESIGN.md`): big-integer `pow` is
/// supported for non-negative exponents that fit in `u32`.
pub fn pow(a: &Value, b: &Value) -> RuntimeResult<Value> {
    let (ta, tb) = (
        tier_of(a).ok_or_else(|| type_error(a, "pow"))?,
        tier_of(b).ok_or_else(|| type_error(b, "pow"))?,
    );
    if ta >= Tier::Float32 || tb >= Tier::Float32 {
        let tier = widest_float_tier(ta, tb);
        return Ok(binary_float(a, b, tier, f64::powf));
    }
    let exponent = as_bigint(b);
    if exponent.signum() < 0 {
        return Err(RuntimeError::overflow_error("negative exponent in integer '**'"));
    }
    let (fits, exp) = exponent.to_i32();
    if !fits || exp < 0 {
        return Err(RuntimeError::overflow_error("exponent too large for integer '**'"));
    }
    let base = as_bigint(a);
    let mut result = BigInt::from_i32(1);
    let mut remaining = exp as u32;
    let mut acc = base;
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = result.mul(&acc);
        }
        acc = acc.mul(&acc);
        remaining >>= 1;
    }
    Ok(normalize_bigint(result))
}

pub fn negate(a: &Value) -> RuntimeResult<Value> {
    match a {
        Value::Int32(n) => match n.checked_neg() {
            Some(v) => Ok(Value::Int32(v)),
            None => Ok(normalize_bigint(BigInt::from_i32(*n).negate())),
        },
        Value::BigInt(b) => Ok(normalize_bigint(b.borrow().negate())),
        Value::Float32(f) => Ok(Value::Float32(-f)),
        Value::Float64(f) => Ok(Value::Float64(-f)),
        other => Err(type_error(other, "negate")),
    }
}

/// Lossy conversion of any numeric-tower value to `f64`, the same
/// conversion `equals`/`compare` use — shared with `hash.rs` so hashing
/// stays consistent with cross-tower equality (spec.md §4.7, §8-3).
pub fn to_f64_lossy(v: &Value) -> f64 {
    as_f64(v)
}

/// Comparison across the tower converts to `f64` (spec.md §4.1). `None`
/// whenever either side is `NaN` (IEEE: never ordered).
pub fn compare_numeric(a: &Value, b: &Value) -> Option<Ordering> {
    let (x, y) = (as_f64(a), as_f64(b));
    x.partial_cmp(&y)
}

/// Numeric `equals`: converts to `f64` and compares; `NaN` is never equal
/// to anything (spec.md §8 invariant 4).
pub fn equals_numeric(a: &Value, b: &Value) -> bool {
    as_f64(a) == as_f64(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_promotes_to_bigint() {
        // S1
        let sum = add(&Value::Int32(i32::MAX), &Value::Int32(1)).unwrap();
        match sum {
            Value::BigInt(b) => assert_eq!(b.borrow().to_decimal_string(), "2147483648"),
            _ => panic!("expected BigInt"),
        }
    }

    #[test]
    fn floor_division_and_modulo() {
        // S2
        let q = div(&Value::Int32(-7), &Value::Int32(3)).unwrap();
        assert!(matches!(q, Value::Int32(-3)));
        let r = modulo(&Value::Int32(-7), &Value::Int32(3)).unwrap();
        assert!(matches!(r, Value::Int32(2)));
    }

    #[test]
    fn division_by_zero_is_arithmetic_error() {
        assert!(div(&Value::Int32(1), &Value::Int32(0)).is_err());
    }

    #[test]
    fn float_division_by_zero_is_not_an_error() {
        let r = div(&Value::Float64(1.0), &Value::Float64(0.0)).unwrap();
        assert!(matches!(r, Value::Float64(f) if f.is_infinite()));
    }

    #[test]
    fn nan_compares_unordered() {
        assert_eq!(compare_numeric(&Value::Float64(f64::NAN), &Value::Int32(1)), None);
    }

    #[test]
    fn nan_never_equals_itself() {
        assert!(!equals_numeric(&Value::Float64(f64::NAN), &Value::Float64(f64::NAN)));
    }

    #[test]
    fn mixed_float_int_promotes_to_float() {
        let r = add(&Value::Int32(1), &Value::Float64(0.5)).unwrap();
        assert!(matches!(r, Value::Float64(f) if (f - 1.5).abs() < 1e-9));
    }
}
