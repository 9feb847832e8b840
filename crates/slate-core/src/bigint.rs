//! Arbitrary-precision integers.
//!
//! Grounded in `spec.md` §4.2: construction, floor division/modulo,
//! gcd/lcm, integer square root, factorial, modular exponentiation and
//! extended Euclidean algorithm. Per `SPEC_FULL.md` §4.2 the limb
//! arithmetic itself is the external dependency's job (`num-bigint` /
//! `num-integer`); this module is the thin surface the VM actually calls.

use num_bigint::{BigInt as RawBigInt, Sign};
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BigInt(RawBigInt);

impl BigInt {
    pub fn from_i32(v: i32) -> Self {
        BigInt(RawBigInt::from(v))
    }

    pub fn from_i64(v: i64) -> Self {
        BigInt(RawBigInt::from(v))
    }

    pub fn from_u32(v: u32) -> Self {
        BigInt(RawBigInt::from(v))
    }

    pub fn from_u64(v: u64) -> Self {
        BigInt(RawBigInt::from(v))
    }

    /// Parse a decimal string. Returns `None` on malformed input (a Value
    /// error per spec.md §7).
    pub fn from_decimal_str(s: &str) -> Option<Self> {
        s.parse::<RawBigInt>().ok().map(BigInt)
    }

    pub fn from_str_radix(s: &str, radix: u32) -> Option<Self> {
        RawBigInt::parse_bytes(s.as_bytes(), radix).map(BigInt)
    }

    pub fn to_decimal_string(&self) -> String {
        self.0.to_string()
    }

    /// Testable property S6/§8-6: `from_string(to_string(n, 10), 10) == n`.
    pub fn round_trips(&self) -> bool {
        Self::from_decimal_str(&self.to_decimal_string()).is_some_and(|n| n == *self)
    }

    /// Narrow back to `i32`; fails (rather than truncating) if out of range.
    pub fn to_i32(&self) -> (bool, i32) {
        match self.0.to_i32() {
            Some(v) => (true, v),
            None => (false, 0),
        }
    }

    pub fn to_i64(&self) -> (bool, i64) {
        match self.0.to_i64() {
            Some(v) => (true, v),
            None => (false, 0),
        }
    }

    /// Lossy conversion to `f64`; may lose precision for large magnitudes.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::INFINITY * self.signum() as f64)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// spec.md §3.3: a zero-magnitude big-integer has positive sign.
    pub fn signum(&self) -> i32 {
        match self.0.sign() {
            Sign::Minus => -1,
            Sign::NoSign => 0,
            Sign::Plus => 1,
        }
    }

    pub fn negate(&self) -> Self {
        BigInt(-&self.0)
    }

    pub fn abs(&self) -> Self {
        BigInt(self.0.abs())
    }

    pub fn add(&self, other: &Self) -> Self {
        BigInt(&self.0 + &other.0)
    }

    pub fn sub(&self, other: &Self) -> Self {
        BigInt(&self.0 - &other.0)
    }

    pub fn mul(&self, other: &Self) -> Self {
        BigInt(&self.0 * &other.0)
    }

    /// Floor division: quotient rounds toward negative infinity
    /// (spec.md §4.1/§4.2, testable property §8-5).
    pub fn div_floor(&self, other: &Self) -> Option<Self> {
        if other.0.is_zero() {
            return None;
        }
        Some(BigInt(self.0.div_floor(&other.0)))
    }

    /// Floor modulo: remainder has the same sign as the divisor.
    pub fn mod_floor(&self, other: &Self) -> Option<Self> {
        if other.0.is_zero() {
            return None;
        }
        Some(BigInt(self.0.mod_floor(&other.0)))
    }

    pub fn bitand(&self, other: &Self) -> Self {
        BigInt(&self.0 & &other.0)
    }

    pub fn bitor(&self, other: &Self) -> Self {
        BigInt(&self.0 | &other.0)
    }

    pub fn bitxor(&self, other: &Self) -> Self {
        BigInt(&self.0 ^ &other.0)
    }

    pub fn bitnot(&self) -> Self {
        BigInt(!&self.0)
    }

    pub fn shl(&self, bits: u32) -> Self {
        BigInt(&self.0 << bits)
    }

    pub fn shr(&self, bits: u32) -> Self {
        BigInt(&self.0 >> bits)
    }

    pub fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }

    pub fn gcd(&self, other: &Self) -> Self {
        BigInt(self.0.gcd(&other.0))
    }

    pub fn lcm(&self, other: &Self) -> Self {
        BigInt(self.0.lcm(&other.0))
    }

    /// Extended Euclidean algorithm: returns `(gcd, x, y)` such that
    /// `self * x + other * y == gcd`.
    pub fn extended_gcd(&self, other: &Self) -> (Self, Self, Self) {
        let result = self.0.extended_gcd(&other.0);
        (BigInt(result.gcd), BigInt(result.x), BigInt(result.y))
    }

    /// Integer square root. `None` for negative operands (a domain/Arithmetic
    /// error per spec.md §7).
    pub fn isqrt(&self) -> Option<Self> {
        if self.0.is_negative() {
            return None;
        }
        Some(BigInt(self.0.sqrt()))
    }

    /// `Int.factorial(n)` (spec.md §8 scenario S4). Fatal Value error for
    /// negative `n`, signalled by returning `None`.
    pub fn factorial(n: u64) -> Option<Self> {
        let mut acc = RawBigInt::from(1u32);
        for i in 2..=n {
            acc *= RawBigInt::from(i);
        }
        Some(BigInt(acc))
    }

    /// Modular exponentiation via square-and-multiply (`num-bigint`'s own
    /// `modpow`, per SPEC_FULL.md §4.2).
    pub fn modpow(&self, exponent: &Self, modulus: &Self) -> Option<Self> {
        if modulus.0.is_zero() {
            return None;
        }
        Some(BigInt(self.0.modpow(&exponent.0, &modulus.0)))
    }
}

impl fmt::Debug for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigInt({})", self.0)
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for BigInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigInt {
    fn cmp(&self, other: &Self) -> Ordering {
        BigInt::cmp(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_promotion_value() {
        // S1: 2147483647 + 1 -> BigInt 2147483648
        let a = BigInt::from_i64(2147483647);
        let b = BigInt::from_i64(1);
        let sum = a.add(&b);
        assert_eq!(sum.to_decimal_string(), "2147483648");
        assert_eq!(sum.to_i32(), (false, 0));
    }

    #[test]
    fn floor_division_and_modulo() {
        // S2: (-7) / 3 -> -3, (-7) mod 3 -> 2
        let a = BigInt::from_i32(-7);
        let b = BigInt::from_i32(3);
        assert_eq!(a.div_floor(&b).unwrap().to_i32(), (true, -3));
        assert_eq!(a.mod_floor(&b).unwrap().to_i32(), (true, 2));
    }

    #[test]
    fn factorial_20() {
        // S4: Int.factorial(20) -> 2432902008176640000
        let f = BigInt::factorial(20).unwrap();
        assert_eq!(f.to_decimal_string(), "2432902008176640000");
    }

    #[test]
    fn zero_is_never_negative() {
        let zero = BigInt::from_i32(0).negate();
        assert_eq!(zero.signum(), 0);
    }

    #[test]
    fn round_trip_decimal() {
        let n = BigInt::from_decimal_str("-123456789012345678901234567890").unwrap();
        assert!(n.round_trips());
    }

    #[test]
    fn division_by_zero_is_none() {
        let a = BigInt::from_i32(5);
        let zero = BigInt::from_i32(0);
        assert!(a.div_floor(&zero).is_none());
        assert!(a.mod_floor(&zero).is_none());
    }

    #[test]
    fn extended_gcd_identity() {
        let a = BigInt::from_i32(240);
        let b = BigInt::from_i32(46);
        let (g, x, y) = a.extended_gcd(&b);
        assert_eq!(g.to_i32(), (true, 2));
        let lhs = a.mul(&x).add(&b.mul(&y));
        assert_eq!(lhs.cmp(&g), Ordering::Equal);
    }
}
