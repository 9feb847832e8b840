//! Range: a `{start, end, exclusive, optional step}` tuple of values
//! (spec.md §3.1, §4.4). Numeric ranges are iterable; others are
//! representable but not iterable.

use crate::value::Value;
use bitflags::bitflags;

bitflags! {
    /// Decodes the `NewRange` opcode's flag byte (spec.md §4.8: "bit0 =
    /// exclusive, bit1 = has_step").
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RangeFlags: u8 {
        const EXCLUSIVE = 0b01;
        const HAS_STEP  = 0b10;
    }
}

#[derive(Debug, Clone)]
pub struct RangeVal {
    pub start: Value,
    pub end: Value,
    pub exclusive: bool,
    pub step: Option<Value>,
}

impl RangeVal {
    pub fn new(start: Value, end: Value, exclusive: bool, step: Option<Value>) -> Self {
        RangeVal { start, end, exclusive, step }
    }

    /// Numeric ranges (start/end both Int32) materialise to an inclusive
    /// or exclusive sequence stepping by `step` (default 1).
    pub fn as_numeric_bounds(&self) -> Option<(i64, i64, i64)> {
        let start = as_i64(&self.start)?;
        let end = as_i64(&self.end)?;
        let step = match &self.step {
            Some(v) => as_i64(v)?,
            None => 1,
        };
        Some((start, end, step))
    }
}

fn as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Int32(n) => Some(*n as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_flags_decode_exclusive_and_step_bits() {
        let flags = RangeFlags::from_bits_truncate(0b11);
        assert!(flags.contains(RangeFlags::EXCLUSIVE));
        assert!(flags.contains(RangeFlags::HAS_STEP));

        let flags = RangeFlags::from_bits_truncate(0b00);
        assert!(!flags.contains(RangeFlags::EXCLUSIVE));
        assert!(!flags.contains(RangeFlags::HAS_STEP));
    }
}
