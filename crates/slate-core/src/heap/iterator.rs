//! Iterator: a cursor over array elements, a numeric range, string
//! codepoints, or object keys (spec.md §4.11).

use crate::error::{RuntimeError, RuntimeResult};
use crate::gc::Gc;
use crate::heap::array::SlateArray;
use crate::heap::object::SlateObject;
use crate::heap::string::SlateString;
use crate::value::Value;

#[derive(Debug)]
pub enum IteratorState {
    Array { source: Gc<SlateArray>, index: usize },
    NumericRange { current: i64, end: i64, exclusive: bool, step: i64 },
    StringCodepoints { codepoints: Vec<char>, index: usize },
    ObjectKeys { keys: Vec<String>, index: usize },
}

impl IteratorState {
    pub fn over_array(source: Gc<SlateArray>) -> Self {
        IteratorState::Array { source, index: 0 }
    }

    pub fn over_numeric_range(start: i64, end: i64, exclusive: bool, step: i64) -> Self {
        IteratorState::NumericRange { current: start, end, exclusive, step }
    }

    pub fn over_string(s: &SlateString) -> Self {
        IteratorState::StringCodepoints { codepoints: s.as_str().chars().collect(), index: 0 }
    }

    pub fn over_object_keys(obj: &SlateObject) -> Self {
        IteratorState::ObjectKeys {
            keys: obj.keys().map(str::to_owned).collect(),
            index: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        match self {
            IteratorState::Array { source, index } => *index < source.borrow().len(),
            IteratorState::NumericRange { current, end, exclusive, step } => {
                if *step > 0 {
                    if *exclusive { current < end } else { current <= end }
                } else if *step < 0 {
                    if *exclusive { current > end } else { current >= end }
                } else {
                    false
                }
            }
            IteratorState::StringCodepoints { codepoints, index } => *index < codepoints.len(),
            IteratorState::ObjectKeys { keys, index } => *index < keys.len(),
        }
    }

    /// Advances the cursor and returns the produced value; a fatal Range
    /// error when already exhausted (spec.md §4.11).
    pub fn next(&mut self) -> RuntimeResult<Value> {
        if !self.has_next() {
            return Err(RuntimeError::range_error("next() called on exhausted iterator"));
        }
        match self {
            IteratorState::Array { source, index } => {
                let v = source.borrow().get(*index).cloned().expect("has_next checked bounds");
                *index += 1;
                Ok(v)
            }
            IteratorState::NumericRange { current, step, .. } => {
                let v = *current;
                *current += *step;
                Ok(Value::Int32(v as i32))
            }
            IteratorState::StringCodepoints { codepoints, index } => {
                let c = codepoints[*index];
                *index += 1;
                Ok(Value::String(Gc::new(SlateString::new(c.to_string()))))
            }
            IteratorState::ObjectKeys { keys, index } => {
                let k = keys[*index].clone();
                *index += 1;
                Ok(Value::String(Gc::new(SlateString::new(k))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_range_respects_exclusive_end() {
        let mut it = IteratorState::over_numeric_range(0, 3, true, 1);
        let mut seen = Vec::new();
        while it.has_next() {
            seen.push(it.next().unwrap());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn exhausted_iterator_errors_on_next() {
        let mut it = IteratorState::over_numeric_range(0, 0, true, 1);
        assert!(!it.has_next());
        assert!(it.next().is_err());
    }
}
