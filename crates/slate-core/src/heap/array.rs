//! The Array heap object (spec.md §4.4): an insertion-ordered dynamic
//! sequence with constant-time indexed access.

use crate::error::{RuntimeError, RuntimeResult};
use crate::value::{NativeContext, Value};

#[derive(Debug, Clone, Default)]
pub struct SlateArray(Vec<Value>);

impl SlateArray {
    pub fn new() -> Self {
        SlateArray(Vec::new())
    }

    pub fn from_vec(values: Vec<Value>) -> Self {
        SlateArray(values)
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn push(&mut self, value: Value) {
        self.0.push(value);
    }

    /// Returns the popped element, or a Range error if empty.
    pub fn pop(&mut self) -> RuntimeResult<Value> {
        self.0.pop().ok_or_else(|| RuntimeError::range_error("pop() on empty array"))
    }

    pub fn copy(&self) -> Self {
        SlateArray(self.0.clone())
    }

    pub fn reverse(&mut self) {
        self.0.reverse();
    }

    pub fn fill(&mut self, value: Value) {
        for slot in self.0.iter_mut() {
            *slot = value.clone();
        }
    }

    /// Negative indices count from the end; both bounds are clamped into
    /// `0..=len` rather than erroring (spec.md §4.4).
    pub fn slice(&self, start: i64, end: i64) -> Self {
        let len = self.0.len() as i64;
        let clamp = |i: i64| -> usize {
            let resolved = if i < 0 { (len + i).max(0) } else { i };
            resolved.clamp(0, len) as usize
        };
        let start = clamp(start);
        let end = clamp(end).max(start);
        SlateArray(self.0[start..end].to_vec())
    }

    pub fn to_debug_string(&self, elem: impl Fn(&Value) -> String) -> String {
        let parts: Vec<String> = self.0.iter().map(elem).collect();
        format!("[{}]", parts.join(", "))
    }

    pub fn map(
        &self,
        ctx: &mut dyn NativeContext,
        callable: &Value,
    ) -> RuntimeResult<Self> {
        let mut out = Vec::with_capacity(self.0.len());
        for v in &self.0 {
            out.push(ctx.call(callable, std::slice::from_ref(v))?);
        }
        Ok(SlateArray(out))
    }

    pub fn filter(
        &self,
        ctx: &mut dyn NativeContext,
        predicate: &Value,
    ) -> RuntimeResult<Self> {
        let mut out = Vec::new();
        for v in &self.0 {
            if ctx.call(predicate, std::slice::from_ref(v))?.is_truthy() {
                out.push(v.clone());
            }
        }
        Ok(SlateArray(out))
    }

    pub fn flat_map(
        &self,
        ctx: &mut dyn NativeContext,
        callable: &Value,
    ) -> RuntimeResult<Self> {
        let mut out = Vec::new();
        for v in &self.0 {
            match ctx.call(callable, std::slice::from_ref(v))? {
                Value::Array(arr) => out.extend(arr.borrow().0.iter().cloned()),
                other => out.push(other),
            }
        }
        Ok(SlateArray(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_clamps_negative_indices() {
        let arr = SlateArray::from_vec(vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)]);
        let s = arr.slice(-2, 100);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn pop_empty_is_range_error() {
        let mut arr = SlateArray::new();
        assert!(arr.pop().is_err());
    }
}
