//! The VM's single open-upvalue list (spec.md §4.10, §5's "one open-upvalue
//! list" resource).
//!
//! Kept sorted by stack slot so a frame return can close every upvalue at
//! or above its base in one pass, the same way the teacher's VM walks its
//! own sorted per-return bookkeeping rather than scanning unconditionally.

use slate_core::gc::Gc;
use slate_core::heap::closure::UpvalueCell;
use slate_core::value::Value;

#[derive(Default)]
pub struct OpenUpvalues(Vec<(usize, Gc<UpvalueCell>)>);

impl OpenUpvalues {
    pub fn new() -> Self {
        OpenUpvalues(Vec::new())
    }

    /// Returns the existing open upvalue pointing at `slot`, or creates and
    /// tracks a fresh one (spec.md §4.10: "the VM maintains a sorted list
    /// of open upvalues").
    pub fn capture(&mut self, slot: usize) -> Gc<UpvalueCell> {
        match self.0.binary_search_by_key(&slot, |(s, _)| *s) {
            Ok(idx) => self.0[idx].1.clone(),
            Err(pos) => {
                let cell = Gc::new(UpvalueCell::Open(slot));
                self.0.insert(pos, (slot, cell.clone()));
                cell
            }
        }
    }

    /// Closes every open upvalue pointing at `slot >= floor`, hoisting the
    /// live stack value into the cell itself and detaching it from the
    /// stack (spec.md §4.10). Called both on frame return (`floor` = the
    /// returning frame's base) and on `CloseUpvalue` (`floor` = the single
    /// slot at the current stack top).
    pub fn close_from(&mut self, floor: usize, stack: &[Value]) {
        let pos = self.0.partition_point(|(s, _)| *s < floor);
        for (slot, cell) in self.0.drain(pos..) {
            let value = stack[slot].clone();
            *cell.borrow_mut() = UpvalueCell::Closed(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_is_idempotent_per_slot() {
        let mut up = OpenUpvalues::new();
        let a = up.capture(3);
        let b = up.capture(3);
        assert!(Gc::ptr_eq(&a, &b));
    }

    #[test]
    fn close_from_hoists_value_and_detaches() {
        let mut up = OpenUpvalues::new();
        let cell = up.capture(1);
        let stack = vec![Value::Int32(0), Value::Int32(42)];
        up.close_from(1, &stack);
        match &*cell.borrow() {
            UpvalueCell::Closed(Value::Int32(42)) => {}
            other => panic!("expected closed cell with 42, got {other:?}"),
        }
        // A second capture of the same slot now opens a fresh cell.
        let reopened = up.capture(1);
        assert!(!Gc::ptr_eq(&cell, &reopened));
    }
}
