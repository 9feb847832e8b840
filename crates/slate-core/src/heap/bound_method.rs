//! BoundMethod: a receiver bound to a callable, produced during property
//! access when the resolved slot is a callable from the prototype chain
//! rather than an own property (spec.md §4.4, §4.5).

use crate::value::Value;

#[derive(Debug, Clone)]
pub struct BoundMethodObj {
    pub receiver: Value,
    pub callable: Value,
}

impl BoundMethodObj {
    pub fn new(receiver: Value, callable: Value) -> Self {
        BoundMethodObj { receiver, callable }
    }
}
