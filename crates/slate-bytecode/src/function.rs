//! Compiled function prototypes (spec.md §6.2).
//!
//! A `FunctionProto` is what the (out-of-scope) compiler hands the VM: a
//! name, arity, bytecode chunk, constant pool, and upvalue capture plan.
//! Slate distinguishes expression-bodied functions (`=> expr`, implicit
//! return) from block-bodied ones purely for diagnostics; both compile to
//! the same opcode shapes.

use crate::chunk::BytecodeChunk;
use crate::constant::ConstantPool;

/// Where a closure captures an upvalue from: the enclosing call frame's
/// locals, or the enclosing closure's own upvalue list (spec.md §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpvalueDescriptor {
    pub is_local: bool,
    pub index: u8,
}

#[derive(Debug, Clone)]
pub struct FunctionProto {
    pub name: String,
    pub arity: u8,
    pub is_expression_body: bool,
    pub chunk: BytecodeChunk,
    pub constants: ConstantPool,
    pub upvalues: Vec<UpvalueDescriptor>,
}

impl FunctionProto {
    pub fn new(name: impl Into<String>, arity: u8) -> Self {
        FunctionProto {
            name: name.into(),
            arity,
            is_expression_body: false,
            chunk: BytecodeChunk::new(),
            constants: ConstantPool::new(),
            upvalues: Vec::new(),
        }
    }
}
