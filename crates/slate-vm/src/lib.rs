//! The Slate bytecode interpreter (spec.md §4.8-§4.9, §6): call frames,
//! operand stack, operator/property dispatch, upvalue capture, and the
//! builtin classes installed into every VM's global namespace at bootstrap.

pub mod builtins;
pub mod config;
pub mod frame;
pub mod globals;
pub mod operators;
pub mod property;
pub mod upvalues;
pub mod vm;

pub use config::VmConfig;
pub use frame::CallFrame;
pub use vm::Vm;

pub mod prelude {
    pub use crate::config::VmConfig;
    pub use crate::frame::CallFrame;
    pub use crate::vm::Vm;
    pub use slate_bytecode::{BytecodeChunk, Constant, ConstantPool, FunctionProto, OpCode, UpvalueDescriptor};
    pub use slate_core::prelude::*;
}
