//! Bytecode chunk, constant pool, and function prototype format shared
//! between the (out-of-scope) compiler and the Slate VM (spec.md §4.8,
//! §6.2).

mod chunk;
mod constant;
mod function;
mod opcode;

pub use chunk::BytecodeChunk;
pub use constant::{Constant, ConstantPool};
pub use function::{FunctionProto, UpvalueDescriptor};
pub use opcode::OpCode;
