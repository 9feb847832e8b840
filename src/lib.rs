//! Host-facing facade for the Slate runtime core (spec.md §2, §6.3): build
//! a `Vm`, register native globals, and run a compiled `Function`. Lexing,
//! parsing, and bytecode generation are external collaborators — this
//! crate only wires the value model (`slate_core`), the bytecode format
//! (`slate_bytecode`), and the interpreter (`slate_vm`) together for an
//! embedding host.

pub use slate_bytecode;
pub use slate_core;
pub use slate_vm;

pub use slate_vm::{CallFrame, Vm, VmConfig};

pub mod tracing_init;

pub mod prelude {
    pub use slate_bytecode::{BytecodeChunk, Constant, ConstantPool, FunctionProto, OpCode, UpvalueDescriptor};
    pub use slate_core::prelude::*;
    pub use slate_vm::{CallFrame, Vm, VmConfig};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn vm_executes_a_trivial_function_returning_a_constant() {
        let mut function = FunctionProto::new("main", 0);
        let idx = function.constants.add_int32(7);
        function.chunk.write_op(OpCode::Constant, 1);
        function.chunk.write_byte(idx as u8, 1);
        function.chunk.write_op(OpCode::Return, 1);

        let mut vm = Vm::bootstrap();
        let result = vm.execute(Gc::new(function)).unwrap();
        assert!(matches!(result, Value::Int32(7)));
    }
}
