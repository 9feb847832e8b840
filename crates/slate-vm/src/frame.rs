//! A single activation record on the VM's call stack (spec.md §4.9).

use slate_bytecode::FunctionProto;
use slate_core::gc::Gc;
use slate_core::heap::closure::ClosureObj;

/// `function` is resolved once at push time, whether the callable was a
/// bare `Function` or a `Closure` — the dispatch loop always reads
/// bytecode through it. `closure` is `Some` only when this frame was
/// entered through a closure, and is what `GetUpvalue`/`SetUpvalue`
/// resolve against.
pub struct CallFrame {
    pub function: Gc<FunctionProto>,
    pub closure: Option<Gc<ClosureObj>>,
    pub base: usize,
    pub ip: usize,
}

impl CallFrame {
    pub fn new(function: Gc<FunctionProto>, closure: Option<Gc<ClosureObj>>, base: usize) -> Self {
        CallFrame { function, closure, base, ip: 0 }
    }

    pub fn read_byte(&mut self) -> u8 {
        let byte = self
            .function
            .borrow()
            .chunk
            .read_byte(self.ip)
            .expect("call frame ip must stay within its own chunk");
        self.ip += 1;
        byte
    }

    pub fn read_u16(&mut self) -> u16 {
        let value = self
            .function
            .borrow()
            .chunk
            .read_u16(self.ip)
            .expect("call frame ip must stay within its own chunk");
        self.ip += 2;
        value
    }

    pub fn at_end(&self) -> bool {
        self.ip >= self.function.borrow().chunk.len()
    }

    /// Source line for the instruction just read, for error reporting
    /// (spec.md §6.4).
    pub fn current_line(&self) -> Option<u32> {
        self.function.borrow().chunk.line_at(self.ip.saturating_sub(1))
    }
}
