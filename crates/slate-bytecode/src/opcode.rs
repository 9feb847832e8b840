//! Bytecode operation codes (spec.md §4.8).
//!
//! Slate is dynamically typed, so unlike a type-specialized instruction set
//! arithmetic gets one opcode per operator (`Add`, not `AddI32`/`AddF64`);
//! the numeric tower promotion and operator-to-method dispatch happen at
//! execution time, not at compile time.

/// The VM is a stack-based machine. Most operations pop operands from the
/// stack and push results back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // ---- Stack ----
    /// Push constant from pool (8-bit index).
    Constant = 0,
    /// Push constant from pool (16-bit index, big-endian).
    ConstantWide,
    PushNull,
    PushUndefined,
    PushTrue,
    PushFalse,
    /// Pop top of stack.
    Pop,
    /// Pop N values from stack. Operand: u8 count.
    PopN,
    /// Duplicate top of stack.
    Dup,
    /// Copy value at offset from top to top (Forth-style PICK). Operand: u8 offset.
    Pick,
    /// Swap top two stack values.
    Swap,

    // ---- Locals & Upvalues ----
    /// Operand: u8 slot index.
    GetLocal,
    /// Operand: u8 slot index.
    SetLocal,
    /// Operand: u16 slot index (big-endian).
    GetLocalWide,
    /// Operand: u16 slot index (big-endian).
    SetLocalWide,
    /// Operand: u8 upvalue index.
    GetUpvalue,
    /// Operand: u8 upvalue index.
    SetUpvalue,
    /// Close the upvalue (if any) pointing at the current top-of-stack slot,
    /// hoisting its value onto the heap, then pop it (spec.md §4.10).
    CloseUpvalue,

    // ---- Globals ----
    /// Operand: u16 constant index (name).
    GetGlobal,
    /// Operand: u16 constant index (name).
    SetGlobal,
    /// Operand: u16 constant index (name). Binds top-of-stack under a new name.
    DefineGlobal,

    // ---- Arithmetic & Logic (spec.md §4.6) ----
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Neg,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    Shl,
    Shr,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Not,
    And,
    Or,
    Xor,

    // ---- Control Flow ----
    /// Operand: u16 offset (big-endian), unconditional forward jump.
    Jump,
    /// Operand: u16 offset (big-endian). Jumps (and pops) if top of stack is falsy.
    JumpIfFalse,
    /// Operand: u16 offset (big-endian). Jumps (and pops) if top of stack is truthy.
    JumpIfTrue,
    /// Operand: u16 offset (big-endian), backward jump for loops.
    Loop,

    // ---- Calls ----
    /// Call the callable at `stack[top - argc - 1]` with `argc` arguments.
    /// Operand: u8 arg count.
    Call,
    /// Pop a receiver and `argc` arguments, resolve `name` via the dispatch
    /// chain (spec.md §4.5), and invoke the resolved method.
    /// Operands: u16 constant index (name), u8 arg count.
    Invoke,
    /// Build a closure over the function prototype stored as constant
    /// `index`, capturing upvalues per its own descriptor list.
    /// Operand: u16 constant index (FunctionProto).
    Closure,
    /// Return the value on top of the stack from the current frame.
    Return,
    /// Return `undefined` from the current frame.
    ReturnUndefined,

    // ---- Object & Array Construction ----
    /// Pop `count` values and build an array from them (in order).
    /// Operand: u16 count.
    NewArray,
    /// Pop `count` key/value pairs (value then key, innermost first) and
    /// build an object from them, preserving insertion order.
    /// Operand: u16 count.
    NewObject,
    /// Pop `end`, `start`, and (if the flag bit is set) `step`, building a
    /// Range. Operand: u8 flags (bit0 = exclusive, bit1 = has_step).
    NewRange,

    // ---- Property Access ----
    /// Pop a receiver, push the resolved property (spec.md §4.5).
    /// Operand: u16 constant index (name).
    GetProperty,
    /// Pop a receiver and a value, assign the property, push the value back.
    /// Operand: u16 constant index (name).
    SetProperty,
    /// Pop a receiver and a key, push `receiver[key]`.
    GetIndex,
    /// Pop a receiver, a key, and a value; assign `receiver[key] = value`.
    SetIndex,

    // ---- Class ----
    /// Push a new class object named by the constant.
    /// Operand: u16 constant index (name).
    NewClass,
    /// Pop a parent class and attach it to the class now on top of stack.
    Inherit,
    /// Pop a function/closure value and attach it as a method on the class
    /// now on top of stack. Operand: u16 constant index (name).
    DefineMethod,
    /// Same as `DefineMethod` but attaches to the class's static table.
    DefineStatic,

    // ---- Iteration ----
    /// Pop an iterable value, push an Iterator over it (spec.md §4.11).
    GetIterator,
    /// Peek the iterator on top of stack, push whether it has a next value.
    IterHasNext,
    /// Advance the iterator on top of stack, push the produced value.
    IterNext,
}

impl OpCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        if value <= OpCode::IterNext as u8 {
            Some(unsafe { std::mem::transmute::<u8, OpCode>(value) })
        } else {
            None
        }
    }

    /// Size of this opcode's operand in bytes, not counting the opcode byte
    /// itself.
    pub fn operand_size(&self) -> usize {
        use OpCode::*;
        match self {
            Pop | Dup | Swap | CloseUpvalue | Add | Sub | Mul | Div | Mod | Pow | Neg | BitAnd
            | BitOr | BitXor | BitNot | Shl | Shr | Eq | NotEq | Lt | Le | Gt | Ge | Not | And
            | Or | Xor | Return | ReturnUndefined | GetIndex | SetIndex | Inherit | GetIterator
            | IterHasNext | IterNext | PushNull | PushUndefined | PushTrue | PushFalse => 0,

            Constant | PopN | Pick | GetLocal | SetLocal | GetUpvalue | SetUpvalue | NewRange
            | Call => 1,

            ConstantWide | GetLocalWide | SetLocalWide | GetGlobal | SetGlobal | DefineGlobal
            | Jump | JumpIfFalse | JumpIfTrue | Loop | Closure | NewArray | NewObject
            | GetProperty | SetProperty | NewClass | DefineMethod | DefineStatic => 2,

            Invoke => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        use OpCode::*;
        match self {
            Constant => "CONSTANT",
            ConstantWide => "CONSTANT_WIDE",
            PushNull => "PUSH_NULL",
            PushUndefined => "PUSH_UNDEFINED",
            PushTrue => "PUSH_TRUE",
            PushFalse => "PUSH_FALSE",
            Pop => "POP",
            PopN => "POP_N",
            Dup => "DUP",
            Pick => "PICK",
            Swap => "SWAP",
            GetLocal => "GET_LOCAL",
            SetLocal => "SET_LOCAL",
            GetLocalWide => "GET_LOCAL_WIDE",
            SetLocalWide => "SET_LOCAL_WIDE",
            GetUpvalue => "GET_UPVALUE",
            SetUpvalue => "SET_UPVALUE",
            CloseUpvalue => "CLOSE_UPVALUE",
            GetGlobal => "GET_GLOBAL",
            SetGlobal => "SET_GLOBAL",
            DefineGlobal => "DEFINE_GLOBAL",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Mod => "MOD",
            Pow => "POW",
            Neg => "NEG",
            BitAnd => "BIT_AND",
            BitOr => "BIT_OR",
            BitXor => "BIT_XOR",
            BitNot => "BIT_NOT",
            Shl => "SHL",
            Shr => "SHR",
            Eq => "EQ",
            NotEq => "NOT_EQ",
            Lt => "LT",
            Le => "LE",
            Gt => "GT",
            Ge => "GE",
            Not => "NOT",
            And => "AND",
            Or => "OR",
            Xor => "XOR",
            Jump => "JUMP",
            JumpIfFalse => "JUMP_IF_FALSE",
            JumpIfTrue => "JUMP_IF_TRUE",
            Loop => "LOOP",
            Call => "CALL",
            Invoke => "INVOKE",
            Closure => "CLOSURE",
            Return => "RETURN",
            ReturnUndefined => "RETURN_UNDEFINED",
            NewArray => "NEW_ARRAY",
            NewObject => "NEW_OBJECT",
            NewRange => "NEW_RANGE",
            GetProperty => "GET_PROPERTY",
            SetProperty => "SET_PROPERTY",
            GetIndex => "GET_INDEX",
            SetIndex => "SET_INDEX",
            NewClass => "NEW_CLASS",
            Inherit => "INHERIT",
            DefineMethod => "DEFINE_METHOD",
            DefineStatic => "DEFINE_STATIC",
            GetIterator => "GET_ITERATOR",
            IterHasNext => "ITER_HAS_NEXT",
            IterNext => "ITER_NEXT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_repr() {
        assert_eq!(OpCode::Constant as u8, 0);
        assert_eq!(OpCode::ConstantWide as u8, 1);
    }

    #[test]
    fn opcode_from_u8() {
        assert_eq!(OpCode::from_u8(0), Some(OpCode::Constant));
        assert_eq!(OpCode::from_u8(255), None);
    }

    #[test]
    fn operand_sizes() {
        assert_eq!(OpCode::Pop.operand_size(), 0);
        assert_eq!(OpCode::Add.operand_size(), 0);
        assert_eq!(OpCode::Constant.operand_size(), 1);
        assert_eq!(OpCode::GetLocal.operand_size(), 1);
        assert_eq!(OpCode::Jump.operand_size(), 2);
        assert_eq!(OpCode::Invoke.operand_size(), 3);
    }

    #[test]
    fn last_opcode_round_trips() {
        let last = OpCode::IterNext as u8;
        assert_eq!(OpCode::from_u8(last), Some(OpCode::IterNext));
        assert_eq!(OpCode::from_u8(last + 1), None);
    }
}
