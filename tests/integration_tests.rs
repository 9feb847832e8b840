//! End-to-end scenarios S1-S6 (spec.md §8): each hand-assembles the
//! relevant bytecode chunk directly (the compiler is out of scope) and
//! runs it through `Vm::execute`, the same way `slate-bytecode`'s own
//! tests hand-assemble opcodes.

use slate::prelude::*;
use std::rc::Rc;

fn top_level(build: impl FnOnce(&mut BytecodeChunk, &mut ConstantPool)) -> Gc<FunctionProto> {
    let mut proto = FunctionProto::new("<script>", 0);
    build(&mut proto.chunk, &mut proto.constants);
    Gc::new(proto)
}

fn push_int(chunk: &mut BytecodeChunk, constants: &mut ConstantPool, n: i32) {
    let idx = constants.add_int32(n);
    chunk.write_op(OpCode::Constant, 1);
    chunk.write_byte(idx as u8, 1);
}

fn get_global(chunk: &mut BytecodeChunk, constants: &mut ConstantPool, name: &str) {
    let idx = constants.add_string(name);
    chunk.write_op(OpCode::GetGlobal, 1);
    chunk.write_u16(idx as u16, 1);
}

fn get_property(chunk: &mut BytecodeChunk, constants: &mut ConstantPool, name: &str) {
    let idx = constants.add_string(name);
    chunk.write_op(OpCode::GetProperty, 1);
    chunk.write_u16(idx as u16, 1);
}

fn call(chunk: &mut BytecodeChunk, argc: u8) {
    chunk.write_op(OpCode::Call, 1);
    chunk.write_byte(argc, 1);
}

#[test]
fn s1_integer_promotion_on_overflow() {
    let function = top_level(|chunk, constants| {
        push_int(chunk, constants, i32::MAX);
        push_int(chunk, constants, 1);
        chunk.write_op(OpCode::Add, 1);
        chunk.write_op(OpCode::Return, 1);
    });
    let mut vm = Vm::bootstrap();
    match vm.execute(function).unwrap() {
        Value::BigInt(b) => assert_eq!(b.borrow().to_decimal_string(), "2147483648"),
        other => panic!("expected BigInt, got {other:?}"),
    }
}

#[test]
fn s2_floor_division_and_modulo_with_a_negative_dividend() {
    let function = top_level(|chunk, constants| {
        push_int(chunk, constants, -7);
        push_int(chunk, constants, 3);
        chunk.write_op(OpCode::Div, 1);
        chunk.write_op(OpCode::Return, 1);
    });
    let mut vm = Vm::bootstrap();
    assert!(matches!(vm.execute(function).unwrap(), Value::Int32(-3)));

    let function = top_level(|chunk, constants| {
        push_int(chunk, constants, -7);
        push_int(chunk, constants, 3);
        chunk.write_op(OpCode::Mod, 1);
        chunk.write_op(OpCode::Return, 1);
    });
    let mut vm = Vm::bootstrap();
    assert!(matches!(vm.execute(function).unwrap(), Value::Int32(2)));
}

#[test]
fn s3_buffer_builder_to_reader_round_trip_of_a_little_endian_u32() {
    // A builder appends 0xDDCCBBAA as a little-endian u32, finishes to a
    // buffer, and a reader reads the same u32 back. The bit pattern
    // exceeds i32::MAX, so it is passed as the equivalent negative Int32
    // (two's-complement reinterpretation) and read back as a BigInt,
    // consistent with the numeric tower's "renormalize, don't truncate"
    // rule for unsigned reads that don't fit an Int32 (spec.md §4.1).
    let function = top_level(|chunk, constants| {
        get_global(chunk, constants, "BufferBuilder");
        call(chunk, 0);
        get_property(chunk, constants, "appendU32LE");
        push_int(chunk, constants, 0xDDCCBBAAu32 as i32);
        call(chunk, 1);
        get_property(chunk, constants, "finish");
        call(chunk, 0);

        get_global(chunk, constants, "BufferReader");
        chunk.write_op(OpCode::Swap, 1);
        call(chunk, 1);
        get_property(chunk, constants, "readU32LE");
        call(chunk, 0);
        chunk.write_op(OpCode::Return, 1);
    });
    let mut vm = Vm::bootstrap();
    match vm.execute(function).unwrap() {
        Value::BigInt(b) => assert_eq!(b.borrow().to_decimal_string(), "3721182122"),
        other => panic!("expected BigInt, got {other:?}"),
    }
}

#[test]
fn s4_factorial_of_twenty() {
    let function = top_level(|chunk, constants| {
        get_global(chunk, constants, "Int");
        get_property(chunk, constants, "factorial");
        push_int(chunk, constants, 20);
        call(chunk, 1);
        chunk.write_op(OpCode::Return, 1);
    });
    let mut vm = Vm::bootstrap();
    match vm.execute(function).unwrap() {
        Value::BigInt(b) => assert_eq!(b.borrow().to_decimal_string(), "2432902008176640000"),
        other => panic!("expected BigInt, got {other:?}"),
    }
}

#[test]
fn s5_filter_then_map_chain() {
    // [1,2,3,4,5].filter(x -> x mod 2 == 0).map(x -> x*x) -> [4, 16]
    let mut is_even = FunctionProto::new("isEven", 1);
    {
        let chunk = &mut is_even.chunk;
        let constants = &mut is_even.constants;
        chunk.write_op(OpCode::GetLocal, 1);
        chunk.write_byte(0, 1);
        push_int(chunk, constants, 2);
        chunk.write_op(OpCode::Mod, 1);
        push_int(chunk, constants, 0);
        chunk.write_op(OpCode::Eq, 1);
        chunk.write_op(OpCode::Return, 1);
    }
    let is_even = Rc::new(is_even);

    let mut square = FunctionProto::new("square", 1);
    {
        let chunk = &mut square.chunk;
        chunk.write_op(OpCode::GetLocal, 1);
        chunk.write_byte(0, 1);
        chunk.write_op(OpCode::GetLocal, 1);
        chunk.write_byte(0, 1);
        chunk.write_op(OpCode::Mul, 1);
        chunk.write_op(OpCode::Return, 1);
    }
    let square = Rc::new(square);

    let function = top_level(|chunk, constants| {
        for n in 1..=5 {
            push_int(chunk, constants, n);
        }
        chunk.write_op(OpCode::NewArray, 1);
        chunk.write_u16(5, 1);

        get_property(chunk, constants, "filter");
        let idx = constants.add_function(is_even.clone());
        chunk.write_op(OpCode::Constant, 1);
        chunk.write_byte(idx as u8, 1);
        call(chunk, 1);

        get_property(chunk, constants, "map");
        let idx = constants.add_function(square.clone());
        chunk.write_op(OpCode::Constant, 1);
        chunk.write_byte(idx as u8, 1);
        call(chunk, 1);

        chunk.write_op(OpCode::Return, 1);
    });
    let mut vm = Vm::bootstrap();
    match vm.execute(function).unwrap() {
        Value::Array(arr) => {
            let arr = arr.borrow();
            assert_eq!(arr.len(), 2);
            assert!(matches!(arr.get(0), Some(Value::Int32(4))));
            assert!(matches!(arr.get(1), Some(Value::Int32(16))));
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn s6_prototype_method_binding_survives_extraction_from_the_stack() {
    // let push = [].push; push(1) still grows the original array, because
    // property access on an Array instance binds the receiver into the
    // BoundMethod rather than requiring it back on the stack.
    let function = top_level(|chunk, constants| {
        chunk.write_op(OpCode::NewArray, 1);
        chunk.write_u16(0, 1);
        get_property(chunk, constants, "push");
        push_int(chunk, constants, 1);
        call(chunk, 1);
        chunk.write_op(OpCode::Return, 1);
    });
    let mut vm = Vm::bootstrap();
    assert!(matches!(vm.execute(function).unwrap(), Value::Int32(1)));
}

#[test]
fn invariant_closures_over_the_same_upvalue_observe_each_others_writes() {
    let mut make_counter = FunctionProto::new("makeCounter", 0);
    {
        let chunk = &mut make_counter.chunk;
        let constants = &mut make_counter.constants;
        push_int(chunk, constants, 0); // local slot 0: n

        let mut increment = FunctionProto::new("increment", 0);
        increment.upvalues.push(UpvalueDescriptor { is_local: true, index: 0 });
        {
            let ichunk = &mut increment.chunk;
            let iconsts = &mut increment.constants;
            ichunk.write_op(OpCode::GetUpvalue, 1);
            ichunk.write_byte(0, 1);
            push_int(ichunk, iconsts, 1);
            ichunk.write_op(OpCode::Add, 1);
            ichunk.write_op(OpCode::Dup, 1);
            ichunk.write_op(OpCode::SetUpvalue, 1);
            ichunk.write_byte(0, 1);
            ichunk.write_op(OpCode::Return, 1);
        }
        let idx = constants.add_function(Rc::new(increment));
        chunk.write_op(OpCode::Closure, 1);
        chunk.write_u16(idx as u16, 1);
        chunk.write_op(OpCode::Return, 1);
    }
    let make_counter = Rc::new(make_counter);

    let function = top_level(|chunk, constants| {
        let idx = constants.add_function(make_counter.clone());
        chunk.write_op(OpCode::Closure, 1);
        chunk.write_u16(idx as u16, 1);
        call(chunk, 0);
        chunk.write_op(OpCode::Dup, 1);
        call(chunk, 0); // first increment via one surviving closure: n == 1
        chunk.write_op(OpCode::Pop, 1);
        call(chunk, 0); // second increment via the other: n == 2
        chunk.write_op(OpCode::Return, 1);
    });
    let mut vm = Vm::bootstrap();
    assert!(matches!(vm.execute(function).unwrap(), Value::Int32(2)));
}
