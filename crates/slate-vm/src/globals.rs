//! Global namespace bootstrap (spec.md §6.3): every builtin `Class` is
//! registered under its own name before the host's own globals are added.
//!
//! Grounded in the teacher's engine-registration pass (`core::engine`
//! populating the default namespace with built-in application interfaces)
//! generalised from a fixed FFI registry to the fixed set of builtin
//! classes this VM actually has.

use crate::builtins;
use crate::config::VmConfig;
use rustc_hash::FxHashMap;
use slate_core::heap::class::ClassDef;
use slate_core::value::Value;

/// Populates `globals` with every required builtin `Class`
/// (`SPEC_FULL.md` §6.3): `Number, Int, Float, String, Array, Object,
/// Boolean, Null, Range, Buffer, BufferBuilder, BufferReader, StringBuilder`
/// unconditionally, and the `LocalDate`/`LocalTime`/`LocalDateTime`/
/// `Instant` family when `config.install_datetime_classes` is set.
pub fn install(globals: &mut FxHashMap<String, Value>, config: &VmConfig) {
    let register = |globals: &mut FxHashMap<String, Value>, class: ClassDef| {
        globals.insert(class.name.clone(), Value::Class(slate_core::gc::Gc::new(class)));
    };

    register(globals, builtins::numeric::number_class());
    register(globals, builtins::numeric::int_class());
    register(globals, builtins::numeric::float_class());
    register(globals, builtins::numeric::boolean_class());
    register(globals, builtins::numeric::null_class());

    register(globals, builtins::collections::array_class());
    register(globals, builtins::collections::object_class());
    register(globals, builtins::collections::range_class());

    register(globals, builtins::string::string_class());
    register(globals, builtins::string::string_builder_class());

    register(globals, builtins::buffer::buffer_class());
    register(globals, builtins::buffer::buffer_builder_class());
    register(globals, builtins::buffer::buffer_reader_class());

    if config.install_datetime_classes {
        register(globals, builtins::datetime::local_date_class());
        register(globals, builtins::datetime::local_time_class());
        register(globals, builtins::datetime::local_date_time_class());
        register(globals, builtins::datetime::instant_class());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installs_every_required_class() {
        let mut globals = FxHashMap::default();
        install(&mut globals, &VmConfig::default());
        for name in [
            "Number", "Int", "Float", "String", "Array", "Object", "Boolean", "Null", "Range",
            "Buffer", "BufferBuilder", "BufferReader", "LocalDate", "LocalTime", "LocalDateTime",
            "Instant", "StringBuilder",
        ] {
            assert!(matches!(globals.get(name), Some(Value::Class(_))), "missing {name}");
        }
    }

    #[test]
    fn datetime_family_is_gated_by_config() {
        let mut globals = FxHashMap::default();
        let mut config = VmConfig::default();
        config.install_datetime_classes = false;
        install(&mut globals, &config);
        assert!(globals.get("Instant").is_none());
        assert!(globals.get("Int").is_some());
    }
}
