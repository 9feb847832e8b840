//! Builtin classes installed into the VM's global namespace at bootstrap
//! (spec.md §6.3): `Number`/`Int`/`Float`/`Boolean`/`Null` (`numeric`),
//! `Array`/`Object`/`Range` (`collections`), `String`/`StringBuilder`
//! (`string`), `Buffer`/`BufferBuilder`/`BufferReader` (`buffer`), and the
//! ambient `LocalDate`/`LocalTime`/`LocalDateTime`/`Instant` family
//! (`datetime`, `SPEC_FULL.md` §4.4).

pub mod buffer;
pub mod collections;
pub mod datetime;
pub mod numeric;
pub mod string;
pub mod support;
