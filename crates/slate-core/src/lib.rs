//! Value model, heap object model, and numeric tower for the Slate
//! runtime (spec.md §3, §4.1-§4.7).

pub mod bigint;
pub mod equals;
pub mod error;
pub mod gc;
pub mod hash;
pub mod heap;
pub mod numeric;
pub mod value;

pub mod prelude {
    pub use crate::bigint::BigInt;
    pub use crate::equals::equals;
    pub use crate::error::{ErrorKind, RuntimeError, RuntimeResult};
    pub use crate::gc::Gc;
    pub use crate::hash::hash_value;
    pub use crate::value::{NativeContext, NativeFn, Value};
}
