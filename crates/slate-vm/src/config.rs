//! Host-supplied VM configuration (`SPEC_FULL.md` §6.3 ambient addition).
//!
//! A compiled-language VM has no environment variables or config files to
//! read, so its "configuration layer" is this small struct the host fills
//! in at construction time — the embeddable-library analogue of the config
//! structs the corpus passes into its engines.

use slate_core::heap::datetime::{Clock, SystemClock};

pub struct VmConfig {
    /// Fatal `StackOverflow` above this many live call frames (spec.md
    /// §4.9: "a fixed maximum depth").
    pub max_frame_depth: usize,
    /// Initial operand-stack capacity, to avoid early reallocation.
    pub initial_stack_capacity: usize,
    /// Whether `Vm::bootstrap` installs the datetime classes
    /// (`LocalDate`/`LocalTime`/`LocalDateTime`/`Instant`).
    pub install_datetime_classes: bool,
    /// Source of `now()`/`today()` for the datetime classes; tests inject
    /// a fixed clock for determinism.
    pub clock: Box<dyn Clock>,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            max_frame_depth: 256,
            initial_stack_capacity: 256,
            install_datetime_classes: true,
            clock: Box::new(SystemClock),
        }
    }
}
