//! Links foreign stencils into the heap.
//!
//! [`compile_script`] runs the front end through a [`stencil_ffi::CompileBridge`],
//! routes the result with [`classify`], and on success hands the borrowed
//! descriptor to [`materialize`], which builds and shares a script under the
//! heap's rooting rules. The stencil guard is dropped on the way out of
//! every path.

mod classify;
mod compile;
mod error;
mod gcthings;
mod materialize;

pub use classify::{classify, Outcome};
pub use compile::{compile_script, CompileOutcome};
pub use error::LinkError;
pub use gcthings::{GcThingPlan, GcThingSource};
pub use materialize::{materialize, note_length, SRC_NULL};
