//! Memory and execution-context core for a tiny embedded command language.
//!
//! Everything an interpreter instance owns lives in one caller-sized
//! region of pointer-sized slots: a bump-allocated, compactable object
//! heap grows upward from the low end while the pointer stack and frame
//! chain grow downward from the high end. Heap objects are addressed
//! directly; the stack is the precise root set, and every relocation
//! rewrites the slots that pointed into the moved range. String objects
//! are reference counted, and failures unwind to the nearest protected
//! boundary, releasing every reference acquired inside it.
//!
//! Parsing, command dispatch, and evaluation are built on top of this
//! crate; they allocate only through the surfaces here and follow the
//! raise contract documented in [`unwind`].

pub mod context;
pub mod dump;
pub mod frame;
pub mod pack;
pub mod region;
pub mod slot;
pub mod string;
pub mod unwind;

pub use context::{Context, ContextConfig, ContextError, INITIAL_FRAMES, MIN_REGION_ENTRIES};
pub use slot::{Slot, SLOT_BYTES};
pub use string::MAX_STRING_LEN;
pub use unwind::{protect, raise_runtime_error, raise_syntax_error, CmdResult, ErrorKind};
