//! Protected execution and stack unwinding.
//!
//! Raising is `Err(ErrorKind)`: a helper that detects exhaustion returns
//! immediately and intermediate code propagates with `?`. Recovery happens
//! exclusively at a [`protect`] boundary, which truncates the pointer stack
//! to its entry mark, releases every heap reference popped on the way, and
//! restores the frame pointer. Control always returns directly to the
//! protected caller.

use crate::context::Context;
use crate::slot::Slot;
use crate::string::{string_new, string_release};

/// Failure kinds delivered through a protected boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A request exceeded the free heap bytes or free stack slots. Raised
    /// bare; there may be no room for a message object.
    OutOfMemory,
    /// Evaluator-level semantic failure. The raiser pushes one message
    /// string before raising.
    RuntimeError,
    /// Parser-level failure. The raiser pushes one message string before
    /// raising.
    SyntaxError,
}

pub type CmdResult<T = ()> = Result<T, ErrorKind>;

/// Runs `body` inside a protected region.
///
/// On failure, the stack is truncated to its height at entry and every
/// popped slot that references a heap object is released. For
/// `RuntimeError` / `SyntaxError` the topmost slot at raise time is the
/// error message; it survives the truncation as the single entry above the
/// entry mark. Protected regions nest freely.
pub fn protect<F>(ctx: &mut Context, body: F) -> CmdResult<()>
where
    F: FnOnce(&mut Context) -> CmdResult<()>,
{
    ctx.check();

    let saved_height = ctx.stack_height();
    let saved_frame = ctx.frame_ptr();

    let result = body(ctx);
    if let Err(kind) = result {
        unwind(ctx, saved_height, kind);
        ctx.set_frame_ptr(saved_frame);
    }
    result
}

fn unwind(ctx: &mut Context, saved_height: usize, kind: ErrorKind) {
    let height = ctx.stack_height();
    debug_assert!(height >= saved_height);
    let mut excess = height - saved_height;
    if excess == 0 {
        return;
    }

    if kind != ErrorKind::OutOfMemory {
        // The topmost slot is the error message. Park it in the slot that
        // becomes the restored top: inside the live stack range it keeps
        // being rewritten while the release walk moves the heap under it.
        ctx.region_mut().swap(0, excess - 1);
        while excess > 1 {
            let value = ctx.region_mut().pop();
            release_slot(ctx, value);
            excess -= 1;
        }
    } else {
        while excess > 0 {
            let value = ctx.region_mut().pop();
            release_slot(ctx, value);
            excess -= 1;
        }
    }
}

/// Releases the heap reference held by a popped slot, if it holds one.
/// Strings are the only heap object kind; the dispatch for future kinds
/// lives here.
pub fn release_slot(ctx: &mut Context, value: Slot) {
    if let Some(ptr) = value.as_byte_ptr() {
        if ctx.heap_contains(ptr.as_ptr()) {
            unsafe {
                // SAFETY: every heap pointer held by a stack slot is a
                // counted string reference.
                string_release(ctx, ptr);
            }
        }
    }
}

/// Pushes a message string and reports a runtime error. Falls back to a
/// bare out-of-memory raise when the message does not fit.
pub fn raise_runtime_error(ctx: &mut Context, message: &str) -> ErrorKind {
    raise_with_message(ctx, ErrorKind::RuntimeError, message)
}

/// Pushes a message string and reports a syntax error. Falls back to a
/// bare out-of-memory raise when the message does not fit.
pub fn raise_syntax_error(ctx: &mut Context, message: &str) -> ErrorKind {
    raise_with_message(ctx, ErrorKind::SyntaxError, message)
}

fn raise_with_message(ctx: &mut Context, kind: ErrorKind, message: &str) -> ErrorKind {
    debug_assert!(kind != ErrorKind::OutOfMemory);
    match string_new(ctx, message.as_bytes()) {
        // The allocation may have claimed the last free slot; re-check
        // before rooting the message.
        Ok(s) if ctx.stack_space() >= 1 => {
            ctx.region_mut().push(Slot::from_ptr(s));
            kind
        }
        Ok(s) => {
            unsafe {
                // SAFETY: s was created above and has no other owner.
                string_release(ctx, s);
            }
            ErrorKind::OutOfMemory
        }
        Err(_) => ErrorKind::OutOfMemory,
    }
}
