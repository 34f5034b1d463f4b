//! Scope frames on the pointer stack.
//!
//! A frame is a two-slot header: the slot at `frame_ptr + 1` holds the
//! previous frame address and the slot at `frame_ptr` holds its own
//! address. The self slot is what lets teardown walks tell a header apart
//! from ordinary entries. The chain terminates at the stack-end sentinel.

use crate::context::Context;
use crate::slot::Slot;
use crate::unwind::{release_slot, CmdResult, ErrorKind};
use core::ptr::NonNull;

/// Slots consumed by one frame header.
pub const FRAME_HEADER_SLOTS: usize = 2;

/// Opens a new frame: pushes the previous frame link, then the self
/// sentinel, and points the context at the new header.
pub fn frame_push(ctx: &mut Context) -> CmdResult<()> {
    ctx.check();

    if ctx.stack_space() < FRAME_HEADER_SLOTS {
        return Err(ErrorKind::OutOfMemory);
    }

    let prev = ctx.frame_ptr();
    let region = ctx.region_mut();
    region.push(Slot::from_slot_ptr(prev));
    let frame = unsafe {
        // SAFETY: stack_space >= 2 leaves a full free slot below the top.
        NonNull::new_unchecked(region.stack_ptr().as_ptr().sub(1))
    };
    region.push(Slot::from_slot_ptr(frame));
    debug_assert!(region.stack_ptr() == frame);
    ctx.set_frame_ptr(frame);
    Ok(())
}

/// Closes the current frame: releases every scope-local entry, drops the
/// header, and restores the previous frame.
pub fn frame_pop(ctx: &mut Context) {
    ctx.check();
    debug_assert!(ctx.stack_height() >= FRAME_HEADER_SLOTS);
    debug_assert!(ctx.frame_ptr() != ctx.region().stack_end());

    let frame = ctx.frame_ptr().as_ptr() as usize;
    while (ctx.region().stack_ptr().as_ptr() as usize) <= frame {
        let value = ctx.region_mut().pop();
        release_slot(ctx, value);
    }

    let prev = ctx
        .region_mut()
        .pop()
        .as_slot_ptr()
        .expect("frame link must be a stack address");
    ctx.set_frame_ptr(prev);
}

/// Finds the frame at `level`.
///
/// `0` is the current frame. Positive levels walk outward along the
/// previous-frame links; the result is `None` when the chain ends first.
/// Negative levels address from the base, `-1` being the outermost frame;
/// the walk materializes the frame list on the free portion of the stack
/// and raises out-of-memory when it does not fit.
pub fn frame_seek(ctx: &mut Context, level: i32) -> CmdResult<Option<NonNull<Slot>>> {
    ctx.check();

    let stack_end = ctx.region().stack_end();
    let mut frame = ctx.frame_ptr();

    if frame == stack_end && level != 0 {
        return Ok(None);
    }

    if level > 0 {
        let mut remaining = level;
        loop {
            frame = prev_frame(ctx, frame);
            if frame == stack_end {
                return Ok(None);
            }
            remaining -= 1;
            if remaining == 0 {
                break;
            }
        }
        Ok(Some(frame))
    } else if level < 0 {
        let saved_height = ctx.stack_height();

        // Walk top to bottom, pushing each frame address to index the
        // chain from its far end.
        loop {
            if ctx.stack_space() < 1 {
                return Err(ErrorKind::OutOfMemory);
            }
            ctx.region_mut().push(Slot::from_slot_ptr(frame));
            frame = prev_frame(ctx, frame);
            if frame == stack_end {
                break;
            }
        }

        let count = ctx.stack_height() - saved_height;
        let index = (-1 - level) as usize;
        let found = if index < count {
            let entry = ctx.region().slot(index);
            Some(entry.as_slot_ptr().expect("frame list holds stack addresses"))
        } else {
            None
        };
        ctx.region_mut().pop_n(count);
        Ok(found)
    } else {
        Ok(Some(frame))
    }
}

fn prev_frame(ctx: &Context, frame: NonNull<Slot>) -> NonNull<Slot> {
    let region = ctx.region();
    let index = region.index_of(frame);
    region
        .slot(index + 1)
        .as_slot_ptr()
        .expect("frame link must be a stack address")
}
