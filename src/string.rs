//! Reference-counted string objects on the region heap.
//!
//! Layout, in order: one reference-count byte (1..=255), a little-endian
//! u16 length, the content bytes, one terminating NUL. The NUL is a host
//! convenience and never part of the logical value. The object is freed
//! when a release would take the count to zero.

use crate::context::Context;
use crate::pack::{get_u16, put_u16};
use crate::slot::Slot;
use crate::unwind::{CmdResult, ErrorKind};
use core::cmp::Ordering;
use core::ptr::{self, NonNull};
use core::slice;

/// Maximum content length of a single string.
pub const MAX_STRING_LEN: u16 = 32767;

const FIELD_REF_COUNT: usize = 0;
const FIELD_LEN: usize = 1;
const FIELD_CHARS: usize = 3;

/// Heap bytes required for a string of content length `len`.
pub const fn string_size(len: u16) -> usize {
    FIELD_CHARS + len as usize + 1
}

/// # Safety
/// `s` must point at a live string object on a context heap.
pub unsafe fn string_ref_count(s: NonNull<u8>) -> u8 {
    unsafe { s.as_ptr().add(FIELD_REF_COUNT).read() }
}

/// # Safety
/// `s` must point at a live string object on a context heap.
pub unsafe fn string_len(s: NonNull<u8>) -> u16 {
    unsafe { get_u16(slice::from_raw_parts(s.as_ptr().add(FIELD_LEN), 2)) }
}

/// # Safety
/// `s` must point at a live string object on a context heap.
pub unsafe fn string_chars(s: NonNull<u8>) -> NonNull<u8> {
    unsafe { NonNull::new_unchecked(s.as_ptr().add(FIELD_CHARS)) }
}

/// Content bytes of a string, excluding the terminating NUL.
///
/// # Safety
/// `s` must point at a live string object on a context heap, and the
/// returned slice must be dropped before the next heap mutation (any
/// allocator call may move the bytes).
pub unsafe fn string_bytes<'a>(s: NonNull<u8>) -> &'a [u8] {
    unsafe { slice::from_raw_parts(string_chars(s).as_ptr(), string_len(s) as usize) }
}

// Writes the header fields into a fresh allocation. Content bytes are
// left uninitialized.
unsafe fn string_emplace(s: NonNull<u8>, len: u16) {
    debug_assert!(len <= MAX_STRING_LEN);
    unsafe {
        s.as_ptr().add(FIELD_REF_COUNT).write(1);
        put_u16(slice::from_raw_parts_mut(s.as_ptr().add(FIELD_LEN), 2), len);
        string_chars(s).as_ptr().add(len as usize).write(0);
    }
}

/// Allocates a new string object with count 1 and uninitialized content.
pub fn string_alloc(ctx: &mut Context, len: u16) -> CmdResult<NonNull<u8>> {
    ctx.check();
    debug_assert!(len <= MAX_STRING_LEN);

    let size = string_size(len);
    if size > ctx.heap_space() {
        return Err(ErrorKind::OutOfMemory);
    }

    let s = ctx.region_mut().alloc(size);
    unsafe {
        // SAFETY: s is a fresh allocation of string_size(len) bytes.
        string_emplace(s, len);
    }
    Ok(s)
}

/// Creates a new string holding a copy of `content`. Content longer than
/// [`MAX_STRING_LEN`] raises out-of-memory.
pub fn string_new(ctx: &mut Context, content: &[u8]) -> CmdResult<NonNull<u8>> {
    ctx.check();

    if content.len() > MAX_STRING_LEN as usize {
        return Err(ErrorKind::OutOfMemory);
    }

    let s = string_alloc(ctx, content.len() as u16)?;
    unsafe {
        // SAFETY: the allocation holds content.len() content bytes.
        ptr::copy_nonoverlapping(content.as_ptr(), string_chars(s).as_ptr(), content.len());
    }
    Ok(s)
}

/// Increments a string's reference count.
///
/// A count already at 255 is a caller bug, not a recoverable error.
///
/// # Safety
/// `s` must point at a live string object on `ctx`'s heap.
pub unsafe fn string_acquire(ctx: &mut Context, s: NonNull<u8>) -> NonNull<u8> {
    ctx.check();
    debug_assert!(ctx.heap_contains(s.as_ptr()));

    let count = unsafe { string_ref_count(s) };
    assert!(count < u8::MAX, "string reference count overflow");
    unsafe {
        s.as_ptr().add(FIELD_REF_COUNT).write(count + 1);
    }
    s
}

/// Decrements a string's reference count, freeing the object when the
/// count would reach zero. Freeing relocates allocations above `s` and
/// rewrites stack slots that pointed into the moved range.
///
/// # Safety
/// `s` must point at a live string object on `ctx`'s heap; after a freeing
/// release every copy of `s` outside the stack is dangling.
pub unsafe fn string_release(ctx: &mut Context, s: NonNull<u8>) {
    ctx.check();
    debug_assert!(ctx.heap_contains(s.as_ptr()));

    let count = unsafe { string_ref_count(s) };
    if count == 1 {
        let size = string_size(unsafe { string_len(s) });
        ctx.region_mut().free(s, size);
    } else {
        unsafe {
            s.as_ptr().add(FIELD_REF_COUNT).write(count - 1);
        }
    }
}

/// Extends a string's content to `new_len` bytes. The string itself stays
/// in place; allocations above it move up. New bytes are uninitialized.
///
/// # Safety
/// `s` must point at a live string object on `ctx`'s heap.
pub unsafe fn string_grow(ctx: &mut Context, s: NonNull<u8>, new_len: u16) -> CmdResult<()> {
    ctx.check();
    debug_assert!(ctx.heap_contains(s.as_ptr()));
    debug_assert!(new_len <= MAX_STRING_LEN);

    let len = unsafe { string_len(s) };
    debug_assert!(new_len > len);
    let delta = (new_len - len) as usize;
    if ctx.heap_space() < delta {
        return Err(ErrorKind::OutOfMemory);
    }

    ctx.region_mut().grow(s, string_size(len), string_size(new_len));
    unsafe {
        put_u16(
            slice::from_raw_parts_mut(s.as_ptr().add(FIELD_LEN), 2),
            new_len,
        );
        string_chars(s).as_ptr().add(new_len as usize).write(0);
    }
    Ok(())
}

/// Truncates a string's content to `new_len` bytes.
///
/// # Safety
/// `s` must point at a live string object on `ctx`'s heap.
pub unsafe fn string_shrink(ctx: &mut Context, s: NonNull<u8>, new_len: u16) {
    ctx.check();
    debug_assert!(ctx.heap_contains(s.as_ptr()));

    let len = unsafe { string_len(s) };
    debug_assert!(new_len < len);

    ctx.region_mut()
        .shrink(s, string_size(len), string_size(new_len));
    unsafe {
        put_u16(
            slice::from_raw_parts_mut(s.as_ptr().add(FIELD_LEN), 2),
            new_len,
        );
        string_chars(s).as_ptr().add(new_len as usize).write(0);
    }
}

/// Lexicographic byte comparison; equal prefixes order by length.
/// Unaffected by reference-count changes.
///
/// # Safety
/// `a` and `b` must point at live string objects on a context heap.
pub unsafe fn string_compare(a: NonNull<u8>, b: NonNull<u8>) -> Ordering {
    unsafe { string_bytes(a).cmp(string_bytes(b)) }
}

/// Convenience for pushing a counted reference: the freshly created or
/// acquired string lands on the pointer stack as a strong root.
pub fn push_string(ctx: &mut Context, s: NonNull<u8>) {
    ctx.check();
    debug_assert!(ctx.heap_contains(s.as_ptr()));
    debug_assert!(ctx.stack_space() >= 1);
    ctx.region_mut().push(Slot::from_ptr(s));
}
