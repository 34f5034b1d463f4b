//! Diagnostic dump of a context's region, emitted through `log`.

use crate::context::Context;
use crate::slot::{Slot, SLOT_BYTES};
use crate::string::{string_bytes, string_len, string_ref_count};
use core::fmt::Write;

const HEX_ROW_BYTES: usize = 16;

/// Logs the pointer stack (top first) and a canonical hex dump of the live
/// heap at debug level. Read-only; a no-op unless debug logging is enabled.
pub fn dump_region(ctx: &Context) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }

    let region = ctx.region();
    log::debug!(
        "frame_ptr {:#x} => stack[{}]",
        ctx.frame_ptr().as_ptr() as usize,
        (ctx.frame_ptr().as_ptr() as usize - region.stack_ptr().as_ptr() as usize) / SLOT_BYTES,
    );

    log::debug!("stack ({} entries, top first):", region.stack_height());
    for index in 0..region.stack_height() {
        let value = region.slot(index);
        log::debug!(
            "  [{index}] {:#x}{}",
            value.addr(),
            describe_slot(ctx, value)
        );
    }

    let heap_len = region.heap_ptr().as_ptr() as usize - region.heap_base().as_ptr() as usize;
    log::debug!("heap ({heap_len} bytes):");
    let mut offset = 0;
    while offset < heap_len {
        let row = (heap_len - offset).min(HEX_ROW_BYTES);
        let mut line = String::new();
        let mut text = String::new();
        for i in 0..row {
            let byte = unsafe {
                // SAFETY: offset + i < heap_len keeps the read in the live heap.
                region.heap_base().as_ptr().add(offset + i).read()
            };
            let _ = write!(line, "{byte:02X} ");
            text.push(if (b' '..=b'~').contains(&byte) {
                byte as char
            } else {
                '.'
            });
        }
        log::debug!("  {offset:06x}: {line:<48} |{text}|");
        offset += row;
    }
}

fn describe_slot(ctx: &Context, value: Slot) -> String {
    if let Some(ptr) = value.as_byte_ptr() {
        if ctx.heap_contains(ptr.as_ptr()) {
            unsafe {
                // SAFETY: heap pointers held by stack slots are string objects.
                return format!(
                    " => \"{}\" (len {}, refs {})",
                    String::from_utf8_lossy(string_bytes(ptr)),
                    string_len(ptr),
                    string_ref_count(ptr)
                );
            }
        }
        if ctx.stack_contains(ptr.as_ptr().cast()) {
            let index = (ptr.as_ptr() as usize - ctx.region().stack_ptr().as_ptr() as usize)
                / SLOT_BYTES;
            return format!(" => stack[{index}]");
        }
        if ptr.as_ptr().cast() == ctx.region().stack_end().as_ptr() {
            return " => stack end".to_string();
        }
    }
    String::new()
}
