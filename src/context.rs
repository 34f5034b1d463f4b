//! Interpreter context: one region, one stack, one frame chain.

use crate::frame::frame_push;
use crate::region::Region;
use crate::slot::Slot;
use crate::unwind::{protect, CmdResult};
use core::ffi::c_void;
use core::ptr::NonNull;

/// Smallest region accepted by [`Context::new`], in slots.
pub const MIN_REGION_ENTRIES: usize = 16;

/// Frames pushed during construction: the procedure table frame, then the
/// global table frame inside it.
pub const INITIAL_FRAMES: usize = 2;

#[cfg(debug_assertions)]
const CONTEXT_TAG: u32 = 0x7c31_9a56;

struct RegionStorage {
    ptr: NonNull<[Slot]>,
}

impl RegionStorage {
    fn new(entries: usize) -> Self {
        let boxed = vec![Slot::null(); entries].into_boxed_slice();
        let ptr = NonNull::new(Box::into_raw(boxed)).expect("region storage must be non-null");
        Self { ptr }
    }

    fn base_ptr(&self) -> NonNull<Slot> {
        NonNull::new(self.ptr.as_ptr().cast::<Slot>()).expect("region storage must be non-null")
    }
}

impl Drop for RegionStorage {
    fn drop(&mut self) {
        unsafe {
            // SAFETY: ptr was created from Box::into_raw in RegionStorage::new.
            drop(Box::from_raw(self.ptr.as_ptr()));
        }
    }
}

/// Context initialization parameters.
pub struct ContextConfig {
    /// Region size in pointer-sized slots; the context's only memory.
    pub region_entries: usize,
    /// Opaque host pointer returned by [`Context::user_data`].
    pub user_data: *mut c_void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    RegionTooSmall { min: usize, actual: usize },
    OutOfMemory,
}

/// Owner of one contiguous slot region and everything living inside it.
///
/// Invariants:
/// - All interpreter memory comes from the region; the storage is
///   allocated once at construction and never reallocated.
/// - `frame_ptr` targets the current frame header, or the stack-end
///   sentinel when no frame is open.
/// - Every stack slot holding a heap pointer is a counted reference.
pub struct Context {
    // Owns the slot array the region cursors point into.
    #[allow(dead_code)]
    storage: RegionStorage,
    region: Region,
    frame_ptr: NonNull<Slot>,
    user_data: *mut c_void,
    #[cfg(debug_assertions)]
    tag: u32,
}

impl Context {
    pub fn new(config: ContextConfig) -> Result<Self, ContextError> {
        let entries = config.region_entries;
        if entries < MIN_REGION_ENTRIES {
            return Err(ContextError::RegionTooSmall {
                min: MIN_REGION_ENTRIES,
                actual: entries,
            });
        }

        let storage = RegionStorage::new(entries);
        let region = Region::new(storage.base_ptr(), entries);
        let frame_ptr = region.stack_end();
        let mut ctx = Self {
            storage,
            region,
            frame_ptr,
            user_data: config.user_data,
            #[cfg(debug_assertions)]
            tag: CONTEXT_TAG,
        };

        match protect(&mut ctx, construct) {
            Ok(()) => Ok(ctx),
            Err(_) => {
                #[cfg(debug_assertions)]
                {
                    ctx.tag = 0;
                }
                Err(ContextError::OutOfMemory)
            }
        }
    }

    /// The host pointer supplied at construction.
    pub fn user_data(&self) -> *mut c_void {
        self.check();
        self.user_data
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn region_mut(&mut self) -> &mut Region {
        self.check();
        &mut self.region
    }

    /// Current frame header address; the stack-end sentinel when no frame
    /// is open.
    pub fn frame_ptr(&self) -> NonNull<Slot> {
        self.frame_ptr
    }

    pub(crate) fn set_frame_ptr(&mut self, frame: NonNull<Slot>) {
        self.frame_ptr = frame;
    }

    pub fn heap_space(&self) -> usize {
        self.region.heap_space()
    }

    pub fn heap_contains(&self, ptr: *const u8) -> bool {
        self.region.heap_contains(ptr)
    }

    pub fn stack_space(&self) -> usize {
        self.region.stack_space()
    }

    pub fn stack_height(&self) -> usize {
        self.region.stack_height()
    }

    pub fn stack_contains(&self, ptr: *const Slot) -> bool {
        self.region.stack_contains(ptr)
    }

    #[inline]
    pub(crate) fn check(&self) {
        #[cfg(debug_assertions)]
        debug_assert_eq!(
            self.tag, CONTEXT_TAG,
            "context operated on after failed construction"
        );
    }
}

fn construct(ctx: &mut Context) -> CmdResult<()> {
    // Procedure table frame, then the global table frame inside it.
    frame_push(ctx)?;
    frame_push(ctx)?;
    Ok(())
}
