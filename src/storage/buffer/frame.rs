use crate::storage::page::{FrameId, PageId, INVALID_PAGE_ID};

/// In-memory metadata of one buffer pool frame. There is exactly one
/// descriptor per frame, they are allocated with the pool and only ever
/// reset, never reallocated.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDescriptor {
    pub page_id: PageId,
    pub pin_count: u32,
    pub dirty: bool,
    pub valid: bool,
    /// "recently used" hint, consumed by the clock sweep.
    pub ref_bit: bool,
}

impl FrameDescriptor {
    pub fn new() -> Self {
        FrameDescriptor {
            page_id: INVALID_PAGE_ID,
            pin_count: 0,
            dirty: false,
            valid: false,
            ref_bit: false,
        }
    }

    /// Drop whatever page the frame holds. Only the metadata is reset,
    /// the frame's bytes are left as they are.
    pub fn evict(&mut self) {
        *self = FrameDescriptor::new();
    }

    /// Bind the frame to `page_id` with a single pin.
    pub fn install(&mut self, page_id: PageId) {
        self.page_id = page_id;
        self.pin_count = 1;
        self.dirty = false;
        self.valid = true;
        self.ref_bit = true;
    }

    /// Release one pin, return true if the frame became unpinned. The
    /// dirty bit is only ever raised here, a clean unpin keeps it.
    ///
    /// The caller makes sure the frame is pinned.
    pub fn unpin(&mut self, dirty: bool) -> bool {
        debug_assert!(self.pin_count > 0);
        self.dirty |= dirty;
        self.pin_count -= 1;
        if self.pin_count == 0 {
            self.ref_bit = true;
            return true;
        }
        false
    }

    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }
}

impl Default for FrameDescriptor {
    fn default() -> Self {
        FrameDescriptor::new()
    }
}

/// A narrow view over the frame descriptors handed to the replacer. It
/// can inspect frame state and clear reference bits, nothing else, the
/// descriptors stay owned by the buffer pool.
pub struct FrameView<'a> {
    frames: &'a mut [FrameDescriptor],
}

impl<'a> FrameView<'a> {
    pub fn new(frames: &'a mut [FrameDescriptor]) -> Self {
        FrameView { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_valid(&self, frame_id: FrameId) -> bool {
        self.frames[frame_id].valid
    }

    pub fn is_pinned(&self, frame_id: FrameId) -> bool {
        self.frames[frame_id].is_pinned()
    }

    pub fn ref_bit(&self, frame_id: FrameId) -> bool {
        self.frames[frame_id].ref_bit
    }

    pub fn clear_ref_bit(&mut self, frame_id: FrameId) {
        self.frames[frame_id].ref_bit = false;
    }
}
