use std::fmt::{Debug, Formatter};
use std::ops::{Deref, DerefMut};
use std::sync::RwLock;

pub type PageId = i64;

/// Index of a frame in the buffer pool, in range [0, pool_size).
pub type FrameId = usize;

/// Size of a data page in byte.
pub const PAGE_SIZE: usize = 4096;

/// Invalid page id
pub const INVALID_PAGE_ID: PageId = -1;

/// The raw bytes of a page. The length is always PAGE_SIZE.
pub struct PageData {
    data: Box<[u8]>,
}

impl PageData {
    fn new() -> Self {
        Self { data: vec![0u8; PAGE_SIZE].into_boxed_slice() }
    }

    /// Overwrite the whole page with the given bytes, the caller
    /// makes sure `src` is exactly PAGE_SIZE long.
    pub fn copy_from(&mut self, src: &[u8]) {
        self.data.copy_from_slice(src);
    }
}

impl Deref for PageData {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl DerefMut for PageData {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl AsRef<[u8]> for PageData {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl AsMut<[u8]> for PageData {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Page act as the container of the actual page data for
/// providing concurrent access protection. The in-memory metadata
/// (pin count, dirty bit etc.) lives in the buffer pool's frame
/// descriptors, not here.
pub struct Page {
    inner: RwLock<PageData>,
}

impl Page {
    /// Allocate a zeroed page in memory with the given PAGE_SIZE.
    pub fn new() -> Self {
        Page { inner: RwLock::new(PageData::new()) }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new()
    }
}

impl Deref for Page {
    type Target = RwLock<PageData>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Debug for Page {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Page({} bytes)", PAGE_SIZE)
    }
}
