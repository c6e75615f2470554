use std::fmt::Debug;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::page::PageId;

mod file;
mod memory;

pub use file::File;
pub use memory::Memory;

/// Counters of the I/O requests a disk manager has served.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IoStats {
    pub reads: u64,
    pub writes: u64,
    pub allocations: u64,
    pub deallocations: u64,
}

/// The disk manager performs the actual block I/O for the buffer pool
/// and owns the page id space. Pages are opaque byte buffers of
/// exactly PAGE_SIZE bytes, the disk manager never interprets them.
///
/// The DiskManager trait is `trait object` compatible so the buffer pool
/// can hold any implementation as `Box<dyn DiskManager>`.
pub trait DiskManager: Debug + Send {
    /// Fill `buf` with the on-disk contents of `page_id`. Fails if the
    /// page is not allocated.
    fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> Result<()>;

    /// Persist `data` as the contents of `page_id`.
    fn write_page(&mut self, page_id: PageId, data: &[u8]) -> Result<()>;

    /// Reserve `count` contiguous page ids, return the first one. A page
    /// that was never written, or whose id was freed and handed out again,
    /// reads back as zeroes. Fails once the id space is exhausted.
    fn allocate_run(&mut self, count: usize) -> Result<PageId>;

    /// Release a previously allocated page id.
    fn deallocate_page(&mut self, page_id: PageId) -> Result<()>;

    fn stats(&self) -> IoStats;
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskType {
    Memory,
    File,
}

pub fn new_disk_manager(typ: DiskType, data_dir: &str) -> Result<Box<dyn DiskManager>> {
    match typ {
        DiskType::Memory => Ok(Box::new(Memory::new())),
        DiskType::File => Ok(Box::new(File::open(Path::new(data_dir))?)),
    }
}
