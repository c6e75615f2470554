use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::{DiskManager, IoStats};
use crate::error::{Error, Result};
use crate::storage::page::{PageId, PAGE_SIZE};

/// An in-memory disk manager. Allocated pages live in a BTreeMap, a page
/// that was allocated but never written reads back as zeroes.
#[derive(Debug, Default)]
pub struct Memory {
    pages: BTreeMap<PageId, Vec<u8>>,
    /// deallocated ids below `next_page_id`, reused lowest first.
    free: BTreeSet<PageId>,
    next_page_id: PageId,
    stats: IoStats,
}

impl Memory {
    pub fn new() -> Memory {
        Memory::default()
    }

    pub fn is_allocated(&self, page_id: PageId) -> bool {
        page_id >= 0 && page_id < self.next_page_id && !self.free.contains(&page_id)
    }

    fn check_allocated(&self, page_id: PageId) -> Result<()> {
        if !self.is_allocated(page_id) {
            return Err(Error::Value(format!("page {} is not allocated", page_id)));
        }
        Ok(())
    }
}

impl DiskManager for Memory {
    fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        self.check_allocated(page_id)?;
        check_len(buf.len())?;
        match self.pages.get(&page_id) {
            Some(data) => buf.copy_from_slice(data),
            None => buf.fill(0),
        }
        self.stats.reads += 1;
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, data: &[u8]) -> Result<()> {
        self.check_allocated(page_id)?;
        check_len(data.len())?;
        self.pages.insert(page_id, data.to_vec());
        self.stats.writes += 1;
        Ok(())
    }

    fn allocate_run(&mut self, count: usize) -> Result<PageId> {
        if count == 0 {
            return Err(Error::Value("cannot allocate an empty run".to_string()));
        }
        let count = PageId::try_from(count)?;
        // a single page can reuse a hole, longer runs are always
        // carved from the end of the id space.
        let first = match self.free.first().copied() {
            Some(id) if count == 1 => {
                self.free.remove(&id);
                id
            }
            _ => {
                let first = self.next_page_id;
                self.next_page_id = next_page_id(first, count)?;
                first
            }
        };
        self.stats.allocations += 1;
        debug!("allocated {} page(s) starting at {}", count, first);
        Ok(first)
    }

    fn deallocate_page(&mut self, page_id: PageId) -> Result<()> {
        self.check_allocated(page_id)?;
        self.pages.remove(&page_id);
        self.free.insert(page_id);
        self.stats.deallocations += 1;
        debug!("deallocated page {}", page_id);
        Ok(())
    }

    fn stats(&self) -> IoStats {
        self.stats
    }
}

/// The id following a run of `count` pages starting at `first`, the
/// id space is exhausted once it no longer fits in a PageId.
pub(super) fn next_page_id(first: PageId, count: PageId) -> Result<PageId> {
    first.checked_add(count).ok_or_else(|| {
        Error::Value(format!("cannot allocate {} page(s) after page {}", count, first))
    })
}

pub(super) fn check_len(len: usize) -> Result<()> {
    if len != PAGE_SIZE {
        return Err(Error::Value(format!("page buffer must be {} bytes, got {}", PAGE_SIZE, len)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_run() -> Result<()> {
        let mut disk = Memory::new();
        assert_eq!(0, disk.allocate_run(3)?);
        assert_eq!(3, disk.allocate_run(1)?);
        assert!(disk.is_allocated(2));
        assert!(!disk.is_allocated(4));
        assert!(disk.allocate_run(0).is_err());

        // a freed id is reused by the next single page allocation only.
        disk.deallocate_page(1)?;
        assert_eq!(4, disk.allocate_run(2)?);
        assert_eq!(1, disk.allocate_run(1)?);
        assert_eq!(IoStats { reads: 0, writes: 0, allocations: 4, deallocations: 1 }, disk.stats());
        Ok(())
    }

    #[test]
    fn test_id_space_exhausted() -> Result<()> {
        let mut disk = Memory::new();
        assert_eq!(0, disk.allocate_run(PageId::MAX as usize)?);
        assert!(matches!(disk.allocate_run(1), Err(Error::Value(_))));
        assert!(matches!(disk.allocate_run(2), Err(Error::Value(_))));
        assert!(disk.allocate_run(usize::MAX).is_err());
        assert_eq!(1, disk.stats().allocations);

        // a freed id can still be handed out.
        disk.deallocate_page(5)?;
        assert_eq!(5, disk.allocate_run(1)?);
        Ok(())
    }

    #[test]
    fn test_read_write() -> Result<()> {
        let mut disk = Memory::new();
        let id = disk.allocate_run(1)?;
        let mut buf = vec![7u8; PAGE_SIZE];
        disk.read_page(id, &mut buf)?;
        assert!(buf.iter().all(|&b| b == 0));

        buf[0] = 42;
        disk.write_page(id, &buf)?;
        let mut got = vec![0u8; PAGE_SIZE];
        disk.read_page(id, &mut got)?;
        assert_eq!(buf, got);

        // unallocated and wrongly sized buffers are rejected.
        assert!(disk.read_page(id + 1, &mut got).is_err());
        assert!(disk.write_page(id, &buf[..10]).is_err());
        disk.deallocate_page(id)?;
        assert!(disk.read_page(id, &mut got).is_err());
        assert!(disk.deallocate_page(id).is_err());
        Ok(())
    }
}
