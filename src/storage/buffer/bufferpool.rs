use std::sync::{Arc, Mutex};

use log::{debug, trace, warn};

use super::frame::{FrameDescriptor, FrameView};
use super::page_table::PageTable;
use super::replacer::{ClockReplacer, Replacer};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::disk::{new_disk_manager, DiskManager, IoStats};
use crate::storage::page::{FrameId, Page, PageId, PAGE_SIZE};

/// How the contents of a frame are determined when a page is pinned
/// into it. Ignored if the page is already resident.
#[derive(Copy, Clone, Debug)]
pub enum PinMode<'a> {
    /// Read the page from disk into the frame.
    DiskRead,
    /// Copy the given PAGE_SIZE bytes into the frame, no disk I/O.
    MemCopy(&'a [u8]),
    /// Copy nothing, the frame contents are undefined until the caller
    /// writes them.
    NoOp,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnpinMode {
    Dirty,
    Clean,
}

impl UnpinMode {
    pub fn is_dirty(&self) -> bool {
        *self == UnpinMode::Dirty
    }
}

impl From<bool> for UnpinMode {
    fn from(dirty: bool) -> Self {
        if dirty {
            UnpinMode::Dirty
        } else {
            UnpinMode::Clean
        }
    }
}

/// The buffer pool is responsible for moving physical pages back and forth
/// from main memory to disk. It allows a DBMS to support databases that are
/// larger than the amount of memory available to the system.
///
/// The buffer pool's operations are transparent to other parts in the system.
/// For example, the system asks the buffer pool for a page using its unique
/// identifier (page_id) and it does not know whether that page is already in
/// memory or whether the system has to retrieve it from disk.
///
/// The pool itself is single-threaded, see [`BufferPoolManager`] for the
/// shareable version.
pub struct BufferPool {
    pool_size: usize,
    /// disk manager doing the actual page I/O and id allocation.
    disk: Box<dyn DiskManager>,
    /// array of buffer pool pages. use the array index as
    /// FrameId, i.e., the FrameId is in range: [0, pool_size).
    pages: Vec<Arc<Page>>,
    /// metadata of each frame, indexed the same way as `pages`.
    frames: Vec<FrameDescriptor>,
    /// page table for keeping track of buffer pool pages.
    page_table: PageTable,
    /// Replacer to find unpinned frames for replacement.
    replacer: Box<dyn Replacer>,
}

impl BufferPool {
    pub fn new(disk: Box<dyn DiskManager>, pool_size: usize) -> Result<Self> {
        Self::with_replacer(disk, pool_size, Box::new(ClockReplacer::new()))
    }

    pub fn with_replacer(
        disk: Box<dyn DiskManager>,
        pool_size: usize,
        replacer: Box<dyn Replacer>,
    ) -> Result<Self> {
        if pool_size == 0 {
            return Err(Error::Value("buffer pool needs at least one frame".to_string()));
        }
        let pages = (0..pool_size).map(|_| Arc::new(Page::new())).collect();
        let frames = vec![FrameDescriptor::new(); pool_size];
        let page_table = PageTable::with_capacity(pool_size);
        Ok(BufferPool { pool_size, disk, pages, frames, page_table, replacer })
    }

    /// Pin the page with the given page id, return the frame holding it.
    ///
    /// If the page is resident, this simply increments the pin count and
    /// `mode` is ignored. Otherwise a victim frame is picked by the replacer,
    /// written back to disk if it is dirty, and filled according to `mode`.
    ///
    /// The returned page is only meaningful until the matching unpin, after
    /// that the frame may be handed to another page.
    pub fn pin(&mut self, page_id: PageId, mode: PinMode<'_>) -> Result<Arc<Page>> {
        if let Some(frame_id) = self.page_table.get(page_id) {
            let desc = &mut self.frames[frame_id];
            desc.pin_count += 1;
            trace!("pin hit page {} in frame {}, pin count {}", page_id, frame_id, desc.pin_count);
            return Ok(Arc::clone(&self.pages[frame_id]));
        }
        if let PinMode::MemCopy(src) = mode {
            check_page_len(src)?;
        }

        let frame_id = self.pick_victim()?;
        // the victim's bytes must reach the disk before the frame is reused,
        // on failure the frame keeps its page and stays dirty.
        if let Err(err) = self.write_back(frame_id) {
            warn!("failed to write back frame {} before reuse: {}", frame_id, err);
            return Err(err);
        }
        self.evict(frame_id);

        let page = Arc::clone(&self.pages[frame_id]);
        {
            let mut guard = page.write()?;
            match mode {
                PinMode::DiskRead => self.disk.read_page(page_id, guard.as_mut())?,
                PinMode::MemCopy(src) => guard.copy_from(src),
                PinMode::NoOp => {}
            }
        }
        self.frames[frame_id].install(page_id);
        self.page_table.insert(page_id, frame_id);
        debug!("pinned page {} into frame {} with {}", page_id, frame_id, mode_name(&mode));

        Ok(page)
    }

    /// Unpin the target page. Fails if the page is not in the buffer pool or
    /// its pin count is already 0.
    ///
    /// The dirty flag is OR-ed in, a clean unpin never clears an earlier
    /// dirty one. Once the pin count reaches 0 the reference bit is set,
    /// giving the frame one more sweep before it can be evicted.
    pub fn unpin(&mut self, page_id: PageId, mode: UnpinMode) -> Result<()> {
        let frame_id = match self.page_table.get(page_id) {
            Some(frame_id) if self.frames[frame_id].is_pinned() => frame_id,
            _ => return Err(Error::NotResidentOrUnpinned(page_id)),
        };
        let released = self.frames[frame_id].unpin(mode.is_dirty());
        trace!("unpin page {} ({:?}), unpinned: {}", page_id, mode, released);
        Ok(())
    }

    /// Allocate a run of `run_length` disk pages and pin the first one with
    /// the contents of `template`. Return the first page id and its frame.
    ///
    /// The pool does not track the rest of the run, the caller owns those
    /// ids.
    pub fn new_page(&mut self, template: &[u8], run_length: usize) -> Result<(PageId, Arc<Page>)> {
        check_page_len(template)?;
        if run_length == 0 {
            return Err(Error::Value("run length must be at least 1".to_string()));
        }
        // check before allocating, otherwise the run would leak.
        if self.num_unpinned() == 0 {
            return Err(Error::PoolExhausted);
        }

        let page_id = self.disk.allocate_run(run_length)?;
        if let Some(frame_id) = self.page_table.get(page_id) {
            if self.frames[frame_id].is_pinned() {
                self.release_run(page_id, run_length);
                return Err(Error::AlreadyPinned(page_id));
            }
            // a stale unpinned copy would turn the pin below into a hit
            // and skip the template, drop it.
            self.evict(frame_id);
        }

        match self.pin(page_id, PinMode::MemCopy(template)) {
            Ok(page) => {
                debug!("new page {} (run of {})", page_id, run_length);
                Ok((page_id, page))
            }
            Err(err) => {
                self.release_run(page_id, run_length);
                Err(err)
            }
        }
    }

    /// Deallocate a page on disk. Fails if the page is pinned.
    ///
    /// A resident unpinned copy is dropped from the pool without write
    /// back, its id is free now and may be handed out again.
    pub fn free_page(&mut self, page_id: PageId) -> Result<()> {
        let frame_id = self.page_table.get(page_id);
        if let Some(frame_id) = frame_id {
            if self.frames[frame_id].is_pinned() {
                return Err(Error::PagePinned(page_id));
            }
        }
        self.disk.deallocate_page(page_id)?;
        if let Some(frame_id) = frame_id {
            self.evict(frame_id);
        }
        debug!("freed page {}", page_id);
        Ok(())
    }

    /// Write the page to disk if it is dirty, regardless of its pin count.
    /// The dirty flag is cleared after a successful write.
    pub fn flush_page(&mut self, page_id: PageId) -> Result<()> {
        let frame_id = self.page_table.get(page_id).ok_or(Error::NotResident(page_id))?;
        self.write_back(frame_id)
    }

    /// Write all valid and dirty frames to disk, in frame order. Flushing
    /// only writes, nothing is unpinned or freed.
    pub fn flush_all_frames(&mut self) -> Result<()> {
        for frame_id in 0..self.pool_size {
            self.write_back(frame_id)?;
        }
        Ok(())
    }

    pub fn num_frames(&self) -> usize {
        self.pool_size
    }

    /// Number of frames with a zero pin count, invalid frames included.
    pub fn num_unpinned(&self) -> usize {
        self.frames.iter().filter(|f| !f.is_pinned()).count()
    }

    pub fn contains(&self, page_id: PageId) -> bool {
        self.page_table.contains(page_id)
    }

    /// Pin count of a resident page, None if the page is not resident.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        self.page_table.get(page_id).map(|f| self.frames[f].pin_count)
    }

    /// Dirty flag of a resident page, None if the page is not resident.
    pub fn is_dirty(&self, page_id: PageId) -> Option<bool> {
        self.page_table.get(page_id).map(|f| self.frames[f].dirty)
    }

    pub fn disk_stats(&self) -> IoStats {
        self.disk.stats()
    }

    fn pick_victim(&mut self) -> Result<FrameId> {
        let mut view = FrameView::new(&mut self.frames);
        let frame_id = self.replacer.pick_victim(&mut view).ok_or(Error::PoolExhausted)?;
        debug_assert!(!self.frames[frame_id].is_pinned(), "victim frame {} is pinned", frame_id);
        Ok(frame_id)
    }

    /// Flush the frame if it holds a dirty page.
    fn write_back(&mut self, frame_id: FrameId) -> Result<()> {
        let desc = &self.frames[frame_id];
        if !(desc.valid && desc.dirty) {
            return Ok(());
        }
        let page_id = desc.page_id;
        let guard = self.pages[frame_id].read()?;
        self.disk.write_page(page_id, guard.as_ref())?;
        drop(guard);
        self.frames[frame_id].dirty = false;
        debug!("wrote back page {} from frame {}", page_id, frame_id);
        Ok(())
    }

    /// Unlink the frame's page from the page table and reset its metadata.
    fn evict(&mut self, frame_id: FrameId) {
        let desc = &mut self.frames[frame_id];
        if desc.valid {
            self.page_table.remove(desc.page_id);
            trace!("evicted page {} from frame {}", desc.page_id, frame_id);
        }
        desc.evict();
    }

    /// Hand a freshly allocated run back to the disk manager. This is a
    /// best effort cleanup on an already failing path.
    fn release_run(&mut self, first: PageId, run_length: usize) {
        for page_id in (first..).take(run_length) {
            if let Err(err) = self.disk.deallocate_page(page_id) {
                warn!("failed to release page {}: {}", page_id, err);
            }
        }
    }
}

fn check_page_len(src: &[u8]) -> Result<()> {
    if src.len() != PAGE_SIZE {
        return Err(Error::Value(format!(
            "page contents must be {} bytes, got {}",
            PAGE_SIZE,
            src.len()
        )));
    }
    Ok(())
}

fn mode_name(mode: &PinMode<'_>) -> &'static str {
    match mode {
        PinMode::DiskRead => "disk read",
        PinMode::MemCopy(_) => "mem copy",
        PinMode::NoOp => "no-op",
    }
}

/// Buffer pool manager wrap buffer pool with a mutex for concurrent access,
/// basically all the heavy lifting are happens in the buffer pool. Every
/// operation runs as one critical section, so the page table and the frame
/// descriptors are always updated together.
#[derive(Clone)]
pub struct BufferPoolManager {
    inner: Arc<Mutex<BufferPool>>,
}

impl BufferPoolManager {
    pub fn new(disk: Box<dyn DiskManager>, pool_size: usize) -> Result<Self> {
        let inner = BufferPool::new(disk, pool_size)?;
        Ok(BufferPoolManager { inner: Arc::new(Mutex::new(inner)) })
    }

    /// Build the disk manager and the pool described by the config.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let disk = new_disk_manager(cfg.disk_type, &cfg.data_dir)?;
        Self::new(disk, cfg.pool_size)
    }

    /// Pin the page with the given page id, see [`BufferPool::pin`].
    pub fn pin(&self, page_id: PageId, mode: PinMode<'_>) -> Result<Arc<Page>> {
        let mut inner = self.inner.lock()?;
        inner.pin(page_id, mode)
    }

    pub fn unpin(&self, page_id: PageId, mode: UnpinMode) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.unpin(page_id, mode)
    }

    /// Allocate a run of pages and pin the first one, see [`BufferPool::new_page`].
    pub fn new_page(&self, template: &[u8], run_length: usize) -> Result<(PageId, Arc<Page>)> {
        let mut inner = self.inner.lock()?;
        inner.new_page(template, run_length)
    }

    pub fn free_page(&self, page_id: PageId) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.free_page(page_id)
    }

    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.flush_page(page_id)
    }

    pub fn flush_all_frames(&self) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.flush_all_frames()
    }

    pub fn num_frames(&self) -> Result<usize> {
        Ok(self.inner.lock()?.num_frames())
    }

    pub fn num_unpinned(&self) -> Result<usize> {
        Ok(self.inner.lock()?.num_unpinned())
    }

    pub fn contains(&self, page_id: PageId) -> Result<bool> {
        Ok(self.inner.lock()?.contains(page_id))
    }

    pub fn pin_count(&self, page_id: PageId) -> Result<Option<u32>> {
        Ok(self.inner.lock()?.pin_count(page_id))
    }

    pub fn disk_stats(&self) -> Result<IoStats> {
        Ok(self.inner.lock()?.disk_stats())
    }
}
