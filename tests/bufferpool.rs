use std::path::PathBuf;

use log::info;
use sboxpool::config::Config;
use sboxpool::error::{Error, Result};
use sboxpool::storage::buffer::{BufferPoolManager, PinMode, UnpinMode};
use sboxpool::storage::disk::DiskType;
use sboxpool::storage::page::{PageId, PAGE_SIZE};

struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("sboxpool-it-{}", uuid::Uuid::new_v4()));
        TempDir { path }
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn file_config(dir: &TempDir, pool_size: usize) -> Result<Config> {
    let mut cfg = Config::new("")?;
    cfg.pool_size = pool_size;
    cfg.disk_type = DiskType::File;
    cfg.data_dir = dir.path.to_string_lossy().to_string();
    cfg.log_level = "debug".to_string();
    cfg.init_logger()?;
    Ok(cfg)
}

fn page_of(page_id: PageId) -> Vec<u8> {
    let mut data = vec![0u8; PAGE_SIZE];
    data[..8].copy_from_slice(&page_id.to_be_bytes());
    data[PAGE_SIZE - 1] = page_id as u8;
    data
}

#[test]
fn test_file_pages_survive_reopen() -> Result<()> {
    let dir = TempDir::new();
    let cfg = file_config(&dir, 4)?;
    let mut ids = vec![];
    {
        let bpm = BufferPoolManager::from_config(&cfg)?;
        // more pages than frames, so most of them are evicted on the way.
        for i in 0..16 {
            let (page_id, _) = bpm.new_page(&vec![0u8; PAGE_SIZE], 1)?;
            assert_eq!(i, page_id);
            let page = bpm.pin(page_id, PinMode::NoOp)?;
            page.write()?.copy_from(&page_of(page_id));
            bpm.unpin(page_id, UnpinMode::Dirty)?;
            bpm.unpin(page_id, UnpinMode::Clean)?;
            ids.push(page_id);
        }
        bpm.flush_all_frames()?;
        let stats = bpm.disk_stats()?;
        info!("io stats after load: {:?}", stats);
        assert_eq!(16, stats.writes);
        assert_eq!(0, stats.reads);
    }

    let bpm = BufferPoolManager::from_config(&cfg)?;
    for &page_id in ids.iter().rev() {
        let page = bpm.pin(page_id, PinMode::DiskRead)?;
        assert_eq!(page_of(page_id).as_slice(), &page.read()?[..]);
        bpm.unpin(page_id, UnpinMode::Clean)?;
    }
    assert_eq!(16, bpm.disk_stats()?.reads);
    assert_eq!(0, bpm.disk_stats()?.writes);

    // allocation continues after the last id handed out before.
    let (next, _) = bpm.new_page(&vec![0u8; PAGE_SIZE], 2)?;
    assert_eq!(16, next);
    Ok(())
}

#[test]
fn test_run_allocation_and_free() -> Result<()> {
    let dir = TempDir::new();
    let cfg = file_config(&dir, 2)?;
    let bpm = BufferPoolManager::from_config(&cfg)?;

    // the rest of the run is the caller's: pin it from memory, no read.
    let (first, _) = bpm.new_page(&page_of(0), 3)?;
    let second = first + 1;
    bpm.pin(second, PinMode::MemCopy(&page_of(second)))?;
    assert_eq!(0, bpm.num_unpinned()?);
    assert_eq!(Err(Error::PoolExhausted), bpm.new_page(&page_of(9), 1).map(|(id, _)| id));
    assert_eq!(1, bpm.disk_stats()?.allocations);

    assert_eq!(Err(Error::PagePinned(second)), bpm.free_page(second));
    bpm.unpin(second, UnpinMode::Dirty)?;
    bpm.free_page(second)?;
    assert!(!bpm.contains(second)?);
    assert_eq!(1, bpm.disk_stats()?.deallocations);
    // a freed page cannot be read back.
    assert!(bpm.pin(second, PinMode::DiskRead).is_err());

    // flush of a page that is not in the pool.
    assert_eq!(Err(Error::NotResident(first + 2)), bpm.flush_page(first + 2));
    assert_eq!(Err(Error::NotResidentOrUnpinned(first + 2)), bpm.unpin(first + 2, UnpinMode::Clean));
    Ok(())
}

#[test]
fn test_memory_config_pool() -> Result<()> {
    let mut cfg = Config::new("")?;
    cfg.pool_size = 3;
    let bpm = BufferPoolManager::from_config(&cfg)?;
    assert_eq!(3, bpm.num_frames()?);
    assert_eq!(3, bpm.num_unpinned()?);

    let (page_id, page) = bpm.new_page(&page_of(1), 1)?;
    assert_eq!(Some(1), bpm.pin_count(page_id)?);
    assert_eq!(page_of(1).as_slice(), &page.read()?[..]);
    bpm.flush_page(page_id)?;
    // pages from new_page start clean, nothing to write.
    assert_eq!(0, bpm.disk_stats()?.writes);
    Ok(())
}
