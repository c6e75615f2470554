use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::memory::{check_len, next_page_id};
use super::{DiskManager, IoStats};
use crate::error::{Error, Result};
use crate::storage::codec::bincodec;
use crate::storage::page::{PageId, PAGE_SIZE};

const DATA_FILE: &str = "pages.db";
const SPACE_MAP_FILE: &str = "space.map";

/// Allocation state of the data file, persisted next to it.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct SpaceMap {
    next_page_id: PageId,
    free: BTreeSet<PageId>,
}

impl SpaceMap {
    fn is_allocated(&self, page_id: PageId) -> bool {
        page_id >= 0 && page_id < self.next_page_id && !self.free.contains(&page_id)
    }
}

/// A disk manager backed by a single data file, page `p` lives at
/// offset `p * PAGE_SIZE`. File I/O operations are synchronous.
#[derive(Debug)]
pub struct File {
    file: std::fs::File,
    space_map_path: PathBuf,
    space_map: SpaceMap,
    stats: IoStats,
}

impl File {
    /// Open the data file under `dir`, creating the directory and an
    /// empty file if needed. An existing space map is loaded so the
    /// allocation state survives a restart.
    pub fn open(dir: &Path) -> Result<File> {
        std::fs::create_dir_all(dir)?;
        let file =
            OpenOptions::new().read(true).write(true).create(true).open(dir.join(DATA_FILE))?;
        let space_map_path = dir.join(SPACE_MAP_FILE);
        let space_map = if space_map_path.exists() {
            let bytes = std::fs::read(&space_map_path)?;
            bincodec::deserialize(&bytes)?
        } else {
            SpaceMap::default()
        };
        info!(
            "opened data file in {}, {} page id(s) handed out, {} free",
            dir.display(),
            space_map.next_page_id,
            space_map.free.len()
        );
        Ok(File { file, space_map_path, space_map, stats: IoStats::default() })
    }

    fn persist_space_map(&self) -> Result<()> {
        let bytes = bincodec::serialize(&self.space_map)?;
        std::fs::write(&self.space_map_path, bytes)?;
        Ok(())
    }

    fn check_allocated(&self, page_id: PageId) -> Result<()> {
        if !self.space_map.is_allocated(page_id) {
            return Err(Error::Value(format!("page {} is not allocated", page_id)));
        }
        Ok(())
    }

    fn offset(page_id: PageId) -> Result<u64> {
        let page_id = u64::try_from(page_id)?;
        page_id
            .checked_mul(PAGE_SIZE as u64)
            .ok_or_else(|| Error::Internal(format!("offset of page {} overflows", page_id)))
    }
}

impl DiskManager for File {
    fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        self.check_allocated(page_id)?;
        check_len(buf.len())?;
        let offset = Self::offset(page_id)?;
        // an allocated page that was never written lies beyond the end
        // of the file, it reads as zeroes.
        if offset >= self.file.metadata()?.len() {
            buf.fill(0);
        } else {
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.read_exact(buf)?;
        }
        self.stats.reads += 1;
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, data: &[u8]) -> Result<()> {
        self.check_allocated(page_id)?;
        check_len(data.len())?;
        self.file.seek(SeekFrom::Start(Self::offset(page_id)?))?;
        self.file.write_all(data)?;
        self.file.sync_data()?;
        self.stats.writes += 1;
        Ok(())
    }

    fn allocate_run(&mut self, count: usize) -> Result<PageId> {
        if count == 0 {
            return Err(Error::Value("cannot allocate an empty run".to_string()));
        }
        let count = PageId::try_from(count)?;
        let first = match self.space_map.free.first().copied() {
            Some(id) if count == 1 => {
                self.space_map.free.remove(&id);
                id
            }
            _ => {
                let first = self.space_map.next_page_id;
                self.space_map.next_page_id = next_page_id(first, count)?;
                first
            }
        };
        self.persist_space_map()?;
        self.stats.allocations += 1;
        debug!("allocated {} page(s) starting at {}", count, first);
        Ok(first)
    }

    fn deallocate_page(&mut self, page_id: PageId) -> Result<()> {
        self.check_allocated(page_id)?;
        // wipe the slot so a reused id reads back as zeroes.
        let offset = Self::offset(page_id)?;
        if offset < self.file.metadata()?.len() {
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.write_all(&[0u8; PAGE_SIZE])?;
            self.file.sync_data()?;
        }
        self.space_map.free.insert(page_id);
        self.persist_space_map()?;
        self.stats.deallocations += 1;
        debug!("deallocated page {}", page_id);
        Ok(())
    }

    fn stats(&self) -> IoStats {
        self.stats
    }
}
