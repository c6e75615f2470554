use std::collections::HashMap;

use crate::storage::page::{FrameId, PageId};

/// Page table for keeping track of which frame holds which disk page.
///
/// The buffer pool keeps it consistent with the frame descriptors: an
/// entry `p -> i` exists iff frame `i` is valid and holds page `p`, so
/// the mapping is injective.
#[derive(Debug, Default)]
pub struct PageTable {
    map: HashMap<PageId, FrameId>,
}

impl PageTable {
    pub fn with_capacity(capacity: usize) -> Self {
        PageTable { map: HashMap::with_capacity(capacity) }
    }

    pub fn get(&self, page_id: PageId) -> Option<FrameId> {
        self.map.get(&page_id).copied()
    }

    pub fn contains(&self, page_id: PageId) -> bool {
        self.map.contains_key(&page_id)
    }

    pub fn insert(&mut self, page_id: PageId, frame_id: FrameId) {
        let prev = self.map.insert(page_id, frame_id);
        debug_assert!(prev.is_none(), "page {} mapped twice", page_id);
    }

    pub fn remove(&mut self, page_id: PageId) -> Option<FrameId> {
        self.map.remove(&page_id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PageId, FrameId)> + '_ {
        self.map.iter().map(|(&p, &f)| (p, f))
    }
}
