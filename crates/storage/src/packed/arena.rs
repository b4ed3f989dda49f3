//! Paged byte arena addressed by chunk slot

use crate::converters::zeroed;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Fixed-size chunks laid out in pages of atomic bytes.
///
/// A chunk never straddles a page, so slot `n` lives in page
/// `n / chunks_per_page`. Growing the arena shares the existing pages with
/// the previous snapshot, so readers holding an old snapshot still observe
/// writes to chunks that exist in both.
#[derive(Debug, Clone)]
pub(crate) struct ChunkArena {
    chunk_size: usize,
    chunks_per_page: usize,
    pages: Vec<Arc<[AtomicU8]>>,
}

impl ChunkArena {
    pub fn new(page_size: usize, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunks_per_page: (page_size / chunk_size).max(1),
            pages: Vec::new(),
        }
    }

    /// Number of slots backed by allocated pages
    pub fn capacity(&self) -> usize {
        self.pages.len() * self.chunks_per_page
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Bytes of chunk `slot`, or `None` past the arena
    #[inline]
    pub fn chunk(&self, slot: usize) -> Option<&[AtomicU8]> {
        let page = self.pages.get(slot / self.chunks_per_page)?;
        let start = (slot % self.chunks_per_page) * self.chunk_size;
        page.get(start..start + self.chunk_size)
    }

    /// Snapshot sharing every current page, grown to hold `slots` chunks
    pub fn grown_to(&self, slots: usize) -> Self {
        let mut grown = self.clone();
        while grown.capacity() < slots {
            grown
                .pages
                .push(Arc::from(zeroed(grown.chunks_per_page * grown.chunk_size)));
        }
        grown
    }

    /// Zero chunk `slot`
    pub fn clear_chunk(&self, slot: usize) {
        if let Some(chunk) = self.chunk(slot) {
            for byte in chunk {
                byte.store(0, Ordering::Relaxed);
            }
        }
    }
}
