//! Packed storage: bit- and byte-packed values in a shared arena
//!
//! A [`PackedDataManager`] owns one paged byte arena and the item → chunk
//! map. Every layer attached through a [`PackedStorage`] registers its keys
//! as handles; each handle owns a fixed placement (byte offset plus bit
//! index) inside every chunk, encoded by the key's converter.
//!
//! Reads never block writers: they run against `ArcSwap` snapshots and are
//! validated with a [`StampedLock`] stamp, retrying under the read lock if a
//! writer intervened.

mod arena;
mod layout;
mod lock;
mod manager;
mod storage;

pub use layout::{Handle, HandleEntry, HandleSpec};
pub use lock::{StampedLock, StampedWriteGuard};
pub use manager::PackedDataManager;
pub use storage::{converter_for, PackedStorage};
