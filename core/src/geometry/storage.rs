//! Shared host memory behind geometry arrays and change listeners.

use parking_lot::{RwLock, RwLockReadGuard};

use super::data::ArrayHandle;

/// Host bytes of one root array (or of the index array).
///
/// Child arrays interleaved in a root share the root's storage. GPU buffers
/// reference the same storage so client-array rendering and partial uploads
/// read the live data.
#[derive(Debug, Default)]
pub struct ArrayStorage {
    bytes: RwLock<Vec<u8>>,
}

impl ArrayStorage {
    /// Wrap host bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: RwLock::new(bytes),
        }
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.read().len()
    }

    /// Whether the storage holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.read().is_empty()
    }

    /// Lock the bytes for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.bytes.read()
    }

    /// Copy `data` in at `offset`. Returns `false` if it would not fit.
    pub fn write_at(&self, offset: usize, data: &[u8]) -> bool {
        let mut bytes = self.bytes.write();
        let Some(end) = offset.checked_add(data.len()) else {
            return false;
        };
        if end > bytes.len() {
            return false;
        }
        bytes[offset..end].copy_from_slice(data);
        true
    }
}

/// Receives element ranges of a geometry array that were modified.
pub trait ArrayListener: Send + Sync {
    /// Called with the first modified element and the number of modified elements.
    fn array_modified(&self, first: usize, count: usize);
}

/// Registration returned by [`Geometry::add_listener`](super::Geometry::add_listener).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// What a listener observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenTarget {
    /// A root vertex array. Ranges are in vertices.
    Array(ArrayHandle),
    /// The index array. Ranges are in indices.
    Indices,
}
