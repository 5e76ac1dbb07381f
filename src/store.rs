//! # Archive Store
//!
//! After every committed generation the optimizer hands a snapshot of its
//! archive to an `ArchiveStore`. The call is fire-and-forget: a store error is
//! logged and the run continues. Retries, batching and the storage medium are the
//! store's business.
//!
//! ```rust
//! use ndarray::Array2;
//! use paretoga::store::{ArchiveStore, GenerationSnapshot, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let mut handle = store.clone();
//! let snapshot = GenerationSnapshot {
//!     iteration: 1,
//!     x: Array2::zeros((2, 3)),
//!     y: Array2::zeros((2, 1)),
//!     p: Array2::zeros((2, 0)),
//! };
//! handle.store(&snapshot).unwrap();
//! assert_eq!(store.len(), 1);
//! assert_eq!(store.latest().unwrap().iteration, 1);
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use ndarray::Array2;

use crate::error::BoxError;

/// Owned copy of the archive after a generation, in physical units.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationSnapshot {
    pub iteration: usize,
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    pub p: Array2<f64>,
}

/// The persistence collaborator.
pub trait ArchiveStore {
    fn store(&mut self, snapshot: &GenerationSnapshot) -> Result<(), BoxError>;
}

impl<S: ArchiveStore + ?Sized> ArchiveStore for Box<S> {
    fn store(&mut self, snapshot: &GenerationSnapshot) -> Result<(), BoxError> {
        (**self).store(snapshot)
    }
}

/// Discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl ArchiveStore for NoopStore {
    fn store(&mut self, _snapshot: &GenerationSnapshot) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Keeps every snapshot in memory.
///
/// Clones share the same history, so a handle can be given to the optimizer
/// while another one is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshots: Arc<Mutex<Vec<GenerationSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All snapshots recorded so far, oldest first.
    pub fn snapshots(&self) -> Vec<GenerationSnapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn latest(&self) -> Option<GenerationSnapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ArchiveStore for MemoryStore {
    fn store(&mut self, snapshot: &GenerationSnapshot) -> Result<(), BoxError> {
        self.snapshots
            .lock()
            .map_err(|_| "snapshot history lock poisoned")?
            .push(snapshot.clone());
        Ok(())
    }
}

/// Forwards snapshots to a closure.
pub struct FnStore<F> {
    f: F,
}

impl<F> FnStore<F>
where
    F: FnMut(&GenerationSnapshot) -> Result<(), BoxError>,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ArchiveStore for FnStore<F>
where
    F: FnMut(&GenerationSnapshot) -> Result<(), BoxError>,
{
    fn store(&mut self, snapshot: &GenerationSnapshot) -> Result<(), BoxError> {
        (self.f)(snapshot)
    }
}

impl<F> std::fmt::Debug for FnStore<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStore").finish_non_exhaustive()
    }
}
