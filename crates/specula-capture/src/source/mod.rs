//! The platform-capture boundary.
//!
//! A [`TargetSource`] stands in for the host platform's screen/window
//! capture facility: it enumerates live targets and opens capture streams.
//! Real platform backends live outside this repository; the in-tree
//! [`SyntheticSource`] produces a moving test pattern so the full
//! selection → bind → draw path runs anywhere.

mod synthetic;

use std::sync::Arc;

use specula_engine::coords::{LogicalSize, PhysicalExtent};
use specula_engine::mirror::{SharedSurface, SurfaceHandle};

use crate::error::SelectorError;
use crate::targets::{Target, TargetId};

pub use synthetic::SyntheticSource;

/// A capture facility that can enumerate targets and open streams of them.
pub trait TargetSource {
    /// Re-enumerates live targets. Finite, restartable: every call reflects
    /// the current state, not a cached snapshot.
    fn targets(&self) -> Vec<Target>;

    /// Opens a capture stream of `id`.
    ///
    /// Fails with [`SelectorError::TargetUnavailable`] when the target
    /// vanished since it was listed.
    fn open(&self, id: &TargetId) -> Result<Capture, SelectorError>;
}

/// An opened capture stream.
///
/// Owns the shared surface the producer refreshes out-of-band, and stops
/// the producer when dropped — scoped acquisition/release so no capture
/// keeps running past its selection, on any exit path.
pub struct Capture {
    surface: Arc<SharedSurface>,
    logical: LogicalSize,
    stopper: Option<Box<dyn FnOnce() + Send>>,
}

impl Capture {
    /// Wraps a live surface. `stopper` runs once on drop and should stop the
    /// producing side.
    pub fn new(
        surface: Arc<SharedSurface>,
        logical: LogicalSize,
        stopper: Option<Box<dyn FnOnce() + Send>>,
    ) -> Self {
        Self {
            surface,
            logical,
            stopper,
        }
    }

    /// Renderer-facing handle to the captured surface.
    pub fn handle(&self) -> SurfaceHandle {
        self.surface.handle()
    }

    pub fn physical(&self) -> PhysicalExtent {
        self.surface.extent()
    }

    pub fn logical(&self) -> LogicalSize {
        self.logical
    }
}

impl std::fmt::Debug for Capture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capture")
            .field("logical", &self.logical)
            .field("stopper", &self.stopper.as_ref().map(|_| "..."))
            .finish_non_exhaustive()
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        if let Some(stop) = self.stopper.take() {
            stop();
        }
    }
}
