use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::coords::PhysicalExtent;

use super::error::SurfaceWriteError;

/// Pixel layout of a capture surface. All variants are 4 bytes per pixel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceFormat {
    Bgra8,
    Rgba8,
}

impl SurfaceFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        4
    }
}

/// A shared capture surface: the pixel buffer a capture subsystem refreshes
/// out-of-band and the renderer samples from.
///
/// The capture subsystem owns the surface via `Arc`; the renderer only ever
/// holds a [`SurfaceHandle`] back-reference. Dimensions and format are fixed
/// for the lifetime of the surface — a producer-side resize means a new
/// surface and an explicit re-bind.
pub struct SharedSurface {
    format: SurfaceFormat,
    extent: PhysicalExtent,
    pixels: RwLock<Vec<u8>>,
    generation: AtomicU64,
}

impl SharedSurface {
    /// Creates a zero-filled surface. Generation starts at 0; the first
    /// [`write_frame`](Self::write_frame) moves it to 1.
    pub fn new(extent: PhysicalExtent, format: SurfaceFormat) -> Arc<Self> {
        Arc::new(Self {
            format,
            extent,
            pixels: RwLock::new(vec![0; extent.byte_len(format.bytes_per_pixel())]),
            generation: AtomicU64::new(0),
        })
    }

    #[inline]
    pub fn format(&self) -> SurfaceFormat {
        self.format
    }

    #[inline]
    pub fn extent(&self) -> PhysicalExtent {
        self.extent
    }

    /// Content generation. Incremented after every completed frame write, so
    /// consumers can skip redundant uploads.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replaces the surface contents with one tightly packed frame.
    ///
    /// Producer-side API. The frame must match the surface storage exactly;
    /// partial updates are not supported.
    pub fn write_frame(&self, frame: &[u8]) -> Result<(), SurfaceWriteError> {
        let expected = self.extent.byte_len(self.format.bytes_per_pixel());
        if frame.len() != expected {
            return Err(SurfaceWriteError {
                expected,
                got: frame.len(),
            });
        }

        self.pixels.write().copy_from_slice(frame);
        // Bumped only after the pixels are fully replaced.
        self.generation.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Runs `f` with the current pixel contents under the read lock.
    pub fn with_pixels<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.pixels.read())
    }

    /// Creates a renderer-facing handle to this surface.
    pub fn handle(self: &Arc<Self>) -> SurfaceHandle {
        SurfaceHandle {
            surface: Arc::downgrade(self),
            extent: self.extent,
            format: self.format,
        }
    }
}

/// Opaque reference to a [`SharedSurface`], passed from the selector into the
/// renderer. Holds only a weak back-reference: once the capture subsystem
/// drops the surface, binding fails instead of reading freed pixels.
#[derive(Clone)]
pub struct SurfaceHandle {
    surface: Weak<SharedSurface>,
    extent: PhysicalExtent,
    format: SurfaceFormat,
}

impl SurfaceHandle {
    pub fn upgrade(&self) -> Option<Arc<SharedSurface>> {
        self.surface.upgrade()
    }

    /// Extent recorded when the handle was created.
    #[inline]
    pub fn extent(&self) -> PhysicalExtent {
        self.extent
    }

    #[inline]
    pub fn format(&self) -> SurfaceFormat {
        self.format
    }
}

impl std::fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceHandle")
            .field("extent", &self.extent)
            .field("format", &self.format)
            .field("alive", &(self.surface.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_2x2() -> Arc<SharedSurface> {
        SharedSurface::new(PhysicalExtent::new(2, 2), SurfaceFormat::Bgra8)
    }

    #[test]
    fn write_frame_bumps_generation() {
        let s = surface_2x2();
        assert_eq!(s.generation(), 0);
        s.write_frame(&[7u8; 16]).unwrap();
        assert_eq!(s.generation(), 1);
        s.write_frame(&[9u8; 16]).unwrap();
        assert_eq!(s.generation(), 2);
    }

    #[test]
    fn write_frame_rejects_wrong_length() {
        let s = surface_2x2();
        let err = s.write_frame(&[0u8; 15]).unwrap_err();
        assert_eq!(err.expected, 16);
        assert_eq!(err.got, 15);
        // A rejected write must not advance the generation.
        assert_eq!(s.generation(), 0);
    }

    #[test]
    fn with_pixels_sees_latest_frame() {
        let s = surface_2x2();
        s.write_frame(&[42u8; 16]).unwrap();
        s.with_pixels(|px| assert!(px.iter().all(|&b| b == 42)));
    }

    #[test]
    fn handle_outlives_surface_as_dead_ref() {
        let s = surface_2x2();
        let handle = s.handle();
        assert!(handle.upgrade().is_some());
        drop(s);
        assert!(handle.upgrade().is_none());
        // Cached metadata survives for diagnostics.
        assert_eq!(handle.extent(), PhysicalExtent::new(2, 2));
    }
}
