use thiserror::Error;

use crate::coords::PhysicalExtent;

use super::surface::SurfaceFormat;

/// A capture surface could not be bound to a GPU texture.
///
/// Recoverable: the renderer keeps its prior texture (if any) and the caller
/// may retry on the next selection.
#[derive(Debug, Error)]
pub enum SurfaceBindError {
    #[error("capture surface was released by its owner")]
    SurfaceGone,

    #[error("pixel format {0:?} cannot be imported by this renderer")]
    UnsupportedFormat(SurfaceFormat),

    #[error("surface extent is zero-sized")]
    ZeroSized,

    #[error("declared extent {declared:?} does not match surface storage {actual:?}")]
    StorageMismatch {
        declared: PhysicalExtent,
        actual: PhysicalExtent,
    },
}

/// A logical size update was rejected.
///
/// Non-fatal: the previous valid size stays in effect. Callers log and move on.
#[derive(Debug, Error)]
#[error("logical size {width}x{height} is not positive finite")]
pub struct InvalidSizeError {
    pub width: f32,
    pub height: f32,
}

/// A producer handed a frame whose byte length does not match the surface.
#[derive(Debug, Error)]
#[error("frame byte length {got} does not match surface storage {expected}")]
pub struct SurfaceWriteError {
    pub expected: usize,
    pub got: usize,
}
