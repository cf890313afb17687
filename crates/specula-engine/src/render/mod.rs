//! GPU rendering subsystem.
//!
//! The mirror renderer consumes the binding state machine from
//! [`crate::mirror`] and issues GPU commands via wgpu. It owns its own GPU
//! resources (pipeline, buffers, sampler).
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - The vertex shader converts to NDC using a viewport uniform.

mod ctx;
mod mirror;

pub use ctx::{RenderCtx, RenderTarget};
pub use mirror::{GpuTexture, MirrorRenderer, WgpuImporter};
