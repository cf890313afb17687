//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the GPU layer.
//! Redraws are driven by the shared [`crate::mirror::RedrawGate`]
//! (invalidation) and an optional periodic tick; both collapse into at most
//! one redraw request per window per cycle.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
