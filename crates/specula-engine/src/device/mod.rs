//! GPU device + window-surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the window Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering
//!
//! Capture surfaces are a different thing entirely and live in
//! [`crate::mirror`]; this module only knows about the drawable the window
//! system hands us.

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;
