//! Capture-surface mirroring core.
//!
//! This module is GPU-agnostic: it defines the shared capture surface, the
//! handle passed across the selector→renderer boundary, the texture binding
//! state machine, and the command queue used to marshal selection results
//! onto the render thread. The wgpu side lives in [`crate::render`].

mod error;
mod queue;
mod state;
mod surface;

pub use error::{InvalidSizeError, SurfaceBindError, SurfaceWriteError};
pub use queue::{CommandQueue, CommandSender, MirrorCommand, RedrawGate, command_channel};
pub use state::{BindState, MirrorState, TextureImporter};
pub use surface::{SharedSurface, SurfaceFormat, SurfaceHandle};
