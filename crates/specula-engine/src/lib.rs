//! Specula engine crate.
//!
//! Owns the platform + GPU runtime pieces used to mirror a capture surface
//! into a window: device/surface management, the mirror renderer and its
//! binding state machine, and the windowed render loop.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod mirror;
pub mod render;
