//! Capture-target enumeration and selection.
//!
//! The selector side of the mirror: enumerate what can be captured, open a
//! target, and hand the resulting surface handle + sizes toward the
//! renderer. The actual platform capture facility sits behind the
//! [`TargetSource`] trait; this crate ships a synthetic in-process source
//! used by the demo binary and tests.
//!
//! Coupling is strictly one-directional: this crate sends commands into the
//! engine's render thread and never receives calls back from it.

mod error;
mod selector;
mod source;
mod targets;

pub use error::SelectorError;
pub use selector::{Selection, Selector};
pub use source::{Capture, SyntheticSource, TargetSource};
pub use targets::{Target, TargetId, TargetKind};
