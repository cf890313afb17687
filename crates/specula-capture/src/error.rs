use thiserror::Error;

use crate::targets::TargetId;

/// Selection-side failures, surfaced to the UI layer for user-visible
/// messaging. Never fatal to the renderer: a failed selection simply means
/// no bind command is dispatched.
#[derive(Debug, Error)]
pub enum SelectorError {
    /// The target disappeared between listing and selection (e.g. a display
    /// was disconnected).
    #[error("capture target {id} is no longer available")]
    TargetUnavailable { id: TargetId },
}
