use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, TryIter, unbounded};

use crate::coords::{LogicalSize, PhysicalExtent};

use super::surface::SurfaceHandle;

/// A renderer operation marshaled onto the render thread.
///
/// Selection runs on a control thread; every GPU operation must run on the
/// thread owning the rendering context. Commands cross that boundary as
/// one-shot messages, never as direct cross-object calls.
#[derive(Debug)]
pub enum MirrorCommand {
    /// Bind a capture surface and apply its logical size in one step.
    Bind {
        handle: SurfaceHandle,
        physical: PhysicalExtent,
        logical: LogicalSize,
    },
    SetLogicalSize(LogicalSize),
    Release,
}

/// Creates the control-thread → render-thread command channel.
pub fn command_channel() -> (CommandSender, CommandQueue) {
    let (tx, rx) = unbounded();
    (CommandSender { tx }, CommandQueue { rx })
}

/// Producer half. Cheap to clone; safe to use from any thread.
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<MirrorCommand>,
}

impl CommandSender {
    pub fn send(&self, cmd: MirrorCommand) {
        if self.tx.send(cmd).is_err() {
            log::debug!("mirror command dropped: render thread is gone");
        }
    }
}

/// Consumer half, owned by the render thread. Drained at the top of a frame.
pub struct CommandQueue {
    rx: Receiver<MirrorCommand>,
}

impl CommandQueue {
    /// Non-blocking iterator over all commands queued so far, in send order.
    pub fn drain(&self) -> TryIter<'_, MirrorCommand> {
        self.rx.try_iter()
    }
}

/// Coalescing redraw flag.
///
/// Invalidation signals (new surface content) and timer ticks both funnel
/// through this gate; repeated requests before the next frame collapse into
/// one. Drawing is idempotent, so dropping redundant requests is safe.
#[derive(Clone, Default)]
pub struct RedrawGate {
    pending: Arc<AtomicBool>,
}

impl RedrawGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a redraw. Returns `true` when this was the first request
    /// since the last [`take`](Self::take).
    pub fn request(&self) -> bool {
        !self.pending.swap(true, Ordering::AcqRel)
    }

    /// Consumes the pending request, if any.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}
