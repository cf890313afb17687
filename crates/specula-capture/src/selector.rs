use specula_engine::coords::{LogicalSize, PhysicalExtent};
use specula_engine::mirror::{CommandSender, MirrorCommand, SurfaceHandle};

use crate::error::SelectorError;
use crate::source::{Capture, TargetSource};
use crate::targets::{Target, TargetId};

/// Pairs target enumeration with selection.
///
/// The selector forwards surface handles toward the renderer and never
/// receives calls back from it. It performs no GPU work itself, so it is
/// free to live on a control thread.
pub struct Selector<S: TargetSource> {
    source: S,
}

impl<S: TargetSource> Selector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Lists the currently available capture targets.
    ///
    /// Re-enumerates live state on every call; a target listed here can
    /// still vanish before [`select_target`](Self::select_target).
    pub fn list_targets(&self) -> Vec<Target> {
        self.source.targets()
    }

    /// Opens `id` and returns a selection ready to dispatch to the renderer.
    pub fn select_target(&self, id: &TargetId) -> Result<Selection, SelectorError> {
        let capture = self.source.open(id)?;
        Ok(Selection { capture })
    }
}

/// A successful selection.
///
/// Owns the live capture (the producer keeps refreshing the surface for as
/// long as this is held) and exposes exactly what the renderer's bind
/// operation needs.
#[derive(Debug)]
pub struct Selection {
    capture: Capture,
}

impl Selection {
    pub fn handle(&self) -> SurfaceHandle {
        self.capture.handle()
    }

    pub fn physical(&self) -> PhysicalExtent {
        self.capture.physical()
    }

    pub fn logical(&self) -> LogicalSize {
        self.capture.logical()
    }

    /// Queues the bind for this selection onto the render thread.
    ///
    /// Binding and logical size travel as one command so the renderer never
    /// observes a half-applied selection.
    pub fn dispatch(&self, commands: &CommandSender) {
        commands.send(MirrorCommand::Bind {
            handle: self.handle(),
            physical: self.physical(),
            logical: self.logical(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use specula_engine::mirror::{SharedSurface, SurfaceFormat, command_channel};

    use crate::targets::TargetKind;

    use super::*;

    // Source mock whose target list can shrink between calls, mimicking a
    // display being disconnected after enumeration.
    struct FlakySource {
        targets: Arc<Mutex<Vec<Target>>>,
    }

    impl FlakySource {
        fn with_one_display() -> (Self, Arc<Mutex<Vec<Target>>>) {
            let targets = Arc::new(Mutex::new(vec![Target {
                id: TargetId::new(7),
                kind: TargetKind::Display,
                name: "Mock Display".to_string(),
                physical: PhysicalExtent::new(800, 600),
                logical: LogicalSize::new(800.0, 600.0),
            }]));
            (
                Self {
                    targets: targets.clone(),
                },
                targets,
            )
        }
    }

    impl TargetSource for FlakySource {
        fn targets(&self) -> Vec<Target> {
            self.targets.lock().unwrap().clone()
        }

        fn open(&self, id: &TargetId) -> Result<Capture, SelectorError> {
            let targets = self.targets.lock().unwrap();
            let target = targets
                .iter()
                .find(|t| &t.id == id)
                .ok_or_else(|| SelectorError::TargetUnavailable { id: id.clone() })?;

            let surface = SharedSurface::new(target.physical, SurfaceFormat::Bgra8);
            Ok(Capture::new(surface, target.logical, None))
        }
    }

    #[test]
    fn listing_reflects_live_state_on_every_call() {
        let (source, targets) = FlakySource::with_one_display();
        let selector = Selector::new(source);

        assert_eq!(selector.list_targets().len(), 1);
        targets.lock().unwrap().clear();
        assert_eq!(selector.list_targets().len(), 0);
    }

    #[test]
    fn selection_matches_the_descriptor() {
        let (source, _) = FlakySource::with_one_display();
        let selector = Selector::new(source);

        let target = selector.list_targets().remove(0);
        let selection = selector.select_target(&target.id).unwrap();

        assert_eq!(selection.physical(), target.physical);
        assert_eq!(selection.logical(), target.logical);
        assert!(selection.handle().upgrade().is_some());
    }

    #[test]
    fn vanished_target_is_unavailable() {
        let (source, targets) = FlakySource::with_one_display();
        let selector = Selector::new(source);

        let target = selector.list_targets().remove(0);
        targets.lock().unwrap().clear();

        let err = selector.select_target(&target.id).unwrap_err();
        assert!(matches!(
            err,
            SelectorError::TargetUnavailable { ref id } if id == &target.id
        ));
    }

    #[test]
    fn dispatch_queues_one_bind_command() {
        let (source, _) = FlakySource::with_one_display();
        let selector = Selector::new(source);
        let (tx, queue) = command_channel();

        let target = selector.list_targets().remove(0);
        let selection = selector.select_target(&target.id).unwrap();
        selection.dispatch(&tx);

        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained.len(), 1);
        match &drained[0] {
            MirrorCommand::Bind {
                handle,
                physical,
                logical,
            } => {
                assert_eq!(*physical, target.physical);
                assert_eq!(*logical, target.logical);
                assert!(handle.upgrade().is_some());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
