use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use specula_engine::coords::{LogicalSize, PhysicalExtent};
use specula_engine::mirror::{RedrawGate, SharedSurface, SurfaceFormat};

use crate::error::SelectorError;
use crate::targets::{Target, TargetId, TargetKind};

use super::{Capture, TargetSource};

const FRAME_RATE: u32 = 30;

#[derive(Debug, Clone)]
struct SyntheticDisplay {
    id: u64,
    name: &'static str,
    physical: PhysicalExtent,
    /// DPI scale; logical size is physical divided by this.
    scale: f32,
}

impl SyntheticDisplay {
    fn logical(&self) -> LogicalSize {
        LogicalSize::new(
            self.physical.width as f32 / self.scale,
            self.physical.height as f32 / self.scale,
        )
    }
}

/// In-process capture source producing a moving test pattern.
///
/// Each opened target gets its own producer thread writing BGRA frames into
/// a [`SharedSurface`] at a fixed rate and signaling the redraw gate. The
/// thread stops when the [`Capture`] is dropped.
pub struct SyntheticSource {
    displays: Vec<SyntheticDisplay>,
    gate: RedrawGate,
}

impl SyntheticSource {
    pub fn new(gate: RedrawGate) -> Self {
        Self {
            displays: vec![
                SyntheticDisplay {
                    id: 1,
                    name: "Synthetic Display 1",
                    physical: PhysicalExtent::new(1920, 1080),
                    scale: 1.0,
                },
                SyntheticDisplay {
                    id: 2,
                    name: "Synthetic Display 2",
                    physical: PhysicalExtent::new(1280, 800),
                    scale: 2.0,
                },
            ],
            gate,
        }
    }
}

impl TargetSource for SyntheticSource {
    fn targets(&self) -> Vec<Target> {
        self.displays
            .iter()
            .map(|d| Target {
                id: TargetId::new(d.id),
                kind: TargetKind::Display,
                name: d.name.to_string(),
                physical: d.physical,
                logical: d.logical(),
            })
            .collect()
    }

    fn open(&self, id: &TargetId) -> Result<Capture, SelectorError> {
        let display = self
            .displays
            .iter()
            .find(|d| d.id == id.raw())
            .ok_or_else(|| SelectorError::TargetUnavailable { id: id.clone() })?;

        let surface = SharedSurface::new(display.physical, SurfaceFormat::Bgra8);
        let stopper = spawn_producer(surface.clone(), self.gate.clone());

        log::debug!(
            "synthetic capture opened: {} {}x{}",
            display.name,
            display.physical.width,
            display.physical.height
        );

        Ok(Capture::new(surface, display.logical(), Some(stopper)))
    }
}

/// Spawns the frame producer and returns the closure that stops and joins it.
fn spawn_producer(surface: Arc<SharedSurface>, gate: RedrawGate) -> Box<dyn FnOnce() + Send> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        let extent = surface.extent();
        let interval = Duration::from_secs(1) / FRAME_RATE;
        let mut frame = vec![0u8; extent.byte_len(4)];
        let mut index: u64 = 0;

        while !stop_flag.load(Ordering::Acquire) {
            fill_pattern(&mut frame, extent, index);
            if let Err(e) = surface.write_frame(&frame) {
                log::error!("synthetic producer write failed: {e}");
                break;
            }
            gate.request();

            index = index.wrapping_add(1);
            thread::sleep(interval);
        }
    });

    let mut handle = Some(handle);
    Box::new(move || {
        stop.store(true, Ordering::Release);
        if let Some(h) = handle.take() {
            let _ = h.join();
        }
    })
}

/// Fills `buf` with one BGRA frame of the scrolling gradient pattern.
///
/// Deterministic in `(extent, index)` so frames can be asserted in tests.
fn fill_pattern(buf: &mut [u8], extent: PhysicalExtent, index: u64) {
    let (w, h) = (extent.width as usize, extent.height as usize);
    let shift = (index * 4) as usize;

    for y in 0..h {
        let row = &mut buf[y * w * 4..(y + 1) * w * 4];
        for x in 0..w {
            let px = &mut row[x * 4..x * 4 + 4];
            px[0] = (((x + shift) * 256) / w.max(1)) as u8; // B
            px[1] = ((y * 256) / h.max(1)) as u8; // G
            px[2] = ((shift / 2) % 256) as u8; // R
            px[3] = 255; // A
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn first_target(source: &SyntheticSource) -> Target {
        source.targets().into_iter().next().unwrap()
    }

    #[test]
    fn targets_enumerate_with_scaled_logical_sizes() {
        let source = SyntheticSource::new(RedrawGate::new());
        let targets = source.targets();
        assert_eq!(targets.len(), 2);

        // Display 2 runs at 2x scale: logical is half its physical size.
        let hidpi = &targets[1];
        assert_eq!(hidpi.physical, PhysicalExtent::new(1280, 800));
        assert_eq!(hidpi.logical, LogicalSize::new(640.0, 400.0));
    }

    #[test]
    fn open_unknown_target_is_unavailable() {
        let source = SyntheticSource::new(RedrawGate::new());
        let err = source.open(&TargetId::new(999)).unwrap_err();
        assert!(matches!(err, SelectorError::TargetUnavailable { .. }));
    }

    #[test]
    fn open_produces_frames_and_signals_gate() {
        let gate = RedrawGate::new();
        let source = SyntheticSource::new(gate.clone());
        let target = first_target(&source);

        let capture = source.open(&target.id).unwrap();
        let handle = capture.handle();
        let surface = handle.upgrade().unwrap();

        // The producer writes its first frame right away; allow it a moment.
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut gate_seen = false;
        while (surface.generation() == 0 || !gate_seen) && Instant::now() < deadline {
            gate_seen |= gate.take();
            thread::sleep(Duration::from_millis(5));
        }

        assert!(surface.generation() > 0, "producer never wrote a frame");
        assert!(gate_seen, "producer never signaled the redraw gate");
    }

    #[test]
    fn dropping_capture_stops_the_producer() {
        let source = SyntheticSource::new(RedrawGate::new());
        let target = first_target(&source);

        let capture = source.open(&target.id).unwrap();
        let handle = capture.handle();
        drop(capture);

        // The producer held the only owning reference besides the capture.
        assert!(handle.upgrade().is_none());
    }

    #[test]
    fn pattern_is_deterministic_per_frame_index() {
        let extent = PhysicalExtent::new(8, 4);
        let mut a = vec![0u8; extent.byte_len(4)];
        let mut b = vec![0u8; extent.byte_len(4)];

        fill_pattern(&mut a, extent, 3);
        fill_pattern(&mut b, extent, 3);
        assert_eq!(a, b);

        fill_pattern(&mut b, extent, 4);
        assert_ne!(a, b);
    }

    #[test]
    fn pattern_writes_opaque_alpha() {
        let extent = PhysicalExtent::new(4, 4);
        let mut buf = vec![0u8; extent.byte_len(4)];
        fill_pattern(&mut buf, extent, 0);
        assert!(buf.chunks_exact(4).all(|px| px[3] == 255));
    }
}
