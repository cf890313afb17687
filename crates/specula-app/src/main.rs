//! specula — mirror a capture target into a window.
//!
//! Digit keys select a target from the enumerated list, `R` releases the
//! current binding, `Esc` quits. Selection dispatches bind commands into the
//! render thread's queue; the renderer never calls back out.

use anyhow::Result;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use specula_capture::{Selection, Selector, SyntheticSource, TargetSource};
use specula_engine::coords::ColorRgba;
use specula_engine::core::{App, AppControl, FrameCtx};
use specula_engine::device::GpuInit;
use specula_engine::logging::{LoggingConfig, init_logging};
use specula_engine::mirror::{
    CommandQueue, CommandSender, MirrorCommand, RedrawGate, command_channel,
};
use specula_engine::render::MirrorRenderer;
use specula_engine::window::{Runtime, RuntimeConfig};

const BACKGROUND: ColorRgba = ColorRgba::new(0.08, 0.08, 0.10, 1.0);

struct MirrorApp<S: TargetSource> {
    selector: Selector<S>,
    commands: CommandSender,
    queue: CommandQueue,
    gate: RedrawGate,

    /// Created on the render thread at first frame; all its GPU work stays
    /// there.
    renderer: Option<MirrorRenderer>,

    /// Keeps the selected capture (and its producer) alive while mirrored.
    selection: Option<Selection>,
}

impl<S: TargetSource> MirrorApp<S> {
    fn new(selector: Selector<S>, commands: CommandSender, queue: CommandQueue, gate: RedrawGate) -> Self {
        Self {
            selector,
            commands,
            queue,
            gate,
            renderer: None,
            selection: None,
        }
    }

    /// Selects the `index`-th listed target and queues its bind.
    fn select_index(&mut self, index: usize) {
        let targets = self.selector.list_targets();
        let Some(target) = targets.get(index) else {
            log::warn!("no capture target at index {}", index + 1);
            return;
        };

        match self.selector.select_target(&target.id) {
            Ok(selection) => {
                log::info!(
                    "mirroring {} ({}x{} px)",
                    target.name,
                    target.physical.width,
                    target.physical.height
                );
                selection.dispatch(&self.commands);
                // The old capture is dropped only after the new bind is
                // queued, so the renderer never sees a dead handle mid-swap.
                self.selection = Some(selection);
                self.gate.request();
            }
            Err(e) => log::warn!("selection failed: {e}"),
        }
    }

    fn release(&mut self) {
        self.commands.send(MirrorCommand::Release);
        self.selection = None;
        self.gate.request();
    }
}

/// Applies queued selector commands to the renderer, on the render thread.
fn apply_commands(queue: &CommandQueue, renderer: &mut MirrorRenderer) {
    for cmd in queue.drain() {
        match cmd {
            MirrorCommand::Bind {
                handle,
                physical,
                logical,
            } => {
                if let Err(e) = renderer.bind_surface(&handle, physical) {
                    // Keep the last good frame; the user can retry.
                    log::warn!("surface bind failed: {e}");
                    continue;
                }
                if let Err(e) = renderer.set_logical_size(logical) {
                    log::warn!("ignoring logical size: {e}");
                }
            }
            MirrorCommand::SetLogicalSize(size) => {
                if let Err(e) = renderer.set_logical_size(size) {
                    log::warn!("ignoring logical size: {e}");
                }
            }
            MirrorCommand::Release => renderer.release_texture(),
        }
    }
}

impl<S: TargetSource> App for MirrorApp<S> {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event: key, .. } = event else {
            return AppControl::Continue;
        };
        if key.state != ElementState::Pressed || key.repeat {
            return AppControl::Continue;
        }

        match key.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => {
                // Release before the runtime tears the context down.
                if let Some(renderer) = &mut self.renderer {
                    renderer.release_texture();
                }
                return AppControl::Exit;
            }
            PhysicalKey::Code(KeyCode::KeyR) => self.release(),
            PhysicalKey::Code(code) => {
                if let Some(index) = digit_index(code) {
                    self.select_index(index);
                }
            }
            _ => {}
        }

        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let renderer = self.renderer.get_or_insert_with(|| {
            MirrorRenderer::new(ctx.gpu.device(), ctx.gpu.queue(), ctx.gpu.surface_format())
        });

        apply_commands(&self.queue, renderer);

        ctx.render(BACKGROUND, |rctx, target| renderer.render(rctx, target))
    }
}

fn digit_index(code: KeyCode) -> Option<usize> {
    let index = match code {
        KeyCode::Digit1 => 0,
        KeyCode::Digit2 => 1,
        KeyCode::Digit3 => 2,
        KeyCode::Digit4 => 3,
        KeyCode::Digit5 => 4,
        KeyCode::Digit6 => 5,
        KeyCode::Digit7 => 6,
        KeyCode::Digit8 => 7,
        KeyCode::Digit9 => 8,
        _ => return None,
    };
    Some(index)
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let gate = RedrawGate::new();
    let (commands, queue) = command_channel();
    let selector = Selector::new(SyntheticSource::new(gate.clone()));

    for (i, target) in selector.list_targets().iter().enumerate() {
        log::info!(
            "[{}] {} — {}x{} px",
            i + 1,
            target.name,
            target.physical.width,
            target.physical.height
        );
    }

    let mut app = MirrorApp::new(selector, commands, queue, gate.clone());
    app.select_index(0);

    Runtime::run(
        RuntimeConfig {
            title: "specula".to_string(),
            ..Default::default()
        },
        GpuInit::default(),
        gate,
        app,
    )
}
