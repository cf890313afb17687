use std::sync::Arc;

use crate::coords::{LogicalSize, PhysicalExtent};

use super::error::{InvalidSizeError, SurfaceBindError};
use super::surface::{SharedSurface, SurfaceFormat, SurfaceHandle};

/// GPU allocation seam for the binding state machine.
///
/// The production implementation allocates wgpu textures; tests substitute a
/// counting mock so resource accounting can be asserted without a GPU.
pub trait TextureImporter {
    type Texture;

    /// Whether `format` can be imported by this backend.
    fn supports(&self, format: SurfaceFormat) -> bool;

    /// Creates a texture from the surface's current contents.
    ///
    /// Only called after the surface has been validated; must not fail.
    fn import(&mut self, surface: &SharedSurface) -> Self::Texture;

    /// Destroys a texture previously returned by `import`.
    fn release(&mut self, texture: Self::Texture);
}

/// Binding phase of a renderer instance.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BindState {
    /// No texture bound. Initial and terminal state; drawing clears only.
    Empty,
    /// A texture is live. At most one per instance.
    Bound,
}

struct Binding<T> {
    texture: T,
    surface: SurfaceHandle,
    physical: PhysicalExtent,
    uploaded_generation: u64,
}

/// Texture binding state machine of the mirror renderer.
///
/// Owns at most one imported texture at any time. Transitions:
/// - `bind_surface` ok: Empty/Bound → Bound (prior texture released first)
/// - `bind_surface` err: state and prior texture untouched
/// - `release_texture`: Bound → Empty; Empty → Empty (no-op)
///
/// Not thread-safe; lives on the thread owning the rendering context.
pub struct MirrorState<I: TextureImporter> {
    importer: I,
    binding: Option<Binding<I::Texture>>,
    logical: Option<LogicalSize>,
}

impl<I: TextureImporter> MirrorState<I> {
    pub fn new(importer: I) -> Self {
        Self {
            importer,
            binding: None,
            logical: None,
        }
    }

    pub fn bind_state(&self) -> BindState {
        if self.binding.is_some() {
            BindState::Bound
        } else {
            BindState::Empty
        }
    }

    /// Logical size applied at the next draw, if one has been set.
    pub fn logical_size(&self) -> Option<LogicalSize> {
        self.logical
    }

    /// Physical extent of the bound surface, if bound.
    pub fn bound_physical(&self) -> Option<PhysicalExtent> {
        self.binding.as_ref().map(|b| b.physical)
    }

    pub fn texture(&self) -> Option<&I::Texture> {
        self.binding.as_ref().map(|b| &b.texture)
    }

    /// Binds a capture surface, replacing any previous binding.
    ///
    /// Every failure mode is checked before the current texture is touched,
    /// so a failed bind keeps the last good frame on screen. A successful
    /// re-bind is exactly one release followed by one import.
    pub fn bind_surface(
        &mut self,
        handle: &SurfaceHandle,
        physical: PhysicalExtent,
    ) -> Result<(), SurfaceBindError> {
        let surface = handle.upgrade().ok_or(SurfaceBindError::SurfaceGone)?;

        if !self.importer.supports(surface.format()) {
            return Err(SurfaceBindError::UnsupportedFormat(surface.format()));
        }
        if physical.is_empty() {
            return Err(SurfaceBindError::ZeroSized);
        }
        if surface.extent() != physical {
            return Err(SurfaceBindError::StorageMismatch {
                declared: physical,
                actual: surface.extent(),
            });
        }

        self.release_texture();

        let uploaded_generation = surface.generation();
        let texture = self.importer.import(&surface);
        self.binding = Some(Binding {
            texture,
            surface: handle.clone(),
            physical,
            uploaded_generation,
        });
        Ok(())
    }

    /// Updates the logical size used for letterboxing at the next draw.
    ///
    /// Rejects non-positive or non-finite dimensions; the previous valid
    /// size stays in effect.
    pub fn set_logical_size(&mut self, size: LogicalSize) -> Result<(), InvalidSizeError> {
        if !size.is_valid() {
            return Err(InvalidSizeError {
                width: size.width,
                height: size.height,
            });
        }
        self.logical = Some(size);
        Ok(())
    }

    /// Releases the bound texture. Idempotent; called internally before each
    /// re-bind and from `Drop` so teardown cannot leak.
    pub fn release_texture(&mut self) {
        if let Some(binding) = self.binding.take() {
            self.importer.release(binding.texture);
        }
    }

    /// Surface to refresh the texture from, when bound and new content
    /// arrived since the last upload.
    ///
    /// Returns `None` when the surface owner dropped it — the texture keeps
    /// showing the last uploaded frame.
    pub fn pending_refresh(&self) -> Option<Arc<SharedSurface>> {
        let binding = self.binding.as_ref()?;
        let surface = binding.surface.upgrade()?;
        (surface.generation() != binding.uploaded_generation).then_some(surface)
    }

    /// Records that the texture now holds `generation`'s contents.
    pub fn mark_uploaded(&mut self, generation: u64) {
        if let Some(binding) = self.binding.as_mut() {
            binding.uploaded_generation = generation;
        }
    }
}

impl<I: TextureImporter> Drop for MirrorState<I> {
    fn drop(&mut self) {
        self.release_texture();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    // Counting importer: tracks create/release calls and the number of live
    // textures, including the high-water mark, so leak properties can be
    // asserted over whole call sequences.
    #[derive(Default)]
    struct Counters {
        created: usize,
        released: usize,
        live: usize,
        max_live: usize,
    }

    struct CountingImporter {
        counters: Rc<RefCell<Counters>>,
        rejects: Option<SurfaceFormat>,
        next_id: u32,
    }

    impl CountingImporter {
        fn new() -> (Self, Rc<RefCell<Counters>>) {
            let counters = Rc::new(RefCell::new(Counters::default()));
            (
                Self {
                    counters: counters.clone(),
                    rejects: None,
                    next_id: 0,
                },
                counters,
            )
        }

        fn rejecting(format: SurfaceFormat) -> (Self, Rc<RefCell<Counters>>) {
            let (mut importer, counters) = Self::new();
            importer.rejects = Some(format);
            (importer, counters)
        }
    }

    impl TextureImporter for CountingImporter {
        type Texture = u32;

        fn supports(&self, format: SurfaceFormat) -> bool {
            self.rejects != Some(format)
        }

        fn import(&mut self, _surface: &SharedSurface) -> u32 {
            let mut c = self.counters.borrow_mut();
            c.created += 1;
            c.live += 1;
            c.max_live = c.max_live.max(c.live);
            self.next_id += 1;
            self.next_id
        }

        fn release(&mut self, _texture: u32) {
            let mut c = self.counters.borrow_mut();
            c.released += 1;
            c.live -= 1;
        }
    }

    fn surface(w: u32, h: u32) -> Arc<SharedSurface> {
        SharedSurface::new(PhysicalExtent::new(w, h), SurfaceFormat::Bgra8)
    }

    // ── bind / re-bind accounting ─────────────────────────────────────────

    #[test]
    fn bind_creates_exactly_one_texture() {
        let (importer, counters) = CountingImporter::new();
        let mut state = MirrorState::new(importer);
        let s = surface(4, 4);

        state.bind_surface(&s.handle(), s.extent()).unwrap();

        assert_eq!(state.bind_state(), BindState::Bound);
        let c = counters.borrow();
        assert_eq!((c.created, c.released, c.live), (1, 0, 1));
    }

    #[test]
    fn rebind_sequence_never_exceeds_one_live_texture() {
        let (importer, counters) = CountingImporter::new();
        let mut state = MirrorState::new(importer);

        let n: u32 = 5;
        let surfaces: Vec<_> = (1..=n).map(|i| surface(i, i)).collect();
        for s in &surfaces {
            state.bind_surface(&s.handle(), s.extent()).unwrap();
            assert_eq!(counters.borrow().live, 1);
        }

        {
            let c = counters.borrow();
            assert_eq!(c.created, n as usize);
            assert_eq!(c.released, n as usize - 1);
            assert_eq!(c.max_live, 1);
        }

        // Teardown releases the final texture.
        drop(state);
        let c = counters.borrow();
        assert_eq!(c.released, n as usize);
        assert_eq!(c.live, 0);
    }

    #[test]
    fn release_texture_is_idempotent() {
        let (importer, counters) = CountingImporter::new();
        let mut state = MirrorState::new(importer);
        let s = surface(4, 4);
        state.bind_surface(&s.handle(), s.extent()).unwrap();

        state.release_texture();
        state.release_texture();

        assert_eq!(state.bind_state(), BindState::Empty);
        let c = counters.borrow();
        assert_eq!((c.created, c.released), (1, 1));
    }

    #[test]
    fn release_on_empty_is_a_noop() {
        let (importer, counters) = CountingImporter::new();
        let mut state = MirrorState::new(importer);
        state.release_texture();
        assert_eq!(counters.borrow().released, 0);
    }

    // ── failed binds keep the prior texture ───────────────────────────────

    #[test]
    fn bind_dead_surface_fails_and_keeps_prior() {
        let (importer, counters) = CountingImporter::new();
        let mut state = MirrorState::new(importer);

        let a = surface(4, 4);
        state.bind_surface(&a.handle(), a.extent()).unwrap();

        let b = surface(8, 8);
        let dead = b.handle();
        drop(b);

        let err = state.bind_surface(&dead, dead.extent()).unwrap_err();
        assert!(matches!(err, SurfaceBindError::SurfaceGone));

        // Last-good-frame: the first binding is untouched.
        assert_eq!(state.bind_state(), BindState::Bound);
        assert_eq!(state.bound_physical(), Some(a.extent()));
        let c = counters.borrow();
        assert_eq!((c.created, c.released, c.live), (1, 0, 1));
    }

    #[test]
    fn bind_unsupported_format_fails_and_keeps_prior() {
        let (importer, counters) = CountingImporter::rejecting(SurfaceFormat::Rgba8);
        let mut state = MirrorState::new(importer);

        let a = surface(4, 4); // Bgra8, supported
        state.bind_surface(&a.handle(), a.extent()).unwrap();

        let b = SharedSurface::new(PhysicalExtent::new(8, 8), SurfaceFormat::Rgba8);
        let err = state.bind_surface(&b.handle(), b.extent()).unwrap_err();
        assert!(matches!(err, SurfaceBindError::UnsupportedFormat(SurfaceFormat::Rgba8)));

        assert_eq!(state.bound_physical(), Some(a.extent()));
        assert_eq!(counters.borrow().live, 1);
    }

    #[test]
    fn bind_zero_sized_fails() {
        let (importer, _) = CountingImporter::new();
        let mut state = MirrorState::new(importer);
        let s = surface(0, 4);
        let err = state.bind_surface(&s.handle(), s.extent()).unwrap_err();
        assert!(matches!(err, SurfaceBindError::ZeroSized));
        assert_eq!(state.bind_state(), BindState::Empty);
    }

    #[test]
    fn bind_mismatched_extent_fails() {
        let (importer, _) = CountingImporter::new();
        let mut state = MirrorState::new(importer);
        let s = surface(4, 4);
        let err = state
            .bind_surface(&s.handle(), PhysicalExtent::new(8, 8))
            .unwrap_err();
        assert!(matches!(err, SurfaceBindError::StorageMismatch { .. }));
        assert_eq!(state.bind_state(), BindState::Empty);
    }

    // ── logical size ──────────────────────────────────────────────────────

    #[test]
    fn invalid_logical_size_retains_previous() {
        let (importer, _) = CountingImporter::new();
        let mut state = MirrorState::new(importer);

        state.set_logical_size(LogicalSize::new(800.0, 600.0)).unwrap();
        state
            .set_logical_size(LogicalSize::new(-1.0, 10.0))
            .unwrap_err();

        assert_eq!(state.logical_size(), Some(LogicalSize::new(800.0, 600.0)));
    }

    #[test]
    fn logical_size_defaults_to_unset() {
        let (importer, _) = CountingImporter::new();
        let state = MirrorState::new(importer);
        assert_eq!(state.logical_size(), None);
    }

    // ── refresh tracking ──────────────────────────────────────────────────

    #[test]
    fn pending_refresh_follows_generation() {
        let (importer, _) = CountingImporter::new();
        let mut state = MirrorState::new(importer);
        let s = surface(2, 2);
        state.bind_surface(&s.handle(), s.extent()).unwrap();

        // Bound at generation 0 — nothing new yet.
        assert!(state.pending_refresh().is_none());

        s.write_frame(&[1u8; 16]).unwrap();
        let fresh = state.pending_refresh().expect("new content pending");
        state.mark_uploaded(fresh.generation());
        assert!(state.pending_refresh().is_none());
    }

    #[test]
    fn pending_refresh_none_when_empty_or_surface_gone() {
        let (importer, _) = CountingImporter::new();
        let mut state = MirrorState::new(importer);
        assert!(state.pending_refresh().is_none());

        let s = surface(2, 2);
        state.bind_surface(&s.handle(), s.extent()).unwrap();
        drop(s);
        // Owner dropped the surface: keep showing the last uploaded frame.
        assert!(state.pending_refresh().is_none());
        assert_eq!(state.bind_state(), BindState::Bound);
    }

    // ── selection scenario ────────────────────────────────────────────────

    #[test]
    fn switching_targets_releases_old_and_binds_new() {
        let (importer, counters) = CountingImporter::new();
        let mut state = MirrorState::new(importer);

        let a = surface(800, 600);
        state.bind_surface(&a.handle(), a.extent()).unwrap();
        state.set_logical_size(LogicalSize::new(800.0, 600.0)).unwrap();

        let b = surface(1920, 1080);
        state.bind_surface(&b.handle(), b.extent()).unwrap();
        state
            .set_logical_size(LogicalSize::new(1920.0, 1080.0))
            .unwrap();

        assert_eq!(state.bound_physical(), Some(b.extent()));
        let c = counters.borrow();
        assert_eq!((c.created, c.released, c.live), (2, 1, 1));
    }
}
