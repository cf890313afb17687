use super::{LogicalSize, Vec2, Viewport};

/// Axis-aligned rectangle in logical pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Largest centered rectangle with `content`'s aspect ratio that fits
    /// inside `viewport`.
    ///
    /// This is the letterbox mapping: content wider than the viewport is
    /// padded top/bottom, narrower content is padded left/right. Content is
    /// never distorted. Returns an empty rect when either input is degenerate,
    /// so callers can skip the draw instead of dividing by zero.
    pub fn letterboxed(content: LogicalSize, viewport: Viewport) -> Self {
        if !content.is_valid() || !viewport.is_valid() {
            return Rect::default();
        }

        let content_aspect = content.aspect();
        let viewport_aspect = viewport.width / viewport.height;

        let (w, h) = if content_aspect >= viewport_aspect {
            // Content is wider: full width, reduced height.
            (viewport.width, viewport.width / content_aspect)
        } else {
            // Content is taller: full height, reduced width.
            (viewport.height * content_aspect, viewport.height)
        };

        Rect::new(
            (viewport.width - w) / 2.0,
            (viewport.height - h) / 2.0,
            w,
            h,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letterbox(cw: f32, ch: f32, vw: f32, vh: f32) -> Rect {
        Rect::letterboxed(LogicalSize::new(cw, ch), Viewport::new(vw, vh))
    }

    // ── letterboxed ───────────────────────────────────────────────────────

    #[test]
    fn wide_content_in_square_viewport() {
        // 1920x1080 into 800x800 occupies a centered 800x450 band.
        let r = letterbox(1920.0, 1080.0, 800.0, 800.0);
        assert_eq!(r, Rect::new(0.0, 175.0, 800.0, 450.0));
    }

    #[test]
    fn tall_content_in_square_viewport() {
        let r = letterbox(1080.0, 1920.0, 800.0, 800.0);
        assert_eq!(r, Rect::new(175.0, 0.0, 450.0, 800.0));
    }

    #[test]
    fn matching_aspect_fills_viewport() {
        let r = letterbox(800.0, 600.0, 400.0, 300.0);
        assert_eq!(r, Rect::new(0.0, 0.0, 400.0, 300.0));
    }

    #[test]
    fn degenerate_content_yields_empty() {
        assert!(letterbox(0.0, 1080.0, 800.0, 800.0).is_empty());
        assert!(letterbox(f32::NAN, 1080.0, 800.0, 800.0).is_empty());
    }

    #[test]
    fn degenerate_viewport_yields_empty() {
        // Minimized window: skip the quad rather than divide by zero.
        assert!(letterbox(1920.0, 1080.0, 0.0, 0.0).is_empty());
    }

    // ── is_empty ──────────────────────────────────────────────────────────

    #[test]
    fn is_empty_zero_size() {
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).is_empty());
        assert!(Rect::new(0.0, 0.0, 5.0, 0.0).is_empty());
    }

    #[test]
    fn is_empty_positive_size() {
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }
}
