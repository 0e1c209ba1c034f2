//! 画像のズーム・パン状態
//!
//! ストアには入れず、表示側だけが保持する。

pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 3.0;
pub const ZOOM_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    zoom: f32,
    pan: (f32, f32),
    drag: Option<Drag>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    pointer_start: (f32, f32),
    pan_start: (f32, f32),
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: MIN_ZOOM,
            pan: (0.0, 0.0),
            drag: None,
        }
    }
}

impl Viewport {
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> (f32, f32) {
        self.pan
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom > MIN_ZOOM
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// ズームを設定（[1, 3]に丸め、小数2桁に揃える）
    ///
    /// 1に戻ったらパンを原点へ戻し、ドラッグも終了する。
    pub fn set_zoom(&mut self, zoom: f32) {
        let zoom = if zoom.is_finite() { zoom } else { MIN_ZOOM };
        self.zoom = ((zoom * 100.0).round() / 100.0).clamp(MIN_ZOOM, MAX_ZOOM);
        if !self.is_zoomed() {
            self.pan = (0.0, 0.0);
            self.drag = None;
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    /// ドラッグ開始。ズームしていなければ何もしない
    pub fn begin_drag(&mut self, pointer: (f32, f32)) -> bool {
        if !self.is_zoomed() {
            return false;
        }
        self.drag = Some(Drag {
            pointer_start: pointer,
            pan_start: self.pan,
        });
        true
    }

    /// パンは範囲制限なし
    pub fn drag_to(&mut self, pointer: (f32, f32)) {
        if let Some(drag) = self.drag {
            self.pan = (
                drag.pan_start.0 + pointer.0 - drag.pointer_start.0,
                drag.pan_start.1 + pointer.1 - drag.pointer_start.1,
            );
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_is_clamped() {
        let mut vp = Viewport::default();
        for _ in 0..40 {
            vp.zoom_in();
            assert!(vp.zoom() >= MIN_ZOOM && vp.zoom() <= MAX_ZOOM);
        }
        assert_eq!(vp.zoom(), MAX_ZOOM);

        for _ in 0..40 {
            vp.zoom_out();
            assert!(vp.zoom() >= MIN_ZOOM && vp.zoom() <= MAX_ZOOM);
        }
        assert_eq!(vp.zoom(), MIN_ZOOM);

        vp.set_zoom(7.5);
        assert_eq!(vp.zoom(), MAX_ZOOM);
        vp.set_zoom(-2.0);
        assert_eq!(vp.zoom(), MIN_ZOOM);
        vp.set_zoom(f32::NAN);
        assert_eq!(vp.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_steps_do_not_drift() {
        let mut vp = Viewport::default();
        for _ in 0..5 {
            vp.zoom_in();
        }
        assert_eq!(vp.zoom(), 1.5);
        for _ in 0..5 {
            vp.zoom_out();
        }
        assert_eq!(vp.zoom(), 1.0);
    }

    #[test]
    fn test_drag_only_when_zoomed() {
        let mut vp = Viewport::default();
        assert!(!vp.begin_drag((10.0, 10.0)));
        vp.drag_to((50.0, 50.0));
        assert_eq!(vp.pan(), (0.0, 0.0));

        vp.zoom_in();
        assert!(vp.begin_drag((10.0, 10.0)));
        vp.drag_to((-490.0, 260.0));
        assert_eq!(vp.pan(), (-500.0, 250.0));
        vp.end_drag();
        assert!(!vp.is_dragging());
        assert_eq!(vp.pan(), (-500.0, 250.0));
    }

    #[test]
    fn test_pan_resets_when_zoom_returns_to_one() {
        let mut vp = Viewport::default();
        vp.set_zoom(2.0);
        vp.begin_drag((0.0, 0.0));
        vp.drag_to((30.0, -40.0));
        assert_eq!(vp.pan(), (30.0, -40.0));

        vp.set_zoom(1.0);
        assert_eq!(vp.pan(), (0.0, 0.0));
        assert!(!vp.is_dragging());

        vp.set_zoom(1.1);
        vp.begin_drag((0.0, 0.0));
        vp.drag_to((5.0, 5.0));
        vp.zoom_out();
        assert_eq!(vp.zoom(), 1.0);
        assert_eq!(vp.pan(), (0.0, 0.0));
    }
}
