//! Zoom, pan and fullscreen state for the hint image.
//!
//! Input arrives as [`ViewerInput`] values (already decoded from the terminal by
//! the input layer) and [`ImageViewer::handle`] reports what changed.

use std::collections::BTreeMap;

pub const WHEEL_ZOOM_IN: f64 = 1.1;
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

pub type PointerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
}

impl ZoomBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.min, self.max)
    }
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self::new(0.5, 3.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub fullscreen: bool,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
            fullscreen: false,
        }
    }
}

impl ZoomTransform {
    pub fn offset(&self) -> Point {
        Point::new(self.translate_x, self.translate_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerMode {
    Normal,
    Zoomed,
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerInput {
    PointerDown { id: PointerId, at: Point },
    PointerMove { id: PointerId, at: Point },
    PointerUp { id: PointerId },
    Wheel(WheelDirection),
    Tap,
    DoubleTap,
    Cancel,
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEffect {
    None,
    TransformChanged,
    FullscreenChanged(bool),
}

/// Transient state between pointer down and the last pointer up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureSession {
    Pan {
        pointer: PointerId,
        start: Point,
        offset_at_start: Point,
    },
    Pinch {
        start_distance: f64,
        scale_at_start: f64,
    },
}

#[derive(Debug, Clone)]
pub struct ImageViewer {
    transform: ZoomTransform,
    bounds: ZoomBounds,
    snap_offsets_at_unit_scale: bool,
    pointers: BTreeMap<PointerId, Point>,
    gesture: Option<GestureSession>,
}

impl ImageViewer {
    pub fn new(bounds: ZoomBounds, snap_offsets_at_unit_scale: bool) -> Self {
        Self {
            transform: ZoomTransform::default(),
            bounds,
            snap_offsets_at_unit_scale,
            pointers: BTreeMap::new(),
            gesture: None,
        }
    }

    pub fn transform(&self) -> &ZoomTransform {
        &self.transform
    }

    pub fn bounds(&self) -> ZoomBounds {
        self.bounds
    }

    pub fn gesture(&self) -> Option<&GestureSession> {
        self.gesture.as_ref()
    }

    pub fn mode(&self) -> ViewerMode {
        let t = &self.transform;
        if t.fullscreen {
            ViewerMode::Fullscreen
        } else if t.scale != 1.0 || t.translate_x != 0.0 || t.translate_y != 0.0 {
            ViewerMode::Zoomed
        } else {
            ViewerMode::Normal
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.transform.fullscreen
    }

    pub fn handle(&mut self, input: ViewerInput) -> ViewerEffect {
        match input {
            ViewerInput::PointerDown { id, at } => self.pointer_down(id, at),
            ViewerInput::PointerMove { id, at } => self.pointer_move(id, at),
            ViewerInput::PointerUp { id } => self.pointer_up(id),
            ViewerInput::Wheel(direction) => {
                let factor = match direction {
                    WheelDirection::In => WHEEL_ZOOM_IN,
                    WheelDirection::Out => WHEEL_ZOOM_OUT,
                };
                self.set_scale(self.transform.scale * factor)
            }
            ViewerInput::Tap => {
                if self.transform.fullscreen {
                    self.reset();
                    return ViewerEffect::FullscreenChanged(false);
                }
                self.transform.fullscreen = true;
                ViewerEffect::FullscreenChanged(true)
            }
            ViewerInput::DoubleTap => {
                let was_fullscreen = self.transform.fullscreen;
                self.reset();
                if was_fullscreen {
                    ViewerEffect::FullscreenChanged(false)
                } else {
                    ViewerEffect::TransformChanged
                }
            }
            ViewerInput::Cancel => {
                if !self.transform.fullscreen {
                    return ViewerEffect::None;
                }
                self.reset();
                ViewerEffect::FullscreenChanged(false)
            }
            ViewerInput::Open | ViewerInput::Close => {
                self.reset();
                ViewerEffect::TransformChanged
            }
        }
    }

    fn reset(&mut self) {
        self.transform = ZoomTransform::default();
        self.pointers.clear();
        self.gesture = None;
    }

    fn set_scale(&mut self, scale: f64) -> ViewerEffect {
        let scale = self.bounds.clamp(scale);
        let snapped = self.snap_offsets_at_unit_scale
            && scale <= 1.0
            && (self.transform.translate_x != 0.0 || self.transform.translate_y != 0.0);
        if scale == self.transform.scale && !snapped {
            return ViewerEffect::None;
        }
        self.transform.scale = scale;
        if snapped {
            self.transform.translate_x = 0.0;
            self.transform.translate_y = 0.0;
        }
        ViewerEffect::TransformChanged
    }

    fn pointer_down(&mut self, id: PointerId, at: Point) -> ViewerEffect {
        self.pointers.insert(id, at);
        self.gesture = self.begin_gesture();
        ViewerEffect::None
    }

    fn begin_gesture(&self) -> Option<GestureSession> {
        let mut active = self.pointers.iter();
        match (active.next(), active.next()) {
            (Some((_, &a)), Some((_, &b))) => {
                let start_distance = a.distance(b);
                (start_distance > 0.0).then_some(GestureSession::Pinch {
                    start_distance,
                    scale_at_start: self.transform.scale,
                })
            }
            (Some((&pointer, &start)), None) if self.transform.scale > 1.0 => {
                Some(GestureSession::Pan {
                    pointer,
                    start,
                    offset_at_start: self.transform.offset(),
                })
            }
            _ => None,
        }
    }

    fn pointer_move(&mut self, id: PointerId, at: Point) -> ViewerEffect {
        let Some(position) = self.pointers.get_mut(&id) else {
            return ViewerEffect::None;
        };
        *position = at;

        match self.gesture {
            Some(GestureSession::Pan {
                pointer,
                start,
                offset_at_start,
            }) if pointer == id => {
                self.transform.translate_x = at.x - (start.x - offset_at_start.x);
                self.transform.translate_y = at.y - (start.y - offset_at_start.y);
                ViewerEffect::TransformChanged
            }
            Some(GestureSession::Pinch {
                start_distance,
                scale_at_start,
            }) => {
                let mut active = self.pointers.values();
                let (Some(&a), Some(&b)) = (active.next(), active.next()) else {
                    return ViewerEffect::None;
                };
                self.set_scale(a.distance(b) / start_distance * scale_at_start)
            }
            _ => ViewerEffect::None,
        }
    }

    fn pointer_up(&mut self, id: PointerId) -> ViewerEffect {
        if self.pointers.remove(&id).is_none() {
            return ViewerEffect::None;
        }
        // A pinch that loses a finger continues as a pan of the remaining one.
        self.gesture = self.begin_gesture();
        ViewerEffect::None
    }
}

impl Default for ImageViewer {
    fn default() -> Self {
        Self::new(ZoomBounds::default(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(id: PointerId, x: f64, y: f64) -> ViewerInput {
        ViewerInput::PointerDown {
            id,
            at: Point::new(x, y),
        }
    }

    fn moved(id: PointerId, x: f64, y: f64) -> ViewerInput {
        ViewerInput::PointerMove {
            id,
            at: Point::new(x, y),
        }
    }

    fn zoomed_in(viewer: &mut ImageViewer, steps: usize) {
        for _ in 0..steps {
            viewer.handle(ViewerInput::Wheel(WheelDirection::In));
        }
    }

    #[test]
    fn starts_normal() {
        let viewer = ImageViewer::default();
        assert_eq!(viewer.mode(), ViewerMode::Normal);
        assert_eq!(*viewer.transform(), ZoomTransform::default());
    }

    #[test]
    fn wheel_steps_are_multiplicative() {
        let mut viewer = ImageViewer::default();

        viewer.handle(ViewerInput::Wheel(WheelDirection::In));
        assert!((viewer.transform().scale - 1.1).abs() < 1e-12);

        viewer.handle(ViewerInput::Wheel(WheelDirection::Out));
        assert!((viewer.transform().scale - 0.99).abs() < 1e-12);
        assert_eq!(viewer.mode(), ViewerMode::Zoomed);
    }

    #[test]
    fn wheel_is_clamped_both_ways() {
        let mut viewer = ImageViewer::new(ZoomBounds::new(0.5, 3.0), false);

        zoomed_in(&mut viewer, 50);
        assert_eq!(viewer.transform().scale, 3.0);
        assert_eq!(
            viewer.handle(ViewerInput::Wheel(WheelDirection::In)),
            ViewerEffect::None
        );

        for _ in 0..100 {
            viewer.handle(ViewerInput::Wheel(WheelDirection::Out));
        }
        assert_eq!(viewer.transform().scale, 0.5);
    }

    #[test]
    fn pinch_scales_relative_to_start() {
        let mut viewer = ImageViewer::new(ZoomBounds::new(0.5, 5.0), false);

        viewer.handle(down(1, 10.0, 10.0));
        viewer.handle(down(2, 20.0, 10.0));
        assert!(matches!(
            viewer.gesture(),
            Some(GestureSession::Pinch { .. })
        ));

        viewer.handle(moved(2, 30.0, 10.0));
        assert!((viewer.transform().scale - 2.0).abs() < 1e-12);

        viewer.handle(moved(2, 15.0, 10.0));
        assert!((viewer.transform().scale - 0.5).abs() < 1e-12);
    }

    #[test]
    fn pinch_is_clamped() {
        let mut viewer = ImageViewer::new(ZoomBounds::new(0.5, 3.0), false);

        viewer.handle(down(1, 0.0, 0.0));
        viewer.handle(down(2, 1.0, 0.0));
        viewer.handle(moved(2, 100.0, 0.0));
        assert_eq!(viewer.transform().scale, 3.0);

        viewer.handle(moved(2, 0.01, 0.0));
        assert_eq!(viewer.transform().scale, 0.5);
    }

    #[test]
    fn pinch_with_coincident_pointers_does_not_start() {
        let mut viewer = ImageViewer::default();

        viewer.handle(down(1, 5.0, 5.0));
        viewer.handle(down(2, 5.0, 5.0));

        assert_eq!(viewer.gesture(), None);
        viewer.handle(moved(2, 50.0, 5.0));
        assert_eq!(viewer.transform().scale, 1.0);
    }

    #[test]
    fn drag_at_unit_scale_does_not_pan() {
        let mut viewer = ImageViewer::default();

        viewer.handle(down(1, 0.0, 0.0));
        let effect = viewer.handle(moved(1, 10.0, 4.0));

        assert_eq!(effect, ViewerEffect::None);
        assert_eq!(viewer.transform().offset(), Point::default());
    }

    #[test]
    fn drag_when_zoomed_pans_from_captured_offset() {
        let mut viewer = ImageViewer::default();
        zoomed_in(&mut viewer, 3);

        viewer.handle(down(1, 10.0, 10.0));
        viewer.handle(moved(1, 14.0, 7.0));
        viewer.handle(ViewerInput::PointerUp { id: 1 });
        assert_eq!(viewer.transform().offset(), Point::new(4.0, -3.0));

        // second drag accumulates on top of the first
        viewer.handle(down(1, 0.0, 0.0));
        viewer.handle(moved(1, 1.0, 1.0));
        assert_eq!(viewer.transform().offset(), Point::new(5.0, -2.0));
        assert!(viewer.gesture().is_some());
    }

    #[test]
    fn gesture_ends_on_last_pointer_up() {
        let mut viewer = ImageViewer::default();
        zoomed_in(&mut viewer, 3);

        viewer.handle(down(1, 0.0, 0.0));
        viewer.handle(ViewerInput::PointerUp { id: 1 });

        assert_eq!(viewer.gesture(), None);
    }

    #[test]
    fn offsets_survive_zoom_back_to_one_by_default() {
        let mut viewer = ImageViewer::new(ZoomBounds::new(0.5, 3.0), false);
        zoomed_in(&mut viewer, 2);
        viewer.handle(down(1, 0.0, 0.0));
        viewer.handle(moved(1, 3.0, 3.0));
        viewer.handle(ViewerInput::PointerUp { id: 1 });

        for _ in 0..10 {
            viewer.handle(ViewerInput::Wheel(WheelDirection::Out));
        }

        assert_eq!(viewer.transform().offset(), Point::new(3.0, 3.0));
    }

    #[test]
    fn offsets_snap_when_configured() {
        let mut viewer = ImageViewer::new(ZoomBounds::new(0.5, 3.0), true);
        zoomed_in(&mut viewer, 2);
        viewer.handle(down(1, 0.0, 0.0));
        viewer.handle(moved(1, 3.0, 3.0));
        viewer.handle(ViewerInput::PointerUp { id: 1 });

        for _ in 0..10 {
            viewer.handle(ViewerInput::Wheel(WheelDirection::Out));
        }

        assert_eq!(viewer.transform().offset(), Point::default());
    }

    #[test]
    fn double_tap_resets_when_not_fullscreen() {
        let mut viewer = ImageViewer::default();
        zoomed_in(&mut viewer, 4);
        viewer.handle(down(1, 0.0, 0.0));
        viewer.handle(moved(1, 7.0, 2.0));

        let effect = viewer.handle(ViewerInput::DoubleTap);

        assert_eq!(effect, ViewerEffect::TransformChanged);
        assert_eq!(viewer.transform().scale, 1.0);
        assert_eq!(viewer.transform().translate_x, 0.0);
        assert_eq!(viewer.transform().translate_y, 0.0);
        assert_eq!(viewer.gesture(), None);
    }

    #[test]
    fn double_tap_exits_fullscreen_first() {
        let mut viewer = ImageViewer::default();
        viewer.handle(ViewerInput::Tap);
        zoomed_in(&mut viewer, 2);
        assert_eq!(viewer.mode(), ViewerMode::Fullscreen);

        let effect = viewer.handle(ViewerInput::DoubleTap);

        assert_eq!(effect, ViewerEffect::FullscreenChanged(false));
        assert_eq!(viewer.mode(), ViewerMode::Normal);
    }

    #[test]
    fn tap_toggles_fullscreen() {
        let mut viewer = ImageViewer::default();

        assert_eq!(
            viewer.handle(ViewerInput::Tap),
            ViewerEffect::FullscreenChanged(true)
        );
        assert!(viewer.is_fullscreen());
        assert_eq!(
            viewer.handle(ViewerInput::Tap),
            ViewerEffect::FullscreenChanged(false)
        );
        assert!(!viewer.is_fullscreen());
    }

    #[test]
    fn cancel_outside_fullscreen_is_a_no_op() {
        let mut viewer = ImageViewer::default();
        zoomed_in(&mut viewer, 1);

        assert_eq!(viewer.handle(ViewerInput::Cancel), ViewerEffect::None);
        assert_eq!(viewer.mode(), ViewerMode::Zoomed);
    }

    #[test]
    fn cancel_from_fullscreen_resets_transform() {
        let mut viewer = ImageViewer::default();
        viewer.handle(ViewerInput::Tap);
        zoomed_in(&mut viewer, 3);

        assert_eq!(
            viewer.handle(ViewerInput::Cancel),
            ViewerEffect::FullscreenChanged(false)
        );
        assert_eq!(*viewer.transform(), ZoomTransform::default());
    }

    #[test]
    fn tap_out_of_fullscreen_resets_transform() {
        let mut viewer = ImageViewer::default();
        viewer.handle(ViewerInput::Tap);
        zoomed_in(&mut viewer, 3);
        viewer.handle(down(1, 0.0, 0.0));
        viewer.handle(moved(1, 6.0, 4.0));
        viewer.handle(ViewerInput::PointerUp { id: 1 });
        assert!(viewer.transform().scale > 1.0);
        assert_eq!(viewer.transform().offset(), Point::new(6.0, 4.0));

        assert_eq!(
            viewer.handle(ViewerInput::Tap),
            ViewerEffect::FullscreenChanged(false)
        );
        assert_eq!(*viewer.transform(), ZoomTransform::default());
        assert_eq!(viewer.mode(), ViewerMode::Normal);
    }

    #[test]
    fn close_then_open_is_always_default() {
        let mut viewer = ImageViewer::default();
        viewer.handle(ViewerInput::Tap);
        zoomed_in(&mut viewer, 5);
        viewer.handle(down(1, 0.0, 0.0));
        viewer.handle(moved(1, 9.0, 9.0));

        viewer.handle(ViewerInput::Close);
        viewer.handle(ViewerInput::Open);

        assert_eq!(viewer.mode(), ViewerMode::Normal);
        assert_eq!(*viewer.transform(), ZoomTransform::default());
        assert_eq!(viewer.gesture(), None);
    }

    #[test]
    fn moves_from_unknown_pointers_are_ignored() {
        let mut viewer = ImageViewer::default();
        assert_eq!(viewer.handle(moved(42, 1.0, 1.0)), ViewerEffect::None);
        assert_eq!(
            viewer.handle(ViewerInput::PointerUp { id: 42 }),
            ViewerEffect::None
        );
    }
}
