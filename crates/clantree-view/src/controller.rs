//! Pan, zoom and animated focus for the tree viewport.
//!
//! The controller owns the current [`ViewportTransform`] and a small state
//! machine:
//!
//! - `Idle` → `Panning` on a background press
//! - `Idle` or `Panning` → `Idle` on wheel zoom
//! - `Panning` → `Idle` on release or pointer leave
//! - any state → `Animating` on a successful focus request
//! - `Animating` → `Idle` when the animation lands
//!
//! While animating, background presses, wheel input and zoom commands are
//! ignored. Double-click zoom does not exist.

use crate::animation::FocusAnimation;
use crate::easing::Easing;
use crate::transform::{ViewportSize, ViewportTransform};
use clantree_core::{FocusError, MemberId};
use clantree_graph::{PositionedTree, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Allowed zoom range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleExtent {
    pub min: f32,
    pub max: f32,
}

impl ScaleExtent {
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// Inverted bounds are swapped; NaN bounds are ignored.
    pub fn clamp(&self, scale: f32) -> f32 {
        let (lo, hi) = (self.min.min(self.max), self.max.max(self.min));
        scale.max(lo).min(hi)
    }
}

impl Default for ScaleExtent {
    fn default() -> Self {
        Self::new(0.1, 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    pub scale_extent: ScaleExtent,
    pub focus_scale: f32,
    pub focus_duration: Duration,
    pub easing: Easing,
    pub initial_scale: f32,
    pub initial_offset_y: f32,
    pub click_threshold: f32,
    pub zoom_step: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            scale_extent: ScaleExtent::default(),
            focus_scale: 1.0,
            focus_duration: Duration::from_millis(750),
            easing: Easing::CubicInOut,
            initial_scale: 0.85,
            initial_offset_y: 100.0,
            click_threshold: 3.0,
            zoom_step: 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub start_pan: Vec2,
    pub start_pos: Vec2,
    /// Set once the pointer has travelled past the click threshold.
    pub moved: bool,
}

#[derive(Debug, Clone)]
pub enum ViewportState {
    Idle,
    Panning(DragState),
    Animating(FocusAnimation),
}

/// Result of advancing the controller by one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum TickStatus {
    /// No animation in flight.
    Idle,
    Running,
    /// The animation landed on its target this frame.
    Finished(MemberId),
}

/// Scale factor for a wheel delta; positive `delta_y` zooms out.
pub fn wheel_zoom_factor(delta_y: f32) -> f32 {
    2f32.powf(-delta_y * 0.002)
}

pub struct ViewportController {
    transform: ViewportTransform,
    state: ViewportState,
    viewport: ViewportSize,
    config: ControllerConfig,
}

impl ViewportController {
    pub fn new(config: ControllerConfig, viewport: ViewportSize) -> Self {
        let mut controller = Self {
            transform: ViewportTransform::IDENTITY,
            state: ViewportState::Idle,
            viewport,
            config,
        };
        controller.transform = controller.initial_transform();
        controller
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, ViewportState::Animating(_))
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.state, ViewportState::Panning(_))
    }

    /// Root column centered horizontally, slightly below the top edge.
    pub fn initial_transform(&self) -> ViewportTransform {
        ViewportTransform::new(
            self.viewport.width / 2.0,
            self.config.initial_offset_y,
            self.config.scale_extent.clamp(self.config.initial_scale),
        )
    }

    /// Host-supplied transform; the scale is clamped and any gesture or
    /// animation is dropped.
    pub fn set_transform(&mut self, transform: ViewportTransform) {
        self.state = ViewportState::Idle;
        self.transform = ViewportTransform {
            scale: self.config.scale_extent.clamp(transform.scale),
            ..transform
        };
    }

    pub fn reset(&mut self) {
        self.state = ViewportState::Idle;
        self.transform = self.initial_transform();
    }

    /// The transform is left alone so content does not jump on resize.
    pub fn resize(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
    }

    // Pointer gestures

    /// Background press. Returns `true` when a pan gesture started.
    pub fn pointer_down(&mut self, pos: Vec2) -> bool {
        if self.is_animating() {
            return false;
        }
        self.state = ViewportState::Panning(DragState {
            start_pan: self.transform.translation(),
            start_pos: pos,
            moved: false,
        });
        true
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        let ViewportState::Panning(drag) = &mut self.state else {
            return;
        };
        let delta = pos - drag.start_pos;
        if delta.length() > self.config.click_threshold {
            drag.moved = true;
        }
        let translation = drag.start_pan + delta;
        self.transform = self.transform.with_translation(translation);
    }

    /// End a pan gesture. Returns `true` when the press should count as a
    /// background click.
    pub fn pointer_up(&mut self, pos: Vec2) -> bool {
        let ViewportState::Panning(drag) = self.state else {
            return false;
        };
        self.state = ViewportState::Idle;
        !drag.moved && (pos - drag.start_pos).length() <= self.config.click_threshold
    }

    /// Abandon a pan without producing a click.
    pub fn pointer_leave(&mut self) {
        if self.is_panning() {
            self.state = ViewportState::Idle;
        }
    }

    /// Zoom by `factor` keeping the layout point under `pos` fixed. Ends any
    /// pan in progress without a click.
    pub fn wheel(&mut self, pos: Vec2, factor: f32) {
        if self.is_animating() {
            return;
        }
        self.zoom_about(pos, factor);
        self.state = ViewportState::Idle;
    }

    // Zoom commands

    pub fn zoom_in(&mut self) {
        if !self.is_animating() {
            self.zoom_about(self.viewport.center(), self.config.zoom_step);
        }
    }

    pub fn zoom_out(&mut self) {
        if !self.is_animating() {
            self.zoom_about(self.viewport.center(), 1.0 / self.config.zoom_step);
        }
    }

    /// Back to scale 1.0 about the viewport center.
    pub fn zoom_reset(&mut self) {
        if !self.is_animating() {
            let factor = 1.0 / self.transform.scale;
            self.zoom_about(self.viewport.center(), factor);
        }
    }

    /// Fit `bounds` (layout space) into the viewport with `padding` pixels
    /// on every side.
    pub fn zoom_to_fit(&mut self, bounds: Rect, padding: f32) {
        if self.is_animating() {
            return;
        }
        let padded = bounds.expand(padding.max(0.0));
        if padded.width() <= 0.0 || padded.height() <= 0.0 {
            return;
        }
        let scale = (self.viewport.width / padded.width())
            .min(self.viewport.height / padded.height());
        let scale = self.config.scale_extent.clamp(scale);
        self.state = ViewportState::Idle;
        self.transform = ViewportTransform::centered_on(padded.center(), scale, self.viewport);
    }

    fn zoom_about(&mut self, anchor: Vec2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let prev_scale = self.transform.scale;
        let new_scale = self.config.scale_extent.clamp(prev_scale * factor);
        if (new_scale - prev_scale).abs() <= f32::EPSILON {
            return;
        }
        let layout_pos = self.transform.invert(anchor);
        self.transform = ViewportTransform {
            translate_x: anchor.x - layout_pos.x * new_scale,
            translate_y: anchor.y - layout_pos.y * new_scale,
            scale: new_scale,
        };
    }

    // Focus

    /// Start an animated transition that centers `id` at the focus scale.
    ///
    /// An unknown id leaves the controller untouched.
    pub fn focus_node(&mut self, id: &str, tree: &PositionedTree) -> Result<(), FocusError> {
        let node = tree
            .get(id)
            .ok_or_else(|| FocusError::NodeNotFound(MemberId::from(id)))?;
        self.focus_on(node.id().clone(), node.position);
        Ok(())
    }

    /// Animate toward `position` from the current (possibly in-flight)
    /// transform.
    pub fn focus_on(&mut self, id: MemberId, position: Vec2) {
        let scale = self.config.scale_extent.clamp(self.config.focus_scale);
        let target = ViewportTransform::centered_on(position, scale, self.viewport);
        tracing::debug!(
            "Focusing {} at ({}, {}) -> {:?}",
            id,
            position.x,
            position.y,
            target
        );
        self.state = ViewportState::Animating(FocusAnimation::new(
            id,
            self.transform,
            target,
            self.config.focus_duration,
            self.config.easing,
        ));
    }

    /// Follow a replaced layout: an in-flight focus retargets to its node's
    /// new position, or stops where it is when the node is gone.
    /// Returns `true` when an animation is still running afterwards.
    pub fn retarget(&mut self, tree: &PositionedTree) -> bool {
        let ViewportState::Animating(anim) = &self.state else {
            return false;
        };
        let target = anim.target_id.clone();
        match tree.get(target.as_str()) {
            Some(node) => {
                self.focus_on(target, node.position);
                true
            }
            None => {
                tracing::debug!("Focus target {} vanished; stopping", target);
                self.state = ViewportState::Idle;
                false
            }
        }
    }

    pub fn tick(&mut self, dt: Duration) -> TickStatus {
        let ViewportState::Animating(anim) = &mut self.state else {
            return TickStatus::Idle;
        };
        self.transform = anim.advance(dt);
        if !anim.is_finished() {
            return TickStatus::Running;
        }
        let id = anim.target_id.clone();
        self.transform = anim.to;
        self.state = ViewportState::Idle;
        TickStatus::Finished(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clantree_core::MemberRecord;
    use clantree_graph::{HierarchyBuilder, NodeSpacing, layout};
    use proptest::prelude::*;

    fn controller() -> ViewportController {
        ViewportController::new(ControllerConfig::default(), ViewportSize::new(800.0, 600.0))
    }

    fn abc_tree() -> PositionedTree {
        let records = vec![
            MemberRecord::new("A", "A"),
            MemberRecord::new("B", "B").with_parent("A"),
            MemberRecord::new("C", "C").with_parent("A"),
        ];
        let hierarchy = HierarchyBuilder::build(&records).unwrap();
        layout(&hierarchy, NodeSpacing::new(100.0, 150.0))
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_initial_transform() {
        let c = controller();
        assert_eq!(c.transform(), ViewportTransform::new(400.0, 100.0, 0.85));
        assert!(matches!(c.state(), ViewportState::Idle));
    }

    #[test]
    fn test_pan_moves_translation() {
        let mut c = controller();
        let start = c.transform();
        assert!(c.pointer_down(Vec2::new(100.0, 100.0)));
        c.pointer_move(Vec2::new(130.0, 80.0));
        assert!(!c.pointer_up(Vec2::new(130.0, 80.0)));

        let t = c.transform();
        assert_eq!(t.translate_x, start.translate_x + 30.0);
        assert_eq!(t.translate_y, start.translate_y - 20.0);
        assert_eq!(t.scale, start.scale);
    }

    #[test]
    fn test_small_travel_is_a_click() {
        let mut c = controller();
        c.pointer_down(Vec2::new(10.0, 10.0));
        c.pointer_move(Vec2::new(11.0, 11.0));
        assert!(c.pointer_up(Vec2::new(11.0, 11.0)));
        assert!(matches!(c.state(), ViewportState::Idle));
    }

    #[test]
    fn test_drag_back_to_start_is_not_a_click() {
        let mut c = controller();
        c.pointer_down(Vec2::new(10.0, 10.0));
        c.pointer_move(Vec2::new(60.0, 10.0));
        c.pointer_move(Vec2::new(10.0, 10.0));
        assert!(!c.pointer_up(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn test_pointer_leave_cancels_pan() {
        let mut c = controller();
        c.pointer_down(Vec2::new(10.0, 10.0));
        c.pointer_leave();
        assert!(!c.is_panning());
        assert!(!c.pointer_up(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn test_wheel_zoom_keeps_cursor_point_fixed() {
        let mut c = controller();
        let cursor = Vec2::new(250.0, 420.0);
        let before = c.transform().invert(cursor);
        c.wheel(cursor, 1.5);
        let after = c.transform().invert(cursor);
        assert!(approx(before.x, after.x));
        assert!(approx(before.y, after.y));
        assert!(approx(c.transform().scale, 0.85 * 1.5));
    }

    #[test]
    fn test_wheel_during_pan_returns_to_idle() {
        let mut c = controller();
        c.pointer_down(Vec2::new(100.0, 100.0));
        c.wheel(Vec2::new(100.0, 100.0), 1.5);
        assert!(matches!(c.state(), ViewportState::Idle));
        let zoomed = c.transform();

        c.pointer_move(Vec2::new(120.0, 100.0));
        assert_eq!(c.transform(), zoomed);
        assert!(!c.pointer_up(Vec2::new(100.0, 100.0)));
    }

    #[test]
    fn test_inverted_scale_extent_does_not_panic() {
        let extent = ScaleExtent {
            min: 2.0,
            max: 0.1,
        };
        assert_eq!(extent.clamp(5.0), 2.0);
        assert_eq!(extent.clamp(0.01), 0.1);
        assert_eq!(extent.clamp(0.85), 0.85);

        let config = ControllerConfig {
            scale_extent: extent,
            ..ControllerConfig::default()
        };
        let mut c = ViewportController::new(config, ViewportSize::new(800.0, 600.0));
        assert_eq!(c.transform().scale, 0.85);
        c.wheel(Vec2::new(400.0, 300.0), 10.0);
        assert_eq!(c.transform().scale, 2.0);
    }

    #[test]
    fn test_scale_is_clamped() {
        let mut c = controller();
        for _ in 0..50 {
            c.wheel(Vec2::new(0.0, 0.0), 2.0);
        }
        assert_eq!(c.transform().scale, 2.0);
        for _ in 0..50 {
            c.zoom_out();
        }
        assert_eq!(c.transform().scale, 0.1);
    }

    #[test]
    fn test_zoom_reset_returns_to_unit_scale() {
        let mut c = controller();
        c.zoom_in();
        c.zoom_reset();
        assert!(approx(c.transform().scale, 1.0));
    }

    #[test]
    fn test_wheel_zoom_factor_direction() {
        assert!(wheel_zoom_factor(100.0) < 1.0);
        assert!(wheel_zoom_factor(-100.0) > 1.0);
        assert_eq!(wheel_zoom_factor(0.0), 1.0);
        assert!(approx(wheel_zoom_factor(500.0), 0.5));
    }

    #[test]
    fn test_zoom_to_fit_centers_bounds() {
        let mut c = controller();
        let bounds = Rect::from_min_max(Vec2::new(-400.0, 0.0), Vec2::new(400.0, 300.0));
        c.zoom_to_fit(bounds, 0.0);
        let t = c.transform();
        assert!(approx(t.scale, 1.0));
        let center = t.apply(bounds.center());
        assert!(approx(center.x, 400.0));
        assert!(approx(center.y, 300.0));
    }

    #[test]
    fn test_focus_lands_on_node() {
        let tree = abc_tree();
        let mut c = controller();
        c.focus_node("B", &tree).unwrap();
        assert!(c.is_animating());

        assert_eq!(c.tick(Duration::from_millis(400)), TickStatus::Running);
        assert_eq!(
            c.tick(Duration::from_millis(400)),
            TickStatus::Finished(MemberId::from("B"))
        );
        assert_eq!(c.transform(), ViewportTransform::new(450.0, 150.0, 1.0));
        assert_eq!(c.tick(Duration::from_millis(16)), TickStatus::Idle);
    }

    #[test]
    fn test_focus_unknown_node_is_noop() {
        let tree = abc_tree();
        let mut c = controller();
        let before = c.transform();
        let err = c.focus_node("Z", &tree).unwrap_err();
        assert_eq!(err, FocusError::NodeNotFound(MemberId::from("Z")));
        assert_eq!(c.transform(), before);
        assert!(!c.is_animating());
    }

    #[test]
    fn test_input_ignored_while_animating() {
        let tree = abc_tree();
        let mut c = controller();
        c.focus_node("C", &tree).unwrap();
        c.tick(Duration::from_millis(100));
        let mid = c.transform();

        assert!(!c.pointer_down(Vec2::new(5.0, 5.0)));
        c.wheel(Vec2::new(5.0, 5.0), 2.0);
        c.zoom_in();
        assert_eq!(c.transform(), mid);
        assert!(c.is_animating());
    }

    #[test]
    fn test_refocus_starts_from_in_flight_transform() {
        let tree = abc_tree();
        let mut c = controller();
        c.focus_node("B", &tree).unwrap();
        c.tick(Duration::from_millis(300));
        let mid = c.transform();

        c.focus_node("C", &tree).unwrap();
        let ViewportState::Animating(anim) = c.state() else {
            panic!("expected animation");
        };
        assert_eq!(anim.from, mid);
        assert_eq!(anim.target_id, MemberId::from("C"));
    }

    #[test]
    fn test_retarget_stops_when_node_vanishes() {
        let tree = abc_tree();
        let mut c = controller();
        c.focus_node("B", &tree).unwrap();
        c.tick(Duration::from_millis(200));
        let mid = c.transform();

        let records = vec![MemberRecord::new("A", "A")];
        let smaller = layout(
            &HierarchyBuilder::build(&records).unwrap(),
            NodeSpacing::new(100.0, 150.0),
        );
        assert!(!c.retarget(&smaller));
        assert!(!c.is_animating());
        assert_eq!(c.transform(), mid);
    }

    #[test]
    fn test_retarget_follows_moved_node() {
        let tree = abc_tree();
        let mut c = controller();
        c.focus_node("B", &tree).unwrap();

        let wider = layout(
            &HierarchyBuilder::build(&[
                MemberRecord::new("A", "A"),
                MemberRecord::new("B", "B").with_parent("A"),
                MemberRecord::new("C", "C").with_parent("A"),
            ])
            .unwrap(),
            NodeSpacing::new(300.0, 150.0),
        );
        assert!(c.retarget(&wider));
        let ViewportState::Animating(anim) = c.state() else {
            panic!("expected animation");
        };
        assert_eq!(anim.to, ViewportTransform::new(550.0, 150.0, 1.0));
    }

    #[test]
    fn test_zero_duration_focus_finishes_on_first_tick() {
        let tree = abc_tree();
        let config = ControllerConfig {
            focus_duration: Duration::ZERO,
            ..ControllerConfig::default()
        };
        let mut c = ViewportController::new(config, ViewportSize::new(800.0, 600.0));
        c.focus_node("C", &tree).unwrap();
        assert_eq!(
            c.tick(Duration::ZERO),
            TickStatus::Finished(MemberId::from("C"))
        );
        assert_eq!(c.transform(), ViewportTransform::new(350.0, 150.0, 1.0));
    }

    proptest! {
        /// **Property: Wheel zoom keeps the layout point under the cursor fixed**
        #[test]
        fn prop_zoom_anchors_cursor(
            x in 0.0f32..800.0,
            y in 0.0f32..600.0,
            factor in 0.5f32..2.0,
        ) {
            let mut c = controller();
            let cursor = Vec2::new(x, y);
            let before = c.transform().invert(cursor);
            c.wheel(cursor, factor);
            let after = c.transform().invert(cursor);
            prop_assert!((before.x - after.x).abs() < 1e-2);
            prop_assert!((before.y - after.y).abs() < 1e-2);
        }

        /// **Property: Scale never leaves the configured extent**
        #[test]
        fn prop_scale_stays_in_extent(factors in prop::collection::vec(0.01f32..100.0, 1..20)) {
            let mut c = controller();
            for f in factors {
                c.wheel(Vec2::new(400.0, 300.0), f);
                let s = c.transform().scale;
                prop_assert!((0.1..=2.0).contains(&s));
            }
        }

        /// **Property: A finished focus centers the node in the viewport**
        #[test]
        fn prop_focus_centers_node(
            x in -5000.0f32..5000.0,
            y in -5000.0f32..5000.0,
            w in 100.0f32..2000.0,
            h in 100.0f32..2000.0,
        ) {
            let mut c = ViewportController::new(ControllerConfig::default(), ViewportSize::new(w, h));
            c.focus_on(MemberId::from("N"), Vec2::new(x, y));
            while c.tick(Duration::from_millis(16)) == TickStatus::Running {}
            let screen = c.transform().apply(Vec2::new(x, y));
            prop_assert!((screen.x - w / 2.0).abs() < 1e-2);
            prop_assert!((screen.y - h / 2.0).abs() < 1e-2);
        }
    }
}
