use crate::easing::Easing;
use crate::transform::ViewportTransform;
use clantree_core::MemberId;
use std::time::Duration;

/// Eased interpolation from one transform to another, advanced per frame.
#[derive(Debug, Clone)]
pub struct FocusAnimation {
    pub target_id: MemberId,
    pub from: ViewportTransform,
    pub to: ViewportTransform,
    elapsed: Duration,
    duration: Duration,
    easing: Easing,
}

impl FocusAnimation {
    pub fn new(
        target_id: MemberId,
        from: ViewportTransform,
        to: ViewportTransform,
        duration: Duration,
        easing: Easing,
    ) -> Self {
        Self {
            target_id,
            from,
            to,
            elapsed: Duration::ZERO,
            duration,
            easing,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Linear progress in `[0, 1]`; a zero duration is complete at once.
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Transform at the current progress. Lands exactly on `to` when done.
    pub fn current(&self) -> ViewportTransform {
        if self.is_finished() {
            return self.to;
        }
        self.from.lerp(&self.to, self.easing.apply(self.progress()))
    }

    pub fn advance(&mut self, dt: Duration) -> ViewportTransform {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.current()
    }
}
