//! Alphas: an easing bound to one shared timeline.
//!
//! An alpha owns no state beyond its easing selector. Its value is a pure
//! function of the referenced timeline's normalized progress, recomputed
//! on every query; two queries without an intervening advance always
//! agree.

use crate::easing::Easing;
use crate::timeline::{Timeline, TimelineId};

/// Maps one timeline's progress through an easing function
#[derive(Clone, Debug)]
pub struct Alpha {
    timeline: TimelineId,
    easing: Easing,
}

impl Alpha {
    pub fn new(timeline: TimelineId, easing: Easing) -> Self {
        Self { timeline, easing }
    }

    /// The timeline this alpha follows (shared, not owned)
    pub fn timeline(&self) -> TimelineId {
        self.timeline
    }

    pub fn easing(&self) -> &Easing {
        &self.easing
    }

    /// Eased value for a normalized progress in [0, 1]
    pub fn value_at(&self, progress: f64) -> f32 {
        self.easing.apply(progress as f32)
    }

    /// Eased value for a timeline's current position.
    ///
    /// The caller resolves the [`TimelineId`] to the timeline; a master
    /// clock does this through its registry.
    pub fn value_for(&self, timeline: &Timeline) -> f32 {
        self.value_at(timeline.progress())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::Timeline;

    #[test]
    fn test_value_follows_timeline_progress() {
        let mut tl = Timeline::new(1000).unwrap();
        let alpha = Alpha::new(TimelineId(1), Easing::Linear);

        tl.start();
        tl.advance(250.0).unwrap();
        assert!((alpha.value_for(&tl) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_value_is_idempotent_between_advances() {
        let mut tl = Timeline::new(1000).unwrap();
        let alpha = Alpha::new(TimelineId(1), Easing::EaseInOutQuad);

        tl.start();
        tl.advance(333.0).unwrap();
        let first = alpha.value_for(&tl);
        let second = alpha.value_for(&tl);
        assert_eq!(first, second);
    }

    #[test]
    fn test_easing_is_applied() {
        let mut tl = Timeline::new(1000).unwrap();
        let alpha = Alpha::new(TimelineId(1), Easing::EaseInQuad);

        tl.start();
        tl.advance(500.0).unwrap();
        assert!((alpha.value_for(&tl) - 0.25).abs() < 1e-6);
    }
}
