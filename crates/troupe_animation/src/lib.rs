//! Troupe Animation Engine
//!
//! Time-driven property animation for the Troupe scene graph:
//!
//! - **Timelines**: monotonic progress counters with duration, direction,
//!   repeat, auto-reverse, and named markers
//! - **Easing**: interpolation curves from linear through cubic-bezier
//! - **Intervals**: typed endpoint pairs interpolated by eased progress
//! - **Alphas**: an easing bound to one shared timeline
//! - **Scores**: dependency graphs sequencing multiple timelines
//!
//! A [`Timeline`] does not observe wall time on its own; the master clock
//! (or a test) feeds it elapsed deltas through [`Timeline::advance`] and
//! dispatches the returned [`TimelineEvent`]s. One `NewFrame` event is
//! emitted per integral frame traversed (never just the final frame), so
//! observers that apply per-frame side effects see every intermediate step
//! even under large deltas.

pub mod alpha;
pub mod easing;
pub mod error;
pub mod interval;
pub mod score;
pub mod timeline;

pub use alpha::Alpha;
pub use easing::Easing;
pub use error::{AnimationError, Result};
pub use interval::{Interpolate, Interval};
pub use score::{Score, ScoreId, Trigger};
pub use timeline::{
    Direction, Repeat, Timeline, TimelineEvent, TimelineEvents, TimelineId, TimelineState,
};
