//! Error types for troupe_animation

use thiserror::Error;

use crate::timeline::TimelineId;

/// Errors that can occur in the animation engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// Timeline created or resized with a zero duration
    #[error("timeline duration must be greater than zero")]
    InvalidDuration,

    /// Frame rate of zero frames per second
    #[error("frame rate must be greater than zero")]
    InvalidFrameRate,

    /// `advance` called with a negative or non-finite delta
    #[error("invalid advance delta: {0}")]
    InvalidDelta(f64),

    /// Marker position lies outside the timeline's duration
    #[error("marker `{0}` lies outside the timeline")]
    MarkerOutOfRange(String),

    /// A marker with this name already exists
    #[error("marker `{0}` already exists")]
    DuplicateMarker(String),

    /// Interval endpoints have different value kinds
    #[error("interval endpoints have mismatched kinds")]
    IntervalKindMismatch,

    /// The referenced timeline is not registered
    #[error("timeline {0:?} is not registered")]
    UnknownTimeline(TimelineId),

    /// Appending this score edge would create a cycle
    #[error("appending timeline {0:?} would create a cycle")]
    ScoreCycle(TimelineId),

    /// The referenced timeline is not part of this score
    #[error("timeline {0:?} is not part of this score")]
    UnknownScoreTimeline(TimelineId),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
