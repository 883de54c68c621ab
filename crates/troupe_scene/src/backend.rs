//! Backend traits at the edge of the core.
//!
//! The scene graph draws nothing itself: during traversal it resolves each
//! actor into a [`PaintNode`] and hands it to the embedder's
//! [`PaintBackend`]. Frame pacing flows the other way: the master clock
//! tells the external tick driver to stop delivering ticks through
//! [`FrameSource`] when nothing is animating.

use thiserror::Error;
use troupe_core::{Affine2D, Rect, Size};

use crate::actor::{ActorId, ActorKind};

/// A fully-resolved actor ready to paint.
///
/// Transform, opacity, and clip are effective values: composed down the
/// tree at traversal time, never cached on the actor.
pub struct PaintNode<'a> {
    pub actor: ActorId,
    pub name: Option<&'a str>,
    pub kind: &'a ActorKind,
    /// Constraint-resolved allocation in local coordinates
    pub size: Size,
    /// Local-to-stage transform
    pub transform: Affine2D,
    /// Effective opacity in [0, 1]
    pub opacity: f32,
    /// Effective clip as a stage-space bounding rect, if any ancestor or
    /// the actor itself clips
    pub clip: Option<Rect>,
}

/// Failure reported by a backend for one actor.
///
/// A paint error is isolated to the failing actor: the traversal logs it
/// and continues with siblings and children.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("paint failed: {0}")]
pub struct PaintError(pub String);

/// The GPU/paint collaborator invoked during stage traversal
pub trait PaintBackend {
    fn begin_frame(&mut self, _stage_size: Size) {}

    /// Paint one resolved actor into the current target
    fn paint(&mut self, node: &PaintNode<'_>) -> Result<(), PaintError>;

    fn end_frame(&mut self) {}
}

/// The frame-clock collaborator driving [`MasterClock::tick`].
///
/// [`MasterClock::tick`]: crate::clock::MasterClock::tick
pub trait FrameSource {
    /// Enable or disable tick delivery. The clock calls this with `false`
    /// when it goes idle and `true` when animation resumes.
    fn set_running(&mut self, running: bool);
}
