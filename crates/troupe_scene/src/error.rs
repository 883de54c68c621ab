//! Error types for troupe_scene

use thiserror::Error;
use troupe_animation::{AnimationError, ScoreId};
use troupe_core::PropertyError;

use crate::actor::ActorId;

/// Errors that can occur in the scene graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The actor id does not resolve: it was destroyed or never existed
    #[error("actor {0:?} is stale or destroyed")]
    StaleActor(ActorId),

    /// The actor is not a child of the given parent
    #[error("actor {0:?} is not a child of the given parent")]
    NotAChild(ActorId),

    /// Reparenting an ancestor under its own descendant
    #[error("reparenting actor {0:?} would create a cycle")]
    WouldCycle(ActorId),

    /// The stage root cannot be reparented
    #[error("the stage root cannot be reparented")]
    RootReparent,

    /// The stage root cannot be destroyed
    #[error("the stage root cannot be destroyed")]
    RootDestroy,

    /// The referenced score is not registered with this clock
    #[error("score {0:?} is not registered")]
    UnknownScore(ScoreId),

    /// Named property access failed
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// Animation engine error surfaced through the master clock
    #[error(transparent)]
    Animation(#[from] AnimationError),
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
