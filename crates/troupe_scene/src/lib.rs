//! Troupe Scene Graph
//!
//! The retained-mode actor tree and its frame driver:
//!
//! - **Actors**: positionable, paintable nodes with transform
//!   inheritance, depth-ordered painting, per-actor clips, and capability
//!   modifiers (actions, constraints, effects)
//! - **Stage**: the root actor owning the arena, paint traversal, hit
//!   testing, and input dispatch
//! - **Behaviours**: eased timeline progress written into named actor
//!   properties
//! - **Master Clock**: the per-display scheduler advancing every playing
//!   timeline once per tick, painting dirty stages, and backing off the
//!   frame source when nothing animates
//!
//! Everything runs on one thread, cooperatively: notifications are
//! synchronous callbacks, and sets that can be mutated from inside a
//! notification are snapshotted before iteration.
//!
//! # Example
//!
//! ```rust
//! use troupe_animation::{Alpha, Easing, Timeline};
//! use troupe_core::{Color, Size};
//! use troupe_scene::{Actor, Behaviour, MasterClock, StageHandle};
//!
//! let clock = MasterClock::default();
//! let stage = StageHandle::new(Size::new(800.0, 600.0));
//! clock.add_stage(&stage);
//!
//! let actor = {
//!     let mut s = stage.borrow_mut();
//!     let actor = s.create_actor(Actor::rectangle(Color::WHITE).with_size(50.0, 50.0));
//!     let root = s.root();
//!     s.add_child(root, actor).unwrap();
//!     actor
//! };
//!
//! // Slide the actor to x = 100 over one second.
//! let timeline = clock.add_timeline(Timeline::new(1000).unwrap());
//! clock
//!     .add_behaviour(
//!         Behaviour::new(Alpha::new(timeline, Easing::EaseOutQuad))
//!             .bind_x(&stage, actor, 0.0, 100.0),
//!     )
//!     .unwrap();
//! clock.start_timeline(timeline).unwrap();
//!
//! // Driven by the embedder's frame loop:
//! clock.tick(0.0);
//! clock.tick(16.0);
//! ```

pub mod actor;
pub mod backend;
pub mod behaviour;
pub mod clock;
pub mod error;
pub mod modifier;
pub mod stage;

pub use actor::{Actor, ActorId, ActorKind, Content};
pub use backend::{FrameSource, PaintBackend, PaintError, PaintNode};
pub use behaviour::{Behaviour, BehaviourId};
pub use clock::{ClockConfig, ClockHandle, ClockState, MasterClock};
pub use error::{Result, SceneError};
pub use modifier::{
    Action, ActionContext, ActorGeometry, AlignAxis, AlignConstraint, BindConstraint,
    BindCoordinate, Constraint, ConstraintContext, DimEffect, Effect,
};
pub use stage::{Stage, StageHandle};
