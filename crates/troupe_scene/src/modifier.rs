//! Capability modifiers attached to actors.
//!
//! Three trait families cover the extension points the tree applies at
//! fixed moments: [`Action`]s receive input after hit testing,
//! [`Constraint`]s adjust an actor's geometry before its transform is
//! composed, and [`Effect`]s rewrite the resolved paint node before it is
//! handed to the backend. All three are stored as trait objects on the
//! actor, in application order.

use troupe_core::{InputEvent, Point, Size};

use crate::actor::ActorId;
use crate::backend::PaintNode;
use crate::stage::Stage;

// ─────────────────────────────────────────────────────────────────────────────
// Actions
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable stage access granted to actions during event dispatch.
///
/// Destroys requested through the context are deferred until dispatch
/// unwinds, so an action may destroy its own actor.
pub struct ActionContext<'a> {
    pub(crate) stage: &'a mut Stage,
}

impl ActionContext<'_> {
    pub fn stage(&mut self) -> &mut Stage {
        self.stage
    }
}

/// Input handling attached to an actor
pub trait Action {
    /// Handle an event delivered to `actor`. Return true to consume it and
    /// stop the remaining actions on this actor from running.
    fn handle(&mut self, ctx: &mut ActionContext<'_>, actor: ActorId, event: &InputEvent) -> bool;
}

// ─────────────────────────────────────────────────────────────────────────────
// Constraints
// ─────────────────────────────────────────────────────────────────────────────

/// The geometry a constraint may adjust
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorGeometry {
    pub position: Point,
    pub size: Size,
}

/// Read-only view of the stage during constraint resolution
pub struct ConstraintContext<'a> {
    pub(crate) stage: &'a Stage,
}

impl ConstraintContext<'_> {
    /// Unconstrained position of another actor
    pub fn actor_position(&self, id: ActorId) -> Option<Point> {
        self.stage.actor(id).map(|actor| actor.position())
    }

    pub fn actor_size(&self, id: ActorId) -> Option<Size> {
        self.stage.actor(id).map(|actor| actor.size())
    }
}

/// Geometry adjustment applied before an actor's transform is composed.
///
/// Constraints run in attachment order; each sees the previous one's
/// output. A constraint whose source actor has been destroyed leaves the
/// geometry untouched.
pub trait Constraint {
    fn apply(&self, ctx: &ConstraintContext<'_>, geometry: &mut ActorGeometry);
}

/// Axis selector for [`AlignConstraint`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignAxis {
    X,
    Y,
    Both,
}

/// Positions an actor at a fraction of a source actor's extent.
///
/// Factor 0.0 aligns to the source's near edge, 1.0 to the far edge, 0.5
/// centers.
pub struct AlignConstraint {
    pub source: ActorId,
    pub axis: AlignAxis,
    pub factor: f32,
}

impl Constraint for AlignConstraint {
    fn apply(&self, ctx: &ConstraintContext<'_>, geometry: &mut ActorGeometry) {
        let Some(source_size) = ctx.actor_size(self.source) else {
            return;
        };
        let factor = self.factor.clamp(0.0, 1.0);
        if matches!(self.axis, AlignAxis::X | AlignAxis::Both) {
            geometry.position.x = (source_size.width - geometry.size.width) * factor;
        }
        if matches!(self.axis, AlignAxis::Y | AlignAxis::Both) {
            geometry.position.y = (source_size.height - geometry.size.height) * factor;
        }
    }
}

/// Coordinate channel for [`BindConstraint`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindCoordinate {
    X,
    Y,
}

/// Copies a coordinate from a source actor, with an offset
pub struct BindConstraint {
    pub source: ActorId,
    pub coordinate: BindCoordinate,
    pub offset: f32,
}

impl Constraint for BindConstraint {
    fn apply(&self, ctx: &ConstraintContext<'_>, geometry: &mut ActorGeometry) {
        let Some(source_position) = ctx.actor_position(self.source) else {
            return;
        };
        match self.coordinate {
            BindCoordinate::X => geometry.position.x = source_position.x + self.offset,
            BindCoordinate::Y => geometry.position.y = source_position.y + self.offset,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Effects
// ─────────────────────────────────────────────────────────────────────────────

/// Paint-time rewrite of an actor's resolved paint node.
///
/// Effects run in attachment order after transform, opacity, and clip have
/// been derived, and only affect the actor itself; children inherit the
/// unmodified values.
pub trait Effect {
    fn apply(&self, node: &mut PaintNode<'_>);
}

/// Multiplies the actor's effective opacity
pub struct DimEffect {
    pub factor: f32,
}

impl Effect for DimEffect {
    fn apply(&self, node: &mut PaintNode<'_>) {
        node.opacity = (node.opacity * self.factor).clamp(0.0, 1.0);
    }
}
