//! Behaviours: eased timeline progress driven into actor properties.
//!
//! A behaviour pairs an [`Alpha`] with an ordered set of bindings, each
//! naming a stage actor, a property key, and the [`Interval`] to animate
//! across. On every relevant timeline frame the master clock computes the
//! behaviour's eased value once and writes the interpolated value into
//! each binding through the stage's named-property entry point.
//!
//! Multiple behaviours may target the same actor property; they apply in
//! clock registration order, so the last-registered behaviour wins. The
//! clock snapshots behaviours (bindings included) at the start of each
//! dispatch, so unbinding a target mid-frame never disturbs a
//! notification loop already in progress.

use std::cell::RefCell;
use std::rc::Weak;

use tracing::warn;
use troupe_animation::{Alpha, Interval};

use crate::actor::ActorId;
use crate::stage::{Stage, StageHandle};

/// Identifier for a behaviour registered with a master clock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BehaviourId(pub u64);

#[derive(Clone)]
struct Binding {
    stage: Weak<RefCell<Stage>>,
    actor: ActorId,
    key: String,
    interval: Interval,
}

/// Binds eased timeline progress to actor properties
#[derive(Clone)]
pub struct Behaviour {
    alpha: Alpha,
    bindings: Vec<Binding>,
}

impl Behaviour {
    pub fn new(alpha: Alpha) -> Self {
        Self {
            alpha,
            bindings: Vec::new(),
        }
    }

    pub fn alpha(&self) -> &Alpha {
        &self.alpha
    }

    /// Number of property bindings
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Bind a target actor property (builder form)
    pub fn bind(
        mut self,
        stage: &StageHandle,
        actor: ActorId,
        key: impl Into<String>,
        interval: Interval,
    ) -> Self {
        self.bind_mut(stage, actor, key, interval);
        self
    }

    /// Bind a target actor property in place
    pub fn bind_mut(
        &mut self,
        stage: &StageHandle,
        actor: ActorId,
        key: impl Into<String>,
        interval: Interval,
    ) {
        self.bindings.push(Binding {
            stage: stage.downgrade(),
            actor,
            key: key.into(),
            interval,
        });
    }

    /// Remove one binding. Returns false if no binding matched.
    pub fn unbind(&mut self, actor: ActorId, key: &str) -> bool {
        let before = self.bindings.len();
        self.bindings
            .retain(|binding| !(binding.actor == actor && binding.key == key));
        self.bindings.len() != before
    }

    /// Remove every binding targeting an actor. Returns how many were
    /// removed.
    pub fn remove_actor(&mut self, actor: ActorId) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|binding| binding.actor != actor);
        before - self.bindings.len()
    }

    // Convenience channels over the generic binding.

    pub fn bind_x(self, stage: &StageHandle, actor: ActorId, from: f32, to: f32) -> Self {
        self.bind(stage, actor, "x", float_interval(from, to))
    }

    pub fn bind_y(self, stage: &StageHandle, actor: ActorId, from: f32, to: f32) -> Self {
        self.bind(stage, actor, "y", float_interval(from, to))
    }

    pub fn bind_depth(self, stage: &StageHandle, actor: ActorId, from: f32, to: f32) -> Self {
        self.bind(stage, actor, "depth", float_interval(from, to))
    }

    pub fn bind_rotation(self, stage: &StageHandle, actor: ActorId, from: f32, to: f32) -> Self {
        self.bind(stage, actor, "rotation", float_interval(from, to))
    }

    pub fn bind_opacity(self, stage: &StageHandle, actor: ActorId, from: u8, to: u8) -> Self {
        self.bind(stage, actor, "opacity", float_interval(from as f32, to as f32))
    }

    /// Bind both scale axes to the same range
    pub fn bind_scale(self, stage: &StageHandle, actor: ActorId, from: f32, to: f32) -> Self {
        self.bind(stage, actor, "scale-x", float_interval(from, to))
            .bind(stage, actor, "scale-y", float_interval(from, to))
    }

    /// Write the interpolated value for `eased` into every binding.
    ///
    /// Bindings whose stage or actor has died are skipped with a warning;
    /// one bad target never stops the rest.
    pub(crate) fn apply(&self, eased: f32) {
        for binding in &self.bindings {
            let Some(stage) = binding.stage.upgrade() else {
                warn!(key = %binding.key, "behaviour target stage is gone; skipping");
                continue;
            };
            let Ok(mut stage) = stage.try_borrow_mut() else {
                warn!(key = %binding.key, "stage busy during behaviour application; skipping");
                continue;
            };
            let value = binding.interval.lerp(eased);
            if let Err(err) = stage.set_actor_property(binding.actor, &binding.key, value) {
                warn!(key = %binding.key, error = %err, "behaviour target skipped");
            }
        }
    }
}

fn float_interval(from: f32, to: f32) -> Interval {
    Interval::new(from, to).expect("float endpoints share a kind")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use troupe_animation::{Easing, TimelineId};
    use troupe_core::{Color, PropertyValue, Size};

    fn stage_with_actor() -> (StageHandle, ActorId) {
        let stage = StageHandle::new(Size::new(800.0, 600.0));
        let actor = {
            let mut s = stage.borrow_mut();
            let actor = s.create_actor(Actor::rectangle(Color::WHITE).with_size(10.0, 10.0));
            let root = s.root();
            s.add_child(root, actor).unwrap();
            actor
        };
        (stage, actor)
    }

    #[test]
    fn test_apply_writes_interpolated_values() {
        let (stage, actor) = stage_with_actor();
        let behaviour = Behaviour::new(Alpha::new(TimelineId(1), Easing::Linear))
            .bind_x(&stage, actor, 0.0, 100.0)
            .bind_opacity(&stage, actor, 0, 255);

        behaviour.apply(0.5);

        assert_eq!(
            stage.borrow().actor_property(actor, "x").unwrap(),
            PropertyValue::Float(50.0)
        );
        assert_eq!(
            stage.borrow().actor(actor).unwrap().opacity(),
            128
        );
    }

    #[test]
    fn test_apply_skips_dead_targets() {
        let (stage, actor) = stage_with_actor();
        let behaviour = Behaviour::new(Alpha::new(TimelineId(1), Easing::Linear))
            .bind_x(&stage, actor, 0.0, 100.0);

        stage.destroy(actor).unwrap();
        // Must not panic; the stale binding is skipped.
        behaviour.apply(1.0);
    }

    #[test]
    fn test_unbind_and_remove_actor() {
        let (stage, actor) = stage_with_actor();
        let mut behaviour = Behaviour::new(Alpha::new(TimelineId(1), Easing::Linear))
            .bind_x(&stage, actor, 0.0, 100.0)
            .bind_y(&stage, actor, 0.0, 50.0);

        assert_eq!(behaviour.binding_count(), 2);
        assert!(behaviour.unbind(actor, "x"));
        assert!(!behaviour.unbind(actor, "x"));
        assert_eq!(behaviour.remove_actor(actor), 1);
        assert_eq!(behaviour.binding_count(), 0);
    }
}
