//! The stage: root of an actor tree and per-frame paint driver.
//!
//! A [`Stage`] owns its actors in a generational arena. Tree edits,
//! property writes, and destruction all go through the stage so repaints
//! are scheduled and invariants hold: an actor has at most one parent,
//! reparenting is detach-then-attach in one operation, and destroying a
//! subtree invalidates every outstanding [`ActorId`] into it.
//!
//! Destruction requested while a traversal is on the stack (paint or
//! event dispatch) lands in a pending set and is applied when the
//! traversal unwinds. "Destroyed" notifications are queued rather than
//! fired inline; [`StageHandle`] methods and the master clock drain the
//! queue once no borrows are held, so observers are free to re-enter the
//! stage.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use slotmap::SlotMap;
use smallvec::SmallVec;
use tracing::warn;
use troupe_core::{
    Affine2D, Handlers, InputEvent, Point, PropertyTarget, PropertyValue, Rect, Size, Vec2,
};

use crate::actor::{Actor, ActorId};
use crate::backend::{PaintBackend, PaintNode};
use crate::error::{Result, SceneError};
use crate::modifier::{Action, ActionContext, ActorGeometry, Constraint, ConstraintContext, Effect};

/// The root actor and paint/event entry point of one scene
pub struct Stage {
    actors: SlotMap<ActorId, Actor>,
    root: ActorId,
    size: Size,
    pending_repaint: bool,
    traversal_depth: u32,
    pending_destroy: Vec<ActorId>,
    destroyed: Rc<Handlers<ActorId>>,
    notify_queue: Vec<ActorId>,
    redraw_hook: Option<Rc<dyn Fn()>>,
    backend: Option<Box<dyn PaintBackend>>,
}

impl Stage {
    pub fn new(size: Size) -> Self {
        let mut actors = SlotMap::with_key();
        let root = actors.insert(
            Actor::group()
                .with_name("stage")
                .with_size(size.width, size.height),
        );
        Self {
            actors,
            root,
            size,
            pending_repaint: true,
            traversal_depth: 0,
            pending_destroy: Vec::new(),
            destroyed: Rc::new(Handlers::new()),
            notify_queue: Vec::new(),
            redraw_hook: None,
            backend: None,
        }
    }

    pub fn root(&self) -> ActorId {
        self.root
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
        if let Some(root) = self.actors.get_mut(self.root) {
            root.size = size;
        }
        self.mark_dirty();
    }

    /// Install the paint backend used by [`Stage::paint_frame`]
    pub fn set_backend(&mut self, backend: Box<dyn PaintBackend>) {
        self.backend = Some(backend);
    }

    pub(crate) fn set_redraw_hook(&mut self, hook: Rc<dyn Fn()>) {
        self.redraw_hook = Some(hook);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Actor lifecycle and tree edits
    // ─────────────────────────────────────────────────────────────────────

    /// Insert an actor into the arena, unparented.
    ///
    /// Attach it with [`Stage::add_child`]; until then it is neither
    /// painted nor pickable.
    pub fn create_actor(&mut self, actor: Actor) -> ActorId {
        self.actors.insert(actor)
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.actors.contains_key(actor)
    }

    pub fn actor(&self, actor: ActorId) -> Option<&Actor> {
        self.actors.get(actor)
    }

    /// Number of live actors, including the root
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Attach `child` to `parent`, appending it to the sibling order.
    ///
    /// A child already parented elsewhere is reparented atomically:
    /// detached from its old parent and attached here in one operation.
    pub fn add_child(&mut self, parent: ActorId, child: ActorId) -> Result<()> {
        if !self.actors.contains_key(parent) {
            return Err(SceneError::StaleActor(parent));
        }
        if !self.actors.contains_key(child) {
            return Err(SceneError::StaleActor(child));
        }
        if child == self.root {
            return Err(SceneError::RootReparent);
        }
        // Walking parent's ancestry catches both self-adoption and
        // adopting an ancestor.
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(SceneError::WouldCycle(child));
            }
            cursor = self.actors.get(id).and_then(|actor| actor.parent);
        }

        self.detach(child);
        self.actors[child].parent = Some(parent);
        self.actors[parent].children.push(child);
        self.mark_dirty();
        Ok(())
    }

    /// Attach `child` to `parent` with an explicit paint depth
    pub fn add_child_at_depth(&mut self, parent: ActorId, child: ActorId, depth: f32) -> Result<()> {
        if let Some(actor) = self.actors.get_mut(child) {
            actor.depth = depth;
        }
        self.add_child(parent, child)
    }

    /// Detach `child` from `parent`. The child stays in the arena,
    /// unparented, and can be re-attached later.
    pub fn remove_child(&mut self, parent: ActorId, child: ActorId) -> Result<()> {
        if !self.actors.contains_key(parent) {
            return Err(SceneError::StaleActor(parent));
        }
        let Some(actor) = self.actors.get(child) else {
            return Err(SceneError::StaleActor(child));
        };
        if actor.parent != Some(parent) {
            return Err(SceneError::NotAChild(child));
        }
        self.detach(child);
        self.mark_dirty();
        Ok(())
    }

    fn detach(&mut self, child: ActorId) {
        if let Some(old_parent) = self.actors[child].parent.take() {
            if let Some(parent) = self.actors.get_mut(old_parent) {
                parent.children.retain(|&mut c| c != child);
            }
        }
    }

    /// Destroy an actor and its whole subtree.
    ///
    /// Children are torn down first (post-order) and every removed id
    /// stops resolving before any "destroyed" notification is queued.
    /// Called while a traversal is on the stack, the destroy is deferred
    /// until the traversal unwinds.
    pub fn destroy(&mut self, actor: ActorId) -> Result<()> {
        if !self.actors.contains_key(actor) {
            return Err(SceneError::StaleActor(actor));
        }
        if actor == self.root {
            return Err(SceneError::RootDestroy);
        }
        if self.traversal_depth > 0 {
            if !self.pending_destroy.contains(&actor) {
                self.pending_destroy.push(actor);
            }
            return Ok(());
        }
        self.destroy_now(actor);
        Ok(())
    }

    fn destroy_now(&mut self, actor: ActorId) {
        self.detach(actor);
        let mut order = Vec::new();
        self.collect_post_order(actor, &mut order);
        for &id in &order {
            self.actors.remove(id);
        }
        // Notifications queue only after the full subtree is gone, so no
        // observer can resolve an id into a half-torn-down tree.
        self.notify_queue.extend(order);
        self.mark_dirty();
    }

    fn collect_post_order(&self, actor: ActorId, out: &mut Vec<ActorId>) {
        let children: SmallVec<[ActorId; 4]> = match self.actors.get(actor) {
            Some(a) => a.children.clone(),
            None => return,
        };
        for child in children {
            self.collect_post_order(child, out);
        }
        out.push(actor);
    }

    fn flush_pending_destroy(&mut self) {
        while let Some(actor) = self.pending_destroy.pop() {
            if self.actors.contains_key(actor) {
                self.destroy_now(actor);
            }
        }
    }

    /// Observer list for queued "destroyed" notifications
    pub fn on_actor_destroyed(
        &self,
        callback: impl FnMut(&ActorId) + 'static,
    ) -> troupe_core::HandlerId {
        self.destroyed.connect(callback)
    }

    pub(crate) fn destroyed_handlers(&self) -> Rc<Handlers<ActorId>> {
        self.destroyed.clone()
    }

    /// Drain queued "destroyed" notifications for external dispatch
    pub fn take_destroyed_notifications(&mut self) -> Vec<ActorId> {
        std::mem::take(&mut self.notify_queue)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Property setters
    // ─────────────────────────────────────────────────────────────────────

    fn with_actor_mut<R>(
        &mut self,
        actor: ActorId,
        f: impl FnOnce(&mut Actor) -> R,
    ) -> Result<R> {
        let Some(a) = self.actors.get_mut(actor) else {
            return Err(SceneError::StaleActor(actor));
        };
        let result = f(a);
        self.mark_dirty();
        Ok(result)
    }

    pub fn set_position(&mut self, actor: ActorId, x: f32, y: f32) -> Result<()> {
        self.with_actor_mut(actor, |a| a.position = Point::new(x, y))
    }

    pub fn set_actor_size(&mut self, actor: ActorId, width: f32, height: f32) -> Result<()> {
        self.with_actor_mut(actor, |a| a.size = Size::new(width, height))
    }

    pub fn set_depth(&mut self, actor: ActorId, depth: f32) -> Result<()> {
        self.with_actor_mut(actor, |a| a.depth = depth)
    }

    pub fn set_scale(&mut self, actor: ActorId, sx: f32, sy: f32) -> Result<()> {
        self.with_actor_mut(actor, |a| a.scale = Vec2::new(sx, sy))
    }

    /// Rotation in radians about the actor's anchor point
    pub fn set_rotation(&mut self, actor: ActorId, rotation: f32) -> Result<()> {
        self.with_actor_mut(actor, |a| a.rotation = rotation)
    }

    pub fn set_anchor(&mut self, actor: ActorId, x: f32, y: f32) -> Result<()> {
        self.with_actor_mut(actor, |a| a.anchor = Point::new(x, y))
    }

    pub fn set_opacity(&mut self, actor: ActorId, opacity: u8) -> Result<()> {
        self.with_actor_mut(actor, |a| a.opacity = opacity)
    }

    pub fn set_clip(&mut self, actor: ActorId, clip: Option<Rect>) -> Result<()> {
        self.with_actor_mut(actor, |a| a.clip = clip)
    }

    pub fn show(&mut self, actor: ActorId) -> Result<()> {
        self.with_actor_mut(actor, |a| a.visible = true)
    }

    pub fn hide(&mut self, actor: ActorId) -> Result<()> {
        self.with_actor_mut(actor, |a| a.visible = false)
    }

    pub fn set_reactive(&mut self, actor: ActorId, reactive: bool) -> Result<()> {
        self.with_actor_mut(actor, |a| a.reactive = reactive)
    }

    /// Write a named property (the behaviour/scripting entry point)
    pub fn set_actor_property(
        &mut self,
        actor: ActorId,
        key: &str,
        value: PropertyValue,
    ) -> Result<()> {
        let Some(a) = self.actors.get_mut(actor) else {
            return Err(SceneError::StaleActor(actor));
        };
        a.set_property(key, value)?;
        self.mark_dirty();
        Ok(())
    }

    pub fn actor_property(&self, actor: ActorId, key: &str) -> Result<PropertyValue> {
        let Some(a) = self.actors.get(actor) else {
            return Err(SceneError::StaleActor(actor));
        };
        Ok(a.property(key)?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Modifiers
    // ─────────────────────────────────────────────────────────────────────

    pub fn add_action(&mut self, actor: ActorId, action: Box<dyn Action>) -> Result<()> {
        self.with_actor_mut(actor, |a| a.actions.push(action))
    }

    pub fn add_constraint(&mut self, actor: ActorId, constraint: Box<dyn Constraint>) -> Result<()> {
        self.with_actor_mut(actor, |a| a.constraints.push(constraint))
    }

    pub fn add_effect(&mut self, actor: ActorId, effect: Box<dyn Effect>) -> Result<()> {
        self.with_actor_mut(actor, |a| a.effects.push(effect))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Repaint scheduling
    // ─────────────────────────────────────────────────────────────────────

    /// Ask for a paint traversal on the next clock tick
    pub fn queue_redraw(&mut self) {
        self.mark_dirty();
    }

    pub fn needs_repaint(&self) -> bool {
        self.pending_repaint
    }

    fn mark_dirty(&mut self) {
        if !self.pending_repaint {
            self.pending_repaint = true;
            if let Some(hook) = self.redraw_hook.clone() {
                hook();
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Paint traversal
    // ─────────────────────────────────────────────────────────────────────

    /// Siblings of `parent` in paint order: stable sort by explicit depth,
    /// insertion order breaking ties. More negative depth paints first
    /// (appears behind).
    pub fn paint_order(&self, parent: ActorId) -> Result<Vec<ActorId>> {
        let Some(actor) = self.actors.get(parent) else {
            return Err(SceneError::StaleActor(parent));
        };
        Ok(self.sorted_children(actor).into_vec())
    }

    fn sorted_children(&self, actor: &Actor) -> SmallVec<[ActorId; 4]> {
        let mut children = actor.children.clone();
        children.sort_by(|&a, &b| {
            let da = self.actors.get(a).map(|x| x.depth).unwrap_or(0.0);
            let db = self.actors.get(b).map(|x| x.depth).unwrap_or(0.0);
            da.total_cmp(&db)
        });
        children
    }

    /// Paint the whole tree through the installed backend, if any.
    ///
    /// Used by the master clock; clears the pending-repaint flag either
    /// way.
    pub fn paint_frame(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            self.paint(backend.as_mut());
            self.backend = Some(backend);
        } else {
            self.pending_repaint = false;
        }
    }

    /// Paint the whole tree through `backend`.
    ///
    /// Effective transform, opacity, and clip are derived top-down during
    /// the walk. A backend error for one actor is logged and isolated;
    /// its siblings and children still paint.
    pub fn paint(&mut self, backend: &mut dyn PaintBackend) {
        self.traversal_depth += 1;
        backend.begin_frame(self.size);
        self.paint_actor(self.root, Affine2D::IDENTITY, 1.0, None, backend);
        backend.end_frame();
        self.traversal_depth -= 1;
        if self.traversal_depth == 0 {
            self.flush_pending_destroy();
        }
        self.pending_repaint = false;
    }

    /// Constraint-resolved geometry for an actor
    fn resolve_geometry(&self, actor: &Actor) -> ActorGeometry {
        let mut geometry = ActorGeometry {
            position: actor.position,
            size: actor.size,
        };
        if !actor.constraints.is_empty() {
            let ctx = ConstraintContext { stage: self };
            for constraint in &actor.constraints {
                constraint.apply(&ctx, &mut geometry);
            }
        }
        geometry
    }

    /// World transform, effective opacity, and effective clip for one
    /// actor under the given parent values.
    fn resolve_node(
        &self,
        actor: &Actor,
        geometry: &ActorGeometry,
        parent_transform: Affine2D,
        parent_opacity: f32,
        parent_clip: Option<Rect>,
    ) -> (Affine2D, f32, Option<Rect>) {
        let local =
            Affine2D::from_trs(geometry.position, actor.rotation, actor.scale, actor.anchor);
        let world = parent_transform.then(&local);
        let opacity = parent_opacity * (actor.opacity as f32 / 255.0);
        let own_clip = actor.clip.map(|clip| world.transform_rect_aabb(clip));
        let clip = match (parent_clip, own_clip) {
            (Some(p), Some(o)) => Some(p.intersection(&o).unwrap_or(Rect::ZERO)),
            (Some(p), None) => Some(p),
            (None, own) => own,
        };
        (world, opacity, clip)
    }

    fn paint_actor(
        &self,
        id: ActorId,
        parent_transform: Affine2D,
        parent_opacity: f32,
        parent_clip: Option<Rect>,
        backend: &mut dyn PaintBackend,
    ) {
        let Some(actor) = self.actors.get(id) else {
            return;
        };
        if !actor.visible {
            return;
        }

        let geometry = self.resolve_geometry(actor);
        let (world, opacity, clip) =
            self.resolve_node(actor, &geometry, parent_transform, parent_opacity, parent_clip);

        // An empty effective clip hides the whole subtree.
        if let Some(clip) = clip {
            if clip.width() <= 0.0 || clip.height() <= 0.0 {
                return;
            }
        }

        let mut node = PaintNode {
            actor: id,
            name: actor.name.as_deref(),
            kind: &actor.kind,
            size: geometry.size,
            transform: world,
            opacity,
            clip,
        };
        for effect in &actor.effects {
            effect.apply(&mut node);
        }

        if let Err(err) = backend.paint(&node) {
            warn!(actor = ?id, error = %err, "actor paint failed; continuing traversal");
        }

        for child in self.sorted_children(actor) {
            self.paint_actor(child, world, opacity, clip, backend);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Hit testing and input
    // ─────────────────────────────────────────────────────────────────────

    /// Topmost visible, reactive actor containing the stage-space point.
    ///
    /// Walks reverse paint order, pruning subtrees whose effective clip
    /// excludes the point; fully transparent actors are not pickable.
    pub fn actor_at_point(&self, point: Point) -> Option<ActorId> {
        self.pick_actor(self.root, Affine2D::IDENTITY, 1.0, None, point)
    }

    fn pick_actor(
        &self,
        id: ActorId,
        parent_transform: Affine2D,
        parent_opacity: f32,
        parent_clip: Option<Rect>,
        point: Point,
    ) -> Option<ActorId> {
        let actor = self.actors.get(id)?;
        if !actor.visible {
            return None;
        }

        let geometry = self.resolve_geometry(actor);
        let (world, opacity, clip) =
            self.resolve_node(actor, &geometry, parent_transform, parent_opacity, parent_clip);

        if let Some(clip) = clip {
            if clip.width() <= 0.0 || clip.height() <= 0.0 || !clip.contains(point) {
                return None;
            }
        }

        // Topmost first: children above self, last-painted sibling first.
        for child in self.sorted_children(actor).into_iter().rev() {
            if let Some(hit) = self.pick_actor(child, world, opacity, clip, point) {
                return Some(hit);
            }
        }

        if actor.reactive && opacity > 0.0 {
            if let Some(inverse) = world.invert() {
                let local = inverse.transform_point(point);
                if geometry.size.to_rect().contains(local) && actor.kind.hit(local, geometry.size)
                {
                    return Some(id);
                }
            }
        }
        None
    }

    /// Resolve an input event via hit testing and run the hit actor's
    /// actions in attachment order until one consumes it.
    ///
    /// Returns the actor that received the event, if any. Destroys
    /// requested by an action are deferred until dispatch completes.
    pub fn dispatch_event(&mut self, event: InputEvent) -> Option<ActorId> {
        let target = self.actor_at_point(event.position())?;

        self.traversal_depth += 1;
        let mut actions = match self.actors.get_mut(target) {
            Some(actor) => std::mem::take(&mut actor.actions),
            None => Vec::new(),
        };
        {
            let mut ctx = ActionContext { stage: self };
            for action in actions.iter_mut() {
                if action.handle(&mut ctx, target, &event) {
                    break;
                }
            }
        }
        // Re-attach, keeping any actions added during dispatch after the
        // original ones.
        if let Some(actor) = self.actors.get_mut(target) {
            let added = std::mem::replace(&mut actor.actions, actions);
            actor.actions.extend(added);
        }
        self.traversal_depth -= 1;
        if self.traversal_depth == 0 {
            self.flush_pending_destroy();
        }
        Some(target)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stage Handle
// ─────────────────────────────────────────────────────────────────────────────

/// Shared ownership of a stage.
///
/// The master clock keeps weak references; a dropped stage is pruned from
/// the clock on its next tick.
#[derive(Clone)]
pub struct StageHandle {
    inner: Rc<RefCell<Stage>>,
}

impl StageHandle {
    pub fn new(size: Size) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Stage::new(size))),
        }
    }

    pub fn borrow(&self) -> Ref<'_, Stage> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Stage> {
        self.inner.borrow_mut()
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<Stage>> {
        Rc::downgrade(&self.inner)
    }

    /// Destroy an actor and deliver the queued "destroyed" notifications
    /// with no stage borrow held, so observers may re-enter the stage.
    pub fn destroy(&self, actor: ActorId) -> Result<()> {
        self.inner.borrow_mut().destroy(actor)?;
        self.flush_notifications();
        Ok(())
    }

    /// Deliver any queued "destroyed" notifications
    pub fn flush_notifications(&self) {
        loop {
            let (handlers, ids) = {
                let mut stage = self.inner.borrow_mut();
                (
                    stage.destroyed_handlers(),
                    stage.take_destroyed_notifications(),
                )
            };
            if ids.is_empty() {
                break;
            }
            for id in ids {
                handlers.emit(&id);
            }
        }
    }
}
