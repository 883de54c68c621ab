//! The master clock: one scheduler for every timeline and stage of a
//! display connection.
//!
//! The clock is explicitly constructed and injected; there is no ambient
//! global. It owns the timeline, behaviour, and score registries
//! (insertion-ordered, so multi-behaviour writes and advancement order are
//! deterministic) and keeps weak references to the stages it repaints.
//!
//! Each [`MasterClock::tick`] runs four phases in a fixed order:
//!
//! 1. advance every playing timeline over a stable snapshot of the
//!    registry. Additions and removals during the tick take effect next
//!    tick, and one failing timeline is skipped, not fatal;
//! 2. dispatch the collected events with no registry borrow held:
//!    behaviours first (property writes mark their stage dirty), then
//!    user observers, then score reactions. All timelines are fully
//!    advanced before anything paints;
//! 3. paint every registered stage that is dirty or saw a timeline
//!    advance, pruning stages that have been dropped;
//! 4. if nothing is playing and nothing is dirty, go [`ClockState::Idle`]
//!    and tell the [`FrameSource`] to stop delivering ticks.
//!
//! Handlers run during phase 2 may re-enter the clock through a
//! [`ClockHandle`]; a timeline started from a handler begins advancing on
//! the next tick.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::{trace, warn};
use troupe_animation::{
    Alpha, AnimationError, Score, ScoreId, Timeline, TimelineEvent, TimelineEvents, TimelineId,
    TimelineState, Trigger,
};
use troupe_core::{HandlerId, Handlers};

use crate::backend::FrameSource;
use crate::behaviour::{Behaviour, BehaviourId};
use crate::error::{Result, SceneError};
use crate::stage::{Stage, StageHandle};

/// Master clock tuning
#[derive(Clone, Copy, Debug)]
pub struct ClockConfig {
    /// Upper bound on the delta fed to timelines in one tick. Protects
    /// against runaway jumps after the process was suspended.
    pub max_delta_ms: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { max_delta_ms: 500.0 }
    }
}

/// Scheduling state of the clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    /// Nothing animating, no repaint pending; tick delivery is disabled
    Idle,
    /// At least one timeline playing or one stage dirty
    Running,
}

struct TimelineSlot {
    timeline: Timeline,
    handlers: Rc<Handlers<TimelineEvent>>,
}

/// One timeline's events plus what dispatch needs to interpret them
struct Batch {
    id: TimelineId,
    events: TimelineEvents,
    handlers: Rc<Handlers<TimelineEvent>>,
    duration_ms: f64,
    frame_step_ms: f64,
}

impl Batch {
    fn new(id: TimelineId, events: TimelineEvents, slot: &TimelineSlot) -> Self {
        Self {
            id,
            events,
            handlers: slot.handlers.clone(),
            duration_ms: slot.timeline.duration_ms(),
            frame_step_ms: slot.timeline.frame_step_ms(),
        }
    }
}

struct ClockInner {
    config: ClockConfig,
    timelines: IndexMap<TimelineId, TimelineSlot>,
    behaviours: IndexMap<BehaviourId, Behaviour>,
    scores: IndexMap<ScoreId, Score>,
    stages: Vec<Weak<RefCell<Stage>>>,
    next_timeline: u64,
    next_behaviour: u64,
    next_score: u64,
    state: ClockState,
    last_tick_ms: Option<f64>,
    in_tick: bool,
    source: Option<Box<dyn FrameSource>>,
}

/// The scheduling core coordinating timelines, behaviours, scores, and
/// stages against one frame source
pub struct MasterClock {
    inner: Rc<RefCell<ClockInner>>,
}

impl MasterClock {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ClockInner {
                config,
                timelines: IndexMap::new(),
                behaviours: IndexMap::new(),
                scores: IndexMap::new(),
                stages: Vec::new(),
                next_timeline: 1,
                next_behaviour: 1,
                next_score: 1,
                state: ClockState::Idle,
                last_tick_ms: None,
                in_tick: false,
                source: None,
            })),
        }
    }

    /// A weak handle for re-entrant control from handlers and hooks
    pub fn handle(&self) -> ClockHandle {
        ClockHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn state(&self) -> ClockState {
        self.inner.borrow().state
    }

    /// Install the external tick driver.
    ///
    /// The clock calls [`FrameSource::set_running`] on every Idle/Running
    /// transition; it does not synchronize on installation.
    pub fn set_frame_source(&self, source: Box<dyn FrameSource>) {
        self.inner.borrow_mut().source = Some(source);
    }

    /// Register a stage for per-tick painting.
    ///
    /// The clock holds a weak reference and installs a redraw hook so
    /// `queue_redraw` on the stage wakes an idle clock.
    pub fn add_stage(&self, stage: &StageHandle) {
        let handle = self.handle();
        stage
            .borrow_mut()
            .set_redraw_hook(Rc::new(move || handle.ensure_running()));
        self.inner.borrow_mut().stages.push(stage.downgrade());
        if stage.borrow().needs_repaint() {
            self.ensure_running();
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Timelines
    // ─────────────────────────────────────────────────────────────────────

    pub fn add_timeline(&self, timeline: Timeline) -> TimelineId {
        let mut inner = self.inner.borrow_mut();
        let id = TimelineId(inner.next_timeline);
        inner.next_timeline += 1;
        inner.timelines.insert(
            id,
            TimelineSlot {
                timeline,
                handlers: Rc::new(Handlers::new()),
            },
        );
        id
    }

    pub fn remove_timeline(&self, id: TimelineId) -> Option<Timeline> {
        self.inner
            .borrow_mut()
            .timelines
            .shift_remove(&id)
            .map(|slot| slot.timeline)
    }

    /// Access a registered timeline for configuration (markers, repeat,
    /// direction). Lifecycle changes made here emit no notifications; use
    /// the clock's lifecycle methods for those.
    pub fn with_timeline<R>(&self, id: TimelineId, f: impl FnOnce(&mut Timeline) -> R) -> Option<R> {
        self.inner
            .borrow_mut()
            .timelines
            .get_mut(&id)
            .map(|slot| f(&mut slot.timeline))
    }

    pub fn timeline_state(&self, id: TimelineId) -> Option<TimelineState> {
        self.inner
            .borrow()
            .timelines
            .get(&id)
            .map(|slot| slot.timeline.state())
    }

    pub fn is_timeline_playing(&self, id: TimelineId) -> bool {
        self.timeline_state(id) == Some(TimelineState::Playing)
    }

    pub fn timeline_progress(&self, id: TimelineId) -> Option<f64> {
        self.inner
            .borrow()
            .timelines
            .get(&id)
            .map(|slot| slot.timeline.progress())
    }

    /// Observe a timeline's events. Handlers run synchronously during
    /// dispatch and may re-enter the clock through a [`ClockHandle`].
    pub fn connect_timeline(
        &self,
        id: TimelineId,
        callback: impl FnMut(&TimelineEvent) + 'static,
    ) -> Result<HandlerId> {
        let inner = self.inner.borrow();
        let slot = inner
            .timelines
            .get(&id)
            .ok_or(AnimationError::UnknownTimeline(id))?;
        Ok(slot.handlers.connect(callback))
    }

    pub fn disconnect_timeline(&self, id: TimelineId, handler: HandlerId) -> bool {
        let inner = self.inner.borrow();
        inner
            .timelines
            .get(&id)
            .map(|slot| slot.handlers.disconnect(handler))
            .unwrap_or(false)
    }

    pub fn start_timeline(&self, id: TimelineId) -> Result<()> {
        let batch = self.lifecycle_op(id, Timeline::start)?;
        self.ensure_running();
        self.dispatch(batch.into_iter().collect());
        Ok(())
    }

    pub fn stop_timeline(&self, id: TimelineId) -> Result<()> {
        let batch = self.lifecycle_op(id, Timeline::stop)?;
        self.dispatch(batch.into_iter().collect());
        Ok(())
    }

    pub fn pause_timeline(&self, id: TimelineId) -> Result<()> {
        let batch = self.lifecycle_op(id, Timeline::pause)?;
        self.dispatch(batch.into_iter().collect());
        Ok(())
    }

    /// Reset a timeline's position to its start boundary (no events)
    pub fn rewind_timeline(&self, id: TimelineId) -> Result<()> {
        self.with_timeline(id, Timeline::rewind)
            .ok_or_else(|| AnimationError::UnknownTimeline(id).into())
    }

    fn lifecycle_op(
        &self,
        id: TimelineId,
        op: impl FnOnce(&mut Timeline) -> TimelineEvents,
    ) -> Result<Option<Batch>> {
        let mut inner = self.inner.borrow_mut();
        let slot = inner
            .timelines
            .get_mut(&id)
            .ok_or(AnimationError::UnknownTimeline(id))?;
        let events = op(&mut slot.timeline);
        if events.is_empty() {
            return Ok(None);
        }
        Ok(Some(Batch::new(id, events, slot)))
    }

    /// Current eased value of an alpha, if its timeline is registered
    pub fn alpha_value(&self, alpha: &Alpha) -> Option<f32> {
        self.inner
            .borrow()
            .timelines
            .get(&alpha.timeline())
            .map(|slot| alpha.value_for(&slot.timeline))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Behaviours
    // ─────────────────────────────────────────────────────────────────────

    /// Register a behaviour.
    ///
    /// Behaviours apply in registration order, so when several target the
    /// same actor property the last-registered one wins. Fails if the
    /// behaviour's alpha references an unregistered timeline.
    pub fn add_behaviour(&self, behaviour: Behaviour) -> Result<BehaviourId> {
        let mut inner = self.inner.borrow_mut();
        let timeline = behaviour.alpha().timeline();
        if !inner.timelines.contains_key(&timeline) {
            return Err(AnimationError::UnknownTimeline(timeline).into());
        }
        let id = BehaviourId(inner.next_behaviour);
        inner.next_behaviour += 1;
        inner.behaviours.insert(id, behaviour);
        Ok(id)
    }

    pub fn remove_behaviour(&self, id: BehaviourId) -> Option<Behaviour> {
        self.inner.borrow_mut().behaviours.shift_remove(&id)
    }

    /// Access a registered behaviour, e.g. to bind or unbind targets.
    /// Changes take effect on the next dispatch.
    pub fn with_behaviour<R>(
        &self,
        id: BehaviourId,
        f: impl FnOnce(&mut Behaviour) -> R,
    ) -> Option<R> {
        self.inner.borrow_mut().behaviours.get_mut(&id).map(f)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scores
    // ─────────────────────────────────────────────────────────────────────

    /// Register a score. Every timeline it references must already be
    /// registered with this clock.
    pub fn add_score(&self, score: Score) -> Result<ScoreId> {
        let mut inner = self.inner.borrow_mut();
        for timeline in score.timelines() {
            if !inner.timelines.contains_key(&timeline) {
                return Err(AnimationError::UnknownTimeline(timeline).into());
            }
        }
        let id = ScoreId(inner.next_score);
        inner.next_score += 1;
        inner.scores.insert(id, score);
        Ok(id)
    }

    pub fn remove_score(&self, id: ScoreId) -> Option<Score> {
        self.inner.borrow_mut().scores.shift_remove(&id)
    }

    /// Start a score's root timelines; start-with and start-after edges
    /// cascade from their events.
    pub fn start_score(&self, id: ScoreId) -> Result<()> {
        let roots = self
            .inner
            .borrow()
            .scores
            .get(&id)
            .ok_or(SceneError::UnknownScore(id))?
            .roots();
        let mut batches = VecDeque::new();
        for timeline in roots {
            if let Some(batch) = self.start_registered(timeline) {
                batches.push_back(batch);
            }
        }
        self.dispatch(batches);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Ticking
    // ─────────────────────────────────────────────────────────────────────

    /// Wake the clock from Idle: re-base the tick delta and ask the frame
    /// source to resume delivery.
    pub fn ensure_running(&self) {
        let source = {
            let Ok(mut inner) = self.inner.try_borrow_mut() else {
                // Mid-tick; the tick's own idle phase will re-evaluate.
                return;
            };
            if inner.state != ClockState::Idle {
                return;
            }
            inner.state = ClockState::Running;
            inner.last_tick_ms = None;
            inner.source.take()
        };
        if let Some(mut source) = source {
            source.set_running(true);
            if let Ok(mut inner) = self.inner.try_borrow_mut() {
                inner.source = Some(source);
            }
        }
    }

    /// Run one frame: advance, dispatch, paint, and re-evaluate idleness.
    ///
    /// `now_ms` is the frame source's monotonic timestamp; the first tick
    /// after construction or wake-up only re-bases the delta.
    pub fn tick(&self, now_ms: f64) {
        // Phase 1: advance a stable snapshot of the playing timelines.
        let mut batches: VecDeque<Batch> = VecDeque::new();
        {
            let Ok(mut inner) = self.inner.try_borrow_mut() else {
                warn!("re-entrant master clock tick ignored");
                return;
            };
            if inner.in_tick {
                warn!("re-entrant master clock tick ignored");
                return;
            }
            inner.in_tick = true;

            let delta = match inner.last_tick_ms {
                Some(last) if now_ms >= last => (now_ms - last).min(inner.config.max_delta_ms),
                Some(_) => {
                    warn!("non-monotonic tick timestamp; treating as zero delta");
                    0.0
                }
                None => 0.0,
            };
            inner.last_tick_ms = Some(now_ms);

            let playing: Vec<TimelineId> = inner
                .timelines
                .iter()
                .filter(|(_, slot)| slot.timeline.is_playing())
                .map(|(&id, _)| id)
                .collect();
            for id in playing {
                let Some(slot) = inner.timelines.get_mut(&id) else {
                    continue;
                };
                match slot.timeline.advance(delta) {
                    Ok(events) => {
                        if !events.is_empty() {
                            batches.push_back(Batch::new(id, events, slot));
                        }
                    }
                    Err(err) => {
                        warn!(timeline = id.0, error = %err, "timeline advance failed; skipped for this tick");
                    }
                }
            }
        }
        let advanced = !batches.is_empty();

        // Phase 2: dispatch with no registry borrow held, so handlers may
        // re-enter the clock. All timelines are fully advanced before any
        // stage paints.
        self.dispatch(batches);

        // Phase 3: paint dirty stages (all stages count as dirty when a
        // timeline advanced), pruning dropped ones.
        let stages: Vec<Rc<RefCell<Stage>>> = {
            let mut inner = self.inner.borrow_mut();
            inner.stages.retain(|weak| weak.strong_count() > 0);
            inner.stages.iter().filter_map(Weak::upgrade).collect()
        };
        for stage in &stages {
            let needs = advanced || stage.borrow().needs_repaint();
            if needs {
                stage.borrow_mut().paint_frame();
            }
            // Deliver destroyed-actor notifications queued by deferred
            // destroys, with the stage borrow released.
            loop {
                let (handlers, ids) = {
                    let mut stage = stage.borrow_mut();
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

        // Phase 4: idle determination and frame-source backpressure.
        let source_call = {
            let mut inner = self.inner.borrow_mut();
            let any_playing = inner
                .timelines
                .values()
                .any(|slot| slot.timeline.is_playing());
            let any_pending = stages.iter().any(|stage| stage.borrow().needs_repaint());
            let target = if any_playing || any_pending {
                ClockState::Running
            } else {
                ClockState::Idle
            };
            let call = if inner.state != target {
                if target == ClockState::Idle {
                    trace!("master clock going idle");
                    inner.last_tick_ms = None;
                }
                inner.state = target;
                inner
                    .source
                    .take()
                    .map(|source| (source, target == ClockState::Running))
            } else {
                None
            };
            inner.in_tick = false;
            call
        };
        if let Some((mut source, running)) = source_call {
            source.set_running(running);
            if let Ok(mut inner) = self.inner.try_borrow_mut() {
                inner.source = Some(source);
            }
        }
    }

    /// Start a registered timeline, returning its event batch. Used by
    /// score cascades; unknown ids are ignored.
    fn start_registered(&self, id: TimelineId) -> Option<Batch> {
        let batch = {
            let mut inner = self.inner.borrow_mut();
            let slot = inner.timelines.get_mut(&id)?;
            let events = slot.timeline.start();
            if events.is_empty() {
                return None;
            }
            Batch::new(id, events, slot)
        };
        self.ensure_running();
        Some(batch)
    }

    /// Drain a queue of event batches: behaviours, then observers, then
    /// score reactions, which may enqueue further batches.
    fn dispatch(&self, batches: VecDeque<Batch>) {
        if batches.is_empty() {
            return;
        }
        // Snapshot behaviours and scores for the whole dispatch;
        // registrations made by handlers take effect next tick.
        let behaviours: Vec<Behaviour> =
            self.inner.borrow().behaviours.values().cloned().collect();
        let scores: Vec<Score> = self.inner.borrow().scores.values().cloned().collect();

        let mut queue = batches;
        while let Some(batch) = queue.pop_front() {
            for event in &batch.events {
                match event {
                    TimelineEvent::NewFrame { frame } => {
                        let progress =
                            (*frame as f64 * batch.frame_step_ms / batch.duration_ms).clamp(0.0, 1.0);
                        apply_behaviours(&behaviours, batch.id, progress);
                    }
                    TimelineEvent::Completed { position_ms } => {
                        let progress = (position_ms / batch.duration_ms).clamp(0.0, 1.0);
                        apply_behaviours(&behaviours, batch.id, progress);
                    }
                    _ => {}
                }

                batch.handlers.emit(event);

                let mut to_start: Vec<TimelineId> = Vec::new();
                match event {
                    TimelineEvent::Started => {
                        for score in &scores {
                            to_start.extend(score.children_of(batch.id, Trigger::StartWith));
                        }
                    }
                    TimelineEvent::Completed { .. } => {
                        for score in &scores {
                            to_start.extend(score.children_of(batch.id, Trigger::StartAfter));
                        }
                    }
                    _ => {}
                }
                for id in to_start {
                    if let Some(next) = self.start_registered(id) {
                        queue.push_back(next);
                    }
                }
            }
        }
    }
}

impl Default for MasterClock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

fn apply_behaviours(behaviours: &[Behaviour], timeline: TimelineId, progress: f64) {
    for behaviour in behaviours {
        if behaviour.alpha().timeline() == timeline {
            let eased = behaviour.alpha().value_at(progress);
            behaviour.apply(eased);
        }
    }
}

/// Weak handle to a master clock.
///
/// Handlers hold one of these to start/stop timelines or wake the clock
/// without keeping it alive.
#[derive(Clone)]
pub struct ClockHandle {
    inner: Weak<RefCell<ClockInner>>,
}

impl ClockHandle {
    /// Recover full clock access, if the clock is still alive
    pub fn upgrade(&self) -> Option<MasterClock> {
        self.inner.upgrade().map(|inner| MasterClock { inner })
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Wake the clock if it is idle; a no-op once the clock is gone
    pub fn ensure_running(&self) {
        if let Some(clock) = self.upgrade() {
            clock.ensure_running();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use troupe_animation::{Easing, Repeat};
    use troupe_core::{Color, PropertyValue, Size};

    /// Frame source recording every set_running call
    struct TestSource {
        calls: Rc<RefCell<Vec<bool>>>,
    }

    impl FrameSource for TestSource {
        fn set_running(&mut self, running: bool) {
            self.calls.borrow_mut().push(running);
        }
    }

    fn clock_with_source() -> (MasterClock, Rc<RefCell<Vec<bool>>>) {
        let clock = MasterClock::default();
        let calls = Rc::new(RefCell::new(Vec::new()));
        clock.set_frame_source(Box::new(TestSource {
            calls: calls.clone(),
        }));
        (clock, calls)
    }

    fn stage_with_actor() -> (StageHandle, crate::actor::ActorId) {
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

    fn float_property(stage: &StageHandle, actor: crate::actor::ActorId, key: &str) -> f32 {
        match stage.borrow().actor_property(actor, key).unwrap() {
            PropertyValue::Float(v) => v,
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn test_behaviour_drives_property_end_to_end() {
        let (clock, _calls) = clock_with_source();
        let (stage, actor) = stage_with_actor();
        clock.add_stage(&stage);

        let timeline = clock.add_timeline(
            Timeline::new(1000)
                .unwrap()
                .with_frame_rate(10)
                .unwrap()
                .with_repeat(Repeat::Count(1)),
        );
        clock
            .add_behaviour(
                Behaviour::new(Alpha::new(timeline, Easing::Linear))
                    .bind_x(&stage, actor, 0.0, 100.0),
            )
            .unwrap();

        clock.start_timeline(timeline).unwrap();
        clock.tick(0.0);
        clock.tick(500.0);
        assert!((float_property(&stage, actor, "x") - 50.0).abs() < 1e-4);
        assert!(clock.is_timeline_playing(timeline));

        clock.tick(1000.0);
        assert_eq!(
            clock.timeline_state(timeline),
            Some(TimelineState::Stopped)
        );
        assert!((float_property(&stage, actor, "x") - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_clock_goes_idle_and_stops_tick_delivery() {
        let (clock, calls) = clock_with_source();
        let (stage, _actor) = stage_with_actor();
        clock.add_stage(&stage);

        let timeline = clock.add_timeline(Timeline::new(100).unwrap().with_frame_rate(10).unwrap());
        clock.start_timeline(timeline).unwrap();
        assert_eq!(clock.state(), ClockState::Running);
        assert_eq!(*calls.borrow(), vec![true]);

        clock.tick(0.0);
        assert_eq!(clock.state(), ClockState::Running);

        // The timeline completes during this tick; with nothing playing
        // and nothing dirty afterwards, the clock idles and asks the
        // source to stop.
        clock.tick(200.0);
        assert_eq!(clock.state(), ClockState::Idle);
        assert_eq!(*calls.borrow(), vec![true, false]);
    }

    #[test]
    fn test_queue_redraw_wakes_idle_clock() {
        let (clock, calls) = clock_with_source();
        let (stage, _actor) = stage_with_actor();
        clock.add_stage(&stage);

        // Drain the initial pending repaint and go idle.
        clock.tick(0.0);
        assert_eq!(clock.state(), ClockState::Idle);

        stage.borrow_mut().queue_redraw();
        assert_eq!(clock.state(), ClockState::Running);
        assert_eq!(calls.borrow().last(), Some(&true));

        clock.tick(10.0);
        assert_eq!(clock.state(), ClockState::Idle);
        assert_eq!(calls.borrow().last(), Some(&false));
    }

    #[test]
    fn test_add_behaviour_requires_registered_timeline() {
        let (clock, _calls) = clock_with_source();
        let err = clock
            .add_behaviour(Behaviour::new(Alpha::new(TimelineId(999), Easing::Linear)))
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::Animation(AnimationError::UnknownTimeline(TimelineId(999)))
        );
    }

    #[test]
    fn test_timeline_started_from_handler_advances_next_tick() {
        let (clock, _calls) = clock_with_source();
        let first = clock.add_timeline(Timeline::new(100).unwrap().with_frame_rate(10).unwrap());
        let second = clock.add_timeline(Timeline::new(100).unwrap().with_frame_rate(10).unwrap());

        let handle = clock.handle();
        clock
            .connect_timeline(first, move |event| {
                if matches!(event, TimelineEvent::Completed { .. }) {
                    if let Some(clock) = handle.upgrade() {
                        clock.start_timeline(second).unwrap();
                    }
                }
            })
            .unwrap();

        clock.start_timeline(first).unwrap();
        clock.tick(0.0);
        clock.tick(150.0);

        // The handler started `second` mid-tick; it is playing but has
        // not advanced yet.
        assert!(clock.is_timeline_playing(second));
        assert_eq!(clock.timeline_progress(second), Some(0.0));
        assert_eq!(clock.state(), ClockState::Running);

        clock.tick(250.0);
        assert!(clock.timeline_progress(second).unwrap() > 0.0);
    }

    #[test]
    fn test_score_sequencing_through_clock() {
        let (clock, _calls) = clock_with_source();
        let a = clock.add_timeline(Timeline::new(100).unwrap().with_frame_rate(10).unwrap());
        let b = clock.add_timeline(Timeline::new(100).unwrap().with_frame_rate(10).unwrap());
        let c = clock.add_timeline(Timeline::new(100).unwrap().with_frame_rate(10).unwrap());

        let mut score = Score::new();
        score.append(None, a, Trigger::StartAfter).unwrap();
        score.append(Some(a), b, Trigger::StartAfter).unwrap();
        score.append(Some(b), c, Trigger::StartWith).unwrap();
        let score = clock.add_score(score).unwrap();

        clock.start_score(score).unwrap();
        assert!(clock.is_timeline_playing(a));
        assert!(!clock.is_timeline_playing(b));

        clock.tick(0.0);
        clock.tick(150.0);
        // A completed; B and C started together.
        assert_eq!(clock.timeline_state(a), Some(TimelineState::Stopped));
        assert!(clock.is_timeline_playing(b));
        assert!(clock.is_timeline_playing(c));
    }

    #[test]
    fn test_last_registered_behaviour_wins() {
        let (clock, _calls) = clock_with_source();
        let (stage, actor) = stage_with_actor();
        clock.add_stage(&stage);

        let timeline =
            clock.add_timeline(Timeline::new(1000).unwrap().with_frame_rate(10).unwrap());
        clock
            .add_behaviour(
                Behaviour::new(Alpha::new(timeline, Easing::Linear))
                    .bind_x(&stage, actor, 0.0, 100.0),
            )
            .unwrap();
        clock
            .add_behaviour(
                Behaviour::new(Alpha::new(timeline, Easing::Linear))
                    .bind_x(&stage, actor, 0.0, 200.0),
            )
            .unwrap();

        clock.start_timeline(timeline).unwrap();
        clock.tick(0.0);
        clock.tick(500.0);

        // Both behaviours wrote; registration order makes the second the
        // final value.
        assert!((float_property(&stage, actor, "x") - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_alpha_value_is_idempotent_within_a_tick() {
        let (clock, _calls) = clock_with_source();
        let timeline =
            clock.add_timeline(Timeline::new(1000).unwrap().with_frame_rate(10).unwrap());
        let alpha = Alpha::new(timeline, Easing::EaseInOutCubic);

        clock.start_timeline(timeline).unwrap();
        clock.tick(0.0);
        clock.tick(333.0);

        let first = clock.alpha_value(&alpha).unwrap();
        let second = clock.alpha_value(&alpha).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_removed_timeline_is_gone() {
        let (clock, _calls) = clock_with_source();
        let timeline = clock.add_timeline(Timeline::new(100).unwrap());
        assert!(clock.remove_timeline(timeline).is_some());
        assert!(clock.remove_timeline(timeline).is_none());
        assert_eq!(
            clock.start_timeline(timeline).unwrap_err(),
            SceneError::Animation(AnimationError::UnknownTimeline(timeline))
        );
    }
}
