//! Timelines: monotonic, frame-quantized progress counters.
//!
//! A timeline is a position in `[0, duration]` milliseconds advanced by
//! wall-time deltas. The configured frame rate lays an integral frame grid
//! over the duration; [`Timeline::advance`] walks every grid line it
//! crosses and reports each one as a [`TimelineEvent::NewFrame`], so a
//! large delta produces the same event sequence as many small ones.
//! Markers fire exactly once per crossing, in either direction, and end
//! boundaries clamp, wrap, or reverse according to the repeat
//! configuration, consuming the remaining delta so nothing is skipped.
//!
//! Timelines do not read the clock themselves; the master clock (or a
//! test) feeds them deltas and dispatches the returned events.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{AnimationError, Result};

/// Identifier for a timeline registered with a master clock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimelineId(pub u64);

/// Timeline lifecycle state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimelineState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Playback direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// How many passes a timeline makes before stopping.
///
/// `Count(n)` plays `n` full passes (values below 1 behave as 1); each
/// pass ends with one `Completed` event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    Count(u32),
    Infinite,
}

impl Default for Repeat {
    fn default() -> Self {
        Repeat::Count(1)
    }
}

/// Notification emitted by [`Timeline::advance`] and the lifecycle methods
#[derive(Clone, Debug, PartialEq)]
pub enum TimelineEvent {
    /// The timeline entered the Playing state
    Started,
    /// An integral frame boundary was crossed
    NewFrame { frame: u64 },
    /// A named marker was crossed
    Marker { name: String, position_ms: f64 },
    /// The timeline was paused
    Paused,
    /// A pass reached its end boundary; `position_ms` is the boundary
    /// position (duration going forward, zero going backward)
    Completed { position_ms: f64 },
    /// The timeline left the Playing/Paused states
    Stopped,
}

/// Event batch from a single operation
pub type TimelineEvents = SmallVec<[TimelineEvent; 8]>;

// Tolerance for float drift in accumulated positions.
const EPS: f64 = 1e-6;

/// A time-driven progress counter with looping, direction, and markers
#[derive(Clone, Debug)]
pub struct Timeline {
    duration_ms: f64,
    frame_rate: u32,
    position_ms: f64,
    state: TimelineState,
    direction: Direction,
    repeat: Repeat,
    auto_reverse: bool,
    completed_laps: u32,
    markers: FxHashMap<String, f64>,
}

impl Timeline {
    /// Create a timeline with the given duration in milliseconds.
    ///
    /// The default frame rate is 60fps; see [`Timeline::with_frame_rate`].
    pub fn new(duration_ms: u64) -> Result<Self> {
        if duration_ms == 0 {
            return Err(AnimationError::InvalidDuration);
        }
        Ok(Self {
            duration_ms: duration_ms as f64,
            frame_rate: 60,
            position_ms: 0.0,
            state: TimelineState::Stopped,
            direction: Direction::Forward,
            repeat: Repeat::default(),
            auto_reverse: false,
            completed_laps: 0,
            markers: FxHashMap::default(),
        })
    }

    /// Create a timeline spanning exactly `n_frames` at the given rate
    pub fn from_frames(n_frames: u64, frame_rate: u32) -> Result<Self> {
        if n_frames == 0 {
            return Err(AnimationError::InvalidDuration);
        }
        if frame_rate == 0 {
            return Err(AnimationError::InvalidFrameRate);
        }
        Ok(Self {
            duration_ms: n_frames as f64 * 1000.0 / frame_rate as f64,
            frame_rate,
            position_ms: 0.0,
            state: TimelineState::Stopped,
            direction: Direction::Forward,
            repeat: Repeat::default(),
            auto_reverse: false,
            completed_laps: 0,
            markers: FxHashMap::default(),
        })
    }

    pub fn with_frame_rate(mut self, frame_rate: u32) -> Result<Self> {
        if frame_rate == 0 {
            return Err(AnimationError::InvalidFrameRate);
        }
        self.frame_rate = frame_rate;
        Ok(self)
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_auto_reverse(mut self, auto_reverse: bool) -> Self {
        self.auto_reverse = auto_reverse;
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn position_ms(&self) -> f64 {
        self.position_ms
    }

    /// Normalized progress in [0, 1]
    pub fn progress(&self) -> f64 {
        (self.position_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Milliseconds between integral frames
    pub fn frame_step_ms(&self) -> f64 {
        1000.0 / self.frame_rate as f64
    }

    /// Number of integral frames the duration spans
    pub fn n_frames(&self) -> u64 {
        (self.duration_ms / self.frame_step_ms() + EPS).floor() as u64
    }

    /// The frame at or before the current position
    pub fn current_frame(&self) -> u64 {
        (self.position_ms / self.frame_step_ms() + EPS).floor() as u64
    }

    /// Normalized progress of an integral frame index
    pub fn frame_progress(&self, frame: u64) -> f64 {
        (frame as f64 * self.frame_step_ms() / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TimelineState::Playing
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    pub fn set_repeat(&mut self, repeat: Repeat) {
        self.repeat = repeat;
    }

    pub fn auto_reverse(&self) -> bool {
        self.auto_reverse
    }

    pub fn set_auto_reverse(&mut self, auto_reverse: bool) {
        self.auto_reverse = auto_reverse;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Markers
    // ─────────────────────────────────────────────────────────────────────

    /// Add a named marker at a position in milliseconds
    pub fn add_marker(&mut self, name: impl Into<String>, position_ms: f64) -> Result<()> {
        let name = name.into();
        if !position_ms.is_finite() || position_ms < 0.0 || position_ms > self.duration_ms {
            return Err(AnimationError::MarkerOutOfRange(name));
        }
        if self.markers.contains_key(&name) {
            return Err(AnimationError::DuplicateMarker(name));
        }
        self.markers.insert(name, position_ms);
        Ok(())
    }

    /// Remove a marker. Returns false if no marker had this name.
    pub fn remove_marker(&mut self, name: &str) -> bool {
        self.markers.remove(name).is_some()
    }

    pub fn marker_position(&self, name: &str) -> Option<f64> {
        self.markers.get(name).copied()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Begin playing from the current position.
    ///
    /// Does not rewind; a timeline stopped at its end boundary will
    /// complete on the next advance unless rewound first.
    pub fn start(&mut self) -> TimelineEvents {
        let mut events = TimelineEvents::new();
        if self.state != TimelineState::Playing {
            self.state = TimelineState::Playing;
            self.completed_laps = 0;
            events.push(TimelineEvent::Started);
        }
        events
    }

    pub fn pause(&mut self) -> TimelineEvents {
        let mut events = TimelineEvents::new();
        if self.state == TimelineState::Playing {
            self.state = TimelineState::Paused;
            events.push(TimelineEvent::Paused);
        }
        events
    }

    pub fn stop(&mut self) -> TimelineEvents {
        let mut events = TimelineEvents::new();
        if self.state != TimelineState::Stopped {
            self.state = TimelineState::Stopped;
            events.push(TimelineEvent::Stopped);
        }
        events
    }

    /// Reset the position to the start boundary for the current direction.
    ///
    /// Never changes state: rewinding while stopped leaves the timeline
    /// stopped.
    pub fn rewind(&mut self) {
        self.position_ms = match self.direction {
            Direction::Forward => 0.0,
            Direction::Backward => self.duration_ms,
        };
    }

    /// Move by a number of integral frames in the current direction.
    ///
    /// Emits no events; the position is clamped to `[0, duration]`.
    pub fn skip(&mut self, frames: u64) {
        let delta = frames as f64 * self.frame_step_ms();
        self.position_ms = match self.direction {
            Direction::Forward => (self.position_ms + delta).min(self.duration_ms),
            Direction::Backward => (self.position_ms - delta).max(0.0),
        };
    }

    /// Seek to a normalized progress in [0, 1] without emitting events
    pub fn set_progress(&mut self, progress: f64) {
        self.position_ms = (progress.clamp(0.0, 1.0)) * self.duration_ms;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Advancement
    // ─────────────────────────────────────────────────────────────────────

    /// Advance by an elapsed wall-time delta in milliseconds.
    ///
    /// Returns every event the movement produced, in chronological order:
    /// a `NewFrame` per integral frame crossed, a `Marker` per marker
    /// crossing, and `Completed` per end boundary reached. When the repeat
    /// count is exhausted the position clamps to the boundary and the
    /// timeline stops; otherwise the remaining delta continues into the
    /// next pass (wrapped, or reversed when auto-reverse is set).
    ///
    /// A negative or non-finite delta is rejected with no state change.
    pub fn advance(&mut self, delta_ms: f64) -> Result<TimelineEvents> {
        if !delta_ms.is_finite() || delta_ms < 0.0 {
            return Err(AnimationError::InvalidDelta(delta_ms));
        }

        let mut events = TimelineEvents::new();
        let mut remaining = delta_ms;

        loop {
            if self.state != TimelineState::Playing {
                break;
            }

            let bound_dist = match self.direction {
                Direction::Forward => self.duration_ms - self.position_ms,
                Direction::Backward => self.position_ms,
            };

            if bound_dist <= EPS {
                self.handle_boundary(&mut events);
                continue;
            }

            if remaining <= EPS {
                break;
            }

            let step = remaining.min(bound_dist);
            let old = self.position_ms;
            let new = match self.direction {
                Direction::Forward => old + step,
                Direction::Backward => old - step,
            };
            self.emit_span(old, new, &mut events);
            self.position_ms = new;
            remaining -= step;
        }

        Ok(events)
    }

    /// Handle arrival at an end boundary: count the pass, then clamp,
    /// wrap, or reverse.
    fn handle_boundary(&mut self, events: &mut TimelineEvents) {
        // Snap exactly onto the boundary to kill accumulated drift.
        self.position_ms = match self.direction {
            Direction::Forward => self.duration_ms,
            Direction::Backward => 0.0,
        };
        self.completed_laps += 1;
        events.push(TimelineEvent::Completed {
            position_ms: self.position_ms,
        });

        let exhausted = match self.repeat {
            Repeat::Count(n) => self.completed_laps >= n.max(1),
            Repeat::Infinite => false,
        };

        if exhausted {
            self.state = TimelineState::Stopped;
            events.push(TimelineEvent::Stopped);
        } else if self.auto_reverse {
            self.direction = self.direction.flipped();
        } else {
            self.position_ms = match self.direction {
                Direction::Forward => 0.0,
                Direction::Backward => self.duration_ms,
            };
        }
    }

    /// Emit frame and marker events for a movement from `old` to `new`.
    ///
    /// Forward spans cover `(old, new]`, backward spans `[new, old)`, so a
    /// boundary point fires on arrival and is not repeated on departure.
    fn emit_span(&self, old: f64, new: f64, events: &mut TimelineEvents) {
        // (time, rank, frame, marker name); rank orders NewFrame before
        // Marker at identical positions.
        let mut points: Vec<(f64, u8, u64, Option<&str>)> = Vec::new();
        let fs = self.frame_step_ms();
        let forward = new > old;

        if forward {
            let mut k = (old / fs + EPS).floor() as u64;
            loop {
                let t = (k + 1) as f64 * fs;
                if t > new + EPS {
                    break;
                }
                k += 1;
                points.push((t, 0, k, None));
            }
            for (name, &pos) in &self.markers {
                if pos > old + EPS && pos <= new + EPS {
                    points.push((pos, 1, 0, Some(name)));
                }
            }
            points.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap()
                    .then(a.1.cmp(&b.1))
                    .then(a.3.cmp(&b.3))
            });
        } else {
            let mut k = ((old / fs) - EPS).ceil() as i64 - 1;
            while k >= 0 && k as f64 * fs >= new - EPS {
                points.push((k as f64 * fs, 0, k as u64, None));
                k -= 1;
            }
            for (name, &pos) in &self.markers {
                if pos >= new - EPS && pos < old - EPS {
                    points.push((pos, 1, 0, Some(name)));
                }
            }
            points.sort_by(|a, b| {
                b.0.partial_cmp(&a.0)
                    .unwrap()
                    .then(a.1.cmp(&b.1))
                    .then(a.3.cmp(&b.3))
            });
        }

        for (time, rank, frame, name) in points {
            if rank == 0 {
                events.push(TimelineEvent::NewFrame { frame });
            } else if let Some(name) = name {
                events.push(TimelineEvent::Marker {
                    name: name.to_owned(),
                    position_ms: time,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(events: &TimelineEvents) -> Vec<u64> {
        events
            .iter()
            .filter_map(|ev| match ev {
                TimelineEvent::NewFrame { frame } => Some(*frame),
                _ => None,
            })
            .collect()
    }

    fn count_completed(events: &TimelineEvents) -> usize {
        events
            .iter()
            .filter(|ev| matches!(ev, TimelineEvent::Completed { .. }))
            .count()
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        assert_eq!(Timeline::new(0).unwrap_err(), AnimationError::InvalidDuration);
        assert_eq!(
            Timeline::from_frames(0, 60).unwrap_err(),
            AnimationError::InvalidDuration
        );
        assert_eq!(
            Timeline::new(100).unwrap().with_frame_rate(0).unwrap_err(),
            AnimationError::InvalidFrameRate
        );
    }

    #[test]
    fn test_advance_rejects_invalid_delta() {
        let mut tl = Timeline::new(1000).unwrap();
        tl.start();
        tl.advance(100.0).unwrap();
        let before = tl.position_ms();

        assert!(matches!(
            tl.advance(-1.0),
            Err(AnimationError::InvalidDelta(_))
        ));
        assert!(matches!(
            tl.advance(f64::NAN),
            Err(AnimationError::InvalidDelta(_))
        ));
        assert!(matches!(
            tl.advance(f64::INFINITY),
            Err(AnimationError::InvalidDelta(_))
        ));
        assert_eq!(tl.position_ms(), before);
        assert!(tl.is_playing());
    }

    #[test]
    fn test_advance_emits_every_integral_frame() {
        let mut tl = Timeline::new(1000).unwrap().with_frame_rate(10).unwrap();
        tl.start();
        let events = tl.advance(1000.0).unwrap();
        assert_eq!(frames(&events), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_advance_clamps_and_completes_once() {
        let mut tl = Timeline::new(1000).unwrap().with_frame_rate(10).unwrap();
        tl.start();
        let events = tl.advance(2500.0).unwrap();

        assert_eq!(tl.position_ms(), 1000.0);
        assert_eq!(tl.state(), TimelineState::Stopped);
        assert_eq!(count_completed(&events), 1);
        // Every frame fired exactly once despite the oversized delta.
        assert_eq!(frames(&events), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_position_never_leaves_bounds() {
        let mut tl = Timeline::new(300)
            .unwrap()
            .with_frame_rate(10)
            .unwrap()
            .with_repeat(Repeat::Infinite);
        tl.start();
        for _ in 0..50 {
            tl.advance(77.0).unwrap();
            assert!(tl.position_ms() >= 0.0);
            assert!(tl.position_ms() <= tl.duration_ms());
        }
    }

    #[test]
    fn test_repeat_count_fires_exact_completions() {
        let mut tl = Timeline::new(1000)
            .unwrap()
            .with_frame_rate(10)
            .unwrap()
            .with_repeat(Repeat::Count(3));
        tl.start();
        let events = tl.advance(3000.0).unwrap();

        assert_eq!(count_completed(&events), 3);
        assert_eq!(tl.state(), TimelineState::Stopped);
        assert_eq!(tl.position_ms(), 1000.0);
    }

    #[test]
    fn test_infinite_repeat_never_stops() {
        let mut tl = Timeline::new(1000)
            .unwrap()
            .with_frame_rate(10)
            .unwrap()
            .with_repeat(Repeat::Infinite);
        tl.start();
        let events = tl.advance(10_500.0).unwrap();

        assert_eq!(count_completed(&events), 10);
        assert!(tl.is_playing());
        assert!((tl.position_ms() - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_marker_and_frames_fire_before_boundary() {
        // 0→100 timeline crossed by a single delta of 150 over a marker
        // at 50: the frame at 50 and the marker both fire, then the end
        // frame, then Completed.
        let mut tl = Timeline::new(100).unwrap().with_frame_rate(20).unwrap();
        tl.add_marker("half", 50.0).unwrap();
        tl.start();
        let events = tl.advance(150.0).unwrap();

        assert_eq!(
            events.as_slice(),
            &[
                TimelineEvent::NewFrame { frame: 1 },
                TimelineEvent::Marker {
                    name: "half".into(),
                    position_ms: 50.0
                },
                TimelineEvent::NewFrame { frame: 2 },
                TimelineEvent::Completed { position_ms: 100.0 },
                TimelineEvent::Stopped,
            ]
        );
    }

    #[test]
    fn test_marker_fires_once_per_crossing_backward() {
        let mut tl = Timeline::new(100).unwrap().with_frame_rate(20).unwrap();
        tl.add_marker("half", 50.0).unwrap();
        tl.set_direction(Direction::Backward);
        tl.rewind();
        tl.start();

        let events = tl.advance(60.0).unwrap();
        let markers: Vec<_> = events
            .iter()
            .filter(|ev| matches!(ev, TimelineEvent::Marker { .. }))
            .collect();
        assert_eq!(markers.len(), 1);

        // Advancing further does not re-fire it.
        let events = tl.advance(20.0).unwrap();
        assert!(!events
            .iter()
            .any(|ev| matches!(ev, TimelineEvent::Marker { .. })));
    }

    #[test]
    fn test_auto_reverse_flips_instead_of_wrapping() {
        let mut tl = Timeline::new(1000)
            .unwrap()
            .with_frame_rate(10)
            .unwrap()
            .with_repeat(Repeat::Count(2))
            .with_auto_reverse(true);
        tl.start();
        let events = tl.advance(1500.0).unwrap();

        assert_eq!(count_completed(&events), 1);
        assert_eq!(tl.direction(), Direction::Backward);
        assert!((tl.position_ms() - 500.0).abs() < 1e-6);
        assert!(tl.is_playing());

        // Finishing the reverse pass exhausts the repeat count at 0.
        let events = tl.advance(500.0).unwrap();
        assert_eq!(count_completed(&events), 1);
        assert_eq!(tl.state(), TimelineState::Stopped);
        assert_eq!(tl.position_ms(), 0.0);
    }

    #[test]
    fn test_rewind_while_stopped_keeps_state() {
        let mut tl = Timeline::new(1000).unwrap();
        tl.start();
        tl.advance(2000.0).unwrap();
        assert_eq!(tl.state(), TimelineState::Stopped);

        tl.rewind();
        assert_eq!(tl.position_ms(), 0.0);
        assert_eq!(tl.state(), TimelineState::Stopped);
    }

    #[test]
    fn test_pause_suspends_advancement() {
        let mut tl = Timeline::new(1000).unwrap();
        tl.start();
        tl.advance(100.0).unwrap();
        tl.pause();
        let events = tl.advance(100.0).unwrap();
        assert!(events.is_empty());
        assert!((tl.position_ms() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_skip_moves_without_events() {
        let mut tl = Timeline::new(1000).unwrap().with_frame_rate(10).unwrap();
        tl.start();
        tl.skip(3);
        assert!((tl.position_ms() - 300.0).abs() < 1e-6);
        // Skipping past the end clamps.
        tl.skip(100);
        assert_eq!(tl.position_ms(), 1000.0);
    }

    #[test]
    fn test_marker_validation() {
        let mut tl = Timeline::new(1000).unwrap();
        assert!(matches!(
            tl.add_marker("late", 1500.0),
            Err(AnimationError::MarkerOutOfRange(_))
        ));
        tl.add_marker("mid", 500.0).unwrap();
        assert!(matches!(
            tl.add_marker("mid", 250.0),
            Err(AnimationError::DuplicateMarker(_))
        ));
        assert!(tl.remove_marker("mid"));
        assert!(!tl.remove_marker("mid"));
    }

    #[test]
    fn test_from_frames_frame_grid() {
        let tl = Timeline::from_frames(10, 60).unwrap();
        assert_eq!(tl.n_frames(), 10);
        assert!((tl.frame_progress(5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_advancing_in_small_steps_matches_frame_grid() {
        let mut tl = Timeline::new(1000).unwrap().with_frame_rate(10).unwrap();
        tl.start();
        let mut all = Vec::new();
        for _ in 0..100 {
            all.extend(frames(&tl.advance(10.0).unwrap()));
        }
        assert_eq!(all, (1..=10).collect::<Vec<_>>());
    }
}
