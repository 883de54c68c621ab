//! Scores: dependency graphs sequencing multiple timelines.
//!
//! A score arranges timelines in a directed acyclic graph. Each edge
//! carries a trigger: a `StartAfter` child starts when its parent
//! completes, a `StartWith` child starts together with its parent. Cycle
//! insertion fails at `append` time, so playback can never deadlock.

use indexmap::IndexMap;

use crate::error::{AnimationError, Result};
use crate::timeline::TimelineId;

/// Identifier for a score registered with a master clock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScoreId(pub u64);

/// When a child timeline starts relative to its parent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Start when the parent completes
    StartAfter,
    /// Start together with the parent
    StartWith,
}

#[derive(Clone, Debug, Default)]
struct ScoreNode {
    children: Vec<(TimelineId, Trigger)>,
    in_degree: usize,
}

/// A DAG of timelines with start-after/start-with edges
#[derive(Clone, Debug, Default)]
pub struct Score {
    nodes: IndexMap<TimelineId, ScoreNode>,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a timeline to the score.
    ///
    /// With `parent` of `None` the timeline becomes a root and starts when
    /// the score starts. Otherwise an edge from `parent` is added with the
    /// given trigger. Fails if the parent is unknown or the edge would
    /// close a cycle; on failure nothing is changed.
    pub fn append(
        &mut self,
        parent: Option<TimelineId>,
        timeline: TimelineId,
        trigger: Trigger,
    ) -> Result<()> {
        let Some(parent) = parent else {
            self.nodes.entry(timeline).or_default();
            return Ok(());
        };

        if !self.nodes.contains_key(&parent) {
            return Err(AnimationError::UnknownScoreTimeline(parent));
        }
        if parent == timeline || self.reaches(timeline, parent) {
            return Err(AnimationError::ScoreCycle(timeline));
        }

        self.nodes.entry(timeline).or_default().in_degree += 1;
        self.nodes
            .get_mut(&parent)
            .expect("parent checked above")
            .children
            .push((timeline, trigger));
        Ok(())
    }

    /// Whether `from` can reach `to` along existing edges
    fn reaches(&self, from: TimelineId, to: TimelineId) -> bool {
        let Some(node) = self.nodes.get(&from) else {
            return false;
        };
        node.children
            .iter()
            .any(|&(child, _)| child == to || self.reaches(child, to))
    }

    pub fn contains(&self, timeline: TimelineId) -> bool {
        self.nodes.contains_key(&timeline)
    }

    /// Every timeline referenced by the score, in insertion order
    pub fn timelines(&self) -> impl Iterator<Item = TimelineId> + '_ {
        self.nodes.keys().copied()
    }

    /// Timelines with no incoming edges
    pub fn roots(&self) -> Vec<TimelineId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.in_degree == 0)
            .map(|(&id, _)| id)
            .collect()
    }

    /// `timeline` plus every `StartWith` descendant, transitively.
    ///
    /// This is the set that must begin playing together when `timeline`
    /// starts.
    pub fn start_group(&self, timeline: TimelineId) -> Vec<TimelineId> {
        let mut group = Vec::new();
        self.collect_start_group(timeline, &mut group);
        group
    }

    fn collect_start_group(&self, timeline: TimelineId, group: &mut Vec<TimelineId>) {
        if group.contains(&timeline) {
            return;
        }
        group.push(timeline);
        if let Some(node) = self.nodes.get(&timeline) {
            for &(child, trigger) in &node.children {
                if trigger == Trigger::StartWith {
                    self.collect_start_group(child, group);
                }
            }
        }
    }

    /// Direct children of `timeline` connected by `trigger` edges
    pub fn children_of(&self, timeline: TimelineId, trigger: Trigger) -> Vec<TimelineId> {
        self.nodes
            .get(&timeline)
            .map(|node| {
                node.children
                    .iter()
                    .filter(|&&(_, t)| t == trigger)
                    .map(|&(child, _)| child)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Timelines to start when `timeline` completes (with their
    /// start-with groups)
    pub fn on_completed(&self, timeline: TimelineId) -> Vec<TimelineId> {
        let mut to_start = Vec::new();
        if let Some(node) = self.nodes.get(&timeline) {
            for &(child, trigger) in &node.children {
                if trigger == Trigger::StartAfter {
                    self.collect_start_group(child, &mut to_start);
                }
            }
        }
        to_start
    }
}
