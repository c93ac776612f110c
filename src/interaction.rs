//! Open/closed state machine of doors and drawers.
//!
//! Every configured part starts `Closed` at its baseline transform (the rest
//! pose found in the asset, after initial-state overrides and an optional
//! `closedPosition`). Toggling flips the phase immediately and starts a tween
//! from wherever the part currently is towards the pose of the new phase.
//! Each node has at most one tween: a toggle while a part is still moving
//! replaces the running tween, so rapid clicks reverse the motion instead of
//! queueing.

use std::collections::HashMap;

use instant::Duration;

use crate::{
    animation::Tween,
    config::{ModelConfig, Motion, PartKind},
    data_structures::{
        instance::Instance,
        scene_graph::{NodeId, SceneGraph},
    },
    error::ConfiguratorError,
    registry::ObjectRegistry,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Closed,
    Open,
}

impl Phase {
    pub fn toggled(self) -> Self {
        match self {
            Phase::Closed => Phase::Open,
            Phase::Open => Phase::Closed,
        }
    }
}

/// A node that moves in lockstep with a part (a logo plate on a drawer front).
#[derive(Clone, Debug)]
struct Follower {
    node: NodeId,
    baseline: Instance,
    open_pose: Instance,
}

#[derive(Clone, Debug)]
struct PartState {
    kind: PartKind,
    node: NodeId,
    phase: Phase,
    baseline: Instance,
    open_pose: Instance,
    followers: Vec<Follower>,
}

impl PartState {
    fn pose(&self, phase: Phase) -> &Instance {
        match phase {
            Phase::Closed => &self.baseline,
            Phase::Open => &self.open_pose,
        }
    }
}

fn open_pose(baseline: &Instance, motion: Motion) -> Instance {
    match motion {
        Motion::Rotate { axis, angle } => baseline.rotated(axis, angle),
        Motion::Slide { axis, offset } => baseline.translated(axis, offset),
    }
}

#[derive(Debug, Default)]
pub struct InteractionStateMachine {
    parts: HashMap<String, PartState>,
    tweens: HashMap<NodeId, Tween>,
    duration: Duration,
}

impl InteractionStateMachine {
    pub fn new(duration: Duration) -> Self {
        Self {
            parts: HashMap::new(),
            tweens: HashMap::new(),
            duration,
        }
    }

    /**
     * Register every part of `config.interactionGroups` that exists in `registry`.
     *
     * The baseline is captured here, once per model load, and the node is put
     * exactly onto it. Parts or linked nodes missing from the scene are
     * skipped and reported.
     */
    pub fn register(
        config: &ModelConfig,
        registry: &mut ObjectRegistry,
    ) -> (Self, Vec<ConfiguratorError>) {
        let mut machine = Self::new(config.animation_duration());
        let mut errors = Vec::new();

        for (kind, part) in config.parts() {
            if machine.parts.contains_key(&part.name) {
                log::warn!("{} is configured twice, keeping the first entry.", part.name);
                continue;
            }
            let Some(node) = registry.get(&part.name) else {
                log::warn!("interactionGroups references unknown object {}", part.name);
                errors.push(ConfiguratorError::missing(&part.name, "interactionGroups"));
                continue;
            };
            let Some(motion) = part.motion(kind) else {
                log::warn!("Drawer {} has no openOffset and can not move.", part.name);
                continue;
            };
            let scene = registry.scene_mut();
            let Some(authored) = scene.node(node).map(|n| n.transform.clone()) else {
                continue;
            };

            let mut baseline = authored;
            if let (Some(closed), Motion::Slide { axis, .. }) = (part.closed_position, motion) {
                baseline.set_position_on(axis, closed);
            }
            if let Some(n) = scene.node_mut(node) {
                n.transform = baseline.clone();
            }

            let mut followers = Vec::new();
            for linked in &part.linked {
                let Some(follower_node) = registry.get(&linked.name) else {
                    log::warn!("{} links unknown object {}", part.name, linked.name);
                    errors.push(ConfiguratorError::missing(&linked.name, "interactionGroups"));
                    continue;
                };
                let Some(motion) = linked.motion() else {
                    log::warn!("Linked object {} of {} has no motion.", linked.name, part.name);
                    continue;
                };
                let Some(follower_baseline) = registry
                    .scene()
                    .node(follower_node)
                    .map(|n| n.transform.clone())
                else {
                    continue;
                };
                followers.push(Follower {
                    node: follower_node,
                    open_pose: open_pose(&follower_baseline, motion),
                    baseline: follower_baseline,
                });
            }

            machine.parts.insert(
                part.name.clone(),
                PartState {
                    kind,
                    node,
                    phase: Phase::Closed,
                    open_pose: open_pose(&baseline, motion),
                    baseline,
                    followers,
                },
            );
        }
        log::info!("Registered {} interactive parts", machine.parts.len());
        (machine, errors)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn kind(&self, name: &str) -> Option<PartKind> {
        self.parts.get(name).map(|part| part.kind)
    }

    pub fn phase(&self, name: &str) -> Option<Phase> {
        self.parts.get(name).map(|part| part.phase)
    }

    pub fn baseline(&self, name: &str) -> Option<&Instance> {
        self.parts.get(name).map(|part| &part.baseline)
    }

    pub fn open_pose(&self, name: &str) -> Option<&Instance> {
        self.parts.get(name).map(|part| &part.open_pose)
    }

    pub fn is_animating(&self, name: &str) -> bool {
        self.parts
            .get(name)
            .is_some_and(|part| self.tweens.contains_key(&part.node))
    }

    pub fn active_tweens(&self) -> usize {
        self.tweens.len()
    }

    /// Flip the phase of `name` and animate towards it. Unknown names are a no-op.
    pub fn toggle(&mut self, name: &str, scene: &SceneGraph) -> Option<Phase> {
        let target = self.parts.get(name)?.phase.toggled();
        self.set_phase(name, target, scene)
    }

    /// Animate `name` towards `phase`. Does nothing if it is already in that phase.
    pub fn set_phase(&mut self, name: &str, phase: Phase, scene: &SceneGraph) -> Option<Phase> {
        let Some(part) = self.parts.get_mut(name) else {
            log::debug!("{} is not an interactive part", name);
            return None;
        };
        if part.phase == phase {
            return Some(phase);
        }
        part.phase = phase;
        let duration = self.duration;

        let mut started = vec![(part.node, part.pose(phase).clone())];
        started.extend(part.followers.iter().map(|follower| {
            let target = match phase {
                Phase::Closed => follower.baseline.clone(),
                Phase::Open => follower.open_pose.clone(),
            };
            (follower.node, target)
        }));
        for (node, target) in started {
            let Some(current) = scene.node(node).map(|n| n.transform.clone()) else {
                continue;
            };
            // replaces whatever tween was running on this node
            self.tweens.insert(node, Tween::new(node, current, target, duration));
        }
        log::debug!("{} -> {:?}", name, phase);
        Some(phase)
    }

    /// Move every part of `kind` to `phase`. Returns how many parts started moving.
    pub fn set_all(&mut self, kind: PartKind, phase: Phase, scene: &SceneGraph) -> usize {
        let names: Vec<String> = self
            .parts
            .iter()
            .filter(|(_, part)| part.kind == kind && part.phase != phase)
            .map(|(name, _)| name.clone())
            .collect();
        for name in &names {
            self.set_phase(name, phase, scene);
        }
        names.len()
    }

    /// Put `name` back to its baseline instantly, cancelling any motion.
    pub fn reset(&mut self, name: &str, scene: &mut SceneGraph) -> bool {
        let Some(part) = self.parts.get_mut(name) else {
            return false;
        };
        part.phase = Phase::Closed;
        let snaps = std::iter::once((part.node, part.baseline.clone())).chain(
            part.followers
                .iter()
                .map(|follower| (follower.node, follower.baseline.clone())),
        );
        for (node, baseline) in snaps {
            self.tweens.remove(&node);
            if let Some(n) = scene.node_mut(node) {
                n.transform = baseline;
            }
        }
        true
    }

    /// Advance all tweens by `dt` and write the results into `scene`.
    pub fn update(&mut self, dt: Duration, scene: &mut SceneGraph) {
        self.tweens.retain(|node, tween| {
            let transform = tween.advance(dt);
            match scene.node_mut(*node) {
                Some(n) => n.transform = transform,
                None => return false,
            }
            !tween.is_finished()
        });
    }

    /// Drop every running tween without touching the scene.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.tweens.len();
        self.tweens.clear();
        cancelled
    }
}
