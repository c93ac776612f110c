//! Time-sliced transform interpolation.
//!
//! A [`Tween`] moves one node from a start transform to a target transform
//! over a fixed duration. It never sleeps: the owner advances it with the
//! frame delta and writes the returned transform into the scene.

use instant::Duration;

use crate::data_structures::{instance::Instance, scene_graph::NodeId};

/// Cubic ease-out: fast start, gentle stop. Progress is clamped to `0..=1`.
pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t.clamp(0.0, 1.0)).powi(3)
}

#[derive(Clone, Debug)]
pub struct Tween {
    pub node: NodeId,
    from: Instance,
    to: Instance,
    elapsed: Duration,
    duration: Duration,
}

impl Tween {
    pub fn new(node: NodeId, from: Instance, to: Instance, duration: Duration) -> Self {
        Self {
            node,
            from,
            to,
            elapsed: Duration::ZERO,
            duration,
        }
    }

    pub fn target(&self) -> &Instance {
        &self.to
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /**
     * Advance by `dt` and return the transform for this frame.
     *
     * Once the duration has passed the exact target is returned instead of an
     * interpolated value, so finished tweens never leave rounding residue.
     */
    pub fn advance(&mut self, dt: Duration) -> Instance {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        if self.is_finished() {
            return self.to.clone();
        }
        self.from.lerp(&self.to, ease_out_cubic(self.progress()))
    }
}
