//! Object picking and selection.
//!
//! This module implements CPU ray picking against the scene graph:
//!
//! 1. Convert the pointer coordinate into a world-space ray (see [`crate::camera::Camera::screen_to_ray`])
//! 2. Bring the ray into the local space of every effectively visible mesh node, reject it
//!    against the node's bounds and then test the node's triangles. Nodes without triangles
//!    are treated as solid boxes
//! 3. Take the closest hit and walk up its ancestor chain until a node is found that the
//!    caller considers interactive
//!
//! Step 3 exists because clickable geometry usually sits several levels below
//! the door or drawer group that actually moves.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Transform, Vector3};

use crate::data_structures::scene_graph::{NodeId, SceneGraph, SceneNode};

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vector3<f32>,
    /// Always normalized.
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// The ray expressed in the space `matrix` maps into.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        let origin = matrix.transform_point(Point3::from_vec(self.origin));
        Self::new(origin.to_vec(), matrix.transform_vector(self.direction))
    }

    /// Möller-Trumbore test against one triangle, culling neither face.
    pub fn intersect_triangle(&self, [a, b, c]: [Vector3<f32>; 3]) -> Option<f32> {
        let edge_ab = b - a;
        let edge_ac = c - a;
        let p = self.direction.cross(edge_ac);
        let det = edge_ab.dot(p);
        if det.abs() < 1e-9 {
            // parallel to the triangle plane
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge_ab);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge_ac.dot(q) * inv_det;
        (t > 1e-6).then_some(t)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vector3<f32>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |aabb, p| Self {
            min: Vector3::new(aabb.min.x.min(p.x), aabb.min.y.min(p.y), aabb.min.z.min(p.z)),
            max: Vector3::new(aabb.max.x.max(p.x), aabb.max.y.max(p.y), aabb.max.z.max(p.z)),
        }))
    }

    pub fn merge(&self, other: &Aabb) -> Aabb {
        Self {
            min: Vector3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Vector3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /**
     * Slab test, one axis at a time.
     *
     * Returns the distance to the entry point, or to the exit point when the
     * ray starts inside the box.
     */
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut entry = f32::NEG_INFINITY;
        let mut exit = f32::INFINITY;
        for axis in 0..3 {
            let (origin, direction) = (ray.origin[axis], ray.direction[axis]);
            if direction.abs() < f32::EPSILON {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }
            let near = (self.min[axis] - origin) / direction;
            let far = (self.max[axis] - origin) / direction;
            entry = entry.max(near.min(far));
            exit = exit.min(near.max(far));
            if entry > exit {
                return None;
            }
        }
        match (entry >= 0.0, exit >= 0.0) {
            (true, _) => Some(entry),
            (false, true) => Some(exit),
            (false, false) => None,
        }
    }
}

/// Result of a ray cast against the scene graph.
#[derive(Debug, Clone, Copy)]
pub struct PickResult {
    pub node: NodeId,
    pub distance: f32,
    pub intersection_point: Vector3<f32>,
}

/// World-space distance at which `ray` hits the geometry of `node`.
fn intersect_node(node: &SceneNode, world: &Matrix4<f32>, ray: &Ray) -> Option<f32> {
    let bounds = node.bounds?;
    let local = ray.transformed(&world.invert()?);
    let box_hit = bounds.intersect_ray(&local)?;
    let t = match &node.geometry {
        Some(geometry) => geometry.intersect_ray(&local)?,
        None => box_hit,
    };
    let hit = world.transform_point(Point3::from_vec(local.point_at(t)));
    Some((hit.to_vec() - ray.origin).magnitude())
}

/// Closest effectively visible mesh node hit by `ray`.
pub fn pick_node(scene: &SceneGraph, ray: &Ray) -> Option<PickResult> {
    let mut closest: Option<PickResult> = None;
    for (id, node) in scene.iter() {
        if !node.is_mesh() || !scene.is_effectively_visible(id) {
            continue;
        }
        let Some(distance) = intersect_node(node, &scene.world_matrix(id), ray) else {
            continue;
        };
        if closest.is_none_or(|result| distance < result.distance) {
            closest = Some(PickResult {
                node: id,
                distance,
                intersection_point: ray.point_at(distance),
            });
        }
    }
    closest
}

/**
 * Resolve a ray to the name of the nearest interactive part.
 *
 * Only the closest visible hit is considered. From there the ancestor chain
 * (starting with the hit node itself) is searched for a visible, named node
 * for which `is_interactive` holds. Geometry behind the first hit is never
 * selected, and neither is anything hidden.
 */
pub fn pick_part(
    scene: &SceneGraph,
    ray: &Ray,
    is_interactive: impl Fn(&str) -> bool,
) -> Option<String> {
    let hit = pick_node(scene, ray)?;
    let part = scene.ancestors(hit.node).find_map(|ancestor| {
        let node = scene.node(ancestor)?;
        if !node.visible {
            return None;
        }
        node.name().filter(|name| is_interactive(name))
    });
    match part {
        Some(name) => {
            log::info!("Selected part {} at distance {:.3}", name, hit.distance);
            Some(name.to_string())
        }
        None => {
            log::debug!("Hit {:?} has no interactive ancestor", hit.node);
            None
        }
    }
}
