//! Triangle geometry kept on the CPU for hit testing.

use cgmath::Vector3;

use crate::pick::{Aabb, Ray};

/// Indexed triangle list in the local space of its node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<Vector3<f32>>,
    /// Counter-clockwise triangles, three indices each.
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn new(positions: Vec<Vector3<f32>>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }

    /// Append another primitive, shifting its indices past the existing positions.
    pub fn extend(&mut self, positions: impl IntoIterator<Item = Vector3<f32>>, indices: impl IntoIterator<Item = u32>) {
        let base = self.positions.len() as u32;
        self.positions.extend(positions);
        self.indices.extend(indices.into_iter().map(|index| index + base));
    }

    /// Triangles with all three indices in range.
    pub fn triangles(&self) -> impl Iterator<Item = [Vector3<f32>; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|triangle| {
            Some([
                *self.positions.get(triangle[0] as usize)?,
                *self.positions.get(triangle[1] as usize)?,
                *self.positions.get(triangle[2] as usize)?,
            ])
        })
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Distance to the nearest triangle in front of the ray, from either side.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        self.triangles()
            .filter_map(|triangle| ray.intersect_triangle(triangle))
            .reduce(f32::min)
    }
}
