//! Exact intersection of small point-cloud meshes
//!
//! Each point cloud is triangulated through its convex hull, then every
//! triangle of one hull is tested against every triangle of the other. A hull
//! sitting wholly inside the other has no crossing faces, so vertices are also
//! tested against the other hull's face planes. The cost is O(triangles^2),
//! so this is only used for small clouds.

use parry3d::math::{Point, Real};
use parry3d::transformation;
use thiserror::Error;

use crate::core::types::Vec3;
use crate::math::Aabb;

/// Minimum number of points a cloud needs to be triangulated
pub const MIN_MESH_POINTS: usize = 5;

/// Tolerance for barycentric containment
const BARYCENTRIC_EPS: f32 = 1e-5;

/// Faces whose unit normals differ by less than this (cross product length) are
/// treated as parallel
const PARALLEL_EPS: f32 = 1e-6;

/// Relative tolerance for flat (coplanar or collinear) clouds
const FLATNESS_EPS: f32 = 1e-6;

/// Relative tolerance for a vertex lying on a hull face
const CONTAINMENT_EPS: f32 = 1e-5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("need at least {min} points to triangulate, got {got}")]
    TooFewPoints { min: usize, got: usize },

    #[error("points are coplanar or otherwise degenerate")]
    Degenerate,
}

/// Convex-hull triangulation of a point cloud
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    /// Outward unit normal and plane offset per non-degenerate face
    planes: Vec<(Vec3, f32)>,
    aabb: Aabb,
}

impl TriangleMesh {
    /// Triangulate a point cloud
    pub fn from_points(points: &[Vec3]) -> Result<Self, MeshError> {
        if points.len() < MIN_MESH_POINTS {
            return Err(MeshError::TooFewPoints { min: MIN_MESH_POINTS, got: points.len() });
        }
        if !has_volume(points) {
            return Err(MeshError::Degenerate);
        }

        let parry_points: Vec<Point<Real>> = points
            .iter()
            .map(|p| Point::new(p.x, p.y, p.z))
            .collect();
        let (hull_points, triangles) =
            transformation::try_convex_hull(&parry_points).map_err(|_| MeshError::Degenerate)?;
        if triangles.is_empty() {
            return Err(MeshError::Degenerate);
        }

        let vertices: Vec<Vec3> = hull_points.iter().map(|p| Vec3::new(p.x, p.y, p.z)).collect();
        let aabb = Aabb::from_points(&vertices).ok_or(MeshError::Degenerate)?;
        let planes = face_planes(&vertices, &triangles);
        if planes.is_empty() {
            return Err(MeshError::Degenerate);
        }
        Ok(Self { vertices, triangles, planes, aabb })
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Local-space bounds
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Largest distance from the local origin to a hull vertex
    pub fn bounding_radius(&self) -> f32 {
        self.vertices.iter().map(|v| v.length()).fold(0.0, f32::max)
    }

    fn triangle(&self, index: usize, offset: Vec3) -> [Vec3; 3] {
        let [a, b, c] = self.triangles[index];
        [
            self.vertices[a as usize] + offset,
            self.vertices[b as usize] + offset,
            self.vertices[c as usize] + offset,
        ]
    }

    /// Whether a local-space point lies inside or on the hull
    pub fn contains(&self, point: Vec3) -> bool {
        let tol = self.aabb.size().max_element() * CONTAINMENT_EPS;
        self.planes.iter().all(|&(normal, d)| normal.dot(point) - d <= tol)
    }

    /// Whether this mesh placed at `offset` intersects `other` placed at `other_offset`
    pub fn intersects(&self, offset: Vec3, other: &TriangleMesh, other_offset: Vec3) -> bool {
        if !self.aabb.translated(offset).intersects(&other.aabb.translated(other_offset)) {
            return false;
        }
        let shift = offset - other_offset;
        if self.vertices.iter().any(|&v| other.contains(v + shift))
            || other.vertices.iter().any(|&v| self.contains(v - shift))
        {
            return true;
        }
        for i in 0..self.triangles.len() {
            let t1 = self.triangle(i, offset);
            for j in 0..other.triangles.len() {
                if triangles_intersect(&t1, &other.triangle(j, other_offset)) {
                    return true;
                }
            }
        }
        false
    }
}

/// Triangulate two world-space point clouds and test them for intersection
pub fn meshes_intersect(a: &[Vec3], b: &[Vec3]) -> Result<bool, MeshError> {
    let mesh_a = TriangleMesh::from_points(a)?;
    let mesh_b = TriangleMesh::from_points(b)?;
    Ok(mesh_a.intersects(Vec3::ZERO, &mesh_b, Vec3::ZERO))
}

/// Outward face planes of a closed convex hull, skipping zero-area faces
fn face_planes(vertices: &[Vec3], triangles: &[[u32; 3]]) -> Vec<(Vec3, f32)> {
    let centroid = vertices.iter().copied().sum::<Vec3>() / vertices.len().max(1) as f32;
    triangles
        .iter()
        .filter_map(|&[a, b, c]| {
            let (a, b, c) = (vertices[a as usize], vertices[b as usize], vertices[c as usize]);
            let mut normal = (b - a).cross(c - a).try_normalize()?;
            if normal.dot(centroid - a) > 0.0 {
                normal = -normal;
            }
            Some((normal, normal.dot(a)))
        })
        .collect()
}

/// Whether the cloud spans three dimensions
fn has_volume(points: &[Vec3]) -> bool {
    let Some(aabb) = Aabb::from_points(points) else {
        return false;
    };
    let scale = aabb.size().max_element();
    if scale <= 0.0 {
        return false;
    }
    let tol = scale * FLATNESS_EPS;

    let p0 = points[0];
    let Some(p1) = farthest(points, |p| p.distance(p0)) else {
        return false;
    };
    let axis = (p1 - p0).normalize_or_zero();
    let Some(p2) = farthest(points, |p| (p - p0).cross(axis).length()) else {
        return false;
    };
    let normal = (p1 - p0).cross(p2 - p0).normalize_or_zero();
    if normal == Vec3::ZERO {
        return false;
    }
    points.iter().any(|p| (*p - p0).dot(normal).abs() > tol)
}

fn farthest(points: &[Vec3], metric: impl Fn(Vec3) -> f32) -> Option<Vec3> {
    points
        .iter()
        .copied()
        .max_by(|a, b| metric(*a).total_cmp(&metric(*b)))
}

/// Whether two triangles intersect.
///
/// Degenerate and near-parallel pairs are rejected. Otherwise each edge of
/// either triangle is intersected with the other triangle's plane, and the
/// pair intersects if any such point lies inside both triangles.
pub fn triangles_intersect(t1: &[Vec3; 3], t2: &[Vec3; 3]) -> bool {
    let n1 = (t1[1] - t1[0]).cross(t1[2] - t1[0]);
    let n2 = (t2[1] - t2[0]).cross(t2[2] - t2[0]);
    let (Some(u1), Some(u2)) = (n1.try_normalize(), n2.try_normalize()) else {
        return false;
    };
    if u1.cross(u2).length() < PARALLEL_EPS {
        return false;
    }

    edges_hit(t1, t2, n2) || edges_hit(t2, t1, n1)
}

/// Does any edge of `edges_of` cross `other`'s plane at a point inside both triangles
fn edges_hit(edges_of: &[Vec3; 3], other: &[Vec3; 3], other_normal: Vec3) -> bool {
    (0..3).any(|i| {
        let p = edges_of[i];
        let q = edges_of[(i + 1) % 3];
        match edge_plane_point(p, q, other[0], other_normal) {
            Some(hit) => point_in_triangle(hit, edges_of) && point_in_triangle(hit, other),
            None => false,
        }
    })
}

/// Point where segment `p..q` meets the plane through `origin` with `normal`
fn edge_plane_point(p: Vec3, q: Vec3, origin: Vec3, normal: Vec3) -> Option<Vec3> {
    let dp = (p - origin).dot(normal);
    let dq = (q - origin).dot(normal);
    if dp * dq > 0.0 || dp == dq {
        return None;
    }
    let t = dp / (dp - dq);
    Some(p + (q - p) * t)
}

/// Barycentric containment test; degenerate triangles contain nothing
pub fn point_in_triangle(point: Vec3, triangle: &[Vec3; 3]) -> bool {
    let v0 = triangle[1] - triangle[0];
    let v1 = triangle[2] - triangle[0];
    let v2 = point - triangle[0];

    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);

    let denom = d00 * d11 - d01 * d01;
    if denom == 0.0 {
        return false;
    }

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    v >= -BARYCENTRIC_EPS && w >= -BARYCENTRIC_EPS && v + w <= 1.0 + BARYCENTRIC_EPS
}
