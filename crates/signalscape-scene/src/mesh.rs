//! TriangleIndex: material-tagged triangles under a bounding volume hierarchy.
//!
//! Triangles are added through the builder methods, then [`TriangleIndex::build`]
//! sorts them into a median-split BVH. Queries against an index with pending
//! additions fail with [`GeometryError::NotBuilt`].

use glam::DVec3;

use signalscape_core::enums::MaterialClass;

use crate::index::{safe_normalize, GeometryError, GeometryIndex, Hit};

/// Maximum triangles per BVH leaf.
const LEAF_SIZE: usize = 4;

/// Traversal stack depth. A median split over 2^60 triangles stays well below it.
const MAX_STACK: usize = 64;

/// Hits closer than this to the ray origin are ignored (meters).
const MIN_HIT_DISTANCE: f64 = 1e-6;

/// Determinant below which a ray is treated as parallel to a triangle.
const PARALLEL_EPSILON: f64 = 1e-12;

/// A single surface triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: DVec3,
    pub b: DVec3,
    pub c: DVec3,
    pub material: MaterialClass,
}

impl Triangle {
    pub fn new(a: DVec3, b: DVec3, c: DVec3, material: MaterialClass) -> Self {
        Self { a, b, c, material }
    }

    fn centroid(&self) -> DVec3 {
        (self.a + self.b + self.c) / 3.0
    }

    fn bounds(&self) -> Aabb {
        Aabb {
            min: self.a.min(self.b).min(self.c),
            max: self.a.max(self.b).max(self.c),
        }
    }

    /// Double-sided Möller–Trumbore test. `dir` must be unit length.
    fn intersect(&self, origin: DVec3, dir: DVec3, max_distance: f64) -> Option<f64> {
        let e1 = self.b - self.a;
        let e2 = self.c - self.a;
        let p = dir.cross(e2);
        let det = e1.dot(p);
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = origin - self.a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(e1);
        let v = dir.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = e2.dot(q) * inv_det;
        (t > MIN_HIT_DISTANCE && t <= max_distance).then_some(t)
    }
}

#[derive(Debug, Clone, Copy)]
struct Aabb {
    min: DVec3,
    max: DVec3,
}

impl Aabb {
    fn empty() -> Self {
        Self {
            min: DVec3::splat(f64::INFINITY),
            max: DVec3::splat(f64::NEG_INFINITY),
        }
    }

    fn union(self, other: Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    fn include(self, point: DVec3) -> Aabb {
        Aabb {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Slab test. Returns the entry distance if the ray enters before `max_distance`.
    fn entry(&self, origin: DVec3, inv_dir: DVec3, max_distance: f64) -> Option<f64> {
        let t1 = (self.min - origin) * inv_dir;
        let t2 = (self.max - origin) * inv_dir;
        // f64::min/max drop NaN from 0 * inf when the origin lies on a slab.
        let near = t1.x.min(t2.x).max(t1.y.min(t2.y)).max(t1.z.min(t2.z));
        let far = t1.x.max(t2.x).min(t1.y.max(t2.y)).min(t1.z.max(t2.z));
        let near = near.max(0.0);
        (near <= far && near <= max_distance).then_some(near)
    }
}

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf { start: usize, count: usize },
    Interior { left: usize, right: usize },
}

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bounds: Aabb,
    kind: NodeKind,
}

/// Nearest-hit index over material-tagged triangles.
#[derive(Debug, Clone, Default)]
pub struct TriangleIndex {
    triangles: Vec<Triangle>,
    nodes: Vec<BvhNode>,
    dirty: bool,
}

impl TriangleIndex {
    /// Create an empty, built index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over `triangles` in one step.
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let mut index = Self {
            triangles,
            nodes: Vec::new(),
            dirty: true,
        };
        index.build();
        index
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Whether all added triangles are covered by the hierarchy.
    pub fn is_built(&self) -> bool {
        !self.dirty
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
        self.dirty = true;
    }

    /// Add a planar quad `a b c d` (in winding order) as two triangles.
    pub fn add_quad(&mut self, a: DVec3, b: DVec3, c: DVec3, d: DVec3, material: MaterialClass) {
        self.add_triangle(Triangle::new(a, b, c, material));
        self.add_triangle(Triangle::new(a, c, d, material));
    }

    /// Add an axis-aligned box as 12 triangles.
    pub fn add_box(&mut self, min: DVec3, max: DVec3, material: MaterialClass) {
        let (lo, hi) = (min.min(max), min.max(max));
        let corner = |x: f64, y: f64, z: f64| DVec3::new(x, y, z);
        let [x0, y0, z0] = lo.to_array();
        let [x1, y1, z1] = hi.to_array();

        let faces = [
            // -X, +X
            [corner(x0, y0, z0), corner(x0, y0, z1), corner(x0, y1, z1), corner(x0, y1, z0)],
            [corner(x1, y0, z0), corner(x1, y1, z0), corner(x1, y1, z1), corner(x1, y0, z1)],
            // -Y, +Y
            [corner(x0, y0, z0), corner(x1, y0, z0), corner(x1, y0, z1), corner(x0, y0, z1)],
            [corner(x0, y1, z0), corner(x0, y1, z1), corner(x1, y1, z1), corner(x1, y1, z0)],
            // -Z, +Z
            [corner(x0, y0, z0), corner(x0, y1, z0), corner(x1, y1, z0), corner(x1, y0, z0)],
            [corner(x0, y0, z1), corner(x1, y0, z1), corner(x1, y1, z1), corner(x0, y1, z1)],
        ];
        for [a, b, c, d] in faces {
            self.add_quad(a, b, c, d, material);
        }
    }

    /// Add a square horizontal plane of half-size `half_extent` centered on the origin.
    pub fn add_ground(&mut self, half_extent: f64, height: f64, material: MaterialClass) {
        let h = half_extent.abs();
        self.add_quad(
            DVec3::new(-h, height, -h),
            DVec3::new(-h, height, h),
            DVec3::new(h, height, h),
            DVec3::new(h, height, -h),
            material,
        );
    }

    /// (Re)build the hierarchy over all triangles.
    pub fn build(&mut self) {
        self.nodes.clear();
        if !self.triangles.is_empty() {
            self.nodes.reserve(2 * self.triangles.len() / LEAF_SIZE + 1);
            self.build_node(0, self.triangles.len());
        }
        self.dirty = false;
        tracing::debug!(
            triangles = self.triangles.len(),
            nodes = self.nodes.len(),
            "built triangle index"
        );
    }

    /// Build the subtree over `triangles[start..end]`, returning its node index.
    fn build_node(&mut self, start: usize, end: usize) -> usize {
        let slice = &self.triangles[start..end];
        let bounds = slice.iter().fold(Aabb::empty(), |b, t| b.union(t.bounds()));
        let node_index = self.nodes.len();
        let count = end - start;

        if count <= LEAF_SIZE {
            self.nodes.push(BvhNode {
                bounds,
                kind: NodeKind::Leaf { start, count },
            });
            return node_index;
        }

        let centroid_bounds = slice
            .iter()
            .fold(Aabb::empty(), |b, t| b.include(t.centroid()));
        let extent = centroid_bounds.max - centroid_bounds.min;
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };

        let half = count / 2;
        self.triangles[start..end].select_nth_unstable_by(half, |a, b| {
            a.centroid()[axis].total_cmp(&b.centroid()[axis])
        });

        // Placeholder, patched once both children exist.
        self.nodes.push(BvhNode {
            bounds,
            kind: NodeKind::Leaf { start, count: 0 },
        });
        let left = self.build_node(start, start + half);
        let right = self.build_node(start + half, end);
        self.nodes[node_index].kind = NodeKind::Interior { left, right };
        node_index
    }
}

impl GeometryIndex for TriangleIndex {
    fn nearest_hit(
        &self,
        origin: DVec3,
        direction: DVec3,
        max_distance: f64,
    ) -> Result<Option<Hit>, GeometryError> {
        if self.dirty {
            return Err(GeometryError::NotBuilt);
        }
        let dir = safe_normalize(direction).ok_or(GeometryError::DegenerateRay(direction))?;
        if self.nodes.is_empty() {
            return Ok(None);
        }

        let inv_dir = dir.recip();
        let mut best_t = max_distance;
        let mut best: Option<&Triangle> = None;

        let mut stack = [0usize; MAX_STACK];
        let mut depth = 1;
        while depth > 0 {
            depth -= 1;
            let node = &self.nodes[stack[depth]];
            if node.bounds.entry(origin, inv_dir, best_t).is_none() {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, count } => {
                    for tri in &self.triangles[start..start + count] {
                        if let Some(t) = tri.intersect(origin, dir, best_t) {
                            best_t = t;
                            best = Some(tri);
                        }
                    }
                }
                NodeKind::Interior { left, right } => {
                    if depth + 2 <= MAX_STACK {
                        stack[depth] = right;
                        stack[depth + 1] = left;
                        depth += 2;
                    }
                }
            }
        }

        Ok(best.map(|tri| {
            let raw = (tri.b - tri.a).cross(tri.c - tri.a);
            let mut normal = safe_normalize(raw).unwrap_or(DVec3::Y);
            if normal.dot(dir) > 0.0 {
                normal = -normal;
            }
            Hit {
                point: origin + dir * best_t,
                distance: best_t,
                normal,
                material: tri.material,
            }
        }))
    }
}
