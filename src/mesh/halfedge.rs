//! Half-edge mesh data structure.
//!
//! The mesh owns four dense tables (vertices, edges, faces, half-edges).
//! Every relation between entities is stored as a typed handle into one of
//! those tables, so the whole structure is freed as one unit and never forms
//! an ownership cycle.
//!
//! # Structure
//!
//! - Each undirected **edge** owns two **half-edges** pointing in opposite
//!   directions; they are each other's **twin**.
//! - Each half-edge knows its origin vertex, its edge, its face (if any), and
//!   the **next**/**prev** half-edges along the loop it lies on.
//! - Vertices, edges and faces each keep one incident half-edge as a
//!   traversal anchor.
//!
//! # Boundary Handling
//!
//! A half-edge whose side of an edge is not bordered by any face has no face
//! and is flagged `on_boundary`. Boundary half-edges are linked through
//! `next`/`prev` into closed loops, one loop per hole of the surface, so every
//! half-edge lies on exactly one cycle.

use nalgebra::{Point3, Vector3};

use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// A mesh vertex.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// Position in model space.
    pub position: Point3<f64>,

    /// Some half-edge originating at this vertex.
    /// `None` for vertices that no face references.
    pub halfedge: Option<HalfEdgeId<I>>,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new vertex at the given position, with no anchor yet.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: None,
        }
    }
}

/// An undirected edge between two vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge<I: MeshIndex = u32> {
    /// One of the two half-edges of this edge.
    pub halfedge: HalfEdgeId<I>,
}

/// One directed side of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// Origin vertex.
    pub vert: VertexId<I>,

    /// The edge this half-edge belongs to.
    pub edge: EdgeId<I>,

    /// The face this half-edge borders. `None` on the boundary.
    pub face: Option<FaceId<I>>,

    /// The opposite half-edge of the same edge.
    pub twin: HalfEdgeId<I>,

    /// The next half-edge around the face or boundary loop.
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face or boundary loop.
    pub prev: HalfEdgeId<I>,

    /// Whether no face borders this side of the edge.
    pub on_boundary: bool,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Whether no face borders this half-edge.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.on_boundary
    }
}

/// A triangular face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face<I: MeshIndex = u32> {
    /// One half-edge of this face's cycle.
    pub halfedge: HalfEdgeId<I>,
}

/// A half-edge mesh for triangle meshes.
///
/// Built by [`build_from_buffers`](super::build_from_buffers); connectivity is
/// fixed afterwards. Vertex positions may still be edited through
/// [`set_position`](Self::set_position).
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) verts: Vec<Vertex<I>>,
    pub(crate) edges: Vec<Edge<I>>,
    pub(crate) faces: Vec<Face<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// An empty mesh with no entities.
    pub fn new() -> Self {
        Self {
            verts: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
            halfedges: Vec::new(),
        }
    }

    // --- tables and counts ---

    /// Number of entries in the vertex table.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.verts.len()
    }

    /// Get the number of edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of half-edges; always twice the edge count.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// The vertex table.
    #[inline]
    pub fn verts(&self) -> &[Vertex<I>] {
        &self.verts
    }

    /// The edge table.
    #[inline]
    pub fn edges(&self) -> &[Edge<I>] {
        &self.edges
    }

    /// The face table.
    #[inline]
    pub fn faces(&self) -> &[Face<I>] {
        &self.faces
    }

    /// The half-edge table.
    #[inline]
    pub fn halfedges(&self) -> &[HalfEdge<I>] {
        &self.halfedges
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.verts[id.index()]
    }

    /// Get an edge by ID.
    #[inline]
    pub fn edge(&self, id: EdgeId<I>) -> &Edge<I> {
        &self.edges[id.index()]
    }

    /// Half-edge record for `id`.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Position of `v`.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex. Connectivity is unaffected.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.verts[v.index()].position = pos;
    }

    // --- navigation ---

    /// The half-edge on the other side of the same edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).twin
    }

    /// Get the next half-edge around the face or boundary loop.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face or boundary loop.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Vertex `he` starts at.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).vert
    }

    /// Vertex `he` points to, read through its twin.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.origin(self.twin(he))
    }

    /// Get the edge of a half-edge.
    #[inline]
    pub fn edge_of(&self, he: HalfEdgeId<I>) -> EdgeId<I> {
        self.halfedge(he).edge
    }

    /// Get the face of a half-edge, `None` on the boundary.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> Option<FaceId<I>> {
        self.halfedge(he).face
    }

    /// The two endpoints of an edge, anchor half-edge origin first.
    pub fn edge_vertices(&self, e: EdgeId<I>) -> [VertexId<I>; 2] {
        let he = self.edge(e).halfedge;
        [self.origin(he), self.dest(he)]
    }

    /// Whether `he` has no face.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Check if an edge is bordered by only one face.
    #[inline]
    pub fn is_boundary_edge(&self, e: EdgeId<I>) -> bool {
        let he = self.edge(e).halfedge;
        self.is_boundary_halfedge(he) || self.is_boundary_halfedge(self.twin(he))
    }

    /// Check if a vertex has no incident half-edge at all.
    #[inline]
    pub fn is_isolated_vertex(&self, v: VertexId<I>) -> bool {
        self.vertex(v).halfedge.is_none()
    }

    /// Check if a vertex lies on a boundary loop.
    ///
    /// Isolated vertices are not on any boundary.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        self.vertex_halfedges(v)
            .any(|he| self.is_boundary_halfedge(he))
    }

    /// Whether the surface has no boundary.
    pub fn is_closed(&self) -> bool {
        !self.halfedges.iter().any(|he| he.on_boundary)
    }

    /// Find the half-edge running from `u` to `v`, if the two are adjacent.
    pub fn find_halfedge(&self, u: VertexId<I>, v: VertexId<I>) -> Option<HalfEdgeId<I>> {
        self.vertex_halfedges(u).find(|&he| self.dest(he) == v)
    }

    // --- traversal ---

    /// Handles of every vertex, in table order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.verts.len()).map(VertexId::new)
    }

    /// Iterate over all edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// Handles of every half-edge, in table order.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        (0..self.halfedges.len()).map(HalfEdgeId::new)
    }

    /// Handles of every face, in input order.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over half-edges leaving a vertex.
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// One-ring of `v`: destinations of its outgoing half-edges.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Faces incident to `v`, skipping the boundary gap.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_halfedges(v).filter_map(|he| self.face_of(he))
    }

    /// The three half-edges of `f`, from its anchor.
    pub fn face_halfedges(&self, f: FaceId<I>) -> LoopIter<'_, I> {
        LoopIter::new(self, self.face(f).halfedge)
    }

    /// Corner vertices of `f` in winding order.
    pub fn face_vertices(&self, f: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    /// Get the three vertices of a face, starting at its anchor.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [self.origin(he0), self.origin(he1), self.origin(he2)]
    }

    /// Get the positions of the three vertices of a face.
    pub fn face_positions(&self, f: FaceId<I>) -> [Point3<f64>; 3] {
        let [v0, v1, v2] = self.face_triangle(f);
        [*self.position(v0), *self.position(v1), *self.position(v2)]
    }

    /// Collect every boundary loop as its half-edges in `next` order.
    ///
    /// Loops are listed in order of their lowest half-edge ID, each starting
    /// from that half-edge.
    pub fn boundary_loops(&self) -> Vec<Vec<HalfEdgeId<I>>> {
        let mut visited = vec![false; self.halfedges.len()];
        let mut loops = Vec::new();

        for start in self.halfedge_ids() {
            if visited[start.index()] || !self.is_boundary_halfedge(start) {
                continue;
            }
            let cycle: Vec<_> = LoopIter::new(self, start).collect();
            for he in &cycle {
                visited[he.index()] = true;
            }
            loops.push(cycle);
        }

        loops
    }

    /// Number of boundary loops (holes).
    pub fn num_boundary_loops(&self) -> usize {
        self.boundary_loops().len()
    }

    /// Number of edges incident to `v`.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_halfedges(v).count()
    }

    /// V - E + F.
    pub fn euler_characteristic(&self) -> i64 {
        self.num_vertices() as i64 - self.num_edges() as i64 + self.num_faces() as i64
    }

    // --- geometry ---

    /// Compute the unit normal of a face (counter-clockwise winding).
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        (p1 - p0).cross(&(p2 - p0)).normalize()
    }

    /// Area of `f`.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Area-weighted average of the incident face normals.
    pub fn vertex_normal(&self, v: VertexId<I>) -> Vector3<f64> {
        let mut normal = Vector3::zeros();
        for f in self.vertex_faces(v) {
            let [p0, p1, p2] = self.face_positions(f);
            normal += (p1 - p0).cross(&(p2 - p0));
        }
        normal.normalize()
    }

    /// Compute the length of the edge a half-edge lies on.
    pub fn edge_length(&self, he: HalfEdgeId<I>) -> f64 {
        let p0 = self.position(self.origin(he));
        let p1 = self.position(self.dest(he));
        (p1 - p0).norm()
    }

    /// Axis-aligned `(min, max)` corners, `None` when there are no vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.verts.first()?.position;
        let mut min = first;
        let mut max = first;

        for v in &self.verts {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    /// Sum of all face areas.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    // --- invariants ---

    /// Check if all connectivity invariants hold.
    pub fn is_valid(&self) -> bool {
        self.check_invariants().is_ok()
    }

    /// Verify every connectivity invariant, reporting the first violation.
    pub fn check_invariants(&self) -> Result<()> {
        let nv = self.verts.len();
        let ne = self.edges.len();
        let nf = self.faces.len();
        let nh = self.halfedges.len();

        if nh != 2 * ne {
            return Err(violation(format!("{} half-edges for {} edges", nh, ne)));
        }

        // Range checks first so the relational checks below can index freely.
        for (i, he) in self.halfedges.iter().enumerate() {
            let in_range = he.vert.index() < nv
                && he.edge.index() < ne
                && he.twin.index() < nh
                && he.next.index() < nh
                && he.prev.index() < nh
                && he.face.map_or(true, |f| f.index() < nf);
            if !in_range {
                return Err(violation(format!("HE({}) has a dangling reference", i)));
            }
        }

        let mut face_sides = 0;
        for (i, he) in self.halfedges.iter().enumerate() {
            let id = HalfEdgeId::<I>::new(i);
            let twin = self.halfedge(he.twin);

            if he.twin == id || twin.twin != id {
                return Err(violation(format!("{:?} twin is not an involution", id)));
            }
            if twin.edge != he.edge {
                return Err(violation(format!("{:?} and its twin sit on different edges", id)));
            }
            if self.halfedge(he.next).prev != id || self.halfedge(he.prev).next != id {
                return Err(violation(format!("{:?} next/prev are not inverse", id)));
            }
            if self.origin(he.next) != twin.vert {
                return Err(violation(format!("{:?} next does not start at its destination", id)));
            }
            if he.face.is_some() == he.on_boundary {
                return Err(violation(format!("{:?} face and boundary flag disagree", id)));
            }
            if he.on_boundary && twin.on_boundary {
                return Err(violation(format!("{:?} edge borders no face", id)));
            }

            let next = self.halfedge(he.next);
            match he.face {
                Some(f) => {
                    face_sides += 1;
                    if next.face != Some(f) {
                        return Err(violation(format!("{:?} next leaves {:?}", id, f)));
                    }
                }
                None => {
                    if !next.on_boundary {
                        return Err(violation(format!("{:?} boundary loop enters a face", id)));
                    }
                }
            }
        }

        if face_sides != 3 * nf {
            return Err(violation(format!("{} face sides for {} faces", face_sides, nf)));
        }

        for (i, f) in self.faces.iter().enumerate() {
            let id = FaceId::<I>::new(i);
            if f.halfedge.index() >= nh || self.face_of(f.halfedge) != Some(id) {
                return Err(violation(format!("{:?} anchor does not border it", id)));
            }
            let third = self.next(self.next(self.next(f.halfedge)));
            if third != f.halfedge {
                return Err(violation(format!("{:?} cycle is not a triangle", id)));
            }
        }

        for (i, e) in self.edges.iter().enumerate() {
            if e.halfedge.index() >= nh || self.edge_of(e.halfedge).index() != i {
                return Err(violation(format!("E({}) anchor belongs to another edge", i)));
            }
        }

        for (i, v) in self.verts.iter().enumerate() {
            if let Some(he) = v.halfedge {
                if he.index() >= nh || self.origin(he).index() != i {
                    return Err(violation(format!("V({}) anchor does not leave it", i)));
                }
            }
        }

        Ok(())
    }
}

fn violation(message: String) -> MeshError {
    MeshError::InvalidState(message)
}

/// Iterator over half-edges leaving a vertex, rotating `twin -> next`.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: Option<HalfEdgeId<I>>,
    current: Option<HalfEdgeId<I>>,
}

impl<'a, I: MeshIndex> VertexHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.current?;

        // he: v -> w, twin(he): w -> v, next(twin(he)) leaves v again.
        let following = self.mesh.next(self.mesh.twin(result));
        self.current = if Some(following) == self.start {
            None
        } else {
            Some(following)
        };

        Some(result)
    }
}

/// Iterator following `next` pointers until the loop closes.
pub struct LoopIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: Option<HalfEdgeId<I>>,
}

impl<'a, I: MeshIndex> LoopIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, start: HalfEdgeId<I>) -> Self {
        Self {
            mesh,
            start,
            current: Some(start),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for LoopIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.current?;
        let following = self.mesh.next(result);
        self.current = (following != self.start).then_some(following);
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;

    fn fan() -> HalfEdgeMesh {
        // Four triangles around vertex 0, open on the outside.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = HalfEdgeMesh::<u32>::new();
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_halfedges(), 0);
        assert_eq!(mesh.num_faces(), 0);
        assert!(mesh.is_valid());
        assert!(mesh.bounding_box().is_none());
    }

    #[test]
    fn test_interior_vertex_rotation() {
        let mesh = fan();
        let center = VertexId::new(0);

        assert!(!mesh.is_boundary_vertex(center));
        assert_eq!(mesh.valence(center), 4);

        let mut neighbors: Vec<usize> = mesh.vertex_neighbors(center).map(|v| v.index()).collect();
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![1, 2, 3, 4]);
        assert_eq!(mesh.vertex_faces(center).count(), 4);
    }

    #[test]
    fn test_boundary_vertex_rotation() {
        let mesh = fan();
        let rim = VertexId::new(2);

        assert!(mesh.is_boundary_vertex(rim));
        // Edges to 0, 1 and 3; the rotation crosses the boundary loop once.
        assert_eq!(mesh.valence(rim), 3);
        assert_eq!(mesh.vertex_faces(rim).count(), 2);
    }

    #[test]
    fn test_boundary_loop_walk() {
        let mesh = fan();
        let loops = mesh.boundary_loops();

        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 4);
        for &he in &loops[0] {
            assert!(mesh.is_boundary_halfedge(he));
            assert_eq!(mesh.origin(mesh.next(he)), mesh.dest(he));
        }
        assert!(!mesh.is_closed());
        assert_eq!(mesh.euler_characteristic(), 1);
    }

    #[test]
    fn test_find_halfedge() {
        let mesh = fan();
        let v0 = VertexId::new(0);
        let v1 = VertexId::new(1);

        let he = mesh.find_halfedge(v0, v1).unwrap();
        assert_eq!(mesh.origin(he), v0);
        assert_eq!(mesh.dest(he), v1);
        assert!(mesh.find_halfedge(VertexId::new(1), VertexId::new(3)).is_none());
    }

    #[test]
    fn test_geometry() {
        let mesh = fan();
        let f = FaceId::new(0);

        assert!((mesh.face_area(f) - 0.5).abs() < 1e-12);
        assert!((mesh.face_normal(f).z - 1.0).abs() < 1e-12);
        assert!((mesh.surface_area() - 2.0).abs() < 1e-12);
        assert!((mesh.vertex_normal(VertexId::new(0)).z - 1.0).abs() < 1e-12);

        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!(min, Point3::new(-1.0, -1.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_check_invariants_catches_broken_twin() {
        let mut mesh = fan();
        let he = HalfEdgeId::new(0);
        mesh.halfedges[0].twin = he;

        let err = mesh.check_invariants().unwrap_err();
        assert!(matches!(err, MeshError::InvalidState(_)));
        assert!(!mesh.is_valid());
    }

    #[test]
    fn test_check_invariants_catches_flag_mismatch() {
        let mut mesh = fan();
        let boundary = mesh.boundary_loops()[0][0];
        mesh.halfedges[boundary.index()].on_boundary = false;

        assert!(mesh.check_invariants().is_err());
    }
}
