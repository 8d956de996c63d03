//! Mesh construction from flat index/position buffers.
//!
//! Construction runs in strict phase order over an immutable input:
//!
//! 1. **Vertex table**: one [`Vertex`] per position, in order.
//! 2. **Edge registration**: every triangle side is registered under its
//!    unordered vertex pair, so the final edge count is known before any
//!    half-edge exists.
//! 3. **Face claiming and cycle linking**: the first time a pair is met its
//!    [`Edge`] and two twin [`HalfEdge`]s are created; each triangle then
//!    claims the half-edge that starts at its side's start vertex, and the
//!    three claimed half-edges are linked into a `next`/`prev` triangle.
//! 4. **Boundary stitching**: half-edges no face claimed are linked into
//!    closed boundary loops, each one continuing at the unique boundary
//!    half-edge leaving its destination vertex.
//!
//! Any failure aborts the whole build; no partially linked mesh escapes.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use log::{debug, log_enabled, trace, Level};
use nalgebra::Point3;

use super::halfedge::{Edge, Face, HalfEdge, HalfEdgeMesh, Vertex};
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};
use crate::progress::Progress;

const PHASES: usize = 4;

/// How often (in faces) the claiming pass reports sub-progress.
const PROGRESS_STRIDE: usize = 4096;

/// Options for mesh construction.
#[derive(Debug, Default)]
pub struct BuildOptions {
    /// Run the full connectivity invariant check after construction.
    pub validate: bool,

    /// Optional progress callback.
    pub progress: Option<Progress>,
}

impl BuildOptions {
    /// Enable or disable the post-construction invariant check.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Set a progress callback.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    fn report(&self, phase: usize, message: &str) {
        if let Some(progress) = &self.progress {
            progress.report(phase, PHASES, message);
        }
    }
}

/// Build a half-edge mesh from an index buffer and a position buffer.
///
/// Every consecutive triple of `index_buffer` names one triangle, in a
/// consistent winding order.
///
/// # Errors
/// - [`MeshError::MalformedIndexBuffer`], [`MeshError::InvalidVertexIndex`],
///   [`MeshError::DegenerateFace`] for malformed input, before anything is built.
/// - [`MeshError::NonManifoldEdge`] when a third face claims an edge.
/// - [`MeshError::InconsistentWinding`] when two faces traverse one side in
///   the same direction.
/// - [`MeshError::NonManifoldVertex`] when a vertex has two outgoing boundary
///   half-edges.
/// - [`MeshError::IndexOverflow`] when `I` is too narrow for the mesh.
///
/// # Example
/// ```
/// use hedgemesh::mesh::{build_from_buffers, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let positions = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let indices = vec![0, 1, 2, 0, 2, 3];
///
/// let mesh: HalfEdgeMesh = build_from_buffers(&indices, &positions).unwrap();
/// assert_eq!(mesh.num_edges(), 5);
/// assert_eq!(mesh.num_halfedges(), 10);
/// assert_eq!(mesh.num_boundary_loops(), 1);
/// ```
pub fn build_from_buffers<I: MeshIndex>(
    index_buffer: &[usize],
    position_buffer: &[Point3<f64>],
) -> Result<HalfEdgeMesh<I>> {
    build_from_buffers_with(index_buffer, position_buffer, &BuildOptions::default())
}

/// Build a half-edge mesh with explicit [`BuildOptions`].
pub fn build_from_buffers_with<I: MeshIndex>(
    index_buffer: &[usize],
    position_buffer: &[Point3<f64>],
    options: &BuildOptions,
) -> Result<HalfEdgeMesh<I>> {
    validate_input(index_buffer, position_buffer.len())?;
    check_capacity::<I>(position_buffer.len())?;
    check_capacity::<I>(index_buffer.len() / 3)?;

    options.report(0, "building vertex table");
    let verts = build_vertex_table::<I>(position_buffer);
    debug!("vertex table: {} vertices", verts.len());

    options.report(1, "registering edges");
    let mut table = EdgeTable::with_capacity(index_buffer.len());
    for tri in index_buffer.chunks_exact(3) {
        for (u, v) in sides(tri) {
            table.register(u, v);
        }
    }
    check_capacity::<I>(2 * table.len())?;
    debug!(
        "registered {} unique edges for {} faces",
        table.len(),
        index_buffer.len() / 3
    );

    options.report(2, "claiming faces");
    let mut construction = Construction::new(verts, table.len(), index_buffer.len() / 3);
    let face_sides = construction.claim_face_sides(index_buffer, &mut table, options)?;
    construction.link_face_cycles(&face_sides);
    debug!("linked {} face cycles", face_sides.len());

    options.report(3, "stitching boundary loops");
    let stitched = stitch_boundary_loops(&mut construction.halfedges)?;

    let mesh = construction.finish()?;
    if log_enabled!(Level::Debug) && stitched > 0 {
        debug!(
            "stitched {} boundary half-edges into {} loops",
            stitched,
            mesh.num_boundary_loops()
        );
    }

    if options.validate {
        mesh.check_invariants()?;
    }

    Ok(mesh)
}

/// Build a half-edge mesh from vertices and triangle faces.
///
/// Equivalent to [`build_from_buffers`] on the flattened face list.
///
/// # Example
/// ```
/// use hedgemesh::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    let indices: Vec<usize> = faces.iter().flatten().copied().collect();
    build_from_buffers(&indices, vertices)
}

/// Convert a half-edge mesh back to flat position and index buffers.
///
/// Each face contributes its vertices in cycle order starting from its
/// anchor, which reproduces the input triangle's winding and first vertex.
pub fn to_buffers<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<usize>) {
    let positions: Vec<Point3<f64>> = mesh.verts().iter().map(|v| v.position).collect();

    let indices: Vec<usize> = mesh
        .face_ids()
        .flat_map(|f| mesh.face_triangle(f))
        .map(|v| v.index())
        .collect();

    (positions, indices)
}

/// Reject malformed buffers before any entity is created.
fn validate_input(index_buffer: &[usize], num_vertices: usize) -> Result<()> {
    if index_buffer.len() % 3 != 0 {
        return Err(MeshError::MalformedIndexBuffer {
            len: index_buffer.len(),
        });
    }

    for (position, &vertex) in index_buffer.iter().enumerate() {
        if vertex >= num_vertices {
            return Err(MeshError::InvalidVertexIndex {
                position,
                vertex,
                num_vertices,
            });
        }
    }

    for (face, tri) in index_buffer.chunks_exact(3).enumerate() {
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            return Err(MeshError::DegenerateFace { face });
        }
    }

    Ok(())
}

fn check_capacity<I: MeshIndex>(count: usize) -> Result<()> {
    if count > I::CAPACITY {
        return Err(MeshError::IndexOverflow {
            count,
            max: I::CAPACITY,
        });
    }
    Ok(())
}

/// The three directed sides `(a, b)`, `(b, c)`, `(c, a)` of a triangle.
#[inline]
fn sides(tri: &[usize]) -> [(usize, usize); 3] {
    [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])]
}

/// Allocate one vertex per position, with no anchors yet.
pub(crate) fn build_vertex_table<I: MeshIndex>(positions: &[Point3<f64>]) -> Vec<Vertex<I>> {
    positions.iter().map(|&p| Vertex::new(p)).collect()
}

/// Construction record of one undirected edge.
#[derive(Debug, Clone, Copy)]
struct EdgeRecord {
    lower: usize,
    higher: usize,
    /// Half-edges leaving `lower` and `higher`, once the edge exists.
    halfedges: Option<[usize; 2]>,
}

/// Unordered vertex pair to edge record.
///
/// Keys are canonicalised as `(max, min)` so both directions of a side
/// resolve to the same record.
#[derive(Debug, Default)]
pub(crate) struct EdgeTable {
    index: HashMap<(usize, usize), usize>,
    records: Vec<EdgeRecord>,
}

impl EdgeTable {
    fn with_capacity(sides: usize) -> Self {
        // A closed mesh has sides / 2 edges; an open one slightly more.
        let expected = sides / 2 + sides / 8;
        Self {
            index: HashMap::with_capacity(expected),
            records: Vec::with_capacity(expected),
        }
    }

    #[inline]
    fn key(u: usize, v: usize) -> (usize, usize) {
        (u.max(v), u.min(v))
    }

    /// Ensure a record exists for the unordered pair `{u, v}`.
    pub(crate) fn register(&mut self, u: usize, v: usize) -> usize {
        let next = self.records.len();
        match self.index.entry(Self::key(u, v)) {
            Entry::Occupied(slot) => *slot.get(),
            Entry::Vacant(slot) => {
                slot.insert(next);
                self.records.push(EdgeRecord {
                    lower: u.min(v),
                    higher: u.max(v),
                    halfedges: None,
                });
                next
            }
        }
    }

    fn lookup(&self, u: usize, v: usize) -> Option<usize> {
        self.index.get(&Self::key(u, v)).copied()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// A half-edge whose loop links are still being assigned.
#[derive(Debug, Clone, Copy)]
struct PendingHalfEdge {
    vert: usize,
    edge: usize,
    face: Option<usize>,
    next: Option<usize>,
    prev: Option<usize>,
    on_boundary: bool,
}

/// Entity tables under construction.
struct Construction<I: MeshIndex> {
    verts: Vec<Vertex<I>>,
    edges: Vec<Edge<I>>,
    faces: Vec<Face<I>>,
    halfedges: Vec<PendingHalfEdge>,
}

impl<I: MeshIndex> Construction<I> {
    fn new(verts: Vec<Vertex<I>>, num_edges: usize, num_faces: usize) -> Self {
        Self {
            verts,
            edges: Vec::with_capacity(num_edges),
            faces: Vec::with_capacity(num_faces),
            halfedges: Vec::with_capacity(2 * num_edges),
        }
    }

    /// Create the edge for `record` and its two twin half-edges.
    ///
    /// Half-edge `2e` leaves the lower vertex id, `2e + 1` the higher one.
    fn create_edge(&mut self, record: &EdgeRecord) -> [usize; 2] {
        let e = self.edges.len();
        let from_lower = 2 * e;
        let from_higher = from_lower + 1;

        for (vert, he) in [(record.lower, from_lower), (record.higher, from_higher)] {
            self.halfedges.push(PendingHalfEdge {
                vert,
                edge: e,
                face: None,
                next: None,
                prev: None,
                on_boundary: true,
            });
            let anchor = &mut self.verts[vert].halfedge;
            if anchor.is_none() {
                *anchor = Some(HalfEdgeId::new(he));
            }
        }
        self.edges.push(Edge {
            halfedge: HalfEdgeId::new(from_lower),
        });

        [from_lower, from_higher]
    }

    /// Assign every triangle side to its face, creating edges on first use.
    ///
    /// Returns each face's three half-edges in side order.
    fn claim_face_sides(
        &mut self,
        index_buffer: &[usize],
        table: &mut EdgeTable,
        options: &BuildOptions,
    ) -> Result<Vec<[usize; 3]>> {
        let num_faces = index_buffer.len() / 3;
        let mut face_sides = Vec::with_capacity(num_faces);

        for (f, tri) in index_buffer.chunks_exact(3).enumerate() {
            let mut claimed = [0usize; 3];

            for (j, (u, v)) in sides(tri).into_iter().enumerate() {
                let slot = table.lookup(u, v).ok_or_else(|| {
                    MeshError::InvalidState(format!("side ({}, {}) was never registered", u, v))
                })?;
                let record = table.records[slot];
                let pair = match record.halfedges {
                    Some(pair) => pair,
                    None => {
                        let pair = self.create_edge(&record);
                        table.records[slot].halfedges = Some(pair);
                        pair
                    }
                };

                let he = if u == record.lower { pair[0] } else { pair[1] };
                let twin = if u == record.lower { pair[1] } else { pair[0] };

                if let Some(owner) = self.halfedges[he].face {
                    return Err(match self.halfedges[twin].face {
                        Some(other) => {
                            let mut faces = vec![owner.min(other), owner.max(other)];
                            faces.push(f);
                            MeshError::NonManifoldEdge { v0: u, v1: v, faces }
                        }
                        None => MeshError::InconsistentWinding {
                            v0: u,
                            v1: v,
                            faces: vec![owner, f],
                        },
                    });
                }

                let side = &mut self.halfedges[he];
                side.face = Some(f);
                side.on_boundary = false;

                if j == 0 {
                    self.faces.push(Face {
                        halfedge: HalfEdgeId::new(he),
                    });
                }
                claimed[j] = he;
            }

            face_sides.push(claimed);

            if let Some(progress) = &options.progress {
                if f % PROGRESS_STRIDE == 0 {
                    progress.report_sub(f, num_faces, 2, PHASES, "claiming faces");
                }
            }
        }

        Ok(face_sides)
    }

    /// Link each face's three half-edges into a `next`/`prev` triangle.
    fn link_face_cycles(&mut self, face_sides: &[[usize; 3]]) {
        for claimed in face_sides {
            for j in 0..3 {
                let he = &mut self.halfedges[claimed[j]];
                he.next = Some(claimed[(j + 1) % 3]);
                he.prev = Some(claimed[(j + 2) % 3]);
            }
        }
    }

    /// Freeze the pending tables into a mesh.
    fn finish(self) -> Result<HalfEdgeMesh<I>> {
        let halfedges = self
            .halfedges
            .iter()
            .enumerate()
            .map(|(i, he)| {
                let unlinked = || MeshError::InvalidState(format!("HE({}) was never linked", i));
                Ok(HalfEdge {
                    vert: VertexId::new(he.vert),
                    edge: EdgeId::new(he.edge),
                    face: he.face.map(FaceId::new),
                    twin: HalfEdgeId::new(i ^ 1),
                    next: HalfEdgeId::new(he.next.ok_or_else(unlinked)?),
                    prev: HalfEdgeId::new(he.prev.ok_or_else(unlinked)?),
                    on_boundary: he.on_boundary,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(HalfEdgeMesh {
            verts: self.verts,
            edges: self.edges,
            faces: self.faces,
            halfedges,
        })
    }
}

/// Link unclaimed half-edges into closed boundary loops.
///
/// Returns the number of boundary half-edges stitched; zero for a closed
/// surface.
fn stitch_boundary_loops(halfedges: &mut [PendingHalfEdge]) -> Result<usize> {
    let mut outgoing: HashMap<usize, usize> = HashMap::new();
    for (i, he) in halfedges.iter().enumerate() {
        if !he.on_boundary {
            continue;
        }
        match outgoing.entry(he.vert) {
            Entry::Occupied(slot) => {
                return Err(MeshError::NonManifoldVertex {
                    vertex: he.vert,
                    halfedges: vec![*slot.get(), i],
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(i);
            }
        }
    }

    if outgoing.is_empty() {
        return Ok(0);
    }

    for i in 0..halfedges.len() {
        if !halfedges[i].on_boundary || halfedges[i].next.is_some() {
            continue;
        }
        // The twin's origin is where this half-edge points.
        let target = halfedges[i ^ 1].vert;
        let succ = *outgoing.get(&target).ok_or_else(|| {
            MeshError::InvalidState(format!(
                "boundary HE({}) runs into vertex {} which has no outgoing boundary",
                i, target
            ))
        })?;
        if halfedges[succ].prev.is_some() {
            return Err(MeshError::NonManifoldVertex {
                vertex: target,
                halfedges: vec![succ],
            });
        }

        halfedges[i].next = Some(succ);
        halfedges[succ].prev = Some(i);
        trace!("boundary HE({}) -> HE({}) through vertex {}", i, succ, target);
    }

    Ok(outgoing.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn single_triangle() -> (Vec<Point3<f64>>, Vec<usize>) {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        (positions, vec![0, 1, 2])
    }

    fn split_quad() -> (Vec<Point3<f64>>, Vec<usize>) {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        (positions, vec![0, 1, 2, 0, 2, 3])
    }

    fn tetrahedron() -> (Vec<Point3<f64>>, Vec<usize>) {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let indices = vec![
            0, 2, 1, // bottom
            0, 1, 3, // front
            1, 2, 3, // right
            2, 0, 3, // left
        ];
        (positions, indices)
    }

    fn annulus() -> (Vec<Point3<f64>>, Vec<usize>) {
        // Square ring: outer square 0..4, inner square 4..8.
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 3.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
        ];
        let indices = vec![
            0, 1, 5, 0, 5, 4, //
            1, 2, 6, 1, 6, 5, //
            2, 3, 7, 2, 7, 6, //
            3, 0, 4, 3, 4, 7,
        ];
        (positions, indices)
    }

    fn build(indices: &[usize], positions: &[Point3<f64>]) -> Result<HalfEdgeMesh<u32>> {
        build_from_buffers_with(
            indices,
            positions,
            &BuildOptions::default().with_validation(true),
        )
    }

    #[test]
    fn test_single_triangle() {
        let (positions, indices) = single_triangle();
        let mesh = build(&indices, &positions).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_edges(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.num_halfedges(), 6);

        let f = FaceId::new(0);
        let interior: Vec<_> = mesh.face_halfedges(f).collect();
        assert_eq!(interior.len(), 3);
        for &he in &interior {
            assert!(!mesh.is_boundary_halfedge(he));
            assert_eq!(mesh.face_of(he), Some(f));

            let twin = mesh.twin(he);
            assert!(mesh.is_boundary_halfedge(twin));
            assert_eq!(mesh.face_of(twin), None);
        }

        let loops = mesh.boundary_loops();
        assert_eq!(loops.len(), 1);
        let ids: Vec<usize> = loops[0].iter().map(|he| he.index()).collect();
        assert_eq!(ids, vec![1, 4, 3]);
    }

    #[test]
    fn test_single_triangle_anchors() {
        let (positions, indices) = single_triangle();
        let mesh = build(&indices, &positions).unwrap();

        // Anchors are the first half-edge created leaving each vertex.
        assert_eq!(mesh.vertex(VertexId::new(0)).halfedge, Some(HalfEdgeId::new(0)));
        assert_eq!(mesh.vertex(VertexId::new(1)).halfedge, Some(HalfEdgeId::new(1)));
        assert_eq!(mesh.vertex(VertexId::new(2)).halfedge, Some(HalfEdgeId::new(3)));
        assert_eq!(mesh.face(FaceId::new(0)).halfedge, HalfEdgeId::new(0));
        for e in mesh.edge_ids() {
            assert_eq!(mesh.edge(e).halfedge.index(), 2 * e.index());
        }
        assert_eq!(mesh.face_triangle(FaceId::new(0)).map(|v| v.index()), [0, 1, 2]);
    }

    #[test]
    fn test_split_quad() {
        let (positions, indices) = split_quad();
        let mesh = build(&indices, &positions).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_edges(), 5);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_halfedges(), 10);

        let interior: Vec<EdgeId> = mesh.edge_ids().filter(|&e| !mesh.is_boundary_edge(e)).collect();
        assert_eq!(interior.len(), 1);

        let mut ends = mesh.edge_vertices(interior[0]).map(|v| v.index());
        ends.sort_unstable();
        assert_eq!(ends, [0, 2]);

        let he = mesh.edge(interior[0]).halfedge;
        let twin = mesh.twin(he);
        assert_eq!(mesh.twin(twin), he);
        assert!(mesh.face_of(he).is_some());
        assert!(mesh.face_of(twin).is_some());
        assert_ne!(mesh.face_of(he), mesh.face_of(twin));

        let loops = mesh.boundary_loops();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 4);
    }

    #[test]
    fn test_closed_tetrahedron() {
        let (positions, indices) = tetrahedron();
        let mesh = build(&indices, &positions).unwrap();

        assert!(mesh.is_closed());
        assert_eq!(mesh.num_edges(), 6);
        assert_eq!(mesh.num_halfedges(), 3 * mesh.num_faces());
        assert_eq!(mesh.num_halfedges(), 2 * mesh.num_edges());
        assert_eq!(mesh.euler_characteristic(), 2);
        assert!(mesh.halfedges().iter().all(|he| !he.on_boundary));
        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v));
            assert_eq!(mesh.valence(v), 3);
        }
    }

    #[test]
    fn test_two_boundary_loops() {
        let (positions, indices) = annulus();
        let mesh = build(&indices, &positions).unwrap();

        assert_eq!(mesh.num_edges(), 16);
        assert_eq!(mesh.euler_characteristic(), 0);

        let loops = mesh.boundary_loops();
        assert_eq!(loops.len(), 2);
        assert_eq!(loops.iter().map(Vec::len).sum::<usize>(), 8);

        // No half-edge appears in more than one loop.
        let mut seen: Vec<usize> = loops.iter().flatten().map(|he| he.index()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 8);
        assert_eq!(seen.len(), mesh.halfedges().iter().filter(|he| he.on_boundary).count());
    }

    #[test]
    fn test_face_cycles_close() {
        let (positions, indices) = annulus();
        let mesh = build(&indices, &positions).unwrap();

        for f in mesh.face_ids() {
            let start = mesh.face(f).halfedge;
            let mut he = start;
            for _ in 0..3 {
                assert_eq!(mesh.face_of(he), Some(f));
                he = mesh.next(he);
            }
            assert_eq!(he, start);
        }
        for he in mesh.halfedge_ids() {
            assert_eq!(mesh.twin(mesh.twin(he)), he);
            assert_eq!(mesh.prev(mesh.next(he)), he);
            assert_eq!(mesh.next(mesh.prev(he)), he);
        }
    }

    #[test]
    fn test_isolated_vertex_has_no_anchor() {
        let (mut positions, indices) = single_triangle();
        positions.push(Point3::new(5.0, 5.0, 5.0));
        let mesh = build(&indices, &positions).unwrap();

        let lonely = VertexId::new(3);
        assert!(mesh.is_isolated_vertex(lonely));
        assert!(!mesh.is_boundary_vertex(lonely));
        assert_eq!(mesh.valence(lonely), 0);
    }

    #[test]
    fn test_empty_index_buffer() {
        let (positions, _) = single_triangle();
        let mesh = build(&[], &positions).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_edges(), 0);
        assert_eq!(mesh.num_faces(), 0);
        assert!(mesh.is_closed());
    }

    #[test]
    fn test_dangling_index() {
        let (positions, _) = single_triangle();
        let err = build(&[0, 1, 3], &positions).unwrap_err();

        match err {
            MeshError::InvalidVertexIndex {
                position,
                vertex,
                num_vertices,
            } => {
                assert_eq!(position, 2);
                assert_eq!(vertex, 3);
                assert_eq!(num_vertices, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncated_index_buffer() {
        let (positions, _) = single_triangle();
        let err = build(&[0, 1, 2, 0], &positions).unwrap_err();
        assert!(matches!(err, MeshError::MalformedIndexBuffer { len: 4 }));
    }

    #[test]
    fn test_degenerate_face() {
        let (positions, _) = single_triangle();
        let err = build(&[0, 1, 2, 1, 1, 2], &positions).unwrap_err();
        assert!(matches!(err, MeshError::DegenerateFace { face: 1 }));
    }

    #[test]
    fn test_non_manifold_edge() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
        ];
        // Three fins around edge (0, 1).
        let indices = vec![0, 1, 2, 1, 0, 3, 0, 1, 4];
        let err = build(&indices, &positions).unwrap_err();

        match err {
            MeshError::NonManifoldEdge { v0, v1, faces } => {
                assert_eq!((v0, v1), (0, 1));
                assert_eq!(faces, vec![0, 1, 2]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_inconsistent_winding() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let err = build(&[0, 1, 2, 0, 1, 3], &positions).unwrap_err();

        match err {
            MeshError::InconsistentWinding { v0, v1, faces } => {
                assert_eq!((v0, v1), (0, 1));
                assert_eq!(faces, vec![0, 1]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bowtie_vertex() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
        ];
        let err = build(&[0, 1, 2, 0, 3, 4], &positions).unwrap_err();

        match err {
            MeshError::NonManifoldVertex { vertex, halfedges } => {
                assert_eq!(vertex, 0);
                assert_eq!(halfedges, vec![4, 10]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_deterministic() {
        let (positions, indices) = annulus();
        let a = build(&indices, &positions).unwrap();
        let b = build(&indices, &positions).unwrap();

        assert_eq!(a.halfedges(), b.halfedges());
        assert_eq!(a.edges(), b.edges());
        assert_eq!(a.faces(), b.faces());
    }

    #[test]
    fn test_face_order_does_not_change_topology() {
        let (positions, indices) = annulus();
        let reversed: Vec<usize> = indices
            .chunks_exact(3)
            .rev()
            .flatten()
            .copied()
            .collect();

        let a = build(&indices, &positions).unwrap();
        let b = build(&reversed, &positions).unwrap();

        assert_eq!(a.num_edges(), b.num_edges());
        assert_eq!(a.num_boundary_loops(), b.num_boundary_loops());
        for v in a.vertex_ids() {
            assert_eq!(a.valence(v), b.valence(v));
            assert_eq!(a.is_boundary_vertex(v), b.is_boundary_vertex(v));
        }
    }

    #[test]
    fn test_roundtrip_buffers() {
        let (positions, indices) = tetrahedron();
        let mesh = build(&indices, &positions).unwrap();

        let (out_positions, out_indices) = to_buffers(&mesh);
        assert_eq!(out_indices, indices);
        for (p_in, p_out) in positions.iter().zip(out_positions.iter()) {
            assert!((p_in - p_out).norm() < 1e-12);
        }
    }

    #[test]
    fn test_build_from_triangles_matches_buffers() {
        let (positions, indices) = split_quad();
        let a: HalfEdgeMesh = build_from_triangles(&positions, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        let b: HalfEdgeMesh = build_from_buffers(&indices, &positions).unwrap();
        assert_eq!(a.halfedges(), b.halfedges());
    }

    #[test]
    fn test_index_overflow() {
        // A strip of 11000 quads needs 44001 edges, i.e. 88002 half-edges.
        let n = 11_000;
        let mut positions = Vec::with_capacity(2 * (n + 1));
        for i in 0..=n {
            positions.push(Point3::new(i as f64, 0.0, 0.0));
            positions.push(Point3::new(i as f64, 1.0, 0.0));
        }
        let mut indices = Vec::with_capacity(6 * n);
        for i in 0..n {
            let (a, b, c, d) = (2 * i, 2 * i + 2, 2 * i + 3, 2 * i + 1);
            indices.extend_from_slice(&[a, b, c, a, c, d]);
        }

        let err = build_from_buffers::<u16>(&indices, &positions).unwrap_err();
        assert!(matches!(err, MeshError::IndexOverflow { count: 88_002, .. }));

        let mesh: HalfEdgeMesh<u32> = build_from_buffers(&indices, &positions).unwrap();
        assert_eq!(mesh.num_halfedges(), 88_002);
        assert_eq!(mesh.num_boundary_loops(), 1);
    }

    #[test]
    fn test_progress_reports_each_phase() {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        let options = BuildOptions::default().with_progress(Progress::new(move |current, total, message| {
            sink.lock().unwrap().push((current, total, message.to_string()));
        }));

        let (positions, indices) = split_quad();
        let _mesh: HalfEdgeMesh = build_from_buffers_with(&indices, &positions, &options).unwrap();

        let messages = messages.lock().unwrap();
        let phases: Vec<&(usize, usize, String)> =
            messages.iter().filter(|(_, total, _)| *total == PHASES).collect();
        assert_eq!(phases.len(), PHASES);
        assert_eq!(phases[0].2, "building vertex table");
        assert_eq!(phases[3].2, "stitching boundary loops");
    }

    #[test]
    fn test_edge_table_canonical_key() {
        let mut table = EdgeTable::default();
        let a = table.register(3, 7);
        let b = table.register(7, 3);
        let c = table.register(7, 8);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[a].lower, 3);
        assert_eq!(table.records[a].higher, 7);
    }
}
