//! # hedgemesh
//!
//! Half-edge connectivity for triangle meshes.
//!
//! hedgemesh turns a raw triangle mesh (a position buffer plus a flat index
//! buffer, three indices per triangle) into a half-edge structure whose
//! `next`, `prev`, `twin`, `face`, `vert` and anchor relations are consistent
//! everywhere, boundaries included. The result is ready for downstream
//! geometry processing such as traversal, curvature or subdivision.
//!
//! ## Features
//!
//! - **Half-edge data structure**: dense entity tables with O(1) adjacency
//!   through type-safe handles
//! - **Flexible indexing**: 16-bit, 32-bit and 64-bit handles
//! - **Boundary loops**: open surfaces get one closed half-edge loop per hole
//! - **Strict input checking**: dangling indices, non-manifold edges and
//!   bowtie vertices are reported, never patched over
//! - **OBJ front-end**: read and write Wavefront OBJ text
//!
//! ## Building Meshes
//!
//! ```
//! use hedgemesh::prelude::*;
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//!
//! let indices = vec![
//!     0, 2, 1, // bottom
//!     0, 1, 3, // front
//!     1, 2, 3, // right
//!     2, 0, 3, // left
//! ];
//!
//! let mesh: HalfEdgeMesh = build_from_buffers(&indices, &positions).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_edges(), 6);
//! assert_eq!(mesh.num_faces(), 4);
//! assert!(mesh.is_closed());
//! ```
//!
//! ## Mesh Traversal
//!
//! ```
//! use hedgemesh::prelude::*;
//! use nalgebra::Point3;
//!
//! # let positions = vec![
//! #     Point3::new(0.0, 0.0, 0.0),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(0.5, 1.0, 0.0),
//! # ];
//! # let mesh: HalfEdgeMesh = build_from_buffers(&[0, 1, 2], &positions).unwrap();
//! // Iterate over neighbors of a vertex
//! let v = VertexId::new(0);
//! for neighbor in mesh.vertex_neighbors(v) {
//!     println!("Neighbor: {:?}", neighbor);
//! }
//!
//! // Walk each hole of the surface
//! for boundary in mesh.boundary_loops() {
//!     println!("Boundary loop of {} half-edges", boundary.len());
//! }
//!
//! // Get vertices of a face
//! let f = FaceId::new(0);
//! let [v0, v1, v2] = mesh.face_triangle(f);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod io;
pub mod mesh;
pub mod progress;
pub mod transform;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use hedgemesh::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_buffers, build_from_buffers_with, build_from_triangles, to_buffers,
        BuildOptions, Edge, EdgeId, Face, FaceId, HalfEdge, HalfEdgeId, HalfEdgeMesh, MeshIndex,
        Vertex, VertexId,
    };
    pub use crate::transform::ModelTransform;
}

// Re-export nalgebra types for convenience
pub use nalgebra;
