//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation and the builder
//! that derives it from flat index/position buffers.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], which stores four dense tables
//! ([`Vertex`], [`Edge`], [`Face`], [`HalfEdge`]) and links them through
//! typed handles. Navigation between directly related entities is O(1).
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe handles:
//! - [`VertexId`] - Identifies a vertex
//! - [`EdgeId`] - Identifies an undirected edge
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//!
//! Handles are generic over the underlying integer type ([`MeshIndex`]),
//! so `u16`, `u32` or `u64` can be chosen based on mesh size.
//!
//! # Construction
//!
//! ```
//! use hedgemesh::mesh::{build_from_buffers, HalfEdgeMesh};
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let indices = vec![0, 1, 2];
//!
//! let mesh: HalfEdgeMesh = build_from_buffers(&indices, &positions).unwrap();
//! assert_eq!(mesh.num_halfedges(), 6);
//! ```

mod builder;
mod halfedge;
mod index;

pub use builder::{
    build_from_buffers, build_from_buffers_with, build_from_triangles, to_buffers, BuildOptions,
};
pub use halfedge::{Edge, Face, HalfEdge, HalfEdgeMesh, LoopIter, Vertex, VertexHalfEdgeIter};
pub use index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
