//! Error types for hedgemesh.
//!
//! Construction either yields a fully linked mesh or one of these errors;
//! there is no partially built structure to recover.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while building, checking or loading a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The index buffer does not describe whole triangles.
    #[error("index buffer length {len} is not a multiple of 3")]
    MalformedIndexBuffer {
        /// Length of the index buffer.
        len: usize,
    },

    /// An index buffer entry names a vertex that does not exist.
    #[error("index buffer entry {position} references vertex {vertex}, but only {num_vertices} vertices exist")]
    InvalidVertexIndex {
        /// Position of the offending entry in the index buffer.
        position: usize,
        /// The out-of-range vertex index.
        vertex: usize,
        /// Number of positions supplied.
        num_vertices: usize,
    },

    /// A triangle names the same vertex more than once.
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A third face claims an edge already bordered by two faces.
    #[error("edge ({v0}, {v1}) is shared by more than two faces: {faces:?}")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
        /// Every face implicated, the offending one last.
        faces: Vec<usize>,
    },

    /// Two faces traverse the same directed side, so their orientations disagree.
    #[error("directed side ({v0} -> {v1}) is used by faces {faces:?}; neighbouring faces have inconsistent winding")]
    InconsistentWinding {
        /// Start vertex of the side.
        v0: usize,
        /// End vertex of the side.
        v1: usize,
        /// The face already holding the side, then the offending face.
        faces: Vec<usize>,
    },

    /// A boundary vertex has more than one outgoing boundary half-edge.
    #[error("vertex {vertex} has several outgoing boundary half-edges: {halfedges:?}")]
    NonManifoldVertex {
        /// The vertex.
        vertex: usize,
        /// The competing boundary half-edges.
        halfedges: Vec<usize>,
    },

    /// The mesh needs more elements than the chosen handle width can address.
    #[error("mesh needs {count} elements but the index type addresses at most {max}")]
    IndexOverflow {
        /// Number of elements required.
        count: usize,
        /// Capacity of the index type.
        max: usize,
    },

    /// Invalid mesh state (a connectivity invariant does not hold).
    #[error("invalid mesh state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed mesh text.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a parse error for the given 1-based line.
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        MeshError::Parse {
            line,
            message: message.into(),
        }
    }

    /// Whether the error reports bad input topology rather than an I/O or
    /// syntax problem.
    pub fn is_topology_error(&self) -> bool {
        matches!(
            self,
            MeshError::DegenerateFace { .. }
                | MeshError::NonManifoldEdge { .. }
                | MeshError::InconsistentWinding { .. }
                | MeshError::NonManifoldVertex { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_offenders() {
        let err = MeshError::NonManifoldEdge {
            v0: 2,
            v1: 0,
            faces: vec![0, 1, 4],
        };
        assert_eq!(
            err.to_string(),
            "edge (2, 0) is shared by more than two faces: [0, 1, 4]"
        );

        let err = MeshError::InvalidVertexIndex {
            position: 5,
            vertex: 9,
            num_vertices: 4,
        };
        assert!(err.to_string().contains("entry 5"));
        assert!(err.to_string().contains("vertex 9"));
    }

    #[test]
    fn test_topology_classification() {
        assert!(MeshError::DegenerateFace { face: 0 }.is_topology_error());
        assert!(!MeshError::MalformedIndexBuffer { len: 4 }.is_topology_error());
        assert!(!MeshError::parse(3, "bad").is_topology_error());
    }
}
