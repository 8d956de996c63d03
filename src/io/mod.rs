//! Mesh file I/O.
//!
//! Text front-end that turns a mesh file into the flat position and index
//! buffers the builder consumes, and writes meshes back out.
//!
//! | Format | Extension | Load | Save |
//! |--------|-----------|------|------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ |
//!
//! ```no_run
//! use hedgemesh::io::{load, save};
//! use hedgemesh::mesh::HalfEdgeMesh;
//!
//! let mesh: HalfEdgeMesh = load("model.obj").unwrap();
//! save(&mesh, "copy.obj").unwrap();
//! ```

pub mod obj;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

fn check_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("(none)");
    if extension.eq_ignore_ascii_case("obj") {
        Ok(())
    } else {
        Err(MeshError::UnsupportedFormat {
            extension: extension.to_string(),
        })
    }
}

/// Load a mesh from a file, choosing the reader by extension.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    check_extension(path)?;
    obj::load(path)
}

/// Save a mesh to a file, choosing the writer by extension.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    check_extension(path)?;
    obj::save(mesh, path)
}
