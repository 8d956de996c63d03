//! Wavefront OBJ reading and writing.
//!
//! Only what connectivity needs is read: `v` positions and `f` corner
//! indices. Texture and normal references in face corners (`i/t`, `i//n`,
//! `i/t/n`) are accepted and dropped. Polygons with more than three corners
//! are split into a triangle fan around their first corner.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, warn};
use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_buffers, HalfEdgeMesh, MeshIndex};

/// Statements that carry no connectivity and are skipped silently.
const IGNORED: &[&str] = &["vn", "vt", "vp", "o", "g", "s", "usemtl", "mtllib"];

/// Flat buffers read from OBJ text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjBuffers {
    /// Vertex positions, in file order.
    pub positions: Vec<Point3<f64>>,
    /// 0-based vertex indices, three per triangle.
    pub indices: Vec<usize>,
}

impl ObjBuffers {
    /// Number of triangles described by the index buffer.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Parse OBJ text into position and index buffers.
///
/// # Example
/// ```
/// use hedgemesh::io::obj;
///
/// let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
/// let buffers = obj::parse(text).unwrap();
/// assert_eq!(buffers.positions.len(), 4);
/// assert_eq!(buffers.indices, vec![0, 1, 2, 0, 2, 3]);
/// ```
pub fn parse(text: &str) -> Result<ObjBuffers> {
    let mut buffers = ObjBuffers::default();
    let mut skipped: HashSet<&str> = HashSet::new();
    let mut corners = Vec::new();

    for (n, raw) in text.lines().enumerate() {
        let line = n + 1;
        let content = raw.find('#').map_or(raw, |i| &raw[..i]);
        let mut tokens = content.split_whitespace();

        match tokens.next() {
            None => {}
            Some("v") => {
                let mut coords = [0.0; 3];
                for (axis, slot) in coords.iter_mut().enumerate() {
                    let token = tokens.next().ok_or_else(|| {
                        MeshError::parse(line, format!("vertex is missing coordinate {}", axis))
                    })?;
                    *slot = token.parse().map_err(|_| {
                        MeshError::parse(line, format!("invalid coordinate '{}'", token))
                    })?;
                }
                buffers
                    .positions
                    .push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                corners.clear();
                for token in tokens {
                    corners.push(resolve_corner(token, buffers.positions.len(), line)?);
                }
                if corners.len() < 3 {
                    return Err(MeshError::parse(
                        line,
                        format!("face has {} corners, need at least 3", corners.len()),
                    ));
                }
                if corners.len() > 3 {
                    debug!("line {}: fan-triangulating {}-gon", line, corners.len());
                }
                for k in 1..corners.len() - 1 {
                    buffers
                        .indices
                        .extend_from_slice(&[corners[0], corners[k], corners[k + 1]]);
                }
            }
            Some(keyword) => {
                if !IGNORED.contains(&keyword) && skipped.insert(keyword) {
                    warn!("line {}: skipping unsupported statement '{}'", line, keyword);
                }
            }
        }
    }

    Ok(buffers)
}

/// Turn one face corner token into a 0-based vertex index.
///
/// Positive indices are 1-based; negative ones count back from the last
/// vertex defined so far.
fn resolve_corner(token: &str, seen: usize, line: usize) -> Result<usize> {
    let vertex = token.split('/').next().unwrap_or(token);
    let index: i64 = vertex
        .parse()
        .map_err(|_| MeshError::parse(line, format!("invalid vertex reference '{}'", token)))?;

    match index {
        0 => Err(MeshError::parse(line, "vertex index 0 is not valid")),
        i if i > 0 => Ok((i - 1) as usize),
        i => {
            let resolved = seen as i64 + i;
            if resolved < 0 {
                Err(MeshError::parse(
                    line,
                    format!("relative index {} reaches before the first vertex", i),
                ))
            } else {
                Ok(resolved as usize)
            }
        }
    }
}

/// Load a mesh from an OBJ file.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let buffers = parse(&text)?;
    debug!(
        "{}: {} positions, {} triangles",
        path.display(),
        buffers.positions.len(),
        buffers.num_triangles()
    );
    build_from_buffers(&buffers.indices, &buffers.positions)
}

/// Write a mesh as OBJ text.
pub fn write<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, mut writer: W) -> Result<()> {
    writeln!(writer, "# hedgemesh OBJ export")?;
    writeln!(writer, "# Vertices: {}", mesh.num_vertices())?;
    writeln!(writer, "# Faces: {}", mesh.num_faces())?;

    for v in mesh.verts() {
        let p = v.position;
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }

    for f in mesh.face_ids() {
        let [a, b, c] = mesh.face_triangle(f);
        writeln!(writer, "f {} {} {}", a.index() + 1, b.index() + 1, c.index() + 1)?;
    }

    Ok(())
}

/// Save a mesh to an OBJ file.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}
