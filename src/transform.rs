//! Model transform context.
//!
//! A [`ModelTransform`] accumulates scale, translation and rotation into a
//! single homogeneous matrix. It is a value kept next to a mesh, never part
//! of it: applying it reads positions by reference and leaves connectivity
//! alone.
//!
//! Each operation composes from the left, so the most recent call is applied
//! last:
//!
//! ```
//! use hedgemesh::transform::ModelTransform;
//! use nalgebra::Point3;
//!
//! let mut context = ModelTransform::new();
//! context.scale(2.0, 2.0, 2.0);
//! context.translate(1.0, 0.0, 0.0);
//!
//! let p = context.transform_point(&Point3::new(1.0, 1.0, 1.0));
//! assert_eq!(p, Point3::new(3.0, 2.0, 2.0));
//! ```

use nalgebra::{Matrix4, Point3, Unit, UnitQuaternion, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Accumulated model matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    context: Matrix4<f64>,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelTransform {
    /// Create an identity transform.
    pub fn new() -> Self {
        Self {
            context: Matrix4::identity(),
        }
    }

    /// The model matrix at call time.
    #[inline]
    pub fn model_matrix(&self) -> &Matrix4<f64> {
        &self.context
    }

    /// Reset to the identity.
    pub fn reset(&mut self) {
        self.context = Matrix4::identity();
    }

    /// Scale along each axis.
    pub fn scale(&mut self, sx: f64, sy: f64, sz: f64) -> &mut Self {
        self.apply(Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz)))
    }

    /// Translate by `(tx, ty, tz)`.
    pub fn translate(&mut self, tx: f64, ty: f64, tz: f64) -> &mut Self {
        self.apply(Matrix4::new_translation(&Vector3::new(tx, ty, tz)))
    }

    /// Rotate counter-clockwise by `angle` radians about `axis`.
    ///
    /// The axis need not be normalised but must not be zero.
    pub fn rotate(&mut self, axis: &Vector3<f64>, angle: f64) -> Result<&mut Self> {
        let axis = Unit::try_new(*axis, f64::EPSILON).ok_or_else(|| {
            MeshError::invalid_param(
                "axis",
                format!("[{}, {}, {}]", axis.x, axis.y, axis.z),
                "rotation axis has zero length",
            )
        })?;
        let rotation = UnitQuaternion::from_axis_angle(&axis, angle);
        Ok(self.apply(rotation.to_homogeneous()))
    }

    fn apply(&mut self, m: Matrix4<f64>) -> &mut Self {
        self.context = m * self.context;
        self
    }

    /// Map a point through the model matrix.
    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.context.transform_point(p)
    }

    /// Transformed copies of every vertex position, in vertex order.
    pub fn transformed_positions<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>) -> Vec<Point3<f64>> {
        mesh.verts()
            .iter()
            .map(|v| self.transform_point(&v.position))
            .collect()
    }
}
