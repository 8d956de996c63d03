//! Typed handles for mesh entities.
//!
//! Every entity table in a [`HalfEdgeMesh`](super::HalfEdgeMesh) is dense and
//! 0-based, so a handle is nothing more than a position in its table. The
//! wrappers keep vertex, edge, half-edge and face positions from being mixed
//! up, and are generic over the integer width so small meshes can use `u16`
//! and huge ones `u64`.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Integer types usable as the storage of a mesh handle.
pub trait MeshIndex:
    Copy + Clone + Eq + PartialEq + Ord + PartialOrd + Hash + Debug + Send + Sync + 'static
{
    /// Largest number of elements of one kind that this width can address.
    const CAPACITY: usize;

    /// Convert from usize to this index type.
    ///
    /// Callers guarantee `v < Self::CAPACITY`; the builder checks element
    /// counts up front and reports [`MeshError::IndexOverflow`](crate::error::MeshError::IndexOverflow).
    fn from_usize(v: usize) -> Self;

    /// Convert to usize.
    fn to_usize(self) -> usize;
}

macro_rules! impl_mesh_index {
    ($ty:ty) => {
        impl MeshIndex for $ty {
            const CAPACITY: usize = if (<$ty>::MAX as u128) < (usize::MAX as u128) {
                <$ty>::MAX as usize
            } else {
                usize::MAX
            };

            #[inline]
            fn from_usize(v: usize) -> Self {
                debug_assert!(v < Self::CAPACITY, "index {} too large for {}", v, stringify!($ty));
                v as $ty
            }

            #[inline]
            fn to_usize(self) -> usize {
                self as usize
            }
        }
    };
}

impl_mesh_index!(u16);
impl_mesh_index!(u32);
impl_mesh_index!(u64);

/// Handle of a vertex.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// Handle of an undirected edge.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct EdgeId<I: MeshIndex = u32>(I);

/// Handle of a directed half-edge.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId<I: MeshIndex = u32>(I);

/// Handle of a triangular face.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

macro_rules! impl_handle {
    ($name:ident, $tag:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Create a handle from a table position.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// Position of the entity in its table.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// The underlying integer.
            #[inline]
            pub fn raw(self) -> I {
                self.0
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $tag, self.index())
            }
        }

        impl<I: MeshIndex> fmt::Display for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.index())
            }
        }

        impl<I: MeshIndex> From<usize> for $name<I> {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_handle!(VertexId, "V");
impl_handle!(EdgeId, "E");
impl_handle!(HalfEdgeId, "HE");
impl_handle!(FaceId, "F");

impl<I: MeshIndex> HalfEdgeId<I> {
    /// The other half-edge created together with this one.
    ///
    /// Half-edges are allocated in pairs, so twins sit at `2e` and `2e + 1`.
    #[inline]
    pub fn pair(self) -> Self {
        Self::new(self.index() ^ 1)
    }

    /// The edge that owns this half-edge under pair allocation.
    #[inline]
    pub fn pair_edge(self) -> EdgeId<I> {
        EdgeId::new(self.index() / 2)
    }
}
