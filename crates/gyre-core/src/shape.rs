//! Aggregate shapes: fixed-arity vectors and square matrices.
//!
//! A [`Shape`] describes the logical layout of one aggregate. Fixed shapes
//! (2, 3, 4) carry no payload; N-ary shapes carry their dimension. Matrices
//! are always square and stored row-major.

use std::fmt;

use crate::scalar::Precision;

/// Logical layout of a single vector or matrix aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Two-component vector.
    Vec2,
    /// Three-component vector.
    Vec3,
    /// Four-component vector.
    Vec4,
    /// Vector with an arbitrary component count.
    VecN(u32),
    /// 2×2 matrix.
    Mat2,
    /// 3×3 matrix.
    Mat3,
    /// 4×4 matrix.
    Mat4,
    /// N×N matrix.
    MatN(u32),
}

impl Shape {
    /// The vector shape with `len` components, preferring the fixed
    /// families for 2, 3 and 4.
    pub fn vector(len: u32) -> Self {
        match len {
            2 => Self::Vec2,
            3 => Self::Vec3,
            4 => Self::Vec4,
            n => Self::VecN(n),
        }
    }

    /// The square matrix shape with `dim` rows, preferring the fixed
    /// families for 2, 3 and 4.
    pub fn matrix(dim: u32) -> Self {
        match dim {
            2 => Self::Mat2,
            3 => Self::Mat3,
            4 => Self::Mat4,
            n => Self::MatN(n),
        }
    }

    /// Number of scalar elements in one aggregate of this shape.
    pub fn len(self) -> usize {
        match self {
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
            Self::VecN(n) => n as usize,
            Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
            Self::MatN(n) => n as usize * n as usize,
        }
    }

    /// Whether the aggregate holds zero elements (`VecN(0)` / `MatN(0)`).
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Row count. Vectors are a single row.
    pub fn rows(self) -> usize {
        match self {
            Self::Vec2 | Self::Vec3 | Self::Vec4 | Self::VecN(_) => 1,
            Self::Mat2 => 2,
            Self::Mat3 => 3,
            Self::Mat4 => 4,
            Self::MatN(n) => n as usize,
        }
    }

    /// Column count. For vectors this equals the component count.
    pub fn cols(self) -> usize {
        match self {
            Self::Vec2 | Self::Vec3 | Self::Vec4 | Self::VecN(_) => self.len(),
            Self::Mat2 | Self::Mat3 | Self::Mat4 | Self::MatN(_) => self.rows(),
        }
    }

    /// Whether this shape is a matrix.
    pub fn is_matrix(self) -> bool {
        matches!(self, Self::Mat2 | Self::Mat3 | Self::Mat4 | Self::MatN(_))
    }

    /// Whether this shape carries a runtime dimension.
    pub fn is_nary(self) -> bool {
        matches!(self, Self::VecN(_) | Self::MatN(_))
    }

    /// The ring family this shape is served from.
    pub fn kind(self) -> ShapeKind {
        match self {
            Self::Vec2 => ShapeKind::Vec2,
            Self::Vec3 => ShapeKind::Vec3,
            Self::Vec4 => ShapeKind::Vec4,
            Self::VecN(_) => ShapeKind::VecN,
            Self::Mat2 => ShapeKind::Mat2,
            Self::Mat3 => ShapeKind::Mat3,
            Self::Mat4 => ShapeKind::Mat4,
            Self::MatN(_) => ShapeKind::MatN,
        }
    }

    /// Size in bytes of one aggregate at the given precision.
    pub fn byte_width(self, precision: Precision) -> usize {
        self.len() * precision.byte_width()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vec2 => write!(f, "vec2"),
            Self::Vec3 => write!(f, "vec3"),
            Self::Vec4 => write!(f, "vec4"),
            Self::VecN(n) => write!(f, "vec{n}"),
            Self::Mat2 => write!(f, "mat2"),
            Self::Mat3 => write!(f, "mat3"),
            Self::Mat4 => write!(f, "mat4"),
            Self::MatN(n) => write!(f, "mat{n}x{n}"),
        }
    }
}

/// One of the eight ring families a factory keeps per precision.
///
/// Every fixed shape has its own family; all N-ary vectors share
/// [`ShapeKind::VecN`] and all N-ary matrices share [`ShapeKind::MatN`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    /// Two-component vectors.
    Vec2,
    /// Three-component vectors.
    Vec3,
    /// Four-component vectors.
    Vec4,
    /// N-ary vectors.
    VecN,
    /// 2×2 matrices.
    Mat2,
    /// 3×3 matrices.
    Mat3,
    /// 4×4 matrices.
    Mat4,
    /// N×N matrices.
    MatN,
}

impl ShapeKind {
    /// Number of ring families.
    pub const COUNT: usize = 8;

    /// All families in index order.
    pub const ALL: [ShapeKind; Self::COUNT] = [
        Self::Vec2,
        Self::Vec3,
        Self::Vec4,
        Self::VecN,
        Self::Mat2,
        Self::Mat3,
        Self::Mat4,
        Self::MatN,
    ];

    /// Dense index in `0..COUNT`, used to address per-family tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The concrete shape for fixed families, `None` for N-ary ones.
    pub fn fixed_shape(self) -> Option<Shape> {
        match self {
            Self::Vec2 => Some(Shape::Vec2),
            Self::Vec3 => Some(Shape::Vec3),
            Self::Vec4 => Some(Shape::Vec4),
            Self::Mat2 => Some(Shape::Mat2),
            Self::Mat3 => Some(Shape::Mat3),
            Self::Mat4 => Some(Shape::Mat4),
            Self::VecN | Self::MatN => None,
        }
    }
}
