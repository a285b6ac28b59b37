use solid_linalg::MatrixError;
use thiserror::Error;

use crate::geometry::point::Point3d;

/// Failure taxonomy shared by faces, solids, repair and slicing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// The face set does not bound a single closed 2-manifold.
    #[error("not a closed manifold: {reason}")]
    Structural { reason: String },

    /// Too few vertices or faces, coincident points, zero area, non-planar or
    /// self-intersecting input.
    #[error("degenerate input: {reason}")]
    DegenerateInput { reason: String },

    /// A transform matrix could not be decomposed or inverted.
    #[error("numeric singularity: {0}")]
    NumericSingularity(#[from] MatrixError),

    /// A sliced sub-face has vertices strictly on both sides of the cutting
    /// plane. This is a defect in the slicing code, not in the caller's input.
    #[error("sub-face straddles the cutting plane (vertices {normal_side:?} and {opposite_side:?})")]
    StraddleViolation {
        normal_side: Point3d,
        opposite_side: Point3d,
    },
}

impl KernelError {
    pub(crate) fn structural(reason: impl Into<String>) -> Self {
        Self::Structural {
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateInput {
            reason: reason.into(),
        }
    }
}
