//! Traits shared across geometry and topology.

use crate::geometry::transform::AffineTransform;

/// Anything that can be moved by an [`AffineTransform`].
///
/// Points, vectors and segments map infallibly. Types that carry validity
/// invariants (planes, faces, solids) return a `Result`, because an arbitrary
/// 4x4 matrix can collapse them.
pub trait Shift {
    type Output;

    fn shift(&self, transform: &AffineTransform) -> Self::Output;
}
