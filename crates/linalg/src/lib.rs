//! Dense matrices, LU decomposition and rotation helpers used by the
//! solid kernel's affine transforms.

pub mod lu;
pub mod matrix;
pub mod rotation;

pub use lu::*;
pub use matrix::*;
pub use rotation::*;
