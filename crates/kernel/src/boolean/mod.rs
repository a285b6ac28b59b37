pub mod cap;
pub mod classify;
pub mod slice;

pub use slice::{slice_by_planes, slice_solid};
