pub mod face;
pub mod orient;
pub mod primitives;
pub mod solid;
pub mod weld;
