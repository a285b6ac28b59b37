pub mod audit;
pub mod volume;

pub use audit::{AuditFinding, ManifoldAudit};
pub use volume::{verify_slice_volume, VolumeVerification};
