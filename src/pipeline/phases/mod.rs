// Pipeline phases, executed in file order

#[path = "01_readiness.rs"]
pub mod readiness;
#[path = "02_ingest.rs"]
pub mod ingest;
#[path = "03_transform.rs"]
pub mod transform;

pub use ingest::IngestPhase;
pub use readiness::ReadinessPhase;
pub use transform::{read_curated, TransformPhase};
