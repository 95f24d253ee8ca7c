pub mod coalesce;
pub mod fingerprint;
pub mod model;
pub mod normalize;

pub use coalesce::{Coalescer, OpenExecutions};
pub use model::{Incident, IncidentStatus, Severity};
pub use normalize::{NormalizedBatch, Normalizer, SourceKind, ValidationError};
