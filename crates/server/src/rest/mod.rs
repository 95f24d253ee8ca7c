pub mod dlq;
pub mod health;
pub mod incidents;
pub mod ingest;
pub mod metrics;
pub mod router;

pub use router::{router, AppState};
