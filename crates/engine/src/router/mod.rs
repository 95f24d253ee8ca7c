pub mod dead_letter;
pub mod dispatch;
pub mod target;

pub use dead_letter::{DeadLetter, DeadLetterStore};
pub use dispatch::{ReplayError, RouteResult, Router, TargetDelivery};
pub use target::{Delivery, DeliveryError, RouteTarget};
