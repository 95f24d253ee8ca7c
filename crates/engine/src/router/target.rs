use async_trait::async_trait;
use serde::Serialize;

use crate::incident::model::Incident;

/// One normalized incident on its way to a registered consumer.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub incident: Incident,
    pub correlation_id: String,
}

/// A registered consumer of normalized incidents. Delivery is
/// at-least-once; implementations must tolerate redelivery.
#[async_trait]
pub trait RouteTarget: Send + Sync {
    fn name(&self) -> &'static str;
    async fn deliver(&self, delivery: &Delivery) -> Result<(), DeliveryError>;
}

#[derive(Debug)]
pub struct DeliveryError(pub String);

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "delivery: {}", self.0)
    }
}

impl std::error::Error for DeliveryError {}
