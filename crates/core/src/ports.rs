//! Outbound ports the core depends on. Implementations live in other crates.

use async_trait::async_trait;

use crate::domain::{SensorId, SensorSeries, TimeRange};
use crate::errors::AdapterError;

/// Data access boundary. Authentication, HTTP details, and retry policy for
/// the remote sensor API are the implementation's concern; the engine depends
/// only on this signature.
#[async_trait]
pub trait SensorStore: Send + Sync {
    /// Fetches one series per requested sensor for the half-open range.
    /// Sensors with no readings in the range come back as empty series.
    async fn fetch(
        &self,
        sensor_ids: &[SensorId],
        range: &TimeRange,
    ) -> Result<Vec<SensorSeries>, AdapterError>;
}
