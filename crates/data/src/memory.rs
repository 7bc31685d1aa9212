//! Deterministic in-memory sensor store for tests and offline demos.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use atrium_core::config::BuildingProfile;
use atrium_core::errors::AdapterError;
use atrium_core::ports::SensorStore;
use atrium_core::{Reading, SensorId, SensorSeries, TimeRange};

#[derive(Debug, Default)]
pub struct InMemorySensorStore {
    readings: BTreeMap<SensorId, Vec<Reading>>,
}

impl InMemorySensorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sensor_id: SensorId, reading: Reading) {
        self.readings.entry(sensor_id).or_default().push(reading);
    }

    pub fn with_readings(
        mut self,
        sensor_id: &str,
        readings: impl IntoIterator<Item = (DateTime<Utc>, f64)>,
    ) -> Self {
        for (timestamp, value) in readings {
            self.insert(SensorId(sensor_id.to_string()), Reading::new(timestamp, value));
        }
        self
    }

    /// Seeds two weeks of hourly readings for every sensor in the profile,
    /// ending at `anchor`. Values follow a fixed per-kind baseline plus a
    /// repeating daily swing, so every run over the same anchor produces the
    /// same data.
    pub fn demo(profile: &BuildingProfile, anchor: DateTime<Utc>) -> Self {
        let mut store = Self::new();
        for sensor in &profile.sensors {
            let baseline = match sensor.kind.as_str() {
                "temperature" => 70.0,
                "humidity" => 45.0,
                "co2" => 600.0,
                "energy" => 120.0,
                _ => 50.0,
            };
            for hour in 0..(14 * 24) {
                let timestamp = anchor - Duration::hours(hour);
                let swing = ((hour % 24) as f64 - 11.5) * 0.2;
                store.insert(sensor.id.clone(), Reading::new(timestamp, baseline + swing));
            }
        }
        store
    }
}

#[async_trait]
impl SensorStore for InMemorySensorStore {
    async fn fetch(
        &self,
        sensor_ids: &[SensorId],
        range: &TimeRange,
    ) -> Result<Vec<SensorSeries>, AdapterError> {
        Ok(sensor_ids
            .iter()
            .map(|sensor_id| {
                let mut points: Vec<Reading> = self
                    .readings
                    .get(sensor_id)
                    .map(|readings| {
                        readings
                            .iter()
                            .filter(|reading| range.contains(reading.timestamp))
                            .copied()
                            .collect()
                    })
                    .unwrap_or_default();
                points.sort_by_key(|reading| reading.timestamp);
                SensorSeries::new(sensor_id.clone(), *range, points)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use atrium_core::config::BuildingProfile;
    use atrium_core::ports::SensorStore;
    use atrium_core::{SensorId, TimeRange};

    use super::InMemorySensorStore;

    fn anchor() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 21, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn fetch_respects_the_half_open_range() {
        let store = InMemorySensorStore::new().with_readings(
            "temp-204",
            vec![
                (anchor() - Duration::hours(2), 70.0),
                (anchor() - Duration::hours(1), 71.0),
                (anchor(), 72.0),
            ],
        );
        let range = TimeRange::new(anchor() - Duration::hours(2), anchor()).unwrap();

        let series = store.fetch(&[SensorId("temp-204".to_string())], &range).await.unwrap();
        assert_eq!(series.len(), 1);
        // The reading at `anchor` sits on the exclusive end.
        assert_eq!(series[0].points.len(), 2);
    }

    #[tokio::test]
    async fn unknown_sensor_comes_back_as_an_empty_series() {
        let store = InMemorySensorStore::new();
        let range = TimeRange::new(anchor() - Duration::hours(1), anchor()).unwrap();
        let series = store.fetch(&[SensorId("ghost".to_string())], &range).await.unwrap();
        assert_eq!(series.len(), 1);
        assert!(series[0].is_empty());
    }

    #[tokio::test]
    async fn demo_seed_is_deterministic() {
        let profile = BuildingProfile::demo();
        let range = TimeRange::new(anchor() - Duration::days(7), anchor()).unwrap();
        let id = SensorId("temp-204".to_string());

        let first_store = InMemorySensorStore::demo(&profile, anchor());
        let first_ids = [id.clone()];
        let first = first_store.fetch(&first_ids, &range);
        let second_store = InMemorySensorStore::demo(&profile, anchor());
        let second_ids = [id];
        let second = second_store.fetch(&second_ids, &range);
        assert_eq!(first.await.unwrap(), second.await.unwrap());
    }
}
