//! Temperature aggregation across the configured senseBoxes

use crate::error::{TemperatureError, TemperatureResult};
use crate::sensebox::{recency_window_start, SenseBoxClient};
use chrono::Utc;

/// senseBoxes averaged by `GET /temperature`, queried in this order
pub const SENSEBOX_IDS: [&str; 3] = [
    "5eba5fbad46fb8001b799786",
    "5eb99cacd46fb8001b2ce04c",
    "5e60cf5557703e001bdae7f8",
];

pub struct TemperatureAggregator {
    client: SenseBoxClient,
    device_ids: Vec<String>,
}

impl TemperatureAggregator {
    pub fn new(client: SenseBoxClient) -> Self {
        Self::with_devices(client, SENSEBOX_IDS.iter().map(|id| id.to_string()).collect())
    }

    pub fn with_devices(client: SenseBoxClient, device_ids: Vec<String>) -> Self {
        Self { client, device_ids }
    }

    /// Latest temperature of one senseBox within the last hour
    pub async fn fetch_device_temperature(&self, device_id: &str) -> TemperatureResult<f64> {
        let from = recency_window_start(Utc::now());
        let data = self.client.fetch_box(device_id, from).await?;

        let sensor = data
            .temperature_sensor()
            .ok_or_else(|| TemperatureError::NoTemperatureSensor(device_id.to_string()))?;

        sensor.reading(device_id)
    }

    /// Mean temperature across all devices, rounded to two decimals.
    ///
    /// Devices are queried one after another; the first failure aborts the
    /// whole aggregation and no partial mean is produced.
    pub async fn average_temperature(&self) -> TemperatureResult<f64> {
        let mut readings = Vec::with_capacity(self.device_ids.len());

        for device_id in &self.device_ids {
            match self.fetch_device_temperature(device_id).await {
                Ok(reading) => {
                    tracing::debug!("senseBox {} reports {}", device_id, reading);
                    readings.push(reading);
                }
                Err(e) => {
                    if let TemperatureError::UpstreamFetch { reason, .. } = &e {
                        tracing::warn!("senseBox {} fetch failed: {}", device_id, reason);
                    } else {
                        tracing::warn!("{}", e);
                    }
                    return Err(e);
                }
            }
        }

        mean(&readings)
            .map(round_to_hundredths)
            .ok_or(TemperatureError::NoReadingsAvailable)
    }
}

pub fn mean(readings: &[f64]) -> Option<f64> {
    if readings.is_empty() {
        return None;
    }
    Some(readings.iter().sum::<f64>() / readings.len() as f64)
}

/// Round to two decimals from the exact binary value, ties to even.
///
/// Scaling by 100 first would round the product, which can push values such
/// as `1.11499999..` up to `1.12`.
pub fn round_to_hundredths(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[4.0]), Some(4.0));
        assert_eq!(mean(&[20.0, 21.5, 22.25]), Some(21.25));
    }

    #[test]
    fn test_rounding_does_not_drift() {
        let avg = mean(&[21.004, 21.004, 21.004]).map(round_to_hundredths);
        assert_eq!(avg, Some(21.0));
    }

    #[test]
    fn test_rounding_to_hundredths() {
        let avg = mean(&[1.005, 1.005, 1.006]).map(round_to_hundredths);
        assert_eq!(avg, Some(1.01));
        assert_eq!(round_to_hundredths(-2.345_1), -2.35);
        assert_eq!(round_to_hundredths(7.0), 7.0);
    }

    #[test]
    fn test_rounding_uses_exact_binary_value() {
        // Both means sit just below the decimal midpoint
        let avg = mean(&[1.115, 1.115, 1.115]).map(round_to_hundredths);
        assert_eq!(avg, Some(1.11));

        let avg = mean(&[10.235, 10.235, 10.235]).map(round_to_hundredths);
        assert_eq!(avg, Some(10.23));
    }

    #[test]
    fn test_default_devices_in_order() {
        let client = SenseBoxClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let aggregator = TemperatureAggregator::new(client);
        assert_eq!(aggregator.device_ids, SENSEBOX_IDS);
    }

    #[tokio::test]
    async fn test_empty_device_list_has_no_readings() {
        let client = SenseBoxClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let aggregator = TemperatureAggregator::with_devices(client, Vec::new());
        assert_eq!(
            aggregator.average_temperature().await,
            Err(TemperatureError::NoReadingsAvailable)
        );
    }
}
