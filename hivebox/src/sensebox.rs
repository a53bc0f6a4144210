//! openSenseMap client
//!
//! Fetches the sensor list of a single senseBox and locates its temperature
//! reading. The upstream payload is untrusted: every deviation from the
//! expected shape becomes a [`TemperatureError`], never a panic.

use crate::error::{TemperatureError, TemperatureResult};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;

pub const OPENSENSEMAP_BASE_URL: &str = "https://api.opensensemap.org/boxes";

/// Title fragment matching both "Temperatur" and "Temperature"
const TEMPERATURE_TITLE: &str = "temperatur";

/// Start of the recency window sent as `from-date`
pub fn recency_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - ChronoDuration::hours(1)
}

pub fn format_from_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parsed body of `GET /boxes/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoxData {
    #[serde(default)]
    pub sensors: Vec<SensorRecord>,
}

impl BoxData {
    /// First sensor whose title mentions a temperature, in upstream order
    pub fn temperature_sensor(&self) -> Option<&SensorRecord> {
        self.sensors.iter().find(|sensor| sensor.is_temperature())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SensorRecord {
    /// Absent key means untitled; an explicit `null` or non-string is rejected
    #[serde(default, deserialize_with = "present_title")]
    pub title: Option<String>,
    #[serde(rename = "lastMeasurement", default)]
    pub last_measurement: Option<Value>,
}

impl SensorRecord {
    pub fn is_temperature(&self) -> bool {
        self.title
            .as_deref()
            .map(|title| title.to_lowercase().contains(TEMPERATURE_TITLE))
            .unwrap_or(false)
    }

    /// Extract the numeric value of the last measurement.
    ///
    /// The measurement timestamp is not checked here; recency relies on the
    /// `from-date` filter applied upstream.
    pub fn reading(&self, device_id: &str) -> TemperatureResult<f64> {
        let measurement = match &self.last_measurement {
            Some(measurement) if is_truthy(measurement) => measurement,
            _ => return Err(TemperatureError::NoRecentReading(device_id.to_string())),
        };

        parse_measurement_value(measurement)
            .ok_or_else(|| TemperatureError::InvalidReading(device_id.to_string()))
    }
}

fn present_title<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(Some)
}

/// JSON truthiness: null, false, zero and empty containers are all "missing"
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn parse_measurement_value(measurement: &Value) -> Option<f64> {
    let value = match measurement.get("value")? {
        Value::String(raw) => raw.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };

    value.is_finite().then_some(value)
}

pub struct SenseBoxClient {
    client: reqwest::Client,
    base_url: String,
}

impl SenseBoxClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hivebox/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn box_url(&self, device_id: &str, from: DateTime<Utc>) -> String {
        format!(
            "{}/{}?from-date={}",
            self.base_url,
            device_id,
            format_from_date(from)
        )
    }

    /// Fetch the sensor list of one senseBox.
    ///
    /// Transport failures, non-success statuses and undecodable bodies all
    /// map to [`TemperatureError::UpstreamFetch`].
    pub async fn fetch_box(
        &self,
        device_id: &str,
        from: DateTime<Utc>,
    ) -> TemperatureResult<BoxData> {
        let url = self.box_url(device_id, from);
        tracing::debug!("Fetching senseBox {} from {}", device_id, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TemperatureError::upstream(device_id, e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(TemperatureError::upstream(
                device_id,
                format!("upstream returned {}", status),
            ));
        }

        response
            .json::<BoxData>()
            .await
            .map_err(|e| TemperatureError::upstream(device_id, format!("invalid body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const DEVICE: &str = "5eba5fbad46fb8001b799786";

    fn sensor(title: &str, last_measurement: Option<Value>) -> SensorRecord {
        SensorRecord {
            title: Some(title.to_string()),
            last_measurement,
        }
    }

    #[test]
    fn test_title_matching_is_case_insensitive() {
        assert!(sensor("Lufttemperatur", None).is_temperature());
        assert!(sensor("TEMPERATURE", None).is_temperature());
        assert!(sensor("Temperatur", None).is_temperature());
        assert!(!sensor("Humidity", None).is_temperature());
        assert!(!sensor("rel. Luftfeuchte", None).is_temperature());

        let untitled = SensorRecord::default();
        assert!(!untitled.is_temperature());
    }

    #[test]
    fn test_first_matching_sensor_wins() {
        let data: BoxData = serde_json::from_value(json!({
            "sensors": [
                { "title": "Humidity", "lastMeasurement": { "value": "55.0" } },
                { "title": "Temperatur", "lastMeasurement": { "value": "12.5" } },
                { "title": "Temperature", "lastMeasurement": { "value": "99.0" } }
            ]
        }))
        .unwrap();

        let found = data.temperature_sensor().unwrap();
        assert_eq!(found.title.as_deref(), Some("Temperatur"));
        assert_eq!(found.reading(DEVICE), Ok(12.5));
    }

    #[test]
    fn test_missing_sensors_key_is_empty_list() {
        let data: BoxData = serde_json::from_value(json!({ "name": "box" })).unwrap();
        assert!(data.sensors.is_empty());
        assert!(data.temperature_sensor().is_none());
    }

    #[test]
    fn test_null_or_non_string_title_is_rejected() {
        let null_title = r#"{"sensors":[{"title":null,"lastMeasurement":{"value":"20.1"}}]}"#;
        assert!(serde_json::from_str::<BoxData>(null_title).is_err());

        let numeric_title = r#"{"sensors":[{"title":5}]}"#;
        assert!(serde_json::from_str::<BoxData>(numeric_title).is_err());

        let untitled = r#"{"sensors":[{"lastMeasurement":{"value":"20.1"}}]}"#;
        let data = serde_json::from_str::<BoxData>(untitled).unwrap();
        assert_eq!(data.sensors.len(), 1);
        assert!(data.temperature_sensor().is_none());
    }

    #[test]
    fn test_non_list_sensors_is_rejected() {
        assert!(serde_json::from_str::<BoxData>(r#"{"sensors":{}}"#).is_err());
        assert!(serde_json::from_str::<BoxData>(r#"{"sensors":null}"#).is_err());
    }

    #[test]
    fn test_reading_parses_numeric_string() {
        let record = sensor(
            "Temperatur",
            Some(json!({ "value": " 21.37 ", "createdAt": "2024-01-01T00:00:00.000Z" })),
        );
        assert_eq!(record.reading(DEVICE), Ok(21.37));
    }

    #[test]
    fn test_reading_accepts_json_number() {
        let record = sensor("Temperatur", Some(json!({ "value": -3.5 })));
        assert_eq!(record.reading(DEVICE), Ok(-3.5));
    }

    #[test]
    fn test_missing_or_empty_measurement_is_not_recent() {
        for measurement in [
            None,
            Some(Value::Null),
            Some(json!({})),
            Some(json!("")),
            Some(json!(false)),
        ] {
            let record = sensor("Temperatur", measurement);
            assert_eq!(
                record.reading(DEVICE),
                Err(TemperatureError::NoRecentReading(DEVICE.to_string()))
            );
        }
    }

    #[test]
    fn test_unparseable_value_is_invalid() {
        for measurement in [
            json!({ "value": "abc" }),
            json!({ "value": null }),
            json!({ "value": true }),
            json!({ "value": "NaN" }),
            json!({ "createdAt": "2024-01-01T00:00:00.000Z" }),
            json!("21.5"),
            json!([1, 2]),
        ] {
            let record = sensor("Temperatur", Some(measurement.clone()));
            assert_eq!(
                record.reading(DEVICE),
                Err(TemperatureError::InvalidReading(DEVICE.to_string())),
                "measurement {} should be invalid",
                measurement
            );
        }
    }

    #[test]
    fn test_from_date_window() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 15).unwrap();
        let start = recency_window_start(now);
        assert_eq!(format_from_date(start), "2024-02-29T23:30:15Z");
    }

    #[test]
    fn test_box_url() {
        let client =
            SenseBoxClient::new("https://api.opensensemap.org/boxes/", Duration::from_secs(5))
                .unwrap();
        let from = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(
            client.box_url(DEVICE, from),
            "https://api.opensensemap.org/boxes/5eba5fbad46fb8001b799786?from-date=2024-06-01T12:00:00Z"
        );
    }
}
