use std::collections::BTreeMap;

use jiff::Timestamp;

use super::Reading;

/// Measurement name every glucose reading is written under.
pub const GLUCOSE_MEASUREMENT: &str = "glucose";

/// Tag carrying the owning user id.
pub const TAG_USER_ID: &str = "user_id";

/// Tag carrying the provider type.
pub const TAG_PROVIDER_TYPE: &str = "provider_type";

/// Field carrying the glucose value.
pub const FIELD_VALUE: &str = "value";

/// A tagged, timestamped set of numeric fields as accepted by a time-series sink.
///
/// Tags and fields are kept ordered so that encodings are deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Measurement (series) name.
    pub measurement: String,
    /// Indexed string tags.
    pub tags: BTreeMap<String, String>,
    /// Numeric fields.
    pub fields: BTreeMap<String, f64>,
    /// Point time, nanosecond precision.
    pub timestamp: Timestamp,
}

impl Point {
    /// Creates an empty point for `measurement` at `timestamp`.
    pub fn new(measurement: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    /// Adds a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Adds a numeric field.
    pub fn with_field(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Builds the `glucose` point for a reading.
    ///
    /// Falls back to the current wall-clock time when the provider did not report
    /// an observation time.
    pub fn from_reading(reading: &Reading) -> Self {
        let timestamp = reading.observed_at.unwrap_or_else(Timestamp::now);
        Self::new(GLUCOSE_MEASUREMENT, timestamp)
            .with_tag(TAG_USER_ID, reading.user_id.to_string())
            .with_tag(TAG_PROVIDER_TYPE, reading.provider_type.as_ref())
            .with_field(FIELD_VALUE, reading.value)
    }

    /// Returns a tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Returns a field value.
    pub fn field(&self, key: &str) -> Option<f64> {
        self.fields.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProviderType, UserId};

    #[test]
    fn glucose_point_from_reading() {
        let observed_at: Timestamp = "2024-05-01T12:00:00Z".parse().unwrap();
        let reading = Reading {
            user_id: UserId::new(1),
            provider_type: ProviderType::Dexcom,
            value: 5.6,
            observed_at: Some(observed_at),
        };

        let point = Point::from_reading(&reading);
        assert_eq!(point.measurement, GLUCOSE_MEASUREMENT);
        assert_eq!(point.tag(TAG_USER_ID), Some("1"));
        assert_eq!(point.tag(TAG_PROVIDER_TYPE), Some("dexcom"));
        assert_eq!(point.field(FIELD_VALUE), Some(5.6));
        assert_eq!(point.fields.len(), 1);
        assert_eq!(point.timestamp, observed_at);
    }

    #[test]
    fn missing_observation_time_uses_now() {
        let before = Timestamp::now();
        let reading = Reading {
            user_id: UserId::new(2),
            provider_type: ProviderType::Libre,
            value: 4.1,
            observed_at: None,
        };

        let point = Point::from_reading(&reading);
        assert!(point.timestamp >= before);
        assert!(point.timestamp <= Timestamp::now());
    }
}
