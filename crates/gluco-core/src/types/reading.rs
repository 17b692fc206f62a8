use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{ProviderType, UserId};

/// Conversion factor from mg/dL to mmol/L.
pub const MGDL_TO_MMOL: f64 = 0.0555;

/// A single glucose value as returned by a provider session, before attribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlucoseSample {
    /// Glucose concentration in mmol/L.
    pub value: f64,
    /// When the sensor took the measurement, if the provider reported it.
    pub observed_at: Option<Timestamp>,
}

impl GlucoseSample {
    /// Creates a sample from a value already expressed in mmol/L.
    pub const fn new(value: f64, observed_at: Option<Timestamp>) -> Self {
        Self { value, observed_at }
    }

    /// Creates a sample from a mg/dL value, rounded to one decimal in mmol/L.
    pub fn from_mg_dl(mg_dl: f64, observed_at: Option<Timestamp>) -> Self {
        let value = (mg_dl * MGDL_TO_MMOL * 10.0).round() / 10.0;
        Self { value, observed_at }
    }
}

/// A sample attributed to the user and provider of the session that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Owner of the connection that produced the sample.
    pub user_id: UserId,
    /// Provider the sample came from.
    pub provider_type: ProviderType,
    /// Glucose concentration in mmol/L.
    pub value: f64,
    /// Sensor time of the measurement, if known.
    pub observed_at: Option<Timestamp>,
}

impl Reading {
    /// Attributes a sample.
    pub fn new(user_id: UserId, provider_type: ProviderType, sample: GlucoseSample) -> Self {
        Self {
            user_id,
            provider_type,
            value: sample.value,
            observed_at: sample.observed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mg_dl_is_normalized_to_one_decimal() {
        assert_eq!(GlucoseSample::from_mg_dl(101.0, None).value, 5.6);
        assert_eq!(GlucoseSample::from_mg_dl(180.0, None).value, 10.0);
        assert_eq!(GlucoseSample::from_mg_dl(54.0, None).value, 3.0);
    }

    #[test]
    fn reading_keeps_attribution() {
        let sample = GlucoseSample::new(7.2, None);
        let reading = Reading::new(UserId::new(9), ProviderType::Libre, sample);
        assert_eq!(reading.user_id, UserId::new(9));
        assert_eq!(reading.provider_type, ProviderType::Libre);
        assert_eq!(reading.value, 7.2);
    }
}
