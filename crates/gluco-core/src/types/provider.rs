use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoStaticStr};

/// Supported CGM data providers.
///
/// The string form (`dexcom`, `libre`) is what the directory stores and what is
/// written as the `provider_type` tag on every point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(AsRefStr, EnumIter, EnumString, IntoStaticStr, strum::Display)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Dexcom Share.
    Dexcom,
    /// Abbott LibreLinkUp.
    Libre,
}

impl ProviderType {
    /// Returns every known provider type.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

/// Provider-specific region code as stored with a connection (`us`, `ous`, `eu`, ...).
///
/// Normalized to lowercase with surrounding whitespace removed. An empty region means
/// the provider's default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    /// Creates a normalized region code.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_lowercase())
    }

    /// Returns the normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when no region was stored.
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Region {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Region {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn provider_type_string_form() {
        assert_eq!(ProviderType::Dexcom.as_ref(), "dexcom");
        assert_eq!(ProviderType::Libre.to_string(), "libre");
        assert_eq!(ProviderType::from_str("Dexcom").unwrap(), ProviderType::Dexcom);
        assert!(ProviderType::from_str("medtronic").is_err());
    }

    #[test]
    fn provider_type_all() {
        let all: Vec<_> = ProviderType::all().collect();
        assert_eq!(all, vec![ProviderType::Dexcom, ProviderType::Libre]);
    }

    #[test]
    fn region_is_normalized() {
        assert_eq!(Region::new(" OUS ").as_str(), "ous");
        assert!(Region::new("  ").is_default());
    }
}
