//! Dexcom Share.
//!
//! Login is two calls: `AuthenticatePublisherAccount` resolves the username to an
//! account id, `LoginPublisherAccountById` exchanges it for a session id. Readings
//! come from `ReadPublisherLatestGlucoseValues` in mg/dL.

mod session;
mod types;

use gluco_core::types::Region;
pub use session::DexcomSession;
use url::Url;

use crate::ProviderHttpConfig;

/// Dexcom Share base URL for the United States.
pub const DEXCOM_BASE_URL_US: &str = "https://share2.dexcom.com/ShareWebServices/Services/";

/// Dexcom Share base URL outside the United States.
pub const DEXCOM_BASE_URL_OUS: &str = "https://shareous1.dexcom.com/ShareWebServices/Services/";

/// Dexcom Share base URL for Japan.
pub const DEXCOM_BASE_URL_JP: &str = "https://share.dexcom.jp/ShareWebServices/Services/";

/// Application id used by the US and OUS Share apps.
pub const DEXCOM_APPLICATION_ID: &str = "d89443d2-327c-4a6f-89e5-496bbb0317db";

/// Application id used by the Japanese Share app.
pub const DEXCOM_APPLICATION_ID_JP: &str = "d8665ade-9673-4e27-9ff6-92db4ce13d13";

/// Dexcom Share deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DexcomRegion {
    /// United States (default).
    Us,
    /// Outside the United States.
    Ous,
    /// Japan.
    Jp,
}

impl DexcomRegion {
    /// Maps a stored region code; an empty code means [`DexcomRegion::Us`].
    pub fn from_region(region: &Region) -> Option<Self> {
        match region.as_str() {
            "" | "us" => Some(Self::Us),
            "ous" => Some(Self::Ous),
            "jp" => Some(Self::Jp),
            _ => None,
        }
    }

    /// Base URL of this deployment.
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Us => DEXCOM_BASE_URL_US,
            Self::Ous => DEXCOM_BASE_URL_OUS,
            Self::Jp => DEXCOM_BASE_URL_JP,
        }
    }

    /// Application id expected by this deployment.
    pub fn application_id(self) -> &'static str {
        match self {
            Self::Us | Self::Ous => DEXCOM_APPLICATION_ID,
            Self::Jp => DEXCOM_APPLICATION_ID_JP,
        }
    }
}

/// Where a Dexcom session sends its requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexcomEndpoint {
    pub(crate) base_url: Url,
    pub(crate) application_id: &'static str,
}

impl DexcomEndpoint {
    /// Resolves the endpoint for a stored region, honoring a configured override.
    pub fn resolve(region: &Region, config: &ProviderHttpConfig) -> gluco_core::Result<Self> {
        let region = DexcomRegion::from_region(region).ok_or_else(|| {
            gluco_core::Error::configuration(format!("unknown Dexcom region '{region}'"))
        })?;

        let base_url = match &config.dexcom_base_url {
            Some(url) => url.clone(),
            None => Url::parse(region.base_url()).map_err(crate::Error::from)?,
        };

        Ok(Self {
            base_url: with_trailing_slash(base_url),
            application_id: region.application_id(),
        })
    }
}

/// Ensures relative joins append to the path instead of replacing its last segment.
pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_mapping() {
        assert_eq!(DexcomRegion::from_region(&Region::new("")), Some(DexcomRegion::Us));
        assert_eq!(DexcomRegion::from_region(&Region::new("OUS")), Some(DexcomRegion::Ous));
        assert_eq!(DexcomRegion::from_region(&Region::new("jp")), Some(DexcomRegion::Jp));
        assert_eq!(DexcomRegion::from_region(&Region::new("eu")), None);
        assert_eq!(DexcomRegion::Jp.application_id(), DEXCOM_APPLICATION_ID_JP);
    }

    #[test]
    fn endpoint_honors_override() {
        let config = ProviderHttpConfig::default()
            .with_dexcom_base_url(Url::parse("http://127.0.0.1:9000/share").unwrap());
        let endpoint = DexcomEndpoint::resolve(&Region::new("ous"), &config).unwrap();

        assert_eq!(endpoint.base_url.as_str(), "http://127.0.0.1:9000/share/");
        assert_eq!(endpoint.application_id, DEXCOM_APPLICATION_ID);
    }

    #[test]
    fn unknown_region_is_a_configuration_error() {
        let error = DexcomEndpoint::resolve(&Region::new("mars"), &ProviderHttpConfig::default())
            .unwrap_err();
        assert_eq!(error.kind, gluco_core::ErrorKind::Configuration);
    }
}
