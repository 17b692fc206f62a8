//! LibreLinkUp.
//!
//! Login posts the account email and password to `llu/auth/login`. The global host
//! may answer with a redirect to a regional host instead of a ticket; the session
//! follows it once. Readings come from the first patient of `llu/connections`.

mod session;
mod types;

use gluco_core::types::Region;
pub use session::LibreSession;
use url::Url;

use crate::ProviderHttpConfig;
use crate::dexcom::with_trailing_slash;

/// Global LibreLinkUp host.
pub const LIBRE_BASE_URL: &str = "https://api.libreview.io/";

/// Value of the `product` header expected by LibreLinkUp.
pub const LIBRE_PRODUCT: &str = "llu.android";

/// Value of the `version` header expected by LibreLinkUp.
pub const LIBRE_VERSION: &str = "4.12.0";

/// Where a LibreLinkUp session sends its requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibreEndpoint {
    pub(crate) base_url: Url,
    /// A configured override ignores region redirects.
    pub(crate) pinned: bool,
}

impl LibreEndpoint {
    /// Resolves the endpoint for a stored region, honoring a configured override.
    pub fn resolve(region: &Region, config: &ProviderHttpConfig) -> gluco_core::Result<Self> {
        if let Some(url) = &config.libre_base_url {
            return Ok(Self {
                base_url: with_trailing_slash(url.clone()),
                pinned: true,
            });
        }

        let base_url = regional_url(region.as_str()).ok_or_else(|| {
            gluco_core::Error::configuration(format!("unknown LibreLinkUp region '{region}'"))
        })?;

        Ok(Self {
            base_url,
            pinned: false,
        })
    }

    /// Moves to the host of `region`, unless pinned.
    ///
    /// Returns `false` when the region code is not usable as a host label.
    pub(crate) fn redirect(&mut self, region: &str) -> bool {
        if self.pinned {
            return true;
        }

        match regional_url(&region.to_ascii_lowercase()) {
            Some(url) => {
                self.base_url = url;
                true
            }
            None => false,
        }
    }
}

/// Builds `https://api-{region}.libreview.io/`; empty and `global` map to the global host.
fn regional_url(region: &str) -> Option<Url> {
    if region.is_empty() || region == "global" {
        return Url::parse(LIBRE_BASE_URL).ok();
    }

    if !region.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    Url::parse(&format!("https://api-{region}.libreview.io/")).ok()
}
