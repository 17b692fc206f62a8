//! Domain types exchanged between the directory, the engine and the sink.

mod connection;
mod credential;
mod ids;
mod point;
mod provider;
mod reading;

pub use connection::ConnectionRecord;
pub use credential::ProviderCredential;
pub use ids::{ConnectionId, UserId};
pub use point::{FIELD_VALUE, GLUCOSE_MEASUREMENT, Point, TAG_PROVIDER_TYPE, TAG_USER_ID};
pub use provider::{ProviderType, Region};
pub use reading::{GlucoseSample, MGDL_TO_MMOL, Reading};
