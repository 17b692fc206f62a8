#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod fixtures;
mod mock;

pub use fixtures::Fixtures;
pub use mock::{
    FetchStep, MockDirectory, MockSessionFactory, ReauthStep, RecordingSink, ScriptedSession,
    SessionProbe, SessionScript,
};
