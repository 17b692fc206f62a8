//! Mock implementations of the engine's collaborators.

mod directory;
mod factory;
mod session;
mod sink;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use directory::MockDirectory;
pub use factory::MockSessionFactory;
pub use session::{FetchStep, ReauthStep, ScriptedSession, SessionProbe, SessionScript};
pub use sink::RecordingSink;

/// Locks a mutex, ignoring poisoning from a panicked test thread.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
