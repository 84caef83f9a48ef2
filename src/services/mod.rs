pub mod position_ledger;
pub mod reporting;
pub mod roster;
pub mod simulation;
pub mod ticker;

use std::sync::{Mutex, MutexGuard};

/// Locks shared service state, recovering it if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
