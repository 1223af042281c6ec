//! Synchronization utilities for robust mutex handling

use std::sync::LockResult;

/// Handle poisoned mutex cases with consistent error handling
///
/// Converts a poison error into the caller's error type. A poisoned lock
/// means some task panicked while holding it, so the guarded state can no
/// longer be trusted.
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use sqs_dedup::core::sync::handle_mutex_poison;
/// use sqs_dedup::dedup::DedupError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(
///     mutex.lock(),
///     |message| DedupError::Synchronisation { message }
/// ).unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<T, E>(
    result: LockResult<T>,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<T, E> {
    result.map_err(|poison_err| {
        error_constructor(format!(
            "Internal synchronisation error (mutex poisoned). A panic occurred while holding a lock. PoisonError: {:?}",
            poison_err
        ))
    })
}
