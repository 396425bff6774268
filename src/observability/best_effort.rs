//! Best-effort execution of side-effecting instrumentation.
//!
//! Anything that only exists to observe a call (incrementing a counter,
//! deriving a label, logging a slow query) runs through [`best_effort`].
//! Failures and panics inside the block are logged and discarded so that the
//! observed call always keeps its own result.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

/// Run `block`, swallowing any panic it raises.
///
/// Returns `true` when the block ran to completion.
pub fn best_effort<F>(what: &'static str, block: F) -> bool
where
    F: FnOnce(),
{
    match panic::catch_unwind(AssertUnwindSafe(block)) {
        Ok(()) => true,
        Err(payload) => {
            tracing::warn!(
                step = what,
                panic = %panic_message(payload.as_ref()),
                "Instrumentation step panicked; discarded"
            );
            false
        }
    }
}

/// Convert a fallible result into an `Option`, logging the error.
///
/// Used at boundaries where failures degrade to "absent" instead of
/// propagating to the caller.
pub fn contain<T, E>(what: &'static str, result: Result<T, E>) -> Option<T>
where
    E: Display,
{
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(step = what, error = %e, "Operation failed; contained");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
