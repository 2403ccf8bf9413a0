// Panic isolation for test callbacks

use std::panic::catch_unwind;

use tracing::error;

/// Result of a panic-guarded call
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Callback returned normally
    Completed(T),
    /// Callback panicked
    Panicked(String),
}

/// Run a closure, converting a panic into data.
///
/// A panicking test case must fail that case only, never the whole
/// harness process.
pub fn execute_guarded<F, T>(f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T + std::panic::UnwindSafe,
{
    match catch_unwind(f) {
        Ok(result) => PanicGuardResult::Completed(result),
        Err(panic_info) => {
            let message = if let Some(s) = panic_info.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };

            error!(panic_message = %message, "Guarded callback panicked");
            PanicGuardResult::Panicked(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_the_return_value_through() {
        match execute_guarded(|| 42) {
            PanicGuardResult::Completed(value) => assert_eq!(value, 42),
            PanicGuardResult::Panicked(message) => panic!("unexpected panic: {}", message),
        }
    }

    #[test]
    fn captures_str_panics() {
        match execute_guarded(|| -> i32 { panic!("boom") }) {
            PanicGuardResult::Panicked(message) => assert_eq!(message, "boom"),
            PanicGuardResult::Completed(_) => panic!("expected a panic"),
        }
    }

    #[test]
    fn captures_string_panics() {
        match execute_guarded(|| -> i32 { panic!("{}", String::from("formatted boom")) }) {
            PanicGuardResult::Panicked(message) => assert_eq!(message, "formatted boom"),
            PanicGuardResult::Completed(_) => panic!("expected a panic"),
        }
    }
}
