//! Runtime invariant checks with contract-test bookkeeping.
//!
//! Production code asserts invariants through [`assert_invariant!`]; each check
//! is recorded in a thread-local log so tests can verify with
//! [`contract_test`] that the invariants they depend on were exercised.
//!
//! ```rust,ignore
//! assert_invariant!(
//!     !flag || device.active_color_space() == extended,
//!     EXTENDED_FLAG_MATCHES_DEVICE,
//!     "activate_extended_mode"
//! );
//! ```

use std::cell::RefCell;
use std::collections::HashSet;

/// `default_format` is written once, at bind time
pub const DEFAULT_FORMAT_CAPTURED_ONCE: &str = "default format is captured exactly once at bind";
/// The extended flag is set only while the device carries the extended color space
pub const EXTENDED_FLAG_MATCHES_DEVICE: &str =
    "extended mode flag implies extended active color space";
/// A bound device always has a captured default format
pub const BOUND_DEVICE_HAS_DEFAULT: &str = "bound device has a captured default format";

thread_local! {
    static INVARIANT_LOG: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// Assert an invariant and record it for contract testing.
///
/// Panics if the condition is false.
#[macro_export]
macro_rules! assert_invariant {
    ($condition:expr, $message:expr) => {
        $crate::invariants::__assert_invariant_impl($condition, $message, None)
    };
    ($condition:expr, $message:expr, $context:expr) => {
        $crate::invariants::__assert_invariant_impl($condition, $message, Some($context))
    };
}

#[doc(hidden)]
pub fn __assert_invariant_impl(condition: bool, message: &str, context: Option<&str>) {
    INVARIANT_LOG.with(|log| {
        log.borrow_mut().insert(message.to_string());
    });

    if !condition {
        let ctx = context.unwrap_or("unknown");
        panic!("INVARIANT VIOLATION [{}]: {}", ctx, message);
    }
}

/// Panics unless every invariant in `required_invariants` was checked on this thread.
pub fn contract_test(test_name: &str, required_invariants: &[&str]) {
    let log = INVARIANT_LOG.with(|log| log.borrow().clone());

    let missing: Vec<&str> = required_invariants
        .iter()
        .copied()
        .filter(|invariant| !log.contains(*invariant))
        .collect();

    if !missing.is_empty() {
        panic!(
            "CONTRACT FAILURE [{}]: invariants never checked:\n  - {}",
            test_name,
            missing.join("\n  - ")
        );
    }
}

pub fn clear_invariant_log() {
    INVARIANT_LOG.with(|log| log.borrow_mut().clear());
}
