//! Shared test utilities for the wetbulb-monitor workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Station and reading fixtures
//! - Scripted providers and calculators with injectable latency, failures
//!   and panics
//! - A skip macro for tests that need PostgreSQL
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{require_database, fixtures};
//! ```

pub mod fakes;
pub mod fixtures;

pub use fakes::*;
pub use fixtures::*;

/// Environment variable naming the database used by PostgreSQL tests.
pub const TEST_DATABASE_URL: &str = "TEST_DATABASE_URL";

/// The test database URL, if one is configured.
pub fn database_url() -> Option<String> {
    std::env::var(TEST_DATABASE_URL)
        .ok()
        .filter(|url| !url.trim().is_empty())
}

/// Macro to skip a test if no test database is configured.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_database;
///
/// #[tokio::test]
/// async fn test_against_postgres() {
///     let url = require_database!();
///     // Test code using url...
/// }
/// ```
///
/// If `TEST_DATABASE_URL` is unset, the test prints a skip message and
/// returns early.
#[macro_export]
macro_rules! require_database {
    () => {{
        match $crate::database_url() {
            Some(url) => url,
            None => {
                eprintln!(
                    "SKIPPED: {} not set. Point it at a scratch PostgreSQL database to run this test.",
                    $crate::TEST_DATABASE_URL
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(25.5634, 25.563, 0.001); // passes
/// assert_approx_eq!(25.6, 25.5, 0.001);      // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(25.5634, 25.563, 0.001);
        assert_approx_eq!(-6.8, -6.80001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(25.6, 25.5, 0.001);
    }
}
