//! Shared test utilities for the launch site weather workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Meteoblue response bodies and launch site fixtures
//! - In-memory stand-ins for the site registry, snapshot store and provider
//! - Temporary on-disk databases
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
//! use test_utils::{fixtures, StubProvider};
//! ```

pub mod database;
pub mod fixtures;
pub mod stubs;

// Re-export commonly used items at the crate root
pub use database::*;
pub use fixtures::*;
pub use stubs::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
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

/// Asserts that a recorded provider call hit the given coordinate.
///
/// ```ignore
/// assert_call_at!(provider.calls()[0], (47.66, 11.52), 1555);
/// ```
#[macro_export]
macro_rules! assert_call_at {
    ($call:expr, ($lat:expr, $lon:expr), $asl:expr) => {{
        let call = &$call;
        $crate::assert_approx_eq!(call.latitude, $lat, 1e-9);
        $crate::assert_approx_eq!(call.longitude, $lon, 1e-9);
        assert_eq!(call.elevation_asl, $asl, "elevation passed to provider");
    }};
}
