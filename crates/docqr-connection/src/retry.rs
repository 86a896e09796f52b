//! Retry policy for the initial connect sequence
//!
//! The manager makes up to `max_attempts` connect attempts and waits
//! between them according to the policy. By default the wait is flat.
//!
//! # Example
//!
//! ```
//! use docqr_connection::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3, Duration::from_secs(2)).exponential(true);
//!
//! assert_eq!(policy.delay_before_retry(1), Duration::from_secs(2));
//! assert_eq!(policy.delay_before_retry(2), Duration::from_secs(4));
//! assert_eq!(policy.total_wait(), Duration::from_secs(6));
//! ```

mod policy;


pub use policy::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
    RetryPolicy,
};
