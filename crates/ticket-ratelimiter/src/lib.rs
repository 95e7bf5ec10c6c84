//! Process-global sliding-window rate limiter.
//!
//! Enforces at most `limit_for_period` admitted calls per rolling `window`
//! across every concurrent caller in the process. One instance is meant to
//! be constructed once (behind an `Arc`) and shared by every tenant's
//! outbound calls — it has no notion of tenancy itself.
//!
//! ```
//! use ticket_ratelimiter::{RateLimiterConfig, SlidingWindowRateLimiter};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let limiter = SlidingWindowRateLimiter::new(
//!     RateLimiterConfig::builder()
//!         .limit_for_period(60)
//!         .window(Duration::from_secs(60))
//!         .build(),
//! );
//! limiter.wait_and_acquire().await;
//! let status = limiter.status().await;
//! assert_eq!(status.current_requests, 1);
//! # }
//! ```

mod config;
mod limiter;

pub use config::{RateLimiterConfig, RateLimiterConfigBuilder};
pub use limiter::{RateLimiterStatus, SlidingWindowRateLimiter};
