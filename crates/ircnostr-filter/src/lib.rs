// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decides which chat lines become posts.
//!
//! [`RelayFilterPipeline`] runs every observed line through sender matching,
//! channel matching, a per-sender sliding-window rate limit and text
//! sanitization, short-circuiting on the first rejection.

pub mod limiter;
pub mod pipeline;
pub mod sanitize;

pub use limiter::SlidingWindowLimiter;
pub use pipeline::{FilterOutcome, RelayFilterPipeline};
pub use sanitize::{sanitize, MAX_POST_CHARS};
