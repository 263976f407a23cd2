//! Windgate - Fixed-Window Request Throttling
//!
//! This crate implements a fixed-window rate limiter for HTTP-serving
//! processes. Request counts are tracked per opaque identifier within a
//! fixed time window; stale windows are replaced lazily on access and
//! reclaimed by a shared background sweeper. An axum middleware adapter
//! maps throttling decisions onto 429 responses with the conventional
//! `Retry-After` and `X-RateLimit-*` headers.

pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
