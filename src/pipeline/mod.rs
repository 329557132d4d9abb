//! Pipeline stages for one conversion request.
//!
//! Each submodule implements exactly one step, so each can be tested in
//! isolation and the two external capabilities (network fetch, engine)
//! can be swapped for fakes.
//!
//! ## Data Flow
//!
//! ```text
//! options ──▶ bibliography ──▶ args ──▶ executor ──▶ output artifact
//!             (fetch/stage)   (pure)   (engine run)
//! ```
//!
//! 1. [`bibliography`]: pick one of upload / URL / server path and make it
//!    a local file; the only stage with network I/O (via [`fetch`])
//! 2. [`args`]: turn options + bibliography path into an ordered argument set
//! 3. [`executor`]: stage the input, run the [`engine`] once, judge the result
//!
//! [`artifact`] provides the request-scoped temp files all stages share.

pub mod args;
pub mod artifact;
pub mod bibliography;
pub mod engine;
pub mod executor;
pub mod fetch;
