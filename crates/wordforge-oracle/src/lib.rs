//! Distance lookups for Wordforge.
//!
//! This crate sits between the game sessions and the external service that
//! scores words against a round's hidden answer:
//!
//! 1. **Oracle contract**: what the external scorer must provide
//!    ([`DistanceOracle`] trait)
//! 2. **Two-tier cache**: an in-process map in front of the durable store
//!    ([`DistanceCache`])
//! 3. **Cache-first lookups**: play, tip, and answer requests that only
//!    reach the oracle on a miss ([`CachedOracle`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Game Layer (above)   ← asks "how far is this word?"
//!     ↕
//! Oracle Layer (this crate)  ← answers from cache, or asks the oracle once
//!     ↕
//! Store Layer (below)  ← durable copy of every answer, shared by all sessions
//! ```

#![allow(async_fn_in_trait)]

mod cache;
mod cached;
mod error;
mod oracle;

pub use cache::DistanceCache;
pub use cached::CachedOracle;
pub use error::OracleError;
pub use oracle::{DistanceOracle, StaticOracle};
