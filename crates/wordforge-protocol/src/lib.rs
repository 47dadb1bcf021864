//! Shared data model for Wordforge.
//!
//! This crate defines the vocabulary every other layer speaks:
//!
//! - **Identity** ([`PlayerId`], [`SessionId`], [`RoundId`]) and the
//!   [`GameMode`] tag.
//! - **Records** ([`Guess`], [`Evaluation`], [`CacheEntry`],
//!   [`PlayerCompletion`], [`WinnerRecord`], [`SessionRecord`]): the
//!   values that are kept in memory, written to the durable store, and
//!   handed back to transports.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how structured columns
//!   are turned into bytes for storage.
//!
//! ```text
//! Game (sessions, registry) → Oracle/Cache → Store (bytes, rows)
//!                 ↘                ↓            ↙
//!                   Protocol (this crate: shared types)
//! ```

mod codec;
mod error;
mod records;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use records::{
    CacheEntry, Evaluation, Guess, ModeRecord, PlayerCompletion,
    SessionRecord, WinnerRecord, normalize_word,
};
pub use types::{GameMode, PlayerId, RoundId, SessionId};
