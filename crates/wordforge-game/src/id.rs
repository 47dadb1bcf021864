//! Snowflake session ids.
//!
//! Layout of the 63 used bits, high to low:
//!
//! ```text
//! | 41 bits: ms since 2020-01-01 | 10 bits: machine | 12 bits: sequence |
//! ```
//!
//! Ids from one machine sort by creation time, and several registries can
//! share a store without coordinating as long as their machine ids differ.

use std::collections::HashSet;

use chrono::Utc;
use parking_lot::Mutex;
use rand::Rng;
use wordforge_protocol::SessionId;

/// 2020-01-01T00:00:00Z in Unix milliseconds.
pub const SNOWFLAKE_EPOCH_MS: u64 = 1_577_836_800_000;

const MACHINE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const MAX_MACHINE_ID: u16 = (1 << MACHINE_BITS) - 1;
const SEQUENCES_PER_MS: usize = 1 << SEQUENCE_BITS;

/// Errors from [`SnowflakeGenerator`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("machine id {0} is out of range (0-1023)")]
    MachineIdOutOfRange(u16),

    #[error("clock moved backwards from {last_ms} to {now_ms}")]
    ClockMovedBackwards { last_ms: u64, now_ms: u64 },

    #[error("all sequence numbers for millisecond {0} are used")]
    SequenceExhausted(u64),
}

/// The fields packed into a snowflake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnowflakeParts {
    /// Unix milliseconds.
    pub timestamp_ms: u64,
    pub machine_id: u16,
    pub sequence: u16,
}

/// Allocates session ids.
///
/// Sequence numbers are random rather than counting up, so ids handed out
/// in the same millisecond don't reveal how many came before.
pub struct SnowflakeGenerator {
    machine_id: u16,
    state: Mutex<SequenceState>,
}

#[derive(Default)]
struct SequenceState {
    last_ms: u64,
    used: HashSet<u16>,
}

impl SnowflakeGenerator {
    pub fn new(machine_id: u16) -> Result<Self, IdError> {
        if machine_id > MAX_MACHINE_ID {
            return Err(IdError::MachineIdOutOfRange(machine_id));
        }
        Ok(Self {
            machine_id,
            state: Mutex::new(SequenceState::default()),
        })
    }

    pub fn machine_id(&self) -> u16 {
        self.machine_id
    }

    /// Allocates an id for the current time.
    pub fn next_id(&self) -> Result<SessionId, IdError> {
        let now_ms = u64::try_from(Utc::now().timestamp_millis())
            .unwrap_or(0)
            .saturating_sub(SNOWFLAKE_EPOCH_MS);
        self.next_id_at(now_ms)
    }

    /// Allocates an id for `now_ms` milliseconds after the snowflake epoch.
    fn next_id_at(&self, now_ms: u64) -> Result<SessionId, IdError> {
        let mut state = self.state.lock();
        if now_ms < state.last_ms {
            return Err(IdError::ClockMovedBackwards {
                last_ms: state.last_ms,
                now_ms,
            });
        }
        if now_ms > state.last_ms {
            state.last_ms = now_ms;
            state.used.clear();
        }
        if state.used.len() >= SEQUENCES_PER_MS {
            return Err(IdError::SequenceExhausted(now_ms));
        }

        let mut rng = rand::rng();
        let sequence = loop {
            let candidate = rng.random_range(0..SEQUENCES_PER_MS as u16);
            if state.used.insert(candidate) {
                break candidate;
            }
        };

        Ok(SessionId(
            (now_ms << (MACHINE_BITS + SEQUENCE_BITS))
                | (u64::from(self.machine_id) << SEQUENCE_BITS)
                | u64::from(sequence),
        ))
    }

    /// Splits an id back into its fields.
    pub fn parse(id: SessionId) -> SnowflakeParts {
        SnowflakeParts {
            timestamp_ms: (id.0 >> (MACHINE_BITS + SEQUENCE_BITS)) + SNOWFLAKE_EPOCH_MS,
            machine_id: ((id.0 >> SEQUENCE_BITS) & u64::from(MAX_MACHINE_ID)) as u16,
            sequence: (id.0 & (SEQUENCES_PER_MS as u64 - 1)) as u16,
        }
    }
}
