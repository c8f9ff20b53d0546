use crate::application_port::{TokenGenerator, TokenStyle};
use chrono::Utc;
use nanoid::nanoid;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub fn token_generator(style: TokenStyle, node_id: u16) -> Arc<dyn TokenGenerator> {
    match style {
        TokenStyle::Uuid => Arc::new(UuidTokenGenerator),
        TokenStyle::Snowflake => Arc::new(SnowflakeTokenGenerator::new(node_id)),
        TokenStyle::Nanoid => Arc::new(NanoidTokenGenerator::default()),
    }
}

#[derive(Debug, Default)]
pub struct UuidTokenGenerator;

impl TokenGenerator for UuidTokenGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

const NANOID_ALPHABET: [char; 63] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L',
    'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '0', '1', '2', '3', '4',
    '5', '6', '7', '8', '9', '_',
];

#[derive(Debug)]
pub struct NanoidTokenGenerator {
    length: usize,
}

impl NanoidTokenGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for NanoidTokenGenerator {
    fn default() -> Self {
        Self::new(32)
    }
}

impl TokenGenerator for NanoidTokenGenerator {
    fn generate(&self) -> String {
        let length = self.length;
        nanoid!(length, &NANOID_ALPHABET)
    }
}

/// 2020-01-01T00:00:00Z
const SNOWFLAKE_EPOCH_MS: i64 = 1_577_836_800_000;
const NODE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const NODE_MASK: u64 = (1 << NODE_BITS) - 1;
/// Largest node id a snowflake token can carry.
pub const MAX_NODE_ID: u16 = NODE_MASK as u16;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// Twitter-style ids: 41 bits of milliseconds, 10 bits of node, 12 bits of
/// sequence.
///
/// The last issued `(millis, sequence)` pair lives in one atomic word, so
/// ids from one generator are strictly increasing. When the clock steps
/// back, or 4096 ids were already handed out in the current millisecond,
/// the generator keeps counting on the last timestamp and borrows the next
/// millisecond instead of waiting.
#[derive(Debug)]
pub struct SnowflakeTokenGenerator {
    node_id: u64,
    state: AtomicU64,
}

impl SnowflakeTokenGenerator {
    /// Only the low 10 bits of `node_id` are used.
    pub fn new(node_id: u16) -> Self {
        Self {
            node_id: u64::from(node_id) & NODE_MASK,
            state: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> u64 {
        let now = Self::millis_since_epoch();
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let last_millis = current >> SEQUENCE_BITS;
            let sequence = current & SEQUENCE_MASK;
            let next = if now > last_millis {
                now << SEQUENCE_BITS
            } else if sequence < SEQUENCE_MASK {
                current + 1
            } else {
                (last_millis + 1) << SEQUENCE_BITS
            };

            match self.state.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    let millis = next >> SEQUENCE_BITS;
                    let sequence = next & SEQUENCE_MASK;
                    return (millis << (NODE_BITS + SEQUENCE_BITS))
                        | (self.node_id << SEQUENCE_BITS)
                        | sequence;
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn millis_since_epoch() -> u64 {
        (Utc::now().timestamp_millis() - SNOWFLAKE_EPOCH_MS).max(0) as u64
    }
}

impl TokenGenerator for SnowflakeTokenGenerator {
    fn generate(&self) -> String {
        self.next_id().to_string()
    }
}
