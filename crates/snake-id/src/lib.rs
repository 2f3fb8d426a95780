//! Coordination-free, roughly time-sortable 64-bit id generation.
//!
//! An [`Id`] packs `timestamp | shard | sequence` from the high bits down.
//! Every process mints ids on its own: the shard id keeps processes apart and
//! the sequence keeps ids apart within one timestamp tick. Ids render to a
//! compact base 62 form or a case-insensitive base 34 form and parse back.
//!
//! ```no_run
//! let id = snake_id::next_id();
//! let text = id.short_string();
//! assert_eq!(snake_id::Id::parse_short(&text), Ok(id));
//! ```

mod clock;
pub mod codec;
pub mod error;
mod generator;
mod id;
mod shard;
mod source;

pub use clock::{Clock, EpochClock, Precision, SystemClock, DEFAULT_EPOCH};
pub use error::{Error, Result};
pub use generator::{
    default_generator, next_id, IdGenerator, IdParts, SharedSource, SnakeIdGenerator,
    SnakeIdSettings, DEFAULT_SEQUENCE_BITS, DEFAULT_SHARD_BITS,
};
pub use id::Id;
pub use shard::{AddressResolver, AddressShard, UdpProbeResolver};
pub use source::{fold, AtomicCounter, FixedNumber, NumberSource};
