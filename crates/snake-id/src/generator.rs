use crate::{
    clock::{EpochClock, Precision, DEFAULT_EPOCH},
    error::{Error, Result},
    shard::{AddressResolver, AddressShard, UdpProbeResolver},
    source::{fold, AtomicCounter, NumberSource},
    Id,
};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::debug;
use typed_builder::TypedBuilder;

pub const DEFAULT_SHARD_BITS: u32 = 8;
pub const DEFAULT_SEQUENCE_BITS: u32 = 8;

const MIN_SEQUENCE_BITS: u32 = 1;
const MAX_SEQUENCE_BITS: u32 = 16;
const MAX_SHARD_BITS: u32 = 8;
/// Shard and sequence together stay below this, leaving at least 44 bits
/// for the timestamp.
const LOW_BITS_LIMIT: u32 = 20;

/// A number source shared between generator clones.
pub type SharedSource = Arc<dyn NumberSource>;

/// Configures a [`SnakeIdGenerator`].
///
/// Deserializable so it can sit inside an application's own config file;
/// missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeIdSettings {
    /// Width of the shard field, `0..=8`.
    #[builder(default = DEFAULT_SHARD_BITS)]
    pub shard_bits: u32,
    /// Width of the sequence field, `1..=16`.
    #[builder(default = DEFAULT_SEQUENCE_BITS)]
    pub sequence_bits: u32,
    /// Unit of the timestamp field.
    #[builder(default)]
    pub precision: Precision,
    /// Zero point of the timestamp field.
    #[builder(default = DEFAULT_EPOCH)]
    pub epoch: Timestamp,
}

impl Default for SnakeIdSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SnakeIdSettings {
    pub fn validate(&self) -> Result<()> {
        validate_bits(self.shard_bits, self.sequence_bits)
    }
}

fn validate_bits(shard_bits: u32, sequence_bits: u32) -> Result<()> {
    if !(MIN_SEQUENCE_BITS..=MAX_SEQUENCE_BITS).contains(&sequence_bits) {
        return Err(Error::InvalidSequenceBits {
            bits: sequence_bits,
            min: MIN_SEQUENCE_BITS,
            max: MAX_SEQUENCE_BITS,
        });
    }
    if shard_bits > MAX_SHARD_BITS {
        return Err(Error::InvalidShardBits {
            bits: shard_bits,
            max: MAX_SHARD_BITS,
        });
    }
    if shard_bits + sequence_bits >= LOW_BITS_LIMIT {
        return Err(Error::BitBudgetExceeded {
            shard_bits,
            sequence_bits,
            limit: LOW_BITS_LIMIT,
        });
    }
    Ok(())
}

/// Anything that mints ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Id;
}

/// The fields of an id, as laid out by a particular generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdParts {
    pub timestamp: i64,
    pub shard: i64,
    pub sequence: i64,
}

/// Packs a timestamp, a shard id and a sequence number into an [`Id`].
///
/// The generator holds no lock and no mutable state. Uniqueness rests on the
/// sources: each process needs a distinct shard id, and the sequence source
/// must not hand out the same low bits twice within one timestamp tick.
/// Cloning is shallow; clones read the same sources.
#[derive(Clone)]
pub struct SnakeIdGenerator {
    shard_bits: u32,
    sequence_bits: u32,
    timestamp: SharedSource,
    shard: SharedSource,
    sequence: SharedSource,
}

impl SnakeIdGenerator {
    /// Creates a generator over explicit sources after checking the bit widths.
    pub fn with_sources(
        shard_bits: u32,
        sequence_bits: u32,
        timestamp: SharedSource,
        shard: SharedSource,
        sequence: SharedSource,
    ) -> Result<Self> {
        validate_bits(shard_bits, sequence_bits)?;
        debug!(shard_bits, sequence_bits, "created snake id generator");

        Ok(Self {
            shard_bits,
            sequence_bits,
            timestamp,
            shard,
            sequence,
        })
    }

    /// Creates a generator whose timestamp is read from the system clock as
    /// configured by `settings`.
    pub fn new(
        settings: SnakeIdSettings,
        shard: SharedSource,
        sequence: SharedSource,
    ) -> Result<Self> {
        let clock = EpochClock::new(settings.epoch, settings.precision);
        Self::with_sources(
            settings.shard_bits,
            settings.sequence_bits,
            Arc::new(clock),
            shard,
            sequence,
        )
    }

    /// Creates a generator whose shard id comes from the address `resolver`
    /// reports, with a fresh sequence counter.
    pub fn from_settings<R: AddressResolver + ?Sized>(
        settings: SnakeIdSettings,
        resolver: &R,
    ) -> Result<Self> {
        settings.validate()?;
        let shard = AddressShard::resolve(resolver)?;
        Self::new(settings, Arc::new(shard), Arc::new(AtomicCounter::new()))
    }

    /// The default configuration: 8 shard bits, 8 sequence bits, milliseconds
    /// since [`DEFAULT_EPOCH`], and a shard id taken from the outbound address.
    pub fn with_defaults() -> Result<Self> {
        Self::from_settings(SnakeIdSettings::default(), &UdpProbeResolver::default())
    }

    /// Returns a generator with other bit widths reading the same sources.
    pub fn with_bits(&self, shard_bits: u32, sequence_bits: u32) -> Result<Self> {
        Self::with_sources(
            shard_bits,
            sequence_bits,
            Arc::clone(&self.timestamp),
            Arc::clone(&self.shard),
            Arc::clone(&self.sequence),
        )
    }

    pub fn shard_bits(&self) -> u32 {
        self.shard_bits
    }

    pub fn sequence_bits(&self) -> u32 {
        self.sequence_bits
    }

    /// Mints the next id.
    ///
    /// The sequence keeps its low `sequence_bits`, the shard its low
    /// `shard_bits`, and the timestamp fills everything above.
    pub fn next_id(&self) -> Id {
        let sequence = self
            .sequence
            .next_number()
            .rem_euclid(1 << self.sequence_bits);
        let shard = fold(self.shard.next_number(), self.shard_bits);
        let timestamp = self.timestamp.next_number();

        Id::new(
            sequence
                | (shard << self.sequence_bits)
                | (timestamp << (self.sequence_bits + self.shard_bits)),
        )
    }

    /// Splits an id minted with this generator's layout back into its fields.
    pub fn decompose(&self, id: Id) -> IdParts {
        let raw = id.as_i64();
        IdParts {
            timestamp: raw >> (self.sequence_bits + self.shard_bits),
            shard: fold(raw >> self.sequence_bits, self.shard_bits),
            sequence: fold(raw, self.sequence_bits),
        }
    }
}

impl std::fmt::Debug for SnakeIdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnakeIdGenerator")
            .field("shard_bits", &self.shard_bits)
            .field("sequence_bits", &self.sequence_bits)
            .finish_non_exhaustive()
    }
}

impl IdGenerator for SnakeIdGenerator {
    fn next_id(&self) -> Id {
        SnakeIdGenerator::next_id(self)
    }
}

static DEFAULT_GENERATOR: OnceLock<SnakeIdGenerator> = OnceLock::new();

/// Returns the process-wide generator, building it on first use.
///
/// # Panics
///
/// Panics if the default generator cannot be built, which happens when no
/// outbound address is available to derive a shard id from. Applications
/// that want to handle that case should build their own generator with
/// [`SnakeIdGenerator::with_defaults`].
pub fn default_generator() -> &'static SnakeIdGenerator {
    DEFAULT_GENERATOR.get_or_init(|| match SnakeIdGenerator::with_defaults() {
        Ok(generator) => generator,
        Err(err) => panic!("failed to build the default id generator: {err}"),
    })
}

/// Mints an id from the process-wide generator.
///
/// # Panics
///
/// See [`default_generator`].
pub fn next_id() -> Id {
    default_generator().next_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_clock::TestClock;
    use crate::source::FixedNumber;
    use jiff::SignedDuration;
    use std::net::{IpAddr, Ipv4Addr};

    fn fixed(value: i64) -> SharedSource {
        Arc::new(FixedNumber(value))
    }

    fn make_generator(shard_bits: u32, sequence_bits: u32) -> Result<SnakeIdGenerator> {
        SnakeIdGenerator::with_sources(
            shard_bits,
            sequence_bits,
            fixed(1000),
            fixed(3),
            Arc::new(AtomicCounter::new()),
        )
    }

    #[test]
    fn sequence_bits_bounds() {
        assert!(make_generator(0, 1).is_ok());
        assert!(make_generator(0, 16).is_ok());
        assert_eq!(
            make_generator(0, 0).unwrap_err(),
            Error::InvalidSequenceBits {
                bits: 0,
                min: 1,
                max: 16
            }
        );
        assert!(matches!(
            make_generator(0, 17),
            Err(Error::InvalidSequenceBits { bits: 17, .. })
        ));
    }

    #[test]
    fn shard_bits_bounds() {
        assert!(make_generator(0, 8).is_ok());
        assert!(make_generator(8, 8).is_ok());
        assert_eq!(
            make_generator(9, 8).unwrap_err(),
            Error::InvalidShardBits { bits: 9, max: 8 }
        );
    }

    #[test]
    fn combined_bits_bounds() {
        assert!(make_generator(8, 11).is_ok());
        assert_eq!(
            make_generator(8, 12).unwrap_err(),
            Error::BitBudgetExceeded {
                shard_bits: 8,
                sequence_bits: 12,
                limit: 20
            }
        );
        assert!(make_generator(4, 15).is_ok());
        assert!(make_generator(4, 16).is_err());
    }

    #[test]
    fn packs_fields_into_id() {
        let generator =
            SnakeIdGenerator::with_sources(8, 8, fixed(1000), fixed(3), fixed(5)).unwrap();
        assert_eq!(generator.next_id(), Id::new((1000 << 16) | (3 << 8) | 5));
    }

    #[test]
    fn consecutive_ids_differ_in_sequence_only() {
        let generator = make_generator(8, 8).unwrap();
        let ids: Vec<Id> = (0..200).map(|_| generator.next_id()).collect();

        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        for (n, id) in ids.iter().enumerate() {
            assert_eq!(id.as_i64() >> 16, (1000 << 8) | 3);
            assert_eq!(id.as_i64() & 0xFF, n as i64);
        }
    }

    #[test]
    fn sequence_wraps_within_its_bits() {
        let generator = SnakeIdGenerator::with_sources(
            0,
            2,
            fixed(1),
            fixed(0),
            Arc::new(AtomicCounter::with_offset(3)),
        )
        .unwrap();
        let sequences: Vec<i64> = (0..3)
            .map(|_| generator.next_id().as_i64() & 0b11)
            .collect();
        assert_eq!(sequences, vec![3, 0, 1]);
    }

    #[test]
    fn shard_is_folded_to_its_bits() {
        let generator =
            SnakeIdGenerator::with_sources(8, 8, fixed(0), fixed(300), fixed(0)).unwrap();
        assert_eq!(generator.next_id(), Id::new(44 << 8));
    }

    #[test]
    fn zero_shard_bits_drop_the_shard() {
        let generator =
            SnakeIdGenerator::with_sources(0, 8, fixed(7), fixed(0xFF), fixed(1)).unwrap();
        assert_eq!(generator.next_id(), Id::new((7 << 8) | 1));
    }

    #[test]
    fn later_timestamp_sorts_after_any_shard_and_sequence() {
        let clock = TestClock::new(DEFAULT_EPOCH);
        let timestamp = Arc::new(EpochClock::with_clock(
            DEFAULT_EPOCH,
            Precision::Milliseconds,
            clock.clone(),
        ));
        let high = SnakeIdGenerator::with_sources(8, 8, timestamp.clone(), fixed(255), fixed(255))
            .unwrap();
        let low = SnakeIdGenerator::with_sources(8, 8, timestamp, fixed(0), fixed(0)).unwrap();

        let first = high.next_id();
        clock.advance(SignedDuration::from_millis(1));
        let second = low.next_id();
        assert!(first < second);
    }

    #[test]
    fn decompose_recovers_fields() {
        let generator =
            SnakeIdGenerator::with_sources(5, 10, fixed(123_456), fixed(17), fixed(999)).unwrap();
        let parts = generator.decompose(generator.next_id());
        assert_eq!(
            parts,
            IdParts {
                timestamp: 123_456,
                shard: 17,
                sequence: 999
            }
        );
    }

    #[test]
    fn clone_shares_sources() {
        let generator = make_generator(8, 8).unwrap();
        let cloned = generator.clone();

        assert_eq!(generator.next_id().as_i64() & 0xFF, 0);
        assert_eq!(cloned.next_id().as_i64() & 0xFF, 1);
        assert_eq!(generator.next_id().as_i64() & 0xFF, 2);
    }

    #[test]
    fn with_bits_shares_sources_and_validates() {
        let generator = make_generator(8, 8).unwrap();
        let narrow = generator.with_bits(0, 4).unwrap();
        assert_eq!(narrow.shard_bits(), 0);
        assert_eq!(narrow.sequence_bits(), 4);

        assert_eq!(generator.next_id().as_i64() & 0xFF, 0);
        assert_eq!(narrow.next_id(), Id::new((1000 << 4) | 1));

        assert!(generator.with_bits(9, 4).is_err());
    }

    #[test]
    fn settings_defaults() {
        let settings = SnakeIdSettings::default();
        assert_eq!(settings.shard_bits, 8);
        assert_eq!(settings.sequence_bits, 8);
        assert_eq!(settings.precision, Precision::Milliseconds);
        assert_eq!(settings.epoch, DEFAULT_EPOCH);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: SnakeIdSettings =
            serde_json::from_str(r#"{"shard_bits": 4, "precision": "seconds"}"#).unwrap();
        assert_eq!(
            settings,
            SnakeIdSettings::builder()
                .shard_bits(4)
                .precision(Precision::Seconds)
                .build()
        );
    }

    #[test]
    fn from_settings_uses_resolved_address() {
        let address = IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3));
        let generator = SnakeIdGenerator::from_settings(SnakeIdSettings::default(), &address)
            .unwrap();
        let parts = generator.decompose(generator.next_id());
        assert_eq!(parts.shard, 3);
        assert_eq!(parts.sequence, 0);
        assert!(parts.timestamp > 0);
    }

    #[test]
    fn from_settings_rejects_bad_bits_before_resolving() {
        let settings = SnakeIdSettings::builder().sequence_bits(0).build();
        let address = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(matches!(
            SnakeIdGenerator::from_settings(settings, &address),
            Err(Error::InvalidSequenceBits { .. })
        ));
    }

    #[test]
    fn default_instance_is_shared_and_uses_default_layout() {
        // needs an outbound route to derive the shard id
        if SnakeIdGenerator::with_defaults().is_err() {
            return;
        }

        let generator = default_generator();
        assert!(std::ptr::eq(generator, default_generator()));
        assert_eq!(generator.shard_bits(), DEFAULT_SHARD_BITS);
        assert_eq!(generator.sequence_bits(), DEFAULT_SEQUENCE_BITS);

        let first = generator.decompose(next_id());
        let second = generator.decompose(next_id());
        assert_eq!(second.sequence, (first.sequence + 1) % 256);
        assert_eq!(first.shard, second.shard);
        assert!(first.timestamp <= second.timestamp);
    }

    #[test]
    fn generator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SnakeIdGenerator>();
    }

    #[test]
    fn usable_as_trait_object() {
        let generator: Box<dyn IdGenerator> =
            Box::new(SnakeIdGenerator::with_sources(8, 8, fixed(1), fixed(2), fixed(3)).unwrap());
        assert_eq!(generator.next_id(), Id::new((1 << 16) | (2 << 8) | 3));
    }
}
